//! Port descriptors, excitation passes and port geometry resolution.
//!
//! Ports are drawn as polygons on dedicated layers and attached to a metal of
//! the stack. Their direction is given by the author, never inferred: it sets
//! the polarity of the excitation field. Two ports of a line that share one
//! ground reference are driven in opposite directions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;
use crate::layout::{LayerNumber, Layout};
use crate::math::Scalar;
use crate::stackup::LayerStack;

/// Cartesian axis.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// x axis.
    X,
    /// y axis.
    Y,
    /// z axis.
    Z,
}

impl Axis {
    /// Index into `[x, y, z]` arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Excitation direction of a port.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// +x
    PosX,
    /// -x
    NegX,
    /// +y
    PosY,
    /// -y
    NegY,
    /// +z
    PosZ,
    /// -z
    NegZ,
}

impl Direction {
    /// Axis the field is excited along.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::PosX | Self::NegX => Axis::X,
            Self::PosY | Self::NegY => Axis::Y,
            Self::PosZ | Self::NegZ => Axis::Z,
        }
    }

    /// `+1.0` or `-1.0`.
    #[must_use]
    pub const fn sign(self) -> Scalar {
        match self {
            Self::PosX | Self::PosY | Self::PosZ => 1.0,
            Self::NegX | Self::NegY | Self::NegZ => -1.0,
        }
    }

    /// Same axis, opposite polarity.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::NegX => Self::PosX,
            Self::PosY => Self::NegY,
            Self::NegY => Self::PosY,
            Self::PosZ => Self::NegZ,
            Self::NegZ => Self::PosZ,
        }
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    /// Accepts `x`, `+x`, `-x` and likewise for `y` and `z`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" | "+x" => Ok(Self::PosX),
            "-x" => Ok(Self::NegX),
            "y" | "+y" => Ok(Self::PosY),
            "-y" => Ok(Self::NegY),
            "z" | "+z" => Ok(Self::PosZ),
            "-z" => Ok(Self::NegZ),
            _ => Err(ConfigError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PosX => "+x",
            Self::NegX => "-x",
            Self::PosY => "+y",
            Self::NegY => "-y",
            Self::PosZ => "+z",
            Self::NegZ => "-z",
        };
        f.write_str(s)
    }
}

/// User-supplied description of one port.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PortDescriptor {
    /// Port number, starting at 1.
    pub number: u32,
    /// Source amplitude when the port is driven.
    pub voltage: Scalar,
    /// Reference impedance in ohms.
    pub z0: Scalar,
    /// Layout layer carrying the port polygon.
    pub source_layer: LayerNumber,
    /// Name of the metal the port attaches to.
    pub target_metal: String,
    /// Excitation direction.
    pub direction: Direction,
}

impl PortDescriptor {
    /// Creates a descriptor, checking number and impedance.
    pub fn new(
        number: u32,
        voltage: Scalar,
        z0: Scalar,
        source_layer: LayerNumber,
        target_metal: impl Into<String>,
        direction: Direction,
    ) -> Result<Self, ConfigError> {
        if number == 0 {
            return Err(ConfigError::ZeroPortNumber);
        }
        if !(z0 > 0.0) || !z0.is_finite() {
            return Err(ConfigError::InvalidParameter { name: "z0", reason: format!("must be positive, got {z0}") });
        }
        Ok(Self { number, voltage, z0, source_layer, target_metal: target_metal.into(), direction })
    }
}

/// How a port takes part in one excitation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PortDrive {
    /// Driven with the given source amplitude.
    Active {
        /// Source amplitude.
        voltage: Scalar,
    },
    /// Terminated in its reference impedance.
    MatchedLoad,
}

/// Registered ports keyed by number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortSet {
    ports: BTreeMap<u32, PortDescriptor>,
}

impl PortSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a port; port numbers must be unique.
    pub fn add_port(&mut self, port: PortDescriptor) -> Result<(), ConfigError> {
        if self.ports.contains_key(&port.number) {
            return Err(ConfigError::DuplicatePort(port.number));
        }
        self.ports.insert(port.number, port);
        Ok(())
    }

    /// Port with number `number`.
    #[must_use]
    pub fn get(&self, number: u32) -> Option<&PortDescriptor> {
        self.ports.get(&number)
    }

    /// Ports in ascending number order.
    pub fn iter(&self) -> impl Iterator<Item = &PortDescriptor> {
        self.ports.values()
    }

    /// Port numbers in ascending order.
    #[must_use]
    pub fn numbers(&self) -> Vec<u32> {
        self.ports.keys().copied().collect()
    }

    /// Number of ports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// True if no port is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Distinct source layers, to be read from the layout next to the metals.
    #[must_use]
    pub fn source_layers(&self) -> Vec<LayerNumber> {
        let layers: BTreeSet<_> = self.ports.values().map(|p| p.source_layer).collect();
        layers.into_iter().collect()
    }

    /// Selects the ports driven in one solver run. All other ports stay in the
    /// model as matched loads.
    pub fn excitation_pass(&self, active: &[u32]) -> Result<ExcitationPass, ConfigError> {
        if active.is_empty() {
            return Err(ConfigError::EmptyExcitation);
        }
        if let Some(&missing) = active.iter().find(|n| !self.ports.contains_key(n)) {
            return Err(ConfigError::UnknownPort(missing));
        }
        Ok(ExcitationPass { active: active.iter().copied().collect() })
    }

    /// Places every port in the model using its source-layer polygons and target metal.
    ///
    /// In-plane ports span the bounding box of their source layer laterally and
    /// the target metal's thickness vertically. Vertical ports span the box
    /// laterally and run from the bottom of the stack to the metal's underside.
    pub fn resolve(&self, layout: &Layout, stack: &LayerStack) -> Result<Vec<ResolvedPort>, ConfigError> {
        let stack_bottom = stack.dielectrics().first().map_or(0.0, |d| d.z_bottom);
        self.ports
            .values()
            .map(|port| -> Result<ResolvedPort, ConfigError> {
                let bbox = layout
                    .layer_bbox(port.source_layer)
                    .ok_or(ConfigError::MissingPortGeometry { port: port.number, layer: port.source_layer })?;
                let metal = stack.metal_by_name(&port.target_metal).ok_or_else(|| ConfigError::UnknownMetal {
                    port: port.number,
                    metal: port.target_metal.clone(),
                })?;
                let (z_start, z_stop) = match port.direction.axis() {
                    Axis::Z => (stack_bottom, metal.z_bottom),
                    Axis::X | Axis::Y => (metal.z_bottom, metal.z_top()),
                };
                let resolved = ResolvedPort {
                    number: port.number,
                    z0: port.z0,
                    direction: port.direction,
                    start: [bbox.min.x, bbox.min.y, z_start],
                    stop: [bbox.max.x, bbox.max.y, z_stop],
                };
                if resolved.extent(port.direction.axis()) <= 0.0 {
                    return Err(ConfigError::InvalidParameter {
                        name: "direction",
                        reason: format!("port {} has no extent along its direction {}", port.number, port.direction),
                    });
                }
                Ok(resolved)
            })
            .collect()
    }
}

/// Ports driven together in one solver run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExcitationPass {
    active: BTreeSet<u32>,
}

impl ExcitationPass {
    /// Driven port numbers, ascending.
    pub fn active(&self) -> impl Iterator<Item = u32> + '_ {
        self.active.iter().copied()
    }

    /// True if `port` is driven in this pass.
    #[must_use]
    pub fn is_active(&self, port: u32) -> bool {
        self.active.contains(&port)
    }

    /// The single driven port, if exactly one is driven.
    #[must_use]
    pub fn single_port(&self) -> Option<u32> {
        match self.active.len() {
            1 => self.active.iter().next().copied(),
            _ => None,
        }
    }

    /// Role of every port of `ports` in this pass; undriven ports are matched loads.
    pub fn drives<'a>(&'a self, ports: &'a PortSet) -> impl Iterator<Item = (&'a PortDescriptor, PortDrive)> + 'a {
        ports.iter().map(move |p| {
            let drive = if self.is_active(p.number) { PortDrive::Active { voltage: p.voltage } } else { PortDrive::MatchedLoad };
            (p, drive)
        })
    }

    /// Short label such as `1` or `1_2`, used to name result directories.
    #[must_use]
    pub fn label(&self) -> String {
        self.active.iter().map(u32::to_string).collect::<Vec<_>>().join("_")
    }
}

/// Port placed in model coordinates (drawing units).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPort {
    /// Port number.
    pub number: u32,
    /// Reference impedance.
    pub z0: Scalar,
    /// Excitation direction.
    pub direction: Direction,
    /// Lower corner `[x, y, z]`.
    pub start: [Scalar; 3],
    /// Upper corner `[x, y, z]`.
    pub stop: [Scalar; 3],
}

impl ResolvedPort {
    /// Box size along `axis`.
    #[must_use]
    pub fn extent(&self, axis: Axis) -> Scalar {
        self.stop[axis.index()] - self.start[axis.index()]
    }
}

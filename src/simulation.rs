//! Solver-ready model description and orchestration of excitation passes.
//!
//! A [`SimulationSpec`] is built once from layout, stack, ports and settings
//! and is never mutated afterwards. The [`Orchestrator`] pairs it with each
//! [`ExcitationPass`] in turn, hands the resulting [`SolverModel`] to a
//! [`SimulationEngine`] and returns one [`ResultHandle`] per pass.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::energy_ratio_from_db;
use crate::errors::{ConfigError, Result};
use crate::layout::{LayerNumber, Layout};
use crate::math::Scalar;
use crate::mesh::{Mesh, MeshGenerator, MeshSettings};
use crate::ports::{ExcitationPass, PortDrive, PortSet, ResolvedPort};
use crate::stackup::LayerStack;
use crate::sweep::SweepSettings;

/// Condition applied on one face of the computational domain.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryCondition {
    /// Perfect electric conductor.
    Pec,
    /// Perfect magnetic conductor, for symmetry planes.
    Pmc,
    /// First-order Mur absorbing boundary.
    Mur,
    /// Perfectly matched layer with the given number of cells.
    Pml(u8),
}

impl FromStr for BoundaryCondition {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "PEC" => Ok(Self::Pec),
            "PMC" => Ok(Self::Pmc),
            "MUR" => Ok(Self::Mur),
            other => other
                .strip_prefix("PML_")
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|&n| n > 0)
                .map(Self::Pml)
                .ok_or_else(|| ConfigError::InvalidBoundary(s.to_string())),
        }
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pec => f.write_str("PEC"),
            Self::Pmc => f.write_str("PMC"),
            Self::Mur => f.write_str("MUR"),
            Self::Pml(n) => write!(f, "PML_{n}"),
        }
    }
}

/// Faces of the domain in solver order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// -x
    XMin,
    /// +x
    XMax,
    /// -y
    YMin,
    /// +y
    YMax,
    /// -z
    ZMin,
    /// +z
    ZMax,
}

impl Face {
    /// All faces, `{-x, +x, -y, +y, -z, +z}`.
    pub const ALL: [Face; 6] = [Face::XMin, Face::XMax, Face::YMin, Face::YMax, Face::ZMin, Face::ZMax];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Exactly one boundary condition per face.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundaries([BoundaryCondition; 6]);

impl Boundaries {
    /// Conditions in face order `{-x, +x, -y, +y, -z, +z}`.
    #[must_use]
    pub const fn new(faces: [BoundaryCondition; 6]) -> Self {
        Self(faces)
    }

    /// Parses six condition strings such as `PEC` or `PML_8`.
    pub fn parse<S: AsRef<str>>(faces: &[S]) -> std::result::Result<Self, ConfigError> {
        if faces.len() != 6 {
            return Err(ConfigError::InvalidParameter {
                name: "boundaries",
                reason: format!("expected 6 faces, got {}", faces.len()),
            });
        }
        let mut out = [BoundaryCondition::Pec; 6];
        for (slot, s) in out.iter_mut().zip(faces) {
            *slot = s.as_ref().parse()?;
        }
        Ok(Self(out))
    }

    /// Condition on `face`.
    #[must_use]
    pub const fn face(&self, face: Face) -> BoundaryCondition {
        self.0[face.index()]
    }

    /// Conditions in face order.
    #[must_use]
    pub const fn as_array(&self) -> &[BoundaryCondition; 6] {
        &self.0
    }
}

impl Default for Boundaries {
    /// Absorbing on every face except a ground plane below the substrate.
    fn default() -> Self {
        let pml = BoundaryCondition::Pml(8);
        Self([pml, pml, pml, pml, BoundaryCondition::Pec, pml])
    }
}

/// Gaussian pulse shared by all passes of one model.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianExcitation {
    /// Center frequency in Hz.
    pub center: Scalar,
    /// Half of the excited bandwidth in Hz.
    pub half_bandwidth: Scalar,
}

impl GaussianExcitation {
    /// Pulse centred on the sweep and spanning exactly its band.
    #[must_use]
    pub fn from_sweep(sweep: &SweepSettings) -> Self {
        Self { center: sweep.center(), half_bandwidth: sweep.half_bandwidth() }
    }

    /// Excited band `[center - half_bandwidth, center + half_bandwidth]`.
    #[must_use]
    pub fn band(&self) -> (Scalar, Scalar) {
        (self.center - self.half_bandwidth, self.center + self.half_bandwidth)
    }

    /// True if `[f_start, f_stop]` lies inside the excited band, up to
    /// rounding in the center/half-width round trip.
    #[must_use]
    pub fn covers(&self, f_start: Scalar, f_stop: Scalar) -> bool {
        let (lo, hi) = self.band();
        let tol = 1e-9 * hi.abs().max(1.0);
        f_start >= lo - tol && f_stop <= hi + tol
    }
}

/// Residual-energy threshold that ends a solver run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndCriteria {
    db: Scalar,
}

impl EndCriteria {
    /// Threshold in dB; must be negative.
    pub fn new(db: Scalar) -> std::result::Result<Self, ConfigError> {
        if !(db < 0.0) || !db.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "end_criteria",
                reason: format!("energy threshold must be negative dB, got {db}"),
            });
        }
        Ok(Self { db })
    }

    /// Threshold in dB.
    #[must_use]
    pub fn db(&self) -> Scalar {
        self.db
    }

    /// Linear energy ratio `10^(dB/10)` passed to the solver.
    #[must_use]
    pub fn ratio(&self) -> Scalar {
        energy_ratio_from_db(self.db)
    }
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self { db: -30.0 }
    }
}

/// Everything [`SimulationSpec::build`] consumes.
#[derive(Debug, Clone)]
pub struct ModelInputs {
    /// Base name of the model, used for result directories.
    pub name: String,
    /// Size of one drawing unit in meters.
    pub unit: Scalar,
    /// Layout restricted to metal and port layers.
    pub layout: Layout,
    /// Technology stack.
    pub stack: LayerStack,
    /// Registered ports.
    pub ports: PortSet,
    /// Cell-size parameters.
    pub mesh: MeshSettings,
    /// Requested frequency sweep.
    pub sweep: SweepSettings,
    /// Domain boundaries.
    pub boundaries: Boundaries,
    /// Solver end criterion.
    pub end_criteria: EndCriteria,
}

/// Immutable, solver-ready model shared by all excitation passes.
#[derive(Debug, Clone)]
pub struct SimulationSpec {
    name: String,
    unit: Scalar,
    layout: Layout,
    stack: LayerStack,
    ports: PortSet,
    resolved_ports: Vec<ResolvedPort>,
    mesh: Mesh,
    sweep: SweepSettings,
    boundaries: Boundaries,
    excitation: GaussianExcitation,
    end_criteria: EndCriteria,
}

impl SimulationSpec {
    /// Resolves ports, generates the mesh and derives the excitation.
    ///
    /// The mesh is driven by every stack metal that has geometry in the
    /// layout plus every port source layer.
    pub fn build(inputs: ModelInputs) -> Result<Self> {
        let ModelInputs { name, unit, layout, stack, ports, mesh, sweep, boundaries, end_criteria } = inputs;
        let _span = tracing::info_span!("build_model", name = %name).entered();
        if name.trim().is_empty() || name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidParameter { name: "name", reason: format!("`{name}` is not a usable base name") }.into());
        }
        if !(unit > 0.0) {
            return Err(ConfigError::InvalidParameter { name: "unit", reason: format!("must be positive, got {unit}") }.into());
        }
        if ports.is_empty() {
            return Err(ConfigError::InvalidParameter { name: "ports", reason: "no port registered".into() }.into());
        }
        let resolved_ports = ports.resolve(&layout, &stack)?;
        let drive_layers = drive_layers(&layout, &stack, &ports);
        let mesh = MeshGenerator::new(mesh)?.generate(&layout, &stack, &drive_layers)?;
        let excitation = GaussianExcitation::from_sweep(&sweep);
        tracing::info!(
            cells = mesh.cell_count(),
            ports = resolved_ports.len(),
            f0 = excitation.center,
            fc = excitation.half_bandwidth,
            "model ready"
        );
        Ok(Self { name, unit, layout, stack, ports, resolved_ports, mesh, sweep, boundaries, excitation, end_criteria })
    }

    /// Model base name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drawing unit in meters.
    #[must_use]
    pub fn unit(&self) -> Scalar {
        self.unit
    }

    /// Layout the model was built from.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Layer stack.
    #[must_use]
    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    /// Port descriptors.
    #[must_use]
    pub fn ports(&self) -> &PortSet {
        &self.ports
    }

    /// Ports placed in model coordinates, in port-number order.
    #[must_use]
    pub fn resolved_ports(&self) -> &[ResolvedPort] {
        &self.resolved_ports
    }

    /// Generated mesh.
    #[must_use]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Frequency sweep.
    #[must_use]
    pub fn sweep(&self) -> &SweepSettings {
        &self.sweep
    }

    /// Boundary conditions.
    #[must_use]
    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    /// Excitation pulse, identical for every pass.
    #[must_use]
    pub fn excitation(&self) -> &GaussianExcitation {
        &self.excitation
    }

    /// End criterion.
    #[must_use]
    pub fn end_criteria(&self) -> &EndCriteria {
        &self.end_criteria
    }

    /// Model for one excitation pass.
    #[must_use]
    pub fn model<'a>(&'a self, pass: &'a ExcitationPass) -> SolverModel<'a> {
        SolverModel { spec: self, pass }
    }
}

fn drive_layers(layout: &Layout, stack: &LayerStack, ports: &PortSet) -> Vec<LayerNumber> {
    let mut layers: Vec<LayerNumber> = stack
        .metal_layer_numbers()
        .into_iter()
        .filter(|&l| !layout.polygons(l).is_empty())
        .chain(ports.source_layers())
        .collect();
    layers.sort_unstable();
    layers.dedup();
    layers
}

/// A [`SimulationSpec`] with one excitation pass applied.
#[derive(Debug, Clone, Copy)]
pub struct SolverModel<'a> {
    /// Shared model.
    pub spec: &'a SimulationSpec,
    /// Ports driven in this run.
    pub pass: &'a ExcitationPass,
}

impl SolverModel<'_> {
    /// Every port with its role in this pass. Undriven ports remain as matched loads.
    pub fn port_drives(&self) -> impl Iterator<Item = (&ResolvedPort, PortDrive)> + '_ {
        self.spec
            .resolved_ports
            .iter()
            .zip(self.pass.drives(&self.spec.ports))
            .map(|(resolved, (_, drive))| (resolved, drive))
    }
}

/// Failures reported by or around the external solver.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The solver ran but reported a failure.
    #[error("solver failed: {0}")]
    Failed(String),
    /// Result directory could not be prepared or read.
    #[error("result directory: {0}")]
    Io(#[from] std::io::Error),
    /// Post-processing was requested but no earlier run left data behind.
    #[error("no results at {0}")]
    MissingResults(PathBuf),
}

/// Field solver collaborator.
pub trait SimulationEngine {
    /// Runs the solver for `model`, leaving raw port data in `data_path`.
    fn run(&mut self, model: &SolverModel<'_>, data_path: &Path) -> std::result::Result<(), SolverError>;

    /// Builds the model for inspection without solving. Does nothing by default.
    fn preview(&mut self, _model: &SolverModel<'_>, _data_path: &Path) -> std::result::Result<(), SolverError> {
        Ok(())
    }
}

/// What the orchestrator does with each pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Invoke the solver.
    #[default]
    Simulate,
    /// Build the model and hand it to [`SimulationEngine::preview`].
    PreviewOnly,
    /// Reuse data left by an earlier run.
    PostprocessOnly,
}

/// Where the data behind a [`ResultHandle`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOrigin {
    /// Produced by this run.
    Solved,
    /// Model previewed only; the path holds no port data.
    Previewed,
    /// Left by an earlier run.
    Reused,
}

/// Raw-result location for one excitation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHandle {
    /// Pass that produced the data.
    pub pass: ExcitationPass,
    /// Directory holding the solver output.
    pub data_path: PathBuf,
    /// Provenance of the data.
    pub origin: ResultOrigin,
}

/// Runs a list of excitation passes against one engine.
#[derive(Debug)]
pub struct Orchestrator<E> {
    engine: E,
    sim_root: PathBuf,
}

impl<E: SimulationEngine> Orchestrator<E> {
    /// Orchestrator writing per-pass directories below `sim_root`.
    pub fn new(engine: E, sim_root: impl Into<PathBuf>) -> Self {
        Self { engine, sim_root: sim_root.into() }
    }

    /// Engine in use.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Consumes the orchestrator, returning the engine.
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Result directory of `pass`, e.g. `<root>/cpw_excite_1`.
    #[must_use]
    pub fn data_path(&self, spec: &SimulationSpec, pass: &ExcitationPass) -> PathBuf {
        self.sim_root.join(format!("{}_excite_{}", spec.name(), pass.label()))
    }

    /// Runs `passes` in order and returns one handle per pass.
    ///
    /// Passes must be distinct so that no two write the same directory. The
    /// first failing pass aborts the remaining ones.
    pub fn run(&mut self, spec: &SimulationSpec, passes: &[ExcitationPass], mode: RunMode) -> Result<Vec<ResultHandle>> {
        if passes.is_empty() {
            return Err(ConfigError::EmptyExcitation.into());
        }
        let mut seen = HashSet::new();
        for pass in passes {
            if !seen.insert(pass) {
                return Err(ConfigError::DuplicatePass(pass.active().collect()).into());
            }
            if let Some(missing) = pass.active().find(|&n| spec.ports().get(n).is_none()) {
                return Err(ConfigError::UnknownPort(missing).into());
            }
        }

        let mut handles = Vec::with_capacity(passes.len());
        for pass in passes {
            let _span = tracing::info_span!("excitation_pass", ports = %pass.label(), ?mode).entered();
            let data_path = self.data_path(spec, pass);
            let model = spec.model(pass);
            let origin = match mode {
                RunMode::Simulate => {
                    std::fs::create_dir_all(&data_path).map_err(SolverError::from)?;
                    self.engine.run(&model, &data_path)?;
                    ResultOrigin::Solved
                }
                RunMode::PreviewOnly => {
                    std::fs::create_dir_all(&data_path).map_err(SolverError::from)?;
                    self.engine.preview(&model, &data_path)?;
                    ResultOrigin::Previewed
                }
                RunMode::PostprocessOnly => {
                    if !data_path.is_dir() {
                        return Err(SolverError::MissingResults(data_path).into());
                    }
                    ResultOrigin::Reused
                }
            };
            tracing::info!(path = %data_path.display(), ?origin, "pass finished");
            handles.push(ResultHandle { pass: pass.clone(), data_path, origin });
        }
        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CpwError;
    use crate::layout::Polygon;
    use crate::ports::{Direction, PortDescriptor};
    use crate::stackup::{Dielectric, Material, Metal};
    use approx::assert_relative_eq;

    fn inputs() -> ModelInputs {
        let stack = LayerStack::new(
            vec![
                Dielectric { material: Material::lossless("Sub", 11.9), z_bottom: 0.0, thickness: 20.0 },
                Dielectric { material: Material::lossless("Ox", 4.1), z_bottom: 20.0, thickness: 10.0 },
            ],
            vec![Metal { name: "Top".into(), layer: 134, z_bottom: 28.0, thickness: 2.0, conductivity: 3e7 }],
        )
        .unwrap();
        let mut layout = Layout::new();
        layout.insert(Polygon::rect(134, 0, 0.0, 0.0, 6.0, 100.0).unwrap());
        layout.insert(Polygon::rect(201, 0, 0.0, 0.0, 6.0, 2.0).unwrap());
        layout.insert(Polygon::rect(202, 0, 0.0, 98.0, 6.0, 100.0).unwrap());
        let mut ports = PortSet::new();
        ports.add_port(PortDescriptor::new(1, 1.0, 50.0, 201, "Top", Direction::NegY).unwrap()).unwrap();
        ports.add_port(PortDescriptor::new(2, 1.0, 50.0, 202, "Top", Direction::PosY).unwrap()).unwrap();
        ModelInputs {
            name: "line".into(),
            unit: 1e-6,
            layout,
            stack,
            ports,
            mesh: MeshSettings::new(10.0, 1.0, 20.0, 50.0),
            sweep: SweepSettings::new(100e9, 180e9, 81).unwrap(),
            boundaries: Boundaries::default(),
            end_criteria: EndCriteria::default(),
        }
    }

    #[derive(Default)]
    struct Recorder {
        runs: Vec<(String, Vec<PortDrive>)>,
        fail_on: Option<String>,
    }

    impl SimulationEngine for Recorder {
        fn run(&mut self, model: &SolverModel<'_>, _data_path: &Path) -> std::result::Result<(), SolverError> {
            let label = model.pass.label();
            if self.fail_on.as_deref() == Some(label.as_str()) {
                return Err(SolverError::Failed(format!("pass {label}")));
            }
            self.runs.push((label, model.port_drives().map(|(_, d)| d).collect()));
            Ok(())
        }
    }

    fn scratch(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cpw_rlgc_sim_{tag}_{}", std::process::id()))
    }

    #[test]
    fn boundary_strings_parse() {
        let b = Boundaries::parse(&["PML_8", "PML_8", "PML_8", "PML_8", "PEC", "mur"]).unwrap();
        assert_eq!(b.face(Face::ZMin), BoundaryCondition::Pec);
        assert_eq!(b.face(Face::ZMax), BoundaryCondition::Mur);
        assert_eq!(b.face(Face::XMin), BoundaryCondition::Pml(8));
        assert_eq!(b.as_array().len(), 6);
        assert_eq!(BoundaryCondition::Pml(8).to_string(), "PML_8");
        assert!(matches!(Boundaries::parse(&["PEC"; 5]), Err(ConfigError::InvalidParameter { .. })));
        assert_eq!("PML_0".parse::<BoundaryCondition>(), Err(ConfigError::InvalidBoundary("PML_0".into())));
        assert!("ABC".parse::<BoundaryCondition>().is_err());
    }

    #[test]
    fn excitation_spans_the_sweep() {
        let sweep = SweepSettings::new(100e9, 180e9, 801).unwrap();
        let g = GaussianExcitation::from_sweep(&sweep);
        assert_relative_eq!(g.center, 140e9);
        assert_relative_eq!(g.half_bandwidth, 40e9);
        assert!(g.covers(100e9, 180e9));
        assert!(!g.covers(90e9, 180e9));
    }

    #[test]
    fn end_criteria_ratio() {
        assert_relative_eq!(EndCriteria::default().ratio(), 1e-3, max_relative = 1e-12);
        assert!(EndCriteria::new(10.0).is_err());
    }

    #[test]
    fn spec_build_meshes_metals_and_ports() {
        let spec = SimulationSpec::build(inputs()).unwrap();
        for y in [0.0, 2.0, 98.0, 100.0] {
            assert_eq!(spec.mesh().y.occurrences(y), 1);
        }
        assert_eq!(spec.mesh().z.occurrences(28.0), 1);
        assert_eq!(spec.resolved_ports().len(), 2);
        assert_relative_eq!(spec.excitation().center, 140e9);
    }

    #[test]
    fn spec_build_reports_missing_port_geometry() {
        let mut inp = inputs();
        inp.ports.add_port(PortDescriptor::new(3, 1.0, 50.0, 203, "Top", Direction::PosX).unwrap()).unwrap();
        let err = SimulationSpec::build(inp).unwrap_err();
        assert!(matches!(err, CpwError::Config(ConfigError::MissingPortGeometry { port: 3, layer: 203 })));
    }

    #[test]
    fn spec_build_rejects_bad_mesh_settings() {
        let mut inp = inputs();
        inp.mesh = MeshSettings::new(1.0, 2.0, 20.0, 50.0);
        assert!(matches!(SimulationSpec::build(inp), Err(CpwError::Geometry(_))));
    }

    #[test]
    fn passes_run_in_order_with_matched_loads() {
        let spec = SimulationSpec::build(inputs()).unwrap();
        let passes = [spec.ports().excitation_pass(&[1]).unwrap(), spec.ports().excitation_pass(&[2]).unwrap()];
        let root = scratch("order");
        let mut orch = Orchestrator::new(Recorder::default(), &root);
        let handles = orch.run(&spec, &passes, RunMode::Simulate).unwrap();
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].data_path, root.join("line_excite_1"));
        assert_eq!(handles[1].data_path, root.join("line_excite_2"));
        assert!(handles.iter().all(|h| h.origin == ResultOrigin::Solved));
        let runs = &orch.engine().runs;
        assert_eq!(runs[0].1, vec![PortDrive::Active { voltage: 1.0 }, PortDrive::MatchedLoad]);
        assert_eq!(runs[1].1, vec![PortDrive::MatchedLoad, PortDrive::Active { voltage: 1.0 }]);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn duplicate_passes_are_rejected_before_running() {
        let spec = SimulationSpec::build(inputs()).unwrap();
        let p = spec.ports().excitation_pass(&[1]).unwrap();
        let mut orch = Orchestrator::new(Recorder::default(), scratch("dup"));
        let err = orch.run(&spec, &[p.clone(), p], RunMode::Simulate).unwrap_err();
        assert!(matches!(err, CpwError::Config(ConfigError::DuplicatePass(ref v)) if v == &[1]));
        assert!(orch.engine().runs.is_empty());
    }

    #[test]
    fn first_failure_aborts_remaining_passes() {
        let spec = SimulationSpec::build(inputs()).unwrap();
        let passes = [spec.ports().excitation_pass(&[1]).unwrap(), spec.ports().excitation_pass(&[2]).unwrap()];
        let root = scratch("abort");
        let engine = Recorder { fail_on: Some("1".into()), ..Recorder::default() };
        let mut orch = Orchestrator::new(engine, &root);
        assert!(matches!(orch.run(&spec, &passes, RunMode::Simulate), Err(CpwError::Solver(SolverError::Failed(_)))));
        assert!(orch.engine().runs.is_empty());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn postprocess_only_needs_existing_results() {
        let spec = SimulationSpec::build(inputs()).unwrap();
        let passes = [spec.ports().excitation_pass(&[1]).unwrap()];
        let root = scratch("post");
        let mut orch = Orchestrator::new(Recorder::default(), &root);
        assert!(matches!(
            orch.run(&spec, &passes, RunMode::PostprocessOnly),
            Err(CpwError::Solver(SolverError::MissingResults(_)))
        ));
        std::fs::create_dir_all(root.join("line_excite_1")).unwrap();
        let handles = orch.run(&spec, &passes, RunMode::PostprocessOnly).unwrap();
        assert_eq!(handles[0].origin, ResultOrigin::Reused);
        assert!(orch.engine().runs.is_empty());
        std::fs::remove_dir_all(&root).ok();
    }
}

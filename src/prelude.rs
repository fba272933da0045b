//! Convenience re-exports for setting up and post-processing line simulations.

pub use crate::circuits::{SParameters, TransmissionLine, TwoPort, RLGC};
pub use crate::constants::*;
pub use crate::errors::{ConfigError, CpwError, RangeError, Result};
pub use crate::layout::{Bbox, LayerNumber, Layout, Point2, Polygon, Purpose};
pub use crate::math::{unwrap_phase, CScalar, Scalar};
pub use crate::mesh::{GeometryError, Mesh, MeshAxis, MeshGenerator, MeshSettings};
pub use crate::ports::{Axis, Direction, ExcitationPass, PortDescriptor, PortDrive, PortSet, ResolvedPort};
pub use crate::rlgc::{NumericalError, RlgcCurve, RlgcExtractor, RlgcReport};
pub use crate::simulation::{
    BoundaryCondition, Boundaries, EndCriteria, Face, GaussianExcitation, ModelInputs, Orchestrator, ResultHandle,
    ResultOrigin, RunMode, SimulationEngine, SimulationSpec, SolverError, SolverModel,
};
pub use crate::sparams::{
    FrequencySweepResult, PortDataSource, PortSignal, PortSignalReader, PortWaves, SMatrixSweep, SParameterAssembler,
    TimeDomainSource,
};
pub use crate::stackup::{Dielectric, LayerStack, Material, Metal};
pub use crate::sweep::{linspace, mag_db, nearest_index, phase_deg, SweepSettings};

//! 50 Ω coplanar line on a 500 µm substrate, extracted at 140 GHz.
//!
//! The field solver is replaced by an analytic line so the example runs
//! without external tools; swap `AnalyticSolver` for a real engine and
//! `AnalyticLine` for a `TimeDomainSource` to post-process actual runs.

use std::f64::consts::TAU;
use std::path::Path;

use cpw_rlgc::prelude::*;

struct AnalyticSolver;

impl SimulationEngine for AnalyticSolver {
    fn run(&mut self, model: &SolverModel<'_>, data_path: &Path) -> std::result::Result<(), SolverError> {
        let mesh = model.spec.mesh();
        tracing::info!(
            path = %data_path.display(),
            cells = mesh.cell_count(),
            end_ratio = model.spec.end_criteria().ratio(),
            "solver invoked"
        );
        Ok(())
    }
}

struct AnalyticLine(TransmissionLine);

impl PortDataSource for AnalyticLine {
    fn port_waves(&self, handle: &ResultHandle, port: &PortDescriptor, frequencies: &[f64]) -> Result<PortWaves> {
        let driven = handle.pass.single_port().ok_or(ConfigError::EmptyExcitation)? as usize - 1;
        let i = port.number as usize - 1;
        let mut waves = PortWaves { incident: Vec::new(), reflected: Vec::new() };
        for &f in frequencies {
            let s = self
                .0
                .to_twoport(TAU * f)
                .to_s(port.z0)
                .ok_or(NumericalError::ConversionFailed { target: "S", frequency: f })?;
            waves.incident.push(CScalar::new(if i == driven { 1.0 } else { 0.0 }, 0.0));
            waves.reflected.push(s.to_matrix()[i][driven]);
        }
        Ok(waves)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let length_um = 502.0;
    let stack = LayerStack::new(
        vec![
            Dielectric { material: Material::lossless("Substrate", 11.9), z_bottom: 0.0, thickness: 500.0 },
            Dielectric { material: Material::lossless("SiO2", 4.1), z_bottom: 500.0, thickness: 15.0 },
        ],
        vec![Metal { name: "TopMetal2".into(), layer: 134, z_bottom: 512.0, thickness: 3.0, conductivity: 3.0e7 }],
    )?;

    let mut layout = Layout::new();
    for (x0, x1) in [(-49.0, -9.0), (-3.0, 3.0), (9.0, 49.0)] {
        layout.insert(Polygon::rect(134, 0, x0, 0.0, x1, length_um)?);
    }
    layout.insert(Polygon::rect(201, 0, -3.0, 0.0, 3.0, 2.0)?);
    layout.insert(Polygon::rect(202, 0, -3.0, length_um - 2.0, 3.0, length_um)?);

    let mut ports = PortSet::new();
    // Second port points the other way: its ground is on the opposite side.
    ports.add_port(PortDescriptor::new(1, 1.0, 50.0, 201, "TopMetal2", "-y".parse()?)?)?;
    ports.add_port(PortDescriptor::new(2, 1.0, 50.0, 202, "TopMetal2", "y".parse()?)?)?;

    let sweep = SweepSettings::new(100e9, 180e9, 801)?;
    let mesh = MeshSettings::from_wavelength_um(sweep.f_stop, stack.eps_max(), 20.0, 0.5, 50.0)?;
    let spec = SimulationSpec::build(ModelInputs {
        name: "cpw_50Ohm_w6_s6_sub500".into(),
        unit: MICRON,
        layout,
        stack,
        ports,
        mesh,
        sweep,
        boundaries: Boundaries::parse(&["PML_8", "PML_8", "PML_8", "PML_8", "PEC", "PML_8"])?,
        end_criteria: EndCriteria::new(-30.0)?,
    })?;

    let passes = [spec.ports().excitation_pass(&[1])?];
    let sim_root = std::env::temp_dir().join("cpw_rlgc_demo");
    let handles = Orchestrator::new(AnalyticSolver, &sim_root).run(&spec, &passes, RunMode::Simulate)?;

    let line = TransmissionLine::new(
        length_um * MICRON,
        RLGC { r_per_m: 500.0, l_per_m: 2.357e-7, g_per_m: 0.01, c_per_m: 9.43e-11 },
    );
    let result = SParameterAssembler::for_spec(&spec).assemble(&handles, &AnalyticLine(line))?;
    let sweep = result.sweep();
    if let (Some(first), Some(last)) = (sweep.two_port(0), sweep.len().checked_sub(1).and_then(|k| sweep.two_port(k))) {
        println!("S21 at 100 / 180 GHz: {:.3} / {:.3} dB", first.s21_db(), last.s21_db());
    }

    let report = RlgcExtractor::new(length_um * MICRON)?.extract(&result, 140e9)?;
    println!("{report}");
    Ok(())
}

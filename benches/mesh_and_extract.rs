use std::f64::consts::TAU;
use std::path::PathBuf;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cpw_rlgc::prelude::*;

fn layout(length: f64) -> Layout {
    let mut layout = Layout::new();
    for (x0, x1) in [(-49.0, -9.0), (-3.0, 3.0), (9.0, 49.0)] {
        layout.insert(Polygon::rect(134, 0, x0, 0.0, x1, length).unwrap());
    }
    layout
}

fn stack() -> LayerStack {
    LayerStack::new(
        vec![
            Dielectric { material: Material::lossless("Substrate", 11.9), z_bottom: 0.0, thickness: 500.0 },
            Dielectric { material: Material::lossless("SiO2", 4.1), z_bottom: 500.0, thickness: 15.0 },
        ],
        vec![Metal { name: "TopMetal2".into(), layer: 134, z_bottom: 512.0, thickness: 3.0, conductivity: 3.0e7 }],
    )
    .unwrap()
}

fn bench_mesh(c: &mut Criterion) {
    let stack = stack();
    let settings = MeshSettings::from_wavelength_um(180e9, stack.eps_max(), 20.0, 0.5, 50.0).unwrap();
    let generator = MeshGenerator::new(settings).unwrap();
    let mut group = c.benchmark_group("mesh_generation");
    for length in [502.0, 2000.0] {
        let layout = layout(length);
        group.bench_function(BenchmarkId::new("cpw", length), |b| {
            b.iter(|| generator.generate(&layout, &stack, &[134]).unwrap())
        });
    }
    group.finish();
}

struct Line(TransmissionLine);

impl PortDataSource for Line {
    fn port_waves(&self, handle: &ResultHandle, port: &PortDescriptor, frequencies: &[f64]) -> Result<PortWaves> {
        let driven = handle.pass.single_port().unwrap() as usize - 1;
        let i = port.number as usize - 1;
        Ok(PortWaves {
            incident: frequencies.iter().map(|_| CScalar::new(if i == driven { 1.0 } else { 0.0 }, 0.0)).collect(),
            reflected: frequencies
                .iter()
                .map(|&f| self.0.to_twoport(TAU * f).to_s(port.z0).unwrap().to_matrix()[i][driven])
                .collect(),
        })
    }
}

fn bench_extract(c: &mut Criterion) {
    let mut ports = PortSet::new();
    ports.add_port(PortDescriptor::new(1, 1.0, 50.0, 201, "TopMetal2", Direction::NegY).unwrap()).unwrap();
    ports.add_port(PortDescriptor::new(2, 1.0, 50.0, 202, "TopMetal2", Direction::PosY).unwrap()).unwrap();
    let sweep = SweepSettings::new(100e9, 180e9, 801).unwrap();
    let handle = ResultHandle {
        pass: ports.excitation_pass(&[1]).unwrap(),
        data_path: PathBuf::from("bench"),
        origin: ResultOrigin::Solved,
    };
    let line = Line(TransmissionLine::new(502e-6, RLGC { r_per_m: 500.0, l_per_m: 2.357e-7, g_per_m: 0.01, c_per_m: 9.43e-11 }));
    let result = SParameterAssembler::new(&ports, sweep.frequencies(), GaussianExcitation::from_sweep(&sweep))
        .assemble(&[handle], &line)
        .unwrap();
    let extractor = RlgcExtractor::new(502e-6).unwrap();

    c.bench_function("rlgc_extract_801", |b| b.iter(|| extractor.extract(&result, 140e9).unwrap()));
}

criterion_group!(benches, bench_mesh, bench_extract);
criterion_main!(benches);

//! Port waves and assembly of per-pass results into S-matrices.
//!
//! Each excitation pass that drives a single port `j` yields column `j` of
//! the scattering matrix: `S_ij = b_i / a_j`, with `a` the incident and `b`
//! the reflected wave at a port. A two-port whose second port was never
//! driven is completed by mirroring, and the result is tagged accordingly.

use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::path::Path;
use std::sync::Arc;

use nalgebra::DMatrix;

use crate::circuits::twoport::{SParameters, C};
use crate::errors::{ConfigError, CpwError, RangeError, Result};
use crate::math::Scalar;
use crate::ports::{PortDescriptor, PortSet};
use crate::rlgc::NumericalError;
use crate::simulation::{GaussianExcitation, ResultHandle, ResultOrigin, SimulationSpec, SolverError};
use crate::sweep::is_strictly_increasing;

/// Relative deviation of a time step from the first one still counted as uniform.
const SAMPLING_TOLERANCE: Scalar = 1e-6;

/// Voltage and current recorded at one port, uniformly sampled in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PortSignal {
    time: Vec<Scalar>,
    voltage: Vec<Scalar>,
    current: Vec<Scalar>,
}

impl PortSignal {
    /// Validates equal lengths, at least two samples and a uniform, increasing time axis.
    pub fn new(time: Vec<Scalar>, voltage: Vec<Scalar>, current: Vec<Scalar>) -> std::result::Result<Self, ConfigError> {
        if time.len() < 2 || voltage.len() != time.len() || current.len() != time.len() {
            return Err(ConfigError::InvalidParameter {
                name: "port_signal",
                reason: format!(
                    "need matching time/voltage/current series of at least 2 samples, got {}/{}/{}",
                    time.len(),
                    voltage.len(),
                    current.len()
                ),
            });
        }
        if !is_strictly_increasing(&time) {
            return Err(ConfigError::InvalidParameter { name: "port_signal", reason: "time must increase".into() });
        }
        let dt = time[1] - time[0];
        if let Some(k) = time.windows(2).position(|w| ((w[1] - w[0]) - dt).abs() > SAMPLING_TOLERANCE * dt) {
            return Err(ConfigError::InvalidParameter {
                name: "port_signal",
                reason: format!("time step {:.6e} s at sample {k} differs from {dt:.6e} s", time[k + 1] - time[k]),
            });
        }
        Ok(Self { time, voltage, current })
    }

    /// Sample times in seconds.
    #[must_use]
    pub fn time(&self) -> &[Scalar] {
        &self.time
    }

    /// Port voltage at `frequencies`.
    #[must_use]
    pub fn voltage_spectrum(&self, frequencies: &[Scalar]) -> Vec<C> {
        dft(&self.time, &self.voltage, frequencies)
    }

    /// Port current at `frequencies`.
    #[must_use]
    pub fn current_spectrum(&self, frequencies: &[Scalar]) -> Vec<C> {
        dft(&self.time, &self.current, frequencies)
    }

    /// Incident and reflected waves for reference impedance `z0`.
    #[must_use]
    pub fn waves(&self, frequencies: &[Scalar], z0: Scalar) -> PortWaves {
        PortWaves::from_voltage_current(&self.voltage_spectrum(frequencies), &self.current_spectrum(frequencies), z0)
    }
}

/// Single-sided DFT of a uniformly sampled real signal, evaluated at arbitrary frequencies.
fn dft(time: &[Scalar], values: &[Scalar], frequencies: &[Scalar]) -> Vec<C> {
    let dt = (time[time.len() - 1] - time[0]) / (time.len() - 1) as Scalar;
    frequencies
        .iter()
        .map(|&f| {
            let w = TAU * f;
            let sum: C = time.iter().zip(values).map(|(&t, &x)| C::from_polar(x, -w * t)).sum();
            sum * (2.0 * dt)
        })
        .collect()
}

/// Incident and reflected waves at one port over the sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct PortWaves {
    /// Wave travelling into the port, `0.5·(u + Z0·i)`.
    pub incident: Vec<C>,
    /// Wave leaving the port, `u − incident`.
    pub reflected: Vec<C>,
}

impl PortWaves {
    /// Splits port voltage and current into waves.
    #[must_use]
    pub fn from_voltage_current(u: &[C], i: &[C], z0: Scalar) -> Self {
        let incident: Vec<C> = u.iter().zip(i).map(|(&u, &i)| 0.5 * (u + i * z0)).collect();
        let reflected = u.iter().zip(&incident).map(|(&u, &a)| u - a).collect();
        Self { incident, reflected }
    }

    /// Number of frequency samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.incident.len()
    }

    /// True if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.incident.is_empty()
    }
}

/// Provides frequency-domain waves for a finished pass.
pub trait PortDataSource {
    /// Waves at `port` during the pass behind `handle`, one entry per frequency.
    fn port_waves(&self, handle: &ResultHandle, port: &PortDescriptor, frequencies: &[Scalar]) -> Result<PortWaves>;
}

/// Reads raw port time series written by the solver.
pub trait PortSignalReader {
    /// Voltage and current of `port` below `data_path`.
    fn read_signal(&self, data_path: &Path, port: u32) -> Result<PortSignal>;
}

/// [`PortDataSource`] that transforms time-domain solver output.
#[derive(Debug, Clone)]
pub struct TimeDomainSource<R> {
    reader: R,
}

impl<R: PortSignalReader> TimeDomainSource<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: PortSignalReader> PortDataSource for TimeDomainSource<R> {
    fn port_waves(&self, handle: &ResultHandle, port: &PortDescriptor, frequencies: &[Scalar]) -> Result<PortWaves> {
        let signal = self.reader.read_signal(&handle.data_path, port.number)?;
        Ok(signal.waves(frequencies, port.z0))
    }
}

/// Complex S-matrices over a shared frequency axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SMatrixSweep {
    frequencies: Arc<[Scalar]>,
    ports: Vec<u32>,
    z0: Vec<Scalar>,
    matrices: Vec<DMatrix<C>>,
}

impl SMatrixSweep {
    /// Frequency axis, shared with the sweep that produced it.
    #[must_use]
    pub fn frequencies(&self) -> &Arc<[Scalar]> {
        &self.frequencies
    }

    /// Port numbers in matrix order.
    #[must_use]
    pub fn ports(&self) -> &[u32] {
        &self.ports
    }

    /// Reference impedance per port, in matrix order.
    #[must_use]
    pub fn z0(&self) -> &[Scalar] {
        &self.z0
    }

    /// One square matrix per frequency.
    #[must_use]
    pub fn matrices(&self) -> &[DMatrix<C>] {
        &self.matrices
    }

    /// Number of frequency samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// True if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    /// Number of ports.
    #[must_use]
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// `S(dest, source)` over frequency, addressed by port number.
    #[must_use]
    pub fn entry(&self, dest: u32, source: u32) -> Option<Vec<C>> {
        let i = self.ports.iter().position(|&p| p == dest)?;
        let j = self.ports.iter().position(|&p| p == source)?;
        Some(self.matrices.iter().map(|m| m[(i, j)]).collect())
    }

    /// Sample `k` as a two-port; `None` unless the sweep has exactly two ports.
    #[must_use]
    pub fn two_port(&self, k: usize) -> Option<SParameters> {
        let m = self.matrices.get(k)?;
        if self.port_count() != 2 {
            return None;
        }
        Some(SParameters { s11: m[(0, 0)], s12: m[(0, 1)], s21: m[(1, 0)], s22: m[(1, 1)] })
    }
}

/// Assembled S-parameters together with their provenance.
#[derive(Debug, Clone, PartialEq)]
pub enum FrequencySweepResult {
    /// Every column comes from a pass that drove its port.
    Measured(SMatrixSweep),
    /// Two-port completed from the column of `basis_port` by assuming a
    /// symmetric, reciprocal line.
    SymmetryAssumed {
        /// The completed sweep.
        sweep: SMatrixSweep,
        /// The only port that was driven.
        basis_port: u32,
    },
}

impl FrequencySweepResult {
    /// Underlying sweep regardless of provenance.
    #[must_use]
    pub fn sweep(&self) -> &SMatrixSweep {
        match self {
            Self::Measured(sweep) | Self::SymmetryAssumed { sweep, .. } => sweep,
        }
    }

    /// True if no entry was assumed.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured(_))
    }

    /// Driven port of a symmetry-completed result.
    #[must_use]
    pub fn basis_port(&self) -> Option<u32> {
        match self {
            Self::Measured(_) => None,
            Self::SymmetryAssumed { basis_port, .. } => Some(*basis_port),
        }
    }
}

/// Combines per-pass port waves into S-matrices.
#[derive(Debug, Clone)]
pub struct SParameterAssembler<'a> {
    ports: &'a PortSet,
    frequencies: Arc<[Scalar]>,
    excitation: GaussianExcitation,
}

impl<'a> SParameterAssembler<'a> {
    /// Assembler for `ports` on `frequencies`, which `excitation` must cover.
    pub fn new(ports: &'a PortSet, frequencies: Arc<[Scalar]>, excitation: GaussianExcitation) -> Self {
        Self { ports, frequencies, excitation }
    }

    /// Assembler using the ports, sweep and pulse of `spec`.
    pub fn for_spec(spec: &'a SimulationSpec) -> Self {
        Self::new(spec.ports(), spec.sweep().frequencies(), *spec.excitation())
    }

    /// Frequency axis the result will share.
    #[must_use]
    pub fn frequencies(&self) -> &Arc<[Scalar]> {
        &self.frequencies
    }

    /// Builds the S-matrix sweep from the passes behind `handles`.
    ///
    /// Passes driving more than one port carry no single column and are
    /// skipped. A missing column is only tolerated for a two-port, in which
    /// case the result is [`FrequencySweepResult::SymmetryAssumed`].
    pub fn assemble<D: PortDataSource + ?Sized>(&self, handles: &[ResultHandle], source: &D) -> Result<FrequencySweepResult> {
        let _span = tracing::info_span!("assemble_s_parameters", passes = handles.len()).entered();
        let freqs = &self.frequencies;
        let (Some(&first), Some(&last)) = (freqs.first(), freqs.last()) else {
            return Err(ConfigError::InvalidSweep("empty frequency axis".into()).into());
        };
        if !is_strictly_increasing(freqs) {
            return Err(NumericalError::UnorderedSweep.into());
        }
        if !self.excitation.covers(first, last) {
            let (band_start, band_stop) = self.excitation.band();
            return Err(RangeError::SweepOutsideExcitation { start: first, stop: last, band_start, band_stop }.into());
        }

        let numbers = self.ports.numbers();
        let n = numbers.len();
        let nf = freqs.len();
        let index: BTreeMap<u32, usize> = numbers.iter().enumerate().map(|(i, &p)| (p, i)).collect();
        let mut matrices = vec![DMatrix::<C>::zeros(n, n); nf];
        let mut measured = vec![false; n];

        for handle in handles {
            if handle.origin == ResultOrigin::Previewed {
                return Err(SolverError::MissingResults(handle.data_path.clone()).into());
            }
            let Some(driven) = handle.pass.single_port() else {
                tracing::warn!(ports = %handle.pass.label(), "pass drives several ports, skipped");
                continue;
            };
            let (Some(&j), Some(driven_port)) = (index.get(&driven), self.ports.get(driven)) else {
                return Err(ConfigError::UnknownPort(driven).into());
            };
            if measured[j] {
                return Err(ConfigError::DuplicatePass(vec![driven]).into());
            }
            let incident = self.waves(source, handle, driven_port)?.incident;
            if let Some(k) = incident.iter().position(|a| a.norm() == 0.0) {
                return Err(NumericalError::ZeroIncidentWave { port: driven, frequency: freqs[k] }.into());
            }
            for port in self.ports.iter() {
                let i = index[&port.number];
                let reflected = self.waves(source, handle, port)?.reflected;
                for (k, m) in matrices.iter_mut().enumerate() {
                    m[(i, j)] = reflected[k] / incident[k];
                }
            }
            measured[j] = true;
        }

        let z0 = self.ports.iter().map(|p| p.z0).collect();
        let mut sweep = SMatrixSweep { frequencies: Arc::clone(freqs), ports: numbers.clone(), z0, matrices };
        let missing: Vec<u32> = numbers.iter().zip(&measured).filter(|(_, &m)| !m).map(|(&p, _)| p).collect();
        match (n, missing.as_slice()) {
            (_, []) => Ok(FrequencySweepResult::Measured(sweep)),
            (2, [absent]) => {
                let b = usize::from(*absent == numbers[0]);
                let basis_port = numbers[b];
                tracing::warn!(basis_port, unexcited = *absent, "S-matrix completed by symmetry");
                for m in &mut sweep.matrices {
                    let s = SParameters::mirrored_from([m[(0, b)], m[(1, b)]], b + 1);
                    m[(0, 0)] = s.s11;
                    m[(0, 1)] = s.s12;
                    m[(1, 0)] = s.s21;
                    m[(1, 1)] = s.s22;
                }
                Ok(FrequencySweepResult::SymmetryAssumed { sweep, basis_port })
            }
            (_, [absent, ..]) => Err(ConfigError::UnexcitedPort(*absent).into()),
        }
    }

    fn waves<D: PortDataSource + ?Sized>(&self, source: &D, handle: &ResultHandle, port: &PortDescriptor) -> Result<PortWaves> {
        let waves = source.port_waves(handle, port, &self.frequencies)?;
        if waves.incident.len() != self.frequencies.len() || waves.reflected.len() != self.frequencies.len() {
            return Err(CpwError::Range(RangeError::SampleCount {
                expected: self.frequencies.len(),
                found: waves.incident.len().min(waves.reflected.len()),
            }));
        }
        Ok(waves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::TransmissionLine;
    use crate::ports::{Direction, ExcitationPass};
    use crate::sweep::{linspace, SweepSettings};
    use approx::assert_relative_eq;
    use std::path::PathBuf;

    fn two_ports() -> PortSet {
        let mut ports = PortSet::new();
        ports.add_port(PortDescriptor::new(1, 1.0, 50.0, 201, "Top", Direction::NegY).unwrap()).unwrap();
        ports.add_port(PortDescriptor::new(2, 1.0, 50.0, 202, "Top", Direction::PosY).unwrap()).unwrap();
        ports
    }

    fn handle(ports: &PortSet, active: &[u32]) -> ResultHandle {
        let pass: ExcitationPass = ports.excitation_pass(active).unwrap();
        ResultHandle { data_path: PathBuf::from(format!("sim/excite_{}", pass.label())), pass, origin: ResultOrigin::Solved }
    }

    /// Waves of an ideal matched measurement of a known two-port: unit incident
    /// wave at the driven port, nothing incident at the matched one.
    struct KnownNetwork(Vec<SParameters>);

    impl PortDataSource for KnownNetwork {
        fn port_waves(&self, handle: &ResultHandle, port: &PortDescriptor, frequencies: &[Scalar]) -> Result<PortWaves> {
            let driven = handle.pass.single_port().unwrap() as usize - 1;
            let i = port.number as usize - 1;
            let one = C::new(1.0, 0.0);
            Ok(PortWaves {
                incident: frequencies.iter().map(|_| if i == driven { one } else { C::default() }).collect(),
                reflected: self.0.iter().map(|s| s.to_matrix()[i][driven]).collect(),
            })
        }
    }

    fn asymmetric_network(n: usize) -> KnownNetwork {
        KnownNetwork(
            (0..n)
                .map(|k| {
                    let t = k as Scalar * 0.01;
                    SParameters {
                        s11: C::new(0.1, t),
                        s12: C::new(0.8, -t),
                        s21: C::new(0.7, -t),
                        s22: C::new(0.2, 0.5 * t),
                    }
                })
                .collect(),
        )
    }

    fn assembler(ports: &PortSet) -> SParameterAssembler<'_> {
        let sweep = SweepSettings::new(100e9, 180e9, 9).unwrap();
        SParameterAssembler::new(ports, sweep.frequencies(), GaussianExcitation::from_sweep(&sweep))
    }

    #[test]
    fn both_passes_give_a_measured_matrix() {
        let ports = two_ports();
        let net = asymmetric_network(9);
        let asm = assembler(&ports);
        let result = asm.assemble(&[handle(&ports, &[1]), handle(&ports, &[2])], &net).unwrap();
        assert!(result.is_measured());
        let sweep = result.sweep();
        assert!(Arc::ptr_eq(sweep.frequencies(), asm.frequencies()));
        for k in 0..9 {
            assert_eq!(sweep.two_port(k).unwrap(), net.0[k]);
        }
    }

    #[test]
    fn single_pass_is_completed_by_symmetry() {
        let ports = two_ports();
        let net = asymmetric_network(9);
        let result = assembler(&ports).assemble(&[handle(&ports, &[1])], &net).unwrap();
        assert_eq!(result.basis_port(), Some(1));
        let sweep = result.sweep();
        assert_eq!(sweep.entry(2, 2), sweep.entry(1, 1));
        assert_eq!(sweep.entry(1, 2), sweep.entry(2, 1));
        assert_eq!(sweep.entry(1, 1).unwrap()[3], net.0[3].s11);
    }

    #[test]
    fn port_two_pass_mirrors_onto_port_one() {
        let ports = two_ports();
        let net = asymmetric_network(9);
        let result = assembler(&ports).assemble(&[handle(&ports, &[2])], &net).unwrap();
        assert_eq!(result.basis_port(), Some(2));
        let s = result.sweep().two_port(4).unwrap();
        assert_eq!(s.s22, net.0[4].s22);
        assert_eq!(s.s11, s.s22);
        assert_eq!(s.s21, net.0[4].s12);
        assert_eq!(s.s12, s.s21);
    }

    #[test]
    fn three_ports_with_missing_columns_fail() {
        let mut ports = two_ports();
        ports.add_port(PortDescriptor::new(3, 1.0, 50.0, 203, "Top", Direction::PosX).unwrap()).unwrap();
        let h = handle(&ports, &[1]);

        struct Reflectionless;
        impl PortDataSource for Reflectionless {
            fn port_waves(&self, _: &ResultHandle, _: &PortDescriptor, f: &[Scalar]) -> Result<PortWaves> {
                Ok(PortWaves { incident: vec![C::new(1.0, 0.0); f.len()], reflected: vec![C::default(); f.len()] })
            }
        }

        let err = assembler(&ports).assemble(&[h], &Reflectionless).unwrap_err();
        assert!(matches!(err, CpwError::Config(ConfigError::UnexcitedPort(2))));
    }

    #[test]
    fn sweep_outside_the_pulse_band_is_rejected() {
        let ports = two_ports();
        let excited = SweepSettings::new(100e9, 180e9, 9).unwrap();
        let asm = SParameterAssembler::new(&ports, linspace(90e9, 180e9, 10).into(), GaussianExcitation::from_sweep(&excited));
        let err = asm.assemble(&[handle(&ports, &[1])], &asymmetric_network(10)).unwrap_err();
        assert!(matches!(err, CpwError::Range(RangeError::SweepOutsideExcitation { .. })));
    }

    #[test]
    fn previewed_passes_have_no_data() {
        let ports = two_ports();
        let mut h = handle(&ports, &[1]);
        h.origin = ResultOrigin::Previewed;
        let err = assembler(&ports).assemble(&[h], &asymmetric_network(9)).unwrap_err();
        assert!(matches!(err, CpwError::Solver(SolverError::MissingResults(_))));
    }

    #[test]
    fn impulse_has_a_flat_spectrum() {
        let dt = 1e-13;
        let time: Vec<Scalar> = (0..64).map(|k| k as Scalar * dt).collect();
        let mut v = vec![0.0; 64];
        v[0] = 1.0 / (2.0 * dt);
        let mut i = vec![0.0; 64];
        i[3] = 1.0 / (2.0 * dt);
        let sig = PortSignal::new(time, v, i).unwrap();
        let f = [1e9, 50e9, 140e9];
        let u = sig.voltage_spectrum(&f);
        let cur = sig.current_spectrum(&f);
        for (k, &fk) in f.iter().enumerate() {
            assert_relative_eq!(u[k].re, 1.0, epsilon = 1e-12);
            assert_relative_eq!(u[k].im, 0.0, epsilon = 1e-12);
            assert_relative_eq!(cur[k].norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(cur[k].arg(), (-TAU * fk * 3.0 * dt + std::f64::consts::PI).rem_euclid(TAU) - std::f64::consts::PI, epsilon = 1e-9);
        }
    }

    #[test]
    fn matched_port_waves() {
        let u = [C::new(2.0, 0.0)];
        let i = [C::new(2.0 / 50.0, 0.0)];
        let w = PortWaves::from_voltage_current(&u, &i, 50.0);
        assert_relative_eq!(w.incident[0].re, 2.0);
        assert_relative_eq!(w.reflected[0].norm(), 0.0);
    }

    #[test]
    fn line_data_round_trips_through_the_assembler() {
        let ports = two_ports();
        let asm = assembler(&ports);
        let line = TransmissionLine::lossless(500e-6, 2.5e-7, 1e-10);
        let net = KnownNetwork(asm.frequencies().iter().map(|&f| line.to_twoport(TAU * f).to_s(50.0).unwrap()).collect());
        let result = asm.assemble(&[handle(&ports, &[1])], &net).unwrap();
        for k in 0..9 {
            assert_relative_eq!(result.sweep().two_port(k).unwrap().s21.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn signal_validation() {
        assert!(PortSignal::new(vec![0.0], vec![0.0], vec![0.0]).is_err());
        assert!(PortSignal::new(vec![0.0, 1.0], vec![0.0], vec![0.0, 0.0]).is_err());
        assert!(PortSignal::new(vec![1.0, 0.0], vec![0.0; 2], vec![0.0; 2]).is_err());
    }

    #[test]
    fn non_uniform_sampling_is_rejected() {
        let err = PortSignal::new(vec![0.0, 1e-14, 2e-14, 4e-14], vec![0.0; 4], vec![0.0; 4]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "port_signal", .. }));
        let time: Vec<Scalar> = (0..1000).map(|k| k as Scalar * 2e-14).collect();
        assert!(PortSignal::new(time, vec![0.0; 1000], vec![0.0; 1000]).is_ok());
    }

    /// Drives nothing: every incident wave is zero.
    struct DeadPort;

    impl PortDataSource for DeadPort {
        fn port_waves(&self, _handle: &ResultHandle, _port: &PortDescriptor, frequencies: &[Scalar]) -> Result<PortWaves> {
            Ok(PortWaves { incident: vec![C::default(); frequencies.len()], reflected: vec![C::default(); frequencies.len()] })
        }
    }

    #[test]
    fn zero_incident_wave_is_reported() {
        let ports = two_ports();
        let asm = assembler(&ports);
        let err = asm.assemble(&[handle(&ports, &[2])], &DeadPort).unwrap_err();
        match err {
            CpwError::Numerical(e) => assert_eq!(e, NumericalError::ZeroIncidentWave { port: 2, frequency: 100e9 }),
            other => panic!("expected ZeroIncidentWave, got {other:?}"),
        }
    }
}

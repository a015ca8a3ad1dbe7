use super::benchmark::{self, BenchmarkSettings};
use super::config::SimulationConfig;
use super::error::SimulationError;
use super::result::SimulationResult;
use super::updater::Updater;
use crate::core::io::serialization::load_object;
use crate::core::models::integrator::Integrator;
use crate::core::models::state::{State, StateData};
use crate::core::models::system::System;
use crate::core::models::workunit::WorkUnit;
use crate::core::validation::compare_forces_and_energies;
use crate::engine::platform::{PropertyMap, REFERENCE_PLATFORM, is_built_in};
use crate::engine::traits::{Engine, EngineContext};
use crate::engine::NativeEngine;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, instrument, warn};

struct Prepared<C> {
    context: C,
    atoms: usize,
}

/// Logs a progress message and forwards it to the updater.
fn notify(updater: &Updater, text: &str) {
    info!("{}", text);
    updater.message(text);
}

/// One benchmark run on one device: prepares a context, optionally verifies
/// it against the reference platform, then measures throughput.
///
/// At most one context is alive per simulation. It is created by
/// [`prepare`](Self::prepare) and destroyed by the following
/// [`run`](Self::run); every other exit path drops it before returning.
pub struct Simulation<E: Engine = NativeEngine> {
    engine: E,
    config: SimulationConfig,
    prepared: Option<Prepared<E::Context>>,
}

impl Simulation<NativeEngine> {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_engine(NativeEngine::new(), config)
    }
}

impl<E: Engine> Simulation<E> {
    pub fn with_engine(engine: E, config: SimulationConfig) -> Self {
        Self {
            engine,
            config,
            prepared: None,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Mutable access to the configuration, refused while a context is alive.
    pub fn config_mut(&mut self) -> Option<&mut SimulationConfig> {
        match self.prepared {
            Some(_) => None,
            None => Some(&mut self.config),
        }
    }

    pub fn work_unit(&self) -> &WorkUnit {
        &self.config.work_unit
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Human-readable description of the configuration. Depends on the
    /// configuration alone, so it reads the same before and after `prepare`.
    pub fn summary(&self) -> String {
        let config = &self.config;
        let wu = &config.work_unit;
        let mut out = String::new();
        let _ = writeln!(out, "FAHBench Simulation");
        let _ = writeln!(out, "-------------------");
        let _ = writeln!(out, "Plugin directory: {}", config.plugin_dir.display());
        let _ = writeln!(out, "Work unit: {}", wu.codename());
        let _ = writeln!(out, "WU Name: {}", wu.fullname());
        let _ = writeln!(out, "WU Description: {}", wu.description());
        let _ = writeln!(out, "System file: {}", wu.system_path().display());
        let _ = writeln!(out, "Integrator file: {}", wu.integrator_path().display());
        let _ = writeln!(out, "State file: {}", wu.state_path().display());
        let _ = writeln!(out, "Step chunk: {}", wu.step_chunk());
        let _ = write!(
            out,
            "Device ID {}; Platform {}",
            config.device_index, config.platform
        );
        if !is_built_in(&config.platform) {
            let _ = write!(out, "; Platform ID {}", config.platform_index);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Precision: {}", config.precision);
        let _ = writeln!(
            out,
            "Accuracy check: {}",
            if config.verify_accuracy { "enabled" } else { "disabled" }
        );
        let _ = writeln!(out, "NaN check interval: {} steps", config.nan_check_interval);
        let _ = writeln!(out, "Run length: {}s", config.run_length.as_secs_f64());
        out
    }

    /// Builds the context and, when enabled, verifies its forces and energy
    /// against the reference platform.
    ///
    /// Returns `Queued` on success. An already-prepared simulation or an
    /// unknown platform yields `Failed`; cancellation yields `Cancelled`. In
    /// every case other than `Queued` no new context is retained.
    #[instrument(skip_all, name = "simulation_prepare", fields(platform = %self.config.platform))]
    pub fn prepare(&mut self, updater: &Updater) -> Result<SimulationResult, SimulationError> {
        if self.prepared.is_some() {
            warn!("Simulation is already prepared; refusing to prepare again.");
            return Ok(SimulationResult::Failed);
        }

        notify(updater, "Loading plugins from plugin directory");
        self.engine
            .load_plugins_from_directory(&self.config.plugin_dir)?;
        notify(
            updater,
            &format!(
                "Number of registered platforms: {}",
                self.engine.num_platforms()
            ),
        );

        let Some(platform) = self.engine.platform(&self.config.platform) else {
            warn!(platform = %self.config.platform, "Requested platform is not registered.");
            updater.message(&format!("Unknown platform '{}'", self.config.platform));
            return Ok(SimulationResult::Failed);
        };
        let properties = platform.properties_for(
            self.config.precision,
            self.config.device_index,
            self.config.platform_index,
        );

        let wu = &self.config.work_unit;
        notify(updater, "Deserializing input files: system");
        let system: Arc<System> = Arc::new(load_object(wu.system_path())?);
        notify(updater, "Deserializing input files: state");
        let state: State = load_object(wu.state_path())?;
        notify(updater, "Deserializing input files: integrator");
        let integrator: Integrator = load_object(wu.integrator_path())?;
        if updater.cancelled() {
            return Ok(SimulationResult::Cancelled);
        }

        notify(updater, "Creating context (may take several minutes)");
        let mut context =
            self.engine
                .create_context(system.clone(), integrator, &platform.name, &properties)?;
        context.set_state(&state)?;
        if updater.cancelled() {
            return Ok(SimulationResult::Cancelled);
        }

        if self.config.verify_accuracy && !self.verify_accuracy(&system, &state, &mut context, updater)? {
            return Ok(SimulationResult::Cancelled);
        }

        self.prepared = Some(Prepared {
            context,
            atoms: system.num_particles(),
        });
        Ok(SimulationResult::Queued)
    }

    /// Returns `false` if cancelled part way.
    fn verify_accuracy(
        &self,
        system: &Arc<System>,
        state: &State,
        context: &mut E::Context,
        updater: &Updater,
    ) -> Result<bool, SimulationError> {
        notify(updater, "Checking accuracy against reference code");
        notify(updater, "Creating reference context (may take several minutes)");
        let integrator: Integrator = load_object(self.config.work_unit.integrator_path())?;
        let mut reference = self.engine.create_context(
            system.clone(),
            integrator,
            REFERENCE_PLATFORM,
            &PropertyMap::new(),
        )?;
        reference.set_state(state)?;
        if updater.cancelled() {
            return Ok(false);
        }

        notify(updater, "Comparing forces and energy");
        let data = StateData::FORCES | StateData::ENERGY;
        let reference_state = reference.state(data)?;
        let tested_state = context.state(data)?;
        compare_forces_and_energies(&reference_state, &tested_state, &self.config.tolerances)?;
        Ok(!updater.cancelled())
    }

    /// Runs the benchmark, preparing first if needed, and destroys the
    /// context afterwards.
    ///
    /// The final cancellation poll is best-effort: a cancel request that
    /// arrives after the loop exits but before the poll can still turn a
    /// completed run into `Cancelled`, and one the poll misses yields
    /// `Finished`.
    #[instrument(skip_all, name = "simulation_run", fields(platform = %self.config.platform))]
    pub fn run(&mut self, updater: &Updater) -> Result<SimulationResult, SimulationError> {
        if self.prepared.is_none() {
            let outcome = self.prepare(updater)?;
            if outcome != SimulationResult::Queued {
                return Ok(outcome);
            }
        }
        let Some(Prepared { mut context, atoms }) = self.prepared.take() else {
            return Ok(SimulationResult::Failed);
        };

        notify(updater, "Starting Benchmark");
        let settings = BenchmarkSettings {
            step_chunk: self.config.work_unit.step_chunk(),
            nan_check_interval: self.config.nan_check_interval,
            run_length: self.config.run_length,
        };
        let score = benchmark::run(&mut context, &settings, updater);
        drop(context);
        let score = score?;

        if updater.cancelled() {
            return Ok(SimulationResult::Cancelled);
        }
        notify(updater, "Benchmarking finished");
        let result = SimulationResult::Finished { score, atoms };
        info!(score, atoms, "{}", result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::serialization::SerializationError;
    use crate::core::models::state::Vec3;
    use crate::core::validation::ValidationError;
    use crate::engine::error::EngineError;
    use crate::engine::platform::{DeviceInfo, PlatformInfo, CPU_PLATFORM};
    use crate::workflows::result::ResultStatus;
    use crate::workflows::test_support::{ATOMS, write_work_unit};
    use std::cell::{Cell, RefCell};
    use std::path::Path;
    use std::rc::Rc;
    use std::time::{Duration, Instant};
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _dir: TempDir,
        config: SimulationConfig,
    }

    fn fixture(platform: &str, verify: bool, run_ms: u64) -> Fixture {
        fixture_with_chunk(platform, verify, run_ms, 10)
    }

    fn fixture_with_chunk(platform: &str, verify: bool, run_ms: u64, step_chunk: u32) -> Fixture {
        let dir = tempdir().unwrap();
        let work_unit = write_work_unit(dir.path(), "pair", step_chunk);
        let config = SimulationConfig::builder()
            .work_unit(work_unit)
            .platform(platform)
            .verify_accuracy(verify)
            .run_length(Duration::from_millis(run_ms))
            .plugin_dir(dir.path().join("plugins"))
            .build()
            .unwrap();
        Fixture { _dir: dir, config }
    }

    #[derive(Default)]
    struct MockEngine {
        live: Rc<Cell<usize>>,
        created: Rc<RefCell<Vec<String>>>,
        step_counters: Rc<RefCell<Vec<Rc<Cell<u64>>>>>,
        force_offset: f64,
    }

    struct MockContext {
        platform: String,
        live: Rc<Cell<usize>>,
        positions: Vec<Vec3>,
        force_offset: f64,
        step_size: f64,
        steps: Rc<Cell<u64>>,
    }

    impl Drop for MockContext {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    impl EngineContext for MockContext {
        fn platform_name(&self) -> &str {
            &self.platform
        }

        fn set_state(&mut self, state: &State) -> Result<(), EngineError> {
            self.positions = state.positions.clone().unwrap_or_default();
            Ok(())
        }

        fn step_size(&self) -> f64 {
            self.step_size
        }

        fn step(&mut self, steps: u32) -> Result<(), EngineError> {
            std::thread::sleep(Duration::from_millis(1));
            self.steps.set(self.steps.get() + u64::from(steps));
            Ok(())
        }

        fn steps_taken(&self) -> u64 {
            self.steps.get()
        }

        fn state(&mut self, _data: StateData) -> Result<State, EngineError> {
            let n = self.positions.len();
            Ok(State {
                time: 0.0,
                positions: Some(self.positions.clone()),
                velocities: Some(vec![Vec3::zeros(); n]),
                forces: Some(vec![Vec3::new(10.0 + self.force_offset, 0.0, 0.0); n]),
                potential_energy: Some(-3.0),
                kinetic_energy: Some(0.0),
            })
        }
    }

    impl Engine for MockEngine {
        type Context = MockContext;

        fn load_plugins_from_directory(&mut self, _dir: &Path) -> Result<usize, EngineError> {
            Ok(0)
        }

        fn num_platforms(&self) -> usize {
            self.platforms().len()
        }

        fn platforms(&self) -> Vec<PlatformInfo> {
            let host = |name: &str, prefix: Option<&str>| PlatformInfo {
                name: name.to_string(),
                property_prefix: prefix.map(str::to_string),
                sub_platforms: prefix.is_some(),
                devices: vec![DeviceInfo {
                    platform_index: 0,
                    device_index: 0,
                    name: format!("{name} device"),
                    vendor: "Mock".to_string(),
                }],
            };
            vec![host(REFERENCE_PLATFORM, None), host("OpenCL", Some("OpenCL"))]
        }

        fn platform(&self, name: &str) -> Option<PlatformInfo> {
            self.platforms().into_iter().find(|p| p.name == name)
        }

        fn create_context(
            &self,
            _system: Arc<System>,
            integrator: Integrator,
            platform: &str,
            _properties: &PropertyMap,
        ) -> Result<MockContext, EngineError> {
            self.live.set(self.live.get() + 1);
            self.created.borrow_mut().push(platform.to_string());
            let force_offset = if platform == REFERENCE_PLATFORM {
                0.0
            } else {
                self.force_offset
            };
            let steps = Rc::new(Cell::new(0));
            self.step_counters.borrow_mut().push(steps.clone());
            Ok(MockContext {
                platform: platform.to_string(),
                live: self.live.clone(),
                positions: vec![],
                force_offset,
                step_size: integrator.step_size(),
                steps,
            })
        }
    }

    fn mock_simulation(verify: bool, run_ms: u64) -> (Simulation<MockEngine>, Rc<Cell<usize>>, Fixture) {
        let fixture = fixture("OpenCL", verify, run_ms);
        let engine = MockEngine::default();
        let live = engine.live.clone();
        let simulation = Simulation::with_engine(engine, fixture.config.clone());
        (simulation, live, fixture)
    }

    #[test]
    fn second_prepare_fails_without_touching_the_first_context() {
        let (mut simulation, live, _fixture) = mock_simulation(true, 50);
        let updater = Updater::new();

        assert_eq!(simulation.prepare(&updater).unwrap(), SimulationResult::Queued);
        assert_eq!(live.get(), 1);
        assert_eq!(simulation.prepare(&updater).unwrap(), SimulationResult::Failed);
        assert_eq!(live.get(), 1);
        assert!(simulation.is_prepared());
        assert!(simulation.config_mut().is_none());
    }

    #[test]
    fn cancellation_at_every_prepare_checkpoint_leaves_no_context() {
        // With accuracy verification prepare polls four times.
        for cancel_at in 1..=4 {
            let (mut simulation, live, _fixture) = mock_simulation(true, 50);
            let polls = Cell::new(0);
            let updater = Updater::new().on_cancelled(|| {
                polls.set(polls.get() + 1);
                polls.get() >= cancel_at
            });

            let result = simulation.prepare(&updater).unwrap();
            assert_eq!(result, SimulationResult::Cancelled, "checkpoint {cancel_at}");
            assert_eq!(live.get(), 0, "checkpoint {cancel_at}");
            assert!(!simulation.is_prepared());
        }
    }

    #[test]
    fn cancellation_during_run_destroys_the_context() {
        let (mut simulation, live, _fixture) = mock_simulation(false, 10_000);
        assert_eq!(
            simulation.prepare(&Updater::new()).unwrap(),
            SimulationResult::Queued
        );

        let polls = Cell::new(0);
        let updater = Updater::new().on_cancelled(|| {
            polls.set(polls.get() + 1);
            polls.get() > 3
        });
        let result = simulation.run(&updater).unwrap();
        assert_eq!(result.status(), ResultStatus::Cancelled);
        assert_eq!(live.get(), 0);
        assert!(!simulation.is_prepared());
        assert!(simulation.config_mut().is_some());
    }

    #[test]
    fn reference_context_gets_its_own_integrator() {
        let (mut simulation, live, _fixture) = mock_simulation(true, 50);
        let created = simulation.engine().created.clone();
        let counters = simulation.engine().step_counters.clone();

        simulation.prepare(&Updater::new()).unwrap();
        assert_eq!(
            *created.borrow(),
            vec!["OpenCL".to_string(), REFERENCE_PLATFORM.to_string()]
        );
        // The reference context is gone; only the tested one remains.
        assert_eq!(live.get(), 1);
        let prepared = simulation.prepared.as_ref().unwrap();
        assert_eq!(prepared.context.step_size(), 0.002);

        let counters = counters.borrow().clone();
        assert_eq!(counters.len(), 2);
        assert!(!Rc::ptr_eq(&counters[0], &counters[1]));
        assert_eq!(counters[0].get(), 0);
        assert_eq!(counters[1].get(), 0);

        let result = simulation.run(&Updater::new()).unwrap();
        assert_eq!(result.status(), ResultStatus::Finished);
        assert!(counters[0].get() > 0);
        assert_eq!(counters[1].get(), 0);
    }

    #[test]
    fn unknown_platform_fails_without_a_context() {
        let (mut simulation, live, _fixture) = mock_simulation(true, 50);
        simulation.config_mut().unwrap().platform = "Metal".to_string();

        let messages = RefCell::new(Vec::new());
        let updater = Updater::new().on_message(|m| messages.borrow_mut().push(m.to_string()));
        assert_eq!(simulation.prepare(&updater).unwrap(), SimulationResult::Failed);
        assert_eq!(live.get(), 0);
        drop(updater);
        assert!(messages.into_inner().iter().any(|m| m.contains("Metal")));
    }

    #[test]
    fn short_run_on_native_cpu_finishes_with_positive_score() {
        let fixture = fixture(CPU_PLATFORM, false, 200);
        let mut simulation = Simulation::new(fixture.config.clone());

        let result = simulation.run(&Updater::new()).unwrap();
        match result {
            SimulationResult::Finished { score, atoms } => {
                assert!(score > 0.0);
                assert_eq!(atoms, ATOMS);
            }
            other => panic!("expected a finished run, got {other:?}"),
        }
        assert!(!simulation.is_prepared());
    }

    #[test]
    fn native_cpu_run_ends_close_to_the_configured_length() {
        let fixture = fixture_with_chunk(CPU_PLATFORM, false, 5_000, 500);
        let run_length = fixture.config.run_length;
        let mut simulation = Simulation::new(fixture.config.clone());

        let started = Instant::now();
        let result = simulation.run(&Updater::new()).unwrap();
        let elapsed = started.elapsed();

        match result {
            SimulationResult::Finished { score, atoms } => {
                assert!(score > 0.0);
                assert_eq!(atoms, ATOMS);
            }
            other => panic!("expected a finished run, got {other:?}"),
        }
        assert!(elapsed >= run_length, "returned after {elapsed:?}");
        assert!(
            elapsed < run_length + Duration::from_secs(1),
            "returned after {elapsed:?}"
        );
    }

    #[test]
    fn native_cpu_passes_accuracy_check_against_reference() {
        let fixture = fixture(CPU_PLATFORM, true, 50);
        let mut simulation = Simulation::new(fixture.config.clone());
        assert_eq!(
            simulation.prepare(&Updater::new()).unwrap(),
            SimulationResult::Queued
        );
    }

    #[test]
    fn immediate_cancellation_returns_quickly() {
        let (mut simulation, live, _fixture) = mock_simulation(true, 60_000);
        let started = Instant::now();

        let result = simulation.run(&Updater::new().on_cancelled(|| true)).unwrap();
        assert_eq!(result, SimulationResult::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn missing_state_file_is_fatal_and_names_the_path() {
        let (mut simulation, live, fixture) = mock_simulation(true, 50);
        let state_path = fixture.config.work_unit.state_path().to_path_buf();
        std::fs::remove_file(&state_path).unwrap();

        let error = simulation.run(&Updater::new()).unwrap_err();
        match &error {
            SimulationError::Serialization(SerializationError::Io { path, .. }) => {
                assert_eq!(path, &state_path)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(error.to_string().contains("state.toml"));
        assert_eq!(live.get(), 0);
        assert!(!simulation.is_prepared());
    }

    #[test]
    fn accuracy_mismatch_is_fatal_and_drops_both_contexts() {
        let fixture = fixture("OpenCL", true, 50);
        let engine = MockEngine {
            force_offset: 50.0,
            ..MockEngine::default()
        };
        let live = engine.live.clone();
        let mut simulation = Simulation::with_engine(engine, fixture.config.clone());

        let error = simulation.prepare(&Updater::new()).unwrap_err();
        assert!(matches!(
            error,
            SimulationError::Validation(ValidationError::ForceMismatch { .. })
        ));
        assert_eq!(live.get(), 0);
        assert!(!simulation.is_prepared());
    }

    #[test]
    fn summary_is_unchanged_by_prepare_on_a_plugin_platform() {
        let fixture = fixture("OpenCL", false, 50);
        let plugin_dir = fixture.config.plugin_dir.clone();
        std::fs::create_dir_all(&plugin_dir).unwrap();
        std::fs::write(
            plugin_dir.join("opencl.toml"),
            r#"
            name = "OpenCL"
            backend = "cpu"
            property-prefix = "OpenCL"
            sub-platforms = true

            [[devices]]
            platform-index = 0
            device-index = 0
            name = "Radeon RX 580"
            vendor = "Advanced Micro Devices, Inc."
            "#,
        )
        .unwrap();
        let mut simulation = Simulation::new(fixture.config.clone());

        let before = simulation.summary();
        assert_eq!(
            simulation.prepare(&Updater::new()).unwrap(),
            SimulationResult::Queued
        );
        let after = simulation.summary();

        assert_eq!(before, after);
        assert!(before.contains("Device ID 0; Platform OpenCL; Platform ID 0"));
    }

    #[test]
    fn built_in_platforms_show_no_platform_index() {
        let fixture = fixture(CPU_PLATFORM, false, 50);
        let summary = Simulation::new(fixture.config.clone()).summary();
        assert!(summary.contains("Device ID 0; Platform CPU\n"));
        assert!(!summary.contains("Platform ID"));
    }

    #[test]
    fn summary_describes_the_configuration() {
        let (simulation, _live, _fixture) = mock_simulation(true, 2_000);
        let summary = simulation.summary();
        assert!(summary.contains("Work unit: pair"));
        assert!(summary.contains("WU Name: Argon chain"));
        assert!(summary.contains("Step chunk: 10"));
        assert!(summary.contains("Device ID 0; Platform OpenCL; Platform ID 0"));
        assert!(summary.contains("Run length: 2s"));
    }
}

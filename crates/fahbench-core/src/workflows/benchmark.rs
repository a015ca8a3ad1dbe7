use super::error::SimulationError;
use super::updater::Updater;
use crate::core::models::state::StateData;
use crate::core::validation::{check_for_discrepancies, check_for_nans};
use crate::engine::traits::EngineContext;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Loop parameters taken from the configuration and the work unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkSettings {
    pub step_chunk: u32,
    /// Steps between mid-run NaN scans; 0 disables them.
    pub nan_check_interval: u32,
    pub run_length: Duration,
}

/// Simulated nanoseconds per wall-clock day.
pub fn ns_per_day(steps: u64, ns_per_step: f64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if steps == 0 || seconds <= 0.0 {
        return 0.0;
    }
    steps as f64 * ns_per_step / (seconds / SECONDS_PER_DAY)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Runs the timed throughput loop on a prepared context and returns the
/// score in ns/day.
///
/// The context advances `step_chunk` steps between cancellation polls. Once
/// the loop exits, a final snapshot is always taken so that queued device
/// work has completed before the clock is read. Correctness checks on that
/// snapshot are skipped for cancelled runs.
#[instrument(skip_all, name = "benchmark_loop")]
pub fn run<C: EngineContext>(
    context: &mut C,
    settings: &BenchmarkSettings,
    updater: &Updater,
) -> Result<f64, SimulationError> {
    let ns_per_step = context.step_size() / 1000.0;
    let total_ms = millis(settings.run_length);
    let chunk = settings.step_chunk;
    let interval = u64::from(settings.nan_check_interval);

    // Warm-up: absorbs kernel compilation and first-touch allocations.
    context.step(1)?;

    let start = Instant::now();
    let mut steps: u64 = 0;
    let mut last_nan_check: u64 = 0;
    while !updater.cancelled() {
        context.step(chunk)?;
        steps += u64::from(chunk);

        let elapsed = start.elapsed();
        if elapsed > settings.run_length {
            break;
        }
        updater.progress(
            millis(elapsed),
            total_ms,
            ns_per_day(steps, ns_per_step, elapsed),
        );

        if interval > 0 && steps - last_nan_check >= interval {
            let snapshot =
                context.state(StateData::POSITIONS | StateData::VELOCITIES | StateData::FORCES)?;
            check_for_nans(&snapshot)?;
            debug!(steps, "Mid-run NaN scan passed.");
            last_nan_check = steps;
        }
    }

    let final_state = context.state(StateData::all())?;
    let score = ns_per_day(steps, ns_per_step, start.elapsed());

    if !updater.cancelled() {
        check_for_nans(&final_state)?;
        check_for_discrepancies(&final_state)?;
    }

    info!(steps, score, "Benchmark loop finished.");
    updater.progress(total_ms, total_ms, score);
    Ok(score)
}

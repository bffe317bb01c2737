use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use combat_core::{Clock, CombatSession, ConfigError, FixedStepClock};
use thiserror::Error;
use tracing::{error, info};

use super::autopilot::Autopilot;
use super::bootstrap::{AppWiring, RunConfig};
use super::metrics::TickMetricsAccumulator;
use super::observer::LoggingObserver;
use super::report::{write_summary, RunSummary};

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to encode run summary: {0}")]
    EncodeReport(#[from] serde_json::Error),
    #[error("failed to write run summary {path}: {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_session(&app.run) {
        Ok(summary) => {
            info!(
                level = summary.level,
                score = summary.score,
                kills = summary.kills,
                game_over = summary.game_over,
                ticks = summary.ticks,
                "run_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run_failed");
            ExitCode::FAILURE
        }
    }
}

/// Runs one headless session to the configured length or to game over.
pub(crate) fn run_session(run: &RunConfig) -> Result<RunSummary, AppError> {
    let mut session = CombatSession::new(run.session.clone())?;
    session.add_observer(Box::new(LoggingObserver::new(session.player_id())));
    let mut autopilot = Autopilot::new(&session);

    let mut clock = FixedStepClock::from_hz(run.target_tps);
    let total_ticks = (f64::from(run.run_seconds) * f64::from(run.target_tps.max(1))).ceil() as u64;
    let mut metrics = TickMetricsAccumulator::new(run.metrics_log_interval, Instant::now());

    session.start(clock.now_ms());
    for _ in 0..total_ticks {
        let tick_start = Instant::now();
        clock.advance();
        autopilot.drive(&mut session);
        session.tick(&clock);

        let now = Instant::now();
        metrics.record_tick(now.saturating_duration_since(tick_start));
        if let Some(snapshot) = metrics.maybe_snapshot(now) {
            let wave = session.wave_state();
            info!(
                tps = snapshot.tps,
                tick_time_ms = snapshot.tick_time_ms,
                level = wave.level,
                enemies = session.living_enemy_count(),
                "loop_metrics"
            );
        }
        if session.is_game_over() {
            break;
        }
    }

    let summary = RunSummary::from_session(&session, clock.elapsed().as_secs_f32());
    if let Some(path) = &run.report_path {
        write_summary(path, &summary)?;
        info!(path = %path.display(), "run_summary_written");
    }
    Ok(summary)
}

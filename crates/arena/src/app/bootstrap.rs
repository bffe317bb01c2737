use std::env;
use std::path::PathBuf;
use std::time::Duration;

use combat_core::{load_session_config, SessionConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::loop_runner::AppError;

pub(crate) const CONFIG_ENV_VAR: &str = "ARENA_CONFIG";
pub(crate) const RUN_SECONDS_ENV_VAR: &str = "ARENA_RUN_SECONDS";
pub(crate) const REPORT_ENV_VAR: &str = "ARENA_REPORT";

const DEFAULT_RUN_SECONDS: f32 = 60.0;

#[derive(Debug, Clone)]
pub(crate) struct RunConfig {
    pub(crate) session: SessionConfig,
    pub(crate) run_seconds: f32,
    pub(crate) target_tps: u32,
    pub(crate) metrics_log_interval: Duration,
    pub(crate) report_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            run_seconds: DEFAULT_RUN_SECONDS,
            target_tps: 60,
            metrics_log_interval: Duration::from_secs(1),
            report_path: None,
        }
    }
}

pub(crate) struct AppWiring {
    pub(crate) run: RunConfig,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Arena Startup ===");

    let session = match env::var_os(CONFIG_ENV_VAR) {
        Some(path) => load_session_config(&PathBuf::from(path))?,
        None => {
            info!(env_var = CONFIG_ENV_VAR, "session_config_defaulted");
            SessionConfig::default()
        }
    };
    let run = RunConfig {
        session,
        run_seconds: parse_run_seconds(env::var(RUN_SECONDS_ENV_VAR).ok().as_deref()),
        report_path: env::var_os(REPORT_ENV_VAR).map(PathBuf::from),
        ..RunConfig::default()
    };
    info!(
        run_seconds = run.run_seconds,
        target_tps = run.target_tps,
        seed = run.session.seed,
        "run_configured"
    );

    Ok(AppWiring { run })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_run_seconds(raw: Option<&str>) -> f32 {
    let Some(raw) = raw else {
        return DEFAULT_RUN_SECONDS;
    };
    match raw.trim().parse::<f32>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => seconds,
        _ => {
            warn!(
                env_var = RUN_SECONDS_ENV_VAR,
                value = raw,
                "invalid run length env var value; falling back to default"
            );
            DEFAULT_RUN_SECONDS
        }
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use combat_core::{CombatSession, EventCounts};
use serde::Serialize;

use super::loop_runner::AppError;

/// End-of-run summary written next to the log for scripted comparisons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) seed: u64,
    pub(crate) level: u32,
    pub(crate) score: u64,
    pub(crate) kills: u32,
    pub(crate) game_over: bool,
    pub(crate) player_health: f32,
    pub(crate) ticks: u64,
    pub(crate) simulated_seconds: f32,
    pub(crate) events: EventCounts,
}

impl RunSummary {
    pub(crate) fn from_session(session: &CombatSession, simulated_seconds: f32) -> Self {
        let wave = session.wave_state();
        Self {
            seed: session.config().seed,
            level: wave.level,
            score: wave.score,
            kills: wave.kills,
            game_over: session.is_game_over(),
            player_health: session
                .player()
                .map(|player| player.health.current())
                .unwrap_or(0.0),
            ticks: session.tick_count(),
            simulated_seconds,
            events: session.total_event_counts(),
        }
    }
}

pub(crate) fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(summary)?;
    write_text_atomic(path, &text).map_err(|source| AppError::WriteReport {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes through a sibling temp file so readers never see a partial report.
fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text)?;

    match fs::remove_file(path) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(error);
        }
    }
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("report.json");
    path.with_file_name(format!("{file_name}.tmp"))
}

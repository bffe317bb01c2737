use combat_core::{ActorId, ActorKind, AiState, CombatObserver};
use glam::Vec3;
use tracing::{debug, info};

/// Mirrors session events into the log.
#[derive(Debug)]
pub(crate) struct LoggingObserver {
    player_id: ActorId,
    player_damage_taken: f32,
}

impl LoggingObserver {
    pub(crate) fn new(player_id: ActorId) -> Self {
        Self {
            player_id,
            player_damage_taken: 0.0,
        }
    }
}

impl CombatObserver for LoggingObserver {
    fn on_damage(&mut self, actor_id: ActorId, amount: f32, point: Vec3) {
        debug!(
            actor_id = actor_id.0,
            amount,
            x = point.x,
            y = point.y,
            z = point.z,
            "actor_damaged"
        );
        if actor_id == self.player_id {
            self.player_damage_taken += amount;
        }
    }

    fn on_death(&mut self, actor_id: ActorId, kind: ActorKind) {
        match kind {
            ActorKind::Player => info!(
                actor_id = actor_id.0,
                damage_taken = self.player_damage_taken,
                "player_died"
            ),
            ActorKind::Enemy => debug!(actor_id = actor_id.0, "enemy_died"),
        }
    }

    fn on_state_change(&mut self, actor_id: ActorId, from: AiState, to: AiState) {
        debug!(
            actor_id = actor_id.0,
            from = from.name(),
            to = to.name(),
            "enemy_state_observed"
        );
    }

    fn on_level_complete(&mut self, level: u32, bonus: u64) {
        info!(level, bonus, "level_complete");
    }

    fn on_game_over(&mut self, level: u32, final_score: u64) {
        info!(level, final_score, "game_over");
    }
}

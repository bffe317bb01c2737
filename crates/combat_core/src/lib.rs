pub mod combat;
pub mod config;
pub mod sim;

pub use combat::{
    apply_damage, area_damage_at, evaluate_state, flee_force, heal, penetration_damage,
    resolve_area_damage, seek_force, separation_force, AiState, AmmoReserve, BehaviorKind,
    BehaviorSlot, BrainOutcome, BrainTarget, DamageResult, EnemyBrain, EnemyStats, FireBlocked,
    FireResult, Health, HitDamage, Projectile, ShotContext, SpawnOrder, SteeringAgent,
    SteeringTarget, StuckDetector, WaveDirector, WavePhase, WaveState, Weapon,
};
pub use config::{
    load_session_config, parse_session_config, AiConfig, ArenaConfig, CombatPolicy, ConfigError,
    DifficultyConfig, EnemyArchetype, EnemyConfig, Obstacle, PlayerConfig, ProjectileConfig,
    SessionConfig, SteeringConfig, StuckConfig, WaveConfig, WeaponConfig, WeaponKind,
};
pub use sim::{
    horizontal_distance, Actor, ActorId, ActorKind, Clock, CombatEvent, CombatEventKind,
    CombatIntent, CombatIntentKind, CombatObserver, CombatSession, EventBus, EventCounts,
    FixedStepClock, IntentApplyStats, IntentQueue, ManualClock, RayHit, SpatialQuery, SphereQuery,
    Team, TickSystemId, World, WeaponId, TICK_SYSTEM_ORDER,
};

/// Converts a configured duration in seconds to whole simulation milliseconds.
///
/// Negative and non-finite inputs collapse to zero so deadlines never wrap.
pub fn seconds_to_ms(seconds: f32) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds as f64 * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_to_ms_rounds_and_clamps() {
        assert_eq!(seconds_to_ms(0.5), 500);
        assert_eq!(seconds_to_ms(2.5), 2_500);
        assert_eq!(seconds_to_ms(0.0001), 0);
        assert_eq!(seconds_to_ms(-1.0), 0);
        assert_eq!(seconds_to_ms(f32::NAN), 0);
    }
}

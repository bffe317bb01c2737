mod ai;
mod health;
mod projectile;
mod steering;
mod waves;
mod weapon;

pub use ai::{evaluate_state, AiState, BrainOutcome, BrainTarget, EnemyBrain};
pub use health::{apply_damage, heal, DamageResult, Health};
pub use projectile::Projectile;
pub use steering::{
    flee_force, seek_force, separation_force, BehaviorKind, BehaviorSlot, SteeringAgent,
    SteeringTarget, StuckDetector,
};
pub use waves::{EnemyStats, SpawnOrder, WaveDirector, WavePhase, WaveState};
pub use weapon::{
    area_damage_at, penetration_damage, resolve_area_damage, AmmoReserve, FireBlocked, FireResult,
    HitDamage, ShotContext, Weapon,
};

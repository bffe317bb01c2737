mod loader;
mod types;

pub use loader::{load_session_config, parse_session_config};
pub use types::{
    AiConfig, ArenaConfig, CombatPolicy, ConfigError, DifficultyConfig, EnemyArchetype,
    EnemyConfig, Obstacle, PlayerConfig, ProjectileConfig, SessionConfig, SteeringConfig, StuckConfig, WaveConfig,
    WeaponConfig, WeaponKind,
};

use std::path::PathBuf;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config json at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid config value at {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: f32,
    pub move_speed: f32,
    pub radius: f32,
    pub height: f32,
    pub eye_height: f32,
    pub spawn_position: Vec3,
    pub regen_delay_seconds: f32,
    pub regen_per_second: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            move_speed: 5.0,
            radius: 0.5,
            height: 1.8,
            eye_height: 1.6,
            spawn_position: Vec3::ZERO,
            regen_delay_seconds: 5.0,
            regen_per_second: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub detection_range: f32,
    pub attack_range: f32,
    pub attack_cooldown_seconds: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            detection_range: 20.0,
            attack_range: 2.0,
            attack_cooldown_seconds: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub max_force: f32,
    pub mass: f32,
    pub seek_weight: f32,
    pub flee_weight: f32,
    pub separation_weight: f32,
    pub panic_distance: f32,
    pub neighborhood_radius: f32,
    /// Fraction of knockback velocity shed per second.
    pub knockback_damping: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            max_force: 10.0,
            mass: 1.0,
            seek_weight: 1.0,
            flee_weight: 1.0,
            separation_weight: 1.0,
            panic_distance: 10.0,
            neighborhood_radius: 1.5,
            knockback_damping: 6.0,
        }
    }
}

/// Escape heuristic for agents that stop making progress while chasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StuckConfig {
    pub enabled: bool,
    pub sample_interval_seconds: f32,
    pub min_progress: f32,
    pub stuck_limit_seconds: f32,
    pub jitter: f32,
    pub boost_multiplier: f32,
    pub boost_duration_seconds: f32,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_interval_seconds: 0.1,
            min_progress: 0.05,
            stuck_limit_seconds: 2.0,
            jitter: 0.5,
            boost_multiplier: 1.5,
            boost_duration_seconds: 0.5,
        }
    }
}

/// One spawnable enemy type at level zero, before difficulty scaling.
///
/// Spawn weight at a level is `weight + weight_per_level * level`, clamped to
/// `[min_weight, max_weight]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyArchetype {
    pub name: String,
    pub health: f32,
    pub speed: f32,
    pub attack_damage: f32,
    pub radius: f32,
    pub height: f32,
    pub score_value: u64,
    pub weight: f32,
    pub weight_per_level: f32,
    pub min_weight: f32,
    pub max_weight: f32,
}

impl Default for EnemyArchetype {
    fn default() -> Self {
        Self::basic()
    }
}

impl EnemyArchetype {
    pub fn basic() -> Self {
        Self {
            name: "basic".to_string(),
            health: 100.0,
            speed: 2.0,
            attack_damage: 10.0,
            radius: 0.5,
            height: 1.8,
            score_value: 10,
            weight: 0.7,
            weight_per_level: -0.05,
            min_weight: 0.3,
            max_weight: 1.0,
        }
    }

    pub fn fast() -> Self {
        Self {
            name: "fast".to_string(),
            health: 70.0,
            speed: 3.5,
            attack_damage: 8.0,
            radius: 0.3,
            height: 1.4,
            score_value: 15,
            weight: 0.2,
            weight_per_level: 0.0,
            min_weight: 0.0,
            max_weight: 1.0,
        }
    }

    pub fn heavy() -> Self {
        Self {
            name: "heavy".to_string(),
            health: 200.0,
            speed: 1.2,
            attack_damage: 15.0,
            radius: 0.6,
            height: 2.0,
            score_value: 20,
            weight: 0.1,
            weight_per_level: 0.03,
            min_weight: 0.0,
            max_weight: 0.4,
        }
    }

    pub fn weight_at(&self, level: u32) -> f32 {
        (self.weight + self.weight_per_level * level as f32)
            .max(self.min_weight)
            .min(self.max_weight)
    }
}

/// Enemy roster plus the behaviour tuning shared by every type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// The first entry is used for enemies placed outside the spawn schedule.
    pub types: Vec<EnemyArchetype>,
    pub ai: AiConfig,
    pub steering: SteeringConfig,
    pub stuck: StuckConfig,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            types: vec![
                EnemyArchetype::basic(),
                EnemyArchetype::fast(),
                EnemyArchetype::heavy(),
            ],
            ai: AiConfig::default(),
            steering: SteeringConfig::default(),
            stuck: StuckConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    #[default]
    HitScan,
    Launcher,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub upward_speed: f32,
    pub gravity: f32,
    pub lifetime_seconds: f32,
    pub blast_radius: f32,
    pub collision_radius: f32,
    pub ground_height: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 15.0,
            upward_speed: 2.0,
            gravity: 9.8,
            lifetime_seconds: 10.0,
            blast_radius: 5.0,
            collision_radius: 0.2,
            ground_height: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub name: String,
    pub kind: WeaponKind,
    pub damage: f32,
    pub cooldown_seconds: f32,
    pub range: f32,
    pub clip_size: u32,
    /// Reserve rounds outside the clip; `-1` means an infinite reserve.
    pub ammo: i64,
    pub reload_seconds: f32,
    pub auto_reload: bool,
    /// Damage multiplier per successive hit along the ray, nearest first.
    pub penetration_falloff: Vec<f32>,
    pub projectile: ProjectileConfig,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            name: "rifle".to_string(),
            kind: WeaponKind::HitScan,
            damage: 25.0,
            cooldown_seconds: 0.5,
            range: 50.0,
            clip_size: 30,
            ammo: -1,
            reload_seconds: 2.0,
            auto_reload: true,
            penetration_falloff: vec![1.0, 0.5, 0.1],
            projectile: ProjectileConfig::default(),
        }
    }
}

impl WeaponConfig {
    pub fn bomb_launcher() -> Self {
        Self {
            name: "bomb_launcher".to_string(),
            kind: WeaponKind::Launcher,
            damage: 75.0,
            cooldown_seconds: 1.0,
            range: 0.0,
            clip_size: 3,
            ammo: 9,
            reload_seconds: 3.0,
            auto_reload: true,
            penetration_falloff: vec![1.0],
            projectile: ProjectileConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub start_level: u32,
    pub enemies_per_level: u32,
    pub max_active: u32,
    pub base_spawn_interval_seconds: f32,
    pub min_spawn_interval_seconds: f32,
    pub start_delay_seconds: f32,
    pub next_level_delay_seconds: f32,
    pub level_bonus_per_level: u64,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            start_level: 1,
            enemies_per_level: 5,
            max_active: 10,
            base_spawn_interval_seconds: 3.0,
            min_spawn_interval_seconds: 0.5,
            start_delay_seconds: 2.0,
            next_level_delay_seconds: 5.0,
            level_bonus_per_level: 100,
        }
    }
}

/// Per-level growth rates; every multiplier is `1 + rate * level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub health_per_level: f32,
    pub speed_per_level: f32,
    pub attack_per_level: f32,
    pub attack_interval_reduction_per_level: f32,
    pub min_attack_interval_seconds: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            health_per_level: 0.2,
            speed_per_level: 0.1,
            attack_per_level: 0.15,
            attack_interval_reduction_per_level: 0.05,
            min_attack_interval_seconds: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Vec3,
    pub radius: f32,
    #[serde(default = "default_obstacle_height")]
    pub height: f32,
}

fn default_obstacle_height() -> f32 {
    2.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub center: Vec3,
    pub spawn_radius: f32,
    pub min_player_distance: f32,
    pub obstacle_margin: f32,
    pub max_spawn_attempts: u32,
    pub obstacles: Vec<Obstacle>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            spawn_radius: 20.0,
            min_player_distance: 10.0,
            obstacle_margin: 1.0,
            max_spawn_attempts: 10,
            obstacles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatPolicy {
    pub death_removal_delay_seconds: f32,
    /// Scale applied to area damage the firing actor deals to itself; 0 disables it.
    pub self_damage_scale: f32,
    pub knockback_impulse: f32,
}

impl Default for CombatPolicy {
    fn default() -> Self {
        Self {
            death_removal_delay_seconds: 2.5,
            self_damage_scale: 1.0 / 3.0,
            knockback_impulse: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub seed: u64,
    pub player: PlayerConfig,
    pub enemy: EnemyConfig,
    pub weapons: Vec<WeaponConfig>,
    pub waves: WaveConfig,
    pub difficulty: DifficultyConfig,
    pub arena: ArenaConfig,
    pub combat: CombatPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            player: PlayerConfig::default(),
            enemy: EnemyConfig::default(),
            weapons: vec![WeaponConfig::default(), WeaponConfig::bomb_launcher()],
            waves: WaveConfig::default(),
            difficulty: DifficultyConfig::default(),
            arena: ArenaConfig::default(),
            combat: CombatPolicy::default(),
        }
    }
}

fn require_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("expected > 0, got {value}")))
    }
}

fn require_non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("expected >= 0, got {value}")))
    }
}

fn require_finite_vec(field: &str, value: Vec3) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "expected finite coordinates"))
    }
}

impl PlayerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("player.max_health", self.max_health)?;
        require_non_negative("player.move_speed", self.move_speed)?;
        require_positive("player.radius", self.radius)?;
        require_positive("player.height", self.height)?;
        require_non_negative("player.eye_height", self.eye_height)?;
        require_finite_vec("player.spawn_position", self.spawn_position)?;
        require_non_negative("player.regen_delay_seconds", self.regen_delay_seconds)?;
        require_non_negative("player.regen_per_second", self.regen_per_second)
    }
}

impl EnemyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.types.is_empty() {
            return Err(ConfigError::invalid("enemy.types", "expected at least one type"));
        }
        for (index, archetype) in self.types.iter().enumerate() {
            archetype.validate(index)?;
        }

        require_positive("enemy.ai.detection_range", self.ai.detection_range)?;
        require_non_negative("enemy.ai.attack_range", self.ai.attack_range)?;
        require_non_negative(
            "enemy.ai.attack_cooldown_seconds",
            self.ai.attack_cooldown_seconds,
        )?;
        if self.ai.attack_range > self.ai.detection_range {
            return Err(ConfigError::invalid(
                "enemy.ai.attack_range",
                format!(
                    "attack range {} exceeds detection range {}",
                    self.ai.attack_range, self.ai.detection_range
                ),
            ));
        }

        require_positive("enemy.steering.max_force", self.steering.max_force)?;
        require_positive("enemy.steering.mass", self.steering.mass)?;
        require_positive(
            "enemy.steering.knockback_damping",
            self.steering.knockback_damping,
        )?;
        require_non_negative("enemy.steering.seek_weight", self.steering.seek_weight)?;
        require_non_negative("enemy.steering.flee_weight", self.steering.flee_weight)?;
        require_non_negative(
            "enemy.steering.separation_weight",
            self.steering.separation_weight,
        )?;
        require_non_negative("enemy.steering.panic_distance", self.steering.panic_distance)?;
        require_non_negative(
            "enemy.steering.neighborhood_radius",
            self.steering.neighborhood_radius,
        )?;

        require_positive(
            "enemy.stuck.sample_interval_seconds",
            self.stuck.sample_interval_seconds,
        )?;
        require_non_negative("enemy.stuck.min_progress", self.stuck.min_progress)?;
        require_non_negative("enemy.stuck.stuck_limit_seconds", self.stuck.stuck_limit_seconds)?;
        require_non_negative("enemy.stuck.jitter", self.stuck.jitter)?;
        if !(self.stuck.boost_multiplier.is_finite() && self.stuck.boost_multiplier >= 1.0) {
            return Err(ConfigError::invalid(
                "enemy.stuck.boost_multiplier",
                format!("expected >= 1, got {}", self.stuck.boost_multiplier),
            ));
        }
        require_non_negative(
            "enemy.stuck.boost_duration_seconds",
            self.stuck.boost_duration_seconds,
        )
    }
}

impl EnemyArchetype {
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let field = |name: &str| format!("enemy.types[{index}].{name}");
        require_positive(&field("health"), self.health)?;
        require_non_negative(&field("speed"), self.speed)?;
        require_non_negative(&field("attack_damage"), self.attack_damage)?;
        require_positive(&field("radius"), self.radius)?;
        require_positive(&field("height"), self.height)?;
        require_non_negative(&field("weight"), self.weight)?;
        require_non_negative(&field("min_weight"), self.min_weight)?;
        require_non_negative(&field("max_weight"), self.max_weight)?;
        if !self.weight_per_level.is_finite() {
            return Err(ConfigError::invalid(
                &field("weight_per_level"),
                format!("expected a finite rate, got {}", self.weight_per_level),
            ));
        }
        if self.min_weight > self.max_weight {
            return Err(ConfigError::invalid(
                &field("min_weight"),
                format!(
                    "min weight {} exceeds max weight {}",
                    self.min_weight, self.max_weight
                ),
            ));
        }
        Ok(())
    }
}

impl WeaponConfig {
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let field = |name: &str| format!("weapons[{index}].{name}");
        require_non_negative(&field("damage"), self.damage)?;
        require_non_negative(&field("cooldown_seconds"), self.cooldown_seconds)?;
        require_non_negative(&field("reload_seconds"), self.reload_seconds)?;
        if self.clip_size == 0 {
            return Err(ConfigError::invalid(&field("clip_size"), "expected >= 1, got 0"));
        }
        if self.ammo < -1 {
            return Err(ConfigError::invalid(
                &field("ammo"),
                format!("expected -1 (infinite) or >= 0, got {}", self.ammo),
            ));
        }
        match self.kind {
            WeaponKind::HitScan => {
                require_positive(&field("range"), self.range)?;
                if self.penetration_falloff.is_empty() {
                    return Err(ConfigError::invalid(
                        &field("penetration_falloff"),
                        "expected at least one multiplier",
                    ));
                }
                for (slot, multiplier) in self.penetration_falloff.iter().enumerate() {
                    if !(multiplier.is_finite() && (0.0..=1.0).contains(multiplier)) {
                        return Err(ConfigError::invalid(
                            &field(&format!("penetration_falloff[{slot}]")),
                            format!("expected within [0, 1], got {multiplier}"),
                        ));
                    }
                }
            }
            WeaponKind::Launcher => {
                let projectile = &self.projectile;
                require_non_negative(&field("projectile.speed"), projectile.speed)?;
                require_non_negative(&field("projectile.gravity"), projectile.gravity)?;
                require_positive(&field("projectile.lifetime_seconds"), projectile.lifetime_seconds)?;
                require_positive(&field("projectile.blast_radius"), projectile.blast_radius)?;
                require_positive(&field("projectile.collision_radius"), projectile.collision_radius)?;
                if !projectile.upward_speed.is_finite() || !projectile.ground_height.is_finite() {
                    return Err(ConfigError::invalid(
                        &field("projectile"),
                        "expected finite upward_speed and ground_height",
                    ));
                }
            }
        }
        Ok(())
    }
}

impl WaveConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.start_level == 0 {
            return Err(ConfigError::invalid("waves.start_level", "expected >= 1, got 0"));
        }
        if self.max_active == 0 {
            return Err(ConfigError::invalid("waves.max_active", "expected >= 1, got 0"));
        }
        require_positive(
            "waves.base_spawn_interval_seconds",
            self.base_spawn_interval_seconds,
        )?;
        require_non_negative(
            "waves.min_spawn_interval_seconds",
            self.min_spawn_interval_seconds,
        )?;
        require_non_negative("waves.start_delay_seconds", self.start_delay_seconds)?;
        require_non_negative("waves.next_level_delay_seconds", self.next_level_delay_seconds)
    }
}

impl DifficultyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("difficulty.health_per_level", self.health_per_level)?;
        require_non_negative("difficulty.speed_per_level", self.speed_per_level)?;
        require_non_negative("difficulty.attack_per_level", self.attack_per_level)?;
        require_non_negative(
            "difficulty.attack_interval_reduction_per_level",
            self.attack_interval_reduction_per_level,
        )?;
        require_non_negative(
            "difficulty.min_attack_interval_seconds",
            self.min_attack_interval_seconds,
        )
    }
}

impl ArenaConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_finite_vec("arena.center", self.center)?;
        require_positive("arena.spawn_radius", self.spawn_radius)?;
        require_non_negative("arena.min_player_distance", self.min_player_distance)?;
        require_non_negative("arena.obstacle_margin", self.obstacle_margin)?;
        for (index, obstacle) in self.obstacles.iter().enumerate() {
            require_finite_vec(&format!("arena.obstacles[{index}].center"), obstacle.center)?;
            require_non_negative(&format!("arena.obstacles[{index}].radius"), obstacle.radius)?;
            require_non_negative(&format!("arena.obstacles[{index}].height"), obstacle.height)?;
        }
        Ok(())
    }
}

impl CombatPolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative(
            "combat.death_removal_delay_seconds",
            self.death_removal_delay_seconds,
        )?;
        require_non_negative("combat.self_damage_scale", self.self_damage_scale)?;
        require_non_negative("combat.knockback_impulse", self.knockback_impulse)
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.player.validate()?;
        self.enemy.validate()?;
        for (index, weapon) in self.weapons.iter().enumerate() {
            weapon.validate(index)?;
        }
        self.waves.validate()?;
        self.difficulty.validate()?;
        self.arena.validate()?;
        self.combat.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SessionConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn attack_range_beyond_detection_is_rejected() {
        let mut config = SessionConfig::default();
        config.enemy.ai.attack_range = 30.0;
        let error = config.validate().expect_err("must reject");
        match error {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "enemy.ai.attack_range"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn negative_difficulty_rate_is_rejected() {
        let mut config = SessionConfig::default();
        config.difficulty.speed_per_level = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn weapon_errors_name_the_weapon_slot() {
        let mut config = SessionConfig::default();
        config.weapons[1].clip_size = 0;
        let error = config.validate().expect_err("must reject");
        assert!(error.to_string().contains("weapons[1].clip_size"), "{error}");
    }

    #[test]
    fn falloff_multipliers_must_be_fractions() {
        let mut config = SessionConfig::default();
        config.weapons[0].penetration_falloff = vec![1.0, 1.5];
        let error = config.validate().expect_err("must reject");
        assert!(
            error.to_string().contains("penetration_falloff[1]"),
            "{error}"
        );
    }

    #[test]
    fn enemy_type_errors_name_the_type_slot() {
        let mut config = SessionConfig::default();
        config.enemy.types[2].height = 0.0;
        let error = config.validate().expect_err("must reject");
        assert!(error.to_string().contains("enemy.types[2].height"), "{error}");

        config.enemy.types.clear();
        let error = config.validate().expect_err("must reject");
        assert!(error.to_string().contains("enemy.types"), "{error}");
    }

    #[test]
    fn type_weights_shift_toward_heavy_with_level() {
        let basic = EnemyArchetype::basic();
        let heavy = EnemyArchetype::heavy();
        assert!((basic.weight_at(1) - 0.65).abs() < 1e-6);
        assert!((basic.weight_at(20) - 0.3).abs() < 1e-6);
        assert!((heavy.weight_at(1) - 0.13).abs() < 1e-6);
        assert!((heavy.weight_at(20) - 0.4).abs() < 1e-6);
        assert_eq!(EnemyArchetype::fast().weight_at(7), 0.2);
    }

    #[test]
    fn ammo_below_infinite_sentinel_is_rejected() {
        let mut config = SessionConfig::default();
        config.weapons[0].ammo = -2;
        assert!(config.validate().is_err());
    }
}

use std::f32::consts::TAU;

use glam::Vec3;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use tracing::{debug, info};

use crate::config::{
    AiConfig, ArenaConfig, DifficultyConfig, EnemyArchetype, EnemyConfig, SessionConfig, WaveConfig,
};
use crate::seconds_to_ms;
use crate::sim::{horizontal_distance, CombatEvent, EventBus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavePhase {
    WaitingToStart,
    Spawning,
    LevelCompletePending,
    GameOver,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveState {
    pub level: u32,
    pub enemies_remaining_to_spawn: u32,
    pub active_enemy_count: u32,
    pub score: u64,
    pub kills: u32,
}

/// Difficulty-scaled stats for one spawned enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub type_index: usize,
    pub max_health: f32,
    pub speed: f32,
    pub attack_damage: f32,
    pub attack_interval_seconds: f32,
    pub radius: f32,
    pub height: f32,
    pub score_value: u64,
}

impl EnemyStats {
    pub fn for_level(
        type_index: usize,
        archetype: &EnemyArchetype,
        ai: &AiConfig,
        difficulty: &DifficultyConfig,
        level: u32,
    ) -> Self {
        let level = level as f32;
        let attack_interval_seconds = (ai.attack_cooldown_seconds
            * (1.0 - difficulty.attack_interval_reduction_per_level * level))
            .max(difficulty.min_attack_interval_seconds);
        Self {
            type_index,
            max_health: archetype.health * (1.0 + difficulty.health_per_level * level),
            speed: archetype.speed * (1.0 + difficulty.speed_per_level * level),
            attack_damage: archetype.attack_damage * (1.0 + difficulty.attack_per_level * level),
            attack_interval_seconds,
            radius: archetype.radius,
            height: archetype.height,
            score_value: archetype.score_value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnOrder {
    pub position: Vec3,
    pub stats: EnemyStats,
}

pub struct WaveDirector {
    waves: WaveConfig,
    difficulty: DifficultyConfig,
    enemy: EnemyConfig,
    arena: ArenaConfig,
    phase: WavePhase,
    state: WaveState,
    completion_fired: bool,
    next_spawn_at_ms: u64,
    next_level_at_ms: u64,
}

impl WaveDirector {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            waves: config.waves.clone(),
            difficulty: config.difficulty.clone(),
            enemy: config.enemy.clone(),
            arena: config.arena.clone(),
            phase: WavePhase::WaitingToStart,
            state: WaveState {
                level: config.waves.start_level.max(1),
                ..WaveState::default()
            },
            completion_fired: false,
            next_spawn_at_ms: 0,
            next_level_at_ms: 0,
        }
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    pub fn state(&self) -> WaveState {
        self.state
    }

    pub fn spawn_interval_ms(&self, level: u32) -> u64 {
        let base = self.waves.base_spawn_interval_seconds / level.max(1) as f32;
        seconds_to_ms(base.max(self.waves.min_spawn_interval_seconds))
    }

    /// Stats for `type_index` at the current level; `None` for an unknown type.
    pub fn enemy_stats(&self, type_index: usize) -> Option<EnemyStats> {
        let archetype = self.enemy.types.get(type_index)?;
        Some(EnemyStats::for_level(
            type_index,
            archetype,
            &self.enemy.ai,
            &self.difficulty,
            self.state.level,
        ))
    }

    /// Stats for the first configured type, used for enemies placed by hand.
    pub fn default_enemy_stats(&self) -> EnemyStats {
        self.enemy_stats(0).unwrap_or_else(|| {
            EnemyStats::for_level(
                0,
                &EnemyArchetype::default(),
                &self.enemy.ai,
                &self.difficulty,
                self.state.level,
            )
        })
    }

    pub fn archetype_weights(&self, level: u32) -> Vec<f32> {
        self.enemy
            .types
            .iter()
            .map(|archetype| archetype.weight_at(level))
            .collect()
    }

    /// Weighted pick over the configured types at the current level.
    fn pick_archetype(&self, rng: &mut impl Rng) -> usize {
        match WeightedIndex::new(self.archetype_weights(self.state.level)) {
            Ok(weights) => weights.sample(rng),
            Err(err) => {
                debug!(error = %err, "wave_type_weights_unusable");
                0
            }
        }
    }

    pub fn start(&mut self, now_ms: u64, events: &mut EventBus) {
        if self.phase != WavePhase::WaitingToStart {
            return;
        }
        let first_spawn_at = now_ms.saturating_add(seconds_to_ms(self.waves.start_delay_seconds));
        self.begin_level(self.state.level, first_spawn_at, events);
    }

    fn begin_level(&mut self, level: u32, first_spawn_at_ms: u64, events: &mut EventBus) {
        self.phase = WavePhase::Spawning;
        self.completion_fired = false;
        self.state.level = level;
        self.state.enemies_remaining_to_spawn = self.waves.enemies_per_level.saturating_mul(level);
        self.next_spawn_at_ms = first_spawn_at_ms;
        info!(
            level,
            enemies = self.state.enemies_remaining_to_spawn,
            "wave_level_started"
        );
        events.emit(CombatEvent::LevelStarted { level });
    }

    /// Advances level timers and returns at most one spawn for this tick.
    pub fn update(
        &mut self,
        now_ms: u64,
        player_position: Vec3,
        rng: &mut impl Rng,
        events: &mut EventBus,
    ) -> Option<SpawnOrder> {
        match self.phase {
            WavePhase::WaitingToStart | WavePhase::GameOver => None,
            WavePhase::LevelCompletePending => {
                if now_ms >= self.next_level_at_ms {
                    self.begin_level(self.state.level, now_ms, events);
                }
                None
            }
            WavePhase::Spawning => {
                if self.check_completion(now_ms, events) {
                    return None;
                }
                if self.state.enemies_remaining_to_spawn == 0
                    || self.state.active_enemy_count >= self.waves.max_active
                    || now_ms < self.next_spawn_at_ms
                {
                    return None;
                }

                let position = self.pick_spawn_position(player_position, rng);
                let stats = self.enemy_stats(self.pick_archetype(rng))?;
                self.state.enemies_remaining_to_spawn -= 1;
                self.state.active_enemy_count = self.state.active_enemy_count.saturating_add(1);
                self.next_spawn_at_ms =
                    now_ms.saturating_add(self.spawn_interval_ms(self.state.level));
                debug!(
                    level = self.state.level,
                    type_index = stats.type_index,
                    "wave_enemy_type_picked"
                );
                Some(SpawnOrder { position, stats })
            }
        }
    }

    /// Counts an enemy that entered the arena outside the spawn schedule.
    pub fn register_external_enemy(&mut self) {
        self.state.active_enemy_count = self.state.active_enemy_count.saturating_add(1);
    }

    /// Awards the dead enemy's flat `score_value`, independent of level.
    pub fn on_enemy_died(&mut self, now_ms: u64, score_value: u64, events: &mut EventBus) {
        self.state.active_enemy_count = self.state.active_enemy_count.saturating_sub(1);
        if self.phase == WavePhase::GameOver {
            return;
        }
        self.state.kills = self.state.kills.saturating_add(1);
        self.state.score = self.state.score.saturating_add(score_value);
        self.check_completion(now_ms, events);
    }

    /// An enemy left the arena without being killed; no score is awarded.
    pub fn on_enemy_despawned(&mut self, now_ms: u64, events: &mut EventBus) {
        self.state.active_enemy_count = self.state.active_enemy_count.saturating_sub(1);
        self.check_completion(now_ms, events);
    }

    pub fn on_player_died(&mut self, events: &mut EventBus) {
        if self.phase == WavePhase::GameOver {
            return;
        }
        self.phase = WavePhase::GameOver;
        info!(
            level = self.state.level,
            score = self.state.score,
            kills = self.state.kills,
            "wave_game_over"
        );
        events.emit(CombatEvent::GameOver {
            level: self.state.level,
            final_score: self.state.score,
        });
    }

    /// Fires level completion at most once per level. Returns true when it fired.
    fn check_completion(&mut self, now_ms: u64, events: &mut EventBus) -> bool {
        if self.phase != WavePhase::Spawning
            || self.completion_fired
            || self.state.enemies_remaining_to_spawn > 0
            || self.state.active_enemy_count > 0
        {
            return false;
        }
        self.completion_fired = true;

        let level = self.state.level;
        let bonus = self
            .waves
            .level_bonus_per_level
            .saturating_mul(u64::from(level));
        self.state.score = self.state.score.saturating_add(bonus);
        info!(level, bonus, score = self.state.score, "wave_level_complete");
        events.emit(CombatEvent::LevelComplete { level, bonus });

        self.state.level = level.saturating_add(1);
        self.phase = WavePhase::LevelCompletePending;
        self.next_level_at_ms =
            now_ms.saturating_add(seconds_to_ms(self.waves.next_level_delay_seconds));
        true
    }

    fn spawn_position_is_clear(&self, candidate: Vec3, player_position: Vec3) -> bool {
        if horizontal_distance(candidate, player_position) < self.arena.min_player_distance {
            return false;
        }
        !self.arena.obstacles.iter().any(|obstacle| {
            horizontal_distance(candidate, obstacle.center)
                < obstacle.radius + self.arena.obstacle_margin
        })
    }

    fn pick_spawn_position(&self, player_position: Vec3, rng: &mut impl Rng) -> Vec3 {
        let center = self.arena.center;
        let radius = self.arena.spawn_radius;
        for _ in 0..self.arena.max_spawn_attempts {
            let angle = rng.gen_range(0.0..TAU);
            let distance = rng.gen_range(0.5f32..=1.0) * radius;
            let candidate = center + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance);
            if self.spawn_position_is_clear(candidate, player_position) {
                return candidate;
            }
        }

        let angle = rng.gen_range(0.0..TAU);
        let fallback = center + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);
        debug!(
            attempts = self.arena.max_spawn_attempts,
            x = fallback.x,
            z = fallback.z,
            "wave_spawn_fallback_to_edge"
        );
        fallback
    }
}

use std::collections::BTreeMap;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use super::clock::Clock;
use super::events::{dispatch, CombatEvent, CombatObserver, EventBus, EventCounts};
use super::intents::{CombatIntent, IntentApplyStats, IntentQueue, WeaponId};
use super::spatial::{SpatialQuery, SphereQuery};
use super::world::{Actor, ActorId, ActorKind, World};
use crate::combat::{
    apply_damage, heal, resolve_area_damage, AiState, BrainTarget, EnemyBrain, EnemyStats,
    FireResult, HitDamage, Projectile, ShotContext, SteeringAgent, SteeringTarget,
    StuckDetector, WaveDirector, WavePhase, WaveState, Weapon,
};
use crate::config::{ConfigError, SessionConfig};
use crate::seconds_to_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSystemId {
    DamageIntake,
    Ai,
    Movement,
    WeaponFire,
    Waves,
    Cleanup,
}

impl TickSystemId {
    pub fn name(self) -> &'static str {
        match self {
            Self::DamageIntake => "DamageIntake",
            Self::Ai => "Ai",
            Self::Movement => "Movement",
            Self::WeaponFire => "WeaponFire",
            Self::Waves => "Waves",
            Self::Cleanup => "Cleanup",
        }
    }
}

pub const TICK_SYSTEM_ORDER: [TickSystemId; 6] = [
    TickSystemId::DamageIntake,
    TickSystemId::Ai,
    TickSystemId::Movement,
    TickSystemId::WeaponFire,
    TickSystemId::Waves,
    TickSystemId::Cleanup,
];

struct EnemyRuntime {
    brain: EnemyBrain,
    agent: SteeringAgent,
    stuck: StuckDetector,
    attack_damage: f32,
    score_value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingDamage {
    target: ActorId,
    amount: f32,
    source: Option<ActorId>,
    source_position: Option<Vec3>,
    point: Vec3,
    knockback: Vec3,
}

/// One running arena: world, enemies, weapons and the wave director,
/// advanced by [`CombatSession::tick`] in [`TICK_SYSTEM_ORDER`].
pub struct CombatSession {
    config: SessionConfig,
    world: World,
    spatial: Box<dyn SpatialQuery>,
    player_id: ActorId,
    enemies: BTreeMap<ActorId, EnemyRuntime>,
    weapons: Vec<Weapon>,
    projectiles: Vec<Projectile>,
    director: WaveDirector,
    pending_damage: Vec<PendingDamage>,
    pending_removals: Vec<(ActorId, u64)>,
    tick_intents: Vec<CombatIntent>,
    tick_intent_stats: IntentApplyStats,
    player_aim: Vec3,
    player_move: Vec3,
    last_player_damage_ms: Option<u64>,
    events: EventBus,
    intents: IntentQueue,
    observers: Vec<Box<dyn CombatObserver>>,
    rng: StdRng,
    last_tick_order: Vec<TickSystemId>,
    total_event_counts: EventCounts,
    tick_count: u64,
    now_ms: u64,
}

impl CombatSession {
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut world = World::new(config.arena.obstacles.clone());
        let player_id = world.spawn_actor(
            ActorKind::Player,
            config.player.spawn_position,
            config.player.radius,
            config.player.height,
            config.player.max_health,
        );
        let weapons = config.weapons.iter().cloned().map(Weapon::new).collect();
        let director = WaveDirector::new(&config);
        let rng = StdRng::seed_from_u64(config.seed);

        Ok(Self {
            world,
            spatial: Box::new(SphereQuery),
            player_id,
            enemies: BTreeMap::new(),
            weapons,
            projectiles: Vec::new(),
            director,
            pending_damage: Vec::new(),
            pending_removals: Vec::new(),
            tick_intents: Vec::new(),
            tick_intent_stats: IntentApplyStats::default(),
            player_aim: Vec3::Z,
            player_move: Vec3::ZERO,
            last_player_damage_ms: None,
            events: EventBus::default(),
            intents: IntentQueue::default(),
            observers: Vec::new(),
            rng,
            last_tick_order: Vec::new(),
            total_event_counts: EventCounts::default(),
            tick_count: 0,
            now_ms: 0,
            config,
        })
    }

    pub fn with_spatial(mut self, spatial: Box<dyn SpatialQuery>) -> Self {
        self.spatial = spatial;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn CombatObserver>) {
        self.observers.push(observer);
    }

    pub fn start(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.director.start(now_ms, &mut self.events);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn player_id(&self) -> ActorId {
        self.player_id
    }

    pub fn player(&self) -> Option<&Actor> {
        self.world.find(self.player_id)
    }

    pub fn player_aim(&self) -> Vec3 {
        self.player_aim
    }

    pub fn wave_state(&self) -> WaveState {
        self.director.state()
    }

    pub fn wave_phase(&self) -> WavePhase {
        self.director.phase()
    }

    pub fn is_game_over(&self) -> bool {
        self.director.phase() == WavePhase::GameOver
    }

    pub fn enemy_state(&self, actor_id: ActorId) -> Option<AiState> {
        self.enemies.get(&actor_id).map(|runtime| runtime.brain.state())
    }

    pub fn enemy_agent(&self, actor_id: ActorId) -> Option<&SteeringAgent> {
        self.enemies.get(&actor_id).map(|runtime| &runtime.agent)
    }

    pub fn living_enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn nearest_living_enemy(&self) -> Option<ActorId> {
        let position = self.player()?.position;
        self.spatial.nearest_actor(&self.world, position, &|actor: &Actor| {
            actor.kind == ActorKind::Enemy && actor.is_alive()
        })
    }

    pub fn weapon(&self, weapon: WeaponId) -> Option<&Weapon> {
        self.weapons.get(weapon.0)
    }

    pub fn weapon_count(&self) -> usize {
        self.weapons.len()
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn last_tick_order(&self) -> &[TickSystemId] {
        &self.last_tick_order
    }

    pub fn last_tick_intent_stats(&self) -> IntentApplyStats {
        self.intents.last_tick_apply_stats()
    }

    pub fn total_event_counts(&self) -> EventCounts {
        self.total_event_counts
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn request_fire(&mut self, weapon: WeaponId) {
        if weapon.0 >= self.weapons.len() {
            debug!(weapon = weapon.0, "request_fire_ignored_unknown_weapon");
            self.intents.reject();
            return;
        }
        self.intents.enqueue(CombatIntent::Fire { weapon });
    }

    pub fn request_reload(&mut self, weapon: WeaponId) {
        if weapon.0 >= self.weapons.len() {
            debug!(weapon = weapon.0, "request_reload_ignored_unknown_weapon");
            self.intents.reject();
            return;
        }
        self.intents.enqueue(CombatIntent::Reload { weapon });
    }

    /// Sets the held movement direction for the player; a zero vector stops it.
    pub fn request_move(&mut self, actor_id: ActorId, direction: Vec3) {
        if actor_id != self.player_id || !direction.is_finite() {
            debug!(actor_id = actor_id.0, "request_move_ignored_invalid");
            self.intents.reject();
            return;
        }
        self.intents.enqueue(CombatIntent::Move {
            actor_id,
            direction,
        });
    }

    pub fn request_aim(&mut self, direction: Vec3) {
        if !direction.is_finite() || direction.length_squared() <= f32::EPSILON {
            debug!("request_aim_ignored_invalid");
            self.intents.reject();
            return;
        }
        self.intents.enqueue(CombatIntent::Aim { direction });
    }

    /// Places an enemy of the first configured type, with the current level's
    /// stats, outside the spawn schedule.
    pub fn spawn_enemy_at(&mut self, position: Vec3) -> ActorId {
        let stats = self.director.default_enemy_stats();
        self.director.register_external_enemy();
        self.spawn_enemy(position, stats)
    }

    /// Like [`CombatSession::spawn_enemy_at`] for a chosen type. Returns `None`
    /// when `type_index` names no configured type.
    pub fn spawn_enemy_type_at(&mut self, position: Vec3, type_index: usize) -> Option<ActorId> {
        let stats = self.director.enemy_stats(type_index)?;
        self.director.register_external_enemy();
        Some(self.spawn_enemy(position, stats))
    }

    pub fn set_actor_position(&mut self, actor_id: ActorId, position: Vec3) -> bool {
        if !position.is_finite() {
            return false;
        }
        match self.world.find_mut(actor_id) {
            Some(actor) => {
                actor.position = position;
                true
            }
            None => false,
        }
    }

    /// Queues damage for the next damage intake step.
    pub fn queue_damage(&mut self, target: ActorId, amount: f32, source: Option<ActorId>) {
        let source_position = source
            .and_then(|source| self.world.find(source))
            .map(|actor| actor.position);
        let point = self
            .world
            .find(target)
            .map(Actor::center)
            .unwrap_or(Vec3::ZERO);
        self.pending_damage.push(PendingDamage {
            target,
            amount,
            source,
            source_position,
            point,
            knockback: Vec3::ZERO,
        });
    }

    /// Removes an enemy immediately without scoring it. The player cannot be despawned.
    pub fn despawn_actor(&mut self, actor_id: ActorId) -> bool {
        if actor_id == self.player_id {
            return false;
        }
        let Some(actor) = self.world.despawn(actor_id) else {
            return false;
        };
        self.pending_removals.retain(|(id, _)| *id != actor_id);
        if self.enemies.remove(&actor_id).is_some() && actor.is_alive() {
            self.director
                .on_enemy_despawned(self.now_ms, &mut self.events);
        }
        self.events.emit(CombatEvent::ActorRemoved { actor_id });
        true
    }

    pub fn tick(&mut self, clock: &dyn Clock) {
        let now_ms = clock.now_ms();
        let dt = clock.delta_seconds();
        self.now_ms = now_ms;

        self.tick_intents = self.intents.drain_current_tick();
        self.tick_intent_stats = IntentApplyStats::default();
        for _ in 0..self.intents.take_rejected() {
            self.tick_intent_stats.record_invalid();
        }

        self.last_tick_order.clear();
        for system_id in TICK_SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            self.run_system(system_id, now_ms, dt);
        }
        self.tick_count = self.tick_count.saturating_add(1);
    }

    fn run_system(&mut self, system_id: TickSystemId, now_ms: u64, dt: f32) {
        match system_id {
            TickSystemId::DamageIntake => self.run_damage_intake_system(now_ms, dt),
            TickSystemId::Ai => self.run_ai_system(now_ms),
            TickSystemId::Movement => self.run_movement_system(now_ms, dt),
            TickSystemId::WeaponFire => self.run_weapon_fire_system(now_ms, dt),
            TickSystemId::Waves => self.run_waves_system(now_ms),
            TickSystemId::Cleanup => self.run_cleanup_system(now_ms),
        }
    }

    fn run_damage_intake_system(&mut self, now_ms: u64, dt: f32) {
        for damage in std::mem::take(&mut self.pending_damage) {
            self.apply_pending_damage(now_ms, damage);
        }
        self.regenerate_player(now_ms, dt);
    }

    fn apply_pending_damage(&mut self, now_ms: u64, damage: PendingDamage) {
        let Some(actor) = self.world.find_mut(damage.target) else {
            debug!(
                actor_id = damage.target.0,
                amount = damage.amount,
                "apply_damage_ignored_missing_actor"
            );
            return;
        };
        let result = apply_damage(&mut actor.health, damage.amount);
        if !result.applied {
            debug!(
                actor_id = damage.target.0,
                amount = damage.amount,
                "apply_damage_ignored"
            );
            return;
        }
        let kind = actor.kind;
        let remaining = actor.health.current();

        self.events.emit(CombatEvent::Damaged {
            actor_id: damage.target,
            amount: result.amount_applied,
            remaining,
            point: damage.point,
            source: damage.source,
        });
        if kind == ActorKind::Player {
            self.last_player_damage_ms = Some(now_ms);
        }

        if result.killed {
            self.handle_death(now_ms, damage.target, kind);
            return;
        }
        if kind != ActorKind::Enemy {
            return;
        }
        let Some(runtime) = self.enemies.get_mut(&damage.target) else {
            return;
        };
        let source = damage
            .source
            .map(SteeringTarget::Actor)
            .or(damage.source_position.map(SteeringTarget::Point));
        if let Some(source) = source {
            if let Some((from, to)) = runtime.brain.force_chase(source, &mut runtime.agent) {
                debug!(actor_id = damage.target.0, "enemy_aggro_on_hit");
                self.events.emit(CombatEvent::StateChanged {
                    actor_id: damage.target,
                    from,
                    to,
                });
            }
        }
        if damage.knockback != Vec3::ZERO {
            runtime.agent.apply_impulse(damage.knockback);
        }
    }

    fn handle_death(&mut self, now_ms: u64, actor_id: ActorId, kind: ActorKind) {
        self.events.emit(CombatEvent::Died { actor_id, kind });
        match kind {
            ActorKind::Enemy => {
                let score_value = self
                    .enemies
                    .remove(&actor_id)
                    .map_or(0, |runtime| runtime.score_value);
                let remove_at = now_ms.saturating_add(seconds_to_ms(
                    self.config.combat.death_removal_delay_seconds,
                ));
                self.pending_removals.push((actor_id, remove_at));
                self.director
                    .on_enemy_died(now_ms, score_value, &mut self.events);
                info!(
                    actor_id = actor_id.0,
                    score = self.director.state().score,
                    "enemy_killed"
                );
            }
            ActorKind::Player => {
                info!(actor_id = actor_id.0, "player_killed");
                self.player_move = Vec3::ZERO;
                self.director.on_player_died(&mut self.events);
            }
        }
    }

    fn regenerate_player(&mut self, now_ms: u64, dt: f32) {
        let delay_ms = seconds_to_ms(self.config.player.regen_delay_seconds);
        let ready = match self.last_player_damage_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= delay_ms,
        };
        if !ready || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let amount = self.config.player.regen_per_second * dt;
        if let Some(player) = self.world.find_mut(self.player_id) {
            heal(&mut player.health, amount);
        }
    }

    fn run_ai_system(&mut self, now_ms: u64) {
        let target = self.world.find(self.player_id).map(|player| BrainTarget {
            actor_id: player.id,
            position: player.position,
            alive: player.is_alive(),
        });
        let target_point = self
            .world
            .find(self.player_id)
            .map(Actor::center)
            .unwrap_or(Vec3::ZERO);

        for (actor_id, runtime) in self.enemies.iter_mut() {
            let Some(position) = self.world.find(*actor_id).map(|actor| actor.position) else {
                continue;
            };
            let outcome = runtime
                .brain
                .update(now_ms, position, target, &mut runtime.agent);

            if let Some((from, to)) = outcome.transition {
                debug!(
                    actor_id = actor_id.0,
                    from = from.name(),
                    to = to.name(),
                    "enemy_state_changed"
                );
                self.events.emit(CombatEvent::StateChanged {
                    actor_id: *actor_id,
                    from,
                    to,
                });
            }
            if let Some(yaw) = outcome.facing_yaw {
                if let Some(actor) = self.world.find_mut(*actor_id) {
                    actor.yaw_radians = yaw;
                }
            }
            if outcome.attack {
                self.events.emit(CombatEvent::Attacked {
                    attacker_id: *actor_id,
                    target_id: self.player_id,
                    damage: runtime.attack_damage,
                });
                self.pending_damage.push(PendingDamage {
                    target: self.player_id,
                    amount: runtime.attack_damage,
                    source: Some(*actor_id),
                    source_position: Some(position),
                    point: target_point,
                    knockback: Vec3::ZERO,
                });
            }
        }
    }

    fn run_movement_system(&mut self, now_ms: u64, dt: f32) {
        for intent in &self.tick_intents {
            match *intent {
                CombatIntent::Move { direction, .. } => {
                    self.tick_intent_stats.record_intent(intent.kind());
                    self.player_move = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero();
                }
                CombatIntent::Aim { direction } => {
                    self.tick_intent_stats.record_intent(intent.kind());
                    self.player_aim = direction.normalize_or_zero();
                }
                CombatIntent::Fire { .. } | CombatIntent::Reload { .. } => {}
            }
        }

        if dt.is_finite() && dt > 0.0 && self.player_move != Vec3::ZERO {
            let step = self.player_move * self.config.player.move_speed * dt;
            if let Some(player) = self.world.find_mut(self.player_id) {
                if player.is_alive() {
                    player.position += step;
                }
            }
        }

        let snapshot: Vec<(ActorId, Vec3)> = self
            .world
            .actors_where(|actor| actor.kind == ActorKind::Enemy && actor.is_alive())
            .map(|actor| (actor.id, actor.position))
            .collect();
        let boost_multiplier = self.config.enemy.stuck.boost_multiplier;
        let boost_ms = seconds_to_ms(self.config.enemy.stuck.boost_duration_seconds);
        let world = &self.world;
        let resolve = |target: ActorId| {
            world
                .find(target)
                .filter(|actor| actor.is_alive())
                .map(|actor| actor.position)
        };

        let mut moved = Vec::with_capacity(snapshot.len());
        for (actor_id, runtime) in self.enemies.iter_mut() {
            let Some(position) = snapshot
                .iter()
                .find(|(id, _)| id == actor_id)
                .map(|(_, position)| *position)
            else {
                continue;
            };
            let neighbors: Vec<Vec3> = snapshot
                .iter()
                .filter(|(id, _)| id != actor_id)
                .map(|(_, position)| *position)
                .collect();

            let mut next = runtime
                .agent
                .tick(position, &neighbors, &resolve, now_ms, dt);
            let should_move = runtime.brain.state() == AiState::Chase;
            if runtime.stuck.sample(now_ms, next, should_move) {
                next += runtime.stuck.escape_offset(&mut self.rng);
                runtime
                    .agent
                    .start_boost(boost_multiplier, now_ms.saturating_add(boost_ms));
                debug!(actor_id = actor_id.0, "enemy_stuck_escape");
            }
            moved.push((*actor_id, next));
        }

        for (actor_id, position) in moved {
            if let Some(actor) = self.world.find_mut(actor_id) {
                actor.position = position;
            }
        }
    }

    fn run_weapon_fire_system(&mut self, now_ms: u64, dt: f32) {
        for (index, weapon) in self.weapons.iter_mut().enumerate() {
            if let Some(ammo_in_clip) = weapon.update(now_ms) {
                self.events.emit(CombatEvent::ReloadFinished {
                    weapon: WeaponId(index),
                    ammo_in_clip,
                });
            }
        }

        for intent in std::mem::take(&mut self.tick_intents) {
            match intent {
                CombatIntent::Reload { weapon } => {
                    self.tick_intent_stats.record_intent(intent.kind());
                    let started = self
                        .weapons
                        .get_mut(weapon.0)
                        .is_some_and(|slot| slot.request_reload(now_ms));
                    if started {
                        self.events.emit(CombatEvent::ReloadStarted { weapon });
                    }
                }
                CombatIntent::Fire { weapon } => {
                    self.tick_intent_stats.record_intent(intent.kind());
                    self.fire_player_weapon(now_ms, weapon);
                }
                CombatIntent::Move { .. } | CombatIntent::Aim { .. } => {}
            }
        }
        self.intents
            .set_last_tick_apply_stats(std::mem::take(&mut self.tick_intent_stats));

        self.advance_projectiles(now_ms, dt);
    }

    fn fire_player_weapon(&mut self, now_ms: u64, weapon_id: WeaponId) {
        let Some(player) = self.world.find(self.player_id).filter(|actor| actor.is_alive()) else {
            self.tick_intent_stats.record_invalid();
            return;
        };
        let origin = player.position + Vec3::Y * self.config.player.eye_height;
        let direction = self.player_aim;
        let Some(weapon) = self.weapons.get_mut(weapon_id.0) else {
            self.tick_intent_stats.record_invalid();
            return;
        };

        let shot = ShotContext {
            origin,
            direction,
            owner: self.player_id,
            world: &self.world,
            spatial: self.spatial.as_ref(),
        };
        let result = weapon.fire(now_ms, &shot);
        if result.reload_started() {
            self.events
                .emit(CombatEvent::ReloadStarted { weapon: weapon_id });
        }

        match result {
            FireResult::Blocked(reason) => {
                debug!(weapon = weapon_id.0, reason = ?reason, "fire_blocked");
            }
            FireResult::HitScan { hits, .. } => {
                self.events.emit(CombatEvent::WeaponFired {
                    weapon: weapon_id,
                    hits: hits.len() as u32,
                });
                let knockback = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero()
                    * self.config.combat.knockback_impulse;
                self.queue_hits(&hits, origin, knockback);
            }
            FireResult::Launched { projectile, .. } => {
                self.events.emit(CombatEvent::WeaponFired {
                    weapon: weapon_id,
                    hits: 0,
                });
                self.projectiles.push(projectile);
            }
        }
    }

    fn queue_hits(&mut self, hits: &[HitDamage], source_position: Vec3, knockback: Vec3) {
        for hit in hits {
            self.pending_damage.push(PendingDamage {
                target: hit.actor_id,
                amount: hit.amount,
                source: Some(self.player_id),
                source_position: Some(source_position),
                point: hit.point,
                knockback,
            });
        }
    }

    fn advance_projectiles(&mut self, now_ms: u64, dt: f32) {
        let mut blasts = Vec::new();
        for projectile in &mut self.projectiles {
            if let Some(point) = projectile.step(now_ms, dt, &self.world) {
                blasts.push((
                    projectile.owner(),
                    point,
                    projectile.blast_radius(),
                    projectile.damage(),
                ));
            }
        }
        self.projectiles.retain(|projectile| !projectile.is_detonated());

        for (owner, point, radius, damage) in blasts {
            self.events
                .emit(CombatEvent::ProjectileDetonated { owner, point });
            let hits = resolve_area_damage(
                &self.world,
                point,
                radius,
                damage,
                owner,
                self.config.combat.self_damage_scale,
            );
            debug!(
                owner = owner.0,
                hits = hits.len(),
                x = point.x,
                z = point.z,
                "projectile_detonated"
            );
            self.queue_hits(&hits, point, Vec3::ZERO);
        }
    }

    fn run_waves_system(&mut self, now_ms: u64) {
        let player_position = self
            .world
            .find(self.player_id)
            .map(|player| player.position)
            .unwrap_or(self.config.player.spawn_position);
        if let Some(order) =
            self.director
                .update(now_ms, player_position, &mut self.rng, &mut self.events)
        {
            self.spawn_enemy(order.position, order.stats);
        }
    }

    fn spawn_enemy(&mut self, position: Vec3, stats: EnemyStats) -> ActorId {
        let enemy = &self.config.enemy;
        let actor_id = self.world.spawn_actor(
            ActorKind::Enemy,
            position,
            stats.radius,
            stats.height,
            stats.max_health,
        );
        self.enemies.insert(
            actor_id,
            EnemyRuntime {
                brain: EnemyBrain::new(&enemy.ai, stats.attack_interval_seconds),
                agent: SteeringAgent::new(&enemy.steering, stats.speed),
                stuck: StuckDetector::new(&enemy.stuck),
                attack_damage: stats.attack_damage,
                score_value: stats.score_value,
            },
        );
        info!(
            actor_id = actor_id.0,
            type_index = stats.type_index,
            x = position.x,
            z = position.z,
            health = stats.max_health,
            speed = stats.speed,
            "enemy_spawned"
        );
        self.events
            .emit(CombatEvent::EnemySpawned { actor_id, position });
        actor_id
    }

    fn run_cleanup_system(&mut self, now_ms: u64) {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_removals)
            .into_iter()
            .partition(|(_, remove_at)| *remove_at <= now_ms);
        self.pending_removals = waiting;
        for (actor_id, _) in due {
            if self.world.despawn(actor_id).is_some() {
                self.events.emit(CombatEvent::ActorRemoved { actor_id });
            }
        }

        for event in self.events.iter_emitted_so_far() {
            for observer in &mut self.observers {
                dispatch(observer.as_mut(), event);
            }
        }
        self.events.finish_tick_rollover();
        self.total_event_counts
            .merge(&self.events.last_tick_counts());
    }
}

#[cfg(test)]
mod tests;

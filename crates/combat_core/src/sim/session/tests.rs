use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::combat::AiState;
use crate::config::DifficultyConfig;
use crate::sim::{CombatEventKind, ManualClock, RayHit, SpatialQuery, World};

const STEP_MS: u64 = 100;

fn flat_difficulty() -> DifficultyConfig {
    DifficultyConfig {
        health_per_level: 0.0,
        speed_per_level: 0.0,
        attack_per_level: 0.0,
        attack_interval_reduction_per_level: 0.0,
        min_attack_interval_seconds: 0.5,
    }
}

fn test_config() -> SessionConfig {
    SessionConfig {
        difficulty: flat_difficulty(),
        ..SessionConfig::default()
    }
}

fn session_with(config: SessionConfig) -> (CombatSession, ManualClock) {
    let session = CombatSession::new(config).expect("valid config");
    (session, ManualClock::new(0, STEP_MS as f32 / 1000.0))
}

fn step(session: &mut CombatSession, clock: &mut ManualClock) {
    clock.advance_ms(STEP_MS);
    session.tick(&*clock);
}

fn last_tick_kinds(session: &CombatSession) -> Vec<CombatEventKind> {
    session
        .events()
        .last_tick_events()
        .iter()
        .map(CombatEvent::kind)
        .collect()
}

#[derive(Clone, Default)]
struct Recorder {
    events: Rc<RefCell<Vec<CombatEvent>>>,
    level_completions: Rc<RefCell<Vec<(u32, u64)>>>,
}

impl CombatObserver for Recorder {
    fn on_level_complete(&mut self, level: u32, bonus: u64) {
        self.level_completions.borrow_mut().push((level, bonus));
    }

    fn on_event(&mut self, event: &CombatEvent) {
        self.events.borrow_mut().push(*event);
    }
}

#[test]
fn tick_runs_systems_in_fixed_order() {
    let (mut session, mut clock) = session_with(test_config());
    step(&mut session, &mut clock);
    let names: Vec<&str> = session
        .last_tick_order()
        .iter()
        .map(|system| system.name())
        .collect();
    assert_eq!(
        names,
        vec!["DamageIntake", "Ai", "Movement", "WeaponFire", "Waves", "Cleanup"]
    );
    assert_eq!(session.tick_count(), 1);
}

#[test]
fn enemy_closes_in_and_attacks_on_cooldown() {
    let (mut session, mut clock) = session_with(test_config());
    let player = session.player_id();
    let enemy = session.spawn_enemy_at(Vec3::new(0.0, 0.0, 25.0));

    session.tick(&clock);
    assert_eq!(session.enemy_state(enemy), Some(AiState::Idle));
    assert!(session
        .enemy_agent(enemy)
        .expect("agent")
        .active_behaviors()
        .is_empty());

    assert!(session.set_actor_position(enemy, Vec3::new(0.0, 0.0, 15.0)));
    step(&mut session, &mut clock);
    assert_eq!(session.enemy_state(enemy), Some(AiState::Chase));
    assert!(last_tick_kinds(&session).contains(&CombatEventKind::StateChanged));

    assert!(session.set_actor_position(enemy, Vec3::new(0.0, 0.0, 1.5)));
    let mut attack_times = Vec::new();
    for _ in 0..=30 {
        step(&mut session, &mut clock);
        assert_eq!(session.enemy_state(enemy), Some(AiState::Attack));
        for event in session.events().last_tick_events() {
            if let CombatEvent::Attacked {
                attacker_id,
                target_id,
                ..
            } = event
            {
                assert_eq!((*attacker_id, *target_id), (enemy, player));
                attack_times.push(clock.now_ms());
            }
        }
    }

    assert_eq!(attack_times.len(), 4, "{attack_times:?}");
    for pair in attack_times.windows(2) {
        assert!(pair[1] - pair[0] >= 1_000, "{attack_times:?}");
    }
    let enemy_actor = session.world().find(enemy).expect("enemy");
    assert!((enemy_actor.position.z - 1.5).abs() < 1e-4);
    assert!((enemy_actor.yaw_radians - std::f32::consts::PI).abs() < 1e-4);
}

#[test]
fn enemy_attack_damage_lands_on_the_next_tick() {
    let (mut session, mut clock) = session_with(test_config());
    session.spawn_enemy_at(Vec3::new(0.0, 0.0, 1.0));

    step(&mut session, &mut clock);
    assert!(last_tick_kinds(&session).contains(&CombatEventKind::Attacked));
    assert_eq!(session.player().expect("player").health.current(), 100.0);

    step(&mut session, &mut clock);
    assert_eq!(session.player().expect("player").health.current(), 90.0);
    assert!(last_tick_kinds(&session).contains(&CombatEventKind::Damaged));
}

#[test]
fn hit_scan_kill_scores_and_removes_after_delay() {
    let (mut session, mut clock) = session_with(test_config());
    let enemy = session.spawn_enemy_at(Vec3::new(0.0, 0.0, 10.0));

    let mut died_at = None;
    for _ in 0..40 {
        session.request_fire(WeaponId(0));
        step(&mut session, &mut clock);
        if last_tick_kinds(&session).contains(&CombatEventKind::Died) {
            died_at = Some(clock.now_ms());
            break;
        }
    }
    let died_at = died_at.expect("enemy should die");
    assert_eq!(session.enemy_state(enemy), None);
    assert!(session.world().find(enemy).is_some());
    let state = session.wave_state();
    assert_eq!(state.kills, 1);
    assert_eq!(state.score, 10);
    assert_eq!(state.active_enemy_count, 0);

    while clock.now_ms() < died_at + 2_500 {
        step(&mut session, &mut clock);
    }
    assert!(session.world().find(enemy).is_none());
    assert_eq!(session.total_event_counts().actor_removed, 1);
}

#[test]
fn kill_score_follows_the_enemy_type() {
    let (mut session, mut clock) = session_with(test_config());
    let heavy = session
        .spawn_enemy_type_at(Vec3::new(0.0, 0.0, 10.0), 2)
        .expect("heavy type is configured");
    let basic = session.spawn_enemy_at(Vec3::new(0.0, 0.0, -10.0));
    assert!(session
        .spawn_enemy_type_at(Vec3::new(5.0, 0.0, 0.0), 7)
        .is_none());
    assert_eq!(session.wave_state().active_enemy_count, 2);

    let heavy_actor = session.world().find(heavy).expect("heavy");
    assert_eq!(heavy_actor.health.max(), 200.0);
    assert!((heavy_actor.radius - 0.6).abs() < 1e-6);

    session.queue_damage(heavy, 1_000.0, None);
    step(&mut session, &mut clock);
    assert_eq!(session.wave_state().score, 20);

    session.queue_damage(basic, 1_000.0, None);
    step(&mut session, &mut clock);
    assert_eq!(session.wave_state().score, 30);
    assert_eq!(session.wave_state().kills, 2);
}

#[test]
fn knockback_pushes_an_attacking_enemy_away_from_the_shooter() {
    let mut config = test_config();
    config.combat.knockback_impulse = 20.0;
    let (mut session, mut clock) = session_with(config);
    let start = Vec3::new(0.0, 0.0, 1.5);
    let enemy = session.spawn_enemy_at(start);
    step(&mut session, &mut clock);
    assert_eq!(session.enemy_state(enemy), Some(AiState::Attack));
    assert!(session
        .enemy_agent(enemy)
        .expect("agent")
        .active_behaviors()
        .is_empty());

    session.request_fire(WeaponId(0));
    step(&mut session, &mut clock);
    assert_eq!(
        session.world().find(enemy).expect("enemy").position,
        start
    );

    step(&mut session, &mut clock);
    let enemy_actor = session.world().find(enemy).expect("enemy");
    assert_eq!(enemy_actor.health.current(), 75.0);
    assert!(enemy_actor.position.z > start.z + 1.0, "{:?}", enemy_actor.position);
    assert!(enemy_actor.position.x.abs() < 1e-4);
}

/// Ignores geometry: the first candidate is always hit and the highest id is
/// always nearest.
struct EverythingInSight;

impl SpatialQuery for EverythingInSight {
    fn nearest_actor(
        &self,
        world: &World,
        _position: Vec3,
        filter: &dyn Fn(&Actor) -> bool,
    ) -> Option<ActorId> {
        world
            .actors_where(|actor| filter(actor))
            .map(|actor| actor.id)
            .max()
    }

    fn raycast(
        &self,
        world: &World,
        _origin: Vec3,
        _direction: Vec3,
        _max_distance: f32,
        candidates: &dyn Fn(&Actor) -> bool,
    ) -> Vec<RayHit> {
        world
            .actors_where(|actor| candidates(actor))
            .map(|actor| RayHit {
                actor_id: actor.id,
                point: actor.center(),
                distance: 1.0,
            })
            .take(1)
            .collect()
    }
}

#[test]
fn custom_spatial_query_drives_targeting_and_hits() {
    let mut session = CombatSession::new(test_config())
        .expect("valid config")
        .with_spatial(Box::new(EverythingInSight));
    let mut clock = ManualClock::new(0, STEP_MS as f32 / 1000.0);
    let near = session.spawn_enemy_at(Vec3::new(3.0, 0.0, 0.0));
    let behind = session.spawn_enemy_at(Vec3::new(0.0, 0.0, -15.0));

    assert_eq!(session.nearest_living_enemy(), Some(behind));

    session.request_fire(WeaponId(0));
    step(&mut session, &mut clock);
    step(&mut session, &mut clock);
    let health = |id: ActorId| session.world().find(id).expect("enemy").health.current();
    // The default aim is +Z, so only the stub can put `near` in the line of fire.
    assert_eq!(health(near), 75.0);
    assert_eq!(health(behind), 100.0);
}

#[test]
fn dead_actors_leave_the_raycast_in_the_tick_they_die() {
    let (mut session, mut clock) = session_with(test_config());
    let front = session.spawn_enemy_at(Vec3::new(0.0, 0.0, 5.0));
    let back = session.spawn_enemy_at(Vec3::new(0.0, 0.0, 12.0));

    session.queue_damage(front, 1_000.0, None);
    session.request_fire(WeaponId(0));
    step(&mut session, &mut clock);
    assert!(session
        .world()
        .find(front)
        .expect("corpse")
        .health
        .is_dead());
    assert!(session.events().last_tick_events().iter().any(|event| matches!(
        event,
        CombatEvent::WeaponFired { hits: 1, .. }
    )));

    step(&mut session, &mut clock);
    assert_eq!(
        session.world().find(back).expect("back").health.current(),
        75.0
    );
}

#[test]
fn non_lethal_hit_aggroes_idle_enemy() {
    let (mut session, mut clock) = session_with(test_config());
    let player = session.player_id();
    let enemy = session.spawn_enemy_at(Vec3::new(0.0, 0.0, 30.0));
    step(&mut session, &mut clock);
    assert_eq!(session.enemy_state(enemy), Some(AiState::Idle));

    session.queue_damage(enemy, 5.0, Some(player));
    step(&mut session, &mut clock);
    let transitions: Vec<(AiState, AiState)> = session
        .events()
        .last_tick_events()
        .iter()
        .filter_map(|event| match event {
            CombatEvent::StateChanged { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    // Aggro fires first; the distance table then takes over in the same tick.
    assert_eq!(
        transitions,
        vec![
            (AiState::Idle, AiState::Chase),
            (AiState::Chase, AiState::Idle)
        ]
    );
}

#[test]
fn aggro_inside_detection_keeps_chasing_the_shooter() {
    let (mut session, mut clock) = session_with(test_config());
    let player = session.player_id();
    let enemy = session.spawn_enemy_at(Vec3::new(0.0, 0.0, 12.0));
    session.queue_damage(enemy, 5.0, Some(player));
    step(&mut session, &mut clock);

    assert_eq!(session.enemy_state(enemy), Some(AiState::Chase));
    let agent = session.enemy_agent(enemy).expect("agent");
    assert_eq!(
        agent.behavior(crate::combat::BehaviorKind::Seek).target,
        Some(SteeringTarget::Actor(player))
    );
    assert!(session.world().find(enemy).expect("enemy").position.z < 12.0);
}

#[test]
fn level_completion_fires_once_after_last_kill() {
    let mut config = test_config();
    config.waves.enemies_per_level = 3;
    config.waves.max_active = 1;
    config.waves.start_delay_seconds = 0.0;
    config.waves.base_spawn_interval_seconds = 0.5;
    let (mut session, mut clock) = session_with(config);
    let recorder = Recorder::default();
    session.add_observer(Box::new(recorder.clone()));
    session.start(0);

    for _ in 0..100 {
        if let Some(enemy) = session.nearest_living_enemy() {
            session.queue_damage(enemy, 10_000.0, None);
        }
        step(&mut session, &mut clock);
    }

    let events = recorder.events.borrow();
    let enemy_deaths: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, event)| {
            matches!(
                event,
                CombatEvent::Died {
                    kind: ActorKind::Enemy,
                    ..
                }
            )
        })
        .map(|(index, _)| index)
        .collect();
    let completions: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, event)| matches!(event, CombatEvent::LevelComplete { level: 1, .. }))
        .map(|(index, _)| index)
        .collect();

    assert!(enemy_deaths.len() >= 3);
    assert_eq!(completions.len(), 1);
    assert!(completions[0] > enemy_deaths[2]);
    assert!(completions[0] < enemy_deaths.get(3).copied().unwrap_or(usize::MAX));
    assert_eq!(recorder.level_completions.borrow()[0], (1, 100));
}

#[test]
fn player_death_ends_the_game_and_idles_enemies() {
    let mut config = test_config();
    config.waves.start_delay_seconds = 0.0;
    let (mut session, mut clock) = session_with(config);
    session.start(0);
    let enemy = session.spawn_enemy_at(Vec3::new(0.0, 0.0, 10.0));
    step(&mut session, &mut clock);
    assert_eq!(session.enemy_state(enemy), Some(AiState::Chase));

    session.queue_damage(session.player_id(), 1_000.0, None);
    step(&mut session, &mut clock);
    assert!(session.is_game_over());
    assert!(session.player().expect("player stays in world").health.is_dead());
    assert_eq!(session.enemy_state(enemy), Some(AiState::Idle));
    let kinds = last_tick_kinds(&session);
    assert!(kinds.contains(&CombatEventKind::Died));
    assert!(kinds.contains(&CombatEventKind::GameOver));

    let spawned_before = session.total_event_counts().enemy_spawned;
    for _ in 0..100 {
        step(&mut session, &mut clock);
    }
    assert_eq!(session.total_event_counts().enemy_spawned, spawned_before);
    assert_eq!(session.total_event_counts().game_over, 1);
}

#[test]
fn player_regenerates_after_quiet_period() {
    let (mut session, mut clock) = session_with(test_config());
    session.queue_damage(session.player_id(), 30.0, None);
    step(&mut session, &mut clock);
    let health = |session: &CombatSession| session.player().expect("player").health.current();
    assert_eq!(health(&session), 70.0);

    clock.set(4_000, 0.1);
    session.tick(&clock);
    assert_eq!(health(&session), 70.0);

    clock.set(5_100, 0.1);
    session.tick(&clock);
    assert!((health(&session) - 70.5).abs() < 1e-4);

    clock.set(200_000, 1_000.0);
    session.tick(&clock);
    assert_eq!(health(&session), 100.0);
}

#[test]
fn launcher_blast_hurts_owner_at_reduced_scale() {
    let mut config = test_config();
    config.enemy.ai.detection_range = 2.5;
    config.enemy.ai.attack_range = 1.0;
    let (mut session, mut clock) = session_with(config);
    let enemy = session.spawn_enemy_at(Vec3::new(3.0, 0.0, 0.0));

    session.request_aim(Vec3::NEG_Y);
    session.request_fire(WeaponId(1));
    let mut detonated = false;
    for _ in 0..20 {
        step(&mut session, &mut clock);
        if last_tick_kinds(&session).contains(&CombatEventKind::ProjectileDetonated) {
            detonated = true;
            break;
        }
    }
    assert!(detonated);
    assert!(session.projectiles().is_empty());

    step(&mut session, &mut clock);
    let player_health = session.player().expect("player").health.current();
    let enemy_health = session.world().find(enemy).expect("enemy").health.current();
    assert!((player_health - 75.0).abs() < 1e-3, "{player_health}");
    assert!((enemy_health - 70.0).abs() < 1e-3, "{enemy_health}");
}

#[test]
fn invalid_requests_are_ignored_and_counted() {
    let (mut session, mut clock) = session_with(test_config());
    let enemy = session.spawn_enemy_at(Vec3::new(0.0, 0.0, 30.0));
    session.request_fire(WeaponId(9));
    session.request_reload(WeaponId(9));
    session.request_move(enemy, Vec3::X);
    session.request_move(session.player_id(), Vec3::new(f32::NAN, 0.0, 0.0));
    session.request_aim(Vec3::ZERO);
    session.request_aim(Vec3::X);
    step(&mut session, &mut clock);

    let stats = session.last_tick_intent_stats();
    assert_eq!(stats.invalid_count, 5);
    assert_eq!(stats.aim, 1);
    assert_eq!(stats.total, 1);
    assert_eq!(session.player_aim(), Vec3::X);
}

#[test]
fn held_move_direction_persists_until_cleared() {
    let (mut session, mut clock) = session_with(test_config());
    let player = session.player_id();
    session.request_move(player, Vec3::new(2.0, 5.0, 0.0));
    step(&mut session, &mut clock);
    step(&mut session, &mut clock);
    let position = session.player().expect("player").position;
    assert!((position.x - 1.0).abs() < 1e-4, "{position:?}");
    assert_eq!(position.y, 0.0);

    session.request_move(player, Vec3::ZERO);
    step(&mut session, &mut clock);
    assert!((session.player().expect("player").position.x - 1.0).abs() < 1e-4);
}

#[test]
fn manual_reload_refills_after_deadline() {
    let (mut session, mut clock) = session_with(test_config());
    session.request_fire(WeaponId(0));
    step(&mut session, &mut clock);
    assert_eq!(session.weapon(WeaponId(0)).expect("rifle").ammo_in_clip(), 29);

    session.request_reload(WeaponId(0));
    step(&mut session, &mut clock);
    assert!(last_tick_kinds(&session).contains(&CombatEventKind::ReloadStarted));
    assert!(session.weapon(WeaponId(0)).expect("rifle").is_reloading());

    for _ in 0..20 {
        step(&mut session, &mut clock);
    }
    let rifle = session.weapon(WeaponId(0)).expect("rifle");
    assert!(!rifle.is_reloading());
    assert_eq!(rifle.ammo_in_clip(), 30);
    assert_eq!(session.total_event_counts().reload_finished, 1);
}

#[test]
fn despawn_releases_the_active_slot() {
    let (mut session, mut clock) = session_with(test_config());
    let enemy = session.spawn_enemy_at(Vec3::new(0.0, 0.0, 30.0));
    assert_eq!(session.wave_state().active_enemy_count, 1);

    assert!(session.despawn_actor(enemy));
    assert!(!session.despawn_actor(enemy));
    assert!(!session.despawn_actor(session.player_id()));
    assert_eq!(session.wave_state().active_enemy_count, 0);
    assert_eq!(session.wave_state().kills, 0);
    assert_eq!(session.living_enemy_count(), 0);

    step(&mut session, &mut clock);
    assert!(last_tick_kinds(&session).contains(&CombatEventKind::ActorRemoved));
}

#[test]
fn stuck_enemy_gets_jittered_free() {
    let mut config = test_config();
    config.enemy.types[0].speed = 0.0;
    let (mut session, mut clock) = session_with(config);
    let start = Vec3::new(0.0, 0.0, 10.0);
    let enemy = session.spawn_enemy_at(start);

    for _ in 0..15 {
        step(&mut session, &mut clock);
    }
    assert_eq!(session.world().find(enemy).expect("enemy").position, start);

    for _ in 0..15 {
        step(&mut session, &mut clock);
    }
    let position = session.world().find(enemy).expect("enemy").position;
    assert_ne!(position, start);
    assert!((position - start).length() <= 0.5 * std::f32::consts::SQRT_2 + 1e-4);
}

#[test]
fn construction_rejects_invalid_config() {
    let mut config = SessionConfig::default();
    config.player.max_health = 0.0;
    assert!(CombatSession::new(config).is_err());
}

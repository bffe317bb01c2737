use combat_core::{
    horizontal_distance, ActorId, AmmoReserve, CombatSession, WeaponId, WeaponKind,
};
use glam::Vec3;

/// Enemies inside this ground distance make the autopilot back away.
const BACK_OFF_DISTANCE: f32 = 4.0;
/// Living enemies needed before the launcher is worth a shell.
const LAUNCHER_CROWD_SIZE: usize = 3;

/// Scripted stand-in for a human player: aims at the nearest enemy, fires,
/// reloads when idle and backs away from melee range.
#[derive(Debug, Clone)]
pub(crate) struct Autopilot {
    primary: Option<WeaponId>,
    launcher: Option<WeaponId>,
    moving: Vec3,
}

impl Autopilot {
    pub(crate) fn new(session: &CombatSession) -> Self {
        let find = |kind: WeaponKind| {
            (0..session.weapon_count())
                .map(WeaponId)
                .find(|id| {
                    session
                        .weapon(*id)
                        .is_some_and(|weapon| weapon.config().kind == kind)
                })
        };
        Self {
            primary: find(WeaponKind::HitScan),
            launcher: find(WeaponKind::Launcher),
            moving: Vec3::ZERO,
        }
    }

    /// Queues this tick's requests.
    pub(crate) fn drive(&mut self, session: &mut CombatSession) {
        if session.is_game_over() {
            return;
        }
        let Some(player) = session.player() else {
            return;
        };
        let player_id = player.id;
        let player_position = player.position;
        let eye = player_position + Vec3::Y * session.config().player.eye_height;

        let target = session
            .nearest_living_enemy()
            .and_then(|id| session.world().find(id))
            .map(|enemy| (enemy.position, enemy.center()));
        let Some((enemy_position, enemy_center)) = target else {
            self.set_moving(session, player_id, Vec3::ZERO);
            self.top_up(session);
            return;
        };

        session.request_aim(enemy_center - eye);
        let distance = horizontal_distance(player_position, enemy_position);
        let retreat = if distance < BACK_OFF_DISTANCE {
            player_position - enemy_position
        } else {
            Vec3::ZERO
        };
        self.set_moving(session, player_id, retreat);

        if let Some(weapon) = self.pick_weapon(session, distance) {
            session.request_fire(weapon);
        }
    }

    fn set_moving(&mut self, session: &mut CombatSession, player_id: ActorId, direction: Vec3) {
        let direction = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero();
        if direction != self.moving {
            session.request_move(player_id, direction);
            self.moving = direction;
        }
    }

    fn pick_weapon(&self, session: &CombatSession, distance: f32) -> Option<WeaponId> {
        let launcher = self.launcher.filter(|id| {
            session.weapon(*id).is_some_and(|weapon| {
                let blast_radius = weapon.config().projectile.blast_radius;
                weapon.ammo_in_clip() > 0 && !weapon.is_reloading() && distance > blast_radius
            })
        });
        if session.living_enemy_count() >= LAUNCHER_CROWD_SIZE && launcher.is_some() {
            return launcher;
        }
        self.primary.or(launcher)
    }

    /// Reloads any partially empty weapon while nothing is in sight.
    fn top_up(&self, session: &mut CombatSession) {
        for weapon_id in [self.primary, self.launcher].into_iter().flatten() {
            let needs_reload = session.weapon(weapon_id).is_some_and(|weapon| {
                !weapon.is_reloading()
                    && weapon.ammo_in_clip() < weapon.config().clip_size
                    && weapon.reserve() != AmmoReserve::Finite(0)
            });
            if needs_reload {
                session.request_reload(weapon_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use combat_core::{ActorKind, Clock, FixedStepClock, SessionConfig};

    use super::*;

    fn session() -> CombatSession {
        CombatSession::new(SessionConfig::default()).expect("default config is valid")
    }

    #[test]
    fn picks_weapons_by_kind() {
        let session = session();
        let autopilot = Autopilot::new(&session);
        assert_eq!(autopilot.primary, Some(WeaponId(0)));
        assert_eq!(autopilot.launcher, Some(WeaponId(1)));
    }

    #[test]
    fn aims_and_fires_at_nearest_enemy() {
        let mut session = session();
        let mut clock = FixedStepClock::from_hz(60);
        let enemy = session.spawn_enemy_at(Vec3::new(6.0, 0.0, 0.0));
        let mut autopilot = Autopilot::new(&session);

        autopilot.drive(&mut session);
        clock.advance();
        session.tick(&clock);

        assert!(session.player_aim().x > 0.9);
        assert_eq!(session.last_tick_intent_stats().fire, 1);
        assert_eq!(session.total_event_counts().weapon_fired, 1);

        clock.advance();
        session.tick(&clock);
        let health = &session.world().find(enemy).expect("enemy").health;
        assert!(health.current() < health.max());
        assert!(clock.now_ms() > 0);
    }

    #[test]
    fn backs_away_from_close_enemies() {
        let mut session = session();
        let mut clock = FixedStepClock::from_hz(10);
        session.spawn_enemy_at(Vec3::new(0.0, 0.0, 3.0));
        let mut autopilot = Autopilot::new(&session);

        autopilot.drive(&mut session);
        clock.advance();
        session.tick(&clock);

        let player = session.player().expect("player");
        assert_eq!(player.kind, ActorKind::Player);
        assert!(player.position.z < 0.0);
    }

    #[test]
    fn reloads_when_no_enemy_is_in_sight() {
        let mut session = session();
        let mut clock = FixedStepClock::from_hz(10);
        let enemy = session.spawn_enemy_at(Vec3::new(0.0, 0.0, 10.0));
        let mut autopilot = Autopilot::new(&session);

        autopilot.drive(&mut session);
        clock.advance();
        session.tick(&clock);
        assert!(session.despawn_actor(enemy));

        autopilot.drive(&mut session);
        clock.advance();
        session.tick(&clock);
        assert!(session.weapon(WeaponId(0)).expect("rifle").is_reloading());
        assert_eq!(session.last_tick_intent_stats().reload, 1);
    }
}

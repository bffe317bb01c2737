use glam::Vec3;

use super::steering::{BehaviorKind, SteeringAgent, SteeringTarget};
use crate::config::AiConfig;
use crate::seconds_to_ms;
use crate::sim::{horizontal_distance, ActorId};

const MIN_FACING_DISTANCE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiState {
    Idle,
    Chase,
    Attack,
}

impl AiState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Chase => "chase",
            Self::Attack => "attack",
        }
    }
}

/// Transition table. Both range boundaries are inclusive on the nearer side.
pub fn evaluate_state(distance: f32, detection_range: f32, attack_range: f32) -> AiState {
    if distance <= attack_range {
        AiState::Attack
    } else if distance <= detection_range {
        AiState::Chase
    } else {
        AiState::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrainTarget {
    pub actor_id: ActorId,
    pub position: Vec3,
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BrainOutcome {
    /// `(from, to)` when the state actually changed this update.
    pub transition: Option<(AiState, AiState)>,
    pub attack: bool,
    pub facing_yaw: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnemyBrain {
    state: AiState,
    detection_range: f32,
    attack_range: f32,
    attack_cooldown_ms: u64,
    last_attack_ms: Option<u64>,
}

impl EnemyBrain {
    pub fn new(config: &AiConfig, attack_interval_seconds: f32) -> Self {
        Self {
            state: AiState::Idle,
            detection_range: config.detection_range,
            attack_range: config.attack_range,
            attack_cooldown_ms: seconds_to_ms(attack_interval_seconds),
            last_attack_ms: None,
        }
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    fn enter(&mut self, next: AiState) -> Option<(AiState, AiState)> {
        let previous = self.state;
        self.state = next;
        (previous != next).then_some((previous, next))
    }

    /// Re-evaluates the state from scratch and re-applies its entry actions.
    pub fn update(
        &mut self,
        now_ms: u64,
        own_position: Vec3,
        target: Option<BrainTarget>,
        agent: &mut SteeringAgent,
    ) -> BrainOutcome {
        let Some(target) = target.filter(|target| target.alive) else {
            agent.disable_all();
            return BrainOutcome {
                transition: self.enter(AiState::Idle),
                ..BrainOutcome::default()
            };
        };

        let distance = horizontal_distance(own_position, target.position);
        let next = evaluate_state(distance, self.detection_range, self.attack_range);
        let transition = self.enter(next);

        match next {
            AiState::Idle => {
                agent.disable_all();
                BrainOutcome {
                    transition,
                    ..BrainOutcome::default()
                }
            }
            AiState::Chase => {
                agent.set_behavior_target(BehaviorKind::Seek, SteeringTarget::Actor(target.actor_id));
                agent.set_behavior_active(BehaviorKind::Seek, true);
                agent.set_behavior_active(BehaviorKind::Separation, true);
                agent.set_behavior_active(BehaviorKind::Flee, false);
                BrainOutcome {
                    transition,
                    ..BrainOutcome::default()
                }
            }
            AiState::Attack => {
                agent.disable_all();
                let offset = target.position - own_position;
                let facing_yaw =
                    (distance > MIN_FACING_DISTANCE).then(|| offset.x.atan2(offset.z));
                BrainOutcome {
                    transition,
                    attack: self.try_attack(now_ms),
                    facing_yaw,
                }
            }
        }
    }

    /// Rate-limited attack; calls inside the cooldown window are no-ops.
    pub fn try_attack(&mut self, now_ms: u64) -> bool {
        let ready = match self.last_attack_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.attack_cooldown_ms,
        };
        if ready {
            self.last_attack_ms = Some(now_ms);
        }
        ready
    }

    /// Aggro on a non-lethal hit: chase the damage source until the next update.
    pub fn force_chase(
        &mut self,
        source: SteeringTarget,
        agent: &mut SteeringAgent,
    ) -> Option<(AiState, AiState)> {
        agent.set_behavior_target(BehaviorKind::Seek, source);
        agent.set_behavior_active(BehaviorKind::Seek, true);
        agent.set_behavior_active(BehaviorKind::Separation, true);
        agent.set_behavior_active(BehaviorKind::Flee, false);
        self.enter(AiState::Chase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SteeringConfig;

    const PLAYER: ActorId = ActorId(1);

    fn brain() -> (EnemyBrain, SteeringAgent) {
        (
            EnemyBrain::new(&AiConfig::default(), 1.0),
            SteeringAgent::new(&SteeringConfig::default(), 2.0),
        )
    }

    fn target_at(distance: f32) -> BrainTarget {
        BrainTarget {
            actor_id: PLAYER,
            position: Vec3::new(0.0, 0.0, distance),
            alive: true,
        }
    }

    #[test]
    fn state_table_covers_boundaries() {
        const EPS: f32 = 1e-3;
        for (distance, expected) in [
            (25.0, AiState::Idle),
            (20.0 + EPS, AiState::Idle),
            (20.0, AiState::Chase),
            (20.0 - EPS, AiState::Chase),
            (10.0, AiState::Chase),
            (2.0 + EPS, AiState::Chase),
            (2.0, AiState::Attack),
            (2.0 - EPS, AiState::Attack),
            (1.0, AiState::Attack),
            (0.0, AiState::Attack),
        ] {
            assert_eq!(evaluate_state(distance, 20.0, 2.0), expected, "d={distance}");
        }
    }

    #[test]
    fn active_behaviours_match_state_at_each_distance() {
        for (distance, state, behaviours) in [
            (25.0, AiState::Idle, vec![]),
            (20.0, AiState::Chase, vec![BehaviorKind::Seek, BehaviorKind::Separation]),
            (10.0, AiState::Chase, vec![BehaviorKind::Seek, BehaviorKind::Separation]),
            (2.0, AiState::Attack, vec![]),
            (1.0, AiState::Attack, vec![]),
        ] {
            let (mut brain, mut agent) = brain();
            brain.update(0, Vec3::ZERO, Some(target_at(distance)), &mut agent);
            assert_eq!(brain.state(), state, "d={distance}");
            assert_eq!(agent.active_behaviors(), behaviours, "d={distance}");
        }
    }

    #[test]
    fn chase_seeks_the_target_actor() {
        let (mut brain, mut agent) = brain();
        brain.update(0, Vec3::ZERO, Some(target_at(10.0)), &mut agent);
        assert_eq!(
            agent.behavior(BehaviorKind::Seek).target,
            Some(SteeringTarget::Actor(PLAYER))
        );
    }

    #[test]
    fn transitions_are_reported_only_on_change() {
        let (mut brain, mut agent) = brain();
        let first = brain.update(0, Vec3::ZERO, Some(target_at(10.0)), &mut agent);
        assert_eq!(first.transition, Some((AiState::Idle, AiState::Chase)));
        let second = brain.update(16, Vec3::ZERO, Some(target_at(9.0)), &mut agent);
        assert_eq!(second.transition, None);
        let third = brain.update(32, Vec3::ZERO, Some(target_at(1.5)), &mut agent);
        assert_eq!(third.transition, Some((AiState::Chase, AiState::Attack)));
    }

    #[test]
    fn attack_is_rate_limited() {
        let (mut brain, mut agent) = brain();
        let attacks: Vec<bool> = [0, 500, 999, 1_000, 1_500, 2_000]
            .into_iter()
            .map(|now| brain.update(now, Vec3::ZERO, Some(target_at(1.5)), &mut agent).attack)
            .collect();
        assert_eq!(attacks, vec![true, false, false, true, false, true]);
    }

    #[test]
    fn attack_faces_the_target() {
        let (mut brain, mut agent) = brain();
        let outcome = brain.update(
            0,
            Vec3::ZERO,
            Some(BrainTarget {
                actor_id: PLAYER,
                position: Vec3::new(1.0, 0.0, 0.0),
                alive: true,
            }),
            &mut agent,
        );
        let yaw = outcome.facing_yaw.expect("facing");
        assert!((yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn missing_or_dead_target_goes_idle() {
        let (mut brain, mut agent) = brain();
        brain.update(0, Vec3::ZERO, Some(target_at(10.0)), &mut agent);
        let outcome = brain.update(16, Vec3::ZERO, None, &mut agent);
        assert_eq!(outcome.transition, Some((AiState::Chase, AiState::Idle)));
        assert!(agent.active_behaviors().is_empty());

        brain.update(32, Vec3::ZERO, Some(target_at(1.0)), &mut agent);
        let dead = BrainTarget {
            alive: false,
            ..target_at(1.0)
        };
        let outcome = brain.update(48, Vec3::ZERO, Some(dead), &mut agent);
        assert_eq!(brain.state(), AiState::Idle);
        assert!(!outcome.attack);
    }

    #[test]
    fn force_chase_points_seek_at_source() {
        let (mut brain, mut agent) = brain();
        let source = SteeringTarget::Point(Vec3::new(30.0, 0.0, 0.0));
        let transition = brain.force_chase(source, &mut agent);
        assert_eq!(transition, Some((AiState::Idle, AiState::Chase)));
        assert_eq!(agent.behavior(BehaviorKind::Seek).target, Some(source));
        assert!(agent.behavior(BehaviorKind::Seek).active);
        assert_eq!(brain.force_chase(source, &mut agent), None);
    }
}

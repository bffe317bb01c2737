use glam::Vec3;
use rand::Rng;

use crate::config::{SteeringConfig, StuckConfig};
use crate::seconds_to_ms;
use crate::sim::{horizontal_distance, ActorId};

const MIN_NEIGHBOR_DISTANCE: f32 = 1e-4;
/// Knockback speeds below this snap to rest.
const KNOCKBACK_REST_SPEED: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BehaviorKind {
    Seek,
    Flee,
    Separation,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 3] = [Self::Seek, Self::Flee, Self::Separation];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SteeringTarget {
    Point(Vec3),
    Actor(ActorId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorSlot {
    pub target: Option<SteeringTarget>,
    pub active: bool,
    pub weight: f32,
}

impl BehaviorSlot {
    fn inactive(weight: f32) -> Self {
        Self {
            target: None,
            active: false,
            weight,
        }
    }
}

fn planar(vector: Vec3) -> Vec3 {
    Vec3::new(vector.x, 0.0, vector.z)
}

/// Desired velocity toward `target` at `max_speed`, minus the current velocity.
pub fn seek_force(position: Vec3, target: Vec3, velocity: Vec3, max_speed: f32) -> Vec3 {
    let desired = planar(target - position).normalize_or_zero() * max_speed;
    desired - planar(velocity)
}

/// Seek away from `threat`, only while it is inside `panic_distance`.
pub fn flee_force(
    position: Vec3,
    threat: Vec3,
    velocity: Vec3,
    max_speed: f32,
    panic_distance: f32,
) -> Vec3 {
    if horizontal_distance(position, threat) > panic_distance {
        return Vec3::ZERO;
    }
    let desired = planar(position - threat).normalize_or_zero() * max_speed;
    desired - planar(velocity)
}

/// Sum of `(self - neighbor) / distance^2` over neighbours inside `radius`.
pub fn separation_force(position: Vec3, neighbors: &[Vec3], radius: f32) -> Vec3 {
    neighbors
        .iter()
        .filter_map(|neighbor| {
            let away = planar(position - *neighbor);
            let distance = away.length();
            (distance > MIN_NEIGHBOR_DISTANCE && distance <= radius)
                .then(|| away / (distance * distance))
        })
        .sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SteeringAgent {
    max_speed: f32,
    max_force: f32,
    mass: f32,
    velocity: Vec3,
    knockback: Vec3,
    knockback_damping: f32,
    panic_distance: f32,
    neighborhood_radius: f32,
    seek: BehaviorSlot,
    flee: BehaviorSlot,
    separation: BehaviorSlot,
    boost: Option<(f32, u64)>,
}

impl SteeringAgent {
    pub fn new(config: &SteeringConfig, max_speed: f32) -> Self {
        Self {
            max_speed: max_speed.max(0.0),
            max_force: config.max_force,
            mass: config.mass.max(f32::EPSILON),
            velocity: Vec3::ZERO,
            knockback: Vec3::ZERO,
            knockback_damping: config.knockback_damping.max(0.0),
            panic_distance: config.panic_distance,
            neighborhood_radius: config.neighborhood_radius,
            seek: BehaviorSlot::inactive(config.seek_weight),
            flee: BehaviorSlot::inactive(config.flee_weight),
            separation: BehaviorSlot::inactive(config.separation_weight),
            boost: None,
        }
    }

    pub fn behavior(&self, kind: BehaviorKind) -> &BehaviorSlot {
        match kind {
            BehaviorKind::Seek => &self.seek,
            BehaviorKind::Flee => &self.flee,
            BehaviorKind::Separation => &self.separation,
        }
    }

    fn behavior_mut(&mut self, kind: BehaviorKind) -> &mut BehaviorSlot {
        match kind {
            BehaviorKind::Seek => &mut self.seek,
            BehaviorKind::Flee => &mut self.flee,
            BehaviorKind::Separation => &mut self.separation,
        }
    }

    pub fn set_behavior_target(&mut self, kind: BehaviorKind, target: SteeringTarget) {
        self.behavior_mut(kind).target = Some(target);
    }

    pub fn set_behavior_active(&mut self, kind: BehaviorKind, active: bool) {
        self.behavior_mut(kind).active = active;
    }

    pub fn disable_all(&mut self) {
        for kind in BehaviorKind::ALL {
            self.set_behavior_active(kind, false);
        }
    }

    pub fn active_behaviors(&self) -> Vec<BehaviorKind> {
        BehaviorKind::ALL
            .into_iter()
            .filter(|kind| self.behavior(*kind).active)
            .collect()
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Residual knockback velocity, kept apart from steering velocity.
    pub fn knockback(&self) -> Vec3 {
        self.knockback
    }

    pub fn start_boost(&mut self, multiplier: f32, until_ms: u64) {
        self.boost = Some((multiplier.max(1.0), until_ms));
    }

    pub fn effective_max_speed(&self, now_ms: u64) -> f32 {
        match self.boost {
            Some((multiplier, until_ms)) if now_ms < until_ms => self.max_speed * multiplier,
            _ => self.max_speed,
        }
    }

    /// Ground-plane shove scaled by mass. It moves the agent even when no
    /// behaviour is active, is not capped by max speed and fades out over
    /// the following ticks.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        if impulse.is_finite() {
            self.knockback += planar(impulse) / self.mass;
        }
    }

    fn knockback_step(&mut self, dt: f32) -> Vec3 {
        if self.knockback == Vec3::ZERO {
            return Vec3::ZERO;
        }
        let displacement = self.knockback * dt;
        self.knockback *= (1.0 - self.knockback_damping * dt).max(0.0);
        if self.knockback.length() < KNOCKBACK_REST_SPEED {
            self.knockback = Vec3::ZERO;
        }
        displacement
    }

    /// Integrates one step and returns the new position.
    ///
    /// `resolve` maps actor targets to positions; targets it cannot resolve
    /// contribute no force.
    pub fn tick(
        &mut self,
        position: Vec3,
        neighbors: &[Vec3],
        resolve: &dyn Fn(ActorId) -> Option<Vec3>,
        now_ms: u64,
        dt: f32,
    ) -> Vec3 {
        if matches!(self.boost, Some((_, until_ms)) if now_ms >= until_ms) {
            self.boost = None;
        }
        if !dt.is_finite() || dt <= 0.0 {
            return position;
        }
        let shove = self.knockback_step(dt);
        if !(self.seek.active || self.flee.active || self.separation.active) {
            self.velocity = Vec3::ZERO;
            return position + shove;
        }

        let max_speed = self.effective_max_speed(now_ms);
        let resolve_target = |slot: &BehaviorSlot| match slot.target? {
            SteeringTarget::Point(point) => Some(point),
            SteeringTarget::Actor(actor_id) => resolve(actor_id),
        };

        let mut force = Vec3::ZERO;
        if self.seek.active {
            if let Some(target) = resolve_target(&self.seek) {
                force += seek_force(position, target, self.velocity, max_speed) * self.seek.weight;
            }
        }
        if self.flee.active {
            if let Some(threat) = resolve_target(&self.flee) {
                force += flee_force(
                    position,
                    threat,
                    self.velocity,
                    max_speed,
                    self.panic_distance,
                ) * self.flee.weight;
            }
        }
        if self.separation.active {
            force += separation_force(position, neighbors, self.neighborhood_radius)
                * self.separation.weight;
        }

        let force = planar(force).clamp_length_max(self.max_force);
        let acceleration = force / self.mass;
        self.velocity = (planar(self.velocity) + acceleration * dt).clamp_length_max(max_speed);
        position + self.velocity * dt + shove
    }
}

/// Detects agents that should be moving but keep sampling the same spot.
#[derive(Debug, Clone, PartialEq)]
pub struct StuckDetector {
    enabled: bool,
    sample_interval_ms: u64,
    min_progress: f32,
    stuck_limit_ms: u64,
    jitter: f32,
    last_sample: Option<(u64, Vec3)>,
    stuck_ms: u64,
}

impl StuckDetector {
    pub fn new(config: &StuckConfig) -> Self {
        Self {
            enabled: config.enabled,
            sample_interval_ms: seconds_to_ms(config.sample_interval_seconds).max(1),
            min_progress: config.min_progress,
            stuck_limit_ms: seconds_to_ms(config.stuck_limit_seconds),
            jitter: config.jitter,
            last_sample: None,
            stuck_ms: 0,
        }
    }

    pub fn stuck_ms(&self) -> u64 {
        self.stuck_ms
    }

    pub fn reset(&mut self) {
        self.last_sample = None;
        self.stuck_ms = 0;
    }

    /// Returns true once the accumulated stuck time passes the limit; the
    /// caller then applies [`StuckDetector::escape_offset`] and a speed boost.
    pub fn sample(&mut self, now_ms: u64, position: Vec3, should_move: bool) -> bool {
        if !self.enabled || !should_move {
            self.reset();
            return false;
        }
        let Some((last_ms, last_position)) = self.last_sample else {
            self.last_sample = Some((now_ms, position));
            return false;
        };
        let elapsed = now_ms.saturating_sub(last_ms);
        if elapsed < self.sample_interval_ms {
            return false;
        }

        if horizontal_distance(position, last_position) < self.min_progress {
            self.stuck_ms = self.stuck_ms.saturating_add(elapsed);
        } else {
            self.stuck_ms = 0;
        }
        self.last_sample = Some((now_ms, position));

        if self.stuck_ms > self.stuck_limit_ms {
            self.stuck_ms = 0;
            return true;
        }
        false
    }

    pub fn escape_offset(&self, rng: &mut impl Rng) -> Vec3 {
        if self.jitter <= 0.0 {
            return Vec3::ZERO;
        }
        Vec3::new(
            rng.gen_range(-self.jitter..=self.jitter),
            0.0,
            rng.gen_range(-self.jitter..=self.jitter),
        )
    }
}

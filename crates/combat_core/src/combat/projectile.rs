use glam::Vec3;

use crate::config::ProjectileConfig;
use crate::seconds_to_ms;
use crate::sim::{horizontal_distance, ActorId, Team, World};

/// Ballistic explosive. Detonates at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    owner: ActorId,
    owner_team: Option<Team>,
    position: Vec3,
    velocity: Vec3,
    gravity: f32,
    spawned_at_ms: u64,
    lifetime_ms: u64,
    damage: f32,
    blast_radius: f32,
    collision_radius: f32,
    ground_height: f32,
    detonated: bool,
}

impl Projectile {
    pub fn launch(
        config: &ProjectileConfig,
        owner: ActorId,
        owner_team: Option<Team>,
        origin: Vec3,
        direction: Vec3,
        damage: f32,
        now_ms: u64,
    ) -> Self {
        let velocity = direction.normalize_or_zero() * config.speed + Vec3::Y * config.upward_speed;
        Self {
            owner,
            owner_team,
            position: origin,
            velocity,
            gravity: config.gravity,
            spawned_at_ms: now_ms,
            lifetime_ms: seconds_to_ms(config.lifetime_seconds),
            damage,
            blast_radius: config.blast_radius,
            collision_radius: config.collision_radius,
            ground_height: config.ground_height,
            detonated: false,
        }
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn blast_radius(&self) -> f32 {
        self.blast_radius
    }

    pub fn is_detonated(&self) -> bool {
        self.detonated
    }

    /// Advances the flight; returns the blast point on the step it detonates.
    pub fn step(&mut self, now_ms: u64, dt: f32, world: &World) -> Option<Vec3> {
        if self.detonated {
            return None;
        }
        if now_ms.saturating_sub(self.spawned_at_ms) >= self.lifetime_ms {
            return self.detonate();
        }
        if dt.is_finite() && dt > 0.0 {
            self.velocity.y -= self.gravity * dt;
            self.position += self.velocity * dt;
        }

        if self.position.y <= self.ground_height
            || self.touches_obstacle(world)
            || self.touches_hostile(world)
        {
            return self.detonate();
        }
        None
    }

    fn detonate(&mut self) -> Option<Vec3> {
        self.detonated = true;
        Some(self.position)
    }

    fn touches_obstacle(&self, world: &World) -> bool {
        world.obstacles().iter().any(|obstacle| {
            horizontal_distance(self.position, obstacle.center)
                < obstacle.radius + self.collision_radius
                && self.position.y <= obstacle.center.y + obstacle.height
        })
    }

    fn touches_hostile(&self, world: &World) -> bool {
        world
            .actors_where(|actor| {
                actor.is_alive()
                    && actor.id != self.owner
                    && self.owner_team.map_or(true, |team| team != actor.team)
            })
            .any(|actor| {
                horizontal_distance(self.position, actor.position)
                    < actor.radius + self.collision_radius
                    && self.position.y >= actor.position.y
                    && self.position.y <= actor.position.y + actor.height
            })
    }
}

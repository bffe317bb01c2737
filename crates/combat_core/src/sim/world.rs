use glam::Vec3;

use crate::combat::Health;
use crate::config::Obstacle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    Survivors,
    Horde,
}

impl ActorKind {
    pub fn team(self) -> Team {
        match self {
            Self::Player => Team::Survivors,
            Self::Enemy => Team::Horde,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub team: Team,
    pub position: Vec3,
    pub radius: f32,
    pub height: f32,
    pub yaw_radians: f32,
    pub health: Health,
}

impl Actor {
    pub fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    /// Point used as the aim target and blast reference: half way up the body.
    pub fn center(&self) -> Vec3 {
        self.position + Vec3::Y * (self.height * 0.5)
    }
}

/// Distance on the ground plane; height differences never affect gameplay ranges.
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    (dx * dx + dz * dz).sqrt()
}

#[derive(Debug, Default)]
pub struct World {
    next_actor_id: u64,
    actors: Vec<Actor>,
    obstacles: Vec<Obstacle>,
}

impl World {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self {
            next_actor_id: 1,
            actors: Vec::new(),
            obstacles,
        }
    }

    pub fn spawn_actor(
        &mut self,
        kind: ActorKind,
        position: Vec3,
        radius: f32,
        height: f32,
        max_health: f32,
    ) -> ActorId {
        let id = ActorId(self.next_actor_id.max(1));
        self.next_actor_id = id.0.saturating_add(1);
        self.actors.push(Actor {
            id,
            kind,
            team: kind.team(),
            position,
            radius,
            height,
            yaw_radians: 0.0,
            health: Health::new(max_health),
        });
        id
    }

    pub fn despawn(&mut self, id: ActorId) -> Option<Actor> {
        let index = self.actors.iter().position(|actor| actor.id == id)?;
        Some(self.actors.remove(index))
    }

    pub fn find(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    pub fn find_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|actor| actor.id == id)
    }

    pub fn actors_where<'a>(
        &'a self,
        predicate: impl Fn(&Actor) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Actor> + 'a {
        self.actors.iter().filter(move |actor| predicate(actor))
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }
}

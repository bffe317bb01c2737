use glam::Vec3;

use super::world::{horizontal_distance, Actor, ActorId, World};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub actor_id: ActorId,
    pub point: Vec3,
    pub distance: f32,
}

/// Scene queries the combat systems depend on.
///
/// Implementations may use any acceleration structure; results must be
/// deterministic for a given world state.
pub trait SpatialQuery {
    /// Nearest actor on the ground plane that passes `filter`; ties resolve to the lower id.
    fn nearest_actor(
        &self,
        world: &World,
        position: Vec3,
        filter: &dyn Fn(&Actor) -> bool,
    ) -> Option<ActorId>;

    /// Actors intersected by the ray within `max_distance`, sorted nearest first.
    fn raycast(
        &self,
        world: &World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        candidates: &dyn Fn(&Actor) -> bool,
    ) -> Vec<RayHit>;
}

/// Brute-force queries over upright cylinders (`radius` around the actor, `height` tall).
#[derive(Debug, Clone, Copy, Default)]
pub struct SphereQuery;

const PARALLEL_EPSILON: f32 = 1e-6;

impl SphereQuery {
    fn ray_entry_distance(actor: &Actor, origin: Vec3, direction: Vec3) -> Option<f32> {
        let (mut t_min, mut t_max) = (f32::NEG_INFINITY, f32::INFINITY);

        let ox = origin.x - actor.position.x;
        let oz = origin.z - actor.position.z;
        let a = direction.x * direction.x + direction.z * direction.z;
        let c = ox * ox + oz * oz - actor.radius * actor.radius;
        if a <= PARALLEL_EPSILON {
            if c > 0.0 {
                return None;
            }
        } else {
            let b = 2.0 * (ox * direction.x + oz * direction.z);
            let discriminant = b * b - 4.0 * a * c;
            if discriminant < 0.0 {
                return None;
            }
            let root = discriminant.sqrt();
            t_min = t_min.max((-b - root) / (2.0 * a));
            t_max = t_max.min((-b + root) / (2.0 * a));
        }

        let base = actor.position.y;
        let top = base + actor.height;
        if direction.y.abs() <= PARALLEL_EPSILON {
            if origin.y < base || origin.y > top {
                return None;
            }
        } else {
            let t0 = (base - origin.y) / direction.y;
            let t1 = (top - origin.y) / direction.y;
            t_min = t_min.max(t0.min(t1));
            t_max = t_max.min(t0.max(t1));
        }

        if t_min > t_max || t_max < 0.0 {
            return None;
        }
        Some(t_min.max(0.0))
    }
}

impl SpatialQuery for SphereQuery {
    fn nearest_actor(
        &self,
        world: &World,
        position: Vec3,
        filter: &dyn Fn(&Actor) -> bool,
    ) -> Option<ActorId> {
        let mut best: Option<(f32, ActorId)> = None;
        for actor in world.actors_where(|actor| filter(actor)) {
            let distance = horizontal_distance(position, actor.position);
            let better = match best {
                None => true,
                Some((best_distance, best_id)) => {
                    distance < best_distance || (distance == best_distance && actor.id < best_id)
                }
            };
            if better {
                best = Some((distance, actor.id));
            }
        }
        best.map(|(_, id)| id)
    }

    fn raycast(
        &self,
        world: &World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        candidates: &dyn Fn(&Actor) -> bool,
    ) -> Vec<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || !max_distance.is_finite() || max_distance <= 0.0 {
            return Vec::new();
        }

        let mut hits: Vec<RayHit> = world
            .actors_where(|actor| candidates(actor))
            .filter_map(|actor| {
                let distance = Self::ray_entry_distance(actor, origin, direction)?;
                (distance <= max_distance).then(|| RayHit {
                    actor_id: actor.id,
                    point: origin + direction * distance,
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.actor_id.cmp(&b.actor_id))
        });
        hits
    }
}

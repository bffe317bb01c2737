use glam::Vec3;
use tracing::debug;

use super::projectile::Projectile;
use crate::config::{WeaponConfig, WeaponKind};
use crate::seconds_to_ms;
use crate::sim::{horizontal_distance, Actor, ActorId, SpatialQuery, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmmoReserve {
    Infinite,
    Finite(u32),
}

impl AmmoReserve {
    fn from_config(ammo: i64) -> Self {
        if ammo < 0 {
            Self::Infinite
        } else {
            Self::Finite(u32::try_from(ammo).unwrap_or(u32::MAX))
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::Finite(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitDamage {
    pub actor_id: ActorId,
    pub amount: f32,
    pub point: Vec3,
}

/// Everything a shot needs to know about the scene at the moment of firing.
pub struct ShotContext<'a> {
    pub origin: Vec3,
    pub direction: Vec3,
    pub owner: ActorId,
    pub world: &'a World,
    pub spatial: &'a dyn SpatialQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireBlocked {
    Reloading,
    CoolingDown,
    ClipEmpty { reload_started: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FireResult {
    Blocked(FireBlocked),
    HitScan {
        hits: Vec<HitDamage>,
        reload_started: bool,
    },
    Launched {
        projectile: Projectile,
        reload_started: bool,
    },
}

impl FireResult {
    pub fn fired(&self) -> bool {
        !matches!(self, Self::Blocked(_))
    }

    pub fn reload_started(&self) -> bool {
        match self {
            Self::Blocked(FireBlocked::ClipEmpty { reload_started }) => *reload_started,
            Self::Blocked(_) => false,
            Self::HitScan { reload_started, .. } | Self::Launched { reload_started, .. } => {
                *reload_started
            }
        }
    }
}

/// Damage for the `index`-th hit along a penetrating ray, nearest first.
pub fn penetration_damage(base: f32, falloff: &[f32], index: usize) -> Option<f32> {
    falloff.get(index).map(|multiplier| base * multiplier)
}

/// Linear splash falloff: full damage at the centre, nothing at or past `radius`.
pub fn area_damage_at(distance: f32, radius: f32, damage: f32) -> f32 {
    if radius <= 0.0 || !distance.is_finite() || distance >= radius {
        return 0.0;
    }
    damage * (1.0 - distance.max(0.0) / radius)
}

/// Splash damage for every living actor in range. The owner's share is
/// scaled by `self_damage_scale`.
pub fn resolve_area_damage(
    world: &World,
    center: Vec3,
    radius: f32,
    damage: f32,
    owner: ActorId,
    self_damage_scale: f32,
) -> Vec<HitDamage> {
    world
        .actors_where(|actor| actor.is_alive())
        .filter_map(|actor| {
            let distance = horizontal_distance(center, actor.position);
            let mut amount = area_damage_at(distance, radius, damage);
            if actor.id == owner {
                amount *= self_damage_scale;
            }
            (amount > 0.0).then_some(HitDamage {
                actor_id: actor.id,
                amount,
                point: actor.center(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    config: WeaponConfig,
    ammo_in_clip: u32,
    reserve: AmmoReserve,
    cooldown_ms: u64,
    reload_ms: u64,
    reload_ready_at_ms: Option<u64>,
    last_fired_at_ms: Option<u64>,
}

impl Weapon {
    pub fn new(config: WeaponConfig) -> Self {
        let clip_size = config.clip_size.max(1);
        Self {
            ammo_in_clip: clip_size,
            reserve: AmmoReserve::from_config(config.ammo),
            cooldown_ms: seconds_to_ms(config.cooldown_seconds),
            reload_ms: seconds_to_ms(config.reload_seconds),
            reload_ready_at_ms: None,
            last_fired_at_ms: None,
            config: WeaponConfig {
                clip_size,
                ..config
            },
        }
    }

    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn ammo_in_clip(&self) -> u32 {
        self.ammo_in_clip
    }

    pub fn reserve(&self) -> AmmoReserve {
        self.reserve
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_ready_at_ms.is_some()
    }

    pub fn reload_ready_at_ms(&self) -> Option<u64> {
        self.reload_ready_at_ms
    }

    /// Starts a reload unless one is running, the clip is full or the reserve is empty.
    pub fn request_reload(&mut self, now_ms: u64) -> bool {
        if self.is_reloading()
            || self.ammo_in_clip >= self.config.clip_size
            || self.reserve.is_empty()
        {
            return false;
        }
        self.reload_ready_at_ms = Some(now_ms.saturating_add(self.reload_ms));
        debug!(
            weapon = %self.config.name,
            ready_at_ms = now_ms.saturating_add(self.reload_ms),
            "weapon_reload_started"
        );
        true
    }

    /// Completes a due reload. Returns the new clip count when one finished.
    pub fn update(&mut self, now_ms: u64) -> Option<u32> {
        let ready_at = self.reload_ready_at_ms?;
        if now_ms < ready_at {
            return None;
        }
        self.reload_ready_at_ms = None;

        let needed = self.config.clip_size.saturating_sub(self.ammo_in_clip);
        let taken = match self.reserve {
            AmmoReserve::Infinite => needed,
            AmmoReserve::Finite(remaining) => {
                let taken = needed.min(remaining);
                self.reserve = AmmoReserve::Finite(remaining - taken);
                taken
            }
        };
        self.ammo_in_clip += taken;
        Some(self.ammo_in_clip)
    }

    pub fn fire(&mut self, now_ms: u64, shot: &ShotContext<'_>) -> FireResult {
        if self.is_reloading() {
            return FireResult::Blocked(FireBlocked::Reloading);
        }
        if let Some(last) = self.last_fired_at_ms {
            if now_ms.saturating_sub(last) < self.cooldown_ms {
                return FireResult::Blocked(FireBlocked::CoolingDown);
            }
        }
        if self.ammo_in_clip == 0 {
            let reload_started = self.request_reload(now_ms);
            return FireResult::Blocked(FireBlocked::ClipEmpty { reload_started });
        }

        self.ammo_in_clip -= 1;
        self.last_fired_at_ms = Some(now_ms);

        let owner_team = shot.world.find(shot.owner).map(|actor| actor.team);
        match self.config.kind {
            WeaponKind::HitScan => {
                let hits: Vec<HitDamage> = shot
                    .spatial
                    .raycast(
                        shot.world,
                        shot.origin,
                        shot.direction,
                        self.config.range,
                        &|actor: &Actor| {
                            actor.is_alive()
                                && actor.id != shot.owner
                                && owner_team.map_or(true, |team| team != actor.team)
                        },
                    )
                    .into_iter()
                    .enumerate()
                    .filter_map(|(index, hit)| {
                        let amount = penetration_damage(
                            self.config.damage,
                            &self.config.penetration_falloff,
                            index,
                        )?;
                        (amount > 0.0).then_some(HitDamage {
                            actor_id: hit.actor_id,
                            amount,
                            point: hit.point,
                        })
                    })
                    .collect();
                FireResult::HitScan {
                    hits,
                    reload_started: self.auto_reload_if_empty(now_ms),
                }
            }
            WeaponKind::Launcher => {
                let projectile = Projectile::launch(
                    &self.config.projectile,
                    shot.owner,
                    owner_team,
                    shot.origin,
                    shot.direction,
                    self.config.damage,
                    now_ms,
                );
                FireResult::Launched {
                    projectile,
                    reload_started: self.auto_reload_if_empty(now_ms),
                }
            }
        }
    }

    fn auto_reload_if_empty(&mut self, now_ms: u64) -> bool {
        self.ammo_in_clip == 0 && self.config.auto_reload && self.request_reload(now_ms)
    }
}

use glam::Vec3;
use serde::Serialize;

use super::intents::WeaponId;
use super::world::{ActorId, ActorKind};
use crate::combat::AiState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatEvent {
    Damaged {
        actor_id: ActorId,
        amount: f32,
        remaining: f32,
        point: Vec3,
        source: Option<ActorId>,
    },
    Died {
        actor_id: ActorId,
        kind: ActorKind,
    },
    StateChanged {
        actor_id: ActorId,
        from: AiState,
        to: AiState,
    },
    Attacked {
        attacker_id: ActorId,
        target_id: ActorId,
        damage: f32,
    },
    WeaponFired {
        weapon: WeaponId,
        hits: u32,
    },
    ReloadStarted {
        weapon: WeaponId,
    },
    ReloadFinished {
        weapon: WeaponId,
        ammo_in_clip: u32,
    },
    ProjectileDetonated {
        owner: ActorId,
        point: Vec3,
    },
    EnemySpawned {
        actor_id: ActorId,
        position: Vec3,
    },
    ActorRemoved {
        actor_id: ActorId,
    },
    LevelStarted {
        level: u32,
    },
    LevelComplete {
        level: u32,
        bonus: u64,
    },
    GameOver {
        level: u32,
        final_score: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatEventKind {
    Damaged,
    Died,
    StateChanged,
    Attacked,
    WeaponFired,
    ReloadStarted,
    ReloadFinished,
    ProjectileDetonated,
    EnemySpawned,
    ActorRemoved,
    LevelStarted,
    LevelComplete,
    GameOver,
}

impl CombatEvent {
    pub fn kind(&self) -> CombatEventKind {
        match self {
            Self::Damaged { .. } => CombatEventKind::Damaged,
            Self::Died { .. } => CombatEventKind::Died,
            Self::StateChanged { .. } => CombatEventKind::StateChanged,
            Self::Attacked { .. } => CombatEventKind::Attacked,
            Self::WeaponFired { .. } => CombatEventKind::WeaponFired,
            Self::ReloadStarted { .. } => CombatEventKind::ReloadStarted,
            Self::ReloadFinished { .. } => CombatEventKind::ReloadFinished,
            Self::ProjectileDetonated { .. } => CombatEventKind::ProjectileDetonated,
            Self::EnemySpawned { .. } => CombatEventKind::EnemySpawned,
            Self::ActorRemoved { .. } => CombatEventKind::ActorRemoved,
            Self::LevelStarted { .. } => CombatEventKind::LevelStarted,
            Self::LevelComplete { .. } => CombatEventKind::LevelComplete,
            Self::GameOver { .. } => CombatEventKind::GameOver,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventCounts {
    pub total: u32,
    pub damaged: u32,
    pub died: u32,
    pub state_changed: u32,
    pub attacked: u32,
    pub weapon_fired: u32,
    pub reload_started: u32,
    pub reload_finished: u32,
    pub projectile_detonated: u32,
    pub enemy_spawned: u32,
    pub actor_removed: u32,
    pub level_started: u32,
    pub level_complete: u32,
    pub game_over: u32,
}

impl EventCounts {
    pub fn record(&mut self, kind: CombatEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            CombatEventKind::Damaged => &mut self.damaged,
            CombatEventKind::Died => &mut self.died,
            CombatEventKind::StateChanged => &mut self.state_changed,
            CombatEventKind::Attacked => &mut self.attacked,
            CombatEventKind::WeaponFired => &mut self.weapon_fired,
            CombatEventKind::ReloadStarted => &mut self.reload_started,
            CombatEventKind::ReloadFinished => &mut self.reload_finished,
            CombatEventKind::ProjectileDetonated => &mut self.projectile_detonated,
            CombatEventKind::EnemySpawned => &mut self.enemy_spawned,
            CombatEventKind::ActorRemoved => &mut self.actor_removed,
            CombatEventKind::LevelStarted => &mut self.level_started,
            CombatEventKind::LevelComplete => &mut self.level_complete,
            CombatEventKind::GameOver => &mut self.game_over,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn merge(&mut self, other: &EventCounts) {
        self.total = self.total.saturating_add(other.total);
        self.damaged = self.damaged.saturating_add(other.damaged);
        self.died = self.died.saturating_add(other.died);
        self.state_changed = self.state_changed.saturating_add(other.state_changed);
        self.attacked = self.attacked.saturating_add(other.attacked);
        self.weapon_fired = self.weapon_fired.saturating_add(other.weapon_fired);
        self.reload_started = self.reload_started.saturating_add(other.reload_started);
        self.reload_finished = self.reload_finished.saturating_add(other.reload_finished);
        self.projectile_detonated = self
            .projectile_detonated
            .saturating_add(other.projectile_detonated);
        self.enemy_spawned = self.enemy_spawned.saturating_add(other.enemy_spawned);
        self.actor_removed = self.actor_removed.saturating_add(other.actor_removed);
        self.level_started = self.level_started.saturating_add(other.level_started);
        self.level_complete = self.level_complete.saturating_add(other.level_complete);
        self.game_over = self.game_over.saturating_add(other.game_over);
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    current_tick_events: Vec<CombatEvent>,
    last_tick_events: Vec<CombatEvent>,
    last_tick_counts: EventCounts,
}

impl EventBus {
    pub fn emit(&mut self, event: CombatEvent) {
        self.current_tick_events.push(event);
    }

    pub fn iter_emitted_so_far(&self) -> impl Iterator<Item = &CombatEvent> {
        self.current_tick_events.iter()
    }

    pub fn finish_tick_rollover(&mut self) {
        let mut counts = EventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.last_tick_counts = counts;
        self.last_tick_events = std::mem::take(&mut self.current_tick_events);
    }

    pub fn last_tick_events(&self) -> &[CombatEvent] {
        &self.last_tick_events
    }

    pub fn last_tick_counts(&self) -> EventCounts {
        self.last_tick_counts
    }
}

/// Presentation-side listener. Every hook defaults to a no-op.
pub trait CombatObserver {
    fn on_damage(&mut self, _actor_id: ActorId, _amount: f32, _point: Vec3) {}
    fn on_death(&mut self, _actor_id: ActorId, _kind: ActorKind) {}
    fn on_state_change(&mut self, _actor_id: ActorId, _from: AiState, _to: AiState) {}
    fn on_level_complete(&mut self, _level: u32, _bonus: u64) {}
    fn on_game_over(&mut self, _level: u32, _final_score: u64) {}
    /// Sees every event, including those with a dedicated hook.
    fn on_event(&mut self, _event: &CombatEvent) {}
}

pub(crate) fn dispatch(observer: &mut dyn CombatObserver, event: &CombatEvent) {
    match *event {
        CombatEvent::Damaged {
            actor_id,
            amount,
            point,
            ..
        } => observer.on_damage(actor_id, amount, point),
        CombatEvent::Died { actor_id, kind } => observer.on_death(actor_id, kind),
        CombatEvent::StateChanged { actor_id, from, to } => {
            observer.on_state_change(actor_id, from, to)
        }
        CombatEvent::LevelComplete { level, bonus } => observer.on_level_complete(level, bonus),
        CombatEvent::GameOver { level, final_score } => observer.on_game_over(level, final_score),
        _ => {}
    }
    observer.on_event(event);
}

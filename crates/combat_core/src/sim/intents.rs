use glam::Vec3;

use super::world::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeaponId(pub usize);

/// Input-layer requests, buffered until the next tick consumes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatIntent {
    Fire { weapon: WeaponId },
    Reload { weapon: WeaponId },
    Move { actor_id: ActorId, direction: Vec3 },
    Aim { direction: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatIntentKind {
    Fire,
    Reload,
    Move,
    Aim,
}

impl CombatIntent {
    pub fn kind(&self) -> CombatIntentKind {
        match self {
            Self::Fire { .. } => CombatIntentKind::Fire,
            Self::Reload { .. } => CombatIntentKind::Reload,
            Self::Move { .. } => CombatIntentKind::Move,
            Self::Aim { .. } => CombatIntentKind::Aim,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntentApplyStats {
    pub total: u32,
    pub fire: u32,
    pub reload: u32,
    pub movement: u32,
    pub aim: u32,
    pub invalid_count: u32,
}

impl IntentApplyStats {
    pub fn record_intent(&mut self, kind: CombatIntentKind) {
        self.total = self.total.saturating_add(1);
        match kind {
            CombatIntentKind::Fire => self.fire = self.fire.saturating_add(1),
            CombatIntentKind::Reload => self.reload = self.reload.saturating_add(1),
            CombatIntentKind::Move => self.movement = self.movement.saturating_add(1),
            CombatIntentKind::Aim => self.aim = self.aim.saturating_add(1),
        }
    }

    pub fn record_invalid(&mut self) {
        self.invalid_count = self.invalid_count.saturating_add(1);
    }
}

#[derive(Debug, Default)]
pub struct IntentQueue {
    intents: Vec<CombatIntent>,
    rejected_since_tick: u32,
    last_tick_apply_stats: IntentApplyStats,
}

impl IntentQueue {
    pub fn enqueue(&mut self, intent: CombatIntent) {
        self.intents.push(intent);
    }

    /// Counts a request rejected before it reached the queue.
    pub fn reject(&mut self) {
        self.rejected_since_tick = self.rejected_since_tick.saturating_add(1);
    }

    pub fn drain_current_tick(&mut self) -> Vec<CombatIntent> {
        std::mem::take(&mut self.intents)
    }

    pub(crate) fn take_rejected(&mut self) -> u32 {
        std::mem::take(&mut self.rejected_since_tick)
    }

    pub fn pending(&self) -> usize {
        self.intents.len()
    }

    pub fn set_last_tick_apply_stats(&mut self, stats: IntentApplyStats) {
        self.last_tick_apply_stats = stats;
    }

    pub fn last_tick_apply_stats(&self) -> IntentApplyStats {
        self.last_tick_apply_stats
    }
}

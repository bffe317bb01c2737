use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
    dead: bool,
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = if max.is_finite() { max.max(0.0) } else { 0.0 };
        Self {
            current: max,
            max,
            dead: max <= 0.0,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageResult {
    pub applied: bool,
    pub amount_applied: f32,
    pub killed: bool,
}

impl DamageResult {
    const IGNORED: Self = Self {
        applied: false,
        amount_applied: 0.0,
        killed: false,
    };
}

/// Subtracts `amount`, clamping at zero. `killed` is reported by the one call
/// that takes the actor to zero; later calls on a dead actor are no-ops.
/// NaN and negative amounts are rejected; infinite damage is lethal.
pub fn apply_damage(health: &mut Health, amount: f32) -> DamageResult {
    if amount.is_nan() || amount < 0.0 {
        debug!(amount, "apply_damage_ignored_invalid_amount");
        return DamageResult::IGNORED;
    }
    if health.dead {
        return DamageResult::IGNORED;
    }

    let before = health.current;
    health.current = (health.current - amount).max(0.0);
    let killed = health.current <= 0.0;
    if killed {
        health.current = 0.0;
        health.dead = true;
    }
    DamageResult {
        applied: true,
        amount_applied: before - health.current,
        killed,
    }
}

/// Restores up to `max`; returns the amount actually restored.
pub fn heal(health: &mut Health, amount: f32) -> f32 {
    if health.dead || !amount.is_finite() || amount <= 0.0 {
        return 0.0;
    }
    let before = health.current;
    health.current = (health.current + amount).min(health.max);
    health.current - before
}

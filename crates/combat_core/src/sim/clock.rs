use std::time::Duration;

/// Time source sampled once at the start of every session tick.
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn delta_seconds(&self) -> f32;
}

/// Advances by a constant step; drives the headless loop and deterministic tests.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    fixed_dt: Duration,
    elapsed: Duration,
}

impl FixedStepClock {
    pub fn new(fixed_dt: Duration) -> Self {
        Self {
            fixed_dt,
            elapsed: Duration::ZERO,
        }
    }

    pub fn from_hz(hz: u32) -> Self {
        let hz = hz.max(1);
        Self::new(Duration::from_secs_f64(1.0 / f64::from(hz)))
    }

    pub fn advance(&mut self) {
        self.elapsed = self.elapsed.saturating_add(self.fixed_dt);
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Clock for FixedStepClock {
    fn now_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    fn delta_seconds(&self) -> f32 {
        self.fixed_dt.as_secs_f32()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: u64,
    delta_seconds: f32,
}

impl ManualClock {
    pub fn new(now_ms: u64, delta_seconds: f32) -> Self {
        Self {
            now_ms,
            delta_seconds,
        }
    }

    pub fn set(&mut self, now_ms: u64, delta_seconds: f32) {
        self.now_ms = now_ms;
        self.delta_seconds = delta_seconds;
    }

    /// Moves time forward and reports the step as this tick's delta.
    pub fn advance_ms(&mut self, step_ms: u64) {
        self.now_ms = self.now_ms.saturating_add(step_ms);
        self.delta_seconds = step_ms as f32 / 1000.0;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn delta_seconds(&self) -> f32 {
        self.delta_seconds
    }
}

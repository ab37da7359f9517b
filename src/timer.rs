use std::time::Duration;

/// Interval gate for throttled actions.
///
/// The expiry "callback" is the `true` returned from [`Timer::update`]; the owner
/// decides what to run, which keeps the timer free of borrows on game state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timer {
    duration: Duration,
    elapsed: Duration,
    active: bool,
    repeating: bool,
}

impl Timer {
    pub fn one_shot(duration: Duration) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
            active: false,
            repeating: false,
        }
    }

    pub fn repeating(duration: Duration) -> Self {
        Self {
            repeating: true,
            ..Self::one_shot(duration)
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.elapsed = Duration::ZERO;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.elapsed = Duration::ZERO;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Takes effect on the current interval; elapsed time is kept.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Advances the timer and returns `true` when it expired during this step.
    pub fn update(&mut self, dt: Duration) -> bool {
        if !self.active {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed < self.duration {
            return false;
        }
        if self.repeating {
            self.elapsed = Duration::ZERO;
        } else {
            self.deactivate();
        }
        true
    }
}

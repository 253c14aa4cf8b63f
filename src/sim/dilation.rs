//! Time dilation ("focus time") resource
//!
//! Holding the dilate key during gameplay slows the simulation while the
//! charge lasts. Running dry locks the ability out until fully recharged.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDilation {
    /// Seconds of dilation when full
    pub capacity: f32,
    /// Drain per second while active
    pub drain: f32,
    /// Recharge per second while inactive
    pub recover: f32,
    /// Multiplier applied to dt while active
    pub scale: f32,
    charge: f32,
    locked_out: bool,
    active: bool,
}

impl TimeDilation {
    pub fn new(settings: &Settings) -> Self {
        let capacity = settings.dilation_capacity.max(0.0);
        Self {
            capacity,
            drain: settings.dilation_drain,
            recover: settings.dilation_recover,
            scale: settings.dilation_scale.clamp(0.0, 1.0),
            charge: capacity,
            locked_out: false,
            active: false,
        }
    }

    pub fn charge(&self) -> f32 {
        self.charge
    }

    /// Charge as a fraction of capacity, for HUD meters
    pub fn fraction(&self) -> f32 {
        if self.capacity > 0.0 {
            self.charge / self.capacity
        } else {
            0.0
        }
    }

    pub fn is_locked_out(&self) -> bool {
        self.locked_out
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Refill and clear the lockout (new run)
    pub fn reset(&mut self) {
        self.charge = self.capacity;
        self.locked_out = false;
        self.active = false;
    }

    /// Advance by a real-time `dt`; returns the time scale for this frame
    pub fn update(&mut self, held: bool, gameplay: bool, dt: f32) -> f32 {
        self.active = held && gameplay && !self.locked_out && self.charge > 0.0;

        if self.active {
            self.charge -= self.drain * dt;
            if self.charge <= 0.0 {
                self.charge = 0.0;
                self.locked_out = true;
                log::debug!("Time dilation exhausted, locked out until recharged");
            }
            return self.scale;
        }

        self.charge = (self.charge + self.recover * dt).min(self.capacity);
        if self.locked_out && self.charge >= self.capacity {
            self.locked_out = false;
        }
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dilation() -> TimeDilation {
        TimeDilation::new(&Settings::default())
    }

    #[test]
    fn test_scales_only_in_gameplay() {
        let mut d = dilation();
        assert_eq!(d.update(true, false, 0.1), 1.0);
        assert_eq!(d.update(false, true, 0.1), 1.0);
        assert_eq!(d.update(true, true, 0.1), 0.5);
        assert!((d.charge() - 1.9).abs() < 1e-5);
    }

    #[test]
    fn test_empty_forces_lockout_until_full() {
        let mut d = dilation();
        // 2s of charge at 1/s
        let mut steps = 0;
        while !d.is_locked_out() {
            d.update(true, true, 0.1);
            steps += 1;
            assert!(steps <= 21);
        }
        assert!(steps >= 20);
        assert_eq!(d.charge(), 0.0);
        assert_eq!(d.update(true, true, 0.1), 1.0);

        // Recovers at 0.5/s: 4s to refill, still locked just short of full
        for _ in 0..38 {
            d.update(true, true, 0.1);
        }
        assert!(d.is_locked_out());
        for _ in 0..4 {
            d.update(false, true, 0.1);
        }
        assert!(!d.is_locked_out());
        assert_eq!(d.charge(), d.capacity);
        assert_eq!(d.update(true, true, 0.1), 0.5);
    }

    #[test]
    fn test_reset_refills() {
        let mut d = dilation();
        for _ in 0..30 {
            d.update(true, true, 0.1);
        }
        d.reset();
        assert_eq!(d.fraction(), 1.0);
        assert!(!d.is_locked_out());
    }
}

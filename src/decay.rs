use crate::{util::ensure_interval, Result};

/// A strategy for decaying a value once per learning update
pub trait Decay {
    /// Calculate the value following `value`
    fn next(&self, value: f64) -> f64;

    /// Smallest value the strategy ever produces
    fn floor(&self) -> f64 {
        0.0
    }
}

/// Leaves the value unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Constant;

impl Decay for Constant {
    fn next(&self, value: f64) -> f64 {
        value
    }
}

/// v<sub>n+1</sub> = v<sub>n</sub> * r
///
/// Unbounded below, after `n` updates the value is v<sub>0</sub> * r<sup>n</sup>.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multiplicative {
    rate: f64,
}

impl Multiplicative {
    /// `rate` must be in the interval `(0,1]`
    pub fn new(rate: f64) -> Result<Self> {
        ensure_interval!(exploration_decay = rate, > 0.0, 1.0);
        Ok(Self { rate })
    }
}

impl Decay for Multiplicative {
    fn next(&self, value: f64) -> f64 {
        value * self.rate
    }
}

/// v<sub>n+1</sub> = max(v<sub>n</sub> * r, v<sub>min</sub>)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Floored {
    rate: f64,
    min: f64,
}

impl Floored {
    /// `rate` must be in `(0,1]` and `min` in `[0,1]`
    pub fn new(rate: f64, min: f64) -> Result<Self> {
        ensure_interval!(exploration_decay = rate, > 0.0, 1.0);
        ensure_interval!(exploration_floor = min, 0.0, 1.0);
        Ok(Self { rate, min })
    }
}

impl Decay for Floored {
    fn next(&self, value: f64) -> f64 {
        (value * self.rate).max(self.min)
    }

    fn floor(&self) -> f64 {
        self.min
    }
}

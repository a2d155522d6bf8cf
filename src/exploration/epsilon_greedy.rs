use rand::Rng;

use crate::{decay::Decay, util::ensure_interval, Error, Result};

use super::Choice;

/// Epsilon greedy exploration policy whose epsilon threshold decays once per learning update
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: f64,
    decay: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a starting epsilon and a decay strategy
    ///
    /// `epsilon` must be in the interval `[0,1]`
    pub fn new(epsilon: f64, decay: D) -> Result<Self> {
        let mut policy = Self {
            epsilon: decay.floor(),
            decay,
        };
        policy.set_epsilon(epsilon)?;
        Ok(policy)
    }

    /// Build from an epsilon that already satisfied [`new`](Self::new) under a decay with a
    /// floor no higher than `decay`'s
    pub(crate) fn from_parts(epsilon: f64, decay: D) -> Self {
        Self { epsilon, decay }
    }

    /// Current epsilon
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Overwrite the current epsilon, `epsilon` must be in the interval `[0,1]` and not below the
    /// floor of the decay strategy
    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<()> {
        ensure_interval!(exploration_rate = epsilon, 0.0, 1.0);
        if epsilon < self.decay.floor() {
            return Err(Error::InvalidArgument {
                name: "exploration_rate",
                value: epsilon,
                reason: "must not be below the exploration floor",
            });
        }
        self.epsilon = epsilon;
        Ok(())
    }

    /// Explore when a uniform draw from `[0,1)` falls below epsilon
    pub fn choose<R: Rng>(&self, rng: &mut R) -> Choice {
        if rng.gen::<f64>() < self.epsilon {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }

    /// Advance epsilon by one step of the decay strategy
    pub fn decay_step(&mut self) {
        self.epsilon = self.decay.next(self.epsilon);
    }

    /// Swap the decay strategy while keeping the current epsilon
    pub(crate) fn map_decay<T: Decay>(self, decay: T) -> Result<EpsilonGreedy<T>> {
        EpsilonGreedy::new(self.epsilon, decay)
    }
}

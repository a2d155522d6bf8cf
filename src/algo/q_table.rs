use std::path::Path;

use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    decay::{Constant, Decay, Floored, Multiplicative},
    ds::QTable,
    error::IndexKind,
    exploration::{Choice, EpsilonGreedy},
    persist,
    util::ensure_interval,
    Error, Result,
};

/// Configuration for the [`QTableAgent`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QTableAgentConfig {
    /// Step size α, must be in `(0,1]`
    ///
    /// **Default**: `0.1`
    pub learning_rate: f64,
    /// Weight γ of the estimated future reward, must be in `[0,1]`
    ///
    /// **Default**: `0.99`
    pub discount_factor: f64,
    /// Initial probability ε of taking a random action, must be in `[0,1]`
    ///
    /// **Default**: `1.0`
    pub exploration_rate: f64,
    /// Factor δ applied to ε after every learning update, must be in `(0,1]`
    ///
    /// **Default**: `0.995`
    pub exploration_decay: f64,
}

impl Default for QTableAgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.99,
            exploration_rate: 1.0,
            exploration_decay: 0.995,
        }
    }
}

impl QTableAgentConfig {
    fn validate(&self) -> Result<()> {
        ensure_interval!(learning_rate = self.learning_rate, > 0.0, 1.0);
        ensure_interval!(discount_factor = self.discount_factor, 0.0, 1.0);
        Ok(())
    }
}

/// A Q-learning agent over a dense table of `state_size × action_size` values
///
/// Actions are chosen epsilon-greedily and every call to [`learn`](Self::learn) applies the
/// one-step temporal-difference update
///
/// Q(s,a) ← Q(s,a) + α(r + γ max<sub>a'</sub> Q(s',a') - Q(s,a))
///
/// followed by one decay step of ε. Only the table is persisted; hyperparameters and ε come
/// from the configuration each time an agent is constructed.
///
/// ### Generics
/// - `D` - The [`Decay`] strategy applied to ε, [`Multiplicative`] unless a floor
///   ([`Floored`]) or a fixed ε ([`Constant`]) is requested
#[derive(Debug, Clone)]
pub struct QTableAgent<D: Decay = Multiplicative> {
    table: QTable,
    state_size: usize,
    action_size: usize,
    config: QTableAgentConfig,
    exploration: EpsilonGreedy<D>,
    rng: StdRng,
}

impl QTableAgent {
    /// Initialize a new agent with a zero-filled table and an entropy-seeded random source
    ///
    /// **Errors** with [`Error::InvalidArgument`] if either size is zero or a hyperparameter is
    /// outside its interval
    pub fn new(state_size: usize, action_size: usize, config: QTableAgentConfig) -> Result<Self> {
        Self::build(state_size, action_size, config, StdRng::from_entropy())
    }

    /// Like [`new`](Self::new), with a seeded random source for reproducible runs
    pub fn with_seed(
        state_size: usize,
        action_size: usize,
        config: QTableAgentConfig,
        seed: u64,
    ) -> Result<Self> {
        Self::build(state_size, action_size, config, StdRng::seed_from_u64(seed))
    }

    fn build(
        state_size: usize,
        action_size: usize,
        config: QTableAgentConfig,
        rng: StdRng,
    ) -> Result<Self> {
        if state_size == 0 {
            return Err(Error::InvalidArgument {
                name: "state_size",
                value: 0.0,
                reason: "must be positive",
            });
        }
        if action_size == 0 {
            return Err(Error::InvalidArgument {
                name: "action_size",
                value: 0.0,
                reason: "must be positive",
            });
        }
        config.validate()?;
        let decay = Multiplicative::new(config.exploration_decay)?;

        Ok(Self {
            table: QTable::zeros(state_size, action_size),
            state_size,
            action_size,
            config,
            exploration: EpsilonGreedy::new(config.exploration_rate, decay)?,
            rng,
        })
    }

    /// Stop ε from decaying below `min`
    ///
    /// **Errors** with [`Error::InvalidArgument`] if the current ε is already below `min`
    pub fn with_exploration_floor(self, min: f64) -> Result<QTableAgent<Floored>> {
        let decay = Floored::new(self.config.exploration_decay, min)?;
        self.with_decay(decay)
    }

    /// Keep ε fixed at its current value, learning updates no longer decay it
    pub fn with_constant_exploration(self) -> QTableAgent<Constant> {
        QTableAgent {
            table: self.table,
            state_size: self.state_size,
            action_size: self.action_size,
            config: self.config,
            exploration: EpsilonGreedy::from_parts(self.exploration.epsilon(), Constant),
            rng: self.rng,
        }
    }

    fn with_decay<T: Decay>(self, decay: T) -> Result<QTableAgent<T>> {
        Ok(QTableAgent {
            table: self.table,
            state_size: self.state_size,
            action_size: self.action_size,
            config: self.config,
            exploration: self.exploration.map_decay(decay)?,
            rng: self.rng,
        })
    }
}

impl<D: Decay> QTableAgent<D> {
    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn action_size(&self) -> usize {
        self.action_size
    }

    pub fn learning_rate(&self) -> f64 {
        self.config.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.config.discount_factor
    }

    pub fn exploration_decay(&self) -> f64 {
        self.config.exploration_decay
    }

    /// Current ε
    pub fn exploration_rate(&self) -> f64 {
        self.exploration.epsilon()
    }

    /// Force ε, e.g. to `0.0` for pure exploitation. Must be in `[0,1]` and not below the
    /// exploration floor, if any
    pub fn set_exploration_rate(&mut self, epsilon: f64) -> Result<()> {
        self.exploration.set_epsilon(epsilon)
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Choose an action for `state` with the epsilon greedy policy
    ///
    /// Leaves the table and ε untouched.
    pub fn choose_action(&mut self, state: usize) -> Result<usize> {
        self.table.check_row(state, IndexKind::State)?;
        match self.exploration.choose(&mut self.rng) {
            Choice::Explore => Ok(self.rng.gen_range(0..self.table.cols())),
            Choice::Exploit => self.greedy_action(state),
        }
    }

    /// The action with the highest value for `state`, ties going to the lowest index
    pub fn greedy_action(&self, state: usize) -> Result<usize> {
        self.table.argmax_in_row(state)
    }

    /// Learn from a single transition and decay ε
    ///
    /// All indices are checked before anything is mutated. **Errors** with
    /// [`Error::InvalidArgument`] if `reward` is not finite.
    pub fn learn(
        &mut self,
        state: usize,
        action: usize,
        reward: f64,
        next_state: usize,
    ) -> Result<()> {
        self.table.check_row(state, IndexKind::State)?;
        self.table.check_col(action)?;
        self.table.check_row(next_state, IndexKind::NextState)?;
        if !reward.is_finite() {
            return Err(Error::InvalidArgument {
                name: "reward",
                value: reward,
                reason: "must be finite",
            });
        }

        let best_next_value = self.table.max_in_row(next_state)?;
        let td_target = reward + self.config.discount_factor * best_next_value;
        let td_error = td_target - self.table.get(state, action)?;
        let value = self
            .table
            .update(state, action, self.config.learning_rate * td_error)?;
        self.exploration.decay_step();

        trace!(
            "learn s={state} a={action} r={reward} s'={next_state}: td_error={td_error} q={value} epsilon={}",
            self.exploration.epsilon()
        );
        Ok(())
    }

    /// Serialize the table, see [`persist::encode`] for the layout
    pub fn export_state(&self) -> Result<Vec<u8>> {
        persist::encode(&self.table)
    }

    /// Replace the table with one decoded from `bytes`
    ///
    /// The decoded shape is accepted as is, even if it differs from the configured sizes. Index
    /// checks follow the table that is actually loaded.
    pub fn import_state(&mut self, bytes: &[u8]) -> Result<()> {
        self.table = persist::decode(bytes)?;
        Ok(())
    }

    /// Like [`import_state`](Self::import_state), but **errors** with [`Error::ShapeMismatch`]
    /// and keeps the current table if the decoded shape differs from the configured sizes
    pub fn import_state_strict(&mut self, bytes: &[u8]) -> Result<()> {
        let table = persist::decode(bytes)?;
        self.replace_checked(table)
    }

    /// Atomically write the table to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        persist::save(&self.table, path)
    }

    /// Replace the table with the one stored at `path`, accepting any shape
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.table = persist::load(path)?;
        Ok(())
    }

    /// Replace the table with the one stored at `path`, rejecting a different shape
    pub fn load_strict(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let table = persist::load(path)?;
        self.replace_checked(table)
    }

    fn replace_checked(&mut self, table: QTable) -> Result<()> {
        let expected = (self.state_size, self.action_size);
        if table.shape() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                found: table.shape(),
            });
        }
        self.table = table;
        Ok(())
    }
}

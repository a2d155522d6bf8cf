//! A tabular Q-learning agent
//!
//! [`QTableAgent`] keeps a dense `state_size × action_size` value table, picks actions
//! epsilon-greedily, learns from single transitions with the one-step temporal-difference rule,
//! and exports its table to bytes or to disk.

/// Implemented RL algorithms
pub mod algo;

/// Strategies for decaying the exploration rate
pub mod decay;

/// Data structures
pub mod ds;

pub mod error;

/// Exploration policies
pub mod exploration;

/// Binary snapshots of the value table
pub mod persist;

/// Sharing one agent between threads
pub mod sync;

mod util;

pub use algo::{QTableAgent, QTableAgentConfig};
pub use error::{Error, IndexKind, Result};
pub use sync::SharedQTableAgent;

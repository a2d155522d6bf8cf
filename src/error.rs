use std::fmt;

/// Which index argument of an operation was out of bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    State,
    Action,
    NextState,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::State => "state",
            Self::Action => "action",
            Self::NextState => "next_state",
        })
    }
}

/// Errors produced by the agent and its persistence layer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A constructor argument or hyperparameter is outside its allowed range
    #[error("invalid value for `{name}`: {value} ({reason})")]
    InvalidArgument {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A state or action index is outside the table
    #[error("{kind} index {index} is out of range [0, {bound})")]
    IndexOutOfRange {
        kind: IndexKind,
        index: i64,
        bound: usize,
    },

    /// Snapshot bytes could not be decoded into a rectangular table
    #[error("corrupt state: {0}")]
    CorruptState(String),

    /// A table could not be serialized
    #[error("cannot encode state: {0}")]
    Encode(String),

    /// A snapshot decoded fine but its shape differs from the agent's configured sizes
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn out_of_range(kind: IndexKind, index: usize, bound: usize) -> Self {
        Self::IndexOutOfRange {
            kind,
            index: i64::try_from(index).unwrap_or(i64::MAX),
            bound,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_argument() {
        let err = Error::out_of_range(IndexKind::NextState, 12, 10);
        assert_eq!(err.to_string(), "next_state index 12 is out of range [0, 10)");

        let err = Error::InvalidArgument {
            name: "learning_rate",
            value: 0.0,
            reason: "must be in (0, 1]",
        };
        assert_eq!(
            err.to_string(),
            "invalid value for `learning_rate`: 0 (must be in (0, 1])"
        );
    }
}

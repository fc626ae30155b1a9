//! Error type shared by the census, serializer and comparator.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A value that is not a table of the arena was passed where one is required.
    #[error("bad input: expected {expected}, found {found}")]
    BadInput {
        expected: &'static str,
        found: String,
    },

    /// A depth-limited comparison descended past its limit.
    #[error("comparison exceeded the depth limit of {limit} nested tables")]
    DepthLimitExceeded { limit: usize },
}

impl Error {
    pub(crate) fn bad_input(expected: &'static str, found: impl Into<String>) -> Self {
        Error::BadInput {
            expected,
            found: found.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

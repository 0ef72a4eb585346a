use crate::mymovies::MyMoviesError;
use thiserror::Error;

/// Errors raised by the store components to their immediate caller.
///
/// Validation failures (`InvalidArgument`, `SetupCallMissing`) are raised
/// synchronously before any network call. Remote failures are normally
/// swallowed into the message log; the one exception is `add_movie`, whose
/// backend error is passed through as `Backend` so the caller can tell a
/// duplicate from anything else.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{message}")]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },

    #[error("{message}")]
    SetupCallMissing {
        required: &'static str,
        message: String,
    },

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Backend(#[from] MyMoviesError),
}

impl StoreError {
    pub fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            message: message.into(),
        }
    }

    pub fn setup_call_missing(required: &'static str, message: impl Into<String>) -> Self {
        Self::SetupCallMissing {
            required,
            message: message.into(),
        }
    }
}

// vim: tw=80
use crate::{CountPolicy, Exception, Value};

/// The single error type for every fallible `mockwrap` operation.
///
/// Configuration mistakes are reported when the expectation is configured,
/// dispatch failures when the intercepted method is called, and call-count
/// failures by [`Session::verify`](crate::Session::verify).  Exceptions raised
/// by a real method or injected by an expectation travel as
/// [`Error::Raised`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// Conflicting configuration, a repeated argument specification, an
    /// invalid pattern, or registration during teardown.
    #[error("{0}")]
    Configuration(String),

    #[error("{target} cannot be intercepted")]
    TargetUnavailable { target: String },

    #[error("{target} does not have method {method}")]
    MethodNotFound { target: String, method: String },

    /// No expectation matched a call, or a spied method produced a value
    /// other than the one expected.
    #[error("{0}")]
    SignatureMismatch(String),

    #[error("{method} expected to be called when {condition} is true")]
    StateGuard { method: String, condition: String },

    #[error("{called} called before {expected}")]
    OrderViolation { called: String, expected: String },

    #[error("expected {expected}, raised {raised}")]
    ExceptionClassMismatch { expected: String, raised: String },

    #[error("expected {expected}, raised {raised:?}")]
    ExceptionMessageMismatch { expected: String, raised: String },

    #[error("{signature} expected to be called {expected} times, called {called} times")]
    CallCount {
        signature: String,
        expected: CountPolicy,
        called: usize
    },

    /// An application exception.
    #[error("{0}")]
    Raised(Exception),
}

impl Error {
    /// The exception carried by [`Error::Raised`], if that is what this is.
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            Error::Raised(e) => Some(e),
            _ => None
        }
    }
}

impl From<Exception> for Error {
    fn from(e: Exception) -> Self {
        Error::Raised(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// What an intercepted call produces: a value, or an error.
pub type Outcome = Result<Value>;

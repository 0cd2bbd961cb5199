// vim: tw=80
/// How a [`Session`](crate::Session) behaves when it is dropped.
///
/// Use the builder methods to customize, or [`Default`] for the usual test
/// behavior: verify on drop, and panic if verification fails.
///
/// # Examples
///
/// ```
/// # use mockwrap::*;
/// let config = SessionConfig::default()
///     .with_panic_on_drop_failure(false);
/// let session = Session::with_config(config);
/// assert!(session.config().verify_on_drop());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionConfig {
    /// Run [`Session::verify`](crate::Session::verify) when the session is
    /// dropped.  If false, dropping only restores the original methods.
    /// Default: true
    verify_on_drop: bool,

    /// Panic if verification on drop fails.  If false the failure is only
    /// logged.  Ignored while the thread is already panicking.
    /// Default: true
    panic_on_drop_failure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            verify_on_drop: true,
            panic_on_drop_failure: true,
        }
    }
}

impl SessionConfig {
    /// Should dropping a session verify it?
    pub fn with_verify_on_drop(mut self, verify: bool) -> Self {
        self.verify_on_drop = verify;
        self
    }

    pub fn verify_on_drop(&self) -> bool {
        self.verify_on_drop
    }

    /// Should a verification failure found on drop panic, rather than only
    /// be logged?
    pub fn with_panic_on_drop_failure(mut self, panic: bool) -> Self {
        self.panic_on_drop_failure = panic;
        self
    }

    pub fn panic_on_drop_failure(&self) -> bool {
        self.panic_on_drop_failure
    }
}

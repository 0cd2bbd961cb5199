// vim: tw=80
//! Sessions own every expectation registered during one test.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
    thread,
};

use crate::{
    dispatch,
    expectation::{Expectation, ExpectationState},
    registry::{Registry, TargetEntry},
    target::{Hook, TargetId},
    Args,
    Error,
    HookTable,
    Interceptable,
    Method,
    Result,
    SessionConfig,
    Value,
};

pub(crate) struct SessionInner {
    config: SessionConfig,
    registry: RefCell<Registry>,
    /// Set while verification is restoring and checking.
    tearing_down: Cell<bool>,
}

impl SessionInner {
    pub(crate) fn expectations(&self, id: TargetId, method: &str)
        -> Vec<Rc<ExpectationState>>
    {
        self.registry.borrow().expectations(id, method)
    }

    /// Forget a misconfigured expectation.
    pub(crate) fn withdraw(&self, state: &Rc<ExpectationState>) {
        if let Some(entry) = self.registry.borrow_mut().get_mut(state.target()) {
            entry.withdraw(state);
        }
    }

    /// A hook that routes calls on `method` of target `id` to the dispatcher.
    fn hook(self: &Rc<Self>, id: TargetId, method: &str) -> Hook {
        let session = Rc::downgrade(self);
        let method = method.to_owned();
        Rc::new(move |receiver: &dyn Interceptable, args: &Args| {
            match session.upgrade() {
                Some(s) => dispatch::dispatch(&s, id, &method, receiver, args),
                // The session is gone, so behave as though nothing is wrapped
                None => match receiver.method(&method) {
                    Some(m) => m.call(receiver, args),
                    None => Err(Error::MethodNotFound {
                        target: receiver.describe(),
                        method: method.clone()
                    })
                }
            }
        })
    }

    fn register(
        self: &Rc<Self>,
        target: &dyn Interceptable,
        hooks: &HookTable,
        method: &str) -> Result<Expectation>
    {
        if self.tearing_down.get() {
            return Err(Error::Configuration(
                "cannot register an expectation while the session is being verified"
                .to_owned()));
        }
        let real = target.method(method);
        let name = target.describe();
        let mut registry = self.registry.borrow_mut();
        let entry = registry.entry(hooks, &name, target.kind());
        let hooked = entry.original(method).cloned();
        let original = match hooked {
            Some(m) => m,
            None => {
                let m = real.ok_or_else(|| Error::MethodNotFound {
                    target: name.clone(),
                    method: method.to_owned()
                })?;
                entry.hook(method, m.clone(), self.hook(hooks.id(), method));
                m
            }
        };
        let state = Rc::new(ExpectationState::new(hooks.id(), entry.kind(),
            method, original));
        entry.push(state.clone());
        Ok(Expectation::new(state, self.clone()))
    }

    fn begin_teardown(&self) -> Vec<TargetEntry> {
        self.tearing_down.set(true);
        self.registry.borrow_mut().take()
    }

    fn restore_all(&self) {
        let mut entries = self.begin_teardown();
        for entry in entries.iter_mut() {
            entry.restore();
        }
        self.tearing_down.set(false);
    }
}

/// A registry of expectations, scoped to one test.
///
/// Every target wrapped through a session is restored when the session is
/// verified, either explicitly with [`verify`](Session::verify) or implicitly
/// when it is dropped.
///
/// # Examples
/// ```
/// # use mockwrap::*;
/// let fs = Namespace::module("fs", MethodTable::new()
///     .function("exists", |_| Ok(Value::from(false))));
/// {
///     let session = Session::new();
///     session.wrap(&fs).unwrap()
///         .method("exists").unwrap()
///         .returns(true).unwrap()
///         .once();
///     assert_eq!(Ok(Value::from(true)), fs.call("exists", args!["/tmp"]));
///     // Dropping the session verifies it
/// }
/// assert_eq!(Ok(Value::from(false)), fs.call("exists", args!["/tmp"]));
/// ```
///
/// A session whose expectations are unsatisfied panics when dropped:
/// ```should_panic
/// # use mockwrap::*;
/// let fs = Namespace::module("fs", MethodTable::new()
///     .function("exists", |_| Ok(Value::from(false))));
/// let session = Session::new();
/// session.wrap(&fs).unwrap().method("exists").unwrap().once();
/// ```
pub struct Session {
    inner: Rc<SessionInner>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a session whose drop behavior is set by `config`.
    pub fn with_config(config: SessionConfig) -> Self {
        let inner = SessionInner {
            config,
            registry: RefCell::default(),
            tearing_down: Cell::new(false),
        };
        Session{inner: Rc::new(inner)}
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Start mocking `target`.
    ///
    /// Wrapping the same target twice returns a handle to the same mock.
    /// Nothing about the target changes until an expectation is created with
    /// [`Mock::method`].
    pub fn wrap<'t>(&self, target: &'t dyn Interceptable) -> Result<Mock<'t>> {
        let Some(hooks) = target.hooks() else {
            return Err(Error::TargetUnavailable{target: target.describe()});
        };
        if self.inner.tearing_down.get() {
            return Err(Error::Configuration(
                "cannot wrap a target while the session is being verified"
                .to_owned()));
        }
        self.inner.registry.borrow_mut()
            .entry(hooks, &target.describe(), target.kind());
        Ok(Mock{target, hooks: hooks.clone(), session: self.inner.clone()})
    }

    /// Wrap `target`, and stub each named method to return its value.
    ///
    /// # Examples
    /// ```
    /// # use mockwrap::*;
    /// let env = Namespace::module("env", MethodTable::new()
    ///     .function("home", |_| Ok(Value::from("/root")))
    ///     .function("user", |_| Ok(Value::from("root"))));
    /// let session = Session::new();
    /// session.wrap_with(&env, [("home", "/home/me"), ("user", "me")]).unwrap();
    /// assert_eq!(Ok(Value::from("me")), env.call("user", args![]));
    /// ```
    pub fn wrap_with<'t, I, S, V>(&self, target: &'t dyn Interceptable, stubs: I)
        -> Result<Mock<'t>>
        where I: IntoIterator<Item=(S, V)>,
              S: AsRef<str>,
              V: Into<Value>
    {
        let mock = self.wrap(target)?;
        for (method, value) in stubs {
            mock.stub(method.as_ref(), value)?;
        }
        Ok(mock)
    }

    /// Is `target` currently registered with this session?
    pub fn is_wrapped(&self, target: &dyn Interceptable) -> bool {
        target.hooks().is_some_and(|h| {
            self.inner.registry.borrow().get(h.id()).is_some()
        })
    }

    /// Restore every wrapped target, then check every expectation's call
    /// count.
    ///
    /// All restorations happen before any check, so a failure never leaves a
    /// hook installed.  The first unsatisfied expectation is reported.  The
    /// session is empty afterwards and may be reused.
    pub fn verify(&self) -> Result<()> {
        let mut entries = self.inner.begin_teardown();
        for entry in entries.iter_mut() {
            entry.restore();
        }
        let result = entries.iter()
            .flat_map(|entry| entry.expectations().iter()
                      .map(move |e| (entry.name(), e)))
            .try_for_each(|(name, e)| e.verify().inspect_err(|err| {
                tracing::debug!(target_name = name, error = %err,
                    "mockwrap::verify: expectation unsatisfied");
            }));
        self.inner.tearing_down.set(false);
        result
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.inner.config)
            .field("empty", &self.inner.registry.borrow().is_empty())
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if thread::panicking() || !self.inner.config.verify_on_drop() {
            self.inner.restore_all();
            return;
        }
        if let Err(e) = self.verify() {
            if self.inner.config.panic_on_drop_failure() {
                panic!("{e}");
            }
            tracing::debug!(error = %e, "mockwrap::verify: failure ignored on drop");
        }
    }
}

/// The registration surface for one wrapped target.
pub struct Mock<'t> {
    target: &'t dyn Interceptable,
    hooks: HookTable,
    session: Rc<SessionInner>,
}

impl<'t> Mock<'t> {
    /// Create a new expectation for `method`.
    ///
    /// The first expectation on a method installs the hook that intercepts
    /// it.  Each further call adds another expectation; when several match a
    /// call, the most recently created one wins.
    pub fn method(&self, method: &str) -> Result<Expectation> {
        self.session.register(self.target, &self.hooks, method)
    }

    /// The most recently created expectation for `method`, if any.
    pub fn expectation(&self, method: &str) -> Option<Expectation> {
        let state = self.session.expectations(self.hooks.id(), method).pop()?;
        Some(Expectation::new(state, self.session.clone()))
    }

    /// The real implementation of `method`.  Passing it to
    /// [`Expectation::runs`] creates a spy.
    pub fn original(&self, method: &str) -> Option<Method> {
        let captured = self.session.registry.borrow()
            .get(self.hooks.id())
            .and_then(|entry| entry.original(method).cloned());
        captured.or_else(|| self.target.method(method))
    }

    /// Shortcut for `method(name)?.returns(value)`.
    pub fn stub(&self, method: &str, value: impl Into<Value>)
        -> Result<Expectation>
    {
        let mut e = self.method(method)?;
        e.returns(value)?;
        Ok(e)
    }
}

impl fmt::Debug for Mock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mock")
            .field("target", &self.target.describe())
            .field("hooks", &self.hooks)
            .finish()
    }
}

// vim: tw=80
//! Expectations: what an intercepted method should do, and how often it
//! should be called.

use std::{
    cell::{Cell, RefCell},
    ops::RangeBounds,
    rc::Rc,
};

use crate::{
    actions::{Actions, ExceptionSpec, MessageMatcher, Reply, Step},
    args::call_signature,
    matcher,
    session::SessionInner,
    target::TargetId,
    ArgPattern,
    Args,
    BindingKind,
    Class,
    CountPolicy,
    Error,
    Exception,
    Method,
    Pattern,
    Result,
    TargetKind,
    Times,
    Value,
};

type Guard = Rc<dyn Fn() -> bool>;

/// Everything the session knows about one expectation.
pub(crate) struct ExpectationState {
    target: TargetId,
    target_kind: TargetKind,
    method: String,
    original: Method,
    pattern: RefCell<Option<ArgPattern>>,
    actions: RefCell<Actions>,
    times: Times,
    ordered: Cell<bool>,
    guard: RefCell<Option<Guard>>,
    /// Set once a configuration error has removed this expectation from its
    /// session.
    withdrawn: Cell<bool>,
}

impl ExpectationState {
    pub(crate) fn new(
        target: TargetId,
        target_kind: TargetKind,
        method: &str,
        original: Method) -> Self
    {
        ExpectationState {
            target,
            target_kind,
            method: method.to_owned(),
            original,
            pattern: RefCell::new(None),
            actions: RefCell::default(),
            times: Times::default(),
            ordered: Cell::new(false),
            guard: RefCell::new(None),
            withdrawn: Cell::new(false),
        }
    }

    pub(crate) fn target(&self) -> TargetId {
        self.target
    }

    pub(crate) fn method(&self) -> &str {
        &self.method
    }

    pub(crate) fn original(&self) -> &Method {
        &self.original
    }

    /// The method name and the expected arguments, like `foo(1, "x")`.
    pub(crate) fn signature(&self) -> String {
        match &*self.pattern.borrow() {
            Some(p) => call_signature(&self.method, p),
            None => call_signature(&self.method, &""),
        }
    }

    pub(crate) fn has_pattern(&self) -> bool {
        self.pattern.borrow().is_some()
    }

    pub(crate) fn matches(&self, args: &Args) -> bool {
        matcher::matches(args, self.pattern.borrow().as_ref())
    }

    pub(crate) fn explain(&self, args: &Args) -> Option<String> {
        self.pattern.borrow().as_ref().and_then(|p| p.explain(args))
    }

    /// Evaluate the guard, if any.
    pub(crate) fn is_runnable(&self) -> bool {
        // Clone the guard out so that it may reconfigure this expectation.
        let guard = self.guard.borrow().clone();
        guard.map_or(true, |g| g())
    }

    pub(crate) fn is_ordered(&self) -> bool {
        self.ordered.get()
    }

    pub(crate) fn call(&self) {
        self.times.call();
    }

    pub(crate) fn times_called(&self) -> usize {
        self.times.count()
    }

    pub(crate) fn next_step(&self) -> Step {
        self.actions.borrow_mut().next_step()
    }

    pub(crate) fn validate(&self, outcome: crate::Outcome) -> crate::Outcome {
        self.actions.borrow().validate(outcome)
    }

    /// Check the call count against the policy.
    pub(crate) fn verify(&self) -> Result<()> {
        if self.times.is_satisfied() {
            Ok(())
        } else {
            Err(Error::CallCount {
                signature: self.signature(),
                expected: self.times.policy(),
                called: self.times.count()
            })
        }
    }
}

/// A handle for configuring one expectation.
///
/// Returned by [`Mock::method`](crate::Mock::method).  Every configuration
/// method is chainable.  Those that can fail return a `Result`; when one
/// fails the expectation is withdrawn, and if it was the only expectation on
/// its method the target is left unmodified.  A withdrawn expectation stays
/// withdrawn: its fallible configuration methods fail with
/// [`Error::Configuration`], and the rest have no effect.
///
/// # Examples
/// ```
/// # use mockwrap::*;
/// let math = Namespace::module("math", MethodTable::new()
///     .function("add", |a: &Args| {
///         Ok(a.positional().iter().filter_map(Value::as_int).sum::<i64>().into())
///     }));
/// let session = Session::new();
/// session.wrap(&math).unwrap()
///     .method("add").unwrap()
///     .with_args(pattern![1, 2]).unwrap()
///     .returns(42).unwrap()
///     .times(1);
/// assert_eq!(Ok(Value::from(42)), math.call("add", args![1, 2]));
/// assert!(math.call("add", args![2, 2]).is_err());
/// session.verify().unwrap();
/// assert_eq!(Ok(Value::from(4)), math.call("add", args![2, 2]));
/// ```
pub struct Expectation {
    state: Rc<ExpectationState>,
    session: Rc<SessionInner>,
}

impl Expectation {
    pub(crate) fn new(state: Rc<ExpectationState>, session: Rc<SessionInner>)
        -> Self
    {
        Expectation{state, session}
    }

    /// Apply a fallible configuration step, withdrawing the expectation if
    /// it fails.
    fn configure<F>(&mut self, f: F) -> Result<&mut Self>
        where F: FnOnce(&ExpectationState) -> Result<()>
    {
        if self.state.withdrawn.get() {
            return Err(Error::Configuration(format!(
                "{} was withdrawn by an earlier configuration error",
                self.state.signature())));
        }
        if let Err(e) = f(&self.state) {
            tracing::debug!(
                method = %self.state.method,
                error = %e,
                "mockwrap::expectation: configuration rejected"
            );
            self.state.withdrawn.set(true);
            self.session.withdraw(&self.state);
            return Err(e);
        }
        Ok(self)
    }

    /// Apply an infallible configuration step, unless the expectation has
    /// been withdrawn.
    fn settle<F>(&mut self, f: F) -> &mut Self
        where F: FnOnce(&ExpectationState)
    {
        if self.state.withdrawn.get() {
            tracing::warn!(
                expectation = %self.state.signature(),
                "mockwrap::expectation: ignoring configuration of a withdrawn expectation"
            );
        } else {
            f(&self.state);
        }
        self
    }

    fn reply(&mut self, reply: Reply) -> Result<&mut Self> {
        self.configure(|s| s.actions.borrow_mut().push_reply(reply))
    }

    /// The method this expectation belongs to.
    pub fn method(&self) -> &str {
        &self.state.method
    }

    /// How many calls this expectation has received so far.
    pub fn times_called(&self) -> usize {
        self.state.times_called()
    }

    /// A description like `foo(1, "x")`, as used in error messages.
    pub fn signature(&self) -> String {
        self.state.signature()
    }

    /// Has a configuration error removed this expectation from its session?
    pub fn is_withdrawn(&self) -> bool {
        self.state.withdrawn.get()
    }

    /// Only match calls whose arguments fit `pattern`.
    ///
    /// May be specified only once per expectation.
    pub fn with_args(&mut self, pattern: ArgPattern) -> Result<&mut Self> {
        self.configure(|s| {
            let mut slot = s.pattern.borrow_mut();
            if slot.is_some() {
                return Err(Error::Configuration(
                    "Arguments can only be specified once".to_owned()));
            }
            *slot = Some(pattern);
            Ok(())
        })
    }

    /// Only match calls with no arguments at all.
    pub fn with_no_args(&mut self) -> Result<&mut Self> {
        self.with_args(ArgPattern::new())
    }

    /// Queue a return value.
    ///
    /// Queued values and exceptions are produced in order, one per call, and
    /// start over once exhausted.  On a spy the value is instead what the real
    /// method must return.
    pub fn returns(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        self.reply(Reply::Value(value.into()))
    }

    /// Queue several return values at once.
    pub fn returns_each<I>(&mut self, values: I) -> Result<&mut Self>
        where I: IntoIterator,
              I::Item: Into<Value>
    {
        for v in values {
            self.returns(v)?;
        }
        Ok(self)
    }

    /// Queue an exception of `class` with an empty message.
    pub fn raises(&mut self, class: &Class) -> Result<&mut Self> {
        self.reply(Reply::Raise(ExceptionSpec::new(class.clone(), None)))
    }

    /// Queue an exception of `class` carrying `message`.
    pub fn raises_with(&mut self, class: &Class, message: impl Into<String>)
        -> Result<&mut Self>
    {
        let message = MessageMatcher::Literal(message.into());
        self.reply(Reply::Raise(ExceptionSpec::new(class.clone(),
            Some(message))))
    }

    /// Queue an exception of `class` whose message matches the regular
    /// expression `pattern`.
    ///
    /// Mostly useful on a spy.  When injected, the exception's message is the
    /// pattern's source text.
    pub fn raises_matching(&mut self, class: &Class, pattern: &str)
        -> Result<&mut Self>
    {
        let spec = Pattern::new(pattern).map(|p| {
            ExceptionSpec::new(class.clone(), Some(MessageMatcher::Pattern(p)))
        });
        self.configure(|s| s.actions.borrow_mut().push_reply(Reply::Raise(spec?)))
    }

    /// Queue a ready-made exception.
    pub fn raises_exception(&mut self, exception: Exception)
        -> Result<&mut Self>
    {
        self.raises_with(exception.class(), exception.message())
    }

    /// Spy only: the real method must return a value whose elements match
    /// `shape`.
    pub fn returns_matching(&mut self, shape: ArgPattern) -> Result<&mut Self> {
        self.reply(Reply::Shape(shape))
    }

    /// Replace the method with `method`.
    ///
    /// Passing the target's original method (see
    /// [`Mock::original`](crate::Mock::original)) turns this expectation into a
    /// spy.
    pub fn runs(&mut self, method: Method) -> Result<&mut Self> {
        self.configure(|s| {
            if s.target_kind == TargetKind::Class &&
                method.kind() == BindingKind::Instance
            {
                return Err(Error::Configuration(
                    "runs() cannot be used on a class mock".to_owned()));
            }
            s.actions.borrow_mut().replace(method, &s.original)
        })
    }

    /// Make this expectation a spy: call the real method, and check its
    /// result against any queued values or exceptions.
    pub fn runs_original(&mut self) -> Result<&mut Self> {
        let original = self.state.original.clone();
        self.runs(original)
    }

    /// Make the method return a [`Stream`](crate::Stream) of `value`, plus
    /// any further yielded values.
    pub fn yields(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        let value = value.into();
        self.configure(|s| s.actions.borrow_mut().push_yield(value))
    }

    /// Queue several yielded values at once.
    pub fn yields_each<I>(&mut self, values: I) -> Result<&mut Self>
        where I: IntoIterator,
              I::Item: Into<Value>
    {
        for v in values {
            self.yields(v)?;
        }
        Ok(self)
    }

    /// Split queued tuple and list return values, so each element is returned
    /// by a separate call.
    pub fn one_by_one(&mut self) -> &mut Self {
        self.settle(|s| s.actions.borrow_mut().one_by_one())
    }

    /// Expect exactly `n` calls.
    pub fn times(&mut self, n: usize) -> &mut Self {
        self.settle(|s| s.times.set(CountPolicy::Exactly(n)))
    }

    /// Expect between `min` and `max` calls, inclusive.  A `max` below `min`
    /// means exactly `min`.
    pub fn times_between(&mut self, min: usize, max: usize) -> &mut Self {
        self.settle(|s| s.times.set(CountPolicy::between(min, max)))
    }

    /// Expect a number of calls within `range`.
    pub fn times_range<R: RangeBounds<usize>>(&mut self, range: R)
        -> &mut Self
    {
        self.settle(|s| s.times.set(CountPolicy::from_range(range)))
    }

    /// Expect `min` or more calls.
    pub fn at_least(&mut self, min: usize) -> &mut Self {
        self.settle(|s| s.times.set(CountPolicy::AtLeast(min)))
    }

    /// Expect no more than `max` calls.
    pub fn at_most(&mut self, max: usize) -> &mut Self {
        self.settle(|s| s.times.set(CountPolicy::Between(0, max)))
    }

    /// Just a shorthand for `times(1)`
    pub fn once(&mut self) -> &mut Self {
        self.times(1)
    }

    /// Just a shorthand for `times(2)`
    pub fn twice(&mut self) -> &mut Self {
        self.times(2)
    }

    /// Expect the method never to be called.
    pub fn never(&mut self) -> &mut Self {
        self.times(0)
    }

    /// Require every earlier expectation on the same method whose arguments
    /// differ from this one's to have been called first.
    pub fn ordered(&mut self) -> &mut Self {
        self.settle(|s| s.ordered.set(true))
    }

    /// Only accept calls while `guard` returns true.  Calls made while it is
    /// false fail with [`Error::StateGuard`] and are not counted.
    pub fn when<F>(&mut self, guard: F) -> &mut Self
        where F: Fn() -> bool + 'static
    {
        self.settle(|s| *s.guard.borrow_mut() = Some(Rc::new(guard)))
    }
}

// vim: tw=80
//! What an expectation does when it is called.

use std::{cell::RefCell, collections::VecDeque, fmt, mem, rc::Rc};

use crate::{
    ArgPattern,
    Class,
    Error,
    Exception,
    Method,
    Outcome,
    Pattern,
    Result,
    Stream,
    Value,
};

/// How an expected exception's message is checked.
pub(crate) enum MessageMatcher {
    Literal(String),
    Pattern(Pattern),
}

impl fmt::Display for MessageMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageMatcher::Literal(s) => write!(f, "{s:?}"),
            MessageMatcher::Pattern(p) => write!(f, "{p}"),
        }
    }
}

/// An exception to raise, or to expect from a spied method.
pub(crate) struct ExceptionSpec {
    class: Class,
    message: Option<MessageMatcher>,
}

impl ExceptionSpec {
    pub(crate) fn new(class: Class, message: Option<MessageMatcher>) -> Self {
        ExceptionSpec{class, message}
    }

    /// Build the exception to inject.  A message pattern has no single
    /// matching string, so its source text is used.
    fn instantiate(&self) -> Exception {
        let message = match &self.message {
            None => "",
            Some(MessageMatcher::Literal(s)) => s.as_str(),
            Some(MessageMatcher::Pattern(p)) => p.as_str(),
        };
        self.class.exception(message)
    }

    /// Does `raised` satisfy this spec?
    fn check(&self, raised: &Exception) -> Result<()> {
        if !raised.is_instance_of(&self.class) {
            return Err(Error::ExceptionClassMismatch {
                expected: self.class.to_string(),
                raised: raised.class().to_string()
            });
        }
        let ok = match &self.message {
            None => true,
            Some(MessageMatcher::Literal(s)) => s == raised.message(),
            Some(MessageMatcher::Pattern(p)) => p.is_match(raised.message()),
        };
        if ok {
            Ok(())
        } else {
            let expected = self.message.as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            Err(Error::ExceptionMessageMismatch {
                expected,
                raised: raised.message().to_owned()
            })
        }
    }
}

impl fmt::Display for ExceptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(m) => write!(f, "{}({m})", self.class),
            None => write!(f, "{}", self.class),
        }
    }
}

/// One entry in the reply queue.
pub(crate) enum Reply {
    Value(Value),
    /// Spy only: the shape a real result must have.
    Shape(ArgPattern),
    Raise(ExceptionSpec),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Value(v) => write!(f, "{v}"),
            Reply::Shape(p) => write!(f, "({p})"),
            Reply::Raise(spec) => write!(f, "raise {spec}"),
        }
    }
}

enum Replacement {
    Custom(Method),
    /// Call the real method, then validate its outcome.
    PassThrough,
}

/// The single thing one call to an expectation does.
pub(crate) enum Step {
    Replace(Method),
    PassThrough,
    Yield(Stream),
    Reply(Outcome),
}

/// An expectation's behavior: its reply queue, yield queue and replacement.
#[derive(Default)]
pub(crate) struct Actions {
    replies: VecDeque<Reply>,
    yields: Option<Rc<RefCell<VecDeque<Value>>>>,
    replacement: Option<Replacement>,
    /// Split tuple and list return values as they are queued.
    one_by_one: bool,
}

impl Actions {
    fn conflict(what: &str, with: &str) -> Error {
        Error::Configuration(format!("{what} cannot be combined with {with}"))
    }

    #[cfg(test)]
    pub(crate) fn is_pass_through(&self) -> bool {
        matches!(self.replacement, Some(Replacement::PassThrough))
    }

    /// Queue a return value or an exception.
    pub(crate) fn push_reply(&mut self, reply: Reply) -> Result<()> {
        match (&reply, &self.replacement) {
            (_, Some(Replacement::Custom(_))) =>
                return Err(Self::conflict("returns() or raises()", "runs()")),
            (Reply::Shape(_), None) => return Err(Error::Configuration(
                "returns_matching() requires runs_original()".to_owned())),
            _ => ()
        }
        if self.yields.is_some() {
            return Err(Self::conflict("returns() or raises()", "yields()"));
        }
        self.enqueue(reply);
        Ok(())
    }

    fn enqueue(&mut self, reply: Reply) {
        match reply {
            Reply::Value(Value::Tuple(items)) |
            Reply::Value(Value::List(items)) if self.one_by_one =>
                self.replies.extend(items.into_iter().map(Reply::Value)),
            other => self.replies.push_back(other)
        }
    }

    pub(crate) fn push_yield(&mut self, value: Value) -> Result<()> {
        if self.replacement.is_some() {
            return Err(Self::conflict("yields()", "runs()"));
        }
        if !self.replies.is_empty() {
            return Err(Self::conflict("yields()", "returns() or raises()"));
        }
        self.yields.get_or_insert_with(Default::default)
            .borrow_mut()
            .push_back(value);
        Ok(())
    }

    /// Install a replacement.  Installing the original makes a spy.
    pub(crate) fn replace(&mut self, method: Method, original: &Method)
        -> Result<()>
    {
        if self.replacement.is_some() {
            return Err(Error::Configuration(
                "runs() cannot be specified twice".to_owned()));
        }
        if self.yields.is_some() {
            return Err(Self::conflict("runs()", "yields()"));
        }
        if method.same_as(original) {
            self.replacement = Some(Replacement::PassThrough);
        } else if !self.replies.is_empty() {
            return Err(Self::conflict("runs()", "returns() or raises()"));
        } else {
            self.replacement = Some(Replacement::Custom(method));
        }
        Ok(())
    }

    /// Split every tuple or list return value, queued now or later, into one
    /// entry per element.
    pub(crate) fn one_by_one(&mut self) {
        if self.one_by_one {
            return;
        }
        self.one_by_one = true;
        for reply in mem::take(&mut self.replies) {
            self.enqueue(reply);
        }
    }

    /// Decide what this call does, rotating the reply queue if a reply is
    /// consumed.
    pub(crate) fn next_step(&mut self) -> Step {
        match &self.replacement {
            Some(Replacement::Custom(m)) => return Step::Replace(m.clone()),
            Some(Replacement::PassThrough) => return Step::PassThrough,
            None => ()
        }
        if let Some(yields) = &self.yields {
            return Step::Yield(Stream::new(yields.clone()));
        }
        let outcome = match self.replies.front() {
            None => return Step::Reply(Ok(Value::None)),
            Some(Reply::Value(v)) => Ok(v.clone()),
            Some(Reply::Raise(spec)) => Err(Error::Raised(spec.instantiate())),
            Some(Reply::Shape(_)) => Ok(Value::None),
        };
        self.replies.rotate_left(1);
        Step::Reply(outcome)
    }

    /// Check a spied method's real outcome against the front of the reply
    /// queue, without consuming it.
    ///
    /// An exception that matches an expected one is swallowed.
    pub(crate) fn validate(&self, outcome: Outcome) -> Outcome {
        let front = self.replies.front();
        match (outcome, front) {
            (Err(Error::Raised(e)), Some(Reply::Raise(spec))) => {
                spec.check(&e)?;
                Ok(Value::None)
            },
            (Err(e), _) => Err(e),
            (Ok(v), None) => Ok(v),
            (Ok(v), Some(Reply::Raise(spec))) => Err(Error::SignatureMismatch(
                format!("expected to raise {spec}, returned {v}"))),
            (Ok(v), Some(reply)) => {
                let ok = match reply {
                    Reply::Value(expected) => {
                        let (want, got) = (expected.elements(), v.elements());
                        want.len() == got.len() &&
                            want.iter().zip(got).all(|(w, g)| w.same_as(g))
                    },
                    Reply::Shape(p) => p.matches_values(v.elements()),
                    Reply::Raise(_) => false
                };
                if ok {
                    Ok(v)
                } else {
                    Err(Error::SignatureMismatch(
                        format!("expected to return {reply}, returned {v}")))
                }
            }
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{pattern, ValueType};

    fn reply(outcome: Step) -> Outcome {
        match outcome {
            Step::Reply(o) => o,
            _ => panic!("expected a reply")
        }
    }

    #[test]
    fn replies_rotate() {
        let mut a = Actions::default();
        for v in [1, 5, 2] {
            a.push_reply(Reply::Value(Value::from(v))).unwrap();
        }
        let got: Vec<Outcome> = (0..7).map(|_| reply(a.next_step())).collect();
        let want: Vec<Outcome> = [1, 5, 2, 1, 5, 2, 1].into_iter()
            .map(|i| Ok(Value::from(i)))
            .collect();
        assert_eq!(want, got);
    }

    #[test]
    fn raises_interleave_with_returns() {
        let oops = Class::new("Oops");
        let mut a = Actions::default();
        a.push_reply(Reply::Value(Value::from(1))).unwrap();
        a.push_reply(Reply::Raise(ExceptionSpec::new(oops.clone(),
            Some(MessageMatcher::Literal("bad".to_owned()))))).unwrap();
        assert_eq!(Ok(Value::from(1)), reply(a.next_step()));
        assert_eq!(Err(Error::Raised(oops.exception("bad"))),
                   reply(a.next_step()));
        assert_eq!(Ok(Value::from(1)), reply(a.next_step()));
    }

    #[test]
    fn empty_queue_returns_none() {
        let mut a = Actions::default();
        assert_eq!(Ok(Value::None), reply(a.next_step()));
    }

    #[test]
    fn one_by_one_flattens() {
        let mut a = Actions::default();
        a.push_reply(Reply::Value(Value::from((1, 2)))).unwrap();
        a.push_reply(Reply::Value(Value::from(3))).unwrap();
        a.one_by_one();
        let got: Vec<Outcome> = (0..3).map(|_| reply(a.next_step())).collect();
        assert_eq!(vec![Ok(Value::from(1)), Ok(Value::from(2)),
                        Ok(Value::from(3))], got);
    }

    #[test]
    fn one_by_one_applies_to_later_values() {
        let mut a = Actions::default();
        a.one_by_one();
        a.push_reply(Reply::Value(Value::from((4, 5)))).unwrap();
        a.push_reply(Reply::Value(Value::List(vec![Value::from(6)]))).unwrap();
        let got: Vec<Outcome> = (0..4).map(|_| reply(a.next_step())).collect();
        assert_eq!(vec![Ok(Value::from(4)), Ok(Value::from(5)),
                        Ok(Value::from(6)), Ok(Value::from(4))], got);
    }

    #[test]
    fn runs_conflicts_with_returns() {
        let original = Method::function(|_| Ok(Value::None));
        let other = Method::function(|_| Ok(Value::None));
        let mut a = Actions::default();
        a.push_reply(Reply::Value(Value::from(1))).unwrap();
        assert!(matches!(a.replace(other, &original),
                         Err(Error::Configuration(_))));
        // But a spy may carry return values
        a.replace(original.clone(), &original).unwrap();
        assert!(a.is_pass_through());
        assert!(matches!(a.replace(original.clone(), &original),
                         Err(Error::Configuration(_))));
    }

    #[test]
    fn yields_conflict_with_returns() {
        let mut a = Actions::default();
        a.push_yield(Value::from(1)).unwrap();
        assert!(a.push_reply(Reply::Value(Value::from(1))).is_err());
        let mut b = Actions::default();
        b.push_reply(Reply::Value(Value::from(1))).unwrap();
        assert!(b.push_yield(Value::from(1)).is_err());
    }

    #[test]
    fn shape_requires_pass_through() {
        let mut a = Actions::default();
        assert!(a.push_reply(Reply::Shape(pattern![ValueType::Str])).is_err());
    }

    #[test]
    fn validate_shape() {
        let original = Method::function(|_| Ok(Value::None));
        let mut a = Actions::default();
        a.replace(original.clone(), &original).unwrap();
        a.push_reply(Reply::Shape(pattern![ValueType::Str, ValueType::Str]))
            .unwrap();
        assert!(a.validate(Ok(Value::from(("x", "y")))).is_ok());
        assert!(matches!(a.validate(Ok(Value::from((1, "y")))),
                         Err(Error::SignatureMismatch(_))));
    }

    #[test]
    fn validate_exception() {
        let base = Class::new("Base");
        let derived = base.subclass("Derived");
        let other = Class::new("Other");
        let original = Method::function(|_| Ok(Value::None));
        let mut a = Actions::default();
        a.replace(original.clone(), &original).unwrap();
        a.push_reply(Reply::Raise(ExceptionSpec::new(base,
            Some(MessageMatcher::Pattern(Pattern::new("^no").unwrap())))))
            .unwrap();
        assert_eq!(Ok(Value::None),
                   a.validate(Err(derived.exception("nope").into())));
        assert!(matches!(a.validate(Err(other.exception("nope").into())),
                         Err(Error::ExceptionClassMismatch{..})));
        assert_eq!(Err(Error::ExceptionMessageMismatch {
                       expected: "/^no/".to_owned(),
                       raised: "yes".to_owned()
                   }),
                   a.validate(Err(derived.exception("yes").into())));
        assert!(matches!(a.validate(Ok(Value::from(1))),
                         Err(Error::SignatureMismatch(_))));
    }

    #[test]
    fn validate_without_expectation_propagates() {
        let oops = Class::new("Oops");
        let a = Actions::default();
        assert_eq!(Err(Error::Raised(oops.exception("x"))),
                   a.validate(Err(oops.exception("x").into())));
        assert_eq!(Ok(Value::from(7)), a.validate(Ok(Value::from(7))));
    }
}

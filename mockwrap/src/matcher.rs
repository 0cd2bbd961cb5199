// vim: tw=80
//! Argument matching.
//!
//! An [`ArgPattern`] describes the arguments an expectation accepts.  Each
//! argument is checked by a [`Matcher`]: an exact value, a type constraint, a
//! regular expression searched in the value's string form, or any
//! [`Predicate`].

use std::{collections::BTreeMap, fmt};

use predicates::{prelude::*, str::RegexPredicate};
use predicates_tree::CaseTreeExt;

use crate::{args::fmt_arguments, Args, Class, Error, Result, Value, ValueType};

/// A compiled regular expression, matched unanchored (search semantics).
pub struct Pattern {
    source: String,
    regex: RegexPredicate,
}

impl Pattern {
    /// Compile `source`.  An invalid expression is a configuration error.
    pub fn new(source: &str) -> Result<Self> {
        let regex = predicates::str::is_match(source)
            .map_err(|e| Error::Configuration(
                    format!("invalid pattern /{source}/: {e}")))?;
        Ok(Pattern{source: source.to_owned(), regex})
    }

    /// The regular expression's source text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Does the pattern occur anywhere in `text`?
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.eval(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern(/{}/)", self.source)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source)
    }
}

/// How a single expected argument is compared against an actual one.
pub enum Matcher {
    /// The actual value must equal this one.
    Literal(Value),
    /// The actual value must be an instance of this type, subclasses
    /// included.
    Type(ValueType),
    /// The pattern must be found in the actual value's
    /// [string form](Value::text).
    Pattern(Pattern),
    /// Any predicate over values, as built by the `predicates` crate.
    Predicate(Box<dyn Predicate<Value>>),
}

impl Matcher {
    /// Does `actual` satisfy this matcher?
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Matcher::Literal(expected) => expected.same_as(actual),
            Matcher::Type(ty) => ty.admits(actual),
            Matcher::Pattern(p) => p.is_match(&actual.text()),
            Matcher::Predicate(p) => p.eval(actual),
        }
    }

    /// Describe why `actual` fails a predicate matcher, if it does.
    fn explain(&self, actual: &Value) -> Option<String> {
        match self {
            Matcher::Predicate(p) => p.find_case(false, actual)
                .map(|case| case.tree().to_string()),
            _ => None
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matcher({self})")
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Literal(v) => write!(f, "{v}"),
            Matcher::Type(ty) => write!(f, "<{ty}>"),
            Matcher::Pattern(p) => write!(f, "{p}"),
            Matcher::Predicate(p) => write!(f, "{p}"),
        }
    }
}

/// Match an argument exactly.
pub fn eq(value: impl Into<Value>) -> Matcher {
    Matcher::Literal(value.into())
}

/// Match any instance of `ty`.
pub fn kind(ty: ValueType) -> Matcher {
    Matcher::Type(ty)
}

/// Match any argument whose string form contains a match for `source`.
pub fn regex(source: &str) -> Result<Matcher> {
    Pattern::new(source).map(Matcher::Pattern)
}

/// Match any argument at all.
pub fn anything() -> Matcher {
    Matcher::Predicate(Box::new(predicate::always()))
}

/// Match any argument for which `f` returns true.
pub fn function<F>(f: F) -> Matcher
    where F: Fn(&Value) -> bool + 'static
{
    Matcher::Predicate(Box::new(predicate::function(f)))
}

/// Conversion into a [`Matcher`].  Plain values become literals, types and
/// classes become type constraints.
pub trait IntoMatcher {
    fn into_matcher(self) -> Matcher;
}

impl IntoMatcher for Matcher {
    fn into_matcher(self) -> Matcher {
        self
    }
}

impl IntoMatcher for Pattern {
    fn into_matcher(self) -> Matcher {
        Matcher::Pattern(self)
    }
}

impl IntoMatcher for ValueType {
    fn into_matcher(self) -> Matcher {
        Matcher::Type(self)
    }
}

impl IntoMatcher for Class {
    fn into_matcher(self) -> Matcher {
        Matcher::Type(ValueType::Instance(self))
    }
}

impl IntoMatcher for &Class {
    fn into_matcher(self) -> Matcher {
        Matcher::Type(ValueType::Instance(self.clone()))
    }
}

macro_rules! literal_matcher {
    ($($t:ty),*) => {
        $(
            impl IntoMatcher for $t {
                fn into_matcher(self) -> Matcher {
                    Matcher::Literal(Value::from(self))
                }
            }
        )*
    }
}
literal_matcher!{
    Value, (), bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, &str, String,
    crate::Object
}

/// The expected shape of a call's arguments.
///
/// Positional arity and the set of named keys must both match exactly before
/// any individual argument is compared.  An empty pattern therefore matches
/// only calls with no arguments, unlike an expectation with no pattern at all,
/// which matches every call.
#[derive(Debug, Default)]
pub struct ArgPattern {
    positional: Vec<Matcher>,
    named: BTreeMap<String, Matcher>,
}

impl ArgPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional matcher.
    pub fn arg(mut self, m: impl IntoMatcher) -> Self {
        self.positional.push(m.into_matcher());
        self
    }

    /// Add a matcher for the named argument `name`.
    pub fn kwarg(mut self, name: impl Into<String>, m: impl IntoMatcher)
        -> Self
    {
        self.named.insert(name.into(), m.into_matcher());
        self
    }

    /// The positional matchers, in order.
    pub fn positional(&self) -> &[Matcher] {
        &self.positional
    }

    pub fn has_keywords(&self) -> bool {
        !self.named.is_empty()
    }

    /// Do `args` have exactly this pattern's arity and keywords, with every
    /// argument accepted by its matcher?
    pub fn matches(&self, args: &Args) -> bool {
        if self.positional.len() != args.positional().len() ||
           !self.named.keys().eq(args.keywords().keys())
        {
            return false;
        }
        self.positional.iter()
            .zip(args.positional())
            .all(|(m, v)| m.matches(v)) &&
        self.named.iter()
            .all(|(k, m)| args.named(k).is_some_and(|v| m.matches(v)))
    }

    /// Compare a sequence of values against the positional matchers only.
    pub(crate) fn matches_values(&self, values: &[Value]) -> bool {
        self.positional.len() == values.len() &&
            self.positional.iter().zip(values).all(|(m, v)| m.matches(v))
    }

    /// Explain the first predicate matcher that rejects `args`.
    pub(crate) fn explain(&self, args: &Args) -> Option<String> {
        let positional = self.positional.iter().zip(args.positional());
        let named = self.named.iter()
            .filter_map(|(k, m)| args.named(k).map(|v| (m, v)));
        positional.chain(named)
            .find_map(|(m, v)| m.explain(v))
    }
}

impl fmt::Display for ArgPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_arguments(f, &self.positional, &self.named)
    }
}

/// Does a call with `args` satisfy `pattern`?  No pattern matches any call.
pub fn matches(args: &Args, pattern: Option<&ArgPattern>) -> bool {
    pattern.map_or(true, |p| p.matches(args))
}

/// Build an [`ArgPattern`].  Syntax is the same as [`args!`](crate::args),
/// but each element may be anything implementing [`IntoMatcher`].
///
/// # Examples
/// ```
/// # use mockwrap::*;
/// let p = pattern![ValueType::Str, 5; verbose = true];
/// assert!(p.matches(&args!["x", 5; verbose = true]));
/// assert!(!p.matches(&args!["x", 5]));
/// assert!(!p.matches(&args![1, 5; verbose = true]));
/// ```
#[macro_export]
macro_rules! pattern {
    ($($m:expr),* $(,)? $(; $($name:ident = $kw:expr),* $(,)?)?) => {{
        #[allow(unused_mut)]
        let mut pattern = $crate::ArgPattern::new();
        $( pattern = pattern.arg($m); )*
        $($( pattern = pattern.kwarg(stringify!($name), $kw); )*)?
        pattern
    }};
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::args;

    #[test]
    fn arity_mismatch() {
        let p = pattern![1];
        assert!(!p.matches(&args![]));
        assert!(!p.matches(&args![1, 2]));
        assert!(p.matches(&args![1]));
    }

    #[test]
    fn empty_pattern_only_matches_no_args() {
        let p = ArgPattern::new();
        assert!(p.matches(&args![]));
        assert!(!p.matches(&args![1]));
        assert!(!p.matches(&args![; k = 1]));
        assert!(matches(&args![1, 2], None));
    }

    #[test]
    fn key_set_must_match() {
        let p = pattern![; a = 1, b = 2];
        assert!(p.matches(&args![; b = 2, a = 1]));
        assert!(!p.matches(&args![; a = 1]));
        assert!(!p.matches(&args![; a = 1, c = 2]));
    }

    #[test]
    fn regex_search() {
        let p = pattern![regex("^a.*z$").unwrap()];
        assert!(p.matches(&args!["aquarz"]));
        assert!(!p.matches(&args!["banana"]));
        let unanchored = pattern![regex("qua").unwrap()];
        assert!(unanchored.matches(&args!["aquarz"]));
    }

    #[test]
    fn regex_uses_string_form() {
        let p = pattern![regex("^4").unwrap()];
        assert!(p.matches(&args![42]));
    }

    #[test]
    fn invalid_regex() {
        assert!(matches!(regex("("), Err(Error::Configuration(_))));
    }

    #[test]
    fn type_constraint() {
        let base = Class::new("Base");
        let derived = base.subclass("Derived");
        let p = pattern![&base, ValueType::Int];
        assert!(p.matches(&args![derived.instance("d"), 3]));
        assert!(!p.matches(&args![derived.instance("d"), "3"]));
        let q = pattern![&derived];
        assert!(!q.matches(&args![base.instance("b")]));
    }

    #[test]
    fn predicate_explains_mismatch() {
        let p = pattern![Matcher::Predicate(Box::new(
                    predicate::eq(Value::from(5))))];
        assert!(p.explain(&args![5]).is_none());
        assert!(p.explain(&args![6]).is_some());
        assert!(pattern![function(|v| v.as_int() == Some(6))]
                .matches(&args![6]));
    }

    #[test]
    fn display() {
        let p = pattern![1, ValueType::Str, regex("a+").unwrap(); k = "v"];
        assert_eq!("1, <str>, /a+/, k=\"v\"", p.to_string());
    }
}

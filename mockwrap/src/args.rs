// vim: tw=80
//! Actual call arguments, and the signature strings used in diagnostics.

use std::{collections::BTreeMap, fmt};

use crate::Value;

/// The arguments of one intercepted call: positional values plus named
/// values.
///
/// Usually built with the [`args!`](crate::args) macro.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add a named argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>)
        -> Self
    {
        self.named.insert(name.into(), value.into());
        self
    }

    /// The `i`th positional argument.
    pub fn get(&self, i: usize) -> Option<&Value> {
        self.positional.get(i)
    }

    /// The named argument `name`.
    pub fn named(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keywords(&self) -> &BTreeMap<String, Value> {
        &self.named
    }

    /// Total number of arguments, positional and named.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Value>> for Args {
    fn from(positional: Vec<Value>) -> Self {
        Args{positional, named: BTreeMap::new()}
    }
}

impl From<&[Value]> for Args {
    fn from(positional: &[Value]) -> Self {
        Args::from(positional.to_vec())
    }
}

/// Write an argument list like `1, "x", key=2`.
pub(crate) fn fmt_arguments<P, N>(
    f: &mut fmt::Formatter<'_>,
    positional: &[P],
    named: &BTreeMap<String, N>) -> fmt::Result
    where P: fmt::Display, N: fmt::Display
{
    let mut first = true;
    for p in positional {
        if !first {
            f.write_str(", ")?;
        }
        first = false;
        write!(f, "{p}")?;
    }
    for (k, v) in named {
        if !first {
            f.write_str(", ")?;
        }
        first = false;
        write!(f, "{k}={v}")?;
    }
    Ok(())
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_arguments(f, &self.positional, &self.named)
    }
}

/// Format a call like `method(1, "x", key=2)`.
pub(crate) fn call_signature(method: &str, args: &impl fmt::Display) -> String
{
    format!("{method}({args})")
}

/// Build an [`Args`] from positional expressions, optionally followed by a
/// `;` and `name = value` pairs.
///
/// # Examples
/// ```
/// # use mockwrap::*;
/// let a = args![1, "two"; three = 3.0];
/// assert_eq!(Some(&Value::Int(1)), a.get(0));
/// assert_eq!(Some(&Value::Float(3.0)), a.named("three"));
/// assert_eq!("1, \"two\", three=3.0", a.to_string());
/// assert!(args![].is_empty());
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)? $(; $($name:ident = $kw:expr),* $(,)?)?) => {{
        #[allow(unused_mut)]
        let mut args = $crate::Args::new();
        $( args = args.arg($arg); )*
        $($( args = args.kwarg(stringify!($name), $kw); )*)?
        args
    }};
}

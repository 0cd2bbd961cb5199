// vim: tw=80
//! Mocks, stubs and spies for dynamically dispatched methods.
//!
//! Mockwrap temporarily replaces the behavior of methods belonging to an
//! object, a class-level target, or a module of free functions.  A test
//! describes what the replaced methods should do, exercises the code under
//! test, and then verifies that every method was called as expected.  When the
//! test is over, every target goes back to its original behavior.
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Interceptable targets`](#interceptable-targets)
//! * [`Return values`](#return-values)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Call counts`](#call-counts)
//! * [`Ordering`](#ordering)
//! * [`Guards`](#guards)
//! * [`Generators`](#generators)
//! * [`Spies`](#spies)
//! * [`Verification`](#verification)
//!
//! ## Getting Started
//! ```
//! use mockwrap::*;
//!
//! let clock = Namespace::module("clock", MethodTable::new()
//!     .function("now", |_| Ok(Value::from(1_700_000_000))));
//!
//! let session = Session::new();
//! session.wrap(&clock).unwrap()
//!     .method("now").unwrap()
//!     .returns(0).unwrap()
//!     .once();
//! assert_eq!(Ok(Value::from(0)), clock.call("now", args![]));
//! session.verify().unwrap();
//! assert_eq!(Ok(Value::from(1_700_000_000)), clock.call("now", args![]));
//! ```
//!
//! ## Interceptable targets
//!
//! Rust has no way to patch a method at runtime, so targets opt in.  A type
//! implements [`Interceptable`] by exposing a [`HookTable`] and a
//! [`MethodTable`], and routes its public methods through [`invoke`], usually
//! by way of [`trampolines!`].  [`Namespace`] is a ready-made target for
//! modules of free functions and for class-level targets.  A target that has
//! no hook table cannot be wrapped:
//! ```
//! # use mockwrap::*;
//! struct Sealed;
//! impl Interceptable for Sealed {
//!     fn hooks(&self) -> Option<&HookTable> { None }
//!     fn method(&self, _: &str) -> Option<Method> { None }
//! }
//! let session = Session::new();
//! assert!(matches!(session.wrap(&Sealed),
//!                  Err(Error::TargetUnavailable{..})));
//! ```
//!
//! ## Return values
//!
//! Queued return values are produced one per call, in order, and start over
//! when exhausted.  Exceptions may be queued in the same list.  With nothing
//! queued, a call returns [`Value::None`].
//! ```
//! # use mockwrap::*;
//! let io = Namespace::module("io", MethodTable::new()
//!     .function("read", |_| Ok(Value::None)));
//! let eof = Class::new("EOFError");
//! let session = Session::new();
//! session.wrap(&io).unwrap()
//!     .method("read").unwrap()
//!     .returns("a").unwrap()
//!     .raises_with(&eof, "done").unwrap();
//! assert_eq!(Ok(Value::from("a")), io.call("read", args![]));
//! assert_eq!(Err(Error::Raised(eof.exception("done"))),
//!            io.call("read", args![]));
//! assert_eq!(Ok(Value::from("a")), io.call("read", args![]));
//! ```
//!
//! A method may also be replaced outright with [`Expectation::runs`].
//!
//! ## Matching arguments
//!
//! An expectation without an argument pattern matches every call.  One with a
//! pattern, set by [`Expectation::with_args`], matches only calls with the
//! same number of positional arguments, the same named arguments, and values
//! that each satisfy their [`Matcher`].  When several expectations match, the
//! most recently created one wins.
//! ```
//! # use mockwrap::*;
//! let db = Namespace::module("db", MethodTable::new()
//!     .function("get", |_| Ok(Value::None)));
//! let session = Session::new();
//! let mock = session.wrap(&db).unwrap();
//! mock.method("get").unwrap().returns("default").unwrap();
//! mock.method("get").unwrap()
//!     .with_args(pattern![regex("^user:").unwrap()]).unwrap()
//!     .returns("alice").unwrap();
//! assert_eq!(Ok(Value::from("alice")), db.call("get", args!["user:1"]));
//! assert_eq!(Ok(Value::from("default")), db.call("get", args!["group:1"]));
//! assert_eq!(Ok(Value::from("default")), db.call("get", args![1, 2]));
//! ```
//!
//! ## Call counts
//!
//! By default an expectation may be called any number of times.
//! [`Expectation::times`], [`Expectation::at_least`],
//! [`Expectation::times_between`] and friends restrict that.  Counts are
//! checked by [`Session::verify`].
//!
//! ## Ordering
//!
//! An expectation marked [`ordered`](Expectation::ordered) must not be called
//! before the earlier expectations on the same method.
//! ```
//! # use mockwrap::*;
//! let door = Namespace::module("door", MethodTable::new()
//!     .function("set", |_| Ok(Value::None)));
//! let session = Session::new();
//! let mock = session.wrap(&door).unwrap();
//! mock.method("set").unwrap().with_args(pattern!["unlocked"]).unwrap()
//!     .ordered();
//! mock.method("set").unwrap().with_args(pattern!["open"]).unwrap()
//!     .ordered();
//! assert!(matches!(door.call("set", args!["open"]),
//!                  Err(Error::OrderViolation{..})));
//! ```
//!
//! ## Guards
//!
//! [`Expectation::when`] makes an expectation accept calls only while a
//! condition holds.
//!
//! ## Generators
//!
//! A method configured with [`Expectation::yields`] returns a [`Stream`] on
//! every call.
//! ```
//! # use mockwrap::*;
//! let dir = Namespace::module("dir", MethodTable::new()
//!     .function("list", |_| Ok(Value::None)));
//! let session = Session::new();
//! session.wrap(&dir).unwrap()
//!     .method("list").unwrap()
//!     .yields_each(["a", "b"]).unwrap();
//! let names: Vec<Value> = dir.call("list", args![]).unwrap()
//!     .into_stream().unwrap()
//!     .collect();
//! assert_eq!(vec![Value::from("a"), Value::from("b")], names);
//! ```
//!
//! ## Spies
//!
//! An expectation that runs the original method is a spy.  The real method is
//! called, and its result is checked against any queued return values or
//! exceptions.
//! ```
//! # use mockwrap::*;
//! let math = Namespace::module("math", MethodTable::new()
//!     .function("div", |a: &Args| {
//!         let x = a.get(0).and_then(Value::as_int).unwrap_or(0);
//!         let y = a.get(1).and_then(Value::as_int).unwrap_or(0);
//!         Ok(Value::from((x / y, x % y)))
//!     }));
//! let session = Session::new();
//! session.wrap(&math).unwrap()
//!     .method("div").unwrap()
//!     .runs_original().unwrap()
//!     .returns_matching(pattern![ValueType::Int, ValueType::Int]).unwrap()
//!     .twice();
//! assert_eq!(Ok(Value::from((3, 1))), math.call("div", args![7, 2]));
//! assert_eq!(Ok(Value::from((2, 0))), math.call("div", args![4, 2]));
//! ```
//!
//! ## Verification
//!
//! [`Session::verify`] first restores every wrapped target, and then reports
//! the first expectation whose call count is unsatisfied.  Dropping a
//! [`Session`] verifies it too, panicking on failure; see [`SessionConfig`].

mod actions;
mod args;
mod config;
mod dispatch;
mod error;
mod expectation;
mod matcher;
mod registry;
mod session;
mod target;
mod times;
mod value;

pub use crate::{
    args::Args,
    config::SessionConfig,
    error::{Error, Outcome, Result},
    expectation::Expectation,
    matcher::{
        anything,
        eq,
        function,
        kind,
        matches,
        regex,
        ArgPattern,
        IntoMatcher,
        Matcher,
        Pattern,
    },
    session::{Mock, Session},
    target::{
        invoke,
        BindingKind,
        HookTable,
        Interceptable,
        Method,
        MethodTable,
        Namespace,
        TargetKind,
    },
    times::{CountPolicy, Times},
    value::{Class, Exception, Object, Stream, Value, ValueType},
};
pub use predicates::prelude::{predicate, Predicate};

// vim: tw=80
//! Expectations that only accept calls while a condition holds.

use std::{cell::Cell, rc::Rc};

use pretty_assertions::assert_eq;

use mockwrap::*;

mod common;
use common::*;

#[test]
fn rejected_calls_are_not_counted() {
    let calc = Calculator::new();
    let ready = Rc::new(Cell::new(false));
    let r = ready.clone();
    let session = Session::new();
    let mut e = session.wrap(&calc).unwrap().method("add").unwrap();
    e.returns(5).unwrap()
        .when(move || r.get())
        .once();

    assert_eq!(Err(Error::StateGuard {
                   method: "add".to_owned(),
                   condition: "condition".to_owned()
               }),
               calc.add(1, 2));
    assert_eq!(0, e.times_called());

    ready.set(true);
    assert_eq!(Ok(Value::from(5)), calc.add(1, 2));
    assert_eq!(1, e.times_called());
}

#[test]
fn message() {
    let e = Error::StateGuard {
        method: "add".to_owned(),
        condition: "condition".to_owned()
    };
    assert_eq!("add expected to be called when condition is true",
               e.to_string());
}

#[test]
fn guard_applies_after_matching() {
    let calc = Calculator::new();
    let session = Session::new();
    let mock = session.wrap(&calc).unwrap();
    mock.method("add").unwrap().returns("open").unwrap();
    mock.method("add").unwrap()
        .with_args(pattern![0, 0]).unwrap()
        .returns("closed").unwrap()
        .when(|| false);
    // The guarded expectation is the best match, so the call fails rather
    // than falling back to the catch-all.
    assert!(matches!(calc.add(0, 0), Err(Error::StateGuard{..})));
    assert_eq!(Ok(Value::from("open")), calc.add(1, 1));
}

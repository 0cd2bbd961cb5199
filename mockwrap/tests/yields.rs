// vim: tw=80
//! Generator-style methods.

use pretty_assertions::assert_eq;

use mockwrap::*;

mod common;
use common::*;

fn stream(outcome: Outcome) -> Stream {
    outcome.unwrap().into_stream().unwrap()
}

#[test]
fn each_call_yields_every_value() {
    let calc = Calculator::new();
    let session = Session::new();
    session.wrap(&calc).unwrap()
        .method("add").unwrap()
        .yields(1).unwrap()
        .yields_each([2, 3]).unwrap();
    let first: Vec<Value> = stream(calc.add(0, 0)).collect();
    let second: Vec<Value> = stream(calc.add(0, 0)).collect();
    let want: Vec<Value> = (1..=3).map(Value::from).collect();
    assert_eq!(want, first);
    assert_eq!(want, second);
}

#[test]
fn partially_consumed_stream_resumes() {
    let calc = Calculator::new();
    let session = Session::new();
    session.wrap(&calc).unwrap()
        .method("add").unwrap()
        .yields_each(["a", "b", "c"]).unwrap();
    let mut s = stream(calc.add(0, 0));
    assert_eq!(Some(Value::from("a")), s.next());
    drop(s);
    let rest: Vec<Value> = stream(calc.add(0, 0)).collect();
    assert_eq!(vec![Value::from("b"), Value::from("c"), Value::from("a")],
               rest);
}

#[test]
fn yields_conflict_with_returns() {
    let calc = Calculator::new();
    let session = Session::new();
    let mut e = session.wrap(&calc).unwrap().method("add").unwrap();
    e.returns(1).unwrap();
    assert!(matches!(e.yields(2), Err(Error::Configuration(_))));
    assert!(!is_hooked(&calc, "add"));
}

#[test]
fn yields_conflict_with_runs() {
    let calc = Calculator::new();
    let session = Session::new();
    let mut e = session.wrap(&calc).unwrap().method("add").unwrap();
    e.yields(1).unwrap();
    assert!(matches!(e.runs_original(), Err(Error::Configuration(_))));
}

// vim: tw=80
//! Ordered expectations.

use pretty_assertions::assert_eq;

use mockwrap::*;

fn door() -> Namespace {
    Namespace::module("door", MethodTable::new()
        .function("bar", |_| Ok(Value::None)))
}

fn expect_a_then_b(mock: &Mock) {
    mock.method("bar").unwrap()
        .with_args(pattern!["a"]).unwrap()
        .ordered();
    mock.method("bar").unwrap()
        .with_args(pattern!["b"]).unwrap()
        .ordered();
}

#[test]
fn in_order() {
    let d = door();
    let session = Session::new();
    expect_a_then_b(&session.wrap(&d).unwrap());
    assert_eq!(Ok(Value::None), d.call("bar", args!["a"]));
    assert_eq!(Ok(Value::None), d.call("bar", args!["b"]));
}

#[test]
fn out_of_order() {
    let d = door();
    let session = Session::new();
    expect_a_then_b(&session.wrap(&d).unwrap());
    assert_eq!(Err(Error::OrderViolation {
                   called: "bar(\"b\")".to_owned(),
                   expected: "bar(\"a\")".to_owned()
               }),
               d.call("bar", args!["b"]));
}

#[test]
fn message() {
    let e = Error::OrderViolation {
        called: "bar(\"b\")".to_owned(),
        expected: "bar(\"a\")".to_owned()
    };
    assert_eq!("bar(\"b\") called before bar(\"a\")", e.to_string());
}

#[test]
fn repeated_calls_after_the_first() {
    let d = door();
    let session = Session::new();
    expect_a_then_b(&session.wrap(&d).unwrap());
    d.call("bar", args!["a"]).unwrap();
    d.call("bar", args!["b"]).unwrap();
    d.call("bar", args!["b"]).unwrap();
    d.call("bar", args!["a"]).unwrap();
}

#[test]
fn earlier_catch_all_is_tolerated() {
    let d = door();
    let session = Session::new();
    let mock = session.wrap(&d).unwrap();
    mock.method("bar").unwrap().returns("default").unwrap();
    expect_a_then_b(&mock);
    assert_eq!(Ok(Value::None), d.call("bar", args!["a"]));
    assert_eq!(Ok(Value::None), d.call("bar", args!["b"]));
    assert_eq!(Ok(Value::from("default")), d.call("bar", args!["c"]));
}

#[test]
fn unordered_expectations_are_not_checked() {
    let d = door();
    let session = Session::new();
    let mock = session.wrap(&d).unwrap();
    mock.method("bar").unwrap().with_args(pattern!["a"]).unwrap();
    mock.method("bar").unwrap().with_args(pattern!["b"]).unwrap();
    assert_eq!(Ok(Value::None), d.call("bar", args!["b"]));
}

#[test]
fn only_the_same_method_is_considered() {
    let d = Namespace::module("door", MethodTable::new()
        .function("bar", |_| Ok(Value::None))
        .function("baz", |_| Ok(Value::None)));
    let session = Session::new();
    let mock = session.wrap(&d).unwrap();
    mock.method("baz").unwrap().with_args(pattern![1]).unwrap().ordered();
    mock.method("bar").unwrap().with_args(pattern![2]).unwrap().ordered();
    assert_eq!(Ok(Value::None), d.call("bar", args![2]));
}

#[test]
fn ordered_catch_all_stops_at_an_earlier_matching_sibling() {
    let d = door();
    let session = Session::new();
    let mock = session.wrap(&d).unwrap();
    mock.method("bar").unwrap().with_args(pattern!["a"]).unwrap();
    mock.method("bar").unwrap().returns("any").unwrap().ordered();
    mock.method("bar").unwrap()
        .with_args(pattern!["c"]).unwrap()
        .ordered();
    assert_eq!(Ok(Value::from("any")), d.call("bar", args!["a"]));
}

#[test]
fn ordered_catch_all_ignores_later_siblings() {
    let d = door();
    let session = Session::new();
    let mock = session.wrap(&d).unwrap();
    mock.method("bar").unwrap().returns("any").unwrap().ordered();
    mock.method("bar").unwrap()
        .with_args(pattern!["c"]).unwrap()
        .ordered();
    assert_eq!(Ok(Value::from("any")), d.call("bar", args!["x"]));
    assert_eq!(Ok(Value::None), d.call("bar", args!["c"]));
}

#[test]
fn ordered_catch_all_after_an_uncalled_sibling() {
    let d = door();
    let session = Session::new();
    let mock = session.wrap(&d).unwrap();
    mock.method("bar").unwrap()
        .with_args(pattern!["a"]).unwrap()
        .ordered();
    mock.method("bar").unwrap().ordered();
    assert_eq!(Err(Error::OrderViolation {
                   called: "bar()".to_owned(),
                   expected: "bar(\"a\")".to_owned()
               }),
               d.call("bar", args!["x"]));
}

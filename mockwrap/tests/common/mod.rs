// vim: tw=80
//! Targets shared by the integration tests.
#![allow(dead_code)]

use std::sync::OnceLock;

use mockwrap::*;

pub fn arithmetic_error() -> Class {
    static CLASS: OnceLock<Class> = OnceLock::new();
    CLASS.get_or_init(|| Class::new("ArithmeticError")).clone()
}

pub fn zero_division_error() -> Class {
    static CLASS: OnceLock<Class> = OnceLock::new();
    CLASS.get_or_init(|| arithmetic_error().subclass("ZeroDivisionError"))
        .clone()
}

fn int(args: &Args, i: usize) -> i64 {
    args.get(i).and_then(Value::as_int).unwrap_or(0)
}

/// An object target whose methods all go through the hook table.
pub struct Calculator {
    hooks: HookTable,
    methods: MethodTable,
}

impl Calculator {
    pub fn new() -> Self {
        let methods = MethodTable::new()
            .instance("add", |_: &Calculator, a: &Args| {
                Ok(Value::from(int(a, 0) + int(a, 1)))
            })
            .instance("div", |_: &Calculator, a: &Args| {
                let (x, y) = (int(a, 0), int(a, 1));
                if y == 0 {
                    let e = zero_division_error().exception("division by zero");
                    return Err(e.into());
                }
                Ok(Value::from((x / y, x % y)))
            })
            .instance("pair", |_: &Calculator, a: &Args| {
                Ok(Value::Tuple(a.positional().to_vec()))
            })
            .instance("greet", |_: &Calculator, a: &Args| {
                let name = a.get(0).map(Value::text).unwrap_or_default();
                Ok(Value::from(format!("hello {name}")))
            });
        Calculator{hooks: HookTable::new(), methods}
    }

    trampolines!{
        pub fn add(&self, a: i64, b: i64);
        pub fn div(&self, a: i64, b: i64);
        pub fn pair(&self, a: Value, b: Value);
        pub fn greet(&self, name: &str);
    }
}

impl Interceptable for Calculator {
    fn hooks(&self) -> Option<&HookTable> {
        Some(&self.hooks)
    }

    fn method(&self, name: &str) -> Option<Method> {
        self.methods.get(name)
    }

    fn describe(&self) -> String {
        "Calculator".to_owned()
    }
}

/// A module of free functions.
pub fn shell() -> Namespace {
    Namespace::module("shell", MethodTable::new()
        .function("run", |a: &Args| {
            Ok(Value::from(format!("ran {}", a)))
        })
        .function("cwd", |_| Ok(Value::from("/")))
    )
}

/// A class-level target with both class and instance methods.
pub fn widget_class() -> Namespace {
    Namespace::class("Widget", MethodTable::new()
        .class("create", |_| Ok(Value::from("widget")))
        .instance("draw", |_: &Calculator, _: &Args| Ok(Value::None))
    )
}

/// Is a hook currently installed for `method` on `target`?
pub fn is_hooked(target: &dyn Interceptable, method: &str) -> bool {
    target.hooks().is_some_and(|h| h.is_hooked(method))
}

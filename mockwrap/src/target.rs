// vim: tw=80
//! The interception layer.
//!
//! Nothing is overwritten at runtime.  Instead, every interceptable target owns
//! a [`HookTable`]: a slot, keyed by method name, that a
//! [`Session`](crate::Session) fills while the target is wrapped.  The
//! target's public methods forward to [`invoke`], which runs the installed hook
//! if there is one and the real [`Method`] otherwise.

use std::{
    any,
    cell::RefCell,
    collections::HashMap,
    fmt,
    ptr,
    rc::Rc,
};

use downcast::*;

use crate::{Args, Error, Outcome};

/// What sort of thing is being wrapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    /// An object.  Replacements of any binding kind may be installed.
    Instance,
    /// A class-level target.  Only class and static replacements may be
    /// installed.
    Class,
    /// A module of free functions.
    Module,
}

/// How a method is bound to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    /// Needs the receiving object.
    Instance,
    /// Bound to a class rather than to any instance.
    Class,
    /// A free function.
    Static,
}

type MethodFn = dyn Fn(&dyn Interceptable, &Args) -> Outcome;

/// A callable method implementation together with its binding kind.
///
/// Cloning a `Method` yields the same method: [`Method::same_as`] compares by
/// identity, which is how a replacement is recognized as the original.
#[derive(Clone)]
pub struct Method {
    kind: BindingKind,
    func: Rc<MethodFn>,
}

impl Method {
    /// An instance method of `T`.  Calling it with a receiver of any other
    /// type fails with [`Error::TargetUnavailable`].
    pub fn instance<T, F>(f: F) -> Self
        where T: Interceptable,
              F: Fn(&T, &Args) -> Outcome + 'static
    {
        let func = move |receiver: &dyn Interceptable, args: &Args| {
            let this = receiver.downcast_ref::<T>()
                .map_err(|_| Error::TargetUnavailable {
                    target: format!("{} (expected a receiver of type {})",
                        receiver.describe(), any::type_name::<T>())
                })?;
            f(this, args)
        };
        Method{kind: BindingKind::Instance, func: Rc::new(func)}
    }

    /// A method bound to a class.
    pub fn class<F>(f: F) -> Self
        where F: Fn(&Args) -> Outcome + 'static
    {
        Method{
            kind: BindingKind::Class,
            func: Rc::new(move |_: &dyn Interceptable, args: &Args| f(args))
        }
    }

    /// A free function.
    pub fn function<F>(f: F) -> Self
        where F: Fn(&Args) -> Outcome + 'static
    {
        Method{
            kind: BindingKind::Static,
            func: Rc::new(move |_: &dyn Interceptable, args: &Args| f(args))
        }
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Run the method directly, bypassing any installed hook.
    pub fn call(&self, receiver: &dyn Interceptable, args: &Args) -> Outcome {
        (self.func)(receiver, args)
    }

    /// Is `other` this very method?
    pub fn same_as(&self, other: &Method) -> bool {
        ptr::addr_eq(Rc::as_ptr(&self.func), Rc::as_ptr(&other.func))
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("kind", &self.kind).finish()
    }
}

/// The real methods of a target, by name.
#[derive(Clone, Debug, Default)]
pub struct MethodTable(HashMap<String, Method>);

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `method` under `name`, replacing any method of that name.
    pub fn with(mut self, name: impl Into<String>, method: Method) -> Self {
        self.0.insert(name.into(), method);
        self
    }

    /// Shortcut for `with(name, Method::instance(f))`.
    pub fn instance<T, F>(self, name: impl Into<String>, f: F) -> Self
        where T: Interceptable,
              F: Fn(&T, &Args) -> Outcome + 'static
    {
        self.with(name, Method::instance(f))
    }

    /// Shortcut for `with(name, Method::class(f))`.
    pub fn class<F>(self, name: impl Into<String>, f: F) -> Self
        where F: Fn(&Args) -> Outcome + 'static
    {
        self.with(name, Method::class(f))
    }

    /// Shortcut for `with(name, Method::function(f))`.
    pub fn function<F>(self, name: impl Into<String>, f: F) -> Self
        where F: Fn(&Args) -> Outcome + 'static
    {
        self.with(name, Method::function(f))
    }

    /// Look up a method by name.
    pub fn get(&self, name: &str) -> Option<Method> {
        self.0.get(name).cloned()
    }
}

pub(crate) type Hook = Rc<dyn Fn(&dyn Interceptable, &Args) -> Outcome>;

/// Opaque identity of a wrapped target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TargetId(usize);

/// A target's per-method override slot.
///
/// Clones share the same slot, so a target that derives `Clone` shares its
/// hooks (and its identity) with its clones.
#[derive(Clone, Default)]
pub struct HookTable(Rc<RefCell<HashMap<String, Hook>>>);

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is a hook currently installed for `method`?
    pub fn is_hooked(&self, method: &str) -> bool {
        self.0.borrow().contains_key(method)
    }

    pub(crate) fn id(&self) -> TargetId {
        TargetId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    pub(crate) fn get(&self, method: &str) -> Option<Hook> {
        self.0.borrow().get(method).cloned()
    }

    /// Install `hook` for `method`, returning whatever hook it displaced.
    pub(crate) fn install(&self, method: &str, hook: Hook) -> Option<Hook> {
        self.0.borrow_mut().insert(method.to_owned(), hook)
    }

    /// Undo [`install`](Self::install).
    pub(crate) fn restore(&self, method: &str, displaced: Option<Hook>) {
        let mut slot = self.0.borrow_mut();
        match displaced {
            Some(hook) => {
                slot.insert(method.to_owned(), hook);
            },
            None => {
                slot.remove(method);
            }
        }
    }
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.0.borrow();
        let mut hooked: Vec<&String> = slot.keys().collect();
        hooked.sort();
        f.debug_struct("HookTable").field("hooked", &hooked).finish()
    }
}

/// The capability to be wrapped by a [`Session`](crate::Session).
///
/// An implementor exposes its override slot and its real methods, and routes
/// every public method through [`invoke`] (usually by way of the
/// [`trampolines!`](crate::trampolines) macro).
///
/// # Examples
/// ```
/// # use mockwrap::*;
/// struct Greeter {
///     hooks: HookTable,
///     methods: MethodTable,
/// }
///
/// impl Greeter {
///     fn new() -> Self {
///         let methods = MethodTable::new()
///             .instance("greet", |_: &Greeter, args: &Args| {
///                 let name = args.get(0).map(Value::text).unwrap_or_default();
///                 Ok(Value::from(format!("hello {name}")))
///             });
///         Greeter{hooks: HookTable::new(), methods}
///     }
///
///     trampolines!{
///         fn greet(&self, name: &str);
///     }
/// }
///
/// impl Interceptable for Greeter {
///     fn hooks(&self) -> Option<&HookTable> {
///         Some(&self.hooks)
///     }
///
///     fn method(&self, name: &str) -> Option<Method> {
///         self.methods.get(name)
///     }
/// }
///
/// let greeter = Greeter::new();
/// assert_eq!(Ok(Value::from("hello bob")), greeter.greet("bob"));
///
/// let session = Session::new();
/// session.wrap(&greeter).unwrap()
///     .method("greet").unwrap()
///     .returns("hi").unwrap();
/// assert_eq!(Ok(Value::from("hi")), greeter.greet("bob"));
/// session.verify().unwrap();
/// assert_eq!(Ok(Value::from("hello bob")), greeter.greet("bob"));
/// ```
pub trait Interceptable: Any + 'static {
    /// The target's override slot, or `None` if it must never be modified.
    fn hooks(&self) -> Option<&HookTable>;

    /// The real implementation of `name`, if the target has such a method.
    fn method(&self, name: &str) -> Option<Method>;

    fn kind(&self) -> TargetKind {
        TargetKind::Instance
    }

    /// A human-readable name for diagnostics.
    fn describe(&self) -> String {
        any::type_name::<Self>().to_owned()
    }
}
downcast!(dyn Interceptable);

/// A ready-made target: a named table of methods with its own override slot.
///
/// Handy for modules of free functions and for class-level targets, which
/// have no receiving object of their own.
#[derive(Clone, Debug)]
pub struct Namespace {
    name: String,
    kind: TargetKind,
    hooks: HookTable,
    methods: MethodTable,
}

impl Namespace {
    pub fn new(name: impl Into<String>, kind: TargetKind, methods: MethodTable)
        -> Self
    {
        Namespace{name: name.into(), kind, hooks: HookTable::new(), methods}
    }

    /// A module of free functions.
    pub fn module(name: impl Into<String>, methods: MethodTable) -> Self {
        Self::new(name, TargetKind::Module, methods)
    }

    /// A class-level target.
    pub fn class(name: impl Into<String>, methods: MethodTable) -> Self {
        Self::new(name, TargetKind::Class, methods)
    }

    /// Call one of this namespace's methods through [`invoke`].
    pub fn call(&self, method: &str, args: Args) -> Outcome {
        invoke(self, method, args)
    }
}

impl Interceptable for Namespace {
    fn hooks(&self) -> Option<&HookTable> {
        Some(&self.hooks)
    }

    fn method(&self, name: &str) -> Option<Method> {
        self.methods.get(name)
    }

    fn kind(&self) -> TargetKind {
        self.kind
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Call `method` on `target`: through its installed hook if it is wrapped,
/// or straight to the real method if it is not.
pub fn invoke(target: &dyn Interceptable, method: &str, args: Args) -> Outcome {
    if let Some(hook) = target.hooks().and_then(|h| h.get(method)) {
        return hook(target, &args);
    }
    match target.method(method) {
        Some(m) => m.call(target, &args),
        None => Err(Error::MethodNotFound {
            target: target.describe(),
            method: method.to_owned()
        })
    }
}

/// Generate forwarding methods that route through [`invoke`].
///
/// Each generated method takes `&self` plus arguments convertible into
/// [`Value`](crate::Value)s, and returns an [`Outcome`].  Use it inside the
/// target's `impl` block.
#[macro_export]
macro_rules! trampolines {
    ($(
        $(#[$attr:meta])*
        $v:vis fn $name:ident(&self $(, $arg:ident: $ty:ty)* $(,)?);
    )*) => {
        $(
            $(#[$attr])*
            $v fn $name(&self $(, $arg: $ty)*) -> $crate::Outcome {
                $crate::invoke(self, stringify!($name), $crate::args![$($arg),*])
            }
        )*
    };
}

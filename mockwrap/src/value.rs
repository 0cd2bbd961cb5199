// vim: tw=80
//! The dynamic values that flow through intercepted calls.
//!
//! Arguments, return values and injected exceptions are all expressed with
//! the types in this module, so that a single dispatcher can serve methods of
//! any signature.

use std::{
    borrow::Cow,
    cell::RefCell,
    collections::VecDeque,
    fmt,
    rc::Rc,
    sync::Arc,
};

struct ClassDef {
    name: String,
    parent: Option<Class>,
}

/// A named runtime class, optionally derived from a parent class.
///
/// Classes give [`Object`]s and [`Exception`]s a type that can be matched
/// with inheritance: an instance of a subclass is also an instance of every
/// ancestor.  Two `Class` handles are equal only if they were cloned from the
/// same definition.
///
/// # Examples
/// ```
/// # use mockwrap::*;
/// let error = Class::new("Error");
/// let io_error = error.subclass("IoError");
/// assert!(io_error.is_subclass_of(&error));
/// assert!(!error.is_subclass_of(&io_error));
/// ```
#[derive(Clone)]
pub struct Class(Arc<ClassDef>);

impl Class {
    /// Define a new root class.
    pub fn new(name: impl Into<String>) -> Self {
        Class(Arc::new(ClassDef{name: name.into(), parent: None}))
    }

    /// Define a new class derived from this one.
    pub fn subclass(&self, name: impl Into<String>) -> Self {
        Class(Arc::new(ClassDef{name: name.into(), parent: Some(self.clone())}))
    }

    /// Create an [`Exception`] of this class.
    pub fn exception(&self, message: impl Into<String>) -> Exception {
        Exception::new(self.clone(), message)
    }

    /// Create a new [`Object`] of this class.
    pub fn instance(&self, label: impl Into<String>) -> Object {
        Object(Rc::new(ObjectData{class: self.clone(), label: label.into()}))
    }

    /// Is this class `other`, or derived from it?
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let mut class = Some(self);
        while let Some(c) = class {
            if Arc::ptr_eq(&c.0, &other.0) {
                return true;
            }
            class = c.parent();
        }
        false
    }

    /// The name given when the class was defined.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The class this one derives from, if any.
    pub fn parent(&self) -> Option<&Class> {
        self.0.parent.as_ref()
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.name())
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Class {}

struct ObjectData {
    class: Class,
    label: String,
}

/// An instance of a [`Class`].  Objects compare by identity.
#[derive(Clone)]
pub struct Object(Rc<ObjectData>);

impl Object {
    /// The class this object was created from.
    pub fn class(&self) -> &Class {
        &self.0.class
    }

    /// A name for diagnostics.  Two objects may share a label.
    pub fn label(&self) -> &str {
        &self.0.label
    }

    /// Is this object an instance of `class` or of one of its subclasses?
    pub fn is_instance_of(&self, class: &Class) -> bool {
        self.class().is_subclass_of(class)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.class().name(), self.label())
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// An application-level exception, either injected by an expectation or
/// raised by a real method.
///
/// Exceptions travel through [`Outcome`](crate::Outcome)s as
/// [`Error::Raised`](crate::Error::Raised).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exception {
    class: Class,
    message: String,
}

impl Exception {
    /// Same as [`Class::exception`].
    pub fn new(class: Class, message: impl Into<String>) -> Self {
        Exception{class, message: message.into()}
    }

    /// The exception's class.
    pub fn class(&self) -> &Class {
        &self.class
    }

    /// The exception's string form.  This is what message patterns are
    /// matched against.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Would this exception be caught by a handler for `class`?
    pub fn is_instance_of(&self, class: &Class) -> bool {
        self.class.is_subclass_of(class)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.class)
        } else {
            write!(f, "{}: {}", self.class, self.message)
        }
    }
}

/// A lazily pulled sequence of yielded values.
///
/// Every call to a method configured with
/// [`yields`](crate::Expectation::yields) returns a `Stream` over that
/// expectation's N yield values.  Pulling an item rotates the shared queue, so
/// a stream that is dropped half-way through leaves the next stream starting
/// where it stopped.  Each stream ends after N items.
#[derive(Clone)]
pub struct Stream {
    items: Rc<RefCell<VecDeque<Value>>>,
    remaining: usize,
}

impl Stream {
    pub(crate) fn new(items: Rc<RefCell<VecDeque<Value>>>) -> Self {
        let remaining = items.borrow().len();
        Stream{items, remaining}
    }
}

impl Iterator for Stream {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.remaining == 0 {
            return None;
        }
        let mut items = self.items.borrow_mut();
        let item = items.pop_front()?;
        items.push_back(item.clone());
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").field("remaining", &self.remaining).finish()
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.items, &other.items) &&
            self.remaining == other.remaining
    }
}

/// A dynamically typed argument or return value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Object(Object),
    Stream(Stream),
}

impl Value {
    /// Is this [`Value::None`]?
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// The boolean inside, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None
        }
    }

    /// The integer inside, if this is a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None
        }
    }

    /// The float inside, if this is a [`Value::Float`].
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None
        }
    }

    /// The string inside, if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None
        }
    }

    /// The object inside, if this is a [`Value::Object`].
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None
        }
    }

    /// Equality as used by argument and return value matching: like `==`,
    /// except that integers and floats compare by numeric value.
    ///
    /// # Examples
    /// ```
    /// # use mockwrap::*;
    /// assert!(Value::from(1).same_as(&Value::from(1.0)));
    /// assert!(Value::from((1, 2.5)).same_as(&Value::from((1.0, 2.5))));
    /// assert!(!Value::from(1).same_as(&Value::from("1")));
    /// ```
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            // Integers beyond 2^53 may round when widened
            (Value::Int(i), Value::Float(x)) |
            (Value::Float(x), Value::Int(i)) => *i as f64 == *x,
            (Value::Tuple(a), Value::Tuple(b)) |
            (Value::List(a), Value::List(b)) =>
                a.len() == b.len() &&
                    a.iter().zip(b).all(|(x, y)| x.same_as(y)),
            (a, b) => a == b
        }
    }

    /// Take the [`Stream`] out of a value returned by a yielding method.
    pub fn into_stream(self) -> Option<Stream> {
        match self {
            Value::Stream(s) => Some(s),
            _ => None
        }
    }

    /// The elements of a tuple, or the value itself as a one-element slice.
    pub(crate) fn elements(&self) -> &[Value] {
        match self {
            Value::Tuple(items) => items,
            other => std::slice::from_ref(other)
        }
    }

    /// The string form used by pattern matching: the raw contents of a
    /// string, or the display form of anything else.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Value::Str(s) => Cow::Borrowed(s),
            other => Cow::Owned(other.to_string())
        }
    }

    /// The [`ValueType`] that admits this value and nothing more general.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::None => ValueType::None,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::Tuple(_) => ValueType::Tuple,
            Value::List(_) => ValueType::List,
            Value::Object(o) => ValueType::Instance(o.class().clone()),
            Value::Stream(_) => ValueType::Stream,
        }
    }
}

fn fmt_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Tuple(items) => {
                f.write_str("(")?;
                fmt_seq(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            },
            Value::List(items) => {
                f.write_str("[")?;
                fmt_seq(f, items)?;
                f.write_str("]")
            },
            Value::Object(o) => write!(f, "{o:?}"),
            Value::Stream(_) => f.write_str("<stream>"),
        }
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Value::Int(i64::from(i))
                }
            }
        )*
    }
}
value_from_int!{i8, i16, i32, i64, u8, u16, u32}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Value::None, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

macro_rules! value_from_tuple {
    ($(($($t:ident $i:tt),+))*) => {
        $(
            impl<$($t: Into<Value>),+> From<($($t,)+)> for Value {
                fn from(t: ($($t,)+)) -> Self {
                    Value::Tuple(vec![$(t.$i.into()),+])
                }
            }
        )*
    }
}
value_from_tuple!{
    (A 0, B 1)
    (A 0, B 1, C 2)
    (A 0, B 1, C 2, D 3)
}

/// The type half of a type constraint: which values count as instances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueType {
    /// Every value is an instance of `Any`.
    Any,
    None,
    Bool,
    Int,
    Float,
    Str,
    Tuple,
    List,
    Stream,
    /// Objects of this class or of any subclass.
    Instance(Class),
}

impl ValueType {
    /// Is `value` an instance of this type?
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) |
            (ValueType::None, Value::None) |
            (ValueType::Bool, Value::Bool(_)) |
            (ValueType::Int, Value::Int(_)) |
            (ValueType::Float, Value::Float(_)) |
            (ValueType::Str, Value::Str(_)) |
            (ValueType::Tuple, Value::Tuple(_)) |
            (ValueType::List, Value::List(_)) |
            (ValueType::Stream, Value::Stream(_)) => true,
            (ValueType::Instance(class), Value::Object(o)) =>
                o.is_instance_of(class),
            _ => false
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => f.write_str("any"),
            ValueType::None => f.write_str("none"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Int => f.write_str("int"),
            ValueType::Float => f.write_str("float"),
            ValueType::Str => f.write_str("str"),
            ValueType::Tuple => f.write_str("tuple"),
            ValueType::List => f.write_str("list"),
            ValueType::Stream => f.write_str("stream"),
            ValueType::Instance(class) => write!(f, "{class}"),
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn display() {
        let v = Value::from((1, "x", 2.5));
        assert_eq!("(1, \"x\", 2.5)", v.to_string());
        assert_eq!("(None,)", Value::Tuple(vec![Value::None]).to_string());
        assert_eq!("[true, false]", Value::from(vec![true, false]).to_string());
    }

    #[test]
    fn objects_compare_by_identity() {
        let user = Class::new("User");
        let a = user.instance("alice");
        let b = user.instance("alice");
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn stream_rotates_shared_queue() {
        let items: VecDeque<Value> = (1..=3).map(Value::from).collect();
        let items = Rc::new(RefCell::new(items));
        let mut first = Stream::new(items.clone());
        assert_eq!(Some(Value::Int(1)), first.next());
        drop(first);
        let second: Vec<Value> = Stream::new(items).collect();
        assert_eq!(vec![Value::Int(2), Value::Int(3), Value::Int(1)], second);
    }

    #[test]
    fn text_is_raw_for_strings() {
        assert_eq!("abc", Value::from("abc").text());
        assert_eq!("42", Value::from(42).text());
    }

    #[test]
    fn value_type_admits_subclasses() {
        let animal = Class::new("Animal");
        let dog = animal.subclass("Dog");
        let rex = Value::from(dog.instance("rex"));
        assert!(ValueType::Instance(animal).admits(&rex));
        assert!(ValueType::Any.admits(&rex));
        assert!(!ValueType::Str.admits(&rex));
        assert!(ValueType::Str.admits(&Value::from("s")));
    }
}

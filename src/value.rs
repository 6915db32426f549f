//! Dynamic values interpolated into templates.

use std::{collections::BTreeMap, fmt, rc::Rc};
use adom::{Event, EventListener, Node};
use itertools::Itertools;
use kstring::KString;

use crate::{html::Html, state::Getter};

/// A zero-argument accessor. Reading state inside it while a tracked
/// evaluation runs subscribes that evaluation.
pub type Func = Rc<dyn Fn() -> Value>;

#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(KString),
    List(Rc<Vec<Value>>),
    Object(Rc<BTreeMap<KString, Value>>),
    Node(Node),
    Html(Html),
    Func(Func),
    Handler(EventListener),
}

fn rc_addr<T: ?Sized>(r: &Rc<T>) -> *const u8 {
    Rc::as_ptr(r) as *const u8
}

impl Value {
    pub fn func(f: impl Fn() -> Value + 'static) -> Value {
        Value::Func(Rc::new(f))
    }

    pub fn handler(f: impl Fn(&Event) + 'static) -> Value {
        Value::Handler(Rc::new(f))
    }

    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Value {
        Value::List(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    pub fn object<K: AsRef<str>, V: Into<Value>>(
        entries: impl IntoIterator<Item = (K, V)>
    ) -> Value {
        Value::Object(Rc::new(
            entries.into_iter()
                .map(|(k, v)| (KString::from_ref(k.as_ref()), v.into()))
                .collect()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Func(_) | Value::Handler(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Value::Null | Value::Bool(_) | Value::Int(_)
                 | Value::Float(_) | Value::Str(_))
    }

    /// Scripting-language truthiness: null, false, 0, NaN and the empty
    /// string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => !(f.is_nan() || *f == 0.0),
            Value::Str(s) => !s.is_empty(),
            _ => true
        }
    }

    /// Call an accessor (one level); other values are returned as is.
    pub fn resolve(&self) -> Value {
        match self {
            Value::Func(f) => f(),
            v => v.clone()
        }
    }

    /// Identity for reference values, equality for primitives. This is
    /// the comparison used to skip DOM writes.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Node(a), Value::Node(b)) => Node::ptr_eq(a, b),
            (Value::Html(a), Value::Html(b)) => Html::ptr_eq(a, b),
            (Value::Func(a), Value::Func(b)) => rc_addr(a) == rc_addr(b),
            (Value::Handler(a), Value::Handler(b)) => rc_addr(a) == rc_addr(b),
            _ => false
        }
    }

    /// Structural equality: numbers compare numerically, lists and
    /// objects by content, everything else like `same`.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) =>
                *a as f64 == *b,
            (Value::List(a), Value::List(b)) =>
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y)),
            (Value::Object(a), Value::Object(b)) =>
                a.len() == b.len()
                && a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| ka == kb && va.equals(vb)),
            _ => self.same(other)
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Int(i) => J::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map(J::Number).unwrap_or(J::Null),
            Value::Str(s) => J::String(s.to_string()),
            Value::List(l) => J::Array(l.iter().map(Value::to_json).collect()),
            Value::Object(o) => J::Object(
                o.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect()),
            Value::Node(_) | Value::Html(_) | Value::Func(_) | Value::Handler(_) => J::Null,
        }
    }

    pub fn from_json(j: serde_json::Value) -> Value {
        use serde_json::Value as J;
        match j {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(b),
            J::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            J::String(s) => Value::Str(KString::from_string(s)),
            J::Array(a) => Value::List(Rc::new(a.into_iter().map(Value::from_json).collect())),
            J::Object(o) => Value::Object(Rc::new(
                o.into_iter().map(|(k, v)| (KString::from_string(k), Value::from_json(v)))
                    .collect())),
        }
    }

    /// Interpret raw attribute text: JSON literals (`true`, `12`,
    /// `null`, `[1]`) become the corresponding value, anything else
    /// stays a string.
    pub fn parse_literal(s: &str) -> Value {
        match serde_json::from_str::<serde_json::Value>(s) {
            Ok(j) => Value::from_json(j),
            Err(_) => Value::Str(KString::from_ref(s)),
        }
    }
}

impl fmt::Display for Value {
    /// The text a value renders as in attributes and text nodes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) =>
                if x.is_nan() {
                    write!(f, "NaN")
                } else if x.is_infinite() {
                    write!(f, "{}Infinity", if *x < 0. { "-" } else { "" })
                } else {
                    write!(f, "{x}")
                },
            Value::Str(s) => f.write_str(s),
            Value::List(_) | Value::Object(_) =>
                f.write_str(&serde_json::to_string(&self.to_json()).unwrap_or_default()),
            Value::Node(n) => write!(f, "{n}"),
            Value::Html(h) => write!(f, "[object Html {}]",
                                     h.nodes().iter().map(|n| n.outer_html()).join("")),
            Value::Func(_) => write!(f, "[function]"),
            Value::Handler(_) => write!(f, "[handler]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s.as_str()),
            Value::Node(n) => write!(f, "{n:?}"),
            Value::Html(h) => write!(f, "{h:?}"),
            v => write!(f, "{v}"),
        }
    }
}

impl Default for Value {
    fn default() -> Self { Value::Null }
}

macro_rules! from_int {
    ($($t:ty)*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self { Value::Int(i as i64) }
            }
        )*
    }
}
from_int!(i8 i16 i32 i64 u8 u16 u32 u64 usize isize);

impl From<()> for Value {
    fn from(_: ()) -> Self { Value::Null }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::Float(x) }
}
impl From<f32> for Value {
    fn from(x: f32) -> Self { Value::Float(x as f64) }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(KString::from_ref(s)) }
}
impl From<&String> for Value {
    fn from(s: &String) -> Self { Value::Str(KString::from_ref(s)) }
}
impl From<String> for Value {
    fn from(s: String) -> Self { Value::Str(KString::from_string(s)) }
}
impl From<KString> for Value {
    fn from(s: KString) -> Self { Value::Str(s) }
}
impl From<Node> for Value {
    fn from(n: Node) -> Self { Value::Node(n) }
}
impl From<&Node> for Value {
    fn from(n: &Node) -> Self { Value::Node(n.clone()) }
}
impl From<Html> for Value {
    fn from(h: Html) -> Self { Value::Html(h) }
}
impl From<&Html> for Value {
    fn from(h: &Html) -> Self { Value::Html(h.clone()) }
}
impl From<Func> for Value {
    fn from(f: Func) -> Self { Value::Func(f) }
}
impl From<serde_json::Value> for Value {
    fn from(j: serde_json::Value) -> Self { Value::from_json(j) }
}
impl From<&Value> for Value {
    fn from(v: &Value) -> Self { v.clone() }
}
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self { Value::list(v) }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value> + Clone + 'static> From<Getter<T>> for Value {
    fn from(g: Getter<T>) -> Self {
        Value::func(move || g.get().into())
    }
}
impl<T: Into<Value> + Clone + 'static> From<&Getter<T>> for Value {
    fn from(g: &Getter<T>) -> Self {
        g.clone().into()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_truthiness() {
        for v in [Value::Null, false.into(), 0.into(), f64::NAN.into(), "".into()] {
            assert!(!v.is_truthy(), "{v:?}");
        }
        for v in [true.into(), 1.into(), "0".into(), Value::list(Vec::<i32>::new()),
                  Value::func(|| Value::Null)] {
            assert!(v.is_truthy(), "{v:?}");
        }
    }

    #[test]
    fn t_stringify() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(12).to_string(), "12");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from(2.0).to_string(), "2");
        assert_eq!(Value::list([1, 2]).to_string(), "[1,2]");
        assert_eq!(Value::object([("x", 12)]).to_string(), "{\"x\":12}");
    }

    #[test]
    fn t_parse_literal() {
        assert!(Value::parse_literal("true").same(&Value::Bool(true)));
        assert!(Value::parse_literal("null").is_null());
        assert!(Value::parse_literal("12").same(&Value::Int(12)));
        assert!(Value::parse_literal("cursor: pointer").same(&"cursor: pointer".into()));
        assert!(Value::parse_literal("[1, 2]").equals(&Value::list([1, 2])));
    }

    #[test]
    fn t_same_vs_equals() {
        let l = Value::list([1]);
        assert!(l.same(&l.clone()));
        assert!(!l.same(&Value::list([1])));
        assert!(l.equals(&Value::list([1])));
        assert!(Value::from(1).equals(&Value::from(1.0)));
        let f = Value::func(|| Value::Null);
        assert!(f.same(&f.clone()));
        assert!(!f.same(&Value::func(|| Value::Null)));
    }
}

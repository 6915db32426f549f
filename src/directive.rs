//! Attribute slot semantics: the directive a slot resolves to at
//! compile time, and the `Binding` that applies it to a live element.

use std::{cell::RefCell, rc::Rc};
use adom::{EventListener, ListenerOptions, Node, Platform};
use anyhow::Result;
use chj_util::{nowarn, warn_if};
use kstring::KString;
use strum_macros::AsRefStr;

use crate::{error::MarkupError,
            placeholder::{self, RawPart},
            trace::TRACE,
            value::Value};

#[derive(Debug, Clone, PartialEq, Eq, AsRefStr)]
pub enum Directive {
    Ref,
    Event { event_type: KString },
    ClassToggle { class: KString },
    StyleToggle { property: KString },
    /// An empty key (bare `data` / `attr.data`) never writes anything.
    DataToggle { key: KString },
    LiteralFlagToggle { attribute: KString },
    ComputedAttribute { attribute: KString },
}

fn event_type_of(name: &str) -> Option<&str> {
    let rest = name.strip_prefix("on")?;
    if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_lowercase()) {
        Some(rest)
    } else {
        None
    }
}

/// Resolve attribute `name` with raw value `raw` on `element`; the
/// first matching rule wins.
pub fn resolve(platform: &dyn Platform, element: &Node, name: &str, raw: &str) -> Directive {
    if name == "ref" {
        return Directive::Ref
    }
    if let Some(event_type) = event_type_of(name) {
        let tag = element.tag_name().unwrap_or("");
        let is_event = match element.custom_element() {
            Some(def) => !def.observed_attributes.iter().any(|a| a == name),
            None => platform.has_event_property(tag, name),
        };
        if is_event {
            return Directive::Event { event_type: KString::from_ref(event_type) }
        }
    }
    let name = name.strip_prefix("attr.").unwrap_or(name);
    if let Some((ns, key)) = name.split_once('.') {
        let key = KString::from_ref(key);
        match ns {
            "class" => return Directive::ClassToggle { class: key },
            "style" => return Directive::StyleToggle { property: key },
            "data" => return Directive::DataToggle { key },
            _ => ()
        }
    }
    if name == "data" {
        return Directive::DataToggle { key: KString::from_static("") }
    }
    if raw.contains('|') {
        return Directive::LiteralFlagToggle { attribute: KString::from_ref(name) }
    }
    Directive::ComputedAttribute { attribute: KString::from_ref(name) }
}

/// Whether attributes named `name` need a slot even without a
/// placeholder in their value.
pub fn is_directive_name(name: &str) -> bool {
    let name = name.strip_prefix("attr.").unwrap_or(name);
    name.starts_with("class.") || name.starts_with("style.") || name.starts_with("data.")
}


/// One piece of an attribute value: literal text or an interpolated
/// value.
#[derive(Debug, Clone)]
pub enum Part {
    Text(KString),
    Value(Value),
}

pub fn parts_of(raw: &str, values: &[Value]) -> Vec<Part> {
    placeholder::split(raw, values.len()).into_iter().map(|p| match p {
        RawPart::Text(t) => Part::Text(t),
        RawPart::Value(i) => Part::Value(values[i].clone()),
    }).collect()
}

fn is_dynamic(parts: &[Part]) -> bool {
    parts.iter().any(|p| matches!(p, Part::Value(Value::Func(_))))
}

/// Evaluate parts: a single value part is resolved as is (strings are
/// read as literals), several parts are concatenated and the result
/// read as a literal.
pub fn evaluate(parts: &[Part]) -> Value {
    match parts {
        [] => Value::Str(KString::from_static("")),
        [Part::Value(v)] => match v.resolve() {
            Value::Str(s) => Value::parse_literal(&s),
            v => v,
        },
        parts => {
            let mut s = String::new();
            for p in parts {
                match p {
                    Part::Text(t) => s.push_str(t),
                    Part::Value(v) => s.push_str(&v.resolve().to_string()),
                }
            }
            Value::parse_literal(&s)
        }
    }
}

fn kebab_to_camel(name: &str) -> String {
    let mut out = String::new();
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn listener_options(v: &Value) -> Option<ListenerOptions> {
    match v {
        Value::Bool(b) => Some(ListenerOptions::from(*b)),
        Value::Object(o) => {
            let flag = |k: &str| o.get(k).map(Value::is_truthy).unwrap_or(false);
            Some(ListenerOptions {
                capture: flag("capture"),
                once: flag("once"),
                passive: flag("passive"),
            })
        }
        _ => None
    }
}

#[derive(Debug, Clone)]
struct Evaluated {
    value: Value,
    flag: Option<bool>,
}

impl Evaluated {
    fn same(&self, other: &Evaluated) -> bool {
        self.flag == other.flag && self.value.same(&other.value)
    }

    fn on(&self) -> bool {
        self.flag.unwrap_or_else(|| self.value.is_truthy())
    }
}

struct BoundListener {
    handler: Value,
    listener: EventListener,
    capture: bool,
}

/// A resolved attribute slot bound to one element of a wired instance.
pub struct Binding {
    element: Node,
    directive: Directive,
    raw: KString,
    /// Value side; for toggles written as `"<value> | <flag>"` the part
    /// before the bar.
    parts: Vec<Part>,
    flag: Option<Vec<Part>>,
    last: RefCell<Option<Evaluated>>,
    listener: RefCell<Option<BoundListener>>,
}

impl Binding {
    pub fn new(element: Node, directive: Directive, raw: &str, parts: Vec<Part>) -> Binding {
        let (parts, flag) = match &directive {
            Directive::ClassToggle { .. } | Directive::StyleToggle { .. }
            | Directive::DataToggle { .. } | Directive::LiteralFlagToggle { .. } =>
                split_flag(parts),
            _ => (parts, None)
        };
        Binding {
            element,
            directive,
            raw: KString::from_ref(raw),
            parts,
            flag,
            last: RefCell::new(None),
            listener: RefCell::new(None),
        }
    }

    pub fn directive(&self) -> &Directive {
        &self.directive
    }

    pub fn element(&self) -> &Node {
        &self.element
    }

    /// Whether re-evaluation can yield a different result, i.e. the
    /// binding needs an effect.
    pub fn is_dynamic(&self) -> bool {
        !matches!(self.directive, Directive::Event { .. } | Directive::Ref)
            && (is_dynamic(&self.parts)
                || self.flag.as_deref().map(is_dynamic).unwrap_or(false))
    }

    /// The ref name, empty if none.
    pub fn ref_name(&self) -> String {
        evaluate(&self.parts).to_string().trim().to_string()
    }

    /// Apply the binding to its element, skipping all writes if the
    /// evaluated value is unchanged since the last call.
    pub fn apply(&self) -> Result<()> {
        match &self.directive {
            Directive::Ref => Ok(()),
            Directive::Event { event_type } => self.apply_event(event_type),
            _ => {
                let evaluated = Evaluated {
                    value: evaluate(&self.parts),
                    flag: self.flag.as_deref().map(|f| evaluate(f).is_truthy()),
                };
                let previous = self.last.borrow().clone();
                if let Some(previous) = &previous {
                    if previous.same(&evaluated) {
                        return Ok(())
                    }
                }
                self.write(&evaluated, previous.as_ref());
                *self.last.borrow_mut() = Some(evaluated);
                Ok(())
            }
        }
    }

    fn write(&self, e: &Evaluated, previous: Option<&Evaluated>) {
        let el = &self.element;
        warn_if!(TRACE, "binding {:?} on {el:?}: {:?}", self.directive, e.value);
        match &self.directive {
            Directive::ClassToggle { class } => {
                if class.is_empty() {
                } else if e.on() {
                    el.class_list_add(class)
                } else {
                    el.class_list_remove(class)
                }
            }
            Directive::StyleToggle { property } => {
                if e.on() {
                    el.set_style_property(property, &e.value.to_string())
                } else {
                    el.remove_style_property(property)
                }
            }
            Directive::DataToggle { key } => {
                if !key.is_empty() {
                    let name = format!("data-{key}");
                    if e.on() {
                        el.set_attribute(&name, &e.value.to_string())
                    } else {
                        el.remove_attribute(&name)
                    }
                }
            }
            Directive::LiteralFlagToggle { attribute } => {
                let literal = e.value.to_string();
                if let Some(p) = previous {
                    let old = p.value.to_string();
                    if old != literal {
                        toggle_literal(el, attribute, &old, false);
                    }
                }
                toggle_literal(el, attribute, &literal, e.on());
            }
            Directive::ComputedAttribute { attribute } => self.write_computed(attribute, &e.value),
            Directive::Ref | Directive::Event { .. } => ()
        }
    }

    fn write_computed(&self, attribute: &str, value: &Value) {
        let el = &self.element;
        let removes = match value {
            Value::Null | Value::Bool(false) => true,
            Value::Str(s) => s.is_empty(),
            _ => false
        };
        if removes {
            el.remove_attribute(attribute);
        } else {
            el.set_attribute(attribute, &value.to_string());
        }
        if el.custom_element().is_some() && !value.is_primitive() {
            let prop = kebab_to_camel(attribute);
            let json = value.to_json();
            if el.property(&prop).as_ref() != Some(&json) {
                if let Err(_e) = el.set_property(&prop, json) {
                    nowarn!("ignoring property assignment failure: {_e}");
                }
            }
        } else if el.has_property(attribute) {
            let json = match value {
                Value::Bool(_) | Value::Null => value.to_json(),
                v => serde_json::Value::String(v.to_string()),
            };
            if el.property(attribute).as_ref() != Some(&json) {
                if let Err(_e) = el.set_property(attribute, json) {
                    nowarn!("ignoring property assignment failure: {_e}");
                }
            }
        }
    }

    fn apply_event(&self, event_type: &str) -> Result<()> {
        let handler = match self.parts.first() {
            Some(Part::Value(v)) => v.clone(),
            Some(Part::Text(t)) => Value::Str(t.clone()),
            None => Value::Null,
        };
        if let Some(bound) = &*self.listener.borrow() {
            if bound.handler.same(&handler) {
                return Ok(())
            }
        }
        let listener: EventListener = match &handler {
            Value::Handler(h) => h.clone(),
            Value::Func(f) => {
                let f = f.clone();
                Rc::new(move |_| { f(); })
            }
            v => {
                let shown = if v.is_null() { "null".to_string() } else { v.to_string() };
                return Err(MarkupError::invalid_handler(event_type, shown))
            }
        };
        let option = if self.parts.len() > 2 {
            match &self.parts[2] {
                Part::Value(v) => v.resolve(),
                Part::Text(t) => Value::parse_literal(t.trim()),
            }
        } else {
            self.raw.split(',').nth(1)
                .map(|s| Value::parse_literal(s.trim()))
                .unwrap_or(Value::Null)
        };
        let options = listener_options(&option).unwrap_or_default();
        self.remove_listener();
        self.element.add_event_listener(event_type, listener.clone(), options);
        *self.listener.borrow_mut() = Some(BoundListener {
            handler,
            listener,
            capture: options.capture
        });
        Ok(())
    }

    fn remove_listener(&self) {
        if let (Directive::Event { event_type }, Some(bound)) =
            (&self.directive, self.listener.borrow_mut().take())
        {
            self.element.remove_event_listener(event_type, &bound.listener, bound.capture);
        }
    }

    /// Undo what `apply` registered outside the element's own state.
    pub fn cleanup(&self) {
        self.remove_listener();
    }
}

fn split_flag(parts: Vec<Part>) -> (Vec<Part>, Option<Vec<Part>>) {
    let mut value = Vec::new();
    let mut flag: Option<Vec<Part>> = None;
    for p in parts {
        match (&mut flag, p) {
            (Some(f), p) => f.push(p),
            (None, Part::Text(t)) => match t.split_once('|') {
                Some((before, after)) => {
                    let before = before.trim_end();
                    if !before.is_empty() {
                        value.push(Part::Text(KString::from_ref(before)));
                    }
                    let after = after.trim_start();
                    let mut f = Vec::new();
                    if !after.is_empty() {
                        f.push(Part::Text(KString::from_ref(after)));
                    }
                    flag = Some(f);
                }
                None => value.push(Part::Text(t)),
            },
            (None, p) => value.push(p),
        }
    }
    if let Some(f) = &mut flag {
        if let Some(Part::Text(t)) = f.last_mut() {
            *t = KString::from_ref(t.trim_end());
        }
    }
    if let Some(Part::Text(t)) = value.first_mut() {
        *t = KString::from_ref(t.trim_start());
    }
    (value, flag)
}

fn toggle_literal(el: &Node, attribute: &str, literal: &str, on: bool) {
    match attribute {
        "class" => for token in literal.split_ascii_whitespace() {
            if on {
                el.class_list_add(token)
            } else {
                el.class_list_remove(token)
            }
        },
        "style" => for (property, value) in adom::style::parse_declarations(literal) {
            if on {
                el.set_style_property(&property, &value)
            } else {
                el.remove_style_property(&property)
            }
        },
        _ => if on {
            el.set_attribute(attribute, literal)
        } else {
            el.remove_attribute(attribute)
        }
    }
}

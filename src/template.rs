//! Compiling the static structure of a template into a cached
//! fragment plus the list of slots awaiting dynamic bindings.

use std::{cell::{Cell, RefCell}, collections::HashMap, rc::Rc};
use adom::{Namespace, Node, Platform, TreeBuilder};
use anyhow::Result;
use chj_util::{time_guard, warn, warn_if};
use kstring::KString;

use crate::{directive::{self, Directive},
            error::MarkupError,
            placeholder,
            trace::TRACE,
            value::Value};

#[allow(unused_imports)]
use chj_util::nodt as dt;

/// Attribute carrying the anchor id of elements with attribute slots.
pub const SLOT_ID_ATTRIBUTE: &str = "data-slot-id";
/// Prefix of the comment anchors replacing dynamic text.
pub const CONTENT_ANCHOR_PREFIX: &str = "markup-slot:";

#[derive(Debug, Clone)]
pub enum SlotValue {
    /// Raw attribute text, possibly holding placeholders.
    Raw(KString),
    /// One entry of an attribute object spread over the element.
    Spread { index: usize, key: KString },
}

#[derive(Debug, Clone)]
pub enum Slot {
    Attribute {
        anchor: usize,
        name: KString,
        value: SlotValue,
        directive: Directive,
    },
    Content {
        anchor: usize,
        raw: KString,
    },
}

impl Slot {
    pub fn anchor(&self) -> usize {
        match self {
            Slot::Attribute { anchor, .. } | Slot::Content { anchor, .. } => *anchor
        }
    }
}

/// Compiled static structure. Never mutated after compilation, only
/// cloned for each wired instance.
#[derive(Debug)]
pub struct Template {
    pub fragment: Node,
    pub slots: Vec<Slot>,
}

impl Template {
    /// Fail unless every spread slot's value is an attribute object.
    pub fn check_spreads(&self, values: &[Value]) -> Result<()> {
        for slot in &self.slots {
            if let Slot::Attribute { value: SlotValue::Spread { index, .. }, .. } = slot {
                check_spread(values.get(*index))?;
            }
        }
        Ok(())
    }

    /// Deep clone of the fragment, with the anchors of all slots
    /// indexed by anchor id.
    pub fn instantiate(&self) -> (Node, HashMap<usize, Node>) {
        let fragment = self.fragment.clone_node(true);
        let mut anchors = HashMap::new();
        for node in fragment.descendants() {
            if node.is_element() {
                if let Some(id) = node.get_attribute(SLOT_ID_ATTRIBUTE) {
                    if let Ok(id) = id.parse() {
                        anchors.insert(id, node);
                    }
                }
            } else if node.is_comment() {
                let id = node.node_value()
                    .and_then(|v| v.strip_prefix(CONTENT_ANCHOR_PREFIX)
                              .and_then(|i| i.parse().ok()));
                if let Some(id) = id {
                    anchors.insert(id, node);
                }
            }
        }
        (fragment, anchors)
    }
}

fn check_spread(value: Option<&Value>) -> Result<()> {
    match value {
        Some(Value::Object(_)) => Ok(()),
        Some(v) => Err(MarkupError::invalid_attribute_object(v.to_string())),
        None => Err(MarkupError::invalid_attribute_object("undefined".into())),
    }
}


/// Tree builder recording slots while the parser creates the nodes.
struct CompileBuilder<'a> {
    platform: &'a dyn Platform,
    values: &'a [Value],
    slots: Vec<Slot>,
    next_anchor: usize,
}

impl<'a> CompileBuilder<'a> {
    fn new_anchor(&mut self) -> usize {
        let id = self.next_anchor;
        self.next_anchor += 1;
        id
    }

    fn element_anchor(&mut self, element: &Node) -> usize {
        match element.get_attribute(SLOT_ID_ATTRIBUTE).and_then(|v| v.parse().ok()) {
            Some(id) => id,
            None => {
                let id = self.new_anchor();
                element.set_attribute(SLOT_ID_ATTRIBUTE, &id.to_string());
                id
            }
        }
    }
}

impl<'a> TreeBuilder for CompileBuilder<'a> {
    fn create_element_ns(&mut self, namespace: Namespace, tag_name: &str) -> Result<Node> {
        Ok(self.platform.create_element_ns(namespace, tag_name))
    }

    fn create_text_node(&mut self, text: &str) -> Result<Node> {
        Ok(self.platform.create_text_node(text))
    }

    fn create_comment(&mut self, text: &str) -> Result<Node> {
        Ok(self.platform.create_comment(text))
    }

    fn create_document_fragment(&mut self) -> Result<Node> {
        Ok(self.platform.create_document_fragment())
    }

    fn set_attribute(&mut self, element: &Node, name: &str, value: &str) -> Result<()> {
        if let Some(index) = placeholder::whole_placeholder(name) {
            let object = self.values.get(index);
            check_spread(object)?;
            if let Some(Value::Object(object)) = object {
                let anchor = self.element_anchor(element);
                let raw = placeholder::token(0);
                for key in object.keys() {
                    let directive = directive::resolve(self.platform, element, key, &raw);
                    self.slots.push(Slot::Attribute {
                        anchor,
                        name: key.clone(),
                        value: SlotValue::Spread { index, key: key.clone() },
                        directive,
                    });
                }
            }
            return Ok(())
        }
        if placeholder::contains_placeholder(name) {
            warn!("ignoring dynamically interpolated attribute name {name:?}");
            return Ok(())
        }
        if name == "ref"
            || placeholder::contains_placeholder(value)
            || name.starts_with("attr.")
            || directive::is_directive_name(name)
        {
            // html5gum hands over attributes sorted by name, so the slots
            // of one element are registered alphabetically.
            let anchor = self.element_anchor(element);
            let directive = directive::resolve(self.platform, element, name, value);
            let write_raw = match &directive {
                Directive::ComputedAttribute { attribute } =>
                    (attribute == name && !element.tag_name().unwrap_or("").contains('-'))
                    .then(|| attribute.clone()),
                _ => None
            };
            self.slots.push(Slot::Attribute {
                anchor,
                name: KString::from_ref(name),
                value: SlotValue::Raw(KString::from_ref(value)),
                directive,
            });
            if let Some(attribute) = write_raw {
                element.set_attribute(&attribute, value);
            }
            return Ok(())
        }
        element.set_attribute(name, value);
        Ok(())
    }

    fn append_child(&mut self, parent: &Node, child: Node) -> Result<()> {
        if child.is_text() {
            let text = child.node_value().unwrap_or_default();
            if placeholder::contains_placeholder(&text) {
                let anchor = self.new_anchor();
                let comment = self.platform.create_comment(
                    &format!("{CONTENT_ANCHOR_PREFIX}{anchor}"));
                self.slots.push(Slot::Content { anchor, raw: text });
                return parent.append_child(&comment)
            }
        }
        parent.append_child(&child)
    }
}

fn compile(platform: &dyn Platform, template_string: &str, values: &[Value]) -> Result<Template> {
    dt!("compile", template_string);
    time_guard!("compile_template");
    let mut builder = CompileBuilder { platform, values, slots: Vec::new(), next_anchor: 0 };
    let escaped = placeholder::escape_dynamic_tags(template_string);
    let fragment = adom::parse(&escaped, &mut builder)?;
    Ok(Template { fragment, slots: builder.slots })
}


/// Compiled templates keyed by their composite static string.
#[derive(Default)]
pub struct TemplateCache {
    templates: RefCell<HashMap<String, Rc<Template>>>,
    compiles: Cell<usize>,
}

impl TemplateCache {
    pub fn new() -> TemplateCache {
        Self::default()
    }

    /// The template for `segments`, compiling it on first use.
    pub fn get_or_compile(&self,
                          platform: &dyn Platform,
                          segments: &[&str],
                          values: &[Value]) -> Result<Rc<Template>> {
        let key = placeholder::template_string(segments);
        if let Some(t) = self.templates.borrow().get(&key) {
            return Ok(t.clone())
        }
        warn_if!(TRACE, "template cache miss for {key:?}");
        let template = Rc::new(compile(platform, &key, values)?);
        self.compiles.set(self.compiles.get() + 1);
        self.templates.borrow_mut().insert(key, template.clone());
        Ok(template)
    }

    /// How many templates were compiled so far.
    pub fn compile_count(&self) -> usize {
        self.compiles.get()
    }

    pub fn len(&self) -> usize {
        self.templates.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.borrow().is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use adom::Document;
    use crate::error::{markup_error_kind, MarkupErrorKind};

    #[test]
    fn t_cache_reuse() {
        let doc = Document::new();
        let cache = TemplateCache::new();
        let a = cache.get_or_compile(&doc, &["<b>", "</b>"], &[1.into()]).unwrap();
        let b = cache.get_or_compile(&doc, &["<b>", "</b>"], &["x".into()]).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.compile_count(), 1);
        cache.get_or_compile(&doc, &[" <b>", "</b>\n"], &[1.into()]).unwrap();
        assert_eq!(cache.compile_count(), 1);
        cache.get_or_compile(&doc, &["<i>", "</i>"], &[1.into()]).unwrap();
        assert_eq!(cache.compile_count(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn t_slots_in_document_order() {
        let doc = Document::new();
        let cache = TemplateCache::new();
        let t = cache.get_or_compile(
            &doc,
            &["<p class=\"x\" title=\"", "\" ref=\"p\">a ", " b<br>", "</p>"],
            &[1.into(), 2.into(), 3.into()]).unwrap();
        let names: Vec<String> = t.slots.iter().map(|s| match s {
            Slot::Attribute { name, .. } => name.to_string(),
            Slot::Content { raw, .. } => format!("#{raw}"),
        }).collect();
        assert_eq!(names, vec!["ref", "title", "#a {{val1}} b", "#{{val2}}"]);
        assert_eq!(t.fragment.inner_html(),
                   "<p class=\"x\" data-slot-id=\"0\" title=\"{{val0}}\">\
                    <!--markup-slot:1--><br><!--markup-slot:2--></p>");
    }

    #[test]
    fn t_directive_slots_without_placeholders() {
        let doc = Document::new();
        let t = TemplateCache::new().get_or_compile(
            &doc, &["<button class.btn=\"true\" attr.title=\"x\" type=\"button\"></button>"], &[])
            .unwrap();
        assert_eq!(t.slots.len(), 2);
        assert_eq!(t.fragment.inner_html(),
                   "<button data-slot-id=\"0\" type=\"button\"></button>");
    }

    #[test]
    fn t_spread() {
        let doc = Document::new();
        let cache = TemplateCache::new();
        let attrs = Value::object([("id", "x"), ("title", "y")]);
        let t = cache.get_or_compile(&doc, &["<div ", "></div>"], &[attrs]).unwrap();
        assert_eq!(t.slots.len(), 2);
        assert!(matches!(&t.slots[1], Slot::Attribute {
            value: SlotValue::Spread { index: 0, key }, ..} if key == "title"));
        assert!(t.check_spreads(&[12.into()]).is_err());

        let e = TemplateCache::new()
            .get_or_compile(&doc, &["<div ", "></div>"], &[12.into()]).unwrap_err();
        assert!(matches!(markup_error_kind(&e),
                         Some(MarkupErrorKind::InvalidAttributeObject { .. })));
        assert!(e.to_string().contains("Invalid attribute object provided: 12"), "{e:#}");
    }

    #[test]
    fn t_partial_attribute_name_ignored() {
        let doc = Document::new();
        let t = TemplateCache::new()
            .get_or_compile(&doc, &["<div data-", "=\"1\"></div>"], &["x".into()]).unwrap();
        assert!(t.slots.is_empty());
        assert_eq!(t.fragment.inner_html(), "<div></div>");
    }

    #[test]
    fn t_instantiate() {
        let doc = Document::new();
        let t = TemplateCache::new().get_or_compile(
            &doc, &["<p title=\"", "\">", "</p>"], &[1.into(), 2.into()]).unwrap();
        let (frag, anchors) = t.instantiate();
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[&0].tag_name(), Some("p"));
        assert!(anchors[&1].is_comment());
        assert!(!Node::ptr_eq(&frag, &t.fragment));
        assert!(frag.first_child().unwrap().parent_node().is_some());
    }
}

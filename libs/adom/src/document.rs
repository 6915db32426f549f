//! The document: node factory, `<html>`/`<head>`/`<body>`, and the
//! custom element registry.

use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};
use anyhow::{Result, bail};
use kstring::KString;

use crate::{Namespace, METADB, node::Node};

/// What a templating engine needs from its host document.
pub trait Platform {
    fn create_element_ns(&self, namespace: Namespace, tag_name: &str) -> Node;
    fn create_text_node(&self, text: &str) -> Node;
    fn create_comment(&self, text: &str) -> Node;
    fn create_document_fragment(&self) -> Node;
    /// The definition if `tag_name` is a registered custom element.
    fn custom_element(&self, tag_name: &str) -> Option<Rc<CustomElementDefinition>>;
    /// Whether elements with `tag_name` expose an event handler
    /// property `attribute_name` (like `onclick`).
    fn has_event_property(&self, tag_name: &str, attribute_name: &str) -> bool;
}


pub type AttributeChangedCallback =
    Rc<dyn Fn(&Node, &str, Option<&str>, Option<&str>)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: KString,
    pub writable: bool,
}

pub struct CustomElementDefinition {
    pub name: KString,
    pub observed_attributes: Vec<KString>,
    pub properties: Vec<PropertyDescriptor>,
    pub attribute_changed: Option<AttributeChangedCallback>,
}

impl fmt::Debug for CustomElementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomElementDefinition")
            .field("name", &self.name)
            .field("observed_attributes", &self.observed_attributes)
            .field("properties", &self.properties)
            .finish()
    }
}

impl CustomElementDefinition {
    pub fn new(name: &str) -> Self {
        CustomElementDefinition {
            name: KString::from_ref(name),
            observed_attributes: Vec::new(),
            properties: Vec::new(),
            attribute_changed: None,
        }
    }

    pub fn observe(mut self, attribute: &str) -> Self {
        self.observed_attributes.push(KString::from_ref(attribute));
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn with_property(mut self, name: &str) -> Self {
        self.properties.push(PropertyDescriptor { name: KString::from_ref(name), writable: true });
        self
    }

    pub fn with_read_only_property(mut self, name: &str) -> Self {
        self.properties.push(PropertyDescriptor { name: KString::from_ref(name), writable: false });
        self
    }

    pub fn on_attribute_changed(mut self, cb: AttributeChangedCallback) -> Self {
        self.attribute_changed = Some(cb);
        self
    }
}


pub struct Document {
    html: Node,
    head: Node,
    body: Node,
    registry: RefCell<HashMap<KString, Rc<CustomElementDefinition>>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Document {
        let html = Node::new_element(Namespace::Html, "html", None);
        let head = Node::new_element(Namespace::Html, "head", None);
        let body = Node::new_element(Namespace::Html, "body", None);
        // fresh nodes, can't fail
        let _ = html.append_child(&head);
        let _ = html.append_child(&body);
        Document { html, head, body, registry: RefCell::new(HashMap::new()) }
    }

    pub fn document_element(&self) -> &Node { &self.html }
    pub fn head(&self) -> &Node { &self.head }
    pub fn body(&self) -> &Node { &self.body }

    /// Register a custom element. Names must contain a dash and can
    /// only be defined once.
    pub fn define(&self, definition: CustomElementDefinition) -> Result<()> {
        let name = definition.name.clone();
        if !name.contains('-') {
            bail!("{name:?} is not a valid custom element name")
        }
        let mut registry = self.registry.borrow_mut();
        if registry.contains_key(&name) {
            bail!("custom element {name:?} has already been defined")
        }
        registry.insert(name, Rc::new(definition));
        Ok(())
    }
}

impl Platform for Document {
    fn create_element_ns(&self, namespace: Namespace, tag_name: &str) -> Node {
        let custom = if namespace == Namespace::Html {
            self.custom_element(tag_name)
        } else {
            None
        };
        Node::new_element(namespace, tag_name, custom)
    }

    fn create_text_node(&self, text: &str) -> Node {
        Node::new_text(text)
    }

    fn create_comment(&self, text: &str) -> Node {
        Node::new_comment(text)
    }

    fn create_document_fragment(&self) -> Node {
        Node::new_fragment()
    }

    fn custom_element(&self, tag_name: &str) -> Option<Rc<CustomElementDefinition>> {
        self.registry.borrow().get(&*tag_name.to_ascii_lowercase()).cloned()
    }

    fn has_event_property(&self, tag_name: &str, attribute_name: &str) -> bool {
        METADB.has_event_property(tag_name, attribute_name)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn t_document_structure() {
        let doc = Document::new();
        assert_eq!(doc.document_element().outer_html(),
                   "<html><head></head><body></body></html>");
        assert_eq!(doc.body().parent_node().as_ref(), Some(doc.document_element()));
    }

    #[test]
    fn t_define() {
        let doc = Document::new();
        assert!(doc.define(CustomElementDefinition::new("nodash")).is_err());
        doc.define(CustomElementDefinition::new("my-el").with_read_only_property("size"))
            .unwrap();
        assert!(doc.define(CustomElementDefinition::new("my-el")).is_err());
        let el = doc.create_element_ns(Namespace::Html, "my-el");
        assert!(el.custom_element().is_some());
        assert!(el.set_property("size", serde_json::json!(3)).is_err());
        assert!(el.set_property("items", serde_json::json!([1])).is_ok());
        assert!(doc.create_element_ns(Namespace::Svg, "my-el").custom_element().is_none());
    }

    #[test]
    fn t_attribute_changed_callback() {
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let doc = Document::new();
        doc.define(CustomElementDefinition::new("x-counter")
                   .observe("count")
                   .on_attribute_changed(Rc::new(move |_: &Node, name: &str, old: Option<&str>, new: Option<&str>| {
                       assert_eq!(name, "count");
                       if c.get() == 0 {
                           assert_eq!((old, new), (None, Some("1")));
                       }
                       c.set(c.get() + 1);
                   })))
            .unwrap();
        let el = doc.create_element_ns(Namespace::Html, "x-counter");
        el.set_attribute("count", "1");
        el.set_attribute("other", "1");
        el.remove_attribute("count");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn t_event_properties() {
        let doc = Document::new();
        assert!(doc.has_event_property("button", "onclick"));
        assert!(!doc.has_event_property("button", "onfoo"));
    }
}

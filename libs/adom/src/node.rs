//! DOM nodes. A `Node` is a cheap handle (`Rc`); parents are held
//! weakly, children strongly.

use std::{cell::{Cell, RefCell},
          collections::BTreeMap,
          fmt,
          rc::{Rc, Weak}};
use anyhow::{Result, bail};
use kstring::KString;

use crate::{Namespace, METADB, escape_text, escape_attribute, style,
            event::{Event, EventListener, ListenerOptions, RegisteredListener},
            document::CustomElementDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    Fragment,
    ShadowRoot,
}

pub(crate) struct ElementData {
    namespace: Namespace,
    tag_name: KString,
    attributes: RefCell<Vec<(KString, KString)>>,
    properties: RefCell<BTreeMap<KString, serde_json::Value>>,
    custom: Option<Rc<CustomElementDefinition>>,
    shadow_root: RefCell<Option<Node>>,
    attribute_writes: Cell<usize>,
}

pub(crate) enum NodeData {
    Element(ElementData),
    Text(RefCell<KString>),
    Comment(RefCell<KString>),
    Fragment,
    ShadowRoot,
}

pub struct NodeInner {
    parent: RefCell<Weak<NodeInner>>,
    children: RefCell<Vec<Node>>,
    listeners: RefCell<Vec<Rc<RegisteredListener>>>,
    data: NodeData,
}

#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Node::ptr_eq(self, other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.data {
            NodeData::Element(e) => write!(f, "<{}>", e.tag_name),
            NodeData::Text(s) => write!(f, "#text {:?}", &**s.borrow()),
            NodeData::Comment(s) => write!(f, "#comment {:?}", &**s.borrow()),
            NodeData::Fragment => write!(f, "#document-fragment"),
            NodeData::ShadowRoot => write!(f, "#shadow-root"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.data {
            NodeData::Element(e) => write!(f, "[object Element <{}>]", e.tag_name),
            NodeData::Text(_) => write!(f, "[object Text]"),
            NodeData::Comment(_) => write!(f, "[object Comment]"),
            NodeData::Fragment => write!(f, "[object DocumentFragment]"),
            NodeData::ShadowRoot => write!(f, "[object ShadowRoot]"),
        }
    }
}

impl Node {
    fn new(data: NodeData) -> Node {
        Node(Rc::new(NodeInner {
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            data,
        }))
    }

    pub fn new_element(namespace: Namespace,
                       tag_name: &str,
                       custom: Option<Rc<CustomElementDefinition>>) -> Node {
        Node::new(NodeData::Element(ElementData {
            namespace,
            tag_name: KString::from_ref(tag_name),
            attributes: RefCell::new(Vec::new()),
            properties: RefCell::new(BTreeMap::new()),
            custom,
            shadow_root: RefCell::new(None),
            attribute_writes: Cell::new(0),
        }))
    }

    pub fn new_text(text: &str) -> Node {
        Node::new(NodeData::Text(RefCell::new(KString::from_ref(text))))
    }

    pub fn new_comment(text: &str) -> Node {
        Node::new(NodeData::Comment(RefCell::new(KString::from_ref(text))))
    }

    pub fn new_fragment() -> Node {
        Node::new(NodeData::Fragment)
    }

    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn kind(&self) -> NodeKind {
        match &self.0.data {
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::Fragment => NodeKind::Fragment,
            NodeData::ShadowRoot => NodeKind::ShadowRoot,
        }
    }

    pub fn is_element(&self) -> bool { self.kind() == NodeKind::Element }
    pub fn is_text(&self) -> bool { self.kind() == NodeKind::Text }
    pub fn is_comment(&self) -> bool { self.kind() == NodeKind::Comment }
    pub fn is_fragment(&self) -> bool { self.kind() == NodeKind::Fragment }
    pub fn is_shadow_root(&self) -> bool { self.kind() == NodeKind::ShadowRoot }

    fn element(&self) -> Option<&ElementData> {
        match &self.0.data {
            NodeData::Element(e) => Some(e),
            _ => None
        }
    }

    /// Lower case tag name, `None` for non-elements.
    pub fn tag_name(&self) -> Option<&str> {
        self.element().map(|e| e.tag_name.as_str())
    }

    pub fn namespace(&self) -> Option<Namespace> {
        self.element().map(|e| e.namespace)
    }

    pub fn custom_element(&self) -> Option<&Rc<CustomElementDefinition>> {
        self.element().and_then(|e| e.custom.as_ref())
    }

    /// Data of text and comment nodes.
    pub fn node_value(&self) -> Option<KString> {
        match &self.0.data {
            NodeData::Text(s) | NodeData::Comment(s) => Some(s.borrow().clone()),
            _ => None
        }
    }

    pub fn set_node_value(&self, value: &str) {
        match &self.0.data {
            NodeData::Text(s) | NodeData::Comment(s) =>
                *s.borrow_mut() = KString::from_ref(value),
            _ => ()
        }
    }

    pub fn text_content(&self) -> String {
        match &self.0.data {
            NodeData::Text(s) => s.borrow().to_string(),
            NodeData::Comment(_) => String::new(),
            _ => {
                let mut out = String::new();
                for child in self.child_nodes() {
                    if child.kind() != NodeKind::Comment {
                        out.push_str(&child.text_content());
                    }
                }
                out
            }
        }
    }

    // ------------------------------------------------------------------
    // Tree navigation

    pub fn parent_node(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    pub fn child_nodes(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.children.borrow().first().cloned()
    }

    pub fn last_child(&self) -> Option<Node> {
        self.0.children.borrow().last().cloned()
    }

    fn index_of_child(&self, child: &Node) -> Option<usize> {
        self.0.children.borrow().iter().position(|c| Node::ptr_eq(c, child))
    }

    fn sibling(&self, offset: isize) -> Option<Node> {
        let parent = self.parent_node()?;
        let i = parent.index_of_child(self)? as isize + offset;
        if i < 0 {
            return None
        }
        let x = parent.0.children.borrow().get(i as usize).cloned();
        x
    }

    pub fn next_sibling(&self) -> Option<Node> {
        self.sibling(1)
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        self.sibling(-1)
    }

    /// Whether `other` is `self` or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        let mut cur = Some(other.clone());
        while let Some(n) = cur {
            if Node::ptr_eq(&n, self) {
                return true
            }
            cur = n.parent_node();
        }
        false
    }

    /// The outermost ancestor (or `self`).
    pub fn root(&self) -> Node {
        let mut cur = self.clone();
        while let Some(p) = cur.parent_node() {
            cur = p;
        }
        cur
    }

    /// All descendants in document order, not including `self`.
    pub fn descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        fn walk(n: &Node, out: &mut Vec<Node>) {
            for child in n.0.children.borrow().iter() {
                out.push(child.clone());
                walk(child, out);
            }
        }
        walk(self, &mut out);
        out
    }

    /// Descendant elements carrying attribute `name`.
    pub fn elements_with_attribute(&self, name: &str) -> Vec<Node> {
        self.descendants().into_iter().filter(|n| n.has_attribute(name)).collect()
    }

    // ------------------------------------------------------------------
    // Mutation

    fn detach(&self) {
        if let Some(parent) = self.parent_node() {
            parent.0.children.borrow_mut().retain(|c| !Node::ptr_eq(c, self));
        }
        *self.0.parent.borrow_mut() = Weak::new();
    }

    fn check_insertable(&self, child: &Node) -> Result<()> {
        match self.kind() {
            NodeKind::Text | NodeKind::Comment =>
                bail!("cannot insert children into {self:?}"),
            _ => ()
        }
        if child.is_shadow_root() {
            bail!("cannot insert a shadow root into the tree")
        }
        if child.contains(self) {
            bail!("cannot insert {child:?} into itself or its own descendant {self:?}")
        }
        Ok(())
    }

    /// Insert `child` at position `index` in `self`'s children. A
    /// fragment is emptied into `self` instead.
    fn insert_at(&self, child: &Node, index: usize) -> Result<()> {
        self.check_insertable(child)?;
        let new_children = if child.is_fragment() {
            let children: Vec<Node> = child.0.children.borrow_mut().drain(..).collect();
            for c in &children {
                *c.0.parent.borrow_mut() = Weak::new();
            }
            children
        } else {
            vec![child.clone()]
        };
        let mut index = index;
        for c in &new_children {
            if let Some(old) = c.parent_node() {
                if Node::ptr_eq(&old, self) {
                    if let Some(i) = self.index_of_child(c) {
                        if i < index {
                            index -= 1;
                        }
                    }
                }
            }
            c.detach();
        }
        let mut children = self.0.children.borrow_mut();
        let index = index.min(children.len());
        for (i, c) in new_children.into_iter().enumerate() {
            *c.0.parent.borrow_mut() = Rc::downgrade(&self.0);
            children.insert(index + i, c);
        }
        Ok(())
    }

    pub fn append_child(&self, child: &Node) -> Result<()> {
        let len = self.0.children.borrow().len();
        self.insert_at(child, len)
    }

    pub fn prepend_child(&self, child: &Node) -> Result<()> {
        self.insert_at(child, 0)
    }

    /// Insert `child` before `reference`, or append if `reference` is
    /// `None`.
    pub fn insert_before(&self, child: &Node, reference: Option<&Node>) -> Result<()> {
        match reference {
            None => self.append_child(child),
            Some(reference) => {
                if let Some(i) = self.index_of_child(reference) {
                    self.insert_at(child, i)
                } else {
                    bail!("insert_before: reference node {reference:?} is not \
                           a child of {self:?}")
                }
            }
        }
    }

    /// Insert `node` directly after `self` in `self`'s parent.
    pub fn after(&self, node: &Node) -> Result<()> {
        let parent = match self.parent_node() {
            Some(p) => p,
            None => bail!("after: {self:?} has no parent"),
        };
        parent.insert_before(node, self.next_sibling().as_ref())
    }

    /// Insert `node` directly before `self` in `self`'s parent.
    pub fn before(&self, node: &Node) -> Result<()> {
        let parent = match self.parent_node() {
            Some(p) => p,
            None => bail!("before: {self:?} has no parent"),
        };
        parent.insert_before(node, Some(self))
    }

    pub fn replace_child(&self, new_child: &Node, old_child: &Node) -> Result<()> {
        if self.index_of_child(old_child).is_none() {
            bail!("replace_child: {old_child:?} is not a child of {self:?}")
        }
        if Node::ptr_eq(new_child, old_child) {
            return Ok(())
        }
        self.insert_before(new_child, Some(old_child))?;
        old_child.detach();
        Ok(())
    }

    pub fn remove_child(&self, child: &Node) -> Result<()> {
        if self.index_of_child(child).is_none() {
            bail!("remove_child: {child:?} is not a child of {self:?}")
        }
        child.detach();
        Ok(())
    }

    /// Remove from the parent, if any.
    pub fn remove(&self) {
        self.detach()
    }

    /// Copy of this node; `deep` copies the subtree too. Listeners,
    /// properties and shadow roots are not copied.
    pub fn clone_node(&self, deep: bool) -> Node {
        let copy = match &self.0.data {
            NodeData::Element(e) => {
                let n = Node::new_element(e.namespace, &e.tag_name, e.custom.clone());
                if let Some(ne) = n.element() {
                    *ne.attributes.borrow_mut() = e.attributes.borrow().clone();
                }
                n
            }
            NodeData::Text(s) => Node::new_text(&s.borrow()),
            NodeData::Comment(s) => Node::new_comment(&s.borrow()),
            NodeData::Fragment => Node::new_fragment(),
            NodeData::ShadowRoot => Node::new(NodeData::ShadowRoot),
        };
        if deep {
            for child in self.0.children.borrow().iter() {
                let c = child.clone_node(true);
                *c.0.parent.borrow_mut() = Rc::downgrade(&copy.0);
                copy.0.children.borrow_mut().push(c);
            }
        }
        copy
    }

    pub fn attach_shadow(&self) -> Result<Node> {
        let e = match self.element() {
            Some(e) => e,
            None => bail!("attach_shadow: {self:?} is not an element"),
        };
        let mut sr = e.shadow_root.borrow_mut();
        if sr.is_some() {
            bail!("attach_shadow: {self:?} already has a shadow root")
        }
        let root = Node::new(NodeData::ShadowRoot);
        *sr = Some(root.clone());
        Ok(root)
    }

    pub fn shadow_root(&self) -> Option<Node> {
        self.element().and_then(|e| e.shadow_root.borrow().clone())
    }

    // ------------------------------------------------------------------
    // Attributes

    pub fn attributes(&self) -> Vec<(KString, KString)> {
        self.element().map(|e| e.attributes.borrow().clone()).unwrap_or_default()
    }

    pub fn get_attribute(&self, name: &str) -> Option<KString> {
        let e = self.element()?;
        let atts = e.attributes.borrow();
        atts.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// How many times attributes of this element were written or
    /// removed since it was created.
    pub fn attribute_writes(&self) -> usize {
        self.element().map(|e| e.attribute_writes.get()).unwrap_or(0)
    }

    fn attribute_changed(&self, name: &str, old: Option<&str>, new: Option<&str>) {
        if let Some(def) = self.custom_element() {
            if def.observed_attributes.iter().any(|a| a == name) {
                if let Some(cb) = &def.attribute_changed {
                    cb(self, name, old, new);
                }
            }
        }
    }

    /// Set attribute `name`. `style` values are normalized. Does
    /// nothing on non-elements.
    pub fn set_attribute(&self, name: &str, value: &str) {
        let e = match self.element() {
            Some(e) => e,
            None => return,
        };
        let value = if name == "style" {
            KString::from_string(style::normalize(value))
        } else {
            KString::from_ref(value)
        };
        e.attribute_writes.set(e.attribute_writes.get() + 1);
        let old = {
            let mut atts = e.attributes.borrow_mut();
            if let Some(slot) = atts.iter_mut().find(|(k, _)| k == name) {
                Some(std::mem::replace(&mut slot.1, value.clone()))
            } else {
                atts.push((KString::from_ref(name), value.clone()));
                None
            }
        };
        self.attribute_changed(name, old.as_deref(), Some(&value));
    }

    pub fn remove_attribute(&self, name: &str) {
        let e = match self.element() {
            Some(e) => e,
            None => return,
        };
        let old = {
            let mut atts = e.attributes.borrow_mut();
            let i = atts.iter().position(|(k, _)| k == name);
            i.map(|i| atts.remove(i).1)
        };
        if let Some(old) = old {
            e.attribute_writes.set(e.attribute_writes.get() + 1);
            self.attribute_changed(name, Some(&old), None);
        }
    }

    // ------------------------------------------------------------------
    // Class tokens

    pub fn class_list(&self) -> Vec<KString> {
        self.get_attribute("class")
            .map(|v| v.split_ascii_whitespace().map(KString::from_ref).collect())
            .unwrap_or_default()
    }

    pub fn class_list_contains(&self, token: &str) -> bool {
        self.class_list().iter().any(|t| t == token)
    }

    fn set_class_list(&self, tokens: &[KString]) {
        if tokens.is_empty() {
            self.remove_attribute("class")
        } else {
            self.set_attribute("class", &tokens.join(" "))
        }
    }

    pub fn class_list_add(&self, token: &str) {
        let mut tokens = self.class_list();
        if !tokens.iter().any(|t| t == token) {
            tokens.push(KString::from_ref(token));
            self.set_class_list(&tokens);
        }
    }

    /// Removes the `class` attribute once no token is left.
    pub fn class_list_remove(&self, token: &str) {
        let mut tokens = self.class_list();
        let len = tokens.len();
        tokens.retain(|t| t != token);
        if tokens.len() != len {
            self.set_class_list(&tokens);
        }
    }

    // ------------------------------------------------------------------
    // Inline style

    pub fn style_property(&self, property: &str) -> Option<KString> {
        let decls = style::parse_declarations(&self.get_attribute("style")?);
        decls.into_iter().find(|(p, _)| p == property).map(|(_, v)| v)
    }

    pub fn set_style_property(&self, property: &str, value: &str) {
        let mut decls = style::parse_declarations(
            &self.get_attribute("style").unwrap_or_default());
        let value = KString::from_ref(value.trim());
        if let Some(d) = decls.iter_mut().find(|(p, _)| p == property) {
            if d.1 == value {
                return
            }
            d.1 = value;
        } else {
            decls.push((KString::from_ref(property), value));
        }
        self.set_attribute("style", &style::serialize_declarations(&decls))
    }

    /// Removes the `style` attribute once no declaration is left.
    pub fn remove_style_property(&self, property: &str) {
        let style = match self.get_attribute("style") {
            Some(s) => s,
            None => return,
        };
        let mut decls = style::parse_declarations(&style);
        let len = decls.len();
        decls.retain(|(p, _)| p != property);
        if decls.is_empty() {
            self.remove_attribute("style")
        } else if decls.len() != len {
            self.set_attribute("style", &style::serialize_declarations(&decls))
        }
    }

    // ------------------------------------------------------------------
    // Properties

    /// Whether the element has a property `name`: declared by its
    /// custom element definition, one of the native properties of its
    /// tag, or explicitly assigned before.
    pub fn has_property(&self, name: &str) -> bool {
        let e = match self.element() {
            Some(e) => e,
            None => return false,
        };
        e.properties.borrow().contains_key(name)
            || e.custom.as_ref().map(|d| d.property(name).is_some()).unwrap_or(false)
            || (e.namespace == Namespace::Html
                && METADB.has_native_property(&e.tag_name, name))
    }

    /// Current value of property `name`. Native properties that were
    /// never assigned reflect their attribute.
    pub fn property(&self, name: &str) -> Option<serde_json::Value> {
        let e = self.element()?;
        if let Some(v) = e.properties.borrow().get(name) {
            return Some(v.clone())
        }
        if e.namespace == Namespace::Html && METADB.has_native_property(&e.tag_name, name) {
            return Some(match self.get_attribute(name) {
                Some(v) => serde_json::Value::String(v.to_string()),
                None => serde_json::Value::Null,
            })
        }
        None
    }

    /// Fails for properties a custom element declares read-only.
    pub fn set_property(&self, name: &str, value: serde_json::Value) -> Result<()> {
        let e = match self.element() {
            Some(e) => e,
            None => bail!("set_property: {self:?} is not an element"),
        };
        if let Some(def) = &e.custom {
            if let Some(p) = def.property(name) {
                if !p.writable {
                    bail!("Cannot set property {name:?} of <{}> which has only a getter",
                          e.tag_name)
                }
            }
        }
        e.properties.borrow_mut().insert(KString::from_ref(name), value);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Events

    /// Registering the same (type, listener, capture) triple twice has
    /// no effect.
    pub fn add_event_listener(&self,
                              event_type: &str,
                              listener: EventListener,
                              options: ListenerOptions) {
        let mut listeners = self.0.listeners.borrow_mut();
        if listeners.iter().any(|l| l.matches(event_type, &listener, options.capture)) {
            return
        }
        listeners.push(Rc::new(RegisteredListener {
            event_type: KString::from_ref(event_type),
            listener,
            options,
            removed: std::cell::Cell::new(false),
        }));
    }

    pub fn remove_event_listener(&self,
                                 event_type: &str,
                                 listener: &EventListener,
                                 capture: bool) {
        self.0.listeners.borrow_mut().retain(|l| {
            if l.matches(event_type, listener, capture) {
                l.removed.set(true);
                false
            } else {
                true
            }
        });
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.0.listeners.borrow().iter().filter(|l| l.event_type == event_type).count()
    }

    fn invoke_listeners(&self, event: &Event, capture_phase: Option<bool>) {
        let listeners: Vec<Rc<RegisteredListener>> =
            self.0.listeners.borrow().iter()
            .filter(|l| l.event_type == event.event_type()
                    && capture_phase.map(|c| l.options.capture == c).unwrap_or(true))
            .cloned()
            .collect();
        event.set_current_target(Some(self));
        for l in listeners {
            if l.removed.get() {
                continue
            }
            if l.options.once {
                self.remove_event_listener(&l.event_type, &l.listener, l.options.capture);
            }
            event.set_in_passive_listener(l.options.passive);
            (l.listener)(event);
            event.set_in_passive_listener(false);
        }
    }

    /// Run capture listeners from the root down, then the target's own
    /// listeners, then (for bubbling events) the non-capture listeners
    /// up to the root. Returns false if the default was prevented.
    pub fn dispatch_event(&self, event: &Event) -> bool {
        event.set_target(self);
        let mut ancestors = Vec::new();
        let mut cur = self.parent_node();
        while let Some(n) = cur {
            cur = n.parent_node();
            ancestors.push(n);
        }
        self.propagate(event, &ancestors);
        event.set_current_target(None);
        !event.default_prevented()
    }

    fn propagate(&self, event: &Event, ancestors: &[Node]) {
        for n in ancestors.iter().rev() {
            n.invoke_listeners(event, Some(true));
            if event.propagation_stopped() {
                return
            }
        }
        self.invoke_listeners(event, None);
        if event.propagation_stopped() || !event.bubbles() {
            return
        }
        for n in ancestors {
            n.invoke_listeners(event, Some(false));
            if event.propagation_stopped() {
                return
            }
        }
    }

    pub fn click(&self) -> bool {
        self.dispatch_event(&Event::bubbling("click"))
    }

    // ------------------------------------------------------------------
    // Serialization

    fn print_html(&self, out: &mut String) {
        match &self.0.data {
            NodeData::Element(e) => {
                out.push('<');
                out.push_str(&e.tag_name);
                for (k, v) in e.attributes.borrow().iter() {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    escape_attribute(out, v);
                    out.push('"');
                }
                out.push('>');
                if e.namespace == Namespace::Html && !METADB.has_closing_tag(&e.tag_name) {
                    return
                }
                self.print_children(out);
                out.push_str("</");
                out.push_str(&e.tag_name);
                out.push('>');
            }
            NodeData::Text(s) => {
                let raw_text_parent = self.parent_node()
                    .and_then(|p| p.tag_name().map(|t| matches!(t, "script" | "style")))
                    .unwrap_or(false);
                if raw_text_parent {
                    out.push_str(&s.borrow())
                } else {
                    escape_text(out, &s.borrow())
                }
            }
            NodeData::Comment(s) => {
                out.push_str("<!--");
                out.push_str(&s.borrow());
                out.push_str("-->");
            }
            NodeData::Fragment | NodeData::ShadowRoot => self.print_children(out),
        }
    }

    fn print_children(&self, out: &mut String) {
        for child in self.0.children.borrow().iter() {
            child.print_html(out);
        }
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        self.print_children(&mut out);
        out
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.print_html(&mut out);
        out
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn div() -> Node {
        Node::new_element(Namespace::Html, "div", None)
    }

    #[test]
    fn t_tree_ops() {
        let root = div();
        let a = Node::new_text("a");
        let b = Node::new_text("b");
        let c = Node::new_text("c");
        root.append_child(&a).unwrap();
        root.append_child(&c).unwrap();
        root.insert_before(&b, Some(&c)).unwrap();
        assert_eq!(root.inner_html(), "abc");
        assert_eq!(a.next_sibling(), Some(b.clone()));
        assert_eq!(c.previous_sibling(), Some(b.clone()));
        assert!(a.previous_sibling().is_none());

        // moving within the same parent
        root.append_child(&a).unwrap();
        assert_eq!(root.inner_html(), "bca");
        c.after(&b).unwrap();
        assert_eq!(root.inner_html(), "cba");

        let d = Node::new_text("d");
        root.replace_child(&d, &b).unwrap();
        assert_eq!(root.inner_html(), "cda");
        assert!(b.parent_node().is_none());
        a.remove();
        assert_eq!(root.inner_html(), "cd");
        assert!(root.remove_child(&a).is_err());
    }

    #[test]
    fn t_fragment_insertion_empties_fragment() {
        let root = div();
        root.append_child(&Node::new_text("x")).unwrap();
        let frag = Node::new_fragment();
        let span = Node::new_element(Namespace::Html, "span", None);
        frag.append_child(&span).unwrap();
        frag.append_child(&Node::new_text("y")).unwrap();
        root.prepend_child(&frag).unwrap();
        assert_eq!(root.inner_html(), "<span></span>yx");
        assert!(frag.child_nodes().is_empty());
        assert_eq!(span.parent_node(), Some(root.clone()));
    }

    #[test]
    fn t_no_cycles() {
        let outer = div();
        let inner = div();
        outer.append_child(&inner).unwrap();
        assert!(inner.append_child(&outer).is_err());
        assert!(outer.append_child(&outer).is_err());
    }

    #[test]
    fn t_attributes_and_serialization() {
        let input = Node::new_element(Namespace::Html, "input", None);
        input.set_attribute("type", "text");
        input.set_attribute("value", "a\"b");
        assert_eq!(input.outer_html(), "<input type=\"text\" value=\"a&quot;b\">");
        input.set_attribute("type", "email");
        assert_eq!(input.attributes()[0].1, "email");
        input.remove_attribute("value");
        input.remove_attribute("value");
        assert_eq!(input.attribute_writes(), 4);
        let p = Node::new_element(Namespace::Html, "p", None);
        p.append_child(&Node::new_text("1 < 2")).unwrap();
        p.append_child(&Node::new_comment(" {{val0}} ")).unwrap();
        assert_eq!(p.outer_html(), "<p>1 &lt; 2<!-- {{val0}} --></p>");
    }

    #[test]
    fn t_class_and_style() {
        let b = Node::new_element(Namespace::Html, "button", None);
        b.class_list_add("btn");
        b.class_list_add("loading");
        b.class_list_add("btn");
        assert_eq!(b.get_attribute("class").unwrap(), "btn loading");
        b.class_list_remove("btn");
        b.class_list_remove("loading");
        assert!(!b.has_attribute("class"));

        b.set_attribute("style", "color:red");
        b.set_style_property("cursor", "pointer");
        assert_eq!(b.get_attribute("style").unwrap(), "color: red; cursor: pointer;");
        assert_eq!(b.style_property("cursor").unwrap(), "pointer");
        b.remove_style_property("color");
        b.remove_style_property("cursor");
        assert!(!b.has_attribute("style"));
    }

    #[test]
    fn t_native_property_reflects_attribute_until_set() {
        let input = Node::new_element(Namespace::Html, "input", None);
        assert!(input.has_property("value"));
        assert!(!div().has_property("value"));
        input.set_attribute("value", "a");
        assert_eq!(input.property("value"), Some(serde_json::json!("a")));
        input.set_property("value", serde_json::json!("typed")).unwrap();
        input.set_attribute("value", "b");
        assert_eq!(input.property("value"), Some(serde_json::json!("typed")));
    }

    #[test]
    fn t_clone_node() {
        let root = div();
        root.set_attribute("id", "r");
        let span = Node::new_element(Namespace::Html, "span", None);
        root.append_child(&span).unwrap();
        span.add_event_listener("click", Rc::new(|_: &Event| ()), Default::default());
        let copy = root.clone_node(true);
        assert_eq!(copy.outer_html(), "<div id=\"r\"><span></span></div>");
        let span2 = copy.first_child().unwrap();
        assert!(span2 != span);
        assert_eq!(span2.parent_node(), Some(copy.clone()));
        assert_eq!(span2.listener_count("click"), 0);
        assert_eq!(root.clone_node(false).inner_html(), "");
    }

    #[test]
    fn t_dispatch_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let outer = div();
        let inner = Node::new_element(Namespace::Html, "button", None);
        outer.append_child(&inner).unwrap();
        let push = |name: &'static str| -> EventListener {
            let log = log.clone();
            Rc::new(move |_: &Event| log.borrow_mut().push(name))
        };
        outer.add_event_listener("click", push("outer-capture"), true.into());
        outer.add_event_listener("click", push("outer-bubble"), false.into());
        inner.add_event_listener("click", push("inner"), ListenerOptions {
            once: true, ..Default::default()
        });
        inner.click();
        inner.click();
        assert_eq!(*log.borrow(), vec!["outer-capture", "inner", "outer-bubble",
                                       "outer-capture", "outer-bubble"]);
        inner.dispatch_event(&Event::new("click"));
        assert_eq!(log.borrow().len(), 6);
    }

    #[test]
    fn t_remove_listener_by_identity() {
        let count = Rc::new(Cell::new(0));
        let b = div();
        let c = count.clone();
        let l: EventListener = Rc::new(move |_: &Event| c.set(c.get() + 1));
        b.add_event_listener("click", l.clone(), Default::default());
        b.add_event_listener("click", l.clone(), Default::default());
        b.click();
        assert_eq!(count.get(), 1);
        b.remove_event_listener("click", &l, false);
        b.click();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn t_passive_cannot_prevent_default() {
        let b = div();
        b.add_event_listener("wheel", Rc::new(|e: &Event| e.prevent_default()),
                             ListenerOptions { passive: true, ..Default::default() });
        assert!(b.dispatch_event(&Event::new("wheel")));
        b.add_event_listener("submit", Rc::new(|e: &Event| e.prevent_default()),
                             Default::default());
        assert!(!b.dispatch_event(&Event::new("submit")));
    }
}

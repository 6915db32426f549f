//! Template instances: wiring a clone of a compiled template to its
//! values, and the mount/move/unmount lifecycle.

use std::{cell::RefCell, fmt, rc::Rc};
use adom::{Namespace, Node, Platform};
use anyhow::Result;
use chj_util::{warn, warn_if};
use kstring::KString;

use crate::{directive::{self, Binding, Directive, Part},
            error::MarkupError,
            placeholder::{self, RawPart},
            reactive_node::ReactiveNode,
            refs::{self, RefMap},
            state::{effect, Effect},
            template::{Slot, SlotValue, Template, SLOT_ID_ATTRIBUTE},
            trace::TRACE,
            value::Value};

#[allow(unused_imports)]
use chj_util::nodt as dt;

type Callback = Rc<dyn Fn()>;
type MountCallback = Rc<dyn Fn() -> Option<Callback>>;

/// Where `replace` and `insert_after` put an instance: next to a node
/// or next to another instance.
#[derive(Clone, Debug)]
pub enum Target {
    Node(Node),
    Html(Html),
}

impl From<Node> for Target {
    fn from(n: Node) -> Self { Target::Node(n) }
}
impl From<&Node> for Target {
    fn from(n: &Node) -> Self { Target::Node(n.clone()) }
}
impl From<Html> for Target {
    fn from(h: Html) -> Self { Target::Html(h) }
}
impl From<&Html> for Target {
    fn from(h: &Html) -> Self { Target::Html(h.clone()) }
}

#[derive(Clone)]
enum Mountable {
    Html(Html),
    Reactive(ReactiveNode),
}

impl Mountable {
    fn unmount(&self) {
        match self {
            Mountable::Html(h) => h.unmount(),
            Mountable::Reactive(r) => r.unmount(),
        }
    }
}

/// Everything one mount registered.
#[derive(Default)]
struct Wiring {
    bindings: Vec<Rc<Binding>>,
    effects: Vec<Effect>,
    mountables: Vec<Mountable>,
    refs: RefMap,
}

impl Wiring {
    fn teardown(self) {
        for e in &self.effects {
            e.unsubscribe();
        }
        for m in &self.mountables {
            m.unmount();
        }
        for b in &self.bindings {
            b.cleanup();
        }
    }
}

#[derive(Default)]
struct HtmlState {
    mounted: bool,
    wiring: Wiring,
    refs_cache: Option<(u64, RefMap)>,
}

#[derive(Default)]
struct Callbacks {
    mount: Option<MountCallback>,
    unmount: Option<Callback>,
    update: Option<Callback>,
    moved: Option<Callback>,
}

struct HtmlInner {
    platform: Rc<dyn Platform>,
    template: Rc<Template>,
    values: Vec<Value>,
    markers: [Node; 2],
    state: RefCell<HtmlState>,
    callbacks: RefCell<Callbacks>,
}

/// A template instance. Cloning yields another handle to the same
/// instance.
#[derive(Clone)]
pub struct Html(Rc<HtmlInner>);

#[derive(Clone, Copy, Debug)]
enum Action {
    Render { prepend: bool },
    Replace,
    InsertAfter,
}

fn check_target(action: &'static str, node: &Node) -> Result<()> {
    let unsupported = node.is_shadow_root()
        || (node.namespace() == Some(Namespace::Html)
            && matches!(node.tag_name(), Some("html" | "head" | "body")));
    if unsupported {
        Err(MarkupError::invalid_target_node(action, node.to_string()))
    } else {
        Ok(())
    }
}

impl Html {
    pub(crate) fn new(platform: Rc<dyn Platform>,
                      template: Rc<Template>,
                      values: Vec<Value>) -> Result<Html> {
        template.check_spreads(&values)?;
        let markers = [platform.create_text_node(""), platform.create_text_node("")];
        Ok(Html(Rc::new(HtmlInner {
            platform,
            template,
            values,
            markers,
            state: RefCell::new(HtmlState::default()),
            callbacks: RefCell::new(Callbacks::default()),
        })))
    }

    pub fn ptr_eq(a: &Html, b: &Html) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    // ------------------------------------------------------------------
    // Callbacks

    /// Called after every mount.
    pub fn on_mount(&self, f: impl Fn() + 'static) -> &Self {
        self.0.callbacks.borrow_mut().mount = Some(Rc::new(move || { f(); None }));
        self
    }

    /// Like `on_mount`, with the returned closure becoming the unmount
    /// callback.
    pub fn on_mount_with_cleanup<C: Fn() + 'static>(&self, f: impl Fn() -> C + 'static) -> &Self {
        self.0.callbacks.borrow_mut().mount =
            Some(Rc::new(move || Some(Rc::new(f()) as Callback)));
        self
    }

    pub fn on_unmount(&self, f: impl Fn() + 'static) -> &Self {
        self.0.callbacks.borrow_mut().unmount = Some(Rc::new(f));
        self
    }

    /// Called after `update` and after reactive content of this
    /// instance was rewritten.
    pub fn on_update(&self, f: impl Fn() + 'static) -> &Self {
        self.0.callbacks.borrow_mut().update = Some(Rc::new(f));
        self
    }

    /// Called when a mounted instance is moved to another parent
    /// (except into a document fragment).
    pub fn on_move(&self, f: impl Fn() + 'static) -> &Self {
        self.0.callbacks.borrow_mut().moved = Some(Rc::new(f));
        self
    }

    fn fire(&self, select: impl Fn(&Callbacks) -> Option<Callback>) {
        let cb = select(&*self.0.callbacks.borrow());
        if let Some(cb) = cb {
            cb();
        }
    }

    fn fire_mount(&self) {
        let cb = self.0.callbacks.borrow().mount.clone();
        if let Some(cb) = cb {
            if let Some(cleanup) = cb() {
                self.0.callbacks.borrow_mut().unmount = Some(cleanup);
            }
        }
    }

    // ------------------------------------------------------------------
    // Accessors

    pub fn is_connected(&self) -> bool {
        self.0.state.borrow().mounted
    }

    /// The node the instance is rendered into.
    pub fn parent_node(&self) -> Option<Node> {
        self.0.markers[0].parent_node()
    }

    /// The nodes between the two markers, in order.
    pub fn nodes(&self) -> Vec<Node> {
        let [start, end] = &self.0.markers;
        let mut nodes = Vec::new();
        if start.parent_node().is_none() {
            return nodes
        }
        let mut cur = start.next_sibling();
        while let Some(n) = cur {
            if Node::ptr_eq(&n, end) {
                break
            }
            cur = n.next_sibling();
            nodes.push(n);
        }
        nodes
    }

    /// The nodes including both markers.
    pub(crate) fn range_nodes(&self) -> Vec<Node> {
        let [start, end] = &self.0.markers;
        if start.parent_node().is_none() {
            return Vec::new()
        }
        let mut nodes = vec![start.clone()];
        nodes.extend(self.nodes());
        nodes.push(end.clone());
        nodes
    }

    /// Elements by `ref` name, from this instance and all currently
    /// mounted instances below it.
    pub fn refs(&self) -> RefMap {
        let generation = refs::generation();
        let (own, mountables) = {
            let state = self.0.state.borrow();
            if let Some((g, cached)) = &state.refs_cache {
                if *g == generation {
                    return cached.clone()
                }
            }
            (state.wiring.refs.clone(), state.wiring.mountables.clone())
        };
        let mut map = RefMap::new();
        for m in &mountables {
            match m {
                Mountable::Html(h) => if h.is_connected() {
                    refs::merge(&mut map, &h.refs())
                },
                Mountable::Reactive(r) => refs::merge(&mut map, &r.refs()),
            }
        }
        refs::merge(&mut map, &own);
        self.0.state.borrow_mut().refs_cache = Some((generation, map.clone()));
        map
    }

    // ------------------------------------------------------------------
    // Wiring

    fn wire(&self) -> Result<(Node, Wiring)> {
        dt!("wire");
        warn_if!(TRACE, "wiring template with {} slots", self.0.template.slots.len());
        let (fragment, anchors) = self.0.template.instantiate();
        let mut wiring = Wiring::default();
        for slot in &self.0.template.slots {
            let anchor = match anchors.get(&slot.anchor()) {
                Some(a) => a,
                None => continue
            };
            if let Err(e) = self.wire_slot(slot, anchor, &mut wiring) {
                wiring.teardown();
                return Err(e)
            }
        }
        Ok((fragment, wiring))
    }

    fn wire_slot(&self, slot: &Slot, anchor: &Node, wiring: &mut Wiring) -> Result<()> {
        let values = &self.0.values;
        match slot {
            Slot::Attribute { value, directive, .. } => {
                if anchor.has_attribute(SLOT_ID_ATTRIBUTE) {
                    anchor.remove_attribute(SLOT_ID_ATTRIBUTE);
                }
                let (raw, parts) = match value {
                    SlotValue::Raw(raw) => (raw.clone(), directive::parts_of(raw, values)),
                    SlotValue::Spread { index, key } => {
                        let v = match values.get(*index) {
                            Some(Value::Object(o)) => o.get(key).cloned().unwrap_or_default(),
                            _ => Value::Null,
                        };
                        (KString::from_string(placeholder::token(0)), vec![Part::Value(v)])
                    }
                };
                let binding = Rc::new(Binding::new(anchor.clone(), directive.clone(), &raw, parts));
                if *directive == Directive::Ref {
                    let name = binding.ref_name();
                    if !name.is_empty() {
                        refs::add(&mut wiring.refs, &name, anchor);
                    }
                } else if binding.is_dynamic() {
                    let b = binding.clone();
                    wiring.bindings.push(binding);
                    wiring.effects.push(effect(move || {
                        if let Err(e) = b.apply() {
                            warn!("attribute update failed: {e:#}");
                        }
                    }));
                } else {
                    wiring.bindings.push(binding.clone());
                    binding.apply()?;
                }
            }
            Slot::Content { raw, .. } => {
                let platform = &self.0.platform;
                let container = platform.create_document_fragment();
                for part in placeholder::split(raw, values.len()) {
                    match part {
                        RawPart::Text(t) =>
                            container.append_child(&platform.create_text_node(&t))?,
                        RawPart::Value(i) =>
                            self.wire_content(&values[i], &container, wiring)?,
                    }
                }
                if let Some(parent) = anchor.parent_node() {
                    parent.replace_child(&container, anchor)?;
                }
            }
        }
        Ok(())
    }

    fn wire_content(&self, value: &Value, container: &Node, wiring: &mut Wiring) -> Result<()> {
        let platform = &self.0.platform;
        match value {
            Value::Func(f) => {
                let rn = ReactiveNode::new(platform.clone(), f.clone(), container)?;
                let weak = Rc::downgrade(&self.0);
                rn.on_update(Rc::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        Html(inner).fire(|c| c.update.clone());
                    }
                }));
                wiring.mountables.push(Mountable::Reactive(rn));
            }
            Value::List(items) => for v in items.iter() {
                self.wire_content(v, container, wiring)?;
            },
            Value::Null => (),
            Value::Node(n) => container.append_child(n)?,
            Value::Html(h) => {
                h.render(container)?;
                wiring.mountables.push(Mountable::Html(h.clone()));
            }
            v => container.append_child(&platform.create_text_node(&v.to_string()))?,
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle

    fn mount(&self, action: Action, element: &Node) -> Result<()> {
        let (fragment, wiring) = self.wire()?;
        let [start, end] = &self.0.markers;
        let inserted = fragment.prepend_child(start)
            .and_then(|()| fragment.append_child(end))
            .and_then(|()| match action {
                Action::Render { prepend: false } => element.append_child(&fragment),
                Action::Render { prepend: true } =>
                    element.insert_before(&fragment, element.first_child().as_ref()),
                Action::Replace => match element.parent_node() {
                    Some(parent) => parent.replace_child(&fragment, element),
                    None => Ok(())
                },
                Action::InsertAfter => element.after(&fragment),
            });
        if let Err(e) = inserted {
            wiring.teardown();
            start.remove();
            end.remove();
            return Err(e)
        }
        {
            let mut state = self.0.state.borrow_mut();
            state.mounted = true;
            state.wiring = wiring;
            state.refs_cache = None;
        }
        refs::bump_generation();
        warn_if!(TRACE, "mounted ({action:?}) into {:?}", self.parent_node());
        self.fire_mount();
        Ok(())
    }

    /// The whole marker range, moved into a new fragment.
    fn take_range(&self) -> Result<Node> {
        let fragment = self.0.platform.create_document_fragment();
        for n in self.range_nodes() {
            fragment.append_child(&n)?;
        }
        Ok(fragment)
    }

    fn moved(&self, into_fragment: bool) {
        refs::bump_generation();
        if !into_fragment {
            self.fire(|c| c.moved.clone());
        }
    }

    /// Append the instance to `target`, wiring it if it is not mounted,
    /// or moving its nodes there if it is.
    pub fn render(&self, target: &Node) -> Result<()> {
        self.render_at(target, false)
    }

    /// Like `render`, but insert before the existing children.
    pub fn render_prepended(&self, target: &Node) -> Result<()> {
        self.render_at(target, true)
    }

    fn render_at(&self, target: &Node, prepend: bool) -> Result<()> {
        if self.parent_node().as_ref() == Some(target) || target.is_text() || target.is_comment() {
            return Ok(())
        }
        if self.is_connected() {
            let range = self.take_range()?;
            if prepend {
                target.insert_before(&range, target.first_child().as_ref())?;
            } else {
                target.append_child(&range)?;
            }
            self.moved(target.is_fragment());
            Ok(())
        } else {
            self.mount(Action::Render { prepend }, target)
        }
    }

    /// Put the instance in place of `target`. A target instance is
    /// unmounted. Targets without a parent are left alone.
    pub fn replace(&self, target: impl Into<Target>) -> Result<()> {
        let element = match target.into() {
            Target::Node(n) => {
                check_target("replace", &n)?;
                n
            }
            Target::Html(h) => {
                let placeholder = self.0.platform.create_text_node("");
                if let Some(parent) = h.parent_node() {
                    parent.insert_before(&placeholder, Some(&h.0.markers[0]))?;
                }
                h.unmount();
                placeholder
            }
        };
        let parent = match element.parent_node() {
            Some(p) => p,
            None => return Ok(())
        };
        if self.is_connected() {
            let range = self.take_range()?;
            parent.replace_child(&range, &element)?;
            self.moved(element.is_fragment());
            Ok(())
        } else {
            self.mount(Action::Replace, &element)
        }
    }

    /// Put the instance right after `target` (after the end marker of
    /// a target instance).
    pub fn insert_after(&self, target: impl Into<Target>) -> Result<()> {
        let element = match target.into() {
            Target::Node(n) => {
                check_target("insertAfter", &n)?;
                n
            }
            Target::Html(h) => h.0.markers[1].clone(),
        };
        if element.parent_node().is_none() {
            return Ok(())
        }
        if self.is_connected() {
            let already_there = element.next_sibling()
                .map(|n| Node::ptr_eq(&n, &self.0.markers[0]))
                .unwrap_or(false);
            if !already_there {
                let range = self.take_range()?;
                element.after(&range)?;
                self.moved(element.is_fragment());
            }
            Ok(())
        } else {
            self.mount(Action::InsertAfter, &element)
        }
    }

    /// Undo the mount: stop all effects, unmount child instances and
    /// reactive nodes, remove listeners and the whole marker range.
    /// Does nothing if not mounted.
    pub fn unmount(&self) {
        let wiring = {
            let mut state = self.0.state.borrow_mut();
            if !state.mounted {
                return
            }
            state.mounted = false;
            state.refs_cache = None;
            std::mem::take(&mut state.wiring)
        };
        wiring.teardown();
        for n in self.nodes() {
            n.remove();
        }
        self.0.markers[0].remove();
        self.0.markers[1].remove();
        refs::bump_generation();
        self.fire(|c| c.unmount.clone());
    }

    /// Re-evaluate all bindings and reactive content (unchanged values
    /// are not written) and fire the update callback.
    pub fn update(&self) -> Result<()> {
        let (bindings, mountables) = {
            let state = self.0.state.borrow();
            if !state.mounted {
                return Ok(())
            }
            (state.wiring.bindings.clone(), state.wiring.mountables.clone())
        };
        for b in &bindings {
            b.apply()?;
        }
        for m in &mountables {
            match m {
                Mountable::Reactive(r) => r.render()?,
                Mountable::Html(h) => h.update()?,
            }
        }
        self.fire(|c| c.update.clone());
        Ok(())
    }
}

impl fmt::Debug for Html {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Html")
            .field("connected", &self.is_connected())
            .field("nodes", &self.nodes())
            .finish()
    }
}

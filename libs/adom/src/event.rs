use std::{cell::{Cell, RefCell}, fmt, rc::Rc};
use kstring::KString;

use crate::node::Node;

pub type EventListener = Rc<dyn Fn(&Event)>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub once: bool,
    pub passive: bool,
}

impl From<bool> for ListenerOptions {
    /// A plain boolean selects the capture phase.
    fn from(capture: bool) -> Self {
        ListenerOptions { capture, ..Default::default() }
    }
}

pub(crate) struct RegisteredListener {
    pub event_type: KString,
    pub listener: EventListener,
    pub options: ListenerOptions,
    pub removed: Cell<bool>,
}

impl RegisteredListener {
    pub fn matches(&self, event_type: &str, listener: &EventListener, capture: bool) -> bool {
        self.event_type == event_type
            && same_listener(&self.listener, listener)
            && self.options.capture == capture
    }
}

pub fn same_listener(a: &EventListener, b: &EventListener) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const u8, Rc::as_ptr(b) as *const u8)
}


pub struct Event {
    event_type: KString,
    bubbles: bool,
    detail: serde_json::Value,
    target: RefCell<Option<Node>>,
    current_target: RefCell<Option<Node>>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
    in_passive_listener: Cell<bool>,
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("bubbles", &self.bubbles)
            .field("detail", &self.detail)
            .finish()
    }
}

impl Event {
    pub fn new(event_type: &str) -> Self {
        Event {
            event_type: KString::from_ref(event_type),
            bubbles: false,
            detail: serde_json::Value::Null,
            target: RefCell::new(None),
            current_target: RefCell::new(None),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
            in_passive_listener: Cell::new(false),
        }
    }

    pub fn bubbling(event_type: &str) -> Self {
        Event { bubbles: true, ..Event::new(event_type) }
    }

    pub fn with_detail(self, detail: serde_json::Value) -> Self {
        Event { detail, ..self }
    }

    pub fn event_type(&self) -> &str { &self.event_type }
    pub fn bubbles(&self) -> bool { self.bubbles }
    pub fn detail(&self) -> &serde_json::Value { &self.detail }

    pub fn target(&self) -> Option<Node> {
        self.target.borrow().clone()
    }

    pub fn current_target(&self) -> Option<Node> {
        self.current_target.borrow().clone()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true)
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Ignored while a passive listener runs.
    pub fn prevent_default(&self) {
        if !self.in_passive_listener.get() {
            self.default_prevented.set(true)
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn set_target(&self, node: &Node) {
        *self.target.borrow_mut() = Some(node.clone());
    }

    pub(crate) fn set_current_target(&self, node: Option<&Node>) {
        *self.current_target.borrow_mut() = node.cloned();
    }

    pub(crate) fn set_in_passive_listener(&self, on: bool) {
        self.in_passive_listener.set(on)
    }
}

//! A dynamic content slot bound to the reactive system, re-rendering
//! only the range between its own two markers.

use std::{cell::RefCell, fmt, rc::Rc};
use adom::{Node, Platform};
use anyhow::Result;
use chj_util::{warn, warn_if};

use crate::{content::{self, Rendered},
            html::Html,
            refs::{self, RefMap},
            state::{effect, Effect},
            trace::TRACE,
            value::Func};

#[derive(Default)]
struct ReactiveState {
    rendered: Vec<Rendered>,
    /// Templates rendered earlier but not currently, kept mounted in
    /// the holding fragment.
    parked: Vec<Html>,
    effect: Option<Effect>,
    renders: usize,
}

struct ReactiveInner {
    platform: Rc<dyn Platform>,
    producer: Func,
    markers: [Node; 2],
    holding: Node,
    state: RefCell<ReactiveState>,
    on_update: RefCell<Option<Rc<dyn Fn()>>>,
}

#[derive(Clone)]
pub struct ReactiveNode(Rc<ReactiveInner>);

impl fmt::Debug for ReactiveNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveNode")
            .field("rendered", &self.0.state.borrow().rendered)
            .finish()
    }
}

impl ReactiveNode {
    /// Append the markers to `parent` and render `producer`'s value
    /// between them, again whenever state it read changes.
    pub fn new(platform: Rc<dyn Platform>, producer: Func, parent: &Node) -> Result<ReactiveNode> {
        let markers = [platform.create_text_node(""), platform.create_text_node("")];
        let holding = platform.create_document_fragment();
        parent.append_child(&markers[0])?;
        parent.append_child(&markers[1])?;
        let node = ReactiveNode(Rc::new(ReactiveInner {
            platform,
            producer,
            markers,
            holding,
            state: RefCell::new(ReactiveState::default()),
            on_update: RefCell::new(None),
        }));

        let first_error: Rc<RefCell<Option<anyhow::Error>>> = Rc::new(RefCell::new(None));
        let weak = Rc::downgrade(&node.0);
        let fe = first_error.clone();
        let mut first = true;
        let e = effect(move || {
            if let Some(inner) = weak.upgrade() {
                if let Err(e) = ReactiveNode(inner).render() {
                    if first {
                        *fe.borrow_mut() = Some(e);
                    } else {
                        warn!("reactive content update failed: {e:#}");
                    }
                }
            }
            first = false;
        });
        node.0.state.borrow_mut().effect = Some(e);
        let error = first_error.borrow_mut().take();
        if let Some(e) = error {
            node.unmount();
            return Err(e)
        }
        Ok(node)
    }

    pub fn on_update(&self, f: Rc<dyn Fn()>) {
        *self.0.on_update.borrow_mut() = Some(f);
    }

    /// Re-evaluate the producer and rewrite the range if the rendered
    /// entries differ from the current ones.
    pub fn render(&self) -> Result<()> {
        let inner = &self.0;
        let value = (inner.producer)();
        let mut flat = Vec::new();
        content::flatten(&value, &mut flat);
        let previous = inner.state.borrow().rendered.clone();
        let rendered = content::materialize(&*inner.platform, flat, &previous, &inner.holding)?;
        if content::same_list(&rendered, &previous) {
            return Ok(())
        }
        warn_if!(TRACE, "reactive node rewrite: {} -> {} entries",
                 previous.len(), rendered.len());
        content::reconcile(&inner.markers[0], &inner.markers[1],
                           &rendered, &previous, &inner.holding)?;
        let renders = {
            let mut state = inner.state.borrow_mut();
            for old in previous.iter().filter_map(Rendered::template) {
                let still = rendered.iter().filter_map(Rendered::template)
                    .any(|h| Html::ptr_eq(h, old));
                if !still && old.is_connected()
                    && !state.parked.iter().any(|p| Html::ptr_eq(p, old))
                {
                    state.parked.push(old.clone());
                }
            }
            state.parked.retain(|p| {
                p.is_connected()
                    && !rendered.iter().filter_map(Rendered::template).any(|h| Html::ptr_eq(h, p))
            });
            state.rendered = rendered;
            state.renders += 1;
            state.renders
        };
        refs::bump_generation();
        if renders > 1 {
            let cb = inner.on_update.borrow().clone();
            if let Some(cb) = cb {
                cb();
            }
        }
        Ok(())
    }

    /// Refs of the templates currently rendered here.
    pub fn refs(&self) -> RefMap {
        let rendered = self.0.state.borrow().rendered.clone();
        let mut map = RefMap::new();
        for h in rendered.iter().filter_map(Rendered::template) {
            refs::merge(&mut map, &h.refs());
        }
        map
    }

    /// Stop reacting, unmount all templates rendered here (including
    /// parked ones) and remove the range with its markers.
    pub fn unmount(&self) {
        let inner = &self.0;
        let (effect, rendered, parked) = {
            let mut state = inner.state.borrow_mut();
            (state.effect.take(),
             std::mem::take(&mut state.rendered),
             std::mem::take(&mut state.parked))
        };
        if let Some(e) = effect {
            e.unsubscribe();
        }
        for h in rendered.iter().filter_map(Rendered::template).chain(parked.iter()) {
            h.unmount();
        }
        let [start, end] = &inner.markers;
        let mut cur = start.next_sibling();
        while let Some(n) = cur {
            if Node::ptr_eq(&n, end) {
                break
            }
            cur = n.next_sibling();
            n.remove();
        }
        start.remove();
        end.remove();
        refs::bump_generation();
    }
}

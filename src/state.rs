//! A minimal synchronous reactive primitive: `state` cells and
//! `effect`s that re-run when a state they read last time changes.
//!
//! States hold their subscribers weakly; an effect lives as long as
//! its `Effect` handle (or a clone of it) does.

use std::{cell::{Cell, RefCell},
          rc::{Rc, Weak}};

thread_local! {
    // The innermost running effect; `None` entries come from `untracked`.
    static OBSERVERS: RefCell<Vec<Option<Rc<EffectInner>>>> = RefCell::new(Vec::new());
}

trait Source {
    fn remove_subscriber(&self, effect: &Rc<EffectInner>);
}

struct StateInner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Weak<EffectInner>>>,
}

impl<T> Source for StateInner<T> {
    fn remove_subscriber(&self, effect: &Rc<EffectInner>) {
        self.subscribers.borrow_mut().retain(|w| {
            w.upgrade().map(|e| !Rc::ptr_eq(&e, effect)).unwrap_or(false)
        });
    }
}

impl<T: 'static> StateInner<T> {
    fn track(self: &Rc<Self>) {
        let current = OBSERVERS.with(|o| o.borrow().last().cloned().flatten());
        if let Some(effect) = current {
            let mut subs = self.subscribers.borrow_mut();
            if !subs.iter().any(|w| w.as_ptr() == Rc::as_ptr(&effect)) {
                subs.push(Rc::downgrade(&effect));
                let source: Rc<dyn Source> = self.clone();
                effect.sources.borrow_mut().push(Rc::downgrade(&source));
            }
        }
    }

    fn notify(&self) {
        let live: Vec<Rc<EffectInner>> = {
            let mut subs = self.subscribers.borrow_mut();
            subs.retain(|w| w.strong_count() > 0);
            subs.iter().filter_map(Weak::upgrade).collect()
        };
        for effect in live {
            effect.run();
        }
    }
}

/// Read side of a state cell.
pub struct Getter<T>(Rc<StateInner<T>>);

/// Write side of a state cell.
pub struct Setter<T>(Rc<StateInner<T>>);

impl<T> Clone for Getter<T> {
    fn clone(&self) -> Self { Getter(self.0.clone()) }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self { Setter(self.0.clone()) }
}

impl<T: Clone + 'static> Getter<T> {
    /// Current value; subscribes the running effect, if any.
    pub fn get(&self) -> T {
        self.0.track();
        self.0.value.borrow().clone()
    }
}

impl<T: 'static> Getter<T> {
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.track();
        f(&self.0.value.borrow())
    }
}

impl<T: 'static> Setter<T> {
    /// Store `value` and synchronously re-run every subscribed effect.
    pub fn set(&self, value: T) {
        *self.0.value.borrow_mut() = value;
        self.0.notify();
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.0.value.borrow_mut());
        self.0.notify();
    }
}

pub fn state<T: 'static>(initial: T) -> (Getter<T>, Setter<T>) {
    let inner = Rc::new(StateInner {
        value: RefCell::new(initial),
        subscribers: RefCell::new(Vec::new()),
    });
    (Getter(inner.clone()), Setter(inner))
}


struct EffectInner {
    f: RefCell<Option<Box<dyn FnMut()>>>,
    sources: RefCell<Vec<Weak<dyn Source>>>,
    active: Cell<bool>,
    running: Cell<bool>,
    pending: Cell<bool>,
}

impl EffectInner {
    fn clear_sources(self: &Rc<Self>) {
        let sources: Vec<Weak<dyn Source>> = self.sources.borrow_mut().drain(..).collect();
        for s in sources {
            if let Some(s) = s.upgrade() {
                s.remove_subscriber(self);
            }
        }
    }

    /// A notification arriving while the effect runs is deferred to
    /// one more run right after the current one.
    fn run(self: &Rc<Self>) {
        if !self.active.get() {
            return
        }
        if self.running.get() {
            self.pending.set(true);
            return
        }
        self.running.set(true);
        loop {
            self.pending.set(false);
            self.clear_sources();
            let f = self.f.borrow_mut().take();
            if let Some(mut f) = f {
                OBSERVERS.with(|o| o.borrow_mut().push(Some(self.clone())));
                f();
                OBSERVERS.with(|o| o.borrow_mut().pop());
                if self.active.get() {
                    *self.f.borrow_mut() = Some(f);
                }
            }
            if !(self.pending.get() && self.active.get()) {
                break
            }
        }
        self.running.set(false);
    }
}

/// Handle of a running effect. Dropping the last handle ends the
/// subscription, as does `unsubscribe`.
#[derive(Clone)]
pub struct Effect(Rc<EffectInner>);

impl Effect {
    pub fn unsubscribe(&self) {
        if self.0.active.replace(false) {
            self.0.clear_sources();
            if !self.0.running.get() {
                self.0.f.borrow_mut().take();
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.0.active.get()
    }
}

/// Run `f` now and again whenever a state it read changes.
pub fn effect(f: impl FnMut() + 'static) -> Effect {
    let inner = Rc::new(EffectInner {
        f: RefCell::new(Some(Box::new(f))),
        sources: RefCell::new(Vec::new()),
        active: Cell::new(true),
        running: Cell::new(false),
        pending: Cell::new(false),
    });
    inner.run();
    Effect(inner)
}

/// Run `f` without subscribing the currently running effect to the
/// states `f` reads.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    OBSERVERS.with(|o| o.borrow_mut().push(None));
    let r = f();
    OBSERVERS.with(|o| o.borrow_mut().pop());
    r
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_effect_reruns_on_change() {
        let (count, set_count) = state(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let c = count.clone();
        let e = effect(move || s.borrow_mut().push(c.get()));
        set_count.set(2);
        set_count.set(2);
        assert_eq!(*seen.borrow(), vec![1, 2, 2]);
        e.unsubscribe();
        e.unsubscribe();
        set_count.set(3);
        assert_eq!(seen.borrow().len(), 3);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn t_dropping_handle_ends_effect() {
        let (count, set_count) = state(0);
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let e = effect(move || { count.get(); r.set(r.get() + 1); });
        drop(e);
        set_count.set(1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn t_untracked_reads_do_not_subscribe() {
        let (a, set_a) = state(0);
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let _e = effect(move || { untracked(|| a.get()); r.set(r.get() + 1); });
        set_a.set(1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn t_dependencies_follow_last_run() {
        let (flag, set_flag) = state(true);
        let (a, set_a) = state(0);
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let _e = effect(move || {
            r.set(r.get() + 1);
            if flag.get() {
                a.get();
            }
        });
        set_a.set(1);
        assert_eq!(runs.get(), 2);
        set_flag.set(false);
        assert_eq!(runs.get(), 3);
        set_a.set(2);
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn t_reentrant_set_defers_one_run() {
        let (n, set_n) = state(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let set = set_n.clone();
        let _e = effect(move || {
            let v = n.get();
            s.borrow_mut().push(v);
            if v < 2 {
                set.set(v + 1);
            }
        });
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn t_multiple_subscribers() {
        let (n, set_n) = state(0);
        let total = Rc::new(Cell::new(0));
        let effects: Vec<Effect> = (0..3).map(|_| {
            let n = n.clone();
            let t = total.clone();
            effect(move || t.set(t.get() + n.get()))
        }).collect();
        set_n.set(1);
        assert_eq!(total.get(), 3);
        assert_eq!(effects.len(), 3);
    }
}

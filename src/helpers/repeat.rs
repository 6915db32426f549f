use std::{cell::RefCell, rc::Rc};
use kstring::KString;

use crate::{html::Html, state::{untracked, Getter}, value::Value};

/// Identity of list items for reusing their rendered output: equality
/// for plain values, pointer identity for `Rc`s.
pub trait RepeatItem: Clone + 'static {
    fn same_item(&self, other: &Self) -> bool;
}

macro_rules! repeat_item_by_eq {
    ($($t:ty)*) => {
        $(
            impl RepeatItem for $t {
                fn same_item(&self, other: &Self) -> bool { self == other }
            }
        )*
    }
}
repeat_item_by_eq!(bool char i8 i16 i32 i64 u8 u16 u32 u64 usize isize
                   String KString &'static str);

impl<T: ?Sized + 'static> RepeatItem for Rc<T> {
    fn same_item(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl RepeatItem for Value {
    fn same_item(&self, other: &Self) -> bool {
        self.same(other)
    }
}

/// Where `repeat` takes its items from.
pub enum RepeatSource<T> {
    Static(Rc<Vec<T>>),
    Func(Rc<dyn Fn() -> Vec<T>>),
}

impl<T: 'static> RepeatSource<T> {
    pub fn func(f: impl Fn() -> Vec<T> + 'static) -> Self {
        RepeatSource::Func(Rc::new(f))
    }

    fn items(&self) -> Vec<T> where T: Clone {
        match self {
            RepeatSource::Static(v) => (**v).clone(),
            RepeatSource::Func(f) => f(),
        }
    }
}

impl<T> From<Vec<T>> for RepeatSource<T> {
    fn from(v: Vec<T>) -> Self {
        RepeatSource::Static(Rc::new(v))
    }
}

/// A count `n` repeats over `1..=n`.
impl From<usize> for RepeatSource<usize> {
    fn from(n: usize) -> Self {
        RepeatSource::Static(Rc::new((1..=n).collect()))
    }
}

impl<T: Clone + 'static> From<Getter<Vec<T>>> for RepeatSource<T> {
    fn from(g: Getter<Vec<T>>) -> Self {
        RepeatSource::func(move || g.get())
    }
}

impl<T: Clone + 'static> From<&Getter<Vec<T>>> for RepeatSource<T> {
    fn from(g: &Getter<Vec<T>>) -> Self {
        g.clone().into()
    }
}

impl From<Getter<usize>> for RepeatSource<usize> {
    fn from(g: Getter<usize>) -> Self {
        RepeatSource::func(move || (1..=g.get()).collect())
    }
}

/// Content rendering `render` for every item of `source`. The output
/// for an item is kept as long as the item stays in the list, so its
/// DOM is reused; equal items share one output. A template output is
/// unmounted once its item leaves the list.
pub fn repeat<T, F>(source: impl Into<RepeatSource<T>>, render: F) -> Value
where
    T: RepeatItem,
    F: Fn(&T, usize) -> Value + 'static,
{
    let source = source.into();
    let cache: RefCell<Vec<(T, Value)>> = RefCell::new(Vec::new());
    Value::func(move || {
        let items = source.items();
        let mut previous = cache.borrow_mut();
        let mut next: Vec<(T, Value)> = Vec::with_capacity(items.len());
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let known = next.iter().chain(previous.iter())
                .find(|(t, _)| t.same_item(&item))
                .map(|(_, v)| v.clone());
            let v = match known {
                Some(v) => v,
                None => render(&item, i),
            };
            if !next.iter().any(|(t, _)| t.same_item(&item)) {
                next.push((item, v.clone()));
            }
            out.push(v);
        }
        let evicted: Vec<Html> = std::mem::replace(&mut *previous, next).into_iter()
            .filter_map(|(_, v)| match v {
                Value::Html(h) if !out.iter().any(|o| matches!(o, Value::Html(x) if Html::ptr_eq(x, &h)))
                    => Some(h),
                _ => None
            })
            .collect();
        drop(previous);
        untracked(|| for h in &evicted {
            h.unmount();
        });
        Value::list(out)
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state;

    fn texts(v: &Value) -> Vec<String> {
        match v.resolve() {
            Value::List(l) => l.iter().map(|v| v.to_string()).collect(),
            v => panic!("not a list: {v:?}"),
        }
    }

    #[test]
    fn t_count_and_static() {
        assert_eq!(texts(&repeat(3usize, |n: &usize, _| Value::from(*n))), vec!["1", "2", "3"]);
        assert_eq!(texts(&repeat(vec!["a", "b"], |s, i| format!("{i}:{s}").into())),
                   vec!["0:a", "1:b"]);
    }

    #[test]
    fn t_reuses_output_per_item() {
        struct Item { name: &'static str }
        let one = Rc::new(Item { name: "one" });
        let two = Rc::new(Item { name: "two" });
        let (items, set_items) = state(vec![one.clone(), two.clone()]);
        let calls = Rc::new(std::cell::Cell::new(0));
        let c = calls.clone();
        let r = repeat(items, move |item: &Rc<Item>, _| {
            c.set(c.get() + 1);
            Value::list([item.name])
        });
        let first = r.resolve();
        assert_eq!(calls.get(), 2);
        set_items.set(vec![Rc::new(Item { name: "first" }), two.clone()]);
        let second = r.resolve();
        assert_eq!(calls.get(), 3);
        let (Value::List(a), Value::List(b)) = (first, second) else { panic!() };
        assert!(!a[0].same(&b[0]));
        assert!(a[1].same(&b[1]));
    }

    #[test]
    fn t_duplicates_share_output() {
        let r = repeat(vec![1, 3, 5, 3], |n, _| Value::list([*n]));
        let Value::List(l) = r.resolve() else { panic!() };
        assert_eq!(l.len(), 4);
        assert!(l[1].same(&l[3]));
        assert!(!l[0].same(&l[1]));
    }
}

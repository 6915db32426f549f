use std::cell::RefCell;

use crate::value::Value;

/// Content switching between two values on the truthiness of
/// `condition`. The branch values are kept, so toggling back renders
/// the very same instance again.
pub fn when(condition: impl Into<Value>,
            truthy: impl Into<Value>,
            falsy: impl Into<Value>) -> Value {
    let (condition, truthy, falsy) = (condition.into(), truthy.into(), falsy.into());
    Value::func(move || {
        if condition.resolve().is_truthy() {
            truthy.clone()
        } else {
            falsy.clone()
        }
    })
}

fn lazy(make: impl Fn() -> Value + 'static) -> impl Fn() -> Value {
    let cell: RefCell<Option<Value>> = RefCell::new(None);
    move || {
        let cached = cell.borrow().clone();
        match cached {
            Some(v) => v,
            None => {
                let v = make();
                *cell.borrow_mut() = Some(v.clone());
                v
            }
        }
    }
}

/// Like `when`, but the branches are only constructed on first use,
/// each at most once.
pub fn when_with(condition: impl Into<Value>,
                 truthy: impl Fn() -> Value + 'static,
                 falsy: impl Fn() -> Value + 'static) -> Value {
    let condition = condition.into();
    let (truthy, falsy) = (lazy(truthy), lazy(falsy));
    Value::func(move || {
        if condition.resolve().is_truthy() {
            truthy()
        } else {
            falsy()
        }
    })
}

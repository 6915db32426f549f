use crate::value::Value;

/// Accessor telling whether `value` equals `expected`; both may be
/// accessors themselves.
pub fn is(value: impl Into<Value>, expected: impl Into<Value>) -> Value {
    let (value, expected) = (value.into(), expected.into());
    Value::func(move || Value::Bool(value.resolve().equals(&expected.resolve())))
}

/// Accessor telling whether `value` equals one of `options`.
pub fn one_of<T: Into<Value>>(value: impl Into<Value>, options: impl IntoIterator<Item = T>) -> Value {
    let value = value.into();
    let options: Vec<Value> = options.into_iter().map(Into::into).collect();
    Value::func(move || {
        let v = value.resolve();
        Value::Bool(options.iter().any(|o| o.equals(&v)))
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state;

    #[test]
    fn t_is() {
        assert!(is(Value::func(|| true.into()), true).resolve().is_truthy());
        assert!(!is(Value::func(|| true.into()), Value::func(|| false.into())).resolve().is_truthy());
        let (n, set_n) = state(1);
        let c = is(&n, 1.0);
        assert!(c.resolve().is_truthy());
        set_n.set(2);
        assert!(!c.resolve().is_truthy());
    }

    #[test]
    fn t_one_of() {
        let (s, set_s) = state("draft".to_string());
        let c = one_of(&s, ["draft", "review"]);
        assert!(c.resolve().is_truthy());
        set_s.set("done".into());
        assert!(!c.resolve().is_truthy());
    }
}

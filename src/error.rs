//! Error types of the templating engine.

use kstring::KString;

/// Define an error type wrapper e.g. `Foo` around a
/// `Box<FooKind>`. Implements the `std::error::Error`,
/// `std::ops::Deref` and `From` traits on `Foo` to make the
/// underlying `FooKind` transparently accessible. Keeps `Foo` one
/// word wide so that `Result<T, Foo>` stays small.
#[macro_export]
macro_rules! def_boxed_error {
    ($wrappername:ident, $kindname:ident) => {

        #[derive(Debug)]
        pub struct $wrappername(Box<$kindname>);

        impl std::ops::Deref for $wrappername {
            type Target = $kindname;

            fn deref(&self) -> &Self::Target {
                &*self.0
            }
        }

        impl<E> From<E> for $wrappername where $kindname: From<E> {
            fn from(err: E) -> Self {
                $wrappername(Box::new($kindname::from(err)))
            }
        }

        impl std::error::Error for $wrappername {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                self.0.source()
            }
        }

        impl std::fmt::Display for $wrappername {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&*self.0, f)
            }
        }
    }
}

/// Defines both an error type and its box wrapper as per
/// `def_boxed_error`, deriving `thiserror::Error` on the inner type.
#[macro_export]
macro_rules! def_boxed_thiserror {
    ($wrappername:ident, $key1:tt $kindname:ident {$($body:tt)*}) => {
        $crate::_def_boxed_thiserror!($wrappername, $kindname, $key1 $kindname {
            $($body)*
        });
    };
    ($wrappername:ident, $key1:tt $key2:tt $kindname:ident {$($body:tt)*}) => {
        $crate::_def_boxed_thiserror!($wrappername, $kindname, $key1 $key2 $kindname {
            $($body)*
        });
    };
}

#[macro_export]
macro_rules! _def_boxed_thiserror {
    (
        $wrappername:ident,
        $kindname:ident,
        $($innerdef:tt)*
    ) => {
        #[derive(thiserror::Error, Debug)]
        $($innerdef)*

        $crate::def_boxed_error!($wrappername, $kindname);
    }
}


def_boxed_thiserror!(MarkupError, pub enum MarkupErrorKind {
    #[error("Handler for event \"{event}\" is not a function. Found \"{value}\".")]
    InvalidHandler { event: KString, value: String },
    #[error("Invalid attribute object provided: {value}")]
    InvalidAttributeObject { value: String },
    #[error("Invalid \"{action}\" target element. Received {target}")]
    InvalidTargetNode { action: &'static str, target: String },
});

impl MarkupError {
    pub fn invalid_handler(event: &str, value: String) -> anyhow::Error {
        MarkupError::from(MarkupErrorKind::InvalidHandler {
            event: KString::from_ref(event),
            value
        }).into()
    }

    pub fn invalid_attribute_object(value: String) -> anyhow::Error {
        MarkupError::from(MarkupErrorKind::InvalidAttributeObject { value }).into()
    }

    pub fn invalid_target_node(action: &'static str, target: String) -> anyhow::Error {
        MarkupError::from(MarkupErrorKind::InvalidTargetNode { action, target }).into()
    }
}

/// The `MarkupErrorKind` carried by `e`, if any.
pub fn markup_error_kind(e: &anyhow::Error) -> Option<&MarkupErrorKind> {
    e.downcast_ref::<MarkupError>().map(|e| &**e)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_messages() {
        let e = MarkupError::invalid_handler("click", "12".into());
        assert_eq!(e.to_string(), "Handler for event \"click\" is not a function. Found \"12\".");
        assert!(matches!(markup_error_kind(&e), Some(MarkupErrorKind::InvalidHandler { .. })));
        let e = MarkupError::invalid_target_node("replace", "[object ShadowRoot]".into());
        assert_eq!(e.to_string(),
                   "Invalid \"replace\" target element. Received [object ShadowRoot]");
        assert_eq!(MarkupError::invalid_attribute_object("12".into()).to_string(),
                   "Invalid attribute object provided: 12");
        assert!(markup_error_kind(&anyhow::anyhow!("other")).is_none());
    }
}

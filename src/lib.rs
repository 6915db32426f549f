//! Fine-grained reactive templating: markup with interpolated values is
//! compiled once per template shape, cloned per instance and wired so
//! that state changes rewrite only the affected attributes and ranges.

/// Tagged-template form of `Markup::html`: literal segments alternate
/// with value expressions, e.g.
/// `html!(m, "<p class=\"", cls, "\">", body, "</p>")`.
#[macro_export]
macro_rules! html {
    ($markup:expr, $first:literal $(, $value:expr, $segment:literal)*) => {
        $markup.html(&[$first $(, $segment)*], vec![$($crate::Value::from($value)),*])
    };
}

pub mod error;
pub mod trace;
pub mod value;
pub mod state;
pub mod placeholder;
pub mod directive;
pub mod template;
pub mod refs;
pub mod content;
pub mod reactive_node;
pub mod html;
pub mod engine;
pub mod helpers;

pub use adom;

pub use error::{MarkupError, MarkupErrorKind, markup_error_kind};
pub use value::{Value, Func};
pub use state::{state, effect, untracked, Getter, Setter, Effect};
pub use template::TemplateCache;
pub use refs::RefMap;
pub use html::{Html, Target};
pub use engine::Markup;
pub use helpers::{repeat, when, when_with, is, one_of, RepeatItem, RepeatSource};

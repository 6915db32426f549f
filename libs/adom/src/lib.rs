//! A live DOM: reference counted, mutable nodes with attributes,
//! properties and event listeners, a document with a custom element
//! registry, and a markup parser driving a pluggable tree builder.

pub mod style;
pub mod event;
pub mod node;
pub mod document;
pub mod parse;

pub use event::{Event, EventListener, ListenerOptions};
pub use node::{Node, NodeKind};
pub use document::{Document, Platform, CustomElementDefinition, PropertyDescriptor,
                   AttributeChangedCallback};
pub use parse::{parse, parse_fragment, TreeBuilder, DomBuilder};

use lazy_static::lazy_static;
use ahtml_html::meta::{MetaDb, read_meta_db};
use strum_macros::{EnumString, AsRefStr};

lazy_static!{
    pub static ref METADB: MetaDb = read_meta_db().unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
pub enum Namespace {
    #[strum(serialize = "http://www.w3.org/1999/xhtml")]
    Html,
    #[strum(serialize = "http://www.w3.org/2000/svg")]
    Svg,
    #[strum(serialize = "http://www.w3.org/1998/Math/MathML")]
    MathMl,
}

impl Namespace {
    pub fn uri(self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }
}


fn escape_into(out: &mut String, s: &str, attribute: bool) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{A0}' => out.push_str("&nbsp;"),
            _ => out.push(c)
        }
    }
}

/// Escape text content the way `innerHTML` serializes it.
pub fn escape_text(out: &mut String, s: &str) {
    escape_into(out, s, false)
}

/// Escape a double-quoted attribute value.
pub fn escape_attribute(out: &mut String, s: &str) {
    escape_into(out, s, true)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn t_escape() {
        let mut s = String::new();
        escape_text(&mut s, "a < b & \"c\"");
        assert_eq!(s, "a &lt; b &amp; \"c\"");
        let mut s = String::new();
        escape_attribute(&mut s, "x=\"<y>\"");
        assert_eq!(s, "x=&quot;<y>&quot;");
    }

    #[test]
    fn t_namespace() {
        assert_eq!(Namespace::from_str("http://www.w3.org/2000/svg").unwrap(),
                   Namespace::Svg);
        assert_eq!(Namespace::MathMl.as_ref(), Namespace::MathMl.uri());
    }
}

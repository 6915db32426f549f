//! Markup to node tree, via the html5gum tokenizer. Node creation and
//! linking go through a `TreeBuilder` so that callers can inspect or
//! redirect every step.

use anyhow::Result;
use html5gum::{Token, HtmlString};
use kstring::KString;
use chj_util::warn;

use crate::{Namespace, METADB, node::Node, document::Platform};

#[allow(unused_imports)]
use chj_util::nodt as dt;

pub trait TreeBuilder {
    fn create_element_ns(&mut self, namespace: Namespace, tag_name: &str) -> Result<Node>;
    fn create_text_node(&mut self, text: &str) -> Result<Node>;
    fn create_comment(&mut self, text: &str) -> Result<Node>;
    fn create_document_fragment(&mut self) -> Result<Node>;

    fn set_attribute(&mut self, element: &Node, name: &str, value: &str) -> Result<()> {
        element.set_attribute(name, value);
        Ok(())
    }

    fn append_child(&mut self, parent: &Node, child: Node) -> Result<()> {
        parent.append_child(&child)
    }
}

/// Builds plain nodes from a `Platform`.
pub struct DomBuilder<'p> {
    pub platform: &'p dyn Platform,
}

impl<'p> TreeBuilder for DomBuilder<'p> {
    fn create_element_ns(&mut self, namespace: Namespace, tag_name: &str) -> Result<Node> {
        Ok(self.platform.create_element_ns(namespace, tag_name))
    }
    fn create_text_node(&mut self, text: &str) -> Result<Node> {
        Ok(self.platform.create_text_node(text))
    }
    fn create_comment(&mut self, text: &str) -> Result<Node> {
        Ok(self.platform.create_comment(text))
    }
    fn create_document_fragment(&mut self) -> Result<Node> {
        Ok(self.platform.create_document_fragment())
    }
}


fn string(s: HtmlString) -> Result<String> {
    Ok(String::from_utf8(s.0)?)
}

struct Frame {
    node: Node,
    tag_name: KString,
    namespace: Namespace,
}

/// Parse `markup` into a new document fragment.
pub fn parse(markup: &str, builder: &mut impl TreeBuilder) -> Result<Node> {
    dt!("parse", markup);
    let root = builder.create_document_fragment()?;
    let mut context: Vec<Frame> = Vec::new();
    let mut text = String::new();

    macro_rules! current_parent {
        () => {
            context.last().map(|f| f.node.clone()).unwrap_or_else(|| root.clone())
        }
    }
    macro_rules! flush_text {
        () => {
            if !text.is_empty() {
                let node = builder.create_text_node(&text)?;
                builder.append_child(&current_parent!(), node)?;
                text.clear();
            }
        }
    }

    for token in html5gum::Tokenizer::new(markup).infallible() {
        match token {
            Token::StartTag(starttag) => {
                flush_text!();
                let name = string(starttag.name)?;
                let namespace = match &*name {
                    "svg" => Namespace::Svg,
                    "math" => Namespace::MathMl,
                    _ => context.last().map(|f| f.namespace).unwrap_or(Namespace::Html),
                };
                let element = builder.create_element_ns(namespace, &name)?;
                for (k, v) in starttag.attributes {
                    let (k, v) = (string(k)?, string(v)?);
                    builder.set_attribute(&element, &k, &v)?;
                }
                builder.append_child(&current_parent!(), element.clone())?;
                let is_void = namespace == Namespace::Html && !METADB.has_closing_tag(&name);
                if !(starttag.self_closing || is_void) {
                    context.push(Frame {
                        node: element,
                        tag_name: KString::from_string(name),
                        namespace
                    });
                }
            }
            Token::EndTag(endtag) => {
                flush_text!();
                let name = string(endtag.name)?;
                if let Some(i) = context.iter().rposition(|f| f.tag_name == name) {
                    context.truncate(i);
                } else if namespace_of(&context) != Namespace::Html
                    || METADB.has_closing_tag(&name)
                {
                    warn!("ignoring unmatched end tag </{name}>");
                }
            }
            Token::String(s) => {
                text.push_str(&string(s)?);
            }
            Token::Comment(s) => {
                flush_text!();
                let node = builder.create_comment(&string(s)?)?;
                builder.append_child(&current_parent!(), node)?;
            }
            Token::Doctype(_) => (),
            Token::Error(e) => {
                warn!("markup tokenizer: {e:?} in {markup:?}");
            }
        }
    }
    flush_text!();
    Ok(root)
}

fn namespace_of(context: &[Frame]) -> Namespace {
    context.last().map(|f| f.namespace).unwrap_or(Namespace::Html)
}

/// Parse `markup` into a fragment of plain nodes created by `platform`.
pub fn parse_fragment(platform: &dyn Platform, markup: &str) -> Result<Node> {
    parse(markup, &mut DomBuilder { platform })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn html(markup: &str) -> String {
        parse_fragment(&Document::new(), markup).unwrap().inner_html()
    }

    #[test]
    fn t_parse_basic() {
        assert_eq!(html("<p class=\"a\">Hello <b>you</b></p>"),
                   "<p class=\"a\">Hello <b>you</b></p>");
        assert_eq!(html("<input disabled><br/>x"), "<input disabled=\"\"><br>x");
        assert_eq!(html("a &amp; b"), "a &amp; b");
    }

    #[test]
    fn t_comments_verbatim() {
        assert_eq!(html("<div><!-- <b>not markup</b> {{val0}} --></div>"),
                   "<div><!-- <b>not markup</b> {{val0}} --></div>");
    }

    #[test]
    fn t_merged_text() {
        let frag = parse_fragment(&Document::new(), "a &lt; b").unwrap();
        assert_eq!(frag.child_nodes().len(), 1);
        assert_eq!(frag.first_child().unwrap().node_value().unwrap(), "a < b");
    }

    #[test]
    fn t_unclosed_and_unmatched() {
        assert_eq!(html("<div><span>x</div>y</p>"), "<div><span>x</span></div>y");
    }

    #[test]
    fn t_namespaces_and_dotted_names() {
        let frag = parse_fragment(
            &Document::new(),
            "<svg><path d=\"M0\"/></svg><button attr.class.x=\"1\"></button>").unwrap();
        let svg = frag.first_child().unwrap();
        assert_eq!(svg.namespace(), Some(Namespace::Svg));
        assert_eq!(svg.first_child().unwrap().namespace(), Some(Namespace::Svg));
        let button = svg.next_sibling().unwrap();
        assert_eq!(button.namespace(), Some(Namespace::Html));
        assert_eq!(button.get_attribute("attr.class.x").unwrap(), "1");
    }
}

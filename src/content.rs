//! Content slot values: flattening into a closed union, turning that
//! into DOM nodes with positional text reuse, and moving the result
//! into a marker-delimited range.

use adom::{Node, Platform};
use anyhow::Result;
use kstring::KString;

use crate::{html::Html, state::untracked, value::Value};

/// One entry of flattened content.
pub enum Content {
    Node(Node),
    Template(Html),
    Text(KString),
}

/// Call accessors and expand lists; `Null` yields nothing.
pub fn flatten(value: &Value, out: &mut Vec<Content>) {
    match value {
        Value::Func(f) => flatten(&f(), out),
        Value::List(items) => for v in items.iter() {
            flatten(v, out)
        },
        Value::Null => (),
        Value::Node(n) => out.push(Content::Node(n.clone())),
        Value::Html(h) => out.push(Content::Template(h.clone())),
        v => out.push(Content::Text(KString::from_string(v.to_string()))),
    }
}

#[derive(Clone, Debug)]
pub enum Rendered {
    Node(Node),
    Template(Html),
    Text(Node, KString),
}

impl Rendered {
    pub fn same(&self, other: &Rendered) -> bool {
        match (self, other) {
            (Rendered::Node(a), Rendered::Node(b)) => Node::ptr_eq(a, b),
            (Rendered::Template(a), Rendered::Template(b)) => Html::ptr_eq(a, b),
            (Rendered::Text(a, _), Rendered::Text(b, _)) => Node::ptr_eq(a, b),
            _ => false
        }
    }

    pub fn template(&self) -> Option<&Html> {
        match self {
            Rendered::Template(h) => Some(h),
            _ => None
        }
    }

    /// The nodes this entry occupies; a template's include its markers.
    pub fn dom_nodes(&self) -> Vec<Node> {
        match self {
            Rendered::Node(n) | Rendered::Text(n, _) => vec![n.clone()],
            Rendered::Template(h) => h.range_nodes(),
        }
    }
}

pub fn same_list(a: &[Rendered], b: &[Rendered]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same(y))
}

/// Turn `content` into rendered entries. Text nodes of `previous` are
/// reused if the text at the same position is unchanged. Templates
/// that are not mounted get rendered into `holding` first, which must
/// outlive the call (parents are held weakly); all of them are updated
/// to the current state.
pub fn materialize(platform: &dyn Platform,
                   content: Vec<Content>,
                   previous: &[Rendered],
                   holding: &Node) -> Result<Vec<Rendered>> {
    let mut rendered = Vec::with_capacity(content.len());
    for (i, c) in content.into_iter().enumerate() {
        rendered.push(match c {
            Content::Text(s) => match previous.get(i) {
                Some(Rendered::Text(node, old)) if *old == s =>
                    Rendered::Text(node.clone(), s),
                _ => Rendered::Text(platform.create_text_node(&s), s),
            },
            Content::Node(n) => Rendered::Node(n),
            Content::Template(h) => {
                untracked(|| -> Result<()> {
                    if !h.is_connected() {
                        h.render(holding)?;
                    }
                    h.update()
                })?;
                Rendered::Template(h)
            }
        });
    }
    Ok(rendered)
}

/// Make the nodes strictly between `start` and `end` be exactly those of
/// `rendered`, in order, each once. Templates of `previous` that are no
/// longer rendered are parked in `holding` with their DOM intact; other
/// stale nodes are removed.
pub fn reconcile(start: &Node,
                 end: &Node,
                 rendered: &[Rendered],
                 previous: &[Rendered],
                 holding: &Node) -> Result<()> {
    let parent = match start.parent_node() {
        Some(p) => p,
        None => return Ok(())
    };
    for old in previous.iter().filter_map(Rendered::template) {
        if !rendered.iter().any(|r| r.template().map(|h| Html::ptr_eq(h, old)).unwrap_or(false)) {
            for n in old.range_nodes() {
                holding.append_child(&n)?;
            }
        }
    }

    let mut nodes: Vec<Node> = Vec::new();
    for r in rendered {
        for n in r.dom_nodes() {
            if !nodes.iter().any(|m| Node::ptr_eq(m, &n)) {
                nodes.push(n);
            }
        }
    }

    let mut cur = start.next_sibling();
    while let Some(n) = cur {
        if Node::ptr_eq(&n, end) {
            break
        }
        cur = n.next_sibling();
        if !nodes.iter().any(|m| Node::ptr_eq(m, &n)) {
            n.remove();
        }
    }

    let mut prev = start.clone();
    for n in &nodes {
        let next = prev.next_sibling();
        if next.as_ref().map(|x| !Node::ptr_eq(x, n)).unwrap_or(true) {
            parent.insert_before(n, next.as_ref())?;
        }
        prev = n.clone();
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use adom::{Document, Namespace};

    #[test]
    fn t_flatten() {
        let doc = Document::new();
        let el = doc.create_element_ns(Namespace::Html, "b");
        let v = Value::list([Value::from("a"), Value::Null,
                             Value::func(|| Value::list([1, 2])), Value::from(&el)]);
        let mut out = Vec::new();
        flatten(&v, &mut out);
        let kinds: Vec<String> = out.iter().map(|c| match c {
            Content::Text(s) => s.to_string(),
            Content::Node(n) => format!("{n:?}"),
            Content::Template(_) => "html".into(),
        }).collect();
        assert_eq!(kinds, vec!["a", "1", "2", "<b>"]);
    }

    #[test]
    fn t_text_reuse_and_reconcile() {
        let doc = Document::new();
        let parent = doc.create_element_ns(Namespace::Html, "p");
        let (start, end) = (Node::new_text(""), Node::new_text(""));
        parent.append_child(&start).unwrap();
        parent.append_child(&end).unwrap();
        let holding = Node::new_fragment();
        let texts = |v: &[&str]| -> Vec<Content> {
            v.iter().map(|s| Content::Text(KString::from_ref(s))).collect()
        };

        let first = materialize(&doc, texts(&["a", "b", "c"]), &[], &holding).unwrap();
        reconcile(&start, &end, &first, &[], &holding).unwrap();
        assert_eq!(parent.inner_html(), "abc");

        let second = materialize(&doc, texts(&["a", "x", "c"]), &first, &holding).unwrap();
        assert!(second[0].same(&first[0]));
        assert!(!second[1].same(&first[1]));
        assert!(second[2].same(&first[2]));
        reconcile(&start, &end, &second, &first, &holding).unwrap();
        assert_eq!(parent.inner_html(), "axc");
        assert_eq!(parent.child_nodes().len(), 5);

        let third = materialize(&doc, texts(&["c"]), &second, &holding).unwrap();
        assert!(!third[0].same(&second[2]));
        reconcile(&start, &end, &third, &second, &holding).unwrap();
        assert_eq!(parent.inner_html(), "c");
        assert!(same_list(&third, &third.clone()));
    }

    #[test]
    fn t_duplicate_nodes_once() {
        let doc = Document::new();
        let parent = doc.create_element_ns(Namespace::Html, "p");
        let (start, end) = (Node::new_text(""), Node::new_text(""));
        parent.append_child(&start).unwrap();
        parent.append_child(&end).unwrap();
        let b = doc.create_element_ns(Namespace::Html, "b");
        let rendered = vec![Rendered::Node(b.clone()), Rendered::Node(b.clone())];
        reconcile(&start, &end, &rendered, &[], &Node::new_fragment()).unwrap();
        assert_eq!(parent.inner_html(), "<b></b>");
    }
}

//! Ref maps (`ref="name"` to the elements carrying it) and the
//! structure generation counter that invalidates cached aggregations.

use std::{cell::Cell, collections::BTreeMap};
use adom::Node;
use kstring::KString;

pub type RefMap = BTreeMap<KString, Vec<Node>>;

pub fn add(map: &mut RefMap, name: &str, node: &Node) {
    let nodes = map.entry(KString::from_ref(name)).or_default();
    if !nodes.iter().any(|n| Node::ptr_eq(n, node)) {
        nodes.push(node.clone());
    }
}

/// Union `from` into `into`, keeping each element once per name.
pub fn merge(into: &mut RefMap, from: &RefMap) {
    for (name, nodes) in from {
        for node in nodes {
            add(into, name, node);
        }
    }
}

thread_local! {
    static GENERATION: Cell<u64> = Cell::new(0);
}

/// Current structure generation; changes on every mount, unmount, move
/// and reactive rewrite.
pub fn generation() -> u64 {
    GENERATION.with(|g| g.get())
}

pub fn bump_generation() {
    GENERATION.with(|g| g.set(g.get() + 1))
}

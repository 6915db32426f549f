//! The on-disk (JSON) representation of element descriptions, one
//! file per element, as read by `meta::read_meta_db_from_json`.

use kstring::KString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescription {
    pub tag_name: KString,
    #[serde(default = "default_true")]
    pub has_closing_tag: bool,
    /// DOM properties of the element that are not kept in sync with
    /// the attribute of the same name once the user (or code) changed
    /// them, e.g. `value` on `input`.
    #[serde(default)]
    pub properties: Vec<KString>,
}

fn default_true() -> bool {
    true
}

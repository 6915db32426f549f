//! Cleaned up and indexed data for fast lookups while building and
//! serializing a DOM.

use std::{collections::{HashMap, HashSet},
          path::Path, fs::read_dir};
use anyhow::{anyhow, Result, Context};
use chj_util::env::{opt_get_env, env_flag};
use kstring::KString;

use crate::types::ElementDescription;

// =============================================================================
// Attributes database

// https://developer.mozilla.org/en-US/docs/Web/HTML/Global_attributes
// Global attributes are attributes common to all HTML elements; they can be used on all elements, though they may have no effect on some elements.

const GLOBAL_ATTRIBUTE_NAMES: &[&str] = &[
    "accesskey",
    "autocapitalize",
    "autofocus",
    "class",
    "contenteditable",
    "dir",
    "draggable",
    "enterkeyhint",
    "exportparts", // Experimental
    "hidden",
    "id",
    "inert",
    "inputmode",
    "is",
    "itemid",
    "itemprop",
    "itemref",
    "itemscope",
    "itemtype",
    "lang",
    "nonce",
    "part",
    "popover",
    "role",
    "slot",
    "spellcheck",
    "style",
    "tabindex",
    "title",
    "translate",
    "virtualkeyboardpolicy",
];

// The `on*` properties every HTMLElement exposes (GlobalEventHandlers).
const EVENT_HANDLER_ATTRIBUTE_NAMES: &[&str] = &[
    "onabort", "onanimationend", "onanimationiteration", "onanimationstart",
    "onauxclick", "onbeforeinput", "onblur", "oncancel", "oncanplay",
    "oncanplaythrough", "onchange", "onclick", "onclose", "oncontextmenu",
    "oncopy", "oncuechange", "oncut", "ondblclick", "ondrag", "ondragend",
    "ondragenter", "ondragleave", "ondragover", "ondragstart", "ondrop",
    "ondurationchange", "onemptied", "onended", "onerror", "onfocus",
    "onfocusin", "onfocusout", "onformdata", "ongotpointercapture", "oninput",
    "oninvalid", "onkeydown", "onkeypress", "onkeyup", "onload",
    "onloadeddata", "onloadedmetadata", "onloadstart", "onlostpointercapture",
    "onmousedown", "onmouseenter", "onmouseleave", "onmousemove", "onmouseout",
    "onmouseover", "onmouseup", "onpaste", "onpause", "onplay", "onplaying",
    "onpointercancel", "onpointerdown", "onpointerenter", "onpointerleave",
    "onpointermove", "onpointerout", "onpointerover", "onpointerup",
    "onprogress", "onratechange", "onreset", "onresize", "onscroll",
    "onscrollend", "onsecuritypolicyviolation", "onseeked", "onseeking",
    "onselect", "onselectionchange", "onselectstart", "onslotchange",
    "onstalled", "onsubmit", "onsuspend", "ontimeupdate", "ontoggle",
    "ontouchcancel", "ontouchend", "ontouchmove", "ontouchstart",
    "ontransitioncancel", "ontransitionend", "ontransitionrun",
    "ontransitionstart", "onvolumechange", "onwaiting", "onwheel",
];

// =============================================================================
// Element database

// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "source", "track", "wbr",
];

const CONTAINER_ELEMENTS: &[&str] = &[
    "a", "abbr", "address", "article", "aside", "audio", "b", "bdi", "bdo",
    "blockquote", "body", "button", "canvas", "caption", "cite", "code",
    "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog",
    "div", "dl", "dt", "em", "fieldset", "figcaption", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup",
    "html", "i", "iframe", "ins", "kbd", "label", "legend", "li", "main",
    "map", "mark", "menu", "meter", "nav", "noscript", "object", "ol",
    "optgroup", "option", "output", "p", "picture", "pre", "progress", "q",
    "rp", "rt", "ruby", "s", "samp", "script", "search", "section", "select",
    "slot", "small", "span", "strong", "style", "sub", "summary", "sup",
    "table", "tbody", "td", "template", "textarea", "tfoot", "th", "thead",
    "time", "title", "tr", "u", "ul", "var", "video",
];

// Properties that stop reflecting the attribute once they were set
// (the "dirty value" behaviour of form controls and media elements).
const ELEMENT_PROPERTIES: &[(&str, &[&str])] = &[
    ("input", &["value", "checked", "indeterminate"]),
    ("textarea", &["value"]),
    ("select", &["value"]),
    ("option", &["selected"]),
    ("audio", &["muted", "volume", "currentTime"]),
    ("video", &["muted", "volume", "currentTime"]),
];

#[derive(Debug)]
pub struct ElementMeta {
    pub tag_name: KString,
    pub has_closing_tag: bool,
    pub properties: HashSet<KString>,
}

impl PartialEq for ElementMeta {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.tag_name == other.tag_name
    }
}

impl Eq for ElementMeta {}

impl From<ElementDescription> for ElementMeta {
    fn from(d: ElementDescription) -> Self {
        ElementMeta {
            tag_name: d.tag_name,
            has_closing_tag: d.has_closing_tag,
            properties: d.properties.into_iter().collect(),
        }
    }
}


#[derive(Debug)]
pub struct MetaDb {
    pub global_attribute_names: HashSet<KString>,
    pub event_handler_names: HashSet<KString>,
    pub elementmeta: HashMap<KString, ElementMeta>,
}

impl MetaDb {
    pub fn get(&self, tag_name: &str) -> Option<&ElementMeta> {
        self.elementmeta.get(tag_name)
    }

    /// Unknown elements (custom elements, SVG) are assumed to have a
    /// closing tag.
    pub fn has_closing_tag(&self, tag_name: &str) -> bool {
        self.get(tag_name).map(|m| m.has_closing_tag).unwrap_or(true)
    }

    /// Whether elements expose an `on<event>` property of this name.
    /// These are global, so the tag name does not matter currently.
    pub fn has_event_property(&self, _tag_name: &str, attribute_name: &str) -> bool {
        self.event_handler_names.contains(attribute_name)
    }

    /// Whether `property` is a native property of `tag_name` which
    /// needs to be assigned separately from its attribute.
    pub fn has_native_property(&self, tag_name: &str, property: &str) -> bool {
        self.get(tag_name).map(|m| m.properties.contains(property)).unwrap_or(false)
    }
}

fn static_names(names: &[&'static str]) -> HashSet<KString> {
    names.iter().map(|n| KString::from_static(*n)).collect()
}

pub fn read_meta_db_static() -> MetaDb {
    let mut elementmeta = HashMap::new();
    let mut add = |tag_name: &'static str, has_closing_tag: bool| {
        let properties = ELEMENT_PROPERTIES.iter()
            .find(|(t, _)| *t == tag_name)
            .map(|(_, ps)| static_names(ps))
            .unwrap_or_default();
        elementmeta.insert(KString::from_static(tag_name), ElementMeta {
            tag_name: KString::from_static(tag_name),
            has_closing_tag,
            properties,
        });
    };
    for n in VOID_ELEMENTS {
        add(*n, false);
    }
    for n in CONTAINER_ELEMENTS {
        add(*n, true);
    }
    MetaDb {
        global_attribute_names: static_names(GLOBAL_ATTRIBUTE_NAMES),
        event_handler_names: static_names(EVENT_HANDLER_ATTRIBUTE_NAMES),
        elementmeta,
    }
}


fn read_description(path: &Path) -> Result<ElementDescription> {
    Ok(serde_json::from_reader(std::io::BufReader::new(std::fs::File::open(path)?))?)
}

fn read_descriptions(dir: &Path) -> Result<HashMap<KString, ElementDescription>> {
    (|| -> Result<HashMap<KString, ElementDescription>> {
        let mut m = HashMap::new();
        for entry in read_dir(dir)
            .with_context(|| anyhow!("reading directory {dir:?}"))?
        {
            let path = entry?.path();
            (|| -> Result<()> {
                let filename = path.file_name().ok_or_else(
                    || anyhow!("path has no file_name: {:?}", path))?;
                let name = filename.to_string_lossy();
                let elementname = name.strip_suffix(".json").ok_or_else(
                    || anyhow!("path is missing .json suffix: {:?}", path))?;
                m.insert(KString::from_ref(elementname), read_description(&path)?);
                Ok(())
            })().with_context(
                || anyhow!("path {:?}", path))?;
        }
        Ok(m)
    })().with_context(|| anyhow!("reading element descriptions from {dir:?}"))
}

/// Build the database from a directory of `<tag>.json` files (see
/// `ElementDescription`). Elements missing there are taken from the
/// built-in tables.
pub fn read_meta_db_from_json(dir: &Path) -> Result<MetaDb> {
    let mut metadb = read_meta_db_static();
    for (tag_name, description) in read_descriptions(dir)? {
        metadb.elementmeta.insert(tag_name, description.into());
    }
    Ok(metadb)
}

pub fn read_meta_db() -> Result<MetaDb> {
    let debug = env_flag("HTML_META_DEBUG");
    if let Some(dir) = opt_get_env::<String>("HTML_READ_META_DB_FROM_JSON_DIR")
        .map_err(|e| anyhow!(e))?
    {
        if debug { eprintln!("reading meta db from json at {dir:?}") };
        read_meta_db_from_json(dir.as_ref())
    } else {
        if debug { eprintln!("reading meta db from static") };
        Ok(read_meta_db_static())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_static_db() {
        let db = read_meta_db_static();
        assert!(!db.has_closing_tag("input"));
        assert!(!db.has_closing_tag("br"));
        assert!(db.has_closing_tag("div"));
        assert!(db.has_closing_tag("my-element"));
        assert!(db.has_event_property("button", "onclick"));
        assert!(db.has_event_property("my-element", "oninput"));
        assert!(!db.has_event_property("button", "onone"));
        assert!(db.has_native_property("input", "value"));
        assert!(!db.has_native_property("div", "value"));
        assert!(db.global_attribute_names.contains("class"));
    }

    #[test]
    fn t_read_meta_db_from_json() {
        let dir = std::env::temp_dir().join(
            format!("ahtml_html_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("x-range.json"),
                       r#"{"tag_name": "x-range", "properties": ["value"]}"#).unwrap();
        let db = read_meta_db_from_json(&dir).unwrap();
        assert!(db.has_native_property("x-range", "value"));
        assert!(db.has_native_property("input", "value"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

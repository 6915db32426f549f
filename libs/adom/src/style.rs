//! Inline style declarations (`prop: value;` lists).

use itertools::Itertools;
use kstring::KString;

/// Split `s` into `(property, value)` pairs. Declarations without a
/// colon or with an empty property or value are dropped.
pub fn parse_declarations(s: &str) -> Vec<(KString, KString)> {
    s.split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let (prop, value) = (prop.trim(), value.trim());
            if prop.is_empty() || value.is_empty() {
                None
            } else {
                Some((KString::from_ref(&prop.to_ascii_lowercase()),
                      KString::from_ref(value)))
            }
        })
        .collect()
}

pub fn serialize_declarations(decls: &[(KString, KString)]) -> String {
    decls.iter()
        .map(|(prop, value)| format!("{prop}: {value};"))
        .join(" ")
}

/// The canonical form a style attribute value is stored in.
pub fn normalize(s: &str) -> String {
    serialize_declarations(&parse_declarations(s))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_normalize() {
        assert_eq!(normalize("cursor: pointer"), "cursor: pointer;");
        assert_eq!(normalize(" color:red;;Background : blue ; "),
                   "color: red; background: blue;");
        assert_eq!(normalize("garbage"), "");
        assert_eq!(normalize(""), "");
    }
}

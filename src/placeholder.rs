//! Positional placeholder tokens (`{{val0}}`, `{{val1}}`, ...) standing
//! in for interpolated values inside the composite template string.

use kstring::KString;

const OPEN: &str = "{{val";
const CLOSE: &str = "}}";

pub fn token(index: usize) -> String {
    format!("{OPEN}{index}{CLOSE}")
}

/// Join the literal segments with one token per value gap, trimmed.
pub fn template_string(segments: &[&str]) -> String {
    let mut s = String::new();
    let last = segments.len().saturating_sub(1);
    for (i, seg) in segments.iter().enumerate() {
        s.push_str(seg);
        if i < last {
            s.push_str(&token(i));
        }
    }
    s.trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPart {
    Text(KString),
    Value(usize),
}

/// Finds the next token at or after `from`: (start, end, index).
fn next_token(s: &str, from: usize) -> Option<(usize, usize, usize)> {
    let mut pos = from;
    while let Some(off) = s[pos..].find(OPEN) {
        let start = pos + off;
        let digits_start = start + OPEN.len();
        let digits_len = s[digits_start..].bytes().take_while(u8::is_ascii_digit).count();
        let digits_end = digits_start + digits_len;
        if digits_len > 0 && s[digits_end..].starts_with(CLOSE) {
            if let Ok(index) = s[digits_start..digits_end].parse() {
                return Some((start, digits_end + CLOSE.len(), index))
            }
        }
        pos = start + 1;
    }
    None
}

pub fn contains_placeholder(s: &str) -> bool {
    next_token(s, 0).is_some()
}

/// The value index if `s` consists of exactly one token.
pub fn whole_placeholder(s: &str) -> Option<usize> {
    match next_token(s, 0) {
        Some((0, end, index)) if end == s.len() => Some(index),
        _ => None
    }
}

/// Rewrite `<` and `</` directly followed by a token to `&lt;` and
/// `&lt;/`, so that an interpolated tag name parses as literal text.
pub fn escape_dynamic_tags(template_string: &str) -> String {
    let mut out = String::with_capacity(template_string.len());
    let mut pos = 0;
    while let Some((start, end, _)) = next_token(template_string, pos) {
        let before = &template_string[pos..start];
        if let Some(prefix) = before.strip_suffix("</") {
            out.push_str(prefix);
            out.push_str("&lt;/");
        } else if let Some(prefix) = before.strip_suffix('<') {
            out.push_str(prefix);
            out.push_str("&lt;");
        } else {
            out.push_str(before);
        }
        out.push_str(&template_string[start..end]);
        pos = end;
    }
    out.push_str(&template_string[pos..]);
    out
}

/// Split `raw` into literal text and value references. Tokens whose
/// index is not below `num_values` stay literal text.
pub fn split(raw: &str, num_values: usize) -> Vec<RawPart> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut pos = 0;
    while let Some((start, end, index)) = next_token(raw, pos) {
        text.push_str(&raw[pos..start]);
        if index < num_values {
            if !text.is_empty() {
                parts.push(RawPart::Text(KString::from_string(std::mem::take(&mut text))));
            }
            parts.push(RawPart::Value(index));
        } else {
            text.push_str(&raw[start..end]);
        }
        pos = end;
    }
    text.push_str(&raw[pos..]);
    if !text.is_empty() {
        parts.push(RawPart::Text(KString::from_string(text)));
    }
    parts
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_template_string() {
        assert_eq!(template_string(&["  <b>", "</b> ", "\n"]), "<b>{{val0}}</b> {{val1}}");
        assert_eq!(template_string(&["<p>x</p>"]), "<p>x</p>");
        assert_eq!(template_string(&[]), "");
    }

    #[test]
    fn t_split() {
        assert_eq!(split("a {{val0}}{{val1}} b", 2), vec![
            RawPart::Text("a ".into()),
            RawPart::Value(0),
            RawPart::Value(1),
            RawPart::Text(" b".into()),
        ]);
        assert_eq!(split("{{val3}} x", 1), vec![RawPart::Text("{{val3}} x".into())]);
        assert_eq!(split("{{val}} {{val1", 2), vec![RawPart::Text("{{val}} {{val1".into())]);
        assert!(split("", 0).is_empty());
    }

    #[test]
    fn t_escape_dynamic_tags() {
        assert_eq!(escape_dynamic_tags("<{{val0}}>click me</{{val1}}>"),
                   "&lt;{{val0}}>click me&lt;/{{val1}}>");
        assert_eq!(escape_dynamic_tags("<p title=\"{{val0}}\">{{val1}}</p>"),
                   "<p title=\"{{val0}}\">{{val1}}</p>");
        assert_eq!(escape_dynamic_tags("<b>{{val0}}</b>"), "<b>{{val0}}</b>");
    }

    #[test]
    fn t_whole_placeholder() {
        assert_eq!(whole_placeholder("{{val12}}"), Some(12));
        assert_eq!(whole_placeholder("data-{{val0}}"), None);
        assert_eq!(whole_placeholder("{{val0}} "), None);
        assert!(contains_placeholder("data-{{val0}}"));
        assert!(!contains_placeholder("{{value}}"));
    }
}

//! Removal of configured markup spans from generated text.

use memchr::memmem;

use crate::types::AdapterConfig;

/// Remove every `<tag>...</tag>` span for each configured tag name.
///
/// A span is removed only when both the opening and the closing tag are
/// present; an unmatched tag is left untouched. Filtering already-filtered
/// text is a no-op, and an empty tag set passes the input through unchanged.
pub fn filter_tags(text: &str, tags: &[String]) -> String {
    let mut out = text.to_string();
    for tag in tags {
        let open = format!("<{tag}>");
        let close = format!("</{tag}>");
        out = strip_spans(&out, &open, &close);
    }
    out
}

/// Apply the configured tag set to a final response text.
pub(crate) fn apply(config: &AdapterConfig, text: String) -> String {
    match &config.filter_response_tags {
        Some(tags) if !tags.is_empty() => filter_tags(&text, tags),
        _ => text,
    }
}

fn strip_spans(text: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(start) = memmem::find(rest.as_bytes(), open.as_bytes()) else {
            out.push_str(rest);
            return out;
        };
        let after_open = start + open.len();
        let Some(end) = memmem::find(rest[after_open..].as_bytes(), close.as_bytes()) else {
            // Opening tag without a close: leave the remainder untouched.
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..start]);
        rest = &rest[after_open + end + close.len()..];
    }
}

// src/utils/text.rs

//! Text clean-up for upstream markup.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>").expect("line break pattern"));

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<a.*?>(.+?)</a>").expect("anchor pattern"));

/// Decode HTML entities (`&amp;`, `&quot;`, `&#39;`, ...).
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Turn `<br>` tags into newlines and collapse links to their label.
pub fn strip_markup(text: &str) -> String {
    let text = LINE_BREAK.replace_all(text, "\n");
    ANCHOR.replace_all(&text, "$1").into_owned()
}

/// Cut `text` to at most `limit` user-perceived characters.
pub fn truncate(text: &str, limit: usize) -> Cow<'_, str> {
    match text.grapheme_indices(true).nth(limit) {
        Some((end, _)) => Cow::Owned(text[..end].to_string()),
        None => Cow::Borrowed(text),
    }
}

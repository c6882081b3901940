//! Plain-text extraction from page markup for LLM prompts.
//!
//! Boilerplate elements are stripped before the text is collected so the
//! model sees directory rows and bio paragraphs, not navigation chrome.

use scraper::{Html, Selector};

/// Elements removed before text extraction.
const STRIP_SELECTORS: [&str; 12] = [
    "script", "style", "nav", "footer", "header", "aside", "form", "noscript", "iframe",
    "svg", "button", "input",
];

/// Remove boilerplate elements from an HTML string.
fn strip_boilerplate(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut result = html.to_string();
    for selector_str in STRIP_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                let element_html = element.html();
                result = result.replace(&element_html, "");
            }
        }
    }

    result
}

/// Extract newline-separated visible text from page markup.
///
/// The newline separator preserves list structure, which matters for
/// directory pages where each row is one professor.
pub fn page_text(html: &str) -> String {
    let cleaned = strip_boilerplate(html);
    let document = Html::parse_document(&cleaned);

    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

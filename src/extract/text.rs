//! Small text helpers shared by the listing parser and the detail extractor

use scraper::{ElementRef, Node};

/// All descendant text of an element, whitespace-collapsed
pub fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text nodes that are direct children of an element, each trimmed, empty ones dropped
///
/// This mirrors a `::text` / `text()` query: text nested inside child
/// elements is not included.
pub fn own_text(element: &ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => {
                let text = collapse_whitespace(text);
                (!text.is_empty()).then_some(text)
            }
            _ => None,
        })
        .collect()
}

/// Trims and folds every whitespace run into a single space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the trimmed value, or `None` if nothing is left
pub fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

//! Text extraction from HTML documents.

use scraper::{ElementRef, Html, Selector};

/// Elements that never carry documentation content.
const CHROME_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Class fragments marking navigation chrome.
const CHROME_CLASS_HINTS: &[&str] = &["navbar", "menu", "sidebar", "toc", "navigation"];

/// True for script/style and navigation elements.
pub fn is_chrome(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if CHROME_TAGS.contains(&value.name()) {
        return true;
    }
    value.attr("class").is_some_and(|class| {
        let class = class.to_lowercase();
        CHROME_CLASS_HINTS.iter().any(|hint| class.contains(hint))
    })
}

/// Heading level for `h1`..`h6`.
pub fn heading_level(element: &ElementRef<'_>) -> Option<u8> {
    let name = element.value().name();
    let level = name.strip_prefix('h')?.parse::<u8>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let text = text.trim();
            if !text.is_empty() {
                out.push(text.to_string());
            }
        } else if let Some(child) = ElementRef::wrap(child) {
            if !is_chrome(&child) {
                collect_text(child, out);
            }
        }
    }
}

/// Text of an element without its chrome descendants, one text node per line.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(element, &mut parts);
    parts.join("\n")
}

/// Text of an element on a single line.
pub fn inline_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// Main content of a page: the first non-empty match of `selectors`, else
/// the whole document.
pub fn page_text(html: &Html, selectors: &[Selector]) -> String {
    for selector in selectors {
        if let Some(element) = html.select(selector).next() {
            let text = element_text(element);
            if !text.is_empty() {
                return text;
            }
        }
    }
    element_text(html.root_element())
}

/// Find an element by its `id` attribute.
pub fn find_by_id<'a>(html: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    html.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().id() == Some(id))
}

/// Text of the first element matching `selector`.
pub fn first_text(html: &Html, selector: &Selector) -> Option<String> {
    html.select(selector)
        .map(inline_text)
        .find(|text| !text.is_empty())
}

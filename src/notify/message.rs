//! Human-readable rendering of a change set (Telegram Markdown).

use chrono::{DateTime, Utc};
use unicode_segmentation::UnicodeSegmentation;

use crate::models::{ChangeSet, ContentUnit};
use crate::notify::SourceContext;

const MAX_TITLE_GRAPHEMES: usize = 120;

/// Renders change sets into chat messages.
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    max_items: usize,
}

impl MessageRenderer {
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items: max_items.max(1),
        }
    }

    pub fn render(&self, changes: &ChangeSet, source: &SourceContext, now: DateTime<Utc>) -> String {
        let mut message = format!(
            "🔔 *{} API Documentation Changed*\n\n",
            escape_markdown(&source.display_name)
        );
        message.push_str(&format!("📊 Total Changes: *{}*\n", changes.change_count()));
        message.push_str(&format!("🕒 {}\n\n", now.format("%Y-%m-%d %H:%M UTC")));

        let modified: Vec<&ContentUnit> =
            changes.modified_units.iter().map(|m| &m.current).collect();
        let new: Vec<&ContentUnit> = changes.new_units.iter().collect();
        let deleted: Vec<&ContentUnit> = changes.deleted_units.iter().collect();

        self.section(&mut message, "📄", "NEW SECTIONS", &new, true);
        self.section(&mut message, "✏️", "MODIFIED SECTIONS", &modified, true);
        self.section(&mut message, "🗑️", "DELETED SECTIONS", &deleted, false);

        message.push_str(&format!(
            "📚 Docs: [{}]({})",
            escape_markdown(&source.display_name),
            source.base_url
        ));
        message
    }

    fn section(
        &self,
        out: &mut String,
        icon: &str,
        heading: &str,
        units: &[&ContentUnit],
        with_links: bool,
    ) {
        if units.is_empty() {
            return;
        }
        out.push_str(&format!("{icon} *{heading} ({})*:\n", units.len()));
        for unit in units.iter().take(self.max_items) {
            out.push_str(&format!(
                "  • {}\n",
                escape_markdown(&truncate_graphemes(&unit.title, MAX_TITLE_GRAPHEMES))
            ));
            if with_links {
                out.push_str(&format!("    [View]({})\n", unit.locator));
            }
        }
        if units.len() > self.max_items {
            out.push_str(&format!("  ... and {} more\n", units.len() - self.max_items));
        }
        out.push('\n');
    }
}

/// Cut `text` to at most `max` grapheme clusters, marking the cut with `…`.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// Escape Telegram legacy Markdown control characters.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fingerprint, ModifiedUnit, UnitDescriptor};
    use chrono::TimeZone;

    fn unit(id: &str, title: &str) -> ContentUnit {
        ContentUnit::from_descriptor(
            UnitDescriptor::new(id, title, format!("https://docs.example.com/#{id}")),
            Fingerprint::from_hex(id),
            Utc::now(),
            None,
        )
    }

    fn source() -> SourceContext {
        SourceContext {
            name: "example".into(),
            display_name: "Example".into(),
            base_url: "https://docs.example.com".into(),
        }
    }

    #[test]
    fn test_render_lists_categories_and_links() {
        let changes = ChangeSet {
            new_units: vec![unit("auth", "Auth")],
            modified_units: vec![ModifiedUnit {
                previous: unit("limits", "Limits"),
                current: unit("limits", "Rate_Limits"),
            }],
            deleted_units: vec![unit("old", "Old API")],
            ..ChangeSet::default()
        };
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let text = MessageRenderer::new(10).render(&changes, &source(), now);

        assert!(text.starts_with("🔔 *Example API Documentation Changed*"));
        assert!(text.contains("Total Changes: *3*"));
        assert!(text.contains("🕒 2026-03-01 12:30 UTC"));
        assert!(text.contains("NEW SECTIONS (1)"));
        assert!(text.contains("[View](https://docs.example.com/#auth)"));
        assert!(text.contains("  • Rate\\_Limits\n"));
        assert!(text.contains("DELETED SECTIONS (1)*:\n  • Old API\n"));
        assert!(!text.contains("[View](https://docs.example.com/#old)"));
        assert!(text.ends_with("📚 Docs: [Example](https://docs.example.com)"));
    }

    #[test]
    fn test_render_truncates_long_lists() {
        let changes = ChangeSet {
            new_units: (0..13).map(|i| unit(&format!("u{i}"), &format!("Unit {i}"))).collect(),
            ..ChangeSet::default()
        };
        let text = MessageRenderer::new(10).render(&changes, &source(), Utc::now());
        assert!(text.contains("Unit 9"));
        assert!(!text.contains("Unit 10"));
        assert!(text.contains("... and 3 more"));
    }

    #[test]
    fn test_truncate_graphemes() {
        assert_eq!(truncate_graphemes("short", 10), "short");
        assert_eq!(truncate_graphemes("abcdef", 3), "abc…");
        // Family emoji is one grapheme made of several code points.
        let family = "👨‍👩‍👧x";
        assert_eq!(truncate_graphemes(family, 1), "👨‍👩‍👧…");
    }
}

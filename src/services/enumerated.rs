// src/services/enumerated.rs

//! Section-anchored adapter for single-page changelogs.
//!
//! Each anchored heading is a unit. Its content is the heading text plus the
//! text of following siblings up to the next heading of the same or higher
//! level.

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{DocumentConfig, EnumeratedConfig, UnitDescriptor};
use crate::services::SourceAdapter;
use crate::services::extract::{
    element_text, find_by_id, heading_level, inline_text, is_chrome,
};
use crate::utils::http::FetchContext;

/// Adapter for sources whose units are anchored headings of a few documents.
pub struct EnumeratedAdapter {
    name: String,
    documents: Vec<DocumentConfig>,
    heading_selector: Selector,
    scope_id: Option<String>,
    volatile: Vec<Regex>,
}

impl EnumeratedAdapter {
    pub fn new(
        name: impl Into<String>,
        config: &EnumeratedConfig,
        volatile: Vec<Regex>,
    ) -> Result<Self> {
        let heading_selector = Selector::parse(&config.heading_selector)
            .map_err(|e| AppError::selector(&config.heading_selector, format!("{e:?}")))?;
        Ok(Self {
            name: name.into(),
            documents: config.documents.clone(),
            heading_selector,
            scope_id: config.scope_id.clone(),
            volatile,
        })
    }

    fn unit_id(document: &DocumentConfig, anchor: &str) -> String {
        if document.key.is_empty() {
            format!("{}#{}", document.url, anchor)
        } else {
            format!("{}:{}", document.key, anchor)
        }
    }

    /// `(anchor, title)` of every tracked heading, in document order.
    fn sections(&self, html: &Html) -> Result<Vec<(String, String)>> {
        let Some(scope_id) = &self.scope_id else {
            return Ok(html
                .select(&self.heading_selector)
                .filter_map(|h| Some((h.value().id()?.to_string(), inline_text(h))))
                .collect());
        };

        let scope = find_by_id(html, scope_id)
            .ok_or_else(|| AppError::discovery(format!("scope heading '#{scope_id}' not found")))?;
        let scope_level = heading_level(&scope).unwrap_or(2);

        let mut sections = Vec::new();
        for sibling in scope.next_siblings().filter_map(ElementRef::wrap) {
            match heading_level(&sibling) {
                Some(level) if level <= scope_level => break,
                Some(_) if self.heading_selector.matches(&sibling) => {
                    if let Some(id) = sibling.value().id() {
                        sections.push((id.to_string(), inline_text(sibling)));
                    }
                }
                _ => {}
            }
        }
        Ok(sections)
    }

    fn document_for(&self, id: &str) -> Option<(&DocumentConfig, String)> {
        if let Some((url, anchor)) = id.split_once('#') {
            if let Some(doc) = self.documents.iter().find(|d| d.key.is_empty() && d.url == url) {
                return Some((doc, anchor.to_string()));
            }
        }
        let (key, anchor) = id.split_once(':')?;
        let doc = self.documents.iter().find(|d| d.key == key)?;
        Some((doc, anchor.to_string()))
    }
}

/// Heading text followed by sibling text up to the next heading of the same
/// or higher level.
pub fn section_text(html: &Html, anchor: &str) -> Option<String> {
    let heading = find_by_id(html, anchor)?;
    let level = heading_level(&heading).unwrap_or(6);

    let mut parts = vec![inline_text(heading)];
    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        if heading_level(&sibling).is_some_and(|l| l <= level) {
            break;
        }
        if is_chrome(&sibling) {
            continue;
        }
        let text = element_text(sibling);
        if !text.is_empty() {
            parts.push(text);
        }
    }

    let text = parts.join("\n");
    (!text.trim().is_empty()).then_some(text)
}

#[async_trait]
impl SourceAdapter for EnumeratedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn discover(&self, ctx: &FetchContext) -> Result<Vec<UnitDescriptor>> {
        let mut units = Vec::new();
        for document in &self.documents {
            let body = ctx
                .fetch_text(&document.url)
                .await
                .map_err(|e| AppError::discovery(format!("{}: {}", document.url, e)))?;

            let sections = self.sections(&Html::parse_document(&body))?;
            log::debug!(
                "{}: {} sections in {}",
                self.name,
                sections.len(),
                document.url
            );

            units.extend(sections.into_iter().map(|(anchor, title)| {
                UnitDescriptor::new(
                    Self::unit_id(document, &anchor),
                    title,
                    format!("{}#{}", document.url, anchor),
                )
            }));
        }
        Ok(units)
    }

    async fn fetch(&self, ctx: &FetchContext, unit: &UnitDescriptor) -> Result<String> {
        let (url, anchor) = unit
            .locator
            .split_once('#')
            .ok_or_else(|| AppError::fetch(&unit.locator, "locator has no anchor"))?;

        let body = ctx.fetch_text(url).await?;
        section_text(&Html::parse_document(&body), anchor)
            .ok_or_else(|| AppError::fetch(&unit.locator, "section not found or empty"))
    }

    fn locate(&self, id: &str) -> String {
        match self.document_for(id) {
            Some((doc, anchor)) => format!("{}#{}", doc.url, anchor),
            None => id.to_string(),
        }
    }

    fn volatile_patterns(&self) -> &[Regex] {
        &self.volatile
    }
}

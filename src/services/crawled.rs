// src/services/crawled.rs

//! Multi-page adapter backed by a bounded same-origin crawl.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CrawledConfig, UnitDescriptor};
use crate::services::SourceAdapter;
use crate::services::extract::{first_text, inline_text, page_text};
use crate::utils::http::FetchContext;
use crate::utils::{last_path_segment, normalize_url, resolve_url, same_origin};

/// Link text longer than this is not used as a title.
const MAX_LINK_TITLE_CHARS: usize = 100;

/// Adapter whose units are whole pages; the page URL is the unit id.
pub struct CrawledAdapter {
    name: String,
    crawler: BoundedCrawler,
    content_selectors: Vec<Selector>,
    volatile: Vec<Regex>,
}

impl CrawledAdapter {
    pub fn new(name: impl Into<String>, config: &CrawledConfig, volatile: Vec<Regex>) -> Result<Self> {
        let content_selectors = config
            .content_selectors
            .iter()
            .map(|s| Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}"))))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.into(),
            crawler: BoundedCrawler::new(config)?,
            content_selectors,
            volatile,
        })
    }
}

#[async_trait]
impl SourceAdapter for CrawledAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn discover(&self, ctx: &FetchContext) -> Result<Vec<UnitDescriptor>> {
        self.crawler.crawl(ctx).await
    }

    async fn fetch(&self, ctx: &FetchContext, unit: &UnitDescriptor) -> Result<String> {
        let body = ctx.fetch_text(&unit.locator).await?;
        let text = page_text(&Html::parse_document(&body), &self.content_selectors);
        if text.trim().is_empty() {
            return Err(AppError::fetch(&unit.locator, "no content"));
        }
        Ok(text)
    }

    fn locate(&self, id: &str) -> String {
        id.to_string()
    }

    fn volatile_patterns(&self) -> &[Regex] {
        &self.volatile
    }
}

/// Breadth-first crawl over same-origin links, capped at `max_pages`.
///
/// Pages are identified by normalized URL, so query, fragment and trailing
/// slash variants are visited once.
pub struct BoundedCrawler {
    roots: Vec<Url>,
    path_prefixes: Vec<String>,
    max_pages: usize,
    follow_links: bool,
    h1: Selector,
    links: Selector,
}

/// What a downloaded page contributes to the crawl.
struct PageInfo {
    title: Option<String>,
    links: Vec<(Url, String)>,
}

impl BoundedCrawler {
    pub fn new(config: &CrawledConfig) -> Result<Self> {
        let roots = config
            .roots
            .iter()
            .map(|r| Url::parse(r))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            roots,
            path_prefixes: config.path_prefixes.clone(),
            max_pages: config.max_pages,
            follow_links: config.follow_links,
            h1: Selector::parse("h1").map_err(|e| AppError::selector("h1", format!("{e:?}")))?,
            links: Selector::parse("a[href]")
                .map_err(|e| AppError::selector("a[href]", format!("{e:?}")))?,
        })
    }

    fn in_scope(&self, url: &Url) -> bool {
        self.roots.iter().any(|root| same_origin(url, root))
            && (self.path_prefixes.is_empty()
                || self
                    .path_prefixes
                    .iter()
                    .any(|prefix| url.path().starts_with(prefix.as_str())))
    }

    fn parse_page(&self, body: &str, base: &Url) -> PageInfo {
        let html = Html::parse_document(body);
        let title = first_text(&html, &self.h1);

        let links = if self.follow_links {
            html.select(&self.links)
                .filter_map(|a| {
                    let href = a.value().attr("href")?;
                    let url = resolve_url(base, href)?;
                    Some((url, inline_text(a)))
                })
                .collect()
        } else {
            Vec::new()
        };

        PageInfo { title, links }
    }

    fn fallback_title(url: &Url, link_text: Option<&str>) -> String {
        link_text
            .filter(|t| !t.is_empty() && t.chars().count() <= MAX_LINK_TITLE_CHARS)
            .map(str::to_string)
            .or_else(|| last_path_segment(url))
            .unwrap_or_else(|| url.to_string())
    }

    /// Discover pages. A root that cannot be downloaded fails the crawl;
    /// other pages that fail are still reported so their fetch is retried
    /// and, if it fails again, skipped rather than treated as deleted.
    pub async fn crawl(&self, ctx: &FetchContext) -> Result<Vec<UnitDescriptor>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(Url, Option<String>, bool)> = VecDeque::new();
        for root in &self.roots {
            if seen.insert(normalize_url(root)) {
                queue.push_back((root.clone(), None, true));
            }
        }

        let mut discovered = Vec::new();
        while discovered.len() < self.max_pages {
            let Some((url, link_text, is_root)) = queue.pop_front() else {
                break;
            };
            let key = normalize_url(&url);

            let body = match ctx.fetch_text(&key).await {
                Ok(body) => body,
                Err(e) if is_root => {
                    return Err(AppError::discovery(format!("root {key}: {e}")));
                }
                Err(e) => {
                    log::warn!("Crawl: {} failed: {}", key, e);
                    let title = Self::fallback_title(&url, link_text.as_deref());
                    discovered.push(UnitDescriptor::new(key.clone(), title, key));
                    continue;
                }
            };

            let page_url = Url::parse(&key)?;
            let page = self.parse_page(&body, &page_url);
            let title = page
                .title
                .unwrap_or_else(|| Self::fallback_title(&url, link_text.as_deref()));
            log::debug!("Discovered ({}/{}): {}", discovered.len() + 1, self.max_pages, title);
            discovered.push(UnitDescriptor::new(key.clone(), title, key));

            for (link, text) in page.links {
                if !self.in_scope(&link) {
                    continue;
                }
                if seen.insert(normalize_url(&link)) {
                    queue.push_back((link, Some(text), false));
                }
            }
        }

        if !queue.is_empty() {
            log::info!(
                "Crawl stopped at {} pages, {} queued links not visited",
                self.max_pages,
                queue.len()
            );
        }
        Ok(discovered)
    }
}

//! Listing page parser
//!
//! Turns a directory listing page into an ordered list of candidate
//! businesses. Two strategies are available:
//!
//! - **Structured**: read the business summary blocks with CSS selectors. The
//!   block also carries location and classification spans, read positionally.
//! - **Resilient**: ignore the page structure and scan every `href` for links
//!   under the detail path prefix. Names are derived from the URL slug and all
//!   other fields are left to the detail page.

use crate::config::{DirectoryConfig, ListingMode};
use crate::extract::text::{element_text, non_empty};
use crate::url::{name_from_detail_url, resolve_link};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Names shorter than this (after trimming) are treated as markup noise
pub const MIN_NAME_LEN: usize = 3;

const BLOCK_SELECTOR: &str = "div.sc-eCstZk.MuiBox-root";
const NAME_SELECTOR: &str = r#"h2[data-test-id="business-name"] span"#;
const ITEM_TEXT_SELECTOR: &str = r#"span[data-test-id="item-text"]"#;
const LINK_SELECTOR: &str = "a[href]";

/// Fields a structured listing block provides alongside the name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFields {
    pub location: Option<String>,
    pub company_type: Option<String>,
    pub market_services: Option<String>,
    pub trades_services: Option<String>,
}

impl ListingFields {
    /// Returns true if the block carried any classification field
    pub fn has_classification(&self) -> bool {
        self.company_type.is_some()
            || self.market_services.is_some()
            || self.trades_services.is_some()
    }
}

/// A business found on a listing page, waiting for its detail fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateBusiness {
    /// Name hint from the listing (or the URL slug)
    pub name: String,

    /// Absolute detail page URL; `None` when the block had no usable link
    pub detail_url: Option<Url>,

    /// Fields already known from the listing (structured mode only)
    pub listing: ListingFields,
}

/// Listing page parser for one deployment mode
#[derive(Debug, Clone)]
pub struct ListingParser {
    mode: ListingMode,
    detail_path_prefix: String,
}

impl ListingParser {
    /// Creates a parser for the given mode
    ///
    /// `detail_path_prefix` is only consulted in resilient mode.
    pub fn new(mode: ListingMode, detail_path_prefix: &str) -> Self {
        Self {
            mode,
            detail_path_prefix: detail_path_prefix.to_string(),
        }
    }

    /// Creates a parser from the directory configuration
    pub fn from_config(config: &DirectoryConfig) -> Self {
        Self::new(config.mode, &config.detail_path_prefix)
    }

    pub fn mode(&self) -> ListingMode {
        self.mode
    }

    /// Parses a listing page
    ///
    /// Candidates come back in page order. Names repeated on the same page
    /// and names shorter than [`MIN_NAME_LEN`] are skipped; names seen on
    /// earlier pages are left for the caller to reject. An empty result means
    /// the directory has no more pages.
    ///
    /// # Arguments
    ///
    /// * `html` - Listing page markup
    /// * `page_url` - URL the page was fetched from, for resolving links
    pub fn parse(&self, html: &str, page_url: &Url) -> Vec<CandidateBusiness> {
        let raw = match self.mode {
            ListingMode::Structured => parse_structured(html, page_url),
            ListingMode::Resilient => self.parse_resilient(html, page_url),
        };

        let mut on_page = HashSet::new();
        raw.into_iter()
            .filter(|candidate| {
                candidate.name.chars().count() >= MIN_NAME_LEN
                    && on_page.insert(candidate.name.clone())
            })
            .collect()
    }

    fn parse_resilient(&self, html: &str, page_url: &Url) -> Vec<CandidateBusiness> {
        let mut candidates = Vec::new();

        for cap in href_regex().captures_iter(html) {
            let Some(href) = cap.get(1).map(|m| m.as_str()) else {
                continue;
            };

            let Some(url) = resolve_link(href, page_url) else {
                continue;
            };

            if !self.is_detail_path(&url) {
                continue;
            }

            if let Some(name) = name_from_detail_url(&url) {
                candidates.push(CandidateBusiness {
                    name,
                    detail_url: Some(url),
                    listing: ListingFields::default(),
                });
            }
        }

        tracing::trace!("Resilient scan of {} found {} links", page_url, candidates.len());
        candidates
    }

    fn is_detail_path(&self, url: &Url) -> bool {
        url.path()
            .strip_prefix(&self.detail_path_prefix)
            .is_some_and(|rest| !rest.trim_matches('/').is_empty())
    }
}

fn href_regex() -> &'static Regex {
    static HREF: OnceLock<Regex> = OnceLock::new();
    HREF.get_or_init(|| {
        Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).expect("valid href regex")
    })
}

fn parse_structured(html: &str, page_url: &Url) -> Vec<CandidateBusiness> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();

    let (Ok(block_selector), Ok(link_selector)) =
        (Selector::parse(BLOCK_SELECTOR), Selector::parse(LINK_SELECTOR))
    else {
        return candidates;
    };

    for block in document.select(&block_selector) {
        let link = block.select(&link_selector).next();

        let Some(name) = block_name(&block, link.as_ref()) else {
            continue;
        };

        let detail_url = link
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve_link(href, page_url));

        candidates.push(CandidateBusiness {
            name,
            detail_url,
            listing: listing_fields(&block),
        });
    }

    candidates
}

/// Finds the business name of a summary block
///
/// Tries the dedicated name element, then the anchor text, then the last
/// comma-separated part of the anchor's click-tracking attribute.
fn block_name(block: &ElementRef<'_>, link: Option<&ElementRef<'_>>) -> Option<String> {
    if let Ok(selector) = Selector::parse(NAME_SELECTOR) {
        if let Some(name) = block
            .select(&selector)
            .next()
            .and_then(|span| non_empty(&element_text(&span)))
        {
            return Some(name);
        }
    }

    let link = link?;
    non_empty(&element_text(link)).or_else(|| {
        link.value()
            .attr("data-track-click")
            .and_then(|tracking| tracking.rsplit(',').next())
            .and_then(non_empty)
    })
}

/// Reads the four auxiliary spans positionally
fn listing_fields(block: &ElementRef<'_>) -> ListingFields {
    let Ok(selector) = Selector::parse(ITEM_TEXT_SELECTOR) else {
        return ListingFields::default();
    };

    let spans: Vec<Option<String>> = block
        .select(&selector)
        .map(|span| non_empty(&element_text(&span)))
        .collect();
    let field = |i: usize| spans.get(i).cloned().flatten();

    ListingFields {
        location: field(0),
        company_type: field(1),
        market_services: field(2),
        trades_services: field(3),
    }
}

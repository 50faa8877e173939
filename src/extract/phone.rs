//! Phone number recovery
//!
//! Detail pages are generated by a front-end framework whose markup changes
//! often, so the phone number is looked for in several places. Each place is
//! a [`PhoneStrategy`]; a [`PhoneChain`] holds them in priority order and
//! stops at the first one that produces an acceptable value.

use crate::extract::text::{element_text, non_empty, own_text};
use crate::extract::DetailPage;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::fmt;
use std::sync::OnceLock;

/// One way of finding a phone number on a detail page
pub trait PhoneStrategy: fmt::Debug + Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Returns a validated phone value, or `None` if this strategy found nothing usable
    fn attempt(&self, page: &DetailPage) -> Option<String>;
}

/// A phone value and the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneMatch {
    pub value: String,
    pub strategy: &'static str,
}

/// Ordered list of phone strategies
#[derive(Debug)]
pub struct PhoneChain {
    strategies: Vec<Box<dyn PhoneStrategy>>,
}

impl PhoneChain {
    /// Creates a chain from explicit strategies, tried in the given order
    pub fn new(strategies: Vec<Box<dyn PhoneStrategy>>) -> Self {
        Self { strategies }
    }

    /// Runs the strategies in order and returns the first hit
    pub fn find(&self, page: &DetailPage) -> Option<PhoneMatch> {
        self.strategies.iter().find_map(|strategy| {
            let value = strategy.attempt(page)?;
            tracing::trace!("Phone found by {} strategy: {}", strategy.name(), value);
            Some(PhoneMatch {
                value,
                strategy: strategy.name(),
            })
        })
    }

    /// Names of the strategies in priority order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl Default for PhoneChain {
    /// Embedded data, then CSS selectors, then structural paths
    fn default() -> Self {
        Self::new(vec![
            Box::new(EmbeddedDataStrategy),
            Box::new(SelectorStrategy::default()),
            Box::new(StructuralPathStrategy::default()),
        ])
    }
}

// ===== Embedded data =====

/// Looks for a `"phone": "<value>"` token inside inline scripts
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedDataStrategy;

impl PhoneStrategy for EmbeddedDataStrategy {
    fn name(&self) -> &'static str {
        "embedded-data"
    }

    fn attempt(&self, page: &DetailPage) -> Option<String> {
        let selector = Selector::parse("script").ok()?;

        page.document()
            .select(&selector)
            .map(|script| script.text().collect::<String>())
            .find_map(|script| {
                phone_token_regexes().iter().find_map(|re| {
                    re.captures_iter(&script)
                        .filter_map(|cap| cap.get(1))
                        .map(|m| m.as_str().trim())
                        .find(|value| is_plausible_embedded(value))
                        .map(str::to_string)
                })
            })
    }
}

fn phone_token_regexes() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r#""phone"\s*:\s*"([^"]+)""#).expect("valid double-quoted phone regex"),
            Regex::new(r#"'phone'\s*:\s*'([^']+)'"#).expect("valid single-quoted phone regex"),
            Regex::new(r#"\\"phone\\"\s*:\s*\\"([^"\\]+)\\""#)
                .expect("valid escaped phone regex"),
        ]
    })
}

/// Accepts values with a `+`, a `(`, or nothing but digits once `-` and spaces are removed
pub fn is_plausible_embedded(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if value.contains('+') || value.contains('(') {
        return true;
    }
    let digits: String = value.chars().filter(|c| !matches!(c, '-' | ' ')).collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

// ===== CSS selectors =====

/// What to read from an element matched by a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorTarget {
    /// The element's own text nodes
    Text,
    /// The value of the named attribute
    Attr(&'static str),
}

/// A CSS selector and what to read from it
#[derive(Debug, Clone, Copy)]
pub struct SelectorQuery {
    pub css: &'static str,
    pub target: SelectorTarget,
}

const DEFAULT_SELECTOR_QUERIES: &[SelectorQuery] = &[
    SelectorQuery { css: "p.MuiTypography-body1", target: SelectorTarget::Text },
    SelectorQuery { css: r#"div[class*="jss"] p.MuiTypography-body1"#, target: SelectorTarget::Text },
    SelectorQuery { css: r#"p[class*="MuiTypography-body1"]"#, target: SelectorTarget::Text },
    SelectorQuery { css: r#"div[class*="sc-"] p[class*="MuiTypography"]"#, target: SelectorTarget::Text },
    SelectorQuery { css: r#"a[href^="tel:"]"#, target: SelectorTarget::Text },
    SelectorQuery { css: r#"a[href^="tel:"]"#, target: SelectorTarget::Attr("href") },
    SelectorQuery { css: r#"[data-test-id*="phone"]"#, target: SelectorTarget::Text },
    SelectorQuery { css: r#"[data-test-id*="contact"]"#, target: SelectorTarget::Text },
];

/// Tries CSS selectors in order and takes the first non-empty value
///
/// A `tel:` prefix is stripped from the result.
#[derive(Debug, Clone)]
pub struct SelectorStrategy {
    queries: Vec<SelectorQuery>,
}

impl SelectorStrategy {
    pub fn new(queries: Vec<SelectorQuery>) -> Self {
        Self { queries }
    }
}

impl Default for SelectorStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_SELECTOR_QUERIES.to_vec())
    }
}

impl PhoneStrategy for SelectorStrategy {
    fn name(&self) -> &'static str {
        "css-selector"
    }

    fn attempt(&self, page: &DetailPage) -> Option<String> {
        self.queries.iter().find_map(|query| {
            let selector = Selector::parse(query.css).ok()?;
            page.document()
                .select(&selector)
                .find_map(|element| match query.target {
                    SelectorTarget::Text => own_text(&element).into_iter().next(),
                    SelectorTarget::Attr(attr) => element.value().attr(attr).and_then(non_empty),
                })
                .map(|value| strip_tel_prefix(&value))
                .filter(|value| !value.is_empty())
        })
    }
}

fn strip_tel_prefix(value: &str) -> String {
    value
        .trim()
        .strip_prefix("tel:")
        .unwrap_or(value.trim())
        .trim()
        .to_string()
}

// ===== Structural paths =====

/// A query over the element tree, for markup without stable class names
#[derive(Debug, Clone, Copy)]
pub enum PathQuery {
    /// Own text of `tag` elements whose class attribute contains `class_fragment`
    ClassContains {
        tag: &'static str,
        class_fragment: &'static str,
    },

    /// Own text of `<p>` children of a `<div>` that has a `<span>` child mentioning `label`
    LabelledContainer { label: &'static str },

    /// Own text of `<p>` siblings following a `<span>` mentioning `label`
    LabelSibling { label: &'static str },

    /// Own text of `tag` elements whose text contains every needle
    TextContains {
        tag: &'static str,
        needles: &'static [&'static str],
    },
}

const DEFAULT_PATH_QUERIES: &[PathQuery] = &[
    PathQuery::ClassContains { tag: "p", class_fragment: "MuiTypography-body1" },
    PathQuery::LabelledContainer { label: "Phone" },
    PathQuery::LabelSibling { label: "Phone" },
    PathQuery::TextContains { tag: "p", needles: &["+"] },
    PathQuery::TextContains { tag: "p", needles: &["(", ")"] },
];

impl PathQuery {
    /// Runs the query and returns every candidate value in document order
    pub fn candidates(&self, page: &DetailPage) -> Vec<String> {
        match *self {
            Self::ClassContains { tag, class_fragment } => select_all(page, tag)
                .filter(|el| {
                    el.value()
                        .attr("class")
                        .is_some_and(|class| class.contains(class_fragment))
                })
                .flat_map(|el| own_text(&el))
                .collect(),

            Self::LabelledContainer { label } => select_all(page, "div")
                .filter(|div| {
                    child_elements(div)
                        .any(|child| child.value().name() == "span" && element_text(&child).contains(label))
                })
                .flat_map(|div| {
                    child_elements(&div)
                        .filter(|child| child.value().name() == "p")
                        .flat_map(|p| own_text(&p))
                        .collect::<Vec<_>>()
                })
                .collect(),

            Self::LabelSibling { label } => select_all(page, "span")
                .filter(|span| own_text(span).iter().any(|text| text.contains(label)))
                .flat_map(|span| {
                    span.next_siblings()
                        .filter_map(ElementRef::wrap)
                        .filter(|sibling| sibling.value().name() == "p")
                        .flat_map(|p| own_text(&p))
                        .collect::<Vec<_>>()
                })
                .collect(),

            Self::TextContains { tag, needles } => select_all(page, tag)
                .filter(|el| {
                    own_text(el)
                        .iter()
                        .any(|text| needles.iter().all(|needle| text.contains(needle)))
                })
                .flat_map(|el| own_text(&el))
                .collect(),
        }
    }
}

fn select_all<'a>(page: &'a DetailPage, tag: &str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let selector = Selector::parse(tag).ok();
    let document = page.document();
    selector
        .into_iter()
        .flat_map(move |selector| document.select(&selector).collect::<Vec<_>>())
}

fn child_elements<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.children().filter_map(ElementRef::wrap)
}

/// Tries structural path queries in order, validating every candidate
#[derive(Debug, Clone)]
pub struct StructuralPathStrategy {
    queries: Vec<PathQuery>,
}

impl StructuralPathStrategy {
    pub fn new(queries: Vec<PathQuery>) -> Self {
        Self { queries }
    }
}

impl Default for StructuralPathStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_PATH_QUERIES.to_vec())
    }
}

impl PhoneStrategy for StructuralPathStrategy {
    fn name(&self) -> &'static str {
        "structural-path"
    }

    fn attempt(&self, page: &DetailPage) -> Option<String> {
        self.queries.iter().find_map(|query| {
            query
                .candidates(page)
                .into_iter()
                .map(|candidate| candidate.trim().to_string())
                .find(|candidate| is_plausible_structural(candidate))
        })
    }
}

/// Accepts values that start with `+`, contain a parenthesis pair, or are
/// at least ten digits once `-`, spaces and parentheses are removed
pub fn is_plausible_structural(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if value.starts_with('+') || (value.contains('(') && value.contains(')')) {
        return true;
    }
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, '-' | ' ' | '(' | ')'))
        .collect();
    digits.len() >= 10 && digits.chars().all(|c| c.is_ascii_digit())
}

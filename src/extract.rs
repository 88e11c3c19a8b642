//! Main-content extraction.
//!
//! Raw HTML goes through an ordered chain of strategies. The first strategy
//! whose normalized output reaches the minimum content length wins; if none
//! does, the page is classified as too short and is not retried.

use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ExtractConfig;
use crate::error::FailureKind;
use crate::normalize::{char_len, normalize_text};

/// Failure reason recorded when no strategy produced enough text
pub const CONTENT_TOO_SHORT: &str = "content too short or unextractable";

/// Structural tags that never carry body text
const NOISE_TAGS: &[&str] = &[
    "nav", "footer", "header", "aside", "form", "noscript", "script", "style",
];

/// Tags whose content is not rendered as page text
const INVISIBLE_TAGS: &[&str] = &["head", "template", "svg", "iframe", "object"];

/// class/id fragments that mark boilerplate blocks
const NOISE_HINTS: &[&str] = &[
    "menu", "navbar", "footer", "cookie", "banner", "subscribe", "sidebar", "promo",
    "advert", "ad-", "ads", "modal", "popup", "newsletter", "breadcrumb", "social",
    "consent", "privacy", "gdpr", "terms", "login", "signup",
];

/// Elements considered as a page's main region
const REGION_TAGS: &[&str] = &["article", "main", "section", "div", "td"];

/// A region whose best child keeps this share of its score is replaced by the child
const REGION_DESCEND_RATIO: f64 = 0.8;

/// Result of extracting one page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub url: String,
    pub success: bool,
    /// Clean text on success; empty otherwise
    pub text: String,
    pub failure_kind: Option<FailureKind>,
    pub failure_reason: Option<String>,
    /// Name of the strategy that produced `text`
    pub strategy: Option<String>,
}

impl ExtractionOutcome {
    pub fn succeeded(url: &str, strategy: &str, text: String) -> Self {
        Self {
            url: url.to_string(),
            success: true,
            text,
            failure_kind: None,
            failure_reason: None,
            strategy: Some(strategy.to_string()),
        }
    }

    /// Record a page that failed before or during extraction
    pub fn failed(url: &str, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            success: false,
            text: String::new(),
            failure_kind: Some(kind),
            failure_reason: Some(reason.into()),
            strategy: None,
        }
    }

    /// Extracted text on success, otherwise the failure reason
    pub fn text_or_reason(&self) -> &str {
        if self.success {
            &self.text
        } else {
            self.failure_reason.as_deref().unwrap_or(CONTENT_TOO_SHORT)
        }
    }
}

/// What a single strategy produced for a page
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    /// Normalized text at or above the minimum length
    Text(String),
    /// The strategy ran but came up short
    NotEnough { chars: usize },
}

impl StrategyOutcome {
    /// Normalize raw text and judge it against the minimum length.
    /// Empty text is never accepted, whatever the minimum.
    pub fn judge(raw: &str, min_chars: usize) -> Self {
        let text = normalize_text(raw);
        let chars = char_len(&text);
        if chars >= min_chars.max(1) {
            StrategyOutcome::Text(text)
        } else {
            StrategyOutcome::NotEnough { chars }
        }
    }
}

/// One algorithm in the fallback chain
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidate text for the page before normalization, if any
    fn raw_text(&self, html: &str) -> Option<String>;

    fn attempt(&self, html: &str, min_chars: usize) -> StrategyOutcome {
        match self.raw_text(html) {
            Some(raw) => StrategyOutcome::judge(&raw, min_chars),
            None => StrategyOutcome::NotEnough { chars: 0 },
        }
    }
}

/// Ordered chain of extraction strategies
pub struct Extractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    min_chars: usize,
}

impl Extractor {
    /// Readability, then main-region isolation, then whole-page cleanup
    pub fn new(config: &ExtractConfig) -> Self {
        Self::with_strategies(
            vec![
                Box::new(ReadabilityStrategy),
                Box::new(MainRegionStrategy),
                Box::new(DomCleanupStrategy),
            ],
            config.min_content_chars,
        )
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>, min_chars: usize) -> Self {
        Self { strategies, min_chars }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract clean body text from a page's HTML
    pub fn extract(&self, url: &str, html: &str) -> ExtractionOutcome {
        for strategy in &self.strategies {
            match strategy.attempt(html, self.min_chars) {
                StrategyOutcome::Text(text) => {
                    debug!(url, strategy = strategy.name(), chars = char_len(&text), "extracted");
                    return ExtractionOutcome::succeeded(url, strategy.name(), text);
                }
                StrategyOutcome::NotEnough { chars } => {
                    debug!(url, strategy = strategy.name(), chars, min = self.min_chars, "not enough content");
                }
            }
        }

        ExtractionOutcome::failed(url, FailureKind::ContentTooShort, CONTENT_TOO_SHORT)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&ExtractConfig::default())
    }
}

/// Mozilla Readability: scores DOM subtrees by text density and drops boilerplate
pub struct ReadabilityStrategy;

impl ExtractionStrategy for ReadabilityStrategy {
    fn name(&self) -> &'static str {
        "readability"
    }

    fn raw_text(&self, html: &str) -> Option<String> {
        let readability = readability_js::Readability::new().ok()?;
        let article = readability.parse(html).ok()?;
        Some(article.text_content)
    }
}

/// Largest low-link-density region of the page, with boilerplate filtered out
pub struct MainRegionStrategy;

impl ExtractionStrategy for MainRegionStrategy {
    fn name(&self) -> &'static str {
        "main-region"
    }

    fn raw_text(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let region = pick_main_region(&document)?;
        Some(visible_text(region))
    }
}

/// Whole document minus structural noise and noise-marked blocks
pub struct DomCleanupStrategy;

impl ExtractionStrategy for DomCleanupStrategy {
    fn name(&self) -> &'static str {
        "dom-cleanup"
    }

    fn raw_text(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        Some(visible_text(document.root_element()))
    }
}

/// Lowercased class and id attributes of an element
fn class_and_id(el: &ElementRef) -> String {
    let mut out = String::new();
    if let Some(c) = el.value().attr("class") {
        out.push_str(c);
        out.push(' ');
    }
    if let Some(i) = el.value().attr("id") {
        out.push_str(i);
    }
    out.to_lowercase()
}

/// Whether an element and its subtree should be dropped from body text.
/// `html` and `body` are never dropped, so a noisy class on the page
/// wrapper cannot erase the whole document.
fn is_noise(el: &ElementRef) -> bool {
    let tag = el.value().name();
    if tag == "html" || tag == "body" {
        return false;
    }
    if NOISE_TAGS.contains(&tag) || INVISIBLE_TAGS.contains(&tag) {
        return true;
    }
    let attrs = class_and_id(el);
    !attrs.trim().is_empty() && NOISE_HINTS.iter().any(|hint| attrs.contains(hint))
}

/// Visible text of a subtree, one text node per line, noise removed
pub fn visible_text(root: ElementRef) -> String {
    let mut lines = Vec::new();
    collect_text(root, &mut lines);
    lines.join("\n")
}

fn collect_text(el: ElementRef, lines: &mut Vec<String>) {
    if is_noise(&el) {
        return;
    }
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, lines);
                }
            }
            _ => {}
        }
    }
}

/// Text statistics of a subtree, noise excluded
#[derive(Debug, Clone, Copy, Default)]
struct RegionStats {
    text_chars: usize,
    link_chars: usize,
    tags: usize,
}

impl RegionStats {
    fn add(&mut self, other: RegionStats) {
        self.text_chars += other.text_chars;
        self.link_chars += other.link_chars;
        self.tags += other.tags;
    }
}

struct RegionCandidate<'a> {
    element: ElementRef<'a>,
    parent: Option<usize>,
    stats: RegionStats,
}

/// Score a region: dense non-link text wins, tag soup and link lists lose
fn region_score(tag: &str, stats: &RegionStats) -> f64 {
    if stats.text_chars < 20 {
        return 0.0;
    }
    let text = stats.text_chars as f64;
    let links = stats.link_chars as f64;
    let link_density = (links / text).min(1.0);

    let mut score = (text - links).max(0.0) * (1.0 - link_density);

    // Text-to-tag ratio: navigation widgets carry a handful of chars per tag
    let chars_per_tag = text / (stats.tags as f64 + 1.0);
    if chars_per_tag < 20.0 {
        score *= 0.5;
    }

    match tag {
        "article" => score * 1.25,
        "main" => score * 1.15,
        _ => score,
    }
}

fn walk_regions<'a>(
    el: ElementRef<'a>,
    in_link: bool,
    parent: Option<usize>,
    out: &mut Vec<RegionCandidate<'a>>,
) -> RegionStats {
    if is_noise(&el) {
        return RegionStats::default();
    }

    let tag = el.value().name();
    let in_link = in_link || tag == "a";
    let own_index = if REGION_TAGS.contains(&tag) {
        out.push(RegionCandidate {
            element: el,
            parent,
            stats: RegionStats::default(),
        });
        Some(out.len() - 1)
    } else {
        None
    };
    let child_parent = own_index.or(parent);

    let mut stats = RegionStats::default();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let chars = text.trim().chars().count();
                stats.text_chars += chars;
                if in_link {
                    stats.link_chars += chars;
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    let child_stats = walk_regions(child_el, in_link, child_parent, out);
                    stats.add(child_stats);
                    stats.tags += 1;
                }
            }
            _ => {}
        }
    }

    if let Some(index) = own_index {
        out[index].stats = stats;
    }
    stats
}

/// Find the single largest main-article region of a document
fn pick_main_region(document: &Html) -> Option<ElementRef<'_>> {
    let mut candidates = Vec::new();
    walk_regions(document.root_element(), false, None, &mut candidates);

    let scores: Vec<f64> = candidates
        .iter()
        .map(|c| region_score(c.element.value().name(), &c.stats))
        .collect();

    let mut best = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| **s > 0.0)
        .fold(None, |acc: Option<(usize, f64)>, (i, s)| match acc {
            Some((_, best)) if best >= *s => acc,
            _ => Some((i, *s)),
        })?
        .0;

    // A wrapper holding one dominant child is really that child
    loop {
        let child = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.parent == Some(best))
            .map(|(i, _)| (i, scores[i]))
            .fold(None, |acc: Option<(usize, f64)>, (i, s)| match acc {
                Some((_, top)) if top >= s => acc,
                _ => Some((i, s)),
            });
        match child {
            Some((i, s)) if s >= scores[best] * REGION_DESCEND_RATIO => best = i,
            _ => break,
        }
    }

    Some(candidates[best].element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const REVIEW_PARAGRAPH: &str = "Customers describe the checkout as quick and the delivery as \
        reliable, although several reviewers mention that replacement parts took weeks to arrive. \
        Support staff were praised for patience on the phone and for following up by email after \
        the call. A few long-time buyers compared the current service with earlier years and said \
        it had improved noticeably since the new warehouse opened.";

    fn article_page() -> String {
        format!(
            r#"<!DOCTYPE html>
            <html>
            <head><title>Reviews</title><style>.x {{ color: red; }}</style></head>
            <body>
                <nav><a href="/">Home</a> <a href="/about">About</a> <a href="/shop">Shop</a></nav>
                <div class="cookie-notice">We use cookies to improve your experience here.</div>
                <div id="wrapper">
                    <article>
                        <h1>What customers say</h1>
                        <p>{p}</p>
                        <p>{p}</p>
                    </article>
                    <div class="related">
                        <a href="/1">Related story one</a>
                        <a href="/2">Related story two</a>
                        <a href="/3">Related story three</a>
                    </div>
                </div>
                <footer>Copyright footer text that should never appear</footer>
                <script>var tracking = "should not appear";</script>
            </body>
            </html>"#,
            p = REVIEW_PARAGRAPH
        )
    }

    struct Fixed {
        name: &'static str,
        text: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn raw_text(&self, _html: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.text.map(String::from)
        }
    }

    fn fixed(name: &'static str, text: Option<&'static str>) -> (Box<dyn ExtractionStrategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Box::new(Fixed { name, text, calls: calls.clone() }), calls)
    }

    #[test]
    fn test_judge_normalizes_before_measuring() {
        let outcome = StrategyOutcome::judge("   abc    def   \n\n\n\n  ghi  ", 10);
        assert_eq!(outcome, StrategyOutcome::Text("abc def \n\n ghi".to_string()));

        let outcome = StrategyOutcome::judge("  short   ", 300);
        assert_eq!(outcome, StrategyOutcome::NotEnough { chars: 5 });
    }

    #[test]
    fn test_judge_never_accepts_empty_text() {
        assert_eq!(StrategyOutcome::judge("   \n  ", 0), StrategyOutcome::NotEnough { chars: 0 });
    }

    #[test]
    fn test_chain_stops_at_first_sufficient_strategy() {
        let (first, first_calls) = fixed("first", Some("too short"));
        let (second, second_calls) = fixed("second", Some("long enough text here"));
        let (third, third_calls) = fixed("third", Some("also long enough text"));
        let extractor = Extractor::with_strategies(vec![first, second, third], 15);

        let outcome = extractor.extract("https://example.com", "<html></html>");
        assert!(outcome.success);
        assert_eq!(outcome.strategy.as_deref(), Some("second"));
        assert_eq!(outcome.text, "long enough text here");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_chain_exhausted_is_content_too_short() {
        let (first, _) = fixed("first", None);
        let (second, _) = fixed("second", Some("tiny"));
        let extractor = Extractor::with_strategies(vec![first, second], 300);

        let outcome = extractor.extract("https://example.com", "<html></html>");
        assert!(!outcome.success);
        assert!(outcome.text.is_empty());
        assert_eq!(outcome.failure_kind, Some(FailureKind::ContentTooShort));
        assert_eq!(outcome.failure_reason.as_deref(), Some(CONTENT_TOO_SHORT));
        assert_eq!(outcome.text_or_reason(), CONTENT_TOO_SHORT);
    }

    #[test]
    fn test_default_chain_order() {
        let extractor = Extractor::default();
        assert_eq!(extractor.strategy_names(), vec!["readability", "main-region", "dom-cleanup"]);
    }

    #[test]
    fn test_dom_cleanup_drops_noise() {
        let text = DomCleanupStrategy.raw_text(&article_page()).unwrap();
        assert!(text.contains("What customers say"));
        assert!(text.contains("Support staff were praised"));
        assert!(!text.contains("Home"));
        assert!(!text.contains("cookies"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
        // Text nodes are joined by line breaks
        assert!(text.contains("What customers say\n"));
    }

    #[test]
    fn test_noise_hint_on_id() {
        let html = r#"<html><body><div id="newsletter-signup">Join now</div><p>Kept text</p></body></html>"#;
        let text = DomCleanupStrategy.raw_text(html).unwrap();
        assert_eq!(text, "Kept text");
    }

    #[test]
    fn test_noisy_body_class_keeps_document() {
        let html = r#"<html><body class="page-terms"><p>Everything on this page</p></body></html>"#;
        let text = DomCleanupStrategy.raw_text(html).unwrap();
        assert_eq!(text, "Everything on this page");
    }

    #[test]
    fn test_main_region_prefers_article_over_wrapper_and_links() {
        let text = MainRegionStrategy.raw_text(&article_page()).unwrap();
        assert!(text.contains("What customers say"));
        assert!(!text.contains("Related story"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_main_region_skips_link_lists() {
        let links: String = (0..40)
            .map(|i| format!(r#"<li><a href="/p{i}">Another product link number {i}</a></li>"#))
            .collect();
        let html = format!(
            r#"<html><body><div class="catalogue"><ul>{links}</ul></div>
               <div class="story"><p>{p}</p></div></body></html>"#,
            p = REVIEW_PARAGRAPH
        );
        let text = MainRegionStrategy.raw_text(&html).unwrap();
        assert!(text.starts_with("Customers describe the checkout"));
        assert!(!text.contains("product link"));
    }

    #[test]
    fn test_main_region_none_for_empty_page() {
        assert!(MainRegionStrategy.raw_text("<html><body></body></html>").is_none());
    }

    #[test]
    fn test_extract_article_page_meets_minimum() {
        let outcome = Extractor::default().extract("https://example.com/reviews", &article_page());
        assert!(outcome.success);
        assert!(char_len(&outcome.text) >= 300);
        assert!(outcome.text.contains("Support staff were praised"));
        assert_eq!(normalize_text(&outcome.text), outcome.text);
    }

    #[test]
    fn test_extract_short_page_fails() {
        let html = "<html><body><nav>Menu</nav><p>Enable JavaScript to continue.</p></body></html>";
        let outcome = Extractor::default().extract("https://example.com/spa", html);
        assert!(!outcome.success);
        assert!(outcome.text.is_empty());
        assert_eq!(outcome.failure_reason.as_deref(), Some(CONTENT_TOO_SHORT));
    }
}

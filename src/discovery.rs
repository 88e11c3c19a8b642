//! Candidate URL discovery.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::{parse_strict, ClaudeCli};
use crate::error::{PulseError, Result};
use crate::fetch::is_valid_url;
use crate::lexicon::is_stop_word;

/// Fewest links the collaborator is asked for
pub const MIN_DISCOVERY_RESULTS: usize = 6;

/// URL or rationale fragments that point at services unrelated to public opinion
const UNRELATED_SERVICE_HINTS: &[&str] = &[
    "login", "signin", "sign-in", "signup", "sign-up", "careers", "jobs", "privacy-policy",
    "terms-of-service", "cookie-policy", "download", "lyrics", "recipe", "dictionary",
    "translate", "weather", "casino", "betting", "coupon", "promo-code",
];

/// Subject and hint tokens shorter than this never count as overlap
const MIN_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryRequest {
    pub subject: String,
    pub hint: Option<String>,
    pub max_results: usize,
}

/// A page likely to contain public commentary about the subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredLink {
    pub url: String,
    #[serde(default)]
    pub rationale: String,
    /// 0-100
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
struct DiscoveryResponse {
    links: Vec<DiscoveredLink>,
}

/// URL discovery collaborator
pub trait Discovery: Send + Sync {
    /// Fails when the collaborator cannot be reached at all
    fn check_credential(&self) -> Result<()>;

    fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<DiscoveredLink>>;
}

fn meaningful_tokens(request: &DiscoveryRequest) -> Vec<String> {
    let text = format!(
        "{} {}",
        request.subject,
        request.hint.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS && !is_stop_word(t))
        .map(String::from)
        .collect()
}

fn is_unrelated_service(link: &DiscoveredLink) -> bool {
    let haystack = format!("{} {}", link.url, link.rationale).to_lowercase();
    UNRELATED_SERVICE_HINTS.iter().any(|hint| haystack.contains(hint))
}

/// Keep usable links: http(s) only, no duplicates, no unrelated services,
/// and at least one subject or hint token in the URL or rationale unless the
/// request has no meaningful tokens. Confidence is clamped to 0..=100 and the
/// list is cut at `max_results`.
pub fn filter_links(links: Vec<DiscoveredLink>, request: &DiscoveryRequest) -> Vec<DiscoveredLink> {
    let tokens = meaningful_tokens(request);
    let mut seen = HashSet::new();

    links
        .into_iter()
        .map(|mut link| {
            link.url = link.url.trim().to_string();
            link.confidence = if link.confidence.is_finite() {
                link.confidence.clamp(0.0, 100.0)
            } else {
                0.0
            };
            link
        })
        .filter(|link| {
            if !is_valid_url(&link.url) {
                debug!(url = %link.url, "discarding invalid url");
                return false;
            }
            if is_unrelated_service(link) {
                debug!(url = %link.url, "discarding unrelated service");
                return false;
            }
            if !tokens.is_empty() {
                let haystack = format!("{} {}", link.url, link.rationale).to_lowercase();
                if !tokens.iter().any(|t| haystack.contains(t.as_str())) {
                    debug!(url = %link.url, "discarding link without subject overlap");
                    return false;
                }
            }
            seen.insert(link.url.clone())
        })
        .take(request.max_results)
        .collect()
}

/// Parse and filter a discovery answer.
///
/// Non-JSON answers, and answers with no usable link, are `UpstreamFormat`.
pub fn parse_discovery(raw: &str, request: &DiscoveryRequest) -> Result<Vec<DiscoveredLink>> {
    let response: DiscoveryResponse = parse_strict(raw)?;
    let links = filter_links(response.links, request);
    if links.is_empty() {
        return Err(PulseError::UpstreamFormat {
            message: "no usable URLs in discovery response".into(),
            raw: raw.to_string(),
        });
    }
    Ok(links)
}

const DISCOVERY_SYSTEM_PROMPT: &str = "You are a research analyst with web search. Respond only with valid JSON matching the schema provided. Do not include any text before or after the JSON.";

const DISCOVERY_PROMPT: &str = r#"Find public web pages that contain comments, reviews, feedback or discussions about this company.

Company: {{subject}}
Hints: {{hint}}

Rules:
- Provide between {{min}} and {{max}} pages.
- Prefer pages full of user commentary: forums, discussion threads, review pages, complaint boards, community Q&A, news articles with comments.
- Avoid login-only pages and homepages; prefer deep links with text.
- Every page must be about this company, not a different business with a similar name.

Respond with JSON only:
{
  "links": [
    {"url": "https://...", "rationale": "why this page has commentary about the company", "confidence": 0-100}
  ]
}
"#;

pub fn build_discovery_prompt(request: &DiscoveryRequest) -> String {
    DISCOVERY_PROMPT
        .replace("{{subject}}", &request.subject)
        .replace("{{hint}}", request.hint.as_deref().unwrap_or("(none)"))
        .replace("{{min}}", &MIN_DISCOVERY_RESULTS.min(request.max_results).to_string())
        .replace("{{max}}", &request.max_results.to_string())
}

impl Discovery for ClaudeCli {
    fn check_credential(&self) -> Result<()> {
        self.check_installed()
    }

    fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<DiscoveredLink>> {
        let prompt = build_discovery_prompt(request);
        let answer = self.ask(DISCOVERY_SYSTEM_PROMPT, &prompt, true)?;
        let links = parse_discovery(&answer, request)?;
        info!(subject = %request.subject, links = links.len(), "sources discovered");
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(subject: &str, hint: Option<&str>, max: usize) -> DiscoveryRequest {
        DiscoveryRequest {
            subject: subject.into(),
            hint: hint.map(String::from),
            max_results: max,
        }
    }

    fn link(url: &str, rationale: &str, confidence: f64) -> DiscoveredLink {
        DiscoveredLink {
            url: url.into(),
            rationale: rationale.into(),
            confidence,
        }
    }

    #[test]
    fn test_filter_links() {
        let links = vec![
            link("https://www.reddit.com/r/acme/comments/1", "thread about Acme refunds", 90.0),
            link("ftp://acme.com/reviews", "Acme reviews", 80.0),
            link("https://acme.com/careers", "Acme jobs", 70.0),
            link("https://www.reddit.com/r/acme/comments/1", "duplicate", 60.0),
            link("https://example.com/forum/42", "unrelated bakery chat", 50.0),
            link("https://www.trustpilot.com/review/acme.com", "", 140.0),
        ];
        let kept = filter_links(links, &request("Acme", None, 12));
        let urls: Vec<&str> = kept.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.reddit.com/r/acme/comments/1",
                "https://www.trustpilot.com/review/acme.com",
            ]
        );
        assert_eq!(kept[1].confidence, 100.0);
    }

    #[test]
    fn test_hint_tokens_count_as_overlap() {
        let links = vec![link("https://forum.example.com/t/rocket-skates", "", 50.0)];
        let kept = filter_links(links, &request("Acme Corp", Some("rocket skates"), 12));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_no_meaningful_tokens_allows_all() {
        let links = vec![link("https://example.com/thread/1", "", 50.0)];
        let kept = filter_links(links, &request("X", Some("the"), 12));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_truncated_to_max() {
        let links = (0..10)
            .map(|i| link(&format!("https://acme.com/review/{i}"), "", 50.0))
            .collect();
        assert_eq!(filter_links(links, &request("Acme", None, 4)).len(), 4);
    }

    #[test]
    fn test_parse_discovery_non_json() {
        let raw = "Here are some links: https://acme.com/reviews";
        match parse_discovery(raw, &request("Acme", None, 12)) {
            Err(PulseError::UpstreamFormat { raw: kept, .. }) => assert_eq!(kept, raw),
            other => panic!("expected UpstreamFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_discovery_all_filtered_is_error() {
        let raw = r#"{"links": [{"url": "https://acme.com/login", "rationale": "", "confidence": 10}]}"#;
        assert!(matches!(
            parse_discovery(raw, &request("Acme", None, 12)),
            Err(PulseError::UpstreamFormat { .. })
        ));
    }

    #[test]
    fn test_parse_discovery_fenced() {
        let raw = "```json\n{\"links\": [{\"url\": \"https://acme.com/reviews\", \"confidence\": 75}]}\n```";
        let links = parse_discovery(raw, &request("Acme", None, 12)).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].rationale, "");
    }

    #[test]
    fn test_discovery_prompt() {
        let prompt = build_discovery_prompt(&request("Acme", None, 12));
        assert!(prompt.contains("Company: Acme"));
        assert!(prompt.contains("Hints: (none)"));
        assert!(prompt.contains("between 6 and 12"));
    }
}

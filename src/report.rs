//! Exportable report text and the structured dashboard payload.

use serde::{Deserialize, Serialize};

use crate::extract::ExtractionOutcome;
use crate::score::{CitedWord, Evidence, ScoreReport, TopicTerm};
use crate::sentiment::round_to;

const RULE_WIDTH: usize = 80;

/// Merge per-URL outcomes into one plain-text document.
///
/// The result ends with exactly one line break.
pub fn assemble(subject: &str, outcomes: &[ExtractionOutcome]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![format!("Company: {}", subject), String::new()];

    for outcome in outcomes {
        lines.push(rule.clone());
        lines.push(format!("URL: {}", outcome.url));
        lines.push(format!("STATUS: {}", if outcome.success { "OK" } else { "ERROR" }));
        lines.push(rule.clone());
        lines.push(outcome.text_or_reason().to_string());
        lines.push(String::new());
    }

    format!("{}\n", lines.join("\n").trim())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreSentiment {
    pub avg_compound: f64,
    pub overall_sentiment_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Positivity {
    /// Percentage of positive sentences
    pub positivity_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Negativity {
    /// Percentage of negative sentences
    pub negativity_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityRisk {
    pub intensity_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicsAspects {
    pub top_topics: Vec<TopicTerm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeCoverage {
    /// Pages that yielded text
    pub sources_count: usize,
    pub sentences_scanned: usize,
    pub urls_attempted: usize,
    pub urls_failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveAnalysis {
    pub status: String,
}

/// The seven dashboard groups, serialized under their display names in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiGroups {
    #[serde(rename = "Core Sentiment")]
    pub core_sentiment: CoreSentiment,
    #[serde(rename = "Positivity")]
    pub positivity: Positivity,
    #[serde(rename = "Negativity")]
    pub negativity: Negativity,
    #[serde(rename = "Intensity & Risk")]
    pub intensity_risk: IntensityRisk,
    #[serde(rename = "Topics & Aspects")]
    pub topics_aspects: TopicsAspects,
    #[serde(rename = "Volume & Coverage")]
    pub volume_coverage: VolumeCoverage,
    #[serde(rename = "Predictive Analysis")]
    pub predictive_analysis: PredictiveAnalysis,
}

/// Label distribution as percentages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub pos: f64,
    pub neg: f64,
    pub neu: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub sentiment_distribution: SentimentDistribution,
}

/// Structured result of one job. Built once and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    pub company: String,
    pub overall_sentiment_rate: f64,
    pub kpi_groups: KpiGroups,
    pub series: Series,
    pub top_topics: Vec<TopicTerm>,
    pub most_cited_words: Vec<CitedWord>,
    pub evidence: Evidence,
}

fn percent(ratio: f64) -> f64 {
    round_to(ratio * 100.0, 2)
}

impl DashboardPayload {
    /// Build the payload from scorer output and the per-URL outcomes of the job
    pub fn build(company: &str, report: &ScoreReport, outcomes: &[ExtractionOutcome]) -> Self {
        let kpis = &report.kpis;
        let sources = outcomes.iter().filter(|o| o.success).count();

        let kpi_groups = KpiGroups {
            core_sentiment: CoreSentiment {
                avg_compound: round_to(kpis.avg_compound, 4),
                overall_sentiment_rate: report.overall_sentiment_rate,
            },
            positivity: Positivity {
                positivity_ratio: percent(kpis.positivity_ratio),
            },
            negativity: Negativity {
                negativity_rate: percent(kpis.negativity_rate),
            },
            intensity_risk: IntensityRisk {
                intensity_index: round_to(kpis.intensity_index, 4),
            },
            topics_aspects: TopicsAspects {
                top_topics: report.topics.clone(),
            },
            volume_coverage: VolumeCoverage {
                sources_count: sources,
                sentences_scanned: kpis.sentences.len(),
                urls_attempted: outcomes.len(),
                urls_failed: outcomes.len() - sources,
            },
            predictive_analysis: PredictiveAnalysis {
                status: "ready".to_string(),
            },
        };

        Self {
            company: company.to_string(),
            overall_sentiment_rate: report.overall_sentiment_rate,
            kpi_groups,
            series: Series {
                sentiment_distribution: SentimentDistribution {
                    pos: percent(kpis.positivity_ratio),
                    neg: percent(kpis.negativity_rate),
                    neu: percent(kpis.neutrality_rate),
                },
            },
            top_topics: report.topics.clone(),
            most_cited_words: report.cited_words.clone(),
            evidence: report.evidence.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::score::Scorer;

    fn ok(url: &str, text: &str) -> ExtractionOutcome {
        ExtractionOutcome::succeeded(url, "readability", text.to_string())
    }

    #[test]
    fn test_assemble_layout() {
        let outcomes = vec![
            ok("https://a.com", "Body of page A"),
            ExtractionOutcome::failed(
                "https://b.com",
                FailureKind::Blocked,
                "403 Forbidden (blocked by anti-bot rules)",
            ),
        ];
        let rule = "=".repeat(80);
        let expected = format!(
            "Company: Acme\n\n{rule}\nURL: https://a.com\nSTATUS: OK\n{rule}\nBody of page A\n\n\
             {rule}\nURL: https://b.com\nSTATUS: ERROR\n{rule}\n403 Forbidden (blocked by anti-bot rules)\n"
        );
        assert_eq!(assemble("Acme", &outcomes), expected);
    }

    #[test]
    fn test_assemble_without_pages() {
        assert_eq!(assemble("Acme", &[]), "Company: Acme\n");
    }

    #[test]
    fn test_assemble_trims_trailing_whitespace() {
        let outcomes = vec![ok("https://a.com", "text")];
        let doc = assemble("Acme", &outcomes);
        assert!(doc.ends_with("text\n"));
        assert!(!doc.ends_with("\n\n"));
    }

    #[test]
    fn test_dashboard_groups_in_display_order() {
        let outcomes = vec![ok("https://a.com", "Great service, I love it. It was okay.")];
        let texts = vec![outcomes[0].text.clone()];
        let report = Scorer::default().score(&texts);
        let payload = DashboardPayload::build("Acme", &report, &outcomes);

        let json = serde_json::to_string(&payload.kpi_groups).unwrap();
        let positions: Vec<usize> = [
            "Core Sentiment",
            "Positivity",
            "Negativity",
            "Intensity & Risk",
            "Topics & Aspects",
            "Volume & Coverage",
            "Predictive Analysis",
        ]
        .iter()
        .map(|name| json.find(&format!("\"{}\"", name)).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(payload.kpi_groups.positivity.positivity_ratio, 50.0);
        assert_eq!(payload.series.sentiment_distribution.neu, 50.0);
        assert_eq!(payload.kpi_groups.volume_coverage.sources_count, 1);
        assert_eq!(payload.kpi_groups.volume_coverage.sentences_scanned, 2);
        assert_eq!(payload.kpi_groups.predictive_analysis.status, "ready");
    }

    #[test]
    fn test_dashboard_counts_failed_urls() {
        let outcomes = vec![
            ExtractionOutcome::failed("https://a.com", FailureKind::Network, "Request failed: HTTP 500"),
            ExtractionOutcome::failed("https://b.com", FailureKind::ContentTooShort, "short"),
        ];
        let payload = DashboardPayload::build("Acme", &Scorer::default().score(&[]), &outcomes);
        let coverage = &payload.kpi_groups.volume_coverage;
        assert_eq!(coverage.sources_count, 0);
        assert_eq!(coverage.urls_attempted, 2);
        assert_eq!(coverage.urls_failed, 2);
        assert_eq!(payload.overall_sentiment_rate, 47.5);
    }
}

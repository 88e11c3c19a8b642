use std::path::PathBuf;
use std::process::Command;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::CollaboratorConfig;
use crate::error::{PulseError, Result};
use crate::report::DashboardPayload;

/// Largest number of actions a recommendation response may carry
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Text-generation collaborator backed by the `claude` CLI
#[derive(Debug, Clone)]
pub struct ClaudeCli {
    command: String,
    max_turns: u32,
    allowed_tools: String,
}

impl ClaudeCli {
    pub fn new(config: &CollaboratorConfig) -> Self {
        Self {
            command: config.command.clone(),
            max_turns: config.max_turns,
            allowed_tools: config.allowed_tools.clone(),
        }
    }

    /// Check that the CLI is installed and runnable
    pub fn check_installed(&self) -> Result<()> {
        let output = Command::new(&self.command).arg("--version").output();

        match output {
            Ok(o) if o.status.success() => Ok(()),
            _ => Err(PulseError::ClaudeNotInstalled(format!(
                "`{} --version` did not run",
                self.command
            ))),
        }
    }

    /// Installed CLI version
    pub fn version(&self) -> Option<String> {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
    }

    fn workspace() -> Result<PathBuf> {
        let dir = std::env::temp_dir().join("pulse-workspace");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Run one prompt and return the model's answer text.
    ///
    /// `web` enables the configured web tools and the multi-turn budget.
    pub fn ask(&self, system_prompt: &str, prompt: &str, web: bool) -> Result<String> {
        let mut cmd = Command::new(&self.command);
        cmd.current_dir(Self::workspace()?);
        // --allowedTools must come before -p
        if web {
            cmd.args(["--allowedTools", &self.allowed_tools]);
        }
        let max_turns = (if web { self.max_turns } else { 1 }).to_string();
        cmd.args([
            "-p",
            "--output-format", "json",
            "--max-turns", &max_turns,
            "--system-prompt", system_prompt,
            prompt,
        ]);

        debug!(command = %self.command, web, "invoking collaborator");
        let output = cmd.output().map_err(|e| {
            PulseError::ClaudeNotInstalled(format!("failed to run `{}`: {}", self.command, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PulseError::ClaudeFailed(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PulseError::ClaudeFailed(format!(
                "Claude returned no output. stderr: {}",
                stderr.trim()
            )));
        }

        // The CLI wraps the model's answer in a JSON envelope
        let envelope: serde_json::Value =
            serde_json::from_str(&stdout).map_err(|e| PulseError::UpstreamFormat {
                message: format!("CLI output is not JSON: {}", e),
                raw: stdout.to_string(),
            })?;

        envelope["result"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| PulseError::UpstreamFormat {
                message: "no result in CLI response".into(),
                raw: stdout.to_string(),
            })
    }
}

/// Strip markdown code fencing from a string (e.g., ```json ... ```)
/// Also handles cases where there's text before the code block
pub fn strip_code_fencing(s: &str) -> String {
    let trimmed = s.trim();

    // Fenced JSON block anywhere in the answer
    if let Some(json_start) = trimmed.find("```json") {
        let after_fence = &trimmed[json_start + 7..];
        if let Some(end_fence) = after_fence.find("```") {
            return after_fence[..end_fence].trim().to_string();
        }
        return after_fence.trim().to_string();
    }

    // Generic fenced block
    if let Some(code_start) = trimmed.find("```\n") {
        let after_fence = &trimmed[code_start + 4..];
        if let Some(end_fence) = after_fence.find("```") {
            return after_fence[..end_fence].trim().to_string();
        }
        return after_fence.trim().to_string();
    }

    let without_prefix = trimmed.strip_prefix("```").unwrap_or(trimmed).trim();
    let without_suffix = without_prefix.strip_suffix("```").unwrap_or(without_prefix);
    without_suffix.trim().to_string()
}

/// Parse a collaborator answer against a fixed schema.
///
/// Anything that is not JSON of the expected shape is an `UpstreamFormat`
/// error carrying the raw answer.
pub fn parse_strict<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let json_text = strip_code_fencing(raw);
    serde_json::from_str(&json_text).map_err(|e| PulseError::UpstreamFormat {
        message: e.to_string(),
        raw: raw.to_string(),
    })
}

/// Urgency of a recommended action, most urgent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Urgency::Critical => "Critical",
            Urgency::High => "High",
            Urgency::Medium => "Medium",
            Urgency::Low => "Low",
        };
        write!(f, "{}", label)
    }
}

/// One recommended action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub rank: u32,
    pub title: String,
    pub urgency: Urgency,
    pub rationale: String,
    pub kpis_impacted: Vec<String>,
    /// Expected gain in the composite rate, in points
    pub expected_uplift: f64,
    pub time_horizon: String,
}

#[derive(Debug, Deserialize)]
struct RecommendationResponse {
    actions: Vec<Recommendation>,
}

/// What the advisor is told about a finished job
#[derive(Debug, Clone, Serialize)]
pub struct AdvisorRequest {
    pub subject: String,
    pub overall_sentiment_rate: f64,
    /// Headline metrics as (name, value)
    pub kpi_summary: Vec<(String, f64)>,
    pub top_topics: Vec<String>,
    pub negative_evidence: Vec<String>,
}

impl AdvisorRequest {
    pub fn from_dashboard(dashboard: &DashboardPayload) -> Self {
        let groups = &dashboard.kpi_groups;
        Self {
            subject: dashboard.company.clone(),
            overall_sentiment_rate: dashboard.overall_sentiment_rate,
            kpi_summary: vec![
                ("avg_compound".into(), groups.core_sentiment.avg_compound),
                ("positivity_ratio".into(), groups.positivity.positivity_ratio),
                ("negativity_rate".into(), groups.negativity.negativity_rate),
                ("intensity_index".into(), groups.intensity_risk.intensity_index),
                ("sources_count".into(), groups.volume_coverage.sources_count as f64),
            ],
            top_topics: dashboard.top_topics.iter().map(|t| t.term.clone()).collect(),
            negative_evidence: dashboard
                .evidence
                .most_negative
                .iter()
                .map(|s| s.text.clone())
                .collect(),
        }
    }
}

/// Recommendation collaborator
pub trait Advisor: Send + Sync {
    /// Fails when the collaborator cannot be reached at all
    fn check_credential(&self) -> Result<()>;

    fn recommend(&self, request: &AdvisorRequest) -> Result<Vec<Recommendation>>;
}

const ADVISOR_SYSTEM_PROMPT: &str = "You are a brand reputation strategist. Respond only with valid JSON matching the schema provided. Do not include any text before or after the JSON.";

const ADVISOR_PROMPT: &str = r#"A reputation scan of public web pages about a company has finished.

Company: {{subject}}
Overall sentiment rate (0-100): {{rate}}

Key metrics:
{{kpis}}

Most discussed topics: {{topics}}

Most negative statements found:
{{evidence}}

Propose at most 5 concrete actions that would raise the overall sentiment rate,
ordered from most to least urgent.

Respond with JSON only:
{
  "actions": [
    {
      "rank": 1,
      "title": "short imperative title",
      "urgency": "Critical" | "High" | "Medium" | "Low",
      "rationale": "why this matters, citing the evidence",
      "kpis_impacted": ["negativity_rate", "..."],
      "expected_uplift": 4.5,
      "time_horizon": "2-4 weeks"
    }
  ]
}
"#;

pub fn build_advisor_prompt(request: &AdvisorRequest) -> String {
    let kpis = request
        .kpi_summary
        .iter()
        .map(|(name, value)| format!("- {}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n");
    let evidence = if request.negative_evidence.is_empty() {
        "(none)".to_string()
    } else {
        request
            .negative_evidence
            .iter()
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n")
    };

    ADVISOR_PROMPT
        .replace("{{subject}}", &request.subject)
        .replace("{{rate}}", &request.overall_sentiment_rate.to_string())
        .replace("{{kpis}}", &kpis)
        .replace("{{topics}}", &request.top_topics.join(", "))
        .replace("{{evidence}}", &evidence)
}

/// Parse and validate an advisor answer.
///
/// At most five actions, ranked 1..=n in order, urgency never rising.
pub fn parse_recommendations(raw: &str) -> Result<Vec<Recommendation>> {
    let response: RecommendationResponse = parse_strict(raw)?;
    let actions = response.actions;
    let violation = |message: String| PulseError::UpstreamFormat {
        message,
        raw: raw.to_string(),
    };

    if actions.len() > MAX_RECOMMENDATIONS {
        return Err(violation(format!(
            "{} actions returned, at most {} allowed",
            actions.len(),
            MAX_RECOMMENDATIONS
        )));
    }
    for (i, action) in actions.iter().enumerate() {
        if action.rank as usize != i + 1 {
            return Err(violation(format!(
                "action {} has rank {}, expected {}",
                i + 1,
                action.rank,
                i + 1
            )));
        }
        if action.title.trim().is_empty() {
            return Err(violation(format!("action {} has an empty title", i + 1)));
        }
        if !action.expected_uplift.is_finite() {
            return Err(violation(format!("action {} has a non-numeric uplift", i + 1)));
        }
    }
    if let Some(pair) = actions.windows(2).find(|w| w[1].urgency < w[0].urgency) {
        return Err(violation(format!(
            "actions not ordered by urgency: '{}' ({}) follows '{}' ({})",
            pair[1].title, pair[1].urgency, pair[0].title, pair[0].urgency
        )));
    }

    Ok(actions)
}

impl Advisor for ClaudeCli {
    fn check_credential(&self) -> Result<()> {
        self.check_installed()
    }

    fn recommend(&self, request: &AdvisorRequest) -> Result<Vec<Recommendation>> {
        let prompt = build_advisor_prompt(request);
        let answer = self.ask(ADVISOR_SYSTEM_PROMPT, &prompt, false)?;
        let actions = parse_recommendations(&answer)?;
        info!(subject = %request.subject, actions = actions.len(), "recommendations received");
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(rank: u32, urgency: &str) -> String {
        format!(
            r#"{{"rank": {rank}, "title": "Action {rank}", "urgency": "{urgency}",
                "rationale": "because", "kpis_impacted": ["negativity_rate"],
                "expected_uplift": 3.5, "time_horizon": "1 month"}}"#
        )
    }

    fn response(actions: &[String]) -> String {
        format!(r#"{{"actions": [{}]}}"#, actions.join(","))
    }

    #[test]
    fn test_strip_code_fencing() {
        let input = "```json\n{\"foo\": \"bar\"}\n```";
        assert_eq!(strip_code_fencing(input), "{\"foo\": \"bar\"}");

        let input = "```\n{\"foo\": \"bar\"}\n```";
        assert_eq!(strip_code_fencing(input), "{\"foo\": \"bar\"}");

        let input = "{\"foo\": \"bar\"}";
        assert_eq!(strip_code_fencing(input), "{\"foo\": \"bar\"}");

        let input = "  ```json\n  {\"foo\": \"bar\"}  \n```  ";
        assert_eq!(strip_code_fencing(input), "{\"foo\": \"bar\"}");

        let input = "Based on my analysis:\n```json\n{\"foo\": \"bar\"}\n```\nHope this helps!";
        assert_eq!(strip_code_fencing(input), "{\"foo\": \"bar\"}");
    }

    #[test]
    fn test_parse_recommendations() {
        let raw = response(&[action(1, "Critical"), action(2, "High"), action(3, "High")]);
        let actions = parse_recommendations(&raw).unwrap();
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].urgency, Urgency::Critical);
        assert_eq!(actions[2].kpis_impacted, vec!["negativity_rate"]);
    }

    #[test]
    fn test_fenced_recommendations_accepted() {
        let raw = format!("Here you go:\n```json\n{}\n```", response(&[action(1, "Low")]));
        assert_eq!(parse_recommendations(&raw).unwrap().len(), 1);
    }

    #[test]
    fn test_non_json_is_upstream_format_with_raw_text() {
        let raw = "I think you should improve customer service.";
        match parse_recommendations(raw) {
            Err(PulseError::UpstreamFormat { raw: kept, .. }) => assert_eq!(kept, raw),
            other => panic!("expected UpstreamFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_violations_rejected() {
        let too_many: Vec<String> = (1..=6).map(|r| action(r, "Low")).collect();
        let gap = vec![action(1, "High"), action(3, "Medium")];
        let rising = vec![action(1, "Low"), action(2, "Critical")];
        let bad_urgency = vec![action(1, "Urgent")];
        let missing_field = r#"{"actions": [{"rank": 1, "title": "x"}]}"#.to_string();

        for raw in [
            response(&too_many),
            response(&gap),
            response(&rising),
            response(&bad_urgency),
            missing_field,
        ] {
            let err = parse_recommendations(&raw).unwrap_err();
            assert!(matches!(err, PulseError::UpstreamFormat { .. }), "{raw}");
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_advisor_prompt_mentions_evidence() {
        let request = AdvisorRequest {
            subject: "Acme".into(),
            overall_sentiment_rate: 41.2,
            kpi_summary: vec![("negativity_rate".into(), 38.0)],
            top_topics: vec!["refund".into(), "delivery".into()],
            negative_evidence: vec!["The refund never arrived".into()],
        };
        let prompt = build_advisor_prompt(&request);
        assert!(prompt.contains("Company: Acme"));
        assert!(prompt.contains("41.2"));
        assert!(prompt.contains("- negativity_rate: 38"));
        assert!(prompt.contains("refund, delivery"));
        assert!(prompt.contains("- The refund never arrived"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_urgency_order() {
        assert!(Urgency::Critical < Urgency::High);
        assert!(Urgency::Medium < Urgency::Low);
    }
}

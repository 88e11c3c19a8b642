//! Corpus scoring: sentence sentiment, aggregate KPIs, the composite
//! reputation rate, salient topics and most-cited words.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ScoreConfig;
use crate::lexicon::is_stop_word;
use crate::normalize::char_len;
use crate::sentiment::{polarity, round_to, Label, SentenceScore};

// Words of two or more word characters, the topic tokenizer
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\w\w+\b").expect("Invalid token regex pattern")
});

/// Minimum length of a most-cited word
const MIN_CITED_WORD_CHARS: usize = 5;

/// Composite rate weights
const W_COMPOUND: f64 = 0.45;
const W_POSITIVE: f64 = 0.30;
const W_NOT_NEGATIVE: f64 = 0.25;
const INTENSITY_PENALTY: f64 = 0.10;

/// Split a corpus into sentences: documents are joined by blank lines,
/// line breaks become spaces and the text is cut on every period.
pub fn split_sentences(texts: &[String], max_sentences: usize) -> Vec<String> {
    texts
        .join("\n\n")
        .replace('\n', " ")
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(max_sentences)
        .map(String::from)
        .collect()
}

/// Aggregate sentiment metrics for a set of scored sentences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusKpis {
    /// Scored sentences in corpus order
    pub sentences: Vec<SentenceScore>,
    pub avg_compound: f64,
    pub positivity_ratio: f64,
    pub negativity_rate: f64,
    pub neutrality_rate: f64,
    /// Mean absolute compound
    pub intensity_index: f64,
}

impl CorpusKpis {
    /// All metrics are 0.0 for an empty slice
    pub fn from_scores(scores: &[SentenceScore]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let n = scores.len() as f64;
        let count = |label: Label| scores.iter().filter(|s| s.label() == label).count() as f64;

        Self {
            sentences: scores.to_vec(),
            avg_compound: scores.iter().map(|s| s.compound).sum::<f64>() / n,
            positivity_ratio: count(Label::Positive) / n,
            negativity_rate: count(Label::Negative) / n,
            neutrality_rate: count(Label::Neutral) / n,
            intensity_index: scores.iter().map(|s| s.compound.abs()).sum::<f64>() / n,
        }
    }
}

/// Composite reputation rate in [0, 100], rounded to two decimals.
///
/// An empty or entirely neutral corpus lands at exactly 47.5.
pub fn overall_sentiment_rate(kpis: &CorpusKpis) -> f64 {
    let centered = (kpis.avg_compound + 1.0) / 2.0;
    let raw = W_COMPOUND * centered
        + W_POSITIVE * kpis.positivity_ratio
        + W_NOT_NEGATIVE * (1.0 - kpis.negativity_rate)
        - INTENSITY_PENALTY * kpis.intensity_index.clamp(0.0, 1.0);
    round_to(raw.clamp(0.0, 1.0) * 100.0, 2)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicTerm {
    pub term: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitedWord {
    pub word: String,
    pub count: usize,
}

/// Counts that remember the order in which keys first appeared
#[derive(Default)]
struct OrderedCounts {
    index: HashMap<String, usize>,
    entries: Vec<(String, f64)>,
}

impl OrderedCounts {
    fn add(&mut self, key: &str, amount: f64) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), amount));
            }
        }
    }

    /// Entries by descending value, ties kept in first-seen order
    fn ranked(mut self) -> Vec<(String, f64)> {
        self.entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        self.entries
    }
}

/// Unigrams and bigrams of a document, stop words removed first
fn document_terms(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| !is_stop_word(w))
        .collect();

    let bigrams = words.windows(2).map(|pair| format!("{} {}", pair[0], pair[1]));
    words.iter().map(|w| w.to_string()).chain(bigrams).collect()
}

/// Salient terms by summed TF-IDF weight across documents.
///
/// Only documents longer than `min_document_chars` take part. Each document
/// vector uses raw term counts times smoothed idf and is L2-normalized; the
/// vocabulary keeps the `max_features` most frequent terms.
pub fn top_topics(
    texts: &[String],
    top_k: usize,
    min_document_chars: usize,
    max_features: usize,
) -> Vec<TopicTerm> {
    let documents: Vec<Vec<String>> = texts
        .iter()
        .filter(|t| char_len(t) > min_document_chars)
        .map(|t| document_terms(t))
        .collect();
    if documents.is_empty() {
        return Vec::new();
    }

    let mut corpus_counts = OrderedCounts::default();
    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for terms in &documents {
        let mut seen: HashSet<&str> = HashSet::new();
        for term in terms {
            corpus_counts.add(term, 1.0);
            seen.insert(term.as_str());
        }
        for term in seen {
            *doc_freq.entry(term).or_insert(0) += 1;
        }
    }

    let vocabulary: HashSet<String> = corpus_counts
        .ranked()
        .into_iter()
        .take(max_features)
        .map(|(term, _)| term)
        .collect();

    let n = documents.len() as f64;
    let idf = |term: &str| {
        let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
        ((1.0 + n) / (1.0 + df)).ln() + 1.0
    };

    let mut totals = OrderedCounts::default();
    for terms in &documents {
        let mut tf = OrderedCounts::default();
        for term in terms.iter().filter(|t| vocabulary.contains(t.as_str())) {
            tf.add(term, 1.0);
        }
        let weighted: Vec<(String, f64)> = tf
            .entries
            .into_iter()
            .map(|(term, count)| {
                let w = count * idf(&term);
                (term, w)
            })
            .collect();
        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            continue;
        }
        for (term, w) in weighted {
            totals.add(&term, w / norm);
        }
    }

    totals
        .ranked()
        .into_iter()
        .take(top_k)
        .map(|(term, weight)| TopicTerm {
            term,
            weight: round_to(weight, 4),
        })
        .collect()
}

/// Most frequent content words across the corpus
pub fn most_cited_words(texts: &[String], top_k: usize) -> Vec<CitedWord> {
    let mut counts = OrderedCounts::default();
    for text in texts {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        for word in cleaned.split_whitespace() {
            if char_len(word) >= MIN_CITED_WORD_CHARS
                && !is_stop_word(word)
                && !word.chars().all(|c| c.is_ascii_digit())
            {
                counts.add(word, 1.0);
            }
        }
    }

    counts
        .ranked()
        .into_iter()
        .take(top_k)
        .map(|(word, count)| CitedWord {
            word,
            count: count as usize,
        })
        .collect()
}

/// Sentences supporting the composite rate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Lowest compound first
    pub most_negative: Vec<SentenceScore>,
    /// Highest compound first
    pub most_positive: Vec<SentenceScore>,
}

/// Pick the `per_side` extreme sentences on each side, ties in original order
pub fn select_evidence(scores: &[SentenceScore], per_side: usize) -> Evidence {
    let mut ascending: Vec<&SentenceScore> = scores.iter().collect();
    ascending.sort_by(|a, b| a.compound.total_cmp(&b.compound));
    let mut descending: Vec<&SentenceScore> = scores.iter().collect();
    descending.sort_by(|a, b| b.compound.total_cmp(&a.compound));

    Evidence {
        most_negative: ascending.into_iter().take(per_side).cloned().collect(),
        most_positive: descending.into_iter().take(per_side).cloned().collect(),
    }
}

/// Everything the scorer derives from one corpus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub kpis: CorpusKpis,
    pub overall_sentiment_rate: f64,
    pub topics: Vec<TopicTerm>,
    pub cited_words: Vec<CitedWord>,
    pub evidence: Evidence,
}

/// Scores a corpus of extracted page texts
pub struct Scorer {
    config: ScoreConfig,
}

impl Scorer {
    pub fn new(config: &ScoreConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn score(&self, texts: &[String]) -> ScoreReport {
        let sentences = split_sentences(texts, self.config.max_sentences);
        let scores: Vec<SentenceScore> = sentences.iter().map(|s| polarity(s)).collect();
        debug!(documents = texts.len(), sentences = scores.len(), "sentences scored");

        let kpis = CorpusKpis::from_scores(&scores);
        let rate = overall_sentiment_rate(&kpis);
        let topics = top_topics(
            texts,
            self.config.top_topics,
            self.config.min_document_chars,
            self.config.max_features,
        );
        let cited_words = most_cited_words(texts, self.config.top_words);
        let evidence = select_evidence(&scores, self.config.evidence);

        info!(
            sentences = kpis.sentences.len(),
            rate,
            topics = topics.len(),
            "corpus scored"
        );

        ScoreReport {
            kpis,
            overall_sentiment_rate: rate,
            topics,
            cited_words,
            evidence,
        }
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(&ScoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn scored(compounds: &[f64]) -> Vec<SentenceScore> {
        compounds
            .iter()
            .enumerate()
            .map(|(i, c)| SentenceScore {
                text: format!("s{i}"),
                compound: *c,
                pos: 0.0,
                neg: 0.0,
                neu: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_split_sentences() {
        let corpus = texts(&["First line.\nStill first. Second", "Third doc. . "]);
        assert_eq!(
            split_sentences(&corpus, 100),
            vec!["First line", "Still first", "Second  Third doc"]
        );
    }

    #[test]
    fn test_split_sentences_capped() {
        let corpus = texts(&["a. b. c. d. e."]);
        assert_eq!(split_sentences(&corpus, 2), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_corpus_kpis_are_zero() {
        let kpis = CorpusKpis::from_scores(&[]);
        assert_eq!(kpis, CorpusKpis::default());
        assert_eq!(overall_sentiment_rate(&kpis), 47.5);
    }

    #[test]
    fn test_neutral_corpus_rate() {
        let kpis = CorpusKpis::from_scores(&scored(&[0.0, 0.01, -0.02]));
        assert_eq!(kpis.neutrality_rate, 1.0);
        assert!((overall_sentiment_rate(&kpis) - 47.5).abs() < 0.5);

        let flat = CorpusKpis::from_scores(&scored(&[0.0, 0.0]));
        assert_eq!(overall_sentiment_rate(&flat), 47.5);
    }

    #[test]
    fn test_rate_bounds() {
        let best = CorpusKpis::from_scores(&scored(&[1.0, 1.0]));
        let worst = CorpusKpis::from_scores(&scored(&[-1.0, -1.0]));
        let best_rate = overall_sentiment_rate(&best);
        let worst_rate = overall_sentiment_rate(&worst);
        // 0.45 + 0.30 + 0.25 - 0.10
        assert_eq!(best_rate, 90.0);
        assert_eq!(worst_rate, 0.0);
    }

    #[test]
    fn test_ratios_sum_to_one() {
        let kpis = CorpusKpis::from_scores(&scored(&[0.5, -0.3, 0.0, 0.9, 0.04]));
        let total = kpis.positivity_ratio + kpis.negativity_rate + kpis.neutrality_rate;
        assert!((total - 1.0).abs() < 1e-9);
        assert!((kpis.intensity_index - 1.74 / 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_most_cited_words() {
        let corpus = texts(&[
            "Refund refund! The refund took 12345 days; delivery was late.",
            "Delivery: fast. Refund-policy unclear, 2024 again",
        ]);
        let words = most_cited_words(&corpus, 3);
        assert_eq!(
            words,
            vec![
                CitedWord { word: "refund".into(), count: 4 },
                CitedWord { word: "delivery".into(), count: 2 },
                CitedWord { word: "policy".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_topics_skip_short_documents() {
        let corpus = texts(&["short text about refunds"]);
        assert!(top_topics(&corpus, 12, 50, 3000).is_empty());
    }

    #[test]
    fn test_topics_ranked_and_unique() {
        let corpus = texts(&[
            "Customer service was helpful and customer service answered quickly every time.",
            "The mobile app crashes often and the mobile app support team never replies.",
            "Customer service staff explained the billing error and fixed the billing quickly.",
        ]);
        let topics = top_topics(&corpus, 12, 50, 3000);
        assert_eq!(topics.len(), 12);
        assert!(topics.windows(2).all(|w| w[0].weight >= w[1].weight));
        let mut terms: Vec<&str> = topics.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(topics[0].term, "customer");
        assert!(terms.contains(&"customer service"));
        terms.sort();
        terms.dedup();
        assert_eq!(terms.len(), 12);
        // Stop words never form terms
        assert!(!terms.iter().any(|t| t.split(' ').any(is_stop_word)));
    }

    #[test]
    fn test_scored_sentences_follow_split_order() {
        let corpus = texts(&[
            "The refund never came. Support was friendly.\nPrices went up",
            "I love the new app. It crashes on login.",
        ]);
        let report = Scorer::default().score(&corpus);
        let kept: Vec<&str> = report.kpis.sentences.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(kept, split_sentences(&corpus, 2000));
        assert_eq!(
            kept,
            vec![
                "The refund never came",
                "Support was friendly",
                "Prices went up  I love the new app",
                "It crashes on login",
            ]
        );
        assert_eq!(report.kpis.sentences[1].compound, polarity("Support was friendly").compound);
    }

    #[test]
    fn test_tied_topics_keep_first_seen_order() {
        // One word apart: every shared term ties, as do the two odd words
        let corpus = texts(&[
            "Refund delivery courier parcel warehouse tracking delayed",
            "Refund delivery courier parcel warehouse tracking damaged",
        ]);
        let topics = top_topics(&corpus, 20, 50, 3000);
        let terms: Vec<&str> = topics.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(
            terms,
            vec![
                "refund",
                "delivery",
                "courier",
                "parcel",
                "warehouse",
                "tracking",
                "refund delivery",
                "delivery courier",
                "courier parcel",
                "parcel warehouse",
                "warehouse tracking",
                "delayed",
                "tracking delayed",
                "damaged",
                "tracking damaged",
            ]
        );
        assert_eq!(topics[0].weight, topics[10].weight);
        assert_eq!(topics[11].weight, topics[14].weight);
        assert!(topics[10].weight > topics[11].weight);
    }

    #[test]
    fn test_evidence_extremes_keep_order_on_ties() {
        let scores = scored(&[0.2, -0.5, 0.9, -0.5, 0.9, 0.0]);
        let evidence = select_evidence(&scores, 2);
        let neg: Vec<&str> = evidence.most_negative.iter().map(|s| s.text.as_str()).collect();
        let pos: Vec<&str> = evidence.most_positive.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(neg, vec!["s1", "s3"]);
        assert_eq!(pos, vec!["s2", "s4"]);
    }

    #[test]
    fn test_scorer_on_empty_corpus() {
        let report = Scorer::default().score(&[]);
        assert!(report.kpis.sentences.is_empty());
        assert_eq!(report.overall_sentiment_rate, 47.5);
        assert!(report.topics.is_empty());
        assert!(report.cited_words.is_empty());
        assert!(report.evidence.most_negative.is_empty());
    }
}

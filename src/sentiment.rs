//! Rule-based sentence sentiment.
//!
//! Valence comes from the embedded lexicon and is shifted by boosters,
//! negations, a contrastive "but", shouted words and exclamation marks,
//! then squashed into a compound score in [-1, 1].

use serde::{Deserialize, Serialize};

use crate::lexicon::{self, CAPS_INCREMENT, NEGATION_SCALAR};

/// Compound at or above this is positive, at or below its negation negative
pub const LABEL_THRESHOLD: f64 = 0.05;

/// Normalization constant of the compound score
const ALPHA: f64 = 15.0;

/// Booster influence by distance: one, two and three tokens back
const BOOSTER_DAMPING: [f64; 3] = [1.0, 0.95, 0.9];

const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const QUESTION_INCREMENT: f64 = 0.18;
const QUESTION_CAP: f64 = 0.96;

const BUT_BEFORE: f64 = 0.5;
const BUT_AFTER: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Negative,
    Neutral,
}

/// Sentiment of one sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceScore {
    pub text: String,
    /// Normalized polarity in [-1, 1]
    pub compound: f64,
    pub pos: f64,
    pub neg: f64,
    pub neu: f64,
}

impl SentenceScore {
    pub fn label(&self) -> Label {
        if self.compound >= LABEL_THRESHOLD {
            Label::Positive
        } else if self.compound <= -LABEL_THRESHOLD {
            Label::Negative
        } else {
            Label::Neutral
        }
    }
}

struct Token {
    lower: String,
    shouted: bool,
}

fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| word.chars().count() > 1)
        .map(|word| Token {
            lower: word.to_lowercase(),
            shouted: word.chars().any(char::is_alphabetic)
                && !word.chars().any(char::is_lowercase),
        })
        .collect()
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
    let questions = text.matches('?').count();
    let question_emphasis = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * QUESTION_INCREMENT,
        _ => QUESTION_CAP,
    };
    exclamations as f64 * EXCLAMATION_INCREMENT + question_emphasis
}

/// Valence of the token at `index` after booster, caps and negation rules
fn token_valence(tokens: &[Token], index: usize, caps_differ: bool) -> f64 {
    let token = &tokens[index];
    if lexicon::booster(&token.lower).is_some() {
        return 0.0;
    }
    let Some(mut valence) = lexicon::valence(&token.lower) else {
        return 0.0;
    };

    if caps_differ && token.shouted {
        valence += CAPS_INCREMENT.copysign(valence);
    }

    for (distance, damping) in BOOSTER_DAMPING.iter().enumerate() {
        let Some(prev_index) = index.checked_sub(distance + 1) else {
            break;
        };
        let prev = &tokens[prev_index];
        if let Some(boost) = lexicon::booster(&prev.lower) {
            let mut shift = if valence < 0.0 { -boost } else { boost };
            if caps_differ && prev.shouted {
                shift += CAPS_INCREMENT.copysign(valence);
            }
            valence += shift * damping;
        }
        if lexicon::is_negation(&prev.lower) {
            valence *= NEGATION_SCALAR;
        }
    }

    valence
}

/// Score one sentence.
///
/// A sentence without any scorable token is fully neutral.
pub fn polarity(text: &str) -> SentenceScore {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return SentenceScore {
            text: text.to_string(),
            compound: 0.0,
            pos: 0.0,
            neg: 0.0,
            neu: 1.0,
        };
    }

    let caps_differ = tokens.iter().any(|t| t.shouted) && tokens.iter().any(|t| !t.shouted);
    let mut valences: Vec<f64> = (0..tokens.len())
        .map(|i| token_valence(&tokens, i, caps_differ))
        .collect();

    // Sentiment after "but" dominates what came before it
    if let Some(pivot) = tokens.iter().position(|t| t.lower == "but") {
        for (i, v) in valences.iter_mut().enumerate() {
            if i < pivot {
                *v *= BUT_BEFORE;
            } else if i > pivot {
                *v *= BUT_AFTER;
            }
        }
    }

    let emphasis = punctuation_emphasis(text);
    let mut sum: f64 = valences.iter().sum();
    if sum > 0.0 {
        sum += emphasis;
    } else if sum < 0.0 {
        sum -= emphasis;
    }
    let compound = normalize(sum);

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neu_count = 0.0;
    for v in &valences {
        if *v > 0.0 {
            pos_sum += v + 1.0;
        } else if *v < 0.0 {
            neg_sum += v - 1.0;
        } else {
            neu_count += 1.0;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += emphasis;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= emphasis;
    }

    let total = pos_sum + neg_sum.abs() + neu_count;
    SentenceScore {
        text: text.to_string(),
        compound: round_to(compound, 4),
        pos: round_to((pos_sum / total).abs(), 3),
        neg: round_to((neg_sum / total).abs(), 3),
        neu: round_to((neu_count / total).abs(), 3),
    }
}

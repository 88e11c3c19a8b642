//! Word lists used by the scorer: valence lexicon, intensity boosters,
//! negations and English stop words.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// Added to (or subtracted from) a valence by a booster word
pub const BOOST_INCREMENT: f64 = 0.293;
/// Multiplier applied to a valence negated within the lookback window
pub const NEGATION_SCALAR: f64 = -0.74;
/// Emphasis for a shouted word in an otherwise mixed-case sentence
pub const CAPS_INCREMENT: f64 = 0.733;

/// Mean human valence ratings on a -4..=4 scale
static VALENCE: &[(&str, f64)] = &[
    ("abandon", -1.9), ("abandoned", -2.0), ("abuse", -3.2), ("abused", -2.3),
    ("abusive", -3.2), ("accept", 1.6), ("accepted", 1.1), ("accessible", 1.3),
    ("accomplished", 1.9), ("accurate", 1.2), ("admire", 2.1), ("adorable", 2.2),
    ("advantage", 1.0), ("advantages", 1.5), ("afraid", -2.2), ("aggressive", -0.6),
    ("agree", 1.5), ("alarming", -1.8), ("amazing", 2.8), ("amazingly", 2.5),
    ("angry", -2.3), ("annoyed", -1.6), ("annoying", -1.7), ("anxious", -1.0),
    ("apologise", 1.6), ("apologize", 0.4), ("appalling", -2.4), ("appreciate", 1.7),
    ("appreciated", 2.3), ("approval", 2.1), ("approved", 1.8), ("arrogant", -1.8),
    ("ashamed", -2.1), ("attractive", 1.9), ("avoid", -1.2), ("awesome", 3.1),
    ("awful", -2.0), ("awkward", -0.6), ("bad", -2.5), ("badly", -2.1),
    ("bankrupt", -2.6), ("beautiful", 2.9), ("benefit", 2.0), ("benefits", 1.6),
    ("best", 3.2), ("better", 1.9), ("betrayed", -3.0), ("bias", -0.4),
    ("blame", -1.4), ("blessed", 2.9), ("bored", -1.1), ("boring", -1.3),
    ("bother", -1.4), ("brilliant", 2.8), ("broken", -2.1), ("bug", -0.8),
    ("bugs", -0.8), ("burden", -1.9), ("calm", 1.3), ("care", 2.2),
    ("cared", 1.8), ("careful", 0.6), ("careless", -1.5), ("caring", 2.2),
    ("celebrate", 2.7), ("chaos", -2.7), ("chaotic", -2.2), ("charming", 2.8),
    ("cheap", -0.1), ("cheat", -2.0), ("cheated", -2.3), ("cheerful", 2.5),
    ("clean", 1.7), ("clear", 1.6), ("clever", 2.0), ("comfortable", 2.3),
    ("commitment", 1.6), ("complain", -1.5), ("complained", -1.7), ("complaint", -1.2),
    ("complaints", -1.7), ("confident", 2.2), ("confused", -1.3), ("confusing", -0.9),
    ("convenient", 1.9), ("cool", 1.3), ("corrupt", -3.0), ("costly", -0.9),
    ("crash", -1.7), ("crashed", -1.6), ("crazy", -1.4), ("creative", 1.9),
    ("crisis", -3.1), ("critical", -0.7), ("criticism", -1.9), ("cruel", -2.8),
    ("damage", -2.2), ("damaged", -1.9), ("danger", -2.4), ("dangerous", -2.1),
    ("dead", -3.3), ("decent", 1.6), ("defect", -1.4), ("defective", -1.9),
    ("delay", -1.3), ("delayed", -0.9), ("delays", -1.5), ("delight", 2.9),
    ("delighted", 2.3), ("delightful", 2.9), ("denied", -1.9), ("dependable", 1.9),
    ("depressed", -2.3), ("deserve", 0.9), ("destroy", -2.5), ("difficult", -1.5),
    ("dirty", -1.9), ("disappoint", -2.3), ("disappointed", -1.9), ("disappointing", -2.2),
    ("disappointment", -2.3), ("disaster", -3.1), ("disgusting", -2.4), ("dishonest", -2.7),
    ("dislike", -1.6), ("dissatisfied", -1.6), ("distrust", -1.8), ("doubt", -1.5),
    ("dreadful", -2.7), ("dumb", -2.3), ("eager", 1.5), ("ease", 1.5),
    ("easy", 1.9), ("efficient", 1.8), ("effective", 2.1), ("embarrassed", -1.5),
    ("empathy", 1.7), ("encourage", 2.3), ("energetic", 2.1), ("enjoy", 2.2),
    ("enjoyed", 2.3), ("enthusiastic", 1.9), ("ethical", 2.3), ("excellence", 3.1),
    ("excellent", 2.7), ("excited", 1.4), ("exciting", 2.2), ("expensive", -0.9),
    ("fail", -2.5), ("failed", -2.3), ("failing", -2.2), ("fails", -1.8),
    ("failure", -2.3), ("fair", 1.3), ("fake", -2.1), ("fantastic", 2.6),
    ("fault", -1.7), ("faulty", -1.8), ("favorite", 2.0), ("favourite", 2.1),
    ("fear", -2.2), ("fine", 0.8), ("flawed", -1.6), ("flawless", 2.3),
    ("fraud", -2.8), ("fraudulent", -3.1), ("free", 2.3), ("friendly", 2.2),
    ("frustrated", -2.4), ("frustrating", -1.9), ("frustration", -2.1), ("fun", 2.3),
    ("generous", 2.3), ("genius", 1.9), ("glad", 2.0), ("good", 1.9),
    ("gorgeous", 3.0), ("grateful", 2.0), ("great", 3.1), ("greatest", 3.2),
    ("greed", -1.7), ("greedy", -1.3), ("grief", -2.2), ("guilty", -1.8),
    ("happily", 2.1), ("happiness", 2.6), ("happy", 2.7), ("harassment", -2.5),
    ("hard", -0.4), ("harm", -2.5), ("harmful", -2.3), ("hate", -2.7),
    ("hated", -3.2), ("hates", -1.9), ("helpful", 1.7), ("helpless", -2.0),
    ("hero", 2.6), ("honest", 2.3), ("honesty", 2.2), ("hope", 1.9),
    ("hopeful", 1.6), ("hopeless", -2.0), ("horrible", -2.5), ("hostile", -2.2),
    ("hurt", -2.4), ("ideal", 2.4), ("ignored", -1.3), ("ill", -1.8),
    ("impressed", 2.1), ("impressive", 2.3), ("improve", 1.9), ("improved", 2.1),
    ("improvement", 2.0), ("inadequate", -1.7), ("incompetent", -2.3), ("inconvenient", -1.5),
    ("ineffective", -1.6), ("inefficient", -1.7), ("innovative", 1.9), ("insane", -1.7),
    ("inspiring", 2.6), ("insult", -2.3), ("intelligent", 2.0), ("interesting", 1.7),
    ("irritating", -2.0), ("issue", -0.6), ("issues", -0.6), ("joy", 2.8),
    ("kind", 2.4), ("lack", -1.3), ("lacking", -1.4), ("lame", -1.8),
    ("lawsuit", -0.9), ("lazy", -1.5), ("leak", -1.4), ("liar", -2.3),
    ("lie", -1.6), ("lied", -1.6), ("lies", -1.8), ("like", 2.0),
    ("liked", 1.8), ("loss", -1.3), ("losses", -1.7), ("lost", -1.3),
    ("love", 3.2), ("loved", 2.9), ("lovely", 2.8), ("loves", 2.7),
    ("loyal", 2.1), ("loyalty", 2.5), ("lucky", 1.8), ("mess", -1.5),
    ("messy", -1.5), ("mislead", -1.7), ("misleading", -1.7), ("miserable", -2.2),
    ("mistake", -1.4), ("mistakes", -1.5), ("nasty", -2.6), ("neglect", -2.0),
    ("negligent", -1.6), ("nice", 1.8), ("nightmare", -3.0), ("noisy", -0.7),
    ("offended", -1.0), ("offensive", -2.2), ("opportunity", 1.8), ("optimistic", 1.3),
    ("outage", -1.6), ("outrage", -2.3), ("outstanding", 3.0), ("overpriced", -1.5),
    ("pain", -2.3), ("painful", -1.9), ("panic", -2.3), ("pathetic", -2.7),
    ("perfect", 2.7), ("perfectly", 3.2), ("pleasant", 2.3), ("pleased", 1.9),
    ("pleasure", 2.7), ("polite", 2.1), ("poor", -2.1), ("poorly", -1.6),
    ("popular", 1.8), ("positive", 2.6), ("praise", 2.6), ("praised", 2.2),
    ("problem", -1.7), ("problems", -1.7), ("productive", 1.8), ("professional", 1.9),
    ("profit", 1.9), ("progress", 1.8), ("promising", 1.9), ("protect", 1.6),
    ("proud", 2.1), ("quality", 1.5), ("recommend", 1.5), ("recommended", 0.8),
    ("refused", -1.2), ("regret", -1.8), ("reliable", 2.1), ("relief", 2.1),
    ("relieved", 1.6), ("reputable", 1.7), ("respect", 2.1), ("respected", 1.8),
    ("responsive", 1.5), ("rewarding", 2.4), ("ridiculous", -1.5), ("risk", -1.1),
    ("risky", -0.8), ("robust", 1.4), ("rude", -2.0), ("ruined", -2.4),
    ("sad", -2.1), ("safe", 1.9), ("satisfied", 1.8), ("satisfying", 2.0),
    ("scam", -2.6), ("scandal", -1.9), ("scared", -1.9), ("secure", 1.4),
    ("selfish", -2.1), ("shame", -2.1), ("shameful", -2.2), ("shocked", -1.3),
    ("shocking", -1.7), ("sick", -2.3), ("slow", -0.8), ("smart", 1.7),
    ("smooth", 1.8), ("solid", 1.2), ("sorry", -0.3), ("spam", -1.5),
    ("stable", 1.2), ("steal", -2.2), ("stolen", -2.2), ("strong", 2.3),
    ("struggle", -1.3), ("struggling", -1.8), ("stuck", -1.0), ("stupid", -2.4),
    ("success", 2.7), ("successful", 2.8), ("suffer", -2.5), ("superb", 3.1),
    ("superior", 2.3), ("supportive", 1.9), ("sure", 1.3), ("terrible", -2.1),
    ("terrific", 2.1), ("thank", 1.5), ("thanks", 1.9), ("threat", -2.4),
    ("trouble", -1.7), ("trust", 2.3), ("trusted", 2.1), ("trustworthy", 2.6),
    ("ugly", -2.3), ("unacceptable", -2.0), ("unfair", -2.1), ("unfortunately", -1.4),
    ("unhappy", -1.8), ("unhelpful", -1.6), ("unprofessional", -1.9), ("unreliable", -1.5),
    ("unresponsive", -1.4), ("upset", -1.6), ("useful", 1.9), ("useless", -1.8),
    ("valuable", 2.1), ("value", 1.4), ("victim", -2.4), ("violation", -2.2),
    ("waste", -1.8), ("wasted", -2.2), ("weak", -1.9), ("welcome", 2.0),
    ("win", 2.8), ("wonderful", 2.7), ("worried", -1.2), ("worry", -1.9),
    ("worse", -2.1), ("worst", -3.1), ("worth", 0.9), ("worthless", -1.9),
    ("wow", 2.8), ("wrong", -2.1),
];

static BOOSTERS_UP: &[&str] = &[
    "absolutely", "amazingly", "awfully", "completely", "considerable", "considerably",
    "decidedly", "deeply", "enormous", "enormously", "entirely", "especially",
    "exceptional", "exceptionally", "extreme", "extremely", "fabulously", "fully",
    "greatly", "highly", "hugely", "incredible", "incredibly", "intensely", "major",
    "majorly", "more", "most", "particularly", "purely", "quite", "really",
    "remarkably", "so", "substantially", "thoroughly", "total", "totally",
    "tremendous", "tremendously", "unbelievably", "unusually", "utter", "utterly",
    "very",
];

static BOOSTERS_DOWN: &[&str] = &[
    "almost", "barely", "hardly", "kinda", "less", "little", "marginal", "marginally",
    "occasional", "occasionally", "partly", "scarce", "scarcely", "slight", "slightly",
    "somewhat", "sorta",
];

static NEGATION_WORDS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "dont",
    "hadnt", "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither", "neednt",
    "never", "none", "nope", "nor", "not", "nothing", "nowhere", "oughtnt", "shant",
    "shouldnt", "wasnt", "werent", "without", "wont", "wouldnt", "rarely", "seldom",
    "despite",
];

/// English stop words, the list used for topic and keyword extraction
static STOP_WORD_LIST: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone",
    "anything", "anyway", "anywhere", "are", "around", "as", "at", "back", "be",
    "became", "because", "become", "becomes", "becoming", "been", "before",
    "beforehand", "behind", "being", "below", "beside", "besides", "between", "beyond",
    "bill", "both", "bottom", "but", "by", "call", "can", "cannot", "cant", "co", "con",
    "could", "couldnt", "cry", "de", "describe", "detail", "do", "done", "down", "due",
    "during", "each", "eg", "eight", "either", "eleven", "else", "elsewhere", "empty",
    "enough", "etc", "even", "ever", "every", "everyone", "everything", "everywhere",
    "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five", "for",
    "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself",
    "his", "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed",
    "interest", "into", "is", "it", "its", "itself", "keep", "last", "latter",
    "latterly", "least", "less", "ltd", "made", "many", "may", "me", "meanwhile",
    "might", "mill", "mine", "more", "moreover", "most", "mostly", "move", "much",
    "must", "my", "myself", "name", "namely", "neither", "never", "nevertheless",
    "next", "nine", "no", "nobody", "none", "noone", "nor", "not", "nothing", "now",
    "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other",
    "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part",
    "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something",
    "sometime", "sometimes", "somewhere", "still", "such", "system", "take", "ten",
    "than", "that", "the", "their", "them", "themselves", "then", "thence", "there",
    "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they",
    "thick", "thin", "third", "this", "those", "though", "three", "through",
    "throughout", "thru", "thus", "to", "together", "too", "top", "toward", "towards",
    "twelve", "twenty", "two", "un", "under", "until", "up", "upon", "us", "very", "via",
    "was", "we", "well", "were", "what", "whatever", "when", "whence", "whenever",
    "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose",
    "why", "will", "with", "within", "without", "would", "yet", "you", "your", "yours",
    "yourself", "yourselves",
];

static VALENCE_MAP: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| VALENCE.iter().copied().collect());

static BOOSTER_MAP: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    BOOSTERS_UP
        .iter()
        .map(|w| (*w, BOOST_INCREMENT))
        .chain(BOOSTERS_DOWN.iter().map(|w| (*w, -BOOST_INCREMENT)))
        .collect()
});

static NEGATIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| NEGATION_WORDS.iter().copied().collect());

static STOP_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOP_WORD_LIST.iter().copied().collect());

/// Valence of a lowercase word, if it carries sentiment
pub fn valence(word: &str) -> Option<f64> {
    VALENCE_MAP.get(word).copied()
}

/// Signed intensity shift of a lowercase booster word
pub fn booster(word: &str) -> Option<f64> {
    BOOSTER_MAP.get(word).copied()
}

/// Whether a lowercase word negates what follows it
pub fn is_negation(word: &str) -> bool {
    let bare = word.replace('\'', "");
    NEGATIONS.contains(bare.as_str()) || word.contains("n't")
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valence_lookup() {
        assert_eq!(valence("great"), Some(3.1));
        assert_eq!(valence("love"), Some(3.2));
        assert!(valence("terrible").unwrap() < 0.0);
        // Mild acceptance words stay neutral
        assert_eq!(valence("okay"), None);
        assert_eq!(valence("support"), None);
    }

    #[test]
    fn test_lexicon_has_no_duplicates() {
        let unique: HashSet<&str> = VALENCE.iter().map(|(w, _)| *w).collect();
        assert_eq!(unique.len(), VALENCE.len());
        assert!(VALENCE.iter().all(|(_, v)| (-4.0..=4.0).contains(v)));
    }

    #[test]
    fn test_boosters_signed() {
        assert_eq!(booster("very"), Some(BOOST_INCREMENT));
        assert_eq!(booster("slightly"), Some(-BOOST_INCREMENT));
        assert_eq!(booster("service"), None);
    }

    #[test]
    fn test_negations() {
        assert!(is_negation("not"));
        assert!(is_negation("never"));
        assert!(is_negation("don't"));
        assert!(is_negation("wouldn't"));
        assert!(!is_negation("again"));
    }

    #[test]
    fn test_stop_words() {
        assert!(is_stop_word("the"));
        assert!(is_stop_word("again"));
        assert!(!is_stop_word("service"));
    }
}

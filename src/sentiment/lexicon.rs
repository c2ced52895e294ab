//! # Valence Lexicon
//!
//! Rule-based sentiment scoring in the style of VADER: every token carries a
//! valence on a -4..4 scale, modified by preceding boosters and negations,
//! and the sum is squashed into a bounded compound score.

use std::collections::HashMap;

/// Normalization constant of the compound score
pub const NORMALIZATION_ALPHA: f64 = 15.0;

/// Scalar added by a booster word (sign follows the boosted valence)
const BOOSTER_INCREMENT: f64 = 0.293;

/// Scalar subtracted by a dampener word
const BOOSTER_DECREMENT: f64 = -0.293;

/// Multiplier applied to a valence preceded by a negation
const NEGATION_SCALAR: f64 = -0.74;

/// How many preceding tokens can modify a valence
const MODIFIER_WINDOW: usize = 3;

/// Squash a raw valence sum into [-1, 1]
///
/// `sum / sqrt(sum^2 + alpha)`, the normalization VADER uses.
pub fn normalize_compound(sum: f64, alpha: f64) -> f64 {
    if sum == 0.0 {
        return 0.0;
    }
    let score = sum / (sum * sum + alpha).sqrt();
    score.clamp(-1.0, 1.0)
}

/// Output of the rule-based scorer for one document
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentScore {
    /// Bounded polarity in [-1, 1]
    pub compound: f64,
    /// Sum of modified valences before normalization
    pub raw_sum: f64,
    /// Tokens that carried a valence, with their modified value
    pub matched: Vec<(String, f64)>,
}

impl SentimentScore {
    /// Score of a document without any signal
    pub fn empty() -> Self {
        Self {
            compound: 0.0,
            raw_sum: 0.0,
            matched: Vec::new(),
        }
    }
}

/// Sentiment lexicon for app-store reviews
///
/// Contains word valences, negations and booster words. Entries are stored in
/// the lemmatized form the text normalizer produces.
#[derive(Debug, Clone)]
pub struct ValenceLexicon {
    /// Word to valence mapping (-4..4)
    words: HashMap<String, f64>,
    /// Negation words
    negations: Vec<String>,
    /// Booster and dampener words
    boosters: HashMap<String, f64>,
    /// Normalization constant for the compound score
    alpha: f64,
}

impl Default for ValenceLexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl ValenceLexicon {
    /// Create a lexicon with the default review vocabulary
    pub fn new() -> Self {
        let mut words = HashMap::new();

        let positive_words = vec![
            ("good", 1.9),
            ("great", 3.1),
            ("excellent", 2.7),
            ("awesome", 3.1),
            ("amazing", 2.8),
            ("best", 3.2),
            ("better", 1.9),
            ("nice", 1.8),
            ("love", 3.2),
            ("loved", 2.9),
            ("like", 1.5),
            ("liked", 1.8),
            ("happy", 2.7),
            ("satisfied", 1.8),
            ("helpful", 1.8),
            ("useful", 1.9),
            ("easy", 1.9),
            ("easily", 1.4),
            ("fast", 1.2),
            ("quick", 1.1),
            ("quickly", 1.0),
            ("smooth", 1.3),
            ("convenient", 1.7),
            ("reliable", 1.8),
            ("friendly", 2.2),
            ("simple", 1.0),
            ("super", 2.9),
            ("superb", 3.1),
            ("fantastic", 2.6),
            ("wonderful", 2.7),
            ("perfect", 2.7),
            ("thank", 1.5),
            ("thanks", 1.9),
            ("thankyou", 2.5),
            ("appreciate", 1.7),
            ("appreciated", 2.3),
            ("recommend", 1.5),
            ("recommended", 1.6),
            ("polite", 2.0),
            ("responsive", 1.4),
            ("resolved", 1.3),
            ("working", 0.9),
            ("fine", 0.8),
            ("ok", 0.9),
            ("okay", 0.9),
            ("decent", 1.1),
            ("improved", 1.5),
            ("improvement", 1.2),
            ("success", 2.7),
            ("successful", 2.8),
            ("successfully", 2.2),
            ("safe", 1.9),
            ("secure", 1.4),
            ("honest", 2.3),
            ("transparent", 1.3),
            ("enjoy", 2.2),
            ("glad", 2.0),
            ("pleased", 1.9),
            ("cool", 1.3),
            ("worth", 0.9),
            ("support", 1.7),
            ("reward", 1.7),
            ("benefit", 1.6),
            ("offer", 0.9),
            ("win", 2.8),
        ];

        let negative_words = vec![
            ("bad", -2.5),
            ("worst", -3.1),
            ("worse", -2.1),
            ("poor", -2.1),
            ("terrible", -2.1),
            ("horrible", -2.5),
            ("awful", -2.0),
            ("pathetic", -2.6),
            ("useless", -1.8),
            ("waste", -1.8),
            ("hate", -2.7),
            ("hated", -3.2),
            ("slow", -1.0),
            ("slowly", -0.8),
            ("crash", -1.7),
            ("crashed", -1.8),
            ("crashing", -1.9),
            ("bug", -1.2),
            ("buggy", -1.6),
            ("error", -1.7),
            ("fail", -2.5),
            ("failed", -2.3),
            ("failure", -2.3),
            ("failing", -2.3),
            ("problem", -1.7),
            ("issue", -0.9),
            ("stuck", -1.5),
            ("broken", -1.9),
            ("disappointed", -1.9),
            ("disappointing", -2.2),
            ("frustrated", -2.4),
            ("frustrating", -1.9),
            ("annoying", -1.8),
            ("irritating", -1.8),
            ("angry", -2.3),
            ("fraud", -2.8),
            ("scam", -2.3),
            ("cheat", -2.4),
            ("cheated", -2.7),
            ("rude", -2.0),
            ("delay", -1.3),
            ("delayed", -1.4),
            ("late", -1.0),
            ("unable", -1.2),
            ("difficult", -1.5),
            ("complicated", -1.1),
            ("confusing", -1.3),
            ("lost", -1.3),
            ("loss", -1.3),
            ("wrong", -2.1),
            ("refund", -0.5),
            ("complaint", -1.5),
            ("complain", -1.5),
            ("expensive", -0.9),
            ("overcharged", -1.8),
            ("overcharging", -1.8),
            ("hidden", -0.7),
            ("leak", -1.4),
            ("leakage", -1.4),
            ("danger", -2.4),
            ("dangerous", -2.1),
            ("sad", -2.1),
            ("suck", -1.5),
            ("rubbish", -1.9),
            ("nonsense", -1.7),
            ("unhappy", -1.8),
            ("unsatisfied", -1.7),
            ("uninstall", -1.2),
            ("uninstalled", -1.4),
            ("mediocre", -1.0),
        ];

        for (word, score) in positive_words.into_iter().chain(negative_words) {
            words.insert(word.to_string(), score);
        }

        let negations = vec![
            "not", "no", "never", "neither", "nobody", "nothing", "nowhere", "none", "cannot",
            "cant", "dont", "doesnt", "didnt", "wont", "wouldnt", "shouldnt", "couldnt", "isnt",
            "arent", "wasnt", "werent", "without", "hardly", "barely", "scarcely", "nahi",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let mut boosters = HashMap::new();
        for word in [
            "very",
            "extremely",
            "really",
            "highly",
            "totally",
            "completely",
            "absolutely",
            "so",
            "too",
            "most",
            "bahut",
        ] {
            boosters.insert(word.to_string(), BOOSTER_INCREMENT);
        }
        for word in ["slightly", "somewhat", "kinda", "little", "marginally"] {
            boosters.insert(word.to_string(), BOOSTER_DECREMENT);
        }

        Self {
            words,
            negations,
            boosters,
            alpha: NORMALIZATION_ALPHA,
        }
    }

    /// Get the valence of a word
    pub fn get_valence(&self, word: &str) -> Option<f64> {
        self.words.get(word).copied()
    }

    /// Check if a word is a negation
    pub fn is_negation(&self, word: &str) -> bool {
        self.negations.iter().any(|n| n == word)
    }

    /// Get booster scalar of a word
    pub fn get_booster(&self, word: &str) -> Option<f64> {
        self.boosters.get(word).copied()
    }

    /// Number of scored words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True when the lexicon has no scored words
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Score a token sequence
    ///
    /// 1. Look up each token's valence
    /// 2. Apply boosters found within the three preceding tokens, decaying
    ///    with distance
    /// 3. Flip and dampen the valence when a negation precedes it
    /// 4. Normalize the sum into the compound score
    pub fn score<S: AsRef<str>>(&self, tokens: &[S]) -> SentimentScore {
        let mut matched = Vec::new();
        let mut sum = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            let word = token.as_ref();
            let Some(base) = self.get_valence(word) else {
                continue;
            };

            let mut valence = base;
            let mut negated = false;

            for distance in 1..=MODIFIER_WINDOW.min(i) {
                let previous = tokens[i - distance].as_ref();
                if let Some(scalar) = self.get_booster(previous) {
                    let decay = match distance {
                        1 => 1.0,
                        2 => 0.95,
                        _ => 0.9,
                    };
                    valence += scalar * decay * valence.signum();
                }
                if self.is_negation(previous) {
                    negated = true;
                }
            }

            if negated {
                valence *= NEGATION_SCALAR;
            }

            sum += valence;
            matched.push((word.to_string(), valence));
        }

        SentimentScore {
            compound: normalize_compound(sum, self.alpha),
            raw_sum: sum,
            matched,
        }
    }
}

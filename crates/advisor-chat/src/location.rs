//! Heuristic location extraction from free-form user text.
//!
//! Used only as a fallback when the model answers without requesting the
//! weather capability. A result is a hint for a lookup, never authoritative.

use std::sync::LazyLock;

use regex::Regex;

use advisor_core::Language;

/// Pulls a probable location name out of a user message.
pub trait LocationExtractor: Send + Sync {
    fn extract(&self, text: &str, language: Language) -> Option<String>;
}

// =============================================================================
// Patterns
// =============================================================================

/// "in Tokyo", "for New York?", "at London today".
static PREPOSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:in|at|for|to)\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)?)(?:\?|\.|,|$|\s+(?:today|tomorrow|now|should|can))",
    )
    .expect("Invalid preposition regex")
});

/// Latin-script name followed by a Japanese particle: "Tokyoで", "Paris の".
static PARTICLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)?)\s*(?:で|の|に|を)")
        .expect("Invalid particle regex")
});

static JAPANESE_CITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(東京|大阪|京都|横浜|名古屋|福岡|札幌|仙台|広島|神戸)")
        .expect("Invalid Japanese city regex")
});

static JAPANESE_CITIES: &[(&str, &str)] = &[
    ("東京", "Tokyo"),
    ("大阪", "Osaka"),
    ("京都", "Kyoto"),
    ("横浜", "Yokohama"),
    ("名古屋", "Nagoya"),
    ("福岡", "Fukuoka"),
    ("札幌", "Sapporo"),
    ("仙台", "Sendai"),
    ("広島", "Hiroshima"),
    ("神戸", "Kobe"),
];

static MAJOR_CITIES: &[&str] = &[
    "tokyo", "new york", "london", "paris", "berlin", "moscow", "sydney",
    "melbourne", "toronto", "vancouver", "mumbai", "delhi", "bangalore",
    "singapore", "hong kong", "seoul", "beijing", "shanghai", "dubai",
    "istanbul", "cairo", "rio de janeiro", "sao paulo", "mexico city",
    "buenos aires", "los angeles", "chicago", "san francisco", "miami",
    "boston", "seattle", "denver", "phoenix", "dallas", "houston",
    "osaka", "kyoto", "yokohama", "nagoya", "fukuoka", "sapporo",
    "sendai", "hiroshima", "kobe",
];

/// Words that the case-insensitive patterns pick up but are never places.
static STOP_WORDS: &[&str] = &[
    "what", "should", "do", "today", "tomorrow", "wear", "activities", "i", "can",
];

/// Time and modal words that can trail a captured name ("Tokyo today").
static TRAILING_WORDS: &[&str] = &["today", "tomorrow", "now", "should", "can"];

// =============================================================================
// Extractor
// =============================================================================

/// Regex and vocabulary based extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternLocationExtractor;

impl PatternLocationExtractor {
    pub fn new() -> Self {
        Self
    }

    fn from_prepositions(&self, text: &str) -> Option<String> {
        PREPOSITION_RE
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| accept(trim_trailing_words(m.as_str())))
    }

    fn from_particles(&self, text: &str) -> Option<String> {
        PARTICLE_RE
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| accept(m.as_str()))
    }

    fn from_japanese_names(&self, text: &str) -> Option<String> {
        let found = JAPANESE_CITY_RE.find(text)?;
        JAPANESE_CITIES
            .iter()
            .find(|(kanji, _)| *kanji == found.as_str())
            .map(|(_, romanized)| romanized.to_string())
    }

    /// Whole-word scan for any known city, for multi-word names such as
    /// "rio de janeiro" that the capitalization patterns cannot span.
    fn from_vocabulary(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        MAJOR_CITIES
            .iter()
            .find(|city| contains_word(&lower, city))
            .map(|city| title_case(city))
    }
}

impl LocationExtractor for PatternLocationExtractor {
    fn extract(&self, text: &str, language: Language) -> Option<String> {
        let found = match language {
            Language::En => self
                .from_prepositions(text)
                .or_else(|| self.from_particles(text))
                .or_else(|| self.from_japanese_names(text)),
            Language::Ja => self
                .from_japanese_names(text)
                .or_else(|| self.from_particles(text))
                .or_else(|| self.from_prepositions(text)),
        }
        .or_else(|| self.from_vocabulary(text));

        if let Some(ref location) = found {
            tracing::debug!(location = %location, "Extracted location hint");
        }
        found
    }
}

/// Validate a candidate: not a stop word, at least two characters, and
/// either a known city or capitalized.
fn accept(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    let lower = candidate.to_lowercase();
    if STOP_WORDS.contains(&lower.as_str()) || candidate.chars().count() < 2 {
        return None;
    }
    let capitalized = candidate.chars().next().is_some_and(char::is_uppercase);
    if MAJOR_CITIES.contains(&lower.as_str()) || capitalized {
        Some(candidate.to_string())
    } else {
        None
    }
}

fn trim_trailing_words(candidate: &str) -> &str {
    match candidate.rsplit_once(char::is_whitespace) {
        Some((head, last)) if TRAILING_WORDS.contains(&last.to_lowercase().as_str()) => {
            head.trim_end()
        }
        _ => candidate,
    }
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Tests
// =============================================================================

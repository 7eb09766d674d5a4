use std::sync::LazyLock;

use harvester_core::Interactions;
use regex::Regex;

static ANY_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(repl(?:y|ies)|reposts?|likes?|bookmarks?|views?)\b")
        .expect("static pattern")
});

fn counter(keyword: &str) -> Regex {
    Regex::new(&format!(r"(?i)(\d[\d.,]*\s?[KM]?)\s*{keyword}")).expect("static pattern")
}

static REPLIES: LazyLock<Regex> = LazyLock::new(|| counter(r"repl(?:y|ies)\b"));
static REPOSTS: LazyLock<Regex> = LazyLock::new(|| counter(r"reposts?\b"));
static LIKES: LazyLock<Regex> = LazyLock::new(|| counter(r"likes?\b"));
static BOOKMARKS: LazyLock<Regex> = LazyLock::new(|| counter(r"bookmarks?\b"));
static VIEWS: LazyLock<Regex> = LazyLock::new(|| counter(r"views?\b"));

/// Turns compact display counts ("1.2K", "2M", "10,500") into integers.
/// Anything unparseable counts as zero.
pub fn parse_number_string(raw: &str) -> u64 {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0;
    }
    let (digits, multiplier) = match cleaned.chars().last() {
        Some('K' | 'k') => (&cleaned[..cleaned.len() - 1], 1_000.0),
        Some('M' | 'm') => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        _ => (cleaned, 1.0),
    };
    match digits.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => (value * multiplier).round() as u64,
        _ => 0,
    }
}

/// Whether an accessible label talks about interaction counters at all.
pub fn is_interaction_label(label: &str) -> bool {
    ANY_KEYWORD.is_match(label)
}

/// Pulls all five counters out of one label; missing ones stay zero.
pub fn parse_interactions(label: &str) -> Interactions {
    Interactions {
        replies_count: count_for(&REPLIES, label),
        reposts_count: count_for(&REPOSTS, label),
        likes_count: count_for(&LIKES, label),
        bookmarks_count: count_for(&BOOKMARKS, label),
        views_count: count_for(&VIEWS, label),
    }
}

fn count_for(pattern: &Regex, label: &str) -> u64 {
    pattern
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| parse_number_string(m.as_str()))
        .unwrap_or(0)
}

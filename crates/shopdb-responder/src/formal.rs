//! Formal-tone rewriting of generated text.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static EMOJI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{1F300}-\x{1F6FF}\x{1F900}-\x{1F9FF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}]")
        .expect("emoji regex is valid")
});

const CONTRACTIONS: &[(&str, &str)] = &[
    ("I'm", "I am"),
    ("can't", "cannot"),
    ("won't", "will not"),
    ("don't", "do not"),
    ("doesn't", "does not"),
    ("didn't", "did not"),
    ("it's", "it is"),
    ("you're", "you are"),
    ("I've", "I have"),
    ("that's", "that is"),
    ("there's", "there is"),
];

static CONTRACTION_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    CONTRACTIONS
        .iter()
        .map(|(short, long)| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(short))).expect("contraction regex is valid");
            (re, *long)
        })
        .collect()
});

static CASUAL_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [(r"(?i)try asking", "for example, you could ask"), (r"(?i)go ahead", "please"), (r"\s+\n", "\n")]
        .into_iter()
        .map(|(pat, rep)| (Regex::new(pat).expect("phrase regex is valid"), rep))
        .collect()
});

/// Keeps a sentence-initial capital when expanding a contraction.
fn match_case(found: &str, replacement: &str) -> String {
    let starts_upper = found.chars().next().is_some_and(char::is_uppercase);
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if starts_upper => first.to_uppercase().chain(chars).collect(),
        _ => replacement.to_string(),
    }
}

/// Strips emoji, expands common contractions and replaces casual phrasing.
pub fn formalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = EMOJI_RE.replace_all(text, "").into_owned();
    for (re, long) in CONTRACTION_RES.iter() {
        out = re.replace_all(&out, |caps: &Captures<'_>| match_case(&caps[0], long)).into_owned();
    }
    for (re, rep) in CASUAL_RES.iter() {
        out = re.replace_all(&out, *rep).into_owned();
    }
    out.trim().to_string()
}

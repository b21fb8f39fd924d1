//! Text normalization ahead of phonemization.
//!
//! Normalization is an ordered list of rewrite stages. Order matters: number
//! expansion assumes abbreviations are already spelled out, money expansion
//! assumes thousands separators are gone, and decimal expansion only sees the
//! decimals money expansion left behind. Every stage is total.

use crate::numbers::{expand_decimals, expand_money, expand_numbers};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::trace;

/// One named rewrite step of the normalizer.
#[derive(Clone, Copy)]
pub struct NormalizeStage {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

impl std::fmt::Debug for NormalizeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizeStage")
            .field("name", &self.name)
            .finish()
    }
}

/// Stages in execution order.
pub const NORMALIZE_STAGES: &[NormalizeStage] = &[
    NormalizeStage { name: "canonicalize_quotes", apply: canonicalize_quotes },
    NormalizeStage { name: "ascii_punctuation", apply: ascii_punctuation },
    NormalizeStage { name: "collapse_whitespace", apply: collapse_whitespace },
    NormalizeStage { name: "expand_abbreviations", apply: expand_abbreviations },
    NormalizeStage { name: "expand_numbers", apply: expand_numbers },
    NormalizeStage { name: "expand_money", apply: expand_money },
    NormalizeStage { name: "expand_decimals", apply: expand_decimals },
    NormalizeStage { name: "expand_digit_ranges", apply: expand_digit_ranges },
    NormalizeStage { name: "mark_possessives", apply: mark_possessives },
    NormalizeStage { name: "hyphenate_initialisms", apply: hyphenate_initialisms },
];

/// Run every stage in order and trim the result.
pub fn normalize(text: &str) -> String {
    let mut current = text.to_string();
    for stage in NORMALIZE_STAGES {
        let next = (stage.apply)(&current);
        if next != current {
            trace!(stage = stage.name, output = %next, "normalize stage rewrote text");
        }
        current = next;
    }
    current.trim().to_string()
}

/// Replace regex matches that also satisfy a condition on the surrounding text.
///
/// `rewrite` sees the full haystack and the candidate captures and returns
/// `None` to reject the candidate. A rejected candidate does not consume
/// input: the search resumes one character after its start, so matches that
/// overlap a rejected one are still found.
pub(crate) fn replace_in_context<F>(text: &str, re: &Regex, mut rewrite: F) -> String
where
    F: FnMut(&str, &Captures) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut pos = 0;

    while pos <= text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let Some(m) = caps.get(0) else {
            break;
        };

        match rewrite(text, &caps) {
            Some(replacement) => {
                out.push_str(&text[last..m.start()]);
                out.push_str(&replacement);
                last = m.end();
                pos = if m.end() > m.start() {
                    m.end()
                } else {
                    next_char_boundary(text, m.end())
                };
            }
            None => pos = next_char_boundary(text, m.start()),
        }
    }

    out.push_str(&text[last..]);
    out
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    text[index..]
        .chars()
        .next()
        .map_or(index + 1, |ch| index + ch.len_utf8())
}

pub(crate) fn char_before(text: &str, index: usize) -> Option<char> {
    text[..index].chars().next_back()
}

pub(crate) fn char_after(text: &str, index: usize) -> Option<char> {
    text[index..].chars().next()
}

fn is_ascii_digit(ch: Option<char>) -> bool {
    ch.is_some_and(|c| c.is_ascii_digit())
}

fn is_ascii_upper(ch: Option<char>) -> bool {
    ch.is_some_and(|c| c.is_ascii_uppercase())
}

/// True when `text[index..]` starts with a space and an ASCII capital.
fn followed_by_capitalized_word(text: &str, index: usize) -> bool {
    let mut rest = text[index..].chars();
    rest.next() == Some(' ') && is_ascii_upper(rest.next())
}

/// Straighten curly single quotes and turn parentheses into a quoted aside.
pub fn canonicalize_quotes(text: &str) -> String {
    const REPLACEMENTS: &[(char, char)] = &[
        ('\u{2018}', '\''),
        ('\u{2019}', '\''),
        ('«', '\u{201c}'),
        ('»', '\u{201d}'),
        ('\u{201c}', '"'),
        ('\u{201d}', '"'),
        ('(', '«'),
        (')', '»'),
    ];

    REPLACEMENTS
        .iter()
        .fold(text.to_string(), |acc, &(from, to)| acc.replace(from, &to.to_string()))
}

/// Map full-width and CJK punctuation to ASCII followed by a space.
pub fn ascii_punctuation(text: &str) -> String {
    const REPLACEMENTS: &[(char, &str)] = &[
        ('、', ", "),
        ('。', ". "),
        ('！', "! "),
        ('，', ", "),
        ('：', ": "),
        ('；', "; "),
        ('？', "? "),
    ];

    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => result.push_str(to),
            None => result.push(ch),
        }
    }
    result
}

static RE_NON_NEWLINE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]").unwrap());
static RE_MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
static RE_SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());

/// Collapse whitespace runs while keeping line structure.
pub fn collapse_whitespace(text: &str) -> String {
    let spaced = RE_NON_NEWLINE_SPACE.replace_all(text, " ");
    let collapsed = RE_MULTI_SPACE.replace_all(&spaced, " ");
    replace_in_context(&collapsed, &RE_SPACE_RUN, |text, caps| {
        let m = caps.get(0)?;
        let blank_line =
            char_before(text, m.start()) == Some('\n') && char_after(text, m.end()) == Some('\n');
        blank_line.then(String::new)
    })
}

static RE_DOCTOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bD[Rr]\.").unwrap());
static RE_MISTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(Mr|MR)\.").unwrap());
static RE_MISS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(Ms|MS)\.").unwrap());
static RE_MISSES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(Mrs|MRS)\.").unwrap());
static RE_ETC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\betc\.").unwrap());
static RE_YEAH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(y)eah?\b").unwrap());

/// Expand honorifics and informal spellings the phonemizer gets wrong.
pub fn expand_abbreviations(text: &str) -> String {
    let text = replace_in_context(text, &RE_DOCTOR, |text, caps| {
        let m = caps.get(0)?;
        followed_by_capitalized_word(text, m.end()).then(|| "Doctor".to_string())
    });

    // Mixed-case forms always expand; all-caps forms only before a name.
    let honorifics: [(&Regex, &str, &str); 3] = [
        (&RE_MISTER, "Mr", "Mister"),
        (&RE_MISS, "Ms", "Miss"),
        (&RE_MISSES, "Mrs", "Mrs"),
    ];
    let text = honorifics
        .iter()
        .fold(text, |acc, &(re, mixed_case, expansion)| {
            replace_in_context(&acc, re, |text, caps| {
                let m = caps.get(0)?;
                let accept =
                    &caps[1] == mixed_case || followed_by_capitalized_word(text, m.end());
                accept.then(|| expansion.to_string())
            })
        });

    let text = replace_in_context(&text, &RE_ETC, |text, caps| {
        let m = caps.get(0)?;
        (!followed_by_capitalized_word(text, m.end())).then(|| "etc".to_string())
    });

    RE_YEAH.replace_all(&text, "${1}e'a").into_owned()
}

static RE_HYPHEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-").unwrap());

/// Read `<digit>-<digit>` as a range.
pub fn expand_digit_ranges(text: &str) -> String {
    replace_in_context(text, &RE_HYPHEN, |text, caps| {
        let m = caps.get(0)?;
        let between_digits =
            is_ascii_digit(char_before(text, m.start())) && is_ascii_digit(char_after(text, m.end()));
        between_digits.then(|| " to ".to_string())
    })
}

static RE_CAPITAL_S: Lazy<Regex> = Lazy::new(|| Regex::new(r"S").unwrap());
static RE_TRAILING_S: Lazy<Regex> = Lazy::new(|| Regex::new(r"'?s\b").unwrap());
static RE_MARKED_S: Lazy<Regex> = Lazy::new(|| Regex::new(r"S\b").unwrap());

fn is_marker_consonant(ch: Option<char>) -> bool {
    matches!(ch, Some('B'..='D' | 'F'..='H' | 'J'..='N' | 'P'..='T' | 'V'..='Z'))
}

/// Separate plural `S` after digits and mark possessives of capitalized initialisms.
pub fn mark_possessives(text: &str) -> String {
    let text = replace_in_context(text, &RE_CAPITAL_S, |text, caps| {
        let m = caps.get(0)?;
        is_ascii_digit(char_before(text, m.start())).then(|| " S".to_string())
    });

    let text = replace_in_context(&text, &RE_TRAILING_S, |text, caps| {
        let m = caps.get(0)?;
        is_marker_consonant(char_before(text, m.start())).then(|| "'S".to_string())
    });

    replace_in_context(&text, &RE_MARKED_S, |text, caps| {
        let m = caps.get(0)?;
        text[..m.start()].ends_with("X'").then(|| "s".to_string())
    })
}

static RE_DOTTED_INITIALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[A-Za-z]\.){2,} [a-z]").unwrap());
static RE_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.").unwrap());

/// Turn dotted initialisms into hyphenated ones so they are spelled out.
pub fn hyphenate_initialisms(text: &str) -> String {
    let text = RE_DOTTED_INITIALS.replace_all(text, |caps: &Captures| caps[0].replace('.', "-"));

    replace_in_context(&text, &RE_DOT, |text, caps| {
        let m = caps.get(0)?;
        let between_capitals =
            is_ascii_upper(char_before(text, m.start())) && is_ascii_upper(char_after(text, m.end()));
        between_capitals.then(|| "-".to_string())
    })
}

//! Spoken forms for years, clock times, money and decimals.

use crate::normalize::{char_after, char_before, replace_in_context};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]*\.[0-9]+|\b[0-9]{4}s?\b|\b(?:[1-9]|1[0-2]):[0-5][0-9]\b").unwrap()
});
static RE_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",").unwrap());
static RE_MONEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[$£][0-9]+(?:\.[0-9]+)?(?: hundred| thousand| (?:[bm]|tr)illion)*\b|[$£][0-9]+\.[0-9][0-9]?\b",
    )
    .unwrap()
});
static RE_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]*\.[0-9]+").unwrap());

/// Rewrite years and clock times, then drop thousands separators.
pub fn expand_numbers(text: &str) -> String {
    let text = replace_in_context(text, &RE_NUMBER, |text, caps| {
        let m = caps.get(0)?;
        if m.as_str().contains(':') {
            // Clock times must not be part of a longer H:MM:SS run.
            if char_before(text, m.start()) == Some(':') || char_after(text, m.end()) == Some(':') {
                return None;
            }
            return Some(speak_time(m.as_str()));
        }
        Some(speak_year(m.as_str()))
    });

    replace_in_context(&text, &RE_COMMA, |text, caps| {
        let m = caps.get(0)?;
        let between_digits = char_before(text, m.start()).is_some_and(|c| c.is_ascii_digit())
            && char_after(text, m.end()).is_some_and(|c| c.is_ascii_digit());
        between_digits.then(String::new)
    })
}

fn speak_time(token: &str) -> String {
    let Some((hours, minutes)) = token.split_once(':') else {
        return token.to_string();
    };
    let (Ok(hours), Ok(minutes)) = (hours.parse::<u32>(), minutes.parse::<u32>()) else {
        return token.to_string();
    };

    match minutes {
        0 => format!("{hours} o'clock"),
        1..=9 => format!("{hours} oh {minutes}"),
        _ => format!("{hours} {minutes}"),
    }
}

/// Four-digit numbers are read as years, e.g. "1984" -> "19 84".
///
/// Decimals pass through; the decimal stage reads them digit by digit.
fn speak_year(token: &str) -> String {
    if token.contains('.') {
        return token.to_string();
    }
    let Some(year) = token.get(..4).and_then(|digits| digits.parse::<u32>().ok()) else {
        return token.to_string();
    };
    if year < 1100 || year % 1000 < 10 {
        return token.to_string();
    }

    let left = &token[..2];
    let right = year % 100;
    let suffix = if token.ends_with('s') { "s" } else { "" };

    match right {
        0 => format!("{left} hundred{suffix}"),
        1..=9 => format!("{left} oh {right}{suffix}"),
        _ => format!("{left} {right}{suffix}"),
    }
}

/// Spell out dollar and pound amounts.
pub fn expand_money(text: &str) -> String {
    RE_MONEY
        .replace_all(text, |caps: &Captures| speak_money(&caps[0]))
        .into_owned()
}

fn speak_money(token: &str) -> String {
    let mut chars = token.chars();
    let symbol = chars.next();
    let amount = chars.as_str();

    let (unit, coin_one, coin_many) = match symbol {
        Some('£') => ("pound", "penny", "pence"),
        _ => ("dollar", "cent", "cents"),
    };

    let Some((whole, fraction)) = amount.split_once('.') else {
        let plural = if amount == "1" { "" } else { "s" };
        return format!("{amount} {unit}{plural}");
    };

    let plain_cents = fraction.len() <= 2 && fraction.chars().all(|c| c.is_ascii_digit());
    if !plain_cents {
        // "$1.5 million", "$2.125": keep the figure, the decimal stage reads it.
        return format!("{amount} {unit}s");
    }

    let plural = if whole == "1" { "" } else { "s" };
    let cents: u32 = format!("{fraction:0<2}").parse().unwrap_or_default();
    let coins = if cents == 1 { coin_one } else { coin_many };
    format!("{whole} {unit}{plural} and {cents} {coins}")
}

/// Read remaining decimals digit by digit: "3.14" -> "3 point 1 4".
pub fn expand_decimals(text: &str) -> String {
    RE_DECIMAL
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            match token.split_once('.') {
                Some((whole, fraction)) => {
                    let digits: Vec<String> = fraction.chars().map(String::from).collect();
                    format!("{whole} point {}", digits.join(" "))
                }
                None => token.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn test_years() {
        assert_eq!(expand_numbers("in 1984."), "in 19 84.");
        assert_eq!(expand_numbers("in 1900"), "in 19 hundred");
        assert_eq!(expand_numbers("the 1960s"), "the 19 60s");
        assert_eq!(expand_numbers("the 1800s"), "the 18 hundreds");
        assert_eq!(expand_numbers("in 1805"), "in 18 oh 5");
        assert_eq!(expand_numbers("in 2010"), "in 20 10");
    }

    #[test]
    fn test_years_left_alone() {
        assert_eq!(expand_numbers("Born in 2009."), "Born in 2009.");
        assert_eq!(expand_numbers("in 2000"), "in 2000");
        assert_eq!(expand_numbers("in 1066"), "in 1066");
        assert_eq!(expand_numbers("code 12345"), "code 12345");
    }

    #[test]
    fn test_times() {
        assert_eq!(expand_numbers("at 3:00"), "at 3 o'clock");
        assert_eq!(expand_numbers("at 12:05"), "at 12 oh 5");
        assert_eq!(expand_numbers("at 10:45"), "at 10 45");
        assert_eq!(expand_numbers("lap 1:12:30"), "lap 1:12:30");
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(expand_numbers("1,000,000 people"), "1000000 people");
        assert_eq!(expand_numbers("a, b"), "a, b");
    }

    #[test]
    fn test_money() {
        assert_eq!(expand_money("$10"), "10 dollars");
        assert_eq!(expand_money("$1"), "1 dollar");
        assert_eq!(expand_money("$10.50"), "10 dollars and 50 cents");
        assert_eq!(expand_money("$1.5"), "1 dollar and 50 cents");
        assert_eq!(expand_money("$2.01"), "2 dollars and 1 cent");
        assert_eq!(expand_money("£1.01"), "1 pound and 1 penny");
        assert_eq!(expand_money("£3.20"), "3 pounds and 20 pence");
        assert_eq!(expand_money("$5 million"), "5 million dollars");
        assert_eq!(expand_money("$1.5 billion"), "1.5 billion dollars");
    }

    #[test]
    fn test_decimals() {
        assert_eq!(expand_decimals("pi is 3.14"), "pi is 3 point 1 4");
        assert_eq!(expand_decimals(".5"), " point 5");
    }

    #[test]
    fn test_normalize_numbers_end_to_end() {
        assert!(normalize("It happened in 1984.").contains("19 84"));
        assert!(normalize("Born in 2009.").contains("2009"));
        assert_eq!(normalize("$10"), "10 dollars");
        assert_eq!(normalize("$1"), "1 dollar");
        assert_eq!(normalize("$10.50"), "10 dollars and 50 cents");
        assert_eq!(normalize("£1.01"), "1 pound and 1 penny");
        assert_eq!(normalize("It costs $1,200."), "It costs 1200 dollars.");
        assert_eq!(normalize("Pages 3-5"), "Pages 3 to 5");
        assert_eq!(normalize("$1.5 billion"), "1 point 5 billion dollars");
    }
}

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AppError;

static GIRLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bgirls?\b").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static UNDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(6|8|10|12|14)(?:\s*(?:and\s*under|under|u))?\b").unwrap());
static HIGH_SCHOOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:high\s*school|hs)\b").unwrap());
static OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bopen\b").unwrap());

/// Canonical age-group label used as the matching key for needs and interests.
///
/// "12u", "12 and under", "12 Under" and "12U" all map to `12U`; a "girls"
/// token anywhere becomes a `Girls ` prefix. Applying it twice yields the
/// same label as applying it once.
pub fn normalize_age_group(raw: &str) -> String {
    let trimmed = raw.trim();
    let girls = GIRLS.is_match(trimmed);
    let stripped = GIRLS.replace_all(trimmed, "");
    let cleaned = stripped.replace('&', "and");
    let cleaned = WHITESPACE
        .replace_all(cleaned.trim(), " ")
        .to_lowercase();

    let label = if let Some(caps) = UNDER.captures(&cleaned) {
        format!("{}U", &caps[1])
    } else if HIGH_SCHOOL.is_match(&cleaned) {
        "HS".to_string()
    } else if OPEN.is_match(&cleaned) {
        "Open".to_string()
    } else {
        title_case(&cleaned)
    };

    if girls {
        format!("Girls {}", label).trim_end().to_string()
    } else {
        label
    }
}

// ASCII-only so lowercasing the output gives back the input.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() || c == '_' {
            if at_word_start {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Parses an event date given as `YYYY-MM-DD`, `M/D/YYYY` or an RFC 3339
/// timestamp. Blank input means "no date".
pub fn parse_event_date(raw: &str) -> Result<Option<NaiveDate>, AppError> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Ok(Some(date));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(ts.date_naive()));
    }

    Err(AppError::Validation(format!(
        "Unrecognised event date '{}', expected YYYY-MM-DD",
        s
    )))
}

/// Trims free text and maps blank input to `None`.
pub fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

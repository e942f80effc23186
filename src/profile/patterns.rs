//! Surface pattern detection over sampled string values (spec §4.3).

use std::sync::LazyLock;

use regex::Regex;

use crate::profile::types::SurfacePattern;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://|www\.)[^\s]+$").unwrap());
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9()\-.\s]{7,}$").unwrap());
static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?\s?%$").unwrap());

/// Detect which surface patterns are present across a column's sampled
/// non-null string values. A pattern is reported if a majority of sampled
/// values (not just one) match it, to avoid spurious single-value hits.
pub fn detect_patterns(values: &[&str]) -> Vec<SurfacePattern> {
    if values.is_empty() {
        return vec![];
    }
    let total = values.len() as f64;
    let mut out = Vec::new();

    let ratio = |re: &Regex| values.iter().filter(|v| re.is_match(v)).count() as f64 / total;

    if ratio(&EMAIL_RE) > 0.5 {
        out.push(SurfacePattern::EmailLike);
    }
    if ratio(&URL_RE) > 0.5 {
        out.push(SurfacePattern::UrlLike);
    }
    if ratio(&PHONE_RE) > 0.5 {
        out.push(SurfacePattern::PhoneLike);
    }
    if ratio(&PERCENT_RE) > 0.5 {
        out.push(SurfacePattern::PercentLike);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_email_majority() {
        let values = vec!["a@b.com", "c@d.org", "not-an-email"];
        assert_eq!(detect_patterns(&values), vec![SurfacePattern::EmailLike]);
    }

    #[test]
    fn ignores_minority_match() {
        let values = vec!["a@b.com", "plain", "plain2", "plain3"];
        assert!(detect_patterns(&values).is_empty());
    }

    #[test]
    fn detects_percent() {
        let values = vec!["12%", "3.5 %", "99%"];
        assert_eq!(detect_patterns(&values), vec![SurfacePattern::PercentLike]);
    }
}

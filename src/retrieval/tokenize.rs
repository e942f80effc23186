//! Tokenization shared by lexical scoring and archive-cue detection
//! (spec §4.8: "lowercases, splits on non-alphanumerics, and drops stop
//! tokens").

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is",
    "it", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with", "what", "which",
    "who", "show", "me", "get", "give", "list", "please", "all",
];

pub fn tokenize(text: &str) -> Vec<String> {
    text.to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|tok| !tok.is_empty() && !STOP_WORDS.contains(tok))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_splits_and_drops_stop_words() {
        let tokens = tokenize("Show me the Total Revenue By Region");
        assert_eq!(tokens, vec!["total", "revenue", "region"]);
    }

    #[test]
    fn splits_on_punctuation_and_underscores() {
        let tokens = tokenize("orders.customer_id");
        assert_eq!(tokens, vec!["orders", "customer", "id"]);
    }
}

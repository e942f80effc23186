//! Deterministic, gazetteer-driven semantic tagging over sampled string
//! values and column names (spec §4.3). No model, no network call: a small
//! fixed vocabulary of name tokens and organization/location suffixes.

use crate::profile::types::SemanticTag;

const PERSON_NAME_TOKENS: &[&str] = &[
    "james", "mary", "john", "patricia", "robert", "jennifer", "michael", "linda", "william",
    "elizabeth", "david", "barbara", "richard", "susan", "joseph", "jessica", "thomas", "sarah",
    "charles", "karen", "smith", "johnson", "williams", "brown", "jones", "garcia", "miller",
    "davis", "rodriguez", "martinez",
];

const ORGANIZATION_SUFFIXES: &[&str] = &[
    "inc", "inc.", "llc", "ltd", "ltd.", "corp", "corp.", "corporation", "co", "co.", "gmbh",
    "plc", "llp",
];

const LOCATION_TOKENS: &[&str] = &[
    "street", "st.", "avenue", "ave.", "road", "rd.", "boulevard", "blvd", "city", "county",
    "state", "country", "province", "district", "zip", "postal",
];

/// Column-name hints that the values are likely names/orgs/places even
/// before looking at sampled content.
pub fn tag_from_column_name(column_name: &str) -> Vec<SemanticTag> {
    let name = column_name.to_ascii_lowercase();
    let mut tags = Vec::new();
    if name.contains("name") && (name.contains("first") || name.contains("last") || name == "name" || name.contains("full_name") || name.contains("customer") || name.contains("contact"))
    {
        tags.push(SemanticTag::Person);
    }
    if name.contains("company") || name.contains("organization") || name.contains("employer") || name.contains("vendor") {
        tags.push(SemanticTag::Organization);
    }
    if name.contains("city") || name.contains("country") || name.contains("address") || name.contains("region") || name.contains("location") {
        tags.push(SemanticTag::Location);
    }
    tags
}

/// Tag sampled string values against the gazetteer. Returns the union of
/// tags that a majority of non-null values support, combined by the caller
/// with `tag_from_column_name`.
pub fn tag_from_values(values: &[&str]) -> Vec<SemanticTag> {
    if values.is_empty() {
        return vec![];
    }
    let total = values.len() as f64;

    let person_hits = values
        .iter()
        .filter(|v| {
            v.split_whitespace()
                .any(|word| PERSON_NAME_TOKENS.contains(&word.to_ascii_lowercase().as_str()))
        })
        .count() as f64;
    let org_hits = values
        .iter()
        .filter(|v| {
            let lower = v.to_ascii_lowercase();
            ORGANIZATION_SUFFIXES.iter().any(|s| lower.ends_with(s) || lower.contains(&format!(" {s}")))
        })
        .count() as f64;
    let location_hits = values
        .iter()
        .filter(|v| {
            let lower = v.to_ascii_lowercase();
            LOCATION_TOKENS.iter().any(|t| lower.contains(t))
        })
        .count() as f64;

    let mut tags = Vec::new();
    if person_hits / total > 0.3 {
        tags.push(SemanticTag::Person);
    }
    if org_hits / total > 0.3 {
        tags.push(SemanticTag::Organization);
    }
    if location_hits / total > 0.3 {
        tags.push(SemanticTag::Location);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_person_names_by_column_hint() {
        assert_eq!(tag_from_column_name("first_name"), vec![SemanticTag::Person]);
    }

    #[test]
    fn tags_organization_by_suffix() {
        let values = vec!["Acme Corp", "Globex Inc.", "Initech LLC", "random text"];
        assert_eq!(tag_from_values(&values), vec![SemanticTag::Organization]);
    }

    #[test]
    fn empty_values_produce_no_tags() {
        assert!(tag_from_values(&[]).is_empty());
    }
}

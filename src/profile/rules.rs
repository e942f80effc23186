//! Ordered role-inference rules (spec §4.3).

use crate::profile::types::Role;
use crate::sample::is_temporal_type_name;

const ID_SUFFIXES: &[&str] = &["_id", "id", "_guid", "guid", "_uuid", "uuid", "_key", "_code"];
const MEASURE_TOKENS: &[&str] = &[
    "amount", "total", "price", "cost", "qty", "quantity", "count", "sum", "balance", "revenue",
    "rate", "score", "weight", "duration", "size",
];

fn is_numeric_vendor_type(vendor_type: &str) -> bool {
    let t = vendor_type.to_ascii_lowercase();
    [
        "int", "integer", "smallint", "bigint", "tinyint", "numeric", "decimal", "float", "double",
        "real", "serial", "money",
    ]
    .iter()
    .any(|n| t.contains(n))
}

fn is_text_vendor_type(vendor_type: &str) -> bool {
    let t = vendor_type.to_ascii_lowercase();
    ["char", "text", "clob", "string"].iter().any(|n| t.contains(n))
}

fn looks_like_identifier(column_name: &str) -> bool {
    let name = column_name.to_ascii_lowercase();
    ID_SUFFIXES.iter().any(|suffix| name == *suffix || name.ends_with(suffix))
}

fn looks_like_measure(column_name: &str) -> bool {
    let name = column_name.to_ascii_lowercase();
    MEASURE_TOKENS.iter().any(|token| name.contains(token))
}

/// Parameters the ordered rules need beyond the raw column metadata;
/// threshold and sample size come from the caller so this stays a pure
/// function of its inputs.
pub struct RoleInput<'a> {
    pub column_name: &'a str,
    pub vendor_type: &'a str,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub distinct_ratio: f64,
    pub distinct_count: usize,
    pub value_constraint_threshold: usize,
    pub avg_text_len: Option<f64>,
}

/// Infer a column's role by the ordered rules in spec §4.3. Rule order is
/// significant: the first matching rule wins.
pub fn infer_role(input: &RoleInput) -> Role {
    if input.is_primary_key {
        return Role::Key;
    }
    if input.is_foreign_key || looks_like_identifier(input.column_name) {
        return Role::Id;
    }
    if is_temporal_type_name(input.vendor_type) {
        return Role::Date;
    }
    if is_numeric_vendor_type(input.vendor_type)
        && input.distinct_ratio > 0.2
        && looks_like_measure(input.column_name)
    {
        return Role::Metric;
    }
    if input.distinct_count <= input.value_constraint_threshold {
        return Role::Category;
    }
    if is_text_vendor_type(input.vendor_type) && input.avg_text_len.unwrap_or(0.0) > 32.0 {
        return Role::Text;
    }
    Role::Category
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> RoleInput<'static> {
        RoleInput {
            column_name: "description",
            vendor_type: "text",
            is_primary_key: false,
            is_foreign_key: false,
            distinct_ratio: 0.9,
            distinct_count: 900,
            value_constraint_threshold: 50,
            avg_text_len: Some(80.0),
        }
    }

    #[test]
    fn primary_key_wins_first() {
        let mut input = base_input();
        input.is_primary_key = true;
        assert_eq!(infer_role(&input), Role::Key);
    }

    #[test]
    fn foreign_key_yields_id() {
        let mut input = base_input();
        input.is_foreign_key = true;
        assert_eq!(infer_role(&input), Role::Id);
    }

    #[test]
    fn id_suffix_yields_id_without_fk_flag() {
        let mut input = base_input();
        input.column_name = "customer_id";
        input.vendor_type = "integer";
        assert_eq!(infer_role(&input), Role::Id);
    }

    #[test]
    fn temporal_vendor_type_yields_date() {
        let mut input = base_input();
        input.column_name = "created_at";
        input.vendor_type = "timestamp";
        assert_eq!(infer_role(&input), Role::Date);
    }

    #[test]
    fn numeric_measure_yields_metric() {
        let mut input = base_input();
        input.column_name = "total_amount";
        input.vendor_type = "numeric";
        input.distinct_ratio = 0.8;
        input.distinct_count = 800;
        input.value_constraint_threshold = 10;
        assert_eq!(infer_role(&input), Role::Metric);
    }

    #[test]
    fn low_cardinality_yields_category() {
        let mut input = base_input();
        input.column_name = "status";
        input.vendor_type = "varchar";
        input.distinct_count = 5;
        input.value_constraint_threshold = 20;
        assert_eq!(infer_role(&input), Role::Category);
    }

    #[test]
    fn long_text_yields_text_when_above_threshold() {
        let input = base_input();
        assert_eq!(infer_role(&input), Role::Text);
    }
}

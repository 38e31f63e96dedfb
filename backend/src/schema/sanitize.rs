use regex::Regex;
use std::sync::LazyLock;

static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_]").expect("valid identifier regex"));
static REPEATED_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{2,}").expect("valid underscore regex"));

/// Reduces `raw` to a lowercase `[a-z0-9_]` identifier with no runs of `_`.
///
/// Used for both table names (from the sheet display name) and column names
/// (from spreadsheet headers), so the two always agree.
pub fn sanitize_identifier(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let replaced = INVALID_CHARS.replace_all(&lowered, "_");
    REPEATED_UNDERSCORES.replace_all(&replaced, "_").into_owned()
}

/// Table name for a sheet display name. Surrounding whitespace is ignored.
pub fn table_name_for(display_name: &str) -> String {
    sanitize_identifier(display_name.trim())
}

/// Quotes an identifier for use in SQL text.
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_replaces_spaces() {
        assert_eq!(sanitize_identifier("CNC Tools March"), "cnc_tools_march");
    }

    #[test]
    fn collapses_runs_of_underscores() {
        assert_eq!(sanitize_identifier("Unit Cost (₹)"), "unit_cost_");
        assert_eq!(sanitize_identifier("a  --  b"), "a_b");
        assert_eq!(sanitize_identifier("__x__"), "_x_");
    }

    #[test]
    fn output_only_contains_identifier_chars() {
        for input in ["Ärger über Öl", "Lead Time (days)", "12/03/2024", "tab\there", "ÅSTRÖM"] {
            let out = sanitize_identifier(input);
            assert!(!out.is_empty());
            assert!(
                out.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "{out}"
            );
            assert!(!out.contains("__"), "{out}");
            assert_eq!(out, sanitize_identifier(input));
        }
    }

    #[test]
    fn table_name_ignores_surrounding_whitespace() {
        assert_eq!(table_name_for("  Spare Parts  "), "spare_parts");
    }

    #[test]
    fn quoting_escapes_embedded_quotes() {
        assert_eq!(quote_identifier("parts"), "\"parts\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}

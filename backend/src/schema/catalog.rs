use super::sanitize::sanitize_identifier;
use super::SqlType;
use std::collections::HashMap;
use std::sync::LazyLock;

/// A business column with a canonical name and a fixed type, recognized by any
/// of its header aliases.
#[derive(Debug)]
pub struct CoreColumn {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub defaults_to_now: bool,
    pub aliases: &'static [&'static str],
}

const fn core(name: &'static str, sql_type: SqlType, aliases: &'static [&'static str]) -> CoreColumn {
    CoreColumn {
        name,
        sql_type,
        defaults_to_now: false,
        aliases,
    }
}

const fn dated(name: &'static str, aliases: &'static [&'static str]) -> CoreColumn {
    CoreColumn {
        name,
        sql_type: SqlType::Timestamp,
        defaults_to_now: true,
        aliases,
    }
}

/// Order matters: the first entry claiming an alias wins, so the primary key
/// comes first.
pub static CORE_COLUMNS: &[CoreColumn] = &[
    core("id", SqlType::UuidPrimaryKey, &["id"]),
    core("name", SqlType::Text, &["part name", "item name", "product name"]),
    core("description", SqlType::Text, &["details", "item description"]),
    core("quantity", SqlType::Integer, &["qty", "count", "stock"]),
    core("category", SqlType::Text, &["type", "group"]),
    core("part_id", SqlType::Text, &["part id", "partid"]),
    core("location", SqlType::Text, &["loc"]),
    core("supplier", SqlType::Text, &[]),
    core("part_number", SqlType::Text, &["part number", "partno"]),
    core("manufacturer", SqlType::Text, &["make"]),
    core("machine_model", SqlType::Text, &["machine model", "machine"]),
    core("part_category", SqlType::Text, &["part category", "parttype"]),
    core("stock_quantity", SqlType::Integer, &["stock quantity", "stockqty"]),
    core("min_stock_level", SqlType::Integer, &["min stock level", "minstock"]),
    core("unit_cost", SqlType::Numeric, &["unit cost (₹)", "unitcost", "cost"]),
    core("lead_time", SqlType::Integer, &["lead time (days)", "leadtime"]),
    dated("last_replaced_date", &["last replaced date", "lastreplaced"]),
    dated("last_used_at", &["last used at"]),
    core("usage_count", SqlType::Integer, &["usage count"]),
    dated("created_at", &["created at"]),
    dated("updated_at", &["updated at"]),
];

static BY_ALIAS: LazyLock<HashMap<String, &'static CoreColumn>> = LazyLock::new(|| {
    let mut index = HashMap::new();
    for column in CORE_COLUMNS {
        let names = std::iter::once(column.name).chain(column.aliases.iter().copied());
        for alias in names {
            index.entry(sanitize_identifier(alias)).or_insert(column);
        }
    }
    index
});

/// Finds the core column whose canonical name or alias sanitizes to
/// `sanitized_key`.
pub fn lookup(sanitized_key: &str) -> Option<&'static CoreColumn> {
    BY_ALIAS.get(sanitized_key).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(header: &str) -> Option<&'static str> {
        lookup(&sanitize_identifier(header)).map(|c| c.name)
    }

    #[test]
    fn canonical_names_match_themselves() {
        for column in CORE_COLUMNS {
            assert_eq!(resolve(column.name), Some(column.name));
        }
    }

    #[test]
    fn aliases_match_regardless_of_case_and_spacing() {
        assert_eq!(resolve("Part Name"), Some("name"));
        assert_eq!(resolve("PART_NAME"), Some("name"));
        assert_eq!(resolve("Qty"), Some("quantity"));
        assert_eq!(resolve("Unit Cost (₹)"), Some("unit_cost"));
        assert_eq!(resolve("Lead Time (days)"), Some("lead_time"));
        assert_eq!(resolve("Machine"), Some("machine_model"));
    }

    #[test]
    fn bare_id_is_the_primary_key() {
        let column = lookup("id").unwrap();
        assert_eq!(column.sql_type, SqlType::UuidPrimaryKey);
        assert_eq!(resolve("Part ID"), Some("part_id"));
    }

    #[test]
    fn date_columns_default_to_now() {
        for name in ["last_replaced_date", "last_used_at", "created_at", "updated_at"] {
            let column = lookup(name).unwrap();
            assert_eq!(column.sql_type, SqlType::Timestamp);
            assert!(column.defaults_to_now);
        }
        assert!(!lookup("quantity").unwrap().defaults_to_now);
    }

    #[test]
    fn unknown_headers_do_not_match() {
        assert_eq!(resolve("Colour"), None);
        assert_eq!(resolve("qty2"), None);
    }
}

use super::sanitize::quote_identifier;
use super::{ColumnSpec, SqlType, TableSchema, SCHEMA_NAMESPACE};

/// SQLite expression for the current time in the timestamp storage format.
const NOW_DEFAULT: &str = "(strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))";

pub fn qualified_table_name(table_name: &str) -> String {
    format!(
        "{}.{}",
        quote_identifier(SCHEMA_NAMESPACE),
        quote_identifier(table_name)
    )
}

fn column_definition(column: &ColumnSpec) -> String {
    let mut definition = format!(
        "{} {}",
        quote_identifier(&column.name),
        column.sql_type.declared_type()
    );
    if column.sql_type == SqlType::UuidPrimaryKey {
        definition.push_str(" PRIMARY KEY NOT NULL");
    }
    if column.defaults_to_now {
        definition.push_str(" DEFAULT ");
        definition.push_str(NOW_DEFAULT);
    }
    definition
}

pub fn render_create_table(schema: &TableSchema) -> String {
    let columns: Vec<String> = schema.columns.iter().map(column_definition).collect();
    format!(
        "CREATE TABLE {} ({});",
        qualified_table_name(&schema.table_name),
        columns.join(", ")
    )
}

/// Drops the table if it is there, so running it twice is harmless.
pub fn render_drop_table(table_name: &str) -> String {
    format!("DROP TABLE IF EXISTS {};", qualified_table_name(table_name))
}

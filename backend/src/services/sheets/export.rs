//! `GET /api/sheets/{table_name}/export`: an imported table as a CSV file.

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use rusqlite::types::Value;

use super::rows::load_sheet;
use crate::db::registry::{StoredColumn, TableContents};
use crate::db::Database;
use crate::error::SheetError;

pub(crate) async fn process(
    db: web::Data<Database>,
    table_name: web::Path<String>,
) -> Result<HttpResponse, SheetError> {
    let table_name = table_name.into_inner();
    let contents = load_sheet(db, table_name.clone()).await?;
    let csv = to_csv(&contents).map_err(|e| SheetError::Unexpected(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(format!("{table_name}.csv"))],
        })
        .body(csv))
}

fn field(column: &StoredColumn, value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) if column.is_boolean() => (*i != 0).to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn to_csv(contents: &TableContents) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(contents.columns.iter().map(|c| c.name.as_str()))?;
    for row in &contents.rows {
        writer.write_record(
            contents
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| field(column, value)),
        )?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_quoted_fields() {
        let contents = TableContents {
            columns: vec![
                StoredColumn {
                    name: "name".into(),
                    declared_type: Some("TEXT".into()),
                },
                StoredColumn {
                    name: "in_service".into(),
                    declared_type: Some("BOOLEAN".into()),
                },
                StoredColumn {
                    name: "unit_cost".into(),
                    declared_type: Some("NUMERIC".into()),
                },
            ],
            rows: vec![
                vec![Value::Text("Nut, M8".into()), Value::Integer(1), Value::Real(0.25)],
                vec![Value::Text("Bolt".into()), Value::Null, Value::Integer(3)],
            ],
        };
        let csv = String::from_utf8(to_csv(&contents).unwrap()).unwrap();
        assert_eq!(
            csv,
            "name,in_service,unit_cost\n\"Nut, M8\",true,0.25\nBolt,,3\n"
        );
    }
}

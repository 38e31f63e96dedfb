use actix_web::{web, HttpResponse};

use crate::db::{registry, Database};
use crate::error::SheetError;

/// `GET /api/sheets`: every imported sheet, newest first.
pub(crate) async fn process(db: web::Data<Database>) -> Result<HttpResponse, SheetError> {
    let database = db.get_ref().clone();
    let entries = tokio::task::spawn_blocking(move || -> Result<_, SheetError> {
        let conn = database.open()?;
        Ok(registry::list_entries(&conn)?)
    })
    .await
    .map_err(|e| SheetError::Unexpected(format!("join error: {}", e)))??;
    Ok(HttpResponse::Ok().json(entries))
}

#[cfg(test)]
mod tests {
    use crate::services::sheets::configure_routes;
    use crate::services::sheets::test_support::temp_database;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn empty_registry_is_an_empty_list() {
        let (_dir, db) = temp_database();
        let app = test::init_service(App::new().app_data(db.clone()).service(configure_routes())).await;

        let req = test::TestRequest::get().uri("/api/sheets").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([]));
    }
}

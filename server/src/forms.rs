//! Form submissions. Records are open-ended key/value maps: the frontend
//! owns the field list, the backend only enforces `nombre` and `codigo`
//! and stamps creation metadata. Submissions are write-once.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use services::models::FORMS_COLLECTION;

use crate::{auth::authenticate, error::AppError, state::AppState};

pub const CREATED_AT_FIELD: &str = "creadoEn";

/// Listing projection: enough for the table view, not the whole record.
#[derive(Debug, Serialize)]
pub struct RecordSummary {
    pub id: String,
    pub codigo: String,
    pub nombre: String,
    pub area: String,
    #[serde(rename = "creadoEn")]
    pub creado_en: String,
}

pub async fn list_records_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    authenticate(&state, &headers).await?;

    let documents = state
        .store
        .scan_desc(FORMS_COLLECTION, CREATED_AT_FIELD)
        .await?;

    let records: Vec<RecordSummary> = documents
        .into_iter()
        .map(|document| RecordSummary {
            id: document.id,
            codigo: field_text(&document.fields, "codigo"),
            nombre: field_text(&document.fields, "nombre"),
            area: field_text(&document.fields, "area"),
            creado_en: field_text(&document.fields, CREATED_AT_FIELD),
        })
        .collect();

    Ok(Json(json!({ "success": true, "records": records })))
}

pub async fn get_record_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authenticate(&state, &headers).await?;

    let document = state
        .store
        .get(FORMS_COLLECTION, &id)
        .await
        .map_err(|err| match err {
            services::StoreError::NotFound => AppError::NotFound("form not found".to_string()),
            other => other.into(),
        })?;

    let mut record = Map::new();
    record.insert("id".to_string(), Value::String(document.id));
    record.extend(document.fields);

    Ok(Json(Value::Object(record)))
}

pub async fn create_record_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut form): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let user = authenticate(&state, &headers).await?;

    if field_text(&form, "nombre").is_empty() || field_text(&form, "codigo").is_empty() {
        return Err(AppError::Validation(
            "nombre and codigo are required".to_string(),
        ));
    }

    form.insert(
        CREATED_AT_FIELD.to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    form.insert("createdBy".to_string(), Value::String(user.uid));

    let id = state.store.insert(FORMS_COLLECTION, &form).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": id, "message": "form saved" })),
    ))
}

fn field_text(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::field_text;

    fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_present_fields() {
        let map = fields(&[("codigo", json!(" A-7 ")), ("area", json!("ventas"))]);

        assert_eq!(field_text(&map, "codigo"), "A-7");
        assert_eq!(field_text(&map, "area"), "ventas");
    }

    #[test]
    fn test_absent_and_non_text_fields_default_empty() {
        let map = fields(&[("codigo", json!(null)), ("extra", json!({"a": 1}))]);

        assert_eq!(field_text(&map, "codigo"), "");
        assert_eq!(field_text(&map, "extra"), "");
        assert_eq!(field_text(&map, "nombre"), "");
    }
}

//! # Statistics
//!
//! Per-field categorical distributions over the whole `Formularios`
//! collection, shaped for the dashboard's charts.
//!
//! One bulk read, one counting pass, no cache: every call recomputes from
//! scratch, which is the right tradeoff at this collection size. Label
//! order is first-seen during the scan and must stay that way — the charts
//! rely on stable ordering between reloads of an unchanged collection.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;
use serde_json::Value;
use services::{models::FORMS_COLLECTION, Document};

use crate::{auth::authenticate, error::AppError, state::AppState};

/// Chart colors, assigned to labels by index modulo the palette length.
pub const PALETTE: [&str; 8] = [
    "#1a5f1a", "#4CAF50", "#8BC34A", "#FFC107", "#FF5722", "#2196F3", "#9C27B0", "#E91E63",
];

/// One field to tally, with the title the charts display.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: String,
    pub title: String,
}

impl FieldSpec {
    pub fn new(field: &str, title: &str) -> Self {
        Self {
            field: field.to_string(),
            title: title.to_string(),
        }
    }
}

/// Chart-ready distribution for one field: `labels[i]` occurred `data[i]`
/// times and is drawn in `backgroundColor[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChart {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
    pub background_color: Vec<String>,
    pub title: String,
}

pub struct Aggregator {
    fields: Vec<FieldSpec>,
}

impl Aggregator {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// The field set the registration form declares.
    pub fn declared() -> Self {
        Self::new(vec![
            FieldSpec::new("sexo", "Distribución por Sexo"),
            FieldSpec::new("es_padre_madre", "Padres o Madres"),
            FieldSpec::new("etnia", "Pertenece a una Etnia"),
            FieldSpec::new("religion", "Religión"),
            FieldSpec::new("lgbtiq", "Comunidad LGBTIQ+"),
            FieldSpec::new("nivel_educativo", "Nivel Educativo"),
        ])
    }

    /// Tallies the declared fields across `records`. Fields nothing
    /// populates are left out entirely, so an empty collection yields an
    /// empty map.
    pub fn summarize(&self, records: &[Document]) -> BTreeMap<String, FieldChart> {
        let mut charts = BTreeMap::new();

        for spec in &self.fields {
            let mut labels: Vec<String> = Vec::new();
            let mut data: Vec<u64> = Vec::new();
            let mut positions: HashMap<String, usize> = HashMap::new();

            for record in records {
                let Some(value) = record.fields.get(&spec.field).and_then(scalar_text) else {
                    continue;
                };

                match positions.get(&value) {
                    Some(&position) => data[position] += 1,
                    None => {
                        positions.insert(value.clone(), labels.len());
                        labels.push(value);
                        data.push(1);
                    }
                }
            }

            if labels.is_empty() {
                continue;
            }

            let background_color = (0..labels.len())
                .map(|i| PALETTE[i % PALETTE.len()].to_string())
                .collect();

            charts.insert(
                spec.field.clone(),
                FieldChart {
                    labels,
                    data,
                    background_color,
                    title: spec.title.clone(),
                },
            );
        }

        charts
    }
}

/// Trimmed text of a scalar value. Null, composite, and whitespace-only
/// values count as absent.
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    if text.is_empty() {
        return None;
    }

    Some(text)
}

pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<BTreeMap<String, FieldChart>>, AppError> {
    authenticate(&state, &headers).await?;

    let records = state.store.scan(FORMS_COLLECTION).await?;

    Ok(Json(state.aggregator.summarize(&records)))
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};
    use services::Document;

    use super::{Aggregator, FieldSpec, PALETTE};

    fn record(pairs: &[(&str, Value)]) -> Document {
        let mut fields = Map::new();
        for (key, value) in pairs {
            fields.insert(key.to_string(), value.clone());
        }
        Document {
            id: format!("doc-{}", fields.len()),
            fields,
        }
    }

    #[test]
    fn test_empty_collection() {
        let charts = Aggregator::declared().summarize(&[]);
        assert!(charts.is_empty());
    }

    #[test]
    fn test_first_seen_order_and_counts() {
        let records = vec![
            record(&[("sexo", json!("F"))]),
            record(&[("sexo", json!("M"))]),
            record(&[("sexo", json!("F"))]),
        ];

        let charts = Aggregator::declared().summarize(&records);
        let sexo = &charts["sexo"];

        assert_eq!(sexo.labels, vec!["F", "M"]);
        assert_eq!(sexo.data, vec![2, 1]);
        assert_eq!(sexo.title, "Distribución por Sexo");
    }

    #[test]
    fn test_idempotent_over_unchanged_records() {
        let records = vec![
            record(&[("sexo", json!("M")), ("religion", json!("Ninguna"))]),
            record(&[("sexo", json!("F"))]),
        ];

        let aggregator = Aggregator::declared();
        assert_eq!(aggregator.summarize(&records), aggregator.summarize(&records));
    }

    #[test]
    fn test_undeclared_fields_never_appear() {
        let records = vec![
            record(&[("sexo", json!("F")), ("codigo", json!("A-1"))]),
            record(&[("sexo", json!("M")), ("codigo", json!("A-2"))]),
        ];

        let charts = Aggregator::declared().summarize(&records);

        assert!(charts.contains_key("sexo"));
        assert!(!charts.contains_key("codigo"));
    }

    #[test]
    fn test_null_and_empty_values_skipped() {
        let records = vec![
            record(&[("religion", json!(""))]),
            record(&[("religion", json!(null))]),
            record(&[("religion", json!("   "))]),
            record(&[("religion", json!("Ninguna"))]),
        ];

        let charts = Aggregator::declared().summarize(&records);
        let religion = &charts["religion"];

        assert_eq!(religion.labels, vec!["Ninguna"]);
        assert_eq!(religion.data, vec![1]);
    }

    #[test]
    fn test_missing_field_skipped_for_that_tally_only() {
        let records = vec![
            record(&[("sexo", json!("F")), ("religion", json!("Ninguna"))]),
            record(&[("sexo", json!("M"))]),
        ];

        let charts = Aggregator::declared().summarize(&records);

        assert_eq!(charts["sexo"].data, vec![1, 1]);
        assert_eq!(charts["religion"].data, vec![1]);
    }

    #[test]
    fn test_values_trimmed_before_counting() {
        let records = vec![
            record(&[("sexo", json!(" F "))]),
            record(&[("sexo", json!("F"))]),
        ];

        let charts = Aggregator::declared().summarize(&records);

        assert_eq!(charts["sexo"].labels, vec!["F"]);
        assert_eq!(charts["sexo"].data, vec![2]);
    }

    #[test]
    fn test_data_sums_to_populated_record_count() {
        let records = vec![
            record(&[("nivel_educativo", json!("Primaria"))]),
            record(&[("nivel_educativo", json!("Secundaria"))]),
            record(&[("nivel_educativo", json!("Primaria"))]),
            record(&[("sexo", json!("F"))]),
        ];

        let charts = Aggregator::declared().summarize(&records);
        let total: u64 = charts["nivel_educativo"].data.iter().sum();

        assert_eq!(total, 3);
    }

    #[test]
    fn test_palette_cycles_past_eight_labels() {
        let records: Vec<_> = (0..10)
            .map(|i| record(&[("etnia", json!(format!("etnia-{i}")))]))
            .collect();

        let charts = Aggregator::declared().summarize(&records);
        let colors = &charts["etnia"].background_color;

        assert_eq!(colors.len(), 10);
        assert_eq!(colors[8], PALETTE[0]);
        assert_eq!(colors[9], PALETTE[1]);
    }

    #[test]
    fn test_substituted_field_set() {
        let aggregator = Aggregator::new(vec![FieldSpec::new("turno", "Turno")]);
        let records = vec![
            record(&[("turno", json!("dia")), ("sexo", json!("F"))]),
            record(&[("turno", json!("noche"))]),
        ];

        let charts = aggregator.summarize(&records);

        assert_eq!(charts.len(), 1);
        assert_eq!(charts["turno"].labels, vec!["dia", "noche"]);
    }

    #[test]
    fn test_numeric_and_boolean_values_stringified() {
        let records = vec![
            record(&[("es_padre_madre", json!(true))]),
            record(&[("es_padre_madre", json!(true))]),
            record(&[("es_padre_madre", json!(2))]),
        ];

        let charts = Aggregator::declared().summarize(&records);

        assert_eq!(charts["es_padre_madre"].labels, vec!["true", "2"]);
        assert_eq!(charts["es_padre_madre"].data, vec![2, 1]);
    }
}

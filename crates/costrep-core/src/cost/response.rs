//! Cost query response schema.

use serde::Deserialize;
use serde_json::Value;

use crate::retry::MalformedResponse;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    properties: QueryProperties,
}

#[derive(Debug, Deserialize)]
struct QueryProperties {
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default)]
    rows: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Deserialize)]
struct Column {
    name: String,
}

/// Cost and currency taken from the first data row.
#[derive(Debug, Clone, PartialEq)]
pub struct CostRow {
    pub cost: f64,
    pub currency: Option<String>,
}

const COST_COLUMNS: &[&str] = &["Cost", "PreTaxCost", "CostUSD"];
const CURRENCY_COLUMN: &str = "Currency";

/// Parse a successful query response.
///
/// Returns `Ok(None)` when there are no rows; the caller reports that as zero
/// cost. An empty answer and a genuinely zero month cannot be told apart here.
pub fn parse_query_response(body: &[u8]) -> Result<Option<CostRow>, MalformedResponse> {
    let parsed: QueryResponse = serde_json::from_slice(body)
        .map_err(|e| MalformedResponse::new(format!("query response: {}", e)))?;
    let props = parsed.properties;

    let row = match props.rows.as_deref().and_then(<[_]>::first) {
        Some(row) => row,
        None => return Ok(None),
    };

    let cost_idx = column_index(&props.columns, COST_COLUMNS).unwrap_or(0);
    let currency_idx = column_index(&props.columns, &[CURRENCY_COLUMN]).unwrap_or(1);

    let cost = match row.get(cost_idx) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
    .ok_or_else(|| {
        MalformedResponse::new(format!("row has no numeric cost at index {}: {:?}", cost_idx, row))
    })?;

    let currency = match row.get(currency_idx) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    Ok(Some(CostRow { cost, currency }))
}

fn column_index(columns: &[Column], names: &[&str]) -> Option<usize> {
    columns
        .iter()
        .position(|c| names.iter().any(|n| c.name.eq_ignore_ascii_case(n)))
}

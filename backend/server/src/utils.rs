use axum::{Json, body::Bytes};
use serde::Deserialize;
use serde_json::Value;
use store::{
    Filter,
    bson::{Document, oid::ObjectId},
    json::{from_json, to_json},
};

use crate::error::AppError::{self, MalformedPayload};

pub fn parse_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| MalformedPayload(format!("invalid id {id:?}")))
}

pub fn get_document_from_body(body: Bytes) -> Result<Document, AppError> {
    let value: Value =
        serde_json::from_slice(&body).map_err(|e| MalformedPayload(format!("invalid JSON: {e}")))?;

    if !value.is_object() {
        return Err(AppError::malformed("expected a JSON object"));
    }

    Ok(from_json(&value)?)
}

/// A non-empty string field the route cannot work without.
pub fn required_str<'a>(document: &'a Document, field: &str) -> Result<&'a str, AppError> {
    match document.get_str(field) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(MalformedPayload(format!("{field} must be a non-empty string"))),
    }
}

pub fn one(document: Option<Document>) -> Json<Value> {
    Json(document.map_or(Value::Null, to_json))
}

pub fn many(documents: Vec<Document>) -> Json<Value> {
    Json(Value::Array(documents.into_iter().map(to_json).collect()))
}

/// Query string of the filtered catalog lists.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
}

impl CatalogQuery {
    pub fn to_filter(&self) -> Result<Filter, AppError> {
        let mut filter = Filter::All;

        if let Some(search) = present(&self.search) {
            filter = filter.and(Filter::contains("title", search));
        }
        if let Some(category) = present(&self.category) {
            filter = filter.and(Filter::eq("category", category));
        }
        if let Some(price) = present(&self.price) {
            let (min, max) = parse_price_range(price)?;
            filter = filter.and(Filter::between("price", min, max));
        }

        Ok(filter)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Parses an inclusive `"min-max"` price range.
pub fn parse_price_range(range: &str) -> Result<(f64, f64), AppError> {
    let malformed = || MalformedPayload(format!("price must look like min-max, got {range:?}"));

    let (min, max) = range.split_once('-').ok_or_else(malformed)?;
    let min: f64 = min.trim().parse().map_err(|_| malformed())?;
    let max: f64 = max.trim().parse().map_err(|_| malformed())?;

    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(malformed());
    }

    Ok((min, max))
}

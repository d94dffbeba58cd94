//! Conversions between request/response JSON and stored BSON.
//!
//! Object ids leave the server as 24-character hex strings and dates as
//! RFC 3339 strings, which is what the frontend compares against.
use mongodb::bson::{self, Bson, Document};
use serde_json::{Map, Number, Value};

use crate::StoreError;

pub fn to_json(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, bson_to_json(value)))
            .collect::<Map<String, Value>>(),
    )
}

pub fn from_json(value: &Value) -> Result<Document, StoreError> {
    Ok(bson::to_document(value)?)
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(flag) => Value::Bool(flag),
        Bson::Int32(number) => Value::from(number),
        Bson::Int64(number) => Value::from(number),
        Bson::Double(number) => Number::from_f64(number).map_or(Value::Null, Value::Number),
        Bson::String(text) => Value::String(text),
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(date) => date
            .try_to_rfc3339_string()
            .map_or_else(|_| Value::from(date.timestamp_millis()), Value::String),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Document(document) => to_json(document),
        other => other.into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{DateTime, doc, oid::ObjectId};
    use serde_json::json;

    use super::{from_json, to_json};

    #[test]
    fn test_object_ids_become_hex() {
        let id = ObjectId::new();
        let document = doc! { "_id": id, "reviewer": { "ids": [id] } };

        assert_eq!(
            to_json(document),
            json!({ "_id": id.to_hex(), "reviewer": { "ids": [id.to_hex()] } })
        );
    }

    #[test]
    fn test_dates_become_rfc3339() {
        let document = doc! { "timestamp": DateTime::from_millis(0) };

        assert_eq!(
            to_json(document),
            json!({ "timestamp": "1970-01-01T00:00:00Z" })
        );
    }

    #[test]
    fn test_json_body_keeps_numbers() {
        let document = from_json(&json!({ "title": "Soup", "price": 12, "rating": 4.5 })).unwrap();

        assert_eq!(document.get_str("title").ok(), Some("Soup"));
        assert_eq!(document.get_f64("rating").ok(), Some(4.5));
        assert_eq!(to_json(document)["price"], json!(12));
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        assert!(from_json(&json!([1, 2, 3])).is_err());
        assert!(from_json(&json!("meal")).is_err());
    }
}

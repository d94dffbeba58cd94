use mongodb::bson::{Bson, Document};

use crate::{StoreError, filter::as_number};

/// Field-level modifications applied atomically to one document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Update {
    set: Document,
    inc: Document,
    set_on_insert: Document,
}

impl Update {
    /// `$set` of every field in `fields` except `_id`, which is immutable.
    ///
    /// Only top-level names are accepted. MongoDB reads `a.b` as a path into
    /// `a` and `$x` as an operator, neither of which a stored field can be.
    pub fn set(mut fields: Document) -> Result<Self, StoreError> {
        fields.remove("_id");

        if let Some(field) = fields.keys().find(|field| !is_plain_field(field)) {
            return Err(StoreError::InvalidUpdate(format!(
                "field name {field:?} may not be empty, contain '.' or start with '$'"
            )));
        }

        Ok(Self {
            set: fields,
            ..Self::default()
        })
    }

    /// `$set` of one top-level field.
    pub fn set_field(field: &str, value: impl Into<Bson>) -> Self {
        let mut update = Self::default();
        update.set.insert(field, value);
        update
    }

    pub fn inc(field: &str, by: impl Into<Bson>) -> Self {
        Self::default().and_inc(field, by)
    }

    pub fn and_inc(mut self, field: &str, by: impl Into<Bson>) -> Self {
        self.inc.insert(field, by);
        self
    }

    /// Fields written only when an upsert inserts a new document.
    pub fn and_set_on_insert(mut self, fields: Document) -> Self {
        for (field, value) in fields {
            self.set_on_insert.insert(field, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.inc.is_empty() && self.set_on_insert.is_empty()
    }

    /// Renders the MongoDB update document, omitting empty operators.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();

        for (operator, fields) in [
            ("$set", &self.set),
            ("$inc", &self.inc),
            ("$setOnInsert", &self.set_on_insert),
        ] {
            if !fields.is_empty() {
                document.insert(operator, fields.clone());
            }
        }

        document
    }

    /// Applies `$set` and `$inc` in place, returning whether the document changed.
    ///
    /// Nothing is written when an increment fails.
    pub fn apply(&self, document: &mut Document) -> Result<bool, StoreError> {
        let increments = self
            .inc
            .iter()
            .map(|(field, by)| Ok((field, add(field, document.get(field), by)?)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut changed = false;

        for (field, value) in &self.set {
            if document.get(field) != Some(value) {
                document.insert(field.as_str(), value.clone());
                changed = true;
            }
        }

        for (field, next) in increments {
            if document.get(field) != Some(&next) {
                document.insert(field.as_str(), next);
                changed = true;
            }
        }

        Ok(changed)
    }

    /// Builds the document an upsert inserts from the filter's equality terms.
    pub fn upserted(&self, mut base: Document) -> Result<Document, StoreError> {
        for (field, value) in &self.set_on_insert {
            base.insert(field.as_str(), value.clone());
        }

        self.apply(&mut base)?;
        Ok(base)
    }
}

fn is_plain_field(field: &str) -> bool {
    !field.is_empty() && !field.contains('.') && !field.starts_with('$')
}

// Missing fields count as zero. Two int32s widen to int64 when the sum needs
// it, an int64 sum that overflows is rejected the way MongoDB rejects it.
fn add(field: &str, current: Option<&Bson>, by: &Bson) -> Result<Bson, StoreError> {
    let current = current.unwrap_or(&Bson::Int32(0));

    let (Some(left), Some(right)) = (integer(current), integer(by)) else {
        return Ok(Bson::Double(
            as_number(current).unwrap_or(0.0) + as_number(by).unwrap_or(0.0),
        ));
    };

    let sum = left.checked_add(right).ok_or_else(|| {
        StoreError::InvalidUpdate(format!("incrementing {field} by {by} overflows"))
    })?;

    Ok(match (current, by) {
        (Bson::Int32(_), Bson::Int32(_)) => {
            i32::try_from(sum).map(Bson::Int32).unwrap_or(Bson::Int64(sum))
        }
        _ => Bson::Int64(sum),
    })
}

fn integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(number) => Some(i64::from(*number)),
        Bson::Int64(number) => Some(*number),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{Bson, doc, oid::ObjectId};

    use crate::StoreError;

    use super::Update;

    #[test]
    fn test_set_never_touches_id() {
        let update = Update::set(doc! { "_id": ObjectId::new(), "rating": 4 }).unwrap();

        assert_eq!(update.to_document(), doc! { "$set": { "rating": 4 } });
    }

    #[test]
    fn test_document_omits_empty_operators() {
        let update = Update::inc("totalRating", 5).and_inc("ratingCount", 1);

        assert_eq!(
            update.to_document(),
            doc! { "$inc": { "totalRating": 5, "ratingCount": 1 } }
        );
        assert!(Update::set(doc! { "_id": 1 }).unwrap().is_empty());
    }

    #[test]
    fn test_inc_from_missing_field() {
        let mut meal = doc! { "title": "Soup" };

        assert!(Update::inc("likes", 1).apply(&mut meal).unwrap());
        assert!(Update::inc("likes", 1).apply(&mut meal).unwrap());
        assert_eq!(meal.get_i32("likes").ok(), Some(2));
    }

    #[test]
    fn test_inc_keeps_fractions() {
        let mut lawyer = doc! { "totalRating": 4 };

        Update::inc("totalRating", 3.5).apply(&mut lawyer).unwrap();

        assert_eq!(lawyer.get_f64("totalRating").ok(), Some(7.5));
    }

    #[test]
    fn test_set_same_value_is_not_a_change() {
        let mut request = doc! { "status": "Served" };

        assert!(!Update::set_field("status", "Served").apply(&mut request).unwrap());
        assert!(Update::set_field("status", "Pending").apply(&mut request).unwrap());
    }

    #[test]
    fn test_upserted_document() {
        let update = Update::set(doc! { "name": "Jane" })
            .unwrap()
            .and_set_on_insert(doc! { "totalRating": 0, "ratingCount": 0 });

        let document = update
            .upserted(doc! { "lawyer_email": "jane@law.com" })
            .unwrap();

        assert_eq!(
            document,
            doc! {
                "lawyer_email": "jane@law.com",
                "totalRating": 0,
                "ratingCount": 0,
                "name": "Jane",
            }
        );
    }

    #[test]
    fn test_int32_sum_widens() {
        let mut meal = doc! { "likes": i32::MAX };

        Update::inc("likes", 1).apply(&mut meal).unwrap();

        assert_eq!(meal.get("likes"), Some(&Bson::Int64(i64::from(i32::MAX) + 1)));
    }

    #[test]
    fn test_int64_overflow_is_rejected() {
        let mut meal = doc! { "likes": i64::MAX, "title": "Soup" };
        let update = Update::inc("likes", 1).and_inc("reviews", 1);

        let result = update.apply(&mut meal);

        assert!(matches!(result, Err(StoreError::InvalidUpdate(_))));
        assert_eq!(meal, doc! { "likes": i64::MAX, "title": "Soup" });
    }

    #[test]
    fn test_set_rejects_paths_and_operators() {
        for field in ["reviewer.email", "$rename", ""] {
            let mut fields = doc! { "rating": 5 };
            fields.insert(field, "x");

            assert!(
                matches!(Update::set(fields), Err(StoreError::InvalidUpdate(_))),
                "{field:?} was accepted"
            );
        }
    }
}

use mongodb::bson::{Bson, Document, oid::ObjectId};
use regex::RegexBuilder;

/// A query over one collection.
///
/// Field names may be dotted paths into embedded documents, such as
/// `userInfo.email`.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    All,
    Id(ObjectId),
    Eq(String, Bson),
    /// Case-insensitive literal substring of a string field.
    Contains(String, String),
    /// Inclusive numeric range.
    Between(String, f64, f64),
    And(Vec<Filter>),
}

impl Filter {
    pub fn id(id: ObjectId) -> Self {
        Filter::Id(id)
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::Contains(field.into(), needle.into())
    }

    pub fn between(field: impl Into<String>, min: f64, max: f64) -> Self {
        Filter::Between(field.into(), min, max)
    }

    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, filter) | (filter, Filter::All) => filter,
            (Filter::And(mut filters), filter) => {
                filters.push(filter);
                Filter::And(filters)
            }
            (left, right) => Filter::And(vec![left, right]),
        }
    }

    /// Renders the MongoDB query document.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();

        match self {
            Filter::All => {}
            Filter::Id(id) => {
                document.insert("_id", *id);
            }
            Filter::Eq(field, value) => {
                document.insert(field.as_str(), value.clone());
            }
            Filter::Contains(field, needle) => {
                let mut regex = Document::new();
                regex.insert("$regex", regex::escape(needle));
                regex.insert("$options", "i");
                document.insert(field.as_str(), regex);
            }
            Filter::Between(field, min, max) => {
                let mut range = Document::new();
                range.insert("$gte", *min);
                range.insert("$lte", *max);
                document.insert(field.as_str(), range);
            }
            Filter::And(filters) => match filters.as_slice() {
                [] => {}
                [only] => return only.to_document(),
                _ => {
                    let terms: Vec<Bson> = filters
                        .iter()
                        .map(|filter| Bson::Document(filter.to_document()))
                        .collect();
                    document.insert("$and", terms);
                }
            },
        }

        document
    }

    /// Evaluates the filter the way MongoDB would for the supported operators.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => document.get("_id") == Some(&Bson::ObjectId(*id)),
            Filter::Eq(field, value) => {
                lookup(document, field).is_some_and(|found| same_value(found, value))
            }
            Filter::Contains(field, needle) => match lookup(document, field) {
                Some(Bson::String(text)) => RegexBuilder::new(&regex::escape(needle))
                    .case_insensitive(true)
                    .build()
                    .is_ok_and(|regex| regex.is_match(text)),
                _ => false,
            },
            Filter::Between(field, min, max) => lookup(document, field)
                .and_then(as_number)
                .is_some_and(|value| *min <= value && value <= *max),
            Filter::And(filters) => filters.iter().all(|filter| filter.matches(document)),
        }
    }

    /// Fields an upsert copies into the inserted document.
    pub fn equality_terms(&self) -> Document {
        let mut terms = Document::new();
        self.collect_equality_terms(&mut terms);
        terms
    }

    fn collect_equality_terms(&self, terms: &mut Document) {
        match self {
            Filter::Id(id) => {
                terms.insert("_id", *id);
            }
            Filter::Eq(field, value) if !field.contains('.') => {
                terms.insert(field.as_str(), value.clone());
            }
            Filter::And(filters) => {
                for filter in filters {
                    filter.collect_equality_terms(terms);
                }
            }
            _ => {}
        }
    }
}

pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

pub fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(number) => Some(f64::from(*number)),
        Bson::Int64(number) => Some(*number as f64),
        Bson::Double(number) => Some(*number),
        _ => None,
    }
}

// Numbers compare by value across BSON numeric types.
fn same_value(left: &Bson, right: &Bson) -> bool {
    match (as_number(left), as_number(right)) {
        (Some(left), Some(right)) => left == right,
        _ => left == right,
    }
}

//! Equality queries for collections.
//!
//! A [`Query`] is a conjunction of [`Predicate`]s, each requiring one field to equal one
//! value. Collections accept anything convertible into a query, most commonly a query map:
//!
//! ```ignore
//! use bson::doc;
//! use odmlayer::query::{Query, Filter};
//!
//! // From a query map: every pair becomes an equality predicate.
//! let by_map: Query = doc! { "section": "A", "active": true }.into();
//!
//! // With the builder.
//! let by_builder = Query::builder()
//!     .eq("section", "A")
//!     .predicate(Filter::eq("active", true))
//!     .build();
//!
//! assert_eq!(by_map, by_builder);
//! ```
//!
//! An empty query matches every record in a collection.

use bson::Bson;

use crate::document::Record;

/// A single equality condition: `field == value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// The field name to compare.
    pub field: String,
    /// The value the field must equal.
    pub value: Bson,
}

impl Predicate {
    pub fn new(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self { field: field.into(), value: value.into() }
    }
}

/// A conjunction of equality predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Predicates that must all hold for a record to match.
    pub predicates: Vec<Predicate>,
}

impl Query {
    /// Creates a query matching every record.
    pub fn new() -> Self {
        Query { predicates: Vec::new() }
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Returns `true` if the query has no predicates.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl From<Record> for Query {
    fn from(map: Record) -> Self {
        map.into_iter()
            .map(|(field, value)| Predicate { field, value })
            .collect()
    }
}

impl From<&Record> for Query {
    fn from(map: &Record) -> Self {
        map.iter()
            .map(|(field, value)| Predicate::new(field.as_str(), value.clone()))
            .collect()
    }
}

impl From<Predicate> for Query {
    fn from(predicate: Predicate) -> Self {
        Query { predicates: vec![predicate] }
    }
}

impl FromIterator<Predicate> for Query {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        Query { predicates: iter.into_iter().collect() }
    }
}

/// Helper for constructing predicates.
pub struct Filter;

impl Filter {
    /// Creates an equality predicate.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Predicate {
        Predicate::new(field, value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Adds an equality predicate on `field`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.query
            .predicates
            .push(Predicate::new(field, value));
        self
    }

    /// Adds an existing predicate.
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.query.predicates.push(predicate);
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

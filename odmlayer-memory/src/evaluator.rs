//! Equality predicate evaluation for in-memory record filtering.

use std::collections::HashMap;
use bson::{Bson, datetime::DateTime};

use odmlayer_core::{
    document::Record,
    query::{Predicate, Query},
};


/// Comparable representation of BSON values.
///
/// Integers are widened to i64 and compared exactly. An integer equals a double only when
/// the double is integral and converts to the same i64, so `Int32(1)`, `Int64(1)` and
/// `Double(1.0)` compare equal while distinct longs above 2^53 stay distinct. Arrays
/// compare element-wise in order, maps compare key-wise regardless of order.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Anything else, compared as raw BSON
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Integer(i64::from(*value)),
            Bson::Int64(value) => Comparable::Integer(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Integer(a), Comparable::Integer(b)) => a == b,
            (Comparable::Double(a), Comparable::Double(b)) => a == b,
            (Comparable::Integer(a), Comparable::Double(b))
            | (Comparable::Double(b), Comparable::Integer(a)) => integer_equals_double(*a, *b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

fn integer_equals_double(integer: i64, double: f64) -> bool {
    // i64::MIN is exactly -2^63; anything at or above 2^63 does not fit.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;

    double.fract() == 0.0
        && double >= -BOUND
        && double < BOUND
        && double as i64 == integer
}


/// Checks stored records against a [`Query`].
pub(crate) struct RecordEvaluator<'a> {
    record: &'a Record,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(record: &'a Record) -> Self {
        Self { record }
    }

    /// Returns `true` if every predicate holds. A field the record lacks never matches.
    pub fn matches(&self, query: &Query) -> bool {
        query
            .predicates
            .iter()
            .all(|predicate| self.satisfies(predicate))
    }

    fn satisfies(&self, predicate: &Predicate) -> bool {
        match self.record.get(&predicate.field) {
            Some(value) => Comparable::from(value) == Comparable::from(&predicate.value),
            None => false,
        }
    }
}

//! Query translation from odmlayer predicates to MongoDB filter documents.

use bson::{Bson, Document, doc};

use odmlayer_core::query::{Predicate, Query};

use crate::sanitizer::FieldSanitizer;


/// Translates a [`Query`] into a MongoDB filter.
///
/// Each predicate becomes an `$eq` condition on its sanitized field name, with the value
/// sanitized the way stored records are. Several predicates are joined with `$and`. An
/// empty query becomes the empty filter.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    pub(crate) fn translate(query: &Query) -> Document {
        match query.predicates.as_slice() {
            [] => doc! {},
            [predicate] => Self::translate_predicate(predicate),
            predicates => doc! {
                "$and": predicates
                    .iter()
                    .map(Self::translate_predicate)
                    .map(Bson::Document)
                    .collect::<Vec<_>>(),
            },
        }
    }

    fn translate_predicate(predicate: &Predicate) -> Document {
        let field = FieldSanitizer::sanitize_key(&predicate.field);
        let value = FieldSanitizer::sanitize_value(predicate.value.clone());

        doc! { field: { "$eq": value } }
    }
}

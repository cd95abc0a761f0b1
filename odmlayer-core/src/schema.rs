//! Field rules, schemas and the validation engine.
//!
//! A [`Schema`] is an ordered, immutable set of [`FieldRule`]s. Validation walks the
//! rules in declaration order and, for each field:
//!
//! 1. pulls the candidate value (`null` counts as absent),
//! 2. resolves the field's default if the value is absent,
//! 3. rejects the record if the field is required and still absent,
//! 4. checks the value's type tag against the declared [`FieldType`],
//! 5. checks uniqueness against the owning collection when the rule asks for it,
//! 6. copies the value into the output if one is present.
//!
//! Keys that the schema does not declare never reach the output.
//!
//! # Example
//!
//! ```ignore
//! use odmlayer::schema::{FieldRule, FieldDefault, Schema};
//!
//! let schema = Schema::builder()
//!     .field("name", FieldRule::text().required())
//!     .field("email", FieldRule::text().required().unique())
//!     .field("created_at", FieldRule::timestamp().default_with(FieldDefault::now()))
//!     .build()?;
//! ```

use async_trait::async_trait;
use bson::{Bson, Uuid};
use std::{collections::HashSet, fmt, sync::Arc};

use crate::{
    document::Record,
    error::{DocumentStoreError, DocumentStoreResult, ValidationError},
};

/// The primitive type a field's value must carry.
///
/// Each tag maps to a fixed set of BSON variants, see [`FieldType::matches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// UTF-8 string.
    Text,
    /// A 32-bit integer, 64-bit integer or double. `Decimal128` is not accepted.
    Number,
    /// `true` or `false`.
    Boolean,
    /// An ordered array of values.
    List,
    /// A nested record.
    Map,
    /// A point in time (BSON datetime or timestamp).
    Timestamp,
}

impl FieldType {
    /// Returns `true` if `value` carries this type tag.
    pub fn matches(&self, value: &Bson) -> bool {
        match self {
            FieldType::Text => matches!(value, Bson::String(_)),
            FieldType::Number => matches!(value, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)),
            FieldType::Boolean => matches!(value, Bson::Boolean(_)),
            FieldType::List => matches!(value, Bson::Array(_)),
            FieldType::Map => matches!(value, Bson::Document(_)),
            FieldType::Timestamp => matches!(value, Bson::DateTime(_) | Bson::Timestamp(_)),
        }
    }

    /// The lowercase name used in validation messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::List => "list",
            FieldType::Map => "map",
            FieldType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes the runtime type of a value in the vocabulary of [`FieldType::name`].
pub(crate) fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::String(_) => "string",
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => "number",
        Bson::Decimal128(_) => "decimal",
        Bson::Boolean(_) => "boolean",
        Bson::Array(_) => "list",
        Bson::Document(_) => "map",
        Bson::DateTime(_) | Bson::Timestamp(_) => "timestamp",
        Bson::Null | Bson::Undefined => "null",
        Bson::Binary(_) => "binary",
        Bson::ObjectId(_) => "objectId",
        _ => "unsupported",
    }
}

fn is_present(value: &Bson) -> bool {
    !matches!(value, Bson::Null | Bson::Undefined)
}

/// The value a field takes when a candidate record does not supply one.
///
/// A literal default is cloned every time it is used, so no two records ever share
/// one instance. Use a generator when each record needs a freshly computed value.
#[derive(Clone)]
pub enum FieldDefault {
    /// A literal value, cloned on every use.
    Value(Bson),
    /// A zero-argument generator invoked once per record that needs the default.
    Generator(Arc<dyn Fn() -> Bson + Send + Sync>),
}

impl FieldDefault {
    /// Creates a literal default.
    pub fn value(value: impl Into<Bson>) -> Self {
        FieldDefault::Value(value.into())
    }

    /// Creates a generated default.
    pub fn generator<F>(generator: F) -> Self
    where
        F: Fn() -> Bson + Send + Sync + 'static,
    {
        FieldDefault::Generator(Arc::new(generator))
    }

    /// A generator producing the current UTC time.
    pub fn now() -> Self {
        FieldDefault::generator(|| Bson::DateTime(bson::DateTime::from_chrono(chrono::Utc::now())))
    }

    /// Produces the default value for one record.
    pub fn resolve(&self) -> Bson {
        match self {
            FieldDefault::Value(value) => value.clone(),
            FieldDefault::Generator(generator) => generator(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldDefault::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// The rule a single schema field is validated against.
///
/// Rules are built fluently starting from a type constructor:
///
/// ```ignore
/// let rule = FieldRule::text().required().unique();
/// ```
#[derive(Debug, Clone)]
pub struct FieldRule {
    field_type: FieldType,
    required: bool,
    default: Option<FieldDefault>,
    unique: bool,
}

impl FieldRule {
    /// Creates an optional, non-unique rule with no default.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            default: None,
            unique: false,
        }
    }

    pub fn text() -> Self {
        Self::new(FieldType::Text)
    }

    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn list() -> Self {
        Self::new(FieldType::List)
    }

    pub fn map() -> Self {
        Self::new(FieldType::Map)
    }

    pub fn timestamp() -> Self {
        Self::new(FieldType::Timestamp)
    }

    /// Marks the field as required. A required field with a default is always satisfiable.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Requires the field's value to be unique across the owning collection.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets a literal default.
    pub fn default(mut self, value: impl Into<Bson>) -> Self {
        self.default = Some(FieldDefault::value(value));
        self
    }

    /// Sets a default, literal or generated.
    pub fn default_with(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn default_value(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }
}

/// Answers uniqueness questions for a schema during validation.
///
/// [`Collection`](crate::collection::Collection) implements this by querying its backend
/// for records holding the value.
#[async_trait]
pub trait UniqueProbe: Send + Sync {
    /// Returns `true` if a record other than `exclude` holds `value` in `field`.
    async fn is_taken(
        &self,
        field: &str,
        value: &Bson,
        exclude: Option<Uuid>,
    ) -> DocumentStoreResult<bool>;
}

/// The collection a validation run checks uniqueness against, and the record being
/// validated if it already exists.
///
/// Excluding the record's own identifier lets an update keep a unique value it already holds.
pub struct UniqueScope<'a> {
    probe: &'a dyn UniqueProbe,
    exclude: Option<Uuid>,
}

impl<'a> UniqueScope<'a> {
    pub fn new(probe: &'a dyn UniqueProbe) -> Self {
        Self { probe, exclude: None }
    }

    /// Ignores matches on the record with the given identifier.
    pub fn excluding(mut self, id: Uuid) -> Self {
        self.exclude = Some(id);
        self
    }

    async fn is_taken(&self, field: &str, value: &Bson) -> DocumentStoreResult<bool> {
        self.probe
            .is_taken(field, value, self.exclude)
            .await
    }
}

/// An ordered, immutable mapping from field name to [`FieldRule`].
///
/// Build one with [`Schema::builder`]; construction checks the rules for consistency
/// so validation never has to.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<(String, FieldRule)>,
}

impl Schema {
    /// Creates a new schema builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Builds a schema from `(name, rule)` pairs, in order.
    ///
    /// # Errors
    ///
    /// Fails with [`DocumentStoreError::InvalidArgument`] under the same conditions as
    /// [`SchemaBuilder::build`].
    pub fn new<N>(fields: impl IntoIterator<Item = (N, FieldRule)>) -> DocumentStoreResult<Self>
    where
        N: Into<String>,
    {
        fields
            .into_iter()
            .fold(SchemaBuilder::new(), |builder, (name, rule)| builder.field(name, rule))
            .build()
    }

    /// Iterates over the declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields
            .iter()
            .map(|(name, rule)| (name.as_str(), rule))
    }

    /// Returns the rule for `field`, if declared.
    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, rule)| rule)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validates a candidate record and applies defaults.
    ///
    /// Returns a new record holding only the declared fields that resolved to a value.
    /// Uniqueness is only checked when a `scope` is given; the check is a query issued
    /// before the caller's write, so two concurrent writers can both pass it.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Validation`] for the first field that breaks its rule,
    /// or any backend error raised while checking uniqueness.
    pub async fn validate(
        &self,
        candidate: &Record,
        scope: Option<&UniqueScope<'_>>,
    ) -> DocumentStoreResult<Record> {
        let mut validated = Record::new();

        for (field, rule) in &self.fields {
            let value = match candidate.get(field).filter(|value| is_present(value)) {
                Some(value) => Some(value.clone()),
                None => rule
                    .default
                    .as_ref()
                    .map(FieldDefault::resolve)
                    .filter(is_present),
            };

            let Some(value) = value else {
                if rule.required {
                    return Err(ValidationError::MissingField { field: field.clone() }.into());
                }
                continue;
            };

            if !rule.field_type.matches(&value) {
                return Err(ValidationError::TypeMismatch {
                    field: field.clone(),
                    expected: rule.field_type,
                    actual: type_name(&value),
                }
                .into());
            }

            if rule.unique {
                if let Some(scope) = scope {
                    if scope.is_taken(field, &value).await? {
                        return Err(ValidationError::NotUnique { field: field.clone(), value }.into());
                    }
                }
            }

            validated.insert(field.clone(), value);
        }

        Ok(validated)
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<(String, FieldRule)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declares a field. Fields are validated in the order they are declared.
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push((name.into(), rule));
        self
    }

    /// Checks the declared rules and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidArgument`] if a field name is empty or `_id`,
    /// a field is declared twice, or a literal default does not match its field's type.
    pub fn build(self) -> DocumentStoreResult<Schema> {
        let mut seen = HashSet::new();

        for (name, rule) in &self.fields {
            if name.trim().is_empty() {
                return Err(DocumentStoreError::InvalidArgument(
                    "Schema field names must be non-empty strings".into(),
                ));
            }

            // Backends store the document identifier under `_id`.
            if name == "_id" {
                return Err(DocumentStoreError::InvalidArgument(
                    "Field \"_id\" is reserved for the document identifier".into(),
                ));
            }

            if !seen.insert(name.as_str()) {
                return Err(DocumentStoreError::InvalidArgument(format!(
                    "Field \"{name}\" is declared more than once"
                )));
            }

            if let Some(FieldDefault::Value(value)) = &rule.default {
                if !rule.field_type.matches(value) {
                    return Err(DocumentStoreError::InvalidArgument(format!(
                        "Default for field \"{name}\" should be of type {}, got {}",
                        rule.field_type,
                        type_name(value),
                    )));
                }
            }
        }

        Ok(Schema { fields: self.fields })
    }
}

//! Per-record outcomes of multi-record writes.
//!
//! [`Collection::update_all`](crate::collection::Collection::update_all) and
//! [`Collection::delete_all`](crate::collection::Collection::delete_all) act on each matched
//! record independently. A failure on one record does not stop the others, and nothing is
//! rolled back; the [`BatchReport`] says which records went through.

use bson::Uuid;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// The outcome of a batch operation, one entry per matched record, in match order.
///
/// # Example
///
/// ```ignore
/// let report = students
///     .update_all(doc! { "section": "A" }, doc! { "active": true })
///     .await?
///     .unwrap_or_default();
///
/// for (id, err) in report.errors() {
///     eprintln!("{id}: {err}");
/// }
/// ```
#[derive(Debug)]
pub struct BatchReport<T> {
    outcomes: Vec<(Uuid, DocumentStoreResult<T>)>,
}

impl<T> BatchReport<T> {
    pub fn new() -> Self {
        Self { outcomes: Vec::new() }
    }

    /// Records the outcome for one record.
    pub fn push(&mut self, id: Uuid, outcome: DocumentStoreResult<T>) {
        self.outcomes.push((id, outcome));
    }

    /// All outcomes, in the order the records were processed.
    pub fn outcomes(&self) -> &[(Uuid, DocumentStoreResult<T>)] {
        &self.outcomes
    }

    /// Number of records the batch attempted.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of records the operation succeeded on.
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_ok())
            .count()
    }

    /// Number of records the operation failed on.
    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Returns `true` if every record succeeded.
    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, outcome)| outcome.is_ok())
    }

    /// Iterates over the records that failed and their errors.
    pub fn errors(&self) -> impl Iterator<Item = (&Uuid, &DocumentStoreError)> {
        self.outcomes
            .iter()
            .filter_map(|(id, outcome)| outcome.as_ref().err().map(|err| (id, err)))
    }

    /// Consumes the report and returns the successful results, dropping failures.
    pub fn into_successes(self) -> Vec<T> {
        self.outcomes
            .into_iter()
            .filter_map(|(_, outcome)| outcome.ok())
            .collect()
    }

    /// Consumes the report and returns every outcome.
    pub fn into_results(self) -> Vec<(Uuid, DocumentStoreResult<T>)> {
        self.outcomes
    }
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(Uuid, DocumentStoreResult<T>)> for BatchReport<T> {
    fn from_iter<I: IntoIterator<Item = (Uuid, DocumentStoreResult<T>)>>(iter: I) -> Self {
        Self { outcomes: iter.into_iter().collect() }
    }
}

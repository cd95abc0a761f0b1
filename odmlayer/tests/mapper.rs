//! End-to-end tests for collections and documents over the in-memory backend.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use odmlayer::{memory::InMemoryStore, prelude::*};
use odmlayer::bson::{Bson, doc};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

/// Wraps the in-memory store and counts the writes that reach it.
///
/// Point lookups and deletes of one chosen record can be made to fail.
#[derive(Debug, Default)]
struct CountingBackend {
    inner: InMemoryStore,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
    failing_reads: AtomicBool,
    failing_delete: Mutex<Option<Uuid>>,
}

impl CountingBackend {
    fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn fail_reads(&self) {
        self.failing_reads.store(true, Ordering::SeqCst);
    }

    fn fail_delete_of(&self, id: Uuid) {
        *self.failing_delete.lock().unwrap() = Some(id);
    }
}

#[async_trait]
impl StoreBackend for CountingBackend {
    async fn insert_document(&self, record: Record, collection: &str) -> DocumentStoreResult<Uuid> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_document(record, collection).await
    }

    async fn get_document(&self, id: Uuid, collection: &str) -> DocumentStoreResult<Option<Record>> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::Backend("read timed out".into()));
        }
        self.inner.get_document(id, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<(Uuid, Record)>> {
        self.inner.query_documents(query, collection).await
    }

    async fn update_document(&self, id: Uuid, record: Record, collection: &str) -> DocumentStoreResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_document(id, record, collection).await
    }

    async fn delete_document(&self, id: Uuid, collection: &str) -> DocumentStoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if *self.failing_delete.lock().unwrap() == Some(id) {
            return Err(DocumentStoreError::Backend("permission denied".into()));
        }
        self.inner.delete_document(id, collection).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.inner.list_collections().await
    }
}

fn student_schema() -> Schema {
    Schema::builder()
        .field("id", FieldRule::text().required())
        .field("email", FieldRule::text().unique())
        .field("section", FieldRule::text().default("A"))
        .field("grades", FieldRule::list().default(Bson::Array(vec![])))
        .build()
        .unwrap()
}

fn students(backend: &CountingBackend) -> Collection<&CountingBackend> {
    Collection::new(backend, "students", student_schema()).unwrap()
}

fn validation_error(err: DocumentStoreError) -> ValidationError {
    match err {
        DocumentStoreError::Validation(err) => err,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn collection_names_are_checked() {
    let backend = CountingBackend::default();

    for name in ["", "   ", "a/b", "nul\0"] {
        let err = Collection::new(&backend, name, student_schema()).unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidArgument(_)), "{name:?}");
    }

    assert!(Collection::new(&backend, "students", student_schema()).is_ok());
}

#[tokio::test]
async fn store_hands_out_collections_sharing_one_backend() {
    let store = DocumentStore::new(InMemoryStore::new());

    let students = store.collection("students", student_schema()).unwrap();
    students.create_one(doc! { "id": "1" }).await.unwrap();

    let teachers = store
        .collection("teachers", Schema::builder().field("name", FieldRule::text()).build().unwrap())
        .unwrap();
    teachers.create_one(doc! { "name": "Ms. Gray" }).await.unwrap();

    let mut names = store.list_collections().await.unwrap();
    names.sort();
    assert_eq!(names, vec!["students".to_string(), "teachers".to_string()]);

    assert!(store.collection("", student_schema()).is_err());
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn missing_required_field_fails_without_writing() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let err = students
        .create_one(doc! { "email": "a@x.com" })
        .await
        .unwrap_err();

    assert_eq!(
        validation_error(err),
        ValidationError::MissingField { field: "id".into() }
    );
    assert_eq!(backend.inserts(), 0);
}

#[tokio::test]
async fn created_document_holds_the_validated_record() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let created = students
        .create_one(doc! { "id": "1", "email": "a@x.com", "nickname": "ace" })
        .await
        .unwrap();

    let expected = doc! { "id": "1", "email": "a@x.com", "section": "A", "grades": [] };
    assert_eq!(created.fields(), &expected);
    assert!(created.get("nickname").is_none());

    let found = students
        .find_one(doc! { "id": "1" })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), created.id());
    assert_eq!(found.fields(), &expected);
}

#[tokio::test]
async fn type_mismatch_names_field_and_both_types() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let err = students
        .create_one(doc! { "id": 1 })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Field \"id\" should be of type string, got number");
    assert_eq!(backend.inserts(), 0);
}

#[tokio::test]
async fn unique_value_held_by_another_record_is_rejected() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    students
        .create_one(doc! { "id": "1", "email": "a@x.com" })
        .await
        .unwrap();

    let err = students
        .create_one(doc! { "id": "2", "email": "a@x.com" })
        .await
        .unwrap_err();
    assert!(matches!(
        validation_error(err),
        ValidationError::NotUnique { ref field, .. } if field == "email"
    ));

    students
        .create_one(doc! { "id": "2", "email": "b@x.com" })
        .await
        .unwrap();

    assert_eq!(backend.inserts(), 2);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Student {
    id: String,
    email: String,
    section: String,
    grades: Vec<i32>,
}

#[tokio::test]
async fn typed_values_round_trip_through_documents() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let student = Student {
        id: "1".into(),
        email: "a@x.com".into(),
        section: "B".into(),
        grades: vec![90, 92],
    };

    let created = students.create_from(&student).await.unwrap();

    assert_eq!(created.deserialize::<Student>().unwrap(), student);

    let json = created.to_json().unwrap();
    assert_eq!(json["id"], "1");
    assert!(json.get("_id").is_some());
}

// ============================================================================
// Find
// ============================================================================

#[tokio::test]
async fn find_returns_none_when_nothing_matches() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    assert!(students.find(doc! { "id": "1" }).await.unwrap().is_none());
    assert!(students.find_one(doc! { "id": "1" }).await.unwrap().is_none());
    assert!(students.get().await.unwrap().is_none());
}

#[tokio::test]
async fn find_conjoins_predicates_in_backend_order() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    for (id, section) in [("1", "A"), ("2", "B"), ("3", "A")] {
        students
            .create_one(doc! { "id": id, "section": section })
            .await
            .unwrap();
    }

    let ids = students
        .find(doc! { "section": "A" })
        .await
        .unwrap()
        .unwrap()
        .iter()
        .map(|student| student.get("id").cloned())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![Some(Bson::from("1")), Some(Bson::from("3"))]);

    assert!(students
        .find(doc! { "section": "A", "id": "2" })
        .await
        .unwrap()
        .is_none());

    assert_eq!(students.get().await.unwrap().unwrap().len(), 3);
}

#[tokio::test]
async fn get_by_id_finds_created_records() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let created = students.create_one(doc! { "id": "1" }).await.unwrap();
    let id = *created.id();

    assert!(students.get_by_id(id).await.unwrap().is_some());
    assert!(students.get_by_id(Uuid::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn large_longs_stay_distinct_for_find_and_uniqueness() {
    let backend = CountingBackend::default();
    let accounts = Collection::new(
        &backend,
        "accounts",
        Schema::builder()
            .field("account", FieldRule::number().required().unique())
            .build()
            .unwrap(),
    )
    .unwrap();

    accounts
        .create_one(doc! { "account": 9_007_199_254_740_992_i64 })
        .await
        .unwrap();
    accounts
        .create_one(doc! { "account": 9_007_199_254_740_993_i64 })
        .await
        .unwrap();

    let found = accounts
        .find(doc! { "account": 9_007_199_254_740_993_i64 })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("account"), Some(&Bson::Int64(9_007_199_254_740_993)));

    let err = accounts
        .create_one(doc! { "account": 9_007_199_254_740_993_i64 })
        .await
        .unwrap_err();
    assert!(matches!(validation_error(err), ValidationError::NotUnique { .. }));
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn update_one_merges_and_preserves_untouched_fields() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    students
        .create_one(doc! { "id": "1", "email": "a@x.com", "section": "C" })
        .await
        .unwrap();

    let updated = students
        .update_one(doc! { "id": "1" }, doc! { "grades": [90, 92, 93] })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        updated.fields(),
        &doc! { "id": "1", "email": "a@x.com", "section": "C", "grades": [90, 92, 93] }
    );
    assert_eq!(backend.updates(), 1);
}

#[tokio::test]
async fn update_one_without_match_is_none() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let updated = students
        .update_one(doc! { "id": "9" }, doc! { "section": "B" })
        .await
        .unwrap();

    assert!(updated.is_none());
    assert_eq!(backend.updates(), 0);
}

#[tokio::test]
async fn update_one_reports_the_saved_record_when_the_re_read_fails() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    students.create_one(doc! { "id": "1" }).await.unwrap();
    backend.fail_reads();

    let updated = students
        .update_one(doc! { "id": "1" }, doc! { "section": "B" })
        .await
        .unwrap()
        .unwrap();

    assert!(!updated.is_deleted());
    assert_eq!(updated.get("section"), Some(&Bson::from("B")));
    assert_eq!(backend.updates(), 1);

    let stored = students.find_one(doc! { "id": "1" }).await.unwrap().unwrap();
    assert_eq!(stored.get("section"), Some(&Bson::from("B")));
}

#[tokio::test]
async fn invalid_update_writes_nothing() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    students.create_one(doc! { "id": "1" }).await.unwrap();

    let err = students
        .update_one(doc! { "id": "1" }, doc! { "grades": "none" })
        .await
        .unwrap_err();

    assert!(matches!(
        validation_error(err),
        ValidationError::TypeMismatch { ref field, .. } if field == "grades"
    ));
    assert_eq!(backend.updates(), 0);

    let stored = students.find_one(doc! { "id": "1" }).await.unwrap().unwrap();
    assert_eq!(stored.get("grades"), Some(&Bson::Array(vec![])));
}

#[tokio::test]
async fn keeping_an_own_unique_value_is_allowed() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    students
        .create_one(doc! { "id": "1", "email": "a@x.com" })
        .await
        .unwrap();

    let updated = students
        .update_one(doc! { "id": "1" }, doc! { "email": "a@x.com", "section": "B" })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.get("section"), Some(&Bson::from("B")));
}

#[tokio::test]
async fn update_all_continues_past_failures() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    students.create_one(doc! { "id": "1", "section": "A" }).await.unwrap();
    students.create_one(doc! { "id": "2", "section": "A" }).await.unwrap();
    students.create_one(doc! { "id": "3", "section": "B" }).await.unwrap();

    // The first record takes the unique email, so the second cannot.
    let report = students
        .update_all(doc! { "section": "A" }, doc! { "email": "shared@x.com" })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.len(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_complete());

    let (_, err) = report.errors().next().unwrap();
    let err = err.as_validation().unwrap();
    assert!(matches!(err, ValidationError::NotUnique { .. }));
    assert_eq!(err.field(), "email");

    let updated = report.into_successes();
    assert_eq!(updated[0].get("id"), Some(&Bson::from("1")));
    assert_eq!(updated[0].get("email"), Some(&Bson::from("shared@x.com")));

    assert!(students
        .update_all(doc! { "section": "Z" }, doc! { "grades": [1] })
        .await
        .unwrap()
        .is_none());
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn delete_one_removes_a_single_match() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let first = students.create_one(doc! { "id": "1" }).await.unwrap();
    let first_id = *first.id();
    students.create_one(doc! { "id": "2" }).await.unwrap();

    assert_eq!(students.delete_one(doc! { "id": "1" }).await.unwrap(), Some(first_id));
    assert_eq!(students.delete_one(doc! { "id": "1" }).await.unwrap(), None);
    assert_eq!(students.get().await.unwrap().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_all_reports_every_removed_record() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    students.create_one(doc! { "id": "1", "section": "A" }).await.unwrap();
    students.create_one(doc! { "id": "2", "section": "A" }).await.unwrap();
    students.create_one(doc! { "id": "3", "section": "B" }).await.unwrap();

    let report = students
        .delete_all(doc! { "section": "A" })
        .await
        .unwrap()
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.into_results().len(), 2);
    assert_eq!(backend.deletes(), 2);

    assert!(students.find(doc! { "section": "A" }).await.unwrap().is_none());
    assert!(students.delete_all(doc! { "section": "A" }).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_all_continues_past_failures() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    students.create_one(doc! { "id": "1", "section": "A" }).await.unwrap();
    let protected = *students
        .create_one(doc! { "id": "2", "section": "A" })
        .await
        .unwrap()
        .id();
    students.create_one(doc! { "id": "3", "section": "A" }).await.unwrap();

    backend.fail_delete_of(protected);

    let report = students
        .delete_all(doc! { "section": "A" })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_complete());

    let (failed_id, err) = report.errors().next().unwrap();
    assert_eq!(*failed_id, protected);
    assert!(matches!(err, DocumentStoreError::Backend(_)));
    assert_eq!(backend.deletes(), 3);

    let remaining = students
        .find(doc! { "section": "A" })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(*remaining[0].id(), protected);
}

// ============================================================================
// Document lifecycle
// ============================================================================

#[tokio::test]
async fn set_buffers_until_save() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let mut student = students.create_one(doc! { "id": "1" }).await.unwrap();

    student.set("section", "B");
    student.set("section", 7);
    assert_eq!(backend.updates(), 0);

    let err = student.save().await.unwrap_err();
    assert!(matches!(
        validation_error(err),
        ValidationError::TypeMismatch { .. }
    ));
    assert_eq!(backend.updates(), 0);

    student.set("section", "B");
    student.save().await.unwrap();
    assert_eq!(backend.updates(), 1);

    let stored = students.find_one(doc! { "id": "1" }).await.unwrap().unwrap();
    assert_eq!(stored.get("section"), Some(&Bson::from("B")));
}

#[tokio::test]
async fn save_fills_defaults_for_removed_fields_only() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let mut student = students
        .create_one(doc! { "id": "1", "section": "C", "grades": [80] })
        .await
        .unwrap();

    student.remove("section");
    student.save().await.unwrap();

    assert_eq!(
        student.fields(),
        &doc! { "id": "1", "section": "A", "grades": [80] }
    );
}

#[tokio::test]
async fn delete_twice_issues_one_backend_delete() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let mut student = students.create_one(doc! { "id": "1" }).await.unwrap();

    student.delete().await.unwrap();
    student.delete().await.unwrap();

    assert!(student.is_deleted());
    assert_eq!(backend.deletes(), 1);
}

#[tokio::test]
async fn save_after_delete_issues_no_backend_call() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let mut student = students.create_one(doc! { "id": "1" }).await.unwrap();
    student.delete().await.unwrap();

    student.set("section", "B");
    student.save().await.unwrap();

    assert_eq!(backend.updates(), 0);
    assert!(students.find_one(doc! { "id": "1" }).await.unwrap().is_none());
}

#[tokio::test]
async fn refresh_discards_local_changes_and_notices_removal() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let mut student = students.create_one(doc! { "id": "1" }).await.unwrap();

    student.set("section", "B");
    student.refresh().await.unwrap();
    assert_eq!(student.get("section"), Some(&Bson::from("A")));

    students.delete_one(doc! { "id": "1" }).await.unwrap();
    student.refresh().await.unwrap();
    assert!(student.is_deleted());
}

#[tokio::test]
async fn to_record_carries_the_identifier() {
    let backend = CountingBackend::default();
    let students = students(&backend);

    let student = students.create_one(doc! { "id": "1" }).await.unwrap();
    let record = student.to_record();

    assert_eq!(record.get("_id"), Some(&Bson::from(*student.id())));
    assert_eq!(record.get("id"), Some(&Bson::from("1")));
}

use serde_json::json;

use sitekeeper::backend::{entity_fields, Document};
use sitekeeper::constants::TIMESTAMP_FIELD;
use sitekeeper::models::{Collection, ContactSubmission, Entity, NaturalKey, Project, Record, RecordId, TeamMember};

#[test]
fn test_record_id_accepts_strings_and_numbers() {
    let from_string: RecordId = serde_json::from_value(json!("abc")).unwrap();
    let from_int: RecordId = serde_json::from_value(json!(42)).unwrap();
    let from_float: RecordId = serde_json::from_value(json!(1700000000000.0)).unwrap();

    assert_eq!(from_string.as_str(), "abc");
    assert_eq!(from_int.as_str(), "42");
    assert_eq!(from_float.as_str(), "1700000000000");
    assert!(serde_json::from_value::<RecordId>(json!(1.5)).is_err());

    // Output is always a string
    assert_eq!(serde_json::to_value(&from_int).unwrap(), json!("42"));
}

#[test]
fn test_record_id_spaces() {
    assert!(RecordId::new("12").is_locally_minted());
    assert!(!RecordId::new("aB3kq9Zz0PqLmN7xYw2E").is_locally_minted());
    assert!(!RecordId::new("mem-1").is_locally_minted());
    assert!(!RecordId::new("").is_locally_minted());

    let ids = [RecordId::new("3"), RecordId::new("mem-99"), RecordId::new("10")];
    assert_eq!(RecordId::next_local(ids.iter()).as_str(), "11");
    assert_eq!(RecordId::next_local(std::iter::empty()).as_str(), "1");
}

#[test]
fn test_record_flattens_entity_fields() {
    let record = Record::new(7u64, Project {
        title: "Website".to_string(),
        description: "Our site".to_string(),
        ..Project::default()
    });

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["id"], "7");
    assert_eq!(value["title"], "Website");
    assert!(value.get("link").is_none());

    let decoded: Record<Project> = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn test_contact_submission_defaults() {
    let submission = ContactSubmission::new("Eve", "eve@example.com", "Hi");
    assert!(submission.is_new);

    let value = serde_json::to_value(&submission).unwrap();
    assert_eq!(value["isNew"], true);

    let legacy: ContactSubmission = serde_json::from_value(json!({
        "name": "Old",
        "email": "old@example.com",
        "message": "From before the flag existed",
        "date": "2024-01-02T03:04:05Z"
    }))
    .unwrap();
    assert!(legacy.is_new);
}

#[test]
fn test_natural_keys() {
    let member = TeamMember::new("Ann", "Lead");
    assert_eq!(
        member.natural_key(),
        Some(NaturalKey {
            field: "name",
            value: "Ann".to_string()
        })
    );

    let mut nameless = TeamMember::new("", "Lead");
    nameless.email = "x@example.com".to_string();
    assert_eq!(nameless.natural_key().unwrap().field, "email");

    // Whitespace is still a value
    assert_eq!(TeamMember::new(" ", "Lead").natural_key().unwrap().value, " ");
    assert_eq!(TeamMember::new("", "Lead").natural_key(), None);
    assert_eq!(Project::default().natural_key(), None);
}

#[test]
fn test_collection_names() {
    let names: Vec<&str> = Collection::ALL.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["teamMembers", "projects", "services", "contactSubmissions"]);
    assert_eq!(Collection::parse("services"), Some(Collection::Services));
    assert_eq!(Collection::parse("Services"), None);
    assert_eq!(TeamMember::COLLECTION, Collection::TeamMembers);
}

#[test]
fn test_document_strips_server_fields() {
    let mut fields = entity_fields(&TeamMember::new("Ann", "Lead")).unwrap();
    assert!(!fields.contains_key("id"));
    fields.insert(TIMESTAMP_FIELD.to_string(), json!("2024-01-02T03:04:05Z"));
    fields.insert("id".to_string(), json!("stale"));

    let record = Document::new("doc-1", fields).into_record::<TeamMember>().unwrap();
    assert_eq!(record, Record::new("doc-1", TeamMember::new("Ann", "Lead")));
}

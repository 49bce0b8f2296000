use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = AccountId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = AccountId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let parsed = EntryId::from_str(&uuid.to_string()).expect("valid uuid string");
    assert_eq!(parsed.into_inner(), uuid);
}

#[test]
fn test_typed_id_from_str_rejects_garbage() {
    assert!(EntryId::from_str("not-a-uuid").is_err());
}

#[test]
fn test_typed_ids_are_time_ordered() {
    // UUID v7 embeds a timestamp, so freshly generated IDs sort after older ones.
    let a = LineId::new();
    let b = LineId::new();
    assert!(a.into_inner() <= b.into_inner());
}

#[test]
fn test_typed_id_serde_transparent() {
    let id = ResourceId::new();
    let json = serde_json::to_string(&id).expect("serializes");
    assert_eq!(json, format!("\"{}\"", id.into_inner()));

    let back: ResourceId = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(back, id);
}

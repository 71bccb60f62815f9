//! End-to-end behaviour of parse, filter and merge.

use literate_core::{MergeStats, NarrativeParser, ObjectManager};

#[test]
fn test_valid_payload_preserves_fields_verbatim() {
    let raw = r#"{"objects": [
        {"name": "Dr. Elena Vasquez", "description": "Lead xenobiologist, 42, afraid of heights",
         "relationships": [{"target": "Outpost Kepler", "description": "stationed at"}]},
        {"name": "Outpost Kepler", "description": "A research base on a frozen moon"}
    ]}"#;

    let objects = NarrativeParser::new().parse_response(raw).unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].name, "Dr. Elena Vasquez");
    assert_eq!(objects[0].description, "Lead xenobiologist, 42, afraid of heights");
    assert_eq!(objects[0].relationships[0].target, "Outpost Kepler");
    assert_eq!(objects[0].relationships[0].description, "stationed at");
    assert_eq!(objects[1].description, "A research base on a frozen moon");
}

#[test]
fn test_truncated_response_recovers_nothing() {
    let objects = NarrativeParser::new()
        .parse_response(r#"{"objects":[{"name":"Alice","description":"A sc"#)
        .unwrap();
    assert!(objects.is_empty());
}

#[test]
fn test_placeholder_echo_is_empty() {
    let raw = r#"```json
{"objects": [{"name": "ExactNameFromText", "description": "Brief description based only on what the text says"}]}
```"#;
    assert!(NarrativeParser::new().parse_response(raw).unwrap().is_empty());
}

#[tokio::test]
async fn test_alice_example() {
    let mut manager = ObjectManager::new();
    let raw = r#"{"objects": [{"name": "Alice", "description": "A scientist"}]}"#;

    let first = manager.process_response(raw).await;
    assert_eq!(
        first.stats,
        MergeStats {
            added: 1,
            updated: 0,
            unchanged: 0,
            removed: 0
        }
    );
    assert_eq!(first.total_count, 1);

    let second = manager.process_response(raw).await;
    assert_eq!(
        second.stats,
        MergeStats {
            added: 0,
            updated: 0,
            unchanged: 1,
            removed: 0
        }
    );
}

#[tokio::test]
async fn test_disjoint_extraction_never_shrinks() {
    let mut manager = ObjectManager::new();
    manager
        .process_response(
            r#"{"objects": [{"name": "Alice", "description": "A scientist"},
                            {"name": "Bob", "description": "A lab assistant"}]}"#,
        )
        .await;

    let result = manager
        .process_response(r#"{"objects": [{"name": "Castle Grey", "description": "A ruined keep"}]}"#)
        .await;
    assert_eq!(result.total_count, 3);
    assert_eq!(result.stats.removed, 0);
}

#[tokio::test]
async fn test_remove_missing_removes_exact_complement() {
    let mut manager = ObjectManager::new().with_remove_missing(true);
    manager
        .process_response(
            r#"{"objects": [{"name": "Alice", "description": "A scientist"},
                            {"name": "Bob", "description": "A lab assistant"},
                            {"name": "Carol", "description": "A journalist"}]}"#,
        )
        .await;

    let result = manager
        .process_response(
            r#"{"objects": [{"name": "Alice", "description": "A scientist"},
                            {"name": "Carol", "description": "A journalist"}]}"#,
        )
        .await;

    assert_eq!(result.stats.removed, 1);
    assert!(manager.get_object("Bob").is_none());
    assert!(manager.get_object("Alice").is_some());
    assert!(manager.get_object("Carol").is_some());
}

#[tokio::test]
async fn test_malformed_response_degrades_without_error() {
    let mut manager = ObjectManager::new();
    let result = manager
        .process_response(
            r#"{"objects": [{"name": "Alice"}, {"name": ""}, {"name": "Bob", "description": "A lab assistant",
                "relationships": [{"target": "Alice", "description": ""}, {"target": "Alice", "description": "assists"}]}]}"#,
        )
        .await;

    assert!(result.success());
    assert_eq!(result.total_count, 2);
    assert_eq!(
        manager.get_object("Alice").unwrap().description,
        "A alice mentioned in the text."
    );
    assert_eq!(manager.get_object("Bob").unwrap().relationships.len(), 1);
}

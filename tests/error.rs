use tasktrack::error::{exit_codes, EntityKind, Error, JsonError};

#[test]
fn exit_codes_map_correctly() {
    let user = Error::InvalidArgument("bad".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    let missing = Error::project_not_found(3);
    assert_eq!(missing.exit_code(), exit_codes::USER_ERROR);

    let validation = Error::Validation("empty".to_string());
    assert_eq!(validation.exit_code(), exit_codes::USER_ERROR);

    let broken = Error::Integrity("dangling".to_string());
    assert_eq!(broken.exit_code(), exit_codes::OPERATION_FAILED);

    let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
    assert_eq!(io.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn json_error_includes_code_kind_and_details() {
    let err = Error::task_not_found(12);
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert_eq!(json.kind, "not_found");
    assert_eq!(json.error, "task not found: 12");
    assert_eq!(
        json.details,
        Some(serde_json::json!({ "entity": "task", "id": 12 }))
    );
}

#[test]
fn not_found_carries_entity_kind() {
    match Error::project_not_found(4) {
        Error::NotFound { kind, id } => {
            assert_eq!(kind, EntityKind::Project);
            assert_eq!(id, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
}

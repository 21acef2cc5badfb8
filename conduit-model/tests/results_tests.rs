use conduit_model::{ExportResult, ImportResult, ProcessingResult};
use conduit_types::{Error, ErrorCode, Failure};
use serde_json::json;

#[test]
fn import_success_carries_data() {
    let result = ImportResult::success(json!("content")).with_detail("bytes", 7);
    assert!(result.is_success());
    assert!(result.error_message().is_none());
    assert_eq!(result.data(), Some(&json!("content")));
    assert_eq!(result.details().get("bytes"), Some(&json!(7)));
}

#[test]
fn import_failure_has_no_data() {
    let result = ImportResult::failure("file not found: /x");
    assert!(!result.is_success());
    assert_eq!(result.error_message(), Some("file not found: /x"));
    assert!(result.data().is_none());
}

#[test]
fn from_failure_records_codes() {
    let mut failure = Failure::of(ErrorCode::ParameterError, "FilePath is required");
    failure.push(Error::from_code(ErrorCode::ParameterError, "Encoding is unknown"));
    let result = ExportResult::from_failure(&failure);
    assert!(!result.is_success());
    assert_eq!(
        result.error_message(),
        Some("FilePath is required; Encoding is unknown")
    );
    assert_eq!(
        result.details().get("error_codes"),
        Some(&json!(["PARAMETER_ERROR", "PARAMETER_ERROR"]))
    );
}

#[test]
fn export_payload_only_when_given() {
    assert!(ExportResult::success().payload().is_none());
    let merged = ExportResult::success_with_payload(json!("ab"));
    assert_eq!(merged.payload(), Some(&json!("ab")));
}

#[test]
fn processing_result_roundtrips_through_json() {
    let result = ProcessingResult::success(json!({"a": 1}));
    let text = serde_json::to_string(&result).unwrap();
    let back: ProcessingResult = serde_json::from_str(&text).unwrap();
    assert_eq!(back, result);
    assert_eq!(back.into_data(), Some(json!({"a": 1})));
}

#[test]
fn failure_serializes_without_data() {
    let value = serde_json::to_value(ProcessingResult::failure("bad json")).unwrap();
    assert_eq!(value["is_success"], json!(false));
    assert!(value.get("data").is_none());
}

#[test]
fn blank_failure_messages_fall_back_to_a_description() {
    assert_eq!(ImportResult::failure("").error_message(), Some("import failed"));
    assert_eq!(ExportResult::failure("  ").error_message(), Some("export failed"));
    assert_eq!(ProcessingResult::failure("").error_message(), Some("processing failed"));
}

#[test]
fn deserialization_rejects_mixed_shapes() {
    let at = "2026-01-01T00:00:00Z";
    let success_with_error = json!({"is_success": true, "completed_at": at, "error_message": "boom"});
    let err = serde_json::from_value::<ImportResult>(success_with_error).unwrap_err();
    assert!(err.to_string().contains("no error message"));

    let silent_failure = json!({"is_success": false, "completed_at": at});
    assert!(serde_json::from_value::<ExportResult>(silent_failure).is_err());

    let blank_failure = json!({"is_success": false, "completed_at": at, "error_message": " "});
    assert!(serde_json::from_value::<ProcessingResult>(blank_failure).is_err());

    let failure_with_data =
        json!({"is_success": false, "completed_at": at, "error_message": "x", "data": [1]});
    assert!(serde_json::from_value::<ImportResult>(failure_with_data).is_err());

    let merged = ExportResult::success_with_payload(json!("AB"));
    let back: ExportResult = serde_json::from_value(serde_json::to_value(&merged).unwrap()).unwrap();
    assert_eq!(back, merged);
}

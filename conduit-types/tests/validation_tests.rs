use conduit_types::{ErrorCode, ValidationError, ValidationResult};
use proptest::prelude::*;

#[test]
fn success_is_valid() {
    let result = ValidationResult::success();
    assert!(result.is_valid());
    assert!(result.errors().is_empty());
}

#[test]
fn add_makes_invalid() {
    let mut result = ValidationResult::success();
    result.add("FilePath", "is required");
    assert!(!result.is_valid());
    assert_eq!(result.errors()[0], ValidationError::new("FilePath", "is required"));
}

#[test]
fn same_property_may_repeat() {
    let mut result = ValidationResult::single("Encoding", "unknown");
    result.add("Encoding", "not a string");
    assert_eq!(result.len(), 2);
    assert_eq!(result.summary(), "Encoding: unknown; Encoding: not a string");
}

#[test]
fn merge_appends_in_order() {
    let mut a = ValidationResult::single("a", "x");
    let b: ValidationResult = vec![ValidationError::new("b", "y"), ValidationError::new("c", "z")]
        .into_iter()
        .collect();
    a.merge(b);
    let names: Vec<_> = a.errors().iter().map(|e| e.property_name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn into_result_valid_is_ok() {
    assert!(ValidationResult::success().into_result(ErrorCode::ParameterError).is_ok());
}

#[test]
fn into_result_emits_one_error_per_violation() {
    let mut result = ValidationResult::success();
    result.add("A", "missing");
    result.add("B", "missing");
    let failure = result.into_result(ErrorCode::ParameterError).unwrap_err();
    assert_eq!(failure.len(), 2);
    assert!(failure.errors().iter().all(|e| e.has_code(ErrorCode::ParameterError)));
    assert_eq!(failure.errors()[1].detail("property"), Some(&serde_json::json!("B")));
}

proptest! {
    #[test]
    fn into_result_preserves_count(names in proptest::collection::vec("[a-zA-Z]{1,8}", 1..20)) {
        let result: ValidationResult = names
            .iter()
            .map(|n| ValidationError::new(n.clone(), "invalid"))
            .collect();
        let failure = result.into_result(ErrorCode::ValidationError).unwrap_err();
        prop_assert_eq!(failure.len(), names.len());
    }
}

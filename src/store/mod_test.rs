use super::*;

// =============================================================================
// ErrorCode
// =============================================================================

#[test]
fn error_codes_are_stable() {
    assert_eq!(StoreError::Decode("x".into()).error_code(), "E_DECODE");
    assert_eq!(StoreError::Unavailable("x".into()).error_code(), "E_UNAVAILABLE");
    assert_eq!(StoreError::SubscriptionClosed.error_code(), "E_SUBSCRIPTION_CLOSED");
    assert_eq!(StoreError::Database(sqlx::Error::RowNotFound).error_code(), "E_DATABASE");
}

#[test]
fn retryable_only_for_transient_failures() {
    assert!(StoreError::Unavailable("down".into()).retryable());
    assert!(StoreError::SubscriptionClosed.retryable());
    assert!(StoreError::Database(sqlx::Error::PoolTimedOut).retryable());
    assert!(!StoreError::Database(sqlx::Error::RowNotFound).retryable());
    assert!(!StoreError::Decode("bad".into()).retryable());
}

#[test]
fn serde_errors_become_decode() {
    let err: StoreError = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err().into();
    assert!(matches!(err, StoreError::Decode(_)));
    assert!(err.to_string().starts_with("record decode failed"));
}

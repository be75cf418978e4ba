use super::*;

#[test]
fn test_config_error_display() {
    let error = Error::Config("Missing field 'owner'".to_string());
    assert_eq!(error.to_string(), "Configuration error: Missing field 'owner'");
}

#[test]
fn test_input_error_display() {
    let error = Error::Input("line 2: expected three fields".to_string());
    assert_eq!(error.to_string(), "Invalid input: line 2: expected three fields");
}

#[test]
fn test_git_error_conversion() {
    let error: Error = git_client::Error::InvalidCommitId("xyz".to_string()).into();

    assert!(matches!(error, Error::Git(_)));
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}

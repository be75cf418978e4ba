//! Tests for commit id validation.

use super::*;

#[test]
fn test_commit_id_accepts_sha1() {
    let id = CommitId::new("0123456789abcdef0123456789abcdef01234567").unwrap();

    assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef01234567");
    assert!(!id.is_empty());
}

#[test]
fn test_commit_id_lowercases_and_trims() {
    let id = CommitId::new(" 0123456789ABCDEF0123456789ABCDEF01234567\n").unwrap();

    assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef01234567");
}

#[test]
fn test_commit_id_accepts_sha256() {
    let id = CommitId::new("a".repeat(64)).unwrap();

    assert_eq!(id.as_str().len(), 64);
}

#[test]
fn test_commit_id_rejects_wrong_length() {
    let result = CommitId::new("abc123");

    assert!(matches!(result, Err(Error::InvalidCommitId(value)) if value == "abc123"));
}

#[test]
fn test_commit_id_rejects_non_hex() {
    let result = CommitId::new("g".repeat(40));

    assert!(result.is_err());
}

#[test]
fn test_empty_commit_id() {
    assert!(CommitId::empty().is_empty());
    assert_eq!(CommitId::empty().as_str(), EMPTY_SHA);
    assert!(CommitId::new("0".repeat(64)).unwrap().is_empty());
}

#[test]
fn test_commit_id_serde_validates() {
    let json = format!("\"{}\"", "b".repeat(40));
    let id: CommitId = serde_json::from_str(&json).unwrap();

    assert_eq!(id.as_str(), "b".repeat(40));
    assert!(serde_json::from_str::<CommitId>("\"nope\"").is_err());
}

#[test]
fn test_commit_id_from_oid_round_trip() {
    let oid = git2::Oid::from_str("0123456789abcdef0123456789abcdef01234567").unwrap();
    let id = CommitId::from(oid);

    assert_eq!(id.to_oid().unwrap(), oid);
}

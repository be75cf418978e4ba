use super::*;
use std::fs;
use tempfile::TempDir;

fn args_for(content: &str) -> (TempDir, ValidateArgs) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = temp_dir.path().join("push-guard.toml");
    fs::write(&config, content).expect("Failed to write config");
    (temp_dir, ValidateArgs { config })
}

#[test]
fn test_valid_config_summary() {
    let (_dir, args) = args_for(
        r#"
[repository]
owner = "acme"
name = "app"

[[branches]]
branch_name = "main"

[[branches]]
branch_name = "release/*"

[[tags]]
name_pattern = "/^v[0-9]+$/"
"#,
    );

    let summary = execute(&args).unwrap();

    assert_eq!(
        summary,
        ValidationSummary {
            branch_rules: 2,
            tag_rules: 1,
            users: 0
        }
    );
}

#[test]
fn test_invalid_file_pattern() {
    let (_dir, args) = args_for(
        r#"
[repository]
owner = "acme"
name = "app"

[[branches]]
branch_name = "main"
protected_file_patterns = ["[unclosed"]
"#,
    );

    let result = execute(&args);

    assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Invalid protection rule")));
}

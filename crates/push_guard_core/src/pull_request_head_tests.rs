//! Tests for pull request head validation.

use super::*;
use crate::test_support::*;
use crate::{HookOptions, RepositoryInfo, Severity};
use git_client::CommitId;
use protection_rules::UserId;

async fn evaluate(harness: &Harness, ctx: &mut PushContext, update: &RefUpdate) -> Decision {
    let validator = PullRequestHeadValidator::new(harness.services());
    let base = update.ref_full_name.trim_start_matches("refs/for/");
    validator.evaluate(ctx, update, base).await
}

fn git_with_branches(branches: &[&str]) -> MockGit {
    MockGit {
        branches: branches.iter().map(|b| b.to_string()).collect(),
        ..Default::default()
    }
}

fn forbidden(reason: &str) -> Decision {
    Decision::deny(reason, Severity::Forbidden)
}

#[tokio::test]
async fn test_existing_base_branch() {
    let harness = Harness::default().with_git(git_with_branches(&["main"]));
    let update = update(CommitId::empty(), sha('b'), "refs/for/main");
    let mut ctx = context(vec![update.clone()]);

    let decision = evaluate(&harness, &mut ctx, &update).await;

    assert_eq!(decision, Decision::Allow);
}

#[tokio::test]
async fn test_topic_suffix_resolves_to_prefix_branch() {
    let harness = Harness::default().with_git(git_with_branches(&["main"]));
    let update = update(CommitId::empty(), sha('b'), "refs/for/main/topic-x");
    let mut ctx = context(vec![update.clone()]);

    let decision = evaluate(&harness, &mut ctx, &update).await;

    assert_eq!(decision, Decision::Allow);
    assert_eq!(
        harness.git.calls(),
        vec!["branch_exists main/topic-x", "branch_exists main"]
    );
}

#[tokio::test]
async fn test_nested_prefix() {
    let harness = Harness::default().with_git(git_with_branches(&["release/1.0"]));
    let update = update(CommitId::empty(), sha('b'), "refs/for/release/1.0/fix");
    let mut ctx = context(vec![update.clone()]);

    let decision = evaluate(&harness, &mut ctx, &update).await;

    assert_eq!(decision, Decision::Allow);
}

#[tokio::test]
async fn test_trailing_slash_prefix_does_not_count() {
    let harness = Harness::default().with_git(git_with_branches(&["main"]));
    let update = update(CommitId::empty(), sha('b'), "refs/for/main/");
    let mut ctx = context(vec![update.clone()]);

    let decision = evaluate(&harness, &mut ctx, &update).await;

    assert_eq!(decision, forbidden("Unexpected ref: refs/for/main/"));
}

#[tokio::test]
async fn test_missing_base_branch() {
    let harness = Harness::default().with_git(git_with_branches(&["main"]));
    let update = update(CommitId::empty(), sha('b'), "refs/for/nope");
    let mut ctx = context(vec![update.clone()]);

    let decision = evaluate(&harness, &mut ctx, &update).await;

    assert_eq!(decision, forbidden("Unexpected ref: refs/for/nope"));
}

#[tokio::test]
async fn test_empty_repository() {
    let harness = Harness::default().with_git(git_with_branches(&["main"]));
    let update = update(CommitId::empty(), sha('b'), "refs/for/main");
    let repository = RepositoryInfo {
        is_empty: true,
        ..RepositoryInfo::new("acme", "app", "main")
    };
    let mut ctx = PushContext::new(repository, HookOptions::new(UserId::new(1)));

    let decision = evaluate(&harness, &mut ctx, &update).await;

    assert_eq!(
        decision,
        forbidden("Can't create pull request for an empty repository.")
    );
    assert!(harness.git.calls().is_empty());
}

#[tokio::test]
async fn test_wiki_push() {
    let harness = Harness::default().with_git(git_with_branches(&["main"]));
    let update = update(CommitId::empty(), sha('b'), "refs/for/main");
    let mut ctx = context_with(HookOptions {
        is_wiki: true,
        ..HookOptions::new(UserId::new(1))
    });

    let decision = evaluate(&harness, &mut ctx, &update).await;

    assert_eq!(
        decision,
        forbidden("Pull requests are not supported on the wiki.")
    );
}

#[tokio::test]
async fn test_requires_pull_request_read_access() {
    let harness = Harness::default()
        .with_git(git_with_branches(&["main"]))
        .with_permission(crate::Permission::default());
    let update = update(CommitId::empty(), sha('b'), "refs/for/main");
    let mut ctx = context(vec![update.clone()]);

    let decision = evaluate(&harness, &mut ctx, &update).await;

    assert_eq!(decision, forbidden("User permission denied."));
}

#[tokio::test]
async fn test_branch_lookup_failure_is_internal() {
    let harness = Harness::default().with_git(MockGit {
        fail_branch_lookup: true,
        ..Default::default()
    });
    let update = update(CommitId::empty(), sha('b'), "refs/for/main");
    let mut ctx = context(vec![update.clone()]);

    let decision = evaluate(&harness, &mut ctx, &update).await;

    assert_eq!(decision.severity(), Some(Severity::InternalError));
}

#[tokio::test]
async fn test_no_slash_prefix_exists() {
    let harness = Harness::default().with_git(git_with_branches(&["main", "develop"]));
    let update = update(CommitId::empty(), sha('b'), "refs/for/feature/login");
    let mut ctx = context(vec![update.clone()]);

    let decision = evaluate(&harness, &mut ctx, &update).await;

    assert_eq!(decision, forbidden("Unexpected ref: refs/for/feature/login"));
    assert_eq!(
        harness.git.calls(),
        vec!["branch_exists feature/login", "branch_exists feature"]
    );
}

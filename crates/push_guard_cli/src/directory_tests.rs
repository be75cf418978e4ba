use super::*;
use crate::config::{RepositoryConfig, TeamConfig};
use push_guard_core::AccessMode;

fn config() -> AppConfig {
    AppConfig {
        repository: RepositoryConfig {
            owner: "acme".to_string(),
            name: "app".to_string(),
            default_branch: None,
        },
        users: vec![
            UserConfig {
                id: UserId::new(1),
                name: "alice".to_string(),
                admin: false,
                code: AccessMode::Write,
                pull_requests: AccessMode::Read,
            },
            UserConfig {
                id: UserId::new(2),
                name: "bob".to_string(),
                admin: true,
                code: AccessMode::None,
                pull_requests: AccessMode::None,
            },
        ],
        teams: vec![TeamConfig {
            id: TeamId::new(4),
            members: vec![UserId::new(1)],
        }],
        pull_requests: vec![
            PullRequestConfig {
                id: PullRequestId::new(12),
                index: 3,
                base_branch: "main".to_string(),
                head_repo: "acme/app".to_string(),
                mergers: vec![UserId::new(1)],
                ready: true,
                not_ready_reason: None,
            },
            PullRequestConfig {
                id: PullRequestId::new(13),
                index: 4,
                base_branch: "main".to_string(),
                head_repo: "acme/fork".to_string(),
                mergers: vec![],
                ready: false,
                not_ready_reason: None,
            },
        ],
        ..Default::default()
    }
}

fn repository() -> RepositoryInfo {
    RepositoryInfo::new("acme", "app", "main")
}

#[tokio::test]
async fn test_user_and_permission() {
    let directory = ConfigDirectory::from_config(&config());

    let user = directory.user_by_id(UserId::new(1)).await.unwrap();
    let permission = directory
        .repository_permission(&repository(), &user)
        .await
        .unwrap();

    assert_eq!(user.name, "alice");
    assert_eq!(permission.code, AccessMode::Write);
    assert!(!permission.is_admin());
}

#[tokio::test]
async fn test_unknown_user() {
    let directory = ConfigDirectory::from_config(&config());

    let result = directory.user_by_id(UserId::new(99)).await;

    assert!(matches!(
        result,
        Err(StoreError::NotFound { entity: "user", id: 99 })
    ));
}

#[tokio::test]
async fn test_team_membership() {
    let directory = ConfigDirectory::from_config(&config());

    let member = directory
        .is_user_in_teams(UserId::new(1), &[TeamId::new(4)])
        .await
        .unwrap();
    let other = directory
        .is_user_in_teams(UserId::new(2), &[TeamId::new(4), TeamId::new(5)])
        .await
        .unwrap();

    assert!(member);
    assert!(!other);
}

#[tokio::test]
async fn test_mergers_and_admins_may_merge() {
    let directory = ConfigDirectory::from_config(&config());
    let pull_request = directory
        .pull_request_by_id(PullRequestId::new(13))
        .await
        .unwrap();
    let alice = directory.user_by_id(UserId::new(1)).await.unwrap();
    let bob = directory.user_by_id(UserId::new(2)).await.unwrap();
    let alice_permission = directory
        .repository_permission(&repository(), &alice)
        .await
        .unwrap();
    let bob_permission = directory
        .repository_permission(&repository(), &bob)
        .await
        .unwrap();

    let alice_allowed = directory
        .is_user_allowed_to_merge(&pull_request, &alice_permission, &alice)
        .await
        .unwrap();
    let bob_allowed = directory
        .is_user_allowed_to_merge(&pull_request, &bob_permission, &bob)
        .await
        .unwrap();

    assert!(!alice_allowed);
    assert!(bob_allowed);
}

#[tokio::test]
async fn test_readiness() {
    let directory = ConfigDirectory::from_config(&config());
    let ready = directory
        .pull_request_by_id(PullRequestId::new(12))
        .await
        .unwrap();
    let not_ready = directory
        .pull_request_by_id(PullRequestId::new(13))
        .await
        .unwrap();

    assert_eq!(
        directory.check_ready_to_merge(&ready).await.unwrap(),
        MergeReadiness::Ready
    );
    assert_eq!(
        directory.check_ready_to_merge(&not_ready).await.unwrap(),
        MergeReadiness::NotReady(DEFAULT_NOT_READY_REASON.to_string())
    );
}

#[tokio::test]
async fn test_unknown_pull_request() {
    let directory = ConfigDirectory::from_config(&config());

    let result = directory.pull_request_by_id(PullRequestId::new(1)).await;

    assert!(matches!(
        result,
        Err(StoreError::NotFound {
            entity: "pull request",
            ..
        })
    ));
}

//! AccessGate wired to a workspace snapshot.

use dbguard::access::{AccessDecision, GrantReason, ACCESS_CONTROL_FEATURE};
use dbguard::expr::Expr;
use dbguard::policy::{IamPolicy, PolicyBinding, QUERIER_ROLE, WORKSPACE_IAM_POLICY};
use dbguard::types::{Database, Role};
use dbguard::workspace::{UserEntry, Workspace, WorkspaceSnapshot};

fn snapshot() -> WorkspaceSnapshot {
    WorkspaceSnapshot {
        features: vec![ACCESS_CONTROL_FEATURE.to_owned()],
        policies: vec![IamPolicy {
            name: WORKSPACE_IAM_POLICY.to_owned(),
            bindings: vec![PolicyBinding::new(
                QUERIER_ROLE,
                Expr::environment_in(["staging"]),
            )],
        }],
        users: vec![
            UserEntry {
                email: "dev@example.com".to_owned(),
                role: Role::Developer,
                grants: vec!["instances/pg-main/databases/billing".to_owned()],
            },
            UserEntry {
                email: "dba@example.com".to_owned(),
                role: Role::Dba,
                grants: vec![],
            },
        ],
        ..WorkspaceSnapshot::default()
    }
}

fn workspace(snapshot: WorkspaceSnapshot) -> Workspace {
    match Workspace::from_snapshot(snapshot) {
        Ok(ws) => ws,
        Err(err) => panic!("snapshot should be valid: {err}"),
    }
}

#[test]
fn querier_binding_from_workspace_policy() {
    let ws = workspace(snapshot());
    let dev = ws.principal("dev@example.com").expect("member");
    let db = Database::new("orders", "pg-main", "staging");

    assert_eq!(
        ws.gate().evaluate(&dev, &db),
        AccessDecision::Granted(GrantReason::QuerierBinding)
    );
}

#[test]
fn explicit_grant_from_workspace_user() {
    let ws = workspace(snapshot());
    let dev = ws.principal("dev@example.com").expect("member");

    let billing = Database::new("billing", "pg-main", "prod");
    assert_eq!(
        ws.gate().evaluate(&dev, &billing),
        AccessDecision::Granted(GrantReason::AllowList)
    );

    let orders = Database::new("orders", "pg-main", "prod");
    assert_eq!(ws.gate().evaluate(&dev, &orders), AccessDecision::Denied);
}

#[test]
fn dba_reaches_everything() {
    let ws = workspace(snapshot());
    let dba = ws.principal("dba@example.com").expect("member");
    let db = Database::new("orders", "pg-main", "prod");
    assert!(ws.gate().can_access(&dba, &db));
}

#[test]
fn missing_policy_grants_nothing() {
    let mut snap = snapshot();
    snap.policies.clear();
    let ws = workspace(snap);
    let dev = ws.principal("dev@example.com").expect("member");
    let db = Database::new("orders", "pg-main", "staging");

    assert!(ws.gate().workspace_bindings().is_empty());
    assert_eq!(ws.gate().evaluate(&dev, &db), AccessDecision::Denied);
}

#[test]
fn policy_under_another_name_is_ignored() {
    let mut snap = snapshot();
    snap.policies[0].name = "policies/PROJECT_IAM".to_owned();
    let ws = workspace(snap);
    let dev = ws.principal("dev@example.com").expect("member");
    let db = Database::new("orders", "pg-main", "staging");

    assert!(!ws.gate().can_access(&dev, &db));
}

#[test]
fn feature_missing_fails_open() {
    let mut snap = snapshot();
    snap.features.clear();
    let ws = workspace(snap);
    let dev = ws.principal("dev@example.com").expect("member");
    let db = Database::new("orders", "pg-main", "prod");

    assert_eq!(
        ws.gate().evaluate(&dev, &db),
        AccessDecision::Granted(GrantReason::FeatureDisabled)
    );
}

#[test]
fn duplicate_policy_names_rejected() {
    let mut snap = snapshot();
    let dup = snap.policies[0].clone();
    snap.policies.push(dup);
    assert!(Workspace::from_snapshot(snap).is_err());
}

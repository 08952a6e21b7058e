//! Reaper behaviour against the in-memory transfer service

mod common;

use chrono::TimeDelta;
use common::{config, harness, harness_with, now};
use sftp_lifecycle::ProvisionRequest;
use tempsftp_common::expiry::{self, CUSTOMER_TAG, EXPIRATION_TAG};
use tempsftp_common::{ServiceError, Tag};
use transfer_backend::{Operation, ProvisioningService, RecordedCall};

fn expiring_at(offset: TimeDelta) -> Vec<Tag> {
    vec![
        Tag::new(CUSTOMER_TAG, "acme"),
        Tag::new(EXPIRATION_TAG, expiry::encode(now() + offset)),
    ]
}

fn denied(operation: &'static str) -> ServiceError {
    ServiceError::Api {
        operation,
        code: "AccessDeniedException".to_string(),
        message: "not authorized".to_string(),
    }
}

#[tokio::test]
async fn test_deletes_only_expired_servers() {
    let h = harness();
    let untagged = h.transfer.insert_server(vec![Tag::new("none", "x")]).await;
    let yesterday = h.transfer.insert_server(expiring_at(TimeDelta::days(-1))).await;
    let tomorrow = h.transfer.insert_server(expiring_at(TimeDelta::days(1))).await;

    let deleted = h.reaper.sweep().await.unwrap();

    assert_eq!(deleted, vec![yesterday.server_id.clone()]);
    assert_eq!(
        h.transfer.server_ids().await,
        vec![untagged.server_id, tomorrow.server_id]
    );
}

#[tokio::test]
async fn test_boundary_is_inclusive() {
    let h = harness();
    let at_now = h.transfer.insert_server(expiring_at(TimeDelta::zero())).await;
    let one_second_later = h
        .transfer
        .insert_server(expiring_at(TimeDelta::seconds(1)))
        .await;

    let deleted = h.reaper.sweep().await.unwrap();

    assert_eq!(deleted, vec![at_now.server_id]);
    assert_eq!(h.transfer.server_ids().await, vec![one_second_later.server_id]);
}

#[tokio::test]
async fn test_untagged_servers_are_never_deleted() {
    let h = harness();
    h.transfer.insert_server(vec![]).await;
    h.transfer
        .insert_server(vec![Tag::new(CUSTOMER_TAG, "acme")])
        .await;

    h.clock.set(now() + TimeDelta::days(365 * 100));
    let deleted = h.reaper.sweep().await.unwrap();

    assert!(deleted.is_empty());
    assert_eq!(h.transfer.server_ids().await.len(), 2);
    assert_eq!(h.transfer.call_count(Operation::DeleteServer).await, 0);
}

#[tokio::test]
async fn test_malformed_tag_is_skipped_without_aborting() {
    let h = harness();
    let malformed = h
        .transfer
        .insert_server(vec![Tag::new(EXPIRATION_TAG, "next tuesday")])
        .await;
    let expired = h.transfer.insert_server(expiring_at(TimeDelta::hours(-1))).await;

    let deleted = h.reaper.sweep().await.unwrap();

    assert_eq!(deleted, vec![expired.server_id]);
    assert_eq!(h.transfer.server_ids().await, vec![malformed.server_id]);
}

#[tokio::test]
async fn test_fractional_second_tags_are_honoured() {
    let h = harness();
    let legacy = h
        .transfer
        .insert_server(vec![Tag::new(EXPIRATION_TAG, "2024-06-01T11:59:59.999999")])
        .await;

    let deleted = h.reaper.sweep().await.unwrap();
    assert_eq!(deleted, vec![legacy.server_id]);
}

#[tokio::test]
async fn test_second_sweep_is_empty() {
    let h = harness();
    h.transfer.insert_server(expiring_at(TimeDelta::minutes(-5))).await;
    h.transfer.insert_server(expiring_at(TimeDelta::minutes(-1))).await;
    h.transfer.insert_server(expiring_at(TimeDelta::minutes(10))).await;

    let first = h.reaper.sweep().await.unwrap();
    let second = h.reaper.sweep().await.unwrap();

    assert_eq!(first.len(), 2);
    assert!(second.is_empty());
}

#[tokio::test]
async fn test_list_failure_fails_sweep_without_deletions() {
    let h = harness();
    h.transfer.insert_server(expiring_at(TimeDelta::minutes(-5))).await;
    h.transfer
        .fail_on(Operation::ListServers, denied("ListServers"))
        .await;

    let err = h.reaper.sweep().await.unwrap_err();

    assert!(err.to_string().contains("AccessDeniedException"));
    assert_eq!(h.transfer.call_count(Operation::DeleteServer).await, 0);
    assert_eq!(h.transfer.server_ids().await.len(), 1);
}

#[tokio::test]
async fn test_mid_sweep_failure_keeps_earlier_deletions() {
    let h = harness();
    let first = h.transfer.insert_server(expiring_at(TimeDelta::minutes(-5))).await;
    let second = h.transfer.insert_server(expiring_at(TimeDelta::minutes(-5))).await;
    let third = h.transfer.insert_server(expiring_at(TimeDelta::minutes(-5))).await;

    h.transfer
        .fail_on_target(
            Operation::ListTagsForResource,
            second.arn.clone(),
            denied("ListTagsForResource"),
        )
        .await;

    assert!(h.reaper.sweep().await.is_err());
    // First stays deleted; the rest waits for the next sweep
    assert_eq!(
        h.transfer.server_ids().await,
        vec![second.server_id.clone(), third.server_id.clone()]
    );
    assert_eq!(h.transfer.call_count(Operation::DeleteServer).await, 1);
    assert!(!h.transfer.server_ids().await.contains(&first.server_id));

    h.transfer.clear_failures().await;
    let deleted = h.reaper.sweep().await.unwrap();
    assert_eq!(deleted, vec![second.server_id, third.server_id]);
}

#[tokio::test]
async fn test_delete_failure_aborts_sweep() {
    let h = harness();
    let first = h.transfer.insert_server(expiring_at(TimeDelta::minutes(-5))).await;
    let second = h.transfer.insert_server(expiring_at(TimeDelta::minutes(-5))).await;

    h.transfer
        .fail_on_target(Operation::DeleteServer, first.server_id.clone(), denied("DeleteServer"))
        .await;

    let err = h.reaper.sweep().await.unwrap_err();
    assert!(err.to_string().starts_with("DeleteServer failed"));

    // The second server was never examined
    let examined: Vec<RecordedCall> = h
        .transfer
        .calls()
        .await
        .into_iter()
        .filter(|c| c.operation() == Operation::ListTagsForResource)
        .collect();
    assert_eq!(examined.len(), 1);
    assert_eq!(h.transfer.server_ids().await.len(), 2);
    assert!(h.transfer.server_ids().await.contains(&second.server_id));
}

#[tokio::test]
async fn test_already_deleted_server_is_a_no_op() {
    let h = harness();
    let vanished = h.transfer.insert_server(expiring_at(TimeDelta::minutes(-5))).await;
    let expired = h.transfer.insert_server(expiring_at(TimeDelta::minutes(-5))).await;

    // An overlapping sweep got there first
    h.transfer
        .fail_on_target(
            Operation::DeleteServer,
            vanished.server_id.clone(),
            ServiceError::NotFound {
                operation: "DeleteServer",
                message: "Unknown server".to_string(),
            },
        )
        .await;

    let deleted = h.reaper.sweep().await.unwrap();
    assert_eq!(deleted, vec![expired.server_id]);
}

#[tokio::test]
async fn test_server_vanishing_before_tag_read_is_skipped() {
    let h = harness();
    let vanished = h.transfer.insert_server(expiring_at(TimeDelta::minutes(-5))).await;

    h.transfer
        .fail_on_target(
            Operation::ListTagsForResource,
            vanished.arn.clone(),
            ServiceError::NotFound {
                operation: "ListTagsForResource",
                message: "Unknown resource".to_string(),
            },
        )
        .await;

    let deleted = h.reaper.sweep().await.unwrap();
    assert!(deleted.is_empty());
    assert_eq!(h.transfer.call_count(Operation::DeleteServer).await, 0);
}

#[tokio::test]
async fn test_users_deleted_first_when_configured() {
    let mut config = config();
    config.delete_users_before_server = true;
    let h = harness_with(config);

    let server = h
        .provisioner
        .provision(ProvisionRequest::new("acme").with_lifetime_minutes(1).unwrap())
        .await
        .unwrap();

    h.clock.set(now() + TimeDelta::minutes(1));
    let deleted = h.reaper.sweep().await.unwrap();
    assert_eq!(deleted, vec![server.server_id.clone()]);

    let calls = h.transfer.calls().await;
    let tail: Vec<Operation> = calls.iter().rev().take(3).rev().map(|c| c.operation()).collect();
    assert_eq!(
        tail,
        vec![Operation::ListUsers, Operation::DeleteUser, Operation::DeleteServer]
    );
    assert!(calls.contains(&RecordedCall::DeleteUser {
        server_id: server.server_id,
        user_name: "temp-user-acme".to_string(),
    }));
}

#[tokio::test]
async fn test_users_not_touched_by_default() {
    let h = harness();

    h.provisioner
        .provision(ProvisionRequest::new("acme").with_lifetime_minutes(0).unwrap())
        .await
        .unwrap();
    h.reaper.sweep().await.unwrap();

    assert_eq!(h.transfer.call_count(Operation::ListUsers).await, 0);
    assert_eq!(h.transfer.call_count(Operation::DeleteUser).await, 0);
    assert!(h.transfer.list_servers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_provisioned_server_lives_until_its_deadline() {
    let h = harness();
    let server = h
        .provisioner
        .provision(ProvisionRequest::new("acme").with_lifetime_minutes(5).unwrap())
        .await
        .unwrap();

    h.clock.set(server.expires_at - TimeDelta::seconds(1));
    assert!(h.reaper.sweep().await.unwrap().is_empty());

    h.clock.set(server.expires_at);
    assert_eq!(h.reaper.sweep().await.unwrap(), vec![server.server_id]);
}

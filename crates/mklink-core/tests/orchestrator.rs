#![cfg(unix)]

use std::path::Path;

use anyhow::Result;
use mklink_core::{CancellationToken, CollisionPolicy, ErrorCode, LinkError, SOURCE_AT_LINK_PATH};
use mklink_telemetry::{Metrics, with_correlation};
use mklink_test_support::assert::{
    assert_all_failed_with, assert_linked_at, assert_outcome_invariants, codes,
};
use mklink_test_support::fixtures::{fake_harness, harness_with, options};
use mklink_test_support::mocks::{BatchScript, FakeLinkBackend, FakePrivilegeService};

#[tokio::test]
async fn result_length_matches_input_on_every_path() -> Result<()> {
    let cancel = CancellationToken::new();
    let sources = ["/a/x", "/b/x", "relative", "/c/y"];

    let ok = fake_harness(CollisionPolicy::Skip, 10, true)?;
    let batch = ok
        .manager
        .create_directory_links(&sources, "/dest", &cancel)
        .await?;
    assert_eq!(batch.len(), sources.len());
    assert_outcome_invariants(&batch);

    let denied = fake_harness(CollisionPolicy::Skip, 10, false)?;
    let batch = denied
        .manager
        .create_directory_links(&sources, "/dest", &cancel)
        .await?;
    assert_eq!(batch.len(), sources.len());

    let bad_destination = fake_harness(CollisionPolicy::Skip, 10, true)?;
    let batch = bad_destination
        .manager
        .create_directory_links(&sources, "dest", &cancel)
        .await?;
    assert_all_failed_with(&batch, sources.len(), ErrorCode::InvalidPath);
    assert_eq!(bad_destination.privilege.queries(), 0);
    Ok(())
}

#[tokio::test]
async fn skip_policy_reports_already_exists_on_repeat() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 10, true)?;
    let cancel = CancellationToken::new();

    let first = harness
        .manager
        .create_file_link("/src/report.txt", "/dest", &cancel)
        .await?;
    assert_linked_at(&first, "/dest/report.txt");
    assert!(first.error_message().is_none());

    let second = harness
        .manager
        .create_file_link("/src/report.txt", "/dest", &cancel)
        .await?;
    assert!(!second.is_success());
    assert_eq!(second.error_code(), Some(ErrorCode::AlreadyExists));
    assert_eq!(second.error_message(), Some("Link already exists."));
    Ok(())
}

#[tokio::test]
async fn duplicate_names_reach_backend_once() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 10, true)?;
    let batch = harness
        .manager
        .create_directory_links(&["/a/x.txt", "/b/x.txt"], "/dest", &CancellationToken::new())
        .await?;

    assert!(batch[0].is_success());
    assert_eq!(batch[1].error_code(), Some(ErrorCode::DuplicateName));
    assert_eq!(batch[1].error_message(), Some("Duplicate name: x.txt"));
    assert_eq!(harness.backend.link_calls(), 1);
    assert_eq!(harness.backend.batch_calls(), 1);
    assert_eq!(
        harness.backend.link_target("/dest/x.txt").as_deref(),
        Some(Path::new("/a/x.txt"))
    );
    Ok(())
}

#[tokio::test]
async fn denied_privilege_fails_every_slot_without_backend_calls() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 10, false)?;
    let batch = harness
        .manager
        .create_directory_links(&["/a", "/b", "/c"], "/dest", &CancellationToken::new())
        .await?;

    assert_all_failed_with(&batch, 3, ErrorCode::DevModeRequired);
    assert_eq!(batch[0].error_message(), Some("Developer mode not enabled."));
    assert_eq!(harness.backend.batch_calls(), 0);
    assert_eq!(harness.backend.link_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn failing_privilege_query_denies() -> Result<()> {
    let harness = harness_with(
        options(CollisionPolicy::Skip, 10)?,
        FakeLinkBackend::new(CollisionPolicy::Skip),
        FakePrivilegeService::failing(),
    );
    let batch = harness
        .manager
        .create_directory_links(&["/a"], "/dest", &CancellationToken::new())
        .await?;
    assert_all_failed_with(&batch, 1, ErrorCode::DevModeRequired);
    assert_eq!(harness.backend.link_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn privilege_is_checked_once_and_cached_until_refresh() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 10, true)?;
    let cancel = CancellationToken::new();

    harness
        .manager
        .create_directory_links(&["/a", "/b", "/c"], "/dest", &cancel)
        .await?;
    harness
        .manager
        .create_directory_links(&["/d"], "/dest", &cancel)
        .await?;
    assert_eq!(harness.privilege.queries(), 1);

    harness.privilege.set_allowed(false);
    harness.manager.privilege().refresh().await?;
    let batch = harness
        .manager
        .create_directory_links(&["/e"], "/dest", &cancel)
        .await?;
    assert_all_failed_with(&batch, 1, ErrorCode::DevModeRequired);
    assert_eq!(harness.privilege.queries(), 2);
    assert_eq!(harness.privilege.refreshes(), 1);
    Ok(())
}

#[tokio::test]
async fn oversized_batch_is_rejected_whole() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 2, true)?;
    let batch = harness
        .manager
        .create_directory_links(&["/a", "/b", "/c"], "/dest", &CancellationToken::new())
        .await?;

    assert_all_failed_with(&batch, 3, ErrorCode::TooManyItems);
    assert_eq!(batch[2].error_message(), Some("Too many items. Max 2"));
    assert_eq!(harness.backend.batch_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn rename_policy_reports_actual_link_path() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Rename, 10, true)?;
    harness.backend.occupy("/dest/A");

    let batch = harness
        .manager
        .create_directory_links(&["/src/A", "/src/B"], "/dest", &CancellationToken::new())
        .await?;

    assert_linked_at(&batch[0], "/dest/A.1");
    assert_linked_at(&batch[1], "/dest/B");
    assert_eq!(
        harness.backend.link_target("/dest/A.1").as_deref(),
        Some(Path::new("/src/A"))
    );
    Ok(())
}

#[tokio::test]
async fn overwrite_policy_replaces_occupied_path() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Overwrite, 10, true)?;
    harness.backend.occupy("/dest/A");

    let batch = harness
        .manager
        .create_directory_links(&["/src/A"], "/dest", &CancellationToken::new())
        .await?;
    assert_linked_at(&batch[0], "/dest/A");
    Ok(())
}

#[tokio::test]
async fn source_already_at_link_path_is_left_alone_under_every_policy() -> Result<()> {
    for policy in [
        CollisionPolicy::Skip,
        CollisionPolicy::Overwrite,
        CollisionPolicy::Rename,
    ] {
        let harness = fake_harness(policy, 10, true)?;
        harness.backend.occupy("/dest/data");

        let batch = harness
            .manager
            .create_directory_links(&["/dest/data", "/src/other"], "/dest", &CancellationToken::new())
            .await?;

        assert_eq!(batch[0].error_code(), Some(ErrorCode::AlreadyExists), "{policy}");
        assert_eq!(batch[0].error_message(), Some(SOURCE_AT_LINK_PATH));
        assert_linked_at(&batch[1], "/dest/other");
        assert!(harness.backend.is_occupied("/dest/data"));
        assert!(harness.backend.link_target("/dest/data").is_none());
        assert!(harness.backend.link_target("/dest/data.1").is_none());
        assert_eq!(harness.backend.link_calls(), 1);
    }
    Ok(())
}

#[tokio::test]
async fn file_link_into_own_folder_is_rejected() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Overwrite, 10, true)?;
    let outcome = harness
        .manager
        .create_file_link("/dest/sub/../notes.txt", "/dest", &CancellationToken::new())
        .await?;
    assert_eq!(outcome.error_code(), Some(ErrorCode::AlreadyExists));
    assert_eq!(harness.backend.batch_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn file_batch_creates_one_link_per_file() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 10, true)?;
    let batch = harness
        .manager
        .create_file_links(&["/src/a.txt", "/src/b.txt"], "/dest", &CancellationToken::new())
        .await?;

    assert_outcome_invariants(&batch);
    assert_linked_at(&batch[0], "/dest/a.txt");
    assert_linked_at(&batch[1], "/dest/b.txt");
    assert!(harness.backend.requests().iter().all(|request| !request.is_directory()));
    assert_eq!(
        harness.backend.link_target("/dest/b.txt").as_deref(),
        Some(Path::new("/src/b.txt"))
    );
    Ok(())
}

#[tokio::test]
async fn file_batch_reports_name_collisions_and_invalid_sources() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 10, true)?;
    harness.backend.occupy("/dest/taken.txt");

    let batch = harness
        .manager
        .create_file_links(
            &["/src/taken.txt", "/one/same.txt", "/two/same.txt", "not/absolute.txt", "/src/ok.txt"],
            "/dest",
            &CancellationToken::new(),
        )
        .await?;

    assert_eq!(
        codes(&batch),
        vec![
            Some(ErrorCode::AlreadyExists),
            None,
            Some(ErrorCode::DuplicateName),
            Some(ErrorCode::InvalidPath),
            None,
        ]
    );
    assert_eq!(harness.backend.link_calls(), 3);
    Ok(())
}

#[tokio::test]
async fn file_batch_denied_without_privilege() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 10, false)?;
    let batch = harness
        .manager
        .create_file_links(&["/src/a.txt", "/src/b.txt"], "/dest", &CancellationToken::new())
        .await?;
    assert_all_failed_with(&batch, 2, ErrorCode::DevModeRequired);
    assert_eq!(harness.backend.batch_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn pre_cancelled_call_does_no_work() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 10, true)?;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = harness
        .manager
        .create_directory_links(&["/a"], "not even absolute", &cancel)
        .await
        .expect_err("cancelled before start");
    assert!(matches!(err, LinkError::Cancelled));

    let single = harness
        .manager
        .create_file_link("/a", "/dest", &cancel)
        .await;
    assert!(matches!(single, Err(LinkError::Cancelled)));
    assert_eq!(harness.privilege.queries(), 0);
    assert_eq!(harness.backend.batch_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn count_mismatch_fails_every_unique_slot() -> Result<()> {
    for script in [BatchScript::ExtraOutcome, BatchScript::MissingOutcome] {
        let harness = harness_with(
            options(CollisionPolicy::Skip, 10)?,
            FakeLinkBackend::new(CollisionPolicy::Skip).with_script(script),
            FakePrivilegeService::allowing(),
        );
        let batch = harness
            .manager
            .create_directory_links(&["/a/x", "/b/x", "/c/y"], "/dest", &CancellationToken::new())
            .await?;

        assert_eq!(
            codes(&batch),
            vec![
                Some(ErrorCode::Unexpected),
                Some(ErrorCode::DuplicateName),
                Some(ErrorCode::Unexpected),
            ],
            "{script:?}"
        );
        assert_eq!(batch[0].error_message(), Some("Failed to create symlinks."));
    }
    Ok(())
}

#[tokio::test]
async fn raised_backend_error_fills_remaining_slots() -> Result<()> {
    let harness = harness_with(
        options(CollisionPolicy::Skip, 10)?,
        FakeLinkBackend::new(CollisionPolicy::Skip).with_script(BatchScript::RaiseAfter(1)),
        FakePrivilegeService::allowing(),
    );
    let batch = harness
        .manager
        .create_directory_links(&["/a", "/b", "/a", "/c"], "/dest", &CancellationToken::new())
        .await?;

    assert_linked_at(&batch[0], "/dest/a");
    assert_eq!(
        codes(&batch)[1..].to_vec(),
        vec![
            Some(ErrorCode::AccessDenied),
            Some(ErrorCode::DuplicateName),
            Some(ErrorCode::AccessDenied),
        ]
    );
    assert_outcome_invariants(&batch);
    Ok(())
}

#[tokio::test]
async fn mid_batch_cancellation_keeps_completed_links() -> Result<()> {
    let harness = harness_with(
        options(CollisionPolicy::Skip, 10)?,
        FakeLinkBackend::new(CollisionPolicy::Skip).with_script(BatchScript::CancelAfter(1)),
        FakePrivilegeService::allowing(),
    );
    let batch = harness
        .manager
        .create_directory_links(&["/a", "/b", "/c"], "/dest", &CancellationToken::new())
        .await?;

    assert_linked_at(&batch[0], "/dest/a");
    assert!(harness.backend.is_occupied("/dest/a"));
    for outcome in &batch.outcomes()[1..] {
        assert_eq!(outcome.error_code(), Some(ErrorCode::Unexpected));
        assert_eq!(outcome.error_message(), Some("Operation cancelled."));
    }
    assert_eq!(harness.backend.link_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn per_item_failures_stay_isolated() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 10, true)?;
    harness
        .backend
        .fail_with("/dest/b", std::io::ErrorKind::NotFound);

    let batch = harness
        .manager
        .create_directory_links(&["relative", "/src/b", "/src/c", "/"], "/dest", &CancellationToken::new())
        .await?;
    assert_eq!(
        codes(&batch),
        vec![
            Some(ErrorCode::InvalidPath),
            Some(ErrorCode::PathNotFound),
            None,
            Some(ErrorCode::InvalidPath),
        ]
    );
    assert_eq!(harness.backend.link_calls(), 2);
    Ok(())
}

#[tokio::test]
async fn empty_batch_skips_backend() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 10, true)?;
    let batch = harness
        .manager
        .create_directory_links::<&str>(&[], "/dest", &CancellationToken::new())
        .await?;
    assert!(batch.is_empty());
    assert_eq!(harness.backend.batch_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn destination_is_normalised_before_deriving_link_paths() -> Result<()> {
    let harness = fake_harness(CollisionPolicy::Skip, 10, true)?;
    let batch = harness
        .manager
        .create_directory_links(&["/src/./a/"], "/dest/sub/../links/", &CancellationToken::new())
        .await?;
    assert_linked_at(&batch[0], "/dest/links/a");
    Ok(())
}

#[tokio::test]
async fn metrics_track_batches_and_outcomes() -> Result<()> {
    let metrics = Metrics::new()?;
    let harness = fake_harness(CollisionPolicy::Skip, 2, true)?;
    let manager = harness.manager.with_metrics(metrics.clone());
    let cancel = CancellationToken::new();

    with_correlation("corr-test", async {
        manager
            .create_directory_links(&["/a/x", "/b/x"], "/dest", &cancel)
            .await
    })
    .await?;
    manager
        .create_directory_links(&["/a", "/b", "/c"], "/dest", &cancel)
        .await?;

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.links_succeeded, 1);
    assert_eq!(snapshot.links_failed, 4);
    assert_eq!(snapshot.batches_submitted, 1);
    assert_eq!(snapshot.batches_rejected, 1);
    assert_eq!(snapshot.privilege_denied, 0);
    Ok(())
}

//! Refresh gate, pipeline and publisher working together through the
//! application context.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ADMIN_PASSWORD, empty_sectors_workbook, outreach_workbook, test_app};
use outreach_dashboard::audit::{AuditEvent, AuditOutcome};
use outreach_dashboard::auth::AuthError;
use outreach_dashboard::ingest::IngestError;
use outreach_dashboard::refresh::{RefreshError, RefreshMode, RefreshPhase, RefreshRejection};
use outreach_dashboard::testing::{BlockingFetcher, FailingFetcher, StaticFetcher};
use secrecy::SecretString;

#[tokio::test]
async fn test_cooldown_rejects_then_allows() {
    let t = test_app(Arc::new(StaticFetcher::new(outreach_workbook())), RefreshMode::Blocking).await;
    let orchestrator = &t.context().orchestrator;

    let report = orchestrator.trigger("admin").await.unwrap();
    assert_eq!(report.snapshot_version, Some(1));

    t.clock.advance_secs(5);
    let err = orchestrator.trigger("admin").await.unwrap_err();
    assert_eq!(
        err,
        RefreshError::Rejected(RefreshRejection::Cooldown { remaining_secs: 5 })
    );

    t.clock.advance_secs(6);
    let report = orchestrator.trigger("admin").await.unwrap();
    assert_eq!(report.snapshot_version, Some(2));
}

#[tokio::test]
async fn test_simultaneous_triggers_single_flight() {
    let (fetcher, handle) = BlockingFetcher::new(outreach_workbook());
    let t = test_app(Arc::new(fetcher.clone()), RefreshMode::Blocking).await;
    let orchestrator = t.context().orchestrator.clone();

    let first = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.trigger("admin").await })
    };
    handle.wait_started().await;

    let second = orchestrator.trigger("admin").await.unwrap_err();
    assert_eq!(second, RefreshError::Rejected(RefreshRejection::AlreadyInFlight));
    assert_eq!(orchestrator.status().phase, RefreshPhase::Running);

    handle.release();
    let report = first.await.unwrap().unwrap();
    assert_eq!(report.phase, RefreshPhase::Done);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_many_concurrent_triggers_grant_exactly_one() {
    let (fetcher, handle) = BlockingFetcher::new(outreach_workbook());
    let t = test_app(Arc::new(fetcher), RefreshMode::Background).await;
    let orchestrator = t.context().orchestrator.clone();

    let attempts: Vec<_> = (0..16)
        .map(|_| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.trigger_background("admin") })
        })
        .collect();

    let mut granted = 0;
    let mut in_flight = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => granted += 1,
            Err(RefreshRejection::AlreadyInFlight) => in_flight += 1,
            Err(other) => panic!("unexpected rejection: {}", other),
        }
    }
    assert_eq!(granted, 1);
    assert_eq!(in_flight, 15);

    handle.wait_started().await;
    handle.release();
}

#[tokio::test]
async fn test_download_failure_keeps_snapshot_and_releases_gate() {
    let fetcher = StaticFetcher::new(outreach_workbook());
    let t = test_app(Arc::new(fetcher.clone()), RefreshMode::Blocking).await;
    let orchestrator = &t.context().orchestrator;
    let publisher = &t.context().publisher;

    orchestrator.trigger("admin").await.unwrap();
    let published = publisher.current();

    // An HTML sign-in page instead of the workbook.
    fetcher.set_bytes(b"<html>sign in</html>".to_vec());
    t.clock.advance_secs(11);
    let err = orchestrator.trigger("admin").await.unwrap_err();
    assert!(matches!(err, RefreshError::Failed(IngestError::Download(_))));

    assert!(Arc::ptr_eq(&published, &publisher.current()));
    let status = orchestrator.status();
    assert_eq!(status.phase, RefreshPhase::Failed);
    assert!(!status.gate.state.in_flight);

    fetcher.set_bytes(outreach_workbook());
    t.clock.advance_secs(11);
    let report = orchestrator.trigger("admin").await.unwrap();
    assert_eq!(report.snapshot_version, Some(2));
}

#[tokio::test]
async fn test_network_failure_scenario() {
    let fetcher = FailingFetcher::new("connection reset by peer");
    let t = test_app(Arc::new(fetcher.clone()), RefreshMode::Blocking).await;
    let orchestrator = &t.context().orchestrator;
    let before = t.context().publisher.current();

    let err = orchestrator.trigger("admin").await.unwrap_err();

    assert!(err.to_string().contains("connection reset by peer"));
    assert!(Arc::ptr_eq(&before, &t.context().publisher.current()));
    assert_eq!(before.version, 0);

    let entry = &t.context().audit.recent(1)[0];
    assert_eq!(entry.event, AuditEvent::Refresh);
    assert_eq!(entry.outcome, AuditOutcome::Failed);

    // Failed runs still start the cooldown.
    t.clock.advance_secs(3);
    assert!(matches!(
        orchestrator.trigger("admin").await.unwrap_err(),
        RefreshError::Rejected(RefreshRejection::Cooldown { remaining_secs: 7 })
    ));
}

#[tokio::test]
async fn test_invalid_dataset_is_never_published() {
    let fetcher = StaticFetcher::new(empty_sectors_workbook());
    let t = test_app(Arc::new(fetcher), RefreshMode::Blocking).await;

    let err = t.context().orchestrator.trigger("admin").await.unwrap_err();

    assert!(matches!(err, RefreshError::Failed(IngestError::Validation(_))));
    let current = t.context().publisher.current();
    assert_eq!(current.version, 0);
    assert!(!current.has_data());
}

#[tokio::test]
async fn test_readers_see_old_snapshot_until_publish() {
    let (fetcher, handle) = BlockingFetcher::new(outreach_workbook());
    let t = test_app(Arc::new(fetcher), RefreshMode::Background).await;
    let ctx = t.context();

    ctx.orchestrator.trigger_background("admin").unwrap();
    handle.wait_started().await;

    // Mid-run reads still get the seed, whole.
    let during = ctx.publisher.current();
    assert_eq!(during.version, 0);
    assert!(!during.has_data());

    handle.release();
    for _ in 0..200 {
        if ctx.publisher.current().version == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let after = ctx.publisher.current();
    assert_eq!(after.version, 1);
    assert_eq!(after.dataset.overview.total_phc_centers, 8);
    // The reader that held the seed still has it.
    assert_eq!(during.version, 0);
    assert!(!ctx.orchestrator.status().gate.state.in_flight);
}

#[tokio::test]
async fn test_wrong_password_three_times() {
    let t = test_app(Arc::new(StaticFetcher::new(outreach_workbook())), RefreshMode::Blocking).await;
    let auth = &t.context().auth;

    for _ in 0..3 {
        let err = auth
            .authenticate(SecretString::from("wrong".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    let failures = t
        .context()
        .audit
        .recent(10)
        .into_iter()
        .filter(|e| e.event == AuditEvent::Login && e.outcome == AuditOutcome::Failed)
        .count();
    assert_eq!(failures, 3);

    // No lockout: the right password still works.
    let session = auth
        .authenticate(SecretString::from(ADMIN_PASSWORD.to_string()))
        .await
        .unwrap();
    assert!(auth.validate(session.token()).await.is_ok());
}

#[tokio::test]
async fn test_session_expires_absolutely() {
    let t = test_app(Arc::new(StaticFetcher::new(outreach_workbook())), RefreshMode::Blocking).await;
    let auth = &t.context().auth;

    let session = auth
        .authenticate(SecretString::from(ADMIN_PASSWORD.to_string()))
        .await
        .unwrap();

    t.clock.advance_secs(29 * 60);
    assert!(auth.validate(session.token()).await.is_ok());

    t.clock.advance_secs(60);
    assert!(matches!(
        auth.validate(session.token()).await.unwrap_err(),
        AuthError::NotAuthenticated
    ));
}

#[tokio::test]
async fn test_published_snapshot_survives_restart() {
    let fetcher = Arc::new(StaticFetcher::new(outreach_workbook()));
    let t = test_app(fetcher.clone(), RefreshMode::Blocking).await;
    t.context().orchestrator.trigger("admin").await.unwrap();

    let config = common::config(&t.dir, RefreshMode::Blocking);
    let dir = t.dir;
    let restarted = common::test_app_with_config(fetcher, config, dir).await;

    let current = restarted.context().publisher.current();
    assert_eq!(current.version, 1);
    assert!(current.has_data());
}

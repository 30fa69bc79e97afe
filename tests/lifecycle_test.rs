//! Startup and shutdown behaviour of the lifecycle controller.

use std::sync::Arc;
use std::time::Duration;

use tracing::Span;

use loyalty::health::HealthReporter;
use loyalty::lifecycle::{App, LifecycleError, LifecycleState};
use loyalty::store::{ConfigRepository, InMemoryConfigRepository};

mod common;

#[tokio::test]
async fn test_idle_stop_is_clean() {
    let repo = Arc::new(InMemoryConfigRepository::new());
    let app = common::spawn_app(repo.clone()).await;

    // A keep-alive connection must not hold up shutdown once idle.
    let client = reqwest::Client::new();
    let ping = app.url("/ping");
    let res = client.get(&ping).send().await.unwrap();
    assert!(res.status().is_success());

    app.app.stop(Duration::from_secs(2)).await.unwrap();

    assert_eq!(app.app.state(), LifecycleState::Stopped);
    assert!(repo.is_closed());
    app.runner.await.unwrap().unwrap();

    // Listener is gone.
    assert!(client.get(&ping).send().await.is_err());
}

#[tokio::test]
async fn test_stop_with_slow_request_times_out_but_closes_store() {
    let inner = Arc::new(InMemoryConfigRepository::new());
    let slow = Arc::new(common::SlowRepository {
        inner: inner.clone(),
        delay: Duration::from_secs(3),
    });
    let app = common::spawn_app(slow).await;

    let url = app.url("/server-config");
    let in_flight = tokio::spawn(async move { reqwest::get(url).await });

    tokio::time::timeout(Duration::from_secs(2), async {
        while app.app.in_flight() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("request should be in flight");

    let err = app.app.stop(Duration::from_millis(200)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ShutdownTimeout { .. }));
    assert_eq!(app.app.state(), LifecycleState::Stopped);
    assert!(inner.is_closed());

    app.runner.await.unwrap().unwrap();
    in_flight.abort();
}

#[tokio::test]
async fn test_unreachable_store_never_binds() {
    let app = App::new(
        common::test_config(),
        Arc::new(common::UnreachableConnector),
        Span::none(),
    );

    let err = app.run().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Database(_)));
    assert_eq!(app.state(), LifecycleState::Stopped);
    assert!(app.local_addr().is_none());

    // stop after a fatal start is a no-op
    app.stop(Duration::from_millis(100)).await.unwrap();
}

#[tokio::test]
async fn test_stop_during_slow_startup_closes_store_before_returning() {
    let repo = Arc::new(InMemoryConfigRepository::new());
    let app = Arc::new(App::new(
        common::test_config(),
        Arc::new(common::SlowConnector {
            repository: repo.clone(),
            delay: Duration::from_millis(400),
        }),
        Span::none(),
    ));

    let runner = tokio::spawn({
        let app = Arc::clone(&app);
        async move { app.run().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = app.stop(Duration::from_millis(100)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ShutdownTimeout { .. }));
    assert_eq!(app.state(), LifecycleState::Stopped);
    assert!(repo.is_closed());
    assert!(app.local_addr().is_none());

    runner.await.unwrap().unwrap();
    assert!(app.local_addr().is_none());
}

#[tokio::test]
async fn test_second_stop_is_rejected_while_draining() {
    let inner = Arc::new(InMemoryConfigRepository::new());
    let slow = Arc::new(common::SlowRepository {
        inner,
        delay: Duration::from_millis(500),
    });
    let app = Arc::new(common::spawn_app(slow).await);

    let url = app.url("/server-config");
    let in_flight = tokio::spawn(async move { reqwest::get(url).await });
    while app.app.in_flight() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let first = tokio::spawn({
        let app = Arc::clone(&app);
        async move { app.app.stop(Duration::from_secs(5)).await }
    });
    tokio::time::timeout(Duration::from_secs(1), async {
        while app.app.state() != LifecycleState::ShuttingDown {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("first stop should begin draining");

    let err = app.app.stop(Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidState { operation: "stop", .. }));

    first.await.unwrap().unwrap();
    let res = in_flight.await.unwrap().unwrap();
    assert!(res.status().is_success());
}

#[tokio::test]
async fn test_health_check_after_store_closed() {
    let repo = Arc::new(InMemoryConfigRepository::new());
    let reporter = HealthReporter::new(repo.clone(), Duration::from_secs(1));
    assert!(reporter.check().await.store_reachable);

    repo.close().await;
    let report = reporter.check().await;
    assert!(report.alive);
    assert!(!report.store_reachable);
}

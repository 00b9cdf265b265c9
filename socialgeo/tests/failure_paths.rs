use socialgeo::tour::{self, seed};
use socialgeo::{Connector, Console, Credentials, DemoConfig, DemoError, MemoryEngine, Operation, Storage};

const NS: &str = "socialapp";
const DB: &str = "main";

fn memory_config() -> DemoConfig {
    let mut config = DemoConfig::default();
    config.connection.endpoint = "mem://".to_string();
    config.live.wait_for_ready = true;
    config.live.drain_ms = 0;
    config
}

#[tokio::test]
async fn unreachable_endpoint_fails_before_any_write() {
    let engine = MemoryEngine::new().unreachable();
    let err = tour::run(&engine, &memory_config(), &Console::capture()).await.unwrap_err();

    assert!(matches!(err, DemoError::Connection { ref endpoint, .. } if endpoint == "mem://"));
    assert!(engine.snapshot(NS, DB).is_none());
}

#[tokio::test]
async fn invalid_configuration_is_rejected_before_connecting() {
    let engine = MemoryEngine::new();
    let mut config = memory_config();
    config.geo.radius_m = 0.0;

    let err = tour::run(&engine, &config, &Console::capture()).await.unwrap_err();
    assert!(matches!(err, DemoError::Config { .. }));
    assert!(engine.snapshot(NS, DB).is_none());
}

#[tokio::test]
async fn wrong_credentials_stop_the_tour() {
    let engine = MemoryEngine::new().with_root(Credentials::new("root", "s3cret"));
    let err = tour::run(&engine, &memory_config(), &Console::capture()).await.unwrap_err();

    assert!(matches!(err, DemoError::Auth { .. }));
    assert!(engine.snapshot(NS, DB).is_none());
}

#[tokio::test]
async fn session_setup_failures_map_to_their_step() {
    let cases = [
        (Operation::SelectNamespace, "namespace/database selection failed"),
        (Operation::Authenticate, "token rejected"),
    ];
    for (operation, prefix) in cases {
        let engine = MemoryEngine::new().with_fault(operation);
        let err = tour::run(&engine, &memory_config(), &Console::capture()).await.unwrap_err();
        assert!(err.to_string().starts_with(prefix), "{operation}: {err}");
    }
}

#[tokio::test]
async fn failing_step_stops_every_later_write() {
    // (failing operation, persons, friendships, posts)
    let cases = [
        (Operation::CreatePerson, 0, 0, 0),
        (Operation::RelateFriends, 2, 0, 0),
        (Operation::CreatePost, 2, 1, 0),
        (Operation::FriendFeed, 2, 1, 1),
        (Operation::LikePost, 2, 1, 1),
    ];
    for (operation, persons, friendships, posts) in cases {
        let engine = MemoryEngine::new().with_fault(operation);
        let result = tour::run(&engine, &memory_config(), &Console::capture()).await;
        assert!(result.is_err(), "{operation} should fail the tour");

        let stored = engine.snapshot(NS, DB).unwrap_or_default();
        assert_eq!(stored.persons.len(), persons, "{operation}");
        assert_eq!(stored.friendships.len(), friendships, "{operation}");
        assert_eq!(stored.posts.len(), posts, "{operation}");
        assert!(stored.posts.iter().all(|post| post.likes == 0), "{operation}");
    }
}

#[tokio::test]
async fn like_failure_is_a_query_error() {
    let engine = MemoryEngine::new().with_fault(Operation::LikePost);
    let err = tour::run(&engine, &memory_config(), &Console::capture()).await.unwrap_err();
    assert!(matches!(err, DemoError::Query { .. }));
}

#[tokio::test]
async fn geo_failure_comes_after_the_like() {
    let engine = MemoryEngine::new().with_fault(Operation::PersonsNear);
    let err = tour::run(&engine, &memory_config(), &Console::capture()).await.unwrap_err();

    assert!(matches!(err, DemoError::Query { .. }));
    let stored = engine.snapshot(NS, DB).unwrap();
    assert_eq!(stored.posts[0].likes, 1);
}

#[tokio::test]
async fn live_failure_does_not_stop_the_tour() {
    let engine = MemoryEngine::new().with_fault(Operation::LivePosts);
    let console = Console::capture();
    let report = tour::run(&engine, &memory_config(), &console).await.unwrap();

    assert!(report.live.events.is_empty());
    assert!(report.live.error.is_some());
    assert_eq!(report.post.likes, 1);
    assert_eq!(report.nearby.len(), 2);
    assert!(console.captured().iter().any(|line| line.contains("Live query failed")));
}

#[tokio::test]
async fn cleanup_failure_is_fatal_by_default() {
    let engine = MemoryEngine::new().with_fault(Operation::Invalidate);
    let err = tour::run(&engine, &memory_config(), &Console::capture()).await.unwrap_err();

    assert!(matches!(err, DemoError::Cleanup { .. }));
    // everything before the cleanup was written
    let stored = engine.snapshot(NS, DB).unwrap();
    assert_eq!(stored.posts[0].likes, 1);
}

#[tokio::test]
async fn cleanup_failure_can_be_downgraded_to_a_warning() {
    let engine = MemoryEngine::new().with_fault(Operation::Invalidate);
    let mut config = memory_config();
    config.session.cleanup_failure_fatal = false;
    let console = Console::capture();

    let report = tour::run(&engine, &config, &console).await.unwrap();
    assert_eq!(report.post.likes, 1);
    assert!(console.captured().iter().any(|line| line.contains("Could not invalidate the session")));
}

#[tokio::test]
async fn helpers_require_stored_persons() {
    let engine = MemoryEngine::new();
    let session = tour::open_session(&engine, &memory_config()).await.unwrap();
    let [author, friend] = seed::persons();

    let err = tour::befriend(&session, &author, &friend).await.unwrap_err();
    assert!(matches!(err, DemoError::Query { .. }));

    let err = tour::publish(&session, &author, seed::POST_CONTENT).await.unwrap_err();
    assert!(matches!(err, DemoError::Write { ref table, .. } if table == "posts"));

    assert!(engine.snapshot(NS, DB).is_none());
}

#[tokio::test]
async fn invalid_records_never_reach_storage() {
    let engine = MemoryEngine::new();
    let session = tour::open_session(&engine, &memory_config()).await.unwrap();
    let console = Console::capture();

    let [mut author, _] = seed::persons();
    author.email = "not-an-email".to_string();
    let err = tour::create_person(&session, author, &console).await.unwrap_err();
    assert!(matches!(err, DemoError::Validation(_)));

    let [author, _] = seed::persons();
    let author = tour::create_person(&session, author, &console).await.unwrap();
    let err = tour::publish(&session, &author, "   ").await.unwrap_err();
    assert!(matches!(err, DemoError::Validation(_)));

    let stored = engine.snapshot(NS, DB).unwrap();
    assert_eq!(stored.persons.len(), 1);
    assert!(stored.posts.is_empty());
}

#[tokio::test]
async fn memory_engine_refuses_network_endpoints() {
    let engine = MemoryEngine::new();
    assert!(matches!(
        engine.connect("ws://localhost:8000").await,
        Err(DemoError::Connection { .. })
    ));
    let session = engine.connect("mem://").await.unwrap();
    // no namespace selected, no token
    assert!(session.invalidate().await.is_ok());
}

use socialgeo::tour::{self, seed};
use socialgeo::{Console, DemoConfig, LiveAction, MemoryEngine};

fn memory_config() -> DemoConfig {
    let mut config = DemoConfig::default();
    config.connection.endpoint = "mem://".to_string();
    config.live.wait_for_ready = true;
    config.live.drain_ms = 50;
    config
}

#[tokio::test]
async fn full_tour_on_the_memory_engine() {
    let engine = MemoryEngine::new();
    let config = memory_config();
    let console = Console::capture();

    let report = tour::run(&engine, &config, &console).await.unwrap();

    // two distinct persons, related once
    let ids: Vec<_> = report.persons.iter().map(|person| person.id.clone().unwrap()).collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(report.friendship.from, ids[0]);
    assert_eq!(report.friendship.to, ids[1]);

    // the post belongs to the first person and was liked exactly once
    assert_eq!(report.post.author, ids[0]);
    assert_eq!(report.post.content, seed::POST_CONTENT);
    assert_eq!(report.post.likes, 1);

    // the second person sees the first person's post through the edge
    let feed = report.feed.as_ref().unwrap();
    assert_eq!(feed.person, ids[1]);
    assert_eq!(feed.friends, vec![ids[0].clone()]);
    assert_eq!(feed.friend_posts.len(), 1);
    assert_eq!(feed.friend_posts[0].content, seed::POST_CONTENT);
    assert_eq!(feed.friend_locations, vec![seed::BOUAKE]);
    assert_eq!(feed.distance_to_origin_m, Some(0.0));

    // Paris first, at zero distance, then Bouaké
    let names: Vec<_> = report.nearby.iter().map(|entry| entry.person.full_name()).collect();
    assert_eq!(names, ["Tilonon Tilonon", "Emmanuel Manou"]);
    assert_eq!(report.nearby[0].distance_m, 0.0);
    let bouake_km = report.nearby[1].distance_m / 1000.0;
    assert!((2_900.0..3_100.0).contains(&bouake_km), "unexpected distance {bouake_km} km");

    // the like reached the subscription, which was registered before the write
    assert!(report.live.error.is_none());
    let update = report
        .live
        .events
        .iter()
        .find(|event| event.action == LiveAction::Update)
        .unwrap();
    assert_eq!(update.post.likes, 1);
    assert_eq!(engine.live_subscribers(), 0);

    let stored = engine.snapshot("socialapp", "main").unwrap();
    assert_eq!(stored.persons.len(), 2);
    assert_eq!(stored.posts.len(), 1);
    assert_eq!(stored.posts[0].likes, 1);
    assert_eq!(stored.friendships.len(), 1);
}

#[tokio::test]
async fn progress_lines_follow_the_tour_order() {
    let engine = MemoryEngine::new();
    let console = Console::capture();
    tour::run(&engine, &memory_config(), &console).await.unwrap();

    let lines = console.captured();
    let position = |needle: &str| {
        lines
            .iter()
            .position(|line| line.contains(needle))
            .unwrap_or_else(|| panic!("missing line containing {needle:?} in {lines:#?}"))
    };

    let steps = [
        "Creating users...",
        "Creating friendships...",
        "Creating posts...",
        "Looking up friends' posts...",
        "Real-time simulation...",
        "Geospatial search...",
        "Demo complete!",
    ];
    let positions: Vec<_> = steps.iter().map(|step| position(step)).collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{positions:?}");

    assert!(lines.iter().any(|line| line.contains("1. Tilonon Tilonon (0.0 km)")));
    assert!(lines.iter().any(|line| line.contains("Like added in real time (1 like(s))")));
}

#[tokio::test]
async fn each_run_writes_new_records() {
    let engine = MemoryEngine::new();
    let config = memory_config();

    let first = tour::run(&engine, &config, &Console::capture()).await.unwrap();
    let second = tour::run(&engine, &config, &Console::capture()).await.unwrap();

    assert_ne!(first.post.id, second.post.id);
    let stored = engine.snapshot("socialapp", "main").unwrap();
    assert_eq!(stored.persons.len(), 4);
    assert_eq!(stored.posts.len(), 2);
    assert_eq!(stored.friendships.len(), 2);
    // both likes landed on their own post
    assert!(stored.posts.iter().all(|post| post.likes == 1));
}

#[tokio::test]
async fn radius_excludes_distant_persons() {
    let engine = MemoryEngine::new();
    let mut config = memory_config();
    config.geo.radius_m = 1_000.0;

    let report = tour::run(&engine, &config, &Console::capture()).await.unwrap();
    assert_eq!(report.nearby.len(), 1);
    assert_eq!(report.nearby[0].person.name, "Tilonon");
}

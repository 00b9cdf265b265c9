//! The social graph tour.
//!
//! A fixed, strictly sequential walk through the storage contract:
//!
//! 1. Connect, select namespace/database, sign in, apply the token
//! 2. Create two persons with their location
//! 3. Relate them with a `friends` edge
//! 4. Publish a post by the first person
//! 5. Read the friends' posts and locations of the second person
//! 6. Subscribe to the author's posts in the background and like the post
//! 7. Rank every person by distance to the reference point
//!
//! The first failing step ends the tour with its error; nothing already
//! written is rolled back. The background subscription is the exception:
//! its failures are logged and kept in the report.

pub mod live;
pub mod seed;

use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::DemoConfig;
use crate::errors::{DemoError, Result};
use crate::id::RecordId;
use crate::output::Console;
use crate::output::theme::ICONS;
use crate::storage::{Connector, Storage};
use crate::types::{FriendFeed, Friendship, NearbyPerson, POSTS_TABLE, Person, Post};
use crate::validators::{validate_person, validate_post};

pub use live::{LiveSubscription, LiveSummary};

/// Everything the tour created and read.
#[derive(Debug, Clone, Serialize)]
pub struct TourReport {
    pub persons: Vec<Person>,
    pub friendship: Friendship,
    /// The post as returned by the like increment.
    pub post: Post,
    pub feed: Option<FriendFeed>,
    pub nearby: Vec<NearbyPerson>,
    pub live: LiveSummary,
}

/// Runs the whole tour against the storage service reached through `connector`.
pub async fn run<C: Connector>(connector: &C, config: &DemoConfig, console: &Console) -> Result<TourReport> {
    config.validate()?;
    let session = open_session(connector, config).await?;

    console.step(ICONS.launch, "Creating users...");
    let [first, second] = seed::persons();
    let author = create_person(&session, first, console).await?;
    let friend = create_person(&session, second, console).await?;

    console.step(ICONS.friendship, "Creating friendships...");
    let friendship = befriend(&session, &author, &friend).await?;
    console.success(&format!("Friendship created: {} -> {}", friendship.from, friendship.to));

    console.step(ICONS.post, "Creating posts...");
    let post = publish(&session, &author, seed::POST_CONTENT).await?;
    console.success(&format!("Post created: {}", post.content));

    console.step(ICONS.search, "Looking up friends' posts...");
    let friend_id = record_id(&friend)?;
    let reference = config.reference_point();
    let feed = session.friend_feed(&friend_id, reference).await?;
    report_feed(feed.as_ref(), console);

    console.step(ICONS.realtime, "Real-time simulation...");
    let author_id = record_id(&author)?;
    let mut subscription = LiveSubscription::spawn(session.clone(), author_id, console.clone());
    if config.live.wait_for_ready {
        subscription.ready().await;
    }
    let post_id = post
        .id
        .clone()
        .ok_or_else(|| DemoError::query("the created post has no record id"))?;
    let post = session.like_post(&post_id).await?;
    console.success(&format!("Like added in real time ({} like(s))", post.likes));

    console.step(ICONS.globe, "Geospatial search...");
    let nearby = session.persons_near(reference, config.geo.radius_m).await?;
    console.success(&format!(
        "Users by distance from ({}, {}):",
        reference.longitude, reference.latitude
    ));
    for (rank, entry) in nearby.iter().enumerate() {
        console.info(&format!(
            "{}. {} ({:.1} km)",
            rank + 1,
            entry.person.full_name(),
            entry.distance_m / 1000.0
        ));
    }

    if config.live.drain_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.live.drain_ms)).await;
    }
    let live = subscription.shutdown().await;
    debug!("live subscription stopped after {} event(s)", live.events.len());

    close_session(&session, config, console).await?;
    console.step(ICONS.done, "Demo complete!");

    Ok(TourReport {
        persons: vec![author, friend],
        friendship,
        post,
        feed,
        nearby,
        live,
    })
}

/// Connect, select namespace/database, sign in and apply the token.
pub async fn open_session<C: Connector>(connector: &C, config: &DemoConfig) -> Result<C::Session> {
    let connection = &config.connection;
    info!("connecting to {}", connection.endpoint);
    let session = connector.connect(&connection.endpoint).await?;
    session.use_ns_db(&connection.namespace, &connection.database).await?;
    let token = session.signin(&config.credentials()).await?;
    session.authenticate(token).await?;
    info!(
        "signed in as {} on {}/{}",
        config.credentials.username, connection.namespace, connection.database
    );
    Ok(session)
}

/// Validates and writes one person.
pub async fn create_person<S: Storage>(session: &S, person: Person, console: &Console) -> Result<Person> {
    validate_person(&person)?;
    let created = session.create_person(person).await?;
    let id = record_id(&created)?;
    console.success(&format!(
        "User created: {} <{}> as {id}",
        created.full_name(),
        created.email
    ));
    Ok(created)
}

/// Relates two stored persons; both must carry a record id.
pub async fn befriend<S: Storage>(session: &S, from: &Person, to: &Person) -> Result<Friendship> {
    let from = record_id(from)?;
    let to = record_id(to)?;
    session.relate_friends(&from, &to).await
}

/// Writes a post by `author`, who must carry a record id.
pub async fn publish<S: Storage>(session: &S, author: &Person, content: &str) -> Result<Post> {
    let author = author
        .id
        .clone()
        .ok_or_else(|| DemoError::write(POSTS_TABLE, format!("author {} has no record id", author.full_name())))?;
    let post = Post::new(author, content);
    validate_post(&post)?;
    session.create_post(post).await
}

async fn close_session<S: Storage>(session: &S, config: &DemoConfig, console: &Console) -> Result<()> {
    match session.invalidate().await {
        Ok(()) => {
            debug!("session invalidated");
            Ok(())
        }
        Err(err) if config.session.cleanup_failure_fatal => Err(err),
        Err(err) => {
            warn!("{err}");
            console.warning(&format!("Could not invalidate the session: {err}"));
            Ok(())
        }
    }
}

fn record_id(person: &Person) -> Result<RecordId> {
    person
        .id
        .clone()
        .ok_or_else(|| DemoError::query(format!("person {} has no record id", person.full_name())))
}

fn report_feed(feed: Option<&FriendFeed>, console: &Console) {
    let Some(feed) = feed else {
        console.warning("The queried person was not found");
        return;
    };
    let distance = feed
        .distance_to_origin_m
        .map(|meters| format!("{:.1} km", meters / 1000.0))
        .unwrap_or_else(|| "unknown".to_string());
    console.success(&format!(
        "Query result: {} friend(s), {} friend post(s), distance to reference {distance}",
        feed.friends.len(),
        feed.friend_posts.len()
    ));
    for post in &feed.friend_posts {
        console.info(&format!("\"{}\" by {} ({} like(s))", post.content, post.author, post.likes));
    }
    for location in &feed.friend_locations {
        console.info(&format!(
            "friend at ({}, {})",
            location.longitude, location.latitude
        ));
    }
}

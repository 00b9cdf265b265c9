//! Background live-query subscription.
//!
//! The subscription runs on its own task with a shutdown channel and a join
//! handle, so the tour decides when to stop listening. Dropping the handle
//! signals shutdown and aborts the task.

use futures::StreamExt;
use log::{debug, warn};
use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::id::RecordId;
use crate::output::Console;
use crate::storage::Storage;
use crate::types::PostEvent;

/// What the subscription saw before it was stopped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveSummary {
    pub events: Vec<PostEvent>,
    /// Set when the live query could not be started or broke off.
    pub error: Option<String>,
}

pub struct LiveSubscription {
    shutdown: watch::Sender<bool>,
    ready: Option<oneshot::Receiver<()>>,
    handle: Option<JoinHandle<LiveSummary>>,
}

impl LiveSubscription {
    /// Starts listening for changes to posts written by `author`.
    ///
    /// Errors are logged and recorded in the summary; they never reach the caller.
    pub fn spawn<S: Storage>(storage: S, author: RecordId, console: Console) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut summary = LiveSummary::default();
            let subscribed = storage.live_posts(&author).await;
            let _ = ready_tx.send(());

            let mut stream = match subscribed {
                Ok(stream) => {
                    debug!("live query on posts by {author} registered");
                    stream
                }
                Err(err) => {
                    warn!("live query failed: {err}");
                    console.warning(&format!("Live query failed: {err}"));
                    summary.error = Some(err.to_string());
                    return summary;
                }
            };

            loop {
                tokio::select! {
                    biased;
                    next = stream.next() => match next {
                        Some(Ok(event)) => {
                            console.event(&format!(
                                "Live {}: \"{}\" ({} like(s))",
                                event.action, event.post.content, event.post.likes
                            ));
                            summary.events.push(event);
                        }
                        Some(Err(err)) => {
                            warn!("live query stream failed: {err}");
                            summary.error = Some(err.to_string());
                            break;
                        }
                        None => break,
                    },
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            summary
        });

        Self {
            shutdown: shutdown_tx,
            ready: Some(ready_rx),
            handle: Some(handle),
        }
    }

    /// Resolves once the subscribe call has settled, successfully or not.
    pub async fn ready(&mut self) {
        if let Some(ready) = self.ready.take() {
            let _ = ready.await;
        }
    }

    /// Stops listening and returns what was received.
    pub async fn shutdown(mut self) -> LiveSummary {
        let _ = self.shutdown.send(true);
        let Some(handle) = self.handle.take() else {
            return LiveSummary::default();
        };
        match handle.await {
            Ok(summary) => summary,
            Err(err) => LiveSummary {
                events: Vec::new(),
                error: Some(format!("live task ended abnormally: {err}")),
            },
        }
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::storage::memory::{MemoryEngine, MemorySession};
    use crate::storage::{Connector, Operation};
    use crate::types::{Credentials, LiveAction, Person, Post};

    async fn session(engine: &MemoryEngine) -> MemorySession {
        let session = engine.connect("mem://").await.unwrap();
        session.use_ns_db("ns", "db").await.unwrap();
        let token = session.signin(&Credentials::new("root", "root")).await.unwrap();
        session.authenticate(token).await.unwrap();
        session
    }

    #[tokio::test]
    async fn collects_events_until_shutdown() {
        let engine = MemoryEngine::new();
        let session = session(&engine).await;
        let author = session
            .create_person(Person::new("Ada", "L", "ada@example.com", GeoPoint::new(0.0, 0.0)))
            .await
            .unwrap()
            .id
            .unwrap();

        let console = Console::capture();
        let mut live = LiveSubscription::spawn(session.clone(), author.clone(), console.clone());
        live.ready().await;

        let post = session.create_post(Post::new(author, "hi")).await.unwrap();
        session.like_post(post.id.as_ref().unwrap()).await.unwrap();

        let summary = live.shutdown().await;
        assert!(summary.error.is_none());
        let actions: Vec<_> = summary.events.iter().map(|event| event.action).collect();
        assert_eq!(actions, [LiveAction::Create, LiveAction::Update]);
        assert!(console.captured().iter().any(|line| line.contains("Live update")));
        assert_eq!(engine.live_subscribers(), 0);
    }

    #[tokio::test]
    async fn subscribe_failure_is_recorded_not_raised() {
        let engine = MemoryEngine::new().with_fault(Operation::LivePosts);
        let session = session(&engine).await;
        let console = Console::capture();
        let mut live = LiveSubscription::spawn(session, RecordId::new("persons", "a"), console.clone());
        live.ready().await;
        let summary = live.shutdown().await;
        assert!(summary.events.is_empty());
        assert!(summary.error.unwrap().contains("live posts"));
        assert!(console.captured().iter().any(|line| line.starts_with("⚠ Live query failed")));
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_the_task() {
        let engine = MemoryEngine::new();
        let session = session(&engine).await;
        let mut live = LiveSubscription::spawn(session, RecordId::new("persons", "a"), Console::capture());
        live.ready().await;
        assert_eq!(engine.live_subscribers(), 1);
        drop(live);
        // the aborted task releases its stream once the runtime gets to it
        for _ in 0..16 {
            if engine.live_subscribers() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(engine.live_subscribers(), 0);
    }
}

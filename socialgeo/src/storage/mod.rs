//! Storage contract used by the tour.
//!
//! The database engine is an external collaborator. [`Connector`] opens a
//! session and [`Storage`] exposes the handful of calls the tour makes, one
//! typed method per query shape. Two backends implement it:
//!
//! - [`surreal::SurrealConnector`] talks to a SurrealDB server over the
//!   official client (`ws://`, `wss://`, `http://`, `https://`).
//! - [`memory::MemoryEngine`] is an in-process engine (`mem://`) with the same
//!   observable semantics, used by the test-suite and for offline runs.

pub mod memory;
pub mod queries;
pub mod surreal;

use std::fmt;
use std::future::Future;

use futures::stream::BoxStream;

use crate::errors::Result;
use crate::geo::GeoPoint;
use crate::id::RecordId;
use crate::types::{Credentials, FriendFeed, Friendship, NearbyPerson, Person, Post, PostEvent, Token};

/// Stream of notifications produced by a live query.
pub type LiveStream = BoxStream<'static, Result<PostEvent>>;

/// Every call of the storage contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    SelectNamespace,
    SignIn,
    Authenticate,
    CreatePerson,
    CreatePost,
    RelateFriends,
    FriendFeed,
    LivePosts,
    LikePost,
    PersonsNear,
    Invalidate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::Connect => "connect",
            Operation::SelectNamespace => "select namespace",
            Operation::SignIn => "sign in",
            Operation::Authenticate => "authenticate",
            Operation::CreatePerson => "create person",
            Operation::CreatePost => "create post",
            Operation::RelateFriends => "relate friends",
            Operation::FriendFeed => "friend feed",
            Operation::LivePosts => "live posts",
            Operation::LikePost => "like post",
            Operation::PersonsNear => "persons near",
            Operation::Invalidate => "invalidate",
        };
        f.write_str(label)
    }
}

/// Opens sessions against a storage service.
pub trait Connector {
    type Session: Storage;

    fn connect(&self, endpoint: &str) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// An open session.
///
/// Sessions are cheap to clone; clones share the underlying connection, which
/// is how the live subscription task gets its own handle.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Scopes every following call to `namespace`/`database`.
    fn use_ns_db(&self, namespace: &str, database: &str) -> impl Future<Output = Result<()>> + Send;

    /// Signs in and returns the session token.
    fn signin(&self, credentials: &Credentials) -> impl Future<Output = Result<Token>> + Send;

    fn authenticate(&self, token: Token) -> impl Future<Output = Result<()>> + Send;

    /// Creates a record in `persons` and returns it with its identifier.
    fn create_person(&self, person: Person) -> impl Future<Output = Result<Person>> + Send;

    /// Creates a record in `posts`; the author must exist.
    fn create_post(&self, post: Post) -> impl Future<Output = Result<Post>> + Send;

    /// Creates the directed edge `from -> friends -> to`.
    fn relate_friends(&self, from: &RecordId, to: &RecordId) -> impl Future<Output = Result<Friendship>> + Send;

    /// Posts and locations of the person's friends, plus the person's
    /// distance to `origin`. `None` when the person does not exist.
    fn friend_feed(&self, person: &RecordId, origin: GeoPoint)
    -> impl Future<Output = Result<Option<FriendFeed>>> + Send;

    /// Subscribes to changes of posts written by `author`.
    fn live_posts(&self, author: &RecordId) -> impl Future<Output = Result<LiveStream>> + Send;

    /// `likes = likes + 1`, returning the updated post.
    fn like_post(&self, post: &RecordId) -> impl Future<Output = Result<Post>> + Send;

    /// Persons closer than `radius_m` to `origin`, nearest first.
    fn persons_near(&self, origin: GeoPoint, radius_m: f64)
    -> impl Future<Output = Result<Vec<NearbyPerson>>> + Send;

    fn invalidate(&self) -> impl Future<Output = Result<()>> + Send;
}

//! In-process storage engine for `mem://` endpoints.
//!
//! Keeps one dataset per namespace/database pair and mirrors what the tour
//! observes from a SurrealDB server: generated record keys, referential checks
//! on post authors and friendship endpoints, atomic like increments, live
//! notifications and haversine distances. Any contract call can be made to
//! fail, which is how the failure paths of the tour are tested.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use log::debug;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

use super::{Connector, LiveStream, Operation, Storage};
use crate::errors::{DemoError, Result};
use crate::geo::GeoPoint;
use crate::id::{RecordId, generate_record_key};
use crate::types::{
    Credentials, FRIENDS_TABLE, FriendFeed, Friendship, LiveAction, NearbyPerson, POSTS_TABLE, PERSONS_TABLE,
    Person, Post, PostEvent, Token,
};

/// Shared in-process datastore. Clones refer to the same data.
#[derive(Clone)]
pub struct MemoryEngine {
    state: Arc<Mutex<EngineState>>,
}

struct EngineState {
    root: Credentials,
    reachable: bool,
    faults: HashSet<Operation>,
    issued_tokens: HashSet<String>,
    datasets: HashMap<Scope, Dataset>,
    subscribers: Vec<Subscriber>,
}

type Scope = (String, String);

#[derive(Default)]
struct Dataset {
    persons: BTreeMap<RecordId, Person>,
    posts: BTreeMap<RecordId, Post>,
    friendships: Vec<Friendship>,
}

struct Subscriber {
    scope: Scope,
    author: RecordId,
    sender: mpsc::UnboundedSender<PostEvent>,
}

/// Copy of one namespace/database, for assertions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSnapshot {
    pub persons: Vec<Person>,
    pub posts: Vec<Post>,
    pub friendships: Vec<Friendship>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// Reachable engine accepting `root`/`root`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState {
                root: Credentials::new("root", "root"),
                reachable: true,
                faults: HashSet::new(),
                issued_tokens: HashSet::new(),
                datasets: HashMap::new(),
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn with_root(self, credentials: Credentials) -> Self {
        self.lock().root = credentials;
        self
    }

    /// Every connection attempt fails, as with an endpoint nobody listens on.
    pub fn unreachable(self) -> Self {
        self.lock().reachable = false;
        self
    }

    /// Makes `operation` fail on every session of this engine.
    pub fn with_fault(self, operation: Operation) -> Self {
        self.fail_on(operation);
        self
    }

    pub fn fail_on(&self, operation: Operation) {
        self.lock().faults.insert(operation);
    }

    pub fn snapshot(&self, namespace: &str, database: &str) -> Option<DatasetSnapshot> {
        let state = self.lock();
        let dataset = state.datasets.get(&(namespace.to_string(), database.to_string()))?;
        Some(DatasetSnapshot {
            persons: dataset.persons.values().cloned().collect(),
            posts: dataset.posts.values().cloned().collect(),
            friendships: dataset.friendships.clone(),
        })
    }

    /// Number of live subscriptions whose receiver is still alive.
    pub fn live_subscribers(&self) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|subscriber| !subscriber.sender.is_closed());
        state.subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_fault(&self, operation: Operation) -> Result<()> {
        if self.lock().faults.contains(&operation) {
            debug!("memory engine: injected failure on {operation}");
            return Err(operation_error(operation, format!("injected failure on {operation}")));
        }
        Ok(())
    }
}

/// Error of the kind a failing `operation` reports.
fn operation_error(operation: Operation, message: impl ToString) -> DemoError {
    match operation {
        Operation::Connect => DemoError::connection("mem://", message),
        Operation::SelectNamespace => DemoError::usage(message),
        Operation::SignIn => DemoError::auth(message),
        Operation::Authenticate => DemoError::token(message),
        Operation::CreatePerson => DemoError::write(PERSONS_TABLE, message),
        Operation::CreatePost => DemoError::write(POSTS_TABLE, message),
        Operation::Invalidate => DemoError::cleanup(message),
        Operation::RelateFriends
        | Operation::FriendFeed
        | Operation::LivePosts
        | Operation::LikePost
        | Operation::PersonsNear => DemoError::query(message),
    }
}

impl Connector for MemoryEngine {
    type Session = MemorySession;

    async fn connect(&self, endpoint: &str) -> Result<MemorySession> {
        self.check_fault(Operation::Connect)?;
        let scheme_ok = Url::parse(endpoint).map(|url| url.scheme() == "mem").unwrap_or(false);
        if !scheme_ok {
            return Err(DemoError::connection(endpoint, "the memory engine only serves mem:// endpoints"));
        }
        if !self.lock().reachable {
            return Err(DemoError::connection(endpoint, "connection refused"));
        }
        Ok(MemorySession {
            engine: self.clone(),
            session: Arc::new(Mutex::new(SessionState::default())),
        })
    }
}

/// Session on a [`MemoryEngine`]. Clones share the session state.
#[derive(Clone)]
pub struct MemorySession {
    engine: MemoryEngine,
    session: Arc<Mutex<SessionState>>,
}

#[derive(Default)]
struct SessionState {
    scope: Option<Scope>,
    token: Option<String>,
}

impl MemorySession {
    fn session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scope of a data operation; fails unless a namespace is selected and the session is authenticated.
    fn require(&self, operation: Operation) -> Result<Scope> {
        self.engine.check_fault(operation)?;
        let session = self.session();
        let Some(scope) = session.scope.clone() else {
            return Err(operation_error(operation, "no namespace/database selected"));
        };
        let authenticated = session
            .token
            .as_ref()
            .is_some_and(|token| self.engine.lock().issued_tokens.contains(token));
        if !authenticated {
            return Err(operation_error(operation, "session is not authenticated"));
        }
        Ok(scope)
    }

    fn with_dataset<T>(&self, scope: &Scope, f: impl FnOnce(&mut Dataset, &mut Vec<Subscriber>) -> T) -> T {
        let mut state = self.engine.lock();
        let EngineState {
            datasets, subscribers, ..
        } = &mut *state;
        let dataset = datasets.entry(scope.clone()).or_default();
        f(dataset, subscribers)
    }

    /// Read-only access; `None` when nothing was ever written to `scope`.
    fn read_dataset<T>(&self, scope: &Scope, f: impl FnOnce(&Dataset) -> T) -> Option<T> {
        self.engine.lock().datasets.get(scope).map(f)
    }
}

fn assign_id(requested: Option<&RecordId>, table: &str, taken: impl Fn(&RecordId) -> bool) -> Result<RecordId> {
    match requested {
        Some(id) if id.table() != table => Err(DemoError::write(
            table,
            format!("record id {id} does not belong to table `{table}`"),
        )),
        Some(id) if taken(id) => Err(DemoError::write(table, format!("record {id} already exists"))),
        Some(id) => Ok(id.clone()),
        None => loop {
            let id = RecordId::new(table, generate_record_key());
            if !taken(&id) {
                break Ok(id);
            }
        },
    }
}

fn notify(subscribers: &mut Vec<Subscriber>, scope: &Scope, action: LiveAction, post: &Post) {
    subscribers.retain(|subscriber| !subscriber.sender.is_closed());
    for subscriber in subscribers.iter() {
        if &subscriber.scope == scope && subscriber.author == post.author {
            let _ = subscriber.sender.send(PostEvent {
                action,
                post: post.clone(),
            });
        }
    }
}

fn friends_of(dataset: &Dataset, person: &RecordId) -> Vec<RecordId> {
    let mut friends: Vec<RecordId> = Vec::new();
    for edge in &dataset.friendships {
        let other = if &edge.from == person {
            &edge.to
        } else if &edge.to == person {
            &edge.from
        } else {
            continue;
        };
        if !friends.contains(other) {
            friends.push(other.clone());
        }
    }
    friends
}

impl Storage for MemorySession {
    async fn use_ns_db(&self, namespace: &str, database: &str) -> Result<()> {
        self.engine.check_fault(Operation::SelectNamespace)?;
        if namespace.trim().is_empty() || database.trim().is_empty() {
            return Err(DemoError::usage("namespace and database must not be empty"));
        }
        self.session().scope = Some((namespace.to_string(), database.to_string()));
        Ok(())
    }

    async fn signin(&self, credentials: &Credentials) -> Result<Token> {
        self.engine.check_fault(Operation::SignIn)?;
        let mut state = self.engine.lock();
        if state.root != *credentials {
            return Err(DemoError::auth(format!(
                "there was a problem with authentication for user `{}`",
                credentials.username
            )));
        }
        let token = format!("mem.{}", generate_record_key());
        state.issued_tokens.insert(token.clone());
        drop(state);
        self.session().token = Some(token.clone());
        Ok(Token::new(token))
    }

    async fn authenticate(&self, token: Token) -> Result<()> {
        self.engine.check_fault(Operation::Authenticate)?;
        let raw = token.into_inner();
        if !self.engine.lock().issued_tokens.contains(&raw) {
            return Err(DemoError::token("the token was not issued by this engine"));
        }
        self.session().token = Some(raw);
        Ok(())
    }

    async fn create_person(&self, mut person: Person) -> Result<Person> {
        let scope = self.require(Operation::CreatePerson)?;
        self.with_dataset(&scope, |dataset, _| {
            let id = assign_id(person.id.as_ref(), PERSONS_TABLE, |id| dataset.persons.contains_key(id))?;
            person.id = Some(id.clone());
            dataset.persons.insert(id, person.clone());
            Ok(person)
        })
    }

    async fn create_post(&self, mut post: Post) -> Result<Post> {
        let scope = self.require(Operation::CreatePost)?;
        self.with_dataset(&scope, |dataset, subscribers| {
            if !dataset.persons.contains_key(&post.author) {
                return Err(DemoError::write(
                    POSTS_TABLE,
                    format!("author {} does not exist", post.author),
                ));
            }
            let id = assign_id(post.id.as_ref(), POSTS_TABLE, |id| dataset.posts.contains_key(id))?;
            post.id = Some(id.clone());
            dataset.posts.insert(id, post.clone());
            notify(subscribers, &scope, LiveAction::Create, &post);
            Ok(post)
        })
    }

    async fn relate_friends(&self, from: &RecordId, to: &RecordId) -> Result<Friendship> {
        let scope = self.require(Operation::RelateFriends)?;
        let created_at: DateTime<Utc> = Utc::now();
        self.with_dataset(&scope, |dataset, _| {
            for endpoint in [from, to] {
                if !dataset.persons.contains_key(endpoint) {
                    return Err(DemoError::query(format!("person {endpoint} does not exist")));
                }
            }
            let edge = Friendship {
                id: RecordId::new(FRIENDS_TABLE, generate_record_key()),
                from: from.clone(),
                to: to.clone(),
                created_at,
            };
            dataset.friendships.push(edge.clone());
            Ok(edge)
        })
    }

    async fn friend_feed(&self, person: &RecordId, origin: GeoPoint) -> Result<Option<FriendFeed>> {
        let scope = self.require(Operation::FriendFeed)?;
        Ok(self.read_dataset(&scope, |dataset| {
            let subject = dataset.persons.get(person)?;
            let friends = friends_of(dataset, person);
            let friend_posts = dataset
                .posts
                .values()
                .filter(|post| friends.contains(&post.author))
                .cloned()
                .collect();
            let friend_locations = friends
                .iter()
                .filter_map(|friend| dataset.persons.get(friend))
                .map(|friend| friend.location)
                .collect();
            Some(FriendFeed {
                person: person.clone(),
                friends,
                friend_posts,
                friend_locations,
                distance_to_origin_m: Some(subject.location.distance_to(&origin)),
            })
        })
        .flatten())
    }

    async fn live_posts(&self, author: &RecordId) -> Result<LiveStream> {
        let scope = self.require(Operation::LivePosts)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        self.engine.lock().subscribers.push(Subscriber {
            scope,
            author: author.clone(),
            sender,
        });
        Ok(UnboundedReceiverStream::new(receiver).map(Ok).boxed())
    }

    async fn like_post(&self, post: &RecordId) -> Result<Post> {
        let scope = self.require(Operation::LikePost)?;
        self.with_dataset(&scope, |dataset, subscribers| {
            let stored = dataset
                .posts
                .get_mut(post)
                .ok_or_else(|| DemoError::query(format!("post {post} not found")))?;
            stored.likes += 1;
            let updated = stored.clone();
            notify(subscribers, &scope, LiveAction::Update, &updated);
            Ok(updated)
        })
    }

    async fn persons_near(&self, origin: GeoPoint, radius_m: f64) -> Result<Vec<NearbyPerson>> {
        let scope = self.require(Operation::PersonsNear)?;
        let nearby = self.read_dataset(&scope, |dataset| {
            let mut nearby: Vec<NearbyPerson> = dataset
                .persons
                .values()
                .map(|person| NearbyPerson {
                    distance_m: person.location.distance_to(&origin),
                    person: person.clone(),
                })
                .filter(|candidate| candidate.distance_m < radius_m)
                .collect();
            nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
            nearby
        });
        Ok(nearby.unwrap_or_default())
    }

    async fn invalidate(&self) -> Result<()> {
        self.engine.check_fault(Operation::Invalidate)?;
        self.session().token = None;
        Ok(())
    }
}

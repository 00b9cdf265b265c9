//! SurrealDB backend over the official client.
//!
//! Records are written and read through private row types that carry the
//! client's own `RecordId`, then converted into the domain model. Locations go
//! out as native geometries and come back as coordinate pairs. The SurrealQL
//! itself lives in [`super::queries`].

use chrono::{DateTime, Utc};
use futures::StreamExt;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::sql::Geometry;
use surrealdb::{Action, Notification, Surreal};

use super::{Connector, LiveStream, Storage, queries};
use crate::errors::{DemoError, Result};
use crate::geo::GeoPoint;
use crate::id::RecordId;
use crate::types::{
    Credentials, FriendFeed, Friendship, LiveAction, NearbyPerson, POSTS_TABLE, PERSONS_TABLE, Person, Post,
    PostEvent, Token,
};

type SurrealId = surrealdb::RecordId;

/// `[longitude, latitude]`, as returned by `location.coordinates`.
type Coordinates = [f64; 2];

/// Connects to a SurrealDB server; the engine is chosen from the endpoint scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurrealConnector;

impl Connector for SurrealConnector {
    type Session = SurrealStorage;

    async fn connect(&self, endpoint: &str) -> Result<SurrealStorage> {
        debug!("connecting to SurrealDB at {endpoint}");
        let db = any::connect(endpoint)
            .await
            .map_err(|err| DemoError::connection(endpoint, err))?;
        Ok(SurrealStorage { db })
    }
}

/// Session on a SurrealDB server.
#[derive(Clone)]
pub struct SurrealStorage {
    db: Surreal<Any>,
}

impl Storage for SurrealStorage {
    async fn use_ns_db(&self, namespace: &str, database: &str) -> Result<()> {
        self.db
            .use_ns(namespace)
            .use_db(database)
            .await
            .map_err(DemoError::usage)
    }

    async fn signin(&self, credentials: &Credentials) -> Result<Token> {
        let jwt = self
            .db
            .signin(Root {
                username: &credentials.username,
                password: &credentials.password,
            })
            .await
            .map_err(DemoError::auth)?;
        Ok(Token::new(jwt.into_insecure_token()))
    }

    async fn authenticate(&self, token: Token) -> Result<()> {
        self.db.authenticate(token.into_inner()).await.map_err(DemoError::token)
    }

    async fn create_person(&self, person: Person) -> Result<Person> {
        let mut response = self
            .db
            .query(queries::CREATE_PERSON)
            .bind(("person", NewPersonRow::from_domain(&person)))
            .await
            .and_then(|response| response.check())
            .map_err(|err| DemoError::write(PERSONS_TABLE, err))?;
        let created: Vec<PersonRow> = response
            .take(1)
            .map_err(|err| DemoError::write(PERSONS_TABLE, err))?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| DemoError::write(PERSONS_TABLE, "create returned no record"))?
            .into_domain()
    }

    async fn create_post(&self, post: Post) -> Result<Post> {
        let mut response = self
            .db
            .query(queries::CREATE_POST)
            .bind(("post", PostRow::from_domain(&post)))
            .await
            .and_then(|response| response.check())
            .map_err(|err| DemoError::write(POSTS_TABLE, err))?;
        let created: Vec<PostRow> = response.take(1).map_err(|err| DemoError::write(POSTS_TABLE, err))?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| DemoError::write(POSTS_TABLE, "create returned no record"))?
            .into_domain()
    }

    async fn relate_friends(&self, from: &RecordId, to: &RecordId) -> Result<Friendship> {
        let mut response = self
            .db
            .query(queries::RELATE_FRIENDS)
            .bind(("person1", surreal_id(from)))
            .bind(("person2", surreal_id(to)))
            .await
            .and_then(|response| response.check())
            .map_err(DemoError::query)?;
        let edges: Vec<EdgeRow> = response.take(2).map_err(DemoError::query)?;
        edges
            .into_iter()
            .next()
            .ok_or_else(|| DemoError::query("relate returned no edge"))?
            .into_domain()
    }

    async fn friend_feed(&self, person: &RecordId, origin: GeoPoint) -> Result<Option<FriendFeed>> {
        let mut response = self
            .db
            .query(queries::FRIEND_FEED)
            .bind(("person_id", surreal_id(person)))
            .bind(("origin", geometry(origin)))
            .await
            .and_then(|response| response.check())
            .map_err(DemoError::query)?;
        let rows: Vec<FriendFeedRow> = response.take(1).map_err(DemoError::query)?;
        rows.into_iter().next().map(FriendFeedRow::into_domain).transpose()
    }

    async fn live_posts(&self, author: &RecordId) -> Result<LiveStream> {
        let mut response = self
            .db
            .query(queries::LIVE_POSTS)
            .bind(("author_id", surreal_id(author)))
            .await
            .and_then(|response| response.check())
            .map_err(DemoError::query)?;
        let notifications = response
            .stream::<Notification<PostRow>>(0)
            .map_err(DemoError::query)?;
        let events = notifications.map(|item| post_event(item.map_err(DemoError::query)?));
        Ok(events.boxed())
    }

    async fn like_post(&self, post: &RecordId) -> Result<Post> {
        let mut response = self
            .db
            .query(queries::LIKE_POST)
            .bind(("post_id", surreal_id(post)))
            .await
            .and_then(|response| response.check())
            .map_err(DemoError::query)?;
        let rows: Vec<PostRow> = response.take(0).map_err(DemoError::query)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DemoError::query(format!("post {post} not found")))?
            .into_domain()
    }

    async fn persons_near(&self, origin: GeoPoint, radius_m: f64) -> Result<Vec<NearbyPerson>> {
        let mut response = self
            .db
            .query(queries::PERSONS_NEAR)
            .bind(("origin", geometry(origin)))
            .bind(("radius", radius_m))
            .await
            .and_then(|response| response.check())
            .map_err(DemoError::query)?;
        let rows: Vec<NearbyRow> = response.take(0).map_err(DemoError::query)?;
        rows.into_iter().map(NearbyRow::into_domain).collect()
    }

    async fn invalidate(&self) -> Result<()> {
        self.db.invalidate().await.map_err(DemoError::cleanup)
    }
}

fn surreal_id(id: &RecordId) -> SurrealId {
    SurrealId::from_table_key(id.table().to_string(), id.key().to_string())
}

/// Keys are taken from the id's key value, never from its escaped rendering.
fn domain_id(id: &SurrealId) -> Result<RecordId> {
    let invalid = || DemoError::InvalidRecordId { value: id.to_string() };
    let key = match serde_json::to_value(id.key()).map_err(|_| invalid())? {
        JsonValue::String(key) => key,
        JsonValue::Number(key) => key.to_string(),
        JsonValue::Object(variant) => match variant.into_iter().next() {
            Some((kind, JsonValue::String(key))) if kind == "String" => key,
            Some((kind, JsonValue::Number(key))) if kind == "Number" => key.to_string(),
            _ => return Err(invalid()),
        },
        _ => return Err(invalid()),
    };
    if key.is_empty() {
        return Err(invalid());
    }
    Ok(RecordId::new(id.table(), key))
}

fn geometry(point: GeoPoint) -> Geometry {
    Geometry::from((point.longitude, point.latitude))
}

fn point([longitude, latitude]: Coordinates) -> GeoPoint {
    GeoPoint::new(longitude, latitude)
}

fn live_action(action: Action) -> LiveAction {
    match action {
        Action::Create => LiveAction::Create,
        Action::Delete => LiveAction::Delete,
        _ => LiveAction::Update,
    }
}

fn post_event(notification: Notification<PostRow>) -> Result<PostEvent> {
    Ok(PostEvent {
        action: live_action(notification.action),
        post: notification.data.into_domain()?,
    })
}

/// Write shape of a person: the location goes out as a native geometry.
#[derive(Serialize)]
struct NewPersonRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<SurrealId>,
    name: String,
    surname: String,
    email: String,
    location: Geometry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    friends: Vec<SurrealId>,
}

impl NewPersonRow {
    fn from_domain(person: &Person) -> Self {
        Self {
            id: person.id.as_ref().map(surreal_id),
            name: person.name.clone(),
            surname: person.surname.clone(),
            email: person.email.clone(),
            location: geometry(person.location),
            friends: person.friends.iter().map(surreal_id).collect(),
        }
    }
}

#[derive(Deserialize)]
struct PersonRow {
    id: SurrealId,
    name: String,
    surname: String,
    email: String,
    location: Coordinates,
    #[serde(default)]
    friends: Vec<SurrealId>,
}

impl PersonRow {
    fn into_domain(self) -> Result<Person> {
        Ok(Person {
            id: Some(domain_id(&self.id)?),
            name: self.name,
            surname: self.surname,
            email: self.email,
            location: point(self.location),
            friends: self.friends.iter().map(domain_id).collect::<Result<_>>()?,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct PostRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<SurrealId>,
    author: SurrealId,
    content: String,
    #[serde(default)]
    likes: u64,
}

impl PostRow {
    fn from_domain(post: &Post) -> Self {
        Self {
            id: post.id.as_ref().map(surreal_id),
            author: surreal_id(&post.author),
            content: post.content.clone(),
            likes: post.likes,
        }
    }

    fn into_domain(self) -> Result<Post> {
        Ok(Post {
            id: self.id.as_ref().map(domain_id).transpose()?,
            author: domain_id(&self.author)?,
            content: self.content,
            likes: self.likes,
        })
    }
}

#[derive(Deserialize)]
struct EdgeRow {
    id: SurrealId,
    from: SurrealId,
    to: SurrealId,
    created_at: String,
}

impl EdgeRow {
    fn into_domain(self) -> Result<Friendship> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|err| DemoError::query(format!("unexpected created_at `{}`: {err}", self.created_at)))?
            .with_timezone(&Utc);
        Ok(Friendship {
            id: domain_id(&self.id)?,
            from: domain_id(&self.from)?,
            to: domain_id(&self.to)?,
            created_at,
        })
    }
}

#[derive(Deserialize)]
struct FriendFeedRow {
    person: SurrealId,
    #[serde(default)]
    friends: Vec<SurrealId>,
    #[serde(default)]
    friend_posts: Vec<PostRow>,
    #[serde(default)]
    friend_locations: Vec<Coordinates>,
    #[serde(default)]
    distance_to_origin_m: Option<f64>,
}

impl FriendFeedRow {
    fn into_domain(self) -> Result<FriendFeed> {
        Ok(FriendFeed {
            person: domain_id(&self.person)?,
            friends: self.friends.iter().map(domain_id).collect::<Result<_>>()?,
            friend_posts: self
                .friend_posts
                .into_iter()
                .map(PostRow::into_domain)
                .collect::<Result<_>>()?,
            friend_locations: self.friend_locations.into_iter().map(point).collect(),
            distance_to_origin_m: self.distance_to_origin_m,
        })
    }
}

#[derive(Deserialize)]
struct NearbyRow {
    #[serde(flatten)]
    person: PersonRow,
    distance_m: f64,
}

impl NearbyRow {
    fn into_domain(self) -> Result<NearbyPerson> {
        Ok(NearbyPerson {
            person: self.person.into_domain()?,
            distance_m: self.distance_m,
        })
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::id::RecordId;

pub const PERSONS_TABLE: &str = "persons";
pub const POSTS_TABLE: &str = "posts";
pub const FRIENDS_TABLE: &str = "friends";

/// A member of the social graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Absent until the storage service creates the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub location: GeoPoint,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub friends: Vec<RecordId>,
}

impl Person {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        email: impl Into<String>,
        location: GeoPoint,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            surname: surname.into(),
            email: email.into(),
            location,
            friends: Vec::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

/// A post written by a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub author: RecordId,
    pub content: String,
    /// Only ever changed through the atomic increment.
    #[serde(default)]
    pub likes: u64,
}

impl Post {
    pub fn new(author: RecordId, content: impl Into<String>) -> Self {
        Self {
            id: None,
            author,
            content: content.into(),
            likes: 0,
        }
    }
}

/// Directed friendship edge `from -> to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friendship {
    pub id: RecordId,
    pub from: RecordId,
    pub to: RecordId,
    pub created_at: DateTime<Utc>,
}

/// Result of the friend-posts join for one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendFeed {
    pub person: RecordId,
    pub friends: Vec<RecordId>,
    pub friend_posts: Vec<Post>,
    pub friend_locations: Vec<GeoPoint>,
    /// Distance from the queried person to the reference point, in metres.
    pub distance_to_origin_m: Option<f64>,
}

/// A person ranked by distance to a reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyPerson {
    pub person: Person,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for LiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LiveAction::Create => "create",
            LiveAction::Update => "update",
            LiveAction::Delete => "delete",
        };
        f.write_str(label)
    }
}

/// One notification pushed by a live query on `posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostEvent {
    pub action: LiveAction,
    pub post: Post,
}

/// Root credentials used to sign in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque session token returned by sign-in.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

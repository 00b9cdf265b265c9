//! socialgeo core library.
//!
//! A guided tour of a geo-aware social graph stored in SurrealDB: persons with
//! a location, friendship edges, posts with a like counter, a live query and a
//! distance ranking. The tour talks to storage through the [`storage`]
//! contract, served either by a SurrealDB server or by the in-process
//! [`storage::memory::MemoryEngine`].

pub mod config;
pub mod errors;
pub mod geo;
pub mod id;
pub mod output;
pub mod storage;
pub mod tour;
pub mod types;
pub mod validators;

pub use config::DemoConfig;
pub use errors::{DemoError, Result, ValidationError, ValidationIssue};
pub use geo::GeoPoint;
pub use id::RecordId;
pub use output::{Console, ConsoleOptions};
pub use storage::memory::{DatasetSnapshot, MemoryEngine, MemorySession};
pub use storage::surreal::{SurrealConnector, SurrealStorage};
pub use storage::{Connector, LiveStream, Operation, Storage};
pub use tour::{LiveSummary, TourReport};
pub use types::{
    Credentials, FriendFeed, Friendship, LiveAction, NearbyPerson, Person, Post, PostEvent, Token,
};

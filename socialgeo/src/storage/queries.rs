//! SurrealQL statements issued by the SurrealDB backend.
//!
//! Locations are read back as `location.coordinates`, a `[longitude, latitude]`
//! pair; the client cannot hand geometries to typed rows.

/// Statement 1 holds the created person.
pub const CREATE_PERSON: &str = r#"
LET $created = (CREATE persons CONTENT $person);
SELECT id, name, surname, email, location.coordinates AS location, friends ?? [] AS friends
FROM $created.id;
"#;

/// Refuses authors that are not stored persons. Statement 1 holds the post.
pub const CREATE_POST: &str = r#"
IF !record::exists($post.author) { THROW "author " + <string> $post.author + " does not exist" };
CREATE posts CONTENT $post;
"#;

/// Refuses missing endpoints, then creates the edge and reads it back with a
/// string timestamp. Statement 2 holds the edge.
pub const RELATE_FRIENDS: &str = r#"
FOR $person IN [$person1, $person2] {
    IF !record::exists($person) { THROW "person " + <string> $person + " does not exist" };
};
LET $edge = (RELATE ONLY $person1->friends->$person2 SET created_at = time::now());
SELECT id, in AS from, out AS to, <string> created_at AS created_at FROM $edge.id;
"#;

/// Friends are the persons on either end of a `friends` edge touching the
/// queried person. Statement 1 holds the feed.
pub const FRIEND_FEED: &str = r#"
LET $friends = array::union($person_id->friends->persons, $person_id<-friends<-persons);
SELECT
    id AS person,
    $friends AS friends,
    (SELECT * FROM posts WHERE author INSIDE $friends) AS friend_posts,
    $friends.location.coordinates AS friend_locations,
    geo::distance(location, $origin) AS distance_to_origin_m
FROM $person_id;
"#;

pub const LIVE_POSTS: &str = "LIVE SELECT * FROM posts WHERE author = $author_id;";

pub const LIKE_POST: &str = "UPDATE $post_id SET likes = likes + 1;";

pub const PERSONS_NEAR: &str = r#"
SELECT
    id, name, surname, email,
    location.coordinates AS location,
    friends ?? [] AS friends,
    geo::distance(location, $origin) AS distance_m
FROM persons
WHERE geo::distance(location, $origin) < $radius
ORDER BY distance_m ASC;
"#;

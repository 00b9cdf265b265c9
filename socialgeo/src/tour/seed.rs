//! Fixed records written by the tour.

use crate::geo::GeoPoint;
use crate::types::Person;

pub const POST_CONTENT: &str = "Hello from Bouaké! SurrealDB is amazing 🚀";

/// Bouaké, Côte d'Ivoire.
pub const BOUAKE: GeoPoint = GeoPoint::new(-0.11, 22.00);
/// Paris, France.
pub const PARIS: GeoPoint = GeoPoint::new(2.3522, 48.8566);

/// The two persons of the tour: the post author first, the queried friend second.
pub fn persons() -> [Person; 2] {
    [
        Person::new("Emmanuel", "Manou", "emmanuel@example.com", BOUAKE),
        Person::new("Tilonon", "Tilonon", "marie@example.com", PARIS),
    ]
}

//! # blueprint-model — Building model entities and local state
//!
//! Typed snapshots of the entities exchanged with the model server
//! (elements, relationships, view states) plus the in-memory stores that
//! hold the client's local copy of each. The sync layer upserts into these
//! stores when remote updates arrive; UI code reads from them.

pub mod element;
pub mod relationship;
pub mod store;
pub mod view;

pub use element::{Element, ElementType, Geometry, Metadata, Point, Properties, Size};
pub use relationship::{
    Relationship, RelationshipEndpoint, RelationshipProperties, RelationshipType,
};
pub use store::{ElementStore, RelationshipStore, ViewStore};
pub use view::ViewState;

//! Relationships between building elements.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::element::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    Connects,
    Contains,
    Adjacent,
}

/// One end of a relationship: the element it attaches to and its role
/// ("from", "to", "parent", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEndpoint {
    pub element_id: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipProperties {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A typed edge between two elements as the server serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub source: RelationshipEndpoint,
    pub target: RelationshipEndpoint,
    pub properties: RelationshipProperties,
    pub metadata: Metadata,
}

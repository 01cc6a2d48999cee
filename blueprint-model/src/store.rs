//! In-memory stores for the client's local copy of the model.
//!
//! These are the state containers the sync layer drives: remote updates
//! upsert by id, remote deletes remove by id, view updates replace the
//! state for one view type. All methods take `&self` behind an interior
//! `RwLock` so a shared handle can be handed to the dispatcher; mutations
//! are short map operations and never block on I/O.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::element::Element;
use crate::relationship::Relationship;
use crate::view::ViewState;

/// Local element state, keyed by element id.
#[derive(Debug, Default)]
pub struct ElementStore {
    elements: RwLock<HashMap<String, Element>>,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an element.
    pub fn apply_update(&self, element: Element) {
        let mut elements = self.elements.write().unwrap();
        elements.insert(element.id.clone(), element);
    }

    /// Remove an element. Removing an unknown id is a no-op.
    pub fn apply_delete(&self, id: &str) {
        let mut elements = self.elements.write().unwrap();
        if elements.remove(id).is_none() {
            log::debug!("delete for unknown element: {id}");
        }
    }

    pub fn get(&self, id: &str) -> Option<Element> {
        self.elements.read().unwrap().get(id).cloned()
    }

    /// Snapshot of all elements, in no particular order.
    pub fn elements(&self) -> Vec<Element> {
        self.elements.read().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.elements.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.read().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.elements.write().unwrap().clear();
    }
}

/// Local relationship state, keyed by relationship id.
#[derive(Debug, Default)]
pub struct RelationshipStore {
    relationships: RwLock<HashMap<String, Relationship>>,
}

impl RelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a relationship.
    pub fn apply_update(&self, relationship: Relationship) {
        let mut relationships = self.relationships.write().unwrap();
        relationships.insert(relationship.id.clone(), relationship);
    }

    /// Remove a relationship. Removing an unknown id is a no-op.
    pub fn apply_delete(&self, id: &str) {
        let mut relationships = self.relationships.write().unwrap();
        if relationships.remove(id).is_none() {
            log::debug!("delete for unknown relationship: {id}");
        }
    }

    pub fn get(&self, id: &str) -> Option<Relationship> {
        self.relationships.read().unwrap().get(id).cloned()
    }

    /// Relationships touching the given element, as source or target.
    pub fn for_element(&self, element_id: &str) -> Vec<Relationship> {
        self.relationships
            .read()
            .unwrap()
            .values()
            .filter(|r| r.source.element_id == element_id || r.target.element_id == element_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.relationships.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.read().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.relationships.write().unwrap().clear();
    }
}

/// Local view state, keyed by view type ("floor", "structure", "mep").
#[derive(Debug, Default)]
pub struct ViewStore {
    views: RwLock<HashMap<String, ViewState>>,
}

impl ViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the state for one view type.
    pub fn apply_view_update(&self, view_type: &str, state: ViewState) {
        let mut views = self.views.write().unwrap();
        views.insert(view_type.to_string(), state);
    }

    pub fn get(&self, view_type: &str) -> Option<ViewState> {
        self.views.read().unwrap().get(view_type).copied()
    }

    pub fn len(&self) -> usize {
        self.views.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.read().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.views.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementType, Geometry, Metadata, Point, Properties, Size};
    use crate::relationship::{RelationshipEndpoint, RelationshipProperties, RelationshipType};

    fn element(id: &str, name: &str) -> Element {
        Element {
            id: id.to_string(),
            element_type: ElementType::Room,
            geometry: Geometry {
                position: Point { x: 0.0, y: 0.0 },
                size: Size {
                    width: 100.0,
                    height: 100.0,
                },
                rotation: 0.0,
            },
            properties: Properties {
                name: name.to_string(),
                color: "#000000".to_string(),
                extra: serde_json::Map::new(),
            },
            metadata: Metadata {
                created_at: "t0".to_string(),
                updated_at: "t0".to_string(),
                version: 1,
            },
        }
    }

    fn relationship(id: &str, source: &str, target: &str) -> Relationship {
        Relationship {
            id: id.to_string(),
            relationship_type: RelationshipType::Connects,
            source: RelationshipEndpoint {
                element_id: source.to_string(),
                role: "from".to_string(),
            },
            target: RelationshipEndpoint {
                element_id: target.to_string(),
                role: "to".to_string(),
            },
            properties: RelationshipProperties {
                name: "link".to_string(),
                description: None,
                extra: serde_json::Map::new(),
            },
            metadata: Metadata {
                created_at: "t0".to_string(),
                updated_at: "t0".to_string(),
                version: 1,
            },
        }
    }

    #[test]
    fn test_element_store_upsert_replaces_by_id() {
        let store = ElementStore::new();
        store.apply_update(element("e1", "before"));
        store.apply_update(element("e1", "after"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("e1").unwrap().properties.name, "after");
    }

    #[test]
    fn test_element_store_delete() {
        let store = ElementStore::new();
        store.apply_update(element("e1", "room"));
        store.apply_delete("e1");
        assert!(store.is_empty());

        // Deleting again must not panic.
        store.apply_delete("e1");
    }

    #[test]
    fn test_relationship_store_for_element() {
        let store = RelationshipStore::new();
        store.apply_update(relationship("r1", "e1", "e2"));
        store.apply_update(relationship("r2", "e2", "e3"));
        store.apply_update(relationship("r3", "e4", "e5"));

        let touching = store.for_element("e2");
        assert_eq!(touching.len(), 2);
        assert!(store.for_element("e9").is_empty());
    }

    #[test]
    fn test_view_store_replaces_state() {
        let store = ViewStore::new();
        store.apply_view_update("floor", ViewState::default());
        store.apply_view_update(
            "floor",
            ViewState {
                zoom: 2.5,
                pan: Point { x: 5.0, y: -3.0 },
                rotation: 0.0,
            },
        );

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("floor").unwrap().zoom, 2.5);
        assert!(store.get("structure").is_none());
    }
}

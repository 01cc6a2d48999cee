//! Ports into the domain state containers.
//!
//! The dispatcher never reaches into concrete stores; it only sees these
//! narrow traits, and the handles are passed in when the client is built.
//! Handlers run synchronously on the dispatch path, so implementations
//! must only mutate local state and never block on I/O.

use std::sync::Arc;

use blueprint_model::{Element, ElementStore, Relationship, RelationshipStore, ViewState, ViewStore};

/// Consumer of upsert/delete updates for one entity kind.
pub trait EntityConsumer<T>: Send + Sync {
    fn apply_update(&self, entity: T);
    fn apply_delete(&self, id: &str);
}

/// Consumer of view-state replacements, keyed by view type.
pub trait ViewConsumer: Send + Sync {
    fn apply_view_update(&self, view_type: &str, state: ViewState);
}

impl EntityConsumer<Element> for ElementStore {
    fn apply_update(&self, entity: Element) {
        ElementStore::apply_update(self, entity);
    }

    fn apply_delete(&self, id: &str) {
        ElementStore::apply_delete(self, id);
    }
}

impl EntityConsumer<Relationship> for RelationshipStore {
    fn apply_update(&self, entity: Relationship) {
        RelationshipStore::apply_update(self, entity);
    }

    fn apply_delete(&self, id: &str) {
        RelationshipStore::apply_delete(self, id);
    }
}

impl ViewConsumer for ViewStore {
    fn apply_view_update(&self, view_type: &str, state: ViewState) {
        ViewStore::apply_view_update(self, view_type, state);
    }
}

/// The consumer handles the dispatcher fans out to.
#[derive(Clone)]
pub struct Consumers {
    pub elements: Arc<dyn EntityConsumer<Element>>,
    pub relationships: Arc<dyn EntityConsumer<Relationship>>,
    pub views: Arc<dyn ViewConsumer>,
}

impl Consumers {
    pub fn new(
        elements: Arc<dyn EntityConsumer<Element>>,
        relationships: Arc<dyn EntityConsumer<Relationship>>,
        views: Arc<dyn ViewConsumer>,
    ) -> Self {
        Self {
            elements,
            relationships,
            views,
        }
    }

    /// Wire up the standard in-memory stores.
    pub fn from_stores(
        elements: Arc<ElementStore>,
        relationships: Arc<RelationshipStore>,
        views: Arc<ViewStore>,
    ) -> Self {
        Self {
            elements,
            relationships,
            views,
        }
    }
}

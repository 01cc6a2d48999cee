//! JSON wire protocol for project synchronization.
//!
//! One envelope per text frame, no batching:
//! ```text
//! {
//!   "type": "ElementUpdate",
//!   "payload": {
//!     "id": "...",
//!     "project_id": "...",
//!     "data": { ... },          // *Update only
//!     "timestamp": "...",       // RFC 3339, display/ordering hint only
//!     "user_id": "...",
//!     "view_type": "...",       // ViewUpdate only
//!     "state": { ... }          // ViewUpdate only
//!   }
//! }
//! ```
//!
//! The tag space is open: an [`Envelope`] keeps the raw tag string, so
//! frames with unknown tags still decode and the dispatcher can log and
//! drop them instead of treating them as protocol errors.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use blueprint_model::{Element, Relationship, ViewState};

use crate::error::SyncError;

/// Message types the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    ElementUpdate,
    ElementDelete,
    RelationshipUpdate,
    RelationshipDelete,
    ViewUpdate,
}

impl MessageType {
    /// Wire tag for this message type.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::ElementUpdate => "ElementUpdate",
            Self::ElementDelete => "ElementDelete",
            Self::RelationshipUpdate => "RelationshipUpdate",
            Self::RelationshipDelete => "RelationshipDelete",
            Self::ViewUpdate => "ViewUpdate",
        }
    }

    /// Map a wire tag back to a known type. `None` for unknown tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ElementUpdate" => Some(Self::ElementUpdate),
            "ElementDelete" => Some(Self::ElementDelete),
            "RelationshipUpdate" => Some(Self::RelationshipUpdate),
            "RelationshipDelete" => Some(Self::RelationshipDelete),
            "ViewUpdate" => Some(Self::ViewUpdate),
            _ => None,
        }
    }
}

/// Envelope payload. Optional fields are omitted from the wire when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Subject entity id, or the view type for `ViewUpdate`.
    pub id: String,
    /// Scoping key; one connection serves exactly one project.
    pub project_id: String,
    /// Entity snapshot, present for `*Update`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Origin time (RFC 3339). Display/ordering hint only; conflict
    /// resolution is the server's job and updates apply in arrival order.
    pub timestamp: String,
    /// Originator, for UI attribution.
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

/// The unit of wire exchange. Immutable once constructed; the queue and
/// history store envelopes by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Payload,
}

fn now_rfc3339() -> String {
    humantime::format_rfc3339_millis(SystemTime::now()).to_string()
}

impl Envelope {
    fn update(kind: MessageType, id: &str, project_id: &str, data: Value, user_id: &str) -> Self {
        Self {
            kind: kind.as_tag().to_string(),
            payload: Payload {
                id: id.to_string(),
                project_id: project_id.to_string(),
                data: Some(data),
                timestamp: now_rfc3339(),
                user_id: user_id.to_string(),
                view_type: None,
                state: None,
            },
        }
    }

    fn delete(kind: MessageType, id: &str, project_id: &str, user_id: &str) -> Self {
        Self {
            kind: kind.as_tag().to_string(),
            payload: Payload {
                id: id.to_string(),
                project_id: project_id.to_string(),
                data: None,
                timestamp: now_rfc3339(),
                user_id: user_id.to_string(),
                view_type: None,
                state: None,
            },
        }
    }

    /// Announce a created or updated element.
    pub fn element_update(project_id: &str, element: &Element, user_id: &str) -> Self {
        let data = serde_json::to_value(element).unwrap_or(Value::Null);
        Self::update(
            MessageType::ElementUpdate,
            &element.id,
            project_id,
            data,
            user_id,
        )
    }

    /// Announce a deleted element.
    pub fn element_delete(project_id: &str, element_id: &str, user_id: &str) -> Self {
        Self::delete(MessageType::ElementDelete, element_id, project_id, user_id)
    }

    /// Announce a created or updated relationship.
    pub fn relationship_update(project_id: &str, relationship: &Relationship, user_id: &str) -> Self {
        let data = serde_json::to_value(relationship).unwrap_or(Value::Null);
        Self::update(
            MessageType::RelationshipUpdate,
            &relationship.id,
            project_id,
            data,
            user_id,
        )
    }

    /// Announce a deleted relationship.
    pub fn relationship_delete(project_id: &str, relationship_id: &str, user_id: &str) -> Self {
        Self::delete(
            MessageType::RelationshipDelete,
            relationship_id,
            project_id,
            user_id,
        )
    }

    /// Announce a replaced view state for one view type.
    pub fn view_update(project_id: &str, view_type: &str, state: &ViewState, user_id: &str) -> Self {
        let state = serde_json::to_value(state).unwrap_or(Value::Null);
        Self {
            kind: MessageType::ViewUpdate.as_tag().to_string(),
            payload: Payload {
                id: view_type.to_string(),
                project_id: project_id.to_string(),
                data: None,
                timestamp: now_rfc3339(),
                user_id: user_id.to_string(),
                view_type: Some(view_type.to_string()),
                state: Some(state),
            },
        }
    }

    /// Known message type, or `None` for tags this client does not handle.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_tag(&self.kind)
    }

    /// Serialize to one JSON text frame.
    pub fn encode(&self) -> Result<String, SyncError> {
        serde_json::to_string(self).map_err(|e| SyncError::Encode(e.to_string()))
    }

    /// Deserialize from one JSON text frame.
    pub fn decode(text: &str) -> Result<Self, SyncError> {
        serde_json::from_str(text).map_err(|e| SyncError::Parse(e.to_string()))
    }

    /// Parse the payload data as an element snapshot.
    pub fn element(&self) -> Result<Element, SyncError> {
        let data = self
            .payload
            .data
            .clone()
            .ok_or_else(|| SyncError::Parse("missing payload data".to_string()))?;
        serde_json::from_value(data).map_err(|e| SyncError::Parse(e.to_string()))
    }

    /// Parse the payload data as a relationship snapshot.
    pub fn relationship(&self) -> Result<Relationship, SyncError> {
        let data = self
            .payload
            .data
            .clone()
            .ok_or_else(|| SyncError::Parse("missing payload data".to_string()))?;
        serde_json::from_value(data).map_err(|e| SyncError::Parse(e.to_string()))
    }

    /// Parse the view type and state of a `ViewUpdate`.
    pub fn view_update_payload(&self) -> Result<(String, ViewState), SyncError> {
        let view_type = self
            .payload
            .view_type
            .clone()
            .ok_or_else(|| SyncError::Parse("missing view_type".to_string()))?;
        let state = self
            .payload
            .state
            .clone()
            .ok_or_else(|| SyncError::Parse("missing view state".to_string()))?;
        let state = serde_json::from_value(state).map_err(|e| SyncError::Parse(e.to_string()))?;
        Ok((view_type, state))
    }
}

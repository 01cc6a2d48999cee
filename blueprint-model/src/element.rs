//! Building elements: rooms, openings, walls.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Room,
    Opening,
    Wall,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Placement of an element on the floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub position: Point,
    pub size: Size,
    pub rotation: f64,
}

/// Display properties. Arbitrary extra keys from the server are preserved
/// through the flattened map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    pub name: String,
    pub color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server-assigned bookkeeping. Timestamps are ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub created_at: String,
    pub updated_at: String,
    pub version: u64,
}

/// A single building element as the server serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub geometry: Geometry,
    pub properties: Properties,
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_element() -> Element {
        Element {
            id: "room-1".to_string(),
            element_type: ElementType::Room,
            geometry: Geometry {
                position: Point { x: 10.0, y: 20.0 },
                size: Size {
                    width: 400.0,
                    height: 300.0,
                },
                rotation: 0.0,
            },
            properties: Properties {
                name: "Living Room".to_string(),
                color: "#aabbcc".to_string(),
                extra: Map::new(),
            },
            metadata: Metadata {
                created_at: "2026-01-01T00:00:00Z".to_string(),
                updated_at: "2026-01-02T00:00:00Z".to_string(),
                version: 3,
            },
        }
    }

    #[test]
    fn test_element_serializes_with_camel_case_metadata() {
        let json = serde_json::to_value(sample_element()).unwrap();
        assert_eq!(json["type"], "room");
        assert_eq!(json["metadata"]["createdAt"], "2026-01-01T00:00:00Z");
        assert_eq!(json["metadata"]["updatedAt"], "2026-01-02T00:00:00Z");
        assert_eq!(json["geometry"]["position"]["x"], 10.0);
    }

    #[test]
    fn test_element_preserves_unknown_properties() {
        let raw = r##"{
            "id": "wall-7",
            "type": "wall",
            "geometry": {
                "position": { "x": 0.0, "y": 0.0 },
                "size": { "width": 10.0, "height": 250.0 },
                "rotation": 90.0
            },
            "properties": { "name": "North wall", "color": "#ffffff", "material": "brick" },
            "metadata": { "createdAt": "t0", "updatedAt": "t1", "version": 1 }
        }"##;

        let element: Element = serde_json::from_str(raw).unwrap();
        assert_eq!(element.element_type, ElementType::Wall);
        assert_eq!(element.properties.extra["material"], "brick");

        // Extra keys survive re-serialization.
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["properties"]["material"], "brick");
    }
}

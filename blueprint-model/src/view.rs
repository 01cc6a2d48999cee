//! Per-view camera state.
//!
//! A project has one state per view type ("floor", "structure", "mep").
//! `ViewUpdate` messages replace the whole state for one view type, so this
//! stays a small value type.

use serde::{Deserialize, Serialize};

use crate::element::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub zoom: f64,
    pub pan: Point,
    pub rotation: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::default(),
            rotation: 0.0,
        }
    }
}

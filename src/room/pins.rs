use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Text assigned to a pin created without one.
const DEFAULT_PIN_TEXT: &str = "New Note";

/// A positioned annotation on the shared canvas.
/// `color` is the creator's color at creation time and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pin {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub created_by: String,
    pub color: String,
}

/// Partial update for a pin. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PinPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub text: Option<String>,
}

/// Ordered collection of a room's pins. Pins keep creation order.
#[derive(Debug, Default)]
pub struct PinStore {
    pins: Vec<Pin>,
}

impl PinStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pin with a fresh id, appended after all existing pins.
    pub fn create(
        &mut self,
        x: f64,
        y: f64,
        text: Option<String>,
        created_by: &str,
        color: &str,
    ) -> Pin {
        let pin = Pin {
            id: Uuid::new_v4().to_string(),
            x,
            y,
            text: text.unwrap_or_else(|| DEFAULT_PIN_TEXT.to_string()),
            created_by: created_by.to_string(),
            color: color.to_string(),
        };
        self.pins.push(pin.clone());
        pin
    }

    /// Merge the present fields of `patch` into the pin with the given id.
    /// Returns the updated pin, or None if the id is unknown.
    pub fn update(&mut self, id: &str, patch: PinPatch) -> Option<Pin> {
        let pin = self.pins.iter_mut().find(|p| p.id == id)?;
        if let Some(x) = patch.x {
            pin.x = x;
        }
        if let Some(y) = patch.y {
            pin.y = y;
        }
        if let Some(text) = patch.text {
            pin.text = text;
        }
        Some(pin.clone())
    }

    /// Remove the pin if present. An unknown id is a no-op.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.pins.len();
        self.pins.retain(|p| p.id != id);
        self.pins.len() != before
    }

    /// All pins in creation order.
    pub fn list(&self) -> Vec<Pin> {
        self.pins.clone()
    }
}

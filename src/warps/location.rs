//! Conversion between live world positions and their stored form.
//!
//! Stored locations keep block coordinates only, so a warp placed at
//! `x = 10.7` lands the visitor on block `10`. Orientation is kept exactly.

use serde::{Deserialize, Serialize};

/// A position in a named world with a facing direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub pitch: f32,
    pub yaw: f32,
}

impl Location {
    pub fn new(world: &str, x: f64, y: f64, z: f64, pitch: f32, yaw: f32) -> Self {
        Self {
            world: world.to_string(),
            x,
            y,
            z,
            pitch,
            yaw,
        }
    }

    /// The block directly beneath this position.
    pub fn below(&self) -> Location {
        Location {
            y: self.y - 1.0,
            ..self.clone()
        }
    }
}

/// Serializable location. `world` is `None` when the source had no world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationRecord {
    #[serde(default)]
    pub world: Option<String>,
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub pitch: f32,
    pub yaw: f32,
}

pub fn encode(location: &Location) -> LocationRecord {
    let world = if location.world.is_empty() {
        None
    } else {
        Some(location.world.clone())
    };
    LocationRecord {
        world,
        x: location.x.floor() as i64,
        y: location.y.floor() as i64,
        z: location.z.floor() as i64,
        pitch: location.pitch,
        yaw: location.yaw,
    }
}

/// Round-trip through the stored form so a live warp matches what a reload
/// would produce: block coordinates, and no location at all without a world.
pub fn normalize(location: &Location) -> Option<Location> {
    decode(&encode(location))
}

/// Returns `None` for records without a world; such warps are not teleportable.
pub fn decode(record: &LocationRecord) -> Option<Location> {
    let world = record.world.as_deref().filter(|w| !w.is_empty())?;
    Some(Location::new(
        world,
        record.x as f64,
        record.y as f64,
        record.z as f64,
        record.pitch,
        record.yaw,
    ))
}

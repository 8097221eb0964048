//! Session metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Track layout category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackType {
    #[default]
    RoadCourse,
    Oval,
    DirtRoad,
    DirtOval,
}

impl TrackType {
    /// Parse the simulator's free-form track type string, defaulting to
    /// a road course for anything unrecognised.
    pub fn from_sim_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "oval" | "short oval" => TrackType::Oval,
            "dirt road course" | "dirt road" => TrackType::DirtRoad,
            "dirt oval" => TrackType::DirtOval,
            _ => TrackType::RoadCourse,
        }
    }
}

/// Simulator session category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Practice,
    Qualify,
    Race,
    TimeTrial,
    Test,
}

/// Stable metadata for one continuous simulator session.
///
/// Created at the first frame of a session and immutable afterwards; a
/// change of identifier means a new descriptor replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub track_id: i32,
    pub track_name: String,
    pub track_config_name: Option<String>,
    pub track_type: TrackType,
    pub car_id: i32,
    pub car_name: String,
    pub car_class_id: i32,
    pub series_id: i32,
    pub session_type: SessionType,
}

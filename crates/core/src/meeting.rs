//! Meeting rooms, meetings, and the heuristic meeting status.

use serde::Serialize;

use crate::error::CoreError;
use crate::page::PageQuery;
use crate::text::serialize_joined;
use crate::types::{DbId, Timestamp};

/// A bookable room.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingRoom {
    pub id: DbId,
    pub name: String,
    pub location: String,
    pub capacity: u32,
    pub equipment: Vec<String>,
    pub available: bool,
}

/// Lifecycle of a meeting as shown on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl MeetingStatus {
    /// Map a backend status string or numeric code. Returns `None` when the
    /// value is blank or unrecognized so the caller can fall back to
    /// [`MeetingStatus::derive`].
    pub fn from_backend(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "upcoming" | "scheduled" | "booked" | "0" => Some(Self::Upcoming),
            "ongoing" | "in_progress" | "1" => Some(Self::Ongoing),
            "completed" | "finished" | "ended" | "2" => Some(Self::Completed),
            "cancelled" | "canceled" | "3" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Derive the status from the schedule relative to `now`.
    ///
    /// Without a start time the meeting counts as upcoming; without an end
    /// time it is ongoing from its start onwards.
    pub fn derive(start: Option<Timestamp>, end: Option<Timestamp>, now: Timestamp) -> Self {
        match (start, end) {
            (Some(start), _) if now < start => Self::Upcoming,
            (Some(_), Some(end)) if now >= end => Self::Completed,
            (Some(_), _) => Self::Ongoing,
            (None, Some(end)) if now >= end => Self::Completed,
            (None, _) => Self::Upcoming,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A booked meeting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meeting {
    pub id: DbId,
    pub title: String,
    pub room_id: DbId,
    /// Name of the referenced room, or empty when the room is unknown.
    pub room_name: String,
    pub organizer: String,
    pub attendees: Vec<String>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub status: MeetingStatus,
    pub description: String,
}

/// Look up the display name for `room_id`, or the empty string.
pub fn room_name_for(room_id: DbId, rooms: &[MeetingRoom]) -> String {
    rooms
        .iter()
        .find(|r| r.id == room_id)
        .map(|r| r.name.clone())
        .unwrap_or_default()
}

/// Query for the meeting list.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<DbId>,
    /// Only meetings on this day, `yyyy-MM-dd`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Payload for booking or updating a meeting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMeeting {
    pub title: String,
    pub room_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(serialize_with = "serialize_joined")]
    pub attendees: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl BookMeeting {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("Meeting title is required".into()));
        }
        if self.end_time <= self.start_time {
            return Err(CoreError::Validation(
                "Meeting end time must be after its start time".into(),
            ));
        }
        Ok(())
    }
}

/// Payload for creating or updating a room.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub name: String,
    pub location: String,
    pub capacity: u32,
    #[serde(serialize_with = "serialize_joined")]
    pub equipment: Vec<String>,
    /// Backend flag: `1` available, `0` under maintenance.
    pub status: i64,
}

impl RoomPayload {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("Room name is required".into()));
        }
        if self.capacity == 0 {
            return Err(CoreError::Validation("Room capacity must be positive".into()));
        }
        Ok(())
    }
}

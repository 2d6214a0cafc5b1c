//! Meeting rooms and meetings.
//!
//! The meeting list references rooms by id only. Listing meetings fetches
//! rooms and meetings concurrently and resolves `room_name` client-side.

use chrono::Utc;
use oa_core::meeting::{
    room_name_for, BookMeeting, Meeting, MeetingQuery, MeetingRoom, MeetingStatus, RoomPayload,
};
use oa_core::page::Page;
use oa_core::roles::PERM_ROOM_MANAGE;
use oa_core::types::{DbId, Timestamp};
use reqwest::Method;
use serde::Deserialize;

use crate::cache::KEY_MEETING_ROOMS;
use crate::de;
use crate::envelope::PageDto;
use crate::error::{ApiError, ApiResult};
use crate::transport::ApiClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    #[serde(deserialize_with = "de::id")]
    pub id: DbId,
    #[serde(default, alias = "roomName", deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub location: String,
    #[serde(default, deserialize_with = "de::u32_or_zero")]
    pub capacity: u32,
    #[serde(default, alias = "equipments", deserialize_with = "de::list")]
    pub equipment: Vec<String>,
    #[serde(default, deserialize_with = "de::opt_flag")]
    pub available: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_flag")]
    pub status: Option<bool>,
}

impl From<RoomDto> for MeetingRoom {
    fn from(dto: RoomDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            location: dto.location,
            capacity: dto.capacity,
            equipment: dto.equipment,
            available: dto.available.or(dto.status).unwrap_or(true),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDto {
    #[serde(deserialize_with = "de::id")]
    pub id: DbId,
    #[serde(default, alias = "subject", deserialize_with = "de::string")]
    pub title: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub room_id: Option<DbId>,
    #[serde(default, deserialize_with = "de::string")]
    pub organizer: String,
    #[serde(default, deserialize_with = "de::string")]
    pub organizer_name: String,
    #[serde(default, alias = "participants", deserialize_with = "de::list")]
    pub attendees: Vec<String>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub start_time: Option<Timestamp>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub end_time: Option<Timestamp>,
    #[serde(default, deserialize_with = "de::string")]
    pub status: String,
    #[serde(default, alias = "remark", deserialize_with = "de::string")]
    pub description: String,
}

/// Map a meeting DTO against the room list.
///
/// `room_name` is empty when no room matches. A missing or unrecognized
/// status is derived from the schedule relative to `now`.
pub fn map_meeting(dto: MeetingDto, rooms: &[MeetingRoom], now: Timestamp) -> Meeting {
    let room_id = dto.room_id.unwrap_or_default();
    let status = MeetingStatus::from_backend(&dto.status)
        .unwrap_or_else(|| MeetingStatus::derive(dto.start_time, dto.end_time, now));
    Meeting {
        id: dto.id,
        title: dto.title,
        room_id,
        room_name: room_name_for(room_id, rooms),
        organizer: de::first_text([dto.organizer_name, dto.organizer]),
        attendees: dto.attendees,
        start_time: dto.start_time,
        end_time: dto.end_time,
        status,
        description: dto.description,
    }
}

impl ApiClient {
    /// All meeting rooms. Served from the query cache.
    pub async fn list_rooms(&self) -> ApiResult<Vec<MeetingRoom>> {
        self.cache()
            .get_or_fetch(KEY_MEETING_ROOMS, || async {
                let request = self.request(Method::GET, "/api/meeting-rooms").await;
                let listing: PageDto<RoomDto> = self.execute(request).await?;
                Ok::<_, ApiError>(
                    listing
                        .into_records()
                        .into_iter()
                        .map(MeetingRoom::from)
                        .collect(),
                )
            })
            .await
    }

    pub async fn create_room(&self, payload: &RoomPayload) -> ApiResult<()> {
        self.authorize(PERM_ROOM_MANAGE).await?;
        payload.validate()?;
        let request = self
            .request(Method::POST, "/api/meeting-rooms")
            .await
            .json(payload);
        self.execute_unit(request).await?;
        self.cache().invalidate(KEY_MEETING_ROOMS).await;
        Ok(())
    }

    pub async fn update_room(&self, id: DbId, payload: &RoomPayload) -> ApiResult<()> {
        self.authorize(PERM_ROOM_MANAGE).await?;
        payload.validate()?;
        let request = self
            .request(Method::PUT, &format!("/api/meeting-rooms/{id}"))
            .await
            .json(payload);
        self.execute_unit(request).await?;
        self.cache().invalidate(KEY_MEETING_ROOMS).await;
        Ok(())
    }

    pub async fn delete_room(&self, id: DbId) -> ApiResult<()> {
        self.authorize(PERM_ROOM_MANAGE).await?;
        let request = self
            .request(Method::DELETE, &format!("/api/meeting-rooms/{id}"))
            .await;
        self.execute_unit(request).await?;
        self.cache().invalidate(KEY_MEETING_ROOMS).await;
        Ok(())
    }

    /// One page of meetings with room names resolved.
    ///
    /// Rooms and meetings are fetched concurrently; either failing fails
    /// the whole load.
    pub async fn list_meetings(&self, query: &MeetingQuery) -> ApiResult<Page<Meeting>> {
        let meetings = async {
            let request = self.request(Method::GET, "/api/meetings").await.query(query);
            self.execute::<PageDto<MeetingDto>>(request).await
        };
        let (rooms, meetings) = futures::try_join!(self.list_rooms(), meetings)?;

        let now = Utc::now();
        Ok(meetings
            .into_page()
            .map(|dto| map_meeting(dto, &rooms, now)))
    }

    pub async fn book_meeting(&self, payload: &BookMeeting) -> ApiResult<()> {
        payload.validate()?;
        let request = self.request(Method::POST, "/api/meetings").await.json(payload);
        self.execute_unit(request).await?;
        tracing::info!(room_id = payload.room_id, title = %payload.title, "Meeting booked");
        Ok(())
    }

    pub async fn update_meeting(&self, id: DbId, payload: &BookMeeting) -> ApiResult<()> {
        payload.validate()?;
        let request = self
            .request(Method::PUT, &format!("/api/meetings/{id}"))
            .await
            .json(payload);
        self.execute_unit(request).await
    }

    pub async fn cancel_meeting(&self, id: DbId) -> ApiResult<()> {
        let request = self
            .request(Method::POST, &format!("/api/meetings/{id}/cancel"))
            .await;
        self.execute_unit(request).await?;
        tracing::info!(meeting_id = id, "Meeting cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn training_room() -> MeetingRoom {
        MeetingRoom {
            id: 3,
            name: "Training Room".into(),
            location: "2F".into(),
            capacity: 30,
            equipment: vec![],
            available: true,
        }
    }

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn room_name_resolved_from_room_list() {
        let dto: MeetingDto =
            serde_json::from_value(json!({ "id": 1, "title": "Onboarding", "roomId": 3 })).unwrap();
        let meeting = map_meeting(dto, &[training_room()], now());
        assert_eq!(meeting.room_id, 3);
        assert_eq!(meeting.room_name, "Training Room");
    }

    #[test]
    fn unknown_room_gives_empty_name() {
        let dto: MeetingDto =
            serde_json::from_value(json!({ "id": 1, "roomId": 8 })).unwrap();
        assert_eq!(map_meeting(dto, &[training_room()], now()).room_name, "");
    }

    #[test]
    fn status_derived_when_omitted() {
        let dto: MeetingDto = serde_json::from_value(json!({
            "id": 1,
            "roomId": 3,
            "startTime": "2024-06-01T11:00:00Z",
            "endTime": "2024-06-01T13:00:00Z"
        }))
        .unwrap();
        assert_eq!(map_meeting(dto, &[], now()).status, MeetingStatus::Ongoing);
    }

    #[test]
    fn backend_status_wins_over_schedule() {
        let dto: MeetingDto = serde_json::from_value(json!({
            "id": 1,
            "status": "cancelled",
            "startTime": "2024-06-01T11:00:00Z",
            "endTime": "2024-06-01T13:00:00Z"
        }))
        .unwrap();
        assert_eq!(map_meeting(dto, &[], now()).status, MeetingStatus::Cancelled);
    }

    #[test]
    fn room_equipment_is_split() {
        let dto: RoomDto = serde_json::from_value(json!({
            "id": 3,
            "roomName": "Training Room",
            "capacity": 30,
            "equipment": "Projector、Whiteboard",
            "status": 0
        }))
        .unwrap();
        let room = MeetingRoom::from(dto);
        assert_eq!(room.equipment, vec!["Projector", "Whiteboard"]);
        assert!(!room.available);
    }

    #[test]
    fn attendees_split_from_string() {
        let dto: MeetingDto =
            serde_json::from_value(json!({ "id": 1, "attendees": "alice，bob,carol" })).unwrap();
        assert_eq!(dto.attendees, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn room_tolerates_null_and_string_capacity() {
        let dto: RoomDto =
            serde_json::from_value(json!({ "id": 4, "name": "Huddle", "capacity": null })).unwrap();
        let room = MeetingRoom::from(dto);
        assert_eq!(room.capacity, 0);
        assert!(room.available);

        let dto: RoomDto =
            serde_json::from_value(json!({ "id": 5, "capacity": "20", "available": true, "status": 1 }))
                .unwrap();
        let room = MeetingRoom::from(dto);
        assert_eq!(room.capacity, 20);
        assert!(room.available);
    }

    #[test]
    fn organizer_name_preferred_over_id() {
        let dto: MeetingDto = serde_json::from_value(json!({
            "id": 1,
            "organizer": 17,
            "organizerName": "Alice"
        }))
        .unwrap();
        assert_eq!(map_meeting(dto, &[], now()).organizer, "Alice");
    }
}

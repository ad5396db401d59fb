//! Pending exchange requests and their lifecycle: create → approve / reject /
//! cancel, with an optimistic staleness check on approval.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{MinuteRange, RequestId, SlotId, TimeOfDay, UserId};
use shared::DomainError;

use crate::room::{Room, RoomStatus};
use crate::slots::{Slot, SlotStatus, SUBJECT_EXCHANGED};
use crate::travel::{recompute_travel_slots, TravelMatrix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    TimeChange,
    SlotSwap,
    SlotRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// A by-value copy of one requester slot at request-creation time. Slots are
/// captured by value, never by id, so deleting the original cannot orphan
/// the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub subject: String,
}

impl SlotSnapshot {
    pub fn of(slot: &Slot) -> Self {
        Self {
            date: slot.date,
            start: slot.start,
            end: slot.end,
            subject: slot.subject.clone(),
        }
    }

    pub fn range(&self) -> MinuteRange {
        MinuteRange::new(self.start.as_minutes(), self.end.as_minutes())
    }
}

/// The window the requester wants, described by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSlotDesc {
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub subject: String,
}

impl TargetSlotDesc {
    pub fn range(&self) -> MinuteRange {
        MinuteRange::new(self.start.as_minutes(), self.end.as_minutes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRequest {
    pub id: RequestId,
    pub requester_id: UserId,
    /// Absent for a release request.
    #[serde(default)]
    pub target_user_id: Option<UserId>,
    pub kind: RequestKind,
    pub requester_slots: Vec<SlotSnapshot>,
    pub target_slot: TargetSlotDesc,
    #[serde(default)]
    pub message: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// Result of an approval attempt.
#[derive(Debug, Clone)]
pub enum ApprovalOutcome {
    Approved {
        request: ExchangeRequest,
        source_date: NaiveDate,
        target_date: NaiveDate,
    },
    /// The optimistic check failed: the schedule moved under the request,
    /// which auto-rejected.
    Stale { request: ExchangeRequest },
}

fn take_pending(room: &mut Room, request_id: RequestId) -> Result<usize, DomainError> {
    room.requests
        .iter()
        .position(|r| r.id == request_id && r.status == RequestStatus::Pending)
        .ok_or_else(|| DomainError::RequestNotFound(request_id.to_string()))
}

fn slot_status_for(room: &Room) -> SlotStatus {
    match room.status {
        RoomStatus::Confirmed => SlotStatus::Confirmed,
        RoomStatus::Draft => SlotStatus::Proposed,
    }
}

/// Approve a pending request as its target user; swaps both parties' windows
/// and recomputes travel on the affected dates.
pub fn approve_request(
    room: &mut Room,
    request_id: RequestId,
    approver: UserId,
    matrix: &TravelMatrix,
) -> Result<ApprovalOutcome, DomainError> {
    let index = take_pending(room, request_id)?;
    let request = room.requests[index].clone();

    match request.target_user_id {
        Some(target) if approver != target => return Err(DomainError::NotRequestTarget),
        None if approver != room.owner_id => return Err(DomainError::NotRequestTarget),
        _ => {}
    }

    // Optimistic staleness check against the live store.
    if !request_still_applies(room, &request) {
        let mut rejected = room.requests.remove(index);
        rejected.status = RequestStatus::Rejected;
        return Ok(ApprovalOutcome::Stale { request: rejected });
    }

    let source_date = request.requester_slots[0].date;
    let target_date = request.target_slot.date;
    let status = slot_status_for(room);

    // Requester's captured slots, matched by value.
    let requester_ids: Vec<SlotId> = request
        .requester_slots
        .iter()
        .filter_map(|snap| {
            room.slots
                .class_for_user_on(request.requester_id, snap.date)
                .iter()
                .find(|s| s.start == snap.start && s.end == snap.end)
                .map(|s| s.id)
        })
        .collect();

    let source_start = request.requester_slots.iter().map(|s| s.start).min();
    let source_end = request.requester_slots.iter().map(|s| s.end).max();
    let (Some(source_start), Some(source_end)) = (source_start, source_end) else {
        return Err(DomainError::StaleRequest);
    };

    match request.target_user_id {
        Some(target) => {
            let desc_range = request.target_slot.range();
            let target_ids: Vec<SlotId> = room
                .slots
                .class_for_user_on(target, target_date)
                .iter()
                .filter(|s| s.range().overlaps(&desc_range))
                .map(|s| s.id)
                .collect();

            // The mirrored swap must itself be conflict-free; if either side
            // grew new slots in the way, treat the request as stale.
            let source_range = MinuteRange::new(source_start.as_minutes(), source_end.as_minutes());
            let target_side_clear = room
                .slots
                .class_for_user_on(target, source_date)
                .iter()
                .all(|s| target_ids.contains(&s.id) || !s.range().overlaps(&source_range));
            let requester_side_clear = room
                .slots
                .class_for_user_on(request.requester_id, target_date)
                .iter()
                .all(|s| requester_ids.contains(&s.id) || !s.range().overlaps(&desc_range));
            if !target_side_clear || !requester_side_clear {
                let mut rejected = room.requests.remove(index);
                rejected.status = RequestStatus::Rejected;
                return Ok(ApprovalOutcome::Stale { request: rejected });
            }

            room.slots.remove_by_ids(&requester_ids);
            room.slots.remove_by_ids(&target_ids);

            let target_color = room.color_of(target);
            room.slots.add_class(
                Slot::class(
                    target,
                    source_date,
                    source_start,
                    source_end,
                    SUBJECT_EXCHANGED,
                    status,
                )
                .with_color(target_color),
            )?;

            let requester_color = room.color_of(request.requester_id);
            room.slots.add_class(
                Slot::class(
                    request.requester_id,
                    target_date,
                    request.target_slot.start,
                    request.target_slot.end,
                    SUBJECT_EXCHANGED,
                    status,
                )
                .with_color(requester_color),
            )?;
        }
        None => {
            // Release: the requester gives the captured slots up.
            room.slots.remove_by_ids(&requester_ids);
        }
    }

    recompute_travel_slots(room, source_date, matrix, None);
    if target_date != source_date {
        recompute_travel_slots(room, target_date, matrix, None);
    }

    let mut approved = room.requests.remove(index);
    approved.status = RequestStatus::Approved;
    Ok(ApprovalOutcome::Approved {
        request: approved,
        source_date,
        target_date,
    })
}

/// Whether the schedule still matches what the request captured: every
/// requester snapshot must exist verbatim, and (for a targeted request) the
/// target must still occupy the requested window.
fn request_still_applies(room: &Room, request: &ExchangeRequest) -> bool {
    if request.requester_slots.is_empty() {
        return false;
    }

    let snapshots_intact = request.requester_slots.iter().all(|snap| {
        room.slots
            .class_for_user_on(request.requester_id, snap.date)
            .iter()
            .any(|s| s.start == snap.start && s.end == snap.end)
    });
    if !snapshots_intact {
        return false;
    }

    match request.target_user_id {
        Some(target) => {
            let desc_range = request.target_slot.range();
            room.slots
                .class_for_user_on(target, request.target_slot.date)
                .iter()
                .any(|s| s.range().overlaps(&desc_range))
        }
        None => true,
    }
}

/// Reject a pending request as its target user. No slots move.
pub fn reject_request(
    room: &mut Room,
    request_id: RequestId,
    caller: UserId,
) -> Result<ExchangeRequest, DomainError> {
    let index = take_pending(room, request_id)?;
    let authorized = match room.requests[index].target_user_id {
        Some(target) => caller == target,
        None => caller == room.owner_id,
    };
    if !authorized {
        return Err(DomainError::NotRequestTarget);
    }
    let mut request = room.requests.remove(index);
    request.status = RequestStatus::Rejected;
    Ok(request)
}

/// Cancel a pending request as its requester. No slots move.
pub fn cancel_request(
    room: &mut Room,
    request_id: RequestId,
    caller: UserId,
) -> Result<ExchangeRequest, DomainError> {
    let index = take_pending(room, request_id)?;
    if room.requests[index].requester_id != caller {
        return Err(DomainError::NotRequester);
    }
    let mut request = room.requests.remove(index);
    request.status = RequestStatus::Cancelled;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{Member, RoomSettings};
    use crate::slots::SUBJECT_AUTO_ASSIGNED;
    use shared::types::RoomId;

    // 2024-06-12 is a Wednesday.
    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn setup() -> (Room, UserId, UserId) {
        let mut room = Room::new(
            RoomId::new(),
            "스터디",
            UserId::new(),
            "방장",
            RoomSettings::default(),
            Utc::now(),
        );
        let a = UserId::new();
        let b = UserId::new();
        room.members.push(Member::new(a, "멤버A"));
        room.members.push(Member::new(b, "멤버B"));
        (room, a, b)
    }

    fn add_slot(room: &mut Room, user: UserId, date: NaiveDate, sh: i32, eh: i32) -> SlotId {
        room.slots
            .add_class(Slot::class(
                user,
                date,
                TimeOfDay::from_hm(sh, 0),
                TimeOfDay::from_hm(eh, 0),
                SUBJECT_AUTO_ASSIGNED,
                SlotStatus::Proposed,
            ))
            .unwrap()
    }

    fn pending_request(room: &mut Room, requester: UserId, target: UserId) -> RequestId {
        let snapshot = {
            let slot = room.slots.class_for_user_on(requester, monday())[0];
            SlotSnapshot::of(slot)
        };
        let request = ExchangeRequest {
            id: RequestId::new(),
            requester_id: requester,
            target_user_id: Some(target),
            kind: RequestKind::TimeChange,
            requester_slots: vec![snapshot],
            target_slot: TargetSlotDesc {
                date: wednesday(),
                start: TimeOfDay::from_hm(10, 0),
                end: TimeOfDay::from_hm(11, 0),
                subject: SUBJECT_AUTO_ASSIGNED.to_string(),
            },
            message: None,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        };
        let id = request.id;
        room.requests.push(request);
        id
    }

    #[test]
    fn test_approve_swaps_both_parties() {
        let (mut room, a, b) = setup();
        add_slot(&mut room, a, monday(), 10, 11);
        add_slot(&mut room, b, wednesday(), 10, 11);
        let request_id = pending_request(&mut room, a, b);

        let outcome = approve_request(&mut room, request_id, b, &TravelMatrix::new()).unwrap();
        assert!(matches!(outcome, ApprovalOutcome::Approved { .. }));
        assert!(room.requests.is_empty());

        // A now holds Wednesday, B holds A's old Monday window.
        let a_slots = room.slots.class_for_user_on(a, wednesday());
        assert_eq!(a_slots.len(), 1);
        assert_eq!(a_slots[0].start, TimeOfDay::from_hm(10, 0));
        assert_eq!(a_slots[0].subject, SUBJECT_EXCHANGED);
        assert!(room.slots.class_for_user_on(a, monday()).is_empty());

        let b_slots = room.slots.class_for_user_on(b, monday());
        assert_eq!(b_slots.len(), 1);
        assert_eq!(b_slots[0].start, TimeOfDay::from_hm(10, 0));
        assert!(room.slots.class_for_user_on(b, wednesday()).is_empty());
    }

    #[test]
    fn test_approve_requires_target_user() {
        let (mut room, a, b) = setup();
        add_slot(&mut room, a, monday(), 10, 11);
        add_slot(&mut room, b, wednesday(), 10, 11);
        let request_id = pending_request(&mut room, a, b);

        let err = approve_request(&mut room, request_id, a, &TravelMatrix::new()).unwrap_err();
        assert!(matches!(err, DomainError::NotRequestTarget));
        assert_eq!(room.requests.len(), 1);
    }

    #[test]
    fn test_approve_after_target_moved_is_stale() {
        let (mut room, a, b) = setup();
        add_slot(&mut room, a, monday(), 10, 11);
        let b_slot = add_slot(&mut room, b, wednesday(), 10, 11);
        let request_id = pending_request(&mut room, a, b);

        // B moves the contested slot before approving.
        room.slots.remove_by_ids(&[b_slot]);
        add_slot(&mut room, b, wednesday(), 14, 15);

        let outcome = approve_request(&mut room, request_id, b, &TravelMatrix::new()).unwrap();
        match outcome {
            ApprovalOutcome::Stale { request } => {
                assert_eq!(request.status, RequestStatus::Rejected);
            }
            other => panic!("expected stale, got {:?}", other),
        }
        // Auto-rejected and removed; no slots moved.
        assert!(room.requests.is_empty());
        assert_eq!(room.slots.class_for_user_on(a, monday()).len(), 1);
        assert_eq!(room.slots.class_for_user_on(b, wednesday()).len(), 1);
    }

    #[test]
    fn test_approve_after_requester_slot_changed_is_stale() {
        let (mut room, a, b) = setup();
        let a_slot = add_slot(&mut room, a, monday(), 10, 11);
        add_slot(&mut room, b, wednesday(), 10, 11);
        let request_id = pending_request(&mut room, a, b);

        room.slots.remove_by_ids(&[a_slot]);
        add_slot(&mut room, a, monday(), 13, 14);

        let outcome = approve_request(&mut room, request_id, b, &TravelMatrix::new()).unwrap();
        assert!(matches!(outcome, ApprovalOutcome::Stale { .. }));
    }

    #[test]
    fn test_reject_leaves_slots_untouched() {
        let (mut room, a, b) = setup();
        add_slot(&mut room, a, monday(), 10, 11);
        add_slot(&mut room, b, wednesday(), 10, 11);
        let request_id = pending_request(&mut room, a, b);

        let request = reject_request(&mut room, request_id, b).unwrap();
        assert_eq!(request.status, RequestStatus::Rejected);
        assert!(room.requests.is_empty());
        assert_eq!(room.slots.class_for_user_on(a, monday()).len(), 1);
        assert_eq!(room.slots.class_for_user_on(b, wednesday()).len(), 1);
    }

    #[test]
    fn test_cancel_only_by_requester() {
        let (mut room, a, b) = setup();
        add_slot(&mut room, a, monday(), 10, 11);
        add_slot(&mut room, b, wednesday(), 10, 11);
        let request_id = pending_request(&mut room, a, b);

        assert!(matches!(
            cancel_request(&mut room, request_id, b),
            Err(DomainError::NotRequester)
        ));
        let request = cancel_request(&mut room, request_id, a).unwrap();
        assert_eq!(request.status, RequestStatus::Cancelled);
        assert!(room.requests.is_empty());
    }

    #[test]
    fn test_unknown_request_id() {
        let (mut room, a, _b) = setup();
        assert!(matches!(
            cancel_request(&mut room, RequestId::new(), a),
            Err(DomainError::RequestNotFound(_))
        ));
    }
}

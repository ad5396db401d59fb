//! The exchange planner: takes a validated parsed intent and classifies it
//! into an immediate move, an auto-placement, or a pending yield request.

use chrono::{DateTime, NaiveDate, Utc};
use shared::types::{
    date_key, intersect_sets, round_up_to_step, subtract_ranges, weekday_of, MinuteRange,
    RequestId, SlotId, TimeOfDay, TravelMode, UserId, SLOT_GRANULARITY_MINUTES,
};
use shared::{DomainError, TravelConflict};
use std::collections::HashMap;

use crate::blocked::{blocked_intervals, is_blocked};
use crate::config::CoordinationConfig;
use crate::preference::{preferred_windows, preferred_windows_this_week};
use crate::profile::UserProfile;
use crate::room::Room;
use crate::slots::{ContinuousBlock, Slot};
use crate::travel::{recompute_travel_slots, TravelMatrix};

use super::intent::ParsedIntent;
use super::request::{
    ExchangeRequest, RequestKind, RequestStatus, SlotSnapshot, TargetSlotDesc,
};

/// Read-only collaborators the planner needs per call.
pub struct ExchangeContext<'a> {
    pub profiles: &'a HashMap<UserId, UserProfile>,
    pub matrix: &'a TravelMatrix,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
    pub config: &'a CoordinationConfig,
}

/// Preference windows on the target date, resolved once per exchange.
struct WindowSet {
    owner: Vec<MinuteRange>,
    requester: Vec<MinuteRange>,
    intersection: Vec<MinuteRange>,
}

#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    /// The requester already sits at the target window; nothing changed.
    AlreadyInPlace {
        date: NaiveDate,
        start: TimeOfDay,
        end: TimeOfDay,
    },
    /// Case A / B: the slot moved. `start`/`end` are the final, possibly
    /// travel-shifted times.
    Moved {
        source_date: NaiveDate,
        date: NaiveDate,
        start: TimeOfDay,
        end: TimeOfDay,
        auto_placed: bool,
    },
    /// Case C: a pending request was created; no slots moved.
    NeedsApproval {
        request_id: RequestId,
        target_user_id: UserId,
        date: NaiveDate,
        start: TimeOfDay,
        end: TimeOfDay,
    },
}

/// Plan and apply an exchange for `requester_id` per the parsed intent.
pub fn plan_exchange(
    room: &mut Room,
    requester_id: UserId,
    intent: &ParsedIntent,
    ctx: &ExchangeContext,
) -> Result<ExchangeOutcome, DomainError> {
    if !room.is_member(requester_id) {
        return Err(DomainError::NotAMember);
    }

    let (source_date, source_time, target_date, target_time) = match intent {
        ParsedIntent::TimeChange(tc) => (
            tc.resolve_source_date(ctx.today),
            tc.source_time,
            tc.resolve_target_date(ctx.today)?,
            tc.target_time,
        ),
        ParsedIntent::DateChange(dc) => (
            dc.resolve_source_date(ctx.today)?,
            dc.source_time,
            dc.resolve_target_date(ctx.today)?,
            dc.target_time,
        ),
        ParsedIntent::Confirm | ParsedIntent::Reject => {
            return Err(DomainError::InvalidIntent(
                "확인/거절 응답은 일정 이동 요청이 아닙니다".to_string(),
            ))
        }
    };

    execute_move(
        room,
        requester_id,
        source_date,
        source_time,
        target_date,
        target_time,
        ctx,
    )
}

fn fmt_windows(windows: &[MinuteRange]) -> String {
    windows
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[allow(clippy::too_many_arguments)]
fn execute_move(
    room: &mut Room,
    requester_id: UserId,
    source_date: NaiveDate,
    source_time: Option<TimeOfDay>,
    target_date: NaiveDate,
    target_time: Option<TimeOfDay>,
    ctx: &ExchangeContext,
) -> Result<ExchangeOutcome, DomainError> {
    // V1: weekdays only.
    let target_weekday = weekday_of(target_date);
    if !target_weekday.is_weekday() {
        return Err(DomainError::preference(format!(
            "{}은 {}입니다. 평일로만 이동할 수 있습니다",
            date_key(target_date),
            target_weekday.korean()
        )));
    }

    // V2: the requester must have something to move.
    let blocks = room.slots.blocks_for_user_on(requester_id, source_date);
    let block: ContinuousBlock = match source_time {
        Some(t) => blocks
            .iter()
            .find(|b| b.range().contains_min(t.as_minutes()))
            .or_else(|| blocks.first()),
        None => blocks.first(),
    }
    .cloned()
    .ok_or_else(|| {
        DomainError::preference(format!("{}에 이동할 일정이 없습니다", date_key(source_date)))
    })?;

    let duration = block.duration_minutes();
    let new_start = target_time
        .map(|t| t.as_minutes())
        .unwrap_or_else(|| block.start.as_minutes());
    let new_range = MinuteRange::new(new_start, new_start + duration);

    let owner_profile = ctx
        .profiles
        .get(&room.owner_id)
        .ok_or_else(|| DomainError::ProfileNotFound(room.owner_id.to_string()))?;
    let requester_profile = ctx
        .profiles
        .get(&requester_id)
        .ok_or_else(|| DomainError::ProfileNotFound(requester_id.to_string()))?;

    let owner_windows = preferred_windows(owner_profile, target_date);
    let requester_windows =
        preferred_windows_this_week(requester_profile, target_date, ctx.today);
    let windows = WindowSet {
        intersection: intersect_sets(&owner_windows, &requester_windows),
        owner: owner_windows,
        requester: requester_windows,
    };

    // V3: owner availability on the target date.
    if windows.owner.is_empty() {
        return Err(DomainError::preference(format!(
            "방장은 {}({})에 가능한 시간이 없습니다",
            date_key(target_date),
            target_weekday.korean()
        )));
    }
    if target_time.is_some()
        && !windows.owner.iter().any(|w| w.contains_range(&new_range))
    {
        return Err(DomainError::preference(format!(
            "{} 시간은 방장 선호 시간을 벗어납니다. 가능한 시간: {}",
            new_range,
            fmt_windows(&windows.owner)
        )));
    }

    // V4: requester availability, evaluated against this week's calendar only.
    if windows.requester.is_empty() {
        return Err(DomainError::preference(format!(
            "{}({})에 회원님의 선호 시간이 없습니다",
            date_key(target_date),
            target_weekday.korean()
        )));
    }

    // V5: the whole window must sit inside the common preference.
    if !windows
        .intersection
        .iter()
        .any(|w| w.contains_range(&new_range))
    {
        return Err(DomainError::preference(format!(
            "{} 시간은 공통 선호 시간이 아닙니다. 가능한 시간: {}",
            new_range,
            fmt_windows(&windows.intersection)
        )));
    }

    // V6: room-wide blocked intervals.
    if let Some(reason) = is_blocked(&room.settings, target_date, &new_range) {
        return Err(DomainError::preference(format!(
            "{} 시간대는 차단된 시간({})과 겹쳐 배정할 수 없습니다",
            new_range, reason
        )));
    }

    // Already at the target: succeed without touching the store.
    if block.date == target_date && block.range() == new_range {
        return Ok(ExchangeOutcome::AlreadyInPlace {
            date: target_date,
            start: block.start,
            end: block.end,
        });
    }

    let conflicting: Vec<(SlotId, UserId, String)> = room
        .slots
        .class_by_date(target_date)
        .iter()
        .filter(|s| !block.slot_ids.contains(&s.id) && s.range().overlaps(&new_range))
        .map(|s| (s.id, s.user_id, s.subject.clone()))
        .collect();

    // Case A: the window is free.
    if conflicting.is_empty() {
        return apply_move(room, &block, target_date, new_range, false, &windows, ctx);
    }

    // Case B: no explicit time, so look for the earliest free window at or
    // after the requested start.
    if target_time.is_none() {
        if let Some(start) = find_free_start(room, &block, target_date, new_start, duration, &windows, ctx)
        {
            let range = MinuteRange::new(start, start + duration);
            return apply_move(room, &block, target_date, range, true, &windows, ctx);
        }
        if let Some((_, other_user, subject)) =
            conflicting.iter().find(|(_, u, _)| *u != block.user_id)
        {
            return create_yield_request(
                room,
                &block,
                target_date,
                new_range,
                *other_user,
                subject.clone(),
                ctx,
            );
        }
        return Err(DomainError::preference(format!(
            "{}에 이동 가능한 빈 시간이 없습니다",
            date_key(target_date)
        )));
    }

    // Case C: explicit time into someone else's slot.
    match conflicting.iter().find(|(_, u, _)| *u != block.user_id) {
        Some((_, other_user, subject)) => create_yield_request(
            room,
            &block,
            target_date,
            new_range,
            *other_user,
            subject.clone(),
            ctx,
        ),
        None => Err(DomainError::preference(format!(
            "{} {} 시간에 이미 본인 일정이 있습니다",
            date_key(target_date),
            new_range
        ))),
    }
}

/// Case A / B application: delete the source block, insert the new slot,
/// recompute travel on both affected dates.
fn apply_move(
    room: &mut Room,
    block: &ContinuousBlock,
    target_date: NaiveDate,
    new_range: MinuteRange,
    auto_placed: bool,
    windows: &WindowSet,
    ctx: &ExchangeContext,
) -> Result<ExchangeOutcome, DomainError> {
    if room.effective_travel_mode() != TravelMode::None {
        travel_preflight(room, block, target_date, &new_range, windows, ctx)?;
    }

    let source_date = block.date;
    room.slots.remove_by_ids(&block.slot_ids);

    let color = room.color_of(block.user_id);
    let slot = Slot::class(
        block.user_id,
        target_date,
        TimeOfDay::from_minutes(new_range.start),
        TimeOfDay::from_minutes(new_range.end),
        block.subject.clone(),
        block.status,
    )
    .with_color(color);
    let slot_id = room.slots.add_class(slot)?;

    recompute_travel_slots(room, source_date, ctx.matrix, None);
    if target_date != source_date {
        recompute_travel_slots(room, target_date, ctx.matrix, None);
    }

    let final_slot = room
        .slots
        .class_by_id(slot_id)
        .expect("moved slot vanished after recompute");
    Ok(ExchangeOutcome::Moved {
        source_date,
        date: target_date,
        start: final_slot.start,
        end: final_slot.end,
        auto_placed,
    })
}

enum SimResult {
    Clear,
    Fail(TravelConflict, Option<MinuteRange>),
}

/// Run the travel recomputer against a scratch copy with the proposed slot in
/// place and judge where the slot would end up.
fn simulate(
    room: &Room,
    block: &ContinuousBlock,
    target_date: NaiveDate,
    range: &MinuteRange,
    windows: &WindowSet,
    ctx: &ExchangeContext,
) -> SimResult {
    let mut scratch = room.clone();
    scratch.slots.remove_by_ids(&block.slot_ids);

    let sim = Slot::class(
        block.user_id,
        target_date,
        TimeOfDay::from_minutes(range.start),
        TimeOfDay::from_minutes(range.end),
        block.subject.clone(),
        block.status,
    );
    let sim_id = sim.id;
    if scratch.slots.add_class(sim).is_err() {
        return SimResult::Fail(TravelConflict::Blocked, None);
    }

    let outcome = recompute_travel_slots(&mut scratch, target_date, ctx.matrix, None);
    if outcome.infeasible.contains(&sim_id) {
        return SimResult::Fail(TravelConflict::Blocked, None);
    }

    let final_range = scratch
        .slots
        .class_by_id(sim_id)
        .expect("simulated slot vanished")
        .range();
    if !windows.owner.iter().any(|w| w.contains_range(&final_range)) {
        return SimResult::Fail(TravelConflict::OwnerPreference, Some(final_range));
    }
    if !windows
        .requester
        .iter()
        .any(|w| w.contains_range(&final_range))
    {
        return SimResult::Fail(TravelConflict::Preference, Some(final_range));
    }
    SimResult::Clear
}

fn travel_preflight(
    room: &Room,
    block: &ContinuousBlock,
    target_date: NaiveDate,
    range: &MinuteRange,
    windows: &WindowSet,
    ctx: &ExchangeContext,
) -> Result<(), DomainError> {
    let (conflict, shifted) = match simulate(room, block, target_date, range, windows, ctx) {
        SimResult::Clear => return Ok(()),
        SimResult::Fail(conflict, shifted) => (conflict, shifted),
    };

    let suggested = find_earliest_feasible(room, block, target_date, windows, ctx);

    let mut message = match (conflict, shifted) {
        (TravelConflict::OwnerPreference, Some(range)) => format!(
            "이동시간을 반영하면 {}로 밀려 방장 선호 시간을 벗어납니다",
            range
        ),
        (TravelConflict::Preference, Some(range)) => format!(
            "이동시간을 반영하면 {}로 밀려 회원님의 선호 시간을 벗어납니다",
            range
        ),
        _ => "이동시간을 확보할 수 없는 시간입니다".to_string(),
    };
    if let Some(start) = suggested {
        message.push_str(&format!(" ({} 이후로 배정할 수 있습니다)", start));
    }

    Err(DomainError::TravelInfeasible {
        conflict,
        message,
        suggested_start: suggested,
    })
}

/// Earliest start in the common windows whose simulation passes both the
/// preference and travel checks. Bounded scan at slot granularity.
fn find_earliest_feasible(
    room: &Room,
    block: &ContinuousBlock,
    target_date: NaiveDate,
    windows: &WindowSet,
    ctx: &ExchangeContext,
) -> Option<TimeOfDay> {
    let duration = block.duration_minutes();
    let mut tries = 0usize;

    for window in &windows.intersection {
        let mut start = round_up_to_step(window.start, SLOT_GRANULARITY_MINUTES);
        while start + duration <= window.end && tries < 48 {
            tries += 1;
            let range = MinuteRange::new(start, start + duration);
            let occupied = room
                .slots
                .class_by_date(target_date)
                .iter()
                .any(|s| !block.slot_ids.contains(&s.id) && s.range().overlaps(&range));
            if !occupied
                && is_blocked(&room.settings, target_date, &range).is_none()
                && matches!(
                    simulate(room, block, target_date, &range, windows, ctx),
                    SimResult::Clear
                )
            {
                return Some(TimeOfDay::from_minutes(start));
            }
            start += SLOT_GRANULARITY_MINUTES;
        }
    }
    None
}

/// Case B search: earliest free, unblocked, preference-fitting window at or
/// after the requested start, stepping by the configured increment.
fn find_free_start(
    room: &Room,
    block: &ContinuousBlock,
    target_date: NaiveDate,
    not_before: i32,
    duration: i32,
    windows: &WindowSet,
    ctx: &ExchangeContext,
) -> Option<i32> {
    let blocked = blocked_intervals(&room.settings, target_date);
    let available = subtract_ranges(&windows.intersection, &blocked);
    let occupied: Vec<MinuteRange> = room
        .slots
        .class_by_date(target_date)
        .iter()
        .filter(|s| !block.slot_ids.contains(&s.id))
        .map(|s| s.range())
        .collect();
    let free = subtract_ranges(&available, &occupied);

    let step = ctx.config.search_step_minutes.max(1);
    let travel_active = room.effective_travel_mode() != TravelMode::None;

    for window in &free {
        let mut start = window.start.max(not_before);
        while start + duration <= window.end {
            let range = MinuteRange::new(start, start + duration);
            if !travel_active
                || matches!(
                    simulate(room, block, target_date, &range, windows, ctx),
                    SimResult::Clear
                )
            {
                return Some(start);
            }
            start += step;
        }
    }
    None
}

/// Case C: capture the source block by value and park a pending request for
/// the occupant to approve.
fn create_yield_request(
    room: &mut Room,
    block: &ContinuousBlock,
    target_date: NaiveDate,
    new_range: MinuteRange,
    target_user: UserId,
    subject: String,
    ctx: &ExchangeContext,
) -> Result<ExchangeOutcome, DomainError> {
    let snapshots: Vec<SlotSnapshot> = block
        .slot_ids
        .iter()
        .filter_map(|id| room.slots.class_by_id(*id))
        .map(SlotSnapshot::of)
        .collect();

    let request = ExchangeRequest {
        id: RequestId::new(),
        requester_id: block.user_id,
        target_user_id: Some(target_user),
        kind: RequestKind::TimeChange,
        requester_slots: snapshots,
        target_slot: TargetSlotDesc {
            date: target_date,
            start: TimeOfDay::from_minutes(new_range.start),
            end: TimeOfDay::from_minutes(new_range.end),
            subject,
        },
        message: None,
        status: RequestStatus::Pending,
        created_at: ctx.now,
    };

    let request_id = request.id;
    let (start, end) = (request.target_slot.start, request.target_slot.end);
    room.requests.push(request);

    Ok(ExchangeOutcome::NeedsApproval {
        request_id,
        target_user_id: target_user,
        date: target_date,
        start,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::WeeklyPreference;
    use crate::room::{BlockedTime, Member, RoomSettings};
    use crate::slots::{SlotStatus, SUBJECT_AUTO_ASSIGNED};
    use crate::travel::TravelLeg;
    use chrono::Duration;
    use shared::types::{DayOfWeek, RoomId};

    use super::super::intent::TimeChangeIntent;

    // 2024-06-10 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn wednesday() -> NaiveDate {
        monday() + Duration::days(2)
    }

    fn weekly(day: DayOfWeek, sh: i32, eh: i32) -> WeeklyPreference {
        WeeklyPreference {
            day_of_week: day,
            start: TimeOfDay::from_hm(sh, 0),
            end: TimeOfDay::from_hm(eh, 0),
            priority: 1,
            specific_date: None,
        }
    }

    struct Fixture {
        room: Room,
        profiles: HashMap<UserId, UserProfile>,
        member: UserId,
        other: UserId,
        config: CoordinationConfig,
        matrix: TravelMatrix,
    }

    impl Fixture {
        /// Owner prefers Mon-Fri 09:00~18:00; the member prefers Mon and Wed
        /// 09:00~12:00.
        fn new() -> Self {
            let owner = UserId::new();
            let mut room = Room::new(
                RoomId::new(),
                "스터디",
                owner,
                "방장",
                RoomSettings::default(),
                chrono::Utc::now(),
            );

            let member = UserId::new();
            let other = UserId::new();
            room.members.push(Member::new(member, "멤버M"));
            room.members.push(Member::new(other, "멤버N"));

            let mut profiles = HashMap::new();
            let mut owner_profile = UserProfile::new(owner, "방장");
            for day in [
                DayOfWeek::Monday,
                DayOfWeek::Tuesday,
                DayOfWeek::Wednesday,
                DayOfWeek::Thursday,
                DayOfWeek::Friday,
            ] {
                owner_profile.default_schedule.push(weekly(day, 9, 18));
            }
            profiles.insert(owner, owner_profile);

            let mut member_profile = UserProfile::new(member, "멤버M");
            member_profile
                .default_schedule
                .push(weekly(DayOfWeek::Monday, 9, 12));
            member_profile
                .default_schedule
                .push(weekly(DayOfWeek::Wednesday, 9, 12));
            profiles.insert(member, member_profile);

            let mut other_profile = UserProfile::new(other, "멤버N");
            other_profile
                .default_schedule
                .push(weekly(DayOfWeek::Wednesday, 9, 12));
            profiles.insert(other, other_profile);

            Self {
                room,
                profiles,
                member,
                other,
                config: CoordinationConfig::default(),
                matrix: TravelMatrix::new(),
            }
        }

        fn add_slot(&mut self, user: UserId, date: NaiveDate, sh: i32, eh: i32) -> SlotId {
            self.room
                .slots
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
    }

    /// Run an exchange against the fixture; field borrows stay disjoint.
    fn exchange(
        fx: &mut Fixture,
        user: UserId,
        intent: &ParsedIntent,
    ) -> Result<ExchangeOutcome, DomainError> {
        let ctx = ExchangeContext {
            profiles: &fx.profiles,
            matrix: &fx.matrix,
            today: monday(),
            now: chrono::Utc::now(),
            config: &fx.config,
        };
        plan_exchange(&mut fx.room, user, intent, &ctx)
    }

    fn move_to(day: DayOfWeek, time: Option<(i32, i32)>) -> ParsedIntent {
        ParsedIntent::TimeChange(TimeChangeIntent {
            source_day: None,
            source_time: None,
            source_week_offset: None,
            target_day: day,
            target_time: time.map(|(h, m)| TimeOfDay::from_hm(h, m)),
            week_offset: None,
            week_number: None,
            month: None,
        })
    }

    #[test]
    fn test_immediate_swap_to_free_window() {
        // Monday 10:00~11:00 moves to a free Wednesday 10:00.
        let mut fx = Fixture::new();
        let member = fx.member;
        fx.add_slot(member, monday(), 10, 11);

        let intent = move_to(DayOfWeek::Wednesday, Some((10, 0)));
        let outcome = exchange(&mut fx, member, &intent).unwrap();

        match outcome {
            ExchangeOutcome::Moved {
                date,
                start,
                end,
                auto_placed,
                ..
            } => {
                assert_eq!(date, wednesday());
                assert_eq!(start, TimeOfDay::from_hm(10, 0));
                assert_eq!(end, TimeOfDay::from_hm(11, 0));
                assert!(!auto_placed);
            }
            other => panic!("expected move, got {:?}", other),
        }

        assert!(fx.room.slots.class_for_user_on(member, monday()).is_empty());
        let moved = fx.room.slots.class_for_user_on(member, wednesday());
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].subject, SUBJECT_AUTO_ASSIGNED);
        assert!(fx.room.slots.travel_by_date(wednesday()).is_empty());
    }

    #[test]
    fn test_auto_placement_steps_past_own_slot() {
        // No target time; Wednesday 10:00 is the member's own slot, so the
        // engine lands on 11:00.
        let mut fx = Fixture::new();
        let member = fx.member;
        fx.add_slot(member, monday(), 10, 11);
        fx.add_slot(member, wednesday(), 10, 11);

        let intent = move_to(DayOfWeek::Wednesday, None);
        let outcome = exchange(&mut fx, member, &intent).unwrap();

        match outcome {
            ExchangeOutcome::Moved {
                start, auto_placed, ..
            } => {
                assert_eq!(start, TimeOfDay::from_hm(11, 0));
                assert!(auto_placed);
            }
            other => panic!("expected auto-placement, got {:?}", other),
        }

        assert!(fx.room.slots.class_for_user_on(member, monday()).is_empty());
        let wed = fx.room.slots.class_for_user_on(member, wednesday());
        assert_eq!(wed.len(), 2);
        assert_eq!(wed[0].range(), MinuteRange::new(600, 660));
        assert_eq!(wed[1].range(), MinuteRange::new(660, 720));
    }

    #[test]
    fn test_yield_request_against_occupant() {
        // Wednesday 10:00 belongs to another member; nothing moves and a
        // pending request is parked.
        let mut fx = Fixture::new();
        let (member, other) = (fx.member, fx.other);
        fx.add_slot(member, monday(), 10, 11);
        fx.add_slot(other, wednesday(), 10, 11);

        let intent = move_to(DayOfWeek::Wednesday, Some((10, 0)));
        let outcome = exchange(&mut fx, member, &intent).unwrap();

        match outcome {
            ExchangeOutcome::NeedsApproval {
                target_user_id,
                date,
                start,
                ..
            } => {
                assert_eq!(target_user_id, other);
                assert_eq!(date, wednesday());
                assert_eq!(start, TimeOfDay::from_hm(10, 0));
            }
            other => panic!("expected yield request, got {:?}", other),
        }

        // No mutation: both parties keep their slots.
        assert_eq!(fx.room.slots.class_for_user_on(member, monday()).len(), 1);
        assert_eq!(fx.room.slots.class_for_user_on(other, wednesday()).len(), 1);
        assert_eq!(fx.room.requests.len(), 1);
        let request = &fx.room.requests[0];
        assert_eq!(request.requester_id, member);
        assert_eq!(request.target_user_id, Some(other));
        assert_eq!(request.requester_slots.len(), 1);
        assert_eq!(request.requester_slots[0].start, TimeOfDay::from_hm(10, 0));
    }

    #[test]
    fn test_absolute_block_rejects_move() {
        // 16:30~17:30 runs into the absolute 17:00~24:00 block.
        let mut fx = Fixture::new();
        let member = fx.member;
        fx.add_slot(member, monday(), 10, 11);
        // Widen the member's Wednesday preference so the common-preference
        // check passes and the blocked-interval rule is what trips.
        fx.profiles
            .get_mut(&member)
            .unwrap()
            .default_schedule
            .push(weekly(DayOfWeek::Wednesday, 12, 18));

        let intent = move_to(DayOfWeek::Wednesday, Some((16, 30)));
        let err = exchange(&mut fx, member, &intent).unwrap_err();

        match err {
            DomainError::PreferenceViolation { message } => {
                assert!(message.contains("17:00~24:00"), "message: {}", message);
            }
            other => panic!("expected preference violation, got {:?}", other),
        }
        assert_eq!(fx.room.slots.class_for_user_on(member, monday()).len(), 1);
    }

    #[test]
    fn test_weekend_target_rejected() {
        let mut fx = Fixture::new();
        let member = fx.member;
        fx.add_slot(member, monday(), 10, 11);

        let intent = move_to(DayOfWeek::Saturday, Some((10, 0)));
        let err = exchange(&mut fx, member, &intent).unwrap_err();
        match err {
            DomainError::PreferenceViolation { message } => {
                assert!(message.contains("토요일"), "message: {}", message);
            }
            other => panic!("expected weekday violation, got {:?}", other),
        }
    }

    #[test]
    fn test_no_source_block_rejected() {
        let mut fx = Fixture::new();
        let member = fx.member;
        let intent = move_to(DayOfWeek::Wednesday, Some((10, 0)));
        let err = exchange(&mut fx, member, &intent).unwrap_err();
        assert!(matches!(err, DomainError::PreferenceViolation { .. }));
    }

    #[test]
    fn test_outside_common_preference_rejected_with_windows() {
        let mut fx = Fixture::new();
        let member = fx.member;
        fx.add_slot(member, monday(), 10, 11);

        // 14:00 is inside the owner's window but outside the member's 9-12.
        let intent = move_to(DayOfWeek::Wednesday, Some((14, 0)));
        let err = exchange(&mut fx, member, &intent).unwrap_err();
        match err {
            DomainError::PreferenceViolation { message } => {
                // The message names the permissible windows.
                assert!(message.contains("09:00~12:00"), "message: {}", message);
            }
            other => panic!("expected preference violation, got {:?}", other),
        }
    }

    #[test]
    fn test_non_member_rejected() {
        let mut fx = Fixture::new();
        let intent = move_to(DayOfWeek::Wednesday, None);
        let err = exchange(&mut fx, UserId::new(), &intent).unwrap_err();
        assert!(matches!(err, DomainError::NotAMember));
    }

    #[test]
    fn test_repeat_move_is_idempotent() {
        // Applying the same time_change twice ends in the same state, the
        // second application reporting "already in place".
        let mut fx = Fixture::new();
        let member = fx.member;
        fx.add_slot(member, monday(), 10, 11);

        let mut intent = TimeChangeIntent {
            source_day: None,
            source_time: None,
            source_week_offset: None,
            target_day: DayOfWeek::Wednesday,
            target_time: Some(TimeOfDay::from_hm(10, 0)),
            week_offset: None,
            week_number: None,
            month: None,
        };
        exchange(
            &mut fx,
            member,
            &ParsedIntent::TimeChange(intent.clone()),
        )
        .unwrap();

        // Same request again, now naming its (new) source day.
        intent.source_day = Some(DayOfWeek::Wednesday);
        let outcome = exchange(&mut fx, member, &ParsedIntent::TimeChange(intent)).unwrap();

        assert!(matches!(outcome, ExchangeOutcome::AlreadyInPlace { .. }));
        let wed = fx.room.slots.class_for_user_on(member, wednesday());
        assert_eq!(wed.len(), 1);
        assert_eq!(wed[0].range(), MinuteRange::new(600, 660));
    }

    #[test]
    fn test_move_and_inverse_restores_assignment() {
        // There and back again preserves the assigned minutes.
        let mut fx = Fixture::new();
        let member = fx.member;
        fx.add_slot(member, monday(), 10, 11);

        let there = move_to(DayOfWeek::Wednesday, Some((10, 0)));
        exchange(&mut fx, member, &there).unwrap();

        let back = ParsedIntent::TimeChange(TimeChangeIntent {
            source_day: Some(DayOfWeek::Wednesday),
            source_time: None,
            source_week_offset: None,
            target_day: DayOfWeek::Monday,
            target_time: Some(TimeOfDay::from_hm(10, 0)),
            week_offset: None,
            week_number: None,
            month: None,
        });
        exchange(&mut fx, member, &back).unwrap();

        let mon = fx.room.slots.class_for_user_on(member, monday());
        assert_eq!(mon.len(), 1);
        assert_eq!(mon[0].range(), MinuteRange::new(600, 660));
        assert!(fx.room.slots.class_for_user_on(member, wednesday()).is_empty());

        let total: i32 = fx
            .room
            .slots
            .class_by_user(member)
            .iter()
            .map(|s| s.duration_minutes())
            .sum();
        assert_eq!(total, 60);
    }

    #[test]
    fn test_travel_preflight_accepts_shifted_placement() {
        // Driving mode with 09:30~09:50 blocked: the class window 10:00~11:00
        // is clear but its 09:40~10:00 travel window is not, so the simulated
        // slot shifts to 10:10~11:10. That still fits the 09:00~12:00
        // intersection and the move applies at the shifted time.
        let mut fx = Fixture::new();
        let member = fx.member;
        fx.room.current_travel_mode = TravelMode::Driving;
        fx.room.settings.blocked_times.push(BlockedTime {
            label: None,
            start: TimeOfDay::from_hm(9, 30),
            end: TimeOfDay::from_hm(9, 50),
        });
        fx.matrix
            .insert(fx.room.owner_id, member, TravelLeg::minutes(20));
        fx.add_slot(member, monday(), 10, 11);

        let intent = move_to(DayOfWeek::Wednesday, Some((10, 0)));
        let outcome = exchange(&mut fx, member, &intent).unwrap();

        match outcome {
            ExchangeOutcome::Moved { start, end, .. } => {
                assert_eq!(start, TimeOfDay::from_hm(10, 10));
                assert_eq!(end, TimeOfDay::from_hm(11, 10));
            }
            other => panic!("expected move, got {:?}", other),
        }

        let travel = fx.room.slots.travel_by_date(wednesday());
        assert_eq!(travel.len(), 1);
        assert_eq!(travel[0].range(), MinuteRange::new(590, 610));
    }

    #[test]
    fn test_travel_preflight_rejects_with_suggestion() {
        // Late-afternoon target with 15:30~15:50 blocked: the travel window
        // collides, the shift lands the class on the absolute 17:00 block,
        // and the next shift runs past the end of the day. The move is
        // rejected with the earliest feasible start named.
        let mut fx = Fixture::new();
        let member = fx.member;
        fx.room.current_travel_mode = TravelMode::Driving;
        fx.room.settings.blocked_times.push(BlockedTime {
            label: None,
            start: TimeOfDay::from_hm(15, 30),
            end: TimeOfDay::from_hm(15, 50),
        });
        fx.matrix
            .insert(fx.room.owner_id, member, TravelLeg::minutes(20));
        let profile = fx.profiles.get_mut(&member).unwrap();
        profile
            .default_schedule
            .retain(|p| p.day_of_week != DayOfWeek::Wednesday);
        profile
            .default_schedule
            .push(weekly(DayOfWeek::Wednesday, 9, 18));
        fx.add_slot(member, monday(), 10, 11);

        let intent = move_to(DayOfWeek::Wednesday, Some((16, 0)));
        let err = exchange(&mut fx, member, &intent).unwrap_err();

        match err {
            DomainError::TravelInfeasible {
                conflict,
                suggested_start,
                ..
            } => {
                assert_eq!(conflict, TravelConflict::Blocked);
                assert_eq!(suggested_start, Some(TimeOfDay::from_hm(9, 0)));
            }
            other => panic!("expected travel conflict, got {:?}", other),
        }
        // Nothing moved.
        assert_eq!(fx.room.slots.class_for_user_on(member, monday()).len(), 1);
    }
}

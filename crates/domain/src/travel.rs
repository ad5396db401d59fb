//! Travel-slot recomputation: whenever class slots on a date change, the
//! travel slots for that date are rebuilt from scratch.
//!
//! The recomputer is pure. Network lookups happen upstream; results arrive
//! here as a resolved [`TravelMatrix`] keyed by participant pairs, so the
//! same code runs against the live store and against scratch copies during
//! simulation.

use chrono::NaiveDate;
use shared::types::{
    round_up_to_step, MinuteRange, SlotId, TimeOfDay, TravelMode, UserId, MINUTES_PER_DAY,
    SLOT_GRANULARITY_MINUTES,
};
use std::collections::HashMap;

use crate::blocked::is_blocked;
use crate::room::Room;
use crate::slots::{Slot, TravelInfo};

/// One resolved travel leg between two participants.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelLeg {
    pub minutes: i32,
    pub distance_text: Option<String>,
}

impl TravelLeg {
    pub fn minutes(minutes: i32) -> Self {
        Self {
            minutes,
            distance_text: None,
        }
    }
}

/// Resolved travel times between participants, `(from, to)` keyed. A missing
/// entry means the leg is unknown (no coordinates) and is skipped.
#[derive(Debug, Clone, Default)]
pub struct TravelMatrix {
    legs: HashMap<(UserId, UserId), TravelLeg>,
}

impl TravelMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: UserId, to: UserId, leg: TravelLeg) {
        self.legs.insert((from, to), leg);
    }

    pub fn get(&self, from: UserId, to: UserId) -> Option<&TravelLeg> {
        self.legs.get(&(from, to))
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

/// A class slot the recomputer had to move to clear a blocked interval.
#[derive(Debug, Clone)]
pub struct ShiftedSlot {
    pub slot_id: SlotId,
    pub user_id: UserId,
    pub from: MinuteRange,
    pub to: MinuteRange,
}

/// What the recomputation did beyond inserting travel slots.
#[derive(Debug, Clone, Default)]
pub struct RecomputeOutcome {
    pub shifted: Vec<ShiftedSlot>,
    /// Slots whose travel window could not be placed before the end of the
    /// day; left untouched, with no travel slot.
    pub infeasible: Vec<SlotId>,
}

/// Rebuild all travel slots on `date` per the room's effective travel mode.
///
/// Class slots are visited in start order. Each slot's leg runs from the
/// previous slot's user (the owner for the first), skipping zero-minute legs.
/// When the travel window or the class window lands on a blocked interval the
/// class slot is shifted forward past it, preserving its duration, until both
/// are clear.
pub fn recompute_travel_slots(
    room: &mut Room,
    date: NaiveDate,
    matrix: &TravelMatrix,
    only_for_user: Option<UserId>,
) -> RecomputeOutcome {
    let mut outcome = RecomputeOutcome::default();
    let mode = room.effective_travel_mode();

    if mode == TravelMode::None {
        room.slots.remove_travel_on(date, None);
        return outcome;
    }

    room.slots.remove_travel_on(date, only_for_user);

    let ordered: Vec<(SlotId, UserId)> = room
        .slots
        .class_by_date(date)
        .iter()
        .map(|s| (s.id, s.user_id))
        .collect();

    let mut prev_user: Option<UserId> = None;
    for (slot_id, user_id) in ordered {
        let from_user = prev_user.unwrap_or(room.owner_id);
        prev_user = Some(user_id);

        if only_for_user.is_some_and(|u| u != user_id) {
            continue;
        }

        let Some(leg) = matrix.get(from_user, user_id) else {
            continue;
        };
        let travel = round_up_to_step(leg.minutes.max(0), SLOT_GRANULARITY_MINUTES);
        if travel == 0 {
            continue;
        }

        let (orig_start, duration, status) = {
            let slot = room
                .slots
                .class_by_id(slot_id)
                .expect("class slot vanished during recompute");
            (slot.start.as_minutes(), slot.duration_minutes(), slot.status)
        };

        // The travel window cannot start before midnight.
        let mut cur_start = orig_start.max(travel);

        let mut feasible = true;
        loop {
            let travel_window = MinuteRange::new(cur_start - travel, cur_start);
            let class_window = MinuteRange::new(cur_start, cur_start + duration);
            let reason = is_blocked(&room.settings, date, &travel_window)
                .or_else(|| is_blocked(&room.settings, date, &class_window));
            let Some(reason) = reason else {
                break;
            };
            // reason.end is strictly past the current travel start, so this
            // always makes progress toward the end of the day.
            let next_start = reason.end + travel;
            if next_start + duration > MINUTES_PER_DAY {
                feasible = false;
                break;
            }
            cur_start = next_start;
        }

        if !feasible {
            outcome.infeasible.push(slot_id);
            continue;
        }

        if cur_start != orig_start {
            let slot = room
                .slots
                .class_by_id_mut(slot_id)
                .expect("class slot vanished during recompute");
            let from = slot.range();
            slot.start = TimeOfDay::from_minutes(cur_start);
            slot.end = TimeOfDay::from_minutes(cur_start + duration);
            let to = slot.range();
            outcome.shifted.push(ShiftedSlot {
                slot_id,
                user_id,
                from,
                to,
            });
        }

        let info = TravelInfo {
            from_label: room.label_of(from_user),
            to_label: room.label_of(user_id),
            duration_text: format!("{}분", travel),
            distance_text: leg.distance_text.clone(),
            mode,
        };
        let travel_slot = Slot::travel(
            user_id,
            date,
            TimeOfDay::from_minutes(cur_start - travel),
            TimeOfDay::from_minutes(cur_start),
            info,
            status,
        )
        .with_color(room.color_of(user_id));
        room.slots.add_travel(travel_slot);
    }

    outcome
}

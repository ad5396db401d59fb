//! Weekly schedule proposal: one class slot per member, placed greedily in
//! the intersection of owner and member preferences minus blocked intervals,
//! with travel-feasibility repair when a travel mode is active.

use chrono::{Duration, NaiveDate};
use shared::types::{
    intersect_sets, subtract_ranges, week_monday, MinuteRange, SlotId, TimeOfDay, TravelMode,
    UserId,
};
use shared::DomainError;
use std::collections::{HashMap, HashSet};

use crate::blocked::blocked_intervals;
use crate::config::CoordinationConfig;
use crate::preference::preferred_windows;
use crate::profile::UserProfile;
use crate::room::Room;
use crate::slots::{Slot, SlotStatus, SUBJECT_AUTO_ASSIGNED};
use crate::travel::{recompute_travel_slots, TravelMatrix};

/// Intersection of owner and member preferred windows on `date`, minus the
/// room's blocked intervals.
pub fn common_windows(
    owner: &UserProfile,
    member: &UserProfile,
    room: &Room,
    date: NaiveDate,
) -> Vec<MinuteRange> {
    let owner_windows = preferred_windows(owner, date);
    let member_windows = preferred_windows(member, date);
    let both = intersect_sets(&owner_windows, &member_windows);
    subtract_ranges(&both, &blocked_intervals(&room.settings, date))
}

/// Result of a weekly scheduling run.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSummary {
    pub placed: Vec<SlotId>,
    /// Members with no feasible window this week.
    pub unplaced: Vec<UserId>,
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    slot_id: SlotId,
    date: NaiveDate,
    start: i32,
}

/// Build a proposed weekly assignment for the week containing `week_start`.
///
/// Members place in roster order; each gets the earliest common window that
/// fits the class duration, earlier dates first. When two members' earliest
/// candidate windows are identical, the one with the higher carry-over
/// counter goes first. Under an active travel mode, slots the recomputer
/// shifted outside the owner-member preference intersection are withdrawn and
/// retried on the next candidate window.
pub fn run_weekly_schedule(
    room: &mut Room,
    profiles: &HashMap<UserId, UserProfile>,
    week_start: NaiveDate,
    matrix: &TravelMatrix,
    config: &CoordinationConfig,
) -> Result<ScheduleSummary, DomainError> {
    let monday = week_monday(week_start);
    let dates: Vec<NaiveDate> = (0..5).map(|i| monday + Duration::days(i)).collect();

    let owner_profile = profiles
        .get(&room.owner_id)
        .ok_or_else(|| DomainError::ProfileNotFound(room.owner_id.to_string()))?;

    let class_duration = if room.settings.class_duration_minutes > 0 {
        room.settings.class_duration_minutes
    } else {
        config.class_duration_minutes
    };

    // A rerun replaces earlier proposals for the week; confirmed slots stay.
    let stale: Vec<SlotId> = room
        .slots
        .all_class()
        .iter()
        .filter(|s| s.status == SlotStatus::Proposed && dates.contains(&s.date))
        .map(|s| s.id)
        .collect();
    room.slots.remove_by_ids(&stale);

    // Roster order is the placement order. Carry-over is consulted, not
    // authoritative: it only decides between members whose earliest candidate
    // window is the same.
    let order: Vec<UserId> = room.members.iter().map(|m| m.user_id).collect();
    let carry: HashMap<UserId, i32> = room
        .members
        .iter()
        .map(|m| (m.user_id, m.carry_over))
        .collect();

    let mut placements: HashMap<UserId, Placement> = HashMap::new();
    let mut tried: HashMap<UserId, HashSet<(NaiveDate, i32)>> = HashMap::new();
    let mut exhausted: HashSet<UserId> = HashSet::new();

    for _round in 0..=config.max_placement_retries {
        // One member at a time: each placement occupies a window and changes
        // the remaining candidates.
        loop {
            let mut next: Option<(UserId, (NaiveDate, i32))> = None;
            for user_id in &order {
                if placements.contains_key(user_id) || exhausted.contains(user_id) {
                    continue;
                }
                let Some(profile) = profiles.get(user_id) else {
                    exhausted.insert(*user_id);
                    continue;
                };

                let candidate = find_candidate(
                    room,
                    owner_profile,
                    profile,
                    &dates,
                    class_duration,
                    config.search_step_minutes,
                    tried.entry(*user_id).or_default(),
                );

                match candidate {
                    Some(candidate) => match &mut next {
                        None => next = Some((*user_id, candidate)),
                        Some((chosen, chosen_candidate)) => {
                            let owed_more = carry.get(user_id).copied().unwrap_or(0)
                                > carry.get(chosen).copied().unwrap_or(0);
                            if candidate == *chosen_candidate && owed_more {
                                *chosen = *user_id;
                            }
                        }
                    },
                    None => {
                        exhausted.insert(*user_id);
                    }
                }
            }

            let Some((user_id, (date, start))) = next else {
                break;
            };

            let slot = Slot::class(
                user_id,
                date,
                TimeOfDay::from_minutes(start),
                TimeOfDay::from_minutes(start + class_duration),
                SUBJECT_AUTO_ASSIGNED,
                SlotStatus::Proposed,
            )
            .with_color(room.color_of(user_id));
            let slot_id = room.slots.add_class(slot)?;
            placements.insert(user_id, Placement { slot_id, date, start });
        }

        if room.effective_travel_mode() == TravelMode::None {
            break;
        }

        // Travel repair: recompute every date, withdraw placements the
        // recomputer pushed outside the preference intersection.
        let mut violating: Vec<UserId> = Vec::new();
        for date in &dates {
            let outcome = recompute_travel_slots(room, *date, matrix, None);

            for shifted in &outcome.shifted {
                let Some((user_id, placement)) = placements
                    .iter()
                    .find(|(_, p)| p.slot_id == shifted.slot_id)
                    .map(|(u, p)| (*u, *p))
                else {
                    continue;
                };
                let profile = &profiles[&user_id];
                let intersection = intersect_sets(
                    &preferred_windows(owner_profile, placement.date),
                    &preferred_windows(profile, placement.date),
                );
                if !intersection.iter().any(|w| w.contains_range(&shifted.to)) {
                    violating.push(user_id);
                }
            }

            for slot_id in &outcome.infeasible {
                if let Some(user_id) = placements
                    .iter()
                    .find(|(_, p)| p.slot_id == *slot_id)
                    .map(|(u, _)| *u)
                {
                    violating.push(user_id);
                }
            }
        }

        if violating.is_empty() {
            break;
        }

        for user_id in violating {
            if let Some(placement) = placements.remove(&user_id) {
                room.slots.remove_by_ids(&[placement.slot_id]);
                tried
                    .entry(user_id)
                    .or_default()
                    .insert((placement.date, placement.start));
            }
        }
    }

    // Withdrawn placements may have left stale travel slots behind.
    if room.effective_travel_mode() != TravelMode::None {
        for date in &dates {
            recompute_travel_slots(room, *date, matrix, None);
        }
    }

    let placed = placements.values().map(|p| p.slot_id).collect();
    let unplaced = room
        .members
        .iter()
        .map(|m| m.user_id)
        .filter(|u| !placements.contains_key(u))
        .collect();

    Ok(ScheduleSummary { placed, unplaced })
}

/// The earliest untried `(date, start)` where a class of `duration` minutes
/// fits the common windows and avoids every existing class slot on the date.
fn find_candidate(
    room: &Room,
    owner: &UserProfile,
    member: &UserProfile,
    dates: &[NaiveDate],
    duration: i32,
    step: i32,
    tried: &HashSet<(NaiveDate, i32)>,
) -> Option<(NaiveDate, i32)> {
    for date in dates {
        let common = common_windows(owner, member, room, *date);
        let occupied: Vec<MinuteRange> = room
            .slots
            .class_by_date(*date)
            .iter()
            .map(|s| s.range())
            .collect();
        let free = subtract_ranges(&common, &occupied);

        for window in free {
            let mut start = window.start;
            while start + duration <= window.end {
                if !tried.contains(&(*date, start)) {
                    return Some((*date, start));
                }
                start += step.max(1);
            }
        }
    }
    None
}

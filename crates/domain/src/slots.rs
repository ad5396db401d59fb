//! The canonical slot set of a room: class slots (primary) and travel slots
//! (derived), with the invariant checks every mutation goes through.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::types::{DayOfWeek, MinuteRange, SlotId, TimeOfDay, TravelMode, UserId};
use shared::DomainError;

/// Subject label for slots placed by the scheduling engine.
pub const SUBJECT_AUTO_ASSIGNED: &str = "자동 배정";
/// Subject label for derived travel slots.
pub const SUBJECT_TRAVEL: &str = "이동시간";
/// Subject label for slots produced by an approved exchange.
pub const SUBJECT_EXCHANGED: &str = "교환 결과";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Proposed,
    Confirmed,
}

/// Provenance of a travel slot, shown to the user alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelInfo {
    pub from_label: String,
    pub to_label: String,
    pub duration_text: String,
    #[serde(default)]
    pub distance_text: Option<String>,
    pub mode: TravelMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub weekday: DayOfWeek,
    #[serde(default)]
    pub is_travel: bool,
    pub subject: String,
    pub status: SlotStatus,
    #[serde(default)]
    pub travel_info: Option<TravelInfo>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub color: Option<String>,
}

impl Slot {
    /// Build a class slot; the weekday is derived from the date.
    pub fn class(
        user_id: UserId,
        date: NaiveDate,
        start: TimeOfDay,
        end: TimeOfDay,
        subject: impl Into<String>,
        status: SlotStatus,
    ) -> Self {
        Self {
            id: SlotId::new(),
            user_id,
            date,
            start,
            end,
            weekday: DayOfWeek::from_date(date),
            is_travel: false,
            subject: subject.into(),
            status,
            travel_info: None,
            priority: None,
            color: None,
        }
    }

    /// Build a travel slot ending exactly where its class slot starts.
    pub fn travel(
        user_id: UserId,
        date: NaiveDate,
        start: TimeOfDay,
        end: TimeOfDay,
        info: TravelInfo,
        status: SlotStatus,
    ) -> Self {
        Self {
            id: SlotId::new(),
            user_id,
            date,
            start,
            end,
            weekday: DayOfWeek::from_date(date),
            is_travel: true,
            subject: SUBJECT_TRAVEL.to_string(),
            status,
            travel_info: Some(info),
            priority: None,
            color: None,
        }
    }

    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }

    pub fn range(&self) -> MinuteRange {
        MinuteRange::new(self.start.as_minutes(), self.end.as_minutes())
    }

    pub fn duration_minutes(&self) -> i32 {
        self.range().duration()
    }
}

/// A maximal run of contiguous class slots of one user on one date.
#[derive(Debug, Clone)]
pub struct ContinuousBlock {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub slot_ids: Vec<SlotId>,
    /// Subject of the first slot in the run.
    pub subject: String,
    pub status: SlotStatus,
}

impl ContinuousBlock {
    pub fn range(&self) -> MinuteRange {
        MinuteRange::new(self.start.as_minutes(), self.end.as_minutes())
    }

    pub fn duration_minutes(&self) -> i32 {
        self.range().duration()
    }
}

/// Slot storage for one room. Class slots are primary; travel slots are
/// derived and rebuilt wholesale by the recomputer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotStore {
    #[serde(default)]
    class_slots: Vec<Slot>,
    #[serde(default)]
    travel_slots: Vec<Slot>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class slot, rejecting any overlap with the same user's existing
    /// class slots on the same date.
    pub fn add_class(&mut self, slot: Slot) -> Result<SlotId, DomainError> {
        debug_assert!(!slot.is_travel);
        let range = slot.range();
        if range.is_empty() {
            return Err(DomainError::preference(format!(
                "잘못된 시간 범위입니다 ({}~{})",
                slot.start, slot.end
            )));
        }
        let conflict = self
            .class_slots
            .iter()
            .any(|s| s.user_id == slot.user_id && s.date == slot.date && s.range().overlaps(&range));
        if conflict {
            return Err(DomainError::SlotConflict);
        }
        let id = slot.id;
        self.class_slots.push(slot);
        Ok(id)
    }

    /// Travel slots are derived; adjacency to their class slot is the
    /// recomputer's responsibility.
    pub fn add_travel(&mut self, slot: Slot) -> SlotId {
        debug_assert!(slot.is_travel);
        let id = slot.id;
        self.travel_slots.push(slot);
        id
    }

    /// Remove slots by id from both lists. Unknown ids are ignored.
    pub fn remove_by_ids(&mut self, ids: &[SlotId]) {
        self.class_slots.retain(|s| !ids.contains(&s.id));
        self.travel_slots.retain(|s| !ids.contains(&s.id));
    }

    /// Drop travel slots on a date, optionally only one user's.
    pub fn remove_travel_on(&mut self, date: NaiveDate, only_for_user: Option<UserId>) {
        self.travel_slots.retain(|s| {
            s.date != date || only_for_user.map_or(false, |u| s.user_id != u)
        });
    }

    pub fn class_by_date(&self, date: NaiveDate) -> Vec<&Slot> {
        let mut slots: Vec<&Slot> = self.class_slots.iter().filter(|s| s.date == date).collect();
        slots.sort_by_key(|s| s.start);
        slots
    }

    pub fn travel_by_date(&self, date: NaiveDate) -> Vec<&Slot> {
        let mut slots: Vec<&Slot> = self.travel_slots.iter().filter(|s| s.date == date).collect();
        slots.sort_by_key(|s| s.start);
        slots
    }

    pub fn class_by_user(&self, user_id: UserId) -> Vec<&Slot> {
        let mut slots: Vec<&Slot> = self
            .class_slots
            .iter()
            .filter(|s| s.user_id == user_id)
            .collect();
        slots.sort_by_key(|s| (s.date, s.start));
        slots
    }

    pub fn class_for_user_on(&self, user_id: UserId, date: NaiveDate) -> Vec<&Slot> {
        let mut slots: Vec<&Slot> = self
            .class_slots
            .iter()
            .filter(|s| s.user_id == user_id && s.date == date)
            .collect();
        slots.sort_by_key(|s| s.start);
        slots
    }

    pub fn all_class(&self) -> &[Slot] {
        &self.class_slots
    }

    pub fn all_travel(&self) -> &[Slot] {
        &self.travel_slots
    }

    pub fn class_by_id(&self, id: SlotId) -> Option<&Slot> {
        self.class_slots.iter().find(|s| s.id == id)
    }

    pub fn class_by_id_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.class_slots.iter_mut().find(|s| s.id == id)
    }

    /// Maximal contiguous runs of one user's class slots, across all dates.
    /// Adjacent slots chain even when their subjects differ.
    pub fn find_continuous_blocks(&self, user_id: UserId) -> Vec<ContinuousBlock> {
        let slots = self.class_by_user(user_id);
        let mut blocks: Vec<ContinuousBlock> = Vec::new();

        for slot in slots {
            match blocks.last_mut() {
                Some(block) if block.date == slot.date && block.end == slot.start => {
                    block.end = slot.end;
                    block.slot_ids.push(slot.id);
                }
                _ => blocks.push(ContinuousBlock {
                    user_id,
                    date: slot.date,
                    start: slot.start,
                    end: slot.end,
                    slot_ids: vec![slot.id],
                    subject: slot.subject.clone(),
                    status: slot.status,
                }),
            }
        }

        blocks
    }

    pub fn blocks_for_user_on(&self, user_id: UserId, date: NaiveDate) -> Vec<ContinuousBlock> {
        self.find_continuous_blocks(user_id)
            .into_iter()
            .filter(|b| b.date == date)
            .collect()
    }

    /// Flip every slot to confirmed (owner confirmation).
    pub fn confirm_all(&mut self) {
        for slot in self.class_slots.iter_mut().chain(self.travel_slots.iter_mut()) {
            slot.status = SlotStatus::Confirmed;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.class_slots.is_empty() && self.travel_slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn class_slot(user: UserId, sh: i32, sm: i32, eh: i32, em: i32) -> Slot {
        Slot::class(
            user,
            date(),
            TimeOfDay::from_hm(sh, sm),
            TimeOfDay::from_hm(eh, em),
            SUBJECT_AUTO_ASSIGNED,
            SlotStatus::Proposed,
        )
    }

    #[test]
    fn test_add_rejects_same_user_overlap() {
        let user = UserId::new();
        let mut store = SlotStore::new();
        store.add_class(class_slot(user, 10, 0, 11, 0)).unwrap();

        let overlapping = class_slot(user, 10, 30, 11, 30);
        assert!(matches!(
            store.add_class(overlapping),
            Err(DomainError::SlotConflict)
        ));

        // Adjacent is fine.
        store.add_class(class_slot(user, 11, 0, 12, 0)).unwrap();
        assert_eq!(store.class_by_date(date()).len(), 2);
    }

    #[test]
    fn test_add_allows_other_user_overlap() {
        let mut store = SlotStore::new();
        store.add_class(class_slot(UserId::new(), 10, 0, 11, 0)).unwrap();
        store.add_class(class_slot(UserId::new(), 10, 0, 11, 0)).unwrap();
        assert_eq!(store.class_by_date(date()).len(), 2);
    }

    #[test]
    fn test_remove_by_ids_is_idempotent() {
        let user = UserId::new();
        let mut store = SlotStore::new();
        let id = store.add_class(class_slot(user, 10, 0, 11, 0)).unwrap();

        store.remove_by_ids(&[id]);
        assert!(store.is_empty());
        // Second removal of the same id is a no-op.
        store.remove_by_ids(&[id]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_find_continuous_blocks_chains_adjacent_slots() {
        let user = UserId::new();
        let mut store = SlotStore::new();
        store.add_class(class_slot(user, 10, 0, 11, 0)).unwrap();
        let mut second = class_slot(user, 11, 0, 12, 0);
        second.subject = SUBJECT_EXCHANGED.to_string();
        store.add_class(second).unwrap();
        store.add_class(class_slot(user, 14, 0, 15, 0)).unwrap();

        let blocks = store.find_continuous_blocks(user);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].start, TimeOfDay::from_hm(10, 0));
        assert_eq!(blocks[0].end, TimeOfDay::from_hm(12, 0));
        assert_eq!(blocks[0].slot_ids.len(), 2);
        // The block takes its subject from the first slot even when a later
        // slot differs.
        assert_eq!(blocks[0].subject, SUBJECT_AUTO_ASSIGNED);
        assert_eq!(blocks[1].duration_minutes(), 60);
    }

    #[test]
    fn test_remove_travel_scoped_to_user() {
        let a = UserId::new();
        let b = UserId::new();
        let mut store = SlotStore::new();
        let info = TravelInfo {
            from_label: "방장".to_string(),
            to_label: "멤버".to_string(),
            duration_text: "20분".to_string(),
            distance_text: None,
            mode: TravelMode::Driving,
        };
        store.add_travel(Slot::travel(
            a,
            date(),
            TimeOfDay::from_hm(9, 40),
            TimeOfDay::from_hm(10, 0),
            info.clone(),
            SlotStatus::Proposed,
        ));
        store.add_travel(Slot::travel(
            b,
            date(),
            TimeOfDay::from_hm(10, 40),
            TimeOfDay::from_hm(11, 0),
            info,
            SlotStatus::Proposed,
        ));

        store.remove_travel_on(date(), Some(a));
        let remaining = store.travel_by_date(date());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user_id, b);

        store.remove_travel_on(date(), None);
        assert!(store.travel_by_date(date()).is_empty());
    }

    #[test]
    fn test_confirm_all() {
        let user = UserId::new();
        let mut store = SlotStore::new();
        store.add_class(class_slot(user, 10, 0, 11, 0)).unwrap();
        store.confirm_all();
        assert!(store
            .all_class()
            .iter()
            .all(|s| s.status == SlotStatus::Confirmed));
    }
}

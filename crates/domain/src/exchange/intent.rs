//! Parsed exchange intents, produced by the external NL parser. This system
//! consumes the structured form only; free-form prose never reaches it.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use shared::types::{week_monday, DayOfWeek, TimeOfDay};
use shared::DomainError;

/// Move a slot to another weekday, optionally at a given time, this week or
/// a given week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeChangeIntent {
    #[serde(default)]
    pub source_day: Option<DayOfWeek>,
    #[serde(default)]
    pub source_time: Option<TimeOfDay>,
    #[serde(default)]
    pub source_week_offset: Option<i32>,
    pub target_day: DayOfWeek,
    #[serde(default)]
    pub target_time: Option<TimeOfDay>,
    /// Whole weeks from the current one; 0 is this week.
    #[serde(default)]
    pub week_offset: Option<i32>,
    /// Explicit "N번째 주" addressing, together with `month`.
    #[serde(default)]
    pub week_number: Option<u32>,
    #[serde(default)]
    pub month: Option<u32>,
}

/// Move a slot to an explicit calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateChangeIntent {
    #[serde(default)]
    pub source_month: Option<u32>,
    #[serde(default)]
    pub source_day: Option<u32>,
    #[serde(default)]
    pub source_time: Option<TimeOfDay>,
    pub target_month: u32,
    pub target_day: u32,
    #[serde(default)]
    pub target_time: Option<TimeOfDay>,
    #[serde(default)]
    pub target_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParsedIntent {
    TimeChange(TimeChangeIntent),
    DateChange(DateChangeIntent),
    /// Positive reply to a pending conversational prompt.
    Confirm,
    /// Negative reply to a pending conversational prompt.
    Reject,
}

impl TimeChangeIntent {
    /// The date the slot is moving from. Defaults to today when no source
    /// day was spoken.
    pub fn resolve_source_date(&self, today: NaiveDate) -> NaiveDate {
        match self.source_day {
            Some(day) => {
                let monday =
                    week_monday(today) + Duration::weeks(self.source_week_offset.unwrap_or(0) as i64);
                monday + Duration::days(day.days_from_monday())
            }
            None => today,
        }
    }

    /// The date the slot is moving to: explicit week-of-month addressing
    /// when present, else a week offset from the current week.
    pub fn resolve_target_date(&self, today: NaiveDate) -> Result<NaiveDate, DomainError> {
        if let (Some(week_number), Some(month)) = (self.week_number, self.month) {
            if week_number == 0 || week_number > 6 {
                return Err(DomainError::InvalidIntent(format!(
                    "잘못된 주차입니다: {}주차",
                    week_number
                )));
            }
            let first = NaiveDate::from_ymd_opt(today.year(), month, 1).ok_or_else(|| {
                DomainError::InvalidIntent(format!("잘못된 월입니다: {}월", month))
            })?;
            let date = week_monday(first)
                + Duration::weeks(week_number as i64 - 1)
                + Duration::days(self.target_day.days_from_monday());
            if date.month() != month {
                return Err(DomainError::InvalidIntent(format!(
                    "{}월 {}주차에 {}이 없습니다",
                    month,
                    week_number,
                    self.target_day.korean()
                )));
            }
            return Ok(date);
        }

        let monday = week_monday(today) + Duration::weeks(self.week_offset.unwrap_or(0) as i64);
        Ok(monday + Duration::days(self.target_day.days_from_monday()))
    }
}

impl DateChangeIntent {
    pub fn resolve_source_date(&self, today: NaiveDate) -> Result<NaiveDate, DomainError> {
        match (self.source_month, self.source_day) {
            (Some(month), Some(day)) => NaiveDate::from_ymd_opt(today.year(), month, day)
                .ok_or_else(|| {
                    DomainError::InvalidIntent(format!("잘못된 날짜입니다: {}월 {}일", month, day))
                }),
            _ => Ok(today),
        }
    }

    pub fn resolve_target_date(&self, today: NaiveDate) -> Result<NaiveDate, DomainError> {
        NaiveDate::from_ymd_opt(
            self.target_year.unwrap_or(today.year()),
            self.target_month,
            self.target_day,
        )
        .ok_or_else(|| {
            DomainError::InvalidIntent(format!(
                "잘못된 날짜입니다: {}월 {}일",
                self.target_month, self.target_day
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-06-12 is a Wednesday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    fn time_change(target_day: DayOfWeek) -> TimeChangeIntent {
        TimeChangeIntent {
            source_day: None,
            source_time: None,
            source_week_offset: None,
            target_day,
            target_time: None,
            week_offset: None,
            week_number: None,
            month: None,
        }
    }

    #[test]
    fn test_source_defaults_to_today() {
        let intent = time_change(DayOfWeek::Friday);
        assert_eq!(intent.resolve_source_date(today()), today());
    }

    #[test]
    fn test_source_day_resolves_in_current_week() {
        let mut intent = time_change(DayOfWeek::Friday);
        intent.source_day = Some(DayOfWeek::Monday);
        assert_eq!(
            intent.resolve_source_date(today()),
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
        );
    }

    #[test]
    fn test_target_this_week_and_next_week() {
        let intent = time_change(DayOfWeek::Friday);
        assert_eq!(
            intent.resolve_target_date(today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
        );

        let mut next_week = time_change(DayOfWeek::Monday);
        next_week.week_offset = Some(1);
        assert_eq!(
            next_week.resolve_target_date(today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 17).unwrap()
        );
    }

    #[test]
    fn test_target_week_of_month_addressing() {
        // Week 1 of June 2024 is the week containing June 1 (Mon 2024-05-27),
        // so week 3 starts Mon 2024-06-10 and its Tuesday is the 11th.
        let mut intent = time_change(DayOfWeek::Tuesday);
        intent.week_number = Some(3);
        intent.month = Some(6);
        assert_eq!(
            intent.resolve_target_date(today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 11).unwrap()
        );
    }

    #[test]
    fn test_invalid_week_number_rejected() {
        let mut intent = time_change(DayOfWeek::Tuesday);
        intent.week_number = Some(0);
        intent.month = Some(6);
        assert!(matches!(
            intent.resolve_target_date(today()),
            Err(DomainError::InvalidIntent(_))
        ));
    }

    #[test]
    fn test_date_change_resolution() {
        let intent = DateChangeIntent {
            source_month: None,
            source_day: None,
            source_time: None,
            target_month: 7,
            target_day: 3,
            target_time: Some(TimeOfDay::from_hm(14, 0)),
            target_year: None,
        };
        assert_eq!(intent.resolve_source_date(today()).unwrap(), today());
        assert_eq!(
            intent.resolve_target_date(today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()
        );
    }

    #[test]
    fn test_date_change_invalid_date() {
        let intent = DateChangeIntent {
            source_month: None,
            source_day: None,
            source_time: None,
            target_month: 2,
            target_day: 31,
            target_time: None,
            target_year: None,
        };
        assert!(matches!(
            intent.resolve_target_date(today()),
            Err(DomainError::InvalidIntent(_))
        ));
    }

    #[test]
    fn test_intent_deserializes_from_parser_payload() {
        let json = r#"{
            "type": "time_change",
            "target_day": "wednesday",
            "target_time": "10:00",
            "week_offset": 0
        }"#;
        let intent: ParsedIntent = serde_json::from_str(json).unwrap();
        match intent {
            ParsedIntent::TimeChange(tc) => {
                assert_eq!(tc.target_day, DayOfWeek::Wednesday);
                assert_eq!(tc.target_time, Some(TimeOfDay::from_hm(10, 0)));
            }
            other => panic!("unexpected intent: {:?}", other),
        }
    }
}

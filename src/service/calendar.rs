use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::info;

use crate::error::ServiceError;
use crate::model::holiday::{Holiday, HolidayDraft, ProjectedHoliday};
use crate::repository::holiday_repo::HolidayRepository;

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;
const MAX_NAME_LEN: usize = 100;

/// Italian national holidays as (month, day, name).
pub const NATIONAL_HOLIDAYS: [(u32, u32, &str); 10] = [
    (1, 1, "Capodanno"),
    (1, 6, "Epifania"),
    (4, 25, "Festa della Liberazione"),
    (5, 1, "Festa del Lavoro"),
    (6, 2, "Festa della Repubblica"),
    (8, 15, "Ferragosto"),
    (11, 1, "Tutti i Santi"),
    (12, 8, "Immacolata Concezione"),
    (12, 25, "Natale"),
    (12, 26, "Santo Stefano"),
];

pub fn validate_year(year: i32) -> Result<(), ServiceError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(ServiceError::validation(format!(
            "year must be between {MIN_YEAR} and {MAX_YEAR}"
        )))
    }
}

/// Non-working dates produced by `rules` in `year`.
pub fn dates_for_year(rules: &[Holiday], year: i32) -> BTreeSet<NaiveDate> {
    rules.iter().filter_map(|rule| rule.date_in(year)).collect()
}

/// Business days in `[start, end]`, skipping weekends and `holidays`.
///
/// An inverted range counts zero.
pub fn working_days(start: NaiveDate, end: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> u32 {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .filter(|day| !holidays.contains(day))
        .count() as u32
}

fn validate_draft(draft: &HolidayDraft) -> Result<HolidayDraft, ServiceError> {
    let name = draft.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::validation(format!(
            "holiday name must be 1 to {MAX_NAME_LEN} characters"
        )));
    }
    validate_year(draft.date.year())?;
    Ok(HolidayDraft {
        name: name.to_string(),
        note: draft
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        ..draft.clone()
    })
}

pub struct HolidayCalendar {
    repo: Arc<dyn HolidayRepository>,
}

impl HolidayCalendar {
    pub fn new(repo: Arc<dyn HolidayRepository>) -> Self {
        Self { repo }
    }

    pub async fn add(&self, draft: &HolidayDraft, actor: u64) -> Result<Holiday, ServiceError> {
        let draft = validate_draft(draft)?;
        let id = self.repo.insert(&draft, Some(actor)).await?;
        info!(holiday_id = id, date = %draft.date, recurring = draft.recurring, "Holiday added");
        self.repo.find(id).await?.ok_or(ServiceError::NotFound("holiday"))
    }

    pub async fn update(&self, id: u64, draft: &HolidayDraft) -> Result<Holiday, ServiceError> {
        let draft = validate_draft(draft)?;
        if !self.repo.update(id, &draft).await? {
            return Err(ServiceError::NotFound("holiday"));
        }
        info!(holiday_id = id, "Holiday updated");
        self.repo.find(id).await?.ok_or(ServiceError::NotFound("holiday"))
    }

    pub async fn delete(&self, id: u64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound("holiday"));
        }
        info!(holiday_id = id, "Holiday deleted");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Holiday>, ServiceError> {
        Ok(self.repo.list_all().await?)
    }

    /// Rules that apply to `year`, projected onto it and ordered by date.
    pub async fn holidays_for_year(&self, year: i32) -> Result<Vec<ProjectedHoliday>, ServiceError> {
        validate_year(year)?;
        let rules = self.repo.rules_for_year(year).await?;
        let mut projected: Vec<ProjectedHoliday> = rules
            .into_iter()
            .filter_map(|rule| {
                rule.date_in(year).map(|date| ProjectedHoliday {
                    id: rule.id,
                    name: rule.name,
                    date,
                    recurring: rule.recurring,
                })
            })
            .collect();
        projected.sort_by_key(|h| (h.date, h.id));
        Ok(projected)
    }

    pub async fn dates_for_year(&self, year: i32) -> Result<BTreeSet<NaiveDate>, ServiceError> {
        let rules = self.repo.rules_for_year(year).await?;
        Ok(dates_for_year(&rules, year))
    }

    /// Working days in `[start, end]` against the holidays of every year the range touches.
    pub async fn working_days(&self, start: NaiveDate, end: NaiveDate) -> Result<u32, ServiceError> {
        if start > end {
            return Ok(0);
        }
        let mut holidays = BTreeSet::new();
        for year in start.year()..=end.year() {
            holidays.extend(self.dates_for_year(year).await?);
        }
        Ok(working_days(start, end, &holidays))
    }

    /// Inserts the national holidays as recurring rules, skipping dates a
    /// recurring rule already covers.
    pub async fn seed_national(&self, year: i32, actor: u64) -> Result<Vec<Holiday>, ServiceError> {
        validate_year(year)?;
        let mut inserted = Vec::new();
        for (month, day, name) in NATIONAL_HOLIDAYS {
            if self.repo.has_recurring(month, day).await? {
                continue;
            }
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| ServiceError::validation(format!("invalid date {year}-{month}-{day}")))?;
            let draft = HolidayDraft {
                name: name.to_string(),
                date,
                recurring: true,
                note: Some("Festività nazionale".to_string()),
            };
            let id = self.repo.insert(&draft, Some(actor)).await?;
            if let Some(holiday) = self.repo.find(id).await? {
                inserted.push(holiday);
            }
        }
        info!(year, inserted = inserted.len(), "National holidays seeded");
        Ok(inserted)
    }
}

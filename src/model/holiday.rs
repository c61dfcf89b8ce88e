use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    pub id: u64,
    #[schema(example = "Christmas")]
    pub name: String,
    /// For recurring holidays only month and day are meaningful.
    #[schema(example = "2024-12-25", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub recurring: bool,
    pub note: Option<String>,
    pub created_by: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl Holiday {
    /// The calendar date this rule falls on in `year`, if any.
    ///
    /// A recurring Feb 29 has no date in common years.
    pub fn date_in(&self, year: i32) -> Option<NaiveDate> {
        if self.recurring {
            NaiveDate::from_ymd_opt(year, self.date.month(), self.date.day())
        } else if self.date.year() == year {
            Some(self.date)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HolidayDraft {
    pub name: String,
    pub date: NaiveDate,
    pub recurring: bool,
    pub note: Option<String>,
}

/// A holiday as it applies to one particular year.
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct ProjectedHoliday {
    pub id: u64,
    pub name: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub recurring: bool,
}

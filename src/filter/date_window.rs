use bson::{doc, Bson, Document};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::error::FilterError;

/// Field holding a service record's start
pub const START_FIELD: &str = "date";
/// Field holding a service record's end; null or absent while open
pub const END_FIELD: &str = "fim";

/// Query interval `[inicio 00:00:00.000, fim 23:59:59.999]`, either side optional.
///
/// A record `[start, end-or-open]` is selected when the two intervals overlap.
/// Records with no end are still open and overlap every window that begins
/// before the present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateWindow {
    /// `None` when neither bound is given (empty strings count as absent)
    pub fn from_query(inicio: Option<&str>, fim: Option<&str>) -> Result<Option<Self>, FilterError> {
        let start = non_empty(inicio)
            .map(|raw| parse_day(raw, "dataInicio"))
            .transpose()?
            .map(|day| day.and_time(NaiveTime::default()).and_utc());

        let end = non_empty(fim)
            .map(|raw| parse_day(raw, "dataFim"))
            .transpose()?
            .map(end_of_day);

        if start.is_none() && end.is_none() {
            return Ok(None);
        }
        Ok(Some(Self { start, end }))
    }

    pub fn overlaps(&self, record_start: Option<DateTime<Utc>>, record_end: Option<DateTime<Utc>>) -> bool {
        let starts_in_time = |query_end: DateTime<Utc>| record_start.is_some_and(|s| s <= query_end);
        let still_running = |query_start: DateTime<Utc>| match record_end {
            Some(e) => e >= query_start,
            None => true,
        };

        match (self.start, self.end) {
            (Some(qs), Some(qe)) => starts_in_time(qe) && still_running(qs),
            (Some(qs), None) => still_running(qs),
            (None, Some(qe)) => starts_in_time(qe),
            (None, None) => true,
        }
    }

    /// Store-side form of `overlaps`; `{fim: null}` matches null and absent
    pub fn to_document(&self) -> Document {
        let open = || doc! { END_FIELD: Bson::Null };

        match (self.start, self.end) {
            (Some(qs), Some(qe)) => doc! {
                START_FIELD: { "$lte": bson_date(qe) },
                "$or": [
                    { END_FIELD: { "$gte": bson_date(qs), "$ne": Bson::Null } },
                    open(),
                ],
            },
            (Some(qs), None) => doc! {
                "$or": [
                    { END_FIELD: { "$gte": bson_date(qs) } },
                    open(),
                ],
            },
            (None, Some(qe)) => doc! { START_FIELD: { "$lte": bson_date(qe) } },
            (None, None) => Document::new(),
        }
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its UTC date is used)
fn parse_day(raw: &str, field: &'static str) -> Result<NaiveDate, FilterError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| FilterError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    let last_ms = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::default());
    day.and_time(last_ms).and_utc()
}

fn bson_date(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_chrono(dt)
}

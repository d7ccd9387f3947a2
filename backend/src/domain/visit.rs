//! Field visits logged by reps and advisors. Visits are append-only.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::plan::{DETAILS_MAX, DOCTOR_MAX};
use super::record_id::{Identified, record_id};
use super::validation::{
    FieldError, FieldErrorCode, bounded, optional_text, parse_iso_date, required_text,
};
use super::{OperationId, ProductId, UserId};

record_id! {
    /// Positive integer identifying a visit.
    VisitId
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// A logged visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Visit {
    /// Visit identifier.
    pub id: VisitId,
    /// Author of the visit.
    pub user_id: UserId,
    /// Day the visit happened.
    #[schema(value_type = String, format = Date, example = "2024-04-02")]
    pub date: NaiveDate,
    /// Doctor or pharmacy visited.
    pub doctor: String,
    /// Product promoted.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
    /// Server time the visit was stored.
    #[serde(default = "unix_epoch")]
    pub created_at: DateTime<Utc>,
    /// Client time the visit was captured, when queued offline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ts: Option<DateTime<Utc>>,
    /// Operation that created the visit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub op_id: Option<OperationId>,
}

impl Identified for Visit {
    fn raw_id(&self) -> u64 {
        self.id.get()
    }
}

/// Raw visit fields prior to validation.
///
/// `date` wins over `ts`; when only `ts` is supplied its UTC calendar day is
/// used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitParts<'a> {
    /// `YYYY-MM-DD` visit day.
    pub date: Option<&'a str>,
    /// RFC 3339 timestamp used when `date` is absent.
    pub ts: Option<&'a str>,
    /// Target name.
    pub doctor: Option<&'a str>,
    /// Product reference.
    pub product_id: Option<ProductId>,
    /// Free-text note.
    pub note: Option<&'a str>,
    /// RFC 3339 capture time attached by the offline queue.
    pub client_ts: Option<&'a str>,
}

/// Validated visit submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitDraft {
    /// Visit day.
    pub date: NaiveDate,
    /// Target name.
    pub doctor: String,
    /// Product reference.
    pub product_id: Option<ProductId>,
    /// Free-text note.
    pub note: Option<String>,
    /// Client capture time.
    pub client_ts: Option<DateTime<Utc>>,
}

impl VisitDraft {
    /// Validate raw visit fields.
    ///
    /// # Examples
    /// ```
    /// use medrep::domain::{VisitDraft, VisitParts};
    ///
    /// let draft = VisitDraft::try_from_parts(VisitParts {
    ///     ts: Some("2024-04-02T21:30:00-03:00"),
    ///     doctor: Some("Dr. Rahimi"),
    ///     ..VisitParts::default()
    /// })
    /// .unwrap();
    /// assert_eq!(draft.date.to_string(), "2024-04-03");
    /// ```
    pub fn try_from_parts(parts: VisitParts<'_>) -> Result<Self, FieldError> {
        let date = match optional_text(parts.date) {
            Some(raw) => parse_iso_date(&raw, "date")?,
            None => match optional_text(parts.ts) {
                Some(raw) => parse_timestamp(&raw, "ts")?.date_naive(),
                None => return Err(FieldError::missing("date")),
            },
        };
        let doctor = bounded(required_text(parts.doctor, "doctor")?, "doctor", DOCTOR_MAX)?;
        let note = optional_text(parts.note)
            .map(|note| bounded(note, "note", DETAILS_MAX))
            .transpose()?;
        let client_ts = optional_text(parts.client_ts)
            .map(|raw| parse_timestamp(&raw, "client_ts"))
            .transpose()?;
        Ok(Self {
            date,
            doctor,
            product_id: parts.product_id,
            note,
            client_ts,
        })
    }
}

fn parse_timestamp(raw: &str, field: &'static str) -> Result<DateTime<Utc>, FieldError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| {
            FieldError::new(
                field,
                FieldErrorCode::InvalidValue,
                format!("{field} must be an RFC 3339 timestamp"),
            )
        })
}

/// Newest visit day first; ties keep the later id first.
pub fn sort_newest_first(visits: &mut [Visit]) {
    visits.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

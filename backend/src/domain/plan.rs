//! Weekly visit plans authored by administrators.
//!
//! A plan belongs to one user and one week. The week is identified by its
//! first day as a Gregorian `YYYY-MM-DD` date; day indices count from that day,
//! with 0 being Saturday in the Persian working week.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::record_id::{Identified, record_id};
use super::validation::{
    FieldError, FieldErrorCode, NestedFieldError, bounded, optional_text, parse_iso_date,
    required_text,
};
use super::{OperationId, ProductId, UserId};

record_id! {
    /// Positive integer identifying a plan.
    PlanId
}

/// Longest accepted target name.
pub const DOCTOR_MAX: usize = 200;
/// Longest accepted free-text details or note.
pub const DETAILS_MAX: usize = 2000;

/// First day of a planning week.
///
/// # Examples
/// ```
/// use medrep::domain::WeekStart;
///
/// let week = WeekStart::parse(Some("2024-03-30")).unwrap();
/// assert_eq!(week.to_string(), "2024-03-30");
/// assert!(WeekStart::parse(Some("2024-02-30")).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekStart(NaiveDate);

impl WeekStart {
    /// Validate a raw `week_start` value.
    pub fn parse(raw: Option<&str>) -> Result<Self, FieldError> {
        let text = required_text(raw, "week_start")?;
        parse_iso_date(&text, "week_start").map(Self)
    }

    /// Calendar date of the first day.
    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl TryFrom<String> for WeekStart {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(Some(&value))
    }
}

impl From<WeekStart> for String {
    fn from(value: WeekStart) -> Self {
        value.to_string()
    }
}

/// Day offset within a plan week, `0..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct DayIndex(u8);

impl DayIndex {
    /// Highest valid index.
    pub const MAX: u8 = 6;

    /// Validate a raw index.
    pub fn new(raw: i64) -> Result<Self, FieldError> {
        u8::try_from(raw)
            .ok()
            .filter(|index| *index <= Self::MAX)
            .map(Self)
            .ok_or_else(|| {
                FieldError::new(
                    "day_index",
                    FieldErrorCode::OutOfRange,
                    "day_index must be between 0 and 6",
                )
            })
    }

    /// Raw index.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for DayIndex {
    type Error = FieldError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DayIndex> for u8 {
    fn from(value: DayIndex) -> Self {
        value.0
    }
}

/// One planned visit target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlanItem {
    /// Day within the week, 0 = Saturday.
    #[schema(value_type = u8, minimum = 0, maximum = 6)]
    pub day_index: DayIndex,
    /// Doctor or pharmacy to visit.
    pub doctor: String,
    /// Free-text instructions.
    #[serde(default)]
    pub details: String,
    /// Product to promote.
    #[serde(default)]
    pub product_id: Option<ProductId>,
}

impl PlanItem {
    /// Validate raw item fields.
    pub fn try_from_parts(
        day_index: Option<i64>,
        doctor: Option<&str>,
        details: Option<&str>,
        product_id: Option<ProductId>,
    ) -> Result<Self, FieldError> {
        let day_index = DayIndex::new(day_index.ok_or_else(|| FieldError::missing("day_index"))?)?;
        let doctor = bounded(required_text(doctor, "doctor")?, "doctor", DOCTOR_MAX)?;
        let details = bounded(
            optional_text(details).unwrap_or_default(),
            "details",
            DETAILS_MAX,
        )?;
        Ok(Self {
            day_index,
            doctor,
            details,
            product_id,
        })
    }
}

/// A stored weekly plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Plan {
    /// Plan identifier.
    pub id: PlanId,
    /// Rep or advisor the plan is for.
    pub user_id: UserId,
    /// First day of the week.
    #[schema(value_type = String, format = Date, example = "2024-03-30")]
    pub week_start: WeekStart,
    /// Planned targets in submission order.
    #[serde(default)]
    pub items: Vec<PlanItem>,
    /// Operation that last wrote this plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub op_id: Option<OperationId>,
    /// Every operation applied to this slot, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(value_type = Vec<String>)]
    pub op_ids: Vec<OperationId>,
}

impl Plan {
    /// Whether `op_id` has ever been applied to this plan.
    pub fn was_written_by(&self, op_id: &OperationId) -> bool {
        self.op_id.as_ref() == Some(op_id) || self.op_ids.contains(op_id)
    }

    /// Stamp `op_id` as the latest writer, keeping earlier stamps.
    pub fn stamp(&mut self, op_id: Option<OperationId>) {
        if let Some(id) = &op_id {
            if !self.op_ids.contains(id) {
                self.op_ids.push(id.clone());
            }
        }
        self.op_id = op_id;
    }

    /// Whether this plan occupies the `(user, week)` slot.
    pub fn occupies(&self, user_id: UserId, week_start: WeekStart) -> bool {
        self.user_id == user_id && self.week_start == week_start
    }
}

impl Identified for Plan {
    fn raw_id(&self) -> u64 {
        self.id.get()
    }
}

/// Validated plan submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDraft {
    /// Target user.
    pub user_id: UserId,
    /// Target week.
    pub week_start: WeekStart,
    /// Planned targets.
    pub items: Vec<PlanItem>,
}

/// Raw plan item fields prior to validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanItemParts<'a> {
    /// Raw day index.
    pub day_index: Option<i64>,
    /// Raw target name.
    pub doctor: Option<&'a str>,
    /// Raw details.
    pub details: Option<&'a str>,
    /// Product reference.
    pub product_id: Option<ProductId>,
}

impl PlanDraft {
    /// Validate a plan submission, reporting the first bad item by position.
    pub fn try_from_parts<'a>(
        user_id: Option<UserId>,
        week_start: Option<&str>,
        items: impl IntoIterator<Item = PlanItemParts<'a>>,
    ) -> Result<Self, PlanDraftError> {
        let user_id = user_id
            .filter(|id| id.get() > 0)
            .ok_or_else(|| FieldError::missing("user_id"))?;
        let week_start = WeekStart::parse(week_start)?;
        let items = items
            .into_iter()
            .enumerate()
            .map(|(index, parts)| {
                PlanItem::try_from_parts(
                    parts.day_index,
                    parts.doctor,
                    parts.details,
                    parts.product_id,
                )
                .map_err(|err| err.nested("items", index))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            user_id,
            week_start,
            items,
        })
    }
}

/// Validation failure for a plan submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanDraftError {
    /// A top-level field was rejected.
    Field(FieldError),
    /// An item field was rejected.
    Item(NestedFieldError),
}

impl From<FieldError> for PlanDraftError {
    fn from(value: FieldError) -> Self {
        Self::Field(value)
    }
}

impl From<NestedFieldError> for PlanDraftError {
    fn from(value: NestedFieldError) -> Self {
        Self::Item(value)
    }
}

impl From<PlanDraftError> for super::Error {
    fn from(value: PlanDraftError) -> Self {
        match value {
            PlanDraftError::Field(err) => err.into(),
            PlanDraftError::Item(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn item<'a>(day: i64, doctor: &'a str) -> PlanItemParts<'a> {
        PlanItemParts {
            day_index: Some(day),
            doctor: Some(doctor),
            ..PlanItemParts::default()
        }
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    fn day_index_accepts_week_bounds(#[case] raw: i64) {
        assert_eq!(DayIndex::new(raw).map(DayIndex::get), Ok(raw as u8));
    }

    #[rstest]
    #[case(-1)]
    #[case(7)]
    #[case(300)]
    fn day_index_rejects_out_of_range(#[case] raw: i64) {
        let err = DayIndex::new(raw).expect_err("out of range");
        assert_eq!(err.code(), FieldErrorCode::OutOfRange);
    }

    #[rstest]
    fn week_start_is_not_tied_to_a_weekday() {
        // 2024-04-03 is a Wednesday; any calendar date may start a week.
        assert!(WeekStart::parse(Some("2024-04-03")).is_ok());
    }

    #[rstest]
    fn draft_preserves_item_order() {
        let draft = PlanDraft::try_from_parts(
            Some(UserId::new(2)),
            Some("2024-03-30"),
            vec![item(3, "Dr. B"), item(0, "Dr. A")],
        )
        .expect("valid draft");
        let doctors: Vec<&str> = draft.items.iter().map(|it| it.doctor.as_str()).collect();
        assert_eq!(doctors, vec!["Dr. B", "Dr. A"]);
    }

    #[rstest]
    fn draft_requires_user() {
        let err = PlanDraft::try_from_parts(None, Some("2024-03-30"), Vec::new())
            .expect_err("missing user");
        assert!(matches!(err, PlanDraftError::Field(ref field) if field.field() == "user_id"));
    }

    #[rstest]
    fn draft_locates_bad_item() {
        let err = PlanDraft::try_from_parts(
            Some(UserId::new(2)),
            Some("2024-03-30"),
            vec![item(0, "Dr. A"), item(1, "  ")],
        )
        .expect_err("blank doctor");
        assert!(matches!(err, PlanDraftError::Item(ref nested) if nested.path() == "items[1].doctor"));
    }

    #[rstest]
    fn week_start_serialises_as_iso_text() {
        let week = WeekStart::parse(Some("2024-03-30")).expect("valid week");
        assert_eq!(
            serde_json::to_value(week).expect("serialise"),
            serde_json::json!("2024-03-30")
        );
    }
}

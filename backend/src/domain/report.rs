//! Visit aggregation for dashboards.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{FieldError, FieldErrorCode, optional_text, parse_iso_date};
use super::{Product, ProductId, Visit};

/// Product label used for visits with no or an unknown product.
pub const UNKNOWN_PRODUCT: &str = "—";

/// Inclusive calendar range filtering visits by day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            from: NaiveDate::from_ymd_opt(0, 1, 1).unwrap_or(NaiveDate::MIN),
            to: NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

impl DateRange {
    /// Build a range from optional query values.
    ///
    /// Missing bounds default to `0000-01-01` and `9999-12-31`.
    ///
    /// # Examples
    /// ```
    /// use medrep::domain::DateRange;
    ///
    /// let range = DateRange::parse(Some("2024-04-01"), None).unwrap();
    /// assert_eq!(range.to().to_string(), "9999-12-31");
    /// assert!(DateRange::parse(Some("2024-05-01"), Some("2024-04-01")).is_err());
    /// ```
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, FieldError> {
        let defaults = Self::default();
        let from = match optional_text(from) {
            Some(raw) => parse_iso_date(&raw, "from")?,
            None => defaults.from,
        };
        let to = match optional_text(to) {
            Some(raw) => parse_iso_date(&raw, "to")?,
            None => defaults.to,
        };
        if from > to {
            return Err(FieldError::new(
                "from",
                FieldErrorCode::InvalidValue,
                "from must not be after to",
            ));
        }
        Ok(Self { from, to })
    }

    /// First included day.
    pub fn from(&self) -> NaiveDate {
        self.from
    }

    /// Last included day.
    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Whether `date` lies inside the range, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Visit totals for a range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Overview {
    /// Number of visits.
    pub total: usize,
    /// Number of distinct targets visited.
    pub unique: usize,
}

/// Visit count for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductTally {
    /// Product brand; empty for unknown products.
    pub brand: String,
    /// Product name, or `—` for visits without a known product.
    pub product: String,
    /// Number of visits.
    pub count: usize,
}

/// Count visits and distinct targets inside `range`.
pub fn overview<'a>(visits: impl IntoIterator<Item = &'a Visit>, range: DateRange) -> Overview {
    let mut total = 0;
    let mut targets = HashSet::new();
    for visit in visits.into_iter().filter(|visit| range.contains(visit.date)) {
        total += 1;
        targets.insert(visit.doctor.as_str());
    }
    Overview {
        total,
        unique: targets.len(),
    }
}

/// Group visits inside `range` by product.
///
/// Rows are ordered by count descending, then brand and product ascending.
pub fn tally_by_product<'a>(
    visits: impl IntoIterator<Item = &'a Visit>,
    products: &[Product],
    range: DateRange,
) -> Vec<ProductTally> {
    let catalogue: HashMap<ProductId, &Product> =
        products.iter().map(|product| (product.id, product)).collect();
    let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
    for visit in visits.into_iter().filter(|visit| range.contains(visit.date)) {
        let key = visit
            .product_id
            .and_then(|id| catalogue.get(&id))
            .map_or(("", UNKNOWN_PRODUCT), |product| {
                (product.brand.as_str(), product.name.as_str())
            });
        *counts.entry(key).or_default() += 1;
    }
    let mut rows: Vec<ProductTally> = counts
        .into_iter()
        .map(|((brand, product), count)| ProductTally {
            brand: brand.to_owned(),
            product: product.to_owned(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.brand.cmp(&b.brand))
            .then_with(|| a.product.cmp(&b.product))
    });
    rows
}

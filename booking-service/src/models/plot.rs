use super::Entity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Square feet in one square metre (10.7639).
pub fn sq_ft_per_sq_m() -> Decimal {
    Decimal::new(107_639, 4)
}

/// A parcel of land inventory. Whether it is sold is derived from bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plot {
    #[serde(rename = "_id")]
    pub id: String,
    pub plot_number: u32,
    pub layout: String,
    pub area_sq_m: Decimal,
    pub area_sq_ft: Decimal,
    pub rate_per_sq_ft: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Plot {
    const COLLECTION: &'static str = "plots";
    const UNIQUE_KEYS: &'static [&'static [&'static str]] = &[&["layout", "plotNumber"]];

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotStatus {
    Available,
    Sold,
}

impl Plot {
    /// List price at the plot's own rate.
    pub fn value(&self) -> Decimal {
        (self.area_sq_ft * self.rate_per_sq_ft).round_dp(2)
    }

    /// Cost of the plot at a negotiated rate.
    pub fn cost_at(&self, rate_per_sq_ft: Decimal) -> Decimal {
        (self.area_sq_ft * rate_per_sq_ft).round_dp(2)
    }
}

/// Fills in whichever area unit is missing. Returns `(sq_m, sq_ft)`.
pub fn resolve_area(
    sq_m: Option<Decimal>,
    sq_ft: Option<Decimal>,
) -> Option<(Decimal, Decimal)> {
    match (sq_m, sq_ft) {
        (Some(m), Some(ft)) => Some((m, ft)),
        (Some(m), None) => Some((m, (m * sq_ft_per_sq_m()).round_dp(2))),
        (None, Some(ft)) => Some(((ft / sq_ft_per_sq_m()).round_dp(2), ft)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_missing_area_unit() {
        let (m, ft) = resolve_area(Some(Decimal::from(100)), None).unwrap();
        assert_eq!(m, Decimal::from(100));
        assert_eq!(ft, Decimal::new(107_639, 2));

        let (m, ft) = resolve_area(None, Some(Decimal::new(107_639, 2))).unwrap();
        assert_eq!(m, Decimal::from(100));
        assert_eq!(ft, Decimal::new(107_639, 2));

        assert!(resolve_area(None, None).is_none());
    }

    #[test]
    fn cost_is_area_times_rate() {
        let now = Utc::now();
        let plot = Plot {
            id: "p".into(),
            plot_number: 5,
            layout: "layout1".into(),
            area_sq_m: Decimal::new(9290, 2),
            area_sq_ft: Decimal::from(1000),
            rate_per_sq_ft: Decimal::from(500),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(plot.value(), Decimal::from(500_000));
        assert_eq!(plot.cost_at(Decimal::new(4505, 1)), Decimal::from(450_500));
    }
}

use super::Entity;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Referral agent. `commission` and `tds` are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broker {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
    pub commission: Decimal,
    pub tds: Decimal,
    pub reference_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Broker {
    const COLLECTION: &'static str = "brokers";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionBreakdown {
    pub gross: Decimal,
    pub tds_amount: Decimal,
    pub net: Decimal,
}

impl CommissionBreakdown {
    pub fn zero() -> Self {
        Self {
            gross: Decimal::ZERO,
            tds_amount: Decimal::ZERO,
            net: Decimal::ZERO,
        }
    }
}

impl std::ops::Add for CommissionBreakdown {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            gross: self.gross + rhs.gross,
            tds_amount: self.tds_amount + rhs.tds_amount,
            net: self.net + rhs.net,
        }
    }
}

pub fn default_tds() -> Decimal {
    Decimal::from(5)
}

impl Broker {
    /// Commission on a booking: a percentage of its total cost, less TDS.
    pub fn commission_on(&self, total_cost: Decimal) -> CommissionBreakdown {
        let hundred = Decimal::ONE_HUNDRED;
        let gross = (total_cost * self.commission / hundred).round_dp(2);
        let tds_amount = (gross * self.tds / hundred).round_dp(2);
        CommissionBreakdown {
            gross,
            tds_amount,
            net: gross - tds_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commission_is_percentage_of_total_less_tds() {
        let now = Utc::now();
        let broker = Broker {
            id: "b".into(),
            name: "Ravi Kumar".into(),
            phone: "9876543210".into(),
            commission: Decimal::from(2),
            tds: default_tds(),
            reference_date: None,
            created_at: now,
            updated_at: now,
        };

        let c = broker.commission_on(Decimal::from(500_000));
        assert_eq!(c.gross, Decimal::from(10_000));
        assert_eq!(c.tds_amount, Decimal::from(500));
        assert_eq!(c.net, Decimal::from(9_500));

        let total = CommissionBreakdown::zero() + c + c;
        assert_eq!(total.net, Decimal::from(19_000));
    }
}

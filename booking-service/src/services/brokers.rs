use super::repository::{Filter, Stores};
use super::ServiceError;
use crate::dtos::brokers::{
    BrokerBookingCommission, BrokerFinancialsResponse, CreateBrokerRequest, UpdateBrokerRequest,
};
use crate::models::{broker::default_tds, Broker, CommissionBreakdown};
use chrono::Utc;
use std::collections::HashMap;

#[derive(Clone)]
pub struct BrokerService {
    stores: Stores,
}

impl BrokerService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn create(&self, req: CreateBrokerRequest) -> Result<Broker, ServiceError> {
        let commission = req
            .commission
            .ok_or_else(|| ServiceError::invalid("commission", "Commission is required"))?;

        let now = Utc::now();
        let broker = Broker {
            id: crate::models::new_id(),
            name: req.name.trim().to_string(),
            phone: req.phone,
            commission,
            tds: req.tds.unwrap_or_else(default_tds),
            reference_date: req.reference_date,
            created_at: now,
            updated_at: now,
        };
        self.stores.brokers.insert(&broker).await?;

        tracing::info!(broker_id = %broker.id, "Broker created");
        Ok(broker)
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Broker>, ServiceError> {
        let mut brokers = self.stores.brokers.list().await?;
        brokers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(brokers)
    }

    pub async fn get(&self, id: &str) -> Result<Broker, ServiceError> {
        self.stores
            .brokers
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("Broker"))
    }

    pub async fn update(&self, id: &str, req: UpdateBrokerRequest) -> Result<Broker, ServiceError> {
        let mut broker = self.get(id).await?;

        if let Some(name) = req.name {
            broker.name = name.trim().to_string();
        }
        if let Some(phone) = req.phone {
            broker.phone = phone;
        }
        if let Some(commission) = req.commission {
            broker.commission = commission;
        }
        if let Some(tds) = req.tds {
            broker.tds = tds;
        }
        if req.reference_date.is_some() {
            broker.reference_date = req.reference_date;
        }
        broker.updated_at = Utc::now();

        if !self.stores.brokers.replace(&broker, None).await? {
            return Err(ServiceError::NotFound("Broker"));
        }
        tracing::info!(broker_id = %id, "Broker updated");
        Ok(broker)
    }

    /// Refused while any booking still names the broker.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let broker = self.get(id).await?;
        let referenced = self
            .stores
            .bookings
            .find(Filter::new().eq("brokerId", id))
            .await?
            .len();
        if referenced > 0 {
            return Err(ServiceError::conflict(format!(
                "{} is linked to {} booking(s); unlink them first",
                broker.name, referenced
            )));
        }

        if !self.stores.brokers.delete(id).await? {
            return Err(ServiceError::NotFound("Broker"));
        }
        tracing::info!(broker_id = %id, "Broker deleted");
        Ok(())
    }

    /// Commission per referred booking: `totalCost × commission%`, less TDS.
    pub async fn financials(&self, id: &str) -> Result<BrokerFinancialsResponse, ServiceError> {
        let broker = self.get(id).await?;
        let mut bookings = self
            .stores
            .bookings
            .find(Filter::new().eq("brokerId", id))
            .await?;
        bookings.sort_by(|a, b| a.booking_date.cmp(&b.booking_date));

        let plot_numbers: HashMap<String, u32> = self
            .stores
            .plots
            .list()
            .await?
            .into_iter()
            .map(|p| (p.id, p.plot_number))
            .collect();

        let rows: Vec<BrokerBookingCommission> = bookings
            .into_iter()
            .map(|b| BrokerBookingCommission {
                commission: broker.commission_on(b.total_cost),
                plot_number: plot_numbers.get(&b.plot_id).copied(),
                booking_id: b.id,
                buyer_name: b.name,
                plot_id: b.plot_id,
                layout: b.layout,
                total_cost: b.total_cost,
                booking_date: b.booking_date,
            })
            .collect();

        let total = rows
            .iter()
            .fold(CommissionBreakdown::zero(), |acc, row| acc + row.commission);

        Ok(BrokerFinancialsResponse {
            broker,
            bookings: rows,
            total,
        })
    }
}

use super::repository::{Filter, StoreError, Stores};
use super::ServiceError;
use crate::dtos::plots::{CreatePlotRequest, PlotResponse, UpdatePlotRequest};
use crate::models::{plot::resolve_area, Plot, DEFAULT_LAYOUT};
use chrono::Utc;
use std::collections::HashMap;

/// Plot inventory. A plot is sold exactly when a booking references it.
#[derive(Clone)]
pub struct PlotService {
    stores: Stores,
}

impl PlotService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn create(&self, req: CreatePlotRequest) -> Result<PlotResponse, ServiceError> {
        let plot_number = req
            .plot_number
            .ok_or_else(|| ServiceError::invalid("plotNumber", "Plot number is required"))?;
        let rate_per_sq_ft = req
            .rate_per_sq_ft
            .ok_or_else(|| ServiceError::invalid("ratePerSqFt", "Rate per sq-ft is required"))?;
        let (area_sq_m, area_sq_ft) = resolve_area(req.area_sq_m, req.area_sq_ft)
            .ok_or_else(|| ServiceError::invalid("areaSqFt", "Area in sq-m or sq-ft is required"))?;
        let layout = req.layout.unwrap_or_else(|| DEFAULT_LAYOUT.to_string());

        self.ensure_number_free(&layout, plot_number, None).await?;

        let now = Utc::now();
        let plot = Plot {
            id: crate::models::new_id(),
            plot_number,
            layout,
            area_sq_m,
            area_sq_ft,
            rate_per_sq_ft,
            created_at: now,
            updated_at: now,
        };

        self.stores
            .plots
            .insert(&plot)
            .await
            .map_err(|e| duplicate_number(e, &plot))?;

        tracing::info!(plot_id = %plot.id, plot_number, layout = %plot.layout, "Plot created");
        Ok(PlotResponse::new(plot, None))
    }

    pub async fn list(&self, layout: Option<&str>) -> Result<Vec<PlotResponse>, ServiceError> {
        let mut plots = self
            .stores
            .plots
            .find(Filter::new().eq_opt("layout", layout))
            .await?;
        plots.sort_by(|a, b| (&a.layout, a.plot_number).cmp(&(&b.layout, b.plot_number)));

        let booked: HashMap<String, String> = self
            .stores
            .bookings
            .find(Filter::new().eq_opt("layout", layout))
            .await?
            .into_iter()
            .map(|b| (b.plot_id, b.id))
            .collect();

        Ok(plots
            .into_iter()
            .map(|plot| {
                let booking_id = booked.get(&plot.id).cloned();
                PlotResponse::new(plot, booking_id)
            })
            .collect())
    }

    pub async fn get(&self, id: &str) -> Result<PlotResponse, ServiceError> {
        let plot = self.load(id).await?;
        let booking_id = self.booking_for(id).await?;
        Ok(PlotResponse::new(plot, booking_id))
    }

    pub async fn load(&self, id: &str) -> Result<Plot, ServiceError> {
        self.stores
            .plots
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("Plot"))
    }

    /// Rate changes apply to future bookings only.
    pub async fn update(
        &self,
        id: &str,
        req: UpdatePlotRequest,
    ) -> Result<PlotResponse, ServiceError> {
        let mut plot = self.load(id).await?;
        let booking_id = self.booking_for(id).await?;

        let layout = req.layout.unwrap_or_else(|| plot.layout.clone());
        let plot_number = req.plot_number.unwrap_or(plot.plot_number);

        if layout != plot.layout && booking_id.is_some() {
            return Err(ServiceError::invalid(
                "layout",
                "A booked plot cannot be moved to another layout",
            ));
        }
        if layout != plot.layout || plot_number != plot.plot_number {
            self.ensure_number_free(&layout, plot_number, Some(id)).await?;
        }

        if let Some((m, ft)) = resolve_area(req.area_sq_m, req.area_sq_ft) {
            // The booking's total cost was fixed against the current area.
            if booking_id.is_some() && ft != plot.area_sq_ft {
                return Err(ServiceError::invalid(
                    "areaSqFt",
                    "The area of a booked plot cannot be changed",
                ));
            }
            plot.area_sq_m = m;
            plot.area_sq_ft = ft;
        }
        if let Some(rate) = req.rate_per_sq_ft {
            plot.rate_per_sq_ft = rate;
        }
        plot.layout = layout;
        plot.plot_number = plot_number;
        plot.updated_at = Utc::now();

        let replaced = self
            .stores
            .plots
            .replace(&plot, None)
            .await
            .map_err(|e| duplicate_number(e, &plot))?;
        if !replaced {
            return Err(ServiceError::NotFound("Plot"));
        }

        tracing::info!(plot_id = %plot.id, "Plot updated");
        Ok(PlotResponse::new(plot, booking_id))
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let plot = self.load(id).await?;
        if self.booking_for(id).await?.is_some() {
            return Err(ServiceError::conflict(format!(
                "Plot {} is booked; delete the booking first",
                plot.plot_number
            )));
        }

        if !self.stores.plots.delete(id).await? {
            return Err(ServiceError::NotFound("Plot"));
        }
        tracing::info!(plot_id = %id, "Plot deleted");
        Ok(())
    }

    async fn booking_for(&self, plot_id: &str) -> Result<Option<String>, ServiceError> {
        Ok(self
            .stores
            .bookings
            .find_one(Filter::new().eq("plotId", plot_id))
            .await?
            .map(|b| b.id))
    }

    async fn ensure_number_free(
        &self,
        layout: &str,
        plot_number: u32,
        except_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        let existing = self
            .stores
            .plots
            .find_one(Filter::new().eq("layout", layout).eq("plotNumber", plot_number))
            .await?;
        match existing {
            Some(p) if Some(p.id.as_str()) != except_id => Err(number_taken(plot_number, layout)),
            _ => Ok(()),
        }
    }
}

fn number_taken(plot_number: u32, layout: &str) -> ServiceError {
    ServiceError::conflict(format!(
        "Plot number {} already exists in {}",
        plot_number, layout
    ))
}

/// A concurrent insert can still lose the race at the unique index.
fn duplicate_number(err: StoreError, plot: &Plot) -> ServiceError {
    match err {
        StoreError::Duplicate { .. } => number_taken(plot.plot_number, &plot.layout),
        other => other.into(),
    }
}

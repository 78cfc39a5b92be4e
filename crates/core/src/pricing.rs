use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Price, ServiceCatalog, VehicleClass};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSelection {
    pub category: String,
    pub sub_service: Option<String>,
    pub vehicle: VehicleClass,
}

impl ServiceSelection {
    pub fn display_name(&self) -> String {
        match &self.sub_service {
            Some(sub) => format!("{} - {sub}", self.category),
            None => self.category.clone(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("no price for category `{category}`, sub-service {sub_service:?}, vehicle {vehicle:?}")]
pub struct NotPriced {
    pub category: String,
    pub sub_service: Option<String>,
    pub vehicle: VehicleClass,
}

impl NotPriced {
    fn for_selection(selection: &ServiceSelection) -> Self {
        Self {
            category: selection.category.clone(),
            sub_service: selection.sub_service.clone(),
            vehicle: selection.vehicle,
        }
    }
}

pub trait PricingResolver: Send + Sync {
    fn resolve(&self, selection: &ServiceSelection) -> Result<Price, NotPriced>;
}

impl PricingResolver for ServiceCatalog {
    fn resolve(&self, selection: &ServiceSelection) -> Result<Price, NotPriced> {
        let missing = || NotPriced::for_selection(selection);
        let category = self.category(&selection.category).ok_or_else(missing)?;

        let table = if category.has_sub_services() {
            let name = selection.sub_service.as_deref().ok_or_else(missing)?;
            &category.sub_service(name).ok_or_else(missing)?.prices
        } else {
            if selection.sub_service.is_some() {
                return Err(missing());
            }
            category.direct_prices.as_ref().ok_or_else(missing)?
        };

        table.get(selection.vehicle).ok_or_else(missing)
    }
}

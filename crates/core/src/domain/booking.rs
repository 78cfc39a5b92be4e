use serde::{Deserialize, Serialize};

use crate::catalog::VehicleClass;
use crate::domain::identity::Identity;
use crate::pricing::ServiceSelection;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 3] = [Self::Morning, Self::Afternoon, Self::Evening];

    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "早上",
            Self::Afternoon => "下午",
            Self::Evening => "晚上",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.label() == label)
    }
}

/// A confirmed reservation. Each owner identity holds at most one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub owner: Identity,
    pub phone: String,
    pub category: String,
    pub sub_service: Option<String>,
    pub vehicle: VehicleClass,
    pub license_plate: String,
    pub date: String,
    pub time_slot: TimeSlot,
    pub pickup_location: String,
    pub note: String,
}

impl Booking {
    pub fn selection(&self) -> ServiceSelection {
        ServiceSelection {
            category: self.category.clone(),
            sub_service: self.sub_service.clone(),
            vehicle: self.vehicle,
        }
    }

    pub fn reschedule(&mut self, date: impl Into<String>, time_slot: TimeSlot) {
        self.date = date.into();
        self.time_slot = time_slot;
    }
}

use serde::{Deserialize, Serialize};

use crate::catalog::VehicleClass;
use crate::domain::booking::{Booking, TimeSlot};
use crate::domain::identity::Identity;
use crate::lookup::LookupHit;
use crate::pricing::ServiceSelection;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Booking,
    PriceInquiry,
    ChangeBooking,
}

impl FlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::PriceInquiry => "price_inquiry",
            Self::ChangeBooking => "change_booking",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    Category,
    SubCategory,
    VehicleClass,
    LicensePlate,
    Date,
    TimeSlot,
    Phone,
    PickupLocation,
    Note,
    Confirm,
}

impl BookingStep {
    /// Step reached by one back navigation, or `None` when back leaves the flow.
    pub fn previous(self, has_sub_services: bool) -> Option<Self> {
        match self {
            Self::Category => None,
            Self::SubCategory => Some(Self::Category),
            Self::VehicleClass => {
                Some(if has_sub_services { Self::SubCategory } else { Self::Category })
            }
            Self::LicensePlate => Some(Self::VehicleClass),
            Self::Date => Some(Self::LicensePlate),
            Self::TimeSlot => Some(Self::Date),
            Self::Phone => Some(Self::TimeSlot),
            Self::PickupLocation => Some(Self::Phone),
            Self::Note => Some(Self::PickupLocation),
            Self::Confirm => Some(Self::Note),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::SubCategory => "sub_category",
            Self::VehicleClass => "vehicle_class",
            Self::LicensePlate => "license_plate",
            Self::Date => "date",
            Self::TimeSlot => "time_slot",
            Self::Phone => "phone",
            Self::PickupLocation => "pickup_location",
            Self::Note => "note",
            Self::Confirm => "confirm",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStep {
    Category,
    SubCategory,
    VehicleClass,
    PriceShown,
}

impl PriceStep {
    pub fn previous(self, has_sub_services: bool) -> Option<Self> {
        match self {
            Self::Category => None,
            Self::SubCategory => Some(Self::Category),
            Self::VehicleClass => {
                Some(if has_sub_services { Self::SubCategory } else { Self::Category })
            }
            Self::PriceShown => Some(Self::VehicleClass),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::SubCategory => "sub_category",
            Self::VehicleClass => "vehicle_class",
            Self::PriceShown => "price_shown",
        }
    }
}

/// Change-booking steps. Every step after verification carries the booking it
/// operates on, so an options step without a located booking cannot exist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ChangeStep {
    Verify,
    Options { located: LookupHit },
    ModifyDate { located: LookupHit },
    ModifyTime { located: LookupHit, date: String },
}

impl ChangeStep {
    pub fn previous(&self) -> Option<Self> {
        match self {
            Self::Verify => None,
            Self::Options { located } if located.matched_by.is_own_identity() => None,
            Self::Options { .. } => Some(Self::Verify),
            Self::ModifyDate { located } => Some(Self::Options { located: located.clone() }),
            Self::ModifyTime { located, .. } => {
                Some(Self::ModifyDate { located: located.clone() })
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::Options { .. } => "options",
            Self::ModifyDate { .. } => "modify_date",
            Self::ModifyTime { .. } => "modify_time",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flow", content = "at", rename_all = "snake_case")]
pub enum Step {
    Booking(BookingStep),
    PriceInquiry(PriceStep),
    ChangeBooking(ChangeStep),
}

impl Step {
    pub fn flow_kind(&self) -> FlowKind {
        match self {
            Self::Booking(_) => FlowKind::Booking,
            Self::PriceInquiry(_) => FlowKind::PriceInquiry,
            Self::ChangeBooking(_) => FlowKind::ChangeBooking,
        }
    }

    /// Dotted `flow.step` label used in logs and audit metadata.
    pub fn label(&self) -> String {
        let step = match self {
            Self::Booking(step) => step.as_str(),
            Self::PriceInquiry(step) => step.as_str(),
            Self::ChangeBooking(step) => step.as_str(),
        };
        format!("{}.{step}", self.flow_kind().as_str())
    }
}

/// Fields collected so far by a booking or price-inquiry flow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub category: Option<String>,
    pub sub_service: Option<String>,
    pub vehicle: Option<VehicleClass>,
    pub license_plate: Option<String>,
    pub date: Option<String>,
    pub time_slot: Option<TimeSlot>,
    pub phone: Option<String>,
    pub pickup_location: Option<String>,
    pub note: Option<String>,
}

impl BookingDraft {
    pub fn selection(&self) -> Option<ServiceSelection> {
        Some(ServiceSelection {
            category: self.category.clone()?,
            sub_service: self.sub_service.clone(),
            vehicle: self.vehicle?,
        })
    }

    /// Builds the booking this draft describes, naming the first missing field otherwise.
    pub fn to_booking(&self, owner: Identity) -> Result<Booking, &'static str> {
        Ok(Booking {
            owner,
            phone: self.phone.clone().ok_or("phone")?,
            category: self.category.clone().ok_or("category")?,
            sub_service: self.sub_service.clone(),
            vehicle: self.vehicle.ok_or("vehicle")?,
            license_plate: self.license_plate.clone().ok_or("license_plate")?,
            date: self.date.clone().ok_or("date")?,
            time_slot: self.time_slot.ok_or("time_slot")?,
            pickup_location: self.pickup_location.clone().ok_or("pickup_location")?,
            note: self.note.clone().ok_or("note")?,
        })
    }
}

/// Per-identity dialog state. Absence of a session means the user is idle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub step: Step,
    pub draft: BookingDraft,
    /// Owner of the booking a change-booking refill rewrites.
    pub editing_on_behalf_of: Option<Identity>,
}

impl Session {
    pub fn new(step: Step) -> Self {
        Self { step, draft: BookingDraft::default(), editing_on_behalf_of: None }
    }

    /// Same session moved to `step`, draft untouched.
    pub fn at(mut self, step: Step) -> Self {
        self.step = step;
        self
    }

    pub fn flow_kind(&self) -> FlowKind {
        self.step.flow_kind()
    }

    /// Identity whose booking a completed draft is written under.
    pub fn booking_owner(&self, acting: &Identity) -> Identity {
        self.editing_on_behalf_of.clone().unwrap_or_else(|| acting.clone())
    }
}

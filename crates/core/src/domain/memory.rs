use serde::{Deserialize, Serialize};

use crate::domain::booking::Booking;

/// Contact details remembered from a user's last confirmed booking, used only to prefill suggestions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMemory {
    pub phone: Option<String>,
    pub license_plate: Option<String>,
    pub pickup_location: Option<String>,
}

impl UserMemory {
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            phone: non_empty(&booking.phone),
            license_plate: non_empty(&booking.license_plate),
            pickup_location: non_empty(&booking.pickup_location),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

use serde::{Deserialize, Serialize};

use crate::domain::booking::Booking;
use crate::domain::identity::Identity;
use crate::flows::validate;
use crate::stores::StoreView;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    /// The acting identity's own booking, found without asking.
    OwnIdentity,
    Identity,
    Phone,
}

impl MatchedBy {
    pub fn is_own_identity(self) -> bool {
        matches!(self, Self::OwnIdentity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupHit {
    pub booking: Booking,
    pub matched_by: MatchedBy,
}

/// Finds the booking a change-booking verification query refers to.
pub struct LookupResolver<'a> {
    view: &'a dyn StoreView,
}

impl<'a> LookupResolver<'a> {
    pub fn new(view: &'a dyn StoreView) -> Self {
        Self { view }
    }

    /// Tries the query as an owner identity when it has that shape, then as a phone number.
    pub fn resolve(&self, query: &str) -> Option<LookupHit> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        if Identity::looks_like_platform_id(query) {
            if let Some(booking) = self.view.booking(&Identity::new(query)) {
                return Some(LookupHit { booking, matched_by: MatchedBy::Identity });
            }
        }

        let phone = validate::strip_phone_separators(query);
        self.view
            .booking_by_phone(&phone)
            .map(|booking| LookupHit { booking, matched_by: MatchedBy::Phone })
    }
}

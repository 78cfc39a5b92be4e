use thiserror::Error;

use crate::flows::states::{
    BookingDraft, BookingStep, ChangeStep, FlowKind, PriceStep, Session, Step,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("no flow transition from {from} into {to}")]
pub struct UnsupportedTransition {
    pub from: String,
    pub to: &'static str,
}

/// Starts a `target` flow from the terminal step of another one, carrying over
/// only the fields that flow has already settled.
///
/// * A shown price seeds a booking at the licence-plate step with the service
///   selection filled in.
/// * A change-booking refill seeds an empty booking that will be written under
///   the located booking's owner.
pub fn transition(source: &Session, target: FlowKind) -> Result<Session, UnsupportedTransition> {
    match (&source.step, target) {
        (Step::PriceInquiry(PriceStep::PriceShown), FlowKind::Booking) => Ok(Session {
            step: Step::Booking(BookingStep::LicensePlate),
            draft: carry_selection(&source.draft),
            editing_on_behalf_of: None,
        }),
        (Step::ChangeBooking(ChangeStep::Options { located }), FlowKind::Booking) => Ok(Session {
            step: Step::Booking(BookingStep::Category),
            draft: BookingDraft::default(),
            editing_on_behalf_of: Some(located.booking.owner.clone()),
        }),
        (step, target) => {
            Err(UnsupportedTransition { from: step.label(), to: target.as_str() })
        }
    }
}

fn carry_selection(draft: &BookingDraft) -> BookingDraft {
    BookingDraft {
        category: draft.category.clone(),
        sub_service: draft.sub_service.clone(),
        vehicle: draft.vehicle,
        ..BookingDraft::default()
    }
}

#[cfg(test)]
mod tests {
    use super::{transition, UnsupportedTransition};
    use crate::catalog::VehicleClass;
    use crate::domain::booking::{Booking, TimeSlot};
    use crate::domain::identity::Identity;
    use crate::flows::states::{
        BookingDraft, BookingStep, ChangeStep, FlowKind, PriceStep, Session, Step,
    };
    use crate::lookup::{LookupHit, MatchedBy};

    #[test]
    fn price_result_seeds_booking_at_license_plate() {
        let mut source = Session::new(Step::PriceInquiry(PriceStep::PriceShown));
        source.draft = BookingDraft {
            category: Some("全車玻璃鍍膜+除油膜".to_string()),
            vehicle: Some(VehicleClass::Suv),
            license_plate: Some("stale".to_string()),
            ..BookingDraft::default()
        };

        let seeded = transition(&source, FlowKind::Booking).expect("supported");
        assert_eq!(seeded.step, Step::Booking(BookingStep::LicensePlate));
        assert_eq!(seeded.draft.category.as_deref(), Some("全車玻璃鍍膜+除油膜"));
        assert_eq!(seeded.draft.sub_service, None);
        assert_eq!(seeded.draft.vehicle, Some(VehicleClass::Suv));
        assert_eq!(seeded.draft.license_plate, None);
        assert_eq!(seeded.editing_on_behalf_of, None);
    }

    #[test]
    fn refill_seeds_booking_on_behalf_of_owner() {
        let located = LookupHit {
            booking: Booking {
                owner: Identity::new("U-friend"),
                phone: "0912345678".to_string(),
                category: "拋光美容".to_string(),
                sub_service: Some("拋光".to_string()),
                vehicle: VehicleClass::Sedan,
                license_plate: String::new(),
                date: "2025-06-01".to_string(),
                time_slot: TimeSlot::Morning,
                pickup_location: String::new(),
                note: String::new(),
            },
            matched_by: MatchedBy::Phone,
        };
        let source = Session::new(Step::ChangeBooking(ChangeStep::Options { located }));

        let seeded = transition(&source, FlowKind::Booking).expect("supported");
        assert_eq!(seeded.step, Step::Booking(BookingStep::Category));
        assert_eq!(seeded.draft, BookingDraft::default());
        assert_eq!(seeded.editing_on_behalf_of, Some(Identity::new("U-friend")));
    }

    #[test]
    fn other_pairs_are_rejected() {
        let source = Session::new(Step::Booking(BookingStep::Date));
        assert_eq!(
            transition(&source, FlowKind::PriceInquiry),
            Err(UnsupportedTransition { from: "booking.date".to_string(), to: "price_inquiry" })
        );
    }
}

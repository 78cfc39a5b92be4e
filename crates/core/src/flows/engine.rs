use std::sync::Arc;

use thiserror::Error;

use crate::catalog::{Category, Price, ServiceCatalog};
use crate::domain::booking::{Booking, TimeSlot};
use crate::domain::identity::Identity;
use crate::domain::memory::UserMemory;
use crate::flows::effects::{Effect, Prompt};
use crate::flows::input::{TopLevelCommand, UserInput};
use crate::flows::prompts;
use crate::flows::states::{BookingDraft, BookingStep, ChangeStep, FlowKind, PriceStep, Session, Step};
use crate::flows::tokens;
use crate::flows::transition::{transition, UnsupportedTransition};
use crate::flows::validate::{self, InputError};
use crate::lookup::{LookupHit, LookupResolver, MatchedBy};
use crate::pricing::{NotPriced, PricingResolver};
use crate::stores::StoreView;

/// Store mutation requested by a turn. The engine never writes; the caller applies these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreWrite {
    SaveBooking(Booking),
    RefreshMemory { identity: Identity, memory: UserMemory },
    RescheduleBooking { owner: Identity, date: String, time_slot: TimeSlot },
    CancelBooking { owner: Identity },
}

impl StoreWrite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaveBooking(_) => "save_booking",
            Self::RefreshMemory { .. } => "refresh_memory",
            Self::RescheduleBooking { .. } => "reschedule_booking",
            Self::CancelBooking { .. } => "cancel_booking",
        }
    }
}

/// Result of one dialog turn: the session to keep (`None` means idle), the
/// effect to show and the writes to apply, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub session: Option<Session>,
    pub effect: Effect,
    pub writes: Vec<StoreWrite>,
}

impl Turn {
    fn stay(session: Session, effect: Effect) -> Self {
        Self { session: Some(session), effect, writes: Vec::new() }
    }

    fn prompt(session: Session, prompt: Prompt) -> Self {
        Self::stay(session, Effect::Prompt(prompt))
    }

    fn end(effect: Effect) -> Self {
        Self { session: None, effect, writes: Vec::new() }
    }

    fn menu(notice: Option<&str>) -> Self {
        Self::end(Effect::Menu(prompts::main_menu(notice)))
    }

    fn with_write(mut self, write: StoreWrite) -> Self {
        self.writes.push(write);
        self
    }
}

/// Internal inconsistency between a session and the catalog. Never caused by user input.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogError {
    #[error(transparent)]
    NotPriced(#[from] NotPriced),
    #[error("session at {step} references unknown category `{category}`")]
    UnknownCategory { step: String, category: String },
    #[error("session at {step} is missing draft field `{field}`")]
    IncompleteDraft { step: String, field: &'static str },
    #[error(transparent)]
    Transition(#[from] UnsupportedTransition),
}

/// Turn-by-turn state machine for the booking, price-inquiry and
/// change-booking conversations.
#[derive(Clone, Debug)]
pub struct DialogEngine {
    catalog: Arc<ServiceCatalog>,
}

impl DialogEngine {
    pub fn new(catalog: Arc<ServiceCatalog>) -> Self {
        Self { catalog }
    }

    pub fn advance(
        &self,
        session: Option<Session>,
        identity: &Identity,
        input: &UserInput,
        view: &dyn StoreView,
    ) -> Result<Turn, DialogError> {
        let Some(session) = session else {
            return Ok(self.idle(identity, input, view));
        };
        if input.is_back() {
            return self.back(session, identity, view);
        }

        match session.step.clone() {
            Step::Booking(step) => self.booking_turn(session, step, identity, input, view),
            Step::PriceInquiry(step) => self.price_turn(session, step, identity, input, view),
            Step::ChangeBooking(step) => self.change_turn(session, step, identity, input, view),
        }
    }

    /// Prompt for the step `session` is currently at.
    pub fn current_prompt(
        &self,
        session: &Session,
        identity: &Identity,
        view: &dyn StoreView,
    ) -> Result<Prompt, DialogError> {
        match &session.step {
            Step::Booking(step) => self.booking_prompt(session, *step, identity, view),
            Step::PriceInquiry(step) => self.price_prompt(session, *step),
            Step::ChangeBooking(step) => Ok(change_prompt(step)),
        }
    }

    fn idle(&self, identity: &Identity, input: &UserInput, view: &dyn StoreView) -> Turn {
        let UserInput::Text(text) = input else {
            return Turn::end(Effect::Ignored);
        };

        match TopLevelCommand::parse(text) {
            Some(TopLevelCommand::StartBooking) => Turn::prompt(
                Session::new(Step::Booking(BookingStep::Category)),
                prompts::category(&self.catalog),
            ),
            Some(TopLevelCommand::InquirePrice) => Turn::prompt(
                Session::new(Step::PriceInquiry(PriceStep::Category)),
                prompts::category(&self.catalog),
            ),
            Some(TopLevelCommand::ChangeBooking) => match view.booking(identity) {
                Some(booking) => {
                    let located = LookupHit { booking, matched_by: MatchedBy::OwnIdentity };
                    Turn::prompt(
                        Session::new(Step::ChangeBooking(ChangeStep::Options { located })),
                        prompts::change_options(),
                    )
                }
                None => Turn::prompt(
                    Session::new(Step::ChangeBooking(ChangeStep::Verify)),
                    prompts::change_verify(),
                ),
            },
            Some(TopLevelCommand::RequestHumanAgent) => {
                Turn::end(Effect::Handoff { notice: prompts::HANDOFF.to_string() })
            }
            None if tokens::is_back(text) => Turn::menu(None),
            None => Turn::menu(Some(prompts::UNRECOGNIZED)),
        }
    }

    fn back(
        &self,
        session: Session,
        identity: &Identity,
        view: &dyn StoreView,
    ) -> Result<Turn, DialogError> {
        let has_sub_services = session
            .draft
            .category
            .as_deref()
            .and_then(|name| self.catalog.category(name))
            .is_some_and(Category::has_sub_services);

        let previous = match &session.step {
            Step::Booking(step) => step.previous(has_sub_services).map(Step::Booking),
            Step::PriceInquiry(step) => step.previous(has_sub_services).map(Step::PriceInquiry),
            Step::ChangeBooking(step) => step.previous().map(Step::ChangeBooking),
        };
        let Some(previous) = previous else {
            return Ok(Turn::menu(None));
        };

        let session = session.at(previous);
        let prompt = self.current_prompt(&session, identity, view)?;
        Ok(Turn::prompt(session, prompt))
    }

    fn reject(
        &self,
        session: Session,
        error: InputError,
        identity: &Identity,
        view: &dyn StoreView,
    ) -> Result<Turn, DialogError> {
        let retry = self.current_prompt(&session, identity, view)?;
        Ok(Turn::stay(session, Effect::Rejection { reason: error.to_string(), retry }))
    }

    fn booking_turn(
        &self,
        session: Session,
        step: BookingStep,
        identity: &Identity,
        input: &UserInput,
        view: &dyn StoreView,
    ) -> Result<Turn, DialogError> {
        match (step, input) {
            (BookingStep::Confirm, _) => self.confirm_turn(session, identity, input, view),
            (BookingStep::SubCategory, UserInput::Postback(_))
                if input.difference_request().is_some() =>
            {
                self.difference_turn(session)
            }
            (BookingStep::PickupLocation, UserInput::Location(location)) => {
                let mut session = session;
                session.draft.pickup_location = Some(location.describe());
                self.enter_booking_step(session, BookingStep::Note, identity, view)
            }
            (_, UserInput::Location(_)) => {
                self.reject(session, InputError::UnexpectedLocation, identity, view)
            }
            (_, UserInput::Postback(_)) => Ok(Turn::stay(session, Effect::Ignored)),
            (step, UserInput::Text(text)) => {
                let mut session = session;
                match self.accept_booking_text(&mut session.draft, step, text.trim()) {
                    Ok(next) => self.enter_booking_step(session, next, identity, view),
                    Err(error) => self.reject(session, error, identity, view),
                }
            }
        }
    }

    /// Stores validated text into the draft and names the next step.
    fn accept_booking_text(
        &self,
        draft: &mut BookingDraft,
        step: BookingStep,
        text: &str,
    ) -> Result<BookingStep, InputError> {
        match step {
            BookingStep::Category => Ok(if self.select_category(draft, text)? {
                BookingStep::SubCategory
            } else {
                BookingStep::VehicleClass
            }),
            BookingStep::SubCategory => {
                self.select_sub_service(draft, text)?;
                Ok(BookingStep::VehicleClass)
            }
            BookingStep::VehicleClass => {
                draft.vehicle = Some(validate::vehicle(text)?);
                Ok(BookingStep::LicensePlate)
            }
            BookingStep::LicensePlate => {
                draft.license_plate = Some(validate::optional(text));
                Ok(BookingStep::Date)
            }
            BookingStep::Date => {
                draft.date = Some(validate::date(text)?);
                Ok(BookingStep::TimeSlot)
            }
            BookingStep::TimeSlot => {
                draft.time_slot = Some(validate::time_slot(text)?);
                Ok(BookingStep::Phone)
            }
            BookingStep::Phone => {
                draft.phone = Some(validate::phone(text)?);
                Ok(BookingStep::PickupLocation)
            }
            BookingStep::PickupLocation => {
                draft.pickup_location = Some(validate::optional(text));
                Ok(BookingStep::Note)
            }
            BookingStep::Note => {
                draft.note = Some(validate::note(text));
                Ok(BookingStep::Confirm)
            }
            BookingStep::Confirm => Err(InputError::ExpectedSubmit),
        }
    }

    /// Returns whether the chosen category offers sub-services.
    fn select_category(&self, draft: &mut BookingDraft, text: &str) -> Result<bool, InputError> {
        let category = self.catalog.category(text).ok_or(InputError::UnknownCategory)?;
        draft.category = Some(category.name.clone());
        draft.sub_service = None;
        Ok(category.has_sub_services())
    }

    fn select_sub_service(&self, draft: &mut BookingDraft, text: &str) -> Result<(), InputError> {
        let sub_service = draft
            .category
            .as_deref()
            .and_then(|name| self.catalog.category(name))
            .and_then(|category| category.sub_service(text))
            .ok_or(InputError::UnknownSubService)?;
        draft.sub_service = Some(sub_service.name.clone());
        Ok(())
    }

    fn enter_booking_step(
        &self,
        session: Session,
        step: BookingStep,
        identity: &Identity,
        view: &dyn StoreView,
    ) -> Result<Turn, DialogError> {
        let session = session.at(Step::Booking(step));
        let prompt = self.booking_prompt(&session, step, identity, view)?;
        Ok(Turn::prompt(session, prompt))
    }

    fn booking_prompt(
        &self,
        session: &Session,
        step: BookingStep,
        identity: &Identity,
        view: &dyn StoreView,
    ) -> Result<Prompt, DialogError> {
        Ok(match step {
            BookingStep::Category if session.editing_on_behalf_of.is_some() => {
                prompts::refill_category(&self.catalog)
            }
            BookingStep::Category => prompts::category(&self.catalog),
            BookingStep::SubCategory => prompts::sub_service(self.selected_category(session)?),
            BookingStep::VehicleClass => prompts::vehicle(),
            BookingStep::LicensePlate => prompts::license_plate(view.memory(identity).as_ref()),
            BookingStep::Date => prompts::date(),
            BookingStep::TimeSlot => prompts::time_slot(),
            BookingStep::Phone => prompts::phone(view.memory(identity).as_ref()),
            BookingStep::PickupLocation => {
                prompts::pickup_location(view.memory(identity).as_ref())
            }
            BookingStep::Note => prompts::note(),
            BookingStep::Confirm => {
                let (preview, price) = self.preview(session, identity)?;
                prompts::confirm(&preview, price)
            }
        })
    }

    fn selected_category(&self, session: &Session) -> Result<&Category, DialogError> {
        let name = session.draft.category.as_deref().ok_or_else(|| {
            DialogError::IncompleteDraft { step: session.step.label(), field: "category" }
        })?;
        self.catalog.category(name).ok_or_else(|| DialogError::UnknownCategory {
            step: session.step.label(),
            category: name.to_string(),
        })
    }

    /// The booking the draft would become, priced.
    fn preview(&self, session: &Session, identity: &Identity) -> Result<(Booking, Price), DialogError> {
        let booking = session
            .draft
            .to_booking(session.booking_owner(identity))
            .map_err(|field| DialogError::IncompleteDraft { step: session.step.label(), field })?;
        let price = self.catalog.resolve(&booking.selection())?;
        Ok((booking, price))
    }

    fn confirm_turn(
        &self,
        session: Session,
        identity: &Identity,
        input: &UserInput,
        view: &dyn StoreView,
    ) -> Result<Turn, DialogError> {
        if input.is_submit() {
            let (booking, price) = self.preview(&session, identity)?;
            let save = StoreWrite::SaveBooking(booking.clone());
            let remember = StoreWrite::RefreshMemory {
                identity: booking.owner.clone(),
                memory: UserMemory::from_booking(&booking),
            };
            return Ok(Turn::end(Effect::Completion { booking, price })
                .with_write(save)
                .with_write(remember));
        }

        match input {
            UserInput::Text(_) => self.reject(session, InputError::ExpectedSubmit, identity, view),
            UserInput::Location(_) => {
                self.reject(session, InputError::UnexpectedLocation, identity, view)
            }
            UserInput::Postback(_) => Ok(Turn::stay(session, Effect::Ignored)),
        }
    }

    fn difference_turn(&self, session: Session) -> Result<Turn, DialogError> {
        let prompt = prompts::difference(self.selected_category(&session)?);
        Ok(Turn::prompt(session, prompt))
    }

    fn price_turn(
        &self,
        session: Session,
        step: PriceStep,
        identity: &Identity,
        input: &UserInput,
        view: &dyn StoreView,
    ) -> Result<Turn, DialogError> {
        let text = match input {
            UserInput::Postback(_)
                if step == PriceStep::SubCategory && input.difference_request().is_some() =>
            {
                return self.difference_turn(session);
            }
            UserInput::Postback(_) => return Ok(Turn::stay(session, Effect::Ignored)),
            UserInput::Location(_) => {
                return self.reject(session, InputError::UnexpectedLocation, identity, view)
            }
            UserInput::Text(text) => text.trim(),
        };

        let mut session = session;
        let next = match step {
            PriceStep::Category => self.select_category(&mut session.draft, text).map(|subs| {
                if subs {
                    PriceStep::SubCategory
                } else {
                    PriceStep::VehicleClass
                }
            }),
            PriceStep::SubCategory => self
                .select_sub_service(&mut session.draft, text)
                .map(|()| PriceStep::VehicleClass),
            PriceStep::VehicleClass => validate::vehicle(text).map(|vehicle| {
                session.draft.vehicle = Some(vehicle);
                PriceStep::PriceShown
            }),
            PriceStep::PriceShown if text == tokens::BOOK_THIS => {
                let seeded = transition(&session, FlowKind::Booking)?;
                return self.enter_booking_step(seeded, BookingStep::LicensePlate, identity, view);
            }
            PriceStep::PriceShown => Err(InputError::ExpectedBookThis),
        };

        match next {
            Ok(next) => {
                let session = session.at(Step::PriceInquiry(next));
                let prompt = self.price_prompt(&session, next)?;
                Ok(Turn::prompt(session, prompt))
            }
            Err(error) => self.reject(session, error, identity, view),
        }
    }

    fn price_prompt(&self, session: &Session, step: PriceStep) -> Result<Prompt, DialogError> {
        Ok(match step {
            PriceStep::Category => prompts::category(&self.catalog),
            PriceStep::SubCategory => prompts::sub_service(self.selected_category(session)?),
            PriceStep::VehicleClass => prompts::vehicle(),
            PriceStep::PriceShown => {
                let selection = session.draft.selection().ok_or_else(|| {
                    DialogError::IncompleteDraft { step: session.step.label(), field: "vehicle" }
                })?;
                let price = self.catalog.resolve(&selection)?;
                prompts::price_shown(&selection, price)
            }
        })
    }

    fn change_turn(
        &self,
        session: Session,
        step: ChangeStep,
        identity: &Identity,
        input: &UserInput,
        view: &dyn StoreView,
    ) -> Result<Turn, DialogError> {
        let text = match input {
            UserInput::Text(text) => text.trim(),
            UserInput::Location(_) => {
                return self.reject(session, InputError::UnexpectedLocation, identity, view)
            }
            UserInput::Postback(_) => return Ok(Turn::stay(session, Effect::Ignored)),
        };

        match step {
            ChangeStep::Verify => Ok(match LookupResolver::new(view).resolve(text) {
                Some(located) => Turn::prompt(
                    session.at(Step::ChangeBooking(ChangeStep::Options { located })),
                    prompts::change_options(),
                ),
                None => Turn::menu(Some(prompts::BOOKING_NOT_FOUND)),
            }),
            ChangeStep::Options { located } => match text {
                tokens::OPTION_REFILL => {
                    let seeded = transition(&session, FlowKind::Booking)?;
                    let turn =
                        self.enter_booking_step(seeded, BookingStep::Category, identity, view)?;
                    Ok(turn.with_write(StoreWrite::RefreshMemory {
                        identity: identity.clone(),
                        memory: UserMemory::from_booking(&located.booking),
                    }))
                }
                tokens::OPTION_MODIFY_SCHEDULE => Ok(Turn::prompt(
                    session.at(Step::ChangeBooking(ChangeStep::ModifyDate { located })),
                    prompts::new_date(),
                )),
                tokens::OPTION_CANCEL => Ok(Turn::menu(Some(prompts::BOOKING_CANCELLED))
                    .with_write(StoreWrite::CancelBooking { owner: located.booking.owner })),
                _ => self.reject(session, InputError::UnknownOption, identity, view),
            },
            ChangeStep::ModifyDate { located } => match validate::date(text) {
                Ok(date) => Ok(Turn::prompt(
                    session.at(Step::ChangeBooking(ChangeStep::ModifyTime { located, date })),
                    prompts::new_time_slot(),
                )),
                Err(error) => self.reject(session, error, identity, view),
            },
            ChangeStep::ModifyTime { located, date } => match validate::time_slot(text) {
                Ok(time_slot) => {
                    let notice = prompts::rescheduled(&date, time_slot);
                    Ok(Turn::menu(Some(notice.as_str())).with_write(
                        StoreWrite::RescheduleBooking {
                            owner: located.booking.owner,
                            date,
                            time_slot,
                        },
                    ))
                }
                Err(error) => self.reject(session, error, identity, view),
            },
        }
    }
}

fn change_prompt(step: &ChangeStep) -> Prompt {
    match step {
        ChangeStep::Verify => prompts::change_verify(),
        ChangeStep::Options { .. } => prompts::change_options(),
        ChangeStep::ModifyDate { .. } => prompts::new_date(),
        ChangeStep::ModifyTime { .. } => prompts::new_time_slot(),
    }
}

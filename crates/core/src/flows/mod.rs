pub mod effects;
pub mod engine;
pub mod input;
pub mod prompts;
pub mod states;
pub mod tokens;
pub mod transition;
pub mod validate;

pub use effects::{Effect, Menu, Prompt, PromptDetail, ReplyAction, SuggestedReply};
pub use engine::{DialogEngine, DialogError, StoreWrite, Turn};
pub use input::{EventKind, GeoLocation, InboundEvent, TopLevelCommand, UserInput};
pub use states::{BookingDraft, BookingStep, ChangeStep, FlowKind, PriceStep, Session, Step};
pub use transition::{transition, UnsupportedTransition};

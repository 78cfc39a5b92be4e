//! LINE Messaging API boundary for detailbook.
//!
//! - **Webhook** (`webhook`) - request body model and event normalization
//! - **Signature** (`signature`) - `X-Line-Signature` verification
//! - **Events** (`events`) - dispatcher routing events into the conversation
//! - **Messages** (`messages`) - effect rendering as text, quick replies and flex
//! - **Reply** (`reply`) - reply delivery through the Messaging API
//! - **Ingest** (`ingest`) - one webhook call end to end
//!
//! ```text
//! POST /webhook → SignatureVerifier → WebhookBody → EventDispatcher → DialogService
//!                                                         ↓
//!                                  ReplyTransport ← messages::render(Effect)
//! ```

pub mod events;
pub mod ingest;
pub mod messages;
pub mod reply;
pub mod signature;
pub mod webhook;

pub use events::{default_dispatcher, ConversationService, EventContext, EventDispatcher};
pub use ingest::{IngestError, IngestReport, WebhookIngestor};
pub use reply::{HttpReplyTransport, InMemoryReplyTransport, NoopReplyTransport, ReplyTransport};
pub use signature::{SignatureError, SignatureVerifier, SIGNATURE_HEADER};

//! Session, booking and memory storage behind narrow traits.
//!
//! Operations are infallible and atomic per call. The in-memory implementations
//! are the only backing today; the traits are the seam for a persistent one.

pub mod memory;
pub mod phone_index;

use std::sync::Arc;

use crate::domain::booking::{Booking, TimeSlot};
use crate::domain::identity::Identity;
use crate::domain::memory::UserMemory;
use crate::flows::states::Session;

pub use memory::{InMemoryBookingStore, InMemoryMemoryStore, InMemorySessionStore};
pub use phone_index::PhoneIndex;

pub trait SessionStore: Send + Sync {
    fn load(&self, identity: &Identity) -> Option<Session>;
    fn save(&self, identity: &Identity, session: Session);
    /// Returns whether a session existed.
    fn clear(&self, identity: &Identity) -> bool;
    fn active_count(&self) -> usize;
}

/// Outcome of storing a booking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveReceipt {
    /// The owner's previous booking, now replaced.
    pub replaced: Option<Booking>,
    /// Another owner whose phone-index entry moved to this booking. Their booking is kept.
    pub phone_taken_from: Option<Identity>,
}

pub trait BookingStore: Send + Sync {
    fn find(&self, owner: &Identity) -> Option<Booking>;
    fn find_by_phone(&self, phone: &str) -> Option<Booking>;
    fn save(&self, booking: Booking) -> SaveReceipt;
    /// Returns the updated booking, or `None` when the owner has none.
    fn reschedule(&self, owner: &Identity, date: &str, time_slot: TimeSlot) -> Option<Booking>;
    fn cancel(&self, owner: &Identity) -> Option<Booking>;
    fn count(&self) -> usize;
}

pub trait MemoryStore: Send + Sync {
    fn recall(&self, identity: &Identity) -> Option<UserMemory>;
    fn remember(&self, identity: &Identity, memory: UserMemory);
}

/// Read-only view the dialog engine and lookup resolver consult.
pub trait StoreView {
    fn memory(&self, identity: &Identity) -> Option<UserMemory>;
    fn booking(&self, owner: &Identity) -> Option<Booking>;
    fn booking_by_phone(&self, phone: &str) -> Option<Booking>;
}

#[derive(Clone)]
pub struct StoreSet {
    pub sessions: Arc<dyn SessionStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub memories: Arc<dyn MemoryStore>,
}

impl StoreSet {
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionStore::default()),
            bookings: Arc::new(InMemoryBookingStore::default()),
            memories: Arc::new(InMemoryMemoryStore::default()),
        }
    }
}

impl StoreView for StoreSet {
    fn memory(&self, identity: &Identity) -> Option<UserMemory> {
        self.memories.recall(identity)
    }

    fn booking(&self, owner: &Identity) -> Option<Booking> {
        self.bookings.find(owner)
    }

    fn booking_by_phone(&self, phone: &str) -> Option<Booking> {
        self.bookings.find_by_phone(phone)
    }
}

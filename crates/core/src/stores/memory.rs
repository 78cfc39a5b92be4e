use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::booking::{Booking, TimeSlot};
use crate::domain::identity::Identity;
use crate::domain::memory::UserMemory;
use crate::flows::states::Session;
use crate::stores::{BookingStore, MemoryStore, PhoneIndex, SaveReceipt, SessionStore};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Identity, Session>>,
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, identity: &Identity) -> Option<Session> {
        read(&self.sessions).get(identity).cloned()
    }

    fn save(&self, identity: &Identity, session: Session) {
        write(&self.sessions).insert(identity.clone(), session);
    }

    fn clear(&self, identity: &Identity) -> bool {
        write(&self.sessions).remove(identity).is_some()
    }

    fn active_count(&self) -> usize {
        read(&self.sessions).len()
    }
}

#[derive(Default)]
struct BookingTable {
    by_owner: HashMap<Identity, Booking>,
    phones: PhoneIndex,
}

/// Bookings and their phone index share one lock so every write keeps them consistent.
#[derive(Default)]
pub struct InMemoryBookingStore {
    table: RwLock<BookingTable>,
}

impl BookingStore for InMemoryBookingStore {
    fn find(&self, owner: &Identity) -> Option<Booking> {
        read(&self.table).by_owner.get(owner).cloned()
    }

    fn find_by_phone(&self, phone: &str) -> Option<Booking> {
        let table = read(&self.table);
        let owner = table.phones.owner_of(phone)?;
        table.by_owner.get(owner).cloned()
    }

    fn save(&self, booking: Booking) -> SaveReceipt {
        let mut table = write(&self.table);
        let owner = booking.owner.clone();
        let phone = booking.phone.clone();

        let replaced = table.by_owner.insert(owner.clone(), booking);
        if let Some(previous) = &replaced {
            if previous.phone != phone {
                table.phones.release(&previous.phone, &owner);
            }
        }
        let phone_taken_from = table.phones.reassign(&phone, &owner);

        SaveReceipt { replaced, phone_taken_from }
    }

    fn reschedule(&self, owner: &Identity, date: &str, time_slot: TimeSlot) -> Option<Booking> {
        let mut table = write(&self.table);
        let booking = table.by_owner.get_mut(owner)?;
        booking.reschedule(date, time_slot);
        Some(booking.clone())
    }

    fn cancel(&self, owner: &Identity) -> Option<Booking> {
        let mut table = write(&self.table);
        let removed = table.by_owner.remove(owner)?;
        table.phones.release(&removed.phone, owner);
        Some(removed)
    }

    fn count(&self) -> usize {
        read(&self.table).by_owner.len()
    }
}

#[derive(Default)]
pub struct InMemoryMemoryStore {
    memories: RwLock<HashMap<Identity, UserMemory>>,
}

impl MemoryStore for InMemoryMemoryStore {
    fn recall(&self, identity: &Identity) -> Option<UserMemory> {
        read(&self.memories).get(identity).cloned()
    }

    fn remember(&self, identity: &Identity, memory: UserMemory) {
        write(&self.memories).insert(identity.clone(), memory);
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryBookingStore, InMemoryMemoryStore, InMemorySessionStore};
    use crate::catalog::VehicleClass;
    use crate::domain::booking::{Booking, TimeSlot};
    use crate::domain::identity::Identity;
    use crate::domain::memory::UserMemory;
    use crate::flows::states::{BookingStep, Session, Step};
    use crate::stores::{BookingStore, MemoryStore, SessionStore};

    fn booking(owner: &str, phone: &str) -> Booking {
        Booking {
            owner: Identity::new(owner),
            phone: phone.to_string(),
            category: "清潔養護".to_string(),
            sub_service: Some("基礎洗車".to_string()),
            vehicle: VehicleClass::Small,
            license_plate: "ABC-1234".to_string(),
            date: "2025-06-01".to_string(),
            time_slot: TimeSlot::Morning,
            pickup_location: String::new(),
            note: String::new(),
        }
    }

    #[test]
    fn session_store_round_trips_and_clears() {
        let store = InMemorySessionStore::default();
        let identity = Identity::new("U1");
        store.save(&identity, Session::new(Step::Booking(BookingStep::Date)));

        assert_eq!(store.active_count(), 1);
        assert_eq!(
            store.load(&identity).map(|session| session.step),
            Some(Step::Booking(BookingStep::Date))
        );
        assert!(store.clear(&identity));
        assert!(!store.clear(&identity));
        assert_eq!(store.load(&identity), None);
    }

    #[test]
    fn saving_replaces_owner_booking_and_moves_phone_entry() {
        let store = InMemoryBookingStore::default();
        store.save(booking("U1", "0911111111"));
        let receipt = store.save(booking("U1", "0922222222"));

        assert_eq!(receipt.replaced.map(|previous| previous.phone), Some("0911111111".to_string()));
        assert_eq!(receipt.phone_taken_from, None);
        assert_eq!(store.count(), 1);
        assert!(store.find_by_phone("0911111111").is_none());
        assert_eq!(
            store.find_by_phone("0922222222").map(|found| found.owner),
            Some(Identity::new("U1"))
        );
    }

    #[test]
    fn shared_phone_is_reassigned_without_deleting_other_booking() {
        let store = InMemoryBookingStore::default();
        store.save(booking("U1", "0912345678"));
        let receipt = store.save(booking("U2", "0912345678"));

        assert_eq!(receipt.phone_taken_from, Some(Identity::new("U1")));
        assert_eq!(
            store.find_by_phone("0912345678").map(|found| found.owner),
            Some(Identity::new("U2"))
        );
        assert!(store.find(&Identity::new("U1")).is_some());
        assert_eq!(store.count(), 2);

        store.cancel(&Identity::new("U1"));
        assert_eq!(
            store.find_by_phone("0912345678").map(|found| found.owner),
            Some(Identity::new("U2"))
        );
    }

    #[test]
    fn reschedule_and_cancel_require_existing_booking() {
        let store = InMemoryBookingStore::default();
        let owner = Identity::new("U1");
        assert!(store.reschedule(&owner, "2025-07-01", TimeSlot::Evening).is_none());

        store.save(booking("U1", "0912345678"));
        let updated =
            store.reschedule(&owner, "2025-07-01", TimeSlot::Evening).expect("booking exists");
        assert_eq!(updated.date, "2025-07-01");
        assert_eq!(updated.time_slot, TimeSlot::Evening);
        assert_eq!(updated.phone, "0912345678");

        assert!(store.cancel(&owner).is_some());
        assert!(store.cancel(&owner).is_none());
        assert!(store.find_by_phone("0912345678").is_none());
    }

    #[test]
    fn memory_store_overwrites_per_identity() {
        let store = InMemoryMemoryStore::default();
        let identity = Identity::new("U1");
        store.remember(&identity, UserMemory::from_booking(&booking("U1", "0911111111")));
        store.remember(&identity, UserMemory::from_booking(&booking("U1", "0922222222")));

        let memory = store.recall(&identity).expect("remembered");
        assert_eq!(memory.phone.as_deref(), Some("0922222222"));
        assert_eq!(memory.pickup_location, None);
        assert!(store.recall(&Identity::new("U2")).is_none());
    }
}

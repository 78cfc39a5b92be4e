pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod lookup;
pub mod pricing;
pub mod service;
pub mod stores;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use catalog::{Category, Price, ServiceCatalog, SubService, VehicleClass};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::booking::{Booking, TimeSlot};
pub use domain::identity::Identity;
pub use domain::memory::UserMemory;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{DialogEngine, Effect, EventKind, GeoLocation, InboundEvent, Session, UserInput};
pub use lookup::{LookupHit, LookupResolver, MatchedBy};
pub use pricing::{NotPriced, PricingResolver, ServiceSelection};
pub use service::DialogService;
pub use stores::StoreSet;

//! Persistence layer: Postgres implementations of the catalog and ledger
//! seams, plus an in-memory store for tests.

pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod event_repo;
pub mod memory;

pub use booking_repo::PgBookingLedger;
pub use database::DbClient;
pub use event_repo::PgEventCatalog;
pub use memory::MemoryStore;

pub mod archive;
pub mod auth;
pub mod bookings;
pub mod brokers;
pub mod database;
pub mod email;
pub mod error;
pub mod jwt;
pub mod ledger;
pub mod memory;
pub mod metrics;
pub mod plots;
pub mod records;
pub mod repository;
pub mod storage;

pub use archive::ArchiveService;
pub use auth::AuthService;
pub use bookings::BookingService;
pub use brokers::BrokerService;
pub use database::MongoDb;
pub use email::{EmailProvider, EmailService, LogEmailService, MockEmailService};
pub use error::ServiceError;
pub use jwt::{Claims, JwtService};
pub use ledger::InvoiceService;
pub use plots::PlotService;
pub use records::RecordService;
pub use repository::{Filter, Repository, StoreError, Stores};
pub use storage::{LocalStorage, Storage};

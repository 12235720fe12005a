//! Business logic services for the RetailHub distribution engine

pub mod acceptance;
pub mod audit;
pub mod distribution;
pub mod draft;
pub mod ledger;
pub mod notification;
pub mod numbering;
pub mod returns;

pub use acceptance::AcceptanceService;
pub use audit::AuditService;
pub use distribution::DistributionService;
pub use draft::DraftService;
pub use ledger::LedgerService;
pub use notification::{NotificationService, WebhookClient};
pub use returns::ReturnService;

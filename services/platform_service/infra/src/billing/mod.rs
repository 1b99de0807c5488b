mod repository;
mod service;

pub use repository::{PgInvoiceRepository, PgPlanRepository, PgSubscriptionRepository};
pub use service::{BillingServiceImpl, EntitlementsImpl};

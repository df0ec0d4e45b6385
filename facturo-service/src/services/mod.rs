//! Services module for facturo-service.
//!
//! `Database` owns all persistence; its operations are split across files by
//! concern (document mutations, payment reconciliation, quote conversion).

pub mod cache;
mod conversion;
pub mod database;
mod documents;
pub mod metrics;
mod payments;

pub use cache::{CacheInvalidator, NoopInvalidator, RedisInvalidator};
pub use conversion::ConversionOutcome;
pub use database::Database;
pub use documents::ChangeStatusOutcome;
pub use metrics::{get_metrics, init_metrics};
pub use payments::{PaymentOutcome, PaymentRemovalOutcome};

//! Domain models for facturo-service.

mod client;
mod document;
mod line_item;
mod payment;

pub use client::{ClientType, NewClient};
pub use document::{
    CreationStatus, Document, DocumentInput, ListDocumentsFilter,
};
pub use line_item::{DocumentItem, LineItemInput};
pub use payment::{Payment, PaymentInput, PaymentMethod};

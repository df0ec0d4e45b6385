//! Client directory model.
//!
//! Only inline creation is part of this service; the full client directory
//! lives elsewhere.

use serde::{Deserialize, Serialize};

/// Client type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Individual,
    #[default]
    Company,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Individual => "individual",
            ClientType::Company => "company",
        }
    }
}

/// Input for creating a client inline with a document.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub client_type: ClientType,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

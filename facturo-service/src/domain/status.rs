//! Document status machines.
//!
//! Invoices and quotes share the same structural shape but carry different
//! status vocabularies. Each status knows its allowed transition targets;
//! anything not in the table is rejected. Two distinct locking notions exist:
//! a *terminal* status admits no further status changes, while a
//! *content-locked* status blocks edits to the document's fields and items
//! (a SENT invoice is content-editable but an ACCEPTED quote is not).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::money::payment_tolerance;

/// Document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Quote,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Quote => "quote",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "quote" => DocumentKind::Quote,
            _ => DocumentKind::Invoice,
        }
    }

    /// Prefix of the human-readable sequential number.
    pub fn number_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "FAC",
            DocumentKind::Quote => "DEV",
        }
    }
}

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Partial,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Partial => "partial",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        Self::parse(s).unwrap_or(InvoiceStatus::Draft)
    }

    /// Strict parse for caller-supplied values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(InvoiceStatus::Draft),
            "sent" => Some(InvoiceStatus::Sent),
            "paid" => Some(InvoiceStatus::Paid),
            "partial" => Some(InvoiceStatus::Partial),
            "overdue" => Some(InvoiceStatus::Overdue),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }
}

/// Quote status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Expired => "expired",
        }
    }

    pub fn from_string(s: &str) -> Self {
        Self::parse(s).unwrap_or(QuoteStatus::Draft)
    }

    /// Strict parse for caller-supplied values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(QuoteStatus::Draft),
            "sent" => Some(QuoteStatus::Sent),
            "accepted" => Some(QuoteStatus::Accepted),
            "rejected" => Some(QuoteStatus::Rejected),
            "expired" => Some(QuoteStatus::Expired),
            _ => None,
        }
    }
}

/// A status vocabulary with a transition table.
pub trait StatusMachine: Copy + PartialEq + Sized + 'static {
    fn name(self) -> &'static str;

    /// Statuses this one may move to. Empty means terminal.
    fn allowed_targets(self) -> &'static [Self];

    /// Whether the document's fields and items may no longer be edited.
    fn is_content_locked(self) -> bool;

    fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }

    fn can_transition(self, target: Self) -> bool {
        self.allowed_targets().contains(&target)
    }
}

impl StatusMachine for InvoiceStatus {
    fn name(self) -> &'static str {
        self.as_str()
    }

    fn allowed_targets(self) -> &'static [InvoiceStatus] {
        use InvoiceStatus::*;
        match self {
            Draft => &[Sent, Cancelled],
            Sent => &[Paid, Partial, Overdue, Cancelled],
            Partial => &[Paid, Overdue, Cancelled],
            Overdue => &[Paid, Partial, Cancelled],
            Paid | Cancelled => &[],
        }
    }

    fn is_content_locked(self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

impl StatusMachine for QuoteStatus {
    fn name(self) -> &'static str {
        self.as_str()
    }

    fn allowed_targets(self) -> &'static [QuoteStatus] {
        use QuoteStatus::*;
        match self {
            Draft => &[Sent, Expired],
            Sent => &[Accepted, Rejected, Expired],
            // A rejected quote can be re-sent after revision.
            Rejected => &[Sent],
            Accepted | Expired => &[],
        }
    }

    fn is_content_locked(self) -> bool {
        matches!(
            self,
            QuoteStatus::Accepted | QuoteStatus::Rejected | QuoteStatus::Expired
        )
    }
}

/// Why a requested transition was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("document status is terminal and cannot change")]
    Locked,
    #[error("transition from {from} to {to} is not allowed")]
    Invalid {
        from: &'static str,
        to: &'static str,
    },
}

/// Validate a requested transition against the machine.
///
/// Returns `Ok(Some(target))` when the status should be persisted,
/// `Ok(None)` for an idempotent no-op (target equals current, terminal or
/// not), and an error otherwise.
pub fn request_transition<S: StatusMachine>(
    current: S,
    target: S,
) -> Result<Option<S>, TransitionError> {
    if target == current {
        return Ok(None);
    }
    if current.is_terminal() {
        return Err(TransitionError::Locked);
    }
    if !current.can_transition(target) {
        return Err(TransitionError::Invalid {
            from: current.name(),
            to: target.name(),
        });
    }
    Ok(Some(target))
}

/// Status an invoice should carry once `paid_total` has been applied.
pub fn status_after_payment(
    current: InvoiceStatus,
    invoice_total: Decimal,
    paid_total: Decimal,
) -> InvoiceStatus {
    if paid_total >= invoice_total - payment_tolerance() {
        InvoiceStatus::Paid
    } else if paid_total > Decimal::ZERO {
        InvoiceStatus::Partial
    } else {
        current
    }
}

/// Status an invoice should carry after a payment was deleted, given the sum
/// of the payments that remain.
///
/// When the last payment goes away the invoice reverts to SENT, but only from
/// PAID or PARTIAL; an invoice that was OVERDUE before any payment never gets
/// its OVERDUE status back through this path.
pub fn status_after_payment_removal(
    current: InvoiceStatus,
    invoice_total: Decimal,
    remaining_paid: Decimal,
) -> InvoiceStatus {
    if remaining_paid <= Decimal::ZERO {
        match current {
            InvoiceStatus::Paid | InvoiceStatus::Partial => InvoiceStatus::Sent,
            other => other,
        }
    } else if remaining_paid < invoice_total - payment_tolerance() {
        InvoiceStatus::Partial
    } else {
        current
    }
}

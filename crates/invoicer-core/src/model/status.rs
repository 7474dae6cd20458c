use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::AuditEntry;
use crate::error::InvoicerError;

/// Invoice lifecycle status.
///
/// A flat set: any status may move to any other status. Only a transition
/// to the current status is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = InvoicerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                InvoicerError::Validation(format!(
                    "Unknown status '{}' (expected draft, sent, paid or overdue)",
                    value
                ))
            })
    }
}

/// A status change applied in memory by [`Invoice::update_status`].
///
/// Carries what the caller needs to write the matching audit entry once the
/// invoice itself has been persisted.
///
/// [`Invoice::update_status`]: super::Invoice::update_status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub from: InvoiceStatus,
    pub to: InvoiceStatus,
    pub reason: Option<String>,
}

impl StatusTransition {
    pub fn to_audit_entry(&self) -> AuditEntry {
        AuditEntry::new(
            self.invoice_id,
            self.invoice_number.clone(),
            self.from,
            self.to,
            self.reason.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        for status in InvoiceStatus::ALL {
            assert_eq!(status.to_string().parse::<InvoiceStatus>().unwrap(), status);
        }
        assert_eq!(" PAID ".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        assert!("void".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&InvoiceStatus::Overdue).unwrap();
        assert_eq!(json, "\"overdue\"");
    }
}

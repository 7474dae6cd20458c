use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::InvoiceStatus;

/// Actor recorded on every audit entry; there are no user accounts.
pub const SYSTEM_ACTOR: &str = "system";

/// Immutable record of one invoice status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    id: Uuid,
    invoice_id: Uuid,
    invoice_number: String,
    old_status: InvoiceStatus,
    new_status: InvoiceStatus,
    changed_by: String,
    changed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl AuditEntry {
    pub fn new(
        invoice_id: Uuid,
        invoice_number: impl Into<String>,
        old_status: InvoiceStatus,
        new_status: InvoiceStatus,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            invoice_id,
            invoice_number: invoice_number.into(),
            old_status,
            new_status,
            changed_by: SYSTEM_ACTOR.to_string(),
            changed_at: Utc::now(),
            reason: reason.filter(|r| !r.trim().is_empty()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn invoice_id(&self) -> Uuid {
        self.invoice_id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn old_status(&self) -> InvoiceStatus {
        self.old_status
    }

    pub fn new_status(&self) -> InvoiceStatus {
        self.new_status
    }

    pub fn changed_by(&self) -> &str {
        &self.changed_by
    }

    pub fn changed_at(&self) -> DateTime<Utc> {
        self.changed_at
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_uses_system_actor() {
        let invoice_id = Uuid::new_v4();
        let entry = AuditEntry::new(
            invoice_id,
            "2024-01",
            InvoiceStatus::Draft,
            InvoiceStatus::Sent,
            Some("emailed to client".to_string()),
        );

        assert_eq!(entry.invoice_id(), invoice_id);
        assert_eq!(entry.invoice_number(), "2024-01");
        assert_eq!(entry.changed_by(), SYSTEM_ACTOR);
        assert_eq!(entry.reason(), Some("emailed to client"));
    }

    #[test]
    fn test_blank_reason_is_omitted_from_json() {
        let entry = AuditEntry::new(
            Uuid::new_v4(),
            "2024-02",
            InvoiceStatus::Sent,
            InvoiceStatus::Paid,
            Some("  ".to_string()),
        );
        assert_eq!(entry.reason(), None);

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("reason").is_none());
        assert_eq!(json["old_status"], "sent");
        assert_eq!(json["new_status"], "paid");
    }
}

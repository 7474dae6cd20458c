use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InvoicerError, Result};
use crate::money::{ensure_non_negative, Money};

/// A billed customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    id: Uuid,
    name: String,
    address: String,
    emails: Vec<String>,
    default_hourly_rate: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Client {
    /// Create a client with a fresh ID.
    ///
    /// Emails are trimmed and blank entries dropped; at least one must remain.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::Validation` if the name is blank, no email
    /// remains, or the hourly rate is negative.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        emails: Vec<String>,
        default_hourly_rate: Money,
    ) -> Result<Self> {
        let now = Utc::now();
        let client = Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            address: address.into(),
            emails: normalize_emails(emails),
            default_hourly_rate,
            created_at: now,
            updated_at: now,
        };
        client.validate()?;
        Ok(client)
    }

    /// Replace every mutable field and refresh `updated_at`.
    ///
    /// The client is left untouched if the new values are invalid.
    pub fn update(
        &mut self,
        name: impl Into<String>,
        address: impl Into<String>,
        emails: Vec<String>,
        default_hourly_rate: Money,
    ) -> Result<()> {
        let mut next = self.clone();
        next.name = name.into().trim().to_string();
        next.address = address.into();
        next.emails = normalize_emails(emails);
        next.default_hourly_rate = default_hourly_rate;
        next.validate()?;

        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }

    /// Check the invariants a persisted client must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(InvoicerError::Validation(
                "Client name is required".to_string(),
            ));
        }
        if !self.emails.iter().any(|email| !email.trim().is_empty()) {
            return Err(InvoicerError::Validation(
                "At least one email is required".to_string(),
            ));
        }
        ensure_non_negative("Hourly rate", self.default_hourly_rate)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }

    pub fn default_hourly_rate(&self) -> Money {
        self.default_hourly_rate
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn normalize_emails(emails: Vec<String>) -> Vec<String> {
    emails
        .into_iter()
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn acme() -> Client {
        Client::new(
            "Acme",
            "1 Road Runner Way",
            vec!["a@acme.com".to_string()],
            dec!(100.00),
        )
        .unwrap()
    }

    #[test]
    fn test_new_client_stamps_identity_and_times() {
        let client = acme();
        assert!(!client.id().is_nil());
        assert_eq!(client.created_at(), client.updated_at());
        assert_eq!(client.primary_email(), Some("a@acme.com"));
        assert_eq!(client.default_hourly_rate(), dec!(100));
    }

    #[test]
    fn test_new_client_requires_an_email() {
        let err = Client::new("Acme", "", vec![], dec!(1)).unwrap_err();
        assert!(err.is_validation());

        let err = Client::new("Acme", "", vec!["  ".to_string()], dec!(1)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_new_client_rejects_blank_name_and_negative_rate() {
        assert!(Client::new(" ", "", vec!["x@y.z".into()], dec!(1)).is_err());
        assert!(Client::new("Acme", "", vec!["x@y.z".into()], dec!(-1)).is_err());
    }

    #[test]
    fn test_emails_are_trimmed_and_blanks_dropped() {
        let client = Client::new(
            "Acme",
            "",
            vec![" a@acme.com ".into(), "".into(), "b@acme.com".into()],
            dec!(0),
        )
        .unwrap();
        assert_eq!(client.emails(), ["a@acme.com", "b@acme.com"]);
    }

    #[test]
    fn test_update_replaces_fields_and_keeps_id() {
        let mut client = acme();
        let id = client.id();
        let created = client.created_at();

        client
            .update("Acme Corp", "2 Mesa Rd", vec!["billing@acme.com".into()], dec!(125))
            .unwrap();

        assert_eq!(client.id(), id);
        assert_eq!(client.created_at(), created);
        assert_eq!(client.name(), "Acme Corp");
        assert_eq!(client.address(), "2 Mesa Rd");
        assert_eq!(client.emails(), ["billing@acme.com"]);
        assert_eq!(client.default_hourly_rate(), dec!(125));
        assert!(client.updated_at() >= created);
    }

    #[test]
    fn test_invalid_update_leaves_client_unchanged() {
        let mut client = acme();
        let before = client.clone();

        assert!(client.update("Acme", "", vec![], dec!(1)).is_err());
        assert_eq!(client, before);
    }
}

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client::Client;
use super::status::{InvoiceStatus, StatusTransition};
use crate::error::{InvoicerError, Result};
use crate::money::{checked_add, checked_mul, ensure_non_negative, percent_of, Money};

/// Days between issue date and due date for a new invoice.
pub const DEFAULT_DUE_DAYS: i64 = 30;

const MAX_DUE_DAYS: i64 = 3650;

/// One billed line on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    id: Uuid,
    description: String,
    quantity: Money,
    unit_price: Money,
    total: Money,
}

impl LineItem {
    /// Create a line item with `total = quantity * unit_price`.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::Validation` if the description is blank,
    /// either amount is negative, or the total is out of range.
    pub fn new(description: impl Into<String>, quantity: Money, unit_price: Money) -> Result<Self> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(InvoicerError::Validation(
                "Line item description is required".to_string(),
            ));
        }
        ensure_non_negative("Quantity", quantity)?;
        ensure_non_negative("Unit price", unit_price)?;

        Ok(Self {
            id: Uuid::new_v4(),
            description,
            quantity,
            unit_price,
            total: checked_mul(quantity, unit_price)?,
        })
    }

    /// Re-derive `total` from quantity and unit price.
    pub fn update_total(&mut self) -> Result<()> {
        self.total = self.line_total()?;
        Ok(())
    }

    fn line_total(&self) -> Result<Money> {
        checked_mul(self.quantity, self.unit_price)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> Money {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn total(&self) -> Money {
        self.total
    }
}

/// An invoice and its derived totals.
///
/// `subtotal`, `discount`, `tax` and `total` are recomputed by every mutator
/// that touches line items or rates, so they always agree with their inputs.
/// Deserializing ignores the stored totals and derives them again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InvoiceRecord")]
pub struct Invoice {
    id: Uuid,
    number: String,
    client_id: Uuid,
    client_name: String,
    date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    line_items: Vec<LineItem>,
    subtotal: Money,
    discount_rate: Money,
    discount: Money,
    tax_rate: Money,
    tax: Money,
    total: Money,
    status: InvoiceStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Create a draft invoice dated now and due in [`DEFAULT_DUE_DAYS`].
    ///
    /// `client_name` is a snapshot: it is kept even if the client is later
    /// renamed or deleted.
    pub fn new(client_id: Uuid, client_name: impl Into<String>, number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            client_id,
            client_name: client_name.into(),
            date: now,
            due_date: now + Duration::days(DEFAULT_DUE_DAYS),
            line_items: Vec::new(),
            subtotal: Decimal::ZERO,
            discount_rate: Decimal::ZERO,
            discount: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            status: InvoiceStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a draft invoice billed to `client`.
    pub fn for_client(client: &Client, number: impl Into<String>) -> Self {
        Self::new(client.id(), client.name(), number)
    }

    /// Append a line item and recompute totals.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::Validation` if the new totals are out of
    /// range; the invoice is left as it was.
    pub fn add_line_item(&mut self, item: LineItem) -> Result<()> {
        self.change_and_recompute(|invoice| invoice.line_items.push(item))
    }

    /// Remove the line item with `item_id` and recompute totals.
    ///
    /// Removing an unknown ID is a no-op. Returns whether an item was removed.
    pub fn remove_line_item(&mut self, item_id: Uuid) -> Result<bool> {
        let mut removed = false;
        self.change_and_recompute(|invoice| {
            let before = invoice.line_items.len();
            invoice.line_items.retain(|item| item.id != item_id);
            removed = invoice.line_items.len() != before;
        })?;
        Ok(removed)
    }

    /// Set the discount percentage (`10` means 10%) and recompute totals.
    pub fn set_discount_rate(&mut self, rate: Money) -> Result<()> {
        ensure_non_negative("Discount rate", rate)?;
        self.change_and_recompute(|invoice| invoice.discount_rate = rate)
    }

    /// Set the tax percentage (`8` means 8%) and recompute totals.
    pub fn set_tax_rate(&mut self, rate: Money) -> Result<()> {
        ensure_non_negative("Tax rate", rate)?;
        self.change_and_recompute(|invoice| invoice.tax_rate = rate)
    }

    /// Recompute every derived amount from line items and rates.
    ///
    /// Order: subtotal, discount on subtotal, tax on the discounted amount,
    /// total. Line item totals are re-derived first so a stale value loaded
    /// from disk never leaks into the subtotal.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::Validation` if any amount overflows. Nothing
    /// is modified in that case.
    pub fn calculate_totals(&mut self) -> Result<()> {
        self.derive_totals()?;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn derive_totals(&mut self) -> Result<()> {
        let line_totals = self
            .line_items
            .iter()
            .map(LineItem::line_total)
            .collect::<Result<Vec<_>>>()?;
        let subtotal = line_totals
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| checked_add(sum, *line))?;
        let discount = percent_of(subtotal, self.discount_rate)?;
        let after_discount = subtotal - discount;
        let tax = percent_of(after_discount, self.tax_rate)?;
        let total = checked_add(after_discount, tax)?;

        for (item, line_total) in self.line_items.iter_mut().zip(line_totals) {
            item.total = line_total;
        }
        self.subtotal = subtotal;
        self.discount = discount;
        self.tax = tax;
        self.total = total;
        Ok(())
    }

    fn change_and_recompute(&mut self, change: impl FnOnce(&mut Self)) -> Result<()> {
        let before = self.clone();
        change(self);
        if let Err(err) = self.calculate_totals() {
            *self = before;
            return Err(err);
        }
        Ok(())
    }

    /// Move to `new_status`, returning the transition to audit.
    ///
    /// This only changes the in-memory invoice. The caller persists the
    /// invoice and then writes `transition.to_audit_entry()`.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::StatusUnchanged` if the invoice already has
    /// `new_status`; the invoice is not modified.
    pub fn update_status(
        &mut self,
        new_status: InvoiceStatus,
        reason: Option<String>,
    ) -> Result<StatusTransition> {
        if self.status == new_status {
            return Err(InvoicerError::StatusUnchanged(new_status));
        }

        let transition = StatusTransition {
            invoice_id: self.id,
            invoice_number: self.number.clone(),
            from: self.status,
            to: new_status,
            reason: reason.filter(|r| !r.trim().is_empty()),
        };
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(transition)
    }

    /// Set the due date to `days` after the issue date.
    pub fn set_due_in_days(&mut self, days: i64) -> Result<()> {
        if !(0..=MAX_DUE_DAYS).contains(&days) {
            return Err(InvoicerError::Validation(format!(
                "Due days must be between 0 and {}",
                MAX_DUE_DAYS
            )));
        }
        self.due_date = self.date + Duration::days(days);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_due_date(&mut self, due_date: DateTime<Utc>) -> Result<()> {
        if due_date.date_naive() < self.date.date_naive() {
            return Err(InvoicerError::Validation(
                "Due date cannot be before the invoice date".to_string(),
            ));
        }
        self.due_date = due_date;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Point the invoice at another client, refreshing the name snapshot.
    pub fn reassign_client(&mut self, client: &Client) {
        self.client_id = client.id();
        self.client_name = client.name().to_string();
        self.updated_at = Utc::now();
    }

    /// Unpaid and past its due date. Informational only; status is never
    /// changed automatically.
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.status != InvoiceStatus::Paid && self.due_date < now
    }

    pub fn find_line_item(&self, item_id: Uuid) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.id == item_id)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn discount_rate(&self) -> Money {
        self.discount_rate
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn tax_rate(&self) -> Money {
        self.tax_rate
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// On-disk shape of an invoice. Derived amounts are not read back.
#[derive(Deserialize)]
struct InvoiceRecord {
    id: Uuid,
    number: String,
    client_id: Uuid,
    client_name: String,
    date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    line_items: Vec<LineItem>,
    discount_rate: Money,
    tax_rate: Money,
    status: InvoiceStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRecord> for Invoice {
    type Error = InvoicerError;

    fn try_from(record: InvoiceRecord) -> Result<Self> {
        let mut invoice = Invoice {
            id: record.id,
            number: record.number,
            client_id: record.client_id,
            client_name: record.client_name,
            date: record.date,
            due_date: record.due_date,
            line_items: record.line_items,
            subtotal: Decimal::ZERO,
            discount_rate: record.discount_rate,
            discount: Decimal::ZERO,
            tax_rate: record.tax_rate,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        invoice.derive_totals()?;
        Ok(invoice)
    }
}

//! Parsing and lookup helpers shared by command handlers.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use invoicer_core::money::parse_money;
use invoicer_core::{Client, Invoice, LineItem, Money, Storage};

/// Parse an amount flag, naming the flag in the error.
pub fn parse_amount(flag: &str, value: &str) -> anyhow::Result<Money> {
    parse_money(value).map_err(|e| anyhow::anyhow!("--{}: {}", flag, e))
}

/// Parse a date (YYYY-MM-DD, or RFC 3339) as midnight UTC.
pub fn parse_date(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow::anyhow!("Invalid date value: {}", value))?;
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    Err(anyhow::anyhow!(
        "Invalid date (expected YYYY-MM-DD): {}",
        value
    ))
}

pub fn format_date(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

/// Find a client by full ID, unique ID prefix, or case-insensitive name.
pub fn resolve_client(storage: &dyn Storage, query: &str) -> anyhow::Result<Client> {
    let query = query.trim();
    if let Ok(id) = Uuid::parse_str(query) {
        return Ok(storage.get_client(id)?);
    }

    let clients = storage.get_all_clients()?;
    let by_name: Vec<&Client> = clients
        .iter()
        .filter(|c| c.name().eq_ignore_ascii_case(query))
        .collect();
    match by_name.as_slice() {
        [client] => return Ok((*client).clone()),
        [] => {}
        _ => {
            return Err(anyhow::anyhow!(
                "More than one client is named \"{}\"; use the client ID",
                query
            ))
        }
    }

    let prefix = query.to_lowercase();
    let by_prefix: Vec<&Client> = clients
        .iter()
        .filter(|c| !prefix.is_empty() && c.id().to_string().starts_with(&prefix))
        .collect();
    match by_prefix.as_slice() {
        [client] => Ok((*client).clone()),
        [] => Err(anyhow::anyhow!("Client \"{}\" not found", query)),
        _ => Err(anyhow::anyhow!(
            "Client ID prefix \"{}\" is ambiguous",
            query
        )),
    }
}

/// Find a line item by full ID or unique ID prefix.
pub fn resolve_line_item<'a>(invoice: &'a Invoice, query: &str) -> anyhow::Result<&'a LineItem> {
    let prefix = query.trim().to_lowercase();
    if prefix.is_empty() {
        return Err(anyhow::anyhow!("Line item ID is empty"));
    }
    let matches: Vec<&LineItem> = invoice
        .line_items()
        .iter()
        .filter(|item| item.id().to_string().starts_with(&prefix))
        .collect();
    match matches.as_slice() {
        [item] => Ok(item),
        [] => Err(anyhow::anyhow!(
            "Line item \"{}\" not found on invoice {}",
            query,
            invoice.number()
        )),
        _ => Err(anyhow::anyhow!("Line item prefix \"{}\" is ambiguous", query)),
    }
}

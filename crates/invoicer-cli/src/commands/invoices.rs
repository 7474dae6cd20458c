use chrono::{Datelike, Utc};
use rust_decimal::Decimal;

use invoicer_core::money::format_money;
use invoicer_core::{
    generate_invoice_number, AuditTrail, Invoice, InvoiceStatus, LineItem, Storage,
};

use crate::app::AppContext;
use crate::cli::{
    AddItemArgs, InvoiceCommand, InvoiceListArgs, InvoiceNewArgs, InvoiceSetArgs, StatusArgs,
};
use crate::helpers::{
    format_date, parse_amount, parse_date, resolve_client, resolve_line_item, short_id,
};
use crate::ui::{
    hint, kv, print, print_json, simple_table, status_label, table, title, UiContext,
};

use super::done;

pub fn handle_invoice(ctx: &AppContext, command: &InvoiceCommand) -> anyhow::Result<()> {
    match command {
        InvoiceCommand::New(args) => new(ctx, args),
        InvoiceCommand::List(args) => list(ctx, args),
        InvoiceCommand::Show { number, json } => show(ctx, number, *json),
        InvoiceCommand::AddItem(args) => add_item(ctx, args),
        InvoiceCommand::RemoveItem { number, item } => remove_item(ctx, number, item),
        InvoiceCommand::Set(args) => set(ctx, args),
        InvoiceCommand::Status(args) => status(ctx, args),
        InvoiceCommand::History { number, json } => history(ctx, number, *json),
        InvoiceCommand::Delete { number, yes } => delete(ctx, number, *yes),
    }
}

fn new(ctx: &AppContext, args: &InvoiceNewArgs) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let storage = ctx.open_storage()?;
    let client = resolve_client(&storage, &args.client)?;

    let year = Utc::now().year();
    let sequence = storage.get_next_invoice_number(year)?;
    let mut invoice = Invoice::for_client(&client, generate_invoice_number(year, sequence));
    invoice.set_due_in_days(args.due_days.unwrap_or(config.invoice.default_due_days))?;
    if let Some(discount) = args.discount.as_deref() {
        invoice.set_discount_rate(parse_amount("discount", discount)?)?;
    }
    let tax = match args.tax.as_deref() {
        Some(value) => parse_amount("tax", value)?,
        None => config.invoice.default_tax_rate,
    };
    invoice.set_tax_rate(tax)?;
    storage.save_invoice(&invoice)?;

    let ui = UiContext::from_env(false);
    done(
        ctx,
        &ui,
        &format!("Created invoice {} for {}", invoice.number(), client.name()),
    );
    if !ctx.quiet() {
        print(
            &ui,
            &hint(
                &ui,
                &format!(
                    "invoicer invoice add-item {} --description <TEXT> --quantity <HOURS>",
                    invoice.number()
                ),
            ),
        );
    }
    Ok(())
}

fn list(ctx: &AppContext, args: &InvoiceListArgs) -> anyhow::Result<()> {
    let status = args
        .status
        .as_deref()
        .map(str::parse::<InvoiceStatus>)
        .transpose()?;
    let storage = ctx.open_storage()?;
    let invoices: Vec<Invoice> = storage
        .get_all_invoices()?
        .into_iter()
        .filter(|invoice| status.map_or(true, |s| invoice.status() == s))
        .collect();

    let ui = UiContext::from_env(args.json);
    if ui.mode.is_json() {
        return print_json(&invoices);
    }
    if invoices.is_empty() {
        print(&ui, "No invoices found.");
        return Ok(());
    }
    print_invoice_table(&ui, &invoices);
    Ok(())
}

pub(super) fn print_invoice_table(ui: &UiContext, invoices: &[Invoice]) {
    let now = Utc::now();
    let rows: Vec<Vec<String>> = invoices
        .iter()
        .map(|invoice| {
            let mut status = status_label(ui, invoice.status());
            if invoice.status() == InvoiceStatus::Sent && invoice.is_past_due(now) {
                status.push_str(" (past due)");
            }
            vec![
                invoice.number().to_string(),
                invoice.client_name().to_string(),
                format_date(invoice.date()),
                format_date(invoice.due_date()),
                format_money(invoice.total()),
                status,
            ]
        })
        .collect();
    print(
        ui,
        &simple_table(
            ui,
            &["Number", "Client", "Date", "Due", "Total", "Status"],
            &rows,
        ),
    );
}

fn show(ctx: &AppContext, number: &str, json: bool) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let invoice = storage.get_invoice_by_number(number)?;
    let ui = UiContext::from_env(json);
    if ui.mode.is_json() {
        return print_json(&invoice);
    }

    if let Some(line) = title(&ui, &format!("Invoice {}", invoice.number())) {
        print(&ui, &line);
    } else {
        print(&ui, &kv(&ui, "Number", invoice.number()));
    }
    print(&ui, &kv(&ui, "Client", invoice.client_name()));
    print(&ui, &kv(&ui, "Status", &status_label(&ui, invoice.status())));
    print(&ui, &kv(&ui, "Date", &format_date(invoice.date())));
    print(&ui, &kv(&ui, "Due Date", &format_date(invoice.due_date())));

    if invoice.line_items().is_empty() {
        print(&ui, "No line items.");
    } else {
        let rows: Vec<Vec<String>> = invoice
            .line_items()
            .iter()
            .map(|item| {
                vec![
                    short_id(item.id()),
                    item.description().to_string(),
                    item.quantity().normalize().to_string(),
                    format_money(item.unit_price()),
                    format_money(item.total()),
                ]
            })
            .collect();
        print(
            &ui,
            &table(&ui, &["ID", "Description", "Qty", "Price", "Total"], &rows),
        );
    }

    print(&ui, &kv(&ui, "Subtotal", &format_money(invoice.subtotal())));
    if invoice.discount_rate() > Decimal::ZERO {
        print(
            &ui,
            &kv(
                &ui,
                &format!("Discount ({}%)", invoice.discount_rate().normalize()),
                &format!("-{}", format_money(invoice.discount())),
            ),
        );
    }
    if invoice.tax_rate() > Decimal::ZERO {
        print(
            &ui,
            &kv(
                &ui,
                &format!("Tax ({}%)", invoice.tax_rate().normalize()),
                &format_money(invoice.tax()),
            ),
        );
    }
    print(&ui, &kv(&ui, "Total", &format_money(invoice.total())));
    Ok(())
}

fn add_item(ctx: &AppContext, args: &AddItemArgs) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let mut invoice = storage.get_invoice_by_number(&args.number)?;

    let quantity = parse_amount("quantity", &args.quantity)?;
    let unit_price = match args.price.as_deref() {
        Some(value) => parse_amount("price", value)?,
        None => storage
            .get_client(invoice.client_id())
            .map_err(|e| {
                anyhow::anyhow!("{}; pass --price to set the unit price explicitly", e)
            })?
            .default_hourly_rate(),
    };
    let item = LineItem::new(&args.description, quantity, unit_price)?;
    let item_id = item.id();
    invoice.add_line_item(item)?;
    storage.update_invoice(&invoice)?;

    let ui = UiContext::from_env(false);
    done(
        ctx,
        &ui,
        &format!(
            "Added item {} to {} (total {})",
            short_id(item_id),
            invoice.number(),
            format_money(invoice.total())
        ),
    );
    Ok(())
}

fn remove_item(ctx: &AppContext, number: &str, query: &str) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let mut invoice = storage.get_invoice_by_number(number)?;
    let item_id = resolve_line_item(&invoice, query)?.id();
    invoice.remove_line_item(item_id)?;
    storage.update_invoice(&invoice)?;

    let ui = UiContext::from_env(false);
    done(
        ctx,
        &ui,
        &format!(
            "Removed item {} from {} (total {})",
            short_id(item_id),
            invoice.number(),
            format_money(invoice.total())
        ),
    );
    Ok(())
}

fn set(ctx: &AppContext, args: &InvoiceSetArgs) -> anyhow::Result<()> {
    if args.discount.is_none()
        && args.tax.is_none()
        && args.due_days.is_none()
        && args.due_date.is_none()
        && args.client.is_none()
    {
        return Err(anyhow::anyhow!(
            "Nothing to change. Pass --discount, --tax, --due-days, --due-date, or --client."
        ));
    }

    let storage = ctx.open_storage()?;
    let mut invoice = storage.get_invoice_by_number(&args.number)?;
    if let Some(value) = args.discount.as_deref() {
        invoice.set_discount_rate(parse_amount("discount", value)?)?;
    }
    if let Some(value) = args.tax.as_deref() {
        invoice.set_tax_rate(parse_amount("tax", value)?)?;
    }
    if let Some(days) = args.due_days {
        invoice.set_due_in_days(days)?;
    }
    if let Some(value) = args.due_date.as_deref() {
        invoice.set_due_date(parse_date(value)?)?;
    }
    if let Some(query) = args.client.as_deref() {
        let client = resolve_client(&storage, query)?;
        invoice.reassign_client(&client);
    }
    storage.update_invoice(&invoice)?;

    let ui = UiContext::from_env(false);
    done(
        ctx,
        &ui,
        &format!(
            "Updated invoice {} (total {})",
            invoice.number(),
            format_money(invoice.total())
        ),
    );
    Ok(())
}

fn status(ctx: &AppContext, args: &StatusArgs) -> anyhow::Result<()> {
    let new_status: InvoiceStatus = args.status.parse()?;
    let storage = ctx.open_storage()?;
    let mut invoice = storage.get_invoice_by_number(&args.number)?;
    let previous = invoice.status();

    AuditTrail::new(&storage).change_status(&mut invoice, new_status, args.reason.clone())?;

    let ui = UiContext::from_env(false);
    done(
        ctx,
        &ui,
        &format!("Status changed from {} to {}", previous, new_status),
    );
    Ok(())
}

fn history(ctx: &AppContext, number: &str, json: bool) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let invoice = storage.get_invoice_by_number(number)?;
    let entries = AuditTrail::new(&storage).history(invoice.id())?;

    let ui = UiContext::from_env(json);
    if ui.mode.is_json() {
        return print_json(&entries);
    }
    if entries.is_empty() {
        print(&ui, &format!("No status changes recorded for {}.", number));
        return Ok(());
    }
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                entry.changed_at().format("%Y-%m-%d %H:%M").to_string(),
                entry.old_status().to_string(),
                entry.new_status().to_string(),
                entry.changed_by().to_string(),
                entry.reason().unwrap_or("").to_string(),
            ]
        })
        .collect();
    print(
        &ui,
        &simple_table(&ui, &["When", "From", "To", "By", "Reason"], &rows),
    );
    Ok(())
}

fn delete(ctx: &AppContext, number: &str, yes: bool) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let invoice = storage.get_invoice_by_number(number)?;
    ctx.confirm(&format!("Delete invoice {}?", invoice.number()), yes)?;
    storage.delete_invoice(invoice.id())?;

    let ui = UiContext::from_env(false);
    done(ctx, &ui, &format!("Deleted invoice {}", invoice.number()));
    Ok(())
}

use invoicer_core::money::format_money;
use invoicer_core::{Client, Storage};

use crate::app::AppContext;
use crate::cli::{ClientArgs, ClientCommand, ClientEditArgs};
use crate::helpers::{format_date, parse_amount, resolve_client, short_id};
use crate::ui::{hint, kv, print, print_json, simple_table, title, UiContext};

use super::done;
use super::invoices::print_invoice_table;

pub fn handle_client(ctx: &AppContext, command: &ClientCommand) -> anyhow::Result<()> {
    match command {
        ClientCommand::Add(args) => add(ctx, args),
        ClientCommand::List(args) => list(ctx, args.json),
        ClientCommand::Show { client, json } => show(ctx, client, *json),
        ClientCommand::Edit(args) => edit(ctx, args),
        ClientCommand::Delete { client, yes } => delete(ctx, client, *yes),
        ClientCommand::Invoices { client, json } => invoices(ctx, client, *json),
    }
}

fn add(ctx: &AppContext, args: &ClientArgs) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let rate = parse_amount("rate", &args.rate)?;
    let client = Client::new(&args.name, &args.address, args.emails.clone(), rate)?;
    storage.save_client(&client)?;

    let ui = UiContext::from_env(false);
    done(
        ctx,
        &ui,
        &format!("Added client {} ({})", client.name(), short_id(client.id())),
    );
    Ok(())
}

fn list(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let clients = storage.get_all_clients()?;
    let ui = UiContext::from_env(json);
    if ui.mode.is_json() {
        return print_json(&clients);
    }
    if clients.is_empty() {
        print(&ui, "No clients yet.");
        print(&ui, &hint(&ui, "invoicer client add --name <NAME> --email <EMAIL>"));
        return Ok(());
    }

    let rows: Vec<Vec<String>> = clients
        .iter()
        .map(|client| {
            vec![
                short_id(client.id()),
                client.name().to_string(),
                client.primary_email().unwrap_or("").to_string(),
                format_money(client.default_hourly_rate()),
            ]
        })
        .collect();
    print(&ui, &simple_table(&ui, &["ID", "Name", "Email", "Rate"], &rows));
    Ok(())
}

fn show(ctx: &AppContext, query: &str, json: bool) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let client = resolve_client(&storage, query)?;
    let ui = UiContext::from_env(json);
    if ui.mode.is_json() {
        return print_json(&client);
    }

    if let Some(line) = title(&ui, client.name()) {
        print(&ui, &line);
    } else {
        print(&ui, &kv(&ui, "Name", client.name()));
    }
    print(&ui, &kv(&ui, "ID", &client.id().to_string()));
    print(&ui, &kv(&ui, "Address", client.address()));
    print(&ui, &kv(&ui, "Emails", &client.emails().join(", ")));
    print(
        &ui,
        &kv(&ui, "Hourly Rate", &format_money(client.default_hourly_rate())),
    );
    print(&ui, &kv(&ui, "Created", &format_date(client.created_at())));
    Ok(())
}

fn edit(ctx: &AppContext, args: &ClientEditArgs) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let mut client = resolve_client(&storage, &args.client)?;

    let name = args.name.clone().unwrap_or_else(|| client.name().to_string());
    let address = args
        .address
        .clone()
        .unwrap_or_else(|| client.address().to_string());
    let emails = if args.emails.is_empty() {
        client.emails().to_vec()
    } else {
        args.emails.clone()
    };
    let rate = match args.rate.as_deref() {
        Some(value) => parse_amount("rate", value)?,
        None => client.default_hourly_rate(),
    };

    client.update(name, address, emails, rate)?;
    storage.update_client(&client)?;

    let ui = UiContext::from_env(false);
    done(ctx, &ui, &format!("Updated client {}", client.name()));
    Ok(())
}

fn delete(ctx: &AppContext, query: &str, yes: bool) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let client = resolve_client(&storage, query)?;
    let invoice_count = storage.get_invoices_by_client(client.id())?.len();

    ctx.confirm(&format!("Delete client {}?", client.name()), yes)?;
    storage.delete_client(client.id())?;

    let ui = UiContext::from_env(false);
    done(ctx, &ui, &format!("Deleted client {}", client.name()));
    if invoice_count > 0 && !ctx.quiet() {
        print(
            &ui,
            &hint(
                &ui,
                &format!("{} invoice(s) for this client were kept", invoice_count),
            ),
        );
    }
    Ok(())
}

fn invoices(ctx: &AppContext, query: &str, json: bool) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let client = resolve_client(&storage, query)?;
    let invoices = storage.get_invoices_by_client(client.id())?;
    let ui = UiContext::from_env(json);
    if ui.mode.is_json() {
        return print_json(&invoices);
    }
    if invoices.is_empty() {
        print(&ui, &format!("No invoices for {}.", client.name()));
        return Ok(());
    }
    print_invoice_table(&ui, &invoices);
    Ok(())
}

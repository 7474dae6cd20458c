use std::path::PathBuf;

use invoicer_core::Storage;

use crate::app::AppContext;
use crate::cli::ExportArgs;
use crate::export::{compile_pdf, load_template, render_invoice, write_tex};
use crate::ui::UiContext;

use super::done;

pub fn handle_export(ctx: &AppContext, args: &ExportArgs) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let storage = ctx.open_storage()?;
    let invoice = storage.get_invoice_by_number(&args.number)?;
    let client = match storage.get_client(invoice.client_id()) {
        Ok(client) => Some(client),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e.into()),
    };

    let template = load_template(&config.templates_dir())?;
    let source = render_invoice(&template, &invoice, client.as_ref(), config);
    let output_dir = args
        .output
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.exports_dir());

    let path = if args.tex_only {
        write_tex(&source, invoice.number(), &output_dir)?
    } else {
        compile_pdf(&source, invoice.number(), &output_dir)?
    };

    let ui = UiContext::from_env(false);
    done(ctx, &ui, &format!("Exported {}", path.display()));
    Ok(())
}

//! Invoicer CLI - a personal invoicing manager for the terminal
//!
//! Thin command-line front end over `invoicer-core`: clients, invoices,
//! status history, backups, and LaTeX/PDF export.

mod app;
mod cli;
mod commands;
mod config;
mod export;
mod helpers;
mod logging;
mod ui;

use clap::{CommandFactory, Parser};
use clap_complete::generate;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{
    handle_backup, handle_client, handle_export, handle_init, handle_invoice, handle_restore,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let ctx = AppContext::new(&cli);

    match &ctx.cli().command {
        Commands::Init(args) => handle_init(&ctx, args),
        Commands::Client(command) => handle_client(&ctx, command),
        Commands::Invoice(command) => handle_invoice(&ctx, command),
        Commands::Backup(args) => handle_backup(&ctx, args),
        Commands::Restore(args) => handle_restore(&ctx, args),
        Commands::Export(args) => handle_export(&ctx, args),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "invoicer", &mut std::io::stdout());
            Ok(())
        }
    }
}

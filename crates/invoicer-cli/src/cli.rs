use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use invoicer_core::VERSION;

/// Invoicer - a personal, single-operator invoicing manager
#[derive(Parser)]
#[command(name = "invoicer")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = "INVOICER_CONFIG")]
    pub config: Option<String>,

    /// Data directory (overrides the config file)
    #[arg(long, global = true, env = "INVOICER_DATA_PATH")]
    pub data_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a config file and create the data directories
    Init(InitArgs),

    /// Manage clients
    #[command(subcommand)]
    Client(ClientCommand),

    /// Manage invoices
    #[command(subcommand)]
    Invoice(InvoiceCommand),

    /// Write a backup archive of all data
    Backup(BackupArgs),

    /// Replace all data with the contents of a backup archive
    Restore(RestoreArgs),

    /// Export an invoice to PDF (or LaTeX source)
    Export(ExportArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,

    /// Company name printed on invoices
    #[arg(long)]
    pub company_name: Option<String>,

    /// Company address printed on invoices
    #[arg(long)]
    pub company_address: Option<String>,

    /// Company email printed on invoices
    #[arg(long)]
    pub company_email: Option<String>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand)]
pub enum ClientCommand {
    /// Add a client
    Add(ClientArgs),

    /// List clients
    List(ListArgs),

    /// Show one client
    Show {
        /// Client ID, ID prefix, or name
        client: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit a client (omitted fields keep their value)
    Edit(ClientEditArgs),

    /// Delete a client (its invoices are kept)
    Delete {
        /// Client ID, ID prefix, or name
        client: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List a client's invoices
    Invoices {
        /// Client ID, ID prefix, or name
        client: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Arguments for `client add`
#[derive(Args)]
pub struct ClientArgs {
    /// Client name
    #[arg(long)]
    pub name: String,

    /// Billing address
    #[arg(long, default_value = "")]
    pub address: String,

    /// Billing email (repeatable, or comma separated)
    #[arg(short, long = "email", value_name = "EMAIL", value_delimiter = ',', required = true)]
    pub emails: Vec<String>,

    /// Default hourly rate
    #[arg(long, default_value = "0")]
    pub rate: String,
}

/// Arguments for `client edit`
#[derive(Args)]
pub struct ClientEditArgs {
    /// Client ID, ID prefix, or name
    pub client: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    /// Replace the email list (repeatable, or comma separated)
    #[arg(short, long = "email", value_name = "EMAIL", value_delimiter = ',')]
    pub emails: Vec<String>,

    #[arg(long)]
    pub rate: Option<String>,
}

/// Shared arguments for list commands
#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum InvoiceCommand {
    /// Create a draft invoice with the next number for this year
    New(InvoiceNewArgs),

    /// List invoices
    List(InvoiceListArgs),

    /// Show an invoice with its line items
    Show {
        /// Invoice number (e.g. 2024-01)
        number: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a line item
    AddItem(AddItemArgs),

    /// Remove a line item by ID or ID prefix
    RemoveItem {
        /// Invoice number
        number: String,

        /// Line item ID or ID prefix
        item: String,
    },

    /// Change rates, due date, or client
    Set(InvoiceSetArgs),

    /// Change an invoice's status
    Status(StatusArgs),

    /// Show an invoice's status history
    History {
        /// Invoice number
        number: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete an invoice (its audit history is kept)
    Delete {
        /// Invoice number
        number: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for `invoice new`
#[derive(Args)]
pub struct InvoiceNewArgs {
    /// Client ID, ID prefix, or name
    pub client: String,

    /// Days until the invoice is due (defaults to config)
    #[arg(long)]
    pub due_days: Option<i64>,

    /// Discount rate in percent
    #[arg(long)]
    pub discount: Option<String>,

    /// Tax rate in percent (defaults to config)
    #[arg(long)]
    pub tax: Option<String>,
}

/// Arguments for `invoice list`
#[derive(Args)]
pub struct InvoiceListArgs {
    /// Only invoices with this status
    #[arg(long)]
    pub status: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `invoice add-item`
#[derive(Args)]
pub struct AddItemArgs {
    /// Invoice number
    pub number: String,

    /// Item description
    #[arg(short, long)]
    pub description: String,

    /// Quantity (hours, units)
    #[arg(long, default_value = "1")]
    pub quantity: String,

    /// Unit price (defaults to the client's hourly rate)
    #[arg(long)]
    pub price: Option<String>,
}

/// Arguments for `invoice set`
#[derive(Args)]
pub struct InvoiceSetArgs {
    /// Invoice number
    pub number: String,

    /// Discount rate in percent
    #[arg(long)]
    pub discount: Option<String>,

    /// Tax rate in percent
    #[arg(long)]
    pub tax: Option<String>,

    /// Days after the issue date the invoice is due
    #[arg(long, conflicts_with = "due_date")]
    pub due_days: Option<i64>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due_date: Option<String>,

    /// Reassign to another client (ID, ID prefix, or name)
    #[arg(long)]
    pub client: Option<String>,
}

/// Arguments for `invoice status`
#[derive(Args)]
pub struct StatusArgs {
    /// Invoice number
    pub number: String,

    /// New status (draft, sent, paid, overdue)
    pub status: String,

    /// Optional note stored with the change
    #[arg(long)]
    pub reason: Option<String>,
}

/// Arguments for the `backup` command
#[derive(Args)]
pub struct BackupArgs {
    /// Directory to write the archive into (defaults to the current directory)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for the `restore` command
#[derive(Args)]
pub struct RestoreArgs {
    /// Backup archive to restore from
    pub file: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `export` command
#[derive(Args)]
pub struct ExportArgs {
    /// Invoice number
    pub number: String,

    /// Output directory (defaults to the exports directory)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write the LaTeX source without running pdflatex
    #[arg(long)]
    pub tex_only: bool,
}

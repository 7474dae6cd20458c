//! Command handlers, one module per command group.

mod clients;
mod export;
mod init;
mod invoices;
mod maintenance;

pub use clients::handle_client;
pub use export::handle_export;
pub use init::handle_init;
pub use invoices::handle_invoice;
pub use maintenance::{handle_backup, handle_restore};

use crate::app::AppContext;
use crate::ui::{badge, Badge, UiContext};

/// Print a success line unless `--quiet`.
fn done(ctx: &AppContext, ui: &UiContext, message: &str) {
    if !ctx.quiet() {
        crate::ui::print(ui, &badge(ui, Badge::Ok, message));
    }
}

/// Print a warning to stderr; warnings are never silenced by `--quiet`.
fn warn_line(ui: &UiContext, message: &str) {
    eprintln!("{}", badge(ui, Badge::Warn, message));
}

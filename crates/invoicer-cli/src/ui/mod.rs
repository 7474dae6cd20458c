//! UI primitives for the Invoicer CLI.
//!
//! - **Context**: TTY and color detection
//! - **Mode**: Output mode resolution (json, plain, pretty)
//! - **Theme**: Badges, styles, status colors
//! - **Render**: Tables, key-value lines, hints

mod context;
mod mode;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use theme::Badge;

pub use render::{
    badge, hint, kv, print, print_json, simple_table, status_label, table, title,
};

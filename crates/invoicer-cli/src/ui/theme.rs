//! Badges, text styles, and status colors.

use owo_colors::{OwoColorize, Style};

use invoicer_core::InvoiceStatus;

/// Badge types for result lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Ok,
    Warn,
}

impl Badge {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Ok => "[OK]",
            Self::Warn => "[WARN]",
        }
    }

    pub fn style(&self) -> Style {
        match self {
            Self::Ok => Style::new().green(),
            Self::Warn => Style::new().yellow(),
        }
    }
}

pub mod styles {
    use owo_colors::Style;

    pub fn dim() -> Style {
        Style::new().dimmed()
    }

    pub fn bold() -> Style {
        Style::new().bold()
    }
}

/// Apply `style` when color is enabled.
pub fn styled(text: &str, style: Style, color: bool) -> String {
    if color {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

pub fn status_style(status: InvoiceStatus) -> Style {
    match status {
        InvoiceStatus::Draft => Style::new().dimmed(),
        InvoiceStatus::Sent => Style::new().cyan(),
        InvoiceStatus::Paid => Style::new().green(),
        InvoiceStatus::Overdue => Style::new().red().bold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_text() {
        assert_eq!(Badge::Ok.text(), "[OK]");
        assert_eq!(Badge::Warn.text(), "[WARN]");
    }

    #[test]
    fn test_styled_without_color_is_plain() {
        assert_eq!(styled("paid", status_style(InvoiceStatus::Paid), false), "paid");
        assert_ne!(styled("paid", status_style(InvoiceStatus::Paid), true), "paid");
    }
}

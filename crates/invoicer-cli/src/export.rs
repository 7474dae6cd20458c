//! LaTeX rendering and PDF generation for invoices.
//!
//! Templates are plain LaTeX with `{{name}}` placeholders. A custom
//! `templates/invoice.tex` under the data path replaces the built-in one.
//! Every value substituted into a template is already escaped.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use invoicer_core::money::format_money;
use invoicer_core::{Client, Invoice, Money};

use crate::config::InvoicerConfig;

pub const BUILTIN_TEMPLATE: &str = include_str!("templates/invoice.tex");
pub const TEMPLATE_FILE: &str = "invoice.tex";

/// Escape LaTeX special characters.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash{}"),
            '$' | '%' | '&' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(ch),
        }
    }
    out
}

/// Custom template from `templates_dir` if present, else the built-in one.
pub fn load_template(templates_dir: &Path) -> anyhow::Result<String> {
    let path = templates_dir.join(TEMPLATE_FILE);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            debug!(path = %path.display(), "using custom invoice template");
            Ok(contents)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BUILTIN_TEMPLATE.to_string()),
        Err(e) => Err(anyhow::anyhow!(
            "Failed to read template {}: {}",
            path.display(),
            e
        )),
    }
}

/// Replace `{{name}}` placeholders in a single pass.
///
/// Unknown names are left in place. Text between `{{` and `}}` that is not
/// a plain identifier is copied through untouched.
pub fn render_template(template: &str, values: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let key = after.find("}}").map(|end| &after[..end]).filter(|key| {
            !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        match key {
            Some(key) => {
                match values.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        warn!(placeholder = key, "unknown template placeholder");
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[key.len() + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Fill `template` for `invoice`.
///
/// `client` is `None` when the client record was deleted; the invoice's
/// name snapshot is still printed.
pub fn render_invoice(
    template: &str,
    invoice: &Invoice,
    client: Option<&Client>,
    config: &InvoicerConfig,
) -> String {
    let mut values: HashMap<&str, String> = HashMap::new();
    values.insert("company_name", escape_latex(&config.company.name));
    values.insert("company_address", escape_latex(&config.company.address));
    values.insert("company_email", escape_latex(&config.company.email));
    values.insert("invoice_number", escape_latex(invoice.number()));
    values.insert("invoice_date", long_date(invoice.date()));
    values.insert("due_date", long_date(invoice.due_date()));
    values.insert("status", invoice.status().to_string());
    values.insert("client_name", escape_latex(invoice.client_name()));
    values.insert(
        "client_address",
        client
            .map(|c| escape_latex(c.address()))
            .unwrap_or_default(),
    );
    values.insert(
        "client_emails",
        client
            .map(|c| escape_latex(&c.emails().join(", ")))
            .unwrap_or_default(),
    );
    values.insert("line_items", line_item_rows(invoice));
    values.insert("subtotal", format_money(invoice.subtotal()));
    values.insert(
        "discount_row",
        adjustment_row(
            "Discount",
            invoice.discount_rate(),
            -invoice.discount(),
        ),
    );
    values.insert(
        "tax_row",
        adjustment_row("Tax", invoice.tax_rate(), invoice.tax()),
    );
    values.insert("discount", format_money(invoice.discount()));
    values.insert("tax", format_money(invoice.tax()));
    values.insert("total", format_money(invoice.total()));
    values.insert("payment_methods", payment_block(config));

    render_template(template, &values)
}

fn long_date(value: chrono::DateTime<chrono::Utc>) -> String {
    value.format("%B %-d, %Y").to_string()
}

fn line_item_rows(invoice: &Invoice) -> String {
    invoice
        .line_items()
        .iter()
        .map(|item| {
            format!(
                "  {} & {} & \\${} & \\${} \\\\\n",
                escape_latex(item.description()),
                item.quantity().normalize(),
                format_money(item.unit_price()),
                format_money(item.total())
            )
        })
        .collect()
}

/// Summary row for a rate-based adjustment, empty when the rate is zero.
fn adjustment_row(label: &str, rate: Money, amount: Money) -> String {
    if rate <= Decimal::ZERO {
        return String::new();
    }
    let sign = if amount < Decimal::ZERO { "-" } else { "" };
    format!(
        "  \\multicolumn{{3}}{{r}}{{{} ({}\\%)}} & {}\\${} \\\\\n",
        label,
        rate.normalize(),
        sign,
        format_money(amount.abs())
    )
}

/// Lines describing how to pay, one per configured method.
pub fn payment_methods(config: &InvoicerConfig) -> Vec<(&'static str, String)> {
    let payment = &config.payment;
    let present = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut methods = Vec::new();
    if let Some(zelle) = present(&payment.zelle) {
        methods.push(("Zelle", zelle));
    }
    if let Some(venmo) = present(&payment.venmo) {
        methods.push(("Venmo", venmo));
    }
    if let (Some(name), Some(routing), Some(account)) = (
        present(&payment.bank_name),
        present(&payment.bank_routing),
        present(&payment.bank_account),
    ) {
        methods.push((
            "Bank Wire",
            format!("{}, Routing: {}, Account: {}", name, routing, account),
        ));
    }
    methods
}

fn payment_block(config: &InvoicerConfig) -> String {
    let methods = payment_methods(config);
    if methods.is_empty() {
        return String::new();
    }
    let mut block = String::from("\\textbf{Payment Methods}\n\\begin{itemize}\n");
    for (kind, details) in methods {
        block.push_str(&format!(
            "  \\item \\textbf{{{}:}} {}\n",
            kind,
            escape_latex(&details)
        ));
    }
    block.push_str("\\end{itemize}\n");
    block
}

pub fn tex_file_name(number: &str) -> String {
    format!("invoice_{}.tex", number)
}

pub fn pdf_file_name(number: &str) -> String {
    format!("invoice_{}.pdf", number)
}

fn create_output_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create export directory {}: {}",
            dir.display(),
            e
        )
    })
}

/// Write the LaTeX source as `invoice_<number>.tex` in `output_dir`.
pub fn write_tex(source: &str, number: &str, output_dir: &Path) -> anyhow::Result<PathBuf> {
    create_output_dir(output_dir)?;
    let path = output_dir.join(tex_file_name(number));
    invoicer_core::fs::write_atomic(&path, source.as_bytes())?;
    Ok(path)
}

/// Compile `source` with `pdflatex` and copy the PDF into `output_dir`.
///
/// On a failed run the source is kept as `debug_invoice_<number>.tex` in
/// `output_dir` for inspection.
pub fn compile_pdf(source: &str, number: &str, output_dir: &Path) -> anyhow::Result<PathBuf> {
    match Command::new("pdflatex").arg("--version").output() {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(anyhow::anyhow!(
                "pdflatex not found in PATH. Install LaTeX (e.g. TeX Live) or use --tex-only"
            ))
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to run pdflatex: {}", e)),
    }
    create_output_dir(output_dir)?;

    let work_dir = tempfile::tempdir()
        .map_err(|e| anyhow::anyhow!("Failed to create temp directory: {}", e))?;
    let tex_name = tex_file_name(number);
    std::fs::write(work_dir.path().join(&tex_name), source)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", tex_name, e))?;

    debug!(dir = %work_dir.path().display(), "running pdflatex");
    let output = Command::new("pdflatex")
        .arg("-interaction=nonstopmode")
        .arg("-halt-on-error")
        .arg(&tex_name)
        .current_dir(work_dir.path())
        .output()
        .map_err(|e| anyhow::anyhow!("Failed to run pdflatex: {}", e))?;

    let pdf_name = pdf_file_name(number);
    let built = work_dir.path().join(&pdf_name);
    if !output.status.success() || !built.exists() {
        let debug_path = output_dir.join(format!("debug_{}", tex_name));
        if let Err(e) = std::fs::write(&debug_path, source) {
            warn!(path = %debug_path.display(), error = %e, "could not keep debug source");
        }
        let log = String::from_utf8_lossy(&output.stdout);
        return Err(anyhow::anyhow!(
            "{}\nLaTeX source saved to {}",
            latex_failure_summary(&log),
            debug_path.display()
        ));
    }

    let destination = output_dir.join(&pdf_name);
    std::fs::copy(&built, &destination).map_err(|e| {
        anyhow::anyhow!(
            "Failed to copy PDF to {}: {}",
            destination.display(),
            e
        )
    })?;
    info!(path = %destination.display(), "invoice exported");
    Ok(destination)
}

/// First `! LaTeX Error:` line, else the start of the log.
fn latex_failure_summary(log: &str) -> String {
    if let Some(line) = log.lines().find(|line| line.contains("! LaTeX Error:")) {
        return format!("LaTeX error: {}", line.trim_start_matches("! ").trim());
    }
    if let Some(line) = log.lines().find(|line| line.starts_with('!')) {
        return format!("pdflatex failed: {}", line.trim_start_matches("! ").trim());
    }
    let excerpt: String = log.chars().take(500).collect();
    format!("pdflatex failed. Output excerpt:\n{}", excerpt)
}

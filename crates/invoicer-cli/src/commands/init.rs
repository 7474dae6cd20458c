use std::io::IsTerminal;

use dialoguer::Input;

use crate::app::AppContext;
use crate::cli::InitArgs;
use crate::config::{
    default_data_path, write_config, InvoicerConfig, DEFAULT_COMPANY_ADDRESS,
    DEFAULT_COMPANY_EMAIL, DEFAULT_COMPANY_NAME,
};
use crate::ui::{hint, kv, print, UiContext};

use super::done;

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let ui = UiContext::from_env(false);
    let config_path = ctx.config_path()?;
    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {}. Pass --force to overwrite it.",
            config_path.display()
        ));
    }

    let data_path = match ctx.data_path_override() {
        Some(path) => path,
        None => default_data_path()?,
    };
    let interactive = !args.no_input && std::io::stdin().is_terminal();

    let mut config = InvoicerConfig::with_data_path(&data_path);
    config.company.name = company_field(
        interactive,
        "Company name",
        args.company_name.as_deref(),
        DEFAULT_COMPANY_NAME,
    )?;
    config.company.address = company_field(
        interactive,
        "Company address",
        args.company_address.as_deref(),
        DEFAULT_COMPANY_ADDRESS,
    )?;
    config.company.email = company_field(
        interactive,
        "Company email",
        args.company_email.as_deref(),
        DEFAULT_COMPANY_EMAIL,
    )?;

    write_config(&config_path, &config)?;
    create_data_layout(&config)?;

    done(ctx, &ui, "Initialized invoicer");
    if !ctx.quiet() {
        print(&ui, &kv(&ui, "Config", &config_path.display().to_string()));
        print(&ui, &kv(&ui, "Data", &config.data_path().display().to_string()));
        print(
            &ui,
            &hint(&ui, "Add payment details under [payment] in the config file"),
        );
    }
    Ok(())
}

/// Flag value wins; otherwise prompt when interactive, else the default.
fn company_field(
    interactive: bool,
    prompt: &str,
    flag: Option<&str>,
    default: &str,
) -> anyhow::Result<String> {
    if let Some(value) = flag.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(value.to_string());
    }
    if !interactive {
        return Ok(default.to_string());
    }
    let value: String = Input::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()?;
    Ok(value.trim().to_string())
}

fn create_data_layout(config: &InvoicerConfig) -> anyhow::Result<()> {
    config.ensure_directories()?;
    invoicer_core::JsonStorage::open(config.data_dir())?;
    Ok(())
}

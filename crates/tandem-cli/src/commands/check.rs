//! Check command implementation.
//!
//! Validates configuration without starting anything.

use crate::cli::CheckArgs;
use crate::commands::utils;
use crate::config::{Overrides, TandemConfig};
use crate::dev::DevConfig;
use crate::error::Result;
use crate::ui;

/// Execute the check command.
///
/// With `--schema` or `--example`, prints JSON to stdout and returns.
/// Otherwise loads every configuration layer, validates the result and
/// prints the resolved session layout.
///
/// # Errors
///
/// Returns errors for unreadable or invalid configuration.
pub async fn execute(args: CheckArgs) -> Result<()> {
    if args.schema {
        println!(
            "{}",
            serde_json::to_string_pretty(&TandemConfig::json_schema())?
        );
        return Ok(());
    }

    if args.example {
        println!("{}", TandemConfig::example_config()?);
        return Ok(());
    }

    let cwd = utils::resolve_cwd(args.cwd.as_deref())?;

    match TandemConfig::locate(&cwd, args.config.as_deref())? {
        Some(path) => ui::info(&format!("Checking {}", path.display())),
        None => ui::warning("No tandem.config.json found, checking defaults"),
    }

    let config = utils::load_dev_config(&cwd, args.config.as_deref(), &Overrides::default())?;
    ui::success("Configuration is valid!");

    for line in layout(&config) {
        ui::info(&line);
    }

    Ok(())
}

/// Human-readable summary of a resolved session.
pub fn layout(config: &DevConfig) -> Vec<String> {
    let mut lines = vec![
        format!("Project:        {}", config.cwd.display()),
        format!("Build path:     {} (removed at startup)", config.build_path_display),
        format!("Client URL:     {}", config.client_addr.href),
        format!("Client assets:  {}", config.client_public_url),
        format!("Client build:   {}", config.client.command.join(" ")),
        format!(
            "Client output:  {}",
            config.client.output.path.display()
        ),
    ];

    for root in &config.client_watch {
        lines.push(format!("Client watch:   {}", root.display()));
    }

    if config.has_server {
        lines.push(format!("Server URL:     {}", config.server_addr.href));
        lines.push(format!("Server build:   {}", config.server.command.join(" ")));
        lines.push(format!(
            "Server watch:   {}",
            config.server_src_path.display()
        ));

        let mut run = vec![config.server_process.exec.clone()];
        run.extend(config.server_process.args.iter().cloned());
        run.push(config.server_script().display().to_string());
        lines.push(format!("Server process: {}", run.join(" ")));
    } else {
        lines.push("Server:         none (client only)".to_string());
    }

    lines
}

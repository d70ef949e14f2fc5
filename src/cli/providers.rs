//! The `providers` command: list definitions or show one.

use colored::Colorize;

use crate::cli::args::{OutputFormat, ProvidersArgs};
use crate::error::Result;
use crate::storage::paths::AppPaths;
use crate::storage::providers;

/// List the effective provider set, or print one definition as JSON.
///
/// # Errors
///
/// Returns error when the override file is invalid or the id is unknown.
pub fn execute(
    args: &ProvidersArgs,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    let paths = AppPaths::new();

    if let Some(id) = &args.id {
        let definition = providers::find(&paths, id)?;
        // a single definition is always JSON; it doubles as an override
        // template for providers.json
        let out = if pretty || format == OutputFormat::Human {
            serde_json::to_string_pretty(&definition)?
        } else {
            serde_json::to_string(&definition)?
        };
        println!("{out}");
        return Ok(());
    }

    let all = providers::effective_providers(&paths)?;
    match format {
        OutputFormat::Json => {
            let out = if pretty {
                serde_json::to_string_pretty(&all)?
            } else {
                serde_json::to_string(&all)?
            };
            println!("{out}");
        }
        OutputFormat::Human => {
            for provider in &all {
                let id = if no_color {
                    provider.id.clone()
                } else {
                    provider.id.bold().to_string()
                };
                println!("{id:<20} {:<40} {}", provider.name, provider.base_url);
            }
        }
    }
    Ok(())
}

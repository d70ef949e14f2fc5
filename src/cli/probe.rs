//! Execution of the probing commands (`ping`, `models`, `call`, `probe`).

use crate::cli::args::{OutputFormat, ProbeArgs};
use crate::core::pipeline::{CallOptions, Probe};
use crate::error::Result;
use crate::render;
use crate::storage::paths::AppPaths;
use crate::storage::{providers, Settings};

/// Which probing operation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Ping,
    Models,
    Call,
    Full,
}

/// Resolve configuration, run the operation, and print the result.
///
/// # Errors
///
/// Returns error on configuration or transport failure; upstream HTTP
/// errors are part of the printed record, not errors here.
pub async fn execute(
    op: Operation,
    args: &ProbeArgs,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    let paths = AppPaths::new();
    let mut settings = Settings::load(&paths)?;
    if args.proxy || args.proxy_url.is_some() {
        settings.use_proxy = true;
    }
    if let Some(url) = &args.proxy_url {
        settings.proxy_base_url = url.trim_end_matches('/').to_string();
    }

    let mut provider = providers::find(&paths, &args.provider)?;
    if let Some(base) = &args.base_url {
        provider.base_url = base.trim_end_matches('/').to_string();
    }

    let probe = Probe::new(settings.transport())?;
    let opts = CallOptions {
        api_key: args.api_key.clone(),
        model: args.model.clone(),
        prompt: args.prompt.clone(),
        timeout_ms: args.timeout_ms.or(settings.timeout_ms),
    };

    let records = match op {
        Operation::Ping => vec![probe.ping(&provider, &opts).await?],
        Operation::Models => vec![probe.list_models(&provider, &opts).await?],
        Operation::Call => vec![probe.test_call(&provider, &opts).await?],
        Operation::Full => probe.full_probe(&provider, &opts).await?,
    };

    let output = if records.len() == 1 {
        render::render_record(&records[0], format, pretty, no_color)?
    } else {
        render::render_records(&records, format, pretty, no_color)?
    };
    println!("{output}");
    Ok(())
}

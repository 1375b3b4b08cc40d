//! Persisted CLI defaults

use crate::config::{Config, DEFAULT_API_URL};
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ConfigView {
    path: PathBuf,
    api_url: String,
    default_format: OutputFormat,
    /// Values actually present in the file
    stored: Config,
}

/// Print the stored configuration and the values it resolves to
pub fn show(config: &Config, format: OutputFormat) -> Result<()> {
    let view = ConfigView {
        path: Config::config_path()?,
        api_url: config.resolve_api_url(None),
        default_format: config.resolve_format(None),
        stored: config.clone(),
    };

    match format {
        OutputFormat::Json => output::print_json(&view)?,
        OutputFormat::Table => {
            output::print_header("CLI Configuration");
            println!("File:           {}", view.path.display());
            println!(
                "API URL:        {}{}",
                view.api_url,
                if config.api_url.is_none() { " (default)" } else { "" }
            );
            println!(
                "Default format: {:?}{}",
                view.default_format,
                if config.default_format.is_none() { " (default)" } else { "" }
            );
        }
    }

    Ok(())
}

/// Persist the server URL used when `--api-url` is absent
pub fn set_api_url(mut config: Config, url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid API URL: {}", url))?;
    config.api_url = if url == DEFAULT_API_URL {
        None
    } else {
        Some(url.to_string())
    };
    let path = config.save()?;
    output::print_success(&format!("API URL set to {} in {}", url, path.display()));
    Ok(())
}

/// Persist the output format used when `--format` is absent
pub fn set_format(mut config: Config, format: OutputFormat) -> Result<()> {
    config.default_format = Some(format);
    let path = config.save()?;
    output::print_success(&format!(
        "Default format set to {:?} in {}",
        format,
        path.display()
    ));
    Ok(())
}

//! Provider override storage.
//!
//! `providers.json` in the config directory holds an array of provider
//! definitions. An entry whose id matches a built-in replaces it wholesale;
//! any other id adds a new provider. Overrides go through the same
//! validation as built-ins so a typo fails loudly at load time, not at
//! request time.

use std::fs;
use std::path::Path;

use crate::core::catalog;
use crate::core::provider::ProviderDefinition;
use crate::error::{ProbeError, Result};

use super::paths::AppPaths;

/// Load the override file. A missing file is an empty list.
///
/// # Errors
///
/// Returns a CONFIG error when the file exists but does not parse or an
/// entry fails validation.
pub fn load_overrides(paths: &AppPaths) -> Result<Vec<ProviderDefinition>> {
    load_overrides_file(&paths.providers_file())
}

fn load_overrides_file(path: &Path) -> Result<Vec<ProviderDefinition>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)?;
    let overrides: Vec<ProviderDefinition> = serde_json::from_str(&contents)
        .map_err(|e| ProbeError::Config(format!("{}: {e}", path.display())))?;
    for definition in &overrides {
        definition.validate()?;
    }
    Ok(overrides)
}

/// Built-ins with overrides applied: matching ids replaced in place, new
/// ids appended in file order.
#[must_use]
pub fn merge(
    builtins: Vec<ProviderDefinition>,
    overrides: Vec<ProviderDefinition>,
) -> Vec<ProviderDefinition> {
    let mut merged = builtins;
    for definition in overrides {
        match merged.iter_mut().find(|p| p.id == definition.id) {
            Some(slot) => *slot = definition,
            None => merged.push(definition),
        }
    }
    merged
}

/// The full provider set: built-ins plus local overrides.
///
/// # Errors
///
/// Returns a CONFIG error when the override file is invalid.
pub fn effective_providers(paths: &AppPaths) -> Result<Vec<ProviderDefinition>> {
    Ok(merge(catalog::builtin_providers(), load_overrides(paths)?))
}

/// Look up one provider by id in the effective set.
///
/// # Errors
///
/// Returns a CONFIG error when the id is unknown or the override file is
/// invalid.
pub fn find(paths: &AppPaths, id: &str) -> Result<ProviderDefinition> {
    effective_providers(paths)?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| ProbeError::UnknownProvider(id.to_string()))
}

//! Subcommand implementations.

pub mod factories;
pub mod reflect;
pub mod show;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use naked_core::StandardConfig;
use naked_metamodel::{DomainModel, Metamodel, ReflectorConfig};

/// Read a JSON domain model
pub fn load_model(path: &Path) -> anyhow::Result<DomainModel> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read model {}", path.display()))?;
    DomainModel::from_json(&json).with_context(|| format!("invalid model {}", path.display()))
}

/// Read the reflector configuration, or the default when no file is given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ReflectorConfig> {
    match path {
        Some(path) => Ok(ReflectorConfig::from_file(path)?),
        None => Ok(ReflectorConfig::default()),
    }
}

/// Load both inputs and reflect through the standard framework configuration
pub fn build_metamodel(
    model: &Path,
    config: Option<&Path>,
    parallel: bool,
) -> anyhow::Result<Arc<Metamodel>> {
    let domain = load_model(model)?;
    let mut config = load_config(config)?;
    config.parallel |= parallel;
    log::debug!(
        "reflecting {} assemblies (parallel: {})",
        domain.assemblies.len(),
        config.parallel
    );
    let framework = StandardConfig::builder(config)
        .build(&domain.assemblies)
        .context("reflection failed")?;
    Ok(framework.metamodel())
}

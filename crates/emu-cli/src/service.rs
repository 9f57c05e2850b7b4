use anyhow::{Context, Result};
use emu_core::config::{CliConfigOverrides, LayeredConfig};
use emu_core::ports::FeatureQueryProvider;
use emu_query::{OrchestratorSettings, QueryOrchestrator};
use emu_store::{ArcGisFeatureProvider, MemoryFeatureProvider};
use std::path::Path;
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Configuration and provider selected by the global flags
pub struct Service {
    pub orchestrator: Arc<QueryOrchestrator>,
}

impl Service {
    /// Build the service, applying `buffer_meters` as a CLI override
    pub fn new(global: &GlobalArgs, buffer_meters: Option<f64>) -> Result<Self> {
        let config = load_config(global, buffer_meters)?;
        let provider = provider(global.fixture.as_deref(), &config)?;
        let settings = OrchestratorSettings::from(&config);

        let orchestrator = Arc::new(QueryOrchestrator::with_settings(provider, settings));
        Ok(Self { orchestrator })
    }
}

/// Load layered configuration with CLI overrides
pub fn load_config(global: &GlobalArgs, buffer_meters: Option<f64>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = &global.config {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }
    let mut config = config.load_from_env();

    config.update_from_cli(CliConfigOverrides {
        service_url: global.service_url.clone(),
        geocode_url: global.geocode_url.clone(),
        buffer_meters,
    });
    Ok(config)
}

fn provider(
    fixture: Option<&Path>,
    config: &LayeredConfig,
) -> Result<Arc<dyn FeatureQueryProvider>> {
    match fixture {
        Some(path) => {
            let provider = MemoryFeatureProvider::from_fixture_file(path)
                .with_context(|| format!("Failed to load fixture {}", path.display()))?
                .with_fields(config.fields.value.clone());
            tracing::debug!(fixture = %path.display(), "Using in-memory provider");
            Ok(Arc::new(provider))
        }
        None => {
            config.require_endpoints()?;
            tracing::debug!(service_url = %config.service_url.value, "Using feature service");
            Ok(Arc::new(ArcGisFeatureProvider::new(
                config.service_url.value.clone(),
                config.geocode_url.value.clone(),
            )))
        }
    }
}

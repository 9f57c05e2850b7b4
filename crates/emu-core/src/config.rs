use crate::error::{EmuError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Default base URL of the EMU feature services
pub const DEFAULT_SERVICE_URL: &str =
    "https://services.arcgis.com/P3ePLMYs2RVChkJx/arcgis/rest/services/EMU_master_3d/FeatureServer";

/// Default ArcGIS World Geocoding endpoint
pub const DEFAULT_GEOCODE_URL: &str =
    "https://geocode.arcgis.com/arcgis/rest/services/World/GeocodeServer";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Attribute names the record parser reads from raw records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub cluster_id: String,
    pub cluster_name: String,
    pub geomorphology_base: String,
    pub geomorphology_features: String,
    pub top_depth: String,
    pub thickness: String,
    pub point_x: String,
    pub point_y: String,
    pub temperature: String,
    pub salinity: String,
    pub dissolved_oxygen: String,
    pub phosphate: String,
    pub silicate: String,
    pub nitrate: String,
    pub min_prefix: String,
    pub max_prefix: String,
    pub mean_prefix: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            cluster_id: "Cluster37".to_string(),
            cluster_name: "Name_2015".to_string(),
            geomorphology_base: "Geo_base".to_string(),
            geomorphology_features: "Geo_features".to_string(),
            top_depth: "UnitTop".to_string(),
            thickness: "ThickPt".to_string(),
            point_x: "Point_X".to_string(),
            point_y: "Point_Y".to_string(),
            temperature: "temp".to_string(),
            salinity: "salinity".to_string(),
            dissolved_oxygen: "dissO2".to_string(),
            phosphate: "phosphate".to_string(),
            silicate: "silicate".to_string(),
            nitrate: "nitrate".to_string(),
            min_prefix: "MIN_".to_string(),
            max_prefix: "MAX_".to_string(),
            mean_prefix: "MEAN_".to_string(),
        }
    }
}

impl FieldNames {
    /// Column holding the per-record value of a property
    pub fn property(&self, property: crate::models::Property) -> &str {
        use crate::models::Property;
        match property {
            Property::Temperature => &self.temperature,
            Property::Salinity => &self.salinity,
            Property::DissolvedOxygen => &self.dissolved_oxygen,
            Property::Phosphate => &self.phosphate,
            Property::Silicate => &self.silicate,
            Property::Nitrate => &self.nitrate,
        }
    }
}

/// Layered configuration for the EMU query core
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub service_url: ConfigValue<String>,
    pub geocode_url: ConfigValue<String>,
    pub buffer_meters: ConfigValue<f64>,
    pub geocode_max_results: ConfigValue<usize>,
    pub stats_where_clause: ConfigValue<String>,
    pub fields: ConfigValue<FieldNames>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            service_url: ConfigValue::new(DEFAULT_SERVICE_URL.to_string(), ConfigSource::Default),
            geocode_url: ConfigValue::new(DEFAULT_GEOCODE_URL.to_string(), ConfigSource::Default),
            buffer_meters: ConfigValue::new(32_000.0, ConfigSource::Default),
            geocode_max_results: ConfigValue::new(2, ConfigSource::Default),
            stats_where_clause: ConfigValue::new("1 = 1".to_string(), ConfigSource::Default),
            fields: ConfigValue::new(FieldNames::default(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| EmuError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| EmuError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(url) = file_config.service_url {
            self.service_url.update(url, ConfigSource::File);
        }

        if let Some(url) = file_config.geocode_url {
            self.geocode_url.update(url, ConfigSource::File);
        }

        if let Some(meters) = file_config.buffer_meters {
            self.buffer_meters.update(validate_buffer(meters)?, ConfigSource::File);
        }

        if let Some(max) = file_config.geocode_max_results {
            self.geocode_max_results.update(validate_max_results(max)?, ConfigSource::File);
        }

        if let Some(clause) = file_config.stats_where_clause {
            self.stats_where_clause.update(clause, ConfigSource::File);
        }

        if let Some(fields) = file_config.fields {
            self.fields.update(fields, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // EMU_SERVICE_URL
        if let Ok(url) = env::var("EMU_SERVICE_URL") {
            self.service_url.update(url, ConfigSource::Environment);
        }

        // EMU_GEOCODE_URL
        if let Ok(url) = env::var("EMU_GEOCODE_URL") {
            self.geocode_url.update(url, ConfigSource::Environment);
        }

        // EMU_BUFFER_METERS
        if let Ok(buffer_str) = env::var("EMU_BUFFER_METERS") {
            match parse_buffer_meters(&buffer_str) {
                Ok(meters) => self.buffer_meters.update(meters, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid EMU_BUFFER_METERS value '{}': expected a positive number of meters",
                    buffer_str
                ),
            }
        }

        // EMU_GEOCODE_MAX_RESULTS
        if let Ok(max_str) = env::var("EMU_GEOCODE_MAX_RESULTS") {
            match max_str.parse::<usize>().ok().map(validate_max_results) {
                Some(Ok(max)) => self.geocode_max_results.update(max, ConfigSource::Environment),
                _ => tracing::warn!(
                    "Invalid EMU_GEOCODE_MAX_RESULTS value '{}': expected a positive integer",
                    max_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(url) = overrides.service_url {
            self.service_url.update(url, ConfigSource::Cli);
        }

        if let Some(url) = overrides.geocode_url {
            self.geocode_url.update(url, ConfigSource::Cli);
        }

        if let Some(meters) = overrides.buffer_meters {
            self.buffer_meters.update(meters, ConfigSource::Cli);
        }
    }

    /// Check that the remote service endpoints are set
    pub fn require_endpoints(&self) -> Result<()> {
        let endpoints = [
            ("service_url", &self.service_url.value),
            ("geocode_url", &self.geocode_url.value),
        ];
        for (key, value) in endpoints {
            if value.trim().is_empty() {
                return Err(EmuError::ConfigMissing { key: key.to_string() });
            }
        }
        Ok(())
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "service_url".to_string(),
            (self.service_url.value.clone(), self.service_url.source),
        );
        map.insert(
            "geocode_url".to_string(),
            (self.geocode_url.value.clone(), self.geocode_url.source),
        );
        map.insert(
            "buffer_meters".to_string(),
            (format!("{}", self.buffer_meters.value), self.buffer_meters.source),
        );
        map.insert(
            "geocode_max_results".to_string(),
            (self.geocode_max_results.value.to_string(), self.geocode_max_results.source),
        );
        map.insert(
            "stats_where_clause".to_string(),
            (self.stats_where_clause.value.clone(), self.stats_where_clause.source),
        );
        map.insert(
            "fields.cluster_id".to_string(),
            (self.fields.value.cluster_id.clone(), self.fields.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    service_url: Option<String>,
    geocode_url: Option<String>,
    buffer_meters: Option<f64>,
    geocode_max_results: Option<usize>,
    stats_where_clause: Option<String>,
    fields: Option<FieldNames>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub service_url: Option<String>,
    pub geocode_url: Option<String>,
    pub buffer_meters: Option<f64>,
}

/// Parse a search buffer radius in meters
pub fn parse_buffer_meters(s: &str) -> Result<f64> {
    let meters = s.trim().parse::<f64>().map_err(|_| EmuError::ConfigInvalid {
        key: "buffer_meters".to_string(),
        reason: format!("Invalid buffer: {}. Use a number of meters", s),
    })?;
    validate_buffer(meters)
}

fn validate_buffer(meters: f64) -> Result<f64> {
    if meters.is_finite() && meters > 0.0 {
        Ok(meters)
    } else {
        Err(EmuError::ConfigInvalid {
            key: "buffer_meters".to_string(),
            reason: format!("Buffer must be a positive distance, got {}", meters),
        })
    }
}

fn validate_max_results(max: usize) -> Result<usize> {
    if max > 0 {
        Ok(max)
    } else {
        Err(EmuError::ConfigInvalid {
            key: "geocode_max_results".to_string(),
            reason: "Must ask the locator for at least one candidate".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_require_endpoints() {
        let mut config = LayeredConfig::with_defaults();
        assert!(config.require_endpoints().is_ok());

        config.update_from_cli(CliConfigOverrides {
            geocode_url: Some("  ".to_string()),
            ..Default::default()
        });
        assert_eq!(
            config.require_endpoints(),
            Err(EmuError::ConfigMissing { key: "geocode_url".to_string() })
        );
    }

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.buffer_meters.value, 32_000.0);
        assert_eq!(config.buffer_meters.source, ConfigSource::Default);
        assert_eq!(config.geocode_max_results.value, 2);
        assert_eq!(config.stats_where_clause.value, "1 = 1");
        assert_eq!(config.fields.value.cluster_id, "Cluster37");
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        // File should override default
        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        // Environment should override file
        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        // CLI should override environment
        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
service_url = "http://localhost:8080/FeatureServer"
buffer_meters = 5000.0
geocode_max_results = 5

[fields]
cluster_id = "Cluster40"
top_depth = "Top"
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.service_url.value, "http://localhost:8080/FeatureServer");
        assert_eq!(config.service_url.source, ConfigSource::File);
        assert_eq!(config.buffer_meters.value, 5000.0);
        assert_eq!(config.geocode_max_results.value, 5);
        assert_eq!(config.fields.value.cluster_id, "Cluster40");
        assert_eq!(config.fields.value.top_depth, "Top");
        // Fields left out of the table keep their defaults
        assert_eq!(config.fields.value.thickness, "ThickPt");
        assert_eq!(config.geocode_url.source, ConfigSource::Default);
    }

    #[test]
    fn test_file_rejects_negative_buffer() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "buffer_meters = -1.0").unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(EmuError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_file_rejects_zero_max_results() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "geocode_max_results = 0").unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(
            result,
            Err(EmuError::ConfigInvalid { ref key, .. }) if key == "geocode_max_results"
        ));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            service_url: None,
            geocode_url: Some("http://geocoder".to_string()),
            buffer_meters: Some(1000.0),
        });

        assert_eq!(config.buffer_meters.value, 1000.0);
        assert_eq!(config.buffer_meters.source, ConfigSource::Cli);
        assert_eq!(config.geocode_url.value, "http://geocoder");
        assert_eq!(config.service_url.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_buffer_meters() {
        assert_eq!(parse_buffer_meters("32000").unwrap(), 32000.0);
        assert_eq!(parse_buffer_meters(" 1.5 ").unwrap(), 1.5);
        assert!(parse_buffer_meters("0").is_err());
        assert!(parse_buffer_meters("far").is_err());
        assert!(parse_buffer_meters("NaN").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert!(map.contains_key("service_url"));
        assert!(map.contains_key("fields.cluster_id"));

        let (buffer, source) = &map["buffer_meters"];
        assert_eq!(buffer, "32000");
        assert_eq!(*source, ConfigSource::Default);
    }
}

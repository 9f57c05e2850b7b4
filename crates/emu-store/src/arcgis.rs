use async_trait::async_trait;
use emu_core::error::{EmuError, Result};
use emu_core::models::{
    DepthBucket, Envelope, GeocodeCandidate, LayerHandle, Location, RawRecord,
};
use emu_core::ports::FeatureQueryProvider;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;

/// Layer indices within the feature service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcGisLayers {
    pub mesh_cluster: u32,
    pub mesh_point: u32,
    pub summary: u32,
    pub by_depth: u32,
}

impl Default for ArcGisLayers {
    fn default() -> Self {
        Self { mesh_cluster: 0, mesh_point: 1, summary: 2, by_depth: 3 }
    }
}

/// Feature-query provider backed by an ArcGIS REST feature service and locator
pub struct ArcGisFeatureProvider {
    /// Base URL of the feature service (e.g. ".../FeatureServer")
    service_url: String,

    /// Base URL of the geocode service (e.g. ".../GeocodeServer")
    geocode_url: String,

    layers: ArcGisLayers,

    /// HTTP client
    client: reqwest::Client,
}

impl ArcGisFeatureProvider {
    /// Create a provider for a feature service and a locator
    pub fn new(service_url: impl Into<String>, geocode_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into().trim_end_matches('/').to_string(),
            geocode_url: geocode_url.into().trim_end_matches('/').to_string(),
            layers: ArcGisLayers::default(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_layers(mut self, layers: ArcGisLayers) -> Self {
        self.layers = layers;
        self
    }

    /// Query endpoint of one layer with the given parameters
    fn query_url(&self, layer: u32, params: &[(&str, String)]) -> Result<Url> {
        let base = format!("{}/{}/query", self.service_url, layer);
        Url::parse_with_params(&base, params).map_err(|e| EmuError::ConfigInvalid {
            key: "service_url".to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_text(&self, operation: &str, url: Url) -> Result<String> {
        tracing::debug!(operation, %url, "Sending feature service request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EmuError::provider(operation, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmuError::provider(
                operation,
                format!("service error ({}): {}", status, error_text),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| EmuError::provider(operation, format!("failed to read response: {}", e)))
    }

    async fn query_features(
        &self,
        operation: &str,
        layer: u32,
        mut params: Vec<(&str, String)>,
    ) -> Result<Vec<RawRecord>> {
        params.extend([
            ("outFields", "*".to_string()),
            ("outSR", "4326".to_string()),
            ("f", "json".to_string()),
        ]);
        let url = self.query_url(layer, &params)?;
        let body = self.get_text(operation, url).await?;
        let records = parse_feature_set(operation, &body)?;
        tracing::debug!(operation, records = records.len(), "Feature query returned");
        Ok(records)
    }
}

#[async_trait]
impl FeatureQueryProvider for ArcGisFeatureProvider {
    async fn query_by_envelope(&self, envelope: &Envelope) -> Result<Vec<RawRecord>> {
        let params = vec![
            ("geometry", envelope.to_bbox_string()),
            ("geometryType", "esriGeometryEnvelope".to_string()),
            ("inSR", "4326".to_string()),
            ("spatialRel", "esriSpatialRelIntersects".to_string()),
            ("returnGeometry", "true".to_string()),
        ];
        self.query_features("query_by_envelope", self.layers.mesh_cluster, params).await
    }

    async fn query_by_point(&self, point: &Location) -> Result<Vec<RawRecord>> {
        let params = vec![
            ("geometry", format!("{},{}", point.lon, point.lat)),
            ("geometryType", "esriGeometryPoint".to_string()),
            ("inSR", "4326".to_string()),
            ("spatialRel", "esriSpatialRelIntersects".to_string()),
            ("returnGeometry", "true".to_string()),
        ];
        self.query_features("query_by_point", self.layers.mesh_point, params).await
    }

    async fn query_bulk(&self, where_clause: &str) -> Result<Vec<RawRecord>> {
        let params = vec![
            ("where", where_clause.to_string()),
            ("returnGeometry", "false".to_string()),
        ];
        self.query_features("query_bulk", self.layers.summary, params).await
    }

    async fn query_by_depth_predicate(&self, bucket: DepthBucket) -> Result<LayerHandle> {
        let operation = "query_by_depth_predicate";
        let params = [
            ("where", bucket.definition_expression()),
            ("returnCountOnly", "true".to_string()),
            ("f", "json".to_string()),
        ];
        let url = self.query_url(self.layers.by_depth, &params)?;
        let body = self.get_text(operation, url).await?;
        let feature_count = parse_count(operation, &body)?;

        Ok(LayerHandle {
            layer_id: format!("{}/{}", self.service_url, self.layers.by_depth),
            bucket,
            feature_count,
        })
    }

    async fn geocode(&self, address: &str, max_results: usize) -> Result<Vec<GeocodeCandidate>> {
        let operation = "geocode";
        let base = format!("{}/findAddressCandidates", self.geocode_url);
        let params = [
            ("SingleLine", address.to_string()),
            ("maxLocations", max_results.to_string()),
            ("outSR", "4326".to_string()),
            ("f", "json".to_string()),
        ];
        let url = Url::parse_with_params(&base, &params).map_err(|e| EmuError::ConfigInvalid {
            key: "geocode_url".to_string(),
            reason: e.to_string(),
        })?;

        let body = self.get_text(operation, url).await?;
        let mut candidates = parse_candidates(operation, &body)?;
        candidates.truncate(max_results);
        Ok(candidates)
    }
}

/// Error payload the service returns with a 200 status
#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct FeatureSetResponse {
    #[serde(default)]
    error: Option<ServiceError>,
    #[serde(default)]
    features: Vec<FeatureResponse>,
}

#[derive(Debug, Deserialize)]
struct FeatureResponse {
    #[serde(default)]
    attributes: HashMap<String, serde_json::Value>,
    #[serde(default)]
    geometry: Option<PointGeometry>,
}

/// Point geometry; polygon geometries carry no `x`/`y` and are dropped
#[derive(Debug, Deserialize)]
struct PointGeometry {
    x: Option<f64>,
    y: Option<f64>,
}

impl PointGeometry {
    fn location(&self) -> Option<Location> {
        Some(Location::new(self.x?, self.y?))
    }
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    #[serde(default)]
    error: Option<ServiceError>,
    count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CandidatesResponse {
    #[serde(default)]
    error: Option<ServiceError>,
    #[serde(default)]
    candidates: Vec<CandidateResponse>,
}

#[derive(Debug, Deserialize)]
struct CandidateResponse {
    address: String,
    location: PointGeometry,
    #[serde(default)]
    score: f64,
}

fn service_error(operation: &str, error: ServiceError) -> EmuError {
    let reason = match error.code {
        Some(code) => format!("service error {}: {}", code, error.message),
        None => format!("service error: {}", error.message),
    };
    EmuError::provider(operation, reason)
}

fn decode<'a, T: Deserialize<'a>>(operation: &str, body: &'a str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| EmuError::provider(operation, format!("failed to parse response: {}", e)))
}

/// Convert a feature-set response body into raw records
pub fn parse_feature_set(operation: &str, body: &str) -> Result<Vec<RawRecord>> {
    let response: FeatureSetResponse = decode(operation, body)?;
    if let Some(error) = response.error {
        return Err(service_error(operation, error));
    }

    Ok(response
        .features
        .into_iter()
        .map(|feature| {
            let record = RawRecord::new(feature.attributes);
            match feature.geometry.as_ref().and_then(PointGeometry::location) {
                Some(location) => record.with_geometry(location),
                None => record,
            }
        })
        .collect())
}

/// Read the feature count of a `returnCountOnly` response
pub fn parse_count(operation: &str, body: &str) -> Result<usize> {
    let response: CountResponse = decode(operation, body)?;
    if let Some(error) = response.error {
        return Err(service_error(operation, error));
    }
    response.count.ok_or_else(|| EmuError::provider(operation, "response has no count"))
}

/// Convert a locator response into candidates, best score first
pub fn parse_candidates(operation: &str, body: &str) -> Result<Vec<GeocodeCandidate>> {
    let response: CandidatesResponse = decode(operation, body)?;
    if let Some(error) = response.error {
        return Err(service_error(operation, error));
    }

    let mut candidates: Vec<GeocodeCandidate> = response
        .candidates
        .into_iter()
        .filter_map(|c| {
            let location = c.location.location()?;
            Some(GeocodeCandidate { label: c.address, location, score: c.score })
        })
        .collect();
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider =
            ArcGisFeatureProvider::new("http://host/FeatureServer/", "http://host/GeocodeServer");
        assert_eq!(provider.service_url, "http://host/FeatureServer");
        assert_eq!(provider.layers, ArcGisLayers::default());
    }

    #[test]
    fn test_query_url_encodes_params() {
        let provider =
            ArcGisFeatureProvider::new("http://host/FeatureServer", "http://host/GeocodeServer")
                .with_layers(ArcGisLayers { summary: 7, ..ArcGisLayers::default() });

        let url = provider.query_url(7, &[("where", "1 = 1".to_string())]).unwrap();
        assert_eq!(url.path(), "/FeatureServer/7/query");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("where".to_string(), "1 = 1".to_string())]);
    }

    #[test]
    fn test_parse_feature_set() {
        let body = r#"{
            "features": [
                {"attributes": {"Cluster37": 13, "UnitTop": 0}, "geometry": {"x": -40.5, "y": 10.25}},
                {"attributes": {"Cluster37": 8}, "geometry": {"rings": [[[0, 0], [1, 1]]]}},
                {"attributes": {"Cluster37": 2}}
            ]
        }"#;

        let records = parse_feature_set("query_by_envelope", body).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].geometry, Some(Location::new(-40.5, 10.25)));
        assert_eq!(records[0].text("Cluster37").as_deref(), Some("13"));
        assert_eq!(records[1].geometry, None);
        assert_eq!(records[2].geometry, None);
    }

    #[test]
    fn test_service_error_in_body() {
        let body = r#"{"error": {"code": 400, "message": "Invalid query parameters"}}"#;
        let err = parse_feature_set("query_bulk", body).unwrap_err();
        match err {
            EmuError::Provider { operation, reason } => {
                assert_eq!(operation, "query_bulk");
                assert!(reason.contains("400"));
                assert!(reason.contains("Invalid query parameters"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_body() {
        assert!(parse_feature_set("query_bulk", "<html>").is_err());
        assert!(parse_count("query_by_depth_predicate", "{}").is_err());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("query_by_depth_predicate", r#"{"count": 42}"#).unwrap(), 42);
    }

    #[test]
    fn test_parse_candidates_sorted_by_score() {
        let body = r#"{
            "candidates": [
                {"address": "Valparaiso, Chile", "location": {"x": -71.6, "y": -33.0}, "score": 88.5},
                {"address": "Valparaiso, Indiana", "location": {"x": -87.0, "y": 41.5}, "score": 97.0},
                {"address": "Nowhere", "location": {}, "score": 99.0}
            ]
        }"#;

        let candidates = parse_candidates("geocode", body).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].label, "Valparaiso, Indiana");
        assert_eq!(candidates[1].location, Location::new(-71.6, -33.0));
    }
}

//! STRING protein-protein interaction client.
//!
//! GET /api/json/network?identifiers=TP53&species=9606&required_score=400
//!
//! Each row carries `preferredName_A`, `preferredName_B` and a combined
//! `score` in [0, 1], rescaled here to the 0-1000 integer range.
//!
//! API docs: https://string-db.org/help/api/

use async_trait::async_trait;
use std::sync::Arc;
use targetscope_common::sandbox::SandboxClient as Client;
use targetscope_common::{EngineError, InteractionEdge, ProteinId, Result, MAX_INTERACTION_SCORE};
use tracing::{debug, instrument};

use super::InteractionProvider;
use crate::rate_limit::RateLimiter;

const PROVIDER: &str = "string";
const STRING_API_URL: &str = "https://string-db.org";
const CALLER_IDENTITY: &str = "targetscope";

pub struct StringClient {
    client: Client,
    base_url: String,
    species: u32,
    limiter: Arc<RateLimiter>,
}

impl StringClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, STRING_API_URL, 9606)
    }

    pub fn with_base_url(client: Client, base_url: &str, species: u32) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            species,
            limiter: RateLimiter::shared_default(),
        }
    }

    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }
}

#[async_trait]
impl InteractionProvider for StringClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[instrument(skip(self), fields(protein_id = %protein_id))]
    async fn interactions(&self, protein_id: &ProteinId, threshold: u16) -> Result<Vec<InteractionEdge>> {
        let url = format!("{}/api/json/network", self.base_url);
        let species = self.species.to_string();
        let required = threshold.to_string();

        self.limiter.acquire().await;
        let resp = self
            .client
            .get(&url)?
            .query(&[
                ("identifiers", protein_id.as_str()),
                ("species", species.as_str()),
                ("required_score", required.as_str()),
                ("caller_identity", CALLER_IDENTITY),
            ])
            .send()
            .await
            .map_err(|e| EngineError::from_http(PROVIDER, e))?;

        if !resp.status().is_success() {
            return Err(EngineError::from_status(PROVIDER, resp.status()));
        }
        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| EngineError::from_http(PROVIDER, e))?;

        let rows = json
            .as_array()
            .ok_or_else(|| EngineError::malformed(PROVIDER, "network response is not an array"))?;

        let mut edges = Vec::with_capacity(rows.len());
        for row in rows {
            let (Some(a), Some(b), Some(score)) = (
                row["preferredName_A"].as_str().and_then(ProteinId::parse),
                row["preferredName_B"].as_str().and_then(ProteinId::parse),
                row["score"].as_f64(),
            ) else {
                return Err(EngineError::malformed(PROVIDER, "interaction row missing names or score"));
            };
            let scaled = (score.clamp(0.0, 1.0) * f64::from(MAX_INTERACTION_SCORE)).round() as u16;
            if scaled < threshold {
                continue;
            }
            if let Some(edge) = InteractionEdge::new(a, b, scaled) {
                edges.push(edge);
            }
        }

        debug!(n_edges = edges.len(), threshold, "STRING interactions");
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> StringClient {
        StringClient::with_base_url(Client::new().unwrap(), &server.base_url(), 9606)
    }

    #[tokio::test]
    async fn test_network_rows_become_edges() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/api/json/network")
                .query_param("identifiers", "TP53")
                .query_param("species", "9606")
                .query_param("required_score", "400");
            then.status(200).json_body(json!([
                {"stringId_A": "9606.ENSP00000269305", "stringId_B": "9606.ENSP00000258149",
                 "preferredName_A": "TP53", "preferredName_B": "MDM2", "score": 0.999},
                {"preferredName_A": "MDM2", "preferredName_B": "TP53", "score": 0.95},
                {"preferredName_A": "TP53", "preferredName_B": "ATM", "score": 0.35}
            ]));
        });

        let edges = client(&server).interactions(&"TP53".into(), 400).await.unwrap();
        m.assert();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].protein_a.as_str(), "MDM2");
        assert_eq!(edges[0].confidence_score, 999);
    }

    #[tokio::test]
    async fn test_consecutive_lookups_are_paced() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/api/json/network");
            then.status(200).json_body(json!([]));
        });

        let interval = std::time::Duration::from_millis(60);
        let string = client(&server).with_limiter(Arc::new(RateLimiter::new(interval)));
        let start = std::time::Instant::now();
        for id in ["TP53", "MDM2", "ATM"] {
            string.interactions(&id.into(), 400).await.unwrap();
        }
        m.assert_hits(3);
        assert!(start.elapsed() >= interval * 2, "{:?}", start.elapsed());
    }

    #[tokio::test]
    async fn test_empty_network_is_ok() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/json/network");
            then.status(200).json_body(json!([]));
        });
        let edges = client(&server).interactions(&"ORPHAN1".into(), 400).await.unwrap();
        assert!(edges.is_empty());
    }

    #[tokio::test]
    async fn test_row_without_score_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/json/network");
            then.status(200).json_body(json!([{"preferredName_A": "TP53", "preferredName_B": "MDM2"}]));
        });
        let err = client(&server).interactions(&"TP53".into(), 400).await.unwrap_err();
        assert!(matches!(err, EngineError::ProviderDataMalformed { .. }));
    }
}

//! Reactome ContentService client.
//!
//! Search: GET /search/query?query=<disease>&species=Homo sapiens&types=Pathway
//! Participants: GET /data/participants/{stId}
//!
//! API docs: https://reactome.org/ContentService/

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::BTreeSet;
use std::sync::Arc;
use targetscope_common::sandbox::SandboxClient as Client;
use targetscope_common::{DataQuality, EngineError, ProteinId, Result};
use tracing::{debug, instrument};

use super::{strip_tags, PathwayProvider, PathwaySummary};
use crate::rate_limit::RateLimiter;

const PROVIDER: &str = "reactome";
const REACTOME_API_URL: &str = "https://reactome.org/ContentService";

pub struct ReactomeClient {
    client: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl ReactomeClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, REACTOME_API_URL)
    }

    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::shared_default(),
        }
    }

    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// GET returning parsed JSON, or `None` on 404.
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Option<serde_json::Value>> {
        self.limiter.acquire().await;
        let resp = self
            .client
            .get(url)?
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| EngineError::from_http(PROVIDER, e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(EngineError::from_status(PROVIDER, resp.status()));
        }
        let json = resp
            .json()
            .await
            .map_err(|e| EngineError::from_http(PROVIDER, e))?;
        Ok(Some(json))
    }
}

#[async_trait]
impl PathwayProvider for ReactomeClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[instrument(skip(self))]
    async fn pathways_for_disease(&self, disease: &str) -> Result<Vec<PathwaySummary>> {
        let url = format!("{}/search/query", self.base_url);
        let query = [
            ("query", disease),
            ("species", "Homo sapiens"),
            ("types", "Pathway"),
            ("cluster", "true"),
        ];
        // Reactome answers 404 when the search has no hits
        let Some(json) = self.get_json(&url, &query).await? else {
            debug!("Reactome search returned no hits");
            return Ok(vec![]);
        };

        let groups = json["results"]
            .as_array()
            .ok_or_else(|| EngineError::malformed(PROVIDER, "search response has no results array"))?;

        let mut seen = BTreeSet::new();
        let mut pathways = Vec::new();
        for entry in groups.iter().filter_map(|g| g["entries"].as_array()).flatten() {
            let is_pathway = entry["exactType"].as_str().map_or(true, |t| t.contains("Pathway"));
            let Some(st_id) = entry["stId"].as_str() else {
                continue;
            };
            if !is_pathway || !seen.insert(st_id.to_string()) {
                continue;
            }
            pathways.push(PathwaySummary {
                pathway_id: format!("reactome:{st_id}"),
                name: strip_tags(entry["name"].as_str().unwrap_or(st_id)),
                data_quality: DataQuality::Live,
            });
        }

        debug!(n_pathways = pathways.len(), "Reactome pathways for disease");
        Ok(pathways)
    }

    #[instrument(skip(self))]
    async fn pathway_participants(&self, pathway_id: &str) -> Result<BTreeSet<ProteinId>> {
        let st_id = pathway_id.strip_prefix("reactome:").unwrap_or(pathway_id);
        let url = format!("{}/data/participants/{}", self.base_url, st_id);
        let json = self
            .get_json(&url, &[])
            .await?
            .ok_or_else(|| EngineError::malformed(PROVIDER, format!("unknown pathway {st_id}")))?;

        let participants = json
            .as_array()
            .ok_or_else(|| EngineError::malformed(PROVIDER, "participants response is not an array"))?;

        let proteins: BTreeSet<ProteinId> = participants
            .iter()
            .filter_map(|p| p["refEntities"].as_array())
            .flatten()
            .filter_map(reference_gene_symbol)
            .collect();

        debug!(pathway_id, n_proteins = proteins.len(), "Parsed Reactome participants");
        Ok(proteins)
    }
}

/// Gene symbol of a UniProt reference entity.
///
/// `displayName` looks like `UniProt:P04637 TP53`; when the symbol is
/// missing the accession is used.
fn reference_gene_symbol(entity: &serde_json::Value) -> Option<ProteinId> {
    let display = entity["displayName"].as_str().unwrap_or("");
    let is_protein = display.starts_with("UniProt:")
        || entity["schemaClass"]
            .as_str()
            .is_some_and(|c| c == "ReferenceGeneProduct" || c == "ReferenceIsoform");
    if !is_protein {
        return None;
    }
    if let Some(genes) = entity["geneName"].as_array() {
        if let Some(id) = genes.first().and_then(|g| g.as_str()).and_then(ProteinId::parse) {
            return Some(id);
        }
    }
    display
        .split_whitespace()
        .nth(1)
        .and_then(ProteinId::parse)
        .or_else(|| entity["identifier"].as_str().and_then(ProteinId::parse))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> ReactomeClient {
        ReactomeClient::with_base_url(Client::new().unwrap(), &server.base_url())
    }

    #[tokio::test]
    async fn test_search_parses_pathway_entries() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/search/query")
                .query_param("query", "alzheimer")
                .query_param("types", "Pathway");
            then.status(200).json_body(json!({
                "results": [{
                    "typeName": "Pathway",
                    "entries": [
                        {"stId": "R-HSA-977225", "name": "<span class=\"highlighting\" >Amyloid</span> fiber formation", "exactType": "Pathway"},
                        {"stId": "R-HSA-977225", "name": "duplicate", "exactType": "Pathway"},
                        {"stId": "R-HSA-264870", "name": "Caspase-mediated cleavage", "exactType": "Reaction"}
                    ]
                }]
            }));
        });

        let pathways = client(&server).pathways_for_disease("alzheimer").await.unwrap();
        assert_eq!(pathways.len(), 1);
        assert_eq!(pathways[0].pathway_id, "reactome:R-HSA-977225");
        assert_eq!(pathways[0].name, "Amyloid fiber formation");
    }

    #[tokio::test]
    async fn test_search_and_participants_are_paced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search/query");
            then.status(200).json_body(json!({
                "results": [{"entries": [{"stId": "R-HSA-1", "name": "Apoptosis", "exactType": "Pathway"}]}]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/data/participants/R-HSA-1");
            then.status(200).json_body(json!([
                {"refEntities": [{"displayName": "UniProt:P04637 TP53", "schemaClass": "ReferenceGeneProduct"}]}
            ]));
        });

        let interval = std::time::Duration::from_millis(60);
        let reactome = client(&server).with_limiter(Arc::new(RateLimiter::new(interval)));
        let start = std::time::Instant::now();
        let pathways = reactome.pathways_for_disease("apoptosis").await.unwrap();
        let proteins = reactome.pathway_participants(&pathways[0].pathway_id).await.unwrap();

        assert!(proteins.contains(&ProteinId::from("TP53")));
        assert!(start.elapsed() >= interval, "{:?}", start.elapsed());
    }

    #[tokio::test]
    async fn test_search_404_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search/query");
            then.status(404).json_body(json!({"code": 404, "reason": "Not Found"}));
        });
        let pathways = client(&server).pathways_for_disease("zzz").await.unwrap();
        assert!(pathways.is_empty());
    }

    #[tokio::test]
    async fn test_participants_extract_gene_symbols() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/data/participants/R-HSA-977225");
            then.status(200).json_body(json!([
                {
                    "displayName": "APP(672-713) [extracellular region]",
                    "schemaClass": "EntityWithAccessionedSequence",
                    "refEntities": [
                        {"identifier": "P05067", "schemaClass": "ReferenceGeneProduct", "displayName": "UniProt:P05067 APP"}
                    ]
                },
                {
                    "displayName": "Zn2+",
                    "schemaClass": "SimpleEntity",
                    "refEntities": [
                        {"identifier": "29105", "schemaClass": "ReferenceMolecule", "displayName": "zinc(2+) [ChEBI:29105]"}
                    ]
                },
                {
                    "displayName": "PSEN1",
                    "schemaClass": "EntityWithAccessionedSequence",
                    "refEntities": [
                        {"identifier": "P49768", "schemaClass": "ReferenceGeneProduct", "displayName": "UniProt:P49768"}
                    ]
                }
            ]));
        });

        let proteins = client(&server)
            .pathway_participants("reactome:R-HSA-977225")
            .await
            .unwrap();
        let ids: Vec<&str> = proteins.iter().map(|p| p.as_str()).collect();
        assert_eq!(ids, vec!["APP", "P49768"]);
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/data/participants/R-HSA-1");
            then.status(200).body("not json");
        });
        let err = client(&server).pathway_participants("reactome:R-HSA-1").await.unwrap_err();
        assert!(matches!(err, EngineError::ProviderDataMalformed { .. }));
    }
}

//! UniProt REST client.
//!
//! GET /uniprotkb/search?query=(gene_exact:TP53 OR accession:TP53) AND organism_id:9606 AND reviewed:true&size=1
//!
//! Reviewed (Swiss-Prot) entries are tried first; unreviewed TrEMBL entries
//! are used when no reviewed entry exists.
//!
//! Druggability evidence comes from:
//!   - features: Binding site / Active site / Site
//!   - cross-references: ChEMBL, DrugBank, BindingDB
//!   - keywords: first keyword naming a structural class
//!
//! API docs: https://www.uniprot.org/help/api

use async_trait::async_trait;
use std::sync::Arc;
use targetscope_common::sandbox::SandboxClient as Client;
use targetscope_common::{DruggabilityEvidence, EngineError, ProteinId, Result};
use tracing::{debug, instrument};

use super::{AnnotationProvider, ProteinAnnotation};
use crate::druggability::StructuralClass;
use crate::rate_limit::RateLimiter;

const PROVIDER: &str = "uniprot";
const UNIPROT_API_URL: &str = "https://rest.uniprot.org";

const BINDING_FEATURES: &[&str] = &["Binding site", "Active site", "Site", "BINDING", "ACT_SITE", "SITE"];
const LIGAND_DATABASES: &[&str] = &["ChEMBL", "DrugBank", "BindingDB"];

/// A lookup may issue two searches (reviewed, then unreviewed); both are
/// paced by `limiter`.
pub struct UniProtClient {
    client: Client,
    base_url: String,
    species: u32,
    limiter: Arc<RateLimiter>,
}

impl UniProtClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, UNIPROT_API_URL, 9606)
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

    /// First search hit, if any.
    async fn search(&self, protein_id: &ProteinId, reviewed: bool) -> Result<Option<serde_json::Value>> {
        let mut query = format!(
            "(gene_exact:{id} OR accession:{id}) AND organism_id:{}",
            self.species,
            id = protein_id
        );
        if reviewed {
            query.push_str(" AND reviewed:true");
        }
        let url = format!("{}/uniprotkb/search", self.base_url);

        debug!(protein_id = %protein_id, reviewed, "Querying UniProt");

        self.limiter.acquire().await;
        let resp = self
            .client
            .get(&url)?
            .query(&[("query", query.as_str()), ("format", "json"), ("size", "1")])
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

        let results = json["results"]
            .as_array()
            .ok_or_else(|| EngineError::malformed(PROVIDER, "response has no results array"))?;
        Ok(results.first().cloned())
    }
}

#[async_trait]
impl AnnotationProvider for UniProtClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[instrument(skip(self), fields(protein_id = %protein_id))]
    async fn annotate(&self, protein_id: &ProteinId) -> Result<Option<ProteinAnnotation>> {
        let (entry, reviewed) = match self.search(protein_id, true).await? {
            Some(entry) => (entry, true),
            None => match self.search(protein_id, false).await? {
                Some(entry) => (entry, false),
                None => return Ok(None),
            },
        };
        if entry["primaryAccession"].as_str().is_none() {
            return Err(EngineError::malformed(PROVIDER, "entry has no primaryAccession"));
        }
        Ok(Some(parse_entry(protein_id, &entry, reviewed)))
    }
}

fn parse_entry(protein_id: &ProteinId, entry: &serde_json::Value, reviewed: bool) -> ProteinAnnotation {
    let comments = entry["comments"].as_array().cloned().unwrap_or_default();

    let function_text = comments
        .iter()
        .filter(|c| c["commentType"] == "FUNCTION")
        .filter_map(|c| c["texts"].as_array())
        .flatten()
        .filter_map(|t| t["value"].as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let associated_diseases: Vec<String> = comments
        .iter()
        .filter(|c| c["commentType"] == "DISEASE")
        .filter_map(|c| c["disease"]["diseaseId"].as_str())
        .map(String::from)
        .collect();

    let subcellular_locations: Vec<String> = comments
        .iter()
        .filter(|c| c["commentType"] == "SUBCELLULAR LOCATION")
        .filter_map(|c| c["subcellularLocations"].as_array())
        .flatten()
        .filter_map(|l| l["location"]["value"].as_str())
        .map(String::from)
        .collect();

    let keywords: Vec<String> = entry["keywords"]
        .as_array()
        .map(|kws| {
            kws.iter()
                .filter_map(|k| k["name"].as_str().or_else(|| k["value"].as_str()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let binding_sites = entry["features"]
        .as_array()
        .map(|fs| {
            fs.iter()
                .filter(|f| f["type"].as_str().is_some_and(|t| BINDING_FEATURES.contains(&t)))
                .count()
        })
        .unwrap_or(0);

    let ligand_count = entry["uniProtKBCrossReferences"]
        .as_array()
        .map(|xs| {
            xs.iter()
                .filter(|x| x["database"].as_str().is_some_and(|d| LIGAND_DATABASES.contains(&d)))
                .count()
        })
        .unwrap_or(0);

    let structural_class = keywords
        .iter()
        .find_map(|k| StructuralClass::from_keyword(k))
        .map(|c| c.as_str().to_string());

    let display_name = entry["proteinDescription"]["recommendedName"]["fullName"]["value"]
        .as_str()
        .or_else(|| entry["proteinDescription"]["submissionNames"][0]["fullName"]["value"].as_str())
        .or_else(|| entry["genes"][0]["geneName"]["value"].as_str())
        .unwrap_or(protein_id.as_str())
        .to_string();

    ProteinAnnotation {
        protein_id: protein_id.clone(),
        display_name,
        function_text,
        evidence: DruggabilityEvidence {
            binding_sites: u32::try_from(binding_sites).unwrap_or(u32::MAX),
            ligand_count: u32::try_from(ligand_count).unwrap_or(u32::MAX),
            structural_class,
        },
        reviewed,
        associated_diseases,
        druggability_override: None,
        subcellular_locations,
        keywords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn egfr_entry() -> serde_json::Value {
        json!({
            "primaryAccession": "P00533",
            "entryType": "UniProtKB reviewed (Swiss-Prot)",
            "proteinDescription": {"recommendedName": {"fullName": {"value": "Epidermal growth factor receptor"}}},
            "genes": [{"geneName": {"value": "EGFR"}}],
            "comments": [
                {"commentType": "FUNCTION", "texts": [{"value": "Receptor tyrosine kinase binding ligands of the EGF family."}]},
                {"commentType": "DISEASE", "disease": {"diseaseId": "Lung cancer"}},
                {"commentType": "SUBCELLULAR LOCATION", "subcellularLocations": [
                    {"location": {"value": "Cell membrane"}, "topology": {"value": "Single-pass type I membrane protein"}},
                    {"location": {"value": "Endosome"}}
                ]}
            ],
            "features": [
                {"type": "Binding site"}, {"type": "Binding site"}, {"type": "Active site"},
                {"type": "Transmembrane"}
            ],
            "uniProtKBCrossReferences": [
                {"database": "ChEMBL", "id": "CHEMBL203"},
                {"database": "DrugBank", "id": "DB00530"},
                {"database": "PDB", "id": "1IVO"}
            ],
            "keywords": [
                {"id": "KW-0067", "name": "ATP-binding"},
                {"id": "KW-0829", "name": "Tyrosine-protein kinase"},
                {"id": "KW-0675", "name": "Receptor"}
            ]
        })
    }

    fn client(server: &MockServer) -> UniProtClient {
        UniProtClient::with_base_url(Client::new().unwrap(), &server.base_url(), 9606)
    }

    #[tokio::test]
    async fn test_reviewed_entry_parsed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/uniprotkb/search")
                .query_param("format", "json")
                .query_param("size", "1");
            then.status(200).json_body(json!({"results": [egfr_entry()]}));
        });

        let a = client(&server).annotate(&"EGFR".into()).await.unwrap().unwrap();
        assert!(a.reviewed);
        assert_eq!(a.display_name, "Epidermal growth factor receptor");
        assert_eq!(a.evidence.binding_sites, 3);
        assert_eq!(a.evidence.ligand_count, 2);
        assert_eq!(a.evidence.structural_class.as_deref(), Some("kinase"));
        assert_eq!(a.associated_diseases, vec!["Lung cancer".to_string()]);
        assert_eq!(a.subcellular_locations, vec!["Cell membrane".to_string(), "Endosome".to_string()]);
        assert_eq!(a.keywords, vec!["ATP-binding", "Tyrosine-protein kinase", "Receptor"]);
    }

    #[test]
    fn test_entry_without_locations_or_keywords() {
        let entry = json!({
            "primaryAccession": "Q9XXX1",
            "genes": [{"geneName": {"value": "ORF1"}}]
        });
        let a = parse_entry(&"ORF1".into(), &entry, false);
        assert!(a.subcellular_locations.is_empty());
        assert!(a.keywords.is_empty());
        assert_eq!(a.evidence.structural_class, None);
        assert_eq!(a.display_name, "ORF1");
    }

    #[tokio::test]
    async fn test_unknown_protein_is_none() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/uniprotkb/search");
            then.status(200).json_body(json!({"results": []}));
        });
        let a = client(&server).annotate(&"NOTAGENE1".into()).await.unwrap();
        assert!(a.is_none());
        // reviewed, then unreviewed
        m.assert_hits(2);
    }

    #[tokio::test]
    async fn test_unreviewed_retry_waits_for_the_limiter() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/uniprotkb/search");
            then.status(200).json_body(json!({"results": []}));
        });

        let interval = std::time::Duration::from_millis(60);
        let uniprot = client(&server).with_limiter(Arc::new(RateLimiter::new(interval)));
        let start = std::time::Instant::now();
        assert!(uniprot.annotate(&"NOTAGENE1".into()).await.unwrap().is_none());
        m.assert_hits(2);
        assert!(start.elapsed() >= interval, "{:?}", start.elapsed());
    }

    #[tokio::test]
    async fn test_missing_results_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/uniprotkb/search");
            then.status(200).json_body(json!({"unexpected": true}));
        });
        let err = client(&server).annotate(&"TP53".into()).await.unwrap_err();
        assert!(matches!(err, EngineError::ProviderDataMalformed { .. }));
    }

    #[tokio::test]
    async fn test_rate_limited_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/uniprotkb/search");
            then.status(429);
        });
        let err = client(&server).annotate(&"TP53".into()).await.unwrap_err();
        assert!(matches!(err, EngineError::ProviderUnavailable { .. }));
    }
}

//! KEGG REST client.
//!
//! KEGG answers in tab-separated plain text:
//!   /list/disease        H00004\tChronic myeloid leukemia
//!   /link/pathway/H00004 ds:H00004\tpath:hsa05220
//!   /list/pathway/hsa    hsa05200\tPathways in cancer - Homo sapiens (human)
//!   /get/hsa05200        flat file; genes in the GENE section
//!
//! API docs: https://www.kegg.jp/kegg/rest/keggapi.html

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use targetscope_common::sandbox::SandboxClient as Client;
use targetscope_common::{DataQuality, EngineError, ProteinId, Result};
use tracing::{debug, instrument};

use super::{PathwayProvider, PathwaySummary};
use crate::rate_limit::RateLimiter;

const PROVIDER: &str = "kegg";
const KEGG_API_URL: &str = "https://rest.kegg.jp";

/// One disease lookup issues up to three requests, each paced by `limiter`.
pub struct KeggClient {
    client: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl KeggClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, KEGG_API_URL)
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

    async fn get_text(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        self.limiter.acquire().await;
        let resp = self
            .client
            .get(&url)?
            .send()
            .await
            .map_err(|e| EngineError::from_http(PROVIDER, e))?;

        if !resp.status().is_success() {
            return Err(EngineError::from_status(PROVIDER, resp.status()));
        }
        resp.text().await.map_err(|e| EngineError::from_http(PROVIDER, e))
    }

    /// First KEGG disease entry whose name contains `disease`.
    #[instrument(skip(self))]
    async fn find_disease_id(&self, disease: &str) -> Result<Option<String>> {
        let body = self.get_text("/list/disease").await?;
        let needle = disease.to_lowercase();
        let found = parse_tsv(&body)
            .find(|(_, name)| name.to_lowercase().contains(&needle))
            .map(|(id, _)| id.trim_start_matches("ds:").to_string());
        Ok(found)
    }

    /// Human pathway id → name.
    async fn human_pathways(&self) -> Result<HashMap<String, String>> {
        let body = self.get_text("/list/pathway/hsa").await?;
        let names = parse_tsv(&body)
            .map(|(id, name)| {
                let id = id.trim_start_matches("path:").to_string();
                let name = name
                    .trim_end_matches(" - Homo sapiens (human)")
                    .to_string();
                (id, name)
            })
            .collect();
        Ok(names)
    }
}

#[async_trait]
impl PathwayProvider for KeggClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[instrument(skip(self))]
    async fn pathways_for_disease(&self, disease: &str) -> Result<Vec<PathwaySummary>> {
        let names = self.human_pathways().await?;
        let mut ids: Vec<String> = Vec::new();

        if let Some(disease_id) = self.find_disease_id(disease).await? {
            debug!(disease_id = %disease_id, "Resolved KEGG disease entry");
            let body = self.get_text(&format!("/link/pathway/{}", disease_id)).await?;
            for (_, target) in parse_tsv(&body) {
                if let Some(id) = target.strip_prefix("path:") {
                    let id = match id.strip_prefix("map") {
                        Some(num) => format!("hsa{num}"),
                        None => id.to_string(),
                    };
                    if id.starts_with("hsa") && !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }

        // Keyword match on pathway names
        let needle = disease.to_lowercase();
        let mut by_name: Vec<&String> = names
            .iter()
            .filter(|(_, name)| name.to_lowercase().contains(&needle))
            .map(|(id, _)| id)
            .collect();
        by_name.sort();
        for id in by_name {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }

        debug!(n_pathways = ids.len(), "KEGG pathways for disease");
        Ok(ids
            .into_iter()
            .map(|id| PathwaySummary {
                name: names.get(&id).cloned().unwrap_or_else(|| id.clone()),
                pathway_id: format!("kegg:{id}"),
                data_quality: DataQuality::Live,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn pathway_participants(&self, pathway_id: &str) -> Result<BTreeSet<ProteinId>> {
        let id = pathway_id.strip_prefix("kegg:").unwrap_or(pathway_id);
        let body = self.get_text(&format!("/get/{}", id)).await?;
        if !body.starts_with("ENTRY") {
            return Err(EngineError::malformed(PROVIDER, format!("no ENTRY record for {id}")));
        }
        let genes = parse_gene_section(&body);
        debug!(pathway_id, n_genes = genes.len(), "Parsed KEGG GENE section");
        Ok(genes)
    }
}

/// Two-column TSV rows; rows without a tab are skipped.
fn parse_tsv(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.lines().filter_map(|line| {
        let (a, b) = line.split_once('\t')?;
        Some((a.trim(), b.trim()))
    })
}

/// Gene symbols from the GENE section of a KEGG flat file.
///
/// ```text
/// GENE        7157  TP53; tumor protein p53 [KO:K04451]
///             4193  MDM2; MDM2 proto-oncogene [KO:K06643]
/// COMPOUND    C00076  Calcium cation
/// ```
fn parse_gene_section(body: &str) -> BTreeSet<ProteinId> {
    let mut genes = BTreeSet::new();
    let mut in_gene = false;

    for line in body.lines() {
        let content = if let Some(rest) = line.strip_prefix("GENE") {
            in_gene = true;
            rest
        } else if line.starts_with(char::is_whitespace) {
            if !in_gene {
                continue;
            }
            line
        } else {
            in_gene = false;
            continue;
        };

        let mut tokens = content.split_whitespace();
        let (Some(_entrez), Some(symbol)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let Some(symbol) = symbol.strip_suffix(';') else {
            continue;
        };
        if let Some(id) = ProteinId::parse(symbol) {
            genes.insert(id);
        }
    }
    genes
}

use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::error::EngineError;

/// Default request timeout for provider calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client that only issues requests to allowlisted provider hosts.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Client with the default provider allowlist and a 30 s timeout.
    pub fn new() -> Result<Self, EngineError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, EngineError> {
        let domains = [
            "rest.kegg.jp",               // KEGG
            "reactome.org",               // Reactome ContentService
            "rest.uniprot.org",           // UniProt
            "string-db.org",              // STRING
            "version-12-0.string-db.org", // STRING pinned release
            "localhost",
            "127.0.0.1",
        ];
        let allowlist = domains.iter().map(|d| d.to_string()).collect();

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("targetscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EngineError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// True if the URL's host is allowlisted or a subdomain of an allowlisted host.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, EngineError> {
        self.check(url)?;
        Ok(self.client.get(url))
    }

    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, EngineError> {
        self.check(url)?;
        Ok(self.client.post(url))
    }

    fn check(&self, url: &str) -> Result<(), EngineError> {
        if self.is_allowed(url) {
            Ok(())
        } else {
            tracing::warn!(url, "Blocked request outside sandbox allowlist");
            Err(EngineError::Security(format!(
                "domain not in allowlist for URL {}",
                url
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowlist_accepts_provider_hosts() {
        let c = SandboxClient::new().unwrap();
        assert!(c.is_allowed("https://rest.kegg.jp/list/disease"));
        assert!(c.is_allowed("https://version-12-0.string-db.org/api/json/network"));
        assert!(c.is_allowed("https://www.reactome.org/ContentService/search/query"));
        assert!(c.is_allowed("http://127.0.0.1:8080/x"));
    }

    #[test]
    fn test_allowlist_rejects_other_hosts() {
        let c = SandboxClient::new().unwrap();
        assert!(!c.is_allowed("https://example.com/"));
        assert!(!c.is_allowed("https://evilreactome.org/"));
        assert!(!c.is_allowed("not a url"));
        assert!(matches!(c.get("https://example.com/"), Err(EngineError::Security(_))));
    }

    #[test]
    fn test_allow_domain() {
        let mut c = SandboxClient::new().unwrap();
        c.allow_domain("mirror.internal");
        assert!(c.is_allowed("https://mirror.internal/api"));
    }
}

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::config::ResolvedConfig;
use crate::domain::{GeneRecord, TaxonomyId};
use crate::error::HarvestError;

/// Read-only view of the E-utilities endpoints the harvester needs.
pub trait EutilsClient: Send + Sync {
    /// `None` when the taxonomy search has no usable id.
    fn search_taxonomy(&self, organism: &str) -> Result<Option<TaxonomyId>, HarvestError>;
    /// `None` when the response carries no count.
    fn count_genes(&self, term: &str, contact: &str) -> Result<Option<usize>, HarvestError>;
    fn search_gene_ids(
        &self,
        term: &str,
        contact: &str,
        offset: usize,
        page_size: usize,
    ) -> Result<Vec<String>, HarvestError>;
    fn fetch_summaries(
        &self,
        ids: &[String],
        contact: &str,
    ) -> Result<Vec<GeneRecord>, HarvestError>;
}

#[derive(Clone)]
pub struct EutilsHttpClient {
    client: Client,
    base_url: String,
    tool: String,
}

impl EutilsHttpClient {
    pub fn new(config: &ResolvedConfig) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("gene-harvester/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| HarvestError::EutilsHttp(err.to_string()))?,
        );
        // `None` leaves the request unbounded; only the transport can cut it.
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|err| HarvestError::EutilsHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            tool: config.tool.clone(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}.fcgi", self.base_url, name)
    }

    fn request(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> reqwest::blocking::RequestBuilder {
        self.client.get(self.endpoint(endpoint)).query(params).query(&[
            ("tool", self.tool.as_str()),
            // E-utilities reads `retmode`; `format` is accepted and ignored.
            ("retmode", "json"),
            ("format", "json"),
        ])
    }

    fn get_json(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, HarvestError> {
        debug!(endpoint, ?params, "E-utilities request");
        let response = self
            .request(endpoint, params)
            .send()
            .map_err(|err| HarvestError::EutilsHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| HarvestError::MalformedResponse(err.to_string()))
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, HarvestError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "E-utilities request failed".to_string());
        Err(HarvestError::EutilsStatus { status, message })
    }
}

impl EutilsClient for EutilsHttpClient {
    fn search_taxonomy(&self, organism: &str) -> Result<Option<TaxonomyId>, HarvestError> {
        let body = self.get_json("esearch", &taxonomy_params(organism))?;
        Ok(parse_taxonomy_id(&body))
    }

    fn count_genes(&self, term: &str, contact: &str) -> Result<Option<usize>, HarvestError> {
        let body = self.get_json("esearch", &count_params(term, contact))?;
        Ok(parse_count(&body))
    }

    fn search_gene_ids(
        &self,
        term: &str,
        contact: &str,
        offset: usize,
        page_size: usize,
    ) -> Result<Vec<String>, HarvestError> {
        let body = self.get_json("esearch", &page_params(term, contact, offset, page_size))?;
        parse_id_list(&body)
    }

    fn fetch_summaries(
        &self,
        ids: &[String],
        contact: &str,
    ) -> Result<Vec<GeneRecord>, HarvestError> {
        let body = self.get_json("esummary", &summary_params(ids, contact))?;
        parse_summaries(&body)
    }
}

/// Taxonomy lookup carries no contact.
pub fn taxonomy_params(organism: &str) -> Vec<(&'static str, String)> {
    vec![("db", "taxonomy".to_string()), ("term", organism.to_string())]
}

/// `retmax=0` so only the count comes back.
pub fn count_params(term: &str, contact: &str) -> Vec<(&'static str, String)> {
    vec![
        ("db", "gene".to_string()),
        ("term", term.to_string()),
        ("retmax", "0".to_string()),
        ("email", contact.to_string()),
    ]
}

pub fn page_params(
    term: &str,
    contact: &str,
    offset: usize,
    page_size: usize,
) -> Vec<(&'static str, String)> {
    vec![
        ("db", "gene".to_string()),
        ("term", term.to_string()),
        ("retmax", page_size.to_string()),
        ("retstart", offset.to_string()),
        ("email", contact.to_string()),
    ]
}

pub fn summary_params(ids: &[String], contact: &str) -> Vec<(&'static str, String)> {
    vec![
        ("db", "gene".to_string()),
        ("id", ids.join(",")),
        ("email", contact.to_string()),
    ]
}

pub fn parse_taxonomy_id(body: &Value) -> Option<TaxonomyId> {
    body.get("esearchresult")
        .and_then(|v| v.get("idlist"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(id_as_string)
        .and_then(|id| id.parse().ok())
}

pub fn parse_count(body: &Value) -> Option<usize> {
    let count = body.get("esearchresult").and_then(|v| v.get("count"))?;
    match count {
        Value::String(value) => value.trim().parse().ok(),
        Value::Number(value) => value.as_u64().map(|n| n as usize),
        _ => None,
    }
}

/// Ids of one esearch page. A missing `idlist` is an empty page; a missing
/// `esearchresult` or a reported error is malformed.
pub fn parse_id_list(body: &Value) -> Result<Vec<String>, HarvestError> {
    let result = body.get("esearchresult").ok_or_else(|| {
        HarvestError::MalformedResponse(describe_error(body, "missing esearchresult"))
    })?;
    if let Some(error) = result.get("ERROR").and_then(|v| v.as_str()) {
        return Err(HarvestError::MalformedResponse(error.to_string()));
    }
    let ids = match result.get("idlist") {
        Some(Value::Array(items)) => items.iter().filter_map(id_as_string).collect(),
        Some(Value::String(items)) => items.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(ids)
}

/// Name written for summary entries the service could not resolve.
pub const UNKNOWN_GENE_NAME: &str = "Unknown";

/// Gene records of one esummary response, in `uids` order when the service
/// provides it. Entries without a name become `UNKNOWN_GENE_NAME`.
pub fn parse_summaries(body: &Value) -> Result<Vec<GeneRecord>, HarvestError> {
    let result = body
        .get("result")
        .and_then(|v| v.as_object())
        .ok_or_else(|| HarvestError::MalformedResponse(describe_error(body, "missing result")))?;

    let keys: Vec<String> = match result.get("uids").and_then(|v| v.as_array()) {
        Some(uids) => uids.iter().filter_map(id_as_string).collect(),
        None => result
            .keys()
            .filter(|key| key.as_str() != "uids")
            .cloned()
            .collect(),
    };

    let mut records = Vec::with_capacity(keys.len());
    for key in keys {
        let name = result
            .get(&key)
            .and_then(|entry| entry.get("name"))
            .and_then(|v| v.as_str());
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                debug!(id = %key, "summary entry without a name");
                UNKNOWN_GENE_NAME.to_string()
            }
        };
        records.push(GeneRecord { id: key, name });
    }
    Ok(records)
}

fn id_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn describe_error(body: &Value, fallback: &str) -> String {
    body.get("error")
        .or_else(|| body.get("ERROR"))
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .unwrap_or_else(|| fallback.to_string())
}

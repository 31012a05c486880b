use sentinel_domain::DnsRewrite;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct RewriteResponse {
    pub id: i64,
    pub domain: String,
    pub target: String,
}

impl From<&DnsRewrite> for RewriteResponse {
    fn from(r: &DnsRewrite) -> Self {
        Self {
            id: r.id.unwrap_or(0),
            domain: r.domain.to_string(),
            target: r.target.to_storage_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PutRewriteRequest {
    pub domain: String,
    pub target: String,
}

impl PutRewriteRequest {
    pub fn into_rewrite(self, id: Option<i64>) -> Result<DnsRewrite, String> {
        let mut rewrite = DnsRewrite::new(&self.domain, &self.target).map_err(|e| e.to_string())?;
        rewrite.id = id;
        Ok(rewrite)
    }
}

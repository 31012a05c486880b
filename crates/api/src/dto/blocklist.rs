use sentinel_domain::{Blocklist, BlocklistMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct BlocklistResponse {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub enabled: bool,
    pub mode: String,
    pub last_updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_error: Option<String>,
    pub last_rule_count: Option<i64>,
}

impl From<&Blocklist> for BlocklistResponse {
    fn from(b: &Blocklist) -> Self {
        Self {
            id: b.id.unwrap_or(0),
            name: b.name.to_string(),
            url: b.url.to_string(),
            enabled: b.enabled,
            mode: b.mode.as_str().to_string(),
            last_updated_at: b.last_updated_at,
            last_error: b.last_error.clone(),
            last_rule_count: b.last_rule_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBlocklistRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBlocklistRequest {
    pub name: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub mode: Option<String>,
}

fn default_true() -> bool {
    true
}

fn parse_mode(raw: Option<&str>) -> Result<BlocklistMode, String> {
    use std::str::FromStr;
    match raw {
        None => Ok(BlocklistMode::Active),
        Some(s) => BlocklistMode::from_str(&s.to_uppercase()),
    }
}

impl CreateBlocklistRequest {
    pub fn into_blocklist(self) -> Result<Blocklist, String> {
        let mode = parse_mode(self.mode.as_deref())?;
        Ok(Blocklist::new(self.name, self.url, mode))
    }
}

impl UpdateBlocklistRequest {
    pub fn apply(self, mut existing: Blocklist) -> Result<Blocklist, String> {
        existing.name = self.name.into();
        existing.url = self.url.into();
        existing.enabled = self.enabled;
        existing.mode = parse_mode(self.mode.as_deref())?;
        Ok(existing)
    }
}

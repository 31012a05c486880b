use std::sync::Arc;

/// Whether a blocklist's matches produce a hard block or a logged-only
/// shadow block (spec glossary "Shadow mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlocklistMode {
    Active,
    Shadow,
}

impl BlocklistMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlocklistMode::Active => "ACTIVE",
            BlocklistMode::Shadow => "SHADOW",
        }
    }
}

impl std::str::FromStr for BlocklistMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(BlocklistMode::Active),
            "SHADOW" => Ok(BlocklistMode::Shadow),
            other => Err(format!("invalid blocklist mode: {other}")),
        }
    }
}

/// A remote hostlist source. Owns every rule whose `category` is
/// `Blocklist:<id>` (spec §3).
#[derive(Debug, Clone)]
pub struct Blocklist {
    pub id: Option<i64>,
    pub name: Arc<str>,
    pub url: Arc<str>,
    pub enabled: bool,
    pub mode: BlocklistMode,
    pub last_updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_error: Option<String>,
    pub last_rule_count: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Blocklist {
    pub fn new(name: impl Into<Arc<str>>, url: impl Into<Arc<str>>, mode: BlocklistMode) -> Self {
        Self {
            id: None,
            name: name.into(),
            url: url.into(),
            enabled: true,
            mode,
            last_updated_at: None,
            last_error: None,
            last_rule_count: None,
            created_at: None,
            updated_at: None,
        }
    }
}

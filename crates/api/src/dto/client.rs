use sentinel_domain::{ClientProfile, ClientType, Schedule, ScheduleMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub id: Option<i64>,
    pub days: Vec<String>,
    pub start_minute: u16,
    pub end_minute: u16,
    pub active: bool,
    pub mode: String,
    pub block_all: Option<bool>,
    pub blocked_categories: Vec<String>,
    pub blocked_apps: Vec<String>,
}

impl From<&Schedule> for ScheduleResponse {
    fn from(s: &Schedule) -> Self {
        Self {
            id: s.id,
            days: s.days.iter().map(|d| d.to_string()).collect(),
            start_minute: s.start_minute,
            end_minute: s.end_minute,
            active: s.active,
            mode: match s.mode {
                ScheduleMode::Sleep => "sleep".to_string(),
                ScheduleMode::Custom => "custom".to_string(),
            },
            block_all: s.block_all,
            blocked_categories: s.blocked_categories.clone(),
            blocked_apps: s.blocked_apps.clone(),
        }
    }
}

/// Wire shape for a client/subnet profile (spec §6 `GET/PUT/DELETE
/// /api/clients[/:id]`, spec §3 "Client/Subnet profile").
#[derive(Debug, Serialize)]
pub struct ClientResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub client_type: String,
    pub ip: Option<String>,
    pub cidr: Option<String>,
    pub is_internet_paused: bool,
    pub use_global_settings: bool,
    pub use_global_categories: bool,
    pub use_global_apps: bool,
    pub assigned_blocklists: Vec<i64>,
    pub blocked_categories: Vec<String>,
    pub blocked_apps: Vec<String>,
    pub schedules: Vec<ScheduleResponse>,
}

impl From<&ClientProfile> for ClientResponse {
    fn from(p: &ClientProfile) -> Self {
        Self {
            id: p.id,
            client_type: client_type_str(p.client_type).to_string(),
            ip: p.ip.map(|ip| ip.to_string()),
            cidr: p.cidr.map(|c| c.to_string()),
            is_internet_paused: p.is_internet_paused,
            use_global_settings: p.use_global_settings,
            use_global_categories: p.use_global_categories,
            use_global_apps: p.use_global_apps,
            assigned_blocklists: p.assigned_blocklists.clone(),
            blocked_categories: p.blocked_categories.clone(),
            blocked_apps: p.blocked_apps.clone(),
            schedules: p.schedules.iter().map(ScheduleResponse::from).collect(),
        }
    }
}

fn client_type_str(t: ClientType) -> &'static str {
    match t {
        ClientType::Laptop => "laptop",
        ClientType::Smartphone => "smartphone",
        ClientType::Tv => "tv",
        ClientType::Game => "game",
        ClientType::Iot => "iot",
        ClientType::Tablet => "tablet",
        ClientType::Subnet => "subnet",
    }
}

fn client_type_from_str(s: &str) -> Result<ClientType, String> {
    match s {
        "laptop" => Ok(ClientType::Laptop),
        "smartphone" => Ok(ClientType::Smartphone),
        "tv" => Ok(ClientType::Tv),
        "game" => Ok(ClientType::Game),
        "iot" => Ok(ClientType::Iot),
        "tablet" => Ok(ClientType::Tablet),
        "subnet" => Ok(ClientType::Subnet),
        other => Err(format!("unknown client type: {other}")),
    }
}

/// `PUT /api/clients/:id` body. `id` comes from the path, not the body.
#[derive(Debug, Deserialize)]
pub struct PutClientRequest {
    #[serde(rename = "type")]
    pub client_type: String,
    pub ip: Option<String>,
    pub cidr: Option<String>,
    #[serde(default)]
    pub is_internet_paused: bool,
    #[serde(default = "default_true")]
    pub use_global_settings: bool,
    #[serde(default = "default_true")]
    pub use_global_categories: bool,
    #[serde(default = "default_true")]
    pub use_global_apps: bool,
    #[serde(default)]
    pub assigned_blocklists: Vec<i64>,
    #[serde(default)]
    pub blocked_categories: Vec<String>,
    #[serde(default)]
    pub blocked_apps: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl PutClientRequest {
    pub fn into_profile(self, id: i64) -> Result<ClientProfile, String> {
        let client_type = client_type_from_str(&self.client_type)?;
        let ip = self.ip.as_deref().map(|s| s.parse()).transpose().map_err(|_| "invalid ip".to_string())?;
        let cidr = self
            .cidr
            .as_deref()
            .map(|s| s.parse::<ipnetwork::IpNetwork>())
            .transpose()
            .map_err(|_| "invalid cidr".to_string())?;

        if client_type == ClientType::Subnet && cidr.is_none() {
            return Err("subnet profile requires a cidr".to_string());
        }

        Ok(ClientProfile {
            id,
            client_type,
            ip,
            cidr,
            is_internet_paused: self.is_internet_paused,
            use_global_settings: self.use_global_settings,
            use_global_categories: self.use_global_categories,
            use_global_apps: self.use_global_apps,
            assigned_blocklists: self.assigned_blocklists,
            blocked_categories: self.blocked_categories,
            blocked_apps: self.blocked_apps,
            schedules: Vec::new(),
        })
    }
}

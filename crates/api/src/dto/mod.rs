pub mod blocklist;
pub mod client;
pub mod cluster;
pub mod hostname;
pub mod query_log;
pub mod rewrite;
pub mod rule;
pub mod settings;

pub use blocklist::{BlocklistResponse, CreateBlocklistRequest, UpdateBlocklistRequest};
pub use client::{ClientResponse, PutClientRequest};
pub use cluster::*;
pub use hostname::HostnameResponse;
pub use query_log::*;
pub use rewrite::{PutRewriteRequest, RewriteResponse};
pub use rule::{CreateRuleRequest, RuleResponse};
pub use settings::{PutRawSettingRequest, RawSettingResponse};

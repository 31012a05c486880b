//! Entities, value objects and configuration for the Sentinel DNS core.
//!
//! This crate has no I/O and no dependency on any other workspace crate:
//! every type here is constructible and validatable in isolation. The
//! `application` crate defines the ports that move these types in and out
//! of persistence and the network.

pub mod client;
pub mod blocklist;
pub mod cluster;
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod errors;
pub mod query_log;
pub mod rewrite;
pub mod rule;
pub mod schedule;
pub mod settings;
pub mod validators;

pub use client::{ClientProfile, ClientResolver, ClientType};
pub use blocklist::{Blocklist, BlocklistMode};
pub use cluster::{effective_role, ClusterConfig, ClusterRole, JoinCode};
pub use config::{CliOverrides, Config};
pub use dns_query::DnsQuery;
pub use dns_record::RecordType;
pub use errors::DomainError;
pub use query_log::{QueryLogEntry, QueryStatus};
pub use rewrite::{DnsRewrite, RewriteTarget};
pub use rule::{ClientPolicyKind, Rule, RuleScope, RuleType};
pub use schedule::{Schedule, ScheduleMode};
pub use settings::{DnsForwardSettings, ForwardTransport, PauseMode, ProtectionPause, SettingsValue};
pub use validators::{candidate_suffixes, is_tailscale_ip, normalize_client_ip, normalize_domain};

use super::apps::is_app_blocked;
use super::decision::Decision;
use super::index::Index;
use arc_swap::ArcSwap;
use chrono::{DateTime, Datelike, Timelike, Utc};
use sentinel_domain::{candidate_suffixes, ClientPolicyKind, RuleScope};
use std::net::IpAddr;
use std::sync::Arc;

/// The live, swappable decision structure (spec §9 redesign note:
/// "publisher/subscriber" replacing global mutable caches). The refresher
/// builds a new `Index` off the hot path and calls `publish`; every
/// in-flight `decide` call keeps using the snapshot it already took.
pub struct PolicyEngine {
    index: ArcSwap<Index>,
}

impl PolicyEngine {
    pub fn new(index: Index) -> Self {
        Self {
            index: ArcSwap::from_pointee(index),
        }
    }

    pub fn publish(&self, index: Index) {
        self.index.store(Arc::new(index));
    }

    pub fn snapshot(&self) -> Arc<Index> {
        self.index.load_full()
    }

    /// Resolve `(query_name, client_ip)` to a `Decision` (spec §4.2
    /// "Decision algorithm"). Deterministic given the same `Index` snapshot,
    /// `now` and inputs (spec §8 invariant 3) — this function touches no
    /// global state beyond the snapshot it's handed.
    pub fn decide(&self, query_name: &str, client_ip: IpAddr, now: DateTime<Utc>) -> Decision {
        let index = self.snapshot();
        let suffixes = candidate_suffixes(query_name);
        let client = index.resolve_client(client_ip);

        let pause_active = index.protection_pause.is_active(now);

        // Phase 1: protection pause, with the client kill-switch as a hard
        // override in either direction.
        if pause_active {
            if client.as_ref().is_some_and(|c| c.is_internet_paused) {
                return Decision::Blocked {
                    blocklist_id: Arc::from(RuleScope::ClientPolicy(ClientPolicyKind::InternetPaused).encode()),
                };
            }
            return Decision::Permitted { protection_paused: true };
        }

        // Phase 2: rewrites.
        for rewrite in index.rewrites() {
            if rewrite.matches(query_name) {
                return Decision::Rewritten { target: rewrite.target.clone() };
            }
        }

        // Phase 3: client kill-switch (pause not active).
        if client.as_ref().is_some_and(|c| c.is_internet_paused) {
            return Decision::Blocked {
                blocklist_id: Arc::from(RuleScope::ClientPolicy(ClientPolicyKind::InternetPaused).encode()),
            };
        }

        // Phase 4: client/subnet/global allowlists.
        for suffix in &suffixes {
            if let Some(c) = &client {
                if index.manual_allowed_for_client(c.id, suffix) {
                    return Decision::Permitted { protection_paused: false };
                }
                if c.is_subnet() && index.manual_allowed_for_subnet(c.id, suffix) {
                    return Decision::Permitted { protection_paused: false };
                }
            }
            if index.manual_allowed_global(suffix) {
                return Decision::Permitted { protection_paused: false };
            }
        }

        // Phase 5: client/subnet blocklists (manual).
        if let Some(c) = &client {
            for suffix in &suffixes {
                if index.manual_blocked_for_client(c.id, suffix) {
                    return Decision::Blocked {
                        blocklist_id: Arc::from(RuleScope::Client(c.id).encode()),
                    };
                }
                if c.is_subnet() && index.manual_blocked_for_subnet(c.id, suffix) {
                    return Decision::Blocked {
                        blocklist_id: Arc::from(RuleScope::Subnet(c.id).encode()),
                    };
                }
            }
        }
        for suffix in &suffixes {
            if index.manual_blocked_global(suffix) {
                return Decision::Blocked {
                    blocklist_id: Arc::from(RuleScope::Manual.encode()),
                };
            }
        }

        // Phase 6: schedule policy.
        if let Some(c) = &client {
            let weekday = now.weekday();
            let minute_of_day = (now.hour() * 60 + now.minute()) as u16;
            for schedule in &c.schedules {
                if !schedule.is_active_at(weekday, minute_of_day) {
                    continue;
                }
                if schedule.block_all.unwrap_or(false) {
                    return Decision::Blocked {
                        blocklist_id: Arc::from(RuleScope::ClientPolicy(ClientPolicyKind::BlockAll).encode()),
                    };
                }
                if let Some(app_id) = is_app_blocked(&suffixes, &schedule.blocked_apps) {
                    return Decision::Blocked {
                        blocklist_id: Arc::from(
                            RuleScope::ClientPolicy(ClientPolicyKind::App(Arc::from(app_id))).encode(),
                        ),
                    };
                }
            }
        }

        // Phase 7: selected blocklists, ACTIVE beats SHADOW regardless of
        // insertion order (spec §8 invariant 4).
        let use_assigned = client
            .as_ref()
            .is_some_and(|c| !c.use_global_settings && !c.assigned_blocklists.is_empty());
        let selected: Option<Vec<i64>> = if use_assigned {
            client.as_ref().map(|c| c.assigned_blocklists.clone())
        } else {
            None // None means "every enabled blocklist" (the global set).
        };

        let mut any_shadow: Option<i64> = None;
        for suffix in &suffixes {
            for blocklist_id in index.blocklists_for_suffix(suffix) {
                if let Some(selected) = &selected {
                    if !selected.contains(&blocklist_id) {
                        continue;
                    }
                }
                let Some(meta) = index.blocklist_meta(blocklist_id) else { continue };
                match meta.mode {
                    sentinel_domain::BlocklistMode::Active => {
                        return Decision::Blocked {
                            blocklist_id: Arc::from(RuleScope::Blocklist(blocklist_id).encode()),
                        };
                    }
                    sentinel_domain::BlocklistMode::Shadow => {
                        any_shadow.get_or_insert(blocklist_id);
                    }
                }
            }
        }
        if let Some(id) = any_shadow {
            return Decision::ShadowBlocked {
                blocklist_id: Arc::from(RuleScope::Blocklist(id).encode()),
            };
        }

        // Phase 8: default.
        Decision::Permitted { protection_paused: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::index::{BlocklistMeta, IndexBuilder};
    use chrono::TimeZone;
    use sentinel_domain::{
        Blocklist as _, BlocklistMode, ClientProfile, ClientType, DnsRewrite, PauseMode,
        ProtectionPause, Rule, RuleScope as Scope, RuleType, Schedule, ScheduleMode,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 27, 12, 0, 0).unwrap()
    }

    #[test]
    fn permits_when_no_rules_match() {
        let engine = PolicyEngine::new(IndexBuilder::new().build());
        let decision = engine.decide("allowed.test", "127.0.0.1".parse().unwrap(), now());
        assert_eq!(decision, Decision::Permitted { protection_paused: false });
    }

    #[test]
    fn blocks_manual_rule() {
        let rules = vec![Rule::new("blocked.test", RuleType::Blocked, Scope::Manual)];
        let engine = PolicyEngine::new(IndexBuilder::new().with_rules(rules).build());
        let decision = engine.decide("blocked.test", "127.0.0.1".parse().unwrap(), now());
        assert!(decision.is_hard_block());
    }

    #[test]
    fn pause_bypasses_blocking_but_kill_switch_wins() {
        let rules = vec![Rule::new("blocked.test", RuleType::Blocked, Scope::Manual)];
        let pause = ProtectionPause {
            mode: PauseMode::Forever,
            until: None,
        };
        let engine = PolicyEngine::new(
            IndexBuilder::new()
                .with_rules(rules)
                .with_protection_pause(pause)
                .build(),
        );

        let decision = engine.decide("blocked.test", "127.0.0.1".parse().unwrap(), now());
        assert_eq!(decision, Decision::Permitted { protection_paused: true });

        let mut paused_client = ClientProfile::new_device(1, ClientType::Laptop, "127.0.0.2".parse().unwrap());
        paused_client.is_internet_paused = true;
        let engine2 = PolicyEngine::new(
            IndexBuilder::new()
                .with_clients(vec![Arc::new(paused_client)])
                .with_protection_pause(ProtectionPause {
                    mode: PauseMode::Forever,
                    until: None,
                })
                .build(),
        );
        let decision2 = engine2.decide("allowed.test", "127.0.0.2".parse().unwrap(), now());
        assert_eq!(
            decision2,
            Decision::Blocked {
                blocklist_id: Arc::from("ClientPolicy:InternetPaused")
            }
        );
    }

    #[test]
    fn active_blocklist_beats_shadow() {
        let rules = vec![
            Rule::new("ads.example.com", RuleType::Blocked, Scope::Blocklist(1)),
            Rule::new("ads.example.com", RuleType::Blocked, Scope::Blocklist(2)),
        ];
        let index = IndexBuilder::new()
            .with_rules(rules)
            .with_blocklists(vec![
                (
                    1,
                    BlocklistMeta {
                        enabled: true,
                        mode: BlocklistMode::Shadow,
                        name: Arc::from("shadow-list"),
                    },
                ),
                (
                    2,
                    BlocklistMeta {
                        enabled: true,
                        mode: BlocklistMode::Active,
                        name: Arc::from("active-list"),
                    },
                ),
            ])
            .build();
        let engine = PolicyEngine::new(index);
        let decision = engine.decide("ads.example.com", "127.0.0.1".parse().unwrap(), now());
        assert_eq!(
            decision,
            Decision::Blocked {
                blocklist_id: Arc::from("Blocklist:2")
            }
        );
    }

    #[test]
    fn rewrite_short_circuits_before_blocklists() {
        let rewrite = DnsRewrite::new("printer.lan", "10.0.0.50").unwrap();
        let rules = vec![Rule::new("printer.lan", RuleType::Blocked, Scope::Manual)];
        let engine = PolicyEngine::new(
            IndexBuilder::new()
                .with_rules(rules)
                .with_rewrites(vec![rewrite])
                .build(),
        );
        let decision = engine.decide("printer.lan", "127.0.0.1".parse().unwrap(), now());
        assert!(matches!(decision, Decision::Rewritten { .. }));
    }

    #[test]
    fn schedule_block_all_wins_over_default_permit() {
        let schedule = Schedule::new(
            vec![now().weekday()],
            "00:00",
            "23:59",
            ScheduleMode::Custom,
        )
        .map(|mut s| {
            s.block_all = Some(true);
            s
        })
        .unwrap();

        let mut client = ClientProfile::new_device(5, ClientType::Tablet, "10.0.0.9".parse().unwrap());
        client.schedules.push(schedule);

        let engine = PolicyEngine::new(IndexBuilder::new().with_clients(vec![Arc::new(client)]).build());
        let decision = engine.decide("anything.test", "10.0.0.9".parse().unwrap(), now());
        assert_eq!(
            decision,
            Decision::Blocked {
                blocklist_id: Arc::from("ClientPolicy:BlockAll")
            }
        );
    }

    #[test]
    fn publish_swaps_snapshot_for_subsequent_calls() {
        let engine = PolicyEngine::new(IndexBuilder::new().build());
        assert_eq!(
            engine.decide("blocked.test", "127.0.0.1".parse().unwrap(), now()),
            Decision::Permitted { protection_paused: false }
        );

        let rules = vec![Rule::new("blocked.test", RuleType::Blocked, Scope::Manual)];
        engine.publish(IndexBuilder::new().with_rules(rules).build());

        assert!(engine
            .decide("blocked.test", "127.0.0.1".parse().unwrap(), now())
            .is_hard_block());
    }
}

use sentinel_domain::{
    candidate_suffixes, Blocklist, BlocklistMode, ClientProfile, ClientResolver, ClientType,
    DnsRewrite, JoinCode, Rule, RuleScope, RuleType, Schedule, ScheduleMode,
};

#[test]
fn rule_scope_encodes_into_rule_storage_shape() {
    let rule = Rule::new("ads.example.com", RuleType::Blocked, RuleScope::Blocklist(7));
    assert_eq!(rule.scope.encode(), "Blocklist:7");
    assert_eq!(rule.rule_type.as_str(), "BLOCKED");
}

#[test]
fn blocklist_modes_roundtrip_through_strings() {
    let bl = Blocklist::new("oisd-small", "https://example.org/list.txt", BlocklistMode::Active);
    assert_eq!(bl.mode.as_str(), "ACTIVE");
    assert!(bl.enabled);
}

#[test]
fn client_resolution_respects_longest_prefix_and_exact_match() {
    let laptop = std::sync::Arc::new(ClientProfile::new_device(
        1,
        ClientType::Laptop,
        "10.1.1.5".parse().unwrap(),
    ));
    let wide_subnet = std::sync::Arc::new(ClientProfile::new_subnet(2, "10.1.0.0/16").unwrap());
    let narrow_subnet = std::sync::Arc::new(ClientProfile::new_subnet(3, "10.1.1.0/24").unwrap());

    let resolver = ClientResolver::build(vec![laptop, wide_subnet, narrow_subnet]);

    assert_eq!(resolver.resolve("10.1.1.5".parse().unwrap()).unwrap().id, 1);
    assert_eq!(resolver.resolve("10.1.1.9".parse().unwrap()).unwrap().id, 3);
    assert_eq!(resolver.resolve("10.1.9.9".parse().unwrap()).unwrap().id, 2);
    assert!(resolver.resolve("192.168.1.1".parse().unwrap()).is_none());
}

#[test]
fn candidate_walk_backs_a_blocklist_style_suffix_match() {
    let candidates = candidate_suffixes("a.b.ads.example.com");
    assert!(candidates.contains(&"ads.example.com".to_string()));
    assert!(candidates.contains(&"example.com".to_string()));
    assert!(!candidates.contains(&"com".to_string()));
}

#[test]
fn schedule_blocks_sleep_window_across_midnight() {
    let sched = Schedule::new(
        vec![chrono::Weekday::Sat],
        "22:30",
        "06:00",
        ScheduleMode::Sleep,
    )
    .unwrap();

    assert!(sched.is_active_at(chrono::Weekday::Sat, 23 * 60));
    assert!(sched.is_active_at(chrono::Weekday::Sun, 5 * 60));
    assert!(!sched.is_active_at(chrono::Weekday::Sat, 12 * 60));
}

#[test]
fn rewrite_target_normalizes_hostname_case() {
    let rewrite = DnsRewrite::new("printer.lan", "NAS.LAN.").unwrap();
    assert!(rewrite.matches("Printer.LAN"));
}

#[test]
fn join_code_round_trips_and_rejects_garbage() {
    let code = JoinCode::new("https://10.0.0.1:8443", "topsecret");
    let encoded = code.encode();
    let decoded = JoinCode::decode(&encoded).unwrap();
    assert_eq!(decoded.leader_url, code.leader_url);
    assert!(JoinCode::decode("###not-valid###").is_err());
}

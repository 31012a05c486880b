/// Known domain suffixes for app-policy matching (spec §4.2 "App-policy
/// matching"). This is necessarily a curated, non-exhaustive catalog — new
/// apps are added here as they're identified; an app id with no entry never
/// matches.
fn known_suffixes(app_id: &str) -> &'static [&'static str] {
    match app_id {
        "discord" => &["discord.com", "discordapp.com", "discord.gg", "discordapp.net"],
        "youtube" => &["youtube.com", "youtu.be", "googlevideo.com", "ytimg.com"],
        "tiktok" => &["tiktok.com", "tiktokcdn.com", "musical.ly"],
        "netflix" => &["netflix.com", "nflxvideo.net", "nflximg.net"],
        "instagram" => &["instagram.com", "cdninstagram.com"],
        "facebook" => &["facebook.com", "fbcdn.net", "fb.com"],
        "snapchat" => &["snapchat.com", "sc-cdn.net"],
        "twitch" => &["twitch.tv", "ttvnw.net", "jtvnw.net"],
        "roblox" => &["roblox.com", "rbxcdn.com"],
        "steam" => &["steampowered.com", "steamcommunity.com", "steamcontent.com"],
        _ => &[],
    }
}

/// The first `app_id` in `blocked_apps` whose known suffix set contains any
/// suffix of `query_name`'s candidate walk. Matching is case-insensitive —
/// `candidate_suffixes` already normalizes to lowercase.
pub fn is_app_blocked(candidate_suffixes: &[String], blocked_apps: &[String]) -> Option<String> {
    for app_id in blocked_apps {
        let suffixes = known_suffixes(app_id.to_ascii_lowercase().as_str());
        if suffixes.is_empty() {
            continue;
        }
        if candidate_suffixes.iter().any(|s| suffixes.contains(&s.as_str())) {
            return Some(app_id.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_app_suffix() {
        let candidates = vec!["discordapp.com".to_string(), "com".to_string()];
        let blocked = vec!["discord".to_string()];
        assert_eq!(is_app_blocked(&candidates, &blocked), Some("discord".to_string()));
    }

    #[test]
    fn unknown_app_never_matches() {
        let candidates = vec!["example.com".to_string()];
        let blocked = vec!["not-a-real-app".to_string()];
        assert_eq!(is_app_blocked(&candidates, &blocked), None);
    }
}

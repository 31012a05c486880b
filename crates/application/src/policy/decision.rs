use sentinel_domain::RewriteTarget;
use std::sync::Arc;

/// The outcome of `PolicyEngine::decide` (spec §1 decision set).
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Permitted { protection_paused: bool },
    Blocked { blocklist_id: Arc<str> },
    ShadowBlocked { blocklist_id: Arc<str> },
    Rewritten { target: RewriteTarget },
}

impl Decision {
    pub fn status_str(&self) -> &'static str {
        match self {
            Decision::Permitted { .. } => "PERMITTED",
            Decision::Blocked { .. } => "BLOCKED",
            Decision::ShadowBlocked { .. } => "SHADOW_BLOCKED",
            Decision::Rewritten { .. } => "REWRITTEN",
        }
    }

    pub fn blocklist_id(&self) -> Option<&str> {
        match self {
            Decision::Blocked { blocklist_id } | Decision::ShadowBlocked { blocklist_id } => {
                Some(blocklist_id)
            }
            _ => None,
        }
    }

    pub fn protection_paused(&self) -> bool {
        matches!(self, Decision::Permitted { protection_paused: true })
    }

    /// A blocked decision never carries answers (spec §8 invariant 5):
    /// callers must synthesize NXDOMAIN, never forward upstream answers,
    /// for `Blocked`.
    pub fn is_hard_block(&self) -> bool {
        matches!(self, Decision::Blocked { .. })
    }
}

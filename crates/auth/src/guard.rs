use serde::Serialize;

use crate::claims::{DecodeError, decode_payload, extract_role};
use crate::roles::match_role;
use crate::routes::Route;

/// Outcome of a route guard check.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    RedirectLogin,
    RedirectUnauthorized,
}

impl Decision {
    /// Where navigation must go instead, if anywhere.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            Decision::Allow => None,
            Decision::RedirectLogin => Some(Route::Login),
            Decision::RedirectUnauthorized => Some(Route::Unauthorized),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide whether navigation to a route may proceed.
///
/// - No IO
/// - No panics
/// - Every failure resolves to a redirect
///
/// The token is decoded before the "no role required" shortcut, so an
/// undecodable token is sent to login even on routes without a role.
pub fn decide(token: Option<&str>, required_role: Option<&str>) -> Decision {
    explain_decision(token, required_role).decision
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Why the guard decided what it decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionExplanation {
    pub decision: Decision,

    /// Role found in the token, as written there.
    pub actual_role: Option<String>,

    /// Role the route asked for.
    pub required_role: Option<String>,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// Kind of denial, when navigation does not proceed.
    pub denial: Option<DenialKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DenialKind {
    MissingCredential,
    MalformedCredential(String),
    InsufficientPrivilege,
}

/// Same as [`decide`], with the details needed for logging and auditing.
pub fn explain_decision(token: Option<&str>, required_role: Option<&str>) -> DecisionExplanation {
    let required = required_role.filter(|r| !r.is_empty());

    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => {
            return DecisionExplanation {
                decision: Decision::RedirectLogin,
                actual_role: None,
                required_role: required.map(str::to_string),
                reason: "no session token present".to_string(),
                denial: Some(DenialKind::MissingCredential),
            };
        }
    };

    let payload = match decode_payload(token) {
        Ok(payload) => payload,
        Err(err) => return malformed(err, required),
    };

    let actual = extract_role(&payload).unwrap_or_default();
    let actual_role = (!actual.is_empty()).then(|| actual.to_string());

    let Some(required) = required else {
        return DecisionExplanation {
            decision: Decision::Allow,
            actual_role,
            required_role: None,
            reason: "route declares no role; any authenticated identity may enter".to_string(),
            denial: None,
        };
    };

    if match_role(actual, required) {
        DecisionExplanation {
            decision: Decision::Allow,
            actual_role,
            required_role: Some(required.to_string()),
            reason: format!("role '{actual}' satisfies required role '{required}'"),
            denial: None,
        }
    } else {
        DecisionExplanation {
            decision: Decision::RedirectUnauthorized,
            reason: match &actual_role {
                Some(actual) => format!("role '{actual}' does not satisfy required role '{required}'"),
                None => format!("token carries no role; route requires '{required}'"),
            },
            actual_role,
            required_role: Some(required.to_string()),
            denial: Some(DenialKind::InsufficientPrivilege),
        }
    }
}

fn malformed(err: DecodeError, required: Option<&str>) -> DecisionExplanation {
    DecisionExplanation {
        decision: Decision::RedirectLogin,
        actual_role: None,
        required_role: required.map(str::to_string),
        reason: format!("session token could not be decoded: {err}"),
        denial: Some(DenialKind::MalformedCredential(err.to_string())),
    }
}

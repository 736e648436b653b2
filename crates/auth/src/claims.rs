//! Session token payload decoding and role-claim extraction.
//!
//! The client never verifies the token signature; the backend remains the
//! authority. Decoding only reads the payload segment so routes can be
//! guarded before any page loads.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::Role;

/// Decoded JWT payload (transport-agnostic, unverified).
///
/// Only the claims consulted for routing are modelled; every other claim is
/// kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Direct role claim, as issued by the login service.
    #[serde(default)]
    pub role: Option<String>,

    /// Realm-level roles (Keycloak style).
    #[serde(default)]
    pub realm_access: Option<RealmAccess>,

    /// Per-client roles (Keycloak style), in payload order.
    #[serde(default)]
    pub resource_access: Option<ResourceAccess>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `realm_access` claim.
///
/// Decoding is lenient: a `roles` value that is not an array reads as no
/// roles, and non-string entries are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RealmAccess {
    pub roles: Option<Vec<String>>,
}

/// One client's entry in the `resource_access` claim. Decoded like [`RealmAccess`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientAccess {
    pub roles: Option<Vec<String>>,
}

fn string_roles(value: &serde_json::Value) -> Option<Vec<String>> {
    let roles = value.get("roles")?.as_array()?;
    Some(
        roles
            .iter()
            .filter_map(serde_json::Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

impl<'de> Deserialize<'de> for RealmAccess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(RealmAccess {
            roles: string_roles(&value),
        })
    }
}

impl<'de> Deserialize<'de> for ClientAccess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(ClientAccess {
            roles: string_roles(&value),
        })
    }
}

/// `resource_access` claim: client id → roles, preserving payload order.
///
/// A claim that is not an object reads as no clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceAccess(Vec<(String, ClientAccess)>);

impl ResourceAccess {
    pub fn new(entries: Vec<(String, ClientAccess)>) -> Self {
        Self(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClientAccess)> {
        self.0.iter().map(|(client, access)| (client.as_str(), access))
    }
}

impl Serialize for ResourceAccess {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (client, access) in &self.0 {
            map.serialize_entry(client, access)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResourceAccess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedClients;

        impl<'de> Visitor<'de> for OrderedClients {
            type Value = ResourceAccess;

            fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("a map of client id to client roles")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((client, access)) = map.next_entry::<String, Option<ClientAccess>>()? {
                    entries.push((client, access.unwrap_or_default()));
                }
                Ok(ResourceAccess(entries))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(ResourceAccess::default())
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
                Ok(ResourceAccess::default())
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
                Ok(ResourceAccess::default())
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
                Ok(ResourceAccess::default())
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
                Ok(ResourceAccess::default())
            }

            fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
                Ok(ResourceAccess::default())
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ResourceAccess::default())
            }
        }

        deserializer.deserialize_any(OrderedClients)
    }
}

/// Why a token could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token is empty")]
    Empty,

    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),

    #[error("payload segment is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid UTF-8")]
    Utf8,

    #[error("payload is not a JSON claims object: {0}")]
    Json(String),
}

// Accepts both alphabets and optional padding, like browser `atob` after the
// usual `-`/`_` substitution.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode (without verifying) the payload segment of a `header.payload.signature` token.
pub fn decode_payload(token: &str) -> Result<TokenPayload, DecodeError> {
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }

    let normalized = segments[1].replace('-', "+").replace('_', "/");
    let bytes = PAYLOAD_ENGINE.decode(normalized)?;
    let text = String::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;

    serde_json::from_str(&text).map_err(|e| DecodeError::Json(e.to_string()))
}

/// A single place a role claim may live.
pub type ClaimStrategy = fn(&TokenPayload) -> Option<&str>;

/// Claim locations, in priority order. The first non-empty hit wins.
pub const ROLE_STRATEGIES: [ClaimStrategy; 3] = [direct_role, realm_role, resource_role];

/// The `role` claim, when non-empty.
pub fn direct_role(payload: &TokenPayload) -> Option<&str> {
    payload.role.as_deref().filter(|r| !r.is_empty())
}

/// First realm role that names a known role.
pub fn realm_role(payload: &TokenPayload) -> Option<&str> {
    let roles = payload.realm_access.as_ref()?.roles.as_ref()?;
    first_known(roles)
}

/// First known role across all clients' roles.
pub fn resource_role(payload: &TokenPayload) -> Option<&str> {
    payload
        .resource_access
        .as_ref()?
        .iter()
        .find_map(|(_, access)| first_known(access.roles.as_deref()?))
}

fn first_known(roles: &[String]) -> Option<&str> {
    roles
        .iter()
        .map(String::as_str)
        .find(|r| Role::from_alias(r).is_some())
}

/// Resolve the holder's role as written in the token (not canonicalised).
pub fn extract_role(payload: &TokenPayload) -> Option<&str> {
    ROLE_STRATEGIES.iter().find_map(|strategy| strategy(payload))
}


#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use serde_json::json;

    use super::testing::{token_for, token_for_raw};
    use super::*;

    #[test]
    fn decodes_direct_role() {
        let payload = decode_payload(&token_for(&json!({"role": "docente", "sub": "42"}))).unwrap();
        assert_eq!(payload.role.as_deref(), Some("docente"));
        assert_eq!(payload.extra.get("sub"), Some(&json!("42")));
        assert_eq!(extract_role(&payload), Some("docente"));
    }

    #[test]
    fn decodes_padded_and_non_ascii_payloads() {
        use base64::engine::general_purpose::URL_SAFE;

        let body = URL_SAFE.encode(json!({"role": "estudiante", "name": "José Núñez"}).to_string());
        let payload = decode_payload(&format!("h.{body}.s")).unwrap();
        assert_eq!(payload.extra.get("name"), Some(&json!("José Núñez")));
    }

    #[test]
    fn empty_direct_role_falls_through_to_realm() {
        let payload = decode_payload(&token_for(&json!({
            "role": "",
            "realm_access": {"roles": ["offline_access", "docente"]}
        })))
        .unwrap();
        assert_eq!(extract_role(&payload), Some("docente"));
    }

    #[test]
    fn realm_role_skips_unknown_entries() {
        let payload = decode_payload(&token_for(&json!({
            "realm_access": {"roles": ["estudiante", "other"]}
        })))
        .unwrap();
        assert_eq!(realm_role(&payload), Some("estudiante"));
    }

    #[test]
    fn resource_roles_are_searched_in_payload_order() {
        // Raw text: `json!` would sort the client ids.
        let payload = decode_payload(&token_for_raw(
            r#"{
                "realm_access": {"roles": ["uma_authorization"]},
                "resource_access": {
                    "zz-account": {"roles": ["manage-account"]},
                    "frontend": {"roles": ["administrador"]},
                    "aa-legacy": {"roles": ["docente"]}
                }
            }"#,
        ))
        .unwrap();

        let clients: Vec<&str> = payload
            .resource_access
            .as_ref()
            .unwrap()
            .iter()
            .map(|(client, _)| client)
            .collect();
        assert_eq!(clients, vec!["zz-account", "frontend", "aa-legacy"]);
        assert_eq!(extract_role(&payload), Some("administrador"));
    }

    #[test]
    fn non_string_realm_roles_are_skipped() {
        let payload = decode_payload(&token_for(&json!({
            "realm_access": {"roles": [1, "estudiante"]}
        })))
        .unwrap();
        assert_eq!(realm_role(&payload), Some("estudiante"));

        let payload = decode_payload(&token_for(&json!({
            "role": "docente",
            "realm_access": {"roles": [42]}
        })))
        .unwrap();
        assert_eq!(extract_role(&payload), Some("docente"));
    }

    #[test]
    fn odd_claim_shapes_read_as_no_roles() {
        let payload = decode_payload(&token_for(&json!({
            "realm_access": {"roles": ["estudiante"]},
            "resource_access": {"account": "n/a"}
        })))
        .unwrap();
        assert_eq!(extract_role(&payload), Some("estudiante"));

        for odd in [json!("n/a"), json!(7), json!(true), json!([1, {"roles": ["docente"]}])] {
            let payload = decode_payload(&token_for(&json!({
                "realm_access": odd.clone(),
                "resource_access": odd
            })))
            .unwrap();
            assert_eq!(extract_role(&payload), None);
        }

        let payload = decode_payload(&token_for(&json!({
            "realm_access": {"roles": "docente"},
            "resource_access": {"app": {"roles": {"docente": true}}, "web": {"roles": ["administrador"]}}
        })))
        .unwrap();
        assert_eq!(extract_role(&payload), Some("administrador"));
    }

    #[test]
    fn null_claims_are_tolerated() {
        let payload = decode_payload(&token_for(&json!({
            "realm_access": null,
            "resource_access": {"broken": null, "app": {"roles": null}}
        })))
        .unwrap();
        assert_eq!(extract_role(&payload), None);
    }

    #[test]
    fn no_role_anywhere() {
        let payload = decode_payload(&token_for(&json!({"sub": "x"}))).unwrap();
        assert_eq!(extract_role(&payload), None);
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert_eq!(decode_payload("abc"), Err(DecodeError::SegmentCount(1)));
        assert_eq!(decode_payload("a.b.c.d"), Err(DecodeError::SegmentCount(4)));
        assert_eq!(decode_payload(""), Err(DecodeError::Empty));
    }

    #[test]
    fn rejects_bad_base64_and_bad_json() {
        assert!(matches!(decode_payload("h.!!!.s"), Err(DecodeError::Base64(_))));

        let not_json = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("not json");
        assert!(matches!(decode_payload(&format!("h.{not_json}.s")), Err(DecodeError::Json(_))));

        let array = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("[1,2]");
        assert!(matches!(decode_payload(&format!("h.{array}.s")), Err(DecodeError::Json(_))));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0x7b]);
        assert_eq!(decode_payload(&format!("h.{bytes}.s")), Err(DecodeError::Utf8));
    }

    #[test]
    fn non_string_role_is_a_decode_error() {
        assert!(matches!(
            decode_payload(&token_for(&json!({"role": 7}))),
            Err(DecodeError::Json(_))
        ));
    }
}

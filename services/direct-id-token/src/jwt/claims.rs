//! Direct ID claim set.

use serde::{Deserialize, Serialize};

/// Audience tag the engagement platform expects first in `aud`.
pub const PLATFORM_AUDIENCE: &str = "gl";

/// Validity window of every issued token, in seconds.
pub const TOKEN_TTL_SECONDS: i64 = 300;

/// Prefix of identity-bound subjects.
pub const VISITOR_SUBJECT_PREFIX: &str = "visitor:";

/// Role entry in the `roles` claim.
///
/// Serialized with an internal `type` tag, e.g.
/// `{"type":"visitor","visitor_id":"abc123"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Role {
    /// The token speaks for this visitor
    Visitor {
        /// Visitor identifier supplied by the caller
        visitor_id: String,
    },
    /// The visitor is acting on this site
    SiteVisitor {
        /// Configured site identifier
        site_id: String,
    },
}

/// Direct ID claim set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: `visitor:<id>` or the mock identity
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Audience, platform tag first
    pub aud: Vec<String>,
    /// Unique token id
    pub jti: String,
    /// Issued at (seconds since the epoch)
    pub iat: i64,
    /// Expiry (seconds since the epoch)
    pub exp: i64,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Platform account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Role entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
}

impl Claims {
    /// Claims captured at `now` (seconds since the epoch).
    pub fn issued_at(
        issuer: String,
        subject: String,
        audience: Vec<String>,
        ttl_seconds: i64,
        now: i64,
    ) -> Self {
        Self {
            sub: subject,
            iss: issuer,
            aud: audience,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ttl_seconds,
            name: None,
            email: None,
            account_id: None,
            roles: Vec::new(),
        }
    }

    /// Set `name`.
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Set `email`.
    pub fn with_email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    /// Set `account_id`.
    pub fn with_account_id(mut self, account_id: String) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Append a role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let claims = Claims::issued_at(
            "kid-1".to_string(),
            "visitor:abc".to_string(),
            vec![PLATFORM_AUDIENCE.to_string(), "site-9".to_string()],
            TOKEN_TTL_SECONDS,
            chrono::Utc::now().timestamp(),
        );

        assert_eq!(claims.iss, "kid-1");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECONDS);
        assert!(uuid::Uuid::parse_str(&claims.jti).is_ok());
    }

    #[test]
    fn test_role_serialization_shape() {
        let visitor = serde_json::to_value(Role::Visitor {
            visitor_id: "abc123".to_string(),
        })
        .unwrap();
        assert_eq!(
            visitor,
            serde_json::json!({"type": "visitor", "visitor_id": "abc123"})
        );

        let site = serde_json::to_value(Role::SiteVisitor {
            site_id: "site-9".to_string(),
        })
        .unwrap();
        assert_eq!(
            site,
            serde_json::json!({"type": "site_visitor", "site_id": "site-9"})
        );
    }

    #[test]
    fn test_optional_claims_are_omitted() {
        let claims = Claims::issued_at("iss".into(), "sub".into(), vec![], 300, 1_700_000_000);
        let value = serde_json::to_value(&claims).unwrap();

        assert!(value.get("name").is_none());
        assert!(value.get("email").is_none());
        assert!(value.get("account_id").is_none());
        assert!(value.get("roles").is_none());
        assert_eq!(value["exp"], 1_700_000_300);
    }
}

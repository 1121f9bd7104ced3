//! Builder for the Direct ID claim set.

use crate::jwt::claims::{Claims, Role, TOKEN_TTL_SECONDS};

/// Fluent construction of [`Claims`] with the fixed validity window.
pub struct ClaimsBuilder {
    issuer: String,
    subject: String,
    audience: Vec<String>,
    issued_at: Option<i64>,
    name: Option<String>,
    email: Option<String>,
    account_id: Option<String>,
    roles: Vec<Role>,
}

impl ClaimsBuilder {
    /// Start a claim set for `subject`, issued by `issuer`.
    pub fn new(issuer: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            subject: subject.into(),
            audience: Vec::new(),
            issued_at: None,
            name: None,
            email: None,
            account_id: None,
            roles: Vec::new(),
        }
    }

    /// Replace the audience list.
    pub fn audience(mut self, audience: Vec<String>) -> Self {
        self.audience = audience;
        self
    }

    /// Pin `iat` instead of reading the clock at build time.
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.issued_at = Some(timestamp);
        self
    }

    /// Display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Email address.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Platform account id.
    pub fn account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Append a role; order is preserved.
    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    /// Finish, assigning a fresh `jti`.
    pub fn build(self) -> Claims {
        let now = self
            .issued_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp());

        let mut claims = Claims::issued_at(
            self.issuer,
            self.subject,
            self.audience,
            TOKEN_TTL_SECONDS,
            now,
        );

        if let Some(name) = self.name {
            claims = claims.with_name(name);
        }

        if let Some(email) = self.email {
            claims = claims.with_email(email);
        }

        if let Some(account_id) = self.account_id {
            claims = claims.with_account_id(account_id);
        }

        for role in self.roles {
            claims = claims.with_role(role);
        }

        claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let claims = ClaimsBuilder::new("kid-1", "visitor:abc")
            .audience(vec!["gl".to_string(), "site-9".to_string()])
            .issued_at(1_000)
            .build();

        assert_eq!(claims.iss, "kid-1");
        assert_eq!(claims.sub, "visitor:abc");
        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp, 1_000 + TOKEN_TTL_SECONDS);
    }

    #[test]
    fn test_builder_keeps_role_order() {
        let claims = ClaimsBuilder::new("kid-1", "visitor:abc")
            .account_id("acct-1")
            .role(Role::Visitor {
                visitor_id: "abc".to_string(),
            })
            .role(Role::SiteVisitor {
                site_id: "site-9".to_string(),
            })
            .build();

        assert_eq!(claims.account_id.as_deref(), Some("acct-1"));
        assert!(matches!(claims.roles[0], Role::Visitor { .. }));
        assert!(matches!(claims.roles[1], Role::SiteVisitor { .. }));
    }
}

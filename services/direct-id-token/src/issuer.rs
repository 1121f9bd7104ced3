//! Token issuance.
//!
//! [`TokenIssuer::issue`] validates the configuration, then the request,
//! builds the claim set and signs it. Nothing is cached between calls: each
//! token gets its own `jti` and `iat`.

use std::time::Instant;

use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::config::{DirectIdConfig, ResolvedConfig};
use crate::error::{IssuanceError, SigningError};
use crate::jwt::{
    Claims, ClaimsBuilder, JwtSerializer, PLATFORM_AUDIENCE, Role, SigningKey,
    VISITOR_SUBJECT_PREFIX,
};
use crate::metrics;

/// Subject of the fixed demo identity.
pub const MOCK_SUBJECT: &str = "jane.doe.authenticated@email.com";
/// Display name of the fixed demo identity.
pub const MOCK_NAME: &str = "Jane Doe (Authenticated)";
/// Longest visitor id accepted.
pub const MAX_VISITOR_ID_LEN: usize = 256;

/// Who the token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueRequest {
    /// Identity-bound token for a caller-supplied visitor id
    Visitor(String),
    /// Token for the fixed demo identity
    Mock,
}

impl IssueRequest {
    /// `Some(id)` becomes [`IssueRequest::Visitor`], `None` the mock identity.
    pub fn from_visitor_id(visitor_id: Option<&str>) -> Self {
        visitor_id.map_or(Self::Mock, |id| Self::Visitor(id.to_string()))
    }

    /// Metric label for the claim profile.
    pub const fn profile(&self) -> &'static str {
        match self {
            Self::Visitor(_) => "visitor",
            Self::Mock => "mock",
        }
    }
}

/// A freshly signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    /// Compact JWS
    pub token: String,
    /// Token identifier
    pub jti: String,
    /// `iat` claim
    pub issued_at: i64,
    /// `exp` claim
    pub expires_at: i64,
    /// Header algorithm
    pub algorithm: &'static str,
}

/// Issues Direct ID tokens from an immutable configuration.
///
/// The private key is parsed once, at construction. A key that fails to load
/// keeps its [`SigningError`], which every request then reports.
#[derive(Debug)]
pub struct TokenIssuer {
    config: DirectIdConfig,
    key: Option<Result<SigningKey, SigningError>>,
}

impl TokenIssuer {
    /// Create an issuer that owns `config` for its whole lifetime.
    pub fn new(config: DirectIdConfig) -> Self {
        let key = config.private_key.as_ref().map(|pem| {
            SigningKey::from_pem(pem.expose_secret(), config.algorithm).inspect_err(|e| {
                warn!(error = %e, "Direct ID private key could not be loaded");
            })
        });
        Self { config, key }
    }

    /// The configuration tokens are issued from.
    pub const fn config(&self) -> &DirectIdConfig {
        &self.config
    }

    /// Fail fast when required configuration is missing.
    pub fn ensure_configured(&self) -> Result<(), IssuanceError> {
        self.config.validate().map(|_| ())
    }

    /// Validate, build claims and sign.
    ///
    /// Configuration is checked before the request, so a broken deployment
    /// always answers with a configuration error.
    pub fn issue(&self, request: &IssueRequest) -> Result<SignedToken, IssuanceError> {
        let started = Instant::now();

        let resolved = self.config.validate()?;
        let request = normalize_request(request)?;
        let key = self.signing_key()?;
        let signed = sign(&resolved, key, &request)?;

        metrics::record_issuance_latency(signed.algorithm, started.elapsed().as_secs_f64());
        metrics::record_token_issued(request.profile(), signed.algorithm);

        info!(
            jti = %signed.jti,
            profile = request.profile(),
            algorithm = signed.algorithm,
            expires_at = signed.expires_at,
            "Direct ID token issued"
        );

        Ok(signed)
    }

    /// The key loaded at construction, or the reason it is unusable.
    fn signing_key(&self) -> Result<&SigningKey, IssuanceError> {
        match &self.key {
            Some(Ok(key)) => Ok(key),
            Some(Err(e)) => Err(e.clone().into()),
            None => Err(IssuanceError::Configuration {
                missing: self.config.missing_fields(),
            }),
        }
    }
}

/// Issue a single token straight from a configuration.
///
/// `Some(visitor_id)` issues an identity-bound token, `None` one for the
/// mock identity. The key is parsed on every call; long-lived callers should
/// hold a [`TokenIssuer`].
pub fn issue_token(
    config: &DirectIdConfig,
    visitor_id: Option<&str>,
) -> Result<SignedToken, IssuanceError> {
    let resolved = config.validate()?;
    let request = normalize_request(&IssueRequest::from_visitor_id(visitor_id))?;
    let key = SigningKey::from_pem(resolved.private_key_pem(), resolved.algorithm)?;
    sign(&resolved, &key, &request)
}

fn sign(
    config: &ResolvedConfig<'_>,
    key: &SigningKey,
    request: &IssueRequest,
) -> Result<SignedToken, IssuanceError> {
    let claims = build_claims(config, request, chrono::Utc::now().timestamp());
    let token = JwtSerializer::new(key.algorithm()).serialize(&claims, key, config.key_id)?;

    Ok(SignedToken {
        token,
        jti: claims.jti,
        issued_at: claims.iat,
        expires_at: claims.exp,
        algorithm: key.algorithm().as_str(),
    })
}

/// Build the claim set for `request` at time `now`.
pub fn build_claims(config: &ResolvedConfig<'_>, request: &IssueRequest, now: i64) -> Claims {
    let audience = vec![PLATFORM_AUDIENCE.to_string(), config.site_id.to_string()];
    let site_role = Role::SiteVisitor {
        site_id: config.site_id.to_string(),
    };

    let builder = match request {
        IssueRequest::Visitor(visitor_id) => {
            ClaimsBuilder::new(config.issuer, format!("{VISITOR_SUBJECT_PREFIX}{visitor_id}"))
                .role(Role::Visitor {
                    visitor_id: visitor_id.clone(),
                })
                .role(site_role)
        }
        IssueRequest::Mock => ClaimsBuilder::new(config.issuer, MOCK_SUBJECT)
            .name(MOCK_NAME)
            .email(MOCK_SUBJECT)
            .role(site_role),
    };

    builder
        .audience(audience)
        .account_id(config.account_id)
        .issued_at(now)
        .build()
}

/// Trim the visitor id and reject blank or oversized values.
fn normalize_request(request: &IssueRequest) -> Result<IssueRequest, IssuanceError> {
    match request {
        IssueRequest::Visitor(raw) => {
            let visitor_id = raw.trim();
            if visitor_id.is_empty() {
                return Err(IssuanceError::MissingVisitorId);
            }
            if visitor_id.chars().count() > MAX_VISITOR_ID_LEN {
                return Err(IssuanceError::invalid_request(format!(
                    "visitorId must be at most {MAX_VISITOR_ID_LEN} characters"
                )));
            }
            Ok(IssueRequest::Visitor(visitor_id.to_string()))
        }
        IssueRequest::Mock => Ok(IssueRequest::Mock),
    }
}

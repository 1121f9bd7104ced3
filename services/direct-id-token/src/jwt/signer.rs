//! Private key loading and algorithm selection.
//!
//! The signing algorithm follows the key: EC keys sign with ECDSA (P-256 as
//! ES256, P-384 as ES384) and RSA keys with RS256 unless PS256 is requested.

use std::fmt;

use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1};
use jsonwebtoken::EncodingKey;
use pkcs8::PrivateKeyInfo;

use crate::config::JwtAlgorithm;
use crate::error::SigningError;

/// Key family detected from the PEM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    /// Elliptic curve key with the ECDSA algorithm matching its curve
    Ec(JwtAlgorithm),
    /// RSA key
    Rsa,
}

impl KeyFamily {
    /// Pick the signing algorithm, honouring an explicit request when it fits.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::AlgorithmMismatch`] when `requested` belongs
    /// to another family or to another curve.
    pub fn select_algorithm(
        self,
        requested: Option<JwtAlgorithm>,
    ) -> Result<JwtAlgorithm, SigningError> {
        match (self, requested) {
            (Self::Ec(curve_alg), None) => Ok(curve_alg),
            (Self::Ec(curve_alg), Some(alg)) if alg == curve_alg => Ok(alg),
            (Self::Rsa, None) => Ok(JwtAlgorithm::RS256),
            (Self::Rsa, Some(alg @ (JwtAlgorithm::RS256 | JwtAlgorithm::PS256))) => Ok(alg),
            (_, Some(alg)) => Err(SigningError::AlgorithmMismatch {
                algorithm: alg.as_str(),
            }),
        }
    }
}

/// A parsed private key together with the algorithm it signs with.
pub struct SigningKey {
    algorithm: JwtAlgorithm,
    key: EncodingKey,
}

impl SigningKey {
    /// Parse a PEM private key.
    ///
    /// # Errors
    ///
    /// Fails for malformed PEM, SEC1 or encrypted keys, unknown key types,
    /// an algorithm override that does not fit the key, or key bytes that
    /// `jsonwebtoken` rejects.
    pub fn from_pem(pem_text: &str, requested: Option<JwtAlgorithm>) -> Result<Self, SigningError> {
        let parsed = pem::parse(pem_text)?;
        let family = detect_key_family(&parsed)?;
        let algorithm = family.select_algorithm(requested)?;

        let key = match family {
            KeyFamily::Ec(_) => EncodingKey::from_ec_pem(pem_text.as_bytes())?,
            KeyFamily::Rsa => EncodingKey::from_rsa_pem(pem_text.as_bytes())?,
        };

        Ok(Self { algorithm, key })
    }

    /// Algorithm for the JWT header.
    #[must_use]
    pub const fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }

    pub(crate) const fn encoding_key(&self) -> &EncodingKey {
        &self.key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Work out the key family from the PEM label and, for PKCS#8, the
/// `PrivateKeyInfo` algorithm identifier.
///
/// # Errors
///
/// Returns [`SigningError::UnsupportedKeyFormat`] for labels other than
/// `PRIVATE KEY` and `RSA PRIVATE KEY`, [`SigningError::MalformedPkcs8`] when
/// the DER does not decode, and [`SigningError::UnsupportedKeyType`] for
/// PKCS#8 keys of another type or curve.
pub fn detect_key_family(parsed: &pem::Pem) -> Result<KeyFamily, SigningError> {
    match parsed.tag() {
        "RSA PRIVATE KEY" => Ok(KeyFamily::Rsa),
        "PRIVATE KEY" => {
            let info = PrivateKeyInfo::try_from(parsed.contents()).map_err(pkcs8::Error::from)?;
            family_for_algorithm(info.algorithm.oid, || info.algorithm.parameters_oid().ok())
        }
        other => Err(SigningError::UnsupportedKeyFormat {
            label: other.to_string(),
        }),
    }
}

/// Map a PKCS#8 algorithm OID (and, for EC keys, the named curve) to a family.
fn family_for_algorithm(
    algorithm: ObjectIdentifier,
    curve: impl FnOnce() -> Option<ObjectIdentifier>,
) -> Result<KeyFamily, SigningError> {
    if algorithm == RSA_ENCRYPTION {
        return Ok(KeyFamily::Rsa);
    }
    if algorithm != ID_EC_PUBLIC_KEY {
        return Err(SigningError::UnsupportedKeyType);
    }

    match curve() {
        Some(oid) if oid == SECP_256_R_1 => Ok(KeyFamily::Ec(JwtAlgorithm::ES256)),
        Some(oid) if oid == SECP_384_R_1 => Ok(KeyFamily::Ec(JwtAlgorithm::ES384)),
        _ => Err(SigningError::UnsupportedKeyType),
    }
}

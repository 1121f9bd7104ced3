//! JWT encoding with the `kid` header.

use jsonwebtoken::{Algorithm, DecodingKey, Header, TokenData, Validation, decode, encode};

use crate::config::JwtAlgorithm;
use crate::error::SigningError;
use crate::jwt::claims::{Claims, PLATFORM_AUDIENCE};
use crate::jwt::signer::SigningKey;

/// Compact JWS encoding and verification for one algorithm.
pub struct JwtSerializer {
    algorithm: Algorithm,
}

impl JwtSerializer {
    /// Serializer for `algorithm`.
    pub const fn new(algorithm: JwtAlgorithm) -> Self {
        Self {
            algorithm: algorithm.to_jsonwebtoken(),
        }
    }

    /// Sign `claims` with `key`, putting `key_id` into the `kid` header.
    pub fn serialize(
        &self,
        claims: &Claims,
        key: &SigningKey,
        key_id: &str,
    ) -> Result<String, SigningError> {
        let mut header = Header::new(self.algorithm);
        header.kid = Some(key_id.to_string());

        Ok(encode(&header, claims, key.encoding_key())?)
    }

    /// Verify a token the way the engagement platform would: signature,
    /// expiry and the platform audience tag.
    pub fn deserialize(
        &self,
        token: &str,
        key: &DecodingKey,
    ) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(&[PLATFORM_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "aud"]);

        decode::<Claims>(token, key, &validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::builder::ClaimsBuilder;

    const EC_P256_KEY: &str = include_str!("../../tests/fixtures/ec_p256_private.pem");
    const EC_P256_PUBLIC: &[u8] = include_bytes!("../../tests/fixtures/ec_p256_public.pem");
    const EC_P384_KEY: &str = include_str!("../../tests/fixtures/ec_p384_private.pem");
    const EC_P384_PUBLIC: &[u8] = include_bytes!("../../tests/fixtures/ec_p384_public.pem");
    const RSA_KEY: &str = include_str!("../../tests/fixtures/rsa_private.pem");
    const RSA_PUBLIC: &[u8] = include_bytes!("../../tests/fixtures/rsa_public.pem");

    fn sample_claims() -> Claims {
        ClaimsBuilder::new("kid-1", "visitor:abc")
            .audience(vec!["gl".to_string(), "site-9".to_string()])
            .build()
    }

    #[test]
    fn test_es256_sign_and_verify() {
        let key = SigningKey::from_pem(EC_P256_KEY, None).unwrap();
        let serializer = JwtSerializer::new(key.algorithm());
        let claims = sample_claims();

        let token = serializer.serialize(&claims, &key, "kid-1").unwrap();
        let decoded = serializer
            .deserialize(&token, &DecodingKey::from_ec_pem(EC_P256_PUBLIC).unwrap())
            .unwrap();

        assert_eq!(decoded.header.kid.as_deref(), Some("kid-1"));
        assert_eq!(decoded.header.alg, Algorithm::ES256);
        assert_eq!(decoded.claims, claims);
    }

    #[test]
    fn test_es384_sign_and_verify() {
        let key = SigningKey::from_pem(EC_P384_KEY, None).unwrap();
        assert_eq!(key.algorithm(), JwtAlgorithm::ES384);

        let serializer = JwtSerializer::new(key.algorithm());
        let claims = sample_claims();
        let token = serializer.serialize(&claims, &key, "kid-384").unwrap();
        let decoded = serializer
            .deserialize(&token, &DecodingKey::from_ec_pem(EC_P384_PUBLIC).unwrap())
            .unwrap();

        assert_eq!(decoded.header.alg, Algorithm::ES384);
        assert_eq!(decoded.header.kid.as_deref(), Some("kid-384"));
        assert_eq!(decoded.claims, claims);
    }

    #[test]
    fn test_ps256_sign_and_verify() {
        let key = SigningKey::from_pem(RSA_KEY, Some(JwtAlgorithm::PS256)).unwrap();
        let serializer = JwtSerializer::new(key.algorithm());
        let claims = sample_claims();

        let token = serializer.serialize(&claims, &key, "kid-1").unwrap();
        let decoded = serializer
            .deserialize(&token, &DecodingKey::from_rsa_pem(RSA_PUBLIC).unwrap())
            .unwrap();

        assert_eq!(decoded.header.alg, Algorithm::PS256);
        assert_eq!(decoded.claims, claims);

        // an RS256 verifier must not accept the PSS signature
        let rs256 = JwtSerializer::new(JwtAlgorithm::RS256)
            .deserialize(&token, &DecodingKey::from_rsa_pem(RSA_PUBLIC).unwrap());
        assert!(rs256.is_err());
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let key = SigningKey::from_pem(EC_P256_KEY, None).unwrap();
        let serializer = JwtSerializer::new(key.algorithm());
        let claims = ClaimsBuilder::new("kid-1", "visitor:abc")
            .audience(vec!["other".to_string()])
            .build();

        let token = serializer.serialize(&claims, &key, "kid-1").unwrap();
        let result =
            serializer.deserialize(&token, &DecodingKey::from_ec_pem(EC_P256_PUBLIC).unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_header_family_must_match_key() {
        let key = SigningKey::from_pem(EC_P256_KEY, None).unwrap();
        let serializer = JwtSerializer::new(JwtAlgorithm::RS256);

        let result = serializer.serialize(&sample_claims(), &key, "kid-1");
        assert!(matches!(result, Err(SigningError::Encoding(_))));
    }

    #[test]
    fn test_signature_does_not_verify_with_other_key() {
        let key = SigningKey::from_pem(EC_P256_KEY, None).unwrap();
        let token = JwtSerializer::new(JwtAlgorithm::ES256)
            .serialize(&sample_claims(), &key, "kid-1")
            .unwrap();

        let result = JwtSerializer::new(JwtAlgorithm::RS256)
            .deserialize(&token, &DecodingKey::from_rsa_pem(RSA_PUBLIC).unwrap());
        assert!(result.is_err());
    }
}

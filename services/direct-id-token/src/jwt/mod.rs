//! Claims, key loading and JWS serialization.

pub mod builder;
pub mod claims;
pub mod serializer;
pub mod signer;

pub use builder::ClaimsBuilder;
pub use claims::{Claims, PLATFORM_AUDIENCE, Role, TOKEN_TTL_SECONDS, VISITOR_SUBJECT_PREFIX};
pub use serializer::JwtSerializer;
pub use signer::{KeyFamily, SigningKey};

//! Password hashing and bearer tokens.
//!
//! Passwords are stored as Argon2id PHC strings. Tokens are HS256 JWTs whose `sub` claim is
//! the user id; nothing is kept server side, so a token stays valid until it expires.

use std::sync::OnceLock;

use argon2::{
	Argon2,
	password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, Result};

pub fn hash_password(password: &str) -> Result<String> {
	let salt = SaltString::generate(&mut OsRng);
	let hash = Argon2::default()
		.hash_password(password.as_bytes(), &salt)
		.map_err(|err| Error::PasswordHash { message: format!("Failed to hash password: {err}.") })?;

	Ok(hash.to_string())
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
	let parsed = PasswordHash::new(hash)
		.map_err(|err| Error::PasswordHash { message: format!("Invalid password hash: {err}.") })?;

	Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Runs a full verification against a throwaway hash so a login for an unknown account costs
/// the same as one with a wrong password. Always `Ok(false)`.
pub fn verify_decoy(password: &str) -> Result<bool> {
	static DECOY: OnceLock<String> = OnceLock::new();

	let decoy = DECOY.get_or_init(|| hash_password("decoy-password").unwrap_or_default());

	if decoy.is_empty() {
		return Err(Error::PasswordHash { message: "Failed to prepare decoy hash.".to_string() });
	}

	verify_password(password, decoy).map(|_| false)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
	pub sub: String,
	pub iat: i64,
	pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
	pub token: String,
	pub expires_at: OffsetDateTime,
}

pub struct TokenIssuer {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
	ttl: Duration,
}
impl TokenIssuer {
	pub fn new(cfg: &stash_config::Auth) -> Self {
		let mut validation = Validation::new(Algorithm::HS256);

		validation.leeway = 0;
		validation.set_required_spec_claims(&["exp", "sub"]);

		Self {
			encoding: EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
			decoding: DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
			validation,
			ttl: Duration::seconds(i64::try_from(cfg.token_ttl_secs).unwrap_or(i64::MAX)),
		}
	}

	pub fn issue(&self, user_id: Uuid) -> Result<IssuedToken> {
		let issued_at = OffsetDateTime::now_utc();
		let expires_at = issued_at.saturating_add(self.ttl);
		let claims = Claims {
			sub: user_id.to_string(),
			iat: issued_at.unix_timestamp(),
			exp: expires_at.unix_timestamp(),
		};
		let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

		Ok(IssuedToken { token, expires_at })
	}

	/// Returns the user id carried by a valid, unexpired token.
	pub fn verify(&self, token: &str) -> Result<Uuid> {
		let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;

		Uuid::parse_str(&data.claims.sub).map_err(|_| Error::InvalidResponse {
			message: "Token subject is not a user id.".to_string(),
		})
	}
}

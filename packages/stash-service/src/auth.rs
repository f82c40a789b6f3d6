//! Registration, login, bearer token resolution, and profile maintenance.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use stash_domain::{FieldError, Violations, validate};
use stash_providers::credentials;
use stash_storage::models::{NewUser, User, UserPatch};

use crate::{Error, Result, StashService, UserView};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
	pub name: Option<String>,
	pub email: Option<String>,
	pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
	pub email: Option<String>,
	pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
	pub name: Option<String>,
	pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
	pub current_password: Option<String>,
	pub new_password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
	pub user: UserView,
	pub token: String,
	#[serde(with = "crate::time_serde")]
	pub expires_at: OffsetDateTime,
}

impl StashService {
	pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession> {
		let mut violations = Violations::new();
		let name = violations.check(validate::name(request.name.as_deref().unwrap_or_default()));
		let email = violations.check(validate::email(request.email.as_deref().unwrap_or_default()));
		let password = request.password.unwrap_or_default();

		violations.check(validate::password("password", &password));
		violations.into_result()?;

		let (Some(name), Some(email)) = (name, email) else {
			return Err(Error::invalid("Validation failed."));
		};

		if self.store.user_by_email(&email).await?.is_some() {
			return Err(Error::Conflict { message: "Email already registered.".to_string() });
		}

		let password_hash = hash(password).await?;
		let user = self.store.insert_user(NewUser { name, email, password_hash }).await?;

		tracing::info!(user_id = %user.user_id, "User registered.");

		self.session(user)
	}

	/// Unknown emails and wrong passwords fail identically.
	pub async fn login(&self, request: LoginRequest) -> Result<AuthSession> {
		let mut violations = Violations::new();
		let email = violations.check(validate::email(request.email.as_deref().unwrap_or_default()));
		let password = request.password.unwrap_or_default();

		if password.is_empty() {
			violations.push(FieldError::new("password", "Password is required."));
		}

		violations.into_result()?;

		let Some(email) = email else {
			return Err(Error::InvalidCredentials);
		};
		let Some(user) = self.store.user_by_email(&email).await? else {
			if let Err(err) = verify_decoy(password).await {
				tracing::error!(error = %err, "Decoy password check failed.");
			}

			return Err(Error::InvalidCredentials);
		};

		if !verify(password, user.password_hash.clone()).await? {
			return Err(Error::InvalidCredentials);
		}

		tracing::info!(user_id = %user.user_id, "User logged in.");

		self.session(user)
	}

	/// Resolves a bearer token to a live user.
	pub async fn authenticate(&self, token: &str) -> Result<User> {
		let user_id = self.tokens.verify(token).map_err(|err| {
			tracing::warn!(error = %err, "Rejected bearer token.");

			Error::Unauthorized { message: "Invalid or expired token.".to_string() }
		})?;

		self.store.user_by_id(user_id).await?.ok_or_else(|| {
			tracing::warn!(user_id = %user_id, "Bearer token names a missing user.");

			Error::Unauthorized { message: "User no longer exists.".to_string() }
		})
	}

	pub async fn profile(&self, user_id: Uuid) -> Result<UserView> {
		let user = self.store.user_by_id(user_id).await?.ok_or_else(|| Error::not_found("User not found."))?;

		Ok(user.into())
	}

	pub async fn update_profile(&self, user_id: Uuid, request: UpdateProfileRequest) -> Result<UserView> {
		let mut violations = Violations::new();
		let patch = UserPatch {
			name: request.name.as_deref().and_then(|raw| violations.check(validate::name(raw))),
			email: request.email.as_deref().and_then(|raw| violations.check(validate::email(raw))),
			password_hash: None,
		};

		violations.into_result()?;

		if patch.is_empty() {
			return Err(Error::invalid("No fields provided for update."));
		}
		if let Some(email) = patch.email.as_deref()
			&& let Some(owner) = self.store.user_by_email(email).await?
			&& owner.user_id != user_id
		{
			return Err(Error::Conflict { message: "Email already registered.".to_string() });
		}

		let user = self
			.store
			.update_user(user_id, patch)
			.await?
			.ok_or_else(|| Error::not_found("User not found."))?;

		tracing::info!(user_id = %user_id, "Profile updated.");

		Ok(user.into())
	}

	pub async fn change_password(&self, user_id: Uuid, request: ChangePasswordRequest) -> Result<()> {
		let mut violations = Violations::new();
		let current = request.current_password.unwrap_or_default();
		let next = request.new_password.unwrap_or_default();

		if current.is_empty() {
			violations.push(FieldError::new("currentPassword", "Current password is required."));
		}

		violations.check(validate::password("newPassword", &next));
		violations.into_result()?;

		let user = self.store.user_by_id(user_id).await?.ok_or_else(|| Error::not_found("User not found."))?;

		if !verify(current, user.password_hash).await? {
			return Err(FieldError::new("currentPassword", "Current password is incorrect.").into());
		}

		let password_hash = hash(next).await?;

		self.store
			.update_user(user_id, UserPatch { password_hash: Some(password_hash), ..Default::default() })
			.await?
			.ok_or_else(|| Error::not_found("User not found."))?;

		tracing::info!(user_id = %user_id, "Password changed.");

		Ok(())
	}

	fn session(&self, user: User) -> Result<AuthSession> {
		let issued = self.tokens.issue(user.user_id)?;

		Ok(AuthSession { user: user.into(), token: issued.token, expires_at: issued.expires_at })
	}
}

// Argon2 is CPU bound; it runs on the blocking pool.
async fn hash(password: String) -> Result<String> {
	let hash = tokio::task::spawn_blocking(move || credentials::hash_password(&password)).await??;

	Ok(hash)
}

async fn verify_decoy(password: String) -> Result<bool> {
	let matches = tokio::task::spawn_blocking(move || credentials::verify_decoy(&password)).await??;

	Ok(matches)
}

async fn verify(password: String, hash: String) -> Result<bool> {
	let matches =
		tokio::task::spawn_blocking(move || credentials::verify_password(&password, &hash)).await??;

	Ok(matches)
}

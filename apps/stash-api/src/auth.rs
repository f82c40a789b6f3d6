//! Bearer token extraction for protected routes.

use axum::{
	extract::FromRequestParts,
	http::{header, request::Parts},
};

use stash_storage::models::User;

use crate::{error::ApiError, state::AppState};

/// The user behind a valid `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
			return Err(ApiError::unauthorized("Access token required."));
		};
		let token = value
			.to_str()
			.ok()
			.and_then(bearer_token)
			.ok_or_else(|| ApiError::unauthorized("Authorization header must be a bearer token."))?;
		let user = state.service.authenticate(token).await?;

		Ok(Self(user))
	}
}

fn bearer_token(header: &str) -> Option<&str> {
	let (scheme, token) = header.trim().split_once(' ')?;
	let token = token.trim();

	if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() { Some(token) } else { None }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bearer_scheme_is_case_insensitive() {
		assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
		assert_eq!(bearer_token("bearer   abc "), Some("abc"));
		assert_eq!(bearer_token("Basic abc"), None);
		assert_eq!(bearer_token("Bearer "), None);
		assert_eq!(bearer_token("abc"), None);
	}
}

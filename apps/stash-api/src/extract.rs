//! `Json`, `Query`, and `Path` wrappers whose rejections use the response envelope.

use axum::{
	Json,
	extract::{FromRequest, FromRequestParts, Path, Query, Request},
	http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ApiError;

pub struct Body<T>(pub T);

impl<S, T> FromRequest<S> for Body<T>
where
	S: Send + Sync,
	T: DeserializeOwned,
{
	type Rejection = ApiError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let Json(value) = Json::<T>::from_request(req, state).await?;

		Ok(Self(value))
	}
}

pub struct Params<T>(pub T);

impl<S, T> FromRequestParts<S> for Params<T>
where
	S: Send + Sync,
	T: DeserializeOwned,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let Query(value) = Query::<T>::from_request_parts(parts, state).await?;

		Ok(Self(value))
	}
}

/// A record id taken from the `{id}` path segment.
pub struct RecordId(pub Uuid);

impl<S> FromRequestParts<S> for RecordId
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let Path(raw) = Path::<String>::from_request_parts(parts, state).await?;
		let id = Uuid::parse_str(raw.trim())
			.map_err(|_| ApiError::bad_request("Invalid record id."))?;

		Ok(Self(id))
	}
}

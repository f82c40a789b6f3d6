//! RFC 3339 rendering for timestamps in response bodies.

use serde::Serializer;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&value.format(&Rfc3339).map_err(serde::ser::Error::custom)?)
}

//! Subject identifier surfaced by the remote API.

// crates.io
use uuid::Uuid;
// self
use crate::_prelude::*;

/// GUID-shaped identifier of the signed-in user as reported by the remote API.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);
impl UserId {
	/// Wraps an already parsed GUID.
	pub fn new(value: Uuid) -> Self {
		Self(value)
	}

	/// Returns the underlying GUID.
	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}
impl Debug for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "UserId({})", self.0)
	}
}
impl Display for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0.hyphenated(), f)
	}
}
impl FromStr for UserId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Uuid::parse_str(s).map(Self)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn user_id_round_trips_as_hyphenated_lowercase() {
		let id: UserId = serde_json::from_str("\"3FA85F64-5717-4562-B3FC-2C963F66AFA6\"")
			.expect("Uppercase GUIDs should deserialize.");

		assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
		assert_eq!(
			serde_json::to_string(&id).expect("UserId should serialize."),
			"\"3fa85f64-5717-4562-b3fc-2c963f66afa6\""
		);
		assert!(UserId::from_str("not-a-guid").is_err());
	}
}

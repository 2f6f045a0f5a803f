//! Serialized forms of a cached [`Credential`].
//!
//! Server-side entries hold the JSON document directly. Cookie slots hold the same document as
//! URL-safe base64 without padding, which keeps quotes, commas, and semicolons out of the
//! cookie value.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, auth::Credential, cache::CacheError, obs};

/// Serializes a credential into its JSON cache entry.
pub fn encode_entry(credential: &Credential) -> Result<String, CacheError> {
	serde_json::to_string(credential)
		.map_err(|e| CacheError::Serialization { message: e.to_string() })
}

/// Parses a JSON cache entry, treating any failure as a miss.
pub fn decode_entry(raw: &str) -> Option<Credential> {
	let mut de = serde_json::Deserializer::from_str(raw);

	match serde_path_to_error::deserialize::<_, Credential>(&mut de) {
		Ok(credential) => Some(credential),
		Err(_e) => {
			obs::event!(debug, path = %_e.path(), "Discarding unreadable cache entry.");

			None
		},
	}
}

/// Serializes a credential into a cookie-safe value.
pub fn encode_cookie_value(credential: &Credential) -> Result<String, CacheError> {
	encode_entry(credential).map(|json| URL_SAFE_NO_PAD.encode(json))
}

/// Parses a cookie value produced by [`encode_cookie_value`], treating any failure as a miss.
pub fn decode_cookie_value(raw: &str) -> Option<Credential> {
	let Ok(bytes) = URL_SAFE_NO_PAD.decode(raw.trim()) else {
		obs::event!(debug, "Discarding cookie entry with invalid encoding.");

		return None;
	};
	let Ok(json) = String::from_utf8(bytes) else {
		obs::event!(debug, "Discarding cookie entry that is not UTF-8.");

		return None;
	};

	decode_entry(&json)
}

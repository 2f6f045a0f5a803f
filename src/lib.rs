//! Session-scoped bearer credential broker: cache-first token reuse, silent-then-interactive
//! acquisition, and cookie-backed persistence for calling protected data APIs.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

#[cfg(feature = "reqwest")] pub mod api;
pub mod auth;
pub mod authority;
pub mod cache;
pub mod descriptor;
pub mod error;
pub mod manager;
pub mod obs;
#[cfg(feature = "server")] pub mod server;
#[cfg(feature = "reqwest")] pub mod service;
#[cfg(feature = "tabular")] pub mod tabular;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)]
use {color_eyre as _, httpmock as _, tower as _, tracing_subscriber as _};

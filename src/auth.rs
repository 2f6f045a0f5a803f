//! Auth-domain identifiers, scope sets, and credential models.

pub mod credential;
pub mod id;
pub mod scope;
pub mod secret;
pub mod subject;

pub use credential::*;
pub use id::*;
pub use scope::*;
pub use secret::*;
pub use subject::*;

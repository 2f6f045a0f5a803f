//! Deterministic [`AuthorizationCapability`] double driven by queued outcomes.

// std
use std::{
	collections::VecDeque,
	sync::atomic::{AtomicUsize, Ordering},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, PrincipalHint, ScopeSet},
	authority::{AuthorizationCapability, AuthorizationError, AuthorizationFuture},
};

type Outcome = Result<Credential, AuthorizationError>;

/// Scripted authority that replays queued outcomes and counts every call.
///
/// When the silent queue is empty the authority answers with
/// [`AuthorizationError::ConsentRequired`]; when the interactive queue is empty it answers with
/// [`AuthorizationError::Rejected`].
#[derive(Debug, Default)]
pub struct ScriptedAuthority {
	silent: Mutex<VecDeque<Outcome>>,
	interactive: Mutex<VecDeque<Outcome>>,
	silent_calls: AtomicUsize,
	interactive_calls: AtomicUsize,
	seen_principals: Mutex<Vec<Vec<PrincipalHint>>>,
	seen_scopes: Mutex<Vec<ScopeSet>>,
	delay: Option<StdDuration>,
}
impl ScriptedAuthority {
	/// Creates an authority with empty queues.
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues an outcome for the next silent call.
	pub fn with_silent(self, outcome: Outcome) -> Self {
		self.push_silent(outcome);

		self
	}

	/// Queues an outcome for the next interactive call.
	pub fn with_interactive(self, outcome: Outcome) -> Self {
		self.push_interactive(outcome);

		self
	}

	/// Delays every answer, which lets tests observe concurrent or slow acquisitions.
	pub fn with_delay(mut self, delay: StdDuration) -> Self {
		self.delay = Some(delay);

		self
	}

	/// Queues an outcome for a later silent call through a shared handle.
	pub fn push_silent(&self, outcome: Outcome) {
		self.silent.lock().push_back(outcome);
	}

	/// Queues an outcome for a later interactive call through a shared handle.
	pub fn push_interactive(&self, outcome: Outcome) {
		self.interactive.lock().push_back(outcome);
	}

	/// Number of silent calls observed so far.
	pub fn silent_calls(&self) -> usize {
		self.silent_calls.load(Ordering::SeqCst)
	}

	/// Number of interactive calls observed so far.
	pub fn interactive_calls(&self) -> usize {
		self.interactive_calls.load(Ordering::SeqCst)
	}

	/// Total number of capability calls observed so far.
	pub fn total_calls(&self) -> usize {
		self.silent_calls() + self.interactive_calls()
	}

	/// Principal hints passed to each silent call, in call order.
	pub fn seen_principals(&self) -> Vec<Vec<PrincipalHint>> {
		self.seen_principals.lock().clone()
	}

	/// Scope sets passed to each call, in call order.
	pub fn seen_scopes(&self) -> Vec<ScopeSet> {
		self.seen_scopes.lock().clone()
	}

	async fn pause(&self) {
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
	}
}
impl AuthorizationCapability for ScriptedAuthority {
	fn try_silent<'a>(
		&'a self,
		known_principals: &'a [PrincipalHint],
		scope: &'a ScopeSet,
	) -> AuthorizationFuture<'a> {
		Box::pin(async move {
			self.silent_calls.fetch_add(1, Ordering::SeqCst);
			self.seen_principals.lock().push(known_principals.to_vec());
			self.seen_scopes.lock().push(scope.clone());
			self.pause().await;

			let next = self.silent.lock().pop_front();

			next.unwrap_or_else(|| {
				Err(AuthorizationError::consent_required("no scripted grant is available"))
			})
		})
	}

	fn interactive<'a>(&'a self, scope: &'a ScopeSet) -> AuthorizationFuture<'a> {
		Box::pin(async move {
			self.interactive_calls.fetch_add(1, Ordering::SeqCst);
			self.seen_scopes.lock().push(scope.clone());
			self.pause().await;

			let next = self.interactive.lock().pop_front();

			next.unwrap_or_else(|| {
				Err(AuthorizationError::rejected("no scripted consent is available"))
			})
		})
	}
}

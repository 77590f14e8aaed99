//! # Identity token store
//!
//! Holds the bearer credential that proves who the client is. There is at most
//! one token per client instance; no token means the client is anonymous.
//!
//! Implementations:
//!
//! | Type | Lifetime |
//! |------|----------|
//! | [`crate::MemoryTokenStore`] | The running process. Used by tests and embedders that manage persistence themselves. |
//! | [`crate::FileTokenStore`] | Survives restarts until cleared; scoped to one file under the platform data directory. |
//!
//! Every method is synchronous and infallible from the caller's point of view:
//! outgoing requests read the token inline, and persistence failures are
//! logged rather than returned.

/// Holder of the current bearer token.
pub trait TokenStore: Send + Sync {
    /// The current token, if any.
    fn get(&self) -> Option<String>;

    /// Store `token`, replacing any previous one.
    fn set(&self, token: &str);

    /// Remove the token unconditionally.
    fn clear(&self);

    fn is_present(&self) -> bool {
        self.get().is_some()
    }
}

impl<T: TokenStore + ?Sized> TokenStore for std::sync::Arc<T> {
    fn get(&self) -> Option<String> {
        (**self).get()
    }

    fn set(&self, token: &str) {
        (**self).set(token)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

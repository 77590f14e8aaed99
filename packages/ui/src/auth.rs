//! Login and registration flows.
//!
//! Each call ends in exactly one notification. On failure nothing else
//! changes: no token is written and the session keeps its state.

use api::{ApiError, Backend, Credentials, RegisterProfile, UserInfo};

use crate::navigation::Route;
use crate::notifications::NETWORK_FAILURE;
use crate::session::SessionManager;

impl<B: Backend + Clone> SessionManager<B> {
    /// Exchange credentials for a token and enter the authenticated session.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserInfo, ApiError> {
        if let Err(reason) = credentials.validate() {
            return Err(self.fail(ApiError::Validation(reason)));
        }

        let response = match self.backend().login(credentials).await {
            Ok(response) => response,
            Err(err) => return Err(self.fail(err)),
        };

        // the response itself is the verification round-trip
        let generation = self.begin_login();
        self.tokens().set(&response.token);
        let user = response.user;
        self.complete_login(generation, user.clone());

        tracing::info!(user = %user.id, "logged in");
        self.notifications()
            .success(&format!("Logged in {}", user.display_name()));
        self.navigator().replace(Route::Home);
        Ok(user)
    }

    /// Create an account. Never authenticates; sends the user to the login
    /// view instead.
    pub async fn register(&self, profile: &RegisterProfile) -> Result<(), ApiError> {
        if let Err(reason) = profile.validate() {
            return Err(self.fail(ApiError::Validation(reason)));
        }

        if let Err(err) = self.backend().register(profile).await {
            return Err(self.fail(err));
        }

        tracing::info!(email = %profile.email, "registered");
        self.notifications()
            .success("User registered successfully! Login into your account!");
        self.navigator().replace(Route::Login);
        Ok(())
    }

    fn fail(&self, err: ApiError) -> ApiError {
        tracing::debug!(kind = err.kind(), reason = %err, "auth call failed");
        match &err {
            ApiError::Network(_) => self.notifications().error(NETWORK_FAILURE),
            other => self.notifications().error(other.reason()),
        }
        err
    }
}

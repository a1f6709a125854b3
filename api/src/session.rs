//! Session/identity store. Created with [`Session::init`], made ready by
//! [`Session::hydrate`], then handed to whatever needs the signed-in user.

use crate::client::{ApiError, ApiResult, FundApi};
use crate::envelope::AuthPayload;
use crate::storage::SessionStorage;
use crate::{Identity, Role};
use log::{info, warn};

pub const LOGIN_FALLBACK: &str = "Login failed. Please try again.";
pub const REGISTER_FALLBACK: &str = "Registration failed. Please try again.";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated(Identity),
}

#[derive(Debug, Clone)]
pub struct Session {
    api: FundApi,
    state: AuthState,
    is_admin: bool,
    ready: bool,
}

impl Session {
    pub fn init(api: FundApi) -> Self {
        Self {
            api,
            state: AuthState::Unauthenticated,
            is_admin: false,
            ready: false,
        }
    }

    /// Restore the identity from durable storage. Any failure leaves the
    /// session unauthenticated; nothing is raised to the caller.
    pub fn hydrate(&mut self) -> &mut Self {
        self.state = AuthState::Unauthenticated;
        self.is_admin = false;

        match self.storage().load() {
            Ok(stored) => {
                if let Some(identity) = stored.identity {
                    self.is_admin = stored.is_admin || identity.role == Role::Admin;
                    self.state = AuthState::Authenticated(identity);
                }
            }
            Err(e) => warn!("ignoring stored session: {e}"),
        }

        self.ready = true;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            AuthState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.is_admin
    }

    pub fn api(&self) -> &FundApi {
        &self.api
    }

    fn storage(&self) -> &SessionStorage {
        self.api.storage()
    }

    pub fn begin_authenticating(&mut self) {
        self.state = AuthState::Authenticating;
    }

    /// Adopt a successful login/register response. Admin status is the
    /// caller's flag or the identity's role, whichever says admin.
    pub fn establish(&mut self, payload: AuthPayload, admin_flag: bool) -> Identity {
        let is_admin = admin_flag || payload.identity.role == Role::Admin;
        let identity = payload.identity;

        if let Err(e) = self.storage().update(|s| {
            s.identity = Some(identity.clone());
            s.is_admin = is_admin;
            s.token = payload.token.clone();
        }) {
            warn!("could not persist session: {e}");
        }
        self.api.set_default_token(payload.token.as_deref());

        info!("signed in as {} ({})", identity.email, if is_admin { "admin" } else { "player" });
        self.is_admin = is_admin;
        self.state = AuthState::Authenticated(identity.clone());
        identity
    }

    /// Return to unauthenticated after a failed attempt; yields the message
    /// to show the user.
    pub fn fail(&mut self, err: &ApiError, fallback: &str) -> String {
        self.state = AuthState::Unauthenticated;
        self.is_admin = false;
        match err {
            ApiError::Parsing(..) => fallback.to_owned(),
            other => other.message(),
        }
    }

    /// Apply the outcome of a login or registration call made with
    /// [`FundApi::login`] / [`FundApi::register`].
    pub fn finish_sign_in(
        &mut self,
        result: ApiResult<AuthPayload>,
        admin_flag: bool,
        registering: bool,
    ) -> Result<Identity, String> {
        match result {
            Ok(payload) => Ok(self.establish(payload, admin_flag)),
            Err(e) => {
                let fallback = if registering { REGISTER_FALLBACK } else { LOGIN_FALLBACK };
                Err(self.fail(&e, fallback))
            }
        }
    }

    /// Clear identity in memory and on disk. Safe to call repeatedly.
    pub fn logout(&mut self) {
        self.state = AuthState::Unauthenticated;
        self.is_admin = false;
        self.api.set_default_token(None);
        if let Err(e) = self.storage().clear_auth() {
            warn!("could not clear stored session: {e}");
        }
    }

    /// The gateway already wiped storage on a 401; drop the in-memory copy.
    pub fn on_unauthorized(&mut self) {
        self.state = AuthState::Unauthenticated;
        self.is_admin = false;
    }

    pub fn remembered_tab(&self) -> Option<String> {
        self.storage().load().ok().and_then(|s| s.active_tab)
    }

    pub fn remember_tab(&self, tab: &str) {
        if let Err(e) = self.storage().update(|s| s.active_tab = Some(tab.to_owned())) {
            warn!("could not remember tab {tab}: {e}");
        }
    }
}

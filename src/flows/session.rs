//! Top-level session view: routing, the route guard and the login form.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ViewContext;
use crate::domain::{AuthState, Identity};
use crate::error::AppError;
use crate::identity::{AuthSubscription, FederatedFlow};

/// Client-side routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// `/login`, also served at `/`.
    #[default]
    Login,
    /// `/dashboard`: browse, search, register, review.
    Dashboard,
    /// `/create-event`.
    CreateEvent,
    /// `/my-events`: the organiser dashboard.
    MyEvents,
}

impl Route {
    /// Resolves a path. `/` is the login page; unknown paths are `None`.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        match path {
            "/" | "/login" => Some(Self::Login),
            "/dashboard" => Some(Self::Dashboard),
            "/create-event" => Some(Self::CreateEvent),
            "/my-events" => Some(Self::MyEvents),
            _ => None,
        }
    }

    /// Canonical path.
    #[must_use]
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::CreateEvent => "/create-event",
            Self::MyEvents => "/my-events",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Where a request for `requested` actually lands.
///
/// Signed-out sessions always land on [`Route::Login`]. Signed-in
/// sessions go where they asked, including the login page.
#[must_use]
pub fn guard(requested: Route, state: &AuthState) -> Route {
    if state.is_signed_in() {
        requested
    } else {
        Route::Login
    }
}

/// Which half of the login form is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Existing account.
    #[default]
    SignIn,
    /// New account.
    SignUp,
}

impl AuthMode {
    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::SignIn => Self::SignUp,
            Self::SignUp => Self::SignIn,
        }
    }

    /// Form heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::SignIn => "Login",
            Self::SignUp => "Sign Up",
        }
    }
}

/// The email/password form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Current mode.
    pub mode: AuthMode,
    /// Email field.
    pub email: String,
    /// Password field.
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("mode", &self.mode)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginForm {
    /// Switches between sign-in and sign-up, keeping the typed fields.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }
}

/// Owns the current route and redirects to login whenever the session's
/// auth-state listener reports no user.
#[derive(Debug)]
pub struct SessionController {
    ctx: ViewContext,
    route: Arc<Mutex<Route>>,
    subscription: Option<AuthSubscription>,
}

impl SessionController {
    /// Creates a controller on the login page. Call
    /// [`SessionController::start`] to begin listening.
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            route: Arc::new(Mutex::new(Route::Login)),
            subscription: None,
        }
    }

    /// Subscribes to the session's auth state.
    ///
    /// The listener fires once immediately; every "no user" notification
    /// moves the route to [`Route::Login`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] if the session is unknown.
    pub async fn start(&mut self) -> Result<(), AppError> {
        let route = Arc::clone(&self.route);
        let subscription = self
            .ctx
            .gateway()
            .on_auth_state_change(self.ctx.session(), move |identity| {
                if identity.is_none() {
                    set_route(&route, Route::Login);
                }
            })
            .await?;
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Stops listening.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    /// Whether the auth-state listener is registered.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(AuthSubscription::is_active)
    }

    /// The route currently shown.
    #[must_use]
    pub fn current_route(&self) -> Route {
        *self.route.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Navigates to `requested` through the route guard and returns where
    /// the session landed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] if the session is unknown.
    pub async fn navigate(&self, requested: Route) -> Result<Route, AppError> {
        let state = self.ctx.gateway().auth_state(self.ctx.session()).await?;
        let landed = guard(requested, &state);
        set_route(&self.route, landed);
        Ok(landed)
    }

    /// Submits the login form in its current mode and moves to the
    /// dashboard on success. On failure the route is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the provider's rejection as [`AppError::Identity`].
    pub async fn submit_login(&self, form: &LoginForm) -> Result<Identity, AppError> {
        let gateway = self.ctx.gateway();
        let session = self.ctx.session();
        let identity = match form.mode {
            AuthMode::SignIn => gateway.sign_in(session, &form.email, &form.password).await,
            AuthMode::SignUp => gateway.sign_up(session, &form.email, &form.password).await,
        }?;
        set_route(&self.route, Route::Dashboard);
        Ok(identity)
    }

    /// Runs a federated sign-in and moves to the dashboard on success.
    ///
    /// # Errors
    ///
    /// Returns the cancellation or the provider's rejection.
    pub async fn sign_in_federated(&self, flow: &dyn FederatedFlow) -> Result<Identity, AppError> {
        let identity = self
            .ctx
            .gateway()
            .sign_in_with_federated_provider(self.ctx.session(), flow)
            .await?;
        set_route(&self.route, Route::Dashboard);
        Ok(identity)
    }

    /// Signs the session out and returns to the login page.
    ///
    /// # Errors
    ///
    /// Returns the gateway's failure; the route is unchanged then.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.ctx.gateway().sign_out(self.ctx.session()).await?;
        set_route(&self.route, Route::Login);
        Ok(())
    }
}

fn set_route(route: &Mutex<Route>, next: Route) {
    *route.lock().unwrap_or_else(PoisonError::into_inner) = next;
}

//! # Authenticators and Server Directory
//!
//! - [`Authenticator`] is the closed set of verification strategies, chosen
//!   once from configuration.
//! - [`ServerAuth`] binds one XMPP server to its application string and one
//!   or more authenticators; a user is accepted if any of them accepts.
//! - [`AuthService`] maps XMPP server names to their [`ServerAuth`] and
//!   performs the chat-name decoding shared by the bridge and the API.

use std::collections::BTreeMap;

use tracing::Span;
use xidauth_core::{decode_chat_name, AuthState, Decision};

use crate::delegation::DelegationVerifier;
use crate::error::VerifyError;
use crate::gsp::GspAuthenticator;
use crate::metrics::AuthMetrics;

/// A verification strategy.
#[derive(Debug)]
pub enum Authenticator {
    /// Challenge/response through the xid game-state processor.
    Gsp(GspAuthenticator),
    /// Typed-data signature checked against the delegation contract.
    Delegation(DelegationVerifier),
}

impl Authenticator {
    /// Configuration key of this strategy.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Gsp(_) => "xid-gsp",
            Self::Delegation(_) => "delegation-contract",
        }
    }

    /// Whether `name` is a known user for `app`.
    pub fn is_user(&self, name: &str, app: &str) -> Result<bool, VerifyError> {
        match self {
            Self::Gsp(gsp) => gsp.is_user(name, app),
            Self::Delegation(d) => Ok(d.is_registered(name)?),
        }
    }

    /// Verify `password` for `name` within `app`.
    pub fn authenticate(&self, name: &str, app: &str, password: &str) -> Result<Decision, VerifyError> {
        match self {
            Self::Gsp(gsp) => gsp.authenticate(name, app, password),
            Self::Delegation(d) => Ok(d.verify_password(name, app, password)?),
        }
    }
}

/// Authentication for one XMPP server.
#[derive(Debug)]
pub struct ServerAuth {
    app: String,
    authenticators: Vec<Authenticator>,
}

impl ServerAuth {
    pub fn new(app: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            authenticators: Vec::new(),
        }
    }

    pub fn with(mut self, auth: Authenticator) -> Self {
        self.authenticators.push(auth);
        self
    }

    pub fn add(&mut self, auth: Authenticator) {
        self.authenticators.push(auth);
    }

    /// The application string of this server.
    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn authenticators(&self) -> &[Authenticator] {
        &self.authenticators
    }

    pub fn has_authenticators(&self) -> bool {
        !self.authenticators.is_empty()
    }

    /// True if any authenticator knows `name`.
    pub fn is_user(&self, name: &str) -> Result<bool, VerifyError> {
        for auth in &self.authenticators {
            if auth.is_user(name, &self.app)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The first valid decision, or else the last denial.
    ///
    /// Errors from any authenticator are returned immediately.
    pub fn authenticate(&self, name: &str, password: &str) -> Result<Decision, VerifyError> {
        let mut last = Decision::bare(AuthState::InvalidData);
        for auth in &self.authenticators {
            let decision = auth.authenticate(name, &self.app, password)?;
            if decision.valid {
                return Ok(decision);
            }
            last = decision;
        }
        Ok(last)
    }
}

/// Directory of configured XMPP servers.
#[derive(Debug)]
pub struct AuthService {
    servers: BTreeMap<String, ServerAuth>,
    metrics: Option<AuthMetrics>,
    span: Span,
}

impl AuthService {
    pub fn new(span: Span) -> Self {
        Self {
            servers: BTreeMap::new(),
            metrics: None,
            span,
        }
    }

    /// Record decisions and failures into `metrics`.
    pub fn with_metrics(mut self, metrics: AuthMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn metrics(&self) -> Option<&AuthMetrics> {
        self.metrics.as_ref()
    }

    pub fn insert(&mut self, server: impl Into<String>, auth: ServerAuth) {
        self.servers.insert(server.into(), auth);
    }

    pub fn server(&self, server: &str) -> Option<&ServerAuth> {
        self.servers.get(server)
    }

    /// Configured servers in name order.
    pub fn servers(&self) -> impl Iterator<Item = (&str, &ServerAuth)> {
        self.servers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Log the configured servers and their applications.
    pub fn log_servers(&self) {
        for (name, srv) in &self.servers {
            let kinds: Vec<&str> = srv.authenticators.iter().map(Authenticator::kind).collect();
            tracing::info!(
                parent: &self.span,
                server = %name,
                app = %srv.app,
                authenticators = ?kinds,
                "serving XMPP server"
            );
        }
    }

    /// Whether `chat_name` is a known user on `server`.
    ///
    /// Invalid chat names are not users. Unknown servers are an error so
    /// the caller can choose between denying and reporting.
    pub fn is_user(&self, chat_name: &str, server: &str) -> Result<bool, VerifyError> {
        let srv = self.lookup(server)?;
        let Some(name) = self.decode(chat_name) else {
            return Ok(false);
        };
        srv.is_user(&name).map_err(|e| self.record_error(e))
    }

    /// Verify `password` for `chat_name` on `server`.
    ///
    /// Invalid chat names are `invalid-data`.
    pub fn authenticate(
        &self,
        chat_name: &str,
        server: &str,
        password: &str,
    ) -> Result<Decision, VerifyError> {
        let srv = self.lookup(server)?;
        let decision = match self.decode(chat_name) {
            Some(name) => srv
                .authenticate(&name, password)
                .map_err(|e| self.record_error(e))?,
            None => Decision::bare(AuthState::InvalidData),
        };

        if let Some(m) = &self.metrics {
            m.record_decision(decision.state);
        }
        tracing::debug!(
            parent: &self.span,
            chat_name,
            server,
            state = %decision.state,
            "authentication result"
        );
        Ok(decision)
    }

    fn lookup(&self, server: &str) -> Result<&ServerAuth, VerifyError> {
        self.servers.get(server).ok_or_else(|| {
            tracing::warn!(parent: &self.span, server, "server is not configured for xidauth");
            self.record_error(VerifyError::UnknownServer(server.to_string()))
        })
    }

    fn decode(&self, chat_name: &str) -> Option<String> {
        match decode_chat_name(chat_name) {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::warn!(parent: &self.span, chat_name, error = %e, "invalid XMPP name");
                None
            }
        }
    }

    fn record_error(&self, err: VerifyError) -> VerifyError {
        if let Some(m) = &self.metrics {
            m.record_error(&err);
        }
        err
    }
}

//! Shared-credential authentication
//!
//! One credential pair, one active session at a time. The configuration is
//! an explicitly constructed, immutable value handed to [`AuthGate`]; the
//! only mutable piece is the current session token.

use std::sync::RwLock;

use uuid::Uuid;

/// Immutable auth configuration, sourced from the environment at startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    /// Shared secret; also accepted directly as a header credential for
    /// non-interactive clients.
    pub secret: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Checks logins and request credentials against the configured pair.
pub struct AuthGate {
    config: AuthConfig,
    session: RwLock<Option<String>>,
}

impl AuthGate {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            session: RwLock::new(None),
        }
    }

    /// Verify the credential pair and mint a fresh session token. A new
    /// login replaces any previous session.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if username != self.config.username || password != self.config.password {
            return Err(AuthError::InvalidCredentials);
        }
        let token = Uuid::new_v4().simple().to_string();
        *self.session.write().expect("auth session lock poisoned") = Some(token.clone());
        Ok(token)
    }

    /// Drop the active session, if any.
    pub fn logout(&self) {
        *self.session.write().expect("auth session lock poisoned") = None;
    }

    /// Accepts either `Bearer <session token>` (or the bare token, as a
    /// cookie carries it) or the raw shared secret.
    pub fn authorize(&self, credential: Option<&str>) -> bool {
        let Some(credential) = credential else {
            return false;
        };
        if credential == self.config.secret {
            return true;
        }
        let token = credential.strip_prefix("Bearer ").unwrap_or(credential);
        self.session
            .read()
            .expect("auth session lock poisoned")
            .as_deref()
            .is_some_and(|session| session == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AuthGate {
        AuthGate::new(AuthConfig {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
            secret: "s3cret".to_string(),
        })
    }

    #[test]
    fn login_issues_a_usable_token() {
        let gate = gate();
        let token = gate.login("admin", "hunter2").unwrap();
        assert!(gate.authorize(Some(&format!("Bearer {token}"))));
        assert!(gate.authorize(Some(&token)));
    }

    #[test]
    fn wrong_pair_is_rejected() {
        let gate = gate();
        assert!(matches!(
            gate.login("admin", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            gate.login("root", "hunter2"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn shared_secret_passes_without_a_session() {
        let gate = gate();
        assert!(gate.authorize(Some("s3cret")));
        assert!(!gate.authorize(Some("Bearer s0mething")));
        assert!(!gate.authorize(None));
    }

    #[test]
    fn logout_invalidates_the_session() {
        let gate = gate();
        let token = gate.login("admin", "hunter2").unwrap();
        gate.logout();
        assert!(!gate.authorize(Some(&format!("Bearer {token}"))));
    }

    #[test]
    fn relogin_replaces_the_previous_token() {
        let gate = gate();
        let first = gate.login("admin", "hunter2").unwrap();
        let second = gate.login("admin", "hunter2").unwrap();
        assert!(!gate.authorize(Some(&first)));
        assert!(gate.authorize(Some(&second)));
    }
}

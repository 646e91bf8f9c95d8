//! Administrator session flag.
//!
//! Two states, `LoggedOut` initially. Only a successful `login` moves to
//! `LoggedIn` and only `logout` moves back. Credentials are plain text and
//! compared exactly; there is no lockout or expiry.

use serde::Serialize;

use crate::types::Credentials;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn,
}

#[derive(Debug, Default)]
pub struct AuthGate {
    state: SessionState,
}

impl AuthGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == SessionState::LoggedIn
    }

    /// Compare against the stored pair. A mismatch leaves the state alone.
    ///
    /// Empty input is rejected before comparing, so blank stored credentials
    /// can never be matched.
    pub fn login(&mut self, stored: &Credentials, username: &str, password: &str) -> bool {
        if username.is_empty() || password.is_empty() {
            log::debug!("Login rejected: username and password are both required");
            return false;
        }
        if stored.username == username && stored.password == password {
            self.state = SessionState::LoggedIn;
            log::info!("Administrator logged in");
            true
        } else {
            log::warn!("Failed administrator login for '{}'", username);
            false
        }
    }

    pub fn logout(&mut self) {
        if self.is_logged_in() {
            log::info!("Administrator logged out");
        }
        self.state = SessionState::LoggedOut;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::default_settings;

    #[test]
    fn test_starts_logged_out() {
        assert_eq!(AuthGate::new().state(), SessionState::LoggedOut);
    }

    #[test]
    fn test_default_credentials_log_in() {
        let settings = default_settings();
        let mut gate = AuthGate::new();
        assert!(gate.login(&settings.auth, "admin", "1234admin"));
        assert_eq!(gate.state(), SessionState::LoggedIn);
    }

    #[test]
    fn test_wrong_pairs_stay_logged_out() {
        let settings = default_settings();
        let mut gate = AuthGate::new();
        for (user, pass) in [
            ("admin", "1234"),
            ("Admin", "1234admin"),
            ("admin ", "1234admin"),
            ("root", "1234admin"),
            ("", ""),
        ] {
            assert!(!gate.login(&settings.auth, user, pass));
            assert_eq!(gate.state(), SessionState::LoggedOut);
        }
    }

    #[test]
    fn test_blank_stored_credentials_never_match() {
        let stored = Credentials {
            username: String::new(),
            password: String::new(),
        };
        let mut gate = AuthGate::new();
        assert!(!gate.login(&stored, "", ""));
    }

    #[test]
    fn test_failed_login_keeps_existing_session() {
        let settings = default_settings();
        let mut gate = AuthGate::new();
        gate.login(&settings.auth, "admin", "1234admin");
        assert!(!gate.login(&settings.auth, "admin", "nope"));
        assert!(gate.is_logged_in());
    }

    #[test]
    fn test_logout_is_unconditional() {
        let settings = default_settings();
        let mut gate = AuthGate::new();
        gate.logout();
        assert!(!gate.is_logged_in());

        gate.login(&settings.auth, "admin", "1234admin");
        gate.logout();
        assert_eq!(gate.state(), SessionState::LoggedOut);
    }
}

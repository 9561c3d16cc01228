//! Signed-in user session

use crate::types::User;

/// Session of the current user; lives only as long as the app process
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    user: Option<User>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
    }

    pub fn clear_user(&mut self) {
        self.user = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::default_user;

    #[test]
    fn test_set_and_clear() {
        let mut session = SessionState::new();
        assert!(!session.is_authenticated());

        session.set_user(Some(default_user()));
        assert_eq!(session.user().map(|u| u.name.as_str()), Some("NTP"));

        session.clear_user();
        assert!(session.user().is_none());
    }
}

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

/// Identity handed over by the external auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }
}

/// The currently signed-in user, observable for changes.
pub struct Session {
    tx: watch::Sender<Option<User>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    pub fn current_uid(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|u| u.uid.clone())
    }

    /// Replaces the active user. Subscribers are only notified when the
    /// uid actually changes.
    pub fn sign_in(&self, user: User) {
        let uid = user.uid.clone();
        let changed = self.tx.send_if_modified(|current| {
            let changed = current.as_ref().map(|u| u.uid.as_str()) != Some(uid.as_str());
            *current = Some(user);
            changed
        });
        if changed {
            info!("User {} signed in", uid);
        }
    }

    pub fn sign_out(&self) {
        let previous = self.tx.send_replace(None);
        if let Some(user) = previous {
            info!("User {} signed out", user.uid);
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let session = Session::new();
        assert!(session.current().is_none());

        session.sign_in(User::new("u1"));
        assert_eq!(session.current_uid().as_deref(), Some("u1"));

        session.sign_out();
        assert!(session.current_uid().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_uid_changes_only() {
        let session = Session::new();
        let mut rx = session.subscribe();

        session.sign_in(User::new("u1"));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        // same uid with a new display name is not an identity change
        let mut renamed = User::new("u1");
        renamed.display_name = Some("Ada".to_string());
        session.sign_in(renamed);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(session.current().unwrap().display_name.as_deref(), Some("Ada"));

        session.sign_in(User::new("u2"));
        assert!(rx.has_changed().unwrap());
    }
}

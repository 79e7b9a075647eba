//! The user on whose behalf a request runs

/// Current user and roles
pub trait Session: Send + Sync {
    /// User name
    fn user_name(&self) -> &str;

    /// Roles held by the user
    fn roles(&self) -> &[String];

    /// Whether the user has authenticated
    fn is_authenticated(&self) -> bool {
        !self.user_name().is_empty()
    }

    /// Whether the user holds a role
    fn is_in_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r == role)
    }
}

/// Session with a fixed user and role list
#[derive(Debug, Clone, Default)]
pub struct SimpleSession {
    user: String,
    roles: Vec<String>,
}

impl SimpleSession {
    /// Session for a user
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            roles: Vec::new(),
        }
    }

    /// Unauthenticated session
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Add a role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }
}

impl Session for SimpleSession {
    fn user_name(&self) -> &str {
        &self.user
    }

    fn roles(&self) -> &[String] {
        &self.roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_session() {
        let session = SimpleSession::new("sven").with_role("Clerk");
        assert!(session.is_authenticated());
        assert!(session.is_in_role("Clerk"));
        assert!(!session.is_in_role("Manager"));
        assert!(!SimpleSession::anonymous().is_authenticated());
    }
}

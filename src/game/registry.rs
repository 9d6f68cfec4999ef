use std::collections::HashMap;
use serde::Deserialize;
use uuid::Uuid;

use super::error::Rejection;

/// What happens when a name is requested that another connection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamePolicy {
    /// Refuse the second registration.
    #[default]
    Reject,
    /// The newer connection silently takes the name over.
    Takeover,
}

/// Display name to connection mapping for everyone currently registered.
#[derive(Debug, Default)]
pub struct Registry {
    names: HashMap<String, Uuid>,
    policy: NamePolicy,
}

impl Registry {
    pub fn new(policy: NamePolicy) -> Self {
        Self {
            names: HashMap::new(),
            policy,
        }
    }

    /// Registers `raw_name` (trimmed) for `connection` and returns the stored name.
    ///
    /// A connection holds at most one name: registering again releases the
    /// previous one.
    pub fn register(&mut self, connection: Uuid, raw_name: &str) -> Result<String, Rejection> {
        let name = raw_name.trim();
        if name.is_empty() {
            return Err(Rejection::EmptyName);
        }

        if let Some(owner) = self.names.get(name) {
            if *owner != connection && self.policy == NamePolicy::Reject {
                return Err(Rejection::NameTaken);
            }
        }

        self.release(connection);
        self.names.insert(name.to_string(), connection);
        Ok(name.to_string())
    }

    /// Drops whatever name `connection` still owns and returns it.
    ///
    /// A name that was taken over by another connection is left alone.
    pub fn release(&mut self, connection: Uuid) -> Option<String> {
        let name = self
            .names
            .iter()
            .find(|(_, owner)| **owner == connection)
            .map(|(name, _)| name.clone())?;
        self.names.remove(&name);
        Some(name)
    }

    pub fn owner(&self, name: &str) -> Option<Uuid> {
        self.names.get(name).copied()
    }

    pub fn count(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_trims_name() {
        let mut registry = Registry::new(NamePolicy::Reject);
        let id = Uuid::new_v4();

        assert_eq!(registry.register(id, "  Alice \n").unwrap(), "Alice");
        assert_eq!(registry.owner("Alice"), Some(id));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_blank_names_rejected() {
        let mut registry = Registry::new(NamePolicy::Reject);
        let id = Uuid::new_v4();

        assert_eq!(registry.register(id, ""), Err(Rejection::EmptyName));
        assert_eq!(registry.register(id, "   \t"), Err(Rejection::EmptyName));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = Registry::new(NamePolicy::Reject);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        registry.register(first, "Alice").unwrap();
        assert_eq!(registry.register(second, "Alice "), Err(Rejection::NameTaken));
        assert_eq!(registry.owner("Alice"), Some(first));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_takeover_last_writer_wins() {
        let mut registry = Registry::new(NamePolicy::Takeover);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        registry.register(first, "Alice").unwrap();
        registry.register(second, "Alice").unwrap();
        assert_eq!(registry.owner("Alice"), Some(second));
        assert_eq!(registry.count(), 1);

        // The stale connection cannot remove the name it lost
        assert_eq!(registry.release(first), None);
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.release(second), Some("Alice".to_string()));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_reregister_releases_previous_name() {
        let mut registry = Registry::new(NamePolicy::Reject);
        let id = Uuid::new_v4();

        registry.register(id, "Alice").unwrap();
        registry.register(id, "Alicia").unwrap();
        assert_eq!(registry.owner("Alice"), None);
        assert_eq!(registry.owner("Alicia"), Some(id));
        assert_eq!(registry.count(), 1);

        // Same connection, same name is not a conflict
        assert_eq!(registry.register(id, "Alicia").unwrap(), "Alicia");
    }
}

use thiserror::Error;

/// Expected, user-facing outcomes that refuse a request.
///
/// These are answered to the originating connection only and never treated
/// as failures of the server itself.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("Name must not be empty")]
    EmptyName,

    #[error("That name is already taken")]
    NameTaken,

    #[error("Register a name before buzzing")]
    NotRegistered,

    #[error("The round has not started yet")]
    NotActive,

    #[error("You have already buzzed this round")]
    AlreadyBuzzed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_display() {
        assert_eq!(Rejection::NotActive.to_string(), "The round has not started yet");
        assert_eq!(Rejection::AlreadyBuzzed.to_string(), "You have already buzzed this round");
        assert_eq!(Rejection::EmptyName.to_string(), "Name must not be empty");
    }
}

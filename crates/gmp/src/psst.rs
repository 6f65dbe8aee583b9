//! Utilities for avoiding accidental disclosure of secrets.
use std::fmt;

#[derive(Clone, serde::Deserialize)]
pub struct Password(String);

impl Password {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn dangerous_reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_does_not_leak_the_password() {
        let password = Password::new("hunter2");
        assert_eq!(format!("{password:?}"), "***");
    }
}

//! Process-lifetime master password cache.
//!
//! The password is asked for at most once per invocation and held in memory only.
//! [`MasterPasswordSession`] is passed into the [`super::Vault`] explicitly so tests
//! can build isolated sessions and inject a fake [`PasswordPrompt`].

use anyhow::Result;
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};
use zeroize::Zeroizing;

use crate::core::McpmError;

/// Source of a master password when none is cached.
pub trait PasswordPrompt: Send + Sync {
    /// Ask the user for a password. Returning [`McpmError::Cancelled`] aborts the
    /// enclosing operation without counting as a failure.
    fn read_password(&self, message: &str) -> Result<String>;

    /// Ask for a password that is being chosen rather than recalled. Defaults to a
    /// single [`read_password`](Self::read_password).
    fn read_new_password(&self, message: &str) -> Result<String> {
        self.read_password(message)
    }
}

/// Interactive terminal prompt backed by `dialoguer`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn read_password(&self, message: &str) -> Result<String> {
        dialoguer::Password::new()
            .with_prompt(message)
            .allow_empty_password(false)
            .interact()
            .map_err(map_prompt_error)
    }

    fn read_new_password(&self, message: &str) -> Result<String> {
        dialoguer::Password::new()
            .with_prompt(message)
            .with_confirmation("Confirm master password", "Passwords don't match")
            .allow_empty_password(false)
            .interact()
            .map_err(map_prompt_error)
    }
}

fn map_prompt_error(error: dialoguer::Error) -> anyhow::Error {
    match error {
        dialoguer::Error::IO(e)
            if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof) =>
        {
            McpmError::Cancelled.into()
        }
        other => anyhow::Error::new(other).context("Failed to read password from terminal"),
    }
}

/// In-memory master password, wiped on [`clear`](Self::clear) and on drop.
#[derive(Default)]
pub struct MasterPasswordSession {
    password: Mutex<Option<Zeroizing<String>>>,
}

impl std::fmt::Debug for MasterPasswordSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterPasswordSession").field("is_set", &self.is_set()).finish()
    }
}

impl MasterPasswordSession {
    /// Empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached password, if any.
    #[must_use]
    pub fn get(&self) -> Option<Zeroizing<String>> {
        self.lock().clone()
    }

    /// Cache `password` for the rest of the process.
    pub fn set(&self, password: impl Into<String>) {
        *self.lock() = Some(Zeroizing::new(password.into()));
    }

    /// Cached password, prompting once through `prompt` when the cache is empty.
    pub fn get_or_prompt(&self, prompt: &dyn PasswordPrompt) -> Result<Zeroizing<String>> {
        if let Some(password) = self.get() {
            return Ok(password);
        }

        let password = Zeroizing::new(prompt.read_password("Master password")?);
        tracing::debug!("Master password cached for this session");
        *self.lock() = Some(password.clone());
        Ok(password)
    }

    /// Forget the cached password. The previous value is zeroized.
    pub fn clear(&self) {
        if self.lock().take().is_some() {
            tracing::debug!("Master password cleared");
        }
    }

    /// Whether a password is cached.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Zeroizing<String>>> {
        self.password.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPrompt {
        calls: AtomicUsize,
    }

    impl PasswordPrompt for CountingPrompt {
        fn read_password(&self, _message: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("typed".to_string())
        }
    }

    struct CancelPrompt;

    impl PasswordPrompt for CancelPrompt {
        fn read_password(&self, _message: &str) -> Result<String> {
            Err(McpmError::Cancelled.into())
        }
    }

    #[test]
    fn test_prompts_only_once() {
        let session = MasterPasswordSession::new();
        let prompt = CountingPrompt {
            calls: AtomicUsize::new(0),
        };

        assert_eq!(session.get_or_prompt(&prompt).unwrap().as_str(), "typed");
        assert_eq!(session.get_or_prompt(&prompt).unwrap().as_str(), "typed");
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_skips_prompt() {
        let session = MasterPasswordSession::new();
        session.set("preset");
        let prompt = CountingPrompt {
            calls: AtomicUsize::new(0),
        };

        assert_eq!(session.get_or_prompt(&prompt).unwrap().as_str(), "preset");
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_new_password_falls_back_to_single_read() {
        let prompt = CountingPrompt {
            calls: AtomicUsize::new(0),
        };

        assert_eq!(prompt.read_new_password("New master password").unwrap(), "typed");
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_forgets_password() {
        let session = MasterPasswordSession::new();
        session.set("pw");
        assert!(session.is_set());

        session.clear();
        assert!(!session.is_set());
        assert!(session.get().is_none());
    }

    #[test]
    fn test_cancel_leaves_cache_empty() {
        let session = MasterPasswordSession::new();
        let err = session.get_or_prompt(&CancelPrompt).unwrap_err();

        assert!(matches!(err.downcast_ref::<McpmError>(), Some(McpmError::Cancelled)));
        assert!(!session.is_set());
    }

    #[test]
    fn test_interrupted_terminal_maps_to_cancelled() {
        let err = map_prompt_error(dialoguer::Error::IO(io::Error::from(
            io::ErrorKind::Interrupted,
        )));
        assert!(matches!(err.downcast_ref::<McpmError>(), Some(McpmError::Cancelled)));

        let err = map_prompt_error(dialoguer::Error::IO(io::Error::from(
            io::ErrorKind::PermissionDenied,
        )));
        assert!(err.downcast_ref::<McpmError>().is_none());
    }

    #[test]
    fn test_debug_does_not_leak_password() {
        let session = MasterPasswordSession::new();
        session.set("super-secret");
        assert!(!format!("{session:?}").contains("super-secret"));
    }
}

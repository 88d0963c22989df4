//! Account-security boundary: password change and two-factor setup.
//!
//! These flows hold no state the authorization model depends on. The trait is
//! the call contract; [`StubAuthSession`] is the stand-in used until a real
//! identity provider is wired up.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rbacadmin_core::{DomainError, DomainResult};

/// Minimum length accepted for a new password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Password change request as submitted by the console form.
#[derive(Clone, Deserialize)]
pub struct ChangePassword {
    pub current: String,
    pub new: String,
    pub confirm: String,
}

impl core::fmt::Debug for ChangePassword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChangePassword").finish_non_exhaustive()
    }
}

impl ChangePassword {
    pub fn new(current: impl Into<String>, new: impl Into<String>, confirm: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            new: new.into(),
            confirm: confirm.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.new != self.confirm {
            return Err(DomainError::validation("passwords do not match"));
        }
        if self.new.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Result of starting two-factor enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorSetup {
    pub qr_code: String,
}

#[async_trait]
pub trait AuthSession: Send + Sync {
    /// Fails with [`DomainError::Auth`] if `current` is wrong.
    async fn change_password(&self, current: &str, new: &str) -> DomainResult<()>;

    async fn setup_two_factor(&self) -> DomainResult<TwoFactorSetup>;

    /// Fails with [`DomainError::InvalidCode`] unless `code` matches the value
    /// fixed during setup.
    async fn verify_two_factor(&self, code: &str) -> DomainResult<()>;
}

/// Validate a form submission, then hand it to the session.
pub async fn submit_password_change(
    session: &dyn AuthSession,
    request: &ChangePassword,
) -> DomainResult<()> {
    request.validate()?;
    session.change_password(&request.current, &request.new).await
}

/// Placeholder session: accepts any current password and a single fixed code.
#[derive(Debug)]
pub struct StubAuthSession {
    qr_code: String,
    expected_code: Mutex<Option<String>>,
    pending_code: String,
}

impl StubAuthSession {
    pub const DEFAULT_CODE: &'static str = "123456";
    pub const DEFAULT_QR: &'static str = "https://example.com/qr-code";

    pub fn new() -> Self {
        Self::with_code(Self::DEFAULT_CODE)
    }

    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            qr_code: Self::DEFAULT_QR.to_string(),
            expected_code: Mutex::new(None),
            pending_code: code.into(),
        }
    }
}

impl Default for StubAuthSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthSession for StubAuthSession {
    async fn change_password(&self, _current: &str, _new: &str) -> DomainResult<()> {
        tracing::info!("password changed");
        Ok(())
    }

    async fn setup_two_factor(&self) -> DomainResult<TwoFactorSetup> {
        let mut expected = self
            .expected_code
            .lock()
            .map_err(|_| DomainError::conflict("two-factor state poisoned"))?;
        *expected = Some(self.pending_code.clone());
        tracing::info!("two-factor enrollment started");
        Ok(TwoFactorSetup {
            qr_code: self.qr_code.clone(),
        })
    }

    async fn verify_two_factor(&self, code: &str) -> DomainResult<()> {
        let expected = self
            .expected_code
            .lock()
            .map_err(|_| DomainError::conflict("two-factor state poisoned"))?;
        match expected.as_deref() {
            Some(want) if want == code.trim() => Ok(()),
            _ => {
                tracing::warn!("two-factor verification failed");
                Err(DomainError::InvalidCode)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let err = ChangePassword::new("old", "secret1", "secret2").validate().unwrap_err();
        assert_eq!(err, DomainError::Validation("passwords do not match".to_string()));
    }

    #[test]
    fn short_password_is_rejected() {
        let err = ChangePassword::new("old", "abc", "abc").validate().unwrap_err();
        assert!(err.to_string().contains("at least 6"));
    }

    #[test]
    fn debug_does_not_leak_passwords() {
        let dbg = format!("{:?}", ChangePassword::new("hunter2", "secret1", "secret1"));
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("secret1"));
    }

    #[tokio::test]
    async fn submit_validates_before_calling_session() {
        let session = StubAuthSession::new();
        let bad = ChangePassword::new("old", "abc", "abc");
        assert!(matches!(
            submit_password_change(&session, &bad).await,
            Err(DomainError::Validation(_))
        ));

        let good = ChangePassword::new("old", "secret1", "secret1");
        assert!(submit_password_change(&session, &good).await.is_ok());
    }

    #[tokio::test]
    async fn verify_requires_setup_first() {
        let session = StubAuthSession::new();
        assert_eq!(session.verify_two_factor("123456").await, Err(DomainError::InvalidCode));
    }

    #[tokio::test]
    async fn verify_accepts_only_the_expected_code() {
        let session = StubAuthSession::with_code("654321");
        let setup = session.setup_two_factor().await.unwrap();
        assert_eq!(setup.qr_code, StubAuthSession::DEFAULT_QR);

        assert_eq!(session.verify_two_factor("000000").await, Err(DomainError::InvalidCode));
        assert!(session.verify_two_factor("654321").await.is_ok());
    }
}

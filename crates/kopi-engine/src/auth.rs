//! # Authentication
//!
//! Cashier accounts and terminal login.
//!
//! Passwords are stored as argon2id PHC strings; the hash never leaves
//! the local database. Every login attempt, successful or not, lands in
//! the audit trail. Failed logins report an opaque error so the login
//! screen cannot be used to enumerate usernames.

use chrono::Utc;
use tracing::{info, warn};

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use kopi_core::validation::{validate_password, validate_username};
use kopi_core::{AuditAction, AuditStatus, CoreError, User, ValidationError};
use kopi_db::repository::users::generate_user_id;
use kopi_db::Database;

use crate::audit;
use crate::error::{EngineError, EngineResult};
use crate::session::{Session, SessionHandle};

/// Account registration and terminal login.
#[derive(Debug, Clone)]
pub struct AuthService {
    db: Database,
    session: SessionHandle,
}

impl AuthService {
    /// Creates a new AuthService.
    pub fn new(db: Database, session: SessionHandle) -> Self {
        AuthService { db, session }
    }

    /// Registers a new cashier account.
    pub async fn register_user(
        &self,
        username: &str,
        display_name: &str,
        password: &str,
    ) -> EngineResult<User> {
        validate_username(username).map_err(CoreError::from)?;
        validate_password(password).map_err(CoreError::from)?;

        let users = self.db.users();
        if users.get_by_username(username).await?.is_some() {
            return Err(CoreError::from(ValidationError::Duplicate {
                field: "username".to_string(),
                value: username.to_string(),
            })
            .into());
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| EngineError::PasswordHash(e.to_string()))?
            .to_string();

        let user = User {
            id: generate_user_id(),
            username: username.to_string(),
            display_name: display_name.trim().to_string(),
            password_hash,
            created_at: Utc::now(),
        };
        users.insert(&user).await?;

        info!(username = %username, "Registered cashier account");

        Ok(user)
    }

    /// Logs a cashier in, replacing any active session.
    pub async fn login(&self, username: &str, password: &str) -> EngineResult<Session> {
        let users = self.db.users();

        let Some(user) = users.get_by_username(username).await? else {
            self.record_failed_login(username).await?;
            return Err(EngineError::InvalidCredentials);
        };

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| EngineError::PasswordHash(e.to_string()))?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            self.record_failed_login(username).await?;
            return Err(EngineError::InvalidCredentials);
        }

        let session = Session {
            user_id: user.id,
            username: user.username.clone(),
            logged_in_at: Utc::now(),
        };
        self.session.set(session.clone());

        info!(username = %user.username, "Cashier logged in");

        audit::record(
            &self.db,
            &user.username,
            AuditAction::Login,
            format!("{} logged in", user.username),
            AuditStatus::Success,
        )
        .await?;

        Ok(session)
    }

    /// Logs the active cashier out. A no-op when nobody is logged in.
    pub async fn logout(&self) -> EngineResult<()> {
        let Some(session) = self.session.clear() else {
            return Ok(());
        };

        info!(username = %session.username, "Cashier logged out");

        audit::record(
            &self.db,
            &session.username,
            AuditAction::Logout,
            format!("{} logged out", session.username),
            AuditStatus::Success,
        )
        .await?;

        Ok(())
    }

    async fn record_failed_login(&self, username: &str) -> EngineResult<()> {
        warn!(username = %username, "Failed login attempt");

        audit::record(
            &self.db,
            username,
            AuditAction::FailedLogin,
            format!("Failed login for {username}"),
            AuditStatus::Failed,
        )
        .await?;

        Ok(())
    }
}

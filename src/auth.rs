use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::AppError;
use crate::storage::KeyValueStore;
use crate::store::write_atomic;

const SESSION_KEY: &str = "session_user_id";
const MIN_PASSWORD_CHARS: usize = 6;

/// User identity provider.
pub trait Identity {
    /// The signed-in user's id, if any.
    fn current_user_id(&self) -> Result<Option<String>, AppError>;

    /// Email of the signed-in account, if any.
    fn current_email(&self) -> Result<Option<String>, AppError>;

    /// Registers a new account and returns its user id. Does not sign in.
    fn sign_up(&self, email: &str, password: &str) -> Result<String, AppError>;

    fn sign_in(&self, email: &str, password: &str) -> Result<String, AppError>;

    fn sign_out(&self) -> Result<(), AppError>;

    /// Current user id, or `NotSignedIn`.
    fn require_user(&self) -> Result<String, AppError> {
        self.current_user_id()?.ok_or(AppError::NotSignedIn)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Account {
    id: String,
    email: String,
    salt: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

/// Accounts kept on this device, session held in local key-value storage.
pub struct LocalIdentity<K: KeyValueStore> {
    accounts_path: PathBuf,
    kv: K,
}

impl<K: KeyValueStore> LocalIdentity<K> {
    pub fn new(dir: &Path, kv: K) -> Self {
        Self {
            accounts_path: dir.join("accounts.json"),
            kv,
        }
    }

    fn load_accounts(&self) -> Result<Vec<Account>, AppError> {
        if !self.accounts_path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.accounts_path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save_accounts(&self, accounts: &[Account]) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(accounts)?;
        write_atomic(&self.accounts_path, &bytes)?;
        Ok(())
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

fn normalize_credentials(email: &str, password: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation("please fill in all fields".into()));
    }
    Ok(email)
}

impl<K: KeyValueStore> Identity for LocalIdentity<K> {
    fn current_user_id(&self) -> Result<Option<String>, AppError> {
        self.kv.get(SESSION_KEY)
    }

    fn current_email(&self) -> Result<Option<String>, AppError> {
        let Some(id) = self.current_user_id()? else {
            return Ok(None);
        };
        Ok(self.load_accounts()?.into_iter().find(|a| a.id == id).map(|a| a.email))
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = normalize_credentials(email, password)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::Validation(format!(
                "password should be at least {} characters",
                MIN_PASSWORD_CHARS
            )));
        }
        let mut accounts = self.load_accounts()?;
        if accounts.iter().any(|a| a.email == email) {
            return Err(AppError::Auth("user already registered".into()));
        }
        let salt = uuid::Uuid::new_v4().to_string();
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            password_hash: hash_password(&salt, password),
            salt,
            email,
            created_at: Utc::now(),
        };
        let id = account.id.clone();
        accounts.push(account);
        self.save_accounts(&accounts)?;
        info!(user_id = %id, "account created");
        Ok(id)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = normalize_credentials(email, password)?;
        let account = self
            .load_accounts()?
            .into_iter()
            .find(|a| a.email == email && a.password_hash == hash_password(&a.salt, password))
            .ok_or_else(|| AppError::Auth("invalid login credentials".into()))?;
        self.kv.set(SESSION_KEY, &account.id)?;
        info!(user_id = %account.id, "signed in");
        Ok(account.id)
    }

    fn sign_out(&self) -> Result<(), AppError> {
        self.kv.remove(SESSION_KEY)
    }
}

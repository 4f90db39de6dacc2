use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::error::ShopError;
use crate::table::TableFile;

/// A registered application user.
///
/// Users are created on signup and never updated or deleted. The password
/// is stored as an Argon2 hash, never in plaintext.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    /// Opaque unique id, generated at signup
    pub id: Uuid,

    /// Username (unique across the store)
    pub username: String,

    /// Argon2 hash of the user's password
    pub password_hash: String,
}

/// Credential data for login and registration forms.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserCredentials {
    /// Username for login/registration
    pub username: String,

    /// Password in plaintext (only transmitted, never stored)
    pub password: String,
}

/// Flat-file collection of user records.
///
/// Backed by a single serialized table; supports append (signup) and
/// linear-scan lookup (authenticate).
pub struct UserStore {
    table: TableFile<User>,
}

impl UserStore {
    /// Open the user store rooted at `dir` (`<dir>/users.bin.gz`).
    pub fn open(dir: impl AsRef<Path>) -> Self {
        UserStore {
            table: TableFile::open(dir.as_ref().join("users.bin.gz")),
        }
    }

    /// Load all user records. A missing backing file reads as an empty
    /// collection.
    pub fn load(&self) -> Result<Vec<User>, ShopError> {
        self.table.read()
    }

    /// Register a new user.
    ///
    /// Fails with `DuplicateUser` if the username is already taken, leaving
    /// the store untouched. Otherwise hashes the password, appends a record
    /// with a freshly generated id, and returns it.
    ///
    /// # Errors
    /// * `InvalidInput` if the username or password is empty
    /// * `DuplicateUser` if the username is already registered
    pub fn signup(&self, username: &str, password: &str) -> Result<User, ShopError> {
        if username.is_empty() || password.is_empty() {
            return Err(ShopError::InvalidInput(
                "Username and password cannot be empty".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let username = username.to_string();

        self.table.update(move |users| {
            if users.iter().any(|u| u.username == username) {
                return Err(ShopError::DuplicateUser);
            }

            let user = User {
                id: Uuid::new_v4(),
                username,
                password_hash,
            };
            users.push(user.clone());
            Ok(user)
        })
    }

    /// Verify a username/password pair.
    ///
    /// Linear scan for the username followed by an Argon2 verify. Any
    /// mismatch, including an unknown username, fails with
    /// `InvalidCredentials`.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User, ShopError> {
        let users = self.table.read()?;

        let user = users
            .iter()
            .find(|u| u.username == username)
            .ok_or(ShopError::InvalidCredentials)?;

        if verify_password(password, &user.password_hash)? {
            Ok(user.clone())
        } else {
            Err(ShopError::InvalidCredentials)
        }
    }
}

/// Hash a password using Argon2id with a random salt.
fn hash_password(password: &str) -> Result<String, ShopError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    match argon2.hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(_) => Err(ShopError::PasswordHash),
    }
}

/// Check a plaintext password against a stored Argon2 hash.
///
/// Returns `Ok(false)` on a mismatch; errors only if the stored hash is in
/// an invalid format.
fn verify_password(password: &str, hash: &str) -> Result<bool, ShopError> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => return Err(ShopError::PasswordHash),
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false), // Password didn't match
    }
}

//! Session secret and the values derived from it
//!
//! One secret is generated per process. It is the dashboard login password
//! and the instance key of the service unit, so it must stay alphanumeric:
//! nothing built from it can break out of a command line or unit name.

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use thiserror::Error;

/// Number of characters in a session secret
pub const SECRET_LEN: usize = 5;

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Environment variable carrying the login username to the dashboard
pub const USERNAME_ENV: &str = "SIMPLELOGIN_USERNAME";
/// Environment variable carrying the login password to the dashboard
pub const PASSWORD_ENV: &str = "SIMPLELOGIN_PASSWORD";

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secure random source unavailable: {0}")]
    Entropy(#[from] rand::Error),

    #[error("secret must not be empty")]
    Empty,

    #[error("secret contains non-alphanumeric character {0:?}")]
    InvalidChar(char),
}

/// Short random alphanumeric token, fixed for the lifetime of the process
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Generate a fresh secret from the operating system's CSPRNG
    pub fn generate() -> Result<Self, SecretError> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a secret from the given source
    ///
    /// Each character takes the top 6 bits of a random byte and rejects
    /// values past the alphabet, which keeps the draw uniform.
    pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self, SecretError> {
        let mut secret = String::with_capacity(SECRET_LEN);
        let mut buf = [0u8; 16];
        while secret.len() < SECRET_LEN {
            rng.try_fill_bytes(&mut buf)?;
            for byte in buf {
                let idx = (byte >> 2) as usize;
                if idx < ALPHABET.len() {
                    secret.push(ALPHABET[idx] as char);
                    if secret.len() == SECRET_LEN {
                        break;
                    }
                }
            }
        }
        Ok(Self(secret))
    }

    /// Accept an existing secret if it is non-empty ASCII alphanumeric
    pub fn parse(value: impl Into<String>) -> Result<Self, SecretError> {
        let value = value.into();
        if value.is_empty() {
            return Err(SecretError::Empty);
        }
        if let Some(bad) = value.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(SecretError::InvalidChar(bad));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(*****)")
    }
}

/// Dashboard login: configured username plus the session secret as password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: SessionSecret,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: SessionSecret) -> Self {
        Self {
            username: username.into(),
            secret,
        }
    }

    /// Environment overrides for the process that serves the dashboard
    pub fn env_vars(&self) -> [(&'static str, &str); 2] {
        [
            (USERNAME_ENV, self.username.as_str()),
            (PASSWORD_ENV, self.secret.as_str()),
        ]
    }
}

/// One instance of the dashboard template unit, keyed by the session secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInstance {
    template: String,
    instance: SessionSecret,
}

impl UnitInstance {
    pub fn new(template: impl Into<String>, instance: SessionSecret) -> Self {
        Self {
            template: template.into(),
            instance,
        }
    }

    /// Full unit name, e.g. `ovos-dashboard@Ab3xZ.service`
    pub fn service_name(&self) -> String {
        format!("{}@{}.service", self.template, self.instance.as_str())
    }

    /// Unit name with the instance key masked, safe to log
    pub fn redacted(&self) -> String {
        format!("{}@*****.service", self.template)
    }

    /// Mask every occurrence of the instance key in text from outside,
    /// such as service manager output
    pub fn scrub(&self, text: &str) -> String {
        text.replace(&self.service_name(), &self.redacted())
            .replace(self.instance.as_str(), "*****")
    }
}

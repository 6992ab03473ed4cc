//! Identity capability used to authenticate against the explorer.
//!
//! The client only ever reads an identity: it asks for the identifier that
//! goes into the `Threebot-Id` header and for the private key bytes it signs
//! with. Key storage belongs to the caller.

use std::fmt;

use ed25519_dalek::{SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};

use crate::error::{ClientError, ClientResult};

/// Length of the keypair encoding (secret seed followed by public key).
pub const KEYPAIR_LENGTH: usize = SECRET_KEY_LENGTH + PUBLIC_KEY_LENGTH;

/// Something that can authenticate requests.
pub trait Identity: Send + Sync {
    /// Stable identifier as known by the explorer.
    fn identifier(&self) -> String;

    /// Private key bytes: a 32-byte ed25519 seed or a 64-byte keypair.
    fn private_key(&self) -> &[u8];
}

/// Parse private key bytes into an ed25519 signing key.
///
/// Accepts a 32-byte seed, or a 64-byte keypair whose public half must match
/// the key derived from its secret half.
pub fn signing_key_from_bytes(bytes: &[u8]) -> ClientResult<SigningKey> {
    match bytes.len() {
        SECRET_KEY_LENGTH => {
            let mut seed = [0u8; SECRET_KEY_LENGTH];
            seed.copy_from_slice(bytes);
            Ok(SigningKey::from_bytes(&seed))
        }
        KEYPAIR_LENGTH => {
            let mut pair = [0u8; KEYPAIR_LENGTH];
            pair.copy_from_slice(bytes);
            SigningKey::from_keypair_bytes(&pair)
                .map_err(|e| ClientError::signing(format!("invalid keypair: {e}")))
        }
        n => Err(ClientError::signing(format!(
            "invalid private key length {n}, expected {SECRET_KEY_LENGTH} or {KEYPAIR_LENGTH}"
        ))),
    }
}

/// An ed25519 user identity registered (or about to be) in the phonebook.
#[derive(Clone)]
pub struct UserIdentity {
    threebot_id: i64,
    key: SigningKey,
    keypair: [u8; KEYPAIR_LENGTH],
}

impl UserIdentity {
    /// Wrap an existing signing key.
    pub fn new(key: SigningKey, threebot_id: i64) -> Self {
        let keypair = key.to_keypair_bytes();
        Self {
            threebot_id,
            key,
            keypair,
        }
    }

    /// Generate a fresh key from OS randomness. The id is 0 until registered.
    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut rand::rngs::OsRng), 0)
    }

    /// Build from a 32-byte seed.
    pub fn from_seed(seed: &[u8], threebot_id: i64) -> ClientResult<Self> {
        if seed.len() != SECRET_KEY_LENGTH {
            return Err(ClientError::signing(format!(
                "invalid seed length {}, expected {SECRET_KEY_LENGTH}",
                seed.len()
            )));
        }
        Ok(Self::new(signing_key_from_bytes(seed)?, threebot_id))
    }

    /// Same key, different explorer id.
    pub fn with_id(&self, threebot_id: i64) -> Self {
        Self::new(self.key.clone(), threebot_id)
    }

    pub fn threebot_id(&self) -> i64 {
        self.threebot_id
    }

    /// The 32-byte secret seed.
    pub fn seed(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.key.to_bytes()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Hex encoded public key, as stored in the user's phonebook record.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.verifying_key().as_bytes())
    }
}

impl Identity for UserIdentity {
    fn identifier(&self) -> String {
        self.threebot_id.to_string()
    }

    fn private_key(&self) -> &[u8] {
        &self.keypair
    }
}

impl fmt::Debug for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserIdentity")
            .field("threebot_id", &self.threebot_id)
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use p256::ecdsa::SigningKey;
use p256::pkcs8::EncodePublicKey;
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{IDENTITY_ID_LEN, NAME_WORDS};
use crate::error::IdentityError;
use crate::types::PeerId;

/// The persisted, shareable part of an identity. The public key is the
/// base64-encoded SPKI (DER) form of the session's P-256 verifying key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityRecord {
    pub id: PeerId,
    pub name: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

/// A user's cryptographic identity based on ECDSA P-256.
///
/// The signing key lives only in process memory for the session's
/// lifetime; it is never serialized or transmitted. `id` and `name`
/// persist across sessions, the keypair does not, so a stable `id` is
/// not bound to any single key over time.
#[derive(Clone)]
pub struct Identity {
    record: IdentityRecord,
    signing_key: SigningKey,
}

impl Identity {
    /// Generate a brand new identity with a fresh keypair, a derived id,
    /// and a random display name.
    pub fn generate() -> Result<Self, IdentityError> {
        let signing_key = SigningKey::random(&mut OsRng);
        let public_key = encode_public_key(&signing_key)?;
        let id = PeerId(public_key.chars().take(IDENTITY_ID_LEN).collect());
        let name = random_name();

        Ok(Self {
            record: IdentityRecord {
                id,
                name,
                public_key,
            },
            signing_key,
        })
    }

    /// Rebuild an identity around a persisted record: `id` and `name` are
    /// retained, the keypair is regenerated and `public_key` refreshed to
    /// match.
    pub fn with_record(record: IdentityRecord) -> Result<Self, IdentityError> {
        let signing_key = SigningKey::random(&mut OsRng);
        let public_key = encode_public_key(&signing_key)?;

        Ok(Self {
            record: IdentityRecord {
                id: record.id,
                name: record.name,
                public_key,
            },
            signing_key,
        })
    }

    pub fn record(&self) -> &IdentityRecord {
        &self.record
    }

    pub fn id(&self) -> &PeerId {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Base64-encoded SPKI public key, as embedded in outgoing messages.
    pub fn public_key(&self) -> &str {
        &self.record.public_key
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material through Debug output.
        f.debug_struct("Identity")
            .field("id", &self.record.id)
            .field("name", &self.record.name)
            .finish_non_exhaustive()
    }
}

fn encode_public_key(key: &SigningKey) -> Result<String, IdentityError> {
    let der = key
        .verifying_key()
        .to_public_key_der()
        .map_err(|e| IdentityError::KeyGeneration(e.to_string()))?;
    Ok(BASE64.encode(der.as_bytes()))
}

fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let word = NAME_WORDS[rng.gen_range(0..NAME_WORDS.len())];
    format!("{}_{}", word, rng.gen_range(0..1000))
}

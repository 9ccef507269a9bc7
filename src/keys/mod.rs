//! Key provisioning: elliptic-curve key pair generation, PEM serialization
//! and key file I/O.
//!
//! Private keys are serialized in the traditional unencrypted formats
//! (`EC PRIVATE KEY` / `RSA PRIVATE KEY`), public keys as SubjectPublicKeyInfo.

mod decode;

pub use decode::{decode_private_key, detect_algorithm};

use pkcs8::{EncodePublicKey, LineEnding, ObjectIdentifier};
use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Algorithm;

const SECP256R1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const SECP521R1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");
const SECP256K1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.10");

/// Curves fresh key pairs can be generated on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Curve {
    Secp256r1,
    #[default]
    Secp521r1,
}

/// Curve named by the parameters of a decoded EC key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedCurve {
    Secp256r1,
    Secp384r1,
    Secp521r1,
    Secp256k1,
    Unknown(ObjectIdentifier),
}

impl NamedCurve {
    pub fn from_oid(oid: ObjectIdentifier) -> Self {
        if oid == SECP256R1_OID {
            NamedCurve::Secp256r1
        } else if oid == SECP384R1_OID {
            NamedCurve::Secp384r1
        } else if oid == SECP521R1_OID {
            NamedCurve::Secp521r1
        } else if oid == SECP256K1_OID {
            NamedCurve::Secp256k1
        } else {
            NamedCurve::Unknown(oid)
        }
    }
}

impl From<Curve> for NamedCurve {
    fn from(curve: Curve) -> Self {
        match curve {
            Curve::Secp256r1 => NamedCurve::Secp256r1,
            Curve::Secp521r1 => NamedCurve::Secp521r1,
        }
    }
}

impl fmt::Display for NamedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamedCurve::Secp256r1 => f.write_str("secp256r1"),
            NamedCurve::Secp384r1 => f.write_str("secp384r1"),
            NamedCurve::Secp521r1 => f.write_str("secp521r1"),
            NamedCurve::Secp256k1 => f.write_str("secp256k1"),
            NamedCurve::Unknown(oid) => write!(f, "{}", oid),
        }
    }
}

/// A private key, tagged by key family
pub enum PrivateKey {
    Rsa(Box<RsaPrivateKey>),
    Ec(EcPrivateKey),
}

/// An elliptic-curve private key.
///
/// Curves without signing support keep only their name, which is all
/// algorithm detection needs to reject them.
pub enum EcPrivateKey {
    P256(p256::SecretKey),
    P521(p521::SecretKey),
    Other(NamedCurve),
}

impl EcPrivateKey {
    pub fn curve(&self) -> NamedCurve {
        match self {
            EcPrivateKey::P256(_) => NamedCurve::Secp256r1,
            EcPrivateKey::P521(_) => NamedCurve::Secp521r1,
            EcPrivateKey::Other(curve) => *curve,
        }
    }
}

impl PrivateKey {
    /// Map the key to the algorithm a `srv_jwt` is signed with
    pub fn algorithm(&self) -> Result<Algorithm> {
        match self {
            PrivateKey::Rsa(_) => Ok(Algorithm::Rs512),
            PrivateKey::Ec(EcPrivateKey::P256(_)) => Ok(Algorithm::Es256),
            PrivateKey::Ec(EcPrivateKey::P521(_)) => Ok(Algorithm::Es512),
            PrivateKey::Ec(EcPrivateKey::Other(curve)) => Err(Error::UnsupportedKey(format!(
                "EC with unknown curve {}",
                curve
            ))),
        }
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        match self {
            PrivateKey::Rsa(key) => Ok(PublicKey::Rsa(key.to_public_key())),
            PrivateKey::Ec(EcPrivateKey::P256(key)) => Ok(PublicKey::P256(key.public_key())),
            PrivateKey::Ec(EcPrivateKey::P521(key)) => Ok(PublicKey::P521(key.public_key())),
            PrivateKey::Ec(EcPrivateKey::Other(curve)) => Err(Error::UnsupportedKey(format!(
                "EC with unknown curve {}",
                curve
            ))),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivateKey::Rsa(_) => f.write_str("PrivateKey::Rsa(..)"),
            PrivateKey::Ec(key) => write!(f, "PrivateKey::Ec({})", key.curve()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    P256(p256::PublicKey),
    P521(p521::PublicKey),
}

/// A generated key pair; both halves always correspond
#[derive(Debug)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl KeyPair {
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

/// Generate a fresh key pair on `curve` from the OS random source
pub fn generate_key_pair(curve: Curve) -> KeyPair {
    debug!(curve = %NamedCurve::from(curve), "generating key pair");
    match curve {
        Curve::Secp256r1 => {
            let secret = p256::SecretKey::random(&mut OsRng);
            let public = secret.public_key();
            KeyPair {
                private: PrivateKey::Ec(EcPrivateKey::P256(secret)),
                public: PublicKey::P256(public),
            }
        }
        Curve::Secp521r1 => {
            let secret = p521::SecretKey::random(&mut OsRng);
            let public = secret.public_key();
            KeyPair {
                private: PrivateKey::Ec(EcPrivateKey::P521(secret)),
                public: PublicKey::P521(public),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyVisibility {
    Private,
    Public,
}

/// PEM text of one half of a key pair
#[derive(Clone, PartialEq, Eq)]
pub struct SerializedKey {
    pem: String,
    visibility: KeyVisibility,
}

impl SerializedKey {
    pub fn as_str(&self) -> &str {
        &self.pem
    }

    pub fn visibility(&self) -> KeyVisibility {
        self.visibility
    }
}

impl fmt::Debug for SerializedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.visibility {
            KeyVisibility::Private => f.write_str("SerializedKey(<private>)"),
            KeyVisibility::Public => write!(f, "SerializedKey({:?})", self.pem),
        }
    }
}

/// Encode a private key in its traditional unencrypted PEM form
pub fn serialize_private(key: &PrivateKey) -> Result<SerializedKey> {
    let pem = match key {
        PrivateKey::Rsa(key) => key.to_pkcs1_pem(LineEnding::LF).map_err(Error::encoding)?,
        PrivateKey::Ec(EcPrivateKey::P256(key)) => {
            key.to_sec1_pem(LineEnding::LF).map_err(Error::encoding)?
        }
        PrivateKey::Ec(EcPrivateKey::P521(key)) => {
            key.to_sec1_pem(LineEnding::LF).map_err(Error::encoding)?
        }
        PrivateKey::Ec(EcPrivateKey::Other(curve)) => {
            return Err(Error::UnsupportedKey(format!(
                "EC with unknown curve {}",
                curve
            )))
        }
    };

    Ok(SerializedKey {
        pem: pem.as_str().to_owned(),
        visibility: KeyVisibility::Private,
    })
}

/// Encode a public key as a SubjectPublicKeyInfo PEM document
pub fn serialize_public(key: &PublicKey) -> Result<SerializedKey> {
    let pem = match key {
        PublicKey::Rsa(key) => key.to_public_key_pem(LineEnding::LF),
        PublicKey::P256(key) => key.to_public_key_pem(LineEnding::LF),
        PublicKey::P521(key) => key.to_public_key_pem(LineEnding::LF),
    }
    .map_err(Error::encoding)?;

    Ok(SerializedKey {
        pem,
        visibility: KeyVisibility::Public,
    })
}

/// Write a serialized key to `path`.
///
/// Missing parent directories are not created. On Unix private keys are
/// created with mode 0600.
pub fn write_key_file(key: &SerializedKey, path: &Path) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(match key.visibility {
            KeyVisibility::Private => 0o600,
            KeyVisibility::Public => 0o644,
        });
    }

    let mut file = options
        .open(path)
        .map_err(|e| Error::io("Writing to file", path, e))?;
    file.write_all(key.pem.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| Error::io("Writing to file", path, e))?;

    debug!(path = %path.display(), "key file written");
    Ok(())
}

pub fn read_key_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::io("Reading", path, e))
}

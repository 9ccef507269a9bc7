//! `srv_jwt` issuance.
//!
//! A token is the compact JWS serialization
//! `base64url(header).base64url(payload).base64url(signature)` of the
//! claims `{"issued": <epoch seconds>}`. Tokens are never parsed back here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use p256::ecdsa::signature::{SignatureEncoding, Signer};
use serde::Serialize;
use sha2::Sha512;
use tracing::debug;

use crate::error::{Error, Result};
use crate::keys::{EcPrivateKey, PrivateKey};
use crate::models::{Algorithm, ServerClaims, TokenHeader};

/// Issue a token asserting the current UTC time
pub fn issue_token(key: &PrivateKey, alg: Algorithm) -> Result<String> {
    issue_token_at(key, alg, Utc::now().timestamp())
}

/// Issue a token asserting `issued` (UTC epoch seconds)
pub fn issue_token_at(key: &PrivateKey, alg: Algorithm, issued: i64) -> Result<String> {
    let header = encode_segment(&TokenHeader::new(alg))?;
    let payload = encode_segment(&ServerClaims { issued })?;
    let signing_input = format!("{}.{}", header, payload);

    let signature = sign(key, alg, signing_input.as_bytes())?;
    debug!(%alg, issued, "token signed");

    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn sign(key: &PrivateKey, alg: Algorithm, message: &[u8]) -> Result<Vec<u8>> {
    match (alg, key) {
        (Algorithm::Rs512, PrivateKey::Rsa(key)) => {
            let signer = rsa::pkcs1v15::SigningKey::<Sha512>::new((**key).clone());
            let signature = signer.try_sign(message).map_err(Error::encoding)?;
            Ok(signature.to_vec())
        }
        (Algorithm::Es256, PrivateKey::Ec(EcPrivateKey::P256(secret))) => {
            let signer = p256::ecdsa::SigningKey::from(secret);
            let signature: p256::ecdsa::Signature =
                signer.try_sign(message).map_err(Error::encoding)?;
            Ok(signature.to_bytes().to_vec())
        }
        (Algorithm::Es512, PrivateKey::Ec(EcPrivateKey::P521(secret))) => {
            let signer =
                p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes()).map_err(Error::encoding)?;
            let signature: p521::ecdsa::Signature =
                signer.try_sign(message).map_err(Error::encoding)?;
            Ok(signature.to_bytes().to_vec())
        }
        (alg, key) => Err(Error::UnsupportedKey(format!(
            "{:?} does not match algorithm {}",
            key, alg
        ))),
    }
}

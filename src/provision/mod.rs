//! The `gen_keys` workflow: three fresh P-521 key pairs, a `srv_jwt` signed
//! with the json list key, the patched `config.yaml` and the PEM files for
//! the server and for openresty.

pub mod srv_config;

use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Settings;
use crate::error::Result;
use crate::keys::{self, Curve, KeyPair, SerializedKey};
use crate::token;
use srv_config::{LoginJwtEntry, SourceEntry, SrvConfigFile};

pub const LOGIN_JWT_PRIV: &str = "login_jwt_priv.pem";
pub const LOGIN_JWT_PUB: &str = "login_jwt_pub.pem";
pub const FILE_ACC_PRIV: &str = "file_acc_priv.pem";
pub const FILE_ACC_PUB: &str = "file_acc_pub.pem";
pub const JSON_LIST_PUB: &str = "json_list_pub.pem";

/// Where the server expects its config and key files
#[derive(Debug, Clone)]
pub struct Layout {
    pub config_file: PathBuf,
    pub keys_dir: PathBuf,
    pub openresty_keys_dir: PathBuf,
}

impl Layout {
    /// Default layout of a server directory
    pub fn new(srv_dir: &Path) -> Self {
        Self::from_settings(&Settings::for_srv_dir(srv_dir))
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            config_file: settings.config_file.clone(),
            keys_dir: settings.keys_dir(),
            openresty_keys_dir: settings.openresty_keys_dir(),
        }
    }
}

/// Key material produced by one provisioning run
#[derive(Debug)]
pub struct ProvisionedKeys {
    /// Signs user login tokens
    pub login_jwt: KeyPair,
    /// Signs file access tokens checked by openresty
    pub file_access: KeyPair,
    /// Signs the `srv_jwt` sent along with json file lists
    pub json_list: KeyPair,
    pub srv_jwt: String,
}

impl ProvisionedKeys {
    pub fn generate() -> Result<Self> {
        let login_jwt = keys::generate_key_pair(Curve::Secp521r1);
        let file_access = keys::generate_key_pair(Curve::Secp521r1);
        let json_list = keys::generate_key_pair(Curve::Secp521r1);

        let json_list_alg = json_list.private_key().algorithm()?;
        let srv_jwt = token::issue_token(json_list.private_key(), json_list_alg)?;

        Ok(Self {
            login_jwt,
            file_access,
            json_list,
            srv_jwt,
        })
    }

    /// PEM files in the order they are written
    pub fn key_files(&self, layout: &Layout) -> Result<Vec<(PathBuf, SerializedKey)>> {
        let keys_dir = &layout.keys_dir;
        let openresty_dir = &layout.openresty_keys_dir;
        let file_acc_pub = keys::serialize_public(self.file_access.public_key())?;

        Ok(vec![
            (
                keys_dir.join(LOGIN_JWT_PRIV),
                keys::serialize_private(self.login_jwt.private_key())?,
            ),
            (
                keys_dir.join(LOGIN_JWT_PUB),
                keys::serialize_public(self.login_jwt.public_key())?,
            ),
            (
                openresty_dir.join(JSON_LIST_PUB),
                keys::serialize_public(self.json_list.public_key())?,
            ),
            (
                keys_dir.join(FILE_ACC_PRIV),
                keys::serialize_private(self.file_access.private_key())?,
            ),
            (keys_dir.join(FILE_ACC_PUB), file_acc_pub.clone()),
            (openresty_dir.join(FILE_ACC_PUB), file_acc_pub),
        ])
    }
}

/// Generate all key material, patch the config and write the key files.
///
/// `progress` receives one line per completed step. The first error aborts
/// the run; files already written stay on disk.
pub fn run(layout: &Layout, mut progress: impl FnMut(&str)) -> Result<ProvisionedKeys> {
    let keys = ProvisionedKeys::generate()?;

    let mut config = SrvConfigFile::load(&layout.config_file)?;
    config.set_login_jwt(&LoginJwtEntry {
        priv_key_file: format!("./keys/{}", LOGIN_JWT_PRIV),
        pub_key_file: format!("./keys/{}", LOGIN_JWT_PUB),
        algorithm: keys.login_jwt.private_key().algorithm()?,
    })?;
    let source = config.set_single_source(&SourceEntry {
        srv_jwt: keys.srv_jwt.clone(),
        priv_key_file: format!("./keys/{}", FILE_ACC_PRIV),
        algorithm: keys.file_access.private_key().algorithm()?,
    })?;
    config.save()?;
    info!(source = %source, "config patched");
    progress(&format!("Successfully modified {}", config.path().display()));

    for (path, key) in keys.key_files(layout)? {
        keys::write_key_file(&key, &path)?;
        progress(&format!("Successfully written {}", path.display()));
    }

    progress("OK");
    Ok(keys)
}

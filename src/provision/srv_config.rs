//! In-place patching of the server's `config.yaml`.

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::Algorithm;

/// Top-level `login_jwt` section
#[derive(Debug, Clone, Serialize)]
pub struct LoginJwtEntry {
    pub priv_key_file: String,
    pub pub_key_file: String,
    pub algorithm: Algorithm,
}

/// Fields written into the single entry of the `sources` section
#[derive(Debug, Clone, Serialize)]
pub struct SourceEntry {
    pub srv_jwt: String,
    pub priv_key_file: String,
    pub algorithm: Algorithm,
}

pub struct SrvConfigFile {
    path: PathBuf,
    doc: Mapping,
    has_comments: bool,
}

impl SrvConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Configuration(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let text = fs::read_to_string(path).map_err(|e| Error::io("Reading", path, e))?;
        let doc = match serde_yaml::from_str::<Value>(&text) {
            Ok(Value::Mapping(doc)) => doc,
            Ok(_) => {
                return Err(Error::Configuration(format!(
                    "{} is not a YAML mapping",
                    path.display()
                )))
            }
            Err(e) => {
                return Err(Error::Configuration(format!(
                    "{} cannot be read: {}",
                    path.display(),
                    e
                )))
            }
        };

        let has_comments = contains_comments(&text);
        if has_comments {
            warn!(path = %path.display(), "comments in the config file will not be preserved");
        }

        debug!(path = %path.display(), "config loaded");
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            has_comments,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether saving will drop comments present in the loaded file
    pub fn has_comments(&self) -> bool {
        self.has_comments
    }

    pub fn set_login_jwt(&mut self, entry: &LoginJwtEntry) -> Result<()> {
        self.doc
            .insert(Value::from("login_jwt"), serde_yaml::to_value(entry)?);
        Ok(())
    }

    /// Merge `entry` into the only configured source and return its name.
    ///
    /// The `sources` section must hold exactly one source; other keys of
    /// that source are kept.
    pub fn set_single_source(&mut self, entry: &SourceEntry) -> Result<String> {
        let display = self.path.display().to_string();
        let sources = match self.doc.get_mut("sources") {
            None => {
                return Err(Error::Configuration(format!(
                    "{} does not contain sources: section",
                    display
                )))
            }
            Some(Value::Null) => None,
            Some(Value::Mapping(sources)) => Some(sources),
            Some(_) => {
                return Err(Error::Configuration(format!(
                    "{} has a sources: section that is not a mapping",
                    display
                )))
            }
        };

        let sources = match sources {
            Some(sources) if sources.len() == 1 => sources,
            Some(sources) if sources.len() > 1 => {
                return Err(Error::Configuration(format!(
                    "{} contains more than one source. This tool can be used with precisely one configured source",
                    display
                )))
            }
            _ => {
                return Err(Error::Configuration(format!(
                    "{} does not contain any source. This tool can be used with precisely one configured source",
                    display
                )))
            }
        };

        let (name, source) = sources.iter_mut().next().ok_or_else(|| {
            Error::Configuration(format!("{} does not contain any source", display))
        })?;
        let name = name
            .as_str()
            .ok_or_else(|| {
                Error::Configuration(format!("{} has an invalid source name", display))
            })?
            .to_string();

        if source.is_null() {
            *source = Value::Mapping(Mapping::new());
        }
        let fields = source.as_mapping_mut().ok_or_else(|| {
            Error::Configuration(format!("source {} in {} is not a mapping", name, display))
        })?;

        if let Value::Mapping(update) = serde_yaml::to_value(entry)? {
            for (key, value) in update {
                fields.insert(key, value);
            }
        }

        info!(source = %name, "source entry updated");
        Ok(name)
    }

    pub fn save(&self) -> Result<()> {
        let text = serde_yaml::to_string(&self.doc)?;
        fs::write(&self.path, text).map_err(|e| Error::io("Writing", &self.path, e))
    }
}

// A `#` opens a comment at the start of a line or after whitespace. Quoted
// scalars containing " #" are counted too.
fn contains_comments(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with('#') || line.contains(" #") || line.contains("\t#")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CONFIG: &str = r#"srv:
  url: http://localhost
  port: 8000
sources:
  main:
    list_root_url: https://files.example.org/list
    client_url: https://files.example.org
"#;

    fn source_entry() -> SourceEntry {
        SourceEntry {
            srv_jwt: "a.b.c".to_string(),
            priv_key_file: "./keys/file_acc_priv.pem".to_string(),
            algorithm: Algorithm::Es512,
        }
    }

    fn write_config(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("config.yaml");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_patch_and_save() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), CONFIG);

        let mut config = SrvConfigFile::load(&path).unwrap();
        config
            .set_login_jwt(&LoginJwtEntry {
                priv_key_file: "./keys/login_jwt_priv.pem".to_string(),
                pub_key_file: "./keys/login_jwt_pub.pem".to_string(),
                algorithm: Algorithm::Es512,
            })
            .unwrap();
        assert_eq!(config.set_single_source(&source_entry()).unwrap(), "main");
        config.save().unwrap();

        let saved: Value = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["srv"]["port"], Value::from(8000));
        assert_eq!(saved["login_jwt"]["algorithm"], Value::from("ES512"));
        assert_eq!(
            saved["login_jwt"]["pub_key_file"],
            Value::from("./keys/login_jwt_pub.pem")
        );
        assert_eq!(saved["sources"]["main"]["srv_jwt"], Value::from("a.b.c"));
        assert_eq!(saved["sources"]["main"]["algorithm"], Value::from("ES512"));
        assert_eq!(
            saved["sources"]["main"]["client_url"],
            Value::from("https://files.example.org")
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = SrvConfigFile::load(&dir.path().join("config.yaml"));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_missing_sources() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "srv:\n  port: 8000\n");

        let mut config = SrvConfigFile::load(&path).unwrap();
        match config.set_single_source(&source_entry()) {
            Err(Error::Configuration(msg)) => assert!(msg.contains("does not contain sources")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_sources() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "sources:\n");

        let mut config = SrvConfigFile::load(&path).unwrap();
        match config.set_single_source(&source_entry()) {
            Err(Error::Configuration(msg)) => assert!(msg.contains("does not contain any source")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_too_many_sources() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "sources:\n  a:\n    client_url: x\n  b:\n    client_url: y\n");

        let mut config = SrvConfigFile::load(&path).unwrap();
        match config.set_single_source(&source_entry()) {
            Err(Error::Configuration(msg)) => assert!(msg.contains("more than one source")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_not_a_mapping() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "- one\n- two\n");
        assert!(matches!(
            SrvConfigFile::load(&path),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_comments_are_detected() {
        let dir = tempdir().unwrap();

        let plain = SrvConfigFile::load(&write_config(dir.path(), CONFIG)).unwrap();
        assert!(!plain.has_comments());

        let commented = format!("# media server\n{}", CONFIG.replace("8000", "8000 # public port"));
        let config = SrvConfigFile::load(&write_config(dir.path(), &commented)).unwrap();
        assert!(config.has_comments());

        let anchor = "srv:\n  url: http://localhost/#top\nsources:\n  main: {}\n";
        let config = SrvConfigFile::load(&write_config(dir.path(), anchor)).unwrap();
        assert!(!config.has_comments());
    }
}

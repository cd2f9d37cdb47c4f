//! Configuration
//!
//! ```yaml
//! secreq:
//!   ipc:
//!     path: /var/run/nextgcore/secreq.sock
//!   s1ap:
//!     addr: 0.0.0.0:36412
//!     length_layout: aper
//!   security:
//!     integrity: EIA1
//!     ciphering: EEA0
//!     nas_security_param: 1
//! ```

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};

use ogs_nas::eps::{CipheringAlgorithm, IntegrityAlgorithm, NasSecurityAlgorithms};
use ogs_s1ap::S1apLengthLayout;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default IPC socket path
pub const DEFAULT_IPC_PATH: &str = "/var/run/nextgcore/secreq.sock";

/// S1AP SCTP port, reused for the TCP listener
pub const S1AP_PORT: u16 = 36412;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// IPC socket configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConf {
    pub path: PathBuf,
}

impl Default for IpcConf {
    fn default() -> Self {
        IpcConf {
            path: PathBuf::from(DEFAULT_IPC_PATH),
        }
    }
}

/// eNB-facing transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S1apConf {
    pub addr: SocketAddr,
    pub length_layout: S1apLengthLayout,
}

impl Default for S1apConf {
    fn default() -> Self {
        S1apConf {
            addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, S1AP_PORT)),
            length_layout: S1apLengthLayout::default(),
        }
    }
}

/// Selected NAS security
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConf {
    pub integrity: IntegrityAlgorithm,
    pub ciphering: CipheringAlgorithm,
    /// NAS key set identifier octet
    pub nas_security_param: u8,
}

impl Default for SecurityConf {
    fn default() -> Self {
        SecurityConf {
            integrity: IntegrityAlgorithm::Eia1,
            ciphering: CipheringAlgorithm::Eea0,
            nas_security_param: 1,
        }
    }
}

impl SecurityConf {
    pub fn algorithms(&self) -> NasSecurityAlgorithms {
        NasSecurityAlgorithms {
            ciphering: self.ciphering,
            integrity: self.integrity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecReqConfig {
    pub ipc: IpcConf,
    pub s1ap: S1apConf,
    pub security: SecurityConf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    secreq: SecReqConfig,
}

impl SecReqConfig {
    /// Parse the `secreq` section of a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        file.secreq.validate()?;
        Ok(file.secreq)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.nas_security_param > 0x0f {
            return Err(ConfigError::ValidationError(format!(
                "nas_security_param {} does not fit in a half octet",
                self.security.nas_security_param
            )));
        }
        if self.ipc.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError("ipc.path is empty".to_string()));
        }
        Ok(())
    }

    /// Load the configuration file, falling back to defaults when it cannot
    /// be read.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading configuration from: {}", path.display());

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Could not read config file '{}': {}. Using defaults.", path.display(), e);
                return Ok(Self::default());
            }
        };
        Self::from_yaml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SecReqConfig::default();
        assert_eq!(config.ipc.path, PathBuf::from(DEFAULT_IPC_PATH));
        assert_eq!(config.s1ap.addr.port(), 36412);
        assert_eq!(config.s1ap.length_layout, S1apLengthLayout::Aper);
        assert_eq!(config.security.algorithms().octet(), 0x01);
        assert_eq!(config.security.nas_security_param, 1);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
secreq:
  ipc:
    path: /tmp/secreq.sock
  s1ap:
    addr: 127.0.0.1:36413
    length_layout: canonical
  security:
    integrity: EIA2
    ciphering: EEA2
    nas_security_param: 3
"#;
        let config = SecReqConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.ipc.path, PathBuf::from("/tmp/secreq.sock"));
        assert_eq!(config.s1ap.addr, "127.0.0.1:36413".parse::<SocketAddr>().unwrap());
        assert_eq!(config.s1ap.length_layout, S1apLengthLayout::Canonical);
        assert_eq!(config.security.integrity, IntegrityAlgorithm::Eia2);
        assert_eq!(config.security.algorithms().octet(), 0x22);
        assert_eq!(config.security.nas_security_param, 3);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = SecReqConfig::from_yaml("secreq:\n  security:\n    integrity: EIA0\n").unwrap();
        assert_eq!(config.security.integrity, IntegrityAlgorithm::Eia0);
        assert_eq!(config.security.ciphering, CipheringAlgorithm::Eea0);
        assert_eq!(config.s1ap, S1apConf::default());

        let config = SecReqConfig::from_yaml("logger:\n  level: info\n").unwrap();
        assert_eq!(config, SecReqConfig::default());
    }

    #[test]
    fn test_rejects_unsupported_values() {
        assert!(matches!(
            SecReqConfig::from_yaml("secreq:\n  security:\n    integrity: EIA3\n"),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            SecReqConfig::from_yaml("secreq:\n  s1ap:\n    length_layout: ber\n"),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            SecReqConfig::from_yaml("secreq:\n  security:\n    nas_security_param: 16\n"),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = SecReqConfig::load(Path::new("/nonexistent/nextgcore/secreq.yaml")).unwrap();
        assert_eq!(config, SecReqConfig::default());
    }
}

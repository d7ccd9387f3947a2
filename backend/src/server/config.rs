//! Startup settings loaded via OrthoConfig and the server configuration
//! assembled from them.

use actix_web::cookie::{Key, SameSite};
use camino::Utf8PathBuf;
use chrono::Duration;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use medrep::inbound::http::session_config::SessionSettings;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_DATA_DIR: &str = "./data";
const UPLOADS_SUBDIR: &str = "uploads";

/// Process settings read from `MEDREP_*` variables, files and arguments.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MEDREP")]
pub struct ServerSettings {
    /// Interface to listen on.
    pub host: Option<String>,
    /// TCP port to listen on.
    #[ortho_config(default = 8080)]
    pub port: u16,
    /// Directory holding the JSON collections.
    pub data_dir: Option<String>,
    /// Directory holding uploaded product images.
    pub uploads_dir: Option<String>,
    /// Password for the administrator seeded on first start.
    pub admin_password: Option<String>,
    /// Days an operation log entry is kept before startup prunes it.
    #[ortho_config(default = 30)]
    pub operation_retention_days: u32,
}

impl ServerSettings {
    /// Return the configured host, falling back to all interfaces.
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Return the configured port.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Return the data directory, falling back to `./data`.
    pub fn data_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
    }

    /// Return the uploads directory, falling back to `<data_dir>/uploads`.
    pub fn uploads_dir(&self) -> Utf8PathBuf {
        self.uploads_dir
            .as_deref()
            .map_or_else(|| self.data_dir().join(UPLOADS_SUBDIR), Utf8PathBuf::from)
    }

    pub fn admin_password(&self) -> Option<&str> {
        self.admin_password.as_deref()
    }

    /// Return how long operation log entries are kept.
    pub fn operation_retention(&self) -> Duration {
        Duration::days(i64::from(self.operation_retention_days))
    }
}

/// Everything [`super::create_server`] needs besides the domain state.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) session_ttl: Duration,
    pub(crate) bind_addr: (String, u16),
}

impl ServerConfig {
    /// Combine validated session settings with the listen address.
    #[must_use]
    pub fn new(session: SessionSettings, settings: &ServerSettings) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
            ttl,
        } = session;
        Self {
            key,
            cookie_secure,
            same_site,
            session_ttl: ttl,
            bind_addr: (settings.host().to_owned(), settings.port()),
        }
    }

    /// Return the `host:port` pair the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        let (host, port) = &self.bind_addr;
        format!("{host}:{port}")
    }
}

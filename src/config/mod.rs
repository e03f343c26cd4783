use serde::Serialize;
use std::env;
use std::time::Duration;

use crate::song::{Tag, TagTypes};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 6600;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Parameters needed to open a connection to a catalog server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "redact")]
    pub password: Option<String>,
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
}

impl ConnectionParams {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// `host:port` pair suitable for socket address resolution
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Load connection parameters from `{prefix}_HOST`, `{prefix}_PORT`,
    /// `{prefix}_PASS` and `{prefix}_TIMEOUT_MS`, falling back to `fallback`
    fn from_env_prefixed(prefix: &str, fallback: &ConnectionParams) -> Self {
        Self {
            host: env::var(format!("{prefix}_HOST")).unwrap_or_else(|_| fallback.host.clone()),
            port: env::var(format!("{prefix}_PORT"))
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(fallback.port),
            password: env::var(format!("{prefix}_PASS"))
                .ok()
                .filter(|pass| !pass.is_empty())
                .or_else(|| fallback.password.clone()),
            timeout: env::var(format!("{prefix}_TIMEOUT_MS"))
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(fallback.timeout),
        }
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// Capabilities reported by the catalog server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Features {
    pub playlists: bool,
    pub stickers: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            playlists: true,
            stickers: true,
        }
    }
}

/// Live, mutable application state owned by the main thread.
///
/// Workers never see this directly, they get a
/// [`WorkerSnapshot`](crate::worker::WorkerSnapshot) copied from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedState {
    pub smartpls: bool,
    pub smartpls_sort: String,
    pub smartpls_prefix: String,
    pub tag_disc_empty_is_first: bool,
    pub smartpls_generate_tag_types: TagTypes,
    pub partition: String,
    pub features: Features,
    pub mpd: ConnectionParams,
    pub stickerdb: ConnectionParams,
}

impl SharedState {
    /// Load the shared state from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mpd = ConnectionParams::from_env_prefixed("MPD", &defaults.mpd);
        // The sticker database follows the primary server unless configured
        let stickerdb = ConnectionParams::from_env_prefixed("STICKERDB", &mpd);

        Self {
            smartpls: env_bool("SMARTPLS", defaults.smartpls),
            smartpls_sort: env::var("SMARTPLS_SORT").unwrap_or(defaults.smartpls_sort),
            smartpls_prefix: env::var("SMARTPLS_PREFIX").unwrap_or(defaults.smartpls_prefix),
            tag_disc_empty_is_first: env_bool(
                "TAG_DISC_EMPTY_IS_FIRST",
                defaults.tag_disc_empty_is_first,
            ),
            smartpls_generate_tag_types: env::var("SMARTPLS_GENERATE_TAG_TYPES")
                .map(|list| TagTypes::parse_list(&list))
                .unwrap_or(defaults.smartpls_generate_tag_types),
            partition: env::var("MPD_PARTITION").unwrap_or(defaults.partition),
            features: Features {
                playlists: env_bool("MPD_FEAT_PLAYLISTS", defaults.features.playlists),
                stickers: env_bool("MPD_FEAT_STICKERS", defaults.features.stickers),
            },
            mpd,
            stickerdb,
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            smartpls: true,
            smartpls_sort: String::new(),
            smartpls_prefix: "myMPDsmart".to_string(),
            tag_disc_empty_is_first: true,
            smartpls_generate_tag_types: [Tag::Genre].into_iter().collect(),
            partition: "default".to_string(),
            features: Features::default(),
            mpd: ConnectionParams::default(),
            stickerdb: ConnectionParams::default(),
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

fn redact<S: serde::Serializer>(_: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("********")
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "MPD_HOST",
        "MPD_PORT",
        "MPD_PASS",
        "MPD_TIMEOUT_MS",
        "STICKERDB_HOST",
        "STICKERDB_PORT",
        "STICKERDB_PASS",
        "STICKERDB_TIMEOUT_MS",
        "SMARTPLS",
        "SMARTPLS_SORT",
        "SMARTPLS_PREFIX",
        "TAG_DISC_EMPTY_IS_FIRST",
        "SMARTPLS_GENERATE_TAG_TYPES",
        "MPD_PARTITION",
        "MPD_FEAT_PLAYLISTS",
        "MPD_FEAT_STICKERS",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let state = SharedState::from_env();
        assert_eq!(state, SharedState::default());
    }

    #[test]
    #[serial]
    fn test_sticker_params_follow_primary() {
        clear_env();
        env::set_var("MPD_HOST", "music.local");
        env::set_var("MPD_PORT", "6601");
        env::set_var("STICKERDB_PORT", "6700");

        let state = SharedState::from_env();
        assert_eq!(state.mpd.host, "music.local");
        assert_eq!(state.mpd.port, 6601);
        assert_eq!(state.stickerdb.host, "music.local");
        assert_eq!(state.stickerdb.port, 6700);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        env::set_var("MPD_PORT", "not-a-port");
        env::set_var("SMARTPLS", "maybe");
        env::set_var("SMARTPLS_GENERATE_TAG_TYPES", "Artist,Album");

        let state = SharedState::from_env();
        assert_eq!(state.mpd.port, DEFAULT_PORT);
        assert!(state.smartpls);
        assert!(state.smartpls_generate_tag_types.contains(Tag::Album));
        assert!(!state.smartpls_generate_tag_types.contains(Tag::Genre));
        clear_env();
    }

    #[test]
    fn test_password_is_redacted() {
        let mut state = SharedState::default();
        state.mpd.password = Some("secret".to_string());
        let json = serde_json::to_string(&state).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("********"));
    }
}

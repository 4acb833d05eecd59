//! Autograph settings (`autograph.toml`).
//!
//! Defines the typed configuration persisted in the project root: the commit
//! policy (trigger + interval), the author identity, and the classifier's
//! exclusion globs. Missing fields use sensible defaults. Missing file → all
//! defaults (no error). Settings are written back on save-all and
//! termination, so every type here round-trips through serde.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AutographError;

/// File name of the persisted settings, relative to the project root.
pub const SETTINGS_FILE: &str = "autograph.toml";

// ---------------------------------------------------------------------------
// Top-level settings
// ---------------------------------------------------------------------------

/// Top-level autograph settings.
///
/// Parsed from `<root>/autograph.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Commit policy.
    #[serde(default)]
    pub commit: CommitPolicy,

    /// Author identity settings.
    #[serde(default)]
    pub author: AuthorConfig,

    /// Change classifier settings.
    #[serde(default)]
    pub classify: ClassifyConfig,
}

impl Settings {
    /// Load settings from `<root>/autograph.toml`.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load(root: &Path) -> Result<Self, AutographError> {
        let path = root.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AutographError::Settings {
                    path,
                    detail: e.to_string(),
                });
            }
        };
        toml::from_str(&raw).map_err(|e| AutographError::Settings {
            path,
            detail: e.to_string(),
        })
    }

    /// Persist settings to `<root>/autograph.toml`.
    pub fn save(&self, root: &Path) -> Result<(), AutographError> {
        let path = root.join(SETTINGS_FILE);
        let raw = toml::to_string_pretty(self).map_err(|e| AutographError::Settings {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        std::fs::write(&path, raw).map_err(|e| AutographError::Settings {
            path,
            detail: e.to_string(),
        })
    }

    /// Path of the settings file under `root`.
    #[must_use]
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(SETTINGS_FILE)
    }
}

// ---------------------------------------------------------------------------
// CommitPolicy
// ---------------------------------------------------------------------------

/// When commits happen.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommitPolicy {
    /// What drives commits.
    #[serde(default)]
    pub trigger: CommitTrigger,

    /// Minimum spacing between automatic commits. Meaningful only when
    /// `trigger = "automatic"`.
    #[serde(default)]
    pub interval: CommitInterval,
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self {
            trigger: CommitTrigger::default(),
            interval: CommitInterval::default(),
        }
    }
}

/// The configured commit trigger mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitTrigger {
    /// Commit only on explicit request.
    #[default]
    Manual,
    /// Commit on idle ticks, spaced by the configured interval.
    Automatic,
    /// Commit once, when the host terminates.
    OnExit,
    /// Never commit automatically; settings are flushed when the host
    /// reloads them.
    OnReload,
}

impl fmt::Display for CommitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Automatic => write!(f, "automatic"),
            Self::OnExit => write!(f, "on-exit"),
            Self::OnReload => write!(f, "on-reload"),
        }
    }
}

/// Recognized automatic-commit intervals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum CommitInterval {
    /// Every five minutes.
    #[serde(rename = "5m")]
    FiveMinutes,
    /// Every fifteen minutes.
    #[default]
    #[serde(rename = "15m")]
    FifteenMinutes,
    /// Every thirty minutes.
    #[serde(rename = "30m")]
    ThirtyMinutes,
    /// Every hour.
    #[serde(rename = "60m")]
    OneHour,
}

impl CommitInterval {
    /// The interval as a duration.
    #[must_use]
    pub const fn duration(self) -> Duration {
        match self {
            Self::FiveMinutes => Duration::from_secs(5 * 60),
            Self::FifteenMinutes => Duration::from_secs(15 * 60),
            Self::ThirtyMinutes => Duration::from_secs(30 * 60),
            Self::OneHour => Duration::from_secs(60 * 60),
        }
    }
}

impl fmt::Display for CommitInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FiveMinutes => write!(f, "5m"),
            Self::FifteenMinutes => write!(f, "15m"),
            Self::ThirtyMinutes => write!(f, "30m"),
            Self::OneHour => write!(f, "60m"),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthorConfig
// ---------------------------------------------------------------------------

/// Author identity settings.
///
/// When both fields are empty and `auto_fetch_config` is set, the session
/// fills them from the git config (`user.name` / `user.email`) at bootstrap.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorConfig {
    /// Author display name.
    #[serde(default)]
    pub name: String,

    /// Author e-mail address.
    #[serde(default)]
    pub email: String,

    /// Fall back to the git config when name and email are empty.
    #[serde(default = "default_auto_fetch_config")]
    pub auto_fetch_config: bool,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            auto_fetch_config: default_auto_fetch_config(),
        }
    }
}

const fn default_auto_fetch_config() -> bool {
    true
}

impl AuthorConfig {
    /// The configured identity, as the VCS layer consumes it.
    #[must_use]
    pub fn identity(&self) -> autograph_git::Identity {
        autograph_git::Identity::new(self.name.clone(), self.email.clone())
    }
}

// ---------------------------------------------------------------------------
// ClassifyConfig
// ---------------------------------------------------------------------------

/// Change classifier settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifyConfig {
    /// Glob patterns for paths the classifier never visits, in addition to
    /// whatever `.gitignore` excludes. Matched against `/`-separated paths
    /// relative to the project root.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
        }
    }
}

fn default_exclude() -> Vec<String> {
    vec![
        "Backup/**".to_owned(),
        "Source/Packages/**".to_owned(),
        "**/bin/**".to_owned(),
        "**/obj/**".to_owned(),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.commit.trigger, CommitTrigger::Manual);
        assert_eq!(settings.commit.interval, CommitInterval::FifteenMinutes);
        assert!(settings.author.auto_fetch_config);
    }

    #[test]
    fn parses_full_settings() {
        let settings: Settings = toml::from_str(
            r#"
            [commit]
            trigger = "automatic"
            interval = "5m"

            [author]
            name = "Jane Doe"
            email = "jane@example.com"
            auto_fetch_config = false

            [classify]
            exclude = ["target/**"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.commit.trigger, CommitTrigger::Automatic);
        assert_eq!(settings.commit.interval, CommitInterval::FiveMinutes);
        assert_eq!(settings.author.name, "Jane Doe");
        assert!(!settings.author.auto_fetch_config);
        assert_eq!(settings.classify.exclude, vec!["target/**"]);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<Settings, _> = toml::from_str("[commit]\nfrequency = \"5m\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unrecognized_interval() {
        let result: Result<Settings, _> = toml::from_str("[commit]\ninterval = \"7m\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn interval_durations() {
        assert_eq!(
            CommitInterval::FiveMinutes.duration(),
            Duration::from_secs(300)
        );
        assert_eq!(
            CommitInterval::OneHour.duration(),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn settings_roundtrip_through_toml() {
        let mut settings = Settings::default();
        settings.commit.trigger = CommitTrigger::OnExit;
        settings.author.name = "Jane".to_owned();

        let raw = toml::to_string_pretty(&settings).unwrap();
        let reparsed: Settings = toml::from_str(&raw).unwrap();
        assert_eq!(reparsed, settings);
    }

    #[test]
    fn load_missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.author.email = "jane@example.com".to_owned();
        settings.save(dir.path()).unwrap();

        let loaded = Settings::load(dir.path()).unwrap();
        assert_eq!(loaded, settings);
    }
}

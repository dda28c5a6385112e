use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::app::Size;

pub const QUEST_PATH_ENV_VAR: &str = "QUEST_RUNNER_QUEST_PATH";
pub const QUEST_PROPERTIES_FILE: &str = "quest.json";
/// Quest format this engine implements, as (major, minor).
pub const ENGINE_FORMAT_VERSION: FormatVersion = FormatVersion { major: 1, minor: 7 };
/// Oldest minor version of major 1 that still runs unchanged.
const OLDEST_COMPATIBLE_MINOR: u32 = 5;
/// Largest quest width or height in pixels.
pub const MAX_QUEST_DIMENSION: u32 = 4096;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] io::Error),
    #[error(
        "no quest found at {path}\n\
A quest directory must contain {file}. Pass the directory as the first argument or set {env_var}."
    )]
    QuestNotFound {
        path: PathBuf,
        file: &'static str,
        env_var: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum QuestError {
    #[error("failed to read quest properties {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid quest properties {path} at {field}: {message}")]
    Parse {
        path: PathBuf,
        field: String,
        message: String,
    },
    #[error("invalid format_version '{0}' (expected major.minor[.patch])")]
    BadFormatVersion(String),
    #[error("no format_version is specified in the quest properties")]
    MissingFormatVersion,
    #[error(
        "this quest is made for format {quest}.x but this engine runs format {engine}"
    )]
    Incompatible {
        quest: FormatVersion,
        engine: FormatVersion,
    },
    #[error("invalid normal_quest_size {width}x{height} (each side must be 1..={MAX_QUEST_DIMENSION})")]
    BadQuestSize { width: u32, height: u32 },
}

/// Major and minor numbers of a quest format. The patch number never
/// affects compatibility and is dropped when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for FormatVersion {
    type Err = QuestError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let bad = || QuestError::BadFormatVersion(raw.to_string());
        let mut parts = raw.trim().split('.');
        let major = parts.next().ok_or_else(bad)?.parse::<u32>().map_err(|_| bad())?;
        let minor = parts.next().ok_or_else(bad)?.parse::<u32>().map_err(|_| bad())?;
        if let Some(patch) = parts.next() {
            patch.parse::<u32>().map_err(|_| bad())?;
        }
        if parts.next().is_some() {
            return Err(bad());
        }
        Ok(Self { major, minor })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QuestSize {
    pub width: u32,
    pub height: u32,
}

impl Default for QuestSize {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestProperties {
    #[serde(default)]
    pub format_version: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub quest_version: String,
    #[serde(default)]
    pub dynamic_timestep: bool,
    #[serde(default)]
    pub normal_quest_size: QuestSize,
}

impl QuestProperties {
    pub fn load(quest_dir: &Path) -> Result<Self, QuestError> {
        let path = quest_dir.join(QUEST_PROPERTIES_FILE);
        let raw = fs::read_to_string(&path).map_err(|source| QuestError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&raw, &path)
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Self, QuestError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| QuestError::Parse {
            path: path.to_path_buf(),
            field: error.path().to_string(),
            message: error.inner().to_string(),
        })
    }

    pub fn format_version(&self) -> Result<FormatVersion, QuestError> {
        match self.format_version.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.parse(),
            _ => Err(QuestError::MissingFormatVersion),
        }
    }

    /// Fails unless this engine can run the quest.
    pub fn check_compatibility(&self) -> Result<FormatVersion, QuestError> {
        let quest = self.format_version()?;
        check_format_version(quest, ENGINE_FORMAT_VERSION)?;
        let QuestSize { width, height } = self.normal_quest_size;
        let in_range = |side: u32| (1..=MAX_QUEST_DIMENSION).contains(&side);
        if !in_range(width) || !in_range(height) {
            return Err(QuestError::BadQuestSize { width, height });
        }
        Ok(quest)
    }

    /// Window title for the quest, or `None` when the quest has no title.
    pub fn window_title(&self) -> Option<String> {
        if self.title.is_empty() {
            return None;
        }
        let mut window_title = self.title.clone();
        if !self.quest_version.is_empty() {
            window_title.push(' ');
            window_title.push_str(&self.quest_version);
        }
        window_title.push_str(&format!(" - Engine {}", env!("CARGO_PKG_VERSION")));
        Some(window_title)
    }

    pub fn quest_size(&self) -> Size {
        Size::new(self.normal_quest_size.width, self.normal_quest_size.height)
    }
}

pub fn check_format_version(quest: FormatVersion, engine: FormatVersion) -> Result<(), QuestError> {
    if quest.major == 0 {
        return Err(QuestError::MissingFormatVersion);
    }
    let compatible = quest.major == engine.major
        && quest.minor <= engine.minor
        && !(quest.major == 1 && quest.minor < OLDEST_COMPATIBLE_MINOR);
    if compatible {
        Ok(())
    } else {
        Err(QuestError::Incompatible { quest, engine })
    }
}

/// Picks the quest directory: explicit path, then the environment, then
/// `./data`, then the current directory.
pub fn resolve_quest_dir(explicit: Option<&Path>) -> Result<PathBuf, StartupError> {
    if let Some(path) = explicit {
        return require_quest_dir(path);
    }

    match env::var(QUEST_PATH_ENV_VAR) {
        Ok(value) => return require_quest_dir(Path::new(&value)),
        Err(env::VarError::NotPresent) => {}
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: QUEST_PATH_ENV_VAR,
                source,
            })
        }
    }

    let cwd = env::current_dir().map_err(StartupError::CurrentDir)?;
    let data_dir = cwd.join("data");
    if is_quest_dir(&data_dir) {
        return Ok(normalize_path(&data_dir));
    }
    require_quest_dir(&cwd)
}

fn require_quest_dir(path: &Path) -> Result<PathBuf, StartupError> {
    let normalized = normalize_path(path);
    if is_quest_dir(&normalized) {
        Ok(normalized)
    } else {
        Err(StartupError::QuestNotFound {
            path: normalized,
            file: QUEST_PROPERTIES_FILE,
            env_var: QUEST_PATH_ENV_VAR,
        })
    }
}

fn is_quest_dir(path: &Path) -> bool {
    path.join(QUEST_PROPERTIES_FILE).is_file()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(major: u32, minor: u32) -> FormatVersion {
        FormatVersion { major, minor }
    }

    fn write_quest(dir: &Path, json: &str) {
        fs::write(dir.join(QUEST_PROPERTIES_FILE), json).expect("write quest.json");
    }

    #[test]
    fn format_version_ignores_patch() {
        assert_eq!("1.6.4".parse::<FormatVersion>().expect("parse"), version(1, 6));
        assert_eq!("1.7".parse::<FormatVersion>().expect("parse"), version(1, 7));
        assert!("1".parse::<FormatVersion>().is_err());
        assert!("1.x".parse::<FormatVersion>().is_err());
        assert!("1.2.3.4".parse::<FormatVersion>().is_err());
    }

    #[test]
    fn compatibility_follows_major_and_minor_rules() {
        let engine = version(1, 7);
        assert!(check_format_version(version(1, 7), engine).is_ok());
        assert!(check_format_version(version(1, 5), engine).is_ok());
        assert!(check_format_version(version(1, 4), engine).is_err());
        assert!(check_format_version(version(1, 8), engine).is_err());
        assert!(check_format_version(version(2, 0), engine).is_err());
        assert!(matches!(
            check_format_version(version(0, 9), engine),
            Err(QuestError::MissingFormatVersion)
        ));
    }

    #[test]
    fn missing_format_version_is_an_error() {
        let properties = QuestProperties::default();
        assert!(matches!(
            properties.check_compatibility(),
            Err(QuestError::MissingFormatVersion)
        ));
    }

    #[test]
    fn quest_size_must_fit_the_engine_limits() {
        let sized = |width: u32, height: u32| QuestProperties {
            format_version: Some("1.7".to_string()),
            normal_quest_size: QuestSize { width, height },
            ..QuestProperties::default()
        };

        assert!(sized(MAX_QUEST_DIMENSION, 240).check_compatibility().is_ok());
        let rejected = [(0, 240), (320, 0), (u32::MAX, 240), (320, MAX_QUEST_DIMENSION + 1)];
        for (width, height) in rejected {
            assert!(matches!(
                sized(width, height).check_compatibility(),
                Err(QuestError::BadQuestSize { .. })
            ));
        }
    }

    #[test]
    fn window_title_joins_title_and_version() {
        let mut properties = QuestProperties {
            title: "Mystery Isle".to_string(),
            quest_version: "1.2".to_string(),
            ..QuestProperties::default()
        };
        let title = properties.window_title().expect("title");
        assert!(title.starts_with("Mystery Isle 1.2 - Engine "), "{title}");

        properties.quest_version.clear();
        let title = properties.window_title().expect("title");
        assert!(title.starts_with("Mystery Isle - Engine "), "{title}");

        properties.title.clear();
        assert_eq!(properties.window_title(), None);
    }

    #[test]
    fn load_reads_properties_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_quest(
            dir.path(),
            r#"{ "format_version": "1.6", "title": "Test", "dynamic_timestep": true }"#,
        );

        let properties = QuestProperties::load(dir.path()).expect("load");

        assert_eq!(properties.title, "Test");
        assert!(properties.dynamic_timestep);
        assert_eq!(properties.quest_size(), Size::new(320, 240));
        assert_eq!(properties.check_compatibility().expect("compatible"), version(1, 6));
    }

    #[test]
    fn parse_errors_name_the_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_quest(
            dir.path(),
            r#"{ "format_version": "1.7", "normal_quest_size": { "width": "wide", "height": 240 } }"#,
        );

        let error = QuestProperties::load(dir.path()).expect_err("bad width");
        match error {
            QuestError::Parse { field, .. } => assert_eq!(field, "normal_quest_size.width"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn explicit_quest_dir_must_hold_properties() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            resolve_quest_dir(Some(dir.path())),
            Err(StartupError::QuestNotFound { .. })
        ));

        write_quest(dir.path(), "{}");
        let resolved = resolve_quest_dir(Some(dir.path())).expect("resolve");
        assert!(resolved.join(QUEST_PROPERTIES_FILE).is_file());
    }
}

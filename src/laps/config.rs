use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::render::race_slug;
use crate::chart::export::ExportTarget;

pub const DEFAULT_PORT: u16 = 8050;
pub const PORT_ENV: &str = "PORT";

/// One Grand Prix in the comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaceSpec {
    /// Display name, e.g. `"Great Britain"`.
    pub name: String,
    /// Text to look for in the provider's meeting name when it differs from
    /// the display name (`"British"` for Great Britain).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting: Option<String>,
}

impl RaceSpec {
    pub fn new(name: &str) -> Self {
        RaceSpec {
            name: name.to_string(),
            meeting: None,
        }
    }

    pub fn with_meeting(name: &str, meeting: &str) -> Self {
        RaceSpec {
            name: name.to_string(),
            meeting: Some(meeting.to_string()),
        }
    }

    pub fn lookup_key(&self) -> &str {
        self.meeting.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("exactly two seasons are compared, got {0}")]
    SeasonCount(usize),
    #[error("season {0} is listed twice")]
    DuplicateSeason(u16),
    #[error("no drivers configured")]
    NoDrivers,
    #[error("no races configured")]
    NoRaces,
    #[error("race '{0}' is listed twice")]
    DuplicateRace(String),
    #[error("race name '{0}' has no letters or digits")]
    UnnamedRace(String),
    #[error("invalid PORT value '{0}'")]
    InvalidPort(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LapConfig {
    /// Label used in chart titles.
    pub team: String,
    pub seasons: Vec<u16>,
    /// Three-letter driver codes.
    pub drivers: Vec<String>,
    pub session: String,
    pub races: Vec<RaceSpec>,
    pub cache_dir: PathBuf,
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub export_path: PathBuf,
    pub versioned_exports: bool,
    pub port: u16,
}

impl Default for LapConfig {
    fn default() -> Self {
        Self {
            team: "Mercedes".to_string(),
            seasons: vec![2023, 2024],
            drivers: vec!["HAM".to_string(), "RUS".to_string()],
            session: "Race".to_string(),
            races: default_races(),
            cache_dir: PathBuf::from("cache"),
            api_base: "https://api.openf1.org/v1".to_string(),
            request_timeout_secs: 30,
            export_path: PathBuf::from("f1_lap_times_dashboard.html"),
            versioned_exports: false,
            port: DEFAULT_PORT,
        }
    }
}

/// The 2023/2024 calendar up to Brazil.  Meeting keywords follow the
/// provider's "<adjective> Grand Prix" naming.
fn default_races() -> Vec<RaceSpec> {
    vec![
        RaceSpec::new("Bahrain"),
        RaceSpec::new("Saudi Arabia"),
        RaceSpec::new("Australia"),
        RaceSpec::new("Azerbaijan"),
        RaceSpec::new("Miami"),
        RaceSpec::new("Emilia Romagna"),
        RaceSpec::new("Monaco"),
        RaceSpec::with_meeting("Spain", "Spanish"),
        RaceSpec::with_meeting("Canada", "Canadian"),
        RaceSpec::new("Austria"),
        RaceSpec::with_meeting("Great Britain", "British"),
        RaceSpec::with_meeting("Hungary", "Hungarian"),
        RaceSpec::with_meeting("Belgium", "Belgian"),
        RaceSpec::with_meeting("Netherlands", "Dutch"),
        RaceSpec::with_meeting("Italy", "Italian"),
        RaceSpec::new("Singapore"),
        RaceSpec::with_meeting("Japan", "Japanese"),
        RaceSpec::new("United States"),
        RaceSpec::new("Mexico"),
        RaceSpec::with_meeting("Brazil", "São Paulo"),
    ]
}

impl LapConfig {
    /// Read a YAML config; missing keys keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading lap config {}", path_ref.display()))?;
        let config: LapConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing lap config {}", path_ref.display()))?;
        config
            .validate()
            .with_context(|| format!("validating lap config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_seasons(&self.seasons)?;
        if self.drivers.is_empty() {
            return Err(ConfigError::NoDrivers);
        }
        if self.races.is_empty() {
            return Err(ConfigError::NoRaces);
        }
        // Reports are written to `<slug>.html`, so names must differ by slug.
        let mut slugs: Vec<String> = Vec::with_capacity(self.races.len());
        for race in &self.races {
            let slug = race_slug(&race.name);
            if slug.is_empty() {
                return Err(ConfigError::UnnamedRace(race.name.clone()));
            }
            if slugs.contains(&slug) {
                return Err(ConfigError::DuplicateRace(race.name.clone()));
            }
            slugs.push(slug);
        }
        Ok(())
    }

    /// Apply the `PORT` override from the environment, if set.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(raw) = std::env::var(PORT_ENV) {
            self.port = parse_port(&raw)?;
        }
        Ok(())
    }

    pub fn race_names(&self) -> Vec<String> {
        self.races.iter().map(|r| r.name.clone()).collect()
    }

    pub fn export_target(&self) -> ExportTarget {
        ExportTarget {
            path: self.export_path.clone(),
            versioned: self.versioned_exports,
        }
    }

    /// `"2023 vs 2024"`
    pub fn seasons_label(&self) -> String {
        seasons_label(&self.seasons)
    }
}

/// Exactly two distinct seasons.
pub fn validate_seasons(seasons: &[u16]) -> Result<(), ConfigError> {
    if seasons.len() != 2 {
        return Err(ConfigError::SeasonCount(seasons.len()));
    }
    if seasons[0] == seasons[1] {
        return Err(ConfigError::DuplicateSeason(seasons[0]));
    }
    Ok(())
}

pub fn seasons_label(seasons: &[u16]) -> String {
    seasons
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(" vs ")
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_cover_twenty_races_and_validate() {
        let cfg = LapConfig::default();
        assert_eq!(cfg.races.len(), 20);
        assert_eq!(cfg.races[0].name, "Bahrain");
        assert_eq!(cfg.seasons_label(), "2023 vs 2024");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_load_reads_partial_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"team: Ferrari\ndrivers: [LEC, SAI]\nraces:\n  - name: Monaco\n  - name: Great Britain\n    meeting: British\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = LapConfig::load(&path).unwrap();
        assert_eq!(cfg.team, "Ferrari");
        assert_eq!(cfg.races.len(), 2);
        assert_eq!(cfg.races[1].lookup_key(), "British");
        assert_eq!(cfg.seasons, vec![2023, 2024]);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[test]
    fn validation_rejects_bad_configs() {
        let mut cfg = LapConfig {
            seasons: vec![2024],
            ..LapConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::SeasonCount(1)));

        cfg.seasons = vec![2023, 2024];
        cfg.races.push(RaceSpec::new("Monaco"));
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateRace("Monaco".into()))
        );

        cfg.races.clear();
        assert_eq!(cfg.validate(), Err(ConfigError::NoRaces));
    }

    #[test]
    fn repeated_season_is_rejected() {
        let cfg = LapConfig {
            seasons: vec![2023, 2023],
            ..LapConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::DuplicateSeason(2023)));
    }

    #[test]
    fn race_names_must_differ_as_report_file_names() {
        let mut cfg = LapConfig {
            races: vec![RaceSpec::new("Spain"), RaceSpec::new("spain ")],
            ..LapConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateRace("spain ".into()))
        );

        cfg.races = vec![RaceSpec::new("Spain"), RaceSpec::new("?!")];
        assert_eq!(cfg.validate(), Err(ConfigError::UnnamedRace("?!".into())));
    }

    #[test]
    fn port_parsing() {
        assert_eq!(parse_port(" 9000 "), Ok(9000));
        assert!(parse_port("eighty").is_err());
        assert!(parse_port("70000").is_err());
    }
}

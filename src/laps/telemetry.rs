use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::config::{LapConfig, RaceSpec};
use super::model::LapRecord;

// ---------------------------------------------------------------------------
// Source abstraction
// ---------------------------------------------------------------------------

/// Anything that can produce per-driver lap durations for one race session.
pub trait LapSource {
    /// One [`LapRecord`] per requested driver, in the order given.  Drivers
    /// without laps get an empty record rather than an error.
    fn race_laps(
        &self,
        season: u16,
        race: &RaceSpec,
        session: &str,
        drivers: &[String],
    ) -> Result<Vec<LapRecord>, TelemetryError>;
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cache file {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no {season} meeting matching '{keyword}'")]
    MeetingNotFound { season: u16, keyword: String },
    #[error("no '{session}' session in {meeting}")]
    SessionNotFound { meeting: String, session: String },
    #[error("lap number {lap} is beyond the {MAX_LAP_NUMBER}-lap limit")]
    LapOutOfRange { lap: u32 },
}

/// Upper bound on a believable lap number; no Grand Prix comes close.
pub const MAX_LAP_NUMBER: u32 = 200;

// ---------------------------------------------------------------------------
// Raw-response disk cache
// ---------------------------------------------------------------------------

/// One JSON file per request under `dir`, named after endpoint and query.
/// Entries never expire.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ResponseCache { dir: dir.into() }
    }

    /// `("laps", [("session_key", "9472"), ("driver_number", "44")])`
    /// → `laps__driver_number-44__session_key-9472`
    pub fn key(endpoint: &str, query: &[(&str, String)]) -> String {
        let mut parts: Vec<String> = query
            .iter()
            .map(|(k, v)| format!("{}-{}", sanitize(k), sanitize(v)))
            .collect();
        parts.sort();
        let mut key = sanitize(endpoint);
        for part in parts {
            key.push_str("__");
            key.push_str(&part);
        }
        key
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, TelemetryError> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(TelemetryError::Cache { path, source }),
        }
    }

    /// Store `body`, creating the cache directory on first use.  The entry
    /// appears whole or not at all.
    pub fn put(&self, key: &str, body: &str) -> Result<(), TelemetryError> {
        let dir_err = |source: std::io::Error| TelemetryError::Cache {
            path: self.dir.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(dir_err)?;
        let mut temp = tempfile::NamedTempFile::new_in(&self.dir).map_err(dir_err)?;
        temp.write_all(body.as_bytes()).map_err(dir_err)?;

        let path = self.path(key);
        temp.persist(&path).map_err(|e| TelemetryError::Cache {
            path,
            source: e.error,
        })?;
        Ok(())
    }

    /// Drop an entry; a missing entry is not an error.
    pub fn remove(&self, key: &str) -> Result<(), TelemetryError> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TelemetryError::Cache { path, source }),
        }
    }
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

// ---------------------------------------------------------------------------
// OpenF1 wire types (only the fields we read)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Meeting {
    pub meeting_key: u32,
    pub meeting_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Session {
    session_key: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct Driver {
    driver_number: u32,
    name_acronym: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLap {
    pub lap_number: u32,
    pub lap_duration: Option<f64>,
}

/// First non-testing meeting whose name contains `keyword`, ignoring case.
pub fn find_meeting<'a>(meetings: &'a [Meeting], keyword: &str) -> Option<&'a Meeting> {
    let keyword = keyword.to_lowercase();
    meetings.iter().find(|m| {
        let name = m.meeting_name.to_lowercase();
        !name.contains("testing") && name.contains(&keyword)
    })
}

/// Dense per-lap durations: position `n - 1` holds lap `n`.  Laps the
/// provider omits, and durations that are missing, negative or non-finite,
/// stay `None`.  A lap number above [`MAX_LAP_NUMBER`] rejects the record.
pub fn shape_laps(mut raw: Vec<RawLap>) -> Result<Vec<Option<f64>>, TelemetryError> {
    raw.retain(|lap| lap.lap_number > 0);
    raw.sort_by_key(|lap| lap.lap_number);
    let total = raw.last().map_or(0, |lap| lap.lap_number);
    if total > MAX_LAP_NUMBER {
        return Err(TelemetryError::LapOutOfRange { lap: total });
    }
    let mut durations = vec![None; total as usize];
    for lap in raw {
        durations[lap.lap_number as usize - 1] = lap
            .lap_duration
            .filter(|d| d.is_finite() && *d >= 0.0);
    }
    Ok(durations)
}

// ---------------------------------------------------------------------------
// OpenF1 client
// ---------------------------------------------------------------------------

/// Blocking client for the OpenF1 REST API with an on-disk response cache.
pub struct OpenF1Client {
    http: reqwest::blocking::Client,
    base: String,
    cache: ResponseCache,
}

impl OpenF1Client {
    pub fn new(config: &LapConfig) -> Result<Self, TelemetryError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("dashkit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| TelemetryError::Http {
                url: config.api_base.clone(),
                source,
            })?;
        Ok(OpenF1Client {
            http,
            base: config.api_base.trim_end_matches('/').to_string(),
            cache: ResponseCache::new(&config.cache_dir),
        })
    }

    fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, TelemetryError> {
        let url = format!("{}/{endpoint}", self.base);
        let key = ResponseCache::key(endpoint, query);

        if let Some(body) = self.cache.get(&key)? {
            match serde_json::from_str(&body) {
                Ok(items) => {
                    log::debug!("cache hit {key}");
                    return Ok(items);
                }
                Err(e) => {
                    log::warn!("discarding unreadable cache entry {key}: {e}");
                    self.cache.remove(&key)?;
                }
            }
        }

        log::debug!("GET {url} {query:?}");
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .map_err(|source| TelemetryError::Http {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(|source| TelemetryError::Http {
            url: url.clone(),
            source,
        })?;
        let items: Vec<T> = serde_json::from_str(&body)
            .map_err(|source| TelemetryError::Decode { url, source })?;
        // An empty answer usually means the session has not happened yet.
        if !items.is_empty() {
            self.cache.put(&key, &body)?;
        }
        Ok(items)
    }

    pub fn meetings(&self, season: u16) -> Result<Vec<Meeting>, TelemetryError> {
        self.get("meetings", &Self::meetings_query(season))
    }

    /// Meetings straight from the provider, replacing any cached list.
    fn refresh_meetings(&self, season: u16) -> Result<Vec<Meeting>, TelemetryError> {
        let query = Self::meetings_query(season);
        self.cache.remove(&ResponseCache::key("meetings", &query))?;
        self.get("meetings", &query)
    }

    fn meetings_query(season: u16) -> [(&'static str, String); 1] {
        [("year", season.to_string())]
    }

    /// Look `race` up in the season's meetings.  A cached calendar that lacks
    /// the race is refetched once, since the provider adds meetings as the
    /// season goes on.
    fn find_race_meeting(&self, season: u16, race: &RaceSpec) -> Result<Meeting, TelemetryError> {
        let keyword = race.lookup_key();
        if let Some(meeting) = find_meeting(&self.meetings(season)?, keyword) {
            return Ok(meeting.clone());
        }
        log::debug!("{season} calendar has no '{keyword}', refreshing");
        find_meeting(&self.refresh_meetings(season)?, keyword)
            .cloned()
            .ok_or_else(|| TelemetryError::MeetingNotFound {
                season,
                keyword: keyword.to_string(),
            })
    }

    fn session_key(&self, meeting: &Meeting, session: &str) -> Result<u32, TelemetryError> {
        let sessions: Vec<Session> = self.get(
            "sessions",
            &[
                ("meeting_key", meeting.meeting_key.to_string()),
                ("session_name", session.to_string()),
            ],
        )?;
        sessions
            .first()
            .map(|s| s.session_key)
            .ok_or_else(|| TelemetryError::SessionNotFound {
                meeting: meeting.meeting_name.clone(),
                session: session.to_string(),
            })
    }

    fn driver_numbers(&self, session_key: u32) -> Result<BTreeMap<String, u32>, TelemetryError> {
        let drivers: Vec<Driver> = self.get("drivers", &[("session_key", session_key.to_string())])?;
        Ok(drivers
            .into_iter()
            .filter_map(|d| Some((d.name_acronym?.to_ascii_uppercase(), d.driver_number)))
            .collect())
    }

    fn laps(&self, session_key: u32, driver_number: u32) -> Result<Vec<RawLap>, TelemetryError> {
        self.get(
            "laps",
            &[
                ("session_key", session_key.to_string()),
                ("driver_number", driver_number.to_string()),
            ],
        )
    }
}

impl LapSource for OpenF1Client {
    fn race_laps(
        &self,
        season: u16,
        race: &RaceSpec,
        session: &str,
        drivers: &[String],
    ) -> Result<Vec<LapRecord>, TelemetryError> {
        let meeting = self.find_race_meeting(season, race)?;
        let session_key = self.session_key(&meeting, session)?;
        let numbers = self.driver_numbers(session_key)?;

        drivers
            .iter()
            .map(|code| -> Result<LapRecord, TelemetryError> {
                match numbers.get(&code.to_ascii_uppercase()) {
                    Some(&number) => {
                        let durations = shape_laps(self.laps(session_key, number)?)?;
                        Ok(LapRecord::new(code.clone(), durations))
                    }
                    None => {
                        log::warn!(
                            "{code} did not take part in the {season} {} {session}",
                            meeting.meeting_name
                        );
                        Ok(LapRecord::empty(code.clone()))
                    }
                }
            })
            .collect()
    }
}

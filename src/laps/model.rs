use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LapRecord – one driver's laps in one race of one season
// ---------------------------------------------------------------------------

/// Lap durations in seconds, index 0 = lap 1.  `None` marks a lap the
/// provider listed without a usable time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub driver: String,
    pub durations: Vec<Option<f64>>,
}

impl LapRecord {
    pub fn new(driver: impl Into<String>, durations: Vec<Option<f64>>) -> Self {
        LapRecord {
            driver: driver.into(),
            durations,
        }
    }

    pub fn empty(driver: impl Into<String>) -> Self {
        Self::new(driver, Vec::new())
    }

    pub fn lap_count(&self) -> usize {
        self.durations.len()
    }
}

// ---------------------------------------------------------------------------
// Aggregation: race → season → drivers
// ---------------------------------------------------------------------------

/// What the fetch step produced for one `(race, season)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SeasonOutcome {
    Loaded { drivers: Vec<LapRecord> },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonLaps {
    pub season: u16,
    pub outcome: SeasonOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceLaps {
    pub race: String,
    pub seasons: Vec<SeasonLaps>,
}

impl RaceLaps {
    pub fn failures(&self) -> impl Iterator<Item = (u16, &str)> {
        self.seasons.iter().filter_map(|s| match &s.outcome {
            SeasonOutcome::Failed { reason } => Some((s.season, reason.as_str())),
            SeasonOutcome::Loaded { .. } => None,
        })
    }
}

/// Everything fetched for one run, in configured race order.  Read-only
/// once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LapAggregation {
    /// Chart title prefix, e.g. the team name.
    pub label: String,
    pub seasons: Vec<u16>,
    pub races: Vec<RaceLaps>,
}

impl LapAggregation {
    pub fn race(&self, name: &str) -> Option<&RaceLaps> {
        self.races.iter().find(|r| r.race == name)
    }

    pub fn race_names(&self) -> Vec<String> {
        self.races.iter().map(|r| r.race.clone()).collect()
    }

    /// Number of `(race, season)` fetches that failed.
    pub fn failure_count(&self) -> usize {
        self.races.iter().map(|r| r.failures().count()).sum()
    }
}

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use super::config::{validate_seasons, LapConfig};
use super::model::{LapAggregation, RaceLaps, SeasonLaps, SeasonOutcome};
use super::telemetry::LapSource;

/// Fetch every configured race for every season, one blocking call at a time.
///
/// A failed `(race, season)` is logged and kept as
/// [`SeasonOutcome::Failed`]; the remaining races are still fetched.
pub fn build_aggregation(source: &dyn LapSource, config: &LapConfig) -> LapAggregation {
    let mut races = Vec::with_capacity(config.races.len());

    for race in &config.races {
        let seasons = config
            .seasons
            .iter()
            .map(|&season| {
                let outcome =
                    match source.race_laps(season, race, &config.session, &config.drivers) {
                        Ok(drivers) => {
                            log::info!(
                                "{season} {}: {} laps across {} drivers",
                                race.name,
                                drivers.iter().map(|d| d.lap_count()).sum::<usize>(),
                                drivers.len()
                            );
                            SeasonOutcome::Loaded { drivers }
                        }
                        Err(e) => {
                            log::warn!("{season} {}: fetch failed: {e}", race.name);
                            SeasonOutcome::Failed {
                                reason: e.to_string(),
                            }
                        }
                    };
                SeasonLaps { season, outcome }
            })
            .collect();

        races.push(RaceLaps {
            race: race.name.clone(),
            seasons,
        });
    }

    let aggregation = LapAggregation {
        label: config.team.clone(),
        seasons: config.seasons.clone(),
        races,
    };
    if aggregation.failure_count() > 0 {
        log::warn!(
            "{} of {} race fetches failed",
            aggregation.failure_count(),
            config.races.len() * config.seasons.len()
        );
    }
    aggregation
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

pub fn save_snapshot(aggregation: &LapAggregation, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(aggregation).context("serialising lap data")?;
    fs::write(path, json).with_context(|| format!("writing snapshot {}", path.display()))?;
    log::info!("Saved lap data to {}", path.display());
    Ok(())
}

/// Read a snapshot written by [`save_snapshot`] and check it still
/// describes a two-season comparison.
pub fn load_snapshot(path: &Path) -> Result<LapAggregation> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let aggregation: LapAggregation = serde_json::from_str(&text)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;

    validate_seasons(&aggregation.seasons)
        .with_context(|| format!("validating snapshot {}", path.display()))?;
    for race in &aggregation.races {
        let seasons: Vec<u16> = race.seasons.iter().map(|s| s.season).collect();
        if seasons != aggregation.seasons {
            bail!(
                "snapshot {}: {} covers seasons {seasons:?}, expected {:?}",
                path.display(),
                race.race,
                aggregation.seasons
            );
        }
    }
    Ok(aggregation)
}

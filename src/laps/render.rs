use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::seasons_label;
use super::model::{LapAggregation, SeasonOutcome};
use crate::chart::export::export_html;
use crate::chart::{Annotation, Figure, Layout, LineStyle, Trace};
use crate::color::SeriesColors;

#[derive(Debug, Error, PartialEq)]
pub enum LapError {
    #[error("unknown race '{0}'")]
    UnknownRace(String),
}

/// Line dash per season position: earlier seasons dotted, the latest solid.
const SEASON_DASHES: [&str; 2] = ["dot", "solid"];

/// Build the comparison chart for one race.  Pure: reads the aggregation,
/// touches nothing else.
pub fn render_chart(aggregation: &LapAggregation, race: &str) -> Result<Figure, LapError> {
    let race_laps = aggregation
        .race(race)
        .ok_or_else(|| LapError::UnknownRace(race.to_string()))?;

    let title = format!(
        "{} Lap Times: {race} GP ({})",
        aggregation.label,
        seasons_label(&aggregation.seasons)
    );
    let mut layout = Layout::new(title, "Lap Number", "Lap Time (seconds)")
        .with_legend_title("Driver & Year")
        .dark();

    let drivers = race_laps.seasons.iter().flat_map(|s| match &s.outcome {
        SeasonOutcome::Loaded { drivers } => {
            drivers.iter().map(|d| d.driver.clone()).collect::<Vec<_>>()
        }
        SeasonOutcome::Failed { .. } => Vec::new(),
    });
    let mut keys: Vec<String> = Vec::new();
    for driver in drivers {
        if !keys.contains(&driver) {
            keys.push(driver);
        }
    }
    let colors = SeriesColors::new(keys);

    let mut figure_traces = Vec::new();
    for (position, season) in race_laps.seasons.iter().enumerate() {
        match &season.outcome {
            SeasonOutcome::Loaded { drivers } => {
                let dash = SEASON_DASHES[position.min(SEASON_DASHES.len() - 1)];
                for record in drivers {
                    figure_traces.push(
                        Trace::lines(
                            format!("{} - {}", record.driver, season.season),
                            record.durations.clone(),
                        )
                        .with_line(LineStyle {
                            color: colors.hex_for(&record.driver),
                            dash: dash.to_string(),
                        }),
                    );
                }
            }
            SeasonOutcome::Failed { reason } => {
                let row = layout.annotations.len();
                layout.annotations.push(Annotation::note(
                    format!("{}: data unavailable ({reason})", season.season),
                    row,
                ));
            }
        }
    }

    let mut figure = Figure::new(layout);
    for trace in figure_traces {
        figure.add_trace(trace);
    }
    Ok(figure)
}

/// Every race's chart, in configured order, built up front.
pub fn render_all(aggregation: &LapAggregation) -> Vec<(String, Figure)> {
    aggregation
        .races
        .iter()
        .filter_map(|r| {
            render_chart(aggregation, &r.race)
                .ok()
                .map(|fig| (r.race.clone(), fig))
        })
        .collect()
}

/// `"Emilia Romagna"` → `"emilia-romagna"`
pub fn race_slug(race: &str) -> String {
    let mut slug = String::with_capacity(race.len());
    for ch in race.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Write one standalone HTML chart per race into `out_dir`.
pub fn write_reports(charts: &[(String, Figure)], out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    charts
        .iter()
        .map(|(race, figure)| {
            let path = out_dir.join(format!("{}.html", race_slug(race)));
            export_html(figure, &path).with_context(|| format!("writing chart for {race}"))?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::laps::aggregate::build_aggregation;
    use crate::laps::aggregate::tests::{small_config, FakeSource};
    use crate::laps::model::{LapRecord, RaceLaps, SeasonLaps};

    fn aggregation() -> LapAggregation {
        build_aggregation(&FakeSource::new(5), &small_config())
    }

    #[test]
    fn chart_has_one_trace_per_driver_and_season() {
        let fig = render_chart(&aggregation(), "Bahrain").unwrap();
        assert_eq!(
            fig.trace_names(),
            vec!["HAM - 2023", "RUS - 2023", "HAM - 2024", "RUS - 2024"]
        );
        assert_eq!(fig.title(), "Mercedes Lap Times: Bahrain GP (2023 vs 2024)");
        assert_eq!(fig.layout.xaxis.title.text, "Lap Number");
        assert_eq!(fig.layout.yaxis.title.text, "Lap Time (seconds)");
    }

    #[test]
    fn x_axis_is_dense_and_one_based() {
        let mut agg = aggregation();
        agg.races[0].seasons[0].outcome = SeasonOutcome::Loaded {
            drivers: vec![
                LapRecord::new("HAM", vec![Some(95.0), None, Some(94.0)]),
                LapRecord::new("RUS", vec![Some(96.0)]),
            ],
        };
        let fig = render_chart(&agg, "Bahrain").unwrap();
        match &fig.data[0] {
            Trace::Scatter { x, y, .. } => {
                assert_eq!(x, &vec![1.0, 2.0, 3.0]);
                assert_eq!(y[1], None);
            }
            other => panic!("unexpected trace {other:?}"),
        }
        assert_eq!(fig.data[1].len(), 1);
    }

    #[test]
    fn same_driver_keeps_colour_across_seasons() {
        let fig = render_chart(&aggregation(), "Monaco").unwrap();
        let style = |i: usize| match &fig.data[i] {
            Trace::Scatter { line: Some(l), .. } => l.clone(),
            other => panic!("unexpected trace {other:?}"),
        };
        assert_eq!(style(0).color, style(2).color);
        assert_ne!(style(0).dash, style(2).dash);
        assert_ne!(style(0).color, style(1).color);
    }

    #[test]
    fn switching_races_leaves_no_traces_behind() {
        let mut agg = aggregation();
        agg.races[1].seasons[1].outcome = SeasonOutcome::Loaded {
            drivers: vec![LapRecord::new("VER", vec![Some(80.0)])],
        };
        let bahrain = render_chart(&agg, "Bahrain").unwrap();
        let monaco = render_chart(&agg, "Monaco").unwrap();
        assert!(bahrain.trace_names().iter().all(|n| !n.starts_with("VER")));
        assert!(monaco.trace_names().contains(&"VER - 2024"));
        assert!(monaco.title().contains("Monaco"));
        assert!(!monaco.title().contains("Bahrain"));
    }

    #[test]
    fn failed_season_becomes_an_annotation() {
        let agg = LapAggregation {
            label: "Mercedes".into(),
            seasons: vec![2023, 2024],
            races: vec![RaceLaps {
                race: "Miami".into(),
                seasons: vec![
                    SeasonLaps {
                        season: 2023,
                        outcome: SeasonOutcome::Failed {
                            reason: "HTTP 503".into(),
                        },
                    },
                    SeasonLaps {
                        season: 2024,
                        outcome: SeasonOutcome::Loaded {
                            drivers: vec![LapRecord::new("HAM", vec![Some(91.0)])],
                        },
                    },
                ],
            }],
        };
        let fig = render_chart(&agg, "Miami").unwrap();
        assert_eq!(fig.trace_names(), vec!["HAM - 2024"]);
        assert_eq!(fig.layout.annotations.len(), 1);
        assert!(fig.layout.annotations[0].text.contains("2023: data unavailable (HTTP 503)"));
    }

    #[test]
    fn unknown_race_is_an_error() {
        assert_eq!(
            render_chart(&aggregation(), "Las Vegas"),
            Err(LapError::UnknownRace("Las Vegas".into()))
        );
    }

    #[test]
    fn reports_are_written_per_race() {
        let dir = tempfile::tempdir().unwrap();
        let charts = render_all(&aggregation());
        assert_eq!(charts.len(), 3);
        let paths = write_reports(&charts, dir.path()).unwrap();
        assert_eq!(paths[0].file_name().unwrap(), "bahrain.html");
        assert_eq!(paths[2].file_name().unwrap(), "brazil.html");
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[test]
    fn slugs() {
        assert_eq!(race_slug("Emilia Romagna"), "emilia-romagna");
        assert_eq!(race_slug("  United States "), "united-states");
        assert_eq!(race_slug("São Paulo"), "são-paulo");
    }
}

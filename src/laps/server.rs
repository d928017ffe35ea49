use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

use super::config::seasons_label;
use super::model::LapAggregation;
use super::render::{render_chart, LapError};
use crate::chart::export::{escape_html, ExportTarget, PLOTLY_CDN};
use crate::chart::Figure;

/// Shared state behind the web dashboard: the fetched laps (read-only) and
/// where selections are exported.
pub struct Dashboard {
    aggregation: LapAggregation,
    export: ExportTarget,
    /// Held while writing so concurrent selections export one at a time.
    export_lock: Mutex<()>,
}

#[derive(Debug, Deserialize)]
struct RaceQuery {
    race: String,
}

#[derive(Debug, Serialize)]
pub struct SelectionReply {
    pub figure: Figure,
    pub exported: Option<String>,
    pub export_error: Option<String>,
}

impl Dashboard {
    pub fn new(aggregation: LapAggregation, export: ExportTarget) -> Self {
        Dashboard {
            aggregation,
            export,
            export_lock: Mutex::new(()),
        }
    }

    pub fn aggregation(&self) -> &LapAggregation {
        &self.aggregation
    }

    /// Handle a dropdown change: render the race, then export what was
    /// rendered.  A failed export is reported alongside the chart.
    pub fn select(&self, race: &str) -> Result<SelectionReply, LapError> {
        let figure = render_chart(&self.aggregation, race)?;

        let exported = {
            let _guard = self.export_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.export.export(&figure)
        };
        let (exported, export_error) = match exported {
            Ok(path) => (Some(path.display().to_string()), None),
            Err(e) => {
                log::error!("export of {race} failed: {e:#}");
                (None, Some(format!("{e:#}")))
            }
        };

        Ok(SelectionReply {
            figure,
            exported,
            export_error,
        })
    }

    pub fn heading(&self) -> String {
        format!(
            "Formula 1 Lap Times Analysis ({})",
            seasons_label(&self.aggregation.seasons)
        )
    }

    pub fn index_html(&self) -> String {
        let options: String = self
            .aggregation
            .race_names()
            .iter()
            .map(|race| {
                let race = escape_html(race);
                format!("<option value=\"{race}\">{race}</option>")
            })
            .collect();
        INDEX_TEMPLATE
            .replace("{{PLOTLY}}", PLOTLY_CDN)
            .replace("{{HEADING}}", &escape_html(&self.heading()))
            .replace("{{OPTIONS}}", &options)
    }
}

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{HEADING}}</title>
<script src="{{PLOTLY}}"></script>
<style>
body { font-family: sans-serif; margin: 1.5rem; }
#race-dropdown { min-width: 16rem; font-size: 1rem; }
#status { color: #666; margin-top: 0.5rem; }
</style>
</head>
<body>
<h1>{{HEADING}}</h1>
<select id="race-dropdown">{{OPTIONS}}</select>
<div id="status"></div>
<div id="lap-times-graph" style="height:70vh"></div>
<script>
const dropdown = document.getElementById("race-dropdown");
const status = document.getElementById("status");

async function showRace(race) {
  const res = await fetch("/api/select", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({ race: race }),
  });
  const body = await res.json();
  if (!res.ok) {
    status.textContent = body.error;
    return;
  }
  Plotly.react("lap-times-graph", body.figure.data, body.figure.layout);
  status.textContent = body.exported ? "Saved to " + body.exported : (body.export_error || "");
}

dropdown.addEventListener("change", () => showRace(dropdown.value));
showRace(dropdown.value);
</script>
</body>
</html>
"#;

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn routes(
    dashboard: Arc<Dashboard>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let with_dashboard = warp::any().map(move || dashboard.clone());

    let index = warp::path::end()
        .and(warp::get())
        .and(with_dashboard.clone())
        .map(|dashboard: Arc<Dashboard>| warp::reply::html(dashboard.index_html()));

    let races = warp::path!("api" / "races")
        .and(warp::get())
        .and(with_dashboard.clone())
        .map(|dashboard: Arc<Dashboard>| {
            warp::reply::json(&dashboard.aggregation().race_names())
        });

    let chart = warp::path!("api" / "chart")
        .and(warp::get())
        .and(warp::query::<RaceQuery>())
        .and(with_dashboard.clone())
        .map(|query: RaceQuery, dashboard: Arc<Dashboard>| {
            match render_chart(dashboard.aggregation(), &query.race) {
                Ok(figure) => warp::reply::with_status(warp::reply::json(&figure), StatusCode::OK),
                Err(e) => not_found(e),
            }
        });

    let select = warp::path!("api" / "select")
        .and(warp::post())
        .and(warp::body::json::<RaceQuery>())
        .and(with_dashboard)
        .map(|selection: RaceQuery, dashboard: Arc<Dashboard>| {
            match dashboard.select(&selection.race) {
                Ok(reply) => warp::reply::with_status(warp::reply::json(&reply), StatusCode::OK),
                Err(e) => not_found(e),
            }
        });

    index
        .or(races)
        .or(chart)
        .or(select)
        .with(warp::log("dashkit::laps::server"))
}

fn not_found(e: LapError) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({ "error": e.to_string() })),
        StatusCode::NOT_FOUND,
    )
}

/// Serve the dashboard until Ctrl+C.
pub fn serve(dashboard: Dashboard, addr: SocketAddr) -> anyhow::Result<()> {
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating server runtime")?;
    let routes = routes(Arc::new(dashboard));

    runtime.block_on(async move {
        let (bound, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("waiting for Ctrl+C: {e}");
                }
            })
            .with_context(|| format!("binding {addr}"))?;
        log::info!("Lap-time dashboard on http://{bound} (Ctrl+C to stop)");
        server.await;
        log::info!("Dashboard stopped");
        Ok::<(), anyhow::Error>(())
    })
}

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

use super::Figure;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Serialise a value for embedding inside a `<script>` element.
pub fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("serialising chart")?;
    // `</script>` inside a string literal would end the element early.
    Ok(json.replace("</", "<\\/"))
}

/// A complete HTML document that draws `figure` with plotly.js.
pub fn render_html(figure: &Figure) -> Result<String> {
    let figure_json = script_json(figure)?;
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body style="margin:0">
<div id="chart" style="width:100%;height:100vh"></div>
<script>
const figure = {figure_json};
Plotly.newPlot("chart", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
        title = escape_html(figure.title()),
    ))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Write `figure` as standalone HTML at `path`.
///
/// The document is written to a temporary file next to `path` and renamed
/// into place, so readers never observe a half-written file.
pub fn export_html(figure: &Figure, path: &Path) -> Result<()> {
    let html = render_html(figure)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    temp.write_all(html.as_bytes())
        .context("writing chart HTML")?;
    temp.persist(path)
        .with_context(|| format!("moving chart into {}", path.display()))?;
    log::info!("Exported '{}' to {}", figure.title(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Export target
// ---------------------------------------------------------------------------

/// Where exports go: one fixed file that each export overwrites, or a new
/// timestamped file per export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTarget {
    pub path: PathBuf,
    pub versioned: bool,
}

impl ExportTarget {
    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        ExportTarget {
            path: path.into(),
            versioned: false,
        }
    }

    /// The file the next export writes to.
    pub fn next_path(&self) -> PathBuf {
        if !self.versioned {
            return self.path.clone();
        }
        let stamp = Local::now().format("%Y%m%dT%H%M%S%.3f").to_string();
        versioned_path(&self.path, &stamp)
    }

    /// Export `figure` to [`Self::next_path`], returning where it went.
    pub fn export(&self, figure: &Figure) -> Result<PathBuf> {
        let path = self.next_path();
        export_html(figure, &path)?;
        Ok(path)
    }
}

/// `charts/laps.html` + `20240101T120000.000` → `charts/laps-20240101T120000.000.html`
fn versioned_path(path: &Path, stamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("chart");
    let file_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}-{stamp}.{ext}"),
        None => format!("{stem}-{stamp}"),
    };
    path.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Layout, Trace};

    fn figure(title: &str) -> Figure {
        let mut fig = Figure::new(Layout::new(title, "x", "y"));
        fig.add_trace(Trace::lines("s", vec![Some(1.0), Some(2.0)]));
        fig
    }

    #[test]
    fn html_embeds_figure_and_plotly() {
        let html = render_html(&figure("Laps <Bahrain>")).unwrap();
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("<title>Laps &lt;Bahrain&gt;</title>"));
        assert!(html.contains(r#""type":"scatter""#));
    }

    #[test]
    fn script_json_cannot_close_the_script_element() {
        let json = script_json(&"</script><script>alert(1)").unwrap();
        assert!(!json.contains("</script>"));
    }

    #[test]
    fn export_overwrites_fixed_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = ExportTarget::fixed(dir.path().join("nested").join("chart.html"));

        let first = target.export(&figure("First")).unwrap();
        let second = target.export(&figure("Second")).unwrap();
        assert_eq!(first, second);

        let html = fs::read_to_string(&second).unwrap();
        assert!(html.contains("Second"));
        assert!(!html.contains("First"));
        assert_eq!(fs::read_dir(first.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn versioned_target_stamps_file_name() {
        let path = versioned_path(Path::new("out/laps.html"), "20240101T120000.000");
        assert_eq!(path, Path::new("out/laps-20240101T120000.000.html"));

        let target = ExportTarget {
            path: PathBuf::from("laps.html"),
            versioned: true,
        };
        let next = target.next_path();
        let name = next.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("laps-") && name.ends_with(".html"));
    }
}

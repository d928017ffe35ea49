/// Chart layer shared by both dashboards.
///
/// A [`Figure`] is plain data in plotly.js's JSON shape: the web dashboard
/// ships it to the browser as-is, and [`export`] wraps it in a standalone
/// HTML document.
pub mod export;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Figure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn new(layout: Layout) -> Self {
        Figure {
            data: Vec::new(),
            layout,
        }
    }

    pub fn add_trace(&mut self, trace: Trace) {
        self.data.push(trace);
    }

    pub fn trace_names(&self) -> Vec<&str> {
        self.data.iter().map(Trace::name).collect()
    }

    pub fn title(&self) -> &str {
        &self.layout.title.text
    }
}

// ---------------------------------------------------------------------------
// Traces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter {
        name: String,
        x: Vec<f64>,
        /// `None` is serialised as `null`, which plotly draws as a gap.
        y: Vec<Option<f64>>,
        mode: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        line: Option<LineStyle>,
    },
    Bar {
        name: String,
        x: Vec<f64>,
        y: Vec<String>,
        orientation: String,
        text: Vec<String>,
        textposition: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        marker: Option<Marker>,
    },
}

impl Trace {
    /// Line-and-marker series over a dense 1-based index.
    pub fn lines(name: impl Into<String>, y: Vec<Option<f64>>) -> Self {
        let x = (1..=y.len()).map(|i| i as f64).collect();
        Trace::Scatter {
            name: name.into(),
            x,
            y,
            mode: "lines+markers".to_string(),
            line: None,
        }
    }

    /// Horizontal bars, one per `(category, value)`, labelled with `text`.
    pub fn horizontal_bars(
        name: impl Into<String>,
        categories: Vec<String>,
        values: Vec<f64>,
        text: Vec<String>,
    ) -> Self {
        Trace::Bar {
            name: name.into(),
            x: values,
            y: categories,
            orientation: "h".to_string(),
            text,
            textposition: "outside".to_string(),
            marker: None,
        }
    }

    pub fn with_line(mut self, style: LineStyle) -> Self {
        if let Trace::Scatter { line, .. } = &mut self {
            *line = Some(style);
        }
        self
    }

    pub fn with_marker(mut self, colors: Vec<String>) -> Self {
        if let Trace::Bar { marker, .. } = &mut self {
            *marker = Some(Marker { color: colors });
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Trace::Scatter { name, .. } | Trace::Bar { name, .. } => name,
        }
    }

    /// Number of points in the series.
    pub fn len(&self) -> usize {
        match self {
            Trace::Scatter { y, .. } => y.len(),
            Trace::Bar { x, .. } => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: String,
    pub dash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub color: Vec<String>,
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Text {
            text: text.to_string(),
        }
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Text { text }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub title: Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub color: String,
}

/// Free-floating note placed in paper coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    pub xref: String,
    pub yref: String,
    pub x: f64,
    pub y: f64,
    pub showarrow: bool,
}

impl Annotation {
    /// `row` counts down from the top edge of the plot.
    pub fn note(text: impl Into<String>, row: usize) -> Self {
        Annotation {
            text: text.into(),
            xref: "paper".to_string(),
            yref: "paper".to_string(),
            x: 0.0,
            y: 1.0 - 0.06 * row as f64,
            showarrow: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: Text,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub legend: Option<Legend>,
    pub showlegend: bool,
    pub hovermode: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub paper_bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub plot_bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub font: Option<Font>,
}

impl Layout {
    pub fn new(title: impl Into<String>, x_title: &str, y_title: &str) -> Self {
        Layout {
            title: Text::from(title.into()),
            xaxis: Axis {
                title: x_title.into(),
            },
            yaxis: Axis {
                title: y_title.into(),
            },
            legend: None,
            showlegend: true,
            hovermode: "closest".to_string(),
            annotations: Vec::new(),
            paper_bgcolor: None,
            plot_bgcolor: None,
            font: None,
        }
    }

    pub fn with_legend_title(mut self, title: &str) -> Self {
        self.legend = Some(Legend {
            title: title.into(),
        });
        self
    }

    pub fn without_legend(mut self) -> Self {
        self.showlegend = false;
        self
    }

    /// Dark background and light text, close to plotly's `plotly_dark`.
    pub fn dark(mut self) -> Self {
        self.paper_bgcolor = Some("#111111".to_string());
        self.plot_bgcolor = Some("#111111".to_string());
        self.font = Some(Font {
            color: "#f2f5fa".to_string(),
        });
        self
    }
}

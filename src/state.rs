use crate::data::cost::{CostBreakdown, ValidationError};
use crate::data::metrics::OptionMetrics;
use crate::data::model::{OptionTable, SelectionError};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// What the dashboard shows for the current selection, recomputed in full on
/// every change.
#[derive(Debug, Clone)]
pub struct SelectionView {
    pub metrics: OptionMetrics,
    /// `Err` when the option's cost percentage cannot produce a chart.
    pub breakdown: Result<CostBreakdown, ValidationError>,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded once at start-up, never modified.
    pub table: OptionTable,

    /// Name of the selected option; always present in `table`.
    pub selected: String,

    /// Derived values for `selected`.
    pub view: SelectionView,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Start with the first option selected.
    pub fn new(table: OptionTable) -> Self {
        let first = table.first();
        let selected = first.name.clone();
        let view = SelectionView {
            metrics: OptionMetrics::from(first),
            breakdown: CostBreakdown::derive(first),
        };
        let mut state = Self {
            table,
            selected,
            view,
            status_message: None,
        };
        state.report_breakdown();
        state
    }

    /// Switch to `name` and recompute everything shown for it.
    pub fn select(&mut self, name: &str) -> Result<(), SelectionError> {
        let option = match self.table.select(name) {
            Ok(option) => option,
            Err(e) => {
                log::error!("{e}");
                self.status_message = Some(e.to_string());
                return Err(e);
            }
        };
        self.view = SelectionView {
            metrics: OptionMetrics::from(option),
            breakdown: CostBreakdown::derive(option),
        };
        self.selected = name.to_string();
        self.status_message = None;
        self.report_breakdown();
        Ok(())
    }

    fn report_breakdown(&mut self) {
        if let Err(e) = &self.view.breakdown {
            log::warn!("{e}");
        }
    }
}

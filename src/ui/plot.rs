use eframe::egui::{Align2, Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Plot, PlotPoint, Text};

use crate::chart::{Figure, Layout, Trace};
use crate::color::{color32, generate_palette, hex};
use crate::data::cost::CostBreakdown;
use crate::data::metrics::format_pounds_rounded;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Cost breakdown chart (central panel)
// ---------------------------------------------------------------------------

/// Render the horizontal cost bar chart for the current selection.
pub fn cost_plot(ui: &mut Ui, state: &AppState) {
    let breakdown = match &state.view.breakdown {
        Ok(b) => *b,
        Err(e) => {
            ui.label(RichText::new(format!("Cannot chart this option: {e}")).color(Color32::RED));
            return;
        }
    };

    let categories = breakdown.categories();
    let palette = generate_palette(categories.len());
    let labels: Vec<String> = categories.iter().map(|(l, _)| l.to_string()).collect();
    let max_value = categories
        .iter()
        .map(|(_, v)| *v)
        .fold(0.0_f64, f64::max);

    let bars: Vec<Bar> = categories
        .iter()
        .zip(&palette)
        .enumerate()
        .map(|(i, ((label, value), color))| {
            Bar::new(i as f64, *value)
                .name(*label)
                .fill(color32(*color))
                .width(0.6)
        })
        .collect();

    Plot::new("cost_breakdown")
        .height(220.0)
        .x_axis_label("Cost (£)")
        .y_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 {
                labels.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .include_x(0.0)
        // Room for the value labels past the longest bar.
        .include_x(max_value * 1.25)
        .include_y(-0.5)
        .include_y(categories.len() as f64 - 0.5)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().name("Cost"));
            for (i, (_, value)) in categories.iter().enumerate() {
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(*value, i as f64),
                        RichText::new(format!("  {}", format_pounds_rounded(*value))).strong(),
                    )
                    .anchor(Align2::LEFT_CENTER),
                );
            }
        });
}

/// The same chart as a plotly figure, for HTML export.
pub fn cost_breakdown_figure(option_name: &str, breakdown: &CostBreakdown) -> Figure {
    let categories = breakdown.categories();
    let colors = generate_palette(categories.len())
        .into_iter()
        .map(hex)
        .collect();
    let layout = Layout::new(
        format!("Cost Structure for '{option_name}'"),
        "Cost (£)",
        "",
    )
    .without_legend();

    let mut figure = Figure::new(layout);
    figure.add_trace(
        Trace::horizontal_bars(
            "Cost",
            categories.iter().map(|(l, _)| l.to_string()).collect(),
            categories.iter().map(|(_, v)| *v).collect(),
            categories
                .iter()
                .map(|(_, v)| format_pounds_rounded(*v))
                .collect(),
        )
        .with_marker(colors),
    );
    figure
}

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::chart::export::export_html;
use crate::data::metrics::format_pounds;
use crate::state::AppState;
use crate::ui::plot::{cost_breakdown_figure, cost_plot};

// ---------------------------------------------------------------------------
// Left side panel – option selector
// ---------------------------------------------------------------------------

/// Render the left selection panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Site 1");
    ui.separator();

    ui.strong("Select a Development Option:");
    let names: Vec<String> = state.table.names().map(str::to_string).collect();
    let mut chosen = None;
    egui::ComboBox::from_id_salt("option_selector")
        .selected_text(state.selected.as_str())
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for name in &names {
                if ui.selectable_label(state.selected == *name, name.as_str()).clicked() {
                    chosen = Some(name.clone());
                }
            }
        });
    if let Some(name) = chosen {
        if name != state.selected {
            // Errors land in `status_message`.
            let _ = state.select(&name);
        }
    }

    ui.add_space(8.0);
    ui.label(
        "This prototype shows how different development choices impact \
         biodiversity and cost, based on the BiUrbs project research.",
    );
}

// ---------------------------------------------------------------------------
// Central panel – results for the selected option
// ---------------------------------------------------------------------------

pub fn results_panel(ui: &mut Ui, state: &AppState) {
    let metrics = &state.view.metrics;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(format!("Results for: {}", metrics.name));
            ui.add_space(6.0);

            ui.columns(3, |cols| {
                metric(&mut cols[0], "Biodiversity Net Gain (BNG)", &metrics.bng);
                metric(&mut cols[1], "Habitat Units", &metrics.habitat_units);
                metric(&mut cols[2], "Cost of Habitats", &metrics.cost);
            });

            ui.add_space(6.0);
            let (before, share, after) = metrics.share_sentence();
            ui.horizontal_wrapped(|ui: &mut Ui| {
                ui.spacing_mut().item_spacing.x = 0.0;
                ui.label(before);
                ui.label(RichText::new(share).strong());
                ui.label(after);
            });

            ui.add_space(12.0);
            ui.heading("Cost Breakdown");
            cost_plot(ui, state);

            ui.add_space(12.0);
            egui::CollapsingHeader::new(RichText::new("All options").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| options_table(ui, state));

            ui.add_space(8.0);
            ui.label(
                RichText::new(
                    "Source: Data derived from the BiUrbs project presentation, \
                     slide titled 'Site 1 - Options'.",
                )
                .italics()
                .color(Color32::GRAY),
            );
        });
}

fn metric(ui: &mut Ui, label: &str, value: &str) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).color(Color32::GRAY));
        ui.label(RichText::new(value).size(28.0).strong());
    });
}

/// Every loaded option side by side; the selected row is highlighted.
fn options_table(ui: &mut Ui, state: &AppState) {
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(120.0))
        .columns(Column::auto().at_least(90.0), 4)
        .header(20.0, |mut header| {
            for title in ["Option", "BNG", "Habitat Units", "Cost of Habitats", "Cost %"] {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for option in state.table.options() {
                let selected = option.name == state.selected;
                body.row(18.0, |mut row| {
                    row.set_selected(selected);
                    let cells = [
                        option.name.clone(),
                        option.bng.clone(),
                        format!("{:.2}", option.habitat_units),
                        format_pounds(option.cost_of_habitats),
                        option.cost_percentage.clone(),
                    ];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            let can_export = state.view.breakdown.is_ok();
            if ui
                .add_enabled(can_export, egui::Button::new("Export chart…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.separator();
        ui.label(format!("{} options loaded", state.table.len()));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Export dialog
// ---------------------------------------------------------------------------

pub fn export_dialog(state: &mut AppState) {
    let Ok(breakdown) = &state.view.breakdown else {
        return;
    };
    let figure = cost_breakdown_figure(&state.selected, breakdown);

    let file = rfd::FileDialog::new()
        .set_title("Export cost chart")
        .set_file_name("cost_breakdown.html")
        .add_filter("HTML", &["html", "htm"])
        .save_file();

    if let Some(path) = file {
        match export_html(&figure, &path) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Failed to export chart: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

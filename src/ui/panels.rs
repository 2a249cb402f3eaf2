use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter::Facet;
use crate::metrics::format_currency;
use crate::narrative::worker::NarrativeStatus;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

enum FilterAction {
    Toggle(Facet, String),
    All(Facet),
    None(Facet),
}

/// Render the left filter panel: one multi-select per facet.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let mut actions = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for facet in Facet::ALL {
                let all_values = facet.observed(&state.dataset);
                let selected = state.selection.values(facet);
                let header_text = format!(
                    "Select {}  ({}/{})",
                    facet.label(),
                    selected.len(),
                    all_values.len()
                );

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(facet.label())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                actions.push(FilterAction::All(facet));
                            }
                            if ui.small_button("None").clicked() {
                                actions.push(FilterAction::None(facet));
                            }
                        });

                        for value in all_values {
                            let mut checked = selected.contains(value);
                            if ui.checkbox(&mut checked, value.as_str()).changed() {
                                actions.push(FilterAction::Toggle(facet, value.clone()));
                            }
                        }
                    });
            }
        });

    // Apply after rendering so the widgets above could borrow the state.
    for action in actions {
        match action {
            FilterAction::Toggle(facet, value) => state.toggle(facet, &value),
            FilterAction::All(facet) => state.select_all(facet),
            FilterAction::None(facet) => state.select_none(facet),
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

pub fn top_bar(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Myntra E-commerce Analytics Dashboard");
        ui.separator();
        ui.label(format!(
            "{} records loaded, {} visible",
            state.dataset.len(),
            state.visible_indices.len()
        ));
    });
}

// ---------------------------------------------------------------------------
// Key metrics
// ---------------------------------------------------------------------------

pub fn metric_cards(ui: &mut Ui, state: &AppState) {
    ui.heading("Key Metrics");
    let cards = state.snapshot.cards();
    ui.columns(cards.len(), |cols: &mut [Ui]| {
        for (col, (label, value)) in cols.iter_mut().zip(cards) {
            col.group(|ui: &mut Ui| {
                ui.label(RichText::new(label).small());
                ui.label(RichText::new(value).size(22.0).strong());
            });
        }
    });
}

/// Per-category sales, mirroring the bar chart as a table.
pub fn category_table(ui: &mut Ui, state: &AppState) {
    egui::CollapsingHeader::new("Sales by category (table)")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .column(Column::auto().at_least(160.0))
                .column(Column::remainder())
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("Product Category");
                    });
                    header.col(|ui| {
                        ui.strong("Sales (INR)");
                    });
                })
                .body(|mut body| {
                    for row in &state.snapshot.sales_by_category {
                        body.row(18.0, |mut table_row| {
                            table_row.col(|ui| {
                                ui.label(&row.category);
                            });
                            table_row.col(|ui| {
                                ui.label(format_currency(row.sales));
                            });
                        });
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

pub fn narrative_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Automated Insights from GenAI");

    let mut retry = false;
    match state.narrative.status() {
        NarrativeStatus::Idle => {}
        NarrativeStatus::NoData => {
            ui.label("No records match the current filters.");
        }
        NarrativeStatus::Pending => {
            ui.horizontal(|ui: &mut Ui| {
                ui.spinner();
                ui.label("Generating insights…");
            });
        }
        NarrativeStatus::Ready(text) => {
            ui.label(text.as_str());
        }
        NarrativeStatus::Failed(msg) => {
            ui.label(RichText::new(format!("Could not generate insights: {msg}")).color(Color32::RED));
            retry = ui.button("Retry").clicked();
        }
    }

    if retry {
        state.retry_narrative();
    }
}

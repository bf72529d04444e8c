use eframe::egui::{self, Color32, ComboBox, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use statrs::statistics::Statistics;

use crate::state::{AppState, PlotKind};

// ---------------------------------------------------------------------------
// Left side panel: data source, columns, tests
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            database_section(ui, state);
            ui.separator();

            let Some(dataset) = &state.dataset else {
                ui.label("No dataset loaded.");
                return;
            };
            let columns = dataset.column_names.clone();
            let numeric = dataset.numeric_columns();
            let groupable = state.groupable_columns.clone();
            let can_label = columns.contains(&state.config.fields.minutes_watched)
                && columns.contains(&state.config.fields.content_duration);

            ui.heading("Comparison");
            if let Some(col) = column_combo(ui, "group_by", "Group by", &groupable, &state.group_column) {
                state.set_group_column(col);
            }
            if let Some(col) = column_combo(ui, "metric", "Metric", &numeric, &state.metric_column) {
                state.set_metric_column(col);
            }
            ui.checkbox(&mut state.paired, "Paired samples");
            ui.separator();

            group_table(ui, state);
            ui.separator();

            ui.strong("Tests");
            let has_groups = !state.groups.is_empty();
            ui.horizontal_wrapped(|ui: &mut Ui| {
                if ui.add_enabled(has_groups, egui::Button::new("Run battery")).clicked() {
                    state.run_battery();
                }
                if ui.add_enabled(has_groups, egui::Button::new("Pairwise")).clicked() {
                    state.run_pairwise();
                }
                if ui.add_enabled(has_groups, egui::Button::new("t-test")).clicked() {
                    state.run_t_test();
                }
            });
            if ui
                .add_enabled(can_label, egui::Button::new("Label viewing completion"))
                .on_disabled_hover_text(format!(
                    "needs columns '{}' and '{}'",
                    state.config.fields.minutes_watched, state.config.fields.content_duration
                ))
                .clicked()
            {
                state.label_completion();
            }
            ui.separator();

            ui.strong("Plot");
            ui.horizontal(|ui: &mut Ui| {
                ui.radio_value(&mut state.plot_kind, PlotKind::Histogram, "Histogram");
                ui.radio_value(&mut state.plot_kind, PlotKind::Counts, "Counts");
            });
            match state.plot_kind {
                PlotKind::Histogram => {
                    ui.add(egui::Slider::new(&mut state.bins, 2..=100).text("bins"));
                }
                PlotKind::Counts => {
                    // labelling may have added a column since `columns` was taken
                    let columns = state
                        .dataset
                        .as_ref()
                        .map(|ds| ds.column_names.clone())
                        .unwrap_or_default();
                    if let Some(col) =
                        column_combo(ui, "count_by", "Count by", &columns, &state.count_column)
                    {
                        state.count_column = Some(col);
                    }
                }
            }
        });
}

/// A labelled column picker; returns the newly chosen column, if any.
fn column_combo(
    ui: &mut Ui,
    id: &str,
    label: &str,
    columns: &[String],
    current: &Option<String>,
) -> Option<String> {
    let current = current.clone().unwrap_or_default();
    let mut chosen = None;
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        ComboBox::from_id_salt(id)
            .selected_text(&current)
            .show_ui(ui, |ui: &mut Ui| {
                for col in columns {
                    if ui.selectable_label(current == *col, col).clicked() && current != *col {
                        chosen = Some(col.clone());
                    }
                }
            });
    });
    chosen
}

/// Per-group size, mean and standard deviation.
fn group_table(ui: &mut Ui, state: &AppState) {
    if state.groups.is_empty() {
        ui.label("No groups.");
        return;
    }
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(80.0))
        .columns(Column::auto().at_least(50.0), 3)
        .header(18.0, |mut header| {
            for title in ["Group", "n", "mean", "sd"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for group in &state.groups {
                let color = state.group_color(&group.label).unwrap_or(Color32::GRAY);
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(RichText::new(group.label.to_string()).color(color));
                    });
                    row.col(|ui| {
                        ui.label(group.len().to_string());
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.2}", group.values.iter().mean()));
                    });
                    row.col(|ui| {
                        ui.label(format_std_dev(&group.values));
                    });
                });
            }
        });
}

/// Sample standard deviation, or a dash when it is undefined.
fn format_std_dev(values: &[f64]) -> String {
    if values.len() < 2 {
        "–".to_string()
    } else {
        format!("{:.2}", values.iter().std_dev())
    }
}

fn database_section(ui: &mut Ui, state: &mut AppState) {
    egui::CollapsingHeader::new(RichText::new("Database").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let db = &state.config.database;
            ui.label(format!(
                "{}@{}:{}/{}",
                db.user.as_deref().unwrap_or("?"),
                db.host,
                db.port,
                db.dbname.as_deref().unwrap_or("?")
            ));
            ui.add(
                egui::TextEdit::multiline(&mut state.sql)
                    .code_editor()
                    .desired_rows(3)
                    .hint_text("SELECT ..."),
            );
            let ready = state.config.database.is_complete() && !state.sql.trim().is_empty();
            if ui
                .add_enabled(ready, egui::Button::new("Run query"))
                .on_disabled_hover_text("set AB_DB_USER and AB_DB_NAME and enter a query")
                .clicked()
            {
                state.load_from_database();
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
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if state.loading {
            ui.spinner();
        }

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records, {} groups",
                ds.len(),
                state.groups.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open experiment data")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        match ab_verdict::data::loader::load_file(&path) {
            Ok(dataset) => state.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}

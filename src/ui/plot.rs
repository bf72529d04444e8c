use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot};

use ab_verdict::data::summary::{category_counts, histogram_in_range, value_range};

use crate::color::ColorMap;
use crate::state::{AppState, PlotKind};

// ---------------------------------------------------------------------------
// Central plot
// ---------------------------------------------------------------------------

/// Render the histogram or count chart in the central panel.
pub fn central_plot(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to compare groups  (File → Open…)");
        });
        return;
    }
    match state.plot_kind {
        PlotKind::Histogram => metric_histogram(ui, state),
        PlotKind::Counts => count_chart(ui, state),
    }
}

/// Overlaid histograms of the metric on shared bin edges.
fn metric_histogram(ui: &mut Ui, state: &AppState) {
    let all: Vec<f64> = state
        .groups
        .iter()
        .flat_map(|g| g.values.iter().copied())
        .collect();
    let Some(range) = value_range(&all) else {
        ui.label("No numeric values to plot.");
        return;
    };

    let charts: Vec<BarChart> = state
        .groups
        .iter()
        .map(|group| {
            let color = state
                .group_color(&group.label)
                .unwrap_or(Color32::LIGHT_BLUE);
            let bars = histogram_in_range(&group.values, state.bins, range)
                .iter()
                .map(|bin| {
                    Bar::new(bin.center(), bin.count as f64).width(bin.width())
                })
                .collect();
            BarChart::new(bars)
                .name(group.label.to_string())
                .color(color)
        })
        .collect();

    Plot::new("metric_histogram")
        .legend(Legend::default())
        .x_axis_label(state.metric_column.as_deref().unwrap_or(""))
        .y_axis_label("Count")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

/// One bar per category of `count_column`.
fn count_chart(ui: &mut Ui, state: &AppState) {
    let (Some(ds), Some(column)) = (&state.dataset, state.count_column.as_deref()) else {
        ui.label("Choose a column to count.");
        return;
    };
    let counts = category_counts(ds, column);
    let colors = ColorMap::new(counts.iter().map(|(value, _)| value));

    Plot::new("count_chart")
        .legend(Legend::default())
        .x_axis_label(column)
        .y_axis_label("Records")
        .allow_drag(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (i, (value, n)) in counts.iter().enumerate() {
                let bar = Bar::new(i as f64, *n as f64).width(0.7);
                plot_ui.bar_chart(
                    BarChart::new(vec![bar])
                        .name(value.to_string())
                        .color(colors.color_for(value)),
                );
            }
        });
}

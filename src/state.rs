use ab_verdict::config::{AppConfig, VIEWING_STATUS_FIELD};
use ab_verdict::data::label::label_dataset;
use ab_verdict::data::model::{Dataset, FieldValue};
use ab_verdict::data::partition::{distinct_values_up_to, partition, GroupSample};
use ab_verdict::{db, report, stats};

use crate::color::ColorMap;

/// Columns with more distinct values than this are not offered for grouping.
pub const MAX_GROUPS: usize = 50;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    /// Metric histogram, one series per group.
    Histogram,
    /// Record counts per category of `count_column`.
    Counts,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Loaded dataset (None until user loads a file or runs a query).
    pub dataset: Option<Dataset>,

    /// Column whose values define the groups.
    pub group_column: Option<String>,

    /// Columns with at most `MAX_GROUPS` distinct values (cached).
    pub groupable_columns: Vec<String>,

    /// Numeric column compared between groups.
    pub metric_column: Option<String>,

    /// Column counted in the bar chart.
    pub count_column: Option<String>,

    /// Whether two groups are paired observations.
    pub paired: bool,

    /// Groups for the current column choice (cached).
    pub groups: Vec<GroupSample>,

    /// Colours keyed by group label.
    pub color_map: Option<ColorMap>,

    pub plot_kind: PlotKind,
    pub bins: usize,

    /// SQL text for the database loader.
    pub sql: String,

    /// Verdict lines, newest appended last.
    pub report: Vec<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a loading operation is in progress.
    pub loading: bool,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            dataset: None,
            group_column: None,
            groupable_columns: Vec::new(),
            metric_column: None,
            count_column: None,
            paired: false,
            groups: Vec::new(),
            color_map: None,
            plot_kind: PlotKind::Histogram,
            bins: 20,
            sql: String::new(),
            report: Vec::new(),
            status_message: None,
            loading: false,
        }
    }

    /// Ingest a newly loaded dataset and pick default columns.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        let numeric = dataset.numeric_columns();
        self.metric_column = numeric.first().cloned();
        self.group_column = dataset
            .column_names
            .iter()
            .find(|c| !numeric.contains(c))
            .or_else(|| dataset.column_names.first())
            .cloned();
        self.count_column = self.group_column.clone();

        self.dataset = Some(dataset);
        self.status_message = None;
        self.loading = false;
        self.refresh_groupable_columns();
        self.regroup();
    }

    /// Rescan which columns are usable as a group key.
    pub fn refresh_groupable_columns(&mut self) {
        self.groupable_columns = match &self.dataset {
            Some(ds) => ds
                .column_names
                .iter()
                .filter(|col| distinct_values_up_to(ds, col, MAX_GROUPS + 1).len() <= MAX_GROUPS)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
    }

    /// Recompute `groups` and colours after a column change.
    pub fn regroup(&mut self) {
        self.groups.clear();
        self.color_map = None;
        let (Some(ds), Some(group), Some(metric)) =
            (&self.dataset, &self.group_column, &self.metric_column)
        else {
            return;
        };
        match partition(ds, group, metric) {
            Ok(groups) => {
                self.color_map = Some(ColorMap::new(groups.iter().map(|g| &g.label)));
                self.groups = groups;
                self.status_message = None;
            }
            Err(e) => self.status_message = Some(format!("Error: {e}")),
        }
    }

    pub fn set_group_column(&mut self, col: String) {
        self.group_column = Some(col);
        self.regroup();
    }

    pub fn set_metric_column(&mut self, col: String) {
        self.metric_column = Some(col);
        self.regroup();
    }

    /// Label viewings complete/incomplete using the configured columns.
    pub fn label_completion(&mut self) {
        let Some(ds) = self.dataset.as_mut() else {
            return;
        };
        let fields = &self.config.fields;
        match label_dataset(
            ds,
            &fields.minutes_watched,
            &fields.content_duration,
            VIEWING_STATUS_FIELD,
        ) {
            Ok(complete) => {
                self.report.push(format!(
                    "Labelled {} viewings: {complete} complete, {} incomplete",
                    ds.len(),
                    ds.len() - complete
                ));
                self.count_column = Some(VIEWING_STATUS_FIELD.to_string());
                self.plot_kind = PlotKind::Counts;
                self.refresh_groupable_columns();
            }
            Err(e) => self.status_message = Some(format!("Error: {e}")),
        }
    }

    /// Label of the groups being compared, for report headers.
    fn comparison_header(&self) -> String {
        format!(
            "-- {} by {}",
            self.metric_column.as_deref().unwrap_or("?"),
            self.group_column.as_deref().unwrap_or("?")
        )
    }

    pub fn run_battery(&mut self) {
        let lines = report::describe_battery(&stats::run_battery(&self.groups, self.paired));
        self.report.push(self.comparison_header());
        self.report.extend(lines);
    }

    pub fn run_pairwise(&mut self) {
        self.report.push(self.comparison_header());
        match stats::pairwise_mann_whitney(&self.groups) {
            Ok(verdicts) => self
                .report
                .extend(verdicts.iter().map(report::describe)),
            Err(e) => self.report.push(format!("error: {e}")),
        }
    }

    pub fn run_t_test(&mut self) {
        self.report.push(self.comparison_header());
        let line = match stats::t_test_two_groups(&self.groups) {
            Ok(v) => report::describe(&v),
            Err(e) => format!("error: {e}"),
        };
        self.report.push(line);
    }

    /// Connect with the configured credentials and load `self.sql`.
    pub fn load_from_database(&mut self) {
        self.loading = true;
        let Some(mut client) = db::connect(&self.config.database) else {
            self.status_message = Some("Error: could not connect to the database".to_string());
            self.loading = false;
            return;
        };
        match db::query_dataset(&mut client, &self.sql) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Query failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                self.loading = false;
            }
        }
    }

    pub fn group_color(&self, label: &FieldValue) -> Option<eframe::egui::Color32> {
        self.color_map.as_ref().map(|cm| cm.color_for(label))
    }
}

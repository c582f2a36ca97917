//! The narrative scenes and the registry that orders them.
//!
//! Every scene is a plain render function from a [`SceneContext`] to a
//! [`SceneView`]. Render functions keep no state between calls; the whole
//! view is rebuilt on each invocation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::chart::{
    Annotation, Panel, PanelBuilder, RecordTable, SceneView, Series, SeriesStyle, Tone, Tooltip,
};
use crate::config::{CanvasSize, SceneSpec, StoryConfig, StoryConfigError};
use crate::dataset::Dataset;
use crate::filter::{
    aggregate_by_year, has_plottable_values, DerivedSubsets, FilterState, TrendPoint,
};
use crate::format::{format_count, format_currency, ValueFormat};
use crate::record::{OccupationLevel, Percentile, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    IncomeVsEmployment,
    MedianTrend,
    PercentileSpread,
    PercentileBands,
    LargestEmployers,
    Explore,
}

impl SceneKind {
    pub const ALL: [SceneKind; 6] = [
        SceneKind::IncomeVsEmployment,
        SceneKind::MedianTrend,
        SceneKind::PercentileSpread,
        SceneKind::PercentileBands,
        SceneKind::LargestEmployers,
        SceneKind::Explore,
    ];

    pub fn render_fn(self) -> RenderFn {
        match self {
            SceneKind::IncomeVsEmployment => render_income_vs_employment,
            SceneKind::MedianTrend => render_median_trend,
            SceneKind::PercentileSpread => render_percentile_spread,
            SceneKind::PercentileBands => render_percentile_bands,
            SceneKind::LargestEmployers => render_largest_employers,
            SceneKind::Explore => render_explore,
        }
    }

    /// Only the explore scene exposes the filter controls.
    pub fn is_interactive(self) -> bool {
        matches!(self, SceneKind::Explore)
    }

    pub fn default_id(self) -> &'static str {
        match self {
            SceneKind::IncomeVsEmployment => "overview",
            SceneKind::MedianTrend => "median-trend",
            SceneKind::PercentileSpread => "spread",
            SceneKind::PercentileBands => "bands",
            SceneKind::LargestEmployers => "employers",
            SceneKind::Explore => "explore",
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            SceneKind::IncomeVsEmployment => "Pay and headcount",
            SceneKind::MedianTrend => "Median pay over time",
            SceneKind::PercentileSpread => "Pay spread",
            SceneKind::PercentileBands => "Pay distribution by year",
            SceneKind::LargestEmployers => "Largest employers",
            SceneKind::Explore => "Explore the data",
        }
    }

    pub fn default_canvas(self) -> CanvasSize {
        match self {
            SceneKind::Explore => CanvasSize {
                width: 960,
                height: 1000,
            },
            _ => CanvasSize::default(),
        }
    }
}

pub type RenderFn = fn(&SceneContext<'_>) -> SceneView;

/// Inputs available to a render function.
pub struct SceneContext<'a> {
    pub spec: &'a SceneSpec,
    pub dataset: &'a Dataset,
    pub filter: &'a FilterState,
    pub derived: &'a DerivedSubsets,
    pub table_row_limit: usize,
}

impl SceneContext<'_> {
    fn view(&self, panels: Vec<Panel>, table: Option<RecordTable>) -> SceneView {
        SceneView {
            id: self.spec.id.clone(),
            title: self.spec.title.clone(),
            narrative: self.spec.narrative.clone(),
            canvas: self.spec.canvas,
            interactive: self.spec.kind.is_interactive(),
            panels,
            table,
        }
    }
}

pub struct Scene {
    spec: SceneSpec,
    render: RenderFn,
}

impl Scene {
    pub fn new(spec: SceneSpec) -> Self {
        let render = spec.kind.render_fn();
        Self { spec, render }
    }

    pub fn spec(&self) -> &SceneSpec {
        &self.spec
    }

    pub fn render(
        &self,
        dataset: &Dataset,
        filter: &FilterState,
        derived: &DerivedSubsets,
        table_row_limit: usize,
    ) -> SceneView {
        let ctx = SceneContext {
            spec: &self.spec,
            dataset,
            filter,
            derived,
            table_row_limit,
        };
        (self.render)(&ctx)
    }
}

/// Ordered, non-empty list of scenes.
pub struct SceneRegistry {
    scenes: Vec<Scene>,
    table_row_limit: usize,
}

impl SceneRegistry {
    pub fn from_config(config: &StoryConfig) -> Result<Self, StoryConfigError> {
        config.validate()?;
        Ok(Self {
            scenes: config.scenes().iter().cloned().map(Scene::new).collect(),
            table_row_limit: config.table_row_limit(),
        })
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// The scene at `index`, clamped to the last scene.
    pub fn scene(&self, index: usize) -> &Scene {
        &self.scenes[index.min(self.scenes.len() - 1)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.scenes.iter().position(|scene| scene.spec.id == id)
    }

    pub fn table_row_limit(&self) -> usize {
        self.table_row_limit
    }
}

fn record_tooltip(record: &Record) -> Tooltip {
    Tooltip {
        heading: record.title.clone(),
        lines: vec![
            format!("{} group, {}", record.level, record.year),
            format!("Mean income: {}", format_currency(record.annual_mean)),
            format!(
                "Employment: {}",
                record
                    .total_employment
                    .map(format_count)
                    .unwrap_or_else(|| "n/a".to_string())
            ),
            format!("Median: {}", format_currency(record.percentiles.median())),
        ],
    }
}

fn trend_tooltip(name: &str, point: &TrendPoint, percentile: Percentile) -> Tooltip {
    let mut lines = vec![
        format!("Year: {}", point.year),
        format!(
            "{}: {}",
            percentile.label(),
            format_currency(point.percentiles.get(percentile))
        ),
    ];
    if point.contributing > 1 {
        lines.push(format!("Average of {} records", point.contributing));
    }
    Tooltip {
        heading: name.to_string(),
        lines,
    }
}

/// Plottable records at `level` in the dataset's most recent year.
fn latest_at_level(dataset: &Dataset, level: OccupationLevel) -> (Option<i32>, Vec<&Record>) {
    let Some(year) = dataset.latest_year() else {
        return (None, Vec::new());
    };
    let records = dataset
        .records()
        .iter()
        .filter(|record| record.year == year && record.level == level)
        .collect();
    (Some(year), records)
}

fn year_suffix(year: Option<i32>) -> String {
    year.map(|year| format!(", {year}")).unwrap_or_default()
}

fn percentile_lines(points: &[TrendPoint], name_prefix: &str) -> Vec<Series> {
    Percentile::ALL
        .into_iter()
        .enumerate()
        .map(|(index, percentile)| {
            let mut series = Series::new(percentile.label(), Tone::cycle(index), SeriesStyle::Line);
            for point in points {
                series.push(
                    point.year as f64,
                    point.percentiles.get(percentile),
                    trend_tooltip(name_prefix, point, percentile),
                );
            }
            series
        })
        .collect()
}

fn render_income_vs_employment(ctx: &SceneContext<'_>) -> SceneView {
    let (year, records) = latest_at_level(ctx.dataset, OccupationLevel::Major);
    let mut series = Series::new("Major groups", Tone::Blue, SeriesStyle::Scatter);
    let plotted: Vec<&Record> = records
        .into_iter()
        .filter(|record| has_plottable_values(record))
        .collect();
    for record in &plotted {
        series.push(
            record.annual_mean,
            record.employment_or_zero() as f64,
            record_tooltip(record),
        );
    }
    let highlight = plotted
        .iter()
        .max_by(|a, b| a.annual_mean.total_cmp(&b.annual_mean))
        .map(|record| Annotation {
            x: record.annual_mean,
            y: record.employment_or_zero() as f64,
            text: format!(
                "Highest paid: {} ({})",
                record.title,
                format_currency(record.annual_mean)
            ),
        });
    let panel = PanelBuilder::new(format!("Major occupation groups{}", year_suffix(year)))
        .x_axis("Mean annual income", ValueFormat::Currency)
        .y_axis("Total employment", ValueFormat::Count)
        .series(series)
        .annotation(highlight)
        .build();
    ctx.view(vec![panel], None)
}

fn render_median_trend(ctx: &SceneContext<'_>) -> SceneView {
    let mut builder = PanelBuilder::new("Median annual income by major group")
        .x_axis("Year", ValueFormat::Year)
        .y_axis("Median annual income", ValueFormat::Currency);
    let mut fastest: Option<(f64, Annotation)> = None;

    for (index, title) in ctx
        .dataset
        .titles_at(OccupationLevel::Major)
        .into_iter()
        .enumerate()
    {
        let mut records: Vec<&Record> = ctx
            .dataset
            .records()
            .iter()
            .filter(|record| record.level == OccupationLevel::Major && record.title == title)
            .collect();
        records.sort_by_key(|record| record.year);

        let mut series = Series::new(title.as_str(), Tone::cycle(index), SeriesStyle::Line);
        for record in &records {
            series.push(
                record.year as f64,
                record.percentiles.median(),
                record_tooltip(record),
            );
        }

        if let (Some(first), Some(last)) = (series.plots.first(), series.plots.last()) {
            if series.plots.len() > 1 && first.y > 0.0 {
                let growth = (last.y - first.y) / first.y;
                if fastest.as_ref().map_or(true, |(best, _)| growth > *best) {
                    fastest = Some((
                        growth,
                        Annotation {
                            x: last.x,
                            y: last.y,
                            text: format!("Fastest growth: {} (+{:.1}%)", title, growth * 100.0),
                        },
                    ));
                }
            }
        }
        builder = builder.series(series);
    }

    let panel = builder
        .annotation(fastest.map(|(_, annotation)| annotation))
        .build();
    ctx.view(vec![panel], None)
}

fn render_percentile_spread(ctx: &SceneContext<'_>) -> SceneView {
    let (year, records) = latest_at_level(ctx.dataset, OccupationLevel::Minor);
    let mut series = Series::new("Minor occupations", Tone::Teal, SeriesStyle::Scatter);
    for record in &records {
        let mut tooltip = record_tooltip(record);
        if let Some(ratio) = record.spread_ratio() {
            tooltip.lines.push(format!("90th / 10th: {ratio:.1}x"));
        }
        series.push(
            record.percentile(Percentile::P10),
            record.percentile(Percentile::P90),
            tooltip,
        );
    }
    let widest = records
        .iter()
        .filter_map(|record| record.spread_ratio().map(|ratio| (ratio, *record)))
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(ratio, record)| Annotation {
            x: record.percentile(Percentile::P10),
            y: record.percentile(Percentile::P90),
            text: format!("Widest spread: {} ({ratio:.1}x)", record.title),
        });
    let panel = PanelBuilder::new(format!("Minor occupations{}", year_suffix(year)))
        .x_axis("10th percentile income", ValueFormat::Currency)
        .y_axis("90th percentile income", ValueFormat::Currency)
        .series(series)
        .annotation(widest)
        .build();
    ctx.view(vec![panel], None)
}

fn render_percentile_bands(ctx: &SceneContext<'_>) -> SceneView {
    let trend = aggregate_by_year(ctx.dataset.records());
    let latest_median = trend.last().and_then(|point| {
        let median = point.percentiles.median();
        median.is_finite().then(|| Annotation {
            x: point.year as f64,
            y: median,
            text: format!("Median {}: {}", point.year, format_currency(median)),
        })
    });
    let mut builder = PanelBuilder::new("Average pay percentiles, all occupations")
        .x_axis("Year", ValueFormat::Year)
        .y_axis("Annual income", ValueFormat::Currency);
    for series in percentile_lines(&trend, "All occupations") {
        builder = builder.series(series);
    }
    ctx.view(vec![builder.annotation(latest_median).build()], None)
}

fn render_largest_employers(ctx: &SceneContext<'_>) -> SceneView {
    let (year, records) = latest_at_level(ctx.dataset, OccupationLevel::Minor);
    let plotted: Vec<&Record> = records
        .into_iter()
        .filter(|record| has_plottable_values(record))
        .collect();
    let mut series = Series::new("Minor occupations", Tone::Amber, SeriesStyle::Scatter);
    for record in &plotted {
        series.push(
            record.employment_or_zero() as f64,
            record.annual_mean,
            record_tooltip(record),
        );
    }
    let largest = plotted
        .iter()
        .max_by_key(|record| record.employment_or_zero())
        .map(|record| Annotation {
            x: record.employment_or_zero() as f64,
            y: record.annual_mean,
            text: format!(
                "Largest employer: {} ({})",
                record.title,
                format_count(record.employment_or_zero())
            ),
        });
    let panel = PanelBuilder::new(format!("Employment vs. mean pay{}", year_suffix(year)))
        .x_axis("Total employment", ValueFormat::Count)
        .y_axis("Mean annual income", ValueFormat::Currency)
        .series(series)
        .annotation(largest)
        .build();
    ctx.view(vec![panel], None)
}

fn render_explore(ctx: &SceneContext<'_>) -> SceneView {
    let points = &ctx.derived.points;
    let mut scatter = Series::new("Selected occupations", Tone::Blue, SeriesStyle::Scatter);
    for record in points {
        scatter.push(
            record.annual_mean,
            record.employment_or_zero() as f64,
            record_tooltip(record),
        );
    }
    let top = points
        .iter()
        .max_by(|a, b| a.annual_mean.total_cmp(&b.annual_mean))
        .map(|record| Annotation {
            x: record.annual_mean,
            y: record.employment_or_zero() as f64,
            text: format!("Top: {}", record.title),
        });
    let year_label = match ctx.filter.year.as_only() {
        Some(year) => format!("Selected occupations, {year}"),
        None => "Selected occupations, all years".to_string(),
    };
    let point_panel = PanelBuilder::new(year_label)
        .x_axis("Mean annual income", ValueFormat::Currency)
        .y_axis("Total employment", ValueFormat::Count)
        .series(scatter)
        .annotation(top)
        .build();

    let trend_name = match ctx.filter.title.as_only() {
        Some(title) => title.clone(),
        None => format!("Average of {} titles", ctx.filter.level),
    };
    let mut trend_builder = PanelBuilder::new(format!("Pay percentiles over time: {trend_name}"))
        .x_axis("Year", ValueFormat::Year)
        .y_axis("Annual income", ValueFormat::Currency);
    for series in percentile_lines(&ctx.derived.trend, &trend_name) {
        trend_builder = trend_builder.series(series);
    }

    ctx.view(
        vec![point_panel, trend_builder.build()],
        Some(records_table(points, ctx.table_row_limit)),
    )
}

/// Point subset ordered by mean income, highest first.
fn records_table(points: &[Record], limit: usize) -> RecordTable {
    let mut ordered: Vec<&Record> = points.iter().collect();
    ordered.sort_by(|a, b| b.annual_mean.total_cmp(&a.annual_mean));
    RecordTable {
        columns: ["Title", "Level", "Year", "Mean income", "Employment"]
            .into_iter()
            .map(String::from)
            .collect(),
        rows: ordered
            .into_iter()
            .take(limit)
            .map(|record| {
                vec![
                    record.title.clone(),
                    record.level.to_string(),
                    record.year.to_string(),
                    format_currency(record.annual_mean),
                    format_count(record.employment_or_zero()),
                ]
            })
            .collect(),
        total_rows: points.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Percentiles;

    fn record(title: &str, level: OccupationLevel, year: i32, mean: f64, emp: u64) -> Record {
        Record::new(
            title,
            level,
            11,
            year,
            mean,
            Some(emp),
            Percentiles::new(mean * 0.4, mean * 0.6, mean * 0.9, mean * 1.2, mean * 1.9),
        )
        .unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            record("Management", OccupationLevel::Major, 2022, 120_000.0, 9_000),
            record("Management", OccupationLevel::Major, 2023, 130_000.0, 9_500),
            record("Food Service", OccupationLevel::Major, 2022, 30_000.0, 12_000),
            record("Food Service", OccupationLevel::Major, 2023, 36_000.0, 13_000),
            record("Cooks", OccupationLevel::Minor, 2023, 32_000.0, 2_500),
            record("Surgeons", OccupationLevel::Minor, 2023, 340_000.0, 40),
        ])
    }

    fn render(kind: SceneKind, dataset: &Dataset, filter: &FilterState) -> SceneView {
        let derived = DerivedSubsets::compute(dataset.records(), filter);
        Scene::new(SceneSpec::for_kind(kind)).render(dataset, filter, &derived, 10)
    }

    #[test]
    fn overview_annotates_highest_paid_group() {
        let view = render(SceneKind::IncomeVsEmployment, &dataset(), &FilterState::default());
        let chart = view.first_chart().expect("chart");
        assert_eq!(chart.plot_count(), 2);
        assert_eq!(chart.annotations[0].text, "Highest paid: Management ($130,000)");
        assert!(view.table.is_none());
        assert!(!view.interactive);
    }

    #[test]
    fn median_trend_flags_fastest_growth() {
        let view = render(SceneKind::MedianTrend, &dataset(), &FilterState::default());
        let chart = view.first_chart().expect("chart");
        assert_eq!(chart.series.len(), 2);
        assert!(chart.annotations[0].text.starts_with("Fastest growth: Food Service"));
    }

    #[test]
    fn bands_draw_five_percentile_lines() {
        let view = render(SceneKind::PercentileBands, &dataset(), &FilterState::default());
        let chart = view.first_chart().expect("chart");
        assert_eq!(chart.series.len(), 5);
        assert!(chart.series.iter().all(|s| s.plots.len() == 2));
    }

    #[test]
    fn explore_renders_placeholder_for_empty_selection() {
        let filter = FilterState {
            year: crate::filter::Selection::Only(2022),
            level: crate::filter::Selection::Only(OccupationLevel::Minor),
            title: crate::filter::Selection::All,
        };
        let view = render(SceneKind::Explore, &dataset(), &filter);
        assert!(view.interactive);
        assert!(view.panels[0].is_no_data());
        assert!(!view.panels[1].is_no_data());
        assert_eq!(view.table.as_ref().map(|t| t.total_rows), Some(0));
    }

    #[test]
    fn explore_table_is_sorted_and_limited() {
        let dataset = dataset();
        let filter = FilterState::default();
        let derived = DerivedSubsets::compute(dataset.records(), &filter);
        let view = Scene::new(SceneSpec::for_kind(SceneKind::Explore))
            .render(&dataset, &filter, &derived, 2);
        let table = view.table.expect("table");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.total_rows, 6);
        assert_eq!(table.rows[0][0], "Surgeons");
        assert_eq!(table.rows[0][3], "$340,000");
    }

    #[test]
    fn registry_follows_config_order() {
        let registry = SceneRegistry::from_config(&StoryConfig::default()).unwrap();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.position("explore"), Some(5));
        assert_eq!(registry.scene(99).spec().kind, SceneKind::Explore);
    }
}

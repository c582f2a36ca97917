//! Backend-agnostic chart model produced by scene render functions.
//!
//! A front end draws a [`SceneView`] without consulting the dataset again:
//! bounds, legend entries, tooltips and annotations are all resolved here.

use crate::config::CanvasSize;
use crate::format::ValueFormat;

/// Palette slot for a series; front ends map tones to concrete colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Blue,
    Teal,
    Green,
    Amber,
    Red,
    Violet,
}

impl Tone {
    const CYCLE: [Tone; 6] = [
        Tone::Blue,
        Tone::Teal,
        Tone::Green,
        Tone::Amber,
        Tone::Red,
        Tone::Violet,
    ];

    pub fn cycle(index: usize) -> Tone {
        Self::CYCLE[index % Self::CYCLE.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStyle {
    Scatter,
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub heading: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    pub x: f64,
    pub y: f64,
    pub tooltip: Tooltip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub tone: Tone,
    pub style: SeriesStyle,
    pub plots: Vec<Plot>,
}

impl Series {
    pub fn new(name: impl Into<String>, tone: Tone, style: SeriesStyle) -> Self {
        Self {
            name: name.into(),
            tone,
            style,
            plots: Vec::new(),
        }
    }

    /// Drops plots with a non-finite coordinate so they never reach a scale.
    pub fn push(&mut self, x: f64, y: f64, tooltip: Tooltip) {
        if x.is_finite() && y.is_finite() {
            self.plots.push(Plot { x, y, tooltip });
        }
    }

    pub fn coords(&self) -> Vec<(f64, f64)> {
        self.plots.iter().map(|plot| (plot.x, plot.y)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Closed numeric interval spanning a set of finite values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    /// `None` when no finite value is present.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Extent> {
        values
            .into_iter()
            .filter(|value| value.is_finite())
            .fold(None, |acc: Option<Extent>, value| {
                Some(match acc {
                    None => Extent {
                        min: value,
                        max: value,
                    },
                    Some(extent) => Extent {
                        min: extent.min.min(value),
                        max: extent.max.max(value),
                    },
                })
            })
    }

    /// Widens by `ratio` of the span on each side; a zero-width extent is
    /// widened by one unit each side instead.
    pub fn padded(self, ratio: f64) -> Extent {
        let span = self.max - self.min;
        if span <= f64::EPSILON {
            return Extent {
                min: self.min - 1.0,
                max: self.max + 1.0,
            };
        }
        Extent {
            min: self.min - span * ratio,
            max: self.max + span * ratio,
        }
    }

    pub fn bounds(self) -> [f64; 2] {
        [self.min, self.max]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: String,
    pub format: ValueFormat,
    pub extent: Extent,
}

impl Axis {
    /// Tick labels at both ends and the midpoint.
    pub fn tick_labels(&self) -> Vec<String> {
        let mid = (self.extent.min + self.extent.max) / 2.0;
        [self.extent.min, mid, self.extent.max]
            .into_iter()
            .map(|value| self.format.format_compact(value))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPanel {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: Vec<Series>,
    pub annotations: Vec<Annotation>,
}

impl ChartPanel {
    /// Legend entries for series that have something to show.
    pub fn legend(&self) -> Vec<(&str, Tone)> {
        self.series
            .iter()
            .filter(|series| !series.plots.is_empty())
            .map(|series| (series.name.as_str(), series.tone))
            .collect()
    }

    /// Plots across all series in draw order, for tooltip navigation.
    pub fn plots(&self) -> impl Iterator<Item = (&Series, &Plot)> {
        self.series
            .iter()
            .flat_map(|series| series.plots.iter().map(move |plot| (series, plot)))
    }

    pub fn plot_count(&self) -> usize {
        self.series.iter().map(|series| series.plots.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Chart(ChartPanel),
    NoData { title: String, message: String },
}

impl Panel {
    pub fn title(&self) -> &str {
        match self {
            Panel::Chart(chart) => &chart.title,
            Panel::NoData { title, .. } => title,
        }
    }

    pub fn as_chart(&self) -> Option<&ChartPanel> {
        match self {
            Panel::Chart(chart) => Some(chart),
            Panel::NoData { .. } => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Panel::NoData { .. })
    }
}

pub const NO_DATA_MESSAGE: &str = "No records match the current selection.";

/// Assembles a chart panel, falling back to a no-data placeholder when no
/// series contributes a finite plot.
pub struct PanelBuilder {
    title: String,
    x_label: String,
    x_format: ValueFormat,
    y_label: String,
    y_format: ValueFormat,
    series: Vec<Series>,
    annotations: Vec<Annotation>,
}

impl PanelBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            x_format: ValueFormat::Count,
            y_label: String::new(),
            y_format: ValueFormat::Count,
            series: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn x_axis(mut self, label: impl Into<String>, format: ValueFormat) -> Self {
        self.x_label = label.into();
        self.x_format = format;
        self
    }

    pub fn y_axis(mut self, label: impl Into<String>, format: ValueFormat) -> Self {
        self.y_label = label.into();
        self.y_format = format;
        self
    }

    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn annotation(mut self, annotation: Option<Annotation>) -> Self {
        self.annotations.extend(annotation);
        self
    }

    pub fn build(self) -> Panel {
        let x = Extent::of(self.series.iter().flat_map(|s| s.plots.iter().map(|p| p.x)));
        let y = Extent::of(self.series.iter().flat_map(|s| s.plots.iter().map(|p| p.y)));
        let (Some(x), Some(y)) = (x, y) else {
            return Panel::NoData {
                title: self.title,
                message: NO_DATA_MESSAGE.to_string(),
            };
        };
        Panel::Chart(ChartPanel {
            title: self.title,
            x_axis: Axis {
                label: self.x_label,
                format: self.x_format,
                extent: x.padded(0.05),
            },
            y_axis: Axis {
                label: self.y_label,
                format: self.y_format,
                extent: y.padded(0.05),
            },
            series: self.series,
            annotations: self.annotations,
        })
    }
}

/// Tabular listing shown beneath the interactive scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

/// Everything a front end needs to draw one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneView {
    pub id: String,
    pub title: String,
    pub narrative: String,
    pub canvas: CanvasSize,
    pub interactive: bool,
    pub panels: Vec<Panel>,
    pub table: Option<RecordTable>,
}

impl SceneView {
    pub fn first_chart(&self) -> Option<&ChartPanel> {
        self.panels.iter().find_map(Panel::as_chart)
    }
}

use std::collections::VecDeque;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::block::{Position, Title};
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, LegendPosition, Paragraph,
    Row, Table, Tabs, Wrap,
};
use ratatui::Frame;

use story_core::chart::{ChartPanel, Panel, RecordTable, SeriesStyle, Tone, Tooltip};
use story_core::{update, AppEvent, AppState, Effect, SceneView, Update};

#[derive(Debug, Clone, Copy)]
pub enum FilterControl {
    Year,
    Level,
    Title,
}

enum Phase {
    Loading(String),
    Failed(String),
    Ready { state: AppState, view: SceneView },
}

pub struct UiState {
    phase: Phase,
    tooltip: Option<usize>,
    pub logs: VecDeque<String>,
    pub max_logs: usize,
}

impl UiState {
    pub fn loading(label: String) -> Self {
        Self {
            phase: Phase::Loading(label),
            tooltip: None,
            logs: VecDeque::new(),
            max_logs: 6,
        }
    }

    pub fn install(&mut self, state: AppState, start_scene: usize) {
        let Update { state, .. } = update(state, AppEvent::JumpTo(start_scene));
        let view = state.view();
        self.phase = Phase::Ready { state, view };
        self.tooltip = None;
    }

    pub fn fail(&mut self, reason: String) {
        self.phase = Phase::Failed(reason);
    }

    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }

    /// Runs `event` through the reducer and re-renders on change.
    pub fn dispatch(&mut self, event: AppEvent) {
        let phase = std::mem::replace(&mut self.phase, Phase::Loading(String::new()));
        self.phase = match phase {
            Phase::Ready { state, view } => {
                let Update { state, effect } = update(state, event);
                match effect {
                    Effect::Rerender => {
                        self.tooltip = None;
                        let view = state.view();
                        Phase::Ready { state, view }
                    }
                    Effect::None => Phase::Ready { state, view },
                }
            }
            other => other,
        };
    }

    pub fn filters_enabled(&self) -> bool {
        matches!(&self.phase, Phase::Ready { view, .. } if view.interactive)
    }

    /// Event selecting the option `step` places away from the current one.
    pub fn cycled_filter(&self, control: FilterControl, step: isize) -> Option<AppEvent> {
        let Phase::Ready { state, .. } = &self.phase else {
            return None;
        };
        let options = state.filter_options();
        let filter = state.filter();
        match control {
            FilterControl::Year => {
                cycle(&options.years, &filter.year, step).map(AppEvent::YearChanged)
            }
            FilterControl::Level => {
                cycle(&options.levels, &filter.level, step).map(AppEvent::LevelChanged)
            }
            FilterControl::Title => {
                cycle(&options.titles, &filter.title, step).map(AppEvent::TitleChanged)
            }
        }
    }

    pub fn move_tooltip(&mut self, step: isize) {
        let Phase::Ready { view, .. } = &self.phase else {
            return;
        };
        let count = tooltip_chart(view).map(ChartPanel::plot_count).unwrap_or(0);
        if count == 0 {
            self.tooltip = None;
            return;
        }
        let next = match self.tooltip {
            None if step >= 0 => 0,
            None => count - 1,
            Some(current) => (current as isize + step).rem_euclid(count as isize) as usize,
        };
        self.tooltip = Some(next);
    }

    pub fn hide_tooltip(&mut self) {
        self.tooltip = None;
    }
}

/// Tooltips only walk the plots of the scene's first panel.
const TOOLTIP_PANEL: usize = 0;

fn tooltip_chart(view: &SceneView) -> Option<&ChartPanel> {
    view.panels.get(TOOLTIP_PANEL).and_then(Panel::as_chart)
}

fn cycle<T: PartialEq + Clone>(options: &[T], current: &T, step: isize) -> Option<T> {
    if options.len() < 2 {
        return None;
    }
    let position = options.iter().position(|option| option == current).unwrap_or(0);
    let next = (position as isize + step).rem_euclid(options.len() as isize) as usize;
    options.get(next).cloned()
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Blue => Color::Blue,
        Tone::Teal => Color::Cyan,
        Tone::Green => Color::Green,
        Tone::Amber => Color::Yellow,
        Tone::Red => Color::Red,
        Tone::Violet => Color::Magenta,
    }
}

pub fn draw_ui(frame: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
            Constraint::Length(state.max_logs as u16 + 2),
        ])
        .split(frame.size());

    match &state.phase {
        Phase::Loading(label) => {
            draw_header(frame, chunks[0], None);
            draw_message(
                frame,
                chunks[1],
                format!("Loading dataset from {label}..."),
                Color::Yellow,
            );
        }
        Phase::Failed(reason) => {
            draw_header(frame, chunks[0], None);
            draw_message(
                frame,
                chunks[1],
                format!("Failed to load dataset: {reason}"),
                Color::Red,
            );
        }
        Phase::Ready { state: app, view } => {
            draw_header(frame, chunks[0], Some(app));
            draw_scene(frame, chunks[1], app, view, state.tooltip);
        }
    }
    draw_commands(frame, chunks[2], state.filters_enabled());
    draw_logs(frame, chunks[3], state);
}

fn draw_header(frame: &mut Frame, area: Rect, app: Option<&AppState>) {
    let block = Block::default().borders(Borders::ALL).title("Labor Story");
    match app {
        Some(app) => {
            let titles: Vec<String> = app
                .registry()
                .iter()
                .enumerate()
                .map(|(index, scene)| format!("{} {}", index + 1, scene.spec().title))
                .collect();
            let tabs = Tabs::new(titles)
                .block(block)
                .select(app.navigation().current())
                .style(Style::default().fg(Color::Gray))
                .highlight_style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                );
            frame.render_widget(tabs, area);
        }
        None => frame.render_widget(block, area),
    }
}

fn draw_message(frame: &mut Frame, area: Rect, text: String, color: Color) {
    let paragraph = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_scene(
    frame: &mut Frame,
    area: Rect,
    app: &AppState,
    view: &SceneView,
    tooltip: Option<usize>,
) {
    let mut constraints = vec![Constraint::Length(4)];
    if view.interactive {
        constraints.push(Constraint::Length(3));
    }
    let chart_share = (view.canvas.aspect() * 100.0).clamp(40.0, 200.0) as u32;
    constraints.push(Constraint::Ratio(chart_share, chart_share + 40));
    if view.table.is_some() {
        constraints.push(Constraint::Ratio(40, chart_share + 40));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut next = 0;
    let narrative = Paragraph::new(view.narrative.as_str())
        .block(Block::default().borders(Borders::ALL).title(view.title.as_str()))
        .wrap(Wrap { trim: true });
    frame.render_widget(narrative, chunks[next]);
    next += 1;

    if view.interactive {
        draw_controls(frame, chunks[next], app);
        next += 1;
    }

    draw_panels(frame, chunks[next], view, tooltip);
    next += 1;

    if let Some(table) = &view.table {
        draw_table(frame, chunks[next], table);
    }
}

fn draw_controls(frame: &mut Frame, area: Rect, app: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(60),
        ])
        .split(area);
    let filter = app.filter();
    let title_count = app.title_options().len();
    let controls = [
        ("Year [y/Y]", filter.year.to_string()),
        ("Level [v/V]", filter.level.to_string()),
        (
            "Title [t/T]",
            format!("{} ({} options)", filter.title, title_count),
        ),
    ];
    for ((label, value), column) in controls.into_iter().zip(columns.iter()) {
        let style = if value.starts_with("All") {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let widget = Paragraph::new(Span::styled(value, style))
            .block(Block::default().borders(Borders::ALL).title(label));
        frame.render_widget(widget, *column);
    }
}

fn draw_panels(frame: &mut Frame, area: Rect, view: &SceneView, tooltip: Option<usize>) {
    if view.panels.is_empty() {
        return;
    }
    let constraints: Vec<Constraint> = view
        .panels
        .iter()
        .map(|_| Constraint::Ratio(1, view.panels.len() as u32))
        .collect();
    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    for (index, (panel, panel_area)) in view.panels.iter().zip(areas.iter()).enumerate() {
        let highlighted = if index == TOOLTIP_PANEL { tooltip } else { None };
        match panel {
            Panel::Chart(chart) => draw_chart(frame, *panel_area, chart, highlighted),
            Panel::NoData { title, message } => {
                let paragraph = Paragraph::new(Span::styled(
                    message.as_str(),
                    Style::default().fg(Color::DarkGray),
                ))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title.as_str()));
                frame.render_widget(paragraph, *panel_area);
            }
        }
    }
}

fn draw_chart(frame: &mut Frame, area: Rect, chart: &ChartPanel, tooltip: Option<usize>) {
    let coords: Vec<Vec<(f64, f64)>> = chart.series.iter().map(|series| series.coords()).collect();
    let annotation_coords: Vec<(f64, f64)> =
        chart.annotations.iter().map(|note| (note.x, note.y)).collect();
    let selected = tooltip.and_then(|index| chart.plots().nth(index));
    let selected_coords: Vec<(f64, f64)> = selected
        .map(|(_, plot)| vec![(plot.x, plot.y)])
        .unwrap_or_default();

    let mut datasets: Vec<Dataset> = chart
        .series
        .iter()
        .zip(coords.iter())
        .filter(|(series, _)| !series.plots.is_empty())
        .map(|(series, points)| {
            let (marker, graph_type) = match series.style {
                SeriesStyle::Scatter => (Marker::Dot, GraphType::Scatter),
                SeriesStyle::Line => (Marker::Braille, GraphType::Line),
            };
            Dataset::default()
                .name(series.name.clone())
                .marker(marker)
                .graph_type(graph_type)
                .style(Style::default().fg(tone_color(series.tone)))
                .data(points)
        })
        .collect();
    datasets.push(
        Dataset::default()
            .marker(Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::White))
            .data(&annotation_coords),
    );
    datasets.push(
        Dataset::default()
            .marker(Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::LightRed))
            .data(&selected_coords),
    );

    let mut block = Block::default()
        .borders(Borders::ALL)
        .title(chart.title.as_str());
    if let Some(note) = chart.annotations.first() {
        block = block.title(
            Title::from(Span::styled(
                format!(" {} ", note.text),
                Style::default().fg(Color::White),
            ))
            .position(Position::Bottom)
            .alignment(Alignment::Right),
        );
    }

    let x_labels = chart
        .x_axis
        .tick_labels()
        .into_iter()
        .map(Span::raw)
        .collect();
    let y_labels = chart
        .y_axis
        .tick_labels()
        .into_iter()
        .map(Span::raw)
        .collect();
    let widget = Chart::new(datasets)
        .block(block)
        .legend_position(Some(LegendPosition::TopLeft))
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)))
        .x_axis(
            Axis::default()
                .title(chart.x_axis.label.as_str())
                .style(Style::default().fg(Color::Gray))
                .bounds(chart.x_axis.extent.bounds())
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(chart.y_axis.label.as_str())
                .style(Style::default().fg(Color::Gray))
                .bounds(chart.y_axis.extent.bounds())
                .labels(y_labels),
        );
    frame.render_widget(widget, area);

    if let Some((series, plot)) = selected {
        draw_tooltip(frame, area, &series.name, &plot.tooltip);
    }
}

/// Floating box in the chart's top-right corner.
fn draw_tooltip(frame: &mut Frame, area: Rect, series: &str, tooltip: &Tooltip) {
    let mut lines = vec![Line::from(Span::styled(
        tooltip.heading.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.extend(tooltip.lines.iter().map(|line| Line::from(line.as_str())));
    let width = lines
        .iter()
        .map(|line| line.width() as u16)
        .max()
        .unwrap_or(0)
        .max(series.len() as u16)
        .saturating_add(4)
        .min(area.width.saturating_sub(2));
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height,
    };
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(series)
                .style(Style::default().fg(Color::White).bg(Color::Black)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}

fn draw_table(frame: &mut Frame, area: Rect, table: &RecordTable) {
    let header = Row::new(
        table
            .columns
            .iter()
            .map(|column| Cell::from(column.as_str())),
    )
    .style(Style::default().fg(Color::Yellow));
    let rows = table
        .rows
        .iter()
        .map(|row| Row::new(row.iter().map(|cell| Cell::from(cell.as_str()))));
    let widths = [
        Constraint::Min(24),
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Length(12),
        Constraint::Length(12),
    ];
    let title = format!(
        "Records (showing {} of {})",
        table.rows.len(),
        table.total_rows
    );
    let widget = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(widget, area);
}

fn draw_commands(frame: &mut Frame, area: Rect, filters_enabled: bool) {
    let key = |label: &'static str| Span::styled(label, Style::default().fg(Color::Yellow));
    let mut spans = vec![
        key("←/→"),
        Span::raw(" scene  "),
        key("Tab"),
        Span::raw(" tooltip  "),
        key("x"),
        Span::raw(" hide  "),
    ];
    if filters_enabled {
        spans.extend([
            key("y"),
            Span::raw(" year  "),
            key("v"),
            Span::raw(" level  "),
            key("t"),
            Span::raw(" title  "),
        ]);
    }
    spans.extend([key("q"), Span::raw(" exit")]);
    let block = Block::default().borders(Borders::ALL).title("Commands");
    let paragraph = Paragraph::new(Line::from(spans)).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_logs(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Logs");
    let lines: Vec<Line> = state
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry)))
        .collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use story_core::{
        Dataset, OccupationLevel, Percentiles, Record, SceneRegistry, Selection, StoryConfig,
    };

    fn explore_state(employment: Option<u64>) -> AppState {
        let record = Record::new(
            "Registered Nurses",
            OccupationLevel::Minor,
            29,
            2023,
            86_000.0,
            employment,
            Percentiles::new(61_000.0, 68_000.0, 78_000.0, 96_000.0, 120_000.0),
        )
        .expect("valid year");
        let registry = SceneRegistry::from_config(&StoryConfig::default()).expect("default config");
        AppState::new(Arc::new(Dataset::from_records(vec![record])), Arc::new(registry))
    }

    #[test]
    fn cycle_wraps_in_both_directions() {
        let options = vec![Selection::All, Selection::Only(2023), Selection::Only(2024)];
        assert_eq!(cycle(&options, &Selection::All, 1), Some(Selection::Only(2023)));
        assert_eq!(cycle(&options, &Selection::All, -1), Some(Selection::Only(2024)));
        assert_eq!(cycle(&options, &Selection::Only(2024), 1), Some(Selection::All));
        assert_eq!(cycle(&options[..1], &Selection::All, 1), None);
    }

    #[test]
    fn logs_are_trimmed_and_bounded() {
        let mut state = UiState::loading("data.csv".to_string());
        for index in 0..10 {
            state.push_log(format!("line {index}\n"));
        }
        state.push_log("\n");
        assert_eq!(state.logs.len(), state.max_logs);
        assert_eq!(state.logs.front().map(String::as_str), Some("line 9"));
        assert!(!state.filters_enabled());
        assert!(state.cycled_filter(FilterControl::Year, 1).is_none());
    }

    #[test]
    fn tooltip_stays_hidden_when_first_panel_has_no_data() {
        let mut ui = UiState::loading("fixture".to_string());
        ui.install(explore_state(None), 5);
        assert!(ui.filters_enabled());
        ui.move_tooltip(1);
        assert_eq!(ui.tooltip, None);
    }

    #[test]
    fn tooltip_walks_first_panel_plots() {
        let mut ui = UiState::loading("fixture".to_string());
        ui.install(explore_state(Some(3_200)), 5);
        ui.move_tooltip(-1);
        assert_eq!(ui.tooltip, Some(0));
        ui.move_tooltip(1);
        assert_eq!(ui.tooltip, Some(0));
        ui.hide_tooltip();
        assert_eq!(ui.tooltip, None);
    }
}

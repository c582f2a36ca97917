use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use story_core::{AppEvent, AppState, Dataset, SceneRegistry};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, trace};

use crate::ui::{draw_ui, FilterControl, UiState};

pub struct StoryViewer {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    ui_state: UiState,
    receiver: UnboundedReceiver<LoadEvent>,
    registry: Arc<SceneRegistry>,
    start_scene: usize,
    log_receiver: Receiver<String>,
}

impl StoryViewer {
    pub fn new(
        receiver: UnboundedReceiver<LoadEvent>,
        registry: Arc<SceneRegistry>,
        start_scene: usize,
        loading_label: String,
        log_receiver: Receiver<String>,
    ) -> Result<Self> {
        let stdout = std::io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        crossterm::terminal::enable_raw_mode()?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            ui_state: UiState::loading(loading_label),
            receiver,
            registry,
            start_scene,
            log_receiver,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let mut last_draw = Instant::now();
        let mut redraw = true;

        loop {
            while let Ok(event) = self.receiver.try_recv() {
                match event {
                    LoadEvent::Loaded(dataset) => {
                        info!(records = dataset.len(), source = ?dataset.source(), "Dataset ready");
                        let state = AppState::new(dataset, Arc::clone(&self.registry));
                        self.ui_state.install(state, self.start_scene);
                    }
                    LoadEvent::Failed(reason) => {
                        error!("Cannot start the story: {}", reason);
                        self.ui_state.fail(reason);
                    }
                }
            }

            while let Ok(line) = self.log_receiver.try_recv() {
                self.ui_state.push_log(line);
            }

            if redraw || last_draw.elapsed() >= Duration::from_millis(100) {
                self.terminal.draw(|frame| draw_ui(frame, &self.ui_state))?;
                last_draw = Instant::now();
                redraw = false;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => {
                            self.dispatch(AppEvent::Next);
                        }
                        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => {
                            self.dispatch(AppEvent::Prev);
                        }
                        KeyCode::Home => self.dispatch(AppEvent::JumpTo(0)),
                        KeyCode::End => {
                            self.dispatch(AppEvent::JumpTo(self.registry.len().saturating_sub(1)));
                        }
                        KeyCode::Char('y') => self.cycle_filter(FilterControl::Year, 1),
                        KeyCode::Char('Y') => self.cycle_filter(FilterControl::Year, -1),
                        KeyCode::Char('v') => self.cycle_filter(FilterControl::Level, 1),
                        KeyCode::Char('V') => self.cycle_filter(FilterControl::Level, -1),
                        KeyCode::Char('t') => self.cycle_filter(FilterControl::Title, 1),
                        KeyCode::Char('T') => self.cycle_filter(FilterControl::Title, -1),
                        KeyCode::Tab => self.ui_state.move_tooltip(1),
                        KeyCode::BackTab => self.ui_state.move_tooltip(-1),
                        KeyCode::Char('x') => self.ui_state.hide_tooltip(),
                        _ => {}
                    }
                    redraw = true;
                }
            }
        }

        self.terminal.show_cursor()?;
        crossterm::terminal::disable_raw_mode()?;
        Ok(())
    }

    fn dispatch(&mut self, event: AppEvent) {
        trace!(?event, "key.dispatch");
        self.ui_state.dispatch(event);
    }

    fn cycle_filter(&mut self, control: FilterControl, step: isize) {
        if !self.ui_state.filters_enabled() {
            self.ui_state
                .push_log("Filters are only available in the explore scene");
            return;
        }
        match self.ui_state.cycled_filter(control, step) {
            Some(event) => self.dispatch(event),
            None => trace!(?control, "filter.cycle_noop"),
        }
    }
}

pub fn channel() -> (UnboundedSender<LoadEvent>, UnboundedReceiver<LoadEvent>) {
    unbounded_channel()
}

#[derive(Debug)]
pub enum LoadEvent {
    Loaded(Arc<Dataset>),
    Failed(String),
}

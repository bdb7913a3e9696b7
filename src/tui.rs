use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::app::Catalog;
use crate::domain::SpeciesKey;
use crate::error::CatalogError;
use crate::views::{MapView, ProfileView, RegionSelection, SpeciesListView};

const LOGS_MAX: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Species,
    Map,
}

pub struct Browser<'a> {
    catalog: &'a Catalog,
    list: SpeciesListView,
    profile: Option<ProfileView>,
    map: MapView<'a>,
    map_cursor: usize,
    pane: Pane,
    logs: VecDeque<String>,
}

impl<'a> Browser<'a> {
    pub fn new(catalog: &'a Catalog) -> Result<Self, CatalogError> {
        let mut browser = Self {
            catalog,
            list: SpeciesListView::load(catalog)?,
            profile: None,
            map: MapView::new(catalog)?,
            map_cursor: 0,
            pane: Pane::Species,
            logs: VecDeque::new(),
        };
        browser.refresh_profile()?;
        browser.log(format!("{} species loaded", browser.list.items().len()));
        Ok(browser)
    }

    pub fn run(&mut self) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        loop {
            terminal
                .draw(|frame| draw_ui(frame, &*self))
                .into_diagnostic()?;

            if event::poll(Duration::from_millis(200)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        let outcome = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.pane = match self.pane {
                    Pane::Species => Pane::Map,
                    Pane::Map => Pane::Species,
                };
                Ok(())
            }
            KeyCode::Up => self.move_cursor(false),
            KeyCode::Down => self.move_cursor(true),
            KeyCode::Enter if self.pane == Pane::Map => self.select_region(),
            KeyCode::Char('r') => self.reload(),
            _ => Ok(()),
        };
        if let Err(err) = outcome {
            tracing::warn!(error = %err, "browser action failed");
            self.log(format!("error: {err}"));
        }
        false
    }

    fn move_cursor(&mut self, down: bool) -> Result<(), CatalogError> {
        match self.pane {
            Pane::Species => {
                if down {
                    self.list.select_next();
                } else {
                    self.list.select_previous();
                }
                self.refresh_profile()
            }
            Pane::Map => {
                let last = self.map.regions().len().saturating_sub(1);
                self.map_cursor = if down {
                    (self.map_cursor + 1).min(last)
                } else {
                    self.map_cursor.saturating_sub(1)
                };
                Ok(())
            }
        }
    }

    fn select_region(&mut self) -> Result<(), CatalogError> {
        let Some(region) = self.map.regions().get(self.map_cursor).map(|r| r.name.clone()) else {
            return Ok(());
        };
        self.map.region_selected(&region)?;
        self.log(format!(
            "{region}: {} species",
            self.map.species().len()
        ));
        Ok(())
    }

    fn reload(&mut self) -> Result<(), CatalogError> {
        self.list.reload(self.catalog)?;
        self.map = MapView::new(self.catalog)?;
        self.map_cursor = 0;
        self.refresh_profile()?;
        self.log("reloaded".to_string());
        Ok(())
    }

    fn refresh_profile(&mut self) -> Result<(), CatalogError> {
        self.profile = match self.list.selected_item() {
            Some(item) => ProfileView::load(self.catalog, &SpeciesKey::Id(item.id))?,
            None => None,
        };
        Ok(())
    }

    fn log(&mut self, message: String) {
        if self.logs.len() == LOGS_MAX {
            self.logs.pop_front();
        }
        self.logs
            .push_back(format!("[{}] {message}", chrono::Local::now().format("%H:%M:%S")));
    }
}

fn draw_ui(frame: &mut ratatui::Frame, browser: &Browser<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "FROG & TOAD CATALOG",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(Color::Gray)),
        Span::raw("   Tab switch pane · ↑↓ move · Enter select region · r reload · q quit"),
    ]))
    .block(Block::default().borders(Borders::BOTTOM))
    .alignment(Alignment::Left);
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[1]);

    match browser.pane {
        Pane::Species => {
            draw_species_list(frame, browser, body[0]);
            draw_profile(frame, browser, body[1]);
        }
        Pane::Map => {
            draw_regions(frame, browser, body[0]);
            draw_region_species(frame, browser, body[1]);
        }
    }

    let logs: Vec<Line> = browser
        .logs
        .iter()
        .rev()
        .take(3)
        .map(|line| Line::from(line.clone()))
        .collect();
    let footer = Paragraph::new(logs)
        .block(Block::default().borders(Borders::TOP).title("Activity"))
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(footer, chunks[2]);
}

fn focused_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title)
}

fn highlight() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn draw_species_list(frame: &mut ratatui::Frame, browser: &Browser<'_>, area: Rect) {
    let items: Vec<ListItem> = browser
        .list
        .names()
        .into_iter()
        .map(|name| ListItem::new(name.to_string()))
        .collect();
    let list = List::new(items)
        .block(focused_block("Species"))
        .highlight_style(highlight())
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(browser.list.selected_index());
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_profile(frame: &mut ratatui::Frame, browser: &Browser<'_>, area: Rect) {
    let Some(view) = &browser.profile else {
        let empty = Paragraph::new("No species yet. Add one with `frogcat species save`.")
            .block(Block::default().borders(Borders::ALL).title("Profile"))
            .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    };

    let mut lines = vec![Line::from(Span::styled(
        view.profile().name().to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))];
    for (label, value) in view.field_lines() {
        lines.push(Line::from(vec![
            Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
            Span::raw(value.to_string()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(asset_line("Image", view.primary_image()));
    lines.push(asset_line("Call", view.primary_call()));
    lines.push(asset_line("Territory map", view.map_path()));
    lines.push(Line::from(view.native_to()));

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(view.title()))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn asset_line(label: &str, path: Option<&str>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        match path {
            Some(path) => Span::raw(path.to_string()),
            None => Span::styled("n/a", Style::default().fg(Color::DarkGray)),
        },
    ])
}

fn draw_regions(frame: &mut ratatui::Frame, browser: &Browser<'_>, area: Rect) {
    let items: Vec<ListItem> = browser
        .map
        .regions()
        .iter()
        .map(|region| {
            let style = if browser.map.selected_region() == Some(region.name.as_str()) {
                Style::default().fg(Color::LightRed)
            } else {
                Style::default()
            };
            ListItem::new(region.name.clone()).style(style)
        })
        .collect();
    let list = List::new(items)
        .block(focused_block("Map"))
        .highlight_style(highlight())
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select((!browser.map.regions().is_empty()).then_some(browser.map_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_region_species(frame: &mut ratatui::Frame, browser: &Browser<'_>, area: Rect) {
    let title = match browser.map.selected_region() {
        Some(region) => format!("Species in {region}"),
        None => "Select a region".to_string(),
    };
    let nothing_found =
        browser.map.selected_region().is_some() && browser.map.species().is_empty();
    let lines: Vec<Line> = if nothing_found {
        vec![Line::from(Span::styled(
            "none recorded",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        browser
            .map
            .species_names()
            .into_iter()
            .map(|name| Line::from(name.to_string()))
            .collect()
    };
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

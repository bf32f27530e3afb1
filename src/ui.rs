use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use life_tracker::forms::{self, InputType, DATE_FIELD};
use life_tracker::summary::EMPTY_HISTORY;
use life_tracker::{
    CardKind, DeleteOutcome, FormSchema, FormState, KeyValueStorage, NavTag, NoticeLevel, Screen,
    SummaryView, Tracker,
};
use life_tracker::view::HomeScreen;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tracing::{debug, warn};

pub struct App<S> {
    pub tracker: Tracker<S>,
    pub form_state: FormState,
    pub focused_field: usize,
    pub history_state: TableState,
    pub show_detail: bool,
    pub should_quit: bool,
}

impl<S: KeyValueStorage> App<S> {
    pub fn new(tracker: Tracker<S>) -> Self {
        Self {
            tracker,
            form_state: FormState::new(),
            focused_field: 0,
            history_state: TableState::default(),
            show_detail: false,
            should_quit: false,
        }
    }

    /// Mount a view; form input and selection start over
    pub fn go(&mut self, tag: NavTag) {
        self.tracker.navigate(tag);
        self.tracker.clear_notice();
        self.form_state.reset();
        self.focused_field = 0;
        self.show_detail = false;
        self.reset_selection();
    }

    fn reset_selection(&mut self) {
        if self.tracker.store().is_empty() {
            self.history_state.select(None);
        } else {
            self.history_state.select(Some(0));
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.tracker.store().len();
        match self.history_state.selected() {
            _ if len == 0 => self.history_state.select(None),
            Some(i) if i >= len => self.history_state.select(Some(len - 1)),
            None => self.history_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn next(&mut self) {
        let len = self.tracker.store().len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.history_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.tracker.store().len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.history_state.select(Some(i));
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.tracker.pending_delete().is_some() {
            self.handle_delete_prompt(key);
            return;
        }

        match self.tracker.form() {
            Some(schema) => self.handle_form_key(&schema, key),
            None => self.handle_page_key(key),
        }
    }

    fn handle_delete_prompt(&mut self, key: KeyEvent) {
        let confirmed = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => true,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
            _ => return,
        };

        match self.tracker.resolve_delete(confirmed) {
            Ok(DeleteOutcome::Deleted(record)) => debug!("Deleted {} record", record.record_type),
            Ok(DeleteOutcome::Cancelled) => {}
            Err(e) => {
                warn!("Delete failed: {e}");
                self.tracker.set_error(e.to_string());
            }
        }
        self.clamp_selection();
    }

    fn handle_form_key(&mut self, schema: &FormSchema, key: KeyEvent) {
        let field_count = schema.fields.len();

        match key.code {
            KeyCode::Esc => self.go(NavTag::Home),
            KeyCode::Enter => {
                // Errors are shown through the tracker notice
                if self.tracker.submit(&mut self.form_state, forms::today()).is_ok() {
                    self.focused_field = 0;
                }
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focused_field = (self.focused_field + 1) % field_count;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focused_field = (self.focused_field + field_count - 1) % field_count;
            }
            KeyCode::Backspace => {
                let name = schema.fields[self.focused_field].name;
                self.form_state.value_mut(name).pop();
            }
            KeyCode::Char(c) => {
                let name = schema.fields[self.focused_field].name;
                self.form_state.value_mut(name).push(c);
            }
            _ => {}
        }
    }

    fn handle_page_key(&mut self, key: KeyEvent) {
        let on_summary = self.tracker.view().tag() == NavTag::Summary;

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc if on_summary => self.go(NavTag::Home),
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.go(self.tracker.view().tag().previous());
                } else {
                    self.go(self.tracker.view().tag().next());
                }
            }
            KeyCode::BackTab => self.go(self.tracker.view().tag().previous()),
            KeyCode::Char('h') => self.go(NavTag::Home),
            KeyCode::Char(c @ '1'..='5') => {
                let pos = c as usize - '1' as usize;
                if let Some(link) = HomeScreen::new().links.get(pos) {
                    self.go(link.tag);
                }
            }
            KeyCode::Enter if on_summary => self.show_detail = !self.show_detail,
            KeyCode::Down | KeyCode::Char('j') if on_summary => self.next(),
            KeyCode::Up | KeyCode::Char('k') if on_summary => self.previous(),
            KeyCode::Home if on_summary => self.reset_selection(),
            KeyCode::End if on_summary => {
                let len = self.tracker.store().len();
                if len > 0 {
                    self.history_state.select(Some(len - 1));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete if on_summary => {
                if let Some(selected) = self.history_state.selected() {
                    let requested = self
                        .tracker
                        .request_delete(&selected.to_string())
                        .map(|_| ());
                    if let Err(e) = requested {
                        self.tracker.set_error(e.to_string());
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run_ui<S: KeyValueStorage>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend, S: KeyValueStorage>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui<S: KeyValueStorage>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.tracker.screen() {
        Screen::Home(home) => render_home(f, chunks[1], &home),
        Screen::Form(schema) => render_form(f, chunks[1], app, &schema),
        Screen::Summary(summary) => render_summary(f, chunks[1], app, &summary),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header<S: KeyValueStorage>(f: &mut Frame, area: Rect, app: &App<S>) {
    let current = app.tracker.view().tag();

    let mut tab_spans = vec![];
    for (i, tag) in NavTag::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *tag == current {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(tag.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Records: {}", app.tracker.store().len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

    f.render_widget(header, area);
}

fn render_home(f: &mut Frame, area: Rect, home: &HomeScreen) {
    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", home.title),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("  {}", home.subtitle),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];

    for (i, link) in home.links.iter().enumerate() {
        content.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{}", i + 1), Style::default().fg(Color::Yellow)),
            Span::raw(format!(". {}", link.label)),
        ]));
    }

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Home "),
    );

    f.render_widget(paragraph, area);
}

fn render_form<S: KeyValueStorage>(f: &mut Frame, area: Rect, app: &App<S>, schema: &FormSchema) {
    let mut content = vec![Line::from("")];

    for (i, field) in schema.fields.iter().enumerate() {
        let focused = i == app.focused_field;
        let value = app.form_state.get(field.name);

        let marker = if focused {
            Span::styled("→ ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        } else {
            Span::raw("  ")
        };

        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };

        let hint = match (field.input_type, field.name) {
            (_, DATE_FIELD) => "YYYY-MM-DD, blank = today",
            (InputType::Number, _) => "number",
            _ => "",
        };

        let mut spans = vec![
            Span::raw("  "),
            marker,
            Span::styled(field.label, label_style),
            Span::styled(if field.required { " *" } else { "" }, Style::default().fg(Color::Red)),
            Span::raw(": "),
            Span::styled(value.to_string(), Style::default().fg(Color::White)),
        ];
        if focused {
            spans.push(Span::styled("▏", Style::default().fg(Color::Yellow)));
        }
        if value.is_empty() && !hint.is_empty() {
            spans.push(Span::styled(
                format!(" ({hint})"),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ));
        }

        content.push(Line::from(spans));
        content.push(Line::from(""));
    }

    content.push(Line::from(Span::styled(
        "  Enter to save, Tab/↑/↓ to move between fields, Esc to go home",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", schema.title)),
    );

    f.render_widget(paragraph, area);
}

fn card_color(kind: &CardKind) -> Color {
    match kind {
        CardKind::Total => Color::White,
        CardKind::Count(record_type) => type_color(record_type.as_str()),
        CardKind::Highlight => Color::Yellow,
    }
}

fn type_color(record_type: &str) -> Color {
    match record_type {
        "expense" => Color::Red,
        "activity" => Color::Green,
        "habit" => Color::Magenta,
        "work" => Color::Cyan,
        _ => Color::White,
    }
}

fn render_summary<S: KeyValueStorage>(
    f: &mut Frame,
    area: Rect,
    app: &mut App<S>,
    summary: &SummaryView,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    // Cards
    let card_count = summary.cards.len() as u32;
    let card_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            summary
                .cards
                .iter()
                .map(|_| Constraint::Ratio(1, card_count))
                .collect::<Vec<_>>(),
        )
        .split(chunks[0]);

    for (card, card_area) in summary.cards.iter().zip(card_areas.iter()) {
        let color = card_color(&card.kind);
        let widget = Paragraph::new(Line::from(Span::styled(
            card.value.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(format!(" {} ", card.label)),
        );
        f.render_widget(widget, *card_area);
    }

    // History, optionally with the detail panel beside it
    if app.show_detail && !summary.history.is_empty() {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_history(f, content_chunks[0], app, summary);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_history(f, chunks[1], app, summary);
    }
}

fn render_history<S: KeyValueStorage>(
    f: &mut Frame,
    area: Rect,
    app: &mut App<S>,
    summary: &SummaryView,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", summary.history_title));

    if summary.history.is_empty() {
        let empty = Paragraph::new(format!("  {}", summary.empty_message.unwrap_or(EMPTY_HISTORY)))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["#", "Type", "Main Info", "Date", "Action"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = summary.history.iter().map(|row| {
        let color = type_color(&row.record_type);
        Row::new(vec![
            Cell::from(row.number.to_string()),
            Cell::from(row.record_type.clone()).style(Style::default().fg(color)),
            Cell::from(truncate(&row.primary_info, 40)),
            Cell::from(row.date.clone()),
            Cell::from("Delete").style(Style::default().fg(Color::Red)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Length(42),
            Constraint::Length(12),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.history_state);
}

fn render_detail_panel<S: KeyValueStorage>(f: &mut Frame, area: Rect, app: &App<S>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Record Details ");

    let record = match app
        .history_state
        .selected()
        .and_then(|i| app.tracker.store().get(i))
    {
        Some(r) => r,
        None => {
            f.render_widget(Paragraph::new("No record selected").block(block), area);
            return;
        }
    };

    let label_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Type: ", label_style),
            Span::styled(
                record.record_type.to_string(),
                Style::default().fg(type_color(record.record_type.as_str())),
            ),
        ]),
        Line::from(vec![Span::styled("  Date: ", label_style), Span::raw(record.date.clone())]),
        Line::from(""),
    ];

    for (label, value) in record.details() {
        content.push(Line::from(vec![
            Span::styled(format!("  {label}: "), label_style),
            Span::raw(value),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_status_bar<S: KeyValueStorage>(f: &mut Frame, area: Rect, app: &App<S>) {
    let key_style = Style::default().fg(Color::Yellow);
    let mut status_spans = vec![];

    if let Some(pending) = app.tracker.pending_delete() {
        status_spans.push(Span::styled(
            format!(" {} ", pending.prompt),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        status_spans.push(Span::raw(format!(
            "#{} {} ",
            pending.index + 1,
            pending.record.primary_info()
        )));
        status_spans.push(Span::styled("y", key_style));
        status_spans.push(Span::raw(" Yes | "));
        status_spans.push(Span::styled("n", key_style));
        status_spans.push(Span::raw(" No"));
    } else {
        if let Some(notice) = app.tracker.notice() {
            let color = match notice.level {
                NoticeLevel::Info => Color::Green,
                NoticeLevel::Error => Color::Red,
            };
            status_spans.push(Span::styled(
                format!(" {} ", notice.message),
                Style::default().fg(color),
            ));
            status_spans.push(Span::raw("| "));
        }

        let hints: &[(&str, &str)] = match app.tracker.view().tag() {
            NavTag::Summary => &[
                ("↑/↓", "Nav"),
                ("Enter", "Details"),
                ("d", "Delete"),
                ("Tab", "Page"),
                ("q", "Quit"),
            ],
            NavTag::Home => &[("1-5", "Open"), ("Tab", "Page"), ("q", "Quit")],
            _ => &[
                ("Enter", "Save"),
                ("Tab", "Field"),
                ("Esc", "Home"),
                ("Ctrl-C", "Quit"),
            ],
        };

        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                status_spans.push(Span::raw(" | "));
            }
            status_spans.push(Span::styled(*key, key_style));
            status_spans.push(Span::raw(format!(" {label}")));
        }
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use life_tracker::{MemoryStorage, RecordStore, DEFAULT_STORAGE_KEY};
    use ratatui::backend::TestBackend;

    fn app() -> App<MemoryStorage> {
        let store = RecordStore::open(MemoryStorage::new(), DEFAULT_STORAGE_KEY).unwrap();
        App::new(Tracker::new(store))
    }

    fn press(app: &mut App<MemoryStorage>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::empty()));
    }

    fn type_text(app: &mut App<MemoryStorage>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn draw(app: &mut App<MemoryStorage>) -> String {
        let backend = TestBackend::new(120, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    fn add_expense(app: &mut App<MemoryStorage>, amount: &str, category: &str) {
        app.go(NavTag::Expense);
        type_text(app, amount);
        press(app, KeyCode::Tab);
        type_text(app, category);
        press(app, KeyCode::Tab);
        type_text(app, "Card");
        press(app, KeyCode::Tab);
        type_text(app, "note");
        press(app, KeyCode::Enter);
    }

    #[test]
    fn test_number_keys_open_views() {
        let mut app = app();
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.tracker.view().tag(), NavTag::Expense);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('5'));
        assert_eq!(app.tracker.view().tag(), NavTag::Summary);
    }

    #[test]
    fn test_typing_in_form_does_not_navigate() {
        let mut app = app();
        app.go(NavTag::Expense);
        type_text(&mut app, "12q");
        press(&mut app, KeyCode::Backspace);

        assert_eq!(app.form_state.get("amount"), "12");
        assert!(!app.should_quit);
    }

    #[test]
    fn test_form_submit_saves_record() {
        let mut app = app();
        add_expense(&mut app, "20", "Food");

        assert_eq!(app.tracker.store().len(), 1);
        assert_eq!(app.tracker.store().list()[0].primary_info(), "$20 • Food");
        assert!(app.form_state.is_blank());
        assert!(draw(&mut app).contains("Record saved!"));
    }

    #[test]
    fn test_summary_draws_cards_and_history() {
        let mut app = app();
        add_expense(&mut app, "12", "Books");
        app.go(NavTag::Summary);

        let screen = draw(&mut app);
        assert!(screen.contains("Total Spent"));
        assert!(screen.contains("$12"));
        assert!(screen.contains("Books"));
    }

    #[test]
    fn test_empty_summary_shows_message() {
        let mut app = app();
        app.go(NavTag::Summary);
        assert!(draw(&mut app).contains(EMPTY_HISTORY));
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut app = app();
        add_expense(&mut app, "1", "A");
        add_expense(&mut app, "2", "B");
        app.go(NavTag::Summary);

        press(&mut app, KeyCode::Char('d'));
        assert!(app.tracker.pending_delete().is_some());
        assert!(draw(&mut app).contains("Delete this record?"));

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.tracker.store().len(), 2);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));

        let remaining = app.tracker.store().list();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].field_text("category"), "A");
        assert_eq!(app.history_state.selected(), Some(0));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer string", 8), "a lon...");
    }
}

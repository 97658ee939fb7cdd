use crate::export;
use crate::member::{Member, MemberDraft, MemberPatch, YearLevel};
use crate::stats::MembershipStats;
use crate::storage::{Storage, Theme};
use crate::store::{FilterCriteria, MemberStore};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Registry,
    Register,
    Statistics,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Registry => Page::Register,
            Page::Register => Page::Statistics,
            Page::Statistics => Page::Registry,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Registry => Page::Statistics,
            Page::Register => Page::Registry,
            Page::Statistics => Page::Register,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Registry => "Registry",
            Page::Register => "Register",
            Page::Statistics => "Statistics",
        }
    }
}

/// Which interaction owns the keyboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Browse,
    Search,
    DateFrom,
    DateTo,
    /// Edit form overlaying the registry (register uses its own page)
    EditForm,
    ConfirmDelete(String),
    ConfirmDeleteAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Alert {
    pub message: String,
    pub kind: AlertKind,
}

// ============================================================================
// ENTRY FORM
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    StudentNumber,
    Year,
    Fee,
}

impl FormField {
    fn next(&self) -> Self {
        match self {
            FormField::Name => FormField::StudentNumber,
            FormField::StudentNumber => FormField::Year,
            FormField::Year => FormField::Fee,
            FormField::Fee => FormField::Name,
        }
    }

    fn previous(&self) -> Self {
        match self {
            FormField::Name => FormField::Fee,
            FormField::StudentNumber => FormField::Name,
            FormField::Year => FormField::StudentNumber,
            FormField::Fee => FormField::Year,
        }
    }

    fn label(&self) -> &str {
        match self {
            FormField::Name => "Name",
            FormField::StudentNumber => "Student Number",
            FormField::Year => "Year Level",
            FormField::Fee => "Membership Fee",
        }
    }
}

/// Shared by the register page and the edit overlay. `editing` carries the
/// target id when the form patches an existing record.
#[derive(Debug, Clone)]
pub struct MemberForm {
    pub editing: Option<String>,
    pub name: String,
    pub student_number: String,
    pub year_index: usize,
    pub fee: String,
    pub field: FormField,
}

impl MemberForm {
    /// Blank registration form with the default fee pre-filled.
    pub fn blank() -> Self {
        MemberForm {
            editing: None,
            name: String::new(),
            student_number: String::new(),
            year_index: 0,
            fee: "20".to_string(),
            field: FormField::Name,
        }
    }

    pub fn for_member(member: &Member) -> Self {
        let year_index = YearLevel::ALL
            .iter()
            .position(|y| y.as_str() == member.school_year)
            .unwrap_or(0);

        MemberForm {
            editing: Some(member.id.clone()),
            name: member.name.clone(),
            student_number: member.student_number.clone(),
            year_index,
            fee: member.membership_fee.to_string(),
            field: FormField::Name,
        }
    }

    pub fn year(&self) -> YearLevel {
        YearLevel::ALL[self.year_index]
    }

    fn active_buffer(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Name => Some(&mut self.name),
            FormField::StudentNumber => Some(&mut self.student_number),
            FormField::Fee => Some(&mut self.fee),
            FormField::Year => None,
        }
    }

    fn cycle_year(&mut self, forward: bool) {
        let len = YearLevel::ALL.len();
        self.year_index = if forward {
            (self.year_index + 1) % len
        } else {
            (self.year_index + len - 1) % len
        };
    }
}

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub store: MemberStore,
    pub storage: Option<Storage>,
    pub theme: Theme,
    pub criteria: FilterCriteria,
    pub filtered: Vec<Member>,
    pub table_state: TableState,
    pub current_page: Page,
    pub mode: Mode,
    pub form: MemberForm,
    pub input: String,
    pub alert: Option<Alert>,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: MemberStore, storage: Option<Storage>, theme: Theme) -> Self {
        let filtered = store.members().to_vec();
        let mut table_state = TableState::default();
        if !filtered.is_empty() {
            table_state.select(Some(0));
        }

        Self {
            store,
            storage,
            theme,
            criteria: FilterCriteria::default(),
            filtered,
            table_state,
            current_page: Page::Registry,
            mode: Mode::Browse,
            form: MemberForm::blank(),
            input: String::new(),
            alert: None,
            should_quit: false,
        }
    }

    pub fn refresh(&mut self) {
        self.filtered = self.store.filter(&self.criteria);
        match self.table_state.selected() {
            Some(i) if i >= self.filtered.len() => {
                if self.filtered.is_empty() {
                    self.table_state.select(None);
                } else {
                    self.table_state.select(Some(self.filtered.len() - 1));
                }
            }
            None if !self.filtered.is_empty() => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn selected_member(&self) -> Option<&Member> {
        self.table_state
            .selected()
            .and_then(|i| self.filtered.get(i))
    }

    pub fn stats(&self) -> MembershipStats {
        MembershipStats::calculate(&self.filtered)
    }

    fn success(&mut self, message: String) {
        self.alert = Some(Alert {
            message,
            kind: AlertKind::Success,
        });
    }

    fn error(&mut self, message: String) {
        self.alert = Some(Alert {
            message,
            kind: AlertKind::Error,
        });
    }

    /// Best-effort save. Memory stays authoritative when the write fails.
    fn persist(&mut self) {
        if let Some(storage) = &self.storage {
            if let Err(err) = storage.save_store(&self.store) {
                self.error(format!("Save failed (data kept in memory): {}", err));
            }
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Some(storage) = &self.storage {
            if let Err(err) = storage.save_theme(self.theme) {
                self.error(format!("Could not save theme: {}", err));
            }
        }
    }

    // ========================================================================
    // OPERATIONS (all user actions funnel through the store)
    // ========================================================================

    fn submit_form(&mut self) {
        let fee = self.form.fee.trim().parse::<f64>().unwrap_or(f64::NAN);
        let year = self.form.year().as_str().to_string();

        let outcome = match self.form.editing.clone() {
            None => self
                .store
                .register(MemberDraft {
                    name: self.form.name.clone(),
                    student_number: self.form.student_number.clone(),
                    school_year: year,
                    membership_fee: fee,
                })
                .map(|m| format!("Member registered! Control Number: {}", m.control_number)),
            Some(id) => self
                .store
                .update(
                    &id,
                    MemberPatch {
                        name: self.form.name.clone(),
                        student_number: self.form.student_number.clone(),
                        school_year: year,
                        membership_fee: fee,
                    },
                )
                .map(|m| format!("Member {} updated", m.student_number)),
        };

        match outcome {
            Ok(message) => {
                let was_edit = self.form.editing.is_some();
                self.success(message);
                self.form = MemberForm::blank();
                self.persist();
                self.refresh();
                if was_edit {
                    self.mode = Mode::Browse;
                } else {
                    self.current_page = Page::Registry;
                }
            }
            Err(err) => self.error(err.to_string()),
        }
    }

    fn delete_selected(&mut self, id: &str) {
        match self.store.delete(id) {
            Ok(removed) => {
                self.success(format!(
                    "Deleted {} ({})",
                    removed.name, removed.control_number
                ));
                self.persist();
                self.refresh();
            }
            Err(err) => self.error(err.to_string()),
        }
        self.mode = Mode::Browse;
    }

    fn delete_all(&mut self) {
        self.store.delete_all();
        self.success("All members deleted".to_string());
        self.persist();
        self.refresh();
        self.mode = Mode::Browse;
    }

    fn export_csv(&mut self) {
        if self.filtered.is_empty() {
            self.error("No data to export".to_string());
            return;
        }
        let filename = export::default_csv_filename(Local::now().date_naive());
        match export::export_csv_file(Path::new(&filename), &self.filtered) {
            Ok(()) => self.success(format!(
                "Exported {} members to {}",
                self.filtered.len(),
                filename
            )),
            Err(err) => self.error(format!("Export failed: {}", err)),
        }
    }

    fn export_json(&mut self) {
        let filename = format!("members_backup_{}.json", Local::now().date_naive());
        match export::export_json_file(Path::new(&filename), &self.store) {
            Ok(()) => self.success(format!("Backup written to {}", filename)),
            Err(err) => self.error(format!("Backup failed: {}", err)),
        }
    }

    fn cycle_year_filter(&mut self) {
        // All -> 1st -> 2nd -> 3rd -> 4th -> All
        self.criteria.year = match &self.criteria.year {
            None => Some(YearLevel::First.as_str().to_string()),
            Some(label) => match YearLevel::parse(label) {
                Some(YearLevel::Fourth) | None => None,
                Some(year) => {
                    let index = YearLevel::ALL.iter().position(|y| *y == year).unwrap_or(0);
                    Some(YearLevel::ALL[index + 1].as_str().to_string())
                }
            },
        };
        self.refresh();
    }

    fn apply_date_input(&mut self) {
        let text = self.input.trim().to_string();
        let bound = if text.is_empty() {
            None
        } else {
            match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    self.error(format!("Invalid date: {} (use YYYY-MM-DD)", text));
                    self.mode = Mode::Browse;
                    self.input.clear();
                    return;
                }
            }
        };

        match self.mode {
            Mode::DateFrom => self.criteria.date_from = bound,
            Mode::DateTo => self.criteria.date_to = bound,
            _ => {}
        }
        self.input.clear();
        self.mode = Mode::Browse;
        self.refresh();
    }

    fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.refresh();
    }

    // ========================================================================
    // NAVIGATION
    // ========================================================================

    pub fn next(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
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

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            handle_key(app, key.code);
            if app.should_quit {
                return Ok(());
            }
        }
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    // A fresh keypress dismisses the previous alert
    if app.alert.is_some() {
        app.alert = None;
    }

    match app.mode.clone() {
        Mode::Search => handle_search_key(app, code),
        Mode::DateFrom | Mode::DateTo => handle_date_key(app, code),
        Mode::EditForm => handle_form_key(app, code, true),
        Mode::ConfirmDelete(id) => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.delete_selected(&id),
            _ => app.mode = Mode::Browse,
        },
        Mode::ConfirmDeleteAll => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.delete_all(),
            _ => app.mode = Mode::Browse,
        },
        Mode::Browse => {
            if app.current_page == Page::Register {
                handle_form_key(app, code, false);
            } else {
                handle_browse_key(app, code);
            }
        }
    }
}

fn handle_browse_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Tab => {
            app.current_page = app.current_page.next();
            return;
        }
        KeyCode::BackTab => {
            app.current_page = app.current_page.previous();
            return;
        }
        KeyCode::Char('t') => {
            app.toggle_theme();
            return;
        }
        _ => {}
    }

    if app.current_page != Page::Registry {
        return;
    }

    match code {
        KeyCode::Char('/') => app.mode = Mode::Search,
        KeyCode::Char('y') => app.cycle_year_filter(),
        KeyCode::Char('f') => {
            app.input = app
                .criteria
                .date_from
                .map(|d| d.to_string())
                .unwrap_or_default();
            app.mode = Mode::DateFrom;
        }
        KeyCode::Char('g') => {
            app.input = app
                .criteria
                .date_to
                .map(|d| d.to_string())
                .unwrap_or_default();
            app.mode = Mode::DateTo;
        }
        KeyCode::Char('c') => app.clear_filters(),
        KeyCode::Char('e') => {
            if let Some(member) = app.selected_member() {
                app.form = MemberForm::for_member(member);
                app.mode = Mode::EditForm;
            } else {
                app.error("No member selected".to_string());
            }
        }
        KeyCode::Char('d') => {
            if let Some(member) = app.selected_member() {
                app.mode = Mode::ConfirmDelete(member.id.clone());
            } else {
                app.error("No member selected".to_string());
            }
        }
        KeyCode::Char('D') => {
            if app.store.is_empty() {
                app.error("Registry is already empty".to_string());
            } else {
                app.mode = Mode::ConfirmDeleteAll;
            }
        }
        KeyCode::Char('x') => app.export_csv(),
        KeyCode::Char('b') => app.export_json(),
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Home => {
            if !app.filtered.is_empty() {
                app.table_state.select(Some(0));
            }
        }
        KeyCode::End => {
            if !app.filtered.is_empty() {
                app.table_state.select(Some(app.filtered.len() - 1));
            }
        }
        _ => {}
    }
}

fn handle_search_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Enter | KeyCode::Esc => app.mode = Mode::Browse,
        KeyCode::Backspace => {
            app.criteria.search.pop();
            app.refresh();
        }
        KeyCode::Char(c) => {
            app.criteria.search.push(c);
            app.refresh();
        }
        _ => {}
    }
}

fn handle_date_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Enter => app.apply_date_input(),
        KeyCode::Esc => {
            app.input.clear();
            app.mode = Mode::Browse;
        }
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) => app.input.push(c),
        _ => {}
    }
}

fn handle_form_key(app: &mut App, code: KeyCode, is_edit_overlay: bool) {
    match code {
        KeyCode::Esc => {
            if is_edit_overlay {
                app.mode = Mode::Browse;
            } else {
                app.form = MemberForm::blank();
            }
        }
        KeyCode::Tab if !is_edit_overlay => {
            app.current_page = app.current_page.next();
        }
        KeyCode::Enter => app.submit_form(),
        KeyCode::Down => app.form.field = app.form.field.next(),
        KeyCode::Up => app.form.field = app.form.field.previous(),
        KeyCode::Left if app.form.field == FormField::Year => app.form.cycle_year(false),
        KeyCode::Right if app.form.field == FormField::Year => app.form.cycle_year(true),
        KeyCode::Backspace => {
            if let Some(buffer) = app.form.active_buffer() {
                buffer.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(buffer) = app.form.active_buffer() {
                buffer.push(c);
            }
        }
        _ => {}
    }
}

// ============================================================================
// RENDERING
// ============================================================================

struct Palette {
    border: Color,
    text: Color,
    accent: Color,
    dim: Color,
    header_bg: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            border: Color::White,
            text: Color::White,
            accent: Color::Yellow,
            dim: Color::DarkGray,
            header_bg: Color::DarkGray,
        },
        Theme::Light => Palette {
            border: Color::Blue,
            text: Color::Black,
            accent: Color::Blue,
            dim: Color::Gray,
            header_bg: Color::Gray,
        },
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar / alerts
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Registry => {
            render_table(f, chunks[1], app);
            if app.mode == Mode::EditForm {
                render_form_overlay(f, chunks[1], app);
            }
        }
        Page::Register => render_form_page(f, chunks[1], app),
        Page::Statistics => render_statistics(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let colors = palette(app.theme);
    let stats = app.stats();

    let pages = [Page::Registry, Page::Register, Page::Statistics];
    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(colors.dim)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Members: {}", stats.total_members),
        Style::default().fg(colors.text),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("₱{}", stats.total_revenue),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Student Membership Registry "),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let colors = palette(app.theme);

    let header_cells = [
        "Control Number",
        "Name",
        "Student Number",
        "Year",
        "Fee",
        "Registered",
    ]
    .iter()
    .map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(colors.header_bg))
        .height(1);

    let rows = app.filtered.iter().map(|member| {
        let cells = vec![
            Cell::from(member.control_number.clone()),
            Cell::from(truncate(&member.name, 28)),
            Cell::from(member.student_number.clone()),
            Cell::from(member.school_year.clone()),
            Cell::from(format!("₱{}", member.membership_fee)),
            Cell::from(member.registration_date.to_string()),
        ];
        Row::new(cells).height(1)
    });

    let title = if app.criteria.is_empty() {
        format!(" Members ({}) ", app.filtered.len())
    } else {
        format!(" Members ({}, filtered) ", app.filtered.len())
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Length(30),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.border))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(colors.header_bg)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_form_fields(form: &MemberForm, colors: &Palette) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];

    let fields = [
        (FormField::Name, form.name.clone()),
        (FormField::StudentNumber, form.student_number.clone()),
        (FormField::Year, format!("◂ {} ▸", form.year().as_str())),
        (FormField::Fee, form.fee.clone()),
    ];

    for (field, value) in fields {
        let focused = form.field == field;
        let marker = if focused { "→ " } else { "  " };
        let label_style = if focused {
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.dim)
        };

        let mut spans = vec![
            Span::raw(marker.to_string()),
            Span::styled(format!("{:<16}", field.label()), label_style),
            Span::styled(value, Style::default().fg(colors.text)),
        ];
        if focused && field != FormField::Year {
            spans.push(Span::styled("▏", Style::default().fg(colors.accent)));
        }

        lines.push(Line::from(spans));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(vec![Span::styled(
        "  Enter submit · ↑/↓ field · ◂▸ year · Esc cancel",
        Style::default()
            .fg(colors.dim)
            .add_modifier(Modifier::ITALIC),
    )]));

    lines
}

fn render_form_page(f: &mut Frame, area: Rect, app: &App) {
    let colors = palette(app.theme);
    let lines = render_form_fields(&app.form, &colors);

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.border))
            .title(" Register New Member "),
    );

    f.render_widget(form, area);
}

fn render_form_overlay(f: &mut Frame, area: Rect, app: &App) {
    let colors = palette(app.theme);
    let width = 52.min(area.width);
    let height = 13.min(area.height);
    let overlay = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let lines = render_form_fields(&app.form, &colors);
    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.accent))
            .title(" Edit Member "),
    );

    f.render_widget(Clear, overlay);
    f.render_widget(form, overlay);
}

fn render_statistics(f: &mut Frame, area: Rect, app: &App) {
    let colors = palette(app.theme);
    let stats = app.stats();

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Membership Summary",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Total Members:  ", Style::default().fg(colors.dim)),
            Span::styled(
                format!("{}", stats.total_members),
                Style::default()
                    .fg(colors.text)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Total Revenue:  ", Style::default().fg(colors.dim)),
            Span::styled(
                format!("₱{}", stats.total_revenue),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  By Year Level",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
    ];

    for year in YearLevel::ALL {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<12}", year.as_str()),
                Style::default().fg(colors.dim),
            ),
            Span::styled(
                format!("{:>4}", stats.count_for(year)),
                Style::default().fg(colors.text),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(
            "  Reusable control numbers: ",
            Style::default().fg(colors.dim),
        ),
        Span::styled(
            format!("{}", app.store.reclaimed_numbers().len()),
            Style::default().fg(colors.text),
        ),
    ]));
    if let Some(next) = app.store.reclaimed_numbers().first() {
        lines.push(Line::from(vec![
            Span::styled("  Next reused: ", Style::default().fg(colors.dim)),
            Span::styled(next.clone(), Style::default().fg(colors.accent)),
        ]));
    }

    if !app.criteria.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(
            "  Figures reflect the current filter",
            Style::default()
                .fg(colors.dim)
                .add_modifier(Modifier::ITALIC),
        )]));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.border))
            .title(" Statistics "),
    );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let colors = palette(app.theme);

    let line = if let Some(alert) = &app.alert {
        let style = match alert.kind {
            AlertKind::Success => Style::default().fg(Color::Green),
            AlertKind::Error => Style::default().fg(Color::Red),
        };
        Line::from(vec![Span::styled(
            format!(" {} ", alert.message),
            style.add_modifier(Modifier::BOLD),
        )])
    } else {
        match &app.mode {
            Mode::Search => Line::from(vec![
                Span::styled(" Search: ", Style::default().fg(colors.accent)),
                Span::styled(
                    app.criteria.search.clone(),
                    Style::default().fg(colors.text),
                ),
                Span::styled("▏", Style::default().fg(colors.accent)),
                Span::styled("  (Enter/Esc done)", Style::default().fg(colors.dim)),
            ]),
            Mode::DateFrom | Mode::DateTo => {
                let which = if app.mode == Mode::DateFrom {
                    "from"
                } else {
                    "to"
                };
                Line::from(vec![
                    Span::styled(
                        format!(" Date {} (YYYY-MM-DD, empty clears): ", which),
                        Style::default().fg(colors.accent),
                    ),
                    Span::styled(app.input.clone(), Style::default().fg(colors.text)),
                    Span::styled("▏", Style::default().fg(colors.accent)),
                ])
            }
            Mode::ConfirmDelete(_) => Line::from(vec![Span::styled(
                " Delete this member? (y/n) ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Mode::ConfirmDeleteAll => Line::from(vec![Span::styled(
                " Delete ALL members? This cannot be undone! (y/n) ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Mode::EditForm => Line::from(vec![Span::styled(
                " Editing member - Enter submit, Esc cancel ",
                Style::default().fg(colors.accent),
            )]),
            Mode::Browse => match app.current_page {
                Page::Registry => Line::from(vec![
                    Span::styled(" /", Style::default().fg(colors.accent)),
                    Span::raw(" search | "),
                    Span::styled("y", Style::default().fg(colors.accent)),
                    Span::raw(" year | "),
                    Span::styled("f/g", Style::default().fg(colors.accent)),
                    Span::raw(" dates | "),
                    Span::styled("c", Style::default().fg(colors.accent)),
                    Span::raw(" clear | "),
                    Span::styled("e", Style::default().fg(colors.accent)),
                    Span::raw(" edit | "),
                    Span::styled("d", Style::default().fg(colors.accent)),
                    Span::raw(" del | "),
                    Span::styled("D", Style::default().fg(Color::Red)),
                    Span::raw(" del all | "),
                    Span::styled("x", Style::default().fg(colors.accent)),
                    Span::raw(" csv | "),
                    Span::styled("b", Style::default().fg(colors.accent)),
                    Span::raw(" backup | "),
                    Span::styled("t", Style::default().fg(colors.accent)),
                    Span::raw(" theme | "),
                    Span::styled("q", Style::default().fg(Color::Red)),
                    Span::raw(" quit"),
                ]),
                Page::Register => Line::from(vec![
                    Span::raw(" Type to fill fields | "),
                    Span::styled("Tab", Style::default().fg(colors.accent)),
                    Span::raw(" next page | "),
                    Span::styled("Esc", Style::default().fg(colors.accent)),
                    Span::raw(" reset form"),
                ]),
                Page::Statistics => Line::from(vec![
                    Span::styled(" Tab", Style::default().fg(colors.accent)),
                    Span::raw(" next page | "),
                    Span::styled("t", Style::default().fg(colors.accent)),
                    Span::raw(" theme | "),
                    Span::styled("q", Style::default().fg(Color::Red)),
                    Span::raw(" quit"),
                ]),
            },
        }
    };

    let status_bar = Paragraph::new(vec![line]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.border)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn create_test_app() -> App {
        let mut store = MemberStore::new();
        store
            .register_on(
                MemberDraft {
                    name: "Ana Cruz".to_string(),
                    student_number: "2021-0001".to_string(),
                    school_year: "1st Year".to_string(),
                    membership_fee: 20.0,
                },
                test_date(),
            )
            .unwrap();
        App::new(store, None, Theme::Light)
    }

    #[test]
    fn test_page_cycle() {
        assert_eq!(Page::Registry.next(), Page::Register);
        assert_eq!(Page::Statistics.next(), Page::Registry);
        assert_eq!(Page::Registry.previous(), Page::Statistics);
    }

    #[test]
    fn test_form_field_cycle() {
        assert_eq!(FormField::Name.next(), FormField::StudentNumber);
        assert_eq!(FormField::Fee.next(), FormField::Name);
        assert_eq!(FormField::Name.previous(), FormField::Fee);
    }

    #[test]
    fn test_form_submit_registers_member() {
        let mut app = create_test_app();
        app.form.name = "Ben Reyes".to_string();
        app.form.student_number = "2021-0002".to_string();
        app.form.year_index = 1;
        app.form.fee = "25".to_string();

        app.submit_form();

        assert_eq!(app.store.len(), 2);
        assert_eq!(app.alert.as_ref().unwrap().kind, AlertKind::Success);
        // Form resets for the next entry
        assert!(app.form.name.is_empty());
        assert_eq!(app.form.fee, "20");
    }

    #[test]
    fn test_form_submit_invalid_fee_reports_error() {
        let mut app = create_test_app();
        app.form.name = "Ben Reyes".to_string();
        app.form.student_number = "2021-0002".to_string();
        app.form.fee = "abc".to_string();

        app.submit_form();

        assert_eq!(app.store.len(), 1);
        assert_eq!(app.alert.as_ref().unwrap().kind, AlertKind::Error);
    }

    #[test]
    fn test_form_edit_keeps_identity() {
        let mut app = create_test_app();
        let member = app.store.members()[0].clone();

        app.form = MemberForm::for_member(&member);
        app.form.name = "Ana C. Cruz".to_string();
        app.mode = Mode::EditForm;
        app.submit_form();

        let updated = app.store.get(&member.id).unwrap();
        assert_eq!(updated.name, "Ana C. Cruz");
        assert_eq!(updated.control_number, member.control_number);
        assert_eq!(app.mode, Mode::Browse);
    }

    #[test]
    fn test_search_refreshes_view() {
        let mut app = create_test_app();
        app.mode = Mode::Search;
        handle_search_key(&mut app, KeyCode::Char('z'));
        assert!(app.filtered.is_empty());

        handle_search_key(&mut app, KeyCode::Backspace);
        assert_eq!(app.filtered.len(), 1);
    }

    #[test]
    fn test_year_filter_cycles_back_to_all() {
        let mut app = create_test_app();
        assert!(app.criteria.year.is_none());

        app.cycle_year_filter();
        assert_eq!(app.criteria.year.as_deref(), Some("1st Year"));

        for _ in 0..4 {
            app.cycle_year_filter();
        }
        assert!(app.criteria.year.is_none());
    }

    #[test]
    fn test_date_input_parses_and_clears() {
        let mut app = create_test_app();
        app.mode = Mode::DateFrom;
        app.input = "2024-03-16".to_string();
        app.apply_date_input();
        assert_eq!(
            app.criteria.date_from,
            Some(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap())
        );
        assert!(app.filtered.is_empty());

        app.mode = Mode::DateFrom;
        app.input = String::new();
        app.apply_date_input();
        assert!(app.criteria.date_from.is_none());
        assert_eq!(app.filtered.len(), 1);
    }

    #[test]
    fn test_date_input_invalid_reports_error() {
        let mut app = create_test_app();
        app.mode = Mode::DateFrom;
        app.input = "03/16/2024".to_string();
        app.apply_date_input();
        assert!(app.criteria.date_from.is_none());
        assert_eq!(app.alert.as_ref().unwrap().kind, AlertKind::Error);
    }

    #[test]
    fn test_delete_confirmation_flow() {
        let mut app = create_test_app();
        let id = app.store.members()[0].id.clone();

        app.mode = Mode::ConfirmDelete(id.clone());
        handle_key(&mut app, KeyCode::Char('n'));
        assert_eq!(app.store.len(), 1);

        app.mode = Mode::ConfirmDelete(id);
        handle_key(&mut app, KeyCode::Char('y'));
        assert!(app.store.is_empty());
        assert_eq!(app.store.reclaimed_numbers().len(), 1);
    }

    #[test]
    fn test_delete_all_flow() {
        let mut app = create_test_app();
        app.mode = Mode::ConfirmDeleteAll;
        handle_key(&mut app, KeyCode::Char('y'));
        assert!(app.store.is_empty());
        assert!(app.store.reclaimed_numbers().is_empty());
    }

    #[test]
    fn test_selection_clamped_after_refresh() {
        let mut app = create_test_app();
        app.table_state.select(Some(0));
        let id = app.store.members()[0].id.clone();
        app.store.delete(&id).unwrap();
        app.refresh();
        assert!(app.table_state.selected().is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long member name", 10), "a very ...");
    }
}

use crate::session::{SaveOutcome, Session};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use directories::BaseDirs;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::ListState;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run(session: Session) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(session);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    session: Session,
    editor: EditBuffer,
    focus: Focus,
    sidebar_idx: usize,
    sidebar_offset: usize,
    last_save: Instant,
    last_size: Option<(u16, u16)>,
    status: String,
    status_at: Instant,
    mode: Mode,
}

enum Mode {
    Normal,
    Rename(EditBuffer),
    ChooseDir(EditBuffer),
    ConfirmDelete,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Focus {
    Editor,
    Sidebar,
}

enum PromptAction {
    Rename,
    ChooseDir,
}

#[derive(Clone)]
struct EditBuffer {
    value: String,
    cursor: usize,
}

impl EditBuffer {
    fn new(value: &str) -> Self {
        EditBuffer {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.len();
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_grapheme(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_grapheme(self.cursor, &self.value);
    }

    fn move_up(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx == 0 {
            return;
        }
        let target_start = line_starts[line_idx - 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn move_down(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx + 1 >= line_starts.len() {
            return;
        }
        let target_start = line_starts[line_idx + 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_grapheme(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl App {
    fn new(session: Session) -> Self {
        let status = format!("Opened notes in {}", session.notes_dir().display());
        let editor = EditBuffer::new(session.text());
        let mut app = App {
            session,
            editor,
            focus: Focus::Editor,
            sidebar_idx: 0,
            sidebar_offset: 0,
            last_save: Instant::now(),
            last_size: None,
            status,
            status_at: Instant::now(),
            mode: Mode::Normal,
        };
        app.sync_sidebar();
        app
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    self.status_at = Instant::now();
                    if self.handle_key(key)? {
                        break;
                    }
                }
            } else if !self.status.is_empty() && self.status_at.elapsed() > STATUS_TIMEOUT {
                self.status.clear();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Rename(_) | Mode::ChooseDir(_) => self.handle_prompt_key(key),
            Mode::ConfirmDelete => self.handle_confirm_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') => return self.quit(),
                KeyCode::Char('s') => {
                    self.save_current();
                    return Ok(false);
                }
                KeyCode::Char('n') => {
                    self.new_note();
                    return Ok(false);
                }
                KeyCode::Char('d') => {
                    self.confirm_delete();
                    return Ok(false);
                }
                KeyCode::Char('r') => {
                    self.open_rename_prompt();
                    return Ok(false);
                }
                KeyCode::Char('o') => {
                    self.open_dir_prompt();
                    return Ok(false);
                }
                KeyCode::Char('l') => {
                    self.toggle_sidebar();
                    return Ok(false);
                }
                _ => {}
            }
        }
        match key.code {
            KeyCode::PageUp => {
                self.switch_previous();
                return Ok(false);
            }
            KeyCode::PageDown => {
                self.switch_next();
                return Ok(false);
            }
            _ => {}
        }

        match self.focus {
            Focus::Editor => self.handle_editor_key(key),
            Focus::Sidebar => self.handle_sidebar_key(key),
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc | KeyCode::Tab => {
                self.save_current();
                if self.session.show_list() {
                    self.focus = Focus::Sidebar;
                    self.sync_sidebar();
                }
            }
            KeyCode::Left => self.editor.move_left(),
            KeyCode::Right => self.editor.move_right(),
            KeyCode::Up => self.editor.move_up(),
            KeyCode::Down => self.editor.move_down(),
            KeyCode::Enter => self.editor.insert_char('\n'),
            KeyCode::Backspace => self.editor.backspace(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    self.editor.insert_char(c);
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return self.quit(),
            KeyCode::Esc | KeyCode::Tab => self.focus = Focus::Editor,
            KeyCode::Up | KeyCode::Char('k') => {
                if self.sidebar_idx > 0 {
                    self.sidebar_idx -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.sidebar_idx + 1 < self.session.listing().len() {
                    self.sidebar_idx += 1;
                }
            }
            KeyCode::Enter => self.open_selected(),
            KeyCode::Char('n') => self.new_note(),
            KeyCode::Char('d') => self.confirm_delete(),
            KeyCode::Char('r') => self.open_rename_prompt(),
            KeyCode::Char('o') => self.open_dir_prompt(),
            KeyCode::Char('l') => self.toggle_sidebar(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut close = false;
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match &mut mode {
            Mode::Rename(input) => {
                close = self.process_prompt_key(PromptAction::Rename, input, key);
            }
            Mode::ChooseDir(input) => {
                close = self.process_prompt_key(PromptAction::ChooseDir, input, key);
            }
            Mode::ConfirmDelete => {}
            Mode::Normal => {}
        }
        self.mode = if close { Mode::Normal } else { mode };
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let deleted = self.session.current_id().to_string();
                match self.session.delete_current() {
                    Ok(()) => {
                        self.after_navigation();
                        self.status = format!("Deleted {}", deleted);
                    }
                    Err(err) => self.status = format!("Delete failed: {}", err),
                }
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
        Ok(false)
    }

    fn process_prompt_key(
        &mut self,
        action: PromptAction,
        input: &mut EditBuffer,
        key: KeyEvent,
    ) -> bool {
        let mut close = false;
        match key.code {
            KeyCode::Esc => {
                close = true;
                self.status = "Canceled".into();
            }
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Enter => {
                let value = input.value.clone();
                close = match action {
                    PromptAction::Rename => self.try_rename(&value),
                    PromptAction::ChooseDir => self.try_choose_dir(&value),
                };
            }
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    input.insert_char(c);
                }
            }
            _ => {}
        }
        close
    }

    fn try_rename(&mut self, raw: &str) -> bool {
        let name = raw.trim();
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            self.status = "Rename failed: invalid name".into();
            return false;
        }
        match self.session.rename_current(name) {
            Ok(()) => {
                self.sync_sidebar();
                self.status = format!("Renamed to {}", name);
                true
            }
            Err(err) => {
                self.status = format!("Rename failed: {}", err);
                false
            }
        }
    }

    fn try_choose_dir(&mut self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.status = "Canceled".into();
            return true;
        }
        let path = expand_home(trimmed);
        match self.session.choose_directory(path, &self.editor.value) {
            Ok(()) => {
                self.after_navigation();
                self.status = format!("Notes folder: {}", self.session.notes_dir().display());
                true
            }
            Err(err) => {
                self.status = format!("Folder not changed: {}", err);
                false
            }
        }
    }

    fn save_current(&mut self) {
        match self.session.save(&self.editor.value) {
            Ok(SaveOutcome::Written) => {
                self.last_save = Instant::now();
                self.status = format!("Saved {}", self.session.current_id());
            }
            Ok(SaveOutcome::Unchanged) => {}
            Err(err) => self.status = format!("Save failed: {}", err),
        }
    }

    fn switch_previous(&mut self) {
        match self.session.previous(&self.editor.value) {
            Ok(()) => self.after_navigation(),
            Err(err) => self.status = format!("Switch failed: {}", err),
        }
    }

    fn switch_next(&mut self) {
        match self.session.next(&self.editor.value) {
            Ok(()) => self.after_navigation(),
            Err(err) => self.status = format!("Switch failed: {}", err),
        }
    }

    fn open_selected(&mut self) {
        let id = match self.session.listing().get(self.sidebar_idx) {
            Some(id) => id.clone(),
            None => return,
        };
        match self.session.select(&id, &self.editor.value) {
            Ok(()) => {
                self.after_navigation();
                self.focus = Focus::Editor;
                self.status = format!("Opened {}", self.session.current_id());
            }
            Err(err) => self.status = format!("Open failed: {}", err),
        }
    }

    fn new_note(&mut self) {
        match self.session.new_note(&self.editor.value) {
            Ok(()) => {
                self.after_navigation();
                self.focus = Focus::Editor;
                self.status = format!("New note {}", self.session.current_id());
            }
            Err(err) => self.status = format!("Create failed: {}", err),
        }
    }

    fn confirm_delete(&mut self) {
        self.status = format!(
            "Delete {}? (y to confirm, n/Esc to cancel)",
            self.session.current_id()
        );
        self.mode = Mode::ConfirmDelete;
    }

    fn open_rename_prompt(&mut self) {
        self.mode = Mode::Rename(EditBuffer::new(self.session.current_id()));
        self.status = "Renaming (Enter apply, Esc cancel)".into();
    }

    fn open_dir_prompt(&mut self) {
        let dir = self.session.notes_dir().display().to_string();
        self.mode = Mode::ChooseDir(EditBuffer::new(&dir));
        self.status = "Choose notes folder (Enter apply, Esc cancel)".into();
    }

    fn toggle_sidebar(&mut self) {
        let show = !self.session.show_list();
        self.session.set_show_list(show);
        if !show && self.focus == Focus::Sidebar {
            self.focus = Focus::Editor;
        }
        self.status = if show {
            "Notes list shown".into()
        } else {
            "Notes list hidden".into()
        };
    }

    fn quit(&mut self) -> Result<bool> {
        if let Some((width, height)) = self.last_size {
            self.session.set_geometry(width, height);
        }
        match self.session.shutdown(&self.editor.value) {
            Ok(()) => Ok(true),
            Err(err) => {
                self.status = format!("Could not quit: {}", err);
                Ok(false)
            }
        }
    }

    fn after_navigation(&mut self) {
        self.editor.set_value(self.session.text());
        self.sync_sidebar();
        self.last_save = Instant::now();
    }

    fn sync_sidebar(&mut self) {
        let len = self.session.listing().len();
        self.sidebar_idx = self
            .session
            .listing()
            .position(self.session.current_id())
            .unwrap_or_else(|| self.sidebar_idx.min(len.saturating_sub(1)));
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        self.last_size = Some((f.size().width, f.size().height));
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        if self.session.show_list() {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
                .split(layout[1]);
            self.draw_sidebar(f, body[0]);
            self.draw_editor(f, body[1]);
        } else {
            self.draw_editor(f, layout[1]);
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Rename(input) => self.draw_prompt(f, "Rename Note", "New name", input),
            Mode::ChooseDir(input) => self.draw_prompt(f, "Notes Folder", "Folder", input),
            Mode::ConfirmDelete => self.draw_confirm(f),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let mut spans = vec![
            Span::styled(
                "cloudnotes ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.session.current_id(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(self.session.index_label(), Style::default().fg(Color::Green)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.session.notes_dir().display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
        ];
        if self.session.is_dirty(&self.editor.value) {
            spans.push(Span::styled(
                "modified",
                Style::default().fg(Color::LightYellow),
            ));
        } else {
            spans.push(Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(Color::Gray),
            ));
        }

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_sidebar(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Focus::Sidebar;
        let current = self.session.current_id().to_string();
        let len = self.session.listing().len();
        self.sidebar_idx = self.sidebar_idx.min(len.saturating_sub(1));

        let items: Vec<ListItem<'static>> = if len == 0 {
            vec![ListItem::new("No notes yet")]
        } else {
            self.session
                .listing()
                .ids()
                .iter()
                .map(|id| {
                    let style = if *id == current {
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Gray)
                    };
                    ListItem::new(id.clone()).style(style)
                })
                .collect()
        };

        let mut state = ListState::default();
        let viewport = area.height.saturating_sub(2) as usize;
        let offset = adjust_offset(self.sidebar_idx, self.sidebar_offset, viewport, 1, len);
        self.sidebar_offset = offset;
        *state.offset_mut() = offset;
        if focused && len > 0 {
            state.select(Some(self.sidebar_idx));
        }

        let block = Block::default()
            .title(Span::styled(
                format!("Notes ({})", len),
                Style::default()
                    .fg(if focused { Color::Cyan } else { Color::Gray })
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused {
                Color::Cyan
            } else {
                Color::DarkGray
            }));
        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::LightCyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_editor(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Focus::Editor;
        let text = if focused {
            self.editor.with_caret()
        } else {
            self.editor.value.clone()
        };
        let (_, caret_line, _) = line_state(&self.editor.value, self.editor.cursor);
        let viewport = area.height.saturating_sub(2) as usize;
        let scroll = caret_line.saturating_sub(viewport.saturating_sub(1)) as u16;

        let title = format!(
            "{} [{}]",
            self.session.current_id(),
            self.session.index_label()
        );
        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default()
                    .fg(if focused { Color::Cyan } else { Color::Gray })
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused {
                Color::Cyan
            } else {
                Color::DarkGray
            }));
        let paragraph = Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0));
        f.render_widget(paragraph, area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("PgUp/PgDn", Style::default().fg(Color::LightCyan)),
            Span::raw(" prev/next  "),
            Span::styled("Tab", Style::default().fg(Color::LightCyan)),
            Span::raw(" focus  "),
        ];
        match self.focus {
            Focus::Editor => spans.extend([
                Span::styled("Ctrl+S", Style::default().fg(Color::LightGreen)),
                Span::raw(" save  "),
                Span::styled("Ctrl+N", Style::default().fg(Color::LightMagenta)),
                Span::raw(" new  "),
                Span::styled("Ctrl+R", Style::default().fg(Color::LightYellow)),
                Span::raw(" rename  "),
                Span::styled("Ctrl+D", Style::default().fg(Color::LightRed)),
                Span::raw(" delete  "),
                Span::styled("Ctrl+O", Style::default().fg(Color::LightCyan)),
                Span::raw(" folder  "),
                Span::styled("Ctrl+L", Style::default().fg(Color::LightCyan)),
                Span::raw(" list  "),
                Span::styled("Ctrl+Q", Style::default().fg(Color::LightRed)),
                Span::raw(" quit"),
            ]),
            Focus::Sidebar => spans.extend([
                Span::styled("↑↓ / j k", Style::default().fg(Color::LightCyan)),
                Span::raw(" browse  "),
                Span::styled("Enter", Style::default().fg(Color::LightYellow)),
                Span::raw(" open  "),
                Span::styled("n", Style::default().fg(Color::LightMagenta)),
                Span::raw(" new  "),
                Span::styled("r", Style::default().fg(Color::LightYellow)),
                Span::raw(" rename  "),
                Span::styled("d", Style::default().fg(Color::LightRed)),
                Span::raw(" delete  "),
                Span::styled("o", Style::default().fg(Color::LightCyan)),
                Span::raw(" folder  "),
                Span::styled("q", Style::default().fg(Color::LightRed)),
                Span::raw(" quit"),
            ]),
        }
        Line::from(spans)
    }

    fn draw_prompt(&self, f: &mut ratatui::Frame<'_>, title: &str, label: &str, input: &EditBuffer) {
        let area = centered_rect(60, 20, f.size());
        let mut lines = field_lines(label, input, true);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter to apply • Esc to cancel",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        title.to_string(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>) {
        let area = centered_rect(50, 30, f.size());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", self.session.current_id()),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn expand_home(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(dirs) = BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(input)
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn prev_grapheme(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_grapheme(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

fn line_state(text: &str, cursor: usize) -> (Vec<usize>, usize, usize) {
    let mut starts = vec![0];
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    let mut line_idx = 0;
    for (i, start) in starts.iter().enumerate() {
        if *start <= cursor {
            line_idx = i;
        } else {
            break;
        }
    }
    let col = text[start_of_line(line_idx, &starts)..cursor]
        .chars()
        .count();
    (starts, line_idx, col)
}

fn start_of_line(line_idx: usize, starts: &[usize]) -> usize {
    *starts.get(line_idx).unwrap_or(&0)
}

fn index_at_col(text: &str, start: usize, target_col: usize) -> usize {
    let slice = &text[start..];
    let limit = slice.find('\n').unwrap_or(slice.len());
    let mut col = 0;
    for (idx, _) in slice[..limit].char_indices() {
        if col == target_col {
            return start + idx;
        }
        col += 1;
    }
    start + limit
}

fn field_lines(label: &str, field: &EditBuffer, active: bool) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let prefix = format!("{}: ", label);
    let spacer = " ".repeat(prefix.chars().count());
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    let segments: Vec<&str> = if text.is_empty() {
        vec![""]
    } else {
        text.split('\n').collect()
    };
    segments
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let mut spans = Vec::new();
            spans.push(Span::styled(
                if idx == 0 {
                    prefix.clone()
                } else {
                    spacer.clone()
                },
                label_style,
            ));
            spans.push(Span::styled((*line).to_string(), value_style));
            Line::from(spans)
        })
        .collect()
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

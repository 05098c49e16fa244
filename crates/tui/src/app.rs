use std::{
    cmp,
    collections::VecDeque,
    io,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use rmmvz_core::{
    BuildStatus, ChannelPrompter, DialogRequest, ImportStatus, Launcher, LauncherCommand,
    LauncherEvent, ProjectState, RetryChoice, StartChoice, SystemToolchain,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 512;
const MAX_LOG_LINES: usize = 500;
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const MENU_ITEMS: [&str; 3] = ["New Project", "Open Project", "Quit"];

/// Launcher wired to real processes and this terminal's dialogs.
pub type AppLauncher = Launcher<SystemToolchain, ChannelPrompter>;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    success: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            success: Color::Green,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Start,
    Projects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Info,
    Output,
    Success,
    Error,
}

#[derive(Debug, Clone)]
struct LogLine {
    at: DateTime<Local>,
    kind: LineKind,
    text: String,
}

fn push_lines(log: &mut VecDeque<LogLine>, kind: LineKind, text: &str) {
    let at = Local::now();
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        log.push_back(LogLine {
            at,
            kind,
            text: line.trim_end().to_string(),
        });
    }
    while log.len() > MAX_LOG_LINES {
        log.pop_front();
    }
}

struct ProjectTab {
    state: ProjectState,
    log: VecDeque<LogLine>,
    busy: bool,
}

impl ProjectTab {
    fn new(state: ProjectState) -> Self {
        let mut tab = Self {
            state,
            log: VecDeque::new(),
            busy: false,
        };
        let opened = format!("Opened {}", tab.state.project_root.display());
        push_lines(&mut tab.log, LineKind::Info, &opened);
        tab
    }
}

/// Single-line text field with a character cursor.
#[derive(Debug, Clone, Default)]
struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn insert(&mut self, ch: char) {
        if ch.is_control() || self.len() >= MAX_INPUT_LEN {
            return;
        }
        let idx = self.byte_index();
        self.value.insert(idx, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index();
            self.value.remove(idx);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.len() {
            let idx = self.byte_index();
            self.value.remove(idx);
        }
    }

    fn edit(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.insert(ch)
            }
            _ => {}
        }
    }
}

enum PathTarget {
    Directory(oneshot::Sender<Option<PathBuf>>),
    SaveFile {
        default_name: String,
        reply: oneshot::Sender<Option<PathBuf>>,
    },
}

impl PathTarget {
    fn resolve(&self, raw: &str) -> std::result::Result<PathBuf, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("Enter a path".to_string());
        }
        let path = expand_home(raw);
        match self {
            Self::Directory(_) => {
                if path.is_dir() {
                    Ok(path)
                } else {
                    Err(format!("{} is not a directory", path.display()))
                }
            }
            Self::SaveFile { default_name, .. } => {
                let path = if path.is_dir() {
                    path.join(default_name)
                } else {
                    path
                };
                match path.parent() {
                    Some(parent) if parent.as_os_str().is_empty() || parent.is_dir() => Ok(path),
                    _ => Err(format!("Folder for {} does not exist", path.display())),
                }
            }
        }
    }

    fn finish(self, answer: Option<PathBuf>) {
        match self {
            Self::Directory(reply) | Self::SaveFile { reply, .. } => {
                let _ = reply.send(answer);
            }
        }
    }
}

enum Modal {
    ProjectName {
        input: TextInput,
    },
    PickPath {
        title: String,
        input: TextInput,
        target: PathTarget,
        error: Option<String>,
    },
    Retry {
        title: String,
        message: String,
        select_again: bool,
        reply: oneshot::Sender<RetryChoice>,
    },
    Message {
        title: String,
        lines: Vec<String>,
        is_error: bool,
        reply: oneshot::Sender<()>,
    },
}

enum AppEvent {
    Input(Event),
    Tick,
    WorkflowFinished { project_root: Option<PathBuf> },
}

/// Terminal front end: renders launcher events and answers its dialogs.
pub struct LauncherApp {
    launcher: AppLauncher,
    events_rx: Option<mpsc::Receiver<LauncherEvent>>,
    dialogs_rx: Option<mpsc::Receiver<DialogRequest>>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    screen: Screen,
    menu_cursor: usize,
    projects: Vec<ProjectTab>,
    active_tab: usize,
    activity: VecDeque<LogLine>,
    modal: Option<Modal>,
    pending_dialogs: VecDeque<DialogRequest>,
    last_dir: PathBuf,
    status: String,
    spinner: usize,
    should_quit: bool,
    theme: Theme,
}

impl LauncherApp {
    pub fn new(
        launcher: AppLauncher,
        events_rx: mpsc::Receiver<LauncherEvent>,
        dialogs_rx: mpsc::Receiver<DialogRequest>,
    ) -> Self {
        let last_dir = dirs::home_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            launcher,
            events_rx: Some(events_rx),
            dialogs_rx: Some(dialogs_rx),
            event_tx: None,
            screen: Screen::Start,
            menu_cursor: 0,
            projects: Vec::new(),
            active_tab: 0,
            activity: VecDeque::new(),
            modal: None,
            pending_dialogs: VecDeque::new(),
            last_dir,
            status: "Ready".to_string(),
            spinner: 0,
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut events_rx = self
            .events_rx
            .take()
            .context("launcher event receiver already consumed")?;
        let mut dialogs_rx = self
            .dialogs_rx
            .take()
            .context("dialog receiver already consumed")?;

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);
        self.launcher.start().await;

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            tokio::select! {
                maybe_event = event_rx.recv() => {
                    if !self.process_app_event(maybe_event) {
                        break;
                    }
                }
                Some(event) = events_rx.recv() => self.handle_launcher_event(event),
                Some(request) = dialogs_rx.recv() => self.handle_dialog_request(request),
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                self.handle_key(key);
                true
            }
            Some(AppEvent::Input(_)) => true,
            Some(AppEvent::Tick) => {
                self.spinner = self.spinner.wrapping_add(1);
                true
            }
            Some(AppEvent::WorkflowFinished { project_root }) => {
                if let Some(root) = project_root {
                    if let Some(tab) = self.tab_by_root_mut(&root) {
                        tab.busy = false;
                    }
                }
                true
            }
            None => false,
        }
    }

    fn handle_launcher_event(&mut self, event: LauncherEvent) {
        debug!(?event, "launcher event");
        match event {
            LauncherEvent::ShowStartDialog => {
                self.screen = Screen::Start;
                self.set_status("Create a new project or open an existing one");
            }
            LauncherEvent::Progress { message } => {
                push_lines(&mut self.activity, LineKind::Info, &message);
                self.set_status(message);
            }
            LauncherEvent::OpenProject(state) => self.open_tab(state),
            LauncherEvent::ImportStatus {
                project_name,
                status,
                message,
            } => {
                let kind = match status {
                    ImportStatus::Success => LineKind::Success,
                    ImportStatus::Error => LineKind::Error,
                };
                self.log_for(&project_name, kind, &message);
                self.set_status(message);
            }
            LauncherEvent::BuildStatus {
                project_name,
                status,
                message,
            } => {
                let kind = match status {
                    BuildStatus::Progress => LineKind::Output,
                    BuildStatus::Success => LineKind::Success,
                    BuildStatus::Error => LineKind::Error,
                };
                self.log_for(&project_name, kind, &message);
                if status == BuildStatus::Success {
                    self.set_status(message);
                }
            }
        }
    }

    fn handle_dialog_request(&mut self, request: DialogRequest) {
        if self.modal.is_some() {
            self.pending_dialogs.push_back(request);
            return;
        }
        let modal = match request {
            DialogRequest::PickDirectory { title, reply } => Modal::PickPath {
                title,
                input: TextInput::with_value(dir_prefill(&self.last_dir)),
                target: PathTarget::Directory(reply),
                error: None,
            },
            DialogRequest::PickSavePath {
                title,
                default_name,
                reply,
            } => Modal::PickPath {
                title,
                input: TextInput::with_value(self.last_dir.join(&default_name).display().to_string()),
                target: PathTarget::SaveFile {
                    default_name,
                    reply,
                },
                error: None,
            },
            DialogRequest::AskRetry {
                title,
                message,
                reply,
            } => Modal::Retry {
                title,
                message,
                select_again: true,
                reply,
            },
            DialogRequest::ShowError {
                title,
                message,
                reply,
            } => {
                push_lines(&mut self.activity, LineKind::Error, &message);
                Modal::Message {
                    title,
                    lines: message.lines().map(str::to_string).collect(),
                    is_error: true,
                    reply,
                }
            }
            DialogRequest::ShowInfo {
                title,
                message,
                detail,
                reply,
            } => {
                push_lines(&mut self.activity, LineKind::Success, &message);
                Modal::Message {
                    title,
                    lines: vec![message, String::new(), detail],
                    is_error: false,
                    reply,
                }
            }
        };
        self.modal = Some(modal);
    }

    fn close_modal(&mut self) {
        self.modal = None;
        if let Some(next) = self.pending_dialogs.pop_front() {
            self.handle_dialog_request(next);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if let Some(modal) = self.modal.take() {
            match self.handle_modal_key(modal, key) {
                Some(modal) => self.modal = Some(modal),
                None => self.close_modal(),
            }
            return;
        }
        match self.screen {
            Screen::Start => self.handle_start_key(key),
            Screen::Projects => self.handle_projects_key(key),
        }
    }

    fn handle_modal_key(&mut self, modal: Modal, key: KeyEvent) -> Option<Modal> {
        match modal {
            Modal::ProjectName { mut input } => match key.code {
                KeyCode::Esc => {
                    self.set_status("New project cancelled");
                    None
                }
                KeyCode::Enter => {
                    let project_name = input.value.trim().to_string();
                    self.spawn_workflow(
                        LauncherCommand::StartChoice(StartChoice::New {
                            project_name: Some(project_name),
                        }),
                        None,
                    );
                    None
                }
                _ => {
                    input.edit(key);
                    Some(Modal::ProjectName { input })
                }
            },
            Modal::PickPath {
                title,
                mut input,
                target,
                error,
            } => match key.code {
                KeyCode::Esc => {
                    target.finish(None);
                    None
                }
                KeyCode::Enter => match target.resolve(&input.value) {
                    Ok(path) => {
                        self.remember_dir(&path);
                        target.finish(Some(path));
                        None
                    }
                    Err(reason) => Some(Modal::PickPath {
                        title,
                        input,
                        target,
                        error: Some(reason),
                    }),
                },
                _ => {
                    input.edit(key);
                    let error = if key.code == KeyCode::Tab { error } else { None };
                    Some(Modal::PickPath {
                        title,
                        input,
                        target,
                        error,
                    })
                }
            },
            Modal::Retry {
                title,
                message,
                select_again,
                reply,
            } => match key.code {
                KeyCode::Left
                | KeyCode::Right
                | KeyCode::Tab
                | KeyCode::Char('h')
                | KeyCode::Char('l') => Some(Modal::Retry {
                    title,
                    message,
                    select_again: !select_again,
                    reply,
                }),
                KeyCode::Enter => {
                    let choice = if select_again {
                        RetryChoice::SelectAgain
                    } else {
                        RetryChoice::Cancel
                    };
                    let _ = reply.send(choice);
                    None
                }
                KeyCode::Esc => {
                    let _ = reply.send(RetryChoice::Cancel);
                    None
                }
                _ => Some(Modal::Retry {
                    title,
                    message,
                    select_again,
                    reply,
                }),
            },
            Modal::Message { reply, .. }
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) =>
            {
                let _ = reply.send(());
                None
            }
            other => Some(other),
        }
    }

    fn handle_start_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.projects.is_empty() {
                    self.should_quit = true;
                } else {
                    self.screen = Screen::Projects;
                }
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.menu_cursor = (self.menu_cursor + 1) % MENU_ITEMS.len();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.menu_cursor = (self.menu_cursor + MENU_ITEMS.len() - 1) % MENU_ITEMS.len();
            }
            KeyCode::Char('n') => self.prompt_new_project(),
            KeyCode::Char('o') => self.open_existing(),
            KeyCode::Enter => match self.menu_cursor {
                0 => self.prompt_new_project(),
                1 => self.open_existing(),
                _ => self.should_quit = true,
            },
            _ => {}
        }
    }

    fn handle_projects_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Esc => self.screen = Screen::Start,
            KeyCode::Char('n') => self.prompt_new_project(),
            KeyCode::Char('o') => self.open_existing(),
            KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') => self.cycle_tab(1),
            KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') => self.cycle_tab(-1),
            KeyCode::Char('i') => self.import_into_active(),
            KeyCode::Char('b') => self.build_active(),
            KeyCode::Char('w') => self.close_active_tab(),
            _ => {}
        }
    }

    fn prompt_new_project(&mut self) {
        self.modal = Some(Modal::ProjectName {
            input: TextInput::default(),
        });
        self.set_status("Enter a name for the new project");
    }

    fn open_existing(&mut self) {
        self.spawn_workflow(LauncherCommand::StartChoice(StartChoice::Edit), None);
    }

    fn import_into_active(&mut self) {
        self.run_on_active(|state| LauncherCommand::ImportGame {
            project_name: state.project_name.clone(),
            project_root: state.project_root.clone(),
        });
    }

    fn build_active(&mut self) {
        self.run_on_active(|state| LauncherCommand::BuildInstaller {
            project_name: state.project_name.clone(),
            project_root: state.project_root.clone(),
            game_folder_name: state.game_folder_name.clone(),
        });
    }

    // Status events only carry the project name, so at most one busy tab may
    // own a given name at a time.
    fn run_on_active(&mut self, command: impl FnOnce(&ProjectState) -> LauncherCommand) {
        let Some(tab) = self.projects.get(self.active_tab) else {
            self.set_status("No project open");
            return;
        };
        if tab.busy {
            self.set_status("Wait for the running operation to finish");
            return;
        }
        let name_in_use = self.projects.iter().any(|other| {
            other.busy
                && other.state.project_name == tab.state.project_name
                && other.state.project_root != tab.state.project_root
        });
        if name_in_use {
            let message = format!(
                "Another project named \"{}\" is busy; wait for it to finish",
                tab.state.project_name
            );
            self.set_status(message);
            return;
        }
        let command = command(&tab.state);
        let root = tab.state.project_root.clone();
        self.spawn_workflow(command, Some(root));
    }

    fn close_active_tab(&mut self) {
        if self.active_tab >= self.projects.len() {
            return;
        }
        if self.projects[self.active_tab].busy {
            self.set_status("Wait for the running operation to finish");
            return;
        }
        let closed = self.projects.remove(self.active_tab);
        self.set_status(format!("Closed {}", closed.state.project_name));
        if self.projects.is_empty() {
            self.active_tab = 0;
            self.screen = Screen::Start;
        } else {
            self.active_tab = self.active_tab.min(self.projects.len() - 1);
        }
    }

    fn cycle_tab(&mut self, delta: isize) {
        let len = self.projects.len() as isize;
        if len == 0 {
            return;
        }
        self.active_tab = (self.active_tab as isize + delta).rem_euclid(len) as usize;
    }

    fn spawn_workflow(&mut self, command: LauncherCommand, project_root: Option<PathBuf>) {
        let Some(app_tx) = self.event_tx.clone() else {
            return;
        };
        if let Some(root) = &project_root {
            if let Some(tab) = self.tab_by_root_mut(root) {
                tab.busy = true;
            }
        }
        info!(?command, "starting workflow");
        let launcher = self.launcher.clone();
        tokio::spawn(async move {
            launcher.handle(command).await;
            let _ = app_tx
                .send(AppEvent::WorkflowFinished { project_root })
                .await;
        });
    }

    fn open_tab(&mut self, state: ProjectState) {
        let label = format!("Opened {}", state.project_name);
        match self
            .projects
            .iter()
            .position(|tab| tab.state.project_root == state.project_root)
        {
            Some(idx) => {
                let tab = &mut self.projects[idx];
                tab.state = state;
                push_lines(&mut tab.log, LineKind::Info, "Project refreshed");
                self.active_tab = idx;
            }
            None => {
                self.projects.push(ProjectTab::new(state));
                self.active_tab = self.projects.len() - 1;
            }
        }
        push_lines(&mut self.activity, LineKind::Success, &label);
        self.screen = Screen::Projects;
        self.set_status(label);
    }

    fn log_for(&mut self, project_name: &str, kind: LineKind, message: &str) {
        match route_tab(&self.projects, project_name) {
            Some(idx) => push_lines(&mut self.projects[idx].log, kind, message),
            None => push_lines(&mut self.activity, kind, message),
        }
    }

    fn tab_by_root_mut(&mut self, root: &Path) -> Option<&mut ProjectTab> {
        self.projects
            .iter_mut()
            .find(|tab| tab.state.project_root == root)
    }

    fn remember_dir(&mut self, path: &Path) {
        let dir = if path.is_dir() {
            Some(path)
        } else {
            path.parent()
        };
        if let Some(dir) = dir.filter(|dir| dir.is_dir()) {
            self.last_dir = dir.to_path_buf();
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    fn draw(&self, frame: &mut Frame) {
        match self.screen {
            Screen::Start => self.draw_start(frame),
            Screen::Projects => self.draw_projects(frame),
        }
        if let Some(modal) = &self.modal {
            self.render_modal(frame, modal);
        }
    }

    fn draw_start(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(MENU_ITEMS.len() as u16 + 2),
                Constraint::Min(3),
                Constraint::Length(4),
            ])
            .split(area);

        let banner = Paragraph::new(Line::from(Span::styled(
            "RMMVZ Launcher",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(banner, layout[0]);

        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();
        let menu_area = centered_rect(30, layout[1].height, layout[1]);
        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Start"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);

        self.render_log(frame, layout[2], "Activity", &self.activity);
        self.render_status(frame, layout[3], "n new  o open  ↑/↓ select  Enter choose  q quit");
    }

    fn draw_projects(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(area);

        let titles: Vec<Line> = self
            .projects
            .iter()
            .map(|tab| {
                let marker = if tab.busy {
                    SPINNER[self.spinner % SPINNER.len()]
                } else {
                    " "
                };
                Line::from(format!("{marker} {}", tab.state.project_name))
            })
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Projects"))
            .select(self.active_tab)
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
            .split(layout[1]);

        if let Some(tab) = self.projects.get(self.active_tab) {
            self.render_project_info(frame, body[0], tab);
            self.render_log(frame, body[1], "Output", &tab.log);
        }
        self.render_status(
            frame,
            layout[2],
            "i import game  b build installer  n new  o open  ←/→ switch  w close  Esc menu  q quit",
        );
    }

    fn render_project_info(&self, frame: &mut Frame, area: Rect, tab: &ProjectTab) {
        let label = Style::default().fg(self.theme.muted);
        let game = match &tab.state.game_folder_name {
            Some(name) => Span::styled(name.clone(), Style::default().fg(self.theme.success)),
            None => Span::styled(
                "none (press i to import)",
                Style::default().fg(self.theme.danger),
            ),
        };
        let state = if tab.busy {
            Span::styled(
                format!("working {}", SPINNER[self.spinner % SPINNER.len()]),
                Style::default().fg(self.theme.accent),
            )
        } else {
            Span::raw("idle")
        };
        let lines = vec![
            Line::from(vec![
                Span::styled("Name   ", label),
                Span::styled(
                    tab.state.project_name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Root   ", label),
                Span::raw(tab.state.project_root.display().to_string()),
            ]),
            Line::from(vec![Span::styled("Game   ", label), game]),
            Line::from(vec![Span::styled("State  ", label), state]),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Project"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_log(&self, frame: &mut Frame, area: Rect, title: &str, log: &VecDeque<LogLine>) {
        let visible = area.height.saturating_sub(2) as usize;
        let skip = log.len().saturating_sub(visible);
        let items: Vec<ListItem> = log
            .iter()
            .skip(skip)
            .map(|line| {
                let color = match line.kind {
                    LineKind::Info => self.theme.primary_fg,
                    LineKind::Output => self.theme.muted,
                    LineKind::Success => self.theme.success,
                    LineKind::Error => self.theme.danger,
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} ", line.at.format("%H:%M:%S")),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::styled(line.text.clone(), Style::default().fg(color)),
                ]))
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string()),
        );
        frame.render_widget(list, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, help: &str) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let paragraph = Paragraph::new(vec![
            Line::from(self.status.clone()),
            Line::from(Span::styled(
                help.to_string(),
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_modal(&self, frame: &mut Frame, modal: &Modal) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(72_u16, frame_area.width.saturating_sub(4)), 24_u16);
        let accent = Style::default().fg(self.theme.accent);
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let (title, lines, border, cursor) = match modal {
            Modal::ProjectName { input } => (
                "New Project".to_string(),
                vec![
                    Line::from("Project name"),
                    Line::from(vec![Span::styled("> ", accent), Span::raw(input.value.clone())]),
                    Line::from(""),
                    Line::from(vec![
                        Span::styled("Enter", bold),
                        Span::raw(" choose folder  "),
                        Span::styled("Esc", bold),
                        Span::raw(" cancel"),
                    ]),
                ],
                accent,
                Some((1_u16, input.cursor as u16)),
            ),
            Modal::PickPath {
                title,
                input,
                target,
                error,
            } => {
                let hint = match target {
                    PathTarget::Directory(_) => "Type a folder path",
                    PathTarget::SaveFile { .. } => "Type the file to save",
                };
                let mut lines = vec![
                    Line::from(hint),
                    Line::from(vec![Span::styled("> ", accent), Span::raw(input.value.clone())]),
                ];
                match error {
                    Some(error) => lines.push(Line::from(Span::styled(
                        error.clone(),
                        Style::default().fg(self.theme.danger),
                    ))),
                    None => lines.push(Line::from("")),
                }
                lines.push(Line::from(vec![
                    Span::styled("Enter", bold),
                    Span::raw(" confirm  "),
                    Span::styled("Esc", bold),
                    Span::raw(" cancel"),
                ]));
                (title.clone(), lines, accent, Some((1, input.cursor as u16)))
            }
            Modal::Retry {
                title,
                message,
                select_again,
                ..
            } => {
                let button = |label: &'static str, selected: bool| {
                    if selected {
                        Span::styled(format!("[ {label} ]"), accent.add_modifier(Modifier::BOLD))
                    } else {
                        Span::raw(format!("  {label}  "))
                    }
                };
                (
                    title.clone(),
                    vec![
                        Line::from(message.clone()),
                        Line::from(""),
                        Line::from(vec![
                            button("Select Again", *select_again),
                            Span::raw("  "),
                            button("Cancel", !*select_again),
                        ]),
                    ],
                    Style::default().fg(self.theme.danger),
                    None,
                )
            }
            Modal::Message {
                title,
                lines,
                is_error,
                ..
            } => {
                let color = if *is_error {
                    self.theme.danger
                } else {
                    self.theme.success
                };
                let mut content: Vec<Line> =
                    lines.iter().map(|line| Line::from(line.clone())).collect();
                content.push(Line::from(""));
                content.push(Line::from(vec![
                    Span::styled("Enter", bold),
                    Span::raw(" dismiss"),
                ]));
                (title.clone(), content, Style::default().fg(color), None)
            }
        };

        let inner_width = width.saturating_sub(2).max(1) as usize;
        let wrapped_rows: usize = lines
            .iter()
            .map(|line| cmp::max(1, line.width().div_ceil(inner_width)))
            .sum();
        let height = (wrapped_rows as u16 + 2).min(frame_area.height.saturating_sub(2));
        let area = centered_rect(width, height, frame_area);

        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(title),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);

        if let Some((row, column)) = cursor {
            let cursor_x = (area.x + 3 + column).min(area.x + area.width.saturating_sub(2));
            frame.set_cursor(cursor_x, area.y + 1 + row);
        }
    }
}

/// Tab that should receive a status event for `project_name`: the busy tab
/// with that name, else the first tab with that name.
fn route_tab(projects: &[ProjectTab], project_name: &str) -> Option<usize> {
    let mut named = projects
        .iter()
        .enumerate()
        .filter(|(_, tab)| tab.state.project_name == project_name);
    let first = named.clone().next().map(|(idx, _)| idx);
    named.find(|(_, tab)| tab.busy).map(|(idx, _)| idx).or(first)
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn dir_prefill(dir: &Path) -> String {
    let mut value = dir.display().to_string();
    if !value.ends_with(std::path::MAIN_SEPARATOR) {
        value.push(std::path::MAIN_SEPARATOR);
    }
    value
}

/// Expands a leading `~` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    if let Some(rest) = path.strip_prefix("~/") {
        home().join(rest)
    } else if path == "~" {
        home()
    } else {
        PathBuf::from(path)
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn text_input_edits_at_cursor() {
        let mut input = TextInput::with_value("Gme");
        input.move_cursor(-2);
        input.edit(key(KeyCode::Char('a')));
        assert_eq!(input.value, "Game");
        input.edit(key(KeyCode::End));
        input.edit(key(KeyCode::Backspace));
        assert_eq!(input.value, "Gam");
        input.edit(key(KeyCode::Home));
        input.edit(key(KeyCode::Delete));
        assert_eq!(input.value, "am");
    }

    #[test]
    fn text_input_handles_multibyte_characters() {
        let mut input = TextInput::with_value("ゲーム");
        input.edit(key(KeyCode::Left));
        input.edit(key(KeyCode::Backspace));
        assert_eq!(input.value, "ゲム");
        assert_eq!(input.cursor, 1);
    }

    #[test]
    fn directory_target_requires_existing_folder() {
        let temp = tempfile::tempdir().unwrap();
        let (reply, _rx) = oneshot::channel();
        let target = PathTarget::Directory(reply);

        assert_eq!(
            target.resolve(&temp.path().display().to_string()),
            Ok(temp.path().to_path_buf())
        );
        assert!(target
            .resolve(&temp.path().join("missing").display().to_string())
            .is_err());
        assert!(target.resolve("   ").is_err());
    }

    #[test]
    fn save_target_appends_default_name_to_folders() {
        let temp = tempfile::tempdir().unwrap();
        let (reply, _rx) = oneshot::channel();
        let target = PathTarget::SaveFile {
            default_name: "MyGame-installer.exe".to_string(),
            reply,
        };

        assert_eq!(
            target.resolve(&temp.path().display().to_string()),
            Ok(temp.path().join("MyGame-installer.exe"))
        );
        assert!(target
            .resolve(&temp.path().join("nope").join("x.exe").display().to_string())
            .is_err());
    }

    #[test]
    fn status_events_go_to_the_busy_tab_with_that_name() {
        let tab = |root: &str, busy: bool| {
            let mut tab = ProjectTab::new(ProjectState::new("Quest", root, None));
            tab.busy = busy;
            tab
        };

        let projects = vec![tab("/games/a", false), tab("/games/b", true)];
        assert_eq!(route_tab(&projects, "Quest"), Some(1));

        let projects = vec![tab("/games/a", false), tab("/games/b", false)];
        assert_eq!(route_tab(&projects, "Quest"), Some(0));
        assert_eq!(route_tab(&projects, "Other"), None);
    }

    #[test]
    fn tilde_expands_to_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert!(!expand_home("~/Games").to_string_lossy().starts_with('~'));
    }
}

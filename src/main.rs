mod ui;

use clap::{builder::NonEmptyStringValueParser, error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::PathBuf,
};
use tracing::{info, warn};
use typeflow::{
    app_dirs::AppDirs,
    catalog::Catalog,
    clock::{Clock, MonotonicClock},
    config::{Config, ConfigStore, FileConfigStore},
    history::{HistoryDb, SessionSummary},
    logging::init_file_logging,
    rating::format_clock,
    runtime::{edit_input, CrosstermEventSource, FixedTicker, PracticeEvent, Runner},
    session::{SessionConfig, SessionPhase, TypingSession},
    time_series::WpmSeries,
};

/// Category recorded for sessions on a custom `--prompt`
const CUSTOM_CATEGORY: &str = "custom";
/// Rows loaded for the history screen and `--history`
const HISTORY_LIMIT: usize = 100;

/// typing and coding practice with live wpm, accuracy and flow
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Typing and coding practice in the terminal. Live speed, accuracy and typing flow while you type, a chart of your run when you finish, and a local history of past sessions."
)]
pub struct Cli {
    /// practice category from the built-in catalog
    #[clap(short = 'c', long, conflicts_with = "prompt")]
    category: Option<String>,

    /// item within the category (defaults to its first item)
    #[clap(short = 'i', long, conflicts_with = "prompt")]
    item: Option<String>,

    /// custom text to type instead of a catalog item
    #[clap(short = 'p', long, value_parser = NonEmptyStringValueParser::new())]
    prompt: Option<String>,

    /// stop the session after this many seconds (0 removes the limit)
    #[clap(short = 't', long)]
    time_limit: Option<u64>,

    /// track typing rhythm and show a flow score
    #[clap(long, conflicts_with = "no_flow")]
    flow: bool,

    /// do not compute a flow score
    #[clap(long)]
    no_flow: bool,

    /// do not record this run in the history database
    #[clap(long)]
    no_history: bool,

    /// list catalog categories and items, then exit
    #[clap(long)]
    list: bool,

    /// print recent sessions, then exit
    #[clap(long)]
    history: bool,

    /// write the full session history as CSV to PATH, then exit
    #[clap(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,
}

impl Cli {
    /// Overlay command line choices on saved preferences
    fn apply_to(&self, config: &mut Config) {
        if let Some(category) = &self.category {
            if *category != config.category {
                config.item = None;
            }
            config.category = category.clone();
        }
        if let Some(item) = &self.item {
            config.item = Some(item.clone());
        }
        if let Some(secs) = self.time_limit {
            config.time_limit_secs = (secs > 0).then_some(secs);
        }
        if self.flow {
            config.track_flow = true;
        }
        if self.no_flow {
            config.track_flow = false;
        }
    }
}

/// Where the current target text came from
#[derive(Debug, Clone, PartialEq)]
pub enum PromptSource {
    Catalog {
        category: String,
        item: String,
        title: String,
    },
    Custom,
}

impl PromptSource {
    pub fn label(&self) -> String {
        match self {
            PromptSource::Catalog {
                category, title, ..
            } => format!("{category} · {title}"),
            PromptSource::Custom => "custom prompt".to_string(),
        }
    }

    /// Key the session is recorded under in the history database
    fn history_key(&self) -> (&str, &str) {
        match self {
            PromptSource::Catalog { category, item, .. } => (category.as_str(), item.as_str()),
            PromptSource::Custom => (CUSTOM_CATEGORY, "prompt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Typing,
    Results,
    History,
}

#[derive(Debug, Default)]
pub struct HistoryViewState {
    pub scroll_offset: usize,
}

#[derive(Debug, PartialEq)]
enum ExitType {
    Restart,
    New,
    Quit,
}

pub struct App {
    pub config: Config,
    pub catalog: Catalog,
    pub source: PromptSource,
    pub session: TypingSession,
    pub state: AppState,
    pub samples: WpmSeries,
    pub history: Option<HistoryDb>,
    pub last_summary: Option<SessionSummary>,
    /// Best run on the same text before the one just finished
    pub previous_best: Option<SessionSummary>,
    pub recent: Vec<SessionSummary>,
    pub history_view: HistoryViewState,
    clock: Box<dyn Clock>,
}

impl App {
    pub fn new(
        config: Config,
        catalog: Catalog,
        custom_prompt: Option<String>,
        history: Option<HistoryDb>,
        clock: Box<dyn Clock>,
    ) -> typeflow::Result<Self> {
        let (source, target) = match custom_prompt {
            Some(text) => (PromptSource::Custom, text),
            None => {
                let entry = match &config.item {
                    Some(item) => catalog.lookup(&config.category, item)?,
                    None => catalog.first_in(&config.category)?,
                };
                (
                    PromptSource::Catalog {
                        category: config.category.clone(),
                        item: entry.id.clone(),
                        title: entry.title.clone(),
                    },
                    entry.text.clone(),
                )
            }
        };
        let session = TypingSession::new(target, SessionConfig::from(&config));

        Ok(Self {
            config,
            catalog,
            source,
            session,
            state: AppState::Typing,
            samples: WpmSeries::new(),
            history,
            last_summary: None,
            previous_best: None,
            recent: Vec::new(),
            history_view: HistoryViewState::default(),
            clock,
        })
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<ExitType> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Some(ExitType::Quit);
        }

        match self.state {
            AppState::Typing => match key.code {
                KeyCode::Left => Some(ExitType::Restart),
                KeyCode::Right => Some(ExitType::New),
                _ => {
                    let mut text = self.session.input().to_string();
                    if edit_input(&mut text, &key) {
                        self.on_input(&text);
                    }
                    None
                }
            },
            AppState::Results => match key.code {
                KeyCode::Char('r') | KeyCode::Left => Some(ExitType::Restart),
                KeyCode::Char('n') | KeyCode::Right => Some(ExitType::New),
                KeyCode::Char('h') => {
                    self.show_history();
                    None
                }
                _ => None,
            },
            AppState::History => {
                let view = &mut self.history_view;
                match key.code {
                    KeyCode::Char('r') => return Some(ExitType::Restart),
                    KeyCode::Char('n') => return Some(ExitType::New),
                    KeyCode::Char('b') | KeyCode::Backspace => self.state = AppState::Results,
                    KeyCode::Up => view.scroll_offset = view.scroll_offset.saturating_sub(1),
                    // clamped against the table height while rendering
                    KeyCode::Down => view.scroll_offset += 1,
                    KeyCode::PageUp => view.scroll_offset = view.scroll_offset.saturating_sub(10),
                    KeyCode::PageDown => view.scroll_offset += 10,
                    KeyCode::Home => view.scroll_offset = 0,
                    _ => {}
                }
                None
            }
        }
    }

    fn on_input(&mut self, text: &str) {
        let now = self.now();
        self.session.on_input_change(text, now);
        self.after_update(now);
    }

    fn on_tick(&mut self) {
        if self.session.phase() != SessionPhase::Active {
            return;
        }
        let now = self.now();
        self.session.on_tick(now);
        self.after_update(now);
    }

    fn after_update(&mut self, now: u64) {
        match self.session.phase() {
            SessionPhase::NotStarted => {}
            SessionPhase::Active => {
                self.samples
                    .sample(self.session.elapsed_ms(now), self.session.metrics().wpm);
            }
            SessionPhase::Completed => {
                self.samples
                    .sample(self.session.elapsed_ms(now), self.session.metrics().wpm);
                self.finish();
            }
        }
    }

    fn finish(&mut self) {
        let (category, item) = self.source.history_key();
        let Some(summary) = self.session.summary(category, item) else {
            return;
        };

        if let Some(db) = &self.history {
            self.previous_best = match db.personal_best(category, item) {
                Ok(best) => best,
                Err(err) => {
                    warn!(%err, "could not read personal best");
                    None
                }
            };
            if self.config.save_history {
                if let Err(err) = db.record(&summary) {
                    warn!(%err, "could not record session");
                }
            }
        }

        self.last_summary = Some(summary);
        self.state = AppState::Results;
    }

    fn show_history(&mut self) {
        self.recent = match &self.history {
            Some(db) => db.recent(HISTORY_LIMIT).unwrap_or_else(|err| {
                warn!(%err, "could not load history");
                Vec::new()
            }),
            None => Vec::new(),
        };
        self.history_view = HistoryViewState::default();
        self.state = AppState::History;
    }

    /// Same text, fresh attempt
    fn restart(&mut self) {
        self.session.reset();
        self.clear_results();
    }

    /// Follow the catalog's `next` link, or pick another item at random
    fn next_prompt(&mut self) -> typeflow::Result<()> {
        let (category, item) = match &self.source {
            PromptSource::Catalog { category, item, .. } => (category.clone(), item.clone()),
            PromptSource::Custom => {
                self.restart();
                return Ok(());
            }
        };

        let entry = match self.catalog.next_after(&category, &item)? {
            Some(next) => next,
            None => self.catalog.random_in(&category)?,
        };
        info!(category = %category, item = %entry.id, "next prompt");

        self.source = PromptSource::Catalog {
            category,
            item: entry.id.clone(),
            title: entry.title.clone(),
        };
        self.session = TypingSession::new(entry.text.clone(), SessionConfig::from(&self.config));
        self.clear_results();
        Ok(())
    }

    fn clear_results(&mut self) {
        self.samples.clear();
        self.last_summary = None;
        self.previous_best = None;
        self.state = AppState::Typing;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(log_path) = AppDirs::log_path() {
        // tracing is not installed yet, so this is the only place to say so
        if let Err(err) = init_file_logging(&log_path) {
            eprintln!("typeflow: logging disabled: {err}");
        }
    }

    let catalog = Catalog::builtin()?;

    if cli.list {
        for category in catalog.categories() {
            println!("{} - {}", category.id, category.title);
            let items = category
                .entries
                .iter()
                .map(|e| format!("{} ({})", e.id, e.difficulty))
                .join(", ");
            println!("    {items}");
        }
        return Ok(());
    }

    if cli.history || cli.export_csv.is_some() {
        let db = HistoryDb::open_default()?;
        if let Some(path) = &cli.export_csv {
            let rows = db.export_csv(File::create(path)?)?;
            println!("exported {rows} sessions to {}", path.display());
        }
        if cli.history {
            for s in db.recent(HISTORY_LIMIT)? {
                println!(
                    "{}  {}/{}  {} wpm  {}% acc  flow {}  {}",
                    s.finished_at.format("%Y-%m-%d %H:%M"),
                    s.category,
                    s.item,
                    s.wpm,
                    s.accuracy,
                    s.flow.map_or_else(|| "-".to_string(), |f| f.to_string()),
                    format_clock(s.elapsed_ms / 1000),
                );
            }
        }
        return Ok(());
    }

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply_to(&mut config);

    if cli.prompt.is_none() {
        // reject an unknown category or item before touching the terminal
        let known = match &config.item {
            Some(item) => catalog.lookup(&config.category, item).map(|_| ()),
            None => catalog.category(&config.category).map(|_| ()),
        };
        if let Err(err) = known {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err.to_string()).exit();
        }
    }

    if let Err(err) = store.save(&config) {
        warn!(%err, "could not save preferences");
    }
    if cli.no_history {
        config.save_history = false;
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let history = match HistoryDb::open_default() {
        Ok(db) => Some(db),
        Err(err) => {
            warn!(%err, "history disabled");
            None
        }
    };

    let mut app = App::new(
        config,
        catalog,
        cli.prompt.clone(),
        history,
        Box::new(MonotonicClock::new()),
    )?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        let mut exit_type = ExitType::Quit;
        terminal.draw(|f| ui(app, f))?;

        loop {
            match runner.step() {
                PracticeEvent::Tick => {
                    if app.session.phase() == SessionPhase::Active {
                        app.on_tick();
                        terminal.draw(|f| ui(app, f))?;
                    }
                }
                PracticeEvent::Resize => {
                    terminal.draw(|f| ui(app, f))?;
                }
                PracticeEvent::Key(key) => {
                    if let Some(exit) = app.handle_key(key) {
                        exit_type = exit;
                        break;
                    }
                    terminal.draw(|f| ui(app, f))?;
                }
            }
        }

        match exit_type {
            ExitType::Restart => app.restart(),
            ExitType::New => app.next_prompt()?,
            ExitType::Quit => break,
        }
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    match app.state {
        AppState::Typing | AppState::Results => {
            f.render_widget(&*app, f.area());
        }
        AppState::History => {
            ui::history::render_history(app, f);
        }
    }
}

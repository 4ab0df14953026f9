use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tatsumakeeb::{
    config::{Config, ConfigStore, FileConfigStore, Theme},
    game::{Game, Key, KeyInput},
    runtime::{Action, ChannelEventSource, GameEvent, Runner},
    score::{FileScoreStore, ScoreStore},
    ui::GameView,
};

const TICK_RATE_MS: u64 = 100;

/// press and hold the keys you see, in order, before time runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A reflex game for your keyboard: press every key shown from left to right and keep holding them all. Levels get longer and the clock gets tighter; one slip sends you back to level 1."
)]
pub struct Cli {
    /// color theme to use (remembered for next time)
    #[clap(short = 't', long, value_enum)]
    theme: Option<Theme>,

    /// forget the stored best score before playing
    #[clap(long)]
    reset_best_score: bool,

    /// seed for sequence generation, for reproducible runs
    #[clap(long)]
    seed: Option<u64>,

    /// write logs to this file (filter with RUST_LOG, default info)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

pub struct App {
    pub game: Game,
    pub config: Config,
    pub release_events: bool,
    config_store: Box<dyn ConfigStore>,
}

impl App {
    pub fn new(
        cli: &Cli,
        score_store: Box<dyn ScoreStore>,
        config_store: Box<dyn ConfigStore>,
    ) -> io::Result<Self> {
        if cli.reset_best_score {
            score_store.save(0)?;
            log::info!("best score reset");
        }

        let mut config = config_store.load();
        if let Some(theme) = cli.theme {
            if theme != config.theme {
                config.theme = theme;
                config_store.save(&config)?;
            }
        }

        let game = match cli.seed {
            Some(seed) => Game::with_seed(score_store, seed),
            None => Game::new(score_store),
        };

        Ok(Self {
            game,
            config,
            release_events: true,
            config_store,
        })
    }

    /// Apply one key action seen at `at`. Returns false when the app should exit.
    pub fn apply(&mut self, action: Action, at: Instant) -> bool {
        match action {
            Action::Quit => return false,
            Action::Game(KeyInput::Down {
                key: Key::Named("Tab"),
                repeat: false,
            }) if !self.game.is_running() => self.toggle_theme(),
            Action::Game(input) => {
                let input = self.as_game_input(input);
                self.game.handle(input, at);
            }
        }
        true
    }

    fn toggle_theme(&mut self) {
        self.config.theme = self.config.theme.toggled();
        if let Err(e) = self.config_store.save(&self.config) {
            log::warn!("failed to save theme: {e}");
        }
    }

    /// Without release reporting, auto-repeat of a held key arrives as plain presses.
    /// Sequence characters are distinct, so a second press of a typed key is a repeat.
    fn as_game_input(&self, input: KeyInput) -> KeyInput {
        match input {
            KeyInput::Down {
                key: Key::Char(c),
                repeat: false,
            } if !self.release_events && self.game.input.contains(c) => KeyInput::Down {
                key: Key::Char(c),
                repeat: true,
            },
            other => other,
        }
    }
}

fn init_logging(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let score_store = FileScoreStore::new();
    log::debug!("best score kept in {}", score_store.path().display());
    let mut app = App::new(&cli, Box::new(score_store), Box::new(FileConfigStore::new()))?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Key releases only arrive with the kitty keyboard protocol
    app.release_events = supports_keyboard_enhancement().unwrap_or(false);
    if app.release_events {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
    } else {
        log::warn!("terminal lacks keyboard enhancement; key releases will not be detected");
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    if app.release_events {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        ChannelEventSource::crossterm(),
        Duration::from_millis(TICK_RATE_MS),
    );

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            GameEvent::Input { action, at } => {
                if !app.apply(action, at) {
                    break;
                }
            }
            GameEvent::Resize | GameEvent::Tick => {}
            GameEvent::Closed => {
                log::warn!("keyboard input closed, exiting");
                break;
            }
        }

        app.game.tick(Instant::now());
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    let snapshot = app.game.snapshot();
    let mut view = GameView::new(&snapshot, app.config.theme);
    view.release_events = app.release_events;
    f.render_widget(view, f.area());
}

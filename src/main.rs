use ghlv::app::{AppConfig, AppState, UpdateOutcome};
use ghlv::cli::{Cli, VERSION};
use ghlv::events::{AppEvent, EventHandler};
use ghlv::filter::FilterConfig;
use ghlv::gh::executor::{GhExecutor, LogSource};
use ghlv::gh::parser;
use ghlv::gh::poller::LogPoller;
use ghlv::input::{self, Action, InputContext};
use ghlv::logs::{Conclusion, RunLogs, RunStatus};
use ghlv::notify;
use ghlv::tui::render;
use ghlv::tui::theme::Theme;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

fn setup_verbose_logging() -> Result<()> {
    let state_dir = state_dir();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!("ghlv v{VERSION} starting with verbose logging");
    Ok(())
}

fn state_dir() -> std::path::PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        std::path::PathBuf::from(state).join("ghlv")
    } else if let Some(home) = std::env::var_os("HOME") {
        std::path::PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("ghlv")
    } else {
        std::path::PathBuf::from("/tmp/ghlv")
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => match payload.downcast::<&str>() {
            Ok(s) => s.to_string(),
            Err(_) => "unknown panic".to_string(),
        },
    }
}

fn spawn_monitored(
    tx: mpsc::UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
) {
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            let msg = if join_err.is_panic() {
                panic_message(join_err.into_panic())
            } else {
                "task cancelled".to_string()
            };
            tracing::error!("{label} panicked: {msg}");
            if tx
                .send(AppEvent::Error(format!("{label} crashed: {msg}")))
                .is_err()
            {
                tracing::warn!("{label}: channel closed while reporting panic");
            }
        }
    });
}

/// Shows the completion notification off the event loop; failures come back as
/// `AppEvent::Error`.
fn spawn_notification(
    tx: mpsc::UnboundedSender<AppEvent>,
    title: String,
    conclusion: Option<Conclusion>,
) {
    tokio::task::spawn_blocking(move || {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            notify::send_desktop(&title, conclusion)
        }));
        let msg = match result {
            Ok(None) => return,
            Ok(Some(err)) => err,
            Err(payload) => {
                let msg = panic_message(payload);
                tracing::error!("notify panicked: {msg}");
                format!("Notification crashed: {msg}")
            }
        };
        if tx.send(AppEvent::Error(msg)).is_err() {
            tracing::warn!("notify: channel closed");
        }
    });
}

/// Resolves the repo and loads run metadata before the terminal switches to raw mode,
/// so startup failures print as ordinary errors.
async fn load_run(args: &Cli) -> Result<(String, RunLogs, RunStatus)> {
    let gh = GhExecutor::new(String::new());
    gh.check_available().await?;
    let repo = match &args.repo {
        Some(r) => r.clone(),
        None => gh.detect_repo().await?,
    };

    let executor = GhExecutor::new(repo.clone());
    let meta = parser::parse_run_meta(&executor.fetch_run(args.run).await?)?;
    if let Some(job) = args.job {
        if !meta.jobs.is_empty() && !meta.jobs.iter().any(|j| j.database_id == job) {
            return Err(eyre!("Job {job} is not part of run {}", args.run));
        }
    }
    tracing::info!(run_id = args.run, %repo, status = ?meta.status, "loaded run metadata");
    Ok((
        repo,
        RunLogs::new(meta.title().to_string(), meta.head_branch),
        meta.status,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    if args.verbose {
        setup_verbose_logging()?;
    }

    let (repo, logs, startup_status) = match load_run(&args).await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let config = AppConfig {
        repo: repo.clone(),
        run_id: args.run,
        job_id: args.job,
        version_string: VERSION.to_string(),
    };
    let mut state = AppState::new(config, logs);
    state.auto_scroll = !args.no_follow;
    state.desktop_notify = !args.no_notify;
    state.set_startup_status(startup_status);
    let base_interval = args.interval.max(1);
    state.poll_interval = state.adaptive_poll_interval(base_interval);
    let initial_filter = FilterConfig {
        level: args.level.into(),
        search: args.search.clone().unwrap_or_default(),
        case_sensitive: args.case_sensitive,
        regex: args.regex,
        step: None,
    };
    if let Err(e) = state.reconfigure(initial_filter) {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    // Terminal setup with a panic hook that restores it
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, SetTitle("")) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        SetTitle(format!("ghlv: {}", state.logs.name))
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();

    let (interval_tx, interval_rx) = watch::channel(state.poll_interval);
    let poller = LogPoller::new(
        Arc::new(GhExecutor::new(repo)),
        args.run,
        args.job,
        tx.clone(),
        interval_rx,
    );
    spawn_monitored(tx.clone(), "log poller", poller.run());

    let theme = Theme::select(args.no_color, std::env::var_os("NO_COLOR").as_deref());
    let poll = PollControl {
        base_interval,
        interval_tx,
    };
    let result = run_app(&mut terminal, &mut state, events, &tx, &poll, &theme).await;

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, SetTitle(""))?;
    terminal.show_cursor()?;

    result
}

/// Lets the event loop retune the poller as the run status changes.
struct PollControl {
    base_interval: u64,
    interval_tx: watch::Sender<u64>,
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    tx: &mpsc::UnboundedSender<AppEvent>,
    poll: &PollControl,
    theme: &Theme,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let size = terminal.size()?;
        state.set_view_height(render::body_height(size.height));
        terminal.draw(|f| render::render(f, state, theme))?;

        state.prune_error();

        let Some(event) = events.next().await else {
            return Ok(());
        };
        match event {
            AppEvent::Key(key) => {
                let ctx = InputContext {
                    has_error: state.error.is_some(),
                    searching: state.has_search_prompt(),
                };
                handle_action(state, input::map_key(key, &ctx));
            }
            AppEvent::Tick => {
                if state.streaming && last_tick.elapsed() >= Duration::from_millis(100) {
                    state.advance_spinner();
                    last_tick = Instant::now();
                }
                let interval = state.adaptive_poll_interval(poll.base_interval);
                if state.streaming && interval != state.poll_interval {
                    state.poll_interval = interval;
                    tracing::debug!(interval, "poll interval changed");
                    if poll.interval_tx.send(interval).is_err() {
                        tracing::debug!("poller already stopped");
                    }
                }
            }
            AppEvent::Resize => {}
            AppEvent::LogUpdate(update) => {
                let outcome = state.apply_update(update);
                if let UpdateOutcome::Merged { stats, .. } = outcome {
                    tracing::debug!(entries = stats.new_entries, "log update applied");
                }
                if state.take_completion_notice() {
                    spawn_notification(tx.clone(), state.logs.name.clone(), state.conclusion);
                }
            }
            AppEvent::Error(e) => state.set_error(e),
        }

        if state.should_quit {
            events.stop();
            return Ok(());
        }
    }
}

fn handle_action(state: &mut AppState, action: Action) {
    match action {
        Action::Quit => state.should_quit = true,
        Action::DismissError => state.clear_error(),
        Action::OpenSearch => state.open_search_prompt(),
        Action::SearchInput(c) => state.search_push(c),
        Action::SearchBackspace => state.search_pop(),
        Action::SubmitSearch => state.submit_search(),
        Action::CancelSearch => state.cancel_search(),
        Action::NextMatch => state.next_match(),
        Action::PreviousMatch => state.previous_match(),
        Action::CycleLevel => state.cycle_level(),
        Action::ToggleCaseSensitive => state.toggle_case_sensitive(),
        Action::ToggleRegex => state.toggle_regex(),
        Action::ScopeToStep => state.toggle_scope_at_caret(),
        Action::ToggleStep => state.toggle_step_at_caret(),
        Action::CollapseAll => state.collapse_all(),
        Action::ExpandAll => state.expand_all(),
        Action::ToggleAutoScroll => state.toggle_auto_scroll(),
        Action::ScrollUp => state.scroll_up(1),
        Action::ScrollDown => state.scroll_down(1),
        Action::PageUp => state.viewport.page_up(),
        Action::PageDown => state.viewport.page_down(),
        Action::ScrollToTop => state.scroll_to_top(),
        Action::ScrollToBottom => state.scroll_to_bottom(),
        Action::None => {}
    }
}

use anyhow::Result;
use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::warn;

mod app;
mod config;
mod ipc;
mod persistence;
mod timer;
mod ui;
mod update;

use app::{App, AppMode};
use config::Config;
use ipc::server::IpcRequest;
use persistence::Persistence;
use pomo_ipc::{Command, Response};
use update::{feed, UpdateChecker, UpdateEvent};

/// Delay before the launch update check so it never competes with startup.
const LAUNCH_CHECK_DELAY: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    init_logging();

    let config = config::load_config()?;
    let mut app = Persistence::load()?.unwrap_or_else(App::new);
    app.normalize();

    let mut checker = UpdateChecker::new(
        feed::GITHUB_REPO,
        env!("CARGO_PKG_VERSION"),
        Persistence::update_state_path()?,
    );

    // Update worker results and ctl commands both land in the main loop;
    // nothing else ever mutates app or checker state.
    let (update_tx, update_rx) = mpsc::channel();
    let (ipc_tx, ipc_rx) = mpsc::channel();

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("IPC runtime failed to start: {}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(ipc::server::start(ipc_tx)) {
            warn!("IPC server stopped: {}", e);
        }
    });

    let launch_check_at = if config.update.auto_check
        && checker.launch_check_due(config.update.check_on_launch)
    {
        Some(Instant::now() + LAUNCH_CHECK_DELAY)
    } else {
        None
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(
        &mut terminal,
        &mut app,
        &mut checker,
        &config,
        &update_tx,
        &update_rx,
        &ipc_rx,
        launch_check_at,
    );

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn init_logging() {
    let Ok(path) = Persistence::log_path() else {
        return;
    };
    let Ok(file) = std::fs::File::options().create(true).append(true).open(path) else {
        return;
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

#[allow(clippy::too_many_arguments)]
fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    checker: &mut UpdateChecker,
    config: &Config,
    update_tx: &mpsc::Sender<UpdateEvent>,
    update_rx: &mpsc::Receiver<UpdateEvent>,
    ipc_rx: &mpsc::Receiver<IpcRequest>,
    mut launch_check_at: Option<Instant>,
) -> Result<()> {
    let mut last_save = Instant::now();
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app, checker, config))?;

        // One logical tick per second; idle timers ignore it.
        if last_tick.elapsed() >= Duration::from_secs(1) {
            last_tick = Instant::now();
            if app.tick_timer() {
                app.notify_timer_finished();
            }
        }

        // Apply update worker results on this thread only.
        while let Ok(event) = update_rx.try_recv() {
            match event {
                UpdateEvent::CheckFinished(result) => checker.apply_check_result(result),
                UpdateEvent::DownloadProgress { received, total } => {
                    checker.apply_download_progress(received, total)
                }
                UpdateEvent::DownloadFinished(result) => checker.apply_download_result(result),
            }
        }
        if checker.alert_pending && app.mode == AppMode::Normal {
            app.mode = AppMode::UpdatePrompt;
        }

        // Answer ctl clients.
        while let Ok(request) = ipc_rx.try_recv() {
            let response = handle_command(app, checker, update_tx, request.command);
            let _ = request.reply.send(response);
        }

        if let Some(at) = launch_check_at {
            if Instant::now() >= at {
                launch_check_at = None;
                checker.check_for_updates(update_tx);
            }
        }
        if launch_check_at.is_none()
            && checker.interval_check_due(config.update.auto_check, config.update.interval_hours)
        {
            checker.check_for_updates(update_tx);
        }

        // Auto-save every 5 seconds
        if last_save.elapsed().as_secs() > 5 {
            Persistence::save(app)?;
            last_save = Instant::now();
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, checker, update_tx, key.code, &mut last_tick);
                }
            }
        }

        if app.should_quit {
            Persistence::save(app)?;
            return Ok(());
        }
    }
}

fn handle_key(
    app: &mut App,
    checker: &mut UpdateChecker,
    update_tx: &mpsc::Sender<UpdateEvent>,
    code: KeyCode,
    last_tick: &mut Instant,
) {
    match app.mode {
        AppMode::Normal => match code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Char(' ') => {
                if app.timer.is_running() {
                    app.timer.stop();
                } else {
                    app.timer.start();
                    // Full first second, regardless of where the poll was.
                    *last_tick = Instant::now();
                }
            }
            KeyCode::Char('r') => app.timer.reset(true),
            KeyCode::Char('b') => app.timer.reset(false),
            KeyCode::Char('t') => {
                app.input_buffer.clear();
                app.mode = AppMode::EditingFocus;
            }
            KeyCode::Char('T') => {
                app.input_buffer.clear();
                app.mode = AppMode::EditingBreak;
            }
            KeyCode::Char('a') => {
                app.input_buffer.clear();
                app.mode = AppMode::AddingTodo;
            }
            KeyCode::Char('d') => app.remove_selected_todo(),
            KeyCode::Char('x') => app.toggle_selected_todo(),
            KeyCode::Char('n') => app.open_notes_editor(),
            KeyCode::Char('u') => {
                if checker.update_available {
                    app.mode = AppMode::UpdatePrompt;
                } else {
                    checker.check_for_updates(update_tx);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => app.move_selection_up(),
            KeyCode::Down | KeyCode::Char('j') => app.move_selection_down(),
            KeyCode::Esc => checker.error_message = None,
            _ => {}
        },
        AppMode::AddingTodo | AppMode::EditingFocus | AppMode::EditingBreak => match code {
            KeyCode::Esc => {
                app.mode = AppMode::Normal;
                app.input_buffer.clear();
            }
            KeyCode::Enter => app.handle_char('\n'),
            KeyCode::Backspace => app.handle_backspace(),
            KeyCode::Char(c) => app.handle_char(c),
            _ => {}
        },
        AppMode::EditingNotes => match code {
            KeyCode::Esc => app.commit_notes(),
            KeyCode::Enter => app.handle_char('\n'),
            KeyCode::Backspace => app.handle_backspace(),
            KeyCode::Char(c) => app.handle_char(c),
            _ => {}
        },
        AppMode::UpdatePrompt => match code {
            KeyCode::Char('d') | KeyCode::Enter => {
                checker.dismiss_alert();
                checker.download_and_install(update_tx);
                app.mode = AppMode::Normal;
            }
            KeyCode::Char('s') => {
                checker.skip_this_version();
                app.mode = AppMode::Normal;
            }
            KeyCode::Char('l') => {
                checker.remind_me_later();
                app.mode = AppMode::Normal;
            }
            KeyCode::Esc => {
                checker.dismiss_alert();
                app.mode = AppMode::Normal;
            }
            _ => {}
        },
    }
}

fn handle_command(
    app: &mut App,
    checker: &mut UpdateChecker,
    update_tx: &mpsc::Sender<UpdateEvent>,
    command: Command,
) -> Response {
    match command {
        Command::Start => {
            app.timer.start();
            Response::Ok
        }
        Command::Stop => {
            app.timer.stop();
            Response::Ok
        }
        Command::Reset { to_break } => {
            app.timer.reset(!to_break);
            Response::Ok
        }
        Command::Status => Response::Status(app.timer_status()),
        Command::AddTodo { title } => {
            if title.is_empty() {
                Response::Error("todo title cannot be empty".to_string())
            } else {
                app.add_todo(title);
                Response::Ok
            }
        }
        Command::ListTodos => Response::Todos(app.todos.clone()),
        Command::ToggleTodo { id } => {
            if app.toggle_todo(id) {
                Response::Ok
            } else {
                Response::Error(format!("no todo with id {}", id))
            }
        }
        Command::RemoveTodo { id } => {
            if app.remove_todo(id) {
                Response::Ok
            } else {
                Response::Error(format!("no todo with id {}", id))
            }
        }
        Command::CheckUpdates => {
            checker.check_for_updates(update_tx);
            Response::Ok
        }
    }
}

mod app;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::app_settings::{AppSettings, CliCommand, parse_args};
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crossterm::event::{self as crossterm_event, Event, KeyEventKind};
use crossterm::{cursor, execute, terminal};
use log::{error, info};
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tourneyfund_api::session::Session;
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut settings = AppSettings::load();
    match parse_args(std::env::args().skip(1)) {
        Ok(CliCommand::Run { api_url }) => settings.api_url = api_url,
        Ok(CliCommand::Help) => {
            println!("{}", usage_text());
            return Ok(());
        }
        Ok(CliCommand::Version) => {
            println!("tourneyfund {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Ok(CliCommand::Logout) => {
            let mut session = Session::init(settings.build_api());
            session.hydrate().logout();
            println!("Signed out.");
            return Ok(());
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    tui_logger::init_logger(log::LevelFilter::Trace)?;
    tui_logger::set_default_level(log::LevelFilter::Error);

    let api = settings.build_api();
    info!("using backend {}", api.base_url());
    let mut session = Session::init(api.clone());
    session.hydrate();
    let app = Arc::new(Mutex::new(App::new(settings, session)));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(api, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, network_req_tx, network_resp_rx).await;

    input_handler.abort();
    network_task.abort();

    Ok(())
}

fn usage_text() -> &'static str {
    "tourneyfund - tournament fundraiser terminal client

Usage:
  tourneyfund [--api-url <url>]
  tourneyfund --logout
  tourneyfund --help
  tourneyfund --version

Environment:
  TOURNEYFUND_API_URL        Backend base URL (default https://api.tourneyfund.app/api)
  TOURNEYFUND_SESSION_FILE   Session file path (default ~/.config/tourneyfund/session.json)
  TOURNEYFUND_LOG            Log pane level: error, warn, info, debug, trace
  TOURNEYFUND_TIMEOUT_SECS   Per-request timeout in seconds (unset = none)"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &network_requests, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }
        }
    }
}

async fn send_all(network_requests: &mpsc::Sender<NetworkRequest>, requests: Vec<NetworkRequest>) {
    for request in requests {
        if let Err(e) = network_requests.send(request).await {
            error!("Failed to queue network request: {e}");
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let mut guard = app.lock().await;
            let mut requests = guard.enter_requests();
            if !requests.iter().any(|r| matches!(r, NetworkRequest::LoadTournaments { .. })) {
                let tag = guard.state.guard.tag(guard.state.active_tab, None);
                requests.push(NetworkRequest::LoadTournaments { tag });
            }
            drop(guard);
            send_all(network_requests, requests).await;
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests).await;
            true
        }
        UiEvent::Resize => true,
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    loading: &mut LoadingState,
) -> bool {
    if let NetworkResponse::LoadingStateChanged { loading_state } = response {
        *loading = loading_state;
        return true;
    }

    let mut guard = app.lock().await;
    let follow_up = match response {
        NetworkResponse::LoadingStateChanged { .. } => Vec::new(),
        NetworkResponse::SignInFinished { result, as_admin, registering } => {
            guard.on_sign_in_finished(result, as_admin, registering)
        }
        NetworkResponse::TournamentsLoaded { tag, tournaments } => {
            guard.on_tournaments_loaded(tag, tournaments)
        }
        NetworkResponse::TicketsLoaded { tag, tickets } => {
            guard.on_tickets_loaded(tag, tickets);
            Vec::new()
        }
        NetworkResponse::LeaderboardLoaded { tag, entries } => {
            guard.on_leaderboard_loaded(tag, entries);
            Vec::new()
        }
        NetworkResponse::DashboardLoaded { tag, players, tournaments, tickets } => {
            guard.on_dashboard_loaded(tag, players, tournaments, tickets);
            Vec::new()
        }
        NetworkResponse::TournamentDetailLoaded { tag, teams, scores } => {
            guard.on_tournament_detail_loaded(tag, teams, scores);
            Vec::new()
        }
        NetworkResponse::PaymentsLoaded { tag, payments } => {
            guard.on_payments_loaded(tag, payments);
            Vec::new()
        }
        NetworkResponse::UsersLoaded { tag, users } => {
            guard.on_users_loaded(tag, users);
            Vec::new()
        }
        NetworkResponse::PurchaseFinished { result } => {
            guard.on_purchase_finished(result);
            Vec::new()
        }
        NetworkResponse::ScoreSaved { score } => {
            guard.on_score_saved(score);
            Vec::new()
        }
        NetworkResponse::Mutated { message } => guard.on_mutated(message),
        NetworkResponse::Error { tag, error } => {
            error!("Network error: {error}");
            guard.on_error(tag, error);
            Vec::new()
        }
    };
    drop(guard);

    send_all(network_requests, follow_up).await;
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    Some(UiEvent::KeyPressed(key_event))
                }
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}

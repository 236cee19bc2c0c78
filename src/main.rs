use std::io;
use ratatui::{
    backend::CrosstermBackend,
    Terminal,
};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use anyhow::Result;
use log::{error, info, LevelFilter};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

use trawler_rs::config::Config;
use trawler_rs::engine::clock::SystemClock;
use trawler_rs::engine::database::Database;
use trawler_rs::engine::game::Game;
use trawler_rs::engine::game_data::Catalog;
use trawler_rs::engine::persistence::{self, SaveWriter};
use trawler_rs::presence::gateway::PresenceGateway;
use trawler_rs::presence::peers::PeerRoster;
use trawler_rs::presence::{self as presence_relay, PresenceRelay};
use trawler_rs::tui::app::App;
use trawler_rs::tui::events;
use trawler_rs::tui::ui;

/// Peers that stop broadcasting are dropped after this long.
const PEER_TIMEOUT_MS: i64 = 120_000;

#[tokio::main]
async fn main() -> Result<()> {
    tui_logger::init_logger(LevelFilter::Debug)?;
    tui_logger::set_default_level(LevelFilter::Debug);

    // Load config
    let config = Config::load_or_create("config.toml")?;
    let catalog = Catalog::default();
    catalog.validate()?;

    // Restore the saved profile
    let db = Database::new(&config.storage.database_path).await?;
    let save_key = config.storage.save_key.clone();
    let progress = persistence::load_progress(&db, &save_key, &catalog).await;

    let mut game = Game::new(
        config.clone(),
        catalog,
        progress,
        Arc::new(SystemClock),
        StdRng::from_entropy(),
    );

    // Save writer
    let (writer, save_rx) = SaveWriter::channel();
    game.add_observer(Box::new(writer));
    let _writer_handle = tokio::spawn(persistence::run_save_writer(db.clone(), save_key.clone(), save_rx));

    // Presence
    let peers = Arc::new(Mutex::new(PeerRoster::new()));
    if config.presence.enabled {
        let (relay, presence_rx) = PresenceRelay::channel();
        game.add_observer(Box::new(relay));
        let gateway = PresenceGateway::new(
            config.presence.clone(),
            presence_relay::new_client_id(),
            presence_rx,
            peers.clone(),
        );
        let _gateway_handle = tokio::spawn(gateway.run_loop());
    }

    let mut app = App::new(peers.clone());
    if let Some(report) = game.catch_up_offline() {
        info!("Offline for {}: +{} fish, +${}", report.time_away_label, report.fish_gained, report.money_gained);
        app.offline_report = Some(report);
    }
    if game.seed_inbox() > 0 {
        app.add_activity("You've got mail!".to_string());
    }

    let game = Arc::new(Mutex::new(game));

    // Tick driver
    let game_clone = game.clone();
    let peers_clone = peers.clone();
    let tick_ms = config.session.tick_ms.max(10);
    let _tick_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
        loop {
            interval.tick().await;
            let now = {
                let mut game = game_clone.lock();
                game.tick();
                game.now_ms()
            };
            peers_clone.lock().prune(now, PEER_TIMEOUT_MS);
        }
    });

    // Setup TUI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main Loop (TUI)
    let res = run_app(&mut terminal, &mut app, &game).await;

    // Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err);
    }

    // Last save goes through directly so it is on disk before we exit
    let json = game.lock().snapshot().to_json()?;
    if let Err(e) = db.save_snapshot(&save_key, &json).await {
        error!("Final save failed: {}", e);
        eprintln!("Final save failed: {}", e);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    game: &Mutex<Game>,
) -> Result<()> {
    let mut last_catch_at = 0;
    loop {
        {
            let game_guard = game.lock();
            if let Some(catch) = game_guard.session().last_caught.clone() {
                if catch.timestamp != last_catch_at {
                    last_catch_at = catch.timestamp;
                    app.add_activity(format!("Caught a {} worth ${}", catch.fish_name, catch.value));
                }
            }
            terminal.draw(|f| ui::draw(f, app, &game_guard))?;
        }
        if app.should_quit {
            return Ok(());
        }

        // Handle input
        events::handle_events(app, game)?;
        tokio::task::yield_now().await;
    }
}

use anyhow::Result;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use trawler_rs::config::Config;
use trawler_rs::engine::clock::{Clock, ManualClock, SystemClock};
use trawler_rs::engine::database::Database;
use trawler_rs::engine::game::Game;
use trawler_rs::engine::game_data::Catalog;
use trawler_rs::engine::persistence::{self, SaveWriter};
use trawler_rs::tui::app::{shop_items, ShopItem};

/// Sell by hand once the hold gets this full and no merchant is hired.
const SELL_THRESHOLD: u64 = 50;
/// Simulated time between shopping trips.
const SHOP_EVERY_MS: i64 = 30_000;

fn open_price(game: &Game, item: &ShopItem) -> Option<u64> {
    let p = game.progress();
    let catalog = game.catalog();
    match item {
        ShopItem::Upgrade(id) => {
            let def = catalog.upgrade(id)?;
            let state = p.upgrade(id)?;
            (!def.is_maxed(state.level)).then_some(state.cost)
        }
        ShopItem::Location(id) if !p.is_location_unlocked(id) => catalog.location(id).map(|l| l.price),
        ShopItem::BoatOption(slot, id) if !p.owns_boat_option(*slot, id) => {
            catalog.boat_option(*slot, id).map(|o| o.price)
        }
        _ => None,
    }
}

fn shop_once(game: &mut Game) -> Option<ShopItem> {
    let view: &Game = game;
    let money = view.progress().money();
    let (item, _) = shop_items(view.catalog())
        .into_iter()
        .filter_map(|item| open_price(view, &item).map(|price| (item, price)))
        .filter(|(_, price)| *price <= money)
        .min_by_key(|(_, price)| *price)?;

    let ok = match &item {
        ShopItem::Upgrade(id) => game.purchase_upgrade(id),
        ShopItem::Location(id) => game.unlock_location(id) && game.change_location(id),
        ShopItem::BoatOption(slot, id) => game.upgrade_boat_part(*slot, id),
    };
    ok.then_some(item)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let persist = args.iter().any(|a| a == "--persist");
    let minutes: i64 = args
        .iter()
        .find_map(|a| a.parse().ok())
        .unwrap_or(30);

    // Load config
    let config = Config::load_or_create("config.toml")?;
    let catalog = Catalog::default();
    catalog.validate()?;

    println!("Loaded config.");
    println!("Starting headless trawler for {} simulated minutes...", minutes);

    // Setup Database
    let db = if persist {
        Database::new(&config.storage.database_path).await?
    } else {
        Database::in_memory().await?
    };
    let save_key = config.storage.save_key.clone();
    let progress = persistence::load_progress(&db, &save_key, &catalog).await;

    let clock = Arc::new(ManualClock::new(SystemClock.now_ms()));
    let mut game = Game::new(config.clone(), catalog, progress, clock.clone(), StdRng::from_entropy());

    let (writer, save_rx) = SaveWriter::channel();
    game.add_observer(Box::new(writer));
    let writer_handle = tokio::spawn(persistence::run_save_writer(db.clone(), save_key.clone(), save_rx));

    if let Some(report) = game.catch_up_offline() {
        info!("Away for {}: +{} fish, +${}", report.time_away_label, report.fish_gained, report.money_gained);
    }
    game.seed_inbox();

    let start_money = game.progress().money();
    let start_caught = game.progress().total_fish_caught();
    let step = config.session.tick_ms.max(10) as i64;
    let end = clock.now_ms() + minutes * 60_000;
    let mut next_shop = clock.now_ms();
    let mut purchases = 0;

    while clock.now_ms() < end {
        clock.advance(step);
        game.tick();

        if !game.session().is_fishing {
            game.start_cast();
        }

        if !game.progress().auto_sell_enabled(game.catalog()) && game.progress().inventory_total() >= SELL_THRESHOLD {
            let earned = game.sell_all();
            info!("Sold the hold for ${}", earned);
        }

        if clock.now_ms() >= next_shop {
            next_shop = clock.now_ms() + SHOP_EVERY_MS;
            while let Some(item) = shop_once(&mut game) {
                purchases += 1;
                info!("Bought {:?}", item);
            }
        }

        if game.can_prestige() && game.perform_prestige() {
            info!("Prestiged to level {} ({})", game.progress().prestige_level(), game.rank_title());
        }
    }

    println!("Run complete.");

    // Let the writer drain, then store the final state
    let json = game.snapshot().to_json()?;
    drop(game);
    if let Err(e) = writer_handle.await {
        warn!("Save writer stopped: {}", e);
    }
    db.save_snapshot(&save_key, &json).await?;

    let saved = persistence::load_progress(&db, &save_key, &Catalog::default()).await;

    println!("--- Summary ---");
    println!("Money: ${} (started with ${})", saved.money(), start_money);
    println!(
        "Fish caught: {} (+{})",
        saved.total_fish_caught(),
        saved.total_fish_caught().saturating_sub(start_caught)
    );
    println!("Species discovered: {}", saved.discovered_count());
    println!("Prestige level: {}", saved.prestige_level());
    println!("Purchases made: {}", purchases);

    // Verify Database
    let saves: i64 = sqlx::query_scalar("SELECT count(*) FROM saves")
        .fetch_one(&db.pool)
        .await?;
    println!("Saves stored: {}", saves);

    Ok(())
}

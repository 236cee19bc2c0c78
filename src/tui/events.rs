use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use parking_lot::Mutex;
use std::time::Duration;

use crate::engine::game::Game;
use crate::tui::app::{
    shop_items, App, Confirm, ShopItem, TAB_DASHBOARD, TAB_INBOX, TAB_PRESTIGE, TAB_SHOP,
};

pub fn handle_events(app: &mut App, game: &Mutex<Game>) -> Result<()> {
    if event::poll(Duration::from_millis(100))? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                let mut game = game.lock();
                handle_key(app, &mut game, key.code);
            }
        }
    }
    Ok(())
}

pub fn handle_key(app: &mut App, game: &mut Game, code: KeyCode) {
    if let Some(confirm) = app.confirm.take() {
        if matches!(code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            run_confirmed(app, game, confirm);
        } else {
            app.add_activity("Cancelled".to_string());
        }
        return;
    }

    match code {
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Right | KeyCode::Tab => {
            app.next_tab();
        }
        KeyCode::Left | KeyCode::BackTab => {
            app.previous_tab();
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.select_next(game);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.select_previous();
        }
        KeyCode::Esc => {
            app.offline_report = None;
        }
        KeyCode::Char('c') | KeyCode::Char(' ') => {
            if !game.start_cast() {
                app.add_activity("Already casting...".to_string());
            }
        }
        KeyCode::Char('s') => {
            let earned = game.sell_all();
            if earned > 0 {
                app.add_activity(format!("Sold all fish for ${}", earned));
            }
            app.clamp_selection(game);
        }
        KeyCode::Char('p') if app.tab_index == TAB_PRESTIGE => {
            if game.can_prestige() {
                app.confirm = Some(Confirm::Prestige);
            } else {
                app.add_activity("Prestige requirements not met yet".to_string());
            }
        }
        KeyCode::Char('r') if app.tab_index == TAB_PRESTIGE => {
            app.confirm = Some(Confirm::Reset);
        }
        KeyCode::Enter => activate(app, game),
        _ => {}
    }
}

fn activate(app: &mut App, game: &mut Game) {
    match app.tab_index {
        TAB_DASHBOARD => {
            let name = game.progress().inventory().keys().nth(app.selected).cloned();
            if let Some(name) = name {
                let earned = game.sell_fish(&name);
                app.add_activity(format!("Sold {} for ${}", name, earned));
                app.clamp_selection(game);
            }
        }
        TAB_SHOP => {
            let Some(item) = shop_items(game.catalog()).into_iter().nth(app.selected) else {
                return;
            };
            buy(app, game, item);
        }
        TAB_INBOX => {
            let id = game.progress().emails().get(app.selected).map(|e| e.id.clone());
            if let Some(id) = id {
                game.mark_email_read(&id);
            }
        }
        _ => {}
    }
}

fn buy(app: &mut App, game: &mut Game, item: ShopItem) {
    let (ok, label) = match item {
        ShopItem::Upgrade(id) => (game.purchase_upgrade(id), id.to_string()),
        ShopItem::Location(id) => {
            let ok = if game.progress().is_location_unlocked(id) {
                game.change_location(id)
            } else {
                game.unlock_location(id)
            };
            (ok, id.to_string())
        }
        ShopItem::BoatOption(slot, option) => (
            game.upgrade_boat_part(slot, option),
            format!("{} {}", slot.as_str(), option),
        ),
    };
    if !ok {
        app.add_activity(format!("Can't get {} right now", label));
    }
}

fn run_confirmed(app: &mut App, game: &mut Game, confirm: Confirm) {
    match confirm {
        Confirm::Prestige => {
            if game.perform_prestige() {
                let level = game.progress().prestige_level();
                let title = game.rank_title().to_string();
                app.add_activity(format!("Prestige level {} reached ({})", level, title));
            }
        }
        Confirm::Reset => {
            game.reset_progress();
            app.add_activity("All progress has been reset".to_string());
        }
    }
    app.selected = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::clock::ManualClock;
    use crate::engine::game_data::Catalog;
    use crate::engine::state::PlayerProgress;
    use crate::presence::peers::PeerRoster;
    use crate::tui::app::TAB_LOGS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn setup(money: u64) -> (App, Game, Arc<ManualClock>) {
        let catalog = Catalog::default();
        let mut progress = PlayerProgress::new(&catalog);
        progress.credit(money);
        progress.add_fish("Bluegill", 4);
        let clock = Arc::new(ManualClock::new(1_000));
        let game = Game::new(Config::default(), catalog, progress, clock.clone(), StdRng::seed_from_u64(5));
        (App::new(Arc::new(Mutex::new(PeerRoster::new()))), game, clock)
    }

    #[test]
    fn test_cast_and_sell_keys() {
        let (mut app, mut game, clock) = setup(0);
        handle_key(&mut app, &mut game, KeyCode::Char('c'));
        assert!(game.session().is_fishing);
        handle_key(&mut app, &mut game, KeyCode::Char(' '));
        assert_eq!(app.activity.last().unwrap(), "Already casting...");

        clock.advance(2_500);
        game.tick();
        handle_key(&mut app, &mut game, KeyCode::Char('s'));
        assert!(game.progress().inventory().is_empty());
        assert!(game.progress().money() >= 8);
    }

    #[test]
    fn test_enter_buys_selected_shop_item() {
        let (mut app, mut game, _clock) = setup(100);
        handle_key(&mut app, &mut game, KeyCode::Tab);
        assert_eq!(app.tab_index, TAB_SHOP);
        handle_key(&mut app, &mut game, KeyCode::Enter);
        assert_eq!(game.progress().upgrade_level("rod"), 2);
        assert_eq!(game.progress().money(), 90);
    }

    #[test]
    fn test_reset_needs_confirmation() {
        let (mut app, mut game, _clock) = setup(500);
        app.tab_index = TAB_PRESTIGE;

        handle_key(&mut app, &mut game, KeyCode::Char('r'));
        assert_eq!(app.confirm, Some(Confirm::Reset));
        handle_key(&mut app, &mut game, KeyCode::Char('n'));
        assert_eq!(game.progress().money(), 500);

        handle_key(&mut app, &mut game, KeyCode::Char('r'));
        handle_key(&mut app, &mut game, KeyCode::Char('y'));
        assert_eq!(game.progress().money(), 0);
        assert!(game.progress().inventory().is_empty());
    }

    #[test]
    fn test_prestige_key_refused_when_ineligible() {
        let (mut app, mut game, _clock) = setup(0);
        app.tab_index = TAB_PRESTIGE;
        handle_key(&mut app, &mut game, KeyCode::Char('p'));
        assert_eq!(app.confirm, None);
        assert_eq!(game.progress().prestige_level(), 0);
    }

    #[test]
    fn test_quit_and_tab_keys() {
        let (mut app, mut game, _clock) = setup(0);
        handle_key(&mut app, &mut game, KeyCode::Left);
        assert_eq!(app.tab_index, TAB_LOGS);
        handle_key(&mut app, &mut game, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}

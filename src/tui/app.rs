use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

use crate::engine::game::Game;
use crate::engine::game_data::{BoatSlot, Catalog};
use crate::engine::offline::OfflineReport;
use crate::presence::peers::PeerRoster;

pub const TAB_DASHBOARD: usize = 0;
pub const TAB_SHOP: usize = 1;
pub const TAB_ENCYCLOPEDIA: usize = 2;
pub const TAB_PRESTIGE: usize = 3;
pub const TAB_INBOX: usize = 4;
pub const TAB_LOGS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum ShopItem {
    Upgrade(&'static str),
    Location(&'static str),
    BoatOption(BoatSlot, &'static str),
}

pub fn shop_items(catalog: &Catalog) -> Vec<ShopItem> {
    let upgrades = catalog.upgrades.iter().map(|u| ShopItem::Upgrade(u.id));
    let locations = catalog.locations.iter().map(|l| ShopItem::Location(l.id));
    let boat = catalog
        .boat_parts
        .iter()
        .flat_map(|p| p.options.iter().map(move |o| ShopItem::BoatOption(p.slot, o.id)));
    upgrades.chain(locations).chain(boat).collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confirm {
    Prestige,
    Reset,
}

/// Front-end state. Game state lives in [`Game`].
pub struct App {
    pub tabs: Vec<String>,
    pub tab_index: usize,
    pub selected: usize,
    pub confirm: Option<Confirm>,
    pub activity: Vec<String>,
    pub offline_report: Option<OfflineReport>,
    pub peers: Arc<Mutex<PeerRoster>>,
    pub started_at: Instant,
    pub should_quit: bool,
}

impl App {
    pub fn new(peers: Arc<Mutex<PeerRoster>>) -> Self {
        Self {
            tabs: vec![
                "Dashboard".to_string(),
                "Shop".to_string(),
                "Encyclopedia".to_string(),
                "Prestige".to_string(),
                "Inbox".to_string(),
                "Logs".to_string(),
            ],
            tab_index: TAB_DASHBOARD,
            selected: 0,
            confirm: None,
            activity: Vec::new(),
            offline_report: None,
            peers,
            started_at: Instant::now(),
            should_quit: false,
        }
    }

    pub fn runtime(&self) -> String {
        let secs = self.started_at.elapsed().as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }

    pub fn add_activity(&mut self, message: String) {
        self.activity.push(message);
        if self.activity.len() > 100 {
            self.activity.remove(0);
        }
    }

    pub fn next_tab(&mut self) {
        self.tab_index = (self.tab_index + 1) % self.tabs.len();
        self.selected = 0;
        self.confirm = None;
    }

    pub fn previous_tab(&mut self) {
        if self.tab_index > 0 {
            self.tab_index -= 1;
        } else {
            self.tab_index = self.tabs.len() - 1;
        }
        self.selected = 0;
        self.confirm = None;
    }

    pub fn row_count(&self, game: &Game) -> usize {
        match self.tab_index {
            TAB_DASHBOARD => game.progress().inventory().len(),
            TAB_SHOP => shop_items(game.catalog()).len(),
            TAB_ENCYCLOPEDIA => game.progress().encyclopedia().len(),
            TAB_INBOX => game.progress().emails().len(),
            _ => 0,
        }
    }

    pub fn select_next(&mut self, game: &Game) {
        let rows = self.row_count(game);
        if rows > 0 {
            self.selected = (self.selected + 1).min(rows - 1);
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keeps the cursor inside the list after rows disappear.
    pub fn clamp_selection(&mut self, game: &Game) {
        let rows = self.row_count(game);
        if rows == 0 {
            self.selected = 0;
        } else if self.selected >= rows {
            self.selected = rows - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_lists_every_purchase() {
        let catalog = Catalog::default();
        let items = shop_items(&catalog);
        assert_eq!(items.len(), 5 + 4 + 12);
        assert_eq!(items[0], ShopItem::Upgrade("rod"));
        assert_eq!(items[5], ShopItem::Location("pond"));
        assert_eq!(items[9], ShopItem::BoatOption(BoatSlot::Hull, "basic"));
    }

    #[test]
    fn test_tab_cycling_wraps() {
        let mut app = App::new(Arc::new(Mutex::new(PeerRoster::new())));
        app.previous_tab();
        assert_eq!(app.tab_index, TAB_LOGS);
        app.next_tab();
        assert_eq!(app.tab_index, TAB_DASHBOARD);
    }

    #[test]
    fn test_activity_is_bounded() {
        let mut app = App::new(Arc::new(Mutex::new(PeerRoster::new())));
        for i in 0..150 {
            app.add_activity(format!("line {}", i));
        }
        assert_eq!(app.activity.len(), 100);
        assert_eq!(app.activity[0], "line 50");
    }
}

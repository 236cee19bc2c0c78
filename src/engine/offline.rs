use log::info;
use rand::Rng;

use crate::config::OfflineProgressConfig;
use crate::engine::game_data::Catalog;
use crate::engine::resolver;
use crate::engine::state::{PlayerProgress, ProgressEvent};

/// Stacks past this size are sold at raw value while away.
pub const MAX_OFFLINE_STACK: u64 = 1000;
const MIN_AWAY_MS: i64 = 60_000;

#[derive(Debug, Clone, PartialEq)]
pub struct OfflineReport {
    pub money_gained: u64,
    pub fish_gained: u64,
    pub time_away_label: String,
}

pub fn time_away_label(hours: f64) -> String {
    let whole = hours.floor();
    let minutes = ((hours - whole) * 60.0).floor();
    format!("{}h {}m", whole as u64, minutes as u64)
}

/// Credits what the auto-fishers caught while the game was closed. Runs at
/// reduced efficiency and is capped at `max_hours`. Returns `None` when
/// nothing happened.
pub fn simulate_offline<R: Rng + ?Sized>(
    progress: &mut PlayerProgress,
    catalog: &Catalog,
    config: &OfflineProgressConfig,
    last_seen_ms: i64,
    now_ms: i64,
    rng: &mut R,
) -> Option<OfflineReport> {
    let rate = progress.auto_fishing_rate();
    if !config.enabled || rate <= 0.0 || last_seen_ms <= 0 {
        return None;
    }
    let elapsed = now_ms - last_seen_ms;
    if elapsed < MIN_AWAY_MS {
        return None;
    }

    let hours = (elapsed as f64 / 3_600_000.0).min(config.max_hours);
    let catches = (rate * config.efficiency_rate * hours * 3600.0).floor() as u64;
    if catches == 0 {
        return None;
    }
    let location = catalog
        .location(progress.active_location_id())
        .unwrap_or_else(|| catalog.starting_location());

    let mut money = 0;
    let mut fish = 0;
    for caught in resolver::resolve_catches(&location.fish, catches, rng) {
        progress.record_catch(caught, None);
        fish += 1;
        if progress.held(caught.name) > MAX_OFFLINE_STACK {
            progress.remove_fish(caught.name, 1);
            money += caught.value;
        }
    }
    progress.credit(money);

    let report = OfflineReport {
        money_gained: money,
        fish_gained: fish,
        time_away_label: time_away_label(hours),
    };
    info!(
        "Away for {}: caught {} fish, earned ${}",
        report.time_away_label, report.fish_gained, report.money_gained
    );
    progress.note(ProgressEvent::OfflineEarnings {
        money: report.money_gained,
        fish: report.fish_gained,
        time_away: report.time_away_label.clone(),
    });
    Some(report)
}

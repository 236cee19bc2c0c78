use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

use crate::config::Config;
use crate::engine::cast::CastGuard;
use crate::engine::clock::Clock;
use crate::engine::economy;
use crate::engine::game_data::{BoatSlot, Catalog};
use crate::engine::inbox;
use crate::engine::offline::{self, OfflineReport};
use crate::engine::persistence::{self, SaveData};
use crate::engine::prestige::{self, PrestigeBonuses};
use crate::engine::resolver::{self, LastCatch};
use crate::engine::scheduler::{TaskKind, TickScheduler};
use crate::engine::state::{PlayerProgress, ProgressEvent};

/// Per-session state that is never saved.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    pub is_fishing: bool,
    /// Percent across the water, 10-90, re-rolled on every cast.
    pub boat_position: u32,
    pub last_caught: Option<LastCatch>,
}

pub struct ChangeSet<'a> {
    pub events: &'a [ProgressEvent],
    pub progress: &'a PlayerProgress,
    pub catalog: &'a Catalog,
    pub session: &'a SessionView,
    pub now_ms: i64,
}

impl ChangeSet<'_> {
    pub fn touches_save(&self) -> bool {
        self.events.iter().any(ProgressEvent::touches_save)
    }

    pub fn touches_presence(&self) -> bool {
        self.events.iter().any(ProgressEvent::touches_presence)
    }

    pub fn contains(&self, event: &ProgressEvent) -> bool {
        self.events.contains(event)
    }
}

/// Gets told about every batch of progress changes. Must not block.
pub trait ProgressObserver: Send {
    fn on_change(&self, change: &ChangeSet<'_>);
}

/// One player's running game. Front ends call the operations; the tick driver
/// calls [`Game::tick`] on a short interval.
pub struct Game {
    config: Config,
    catalog: Catalog,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    progress: PlayerProgress,
    scheduler: TickScheduler,
    cast: CastGuard,
    session: SessionView,
    observers: Vec<Box<dyn ProgressObserver>>,
}

impl Game {
    pub fn new(config: Config, catalog: Catalog, progress: PlayerProgress, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        let now = clock.now_ms();
        let scheduler = TickScheduler::new(&config.session, now);
        let cast = CastGuard::new(config.session.cast_duration_ms);
        let mut game = Self {
            config,
            catalog,
            clock,
            rng,
            progress,
            scheduler,
            cast,
            session: SessionView { boat_position: 50, ..SessionView::default() },
            observers: Vec::new(),
        };
        // Whatever was recorded while building the profile is not news
        game.progress.drain_events();
        game.sync_schedule(now, false);
        game
    }

    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    // --- Views ---

    pub fn progress(&self) -> &PlayerProgress {
        &self.progress
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionView {
        &self.session
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn cast_progress(&self) -> f64 {
        self.cast.progress(self.now_ms())
    }

    pub fn next_auto_fish_in(&self) -> Option<i64> {
        self.scheduler.due_in(TaskKind::AutoFish, self.now_ms())
    }

    pub fn next_auto_sell_in(&self) -> Option<i64> {
        self.scheduler.due_in(TaskKind::AutoSell, self.now_ms())
    }

    pub fn prestige_bonuses(&self) -> PrestigeBonuses {
        PrestigeBonuses::for_level(self.progress.prestige_level(), &self.config.prestige.benefits)
    }

    pub fn can_prestige(&self) -> bool {
        prestige::can_prestige(&self.progress, &self.config.prestige)
    }

    pub fn rank_title(&self) -> &str {
        prestige::rank_title(self.progress.prestige_level(), &self.config.prestige)
    }

    pub fn snapshot(&self) -> SaveData {
        persistence::capture(&self.progress, &self.catalog, self.now_ms())
    }

    // --- Loop ---

    pub fn start_cast(&mut self) -> bool {
        let now = self.now_ms();
        if !self.cast.begin(now) {
            return false;
        }
        self.session.is_fishing = true;
        self.session.boat_position = self.rng.gen_range(10..=90);
        self.progress.note(ProgressEvent::CastStarted);
        self.flush(now);
        true
    }

    /// Advances timers to the clock's current time: finishes a due cast, then
    /// runs whichever recurring tasks are due.
    pub fn tick(&mut self) {
        let now = self.now_ms();

        if self.cast.finish_if_due(now) {
            let count = self.progress.fishing_power().ceil().max(0.0) as u64;
            let caught = self.catch_at_active_location(count, now);
            self.session.is_fishing = false;
            self.progress.note(ProgressEvent::CastFinished);
            debug!("Cast landed {} of {} fish", caught, count);
        }

        for task in self.scheduler.poll(now) {
            match task {
                TaskKind::AutoFish => {
                    if self.cast.in_flight() {
                        debug!("Skipping auto-fish, a cast is in flight");
                        continue;
                    }
                    let count = self.progress.auto_fishing_rate().ceil().max(0.0) as u64;
                    self.catch_at_active_location(count, now);
                }
                TaskKind::AutoSell => {
                    let multiplier = self.prestige_bonuses().fish_value;
                    economy::auto_sell(&mut self.progress, &self.catalog, multiplier);
                }
            }
        }

        self.after_change(now);
    }

    fn catch_at_active_location(&mut self, count: u64, now: i64) -> usize {
        let location = self
            .catalog
            .location(self.progress.active_location_id())
            .unwrap_or_else(|| self.catalog.starting_location());
        let catches = resolver::resolve_catches(&location.fish, count, &mut self.rng);
        let landed = catches.len();
        for fish in catches {
            let last = resolver::land_catch(&mut self.progress, fish, &mut self.rng, now);
            self.session.last_caught = Some(last);
        }
        landed
    }

    // --- Purchases ---

    pub fn purchase_upgrade(&mut self, id: &str) -> bool {
        let ok = economy::purchase_upgrade(&mut self.progress, &self.catalog, id);
        self.after_change(self.now_ms());
        ok
    }

    pub fn unlock_location(&mut self, id: &str) -> bool {
        let ok = economy::unlock_location(&mut self.progress, &self.catalog, id);
        self.after_change(self.now_ms());
        ok
    }

    pub fn change_location(&mut self, id: &str) -> bool {
        let ok = economy::change_location(&mut self.progress, &self.catalog, id);
        self.after_change(self.now_ms());
        ok
    }

    pub fn upgrade_boat_part(&mut self, slot: BoatSlot, option_id: &str) -> bool {
        let ok = economy::upgrade_boat_part(&mut self.progress, &self.catalog, slot, option_id);
        self.after_change(self.now_ms());
        ok
    }

    pub fn sell_fish(&mut self, name: &str) -> u64 {
        let multiplier = self.prestige_bonuses().fish_value;
        let earned = economy::sell_fish(&mut self.progress, &self.catalog, name, multiplier);
        self.after_change(self.now_ms());
        earned
    }

    pub fn sell_all(&mut self) -> u64 {
        let multiplier = self.prestige_bonuses().fish_value;
        let earned = economy::sell_all(&mut self.progress, &self.catalog, multiplier);
        self.after_change(self.now_ms());
        earned
    }

    // --- Session lifecycle ---

    /// Credits time spent away since the last save. Call once, after loading.
    pub fn catch_up_offline(&mut self) -> Option<OfflineReport> {
        let now = self.now_ms();
        let last_seen = self.progress.last_online_ms();
        let report = offline::simulate_offline(
            &mut self.progress,
            &self.catalog,
            &self.config.offline_progress,
            last_seen,
            now,
            &mut self.rng,
        );
        // Only ever credit the same stretch once
        self.progress.set_last_online_ms(now);
        self.after_change(now);
        report
    }

    pub fn seed_inbox(&mut self) -> usize {
        let delivered = inbox::seed_welcome(&mut self.progress, &self.config.inbox);
        self.after_change(self.now_ms());
        delivered
    }

    pub fn mark_email_read(&mut self, id: &str) -> bool {
        let ok = self.progress.mark_email_read(id);
        self.after_change(self.now_ms());
        ok
    }

    pub fn perform_prestige(&mut self) -> bool {
        let ok = prestige::perform_prestige(&mut self.progress, &self.catalog, &self.config.prestige);
        if ok {
            self.clear_session();
        }
        self.after_change(self.now_ms());
        ok
    }

    pub fn reset_progress(&mut self) {
        prestige::reset_progress(&mut self.progress, &self.catalog);
        self.clear_session();
        self.after_change(self.now_ms());
    }

    fn clear_session(&mut self) {
        self.cast.cancel();
        self.session.is_fishing = false;
        self.session.last_caught = None;
    }

    // --- Plumbing ---

    fn sync_schedule(&mut self, now: i64, rate_changed: bool) {
        let auto_rate = self.progress.auto_fishing_rate();
        self.scheduler.set_active(TaskKind::AutoFish, auto_rate > 0.0, now);
        if rate_changed {
            self.scheduler.reset(TaskKind::AutoFish, now);
        }
        let auto_sell = self.progress.auto_sell_enabled(&self.catalog);
        if auto_sell && !self.scheduler.is_active(TaskKind::AutoSell) {
            info!("Fish merchant hired, auto-selling every {}s", self.config.session.auto_sell_secs);
        }
        self.scheduler.set_active(TaskKind::AutoSell, auto_sell, now);
    }

    fn after_change(&mut self, now: i64) {
        if !self.progress.has_pending_events() {
            return;
        }
        let rate_changed = self.progress.has_pending(&ProgressEvent::RatesChanged);
        self.sync_schedule(now, rate_changed);
        self.flush(now);
    }

    fn flush(&mut self, now: i64) {
        let events = self.progress.drain_events();
        if events.is_empty() {
            return;
        }
        let change = ChangeSet {
            events: &events,
            progress: &self.progress,
            catalog: &self.catalog,
            session: &self.session,
            now_ms: now,
        };
        for observer in &self.observers {
            observer.on_change(&change);
        }
    }
}

//! Clicker Clans: tap big, level up, build your team.
//!
//! [`ClansGame`] is the store: it owns the session, the scheduler, the save
//! backend, the wall clock and the RNG. Everything the presentation layer
//! can do goes through its methods; everything it can show comes from
//! [`ClansGame::overview`].

pub mod actions;
pub mod clock;
pub mod logic;
pub mod rules;
pub mod save;
pub mod state;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::input::InputEvent;
use crate::time::WallClock;

use actions::*;
use clock::{Scheduler, Task};
use logic::TapOutcome;
use rules::Overview;
use save::{LoadStatus, Storage};
use state::{
    GameState, Mode, Session, Team, UpgradeKind, MISSIONS, PRIZES, STATUS_LOAD_FAILED,
    STATUS_SAVE_FAILED,
};

pub struct ClansGame {
    session: Session,
    scheduler: Scheduler,
    storage: Box<dyn Storage>,
    clock: Box<dyn WallClock>,
    rng: ChaCha8Rng,
}

impl ClansGame {
    /// Load the save, build the session from it, then start the timers.
    /// A broken save never fails construction.
    pub fn new(storage: Box<dyn Storage>, clock: Box<dyn WallClock>, settings: &Settings) -> Self {
        let mut game = GameState::new();
        let status = save::load_game(storage.as_ref(), &mut game);
        let mut session = Session::new(game);
        match status {
            LoadStatus::Restored => info!(
                season = session.game.season_number,
                coins = session.game.coins,
                "save loaded"
            ),
            LoadStatus::NoSave => debug!("no save found, new game"),
            LoadStatus::Corrupt => session.set_event(STATUS_LOAD_FAILED),
        }

        let seed = settings.seed.unwrap_or_else(|| clock.now_ms());
        let mut store = Self {
            session,
            scheduler: Scheduler::new(settings.ticks_per_sec),
            storage,
            clock,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        store.sync_schedule();
        store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &GameState {
        &self.session.game
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Full state plus every derived value, as of now.
    pub fn overview(&self) -> Overview<'_> {
        Overview::compute(&self.session, self.clock.now_ms())
    }

    pub fn is_task_armed(&self, task: Task) -> bool {
        self.scheduler.is_armed(task)
    }

    // ── Operations ──────────────────────────────────────────────

    pub fn tap(&mut self) -> TapOutcome {
        let now = self.clock.now_ms();
        let shown = self.session.notice.clone();
        let outcome = logic::tap(&mut self.session, now);
        match outcome {
            TapOutcome::Credited(_) => self.persist(),
            // repeating the notice on screen keeps its original expiry
            TapOutcome::SeasonOver | TapOutcome::TooFast => {
                if self.session.notice != shown || !self.scheduler.is_armed(Task::NoticeExpiry) {
                    self.scheduler.arm(Task::NoticeExpiry);
                }
            }
        }
        outcome
    }

    pub fn select_team(&mut self, team: Team) {
        logic::select_team(&mut self.session, team);
        self.persist();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        logic::set_mode(&mut self.session, mode);
        self.persist();
    }

    pub fn purchase_upgrade(&mut self, kind: UpgradeKind) -> bool {
        let ok = logic::purchase_upgrade(&mut self.session, kind);
        self.after_operation(ok)
    }

    pub fn claim_prize(&mut self, prize_level: u64) -> bool {
        let ok = logic::claim_prize(&mut self.session, prize_level);
        self.after_operation(ok)
    }

    pub fn claim_mission(&mut self, mission_id: &str) -> bool {
        let ok = logic::claim_mission(&mut self.session, mission_id);
        self.after_operation(ok)
    }

    pub fn claim_daily_reward(&mut self) -> bool {
        let now = self.clock.now_ms();
        let ok = logic::claim_daily_reward(&mut self.session, now);
        self.after_operation(ok)
    }

    pub fn claim_team_chest(&mut self) -> bool {
        let ok = logic::claim_team_chest(&mut self.session);
        self.after_operation(ok)
    }

    pub fn start_next_season(&mut self) -> bool {
        let ok = logic::start_next_season(&mut self.session, &mut self.rng);
        self.after_operation(ok)
    }

    fn after_operation(&mut self, ok: bool) -> bool {
        if ok {
            self.sync_schedule();
            self.persist();
        }
        ok
    }

    // ── Input ───────────────────────────────────────────────────

    /// Dispatch a key or button press. Returns true if the event was consumed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Click(id) => self.handle_click(id),
        }
    }

    fn handle_key(&mut self, key: char) -> bool {
        match key {
            't' | ' ' => {
                self.tap();
            }
            'c' => self.set_mode(Mode::Classic),
            'm' => self.set_mode(Mode::Multiplayer),
            '1'..='4' => {
                let idx = (key as u8 - b'1') as usize;
                self.select_team(Team::all()[idx]);
            }
            'p' => {
                self.purchase_upgrade(UpgradeKind::PowerTap);
            }
            'a' => {
                self.purchase_upgrade(UpgradeKind::AutoTap);
            }
            'd' => {
                self.claim_daily_reward();
            }
            'h' => {
                self.claim_team_chest();
            }
            'n' => {
                self.start_next_season();
            }
            _ => return false,
        }
        true
    }

    fn handle_click(&mut self, id: u16) -> bool {
        match id {
            TAP => {
                self.tap();
            }
            MODE_CLASSIC => self.set_mode(Mode::Classic),
            MODE_MULTIPLAYER => self.set_mode(Mode::Multiplayer),
            CLAIM_DAILY => {
                self.claim_daily_reward();
            }
            CLAIM_TEAM_CHEST => {
                self.claim_team_chest();
            }
            START_NEXT_SEASON => {
                self.start_next_season();
            }
            _ => {
                if let Some(i) = index_in(id, BUY_UPGRADE_BASE, UpgradeKind::all().len()) {
                    self.purchase_upgrade(UpgradeKind::all()[i]);
                } else if let Some(i) = index_in(id, CLAIM_PRIZE_BASE, PRIZES.len()) {
                    self.claim_prize(PRIZES[i].level);
                } else if let Some(i) = index_in(id, CLAIM_MISSION_BASE, MISSIONS.len()) {
                    self.claim_mission(MISSIONS[i].id);
                } else if let Some(i) = index_in(id, SELECT_TEAM_BASE, Team::all().len()) {
                    self.select_team(Team::all()[i]);
                } else {
                    return false;
                }
            }
        }
        true
    }

    // ── Simulation ──────────────────────────────────────────────

    /// Advance by however much wall time passed since the last call.
    pub fn update(&mut self) {
        let now = self.clock.now_ms();
        let fired = self.scheduler.update(now as f64);
        self.apply_tasks(&fired);
    }

    /// Advance by `delta_ticks` discrete ticks.
    pub fn tick(&mut self, delta_ticks: u32) {
        let fired = self.scheduler.advance(delta_ticks);
        self.apply_tasks(&fired);
    }

    /// Stop every timer. Operations still work; nothing runs on its own.
    pub fn stop(&mut self) {
        self.scheduler.cancel_all();
    }

    fn apply_tasks(&mut self, fired: &[Task]) {
        for task in fired {
            let changed = match task {
                Task::Elapsed => {
                    logic::tick_elapsed(&mut self.session);
                    false
                }
                Task::AutoTap => logic::tick_auto_tap(&mut self.session),
                Task::TeamGrowth => {
                    logic::tick_team_growth(&mut self.session, &mut self.rng);
                    true
                }
                Task::NoticeExpiry => {
                    logic::expire_notice(&mut self.session);
                    false
                }
            };
            if changed {
                self.persist();
            }
        }
    }

    /// Auto-tap runs only while the upgrade is owned; the notice timer only
    /// while there is a notice to clear.
    fn sync_schedule(&mut self) {
        let auto_tap = self.session.game.upgrade_levels.auto_tap > 0;
        self.scheduler.keep_armed(Task::AutoTap, auto_tap);
        if self.session.notice.is_empty() {
            self.scheduler.disarm(Task::NoticeExpiry);
        }
    }

    /// Best-effort save. Failure is reported on the status line and retried
    /// on the next mutation; the in-memory state stays authoritative.
    fn persist(&mut self) {
        if let Err(e) = save::save_game(self.storage.as_mut(), &self.session.game) {
            warn!(error = %e, "save failed");
            self.session.set_event(STATUS_SAVE_FAILED);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clans::save::{MemoryStorage, STORAGE_KEY};
    use crate::clans::state::{TeamTable, NOTICE_SEASON_ENDED, NOTICE_TOO_FAST, WELCOME_MESSAGE};
    use crate::time::ManualClock;

    const START_MS: u64 = 1_700_000_000_000;

    fn settings() -> Settings {
        Settings {
            seed: Some(11),
            ..Settings::default()
        }
    }

    fn new_game() -> (ClansGame, MemoryStorage, ManualClock) {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(START_MS);
        let game = ClansGame::new(
            Box::new(storage.clone()),
            Box::new(clock.clone()),
            &settings(),
        );
        (game, storage, clock)
    }

    fn saved(storage: &MemoryStorage) -> GameState {
        save::from_json(&storage.get(STORAGE_KEY).unwrap()).unwrap()
    }

    #[test]
    fn fresh_game_has_defaults_and_no_save_yet() {
        let (game, storage, _) = new_game();
        assert_eq!(game.state(), &GameState::new());
        assert_eq!(game.session().last_event, WELCOME_MESSAGE);
        assert!(storage.get(STORAGE_KEY).is_none());
        assert!(!game.is_task_armed(Task::AutoTap));
    }

    #[test]
    fn every_successful_operation_saves() {
        let (mut game, storage, _) = new_game();
        game.tap();
        assert_eq!(saved(&storage).classic_clicks, 1);
        game.select_team(Team::OceanOwls);
        assert_eq!(saved(&storage).selected_team, Team::OceanOwls);
        game.claim_daily_reward();
        assert_eq!(saved(&storage).coins, 1 + 32);
    }

    #[test]
    fn corrupt_save_starts_fresh_with_status() {
        let storage = MemoryStorage::new();
        storage.insert(STORAGE_KEY, "not json at all");
        let game = ClansGame::new(
            Box::new(storage),
            Box::new(ManualClock::new(START_MS)),
            &settings(),
        );
        assert_eq!(game.state(), &GameState::new());
        assert_eq!(game.session().last_event, STATUS_LOAD_FAILED);
    }

    #[test]
    fn save_failure_is_reported_and_retried() {
        let (mut game, storage, _) = new_game();
        storage.set_fail_writes(true);
        game.tap();
        assert_eq!(game.state().classic_clicks, 1);
        assert_eq!(game.session().last_event, STATUS_SAVE_FAILED);
        assert!(storage.get(STORAGE_KEY).is_none());

        storage.set_fail_writes(false);
        game.tap();
        assert_eq!(saved(&storage).classic_clicks, 2);
    }

    #[test]
    fn rejected_operation_does_not_save() {
        let (mut game, storage, _) = new_game();
        assert!(!game.purchase_upgrade(UpgradeKind::PowerTap));
        assert!(!game.start_next_season());
        assert!(storage.get(STORAGE_KEY).is_none());
    }

    #[test]
    fn buying_auto_tap_arms_the_timer() {
        let (mut game, _, _) = new_game();
        for _ in 0..35 {
            game.tap();
        }
        assert!(game.purchase_upgrade(UpgradeKind::AutoTap));
        assert!(game.is_task_armed(Task::AutoTap));
        game.tick(10);
        assert_eq!(game.state().classic_clicks, 36);
        assert_eq!(game.state().coins, 1);
    }

    #[test]
    fn auto_tap_restored_from_save_runs_immediately() {
        let storage = MemoryStorage::new();
        let mut state = GameState::new();
        state.upgrade_levels.auto_tap = 2;
        storage.insert(STORAGE_KEY, &save::to_json(&state).unwrap());
        let mut game = ClansGame::new(
            Box::new(storage.clone()),
            Box::new(ManualClock::new(START_MS)),
            &settings(),
        );
        game.tick(30);
        assert_eq!(game.state().classic_clicks, 6);
        assert_eq!(saved(&storage).classic_clicks, 6);
    }

    #[test]
    fn too_fast_notice_expires() {
        let (mut game, _, clock) = new_game();
        game.set_mode(Mode::Multiplayer);
        assert!(game.tap().is_credited());
        clock.advance(30);
        assert_eq!(game.tap(), TapOutcome::TooFast);
        assert_eq!(game.session().notice, NOTICE_TOO_FAST);
        game.tick(11);
        assert_eq!(game.session().notice, NOTICE_TOO_FAST);
        game.tick(1);
        assert!(game.session().notice.is_empty());
    }

    #[test]
    fn repeated_notice_keeps_first_expiry() {
        let (mut game, _, clock) = new_game();
        game.set_mode(Mode::Multiplayer);
        game.tap();
        clock.advance(10);
        assert_eq!(game.tap(), TapOutcome::TooFast);
        game.tick(6);
        clock.advance(10);
        assert_eq!(game.tap(), TapOutcome::TooFast);
        game.tick(5);
        assert_eq!(game.session().notice, NOTICE_TOO_FAST);
        game.tick(1);
        assert!(game.session().notice.is_empty());
    }

    #[test]
    fn new_notice_restarts_expiry() {
        let mut state = GameState::new();
        state.mode = Mode::Multiplayer;
        state.team_scores = TeamTable([0, 0, 0, 1_200]);
        let storage = MemoryStorage::new();
        storage.insert(STORAGE_KEY, &save::to_json(&state).unwrap());
        let mut game = ClansGame::new(
            Box::new(storage),
            Box::new(ManualClock::new(START_MS)),
            &settings(),
        );
        game.session.notice = NOTICE_TOO_FAST.to_string();
        game.scheduler.arm(Task::NoticeExpiry);
        game.tick(6);
        assert_eq!(game.tap(), TapOutcome::SeasonOver);
        game.tick(11);
        assert_eq!(game.session().notice, NOTICE_SEASON_ENDED);
        game.tick(1);
        assert!(game.session().notice.is_empty());
    }

    #[test]
    fn team_growth_runs_in_classic_mode() {
        let (mut game, storage, _) = new_game();
        let before = game.state().team_scores;
        game.tick(25);
        let after = game.state().team_scores;
        for team in Team::all() {
            assert!(after[*team] > before[*team]);
        }
        assert_eq!(saved(&storage).team_scores, after);
        assert_eq!(game.session().elapsed_seconds, 2);
    }

    #[test]
    fn wall_clock_update_drives_ticks() {
        let (mut game, _, clock) = new_game();
        game.update();
        for _ in 0..10 {
            clock.advance(100);
            game.update();
        }
        assert_eq!(game.session().elapsed_seconds, 1);
    }

    #[test]
    fn stop_cancels_all_timers() {
        let (mut game, _, _) = new_game();
        game.stop();
        let before = game.session().clone();
        game.tick(100);
        assert_eq!(game.session(), &before);
    }

    #[test]
    fn season_rollover_through_store() {
        let storage = MemoryStorage::new();
        let mut state = GameState::new();
        state.team_scores = TeamTable([1200, 900, 800, 700]);
        storage.insert(STORAGE_KEY, &save::to_json(&state).unwrap());
        let mut game = ClansGame::new(
            Box::new(storage.clone()),
            Box::new(ManualClock::new(START_MS)),
            &settings(),
        );
        assert!(game.overview().season_complete);
        assert!(game.start_next_season());
        assert_eq!(game.state().coins, 120);
        assert_eq!(saved(&storage).season_number, 2);
        assert!(!game.overview().season_complete);
    }

    #[test]
    fn keys_and_clicks_dispatch() {
        let (mut game, _, _) = new_game();
        assert!(game.handle_input(&InputEvent::Key('t')));
        assert!(game.handle_input(&InputEvent::Click(TAP)));
        assert_eq!(game.state().classic_clicks, 2);

        assert!(game.handle_input(&InputEvent::Key('3')));
        assert_eq!(game.state().selected_team, Team::ForestFoxes);
        assert!(game.handle_input(&InputEvent::Click(SELECT_TEAM_BASE + 3)));
        assert_eq!(game.state().selected_team, Team::DesertDrifters);

        assert!(game.handle_input(&InputEvent::Click(MODE_MULTIPLAYER)));
        assert_eq!(game.state().mode, Mode::Multiplayer);
        assert!(game.handle_input(&InputEvent::Key('c')));
        assert_eq!(game.state().mode, Mode::Classic);

        assert!(!game.handle_input(&InputEvent::Key('z')));
        assert!(!game.handle_input(&InputEvent::Click(999)));
    }

    #[test]
    fn click_claims_prize_and_mission_by_index() {
        let (mut game, _, _) = new_game();
        for _ in 0..100 {
            game.tap();
        }
        // level 5
        assert!(game.handle_input(&InputEvent::Click(CLAIM_PRIZE_BASE)));
        assert!(game.handle_input(&InputEvent::Click(CLAIM_PRIZE_BASE + 1)));
        assert!(game.handle_input(&InputEvent::Click(CLAIM_MISSION_BASE)));
        assert_eq!(game.state().claimed_prize_levels, vec![2, 4]);
        assert_eq!(game.state().claimed_mission_ids, vec!["classic-100"]);
        assert_eq!(game.state().coins, 100 + 15 + 25 + 40);

        assert!(game.handle_input(&InputEvent::Click(BUY_UPGRADE_BASE)));
        assert_eq!(game.state().upgrade_levels.power_tap, 1);
    }
}

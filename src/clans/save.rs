//! Clicker Clans save/load.
//!
//! The snapshot is one flat JSON document under [`STORAGE_KEY`], field names
//! in camelCase. Loading never trusts the document's shape: it goes through
//! `serde_json::Value` and every field is validated on its own, falling back
//! to the new-game default when missing or mistyped. A broken field never
//! takes the rest of the save down with it.
//!
//! The storage key carries the format version. A breaking change gets a new
//! key rather than a migration.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::state::{
    DailyReward, GameState, Mode, Team, TeamTable, UpgradeKind, UpgradeLevels, MAX_COUNTER,
};
use crate::error::SaveError;

/// Storage key of the current save format.
pub const STORAGE_KEY: &str = "clicker_clans_save_v2";

/// A key/value backend for save snapshots.
pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>, SaveError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), SaveError>;
}

// ── Snapshot format ────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedState {
    mode: &'static str,
    total_clicks: u64,
    classic_clicks: u64,
    team_clicks: u64,
    coins: u64,
    selected_team: &'static str,
    team_scores: BTreeMap<&'static str, u64>,
    team_contribution: BTreeMap<&'static str, u64>,
    team_chest_consumed: BTreeMap<&'static str, u64>,
    upgrade_levels: BTreeMap<&'static str, u32>,
    claimed_prize_levels: Vec<u64>,
    claimed_mission_ids: Vec<String>,
    daily_reward: SavedDailyReward,
    season_number: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedDailyReward {
    last_claim_at_epoch_ms: u64,
    streak: u64,
}

fn team_map(table: &TeamTable) -> BTreeMap<&'static str, u64> {
    table.iter().map(|(team, v)| (team.name(), v)).collect()
}

fn extract_save(state: &GameState) -> SavedState {
    SavedState {
        mode: state.mode.key(),
        total_clicks: state.total_clicks,
        classic_clicks: state.classic_clicks,
        team_clicks: state.team_clicks,
        coins: state.coins,
        selected_team: state.selected_team.name(),
        team_scores: team_map(&state.team_scores),
        team_contribution: team_map(&state.team_contribution),
        team_chest_consumed: team_map(&state.team_chest_consumed),
        upgrade_levels: UpgradeKind::all()
            .iter()
            .map(|k| (k.key(), state.upgrade_levels.get(*k)))
            .collect(),
        claimed_prize_levels: state.claimed_prize_levels.clone(),
        claimed_mission_ids: state.claimed_mission_ids.clone(),
        daily_reward: SavedDailyReward {
            last_claim_at_epoch_ms: state.daily_reward.last_claim_at_ms,
            streak: state.daily_reward.streak,
        },
        season_number: state.season_number,
    }
}

/// Serialize a full snapshot of `state`.
pub fn to_json(state: &GameState) -> Result<String, SaveError> {
    Ok(serde_json::to_string(&extract_save(state))?)
}

// ── Sanitizing load ────────────────────────────────────────────

/// A non-negative integer out of any JSON number. Negative values clamp to
/// zero, fractions are floored. Anything that isn't a number is `None`.
/// A non-negative whole number, floored and clamped to [`MAX_COUNTER`].
fn safe_int(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    let n = if let Some(n) = value.as_u64() {
        n
    } else if let Some(n) = value.as_i64() {
        n.max(0) as u64
    } else {
        let f = value.as_f64()?;
        if !f.is_finite() {
            return None;
        }
        f.clamp(0.0, MAX_COUNTER as f64).floor() as u64
    };
    Some(n.min(MAX_COUNTER))
}

fn safe_team_table(value: Option<&Value>, fallback: TeamTable) -> TeamTable {
    let mut table = fallback;
    for team in Team::all() {
        if let Some(v) = safe_int(value.and_then(|m| m.get(team.name()))) {
            table[*team] = v;
        }
    }
    table
}

fn safe_upgrade_levels(value: Option<&Value>) -> UpgradeLevels {
    let mut levels = UpgradeLevels::default();
    for kind in UpgradeKind::all() {
        let raw = safe_int(value.and_then(|m| m.get(kind.key()))).unwrap_or(0);
        *levels.get_mut(*kind) = raw.min(kind.max_level() as u64) as u32;
    }
    levels
}

fn safe_prize_levels(value: Option<&Value>) -> Vec<u64> {
    let mut levels: Vec<u64> = Vec::new();
    for v in value.and_then(Value::as_array).into_iter().flatten() {
        match safe_int(Some(v)) {
            Some(level) if level > 0 && !levels.contains(&level) => levels.push(level),
            _ => {}
        }
    }
    levels
}

fn safe_mission_ids(value: Option<&Value>) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for v in value.and_then(Value::as_array).into_iter().flatten() {
        if let Some(id) = v.as_str() {
            if !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }
    }
    ids
}

/// Rebuild a `GameState` from an untrusted snapshot document.
pub fn sanitize(doc: &Value) -> GameState {
    let defaults = GameState::new();
    let field = |name: &str| doc.get(name);
    let count = |name: &str| safe_int(field(name)).unwrap_or(0);

    let team_contribution = safe_team_table(field("teamContribution"), TeamTable::zero());
    let mut team_chest_consumed = safe_team_table(field("teamChestConsumed"), TeamTable::zero());
    for team in Team::all() {
        team_chest_consumed[*team] = team_chest_consumed[*team].min(team_contribution[*team]);
    }

    let daily = field("dailyReward");
    let daily_reward = DailyReward {
        last_claim_at_ms: safe_int(
            daily
                .and_then(|d| d.get("lastClaimAtEpochMs"))
                .or_else(|| daily.and_then(|d| d.get("lastClaimAt"))),
        )
        .unwrap_or(0),
        streak: safe_int(daily.and_then(|d| d.get("streak"))).unwrap_or(0),
    };

    GameState {
        mode: field("mode")
            .and_then(Value::as_str)
            .and_then(Mode::from_key)
            .unwrap_or(defaults.mode),
        total_clicks: count("totalClicks"),
        classic_clicks: count("classicClicks"),
        team_clicks: count("teamClicks"),
        coins: count("coins"),
        selected_team: field("selectedTeam")
            .and_then(Value::as_str)
            .and_then(Team::from_name)
            .unwrap_or(defaults.selected_team),
        team_scores: safe_team_table(field("teamScores"), defaults.team_scores),
        team_contribution,
        team_chest_consumed,
        upgrade_levels: safe_upgrade_levels(field("upgradeLevels")),
        claimed_prize_levels: safe_prize_levels(
            field("claimedPrizeLevels").or_else(|| field("claimedPrizes")),
        ),
        claimed_mission_ids: safe_mission_ids(field("claimedMissionIds")),
        daily_reward,
        season_number: safe_int(field("seasonNumber")).unwrap_or(1).max(1),
    }
}

/// Parse a snapshot. Unparseable JSON and a bare `null` are errors; any
/// other document of the wrong shape yields defaults field by field.
pub fn from_json(json: &str) -> Result<GameState, SaveError> {
    let doc: Value = serde_json::from_str(json)?;
    if doc.is_null() {
        return Err(SaveError::NullSnapshot);
    }
    Ok(sanitize(&doc))
}

// ── Store-facing entry points ──────────────────────────────────

/// Result of trying to restore a save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing stored yet.
    NoSave,
    Restored,
    /// The save could not be read or parsed; defaults are in place.
    Corrupt,
}

/// Restore `state` from storage. Never fails: on any problem `state` is
/// left at whatever it was and `LoadStatus::Corrupt` is returned.
pub fn load_game(storage: &dyn Storage, state: &mut GameState) -> LoadStatus {
    let json = match storage.read(STORAGE_KEY) {
        Ok(Some(json)) if !json.trim().is_empty() => json,
        Ok(_) => return LoadStatus::NoSave,
        Err(e) => {
            warn!(error = %e, "could not read save");
            return LoadStatus::Corrupt;
        }
    };

    match from_json(&json) {
        Ok(restored) => {
            debug!(bytes = json.len(), "save restored");
            *state = restored;
            LoadStatus::Restored
        }
        Err(e) => {
            warn!(error = %e, "save data unreadable, starting fresh");
            LoadStatus::Corrupt
        }
    }
}

/// Write a full snapshot of `state`.
pub fn save_game(storage: &mut dyn Storage, state: &GameState) -> Result<(), SaveError> {
    let json = to_json(state)?;
    storage.write(STORAGE_KEY, &json)
}

// ── Backends ───────────────────────────────────────────────────

/// In-memory backend. Clones share the same entries, so a caller can keep a
/// handle to inspect what the game wrote.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    /// Make every following write fail, as a full disk or quota would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, SaveError> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SaveError> {
        if self.fail_writes.get() {
            return Err(SaveError::Rejected("write disabled".into()));
        }
        self.insert(key, value);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileStorage {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> std::path::PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, SaveError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SaveError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        // write-then-rename so a crash mid-write leaves the old save intact
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Browser localStorage.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, SaveError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(SaveError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>, SaveError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| SaveError::Rejected(format!("{e:?}")))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SaveError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| SaveError::Rejected(format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn busy_state() -> GameState {
        let mut state = GameState::new();
        state.mode = Mode::Multiplayer;
        state.total_clicks = 640;
        state.classic_clicks = 420;
        state.team_clicks = 220;
        state.coins = 1_337;
        state.selected_team = Team::ForestFoxes;
        state.team_scores = TeamTable([1010, 990, 1180, 870]);
        state.team_contribution = TeamTable([10, 0, 210, 0]);
        state.team_chest_consumed = TeamTable([0, 0, 150, 0]);
        state.upgrade_levels = UpgradeLevels { power_tap: 4, auto_tap: 2 };
        state.claimed_prize_levels = vec![2, 4, 6];
        state.claimed_mission_ids = vec!["upgrades-3".into(), "classic-100".into()];
        state.daily_reward = DailyReward { last_claim_at_ms: 1_700_000_000_000, streak: 5 };
        state.season_number = 3;
        state
    }

    #[test]
    fn extract_and_restore_roundtrip() {
        let original = busy_state();
        let json = to_json(&original).unwrap();
        let restored = from_json(&json).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn empty_state_roundtrip() {
        let original = GameState::new();
        let restored = from_json(&to_json(&original).unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn snapshot_uses_documented_field_names() {
        let doc: Value = serde_json::from_str(&to_json(&busy_state()).unwrap()).unwrap();
        for name in [
            "mode",
            "totalClicks",
            "classicClicks",
            "teamClicks",
            "coins",
            "selectedTeam",
            "teamScores",
            "teamContribution",
            "teamChestConsumed",
            "upgradeLevels",
            "claimedPrizeLevels",
            "claimedMissionIds",
            "dailyReward",
            "seasonNumber",
        ] {
            assert!(doc.get(name).is_some(), "missing field {name}");
        }
        assert_eq!(doc["mode"], "multiplayer");
        assert_eq!(doc["selectedTeam"], "Forest Foxes");
        assert_eq!(doc["teamScores"]["Ocean Owls"], 990);
        assert_eq!(doc["upgradeLevels"]["powerTap"], 4);
        assert_eq!(doc["dailyReward"]["lastClaimAtEpochMs"], 1_700_000_000_000u64);
    }

    #[test]
    fn missing_coins_defaults_to_zero() {
        let state = sanitize(&json!({ "totalClicks": 5 }));
        assert_eq!(state.coins, 0);
        assert_eq!(state.total_clicks, 5);
    }

    #[test]
    fn negative_and_fractional_numbers_are_clamped() {
        let state = sanitize(&json!({ "coins": -40, "classicClicks": 12.9, "teamClicks": "7" }));
        assert_eq!(state.coins, 0);
        assert_eq!(state.classic_clicks, 12);
        assert_eq!(state.team_clicks, 0);
    }

    #[test]
    fn unknown_mode_and_team_fall_back() {
        let state = sanitize(&json!({ "mode": "arcade", "selectedTeam": "Moon Moles" }));
        assert_eq!(state.mode, Mode::Classic);
        assert_eq!(state.selected_team, Team::SolarSquad);
    }

    #[test]
    fn team_maps_fill_missing_teams_per_entry() {
        let state = sanitize(&json!({
            "teamScores": { "Solar Squad": 500, "Ocean Owls": "lots", "Forest Foxes": -3 },
            "teamContribution": [1, 2, 3],
        }));
        assert_eq!(state.team_scores[Team::SolarSquad], 500);
        assert_eq!(state.team_scores[Team::OceanOwls], 90);
        assert_eq!(state.team_scores[Team::ForestFoxes], 0);
        assert_eq!(state.team_scores[Team::DesertDrifters], 130);
        assert_eq!(state.team_contribution, TeamTable::zero());
    }

    #[test]
    fn chest_consumed_clamped_to_contribution() {
        let state = sanitize(&json!({
            "teamContribution": { "Solar Squad": 60 },
            "teamChestConsumed": { "Solar Squad": 200, "Ocean Owls": 50 },
        }));
        assert_eq!(state.team_chest_consumed[Team::SolarSquad], 60);
        assert_eq!(state.team_chest_consumed[Team::OceanOwls], 0);
    }

    #[test]
    fn upgrade_levels_clamped_to_max() {
        let state = sanitize(&json!({ "upgradeLevels": { "powerTap": 99, "autoTap": 3 } }));
        assert_eq!(state.upgrade_levels.power_tap, 10);
        assert_eq!(state.upgrade_levels.auto_tap, 3);
    }

    #[test]
    fn claim_lists_are_filtered_and_deduplicated() {
        let state = sanitize(&json!({
            "claimedPrizeLevels": [2, 2, -4, 0, "6", 8.5, 4],
            "claimedMissionIds": ["team-120", 7, "team-120", "classic-100"],
        }));
        assert_eq!(state.claimed_prize_levels, vec![2, 8, 4]);
        assert_eq!(state.claimed_mission_ids, vec!["team-120", "classic-100"]);
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let state = sanitize(&json!({
            "claimedPrizes": [2, 4],
            "dailyReward": { "lastClaimAt": 123, "streak": 2 },
        }));
        assert_eq!(state.claimed_prize_levels, vec![2, 4]);
        assert_eq!(state.daily_reward.last_claim_at_ms, 123);
        assert_eq!(state.daily_reward.streak, 2);
    }

    #[test]
    fn season_number_is_at_least_one() {
        assert_eq!(sanitize(&json!({ "seasonNumber": 0 })).season_number, 1);
        assert_eq!(sanitize(&json!({ "seasonNumber": null })).season_number, 1);
        assert_eq!(sanitize(&json!({ "seasonNumber": 4 })).season_number, 4);
    }

    #[test]
    fn non_object_document_yields_defaults() {
        assert_eq!(sanitize(&json!([1, 2, 3])), GameState::new());
        assert_eq!(from_json("42").unwrap(), GameState::new());
    }

    #[test]
    fn unparseable_json_is_an_error() {
        assert!(matches!(from_json("{ not json"), Err(SaveError::Json(_))));
    }

    #[test]
    fn null_document_is_an_error() {
        assert!(matches!(from_json("null"), Err(SaveError::NullSnapshot)));
        assert!(matches!(from_json(" null "), Err(SaveError::NullSnapshot)));
    }

    #[test]
    fn huge_numbers_are_clamped() {
        let state = sanitize(&json!({
            "coins": 1e300,
            "totalClicks": u64::MAX,
            "teamScores": { "Ocean Owls": u64::MAX },
            "dailyReward": { "lastClaimAtEpochMs": 1e20, "streak": 9.9e18 },
            "seasonNumber": u64::MAX,
        }));
        assert_eq!(state.coins, MAX_COUNTER);
        assert_eq!(state.total_clicks, MAX_COUNTER);
        assert_eq!(state.team_scores[Team::OceanOwls], MAX_COUNTER);
        assert_eq!(state.daily_reward.last_claim_at_ms, MAX_COUNTER);
        assert_eq!(state.daily_reward.streak, MAX_COUNTER);
        assert_eq!(state.season_number, MAX_COUNTER);
    }

    #[test]
    fn load_game_statuses() {
        let storage = MemoryStorage::new();
        let mut state = GameState::new();
        assert_eq!(load_game(&storage, &mut state), LoadStatus::NoSave);

        storage.insert(STORAGE_KEY, "");
        assert_eq!(load_game(&storage, &mut state), LoadStatus::NoSave);

        storage.insert(STORAGE_KEY, "}}}");
        assert_eq!(load_game(&storage, &mut state), LoadStatus::Corrupt);
        assert_eq!(state, GameState::new());

        storage.insert(STORAGE_KEY, "null");
        assert_eq!(load_game(&storage, &mut state), LoadStatus::Corrupt);
        assert_eq!(state, GameState::new());

        storage.insert(STORAGE_KEY, &to_json(&busy_state()).unwrap());
        assert_eq!(load_game(&storage, &mut state), LoadStatus::Restored);
        assert_eq!(state, busy_state());
    }

    #[test]
    fn save_game_reports_rejected_write() {
        let mut storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        assert!(save_game(&mut storage, &GameState::new()).is_err());
        assert!(storage.get(STORAGE_KEY).is_none());
        storage.set_fail_writes(false);
        assert!(save_game(&mut storage, &GameState::new()).is_ok());
        assert!(storage.get(STORAGE_KEY).is_some());
    }

    #[test]
    fn memory_storage_clones_share_entries() {
        let a = MemoryStorage::new();
        let mut b = a.clone();
        b.write("k", "v").unwrap();
        assert_eq!(a.get("k").as_deref(), Some("v"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn file_storage_roundtrip() {
        let dir = std::env::temp_dir().join(format!("clicker-clans-test-{}", std::process::id()));
        let mut storage = FileStorage::new(&dir);
        assert!(storage.read(STORAGE_KEY).unwrap().is_none());
        save_game(&mut storage, &busy_state()).unwrap();
        let mut state = GameState::new();
        assert_eq!(load_game(&storage, &mut state), LoadStatus::Restored);
        assert_eq!(state, busy_state());
        let _ = std::fs::remove_dir_all(&dir);
    }
}

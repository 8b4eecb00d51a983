/// Clicker Clans game state and static reference data.

/// Classic clicks needed per player level.
pub const LEVEL_SIZE: u64 = 25;
/// One day in milliseconds.
pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;
/// Minimum gap between accepted multiplayer taps.
pub const TAP_COOLDOWN_MS: u64 = 90;
/// Personally contributed team taps per chest.
pub const TEAM_CHEST_STEP: u64 = 50;
/// Score that ends a season once any team reaches it.
pub const SEASON_TARGET: u64 = 1200;
/// Team score per team level.
pub const TEAM_LEVEL_SIZE: u64 = 250;
/// Leader gap beyond which a trailing team gets a catch-up point.
pub const TRAILING_GAP: u64 = 80;
/// Ceiling for any counter restored from a save (2^53 - 1, the largest
/// integer a JSON number holds exactly).
pub const MAX_COUNTER: u64 = (1 << 53) - 1;

pub const WELCOME_MESSAGE: &str = "Welcome to Clicker Clans.";
pub const NOTICE_SEASON_ENDED: &str = "Season ended. Start the next season to keep competing.";
pub const NOTICE_TOO_FAST: &str = "Too fast. Fair play guard skipped that tap.";
pub const STATUS_LOAD_FAILED: &str = "Could not load previous save, starting fresh.";
pub const STATUS_SAVE_FAILED: &str = "Could not save progress this round.";

/// Which interaction surface is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Classic,
    Multiplayer,
}

impl Mode {
    /// Snapshot value.
    pub fn key(&self) -> &'static str {
        match self {
            Mode::Classic => "classic",
            Mode::Multiplayer => "multiplayer",
        }
    }

    pub fn from_key(key: &str) -> Option<Mode> {
        match key {
            "classic" => Some(Mode::Classic),
            "multiplayer" => Some(Mode::Multiplayer),
            _ => None,
        }
    }
}

/// The fixed team roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Team {
    #[default]
    SolarSquad,
    OceanOwls,
    ForestFoxes,
    DesertDrifters,
}

pub const TEAM_COUNT: usize = 4;

impl Team {
    /// All teams in roster order.
    pub fn all() -> &'static [Team; TEAM_COUNT] {
        &[
            Team::SolarSquad,
            Team::OceanOwls,
            Team::ForestFoxes,
            Team::DesertDrifters,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Team::SolarSquad => "Solar Squad",
            Team::OceanOwls => "Ocean Owls",
            Team::ForestFoxes => "Forest Foxes",
            Team::DesertDrifters => "Desert Drifters",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Team::SolarSquad => 0,
            Team::OceanOwls => 1,
            Team::ForestFoxes => 2,
            Team::DesertDrifters => 3,
        }
    }

    pub fn from_name(name: &str) -> Option<Team> {
        Team::all().iter().copied().find(|t| t.name() == name)
    }
}

/// A value per team. Every team always has an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TeamTable(pub [u64; TEAM_COUNT]);

impl TeamTable {
    pub fn zero() -> Self {
        Self([0; TEAM_COUNT])
    }

    /// Scores a fresh save starts with: 70, 90, 110, 130.
    pub fn initial_scores() -> Self {
        let mut table = Self::zero();
        for team in Team::all() {
            table[*team] = 70 + team.index() as u64 * 20;
        }
        table
    }

    pub fn iter(&self) -> impl Iterator<Item = (Team, u64)> + '_ {
        Team::all().iter().map(move |t| (*t, self[*t]))
    }

    pub fn max(&self) -> u64 {
        self.0.iter().copied().max().unwrap_or(0)
    }
}

impl std::ops::Index<Team> for TeamTable {
    type Output = u64;

    fn index(&self, team: Team) -> &u64 {
        &self.0[team.index()]
    }
}

impl std::ops::IndexMut<Team> for TeamTable {
    fn index_mut(&mut self, team: Team) -> &mut u64 {
        &mut self.0[team.index()]
    }
}

/// Purchasable upgrades.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpgradeKind {
    PowerTap,
    AutoTap,
}

impl UpgradeKind {
    pub fn all() -> &'static [UpgradeKind] {
        &[UpgradeKind::PowerTap, UpgradeKind::AutoTap]
    }

    /// Snapshot key.
    pub fn key(&self) -> &'static str {
        match self {
            UpgradeKind::PowerTap => "powerTap",
            UpgradeKind::AutoTap => "autoTap",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UpgradeKind::PowerTap => "Power Tap",
            UpgradeKind::AutoTap => "Auto Tapper",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            UpgradeKind::PowerTap => "+1 click per tap in Classic mode",
            UpgradeKind::AutoTap => "+1 passive click per second in Classic mode",
        }
    }

    pub fn base_cost(&self) -> u64 {
        match self {
            UpgradeKind::PowerTap => 20,
            UpgradeKind::AutoTap => 35,
        }
    }

    pub fn max_level(&self) -> u32 {
        match self {
            UpgradeKind::PowerTap => 10,
            UpgradeKind::AutoTap => 8,
        }
    }
}

/// Current level of every upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct UpgradeLevels {
    pub power_tap: u32,
    pub auto_tap: u32,
}

impl UpgradeLevels {
    pub fn get(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::PowerTap => self.power_tap,
            UpgradeKind::AutoTap => self.auto_tap,
        }
    }

    pub fn get_mut(&mut self, kind: UpgradeKind) -> &mut u32 {
        match kind {
            UpgradeKind::PowerTap => &mut self.power_tap,
            UpgradeKind::AutoTap => &mut self.auto_tap,
        }
    }

    /// Combined levels across all upgrades.
    pub fn total(&self) -> u32 {
        self.power_tap + self.auto_tap
    }
}

/// A level-gated one-time prize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prize {
    pub level: u64,
    pub name: &'static str,
    pub reward_coins: u64,
}

pub const PRIZES: [Prize; 6] = [
    Prize { level: 2, name: "Bronze Capsule", reward_coins: 15 },
    Prize { level: 4, name: "Lucky Crate", reward_coins: 25 },
    Prize { level: 6, name: "Silver Beacon", reward_coins: 45 },
    Prize { level: 8, name: "Gold Relic", reward_coins: 70 },
    Prize { level: 10, name: "Champion Medal", reward_coins: 95 },
    Prize { level: 12, name: "Legend Crown", reward_coins: 130 },
];

pub fn find_prize(level: u64) -> Option<&'static Prize> {
    PRIZES.iter().find(|p| p.level == level)
}

/// What a mission measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissionSource {
    ClassicClicks,
    UpgradeLevels,
    TeamClicks,
}

/// A one-time goal with a coin reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mission {
    pub id: &'static str,
    pub label: &'static str,
    pub source: MissionSource,
    pub target: u64,
    pub reward: u64,
}

pub const MISSIONS: [Mission; 3] = [
    Mission {
        id: "classic-100",
        label: "Reach 100 Classic clicks",
        source: MissionSource::ClassicClicks,
        target: 100,
        reward: 40,
    },
    Mission {
        id: "upgrades-3",
        label: "Buy 3 total upgrades",
        source: MissionSource::UpgradeLevels,
        target: 3,
        reward: 50,
    },
    Mission {
        id: "team-120",
        label: "Contribute 120 multiplayer taps",
        source: MissionSource::TeamClicks,
        target: 120,
        reward: 70,
    },
];

pub fn find_mission(id: &str) -> Option<&'static Mission> {
    MISSIONS.iter().find(|m| m.id == id)
}

/// Daily login reward tracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DailyReward {
    /// Epoch ms of the last claim, 0 when never claimed.
    pub last_claim_at_ms: u64,
    pub streak: u64,
}

/// Persisted progress. Everything here ends up in the save snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub mode: Mode,
    pub total_clicks: u64,
    pub classic_clicks: u64,
    pub team_clicks: u64,
    pub coins: u64,
    pub selected_team: Team,
    pub team_scores: TeamTable,
    /// Taps the player personally added per team this season.
    pub team_contribution: TeamTable,
    /// Portion of `team_contribution` already redeemed through chests.
    pub team_chest_consumed: TeamTable,
    pub upgrade_levels: UpgradeLevels,
    /// Claimed prize levels in claim order, no duplicates.
    pub claimed_prize_levels: Vec<u64>,
    /// Claimed mission ids in claim order, no duplicates.
    pub claimed_mission_ids: Vec<String>,
    pub daily_reward: DailyReward,
    pub season_number: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            mode: Mode::Classic,
            total_clicks: 0,
            classic_clicks: 0,
            team_clicks: 0,
            coins: 0,
            selected_team: Team::SolarSquad,
            team_scores: TeamTable::initial_scores(),
            team_contribution: TeamTable::zero(),
            team_chest_consumed: TeamTable::zero(),
            upgrade_levels: UpgradeLevels::default(),
            claimed_prize_levels: Vec::new(),
            claimed_mission_ids: Vec::new(),
            daily_reward: DailyReward::default(),
            season_number: 1,
        }
    }

    pub fn has_claimed_prize(&self, level: u64) -> bool {
        self.claimed_prize_levels.contains(&level)
    }

    pub fn has_claimed_mission(&self, id: &str) -> bool {
        self.claimed_mission_ids.iter().any(|m| m == id)
    }
}

/// One play session: the persisted state plus fields that live only while
/// the game is running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub game: GameState,
    /// Seconds since the session started.
    pub elapsed_seconds: u64,
    /// Transient fair-play / season notice; empty when none is shown.
    pub notice: String,
    /// Epoch ms of the last accepted multiplayer tap.
    pub last_tap_at_ms: u64,
    /// One-line status banner.
    pub last_event: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(GameState::new())
    }
}

impl Session {
    pub fn new(game: GameState) -> Self {
        Self {
            game,
            elapsed_seconds: 0,
            notice: String::new(),
            last_tap_at_ms: 0,
            last_event: WELCOME_MESSAGE.to_string(),
        }
    }

    pub fn set_event(&mut self, text: impl Into<String>) {
        self.last_event = text.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_defaults() {
        let state = GameState::new();
        assert_eq!(state.mode, Mode::Classic);
        assert_eq!(state.selected_team, Team::SolarSquad);
        assert_eq!(state.season_number, 1);
        assert_eq!(state.team_scores.0, [70, 90, 110, 130]);
        assert_eq!(state.team_contribution, TeamTable::zero());
        assert_eq!(state.daily_reward.last_claim_at_ms, 0);
    }

    #[test]
    fn team_names_round_trip() {
        for team in Team::all() {
            assert_eq!(Team::from_name(team.name()), Some(*team));
        }
        assert_eq!(Team::from_name("Moon Moles"), None);
    }

    #[test]
    fn team_table_indexing() {
        let mut table = TeamTable::zero();
        table[Team::ForestFoxes] = 12;
        assert_eq!(table.0[2], 12);
        assert_eq!(table.max(), 12);
        let collected: Vec<_> = table.iter().collect();
        assert_eq!(collected[2], (Team::ForestFoxes, 12));
    }

    #[test]
    fn mode_keys() {
        assert_eq!(Mode::from_key(Mode::Multiplayer.key()), Some(Mode::Multiplayer));
        assert_eq!(Mode::from_key("arcade"), None);
    }

    #[test]
    fn reference_tables_are_unique() {
        for (i, a) in PRIZES.iter().enumerate() {
            assert!(PRIZES.iter().skip(i + 1).all(|b| b.level != a.level));
        }
        assert!(find_mission("team-120").is_some());
        assert!(find_prize(6).is_some());
        assert!(find_prize(7).is_none());
    }

    #[test]
    fn session_starts_with_welcome() {
        let session = Session::default();
        assert_eq!(session.last_event, WELCOME_MESSAGE);
        assert!(session.notice.is_empty());
    }
}

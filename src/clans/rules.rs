//! Economy rules and derived values as pure functions over `GameState`.
//!
//! Nothing in here mutates. The store calls these to validate operations,
//! and the presentation layer reads them through [`Overview`].

use super::state::{
    DailyReward, GameState, Mission, MissionSource, Prize, Session, Team, UpgradeKind, DAY_MS,
    LEVEL_SIZE, MISSIONS, PRIZES, SEASON_TARGET, TEAM_CHEST_STEP, TEAM_LEVEL_SIZE,
};

/// Clicks credited per Classic tap.
pub fn tap_power(state: &GameState) -> u64 {
    1 + state.upgrade_levels.power_tap as u64
}

/// Player level, starting at 1.
pub fn level(classic_clicks: u64) -> u64 {
    classic_clicks / LEVEL_SIZE + 1
}

/// Fraction of the way to the next level, in `[0, 1)`.
pub fn level_progress(classic_clicks: u64) -> f64 {
    (classic_clicks % LEVEL_SIZE) as f64 / LEVEL_SIZE as f64
}

pub fn clicks_to_next_level(classic_clicks: u64) -> u64 {
    LEVEL_SIZE - classic_clicks % LEVEL_SIZE
}

// ── Upgrades ───────────────────────────────────────────────────

/// Price of the next level: `base_cost × (current_level + 1)`.
pub fn upgrade_cost(kind: UpgradeKind, current_level: u32) -> u64 {
    kind.base_cost() * (current_level as u64 + 1)
}

pub fn is_upgrade_maxed(state: &GameState, kind: UpgradeKind) -> bool {
    state.upgrade_levels.get(kind) >= kind.max_level()
}

pub fn can_purchase_upgrade(state: &GameState, kind: UpgradeKind) -> bool {
    let current = state.upgrade_levels.get(kind);
    current < kind.max_level() && state.coins >= upgrade_cost(kind, current)
}

// ── Prizes & missions ──────────────────────────────────────────

pub fn is_prize_unlocked(state: &GameState, prize: &Prize) -> bool {
    level(state.classic_clicks) >= prize.level
}

pub fn can_claim_prize(state: &GameState, prize_level: u64) -> bool {
    level(state.classic_clicks) >= prize_level && !state.has_claimed_prize(prize_level)
}

pub fn mission_progress(state: &GameState, mission: &Mission) -> u64 {
    match mission.source {
        MissionSource::ClassicClicks => state.classic_clicks,
        MissionSource::UpgradeLevels => state.upgrade_levels.total() as u64,
        MissionSource::TeamClicks => state.team_clicks,
    }
}

pub fn is_mission_done(state: &GameState, mission: &Mission) -> bool {
    mission_progress(state, mission) >= mission.target
}

pub fn can_claim_mission(state: &GameState, mission: &Mission) -> bool {
    is_mission_done(state, mission) && !state.has_claimed_mission(mission.id)
}

// ── Daily reward ───────────────────────────────────────────────

pub fn can_claim_daily(daily: &DailyReward, now_ms: u64) -> bool {
    daily.last_claim_at_ms == 0 || now_ms.saturating_sub(daily.last_claim_at_ms) >= DAY_MS
}

/// Milliseconds until the next daily claim opens; 0 when claimable.
pub fn next_daily_in(daily: &DailyReward, now_ms: u64) -> u64 {
    if can_claim_daily(daily, now_ms) {
        0
    } else {
        DAY_MS - now_ms.saturating_sub(daily.last_claim_at_ms)
    }
}

/// Streak after claiming at `now_ms`. A previous claim under 48h old
/// continues the streak; anything else starts over at 1.
pub fn next_streak(daily: &DailyReward, now_ms: u64) -> u64 {
    let streaking = daily.last_claim_at_ms > 0
        && now_ms.saturating_sub(daily.last_claim_at_ms) < DAY_MS * 2;
    if streaking {
        daily.streak.saturating_add(1)
    } else {
        1
    }
}

pub fn daily_reward_amount(streak: u64) -> u64 {
    streak.saturating_mul(7).saturating_add(25)
}

// ── Teams & seasons ────────────────────────────────────────────

pub fn team_level(score: u64) -> u64 {
    score / TEAM_LEVEL_SIZE + 1
}

pub fn selected_team_level(state: &GameState) -> u64 {
    team_level(state.team_scores[state.selected_team])
}

/// Whole chests banked for the selected team.
pub fn chest_claims_ready(state: &GameState) -> u64 {
    let team = state.selected_team;
    state.team_contribution[team].saturating_sub(state.team_chest_consumed[team]) / TEAM_CHEST_STEP
}

pub fn can_claim_team_chest(state: &GameState) -> bool {
    chest_claims_ready(state) >= 1
}

pub fn team_chest_reward(state: &GameState) -> u64 {
    35 + selected_team_level(state) * 5
}

/// Teams ordered by score, highest first. Ties keep roster order.
pub fn team_rankings(state: &GameState) -> Vec<(Team, u64)> {
    let mut ranked: Vec<(Team, u64)> = state.team_scores.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

pub fn season_leader(state: &GameState) -> (Team, u64) {
    team_rankings(state)
        .first()
        .copied()
        .unwrap_or((Team::SolarSquad, 0))
}

/// 1-based rank of the selected team.
pub fn selected_team_rank(state: &GameState) -> usize {
    team_rankings(state)
        .iter()
        .position(|(t, _)| *t == state.selected_team)
        .map_or(0, |i| i + 1)
}

pub fn is_season_complete(state: &GameState) -> bool {
    state.team_scores.max() >= SEASON_TARGET
}

/// Selected team's share of the season target, capped at 1.
pub fn season_progress(state: &GameState) -> f64 {
    let score = state.team_scores[state.selected_team] as f64;
    (score / SEASON_TARGET as f64).min(1.0)
}

/// Coins granted when the season rolls over.
pub fn season_bonus(state: &GameState) -> u64 {
    if season_leader(state).0 == state.selected_team {
        120
    } else {
        50
    }
}

// ── Trophies ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trophy {
    pub name: &'static str,
    pub unlocked: bool,
}

/// Read-only achievement flags. Trophies are never claimed.
pub fn trophies(session: &Session) -> [Trophy; 7] {
    let game = &session.game;
    let lvl = level(game.classic_clicks);
    let t = |name, unlocked| Trophy { name, unlocked };
    [
        t("First Spark", game.classic_clicks >= 10),
        t(
            "Builder",
            game.upgrade_levels.power_tap >= 3 || game.upgrade_levels.auto_tap >= 2,
        ),
        t("Prize Hunter", game.claimed_prize_levels.len() >= 3),
        t("Mission Runner", game.claimed_mission_ids.len() >= 3),
        t(
            "Steady Tapper",
            session.elapsed_seconds >= 180 && game.classic_clicks >= 120,
        ),
        t("Legend Seed", lvl >= 10),
        t("Team Player", game.team_clicks >= 70),
    ]
}

// ── Formatting ─────────────────────────────────────────────────

/// `HH:MM`, rounding seconds up.
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms.div_ceil(1000);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    format!("{:02}:{:02}", hours, minutes)
}

/// `MM:SS` session timer.
pub fn format_session_time(elapsed_seconds: u64) -> String {
    format!("{:02}:{:02}", elapsed_seconds / 60, elapsed_seconds % 60)
}

// ── Read model ─────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeView {
    pub kind: UpgradeKind,
    pub level: u32,
    pub cost: u64,
    pub maxed: bool,
    pub affordable: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrizeView {
    pub prize: Prize,
    pub unlocked: bool,
    pub claimed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MissionView {
    pub mission: Mission,
    /// Progress capped at the target, as shown on screen.
    pub shown_progress: u64,
    pub done: bool,
    pub claimed: bool,
}

/// Everything the presentation layer needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Overview<'a> {
    pub session: &'a Session,
    pub tap_power: u64,
    pub level: u64,
    pub level_progress: f64,
    pub clicks_to_next_level: u64,
    pub session_time: String,
    pub upgrades: Vec<UpgradeView>,
    pub prizes: Vec<PrizeView>,
    pub missions: Vec<MissionView>,
    pub trophies: [Trophy; 7],
    pub can_claim_daily: bool,
    pub next_daily_in: String,
    pub rankings: Vec<(Team, u64)>,
    pub selected_team_rank: usize,
    pub selected_team_level: u64,
    pub season_progress: f64,
    pub season_leader: (Team, u64),
    pub season_complete: bool,
    pub chest_claims_ready: u64,
    pub team_chest_reward: u64,
}

impl<'a> Overview<'a> {
    pub fn compute(session: &'a Session, now_ms: u64) -> Self {
        let game = &session.game;
        let upgrades = UpgradeKind::all()
            .iter()
            .map(|kind| {
                let lvl = game.upgrade_levels.get(*kind);
                let cost = upgrade_cost(*kind, lvl);
                UpgradeView {
                    kind: *kind,
                    level: lvl,
                    cost,
                    maxed: lvl >= kind.max_level(),
                    affordable: game.coins >= cost,
                }
            })
            .collect();
        let prizes = PRIZES
            .iter()
            .map(|p| PrizeView {
                prize: *p,
                unlocked: is_prize_unlocked(game, p),
                claimed: game.has_claimed_prize(p.level),
            })
            .collect();
        let missions = MISSIONS
            .iter()
            .map(|m| MissionView {
                mission: *m,
                shown_progress: mission_progress(game, m).min(m.target),
                done: is_mission_done(game, m),
                claimed: game.has_claimed_mission(m.id),
            })
            .collect();

        Self {
            session,
            tap_power: tap_power(game),
            level: level(game.classic_clicks),
            level_progress: level_progress(game.classic_clicks),
            clicks_to_next_level: clicks_to_next_level(game.classic_clicks),
            session_time: format_session_time(session.elapsed_seconds),
            upgrades,
            prizes,
            missions,
            trophies: trophies(session),
            can_claim_daily: can_claim_daily(&game.daily_reward, now_ms),
            next_daily_in: format_duration(next_daily_in(&game.daily_reward, now_ms)),
            rankings: team_rankings(game),
            selected_team_rank: selected_team_rank(game),
            selected_team_level: selected_team_level(game),
            season_progress: season_progress(game),
            season_leader: season_leader(game),
            season_complete: is_season_complete(game),
            chest_claims_ready: chest_claims_ready(game),
            team_chest_reward: team_chest_reward(game),
        }
    }
}

//! Clicker Clans operations. Every mutation of a `Session` goes through here.
//!
//! Operations are total: either they apply completely and return `true`
//! (or a credited outcome), or they leave the session untouched.

use rand::Rng;
use tracing::{debug, info};

use super::rules;
use super::state::{
    find_mission, find_prize, Mode, Session, Team, TeamTable, UpgradeKind, NOTICE_SEASON_ENDED,
    NOTICE_TOO_FAST, TAP_COOLDOWN_MS, TEAM_CHEST_STEP, TRAILING_GAP,
};

/// What happened to a single tap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    /// Clicks credited to the player.
    Credited(u64),
    /// Multiplayer tap while the season is already decided.
    SeasonOver,
    /// Multiplayer tap inside the fair-play cooldown.
    TooFast,
}

impl TapOutcome {
    pub fn is_credited(&self) -> bool {
        matches!(self, TapOutcome::Credited(_))
    }
}

/// Main tap button for the active mode.
pub fn tap(session: &mut Session, now_ms: u64) -> TapOutcome {
    let game = &mut session.game;
    if game.mode == Mode::Classic {
        let power = rules::tap_power(game);
        game.total_clicks = game.total_clicks.saturating_add(power);
        game.classic_clicks = game.classic_clicks.saturating_add(power);
        game.coins = game.coins.saturating_add(power);
        return TapOutcome::Credited(power);
    }

    if rules::is_season_complete(game) {
        session.notice = NOTICE_SEASON_ENDED.to_string();
        return TapOutcome::SeasonOver;
    }

    // saturating: a wall clock that steps backwards must not lock the player out
    if session.last_tap_at_ms != 0 && now_ms.saturating_sub(session.last_tap_at_ms) < TAP_COOLDOWN_MS
    {
        session.notice = NOTICE_TOO_FAST.to_string();
        return TapOutcome::TooFast;
    }

    session.last_tap_at_ms = now_ms;
    let team = game.selected_team;
    game.total_clicks = game.total_clicks.saturating_add(1);
    game.team_clicks = game.team_clicks.saturating_add(1);
    game.team_scores[team] = game.team_scores[team].saturating_add(1);
    game.team_contribution[team] = game.team_contribution[team].saturating_add(1);
    TapOutcome::Credited(1)
}

/// Switch teams. Cooldown and per-team contribution are kept.
pub fn select_team(session: &mut Session, team: Team) {
    session.game.selected_team = team;
}

pub fn set_mode(session: &mut Session, mode: Mode) {
    session.game.mode = mode;
}

/// Try to buy the next level of an upgrade. Returns true if successful.
pub fn purchase_upgrade(session: &mut Session, kind: UpgradeKind) -> bool {
    let game = &mut session.game;
    if !rules::can_purchase_upgrade(game, kind) {
        return false;
    }
    let current = game.upgrade_levels.get(kind);
    let cost = rules::upgrade_cost(kind, current);
    game.coins -= cost;
    *game.upgrade_levels.get_mut(kind) = current + 1;
    debug!(upgrade = kind.key(), level = current + 1, cost, "upgrade purchased");
    session.set_event(format!("Upgraded {} to level {}.", kind.label(), current + 1));
    true
}

/// Claim the prize for a level threshold. Returns true if successful.
pub fn claim_prize(session: &mut Session, prize_level: u64) -> bool {
    let prize = match find_prize(prize_level) {
        Some(p) => p,
        None => return false,
    };
    if !rules::can_claim_prize(&session.game, prize.level) {
        return false;
    }
    session.game.claimed_prize_levels.push(prize.level);
    session.game.coins = session.game.coins.saturating_add(prize.reward_coins);
    session.set_event(format!(
        "Claimed level {} prize for +{} coins.",
        prize.level, prize.reward_coins
    ));
    true
}

/// Claim a completed mission. Returns true if successful.
pub fn claim_mission(session: &mut Session, mission_id: &str) -> bool {
    let mission = match find_mission(mission_id) {
        Some(m) => m,
        None => return false,
    };
    if !rules::can_claim_mission(&session.game, mission) {
        return false;
    }
    session.game.claimed_mission_ids.push(mission.id.to_string());
    session.game.coins = session.game.coins.saturating_add(mission.reward);
    session.set_event(format!("Mission complete: +{} coins.", mission.reward));
    true
}

/// Claim today's login reward. Returns true if successful.
pub fn claim_daily_reward(session: &mut Session, now_ms: u64) -> bool {
    let daily = session.game.daily_reward;
    if !rules::can_claim_daily(&daily, now_ms) {
        return false;
    }
    let streak = rules::next_streak(&daily, now_ms);
    let reward = rules::daily_reward_amount(streak);
    session.game.daily_reward.last_claim_at_ms = now_ms;
    session.game.daily_reward.streak = streak;
    session.game.coins = session.game.coins.saturating_add(reward);
    session.set_event(format!(
        "Daily reward claimed: +{} coins (streak {}).",
        reward, streak
    ));
    true
}

/// Open one chest for the selected team. Exactly one step is consumed per
/// call even when several are banked.
pub fn claim_team_chest(session: &mut Session) -> bool {
    if !rules::can_claim_team_chest(&session.game) {
        return false;
    }
    let reward = rules::team_chest_reward(&session.game);
    let team = session.game.selected_team;
    let game = &mut session.game;
    game.coins = game.coins.saturating_add(reward);
    let consumed = &mut game.team_chest_consumed[team];
    *consumed = consumed.saturating_add(TEAM_CHEST_STEP);
    session.set_event(format!("{} chest opened for +{} coins.", team.name(), reward));
    true
}

/// Fresh leaderboard for a new season: `95 + index × 15 + rand[0, 19]`.
pub fn season_baseline_scores(rng: &mut impl Rng) -> TeamTable {
    let mut table = TeamTable::zero();
    for team in Team::all() {
        table[*team] = 95 + team.index() as u64 * 15 + rng.gen_range(0..20);
    }
    table
}

/// Close a finished season and open the next. Returns true if successful.
pub fn start_next_season(session: &mut Session, rng: &mut impl Rng) -> bool {
    if !rules::is_season_complete(&session.game) {
        return false;
    }
    let closed = session.game.season_number;
    let (winner, _) = rules::season_leader(&session.game);
    let bonus = rules::season_bonus(&session.game);

    let game = &mut session.game;
    game.coins = game.coins.saturating_add(bonus);
    game.season_number = game.season_number.saturating_add(1);
    game.team_scores = season_baseline_scores(rng);
    game.team_contribution = TeamTable::zero();
    game.team_chest_consumed = TeamTable::zero();
    session.notice.clear();

    info!(season = closed, winner = winner.name(), bonus, "season rolled over");
    session.set_event(format!(
        "Season {} ended. {} won. New season started (+{} coins).",
        closed,
        winner.name(),
        bonus
    ));
    true
}

// ── Tick transitions ───────────────────────────────────────────

/// Session timer, once per second.
pub fn tick_elapsed(session: &mut Session) {
    session.elapsed_seconds = session.elapsed_seconds.saturating_add(1);
}

/// Passive Classic clicks, once per second. Returns true if anything changed.
pub fn tick_auto_tap(session: &mut Session) -> bool {
    let game = &mut session.game;
    let level = game.upgrade_levels.auto_tap as u64;
    if level == 0 {
        return false;
    }
    game.classic_clicks = game.classic_clicks.saturating_add(level);
    game.total_clicks = game.total_clicks.saturating_add(level);
    game.coins = game.coins.saturating_add(level);
    true
}

/// Passive leaderboard growth, every 2.5 seconds.
///
/// Every team gains 1–3 points, +1 when more than 80 behind the leader,
/// and the selected team may gain one more. Runs regardless of mode or
/// whether the season is already decided.
pub fn tick_team_growth(session: &mut Session, rng: &mut impl Rng) {
    let game = &mut session.game;
    let before = game.team_scores;
    let leader = before.max();
    for team in Team::all() {
        let base_boost = rng.gen_range(1..=3);
        let trailing_boost = u64::from(leader.saturating_sub(before[*team]) > TRAILING_GAP);
        let selected_boost = if *team == game.selected_team {
            rng.gen_range(0..=1)
        } else {
            0
        };
        game.team_scores[*team] =
            game.team_scores[*team].saturating_add(base_boost + trailing_boost + selected_boost);
    }
}

/// Clear the transient notice.
pub fn expire_notice(session: &mut Session) -> bool {
    if session.notice.is_empty() {
        return false;
    }
    session.notice.clear();
    true
}

//! Semantic action IDs for Clicker Clans buttons.
//!
//! The presentation layer registers its buttons with these IDs and sends
//! them back as `InputEvent::Click`.

// ── Core actions ────────────────────────────────────────────────
pub const TAP: u16 = 0;
pub const MODE_CLASSIC: u16 = 1;
pub const MODE_MULTIPLAYER: u16 = 2;

// ── Classic panel ───────────────────────────────────────────────
pub const CLAIM_DAILY: u16 = 10;

// ── Upgrade purchase (base + UpgradeKind::all() index) ──────────
pub const BUY_UPGRADE_BASE: u16 = 100;

// ── Prize claim (base + PRIZES index) ───────────────────────────
pub const CLAIM_PRIZE_BASE: u16 = 200;

// ── Mission claim (base + MISSIONS index) ───────────────────────
pub const CLAIM_MISSION_BASE: u16 = 300;

// ── Multiplayer panel ───────────────────────────────────────────
pub const SELECT_TEAM_BASE: u16 = 400;
pub const CLAIM_TEAM_CHEST: u16 = 410;
pub const START_NEXT_SEASON: u16 = 411;

/// Offset of `id` inside a `[base, base + len)` block.
pub fn index_in(id: u16, base: u16, len: usize) -> Option<usize> {
    let idx = id.checked_sub(base)? as usize;
    (idx < len).then_some(idx)
}

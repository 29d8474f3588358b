// Platform Type Definitions

use candid::{CandidType, Deserialize, Principal};
use ic_stable_structures::storable::Bound;
use ic_stable_structures::Storable;
use serde::Serialize;
use std::borrow::Cow;

// =============================================================================
// CONSTANTS
// =============================================================================

pub const DECIMALS_PER_CREDIT: u64 = 100; // balances carry 2 implied decimals
pub const MIN_SLOT_BET: u64 = 1_000 * DECIMALS_PER_CREDIT; // slot minimum per spin
pub const MIN_DEPOSIT: u64 = 10_000 * DECIMALS_PER_CREDIT;
pub const DEFAULT_WIN_RATE: f64 = 45.0; // hardcoded fallback, percent
pub const STRAIGHT_MULTIPLIER: u64 = 35; // straight-up pays 35:1
pub const EVEN_MONEY_MULTIPLIER: u64 = 1;

// =============================================================================
// GAMES
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameKind {
    Roulette,
    Slot,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Green,
    Red,
    Black,
}

/// Roulette bet selection. Exhaustive: every variant has a defined winning
/// and losing outcome set, so manipulated spins always honor the decision.
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouletteBetType {
    Straight(u8), // single number 0-36
    Red,
    Black,
    Even,
    Odd,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug)]
pub struct RouletteBet {
    pub bet_type: RouletteBetType,
    pub amount: u64,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct RouletteSpinResult {
    pub winning_number: u8,
    pub color: Color,
    pub is_win: bool,
    pub win_amount: u64, // profit; 0 on a loss
    pub balance_after: u64,
    pub randomness_hash: String,
    pub game_id: u64,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotSymbol {
    Seven,
    Bar,
    Cherry,
    Lemon,
    Orange,
    Grape,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct SlotSpinResult {
    pub reels: Vec<SlotSymbol>, // always 3 entries
    pub multiplier: u64,        // matched symbol's multiplier, 0 on a loss
    pub is_win: bool,
    pub win_amount: u64,
    pub balance_after: u64,
    pub randomness_hash: String,
    pub game_id: u64,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct BoardLayout {
    pub red_numbers: Vec<u8>,
    pub black_numbers: Vec<u8>,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct PayoutInfo {
    pub bet_type: String,
    pub payout_multiplier: u64,
    pub description: String,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct SlotPayoutInfo {
    pub symbol: SlotSymbol,
    pub weight: u64,
    pub multiplier: u64,
}

// =============================================================================
// WIN-RATE CONFIGURATION
// =============================================================================

/// Fully resolved manipulation policy for one spin. Recomputed per spin,
/// never persisted.
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct WinRateConfig {
    pub win_rate_percent: f64, // 0-100
    pub use_organic: bool,
}

/// Global admin-configurable settings. `None` means "fall through to the
/// next level of the precedence chain".
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct GlobalSettings {
    pub default_win_rate: Option<f64>,
    pub roulette_win_rate: Option<f64>,
    pub slot_win_rate: Option<f64>,
    pub roulette_use_organic: Option<bool>,
    pub slot_use_organic: Option<bool>,
    pub house_edge: Option<f64>, // informational only, not used by payouts
}

/// Partial settings update; only `Some` fields are applied.
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, Default)]
pub struct SettingsUpdate {
    pub default_win_rate: Option<f64>,
    pub roulette_win_rate: Option<f64>,
    pub slot_win_rate: Option<f64>,
    pub roulette_use_organic: Option<bool>,
    pub slot_use_organic: Option<bool>,
    pub house_edge: Option<f64>,
}

/// Per-player overrides. `win_rate` is the legacy generic override that
/// predates the per-game fields and sits between them and the global
/// settings in the precedence chain.
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerOverrides {
    pub win_rate: Option<f64>,
    pub roulette_win_rate: Option<f64>,
    pub slot_win_rate: Option<f64>,
    pub roulette_use_organic: Option<bool>,
    pub slot_use_organic: Option<bool>,
}

// =============================================================================
// HISTORY
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug)]
pub enum RecordedBet {
    Roulette(RouletteBetType),
    Slot,
}

impl RecordedBet {
    pub fn game(&self) -> GameKind {
        match self {
            RecordedBet::Roulette(_) => GameKind::Roulette,
            RecordedBet::Slot => GameKind::Slot,
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub enum RecordedOutcome {
    Roulette { winning_number: u8, color: Color },
    Slot { reels: Vec<SlotSymbol>, multiplier: u64 },
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct GameRecord {
    pub id: u64,
    pub player: Principal,
    pub bet: RecordedBet,
    pub bet_amount: u64,
    pub outcome: RecordedOutcome,
    pub is_win: bool,
    pub win_amount: u64,
    pub balance_after: u64,
    pub created_at: u64, // nanoseconds
}

// =============================================================================
// DEPOSITS
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepositStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct DepositRequest {
    pub id: u64,
    pub player: Principal,
    pub amount: u64,
    pub payment_reference: String, // transfer reference supplied by the player
    pub status: DepositStatus,
    pub admin_notes: Option<String>,
    pub requested_at: u64,
    pub verified_at: Option<u64>,
    pub verified_by: Option<Principal>,
}

// =============================================================================
// STABLE STORAGE ENCODING
// =============================================================================

impl Storable for GlobalSettings {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(serde_json::to_vec(self).expect("Failed to encode GlobalSettings"))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        serde_json::from_slice(&bytes).expect("Failed to decode GlobalSettings from stable storage")
    }

    const BOUND: Bound = Bound::Unbounded;
}

impl Storable for PlayerOverrides {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(serde_json::to_vec(self).expect("Failed to encode PlayerOverrides"))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        serde_json::from_slice(&bytes).expect("Failed to decode PlayerOverrides from stable storage")
    }

    const BOUND: Bound = Bound::Unbounded;
}

impl Storable for GameRecord {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(serde_json::to_vec(self).expect("Failed to encode GameRecord"))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        serde_json::from_slice(&bytes).expect("Failed to decode GameRecord from stable storage")
    }

    const BOUND: Bound = Bound::Unbounded;
}

impl Storable for DepositRequest {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(serde_json::to_vec(self).expect("Failed to encode DepositRequest"))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        serde_json::from_slice(&bytes).expect("Failed to decode DepositRequest from stable storage")
    }

    const BOUND: Bound = Bound::Unbounded;
}

// =============================================================================
// ADMIN VIEWS
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct PlayerInfo {
    pub player: Principal,
    pub balance: u64,
    pub overrides: Option<PlayerOverrides>,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct PlatformStats {
    pub total_players: u64,
    pub total_games: u64,
    pub pending_deposits: u64,
    pub total_wagered: u64,
    pub total_paid_out: u64,
    pub house_profit: i64, // wagered - paid out, can be negative
}

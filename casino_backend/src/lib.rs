use ic_cdk::{init, post_upgrade, pre_upgrade, query, update};
use ic_stable_structures::memory_manager::{MemoryManager, VirtualMemory};
use ic_stable_structures::DefaultMemoryImpl;
use std::cell::RefCell;

use candid::Principal;

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

pub mod accounting;
pub mod board;
pub mod guard;
pub mod history;
pub mod reels;
pub mod rng;
pub mod roulette;
pub mod settings;
pub mod slot;
pub mod stats;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use stats::DailySnapshot;
pub use types::{
    BoardLayout, Color, DepositRequest, GameKind, GameRecord, GlobalSettings, PayoutInfo,
    PlayerInfo, PlayerOverrides, PlatformStats, RouletteBet, RouletteBetType, RouletteSpinResult,
    SettingsUpdate, SlotPayoutInfo, SlotSpinResult, SlotSymbol,
};

// =============================================================================
// MEMORY MANAGEMENT
// =============================================================================

pub(crate) type Memory = VirtualMemory<DefaultMemoryImpl>;

thread_local! {
    pub(crate) static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> =
        RefCell::new(MemoryManager::init(DefaultMemoryImpl::default()));
}

/// One memory id per stable structure. Never reuse or renumber a live id.
pub(crate) mod memory_ids {
    pub const USER_BALANCES_MEMORY_ID: u8 = 0;
    pub const GLOBAL_SETTINGS_MEMORY_ID: u8 = 1;
    pub const PLAYER_OVERRIDES_MEMORY_ID: u8 = 2;
    pub const GAME_HISTORY_MEMORY_ID: u8 = 3;
    pub const HISTORY_NEXT_ID_MEMORY_ID: u8 = 4;
    pub const DEPOSITS_MEMORY_ID: u8 = 5;
    pub const DEPOSIT_NEXT_ID_MEMORY_ID: u8 = 6;
    pub const TOTAL_WAGERED_MEMORY_ID: u8 = 7;
    pub const TOTAL_PAID_OUT_MEMORY_ID: u8 = 8;
    pub const STATS_SNAPSHOTS_MEMORY_ID: u8 = 9;
    pub const STATS_ACCUMULATOR_MEMORY_ID: u8 = 10;
}

// =============================================================================
// ADMIN ACCESS
// =============================================================================

const ADMIN_PRINCIPAL: &str = "p7336-jmpo5-pkjsf-7dqkd-ea3zu-g2ror-ctcn2-sxtuo-tjve3-ulrx7-wae";

fn require_admin() -> Result<(), String> {
    let caller = ic_cdk::api::msg_caller();
    let admin = Principal::from_text(ADMIN_PRINCIPAL)
        .map_err(|e| format!("Invalid admin principal: {:?}", e))?;
    if caller != admin {
        return Err("Unauthorized: admin only".to_string());
    }
    Ok(())
}

// =============================================================================
// LIFECYCLE HOOKS
// =============================================================================

#[init]
fn init() {
    ic_cdk::println!("Casino Backend Initialized");

    // Start daily statistics timer
    stats::start_stats_timer();
}

#[pre_upgrade]
fn pre_upgrade() {
    // Note: StableBTreeMap persists automatically, no special handling needed
}

#[post_upgrade]
fn post_upgrade() {
    // Rebuild the in-memory balance cache from stable storage
    accounting::post_upgrade_accounting();

    // Timers do not survive upgrades
    stats::start_stats_timer();
}

// =============================================================================
// GAME ENDPOINTS
// =============================================================================

#[update]
async fn spin_roulette(bet: RouletteBet) -> Result<RouletteSpinResult, String> {
    roulette::spin(bet, ic_cdk::api::msg_caller()).await
}

#[update]
async fn spin_slot(bet_amount: u64) -> Result<SlotSpinResult, String> {
    slot::spin(bet_amount, ic_cdk::api::msg_caller()).await
}

#[query]
fn get_my_history(game: Option<GameKind>, limit: Option<u64>) -> Vec<GameRecord> {
    history::player_history(
        ic_cdk::api::msg_caller(),
        game,
        limit.unwrap_or(history::DEFAULT_HISTORY_LIMIT),
    )
}

#[query]
fn get_board_layout() -> BoardLayout {
    BoardLayout {
        red_numbers: board::RED_NUMBERS.to_vec(),
        black_numbers: board::BLACK_NUMBERS.to_vec(),
    }
}

#[query]
fn get_roulette_payouts() -> Vec<PayoutInfo> {
    vec![
        PayoutInfo {
            bet_type: "Straight".into(),
            payout_multiplier: types::STRAIGHT_MULTIPLIER,
            description: "Single number 0-36, pays 35:1".into(),
        },
        PayoutInfo {
            bet_type: "Red/Black".into(),
            payout_multiplier: types::EVEN_MONEY_MULTIPLIER,
            description: "18 numbers by color, zero loses".into(),
        },
        PayoutInfo {
            bet_type: "Even/Odd".into(),
            payout_multiplier: types::EVEN_MONEY_MULTIPLIER,
            description: "18 numbers by parity, zero loses".into(),
        },
    ]
}

#[query]
fn get_slot_paytable() -> Vec<SlotPayoutInfo> {
    reels::SYMBOLS
        .iter()
        .map(|info| SlotPayoutInfo {
            symbol: info.symbol,
            weight: info.weight,
            multiplier: info.multiplier,
        })
        .collect()
}

// =============================================================================
// BALANCE & DEPOSIT ENDPOINTS
// =============================================================================

#[query]
fn get_my_balance() -> u64 {
    accounting::get_balance(ic_cdk::api::msg_caller())
}

#[query]
fn get_balance(player: Principal) -> u64 {
    accounting::get_balance(player)
}

#[update]
fn request_deposit(amount: u64, payment_reference: String) -> Result<u64, String> {
    accounting::request_deposit(
        ic_cdk::api::msg_caller(),
        amount,
        payment_reference,
        ic_cdk::api::time(),
    )
}

#[query]
fn get_my_deposits() -> Vec<DepositRequest> {
    accounting::deposits_for(ic_cdk::api::msg_caller())
}

// =============================================================================
// STATISTICS ENDPOINTS
// =============================================================================

#[query]
fn get_daily_stats(limit: u32) -> Vec<DailySnapshot> {
    stats::get_daily_snapshots(limit)
}

#[query]
fn get_stats_count() -> u64 {
    stats::get_snapshot_count()
}

#[query]
fn greet(name: String) -> String {
    format!(
        "Welcome to the casino, {}! Roulette and slots, real credits on the line!",
        name
    )
}

// =============================================================================
// ADMIN ENDPOINTS
// =============================================================================

#[query]
fn admin_get_settings() -> Result<GlobalSettings, String> {
    require_admin()?;
    Ok(settings::get_settings())
}

#[update]
fn admin_update_settings(update: SettingsUpdate) -> Result<GlobalSettings, String> {
    require_admin()?;
    settings::apply_settings_update(update)
}

#[query]
fn admin_get_player_overrides(player: Principal) -> Result<Option<PlayerOverrides>, String> {
    require_admin()?;
    Ok(settings::get_player_overrides(player))
}

#[update]
fn admin_set_player_overrides(
    player: Principal,
    overrides: PlayerOverrides,
) -> Result<(), String> {
    require_admin()?;
    settings::set_player_overrides(player, overrides)
}

#[update]
fn admin_clear_player_overrides(player: Principal) -> Result<bool, String> {
    require_admin()?;
    Ok(settings::clear_player_overrides(player))
}

#[update]
fn admin_set_balance(player: Principal, new_balance: u64) -> Result<(), String> {
    require_admin()?;
    accounting::update_balance(player, new_balance)
}

#[query]
fn admin_list_players(offset: u64, limit: u64) -> Result<Vec<PlayerInfo>, String> {
    require_admin()?;
    Ok(accounting::list_balances(offset, limit)
        .into_iter()
        .map(|(player, balance)| PlayerInfo {
            player,
            balance,
            overrides: settings::get_player_overrides(player),
        })
        .collect())
}

#[query]
fn admin_list_deposits() -> Result<Vec<DepositRequest>, String> {
    require_admin()?;
    Ok(accounting::all_deposits())
}

#[update]
fn admin_approve_deposit(id: u64, notes: Option<String>) -> Result<u64, String> {
    require_admin()?;
    accounting::approve_deposit(id, ic_cdk::api::msg_caller(), notes, ic_cdk::api::time())
}

#[update]
fn admin_reject_deposit(id: u64, notes: Option<String>) -> Result<(), String> {
    require_admin()?;
    accounting::reject_deposit(id, ic_cdk::api::msg_caller(), notes, ic_cdk::api::time())
}

#[query]
fn admin_get_statistics() -> Result<PlatformStats, String> {
    require_admin()?;
    let total_wagered = history::total_wagered();
    let total_paid_out = history::total_paid_out();
    Ok(PlatformStats {
        total_players: accounting::count_players(),
        total_games: history::total_games(),
        pending_deposits: accounting::pending_deposit_count(),
        total_wagered,
        total_paid_out,
        house_profit: total_wagered as i64 - total_paid_out as i64,
    })
}

ic_cdk::export_candid!();

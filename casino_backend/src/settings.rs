// Win-Rate Settings & Resolution
//
// The manipulation policy for a spin is resolved right before the spin runs,
// walking the precedence chain: per-player per-game override, per-player
// legacy generic override, global per-game setting, global default setting,
// hardcoded fallback.

use crate::memory_ids::{GLOBAL_SETTINGS_MEMORY_ID, PLAYER_OVERRIDES_MEMORY_ID};
use crate::types::{
    GameKind, GlobalSettings, PlayerOverrides, SettingsUpdate, WinRateConfig, DEFAULT_WIN_RATE,
};
use crate::{Memory, MEMORY_MANAGER};
use candid::Principal;
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::{StableBTreeMap, StableCell};
use std::cell::RefCell;

thread_local! {
    static GLOBAL_SETTINGS: RefCell<StableCell<GlobalSettings, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(GLOBAL_SETTINGS_MEMORY_ID))),
            GlobalSettings::default()
        )
    );

    static PLAYER_OVERRIDES: RefCell<StableBTreeMap<Principal, PlayerOverrides, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(PLAYER_OVERRIDES_MEMORY_ID))),
        )
    );
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve the effective win-rate policy for one spin.
pub fn resolve_win_rate(player: Principal, game: GameKind) -> WinRateConfig {
    let overrides = get_player_overrides(player).unwrap_or_default();
    let settings = get_settings();

    let (game_rate_override, game_organic_override) = match game {
        GameKind::Roulette => (overrides.roulette_win_rate, overrides.roulette_use_organic),
        GameKind::Slot => (overrides.slot_win_rate, overrides.slot_use_organic),
    };
    let (global_game_rate, global_game_organic) = match game {
        GameKind::Roulette => (settings.roulette_win_rate, settings.roulette_use_organic),
        GameKind::Slot => (settings.slot_win_rate, settings.slot_use_organic),
    };

    let win_rate_percent = game_rate_override
        .or(overrides.win_rate)
        .or(global_game_rate)
        .or(settings.default_win_rate)
        .unwrap_or(DEFAULT_WIN_RATE);

    let use_organic = game_organic_override.or(global_game_organic).unwrap_or(false);

    WinRateConfig {
        win_rate_percent,
        use_organic,
    }
}

// =============================================================================
// GLOBAL SETTINGS
// =============================================================================

pub fn get_settings() -> GlobalSettings {
    GLOBAL_SETTINGS.with(|cell| *cell.borrow().get())
}

fn validate_rate(label: &str, rate: f64) -> Result<(), String> {
    if !(0.0..=100.0).contains(&rate) || rate.is_nan() {
        return Err(format!("{} must be between 0 and 100, got {}", label, rate));
    }
    Ok(())
}

/// Apply a partial settings update. Only provided fields change.
pub fn apply_settings_update(update: SettingsUpdate) -> Result<GlobalSettings, String> {
    if let Some(rate) = update.default_win_rate {
        validate_rate("default_win_rate", rate)?;
    }
    if let Some(rate) = update.roulette_win_rate {
        validate_rate("roulette_win_rate", rate)?;
    }
    if let Some(rate) = update.slot_win_rate {
        validate_rate("slot_win_rate", rate)?;
    }
    if let Some(edge) = update.house_edge {
        validate_rate("house_edge", edge)?;
    }

    GLOBAL_SETTINGS.with(|cell| {
        let mut settings = *cell.borrow().get();
        if update.default_win_rate.is_some() {
            settings.default_win_rate = update.default_win_rate;
        }
        if update.roulette_win_rate.is_some() {
            settings.roulette_win_rate = update.roulette_win_rate;
        }
        if update.slot_win_rate.is_some() {
            settings.slot_win_rate = update.slot_win_rate;
        }
        if update.roulette_use_organic.is_some() {
            settings.roulette_use_organic = update.roulette_use_organic;
        }
        if update.slot_use_organic.is_some() {
            settings.slot_use_organic = update.slot_use_organic;
        }
        if update.house_edge.is_some() {
            settings.house_edge = update.house_edge;
        }
        cell.borrow_mut().set(settings);
        Ok(settings)
    })
}

// =============================================================================
// PLAYER OVERRIDES
// =============================================================================

pub fn get_player_overrides(player: Principal) -> Option<PlayerOverrides> {
    PLAYER_OVERRIDES.with(|map| map.borrow().get(&player))
}

pub fn set_player_overrides(player: Principal, overrides: PlayerOverrides) -> Result<(), String> {
    if let Some(rate) = overrides.win_rate {
        validate_rate("win_rate", rate)?;
    }
    if let Some(rate) = overrides.roulette_win_rate {
        validate_rate("roulette_win_rate", rate)?;
    }
    if let Some(rate) = overrides.slot_win_rate {
        validate_rate("slot_win_rate", rate)?;
    }

    PLAYER_OVERRIDES.with(|map| {
        map.borrow_mut().insert(player, overrides);
    });
    Ok(())
}

pub fn clear_player_overrides(player: Principal) -> bool {
    PLAYER_OVERRIDES.with(|map| map.borrow_mut().remove(&player).is_some())
}

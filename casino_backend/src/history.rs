// Game History
//
// Append-only record of every settled spin, keyed by a sequential id.
// Queries walk ids downward so results come back most recent first without
// scanning the whole log.

use crate::memory_ids::{
    GAME_HISTORY_MEMORY_ID, HISTORY_NEXT_ID_MEMORY_ID, TOTAL_PAID_OUT_MEMORY_ID,
    TOTAL_WAGERED_MEMORY_ID,
};
use crate::types::{GameKind, GameRecord};
use crate::{Memory, MEMORY_MANAGER};
use candid::Principal;
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::{StableBTreeMap, StableCell};
use std::cell::RefCell;

pub const DEFAULT_HISTORY_LIMIT: u64 = 20;
pub const MAX_HISTORY_LIMIT: u64 = 100;

thread_local! {
    static GAME_HISTORY: RefCell<StableBTreeMap<u64, GameRecord, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(GAME_HISTORY_MEMORY_ID))),
        )
    );

    static NEXT_GAME_ID: RefCell<StableCell<u64, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(HISTORY_NEXT_ID_MEMORY_ID))),
            0u64
        )
    );

    // Running totals for the admin statistics endpoint
    static TOTAL_WAGERED: RefCell<StableCell<u64, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(TOTAL_WAGERED_MEMORY_ID))),
            0u64
        )
    );

    static TOTAL_PAID_OUT: RefCell<StableCell<u64, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(TOTAL_PAID_OUT_MEMORY_ID))),
            0u64
        )
    );
}

/// Append a settled spin. Returns the id assigned to it.
pub fn record_spin(mut record: GameRecord) -> u64 {
    let id = NEXT_GAME_ID.with(|cell| {
        let id = *cell.borrow().get();
        cell.borrow_mut().set(id + 1);
        id
    });
    record.id = id;

    TOTAL_WAGERED.with(|cell| {
        let total = cell.borrow().get().saturating_add(record.bet_amount);
        cell.borrow_mut().set(total);
    });
    TOTAL_PAID_OUT.with(|cell| {
        let total = cell.borrow().get().saturating_add(record.win_amount);
        cell.borrow_mut().set(total);
    });

    GAME_HISTORY.with(|map| {
        map.borrow_mut().insert(id, record);
    });
    id
}

/// A player's history, most recent first, optionally filtered by game.
pub fn player_history(player: Principal, game: Option<GameKind>, limit: u64) -> Vec<GameRecord> {
    let limit = limit.min(MAX_HISTORY_LIMIT);
    let next_id = NEXT_GAME_ID.with(|cell| *cell.borrow().get());
    let mut result = Vec::new();

    GAME_HISTORY.with(|map| {
        let map = map.borrow();
        for id in (0..next_id).rev() {
            if result.len() as u64 >= limit {
                break;
            }
            if let Some(record) = map.get(&id) {
                if record.player != player {
                    continue;
                }
                if let Some(game) = game {
                    if record.bet.game() != game {
                        continue;
                    }
                }
                result.push(record);
            }
        }
    });

    result
}

pub fn total_games() -> u64 {
    GAME_HISTORY.with(|map| map.borrow().len())
}

pub fn total_wagered() -> u64 {
    TOTAL_WAGERED.with(|cell| *cell.borrow().get())
}

pub fn total_paid_out() -> u64 {
    TOTAL_PAID_OUT.with(|cell| *cell.borrow().get())
}

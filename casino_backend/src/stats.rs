// Daily Platform Statistics
//
// Game-agnostic volume tracking: each settled spin reports its bet and
// payout, snapshots roll over when a new day starts, and a backup timer
// covers quiet days. Isolated from the accounting and game modules.

use crate::memory_ids::{STATS_ACCUMULATOR_MEMORY_ID, STATS_SNAPSHOTS_MEMORY_ID};
use crate::{Memory, MEMORY_MANAGER};
use candid::{CandidType, Deserialize};
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::storable::Bound;
use ic_stable_structures::{StableCell, StableVec, Storable};
use std::borrow::Cow;
use std::cell::RefCell;
use std::time::Duration;

/// Nanoseconds per day (24 * 60 * 60 * 1e9)
const NANOS_PER_DAY: u64 = 86_400_000_000_000;

/// Daily snapshot - stored permanently for historical tracking
#[derive(CandidType, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DailySnapshot {
    /// Midnight timestamp for this day (nanoseconds)
    pub day_timestamp: u64,
    /// Total wagered that day
    pub daily_volume: u64,
    /// Total paid out that day
    pub daily_paid_out: u64,
    /// volume - paid out; negative when players came out ahead
    pub daily_house_profit: i64,
}

impl Storable for DailySnapshot {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(candid::encode_one(self).expect("Failed to encode DailySnapshot"))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect("Failed to decode DailySnapshot from stable storage")
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: 128,
        is_fixed_size: false,
    };
}

/// Accumulator for the current day - reset when a snapshot is taken
#[derive(CandidType, Deserialize, Clone, Debug, Default)]
pub struct DailyAccumulator {
    pub day_start: u64,
    pub volume_accumulated: u64,
    pub paid_out_accumulated: u64,
}

impl Storable for DailyAccumulator {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(candid::encode_one(self).expect("Failed to encode DailyAccumulator"))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect("Failed to decode DailyAccumulator from stable storage")
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: 96,
        is_fixed_size: false,
    };
}

thread_local! {
    /// Historical daily snapshots - append-only, never deleted
    static DAILY_SNAPSHOTS: RefCell<StableVec<DailySnapshot, Memory>> = RefCell::new(
        StableVec::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(STATS_SNAPSHOTS_MEMORY_ID)))
        )
    );

    /// Current day accumulator
    static DAILY_ACCUMULATOR: RefCell<StableCell<DailyAccumulator, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(STATS_ACCUMULATOR_MEMORY_ID))),
            DailyAccumulator::default()
        )
    );
}

fn get_day_start(now: u64) -> u64 {
    now - (now % NANOS_PER_DAY)
}

/// Record one settled spin. Called by the game logic after settlement.
pub fn record_spin_volume(bet_amount: u64, payout: u64) {
    record_spin_volume_at(bet_amount, payout, ic_cdk::api::time());
}

pub fn record_spin_volume_at(bet_amount: u64, payout: u64, now: u64) {
    let current_day_start = get_day_start(now);

    DAILY_ACCUMULATOR.with(|acc| {
        let current = acc.borrow().get().clone();

        // New day: snapshot the previous one first
        if current.day_start != current_day_start && current.day_start > 0 {
            take_snapshot_internal(&current);
        }

        let mut new_acc = if current.day_start != current_day_start {
            DailyAccumulator {
                day_start: current_day_start,
                volume_accumulated: 0,
                paid_out_accumulated: 0,
            }
        } else {
            current
        };

        new_acc.volume_accumulated = new_acc.volume_accumulated.saturating_add(bet_amount);
        new_acc.paid_out_accumulated = new_acc.paid_out_accumulated.saturating_add(payout);

        acc.borrow_mut().set(new_acc);
    });
}

/// Returns false on a duplicate (a snapshot for this day already exists,
/// which can happen when spins arrive right at the day boundary).
fn take_snapshot_internal(acc: &DailyAccumulator) -> bool {
    let already_exists = DAILY_SNAPSHOTS.with(|snapshots| {
        let snapshots = snapshots.borrow();
        let len = snapshots.len();
        if len == 0 {
            return false;
        }
        snapshots
            .get(len - 1)
            .map(|last| last.day_timestamp == acc.day_start)
            .unwrap_or(false)
    });

    if already_exists {
        return false;
    }

    let snapshot = DailySnapshot {
        day_timestamp: acc.day_start,
        daily_volume: acc.volume_accumulated,
        daily_paid_out: acc.paid_out_accumulated,
        daily_house_profit: acc.volume_accumulated as i64 - acc.paid_out_accumulated as i64,
    };

    DAILY_SNAPSHOTS.with(|snapshots| {
        snapshots.borrow_mut().push(&snapshot);
    });

    true
}

/// Manual snapshot trigger, used by the backup timer on quiet days.
pub fn take_daily_snapshot() {
    take_daily_snapshot_at(ic_cdk::api::time());
}

pub fn take_daily_snapshot_at(now: u64) {
    DAILY_ACCUMULATOR.with(|acc| {
        let current = acc.borrow().get().clone();

        if current.day_start > 0 && current.day_start != get_day_start(now) {
            take_snapshot_internal(&current);

            let new_acc = DailyAccumulator {
                day_start: get_day_start(now),
                volume_accumulated: 0,
                paid_out_accumulated: 0,
            };
            acc.borrow_mut().set(new_acc);
        }
    });
}

/// Backup timer so a snapshot lands even on days with no spins.
pub fn start_stats_timer() {
    ic_cdk_timers::set_timer_interval(Duration::from_secs(86_400), || async {
        take_daily_snapshot();
    });
}

/// Most recent `limit` snapshots, chronological order.
pub fn get_daily_snapshots(limit: u32) -> Vec<DailySnapshot> {
    DAILY_SNAPSHOTS.with(|snapshots| {
        let snapshots = snapshots.borrow();
        let len = snapshots.len();
        let start = len.saturating_sub(limit as u64);
        (start..len).filter_map(|i| snapshots.get(i)).collect()
    })
}

pub fn get_snapshot_count() -> u64 {
    DAILY_SNAPSHOTS.with(|s| s.borrow().len())
}

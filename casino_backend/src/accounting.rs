// Balance & Deposit Accounting
//
// Balances live in an in-memory map for fast access, mirrored to stable
// storage on every write and restored in post_upgrade. Deposits follow the
// manual verification flow: a player files a request with a payment
// reference, an admin approves (crediting the balance exactly once) or
// rejects it.

use crate::memory_ids::{
    DEPOSITS_MEMORY_ID, DEPOSIT_NEXT_ID_MEMORY_ID, USER_BALANCES_MEMORY_ID,
};
use crate::types::{DepositRequest, DepositStatus, MIN_DEPOSIT};
use crate::{Memory, MEMORY_MANAGER};
use candid::Principal;
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::{StableBTreeMap, StableCell};
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_PAYMENT_REFERENCE_LEN: usize = 128;
const MAX_ADMIN_NOTES_LEN: usize = 512;

thread_local! {
    // In-memory for fast access
    static USER_BALANCES: RefCell<HashMap<Principal, u64>> = RefCell::new(HashMap::new());

    // Stable storage for persistence across upgrades
    static USER_BALANCES_STABLE: RefCell<StableBTreeMap<Principal, u64, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(USER_BALANCES_MEMORY_ID))),
        )
    );

    static DEPOSIT_REQUESTS: RefCell<StableBTreeMap<u64, DepositRequest, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(DEPOSITS_MEMORY_ID))),
        )
    );

    static NEXT_DEPOSIT_ID: RefCell<StableCell<u64, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(DEPOSIT_NEXT_ID_MEMORY_ID))),
            0u64
        )
    );
}

// =============================================================================
// BALANCES
// =============================================================================

pub fn get_balance(player: Principal) -> u64 {
    USER_BALANCES.with(|balances| *balances.borrow().get(&player).unwrap_or(&0))
}

pub fn update_balance(player: Principal, new_balance: u64) -> Result<(), String> {
    USER_BALANCES.with(|balances| {
        balances.borrow_mut().insert(player, new_balance);
    });

    USER_BALANCES_STABLE.with(|stable| {
        stable.borrow_mut().insert(player, new_balance);
    });

    Ok(())
}

pub fn credit_balance(player: Principal, amount: u64) -> Result<u64, String> {
    let new_balance = get_balance(player)
        .checked_add(amount)
        .ok_or("Balance overflow on credit")?;
    update_balance(player, new_balance)?;
    Ok(new_balance)
}

/// New balance after a settled spin. Win amounts are pure profit: the stake
/// stays with the player on a win and is only taken on a loss.
pub fn settled_balance(
    balance_before: u64,
    bet_amount: u64,
    is_win: bool,
    win_amount: u64,
) -> Result<u64, String> {
    if is_win {
        balance_before
            .checked_add(win_amount)
            .ok_or_else(|| "Balance overflow when adding winnings".to_string())
    } else {
        balance_before
            .checked_sub(bet_amount)
            .ok_or_else(|| "Balance underflow".to_string())
    }
}

pub fn count_players() -> u64 {
    USER_BALANCES.with(|balances| balances.borrow().len() as u64)
}

/// Paginated balance listing for the admin panel, sorted by principal.
pub fn list_balances(offset: u64, limit: u64) -> Vec<(Principal, u64)> {
    USER_BALANCES_STABLE.with(|stable| {
        stable
            .borrow()
            .iter()
            .map(|entry| entry.into_pair())
            .skip(offset as usize)
            .take(limit as usize)
            .collect()
    })
}

// =============================================================================
// DEPOSIT REQUESTS
// =============================================================================

pub fn request_deposit(
    player: Principal,
    amount: u64,
    payment_reference: String,
    now: u64,
) -> Result<u64, String> {
    if amount < MIN_DEPOSIT {
        return Err(format!(
            "Minimum deposit is {} credits",
            MIN_DEPOSIT / crate::types::DECIMALS_PER_CREDIT
        ));
    }
    if payment_reference.trim().is_empty() {
        return Err("Payment reference is required".to_string());
    }
    if payment_reference.len() > MAX_PAYMENT_REFERENCE_LEN {
        return Err("Payment reference too long".to_string());
    }

    let id = NEXT_DEPOSIT_ID.with(|cell| {
        let id = *cell.borrow().get();
        cell.borrow_mut().set(id + 1);
        id
    });

    let request = DepositRequest {
        id,
        player,
        amount,
        payment_reference,
        status: DepositStatus::Pending,
        admin_notes: None,
        requested_at: now,
        verified_at: None,
        verified_by: None,
    };

    DEPOSIT_REQUESTS.with(|map| {
        map.borrow_mut().insert(id, request);
    });

    Ok(id)
}

/// Approve a pending deposit and credit the player, exactly once.
pub fn approve_deposit(
    id: u64,
    admin: Principal,
    notes: Option<String>,
    now: u64,
) -> Result<u64, String> {
    validate_notes(&notes)?;
    let mut request = DEPOSIT_REQUESTS
        .with(|map| map.borrow().get(&id))
        .ok_or("Deposit request not found")?;

    if request.status != DepositStatus::Pending {
        return Err("Deposit already processed".to_string());
    }

    let new_balance = credit_balance(request.player, request.amount)?;

    request.status = DepositStatus::Approved;
    request.admin_notes = notes;
    request.verified_at = Some(now);
    request.verified_by = Some(admin);
    DEPOSIT_REQUESTS.with(|map| {
        map.borrow_mut().insert(id, request);
    });

    Ok(new_balance)
}

pub fn reject_deposit(
    id: u64,
    admin: Principal,
    notes: Option<String>,
    now: u64,
) -> Result<(), String> {
    validate_notes(&notes)?;
    let mut request = DEPOSIT_REQUESTS
        .with(|map| map.borrow().get(&id))
        .ok_or("Deposit request not found")?;

    if request.status != DepositStatus::Pending {
        return Err("Deposit already processed".to_string());
    }

    request.status = DepositStatus::Rejected;
    request.admin_notes = notes.or_else(|| Some("Deposit rejected".to_string()));
    request.verified_at = Some(now);
    request.verified_by = Some(admin);
    DEPOSIT_REQUESTS.with(|map| {
        map.borrow_mut().insert(id, request);
    });

    Ok(())
}

fn validate_notes(notes: &Option<String>) -> Result<(), String> {
    match notes {
        Some(n) if n.len() > MAX_ADMIN_NOTES_LEN => Err("Admin notes too long".to_string()),
        _ => Ok(()),
    }
}

/// A player's own requests, most recent first.
pub fn deposits_for(player: Principal) -> Vec<DepositRequest> {
    let mut result = all_deposits();
    result.retain(|r| r.player == player);
    result
}

/// Every request, most recent first.
pub fn all_deposits() -> Vec<DepositRequest> {
    let mut result: Vec<DepositRequest> =
        DEPOSIT_REQUESTS.with(|map| map.borrow().iter().map(|entry| entry.value()).collect());
    result.sort_by(|a, b| b.id.cmp(&a.id));
    result
}

pub fn pending_deposit_count() -> u64 {
    DEPOSIT_REQUESTS.with(|map| {
        map.borrow()
            .iter()
            .filter(|entry| entry.value().status == DepositStatus::Pending)
            .count() as u64
    })
}

// =============================================================================
// UPGRADE HOOKS
// =============================================================================

pub fn post_upgrade_accounting() {
    // Restore the in-memory map from stable storage
    USER_BALANCES_STABLE.with(|stable| {
        USER_BALANCES.with(|memory| {
            let mut memory = memory.borrow_mut();
            memory.clear();
            for (principal, balance) in stable.borrow().iter().map(|entry| entry.into_pair()) {
                memory.insert(principal, balance);
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: u8) -> Principal {
        Principal::from_slice(&[id; 4])
    }

    const ADMIN: [u8; 4] = [99; 4];

    fn admin() -> Principal {
        Principal::from_slice(&ADMIN)
    }

    #[test]
    fn test_balance_roundtrip() {
        let p = player(1);
        assert_eq!(get_balance(p), 0);
        update_balance(p, 5_000).unwrap();
        assert_eq!(get_balance(p), 5_000);
        let after = credit_balance(p, 1_000).unwrap();
        assert_eq!(after, 6_000);
        assert_eq!(get_balance(p), 6_000);
    }

    #[test]
    fn test_settled_balance_invariant() {
        // loss takes the stake
        assert_eq!(settled_balance(10_000, 2_000, false, 0).unwrap(), 8_000);
        // win credits the profit, stake untouched
        assert_eq!(settled_balance(10_000, 2_000, true, 2_000).unwrap(), 12_000);
        // straight-up win at 35:1
        assert_eq!(settled_balance(10_000, 100, true, 3_500).unwrap(), 13_500);
        // overflow and underflow are reported, not wrapped
        assert!(settled_balance(u64::MAX, 1, true, 1).is_err());
        assert!(settled_balance(0, 1, false, 0).is_err());
    }

    #[test]
    fn test_credit_overflow_rejected() {
        let p = player(2);
        update_balance(p, u64::MAX - 10).unwrap();
        assert!(credit_balance(p, 100).is_err());
        // balance untouched on failure
        assert_eq!(get_balance(p), u64::MAX - 10);
    }

    #[test]
    fn test_deposit_lifecycle() {
        let p = player(3);
        let id = request_deposit(p, MIN_DEPOSIT, "TRX-1001".to_string(), 42).unwrap();

        let pending = deposits_for(p);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, DepositStatus::Pending);
        assert_eq!(get_balance(p), 0);

        let new_balance = approve_deposit(id, admin(), Some("verified".to_string()), 43).unwrap();
        assert_eq!(new_balance, MIN_DEPOSIT);
        assert_eq!(get_balance(p), MIN_DEPOSIT);

        let processed = deposits_for(p);
        assert_eq!(processed[0].status, DepositStatus::Approved);
        assert_eq!(processed[0].verified_by, Some(admin()));

        // double approval must not credit twice
        assert!(approve_deposit(id, admin(), None, 44).is_err());
        assert_eq!(get_balance(p), MIN_DEPOSIT);
    }

    #[test]
    fn test_reject_does_not_credit() {
        let p = player(4);
        let id = request_deposit(p, MIN_DEPOSIT * 2, "TRX-2002".to_string(), 10).unwrap();
        reject_deposit(id, admin(), None, 11).unwrap();

        assert_eq!(get_balance(p), 0);
        let requests = deposits_for(p);
        assert_eq!(requests[0].status, DepositStatus::Rejected);
        assert_eq!(requests[0].admin_notes.as_deref(), Some("Deposit rejected"));

        // rejected requests cannot be approved afterwards
        assert!(approve_deposit(id, admin(), None, 12).is_err());
    }

    #[test]
    fn test_deposit_validation() {
        let p = player(5);
        assert!(request_deposit(p, MIN_DEPOSIT - 1, "TRX".to_string(), 0).is_err());
        assert!(request_deposit(p, MIN_DEPOSIT, "   ".to_string(), 0).is_err());
        assert!(request_deposit(p, MIN_DEPOSIT, "x".repeat(200), 0).is_err());
    }

    #[test]
    fn test_deposits_most_recent_first() {
        let p = player(6);
        let first = request_deposit(p, MIN_DEPOSIT, "TRX-A".to_string(), 1).unwrap();
        let second = request_deposit(p, MIN_DEPOSIT, "TRX-B".to_string(), 2).unwrap();
        let listed = deposits_for(p);
        assert_eq!(listed[0].id, second);
        assert_eq!(listed[1].id, first);
    }
}

// Per-Caller Spin Guard
//
// A spin suspends at the raw_rand call. Without a guard, two spins from the
// same player could interleave around that await and race on the balance.
// The guard rejects the second spin up front and releases on drop.

use candid::Principal;
use std::cell::RefCell;
use std::collections::BTreeSet;

thread_local! {
    static ACTIVE_SPINS: RefCell<BTreeSet<Principal>> = RefCell::new(BTreeSet::new());
}

#[derive(Debug)]
pub struct SpinGuard {
    caller: Principal,
}

impl SpinGuard {
    pub fn new(caller: Principal) -> Result<Self, String> {
        ACTIVE_SPINS.with(|spins| {
            let mut spins = spins.borrow_mut();
            if spins.contains(&caller) {
                return Err("Spin already in progress for this player".to_string());
            }
            spins.insert(caller);
            Ok(Self { caller })
        })
    }
}

impl Drop for SpinGuard {
    fn drop(&mut self) {
        ACTIVE_SPINS.with(|spins| {
            spins.borrow_mut().remove(&self.caller);
        });
    }
}

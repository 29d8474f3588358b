// Entropy Handling
//
// Spins consume randomness through an EntropyStream: a SHA-256 hash chain
// seeded from IC VRF bytes at the endpoint boundary (or from fixed bytes in
// tests). Each draw hashes seed || counter, so the game logic stays a pure
// function of (bet, config, seed).

use ic_cdk::management_canister::raw_rand;
use sha2::{Digest, Sha256};

pub struct EntropyStream {
    state: [u8; 32],
    counter: u64,
}

impl EntropyStream {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self {
            state: hasher.finalize().into(),
            counter: 0,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.state);
        hasher.update(self.counter.to_be_bytes());
        let hash = hasher.finalize();
        self.counter += 1;
        u64::from_be_bytes(hash[0..8].try_into().unwrap())
    }

    /// Uniform draw in [0, n). Modulo bias is negligible: n never exceeds 37
    /// here, which divides into 2^64 almost evenly.
    pub fn uniform(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// Uniform value in [0.0, 100.0).
    pub fn percent(&mut self) -> f64 {
        (self.next_u64() as f64 / (u64::MAX as f64 + 1.0)) * 100.0
    }
}

/// Fetch VRF entropy from the IC. Execution may suspend here.
pub async fn draw_entropy() -> Result<Vec<u8>, String> {
    let bytes = raw_rand()
        .await
        .map_err(|e| format!("Randomness failed: {:?}", e))?;
    if bytes.len() < 8 {
        return Err("Insufficient randomness".to_string());
    }
    Ok(bytes)
}

/// Hash of the raw entropy, returned to the player for later verification.
pub fn randomness_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

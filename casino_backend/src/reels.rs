// Slot Reel Configuration
//
// Six symbols, weighted so the high-paying ones come up rarely. The table is
// ordered highest payout first; weighted selection walks it in order.

use crate::rng::EntropyStream;
use crate::types::SlotSymbol;

pub struct SymbolInfo {
    pub symbol: SlotSymbol,
    pub weight: u64,
    pub multiplier: u64,
}

pub const SYMBOLS: [SymbolInfo; 6] = [
    SymbolInfo { symbol: SlotSymbol::Seven, weight: 1, multiplier: 10 },
    SymbolInfo { symbol: SlotSymbol::Bar, weight: 2, multiplier: 6 },
    SymbolInfo { symbol: SlotSymbol::Cherry, weight: 4, multiplier: 4 },
    SymbolInfo { symbol: SlotSymbol::Lemon, weight: 8, multiplier: 3 },
    SymbolInfo { symbol: SlotSymbol::Orange, weight: 10, multiplier: 2 },
    SymbolInfo { symbol: SlotSymbol::Grape, weight: 12, multiplier: 1 },
];

pub const TOTAL_WEIGHT: u64 = 37; // 1 + 2 + 4 + 8 + 10 + 12

/// One weighted draw: uniform roll in [0, TOTAL_WEIGHT), then subtract
/// weights in table order. The trailing return keeps the last symbol as the
/// fallback if the walk ever falls through.
pub fn pick_symbol(rng: &mut EntropyStream) -> SlotSymbol {
    let mut roll = rng.uniform(TOTAL_WEIGHT);
    for info in &SYMBOLS {
        if roll < info.weight {
            return info.symbol;
        }
        roll -= info.weight;
    }
    SYMBOLS[SYMBOLS.len() - 1].symbol
}

pub fn multiplier_for(symbol: SlotSymbol) -> u64 {
    SYMBOLS
        .iter()
        .find(|info| info.symbol == symbol)
        .map(|info| info.multiplier)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_weight_matches_table() {
        let sum: u64 = SYMBOLS.iter().map(|info| info.weight).sum();
        assert_eq!(sum, TOTAL_WEIGHT);
    }

    #[test]
    fn test_multiplier_lookup() {
        assert_eq!(multiplier_for(SlotSymbol::Seven), 10);
        assert_eq!(multiplier_for(SlotSymbol::Bar), 6);
        assert_eq!(multiplier_for(SlotSymbol::Cherry), 4);
        assert_eq!(multiplier_for(SlotSymbol::Lemon), 3);
        assert_eq!(multiplier_for(SlotSymbol::Orange), 2);
        assert_eq!(multiplier_for(SlotSymbol::Grape), 1);
    }

    #[test]
    fn test_every_symbol_reachable() {
        let mut rng = EntropyStream::from_bytes(b"reachability");
        let mut seen = std::collections::HashSet::new();
        for _ in 0..5_000 {
            seen.insert(pick_symbol(&mut rng));
        }
        assert_eq!(seen.len(), SYMBOLS.len());
    }
}

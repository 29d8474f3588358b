// Roulette Outcome Engine
//
// The engine is a pure function of (bet, config, entropy). In manipulated
// mode the win/lose decision is made first and an outcome matching it is
// synthesized; in organic mode the wheel is spun uniformly and the bet is
// evaluated against whatever came up.

use crate::accounting::{self, settled_balance};
use crate::board::{get_color, BLACK_NUMBERS, RED_NUMBERS};
use crate::guard::SpinGuard;
use crate::history;
use crate::rng::{draw_entropy, randomness_hash, EntropyStream};
use crate::settings::resolve_win_rate;
use crate::stats;
use crate::types::{
    Color, GameKind, GameRecord, RecordedBet, RecordedOutcome, RouletteBet, RouletteBetType,
    RouletteSpinResult, WinRateConfig, DECIMALS_PER_CREDIT, EVEN_MONEY_MULTIPLIER,
    STRAIGHT_MULTIPLIER,
};
use candid::Principal;

// =============================================================================
// PURE ENGINE
// =============================================================================

pub fn payout_multiplier(bet_type: &RouletteBetType) -> u64 {
    match bet_type {
        RouletteBetType::Straight(_) => STRAIGHT_MULTIPLIER,
        RouletteBetType::Red
        | RouletteBetType::Black
        | RouletteBetType::Even
        | RouletteBetType::Odd => EVEN_MONEY_MULTIPLIER,
    }
}

pub fn validate_bet(bet: &RouletteBet) -> Result<(), String> {
    if bet.amount == 0 {
        return Err("Bet amount must be > 0".to_string());
    }
    if let RouletteBetType::Straight(n) = bet.bet_type {
        if n > 36 {
            return Err(format!("Invalid number: {} (must be 0-36)", n));
        }
    }
    // Reject up front any stake whose payout cannot be represented
    bet.amount
        .checked_mul(payout_multiplier(&bet.bet_type))
        .ok_or("Bet too large")?;
    Ok(())
}

/// The single manipulation point: one uniform draw in [0, 100), win iff
/// strictly below the configured rate.
pub fn decide_win(config: &WinRateConfig, rng: &mut EntropyStream) -> bool {
    rng.percent() < config.win_rate_percent
}

fn pick(pool: &[u8], rng: &mut EntropyStream) -> u8 {
    pool[rng.uniform(pool.len() as u64) as usize]
}

/// A number guaranteed to satisfy the bet.
pub fn generate_winning_number(bet_type: &RouletteBetType, rng: &mut EntropyStream) -> u8 {
    match bet_type {
        RouletteBetType::Straight(n) => *n,
        RouletteBetType::Red => pick(&RED_NUMBERS, rng),
        RouletteBetType::Black => pick(&BLACK_NUMBERS, rng),
        RouletteBetType::Even => {
            let evens: Vec<u8> = (1..=36).filter(|n| n % 2 == 0).collect();
            pick(&evens, rng)
        }
        RouletteBetType::Odd => {
            let odds: Vec<u8> = (1..=36).filter(|n| n % 2 == 1).collect();
            pick(&odds, rng)
        }
    }
}

/// A number guaranteed to violate the bet. Zero counts against every
/// outside bet.
pub fn generate_losing_number(bet_type: &RouletteBetType, rng: &mut EntropyStream) -> u8 {
    let pool: Vec<u8> = match bet_type {
        RouletteBetType::Straight(target) => (0..=36).filter(|n| n != target).collect(),
        RouletteBetType::Red => (0..=36).filter(|n| get_color(*n) != Color::Red).collect(),
        RouletteBetType::Black => (0..=36).filter(|n| get_color(*n) != Color::Black).collect(),
        RouletteBetType::Even => (0..=36).filter(|n| *n == 0 || n % 2 == 1).collect(),
        RouletteBetType::Odd => (0..=36).filter(|n| *n == 0 || n % 2 == 0).collect(),
    };
    pick(&pool, rng)
}

pub fn evaluate_bet(bet_type: &RouletteBetType, winning_number: u8) -> bool {
    match bet_type {
        RouletteBetType::Straight(n) => *n == winning_number,
        RouletteBetType::Red => get_color(winning_number) == Color::Red,
        RouletteBetType::Black => get_color(winning_number) == Color::Black,
        RouletteBetType::Even => winning_number != 0 && winning_number % 2 == 0,
        RouletteBetType::Odd => winning_number != 0 && winning_number % 2 == 1,
    }
}

/// Produce the winning number for one spin under the resolved policy.
pub fn play(bet_type: &RouletteBetType, config: &WinRateConfig, rng: &mut EntropyStream) -> u8 {
    if config.use_organic {
        return rng.uniform(37) as u8;
    }
    if decide_win(config, rng) {
        generate_winning_number(bet_type, rng)
    } else {
        generate_losing_number(bet_type, rng)
    }
}

// =============================================================================
// SPIN ORCHESTRATION
// =============================================================================

pub async fn spin(bet: RouletteBet, caller: Principal) -> Result<RouletteSpinResult, String> {
    validate_bet(&bet)?;

    let balance = accounting::get_balance(caller);
    if balance < bet.amount {
        return Err(format!(
            "Insufficient balance: {} credits available, bet requires {}",
            balance / DECIMALS_PER_CREDIT,
            bet.amount / DECIMALS_PER_CREDIT
        ));
    }

    // Held across the await; a second spin from the same player is rejected
    let _guard = SpinGuard::new(caller)?;

    let entropy = draw_entropy().await?;

    // Re-read after the await - a deposit approval or admin balance change
    // may have landed while suspended
    let balance = accounting::get_balance(caller);
    if balance < bet.amount {
        return Err("Insufficient balance".to_string());
    }

    let config = resolve_win_rate(caller, GameKind::Roulette);
    let mut rng = EntropyStream::from_bytes(&entropy);
    let winning_number = play(&bet.bet_type, &config, &mut rng);
    let is_win = evaluate_bet(&bet.bet_type, winning_number);
    let color = get_color(winning_number);

    let win_amount = if is_win {
        bet.amount
            .checked_mul(payout_multiplier(&bet.bet_type))
            .ok_or("Payout overflow")?
    } else {
        0
    };

    let balance_after = settled_balance(balance, bet.amount, is_win, win_amount)?;
    accounting::update_balance(caller, balance_after)?;

    let game_id = history::record_spin(GameRecord {
        id: 0,
        player: caller,
        bet: RecordedBet::Roulette(bet.bet_type),
        bet_amount: bet.amount,
        outcome: RecordedOutcome::Roulette {
            winning_number,
            color,
        },
        is_win,
        win_amount,
        balance_after,
        created_at: ic_cdk::api::time(),
    });
    stats::record_spin_volume(bet.amount, win_amount);

    Ok(RouletteSpinResult {
        winning_number,
        color,
        is_win,
        win_amount,
        balance_after,
        randomness_hash: randomness_hash(&entropy),
        game_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_BET_TYPES: [RouletteBetType; 6] = [
        RouletteBetType::Straight(0),
        RouletteBetType::Straight(17),
        RouletteBetType::Red,
        RouletteBetType::Black,
        RouletteBetType::Even,
        RouletteBetType::Odd,
    ];

    fn stream(seed: u64) -> EntropyStream {
        EntropyStream::from_bytes(&seed.to_be_bytes())
    }

    #[test]
    fn test_validate_bet() {
        let ok = RouletteBet {
            bet_type: RouletteBetType::Straight(36),
            amount: 100,
        };
        assert!(validate_bet(&ok).is_ok());

        let bad_number = RouletteBet {
            bet_type: RouletteBetType::Straight(37),
            amount: 100,
        };
        assert!(validate_bet(&bad_number).is_err());

        let zero_amount = RouletteBet {
            bet_type: RouletteBetType::Red,
            amount: 0,
        };
        assert!(validate_bet(&zero_amount).is_err());

        let overflowing = RouletteBet {
            bet_type: RouletteBetType::Straight(5),
            amount: u64::MAX / 2,
        };
        assert!(validate_bet(&overflowing).is_err());
    }

    #[test]
    fn test_payout_multipliers() {
        assert_eq!(payout_multiplier(&RouletteBetType::Straight(17)), 35);
        assert_eq!(payout_multiplier(&RouletteBetType::Red), 1);
        assert_eq!(payout_multiplier(&RouletteBetType::Black), 1);
        assert_eq!(payout_multiplier(&RouletteBetType::Even), 1);
        assert_eq!(payout_multiplier(&RouletteBetType::Odd), 1);
    }

    #[test]
    fn test_evaluate_bet() {
        assert!(evaluate_bet(&RouletteBetType::Straight(17), 17));
        assert!(!evaluate_bet(&RouletteBetType::Straight(17), 18));

        assert!(evaluate_bet(&RouletteBetType::Red, 1));
        assert!(!evaluate_bet(&RouletteBetType::Red, 2));
        assert!(!evaluate_bet(&RouletteBetType::Red, 0));

        assert!(evaluate_bet(&RouletteBetType::Even, 2));
        assert!(evaluate_bet(&RouletteBetType::Odd, 3));
        // zero loses both parity bets
        assert!(!evaluate_bet(&RouletteBetType::Even, 0));
        assert!(!evaluate_bet(&RouletteBetType::Odd, 0));
    }

    #[test]
    fn test_synthesized_outcomes_honor_the_decision() {
        for seed in 0..500u64 {
            let mut rng = stream(seed);
            for bet_type in &ALL_BET_TYPES {
                let winner = generate_winning_number(bet_type, &mut rng);
                assert!(
                    evaluate_bet(bet_type, winner),
                    "{:?} should win on {}",
                    bet_type,
                    winner
                );

                let loser = generate_losing_number(bet_type, &mut rng);
                assert!(
                    !evaluate_bet(bet_type, loser),
                    "{:?} should lose on {}",
                    bet_type,
                    loser
                );
            }
        }
    }

    #[test]
    fn test_straight_win_is_exact() {
        for n in 0..=36u8 {
            let mut rng = stream(n as u64);
            assert_eq!(
                generate_winning_number(&RouletteBetType::Straight(n), &mut rng),
                n
            );
        }
    }

    #[test]
    fn test_full_rate_always_wins() {
        // bet 10000 on red at 100% must win on a red number
        let config = WinRateConfig {
            win_rate_percent: 100.0,
            use_organic: false,
        };
        for seed in 0..200u64 {
            let mut rng = stream(seed);
            let number = play(&RouletteBetType::Red, &config, &mut rng);
            assert!(evaluate_bet(&RouletteBetType::Red, number));
            assert_eq!(get_color(number), Color::Red);

            let amount = 10_000u64;
            let win_amount = amount * payout_multiplier(&RouletteBetType::Red);
            assert_eq!(win_amount, 10_000);
        }
    }

    #[test]
    fn test_zero_rate_never_wins() {
        // straight bet on 17 at 0% must never land on 17
        let config = WinRateConfig {
            win_rate_percent: 0.0,
            use_organic: false,
        };
        for seed in 0..200u64 {
            let mut rng = stream(seed);
            let number = play(&RouletteBetType::Straight(17), &config, &mut rng);
            assert_ne!(number, 17);
            assert!(!evaluate_bet(&RouletteBetType::Straight(17), number));
        }
    }

    #[test]
    fn test_organic_ignores_the_rate() {
        // at 100% organic mode must still be able to lose
        let config = WinRateConfig {
            win_rate_percent: 100.0,
            use_organic: true,
        };
        let mut losses = 0;
        for seed in 0..300u64 {
            let mut rng = stream(seed);
            let number = play(&RouletteBetType::Red, &config, &mut rng);
            assert!(number <= 36);
            if !evaluate_bet(&RouletteBetType::Red, number) {
                losses += 1;
            }
        }
        assert!(losses > 0, "organic mode must not be manipulated");
    }

    #[test]
    fn test_decide_win_boundaries() {
        let always = WinRateConfig {
            win_rate_percent: 100.0,
            use_organic: false,
        };
        let never = WinRateConfig {
            win_rate_percent: 0.0,
            use_organic: false,
        };
        for seed in 0..100u64 {
            assert!(decide_win(&always, &mut stream(seed)));
            assert!(!decide_win(&never, &mut stream(seed)));
        }
    }
}

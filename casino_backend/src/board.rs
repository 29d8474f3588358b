// European Roulette Board Layout

use crate::types::Color;

pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

pub const BLACK_NUMBERS: [u8; 18] = [
    2, 4, 6, 8, 10, 11, 13, 15, 17, 20, 22, 24, 26, 28, 29, 31, 33, 35,
];

/// Color of a pocket. Zero is the single green pocket.
pub fn get_color(number: u8) -> Color {
    if number == 0 {
        Color::Green
    } else if RED_NUMBERS.contains(&number) {
        Color::Red
    } else {
        Color::Black
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_green() {
        assert_eq!(get_color(0), Color::Green);
    }

    #[test]
    fn test_layout_is_complete() {
        // 18 red + 18 black + green zero covers the whole wheel
        let reds = (1..=36).filter(|n| get_color(*n) == Color::Red).count();
        let blacks = (1..=36).filter(|n| get_color(*n) == Color::Black).count();
        assert_eq!(reds, 18);
        assert_eq!(blacks, 18);
        for n in 1..=36u8 {
            assert!(RED_NUMBERS.contains(&n) != BLACK_NUMBERS.contains(&n));
        }
    }

    #[test]
    fn test_known_colors() {
        assert_eq!(get_color(1), Color::Red);
        assert_eq!(get_color(2), Color::Black);
        assert_eq!(get_color(17), Color::Black);
        assert_eq!(get_color(36), Color::Red);
    }
}

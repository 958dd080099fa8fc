use rand::RngExt;

use super::types::ROOM_CODE_LENGTH;

/// Generate a 6-character room code drawn from `[A-Z0-9]`.
///
/// Each position is an independent draw from the 36-symbol base-36
/// alphabet, rendered uppercase so codes are easy to read out loud.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    let mut code = String::with_capacity(ROOM_CODE_LENGTH);
    while code.len() < ROOM_CODE_LENGTH {
        let digit: u8 = rng.random_range(0..36);
        let symbol = match digit {
            0..=9 => b'0' + digit,
            _ => b'A' + (digit - 10),
        };
        code.push(char::from(symbol));
    }
    code
}

/// Whether a string is a well-formed room code: `^[A-Z0-9]{6}$`.
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LENGTH
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

//! Human-readable codes carried alongside the UUID primary keys. Uniqueness
//! is ultimately enforced by the store; the random suffix only keeps
//! collisions unlikely.

use chrono::Utc;
use rand::Rng;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

fn base36_upper(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % 36) as usize] as char);
        n /= 36;
    }
    digits.iter().rev().collect()
}

/// `EVT-JAN2026-X7Q`
pub fn event_code() -> String {
    let month_year = Utc::now().format("%b%Y").to_string().to_uppercase();
    format!("EVT-{}-{}", month_year, random_suffix(3))
}

/// `BKG-<base36 unix millis>-X7Q`
pub fn booking_code() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    format!("BKG-{}-{}", base36_upper(millis), random_suffix(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_code_shape() {
        let code = event_code();
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts[0], "EVT");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 7); // MMMYYYY
        assert_eq!(parts[2].len(), 3);
        assert_eq!(code, code.to_uppercase());
    }

    #[test]
    fn booking_code_shape() {
        let code = booking_code();
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts[0], "BKG");
        assert_eq!(parts.len(), 3);
        assert!(parts[1].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(parts[2].len(), 3);
    }

    #[test]
    fn base36_matches_known_values() {
        assert_eq!(base36_upper(0), "0");
        assert_eq!(base36_upper(35), "Z");
        assert_eq!(base36_upper(36), "10");
        assert_eq!(base36_upper(46655), "ZZZ");
    }
}

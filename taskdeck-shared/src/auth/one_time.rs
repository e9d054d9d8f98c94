/// Single-use, time-boxed tokens for email verification and password reset
///
/// Each user has two independent token slots (verification, reset). A slot is
/// either unset, or holds a pending token with a 10-minute expiry. Consuming
/// or re-minting a token clears/overwrites the slot; expired tokens simply
/// fail at check time (no background sweep).
///
/// Tokens are 32 random bytes, hex-encoded (64 characters), drawn from the
/// OS RNG. They are opaque and carry no claims; lookup is by stored value.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

/// Validity window for verification and reset tokens
pub const TOKEN_TTL_MINUTES: i64 = 10;

/// Generates a fresh one-time token with its expiry timestamp
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::one_time::generate;
///
/// let (token, expires_at) = generate();
/// assert_eq!(token.len(), 64);
/// assert!(expires_at > chrono::Utc::now());
/// ```
pub fn generate() -> (String, DateTime<Utc>) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);

    let expires_at = Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES);
    (hex::encode(bytes), expires_at)
}

/// Checks whether a pending token's expiry has passed
///
/// The boundary is strict: a token whose `expires_at` equals the current
/// instant is already expired. A missing expiry (slot never set) also counts
/// as expired.
pub fn is_expired(expires_at: Option<DateTime<Utc>>) -> bool {
    match expires_at {
        Some(expires_at) => expires_at <= Utc::now(),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_hex_and_unique() {
        let (a, _) = generate();
        let (b, _) = generate();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_expiry_window() {
        let (_, expires_at) = generate();
        let window = expires_at - Utc::now();

        assert!(window <= Duration::minutes(TOKEN_TTL_MINUTES));
        assert!(window > Duration::minutes(TOKEN_TTL_MINUTES - 1));
    }

    #[test]
    fn test_is_expired_boundary() {
        // Exactly "now" is expired
        assert!(is_expired(Some(Utc::now())));
        assert!(is_expired(Some(Utc::now() - Duration::seconds(1))));
        assert!(!is_expired(Some(Utc::now() + Duration::minutes(5))));
        assert!(is_expired(None));
    }
}

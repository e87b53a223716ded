//! Shared secret generation.
//!
//! The secret is the only credential the server accepts. It is drawn from an
//! alphabet without look-alike characters so it can be read off a terminal and
//! typed into a browser prompt.

use rand::{rngs::OsRng, Rng};

/// Characters allowed in generated passwords.
///
/// ASCII letters and digits without `0`, `O`, `1`, `l` and `I`.
pub const PASSWORD_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789abcdefghijkmnopqrstuvwxyz";

/// Number of characters in a generated password.
///
/// 23 draws from 57 symbols gives about 134 bits of entropy.
pub const PASSWORD_LENGTH: usize = 23;

/// Generate a fresh random password from [`PASSWORD_ALPHABET`].
///
/// Uses the operating system's CSPRNG. Each character is drawn independently
/// and uniformly.
pub fn generate_password() -> String {
    let mut rng = OsRng;
    (0..PASSWORD_LENGTH)
        .map(|_| PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

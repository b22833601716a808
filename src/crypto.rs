use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::OrganizerError;

/// Default number of random bytes per token.
pub const DEFAULT_TOKEN_LENGTH: usize = 50;

/// Generates a cryptographically secure random token.
///
/// Draws `length` bytes from the operating system RNG and encodes them as
/// URL-safe base64 without padding, so the value can travel in a cookie, a
/// query string or a form field unchanged.
///
/// # Errors
///
/// Returns `OrganizerError::RandomSource` if the OS RNG cannot supply bytes.
///
/// # Example
///
/// ```rust
/// use organizer::crypto::generate_token;
///
/// let token = generate_token(50).unwrap();
/// assert_eq!(token.len(), 67);
/// ```
pub fn generate_token(length: usize) -> Result<String, OrganizerError> {
    generate_token_with(&mut OsRng, length)
}

/// Generates a token from the given RNG.
///
/// Fills through `try_fill_bytes` and propagates its error.
pub fn generate_token_with<R: RngCore + ?Sized>(
    rng: &mut R,
    length: usize,
) -> Result<String, OrganizerError> {
    let mut bytes = vec![0u8; length];
    rng.try_fill_bytes(&mut bytes).map_err(|e| {
        log::error!(target: "organizer", "msg=\"secure random source failed\", error=\"{e}\"");
        OrganizerError::RandomSource(e.to_string())
    })?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Length of generated short identifiers. With the 64-symbol URL-safe
/// alphabet this gives 126 bits of entropy.
pub const SHORT_ID_LEN: usize = 21;

/// Generate a fresh URL-safe short identifier.
pub fn generate_short_id() -> String {
    nanoid::nanoid!(SHORT_ID_LEN)
}

//! Keyboard codes that end the detection loop.

/// ASCII escape.
pub const ESCAPE_KEY: i32 = 27;
/// Lowercase `q`.
pub const QUIT_KEY: i32 = b'q' as i32;

/// Low byte of a raw key code as returned by a `waitKey`-style poll.
///
/// A poll that saw no key returns `-1`, whose low byte (255) matches nothing.
pub const fn key_code(raw: i32) -> i32 {
    raw & 0xFF
}

/// True when `raw` is escape or `q`.
pub const fn is_quit_key(raw: i32) -> bool {
    let code = key_code(raw);
    code == ESCAPE_KEY || code == QUIT_KEY
}

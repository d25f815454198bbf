//! Sign marker resolution.
//!
//! A sign whose text reads
//!
//! ```text
//! [Notice]
//! <n>
//! <anything>
//! SyncSign
//! ```
//!
//! asks to display notice number `n`. Anything else is an ordinary sign.

/// Literal first line of a marker.
pub const NOTICE_TAG: &str = "[Notice]";

/// Literal last line of a marker.
pub const SIGN_TAG: &str = "SyncSign";

/// Notice number requested by a marker, or `0` when `lines` is not a marker.
///
/// The number is returned verbatim, negatives included; bounds checking is
/// left to the registry lookup.
pub fn resolve_index<S: AsRef<str>>(lines: &[S]) -> i32 {
    let [first, number, _, last] = lines else {
        return 0;
    };
    if first.as_ref() != NOTICE_TAG || last.as_ref() != SIGN_TAG {
        return 0;
    }
    number.as_ref().parse::<i32>().unwrap_or(0)
}

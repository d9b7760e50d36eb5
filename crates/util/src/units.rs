//! # Unit Formatting
//!
//! Scaling of byte counts into `K`/`M`/`G` strings and of elapsed seconds
//! into a compact `1d02h03m04s` form, as printed in the report tables.

const KIB: i64 = 1024;
const MIB: i64 = 1024 * KIB;
const GIB: i64 = 1024 * MIB;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Bytes in one mebibyte, for converting `*_in_mb` fields.
pub const BYTES_PER_MB: i64 = MIB;

/// Formats a byte count using the largest unit that still leaves at least
/// two digits.
///
/// Values are truncated, never rounded.
///
/// # Example
/// ```rust
/// use panzer_util::units::format_unit;
///
/// assert_eq!(format_unit(512), "512");
/// assert_eq!(format_unit(20480), "20K");
/// assert_eq!(format_unit(20971520), "20M");
/// assert_eq!(format_unit(21474836480), "20G");
/// ```
pub fn format_unit(value: i64) -> String {
    if value >= 10 * GIB {
        format!("{}G", value / GIB)
    } else if value >= 10 * MIB {
        format!("{}M", value / MIB)
    } else if value >= 10 * KIB {
        format!("{}K", value / KIB)
    } else {
        value.to_string()
    }
}

/// Formats a megabyte count with [`format_unit`].
pub fn format_megabytes(megabytes: i64) -> String {
    format_unit(megabytes.saturating_mul(BYTES_PER_MB))
}

/// Formats elapsed seconds as days, hours, minutes and seconds, omitting
/// leading zero units.
///
/// # Example
/// ```rust
/// use panzer_util::units::format_elapsed_time;
///
/// assert_eq!(format_elapsed_time(45), "45s");
/// assert_eq!(format_elapsed_time(125), "2m05s");
/// assert_eq!(format_elapsed_time(3725), "1h02m05s");
/// assert_eq!(format_elapsed_time(90000), "1d01h00m00s");
/// ```
pub fn format_elapsed_time(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let days = seconds / SECS_PER_DAY;
    let hours = (seconds % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (seconds % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let secs = seconds % SECS_PER_MINUTE;

    if days > 0 {
        format!("{days}d{hours:02}h{minutes:02}m{secs:02}s")
    } else if hours > 0 {
        format!("{hours}h{minutes:02}m{secs:02}s")
    } else if minutes > 0 {
        format!("{minutes}m{secs:02}s")
    } else {
        format!("{secs}s")
    }
}

/// Integer percentage of `part` in `whole`; zero when `whole` is not positive.
pub fn percent_of(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    part.saturating_mul(100) / whole
}

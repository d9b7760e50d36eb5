//! Color roles used by the report tables.
//!
//! Whether escapes are emitted at all is decided by `colored`, which honours
//! `NO_COLOR`, `CLICOLOR` and `CLICOLOR_FORCE` and skips coloring when stdout
//! is not a terminal. Writes to other streams decide with
//! [`colors_enabled_for`] and [`set_colors_enabled`].

use std::env;

use colored::Colorize;

/// Healthy values: started apps, running instances, low usage.
pub fn success(text: &str) -> String {
    text.green().bold().to_string()
}

/// Failures and values above their alert threshold.
pub fn failure(text: &str) -> String {
    text.red().bold().to_string()
}

/// Values worth a second look, such as under-used memory.
pub fn advisory(text: &str) -> String {
    text.yellow().bold().to_string()
}

/// Names of orgs, spaces, users and transitional states.
pub fn entity_name(text: &str) -> String {
    text.cyan().bold().to_string()
}

/// Stopped apps and the totals summary line.
pub fn stopped(text: &str) -> String {
    text.bright_black().bold().to_string()
}

/// Table headers.
pub fn header(text: &str) -> String {
    text.bold().to_string()
}

/// Force coloring on or off, overriding the environment.
pub fn set_colors_enabled(enabled: bool) {
    colored::control::set_override(enabled);
}

/// Whether a stream should be colored, applying the environment the way
/// `colored` does for stdout: `CLICOLOR_FORCE` wins, then `NO_COLOR`, then
/// `CLICOLOR=0`, then the terminal check.
pub fn colors_enabled_for(stream_is_terminal: bool) -> bool {
    let value = |name: &str| env::var(name).ok().filter(|value| !value.is_empty());
    if value("CLICOLOR_FORCE").is_some_and(|value| value != "0") {
        return true;
    }
    if value("NO_COLOR").is_some() || value("CLICOLOR").is_some_and(|value| value == "0") {
        return false;
    }
    stream_is_terminal
}

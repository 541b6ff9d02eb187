//! Migration branch names.

use chrono::{DateTime, Local, TimeZone};

pub const DEFAULT_PREFIX: &str = "promote";

/// `<prefix>_<yymmddHHMM>_<pid>`
///
/// Two runs started in the same minute with the same pid collide; that is
/// accepted for a tool started by hand.
pub fn branch_name<Tz: TimeZone>(prefix: &str, now: &DateTime<Tz>, pid: u32) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}_{}", prefix, now.format("%y%m%d%H%M"), pid)
}

/// Branch name for the current process at the current local time.
pub fn generate(prefix: &str) -> String {
    branch_name(prefix, &Local::now(), std::process::id())
}

//! Raw directory entry to [`UserRecord`] conversion.
//!
//! Never fails: every undecodable or absent attribute turns into the column's
//! default, so each input entry yields exactly one record.
use std::fmt::Display;

use chrono::{Datelike, Local, TimeZone};
use log::debug;

use crate::directory::RawEntry;
use crate::record::{NEVER, UserRecord};

/// `userAccountControl` bit marking a disabled account.
pub const UF_ACCOUNTDISABLE: i64 = 0x2;
/// Seconds between 1601-01-01 and 1970-01-01.
pub const FILETIME_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;
/// 100-nanosecond intervals per second.
pub const FILETIME_TICKS_PER_SEC: i64 = 10_000_000;
/// Output layout of the `LastLogon` column.
pub const LAST_LOGON_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Enabled iff the attribute parses and the disable bit is clear. Absent or
/// unparsable values count as disabled.
pub fn decode_enabled(user_account_control: Option<&str>) -> bool {
    match user_account_control.map(|v| v.trim().parse::<i64>()) {
        Some(Ok(flags)) => flags & UF_ACCOUNTDISABLE == 0,
        Some(Err(e)) => {
            debug!("unparsable userAccountControl: {}", e);
            false
        }
        None => false,
    }
}

/// Decode a FILETIME `lastLogon` value into local time.
pub fn decode_last_logon(raw: Option<&str>) -> String {
    decode_last_logon_in(raw, &Local)
}

/// Decode a FILETIME `lastLogon` value in the given zone. Absent, zero,
/// non-numeric and out-of-range values become [`NEVER`].
pub fn decode_last_logon_in<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(ticks) = raw.and_then(|v| v.trim().parse::<i64>().ok()) else {
        return NEVER.to_string();
    };
    if ticks == 0 {
        return NEVER.to_string();
    }
    let secs = ticks.div_euclid(FILETIME_TICKS_PER_SEC) - FILETIME_EPOCH_OFFSET_SECS;
    match tz.timestamp_opt(secs, 0).single() {
        Some(dt) if (1..=9999).contains(&dt.year()) => dt.format(LAST_LOGON_FORMAT).to_string(),
        _ => {
            debug!("lastLogon out of range: {}", ticks);
            NEVER.to_string()
        }
    }
}

pub fn normalize_entry(entry: &RawEntry) -> UserRecord {
    let text = |attr: &str| entry.first(attr).unwrap_or_default().to_string();
    UserRecord {
        sam_account_name: text("sAMAccountName"),
        display_name: text("displayName"),
        email: text("mail"),
        title: text("title"),
        department: text("department"),
        enabled: decode_enabled(entry.first("userAccountControl")),
        last_logon: decode_last_logon(entry.first("lastLogon")),
    }
}

pub fn normalize_entries(entries: &[RawEntry]) -> Vec<UserRecord> {
    entries.iter().map(normalize_entry).collect()
}

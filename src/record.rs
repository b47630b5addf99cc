//! Output row model for exported directory users.
//!
//! A `UserRecord` always carries a value for every column: strings default to
//! empty, `enabled` defaults to `false` and `last_logon` to [`NEVER`].
//! Column order for every writer is [`UserRecord::HEADERS`].

/// Placeholder written when an account has no usable logon timestamp.
pub const NEVER: &str = "Never";

/// One normalized directory user, ready to be written as a spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub sam_account_name: String,
    pub display_name: String,
    pub email: String,
    pub title: String,
    pub department: String,
    pub enabled: bool,
    pub last_logon: String,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRecord {
    /// Header row, in column order.
    pub const HEADERS: [&'static str; 7] = [
        "SamAccountName",
        "DisplayName",
        "Email",
        "Title",
        "Department",
        "Enabled",
        "LastLogon",
    ];

    /// Construct a record with every column at its default.
    pub fn new() -> Self {
        Self {
            sam_account_name: String::new(),
            display_name: String::new(),
            email: String::new(),
            title: String::new(),
            department: String::new(),
            enabled: false,
            last_logon: NEVER.to_string(),
        }
    }

    /// The five string columns preceding `Enabled`, in header order.
    pub fn text_columns(&self) -> [&str; 5] {
        [
            self.sam_account_name.as_str(),
            self.display_name.as_str(),
            self.email.as_str(),
            self.title.as_str(),
            self.department.as_str(),
        ]
    }

    pub fn has_logged_on(&self) -> bool {
        self.last_logon != NEVER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_has_defaults_for_every_column() {
        let r = UserRecord::new();
        assert!(r.text_columns().iter().all(|c| c.is_empty()));
        assert!(!r.enabled);
        assert_eq!(r.last_logon, "Never");
        assert!(!r.has_logged_on());
    }

    #[test]
    fn headers_match_column_order() {
        assert_eq!(UserRecord::HEADERS.len(), 7);
        assert_eq!(UserRecord::HEADERS[0], "SamAccountName");
        assert_eq!(UserRecord::HEADERS[5], "Enabled");
        assert_eq!(UserRecord::HEADERS[6], "LastLogon");
    }
}

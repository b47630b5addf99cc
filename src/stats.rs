//! Account-state counts over exported records, logged after a successful run.
use crate::record::UserRecord;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub never_logged_on: usize,
}

pub fn summarize(users: &[UserRecord]) -> ExportSummary {
    let enabled = users.iter().filter(|u| u.enabled).count();
    ExportSummary {
        total: users.len(),
        enabled,
        disabled: users.len() - enabled,
        never_logged_on: users.iter().filter(|u| !u.has_logged_on()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_enabled_and_never_logged_on() {
        let a = UserRecord {
            enabled: true,
            last_logon: "2019-04-17 18:40:00".into(),
            ..UserRecord::new()
        };
        let b = UserRecord {
            enabled: true,
            ..UserRecord::new()
        };
        let c = UserRecord::new();
        let s = summarize(&[a, b, c]);
        assert_eq!(
            s,
            ExportSummary {
                total: 3,
                enabled: 2,
                disabled: 1,
                never_logged_on: 2,
            }
        );
    }
}

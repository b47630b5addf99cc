//! Engine: runs one export from a resolved profile. Binds a session, checks
//! read access, queries users, normalizes them and writes the output file.
//! The session is unbound on every path once the bind has succeeded.
//!
//! Typical usage:
//!
//! ```no_run
//! use std::path::Path;
//! use adexport::config::{ConnectionArgs, FileSettings, resolve, DEFAULT_FILTER};
//! use adexport::engine::Engine;
//! # fn main() -> anyhow::Result<()> {
//! let args = ConnectionArgs {
//!     server: Some("dc01.corp.local".into()),
//!     user: Some("CORP\\reader".into()),
//!     password: Some("secret".into()),
//!     base: Some("DC=corp,DC=local".into()),
//!     starttls: false,
//! };
//! let profile = resolve(&args, &FileSettings::default(), DEFAULT_FILTER, Path::new("AD_Users.xlsx"))?;
//! let outcome = Engine::new().run(&profile);
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```
use std::path::PathBuf;

use log::{error, info, warn};

use crate::access::check_read_access;
use crate::config::ConnectionProfile;
use crate::directory::{Connector, LdapConnector, SessionGuard};
use crate::export::save_users;
use crate::logging::SUCCESS_TARGET;
use crate::normalize::normalize_entries;
use crate::query::query_users;
use crate::stats::summarize;

/// How a run ended. Every variant is a normal termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Exported { users: usize, path: PathBuf },
    NoUsers,
    AccessDenied,
    ConnectionFailed,
    WriteFailed,
}

#[derive(Debug, Default)]
pub struct Engine<C: Connector = LdapConnector> {
    connector: C,
}

impl Engine<LdapConnector> {
    pub fn new() -> Self {
        Self {
            connector: LdapConnector,
        }
    }
}

impl<C: Connector> Engine<C> {
    pub fn with_connector(connector: C) -> Self {
        Self { connector }
    }

    pub fn run(&self, profile: &ConnectionProfile) -> RunOutcome {
        let session = match self.connector.bind(profile) {
            Ok(s) => s,
            Err(e) => {
                error!("failed to connect to the directory: {}", e);
                error!("could not establish a directory session");
                return RunOutcome::ConnectionFailed;
            }
        };
        info!("connected to {} as {}", profile.server, profile.user);

        let mut guard = SessionGuard::new(session);
        let outcome = self.run_bound(guard.session(), profile);
        if let Err(e) = guard.release() {
            warn!("unbind failed: {}", e);
        }
        outcome
    }

    fn run_bound(&self, session: &mut C::Session, profile: &ConnectionProfile) -> RunOutcome {
        info!("checking read access under {}", profile.base);
        if let Err(e) = check_read_access(session, profile) {
            error!("insufficient permissions to search the directory: {}", e);
            error!("stopped: the account cannot read directory objects");
            return RunOutcome::AccessDenied;
        }
        info!(target: SUCCESS_TARGET, "read access confirmed");

        let entries = match query_users(session, profile) {
            Ok(entries) => entries,
            Err(e) => {
                error!("{}", e);
                Vec::new()
            }
        };
        if entries.is_empty() {
            info!("search returned no users; check the filter and search base");
            info!("nothing to save");
            return RunOutcome::NoUsers;
        }

        let users = normalize_entries(&entries);
        info!("found {} users", users.len());

        if let Err(e) = save_users(&users, &profile.output) {
            error!("failed to write {}: {}", profile.output.display(), e);
            return RunOutcome::WriteFailed;
        }
        info!("data saved to {}", profile.output.display());
        let s = summarize(&users);
        info!(
            "summary: total={}, enabled={}, disabled={}, never_logged_on={}",
            s.total, s.enabled, s.disabled, s.never_logged_on
        );
        RunOutcome::Exported {
            users: users.len(),
            path: profile.output.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionArgs, DEFAULT_FILTER, FileSettings, resolve};
    use crate::directory::{
        ConnectionError, DirectoryError, DirectorySession, RC_SIZE_LIMIT_EXCEEDED, RawEntry,
        SearchRequest, SearchResponse,
    };
    use std::cell::{Cell, RefCell};
    use std::path::Path;
    use std::rc::Rc;
    use tempfile::tempdir;

    /// In-memory directory: answers the access check and the user query.
    #[derive(Clone, Default)]
    struct FakeDirectory {
        entries: Vec<RawEntry>,
        /// Answer to the full query when it differs from what the access check sees.
        query_entries: Option<Vec<RawEntry>>,
        deny_access: bool,
        fail_query: bool,
        refuse_bind: bool,
        searches: Rc<RefCell<Vec<Option<i32>>>>,
        unbinds: Rc<Cell<usize>>,
    }

    struct FakeSession(FakeDirectory);

    impl DirectorySession for FakeSession {
        fn search(&mut self, r: &SearchRequest<'_>) -> Result<SearchResponse, DirectoryError> {
            let dir = &self.0;
            dir.searches.borrow_mut().push(r.size_limit);
            if let Some(limit) = r.size_limit {
                if dir.deny_access {
                    return Ok(SearchResponse {
                        rc: 50,
                        text: "insufficientAccessRights".into(),
                        ..Default::default()
                    });
                }
                let entries: Vec<RawEntry> =
                    dir.entries.iter().take(limit as usize).cloned().collect();
                let rc = if dir.entries.len() > entries.len() {
                    RC_SIZE_LIMIT_EXCEEDED
                } else {
                    0
                };
                return Ok(SearchResponse {
                    entries,
                    rc,
                    ..Default::default()
                });
            }
            if dir.fail_query {
                return Err(DirectoryError::Unavailable("connection reset".into()));
            }
            Ok(SearchResponse {
                entries: dir.query_entries.clone().unwrap_or_else(|| dir.entries.clone()),
                ..Default::default()
            })
        }

        fn unbind(&mut self) -> Result<(), DirectoryError> {
            self.0.unbinds.set(self.0.unbinds.get() + 1);
            Ok(())
        }
    }

    impl Connector for FakeDirectory {
        type Session = FakeSession;

        fn bind(&self, _: &ConnectionProfile) -> Result<FakeSession, ConnectionError> {
            if self.refuse_bind {
                return Err(ConnectionError::Connect {
                    url: "ldap://unreachable".into(),
                    source: ldap3::LdapError::from(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "refused",
                    )),
                });
            }
            Ok(FakeSession(self.clone()))
        }
    }

    fn profile(output: &Path) -> ConnectionProfile {
        let args = ConnectionArgs {
            server: Some("dc".into()),
            user: Some("CORP\\reader".into()),
            password: Some("p".into()),
            base: Some("DC=corp".into()),
            starttls: false,
        };
        resolve(&args, &FileSettings::default(), DEFAULT_FILTER, output).unwrap()
    }

    fn users() -> Vec<RawEntry> {
        vec![
            RawEntry::new("CN=a")
                .with_attr("sAMAccountName", &["a"])
                .with_attr("userAccountControl", &["512"]),
            RawEntry::new("CN=b").with_attr("sAMAccountName", &["b"]),
        ]
    }

    #[test]
    fn exports_all_users_and_releases_session() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("users.xlsx");
        let fake = FakeDirectory {
            entries: users(),
            ..Default::default()
        };
        let outcome = Engine::with_connector(fake.clone()).run(&profile(&out));
        assert_eq!(
            outcome,
            RunOutcome::Exported {
                users: 2,
                path: out.clone()
            }
        );
        assert!(out.exists());
        assert_eq!(fake.unbinds.get(), 1);
        assert_eq!(*fake.searches.borrow(), vec![Some(1), None]);
    }

    #[test]
    fn denied_access_skips_query_and_still_unbinds() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("users.xlsx");
        let fake = FakeDirectory {
            entries: users(),
            deny_access: true,
            ..Default::default()
        };
        let outcome = Engine::with_connector(fake.clone()).run(&profile(&out));
        assert_eq!(outcome, RunOutcome::AccessDenied);
        assert_eq!(fake.searches.borrow().len(), 1);
        assert_eq!(fake.unbinds.get(), 1);
        assert!(!out.exists());
    }

    #[test]
    fn no_matches_never_writes() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("users.xlsx");
        let fake = FakeDirectory::default();
        let outcome = Engine::with_connector(fake.clone()).run(&profile(&out));
        // an empty access check already means nothing is readable under the base
        assert_eq!(outcome, RunOutcome::AccessDenied);
        assert!(!out.exists());
        assert_eq!(fake.unbinds.get(), 1);
    }

    #[test]
    fn failed_query_is_treated_as_empty() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("users.xlsx");
        let fake = FakeDirectory {
            entries: users(),
            fail_query: true,
            ..Default::default()
        };
        let outcome = Engine::with_connector(fake.clone()).run(&profile(&out));
        assert_eq!(outcome, RunOutcome::NoUsers);
        assert!(!out.exists());
        assert_eq!(fake.unbinds.get(), 1);
    }

    #[test]
    fn empty_query_after_granted_access_writes_nothing() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("users.xlsx");
        let fake = FakeDirectory {
            entries: users(),
            query_entries: Some(Vec::new()),
            ..Default::default()
        };
        let outcome = Engine::with_connector(fake.clone()).run(&profile(&out));
        assert_eq!(outcome, RunOutcome::NoUsers);
        assert_eq!(*fake.searches.borrow(), vec![Some(1), None]);
        assert!(!out.exists());
        assert_eq!(fake.unbinds.get(), 1);
    }

    #[test]
    fn bind_failure_never_searches() {
        let dir = tempdir().unwrap();
        let fake = FakeDirectory {
            refuse_bind: true,
            ..Default::default()
        };
        let outcome =
            Engine::with_connector(fake.clone()).run(&profile(&dir.path().join("u.xlsx")));
        assert_eq!(outcome, RunOutcome::ConnectionFailed);
        assert!(fake.searches.borrow().is_empty());
        assert_eq!(fake.unbinds.get(), 0);
    }

    #[test]
    fn write_failure_is_reported_and_session_released() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("missing").join("users.xlsx");
        let fake = FakeDirectory {
            entries: users(),
            ..Default::default()
        };
        let outcome = Engine::with_connector(fake.clone()).run(&profile(&out));
        assert_eq!(outcome, RunOutcome::WriteFailed);
        assert_eq!(fake.unbinds.get(), 1);
    }
}

//! Directory session: bind and search over LDAP.
//!
//! The pipeline talks to the directory through two narrow traits so that the
//! stages never depend on a concrete client:
//!
//! - [`Connector::bind`] turns a resolved profile into an authenticated session.
//! - [`DirectorySession::search`] runs a subtree search and returns raw entries
//!   together with the server's result code and diagnostic text.
//!
//! [`SessionGuard`] owns a bound session and unbinds it exactly once, either on
//! an explicit [`SessionGuard::release`] or when dropped.
use std::collections::HashMap;
use std::fmt;

use ldap3::{LdapConn, LdapConnSettings, Scope, SearchEntry, SearchOptions, SearchResult};
use log::{debug, warn};

use crate::config::ConnectionProfile;

/// LDAP result code `success`.
pub const RC_SUCCESS: u32 = 0;
/// LDAP result code `sizeLimitExceeded`; entries up to the limit are valid.
pub const RC_SIZE_LIMIT_EXCEEDED: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("cannot connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: ldap3::LdapError,
    },
    #[error("bind as {user} rejected: {source}")]
    Bind {
        user: String,
        #[source]
        source: ldap3::LdapError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("ldap operation failed: {0}")]
    Ldap(#[from] ldap3::LdapError),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// A directory object as returned by a search: DN plus multi-valued
/// attributes. Attribute names are looked up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl RawEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    /// Builder used to assemble entries by hand.
    pub fn with_attr(mut self, name: &str, values: &[&str]) -> Self {
        self.attrs.insert(
            name.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.attrs
            .get(name)
            .or_else(|| {
                self.attrs
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(Vec::as_slice)
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }
}

impl From<SearchEntry> for RawEntry {
    fn from(e: SearchEntry) -> Self {
        Self {
            dn: e.dn,
            attrs: e.attrs,
        }
    }
}

/// Parameters of a single subtree search.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub base: &'a str,
    pub filter: &'a str,
    pub attrs: &'a [&'a str],
    pub size_limit: Option<i32>,
}

/// Entries plus the directory's verdict on the search.
#[derive(Debug, Clone, Default)]
pub struct SearchResponse {
    pub entries: Vec<RawEntry>,
    pub rc: u32,
    pub matched: String,
    pub text: String,
}

impl SearchResponse {
    /// A size-limited search that hit its cap still returned valid entries.
    pub fn is_success(&self) -> bool {
        self.rc == RC_SUCCESS || self.rc == RC_SIZE_LIMIT_EXCEEDED
    }
}

impl fmt::Display for SearchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rc={}, entries={}, matched={:?}, text={:?}",
            self.rc,
            self.entries.len(),
            self.matched,
            self.text
        )
    }
}

/// An authenticated handle able to run searches.
pub trait DirectorySession {
    fn search(&mut self, request: &SearchRequest<'_>) -> Result<SearchResponse, DirectoryError>;
    fn unbind(&mut self) -> Result<(), DirectoryError>;
}

/// Produces authenticated sessions from a resolved profile.
pub trait Connector {
    type Session: DirectorySession;

    fn bind(&self, profile: &ConnectionProfile) -> Result<Self::Session, ConnectionError>;
}

/// Normalize a server address into an LDAP URL. Bare hosts and `host:port`
/// get the `ldap://` scheme.
pub fn ldap_url(server: &str) -> String {
    let server = server.trim();
    if server.contains("://") {
        server.to_string()
    } else {
        format!("ldap://{}", server)
    }
}

/// Connector backed by the blocking `ldap3` client.
#[derive(Debug, Default, Clone, Copy)]
pub struct LdapConnector;

impl Connector for LdapConnector {
    type Session = LdapSession;

    fn bind(&self, profile: &ConnectionProfile) -> Result<LdapSession, ConnectionError> {
        let url = ldap_url(&profile.server);
        let starttls = profile.starttls && url.starts_with("ldap://");
        debug!("connecting to {} (starttls={})", url, starttls);
        let settings = LdapConnSettings::new().set_starttls(starttls);
        let mut conn = LdapConn::with_settings(settings, &url)
            .map_err(|source| ConnectionError::Connect {
                url: url.clone(),
                source,
            })?;
        conn.simple_bind(&profile.user, &profile.password)
            .and_then(|res| res.success())
            .map_err(|source| ConnectionError::Bind {
                user: profile.user.clone(),
                source,
            })?;
        debug!("bound to {} as {}", url, profile.user);
        Ok(LdapSession { conn })
    }
}

pub struct LdapSession {
    conn: LdapConn,
}

impl DirectorySession for LdapSession {
    fn search(&mut self, request: &SearchRequest<'_>) -> Result<SearchResponse, DirectoryError> {
        if let Some(limit) = request.size_limit {
            self.conn
                .with_search_options(SearchOptions::new().sizelimit(limit));
        }
        let SearchResult(entries, result) = self.conn.search(
            request.base,
            Scope::Subtree,
            request.filter,
            request.attrs,
        )?;
        Ok(SearchResponse {
            entries: entries
                .into_iter()
                .map(SearchEntry::construct)
                .map(RawEntry::from)
                .collect(),
            rc: result.rc,
            matched: result.matched,
            text: result.text,
        })
    }

    fn unbind(&mut self) -> Result<(), DirectoryError> {
        self.conn.unbind()?;
        Ok(())
    }
}

/// Owns a bound session for the length of a run and unbinds it exactly once.
pub struct SessionGuard<S: DirectorySession> {
    session: S,
    released: bool,
}

impl<S: DirectorySession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            released: false,
        }
    }

    pub fn session(&mut self) -> &mut S {
        &mut self.session
    }

    /// Unbind now and report the outcome instead of logging it.
    pub fn release(mut self) -> Result<(), DirectoryError> {
        self.released = true;
        self.session.unbind()
    }
}

impl<S: DirectorySession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.session.unbind() {
            Ok(()) => debug!("directory session released"),
            Err(e) => warn!("unbind failed: {}", e),
        }
    }
}

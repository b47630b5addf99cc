//! Read-permission check run before the full user query.
//!
//! Searches the configured base with the configured filter, asking only for
//! `cn` and at most one entry. Anything short of one returned entry with a
//! non-error result code means the session cannot read the directory.
use crate::config::ConnectionProfile;
use crate::directory::{DirectoryError, DirectorySession, SearchRequest, SearchResponse};

/// Single attribute requested by the access check.
pub const ACCESS_CHECK_ATTRIBUTE: &str = "cn";
/// Entry cap for the access check search.
pub const ACCESS_CHECK_SIZE_LIMIT: i32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum AccessDenied {
    #[error("search returned no entries ({0})")]
    NoEntries(SearchResponse),
    #[error("search rejected by the directory ({0})")]
    Rejected(SearchResponse),
    #[error("access check search failed: {0}")]
    Failed(#[from] DirectoryError),
}

pub fn check_read_access<S: DirectorySession>(
    session: &mut S,
    profile: &ConnectionProfile,
) -> Result<(), AccessDenied> {
    let attrs = [ACCESS_CHECK_ATTRIBUTE];
    let response = session.search(&SearchRequest {
        base: &profile.base,
        filter: &profile.filter,
        attrs: &attrs,
        size_limit: Some(ACCESS_CHECK_SIZE_LIMIT),
    })?;
    if !response.is_success() {
        return Err(AccessDenied::Rejected(response));
    }
    if response.entries.is_empty() {
        return Err(AccessDenied::NoEntries(response));
    }
    Ok(())
}

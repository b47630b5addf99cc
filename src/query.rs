//! Full user search.
use log::warn;

use crate::config::ConnectionProfile;
use crate::directory::{
    DirectoryError, DirectorySession, RC_SIZE_LIMIT_EXCEEDED, SearchRequest, SearchResponse,
};

pub use crate::directory::RawEntry;

/// Attributes fetched for every user, in the order they feed the output columns.
pub const USER_ATTRIBUTES: [&str; 7] = [
    "sAMAccountName",
    "displayName",
    "mail",
    "title",
    "department",
    "userAccountControl",
    "lastLogon",
];

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("user search failed: {0}")]
    Directory(#[from] DirectoryError),
    #[error("user search rejected by the directory ({0})")]
    Rejected(SearchResponse),
}

/// Run the unpaged user search. An empty `Vec` is a valid answer.
pub fn query_users<S: DirectorySession>(
    session: &mut S,
    profile: &ConnectionProfile,
) -> Result<Vec<RawEntry>, QueryError> {
    let response = session.search(&SearchRequest {
        base: &profile.base,
        filter: &profile.filter,
        attrs: &USER_ATTRIBUTES,
        size_limit: None,
    })?;
    if !response.is_success() {
        return Err(QueryError::Rejected(response));
    }
    if response.rc == RC_SIZE_LIMIT_EXCEEDED {
        warn!(
            "server size limit reached after {} entries; results are truncated",
            response.entries.len()
        );
    }
    Ok(response.entries)
}

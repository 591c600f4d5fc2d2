//! Member checks against the node's expected coordination endpoint.

use url::Url;

use crate::error::{ClusterError, ClusterResult};

/// A parsed coordination-cluster member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub url: Url,
}

impl Member {
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}

/// Parse `raw` and check it uses `expected_scheme` and `expected_host`.
pub fn check_member(raw: &str, expected_scheme: &str, expected_host: &str) -> ClusterResult<Member> {
    let invalid = |reason: String| ClusterError::InvalidMember {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    let member = Member { url };

    if member.scheme() != expected_scheme {
        return Err(invalid(format!(
            "scheme '{}' != '{expected_scheme}'",
            member.scheme()
        )));
    }
    if member.host() != expected_host {
        return Err(invalid(format!(
            "host '{}' != '{expected_host}'",
            member.host()
        )));
    }
    Ok(member)
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::client::SharePointClient;
use super::constants;

/// Tenant prefix plus site-relative path naming one SharePoint site.
///
/// Both fields are compared exactly, so `/sites/Test` and `/sites/test` are
/// different sites as far as the connection cache is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteIdentity {
    pub tenant_prefix: String,
    pub site_relative_path: String,
}

impl SiteIdentity {
    pub fn new(tenant_prefix: impl Into<String>, site_relative_path: impl Into<String>) -> Self {
        Self {
            tenant_prefix: tenant_prefix.into(),
            site_relative_path: site_relative_path.into(),
        }
    }

    /// Absolute URL of the site. The path is appended as-is, so it needs its own leading slash.
    pub fn base_url(&self) -> String {
        constants::site_url(&self.tenant_prefix, &self.site_relative_path)
    }
}

impl fmt::Display for SiteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tenant_prefix, self.site_relative_path)
    }
}

/// A cached client together with the identity it was built for
#[derive(Clone)]
pub struct SiteConnection {
    pub identity: SiteIdentity,
    pub client: Arc<SharePointClient>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_equality_is_exact() {
        let a = SiteIdentity::new("contoso", "/sites/Test");

        assert_eq!(a, SiteIdentity::new("contoso", "/sites/Test"));
        assert_ne!(a, SiteIdentity::new("Contoso", "/sites/Test"));
        assert_ne!(a, SiteIdentity::new("contoso", "/sites/test"));
    }

    #[test]
    fn test_base_url_concatenates_path() {
        assert_eq!(
            SiteIdentity::new("contoso", "/sites/Test").base_url(),
            "https://contoso.sharepoint.com/sites/Test"
        );
        // no separator is inserted
        assert_eq!(
            SiteIdentity::new("contoso", "sites/Test").base_url(),
            "https://contoso.sharepoint.comsites/Test"
        );
        assert_eq!(SiteIdentity::new("", "").base_url(), "https://.sharepoint.com");
    }
}

//! URL builders and header values for the SharePoint REST API

/// DNS suffix of SharePoint Online tenants
pub const SHAREPOINT_DOMAIN: &str = "sharepoint.com";

/// REST API root, relative to a site URL
pub const API_BASE_PATH: &str = "/_api";

/// Extra scope requested on local runs, see [`crate::auth::sharepoint_scopes`]
pub const SITES_SELECTED_SCOPE: &str = "Sites.Selected";

/// Retry budget of the transport behavior (total attempts, first try included)
pub const TRANSPORT_MAX_ATTEMPTS: u32 = 4;

/// Standard headers for SharePoint requests
pub mod headers {
    /// Custom header carrying the configured user agent
    pub const USER_AGENT_CUSTOM: &str = "UserAgent";

    /// Client tag header, also set to the configured user agent
    pub const CLIENT_TAG: &str = "X-ClientTag";

    /// Client tag used by SharePoint for request attribution
    pub const CLIENT_SERVICE_CLIENT_TAG: &str = "X-ClientService-ClientTag";

    /// Per-request correlation id echoed back by SharePoint
    pub const CLIENT_REQUEST_ID: &str = "client-request-id";

    pub const ACCEPT_JSON: &str = "application/json;odata=nometadata";

    pub const CONTENT_TYPE_JSON: &str = "application/json;odata=nometadata;charset=utf-8";

    /// Default `User-Agent`, following the ISV decoration SharePoint asks for
    pub const LIBRARY_USER_AGENT: &str = concat!("NONISV|SpoConnect|spo-connect/", env!("CARGO_PKG_VERSION"));

    pub const LIBRARY_CLIENT_TAG: &str = concat!("spo-connect:", env!("CARGO_PKG_VERSION"));
}

/// `https://{tenant_prefix}.sharepoint.com`
pub fn tenant_url(tenant_prefix: &str) -> String {
    format!("https://{}.{}", tenant_prefix, SHAREPOINT_DOMAIN)
}

/// `https://{tenant_prefix}.sharepoint.com{site_relative_path}`
pub fn site_url(tenant_prefix: &str, site_relative_path: &str) -> String {
    format!("{}{}", tenant_url(tenant_prefix), site_relative_path)
}

/// `https://{tenant_prefix}.sharepoint.com/.default`
pub fn default_scope(tenant_prefix: &str) -> String {
    format!("{}/.default", tenant_url(tenant_prefix))
}

/// Build a REST endpoint URL below a site
pub fn api_endpoint(base_url: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    format!("{}{}/{}", base_url, API_BASE_PATH, path)
}

/// Build the endpoint of a list addressed by its title
pub fn list_by_title_endpoint(base_url: &str, title: &str) -> String {
    // OData string literals escape quotes by doubling them
    let escaped = title.replace('\'', "''");
    api_endpoint(base_url, &format!("web/lists/getbytitle('{}')", urlencoding::encode(&escaped)))
}

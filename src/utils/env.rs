/// Get environment variable with DASHBOARD_ prefix, falling back to unprefixed version
///
/// This helper function checks for `DASHBOARD_{key}` first, then falls back to `{key}`
/// so deployments that already export `ADMIN_PASSWORD` or `PORT` keep working.
///
/// # Examples
///
/// ```rust
/// use outreach_dashboard::utils::get_env_with_prefix;
///
/// // Checks DASHBOARD_PORT first, then PORT
/// let port = get_env_with_prefix("PORT");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("DASHBOARD_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
        .filter(|value| !is_placeholder(value))
}

/// Placeholder some deployments leave in config files instead of a real secret.
const PLACEHOLDER: &str = "USE_ENVIRONMENT_VARIABLE";

/// True for values that mean "not configured": empty or the placeholder.
pub(crate) fn is_placeholder(value: &str) -> bool {
    value.trim().is_empty() || value == PLACEHOLDER
}

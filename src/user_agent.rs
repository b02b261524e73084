//! User-Agent string for segment requests.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/Yang-Jace-Liu/dash-emulator";

/// Default User-Agent for fetch requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_fetch_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("dash-fetch/{version} (+{PROJECT_UA_URL})")
}

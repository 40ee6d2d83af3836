use std::env;

pub const ENV_SERVICE_ACCOUNT: &str = "GCP_SERVICE_ACCOUNT";

/// Service-account key material (the JSON document Google hands out).
///
/// Supplied through the environment or the deployment secret store, never
/// read from a file inside the deployable. `Debug` never prints the key.
#[derive(Clone)]
pub struct ServiceCredential(String);

impl ServiceCredential {
    /// Returns `None` for blank input.
    pub fn new(json: impl Into<String>) -> Option<Self> {
        let json = json.into();
        if json.trim().is_empty() {
            None
        } else {
            Some(Self(json))
        }
    }

    pub fn from_env() -> Option<Self> {
        env::var(ENV_SERVICE_ACCOUNT).ok().and_then(Self::new)
    }

    pub fn as_json(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ServiceCredential(<{} bytes>)", self.0.len())
    }
}

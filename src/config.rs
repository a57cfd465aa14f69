/// Backend endpoint configuration for the collaborator services.
///
/// Resolved once at startup. `LOCKSTEP_API_URL` overrides the default local
/// backend; everything else hangs off that base.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
}

const DEFAULT_BASE_URL: &str = "http://localhost:4000/api/pronunciation/admin";

impl ServiceConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("LOCKSTEP_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { base_url }
    }

    pub fn with_base(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::with_base(DEFAULT_BASE_URL)
    }
}

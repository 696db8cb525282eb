//! Per-request model choice.

use std::sync::Arc;

use edubot_types::ConfigError;

use super::random::RandomSource;

/// Picks one model uniformly at random for each logical request.
///
/// The choice is made once; retries reuse it while credentials rotate.
pub struct ModelSelector {
    models: Vec<String>,
    rng: Arc<dyn RandomSource>,
}

impl ModelSelector {
    pub fn new(models: Vec<String>, rng: Arc<dyn RandomSource>) -> Result<Self, ConfigError> {
        if models.is_empty() {
            return Err(ConfigError::NoModelsConfigured);
        }
        Ok(Self { models, rng })
    }

    pub fn choose(&self) -> &str {
        &self.models[self.rng.index(self.models.len())]
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }
}

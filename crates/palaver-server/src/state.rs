use std::sync::Arc;

use anyhow::Result;
use palaver::completion::Completer;
use palaver::relay::Pacing;

use crate::configuration::Settings;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub completer: Arc<Completer>,
    /// Key used for requests that don't carry their own.
    pub fallback_api_key: Option<String>,
    pub pacing: Pacing,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let completer = Completer::new(settings.upstream.host.clone())?;

        Ok(AppState {
            completer: Arc::new(completer),
            fallback_api_key: settings.upstream.api_key.clone(),
            pacing: settings.relay.pacing(),
        })
    }
}

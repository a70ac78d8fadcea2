use std::sync::Arc;

use crate::config::AppConfig;
use crate::incidents::IncidentRecorder;
use crate::wheel::SegmentValidator;

/// Shared application state: configuration, the incident log, and a
/// validator wired to both. Constructed once at startup and handed to
/// the router behind an `Arc`.
pub struct AppState {
    pub config: AppConfig,
    pub incidents: Arc<IncidentRecorder>,
    pub validator: SegmentValidator,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let incidents = Arc::new(IncidentRecorder::new(config.incident_capacity));
        let validator = SegmentValidator::new(config.limits, incidents.clone());
        Self {
            config,
            incidents,
            validator,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

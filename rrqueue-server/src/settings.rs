use blockscout_service_launcher::{
    launcher::{ConfigSettings, MetricsSettings, ServerSettings},
    tracing::{JaegerSettings, TracingSettings},
};
use rrqueue_logic::QueueSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
    #[serde(default)]
    pub tracing: TracingSettings,
    #[serde(default)]
    pub jaeger: JaegerSettings,

    #[serde(default = "default_redis_addr")]
    pub redis_addr: String,

    pub queue: QueueSettings,
}

fn default_redis_addr() -> String {
    "localhost:6379".to_string()
}

impl ConfigSettings for Settings {
    const SERVICE_NAME: &'static str = "RRQUEUE";
}

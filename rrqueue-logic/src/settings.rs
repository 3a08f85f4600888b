use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// Per-namespace tuning, loaded as the `queue` section of the server's
/// configuration. `name`, `deq_period` and `ttl` have no sane default and
/// must be provided; `clean_period` follows the corpus convention of a
/// small, safe default.
#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct QueueSettings {
    pub name: String,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub deq_period: Duration,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub ttl: Duration,
    #[serde(default = "default_clean_period")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub clean_period: Duration,
    #[serde(default)]
    pub max_retries: Option<u32>,
}

fn default_clean_period() -> Duration {
    Duration::from_secs(10)
}

use std::time::Duration;

use blockscout_service_launcher::test_server;
use reqwest::Url;
use rrqueue_logic::QueueSettings;
use rrqueue_server::Settings;

pub async fn init_rrqueue_server<F>(settings_setup: F) -> Url
where
    F: Fn(Settings) -> Settings,
{
    let (settings, base) = {
        let (server_settings, base) = test_server::get_test_server_settings();
        let mut settings = Settings {
            server: server_settings,
            metrics: Default::default(),
            tracing: Default::default(),
            jaeger: Default::default(),
            redis_addr: "localhost:6379".to_string(),
            queue: QueueSettings {
                name: "rrqueue_startup_test".to_string(),
                deq_period: Duration::from_secs(1),
                ttl: Duration::from_secs(60),
                clean_period: Duration::from_secs(10),
                max_retries: None,
            },
        };
        settings.metrics.enabled = false;
        settings.tracing.enabled = false;
        settings.jaeger.enabled = false;

        (settings_setup(settings), base)
    };

    test_server::init_server(|| rrqueue_server::run(settings), &base).await;
    base
}

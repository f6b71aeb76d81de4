use std::time::Duration;

use flagset::{ClientConfig, EvaluationContext, FileFlagSource, PollerConfig, Value};

pub fn main() {
    env_logger::init();

    let client = ClientConfig::new()
        .evaluation_logger(|event: flagset::EvaluationEvent| {
            println!("evaluation: {:?}", event);
        })
        .to_client()
        .unwrap();

    // Optionally keep flags in sync with a JSON file. Until the first refresh, the built-in
    // flags are served.
    let poller = std::env::var("FLAGS_FILE").ok().map(|path| {
        let poller = client
            .start_poller_thread(
                FileFlagSource::new(path),
                PollerConfig::default().interval(Duration::from_secs(30)),
            )
            .unwrap();
        let _ = poller.wait_for_first_refresh();
        poller
    });

    let context = EvaluationContext::new("u39").with_attribute("user_type", "beta_tester");

    let enabled = client.is_enabled("beta_features", &context);
    println!("beta_features: {:?}", enabled);

    let variation = client.get_variation("beta_features", &context, Value::from("control"));
    println!("variation: {:?}", variation);

    if let Some(poller) = poller {
        let _ = poller.shutdown();
    }
}

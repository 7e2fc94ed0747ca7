// 📜 Logging - tracing subscriber setup

use crate::config::Environment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` overrides the per-environment default.
///
/// Output goes to stderr so CLI results on stdout stay clean.
pub fn init_logging(env: &Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match env {
        Environment::Dev => "interior_estimate=debug,estimate_server=debug,tower_http=debug,info".into(),
        Environment::Staging => "interior_estimate=debug,tower_http=info,info".into(),
        Environment::Prod => "interior_estimate=info,tower_http=info,warn".into(),
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(env.is_dev())
        .with_line_number(env.is_dev());

    // try_init: a second call (tests, embedded use) keeps the first subscriber
    let result = if env.is_prod() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.pretty())
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!("Logging initialized for {:?} environment", env);
    }
}

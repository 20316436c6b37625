use crate::config::{LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a global metrics recorder is already installed")]
    RecorderInstalled,
}

/// Keeps the sentry client alive until the process exits.
pub struct Guard {
    _sentry: Option<sentry::ClientInitGuard>,
}

/// Installs the tracing subscriber (stderr, optionally forwarded to sentry)
/// and the statsd metrics recorder.
pub fn init(logging: &LoggingConfig, metrics: Option<&MetricsConfig>) -> Result<Guard, ObservabilityError> {
    let sentry_guard = logging.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                environment: logging.environment.clone().map(Into::into),
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let sentry_layer = sentry_guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_layer)
        .init();

    if let Some(config) = metrics {
        let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
            .build(Some(&config.prefix))?;
        metrics::set_global_recorder(recorder).map_err(|_| ObservabilityError::RecorderInstalled)?;
        catalog::metrics_defs::describe_all();
        tracing::debug!(host = %config.statsd_host, port = config.statsd_port, "Metrics enabled");
    }

    Ok(Guard {
        _sentry: sentry_guard,
    })
}

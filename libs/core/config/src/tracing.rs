use crate::Environment;
use tracing_subscriber::{EnvFilter, Layer, Registry, prelude::*};

/// Installs the color-eyre panic and report hooks. Repeated calls are no-ops.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(environment: &Environment) -> &'static str {
    match environment {
        Environment::Production => "info,tower_http=info,sea_orm=warn,sqlx=warn",
        Environment::Development => "debug,tower_http=debug,sea_orm=info,sqlx=warn",
    }
}

fn output_layer(environment: &Environment) -> Box<dyn Layer<Registry> + Send + Sync> {
    match environment {
        Environment::Production => tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .flatten_event(true)
            .boxed(),
        Environment::Development => tracing_subscriber::fmt::layer()
            .with_target(true)
            .pretty()
            .boxed(),
    }
}

/// Installs the global subscriber: JSON lines in production, pretty output
/// otherwise, plus an `ErrorLayer` so eyre reports carry span traces.
///
/// Returns `false` when a subscriber was already installed (common in tests).
pub fn init_tracing(environment: &Environment) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(environment)));

    let installed = tracing_subscriber::registry()
        .with(output_layer(environment))
        .with(tracing_error::ErrorLayer::default())
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(?environment, "Tracing initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_quiet_sql_in_production() {
        assert!(default_filter(&Environment::Production).contains("sea_orm=warn"));
        assert!(default_filter(&Environment::Development).starts_with("debug"));
    }

    #[test]
    fn test_default_filters_parse() {
        for environment in [Environment::Production, Environment::Development] {
            assert!(EnvFilter::try_new(default_filter(&environment)).is_ok());
        }
    }

    #[test]
    fn test_second_init_is_rejected_quietly() {
        init_tracing(&Environment::Development);
        assert!(!init_tracing(&Environment::Production));
    }
}

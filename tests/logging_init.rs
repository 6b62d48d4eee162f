//! Global subscriber installation, kept in its own test binary

use blade_context::config::{LogFormat, LoggingConfig};
use blade_context::{logging, ContextError};

#[test]
fn subscriber_installs_once_per_process() {
    let config = LoggingConfig {
        level: "warn".to_string(),
        format: LogFormat::Json,
    };
    assert!(logging::init(&config).is_ok());
    assert!(matches!(
        logging::init(&config),
        Err(ContextError::Configuration(_))
    ));
}

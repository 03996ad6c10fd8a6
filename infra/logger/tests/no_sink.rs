use polar_domain::config::LoggingConfig;
use polar_logger::{Logger, LoggerError};
use serial_test::serial;

#[test]
#[serial]
fn disabling_every_sink_is_rejected() {
    let config = LoggingConfig { console: false, directory: None, ..LoggingConfig::default() };

    let err = Logger::from_config("polar-no-sink", &config).expect_err("init should fail");
    assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
}

#[test]
#[serial]
fn unknown_level_is_rejected_before_install() {
    let config = LoggingConfig { level: "chatty".to_owned(), ..LoggingConfig::default() };

    let err = Logger::from_config("polar-bad-level", &config).expect_err("init should fail");
    assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
}

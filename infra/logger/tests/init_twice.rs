use polar_domain::ErrorKind;
use polar_logger::{LevelFilter, Logger, LoggerError};

#[test]
fn second_init_is_a_conflict() {
    let logger = Logger::builder()
        .name("polar-init-twice")
        .level(LevelFilter::INFO)
        .init()
        .expect("first init should succeed");
    assert!(logger.guard().is_none(), "console-only logger should not own a file guard");

    let err = Logger::builder()
        .name("polar-init-twice-second")
        .level(LevelFilter::INFO)
        .init()
        .expect_err("second init should fail");

    assert!(matches!(err, LoggerError::Subscriber { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

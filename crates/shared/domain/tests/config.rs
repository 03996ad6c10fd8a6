use polar_domain::config::{
    ApiConfig, DatabaseConfig, LoggingConfig, RegistrationConfig, ServerConfig,
};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 8080);
    assert!(server.ssl.is_none());
    assert!(server.cors.allowed_origins.is_empty());

    let db = DatabaseConfig::default();
    assert_eq!(db.url, "mem://");
    assert_eq!(db.namespace, "polar");
    assert_eq!(db.database, "registration");
    assert!(db.credentials.is_none());
    assert_eq!(db.timeout_ms, 5_000);

    let logging = LoggingConfig::default();
    assert_eq!(logging.level, "info");
    assert!(logging.console);
    assert!(logging.directory.is_none());

    let registration = RegistrationConfig::default();
    assert_eq!(registration.standing_thresholds, [23.0, 56.0, 84.0]);
    assert!(registration.release_seat_on_failure);
}

#[test]
fn api_config_deserializes_partial_documents() {
    let raw = json!({
        "server": { "address": "::", "port": 9090, "cors": { "allowed_origins": ["http://localhost:3000"] } },
        "database": { "url": "ws://db:8000", "namespace": "n", "database": "d", "credentials": null },
        "registration": { "standing_thresholds": [24.0, 57.0, 85.0], "release_seat_on_failure": false }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 9090);
    assert_eq!(cfg.server.cors.allowed_origins, vec!["http://localhost:3000".to_owned()]);
    assert_eq!(cfg.database.namespace, "n");
    assert_eq!(cfg.database.timeout_ms, 5_000);
    assert_eq!(cfg.registration.standing_thresholds, [24.0, 57.0, 85.0]);
    assert!(!cfg.registration.release_seat_on_failure);
    assert_eq!(cfg.logging.max_files, 10);
}

#[test]
fn config_is_copy_on_write() {
    let original = ApiConfig::default();
    let mut changed = original.clone();
    changed.server.port = 1;

    assert_eq!(original.server.port, 8080);
    assert_eq!(changed.server.port, 1);
}

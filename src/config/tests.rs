use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("should create temp file");
    file.write_all(content.as_bytes())
        .expect("should write config");
    file
}

#[test]
fn load_valid_hana_config() {
    let file = write_config(
        r"
server:
  name: test-server
  prefix: test

connector:
  type: hana
  host: localhost
  port: 30015
  user: testuser
  password: testpass
",
    );

    let config = Config::load(file.path()).expect("should load config");
    assert_eq!(config.server.name, "test-server");
    assert_eq!(config.server.prefix, "test");
    assert_eq!(config.server.version, "1.0");
    assert_eq!(config.server.http_port, DEFAULT_HTTP_PORT);

    match config.connector {
        ConnectorConfig::Hana(hana) => {
            assert_eq!(hana.host, "localhost");
            assert_eq!(hana.port, 30015);
            assert_eq!(hana.user, "testuser");
            assert_eq!(hana.password, "testpass");
            assert!(!hana.encrypt);
            assert!(hana.ssl_validate_certificate);
            assert_eq!(hana.database_name, None);
        }
        ConnectorConfig::Odbc(_) => panic!("expected hana connector"),
    }

    assert!(config.tables.is_empty());
    assert_eq!(config.log_file, None);
}

#[test]
fn load_valid_odbc_config() {
    let file = write_config(
        r"
server:
  name: odbc-server
  prefix: db
  version: '2.0'

connector:
  type: odbc
  connection_string: 'DSN=sales;UID=reader;PWD=secret'

tables:
  - ORDERS
  - CUSTOMERS

log_file: /tmp/hana-mcp.log
",
    );

    let config = Config::load(file.path()).expect("should load config");
    assert_eq!(config.server.version, "2.0");
    assert_eq!(config.tables, vec!["ORDERS", "CUSTOMERS"]);
    assert_eq!(config.log_file.as_deref(), Some("/tmp/hana-mcp.log"));

    match config.connector {
        ConnectorConfig::Odbc(odbc) => {
            assert_eq!(odbc.connection_string, "DSN=sales;UID=reader;PWD=secret");
        }
        ConnectorConfig::Hana(_) => panic!("expected odbc connector"),
    }
}

#[test]
fn load_missing_file() {
    let err = Config::load("/nonexistent/path/config.yaml").expect_err("should fail");
    assert!(matches!(err, crate::ServerError::Config(_)));
    assert!(err.to_string().contains("not found"));
}

#[test]
fn unknown_connector_type_is_config_error() {
    let file = write_config(
        r"
server:
  name: test
  prefix: test

connector:
  type: mysql
  host: localhost
",
    );

    let err = Config::load(file.path()).expect_err("should fail");
    assert!(matches!(err, crate::ServerError::Config(_)));
}

#[test]
fn missing_server_section_is_config_error() {
    let file = write_config(
        r"
connector:
  type: odbc
  connection_string: 'DSN=x'
",
    );

    let err = Config::load(file.path()).expect_err("should fail");
    assert!(matches!(err, crate::ServerError::Config(_)));
}

#[test]
fn validation_catches_missing_fields() {
    let base = Config {
        server: ServerConfig {
            name: "test".to_string(),
            prefix: "test".to_string(),
            version: "1.0".to_string(),
            http_port: DEFAULT_HTTP_PORT,
        },
        connector: ConnectorConfig::Hana(HanaConfig {
            host: "localhost".to_string(),
            port: DEFAULT_HANA_PORT,
            user: "user".to_string(),
            password: "pass".to_string(),
            database_name: None,
            encrypt: false,
            ssl_validate_certificate: true,
        }),
        tables: Vec::new(),
        log_file: None,
    };
    assert!(base.validate().is_ok());

    let mut config = base.clone();
    config.server.name = String::new();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingServerName)
    ));

    let mut config = base.clone();
    config.server.prefix = String::new();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingServerPrefix)
    ));

    let mut config = base.clone();
    config.connector = ConnectorConfig::Hana(HanaConfig {
        host: String::new(),
        port: DEFAULT_HANA_PORT,
        user: "user".to_string(),
        password: "pass".to_string(),
        database_name: None,
        encrypt: false,
        ssl_validate_certificate: true,
    });
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingHanaHost)
    ));

    let mut config = base;
    config.connector = ConnectorConfig::Odbc(OdbcConfig {
        connection_string: String::new(),
    });
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingConnectionString)
    ));
}

#[test]
fn yaml_round_trip() {
    let config = Config {
        server: ServerConfig {
            name: "rt".to_string(),
            prefix: "rt".to_string(),
            version: "1.0".to_string(),
            http_port: 9000,
        },
        connector: ConnectorConfig::Odbc(OdbcConfig {
            connection_string: "DSN=rt".to_string(),
        }),
        tables: vec!["T1".to_string()],
        log_file: None,
    };

    let yaml = serde_yaml::to_string(&config).expect("should serialize yaml");
    let parsed: Config = serde_yaml::from_str(&yaml).expect("should parse yaml");
    assert_eq!(config, parsed);
}

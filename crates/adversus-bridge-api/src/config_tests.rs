use super::*;

mod defaults {
    use super::*;

    /// Verify the full default configuration is usable as-is for local
    /// development.
    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.shutdown_timeout_seconds, 30);
        assert!(config.server.enable_cors);

        assert_eq!(config.upstream.base_url, "https://api.adversus.dk/v1");
        assert_eq!(config.upstream.timeout_seconds, 15);

        assert!(config.webhook.secret.is_empty());
        assert_eq!(config.webhook.buffer_capacity, 200);

        assert_eq!(config.scan.pacing_ms, 250);
        assert_eq!(config.scan.default_limit, 25);
        assert_eq!(config.scan.batch_size, 5);
        assert!(config.scan.success_terms.contains(&"success".to_string()));

        assert_eq!(config.logging.level, "info");
    }

    /// Verify an empty document deserializes to the defaults.
    #[test]
    fn test_empty_document_uses_defaults() {
        let config: BridgeConfig = serde_json::from_value(serde_json::json!({}))
            .expect("empty document should deserialize");

        assert_eq!(config.server.port, BridgeConfig::default().server.port);
        assert_eq!(
            config.scan.success_terms,
            BridgeConfig::default().scan.success_terms
        );
    }
}

mod validation {
    use super::*;

    /// Verify the defaults pass validation.
    #[test]
    fn test_default_config_is_valid() {
        assert!(BridgeConfig::default().validate().is_ok());
    }

    /// Verify nonsensical values are rejected with a field-naming message.
    #[test]
    fn test_invalid_values_rejected() {
        let mut config = BridgeConfig::default();
        config.server.port = 0;
        let error = config.validate().expect_err("zero port must be rejected");
        assert!(error.to_string().contains("server.port"));

        let mut config = BridgeConfig::default();
        config.upstream.base_url = "ftp://example".to_string();
        assert!(config.validate().is_err());

        let mut config = BridgeConfig::default();
        config.scan.batch_size = 0;
        assert!(config.validate().is_err());
    }
}

mod overrides {
    use super::*;

    /// Verify a partial section keeps defaults for the fields it omits.
    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: BridgeConfig = serde_json::from_value(serde_json::json!({
            "server": { "port": 9090 },
            "webhook": { "secret": "s3cret" }
        }))
        .expect("partial document should deserialize");

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.webhook.secret, "s3cret");
        assert_eq!(config.webhook.buffer_capacity, 200);
    }

    /// Verify scan tuning is fully overridable.
    #[test]
    fn test_scan_overrides() {
        let config: BridgeConfig = serde_json::from_value(serde_json::json!({
            "scan": {
                "pacing_ms": 0,
                "default_limit": 100,
                "batch_size": 10,
                "success_terms": ["sold"]
            }
        }))
        .expect("scan section should deserialize");

        assert_eq!(config.scan.pacing_ms, 0);
        assert_eq!(config.scan.default_limit, 100);
        assert_eq!(config.scan.batch_size, 10);
        assert_eq!(config.scan.success_terms, vec!["sold".to_string()]);
    }
}

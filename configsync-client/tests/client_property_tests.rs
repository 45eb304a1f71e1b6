use configsync_client::settings::{AuthSettings, ReconnectSettings, Settings};
use configsync_client::KeyStore;
use configsync_core::CacheEntry;
use proptest::prelude::*;

fn base_settings() -> Settings {
    Settings {
        value_url: "http://localhost:8080/api/v1/value".to_string(),
        stream_url: "ws://localhost:8080/stream".to_string(),
        auth: AuthSettings {
            api_key: Some("test-key".to_string()),
        },
        preload_keys: vec!["greeting".to_string()],
        request_timeout_ms: 5_000,
        keepalive_interval_ms: 30_000,
        reconnect: ReconnectSettings {
            initial_ms: 250,
            max_ms: 5_000,
            multiplier: 1.5,
            jitter_ms: 100,
        },
    }
}

proptest! {
    #[test]
    fn store_returns_the_last_write(values in proptest::collection::vec("[a-zA-Z0-9]{0,12}", 1..8)) {
        let store = KeyStore::new();
        for value in &values {
            store.set("key", CacheEntry::from_push(value.clone()));
        }

        prop_assert_eq!(store.get("key").map(|entry| entry.value), values.last().cloned());
        prop_assert_eq!(store.len(), 1);
    }

    #[test]
    fn reconnect_settings_validation(
        initial in 1u64..1000,
        max_delta in 0u64..2000,
        multiplier in 1.0f64..4.0f64,
    ) {
        let mut settings = base_settings();
        settings.reconnect = ReconnectSettings {
            initial_ms: initial,
            max_ms: initial + max_delta,
            multiplier,
            jitter_ms: 50,
        };

        prop_assert!(settings.validate().is_ok());
    }

    #[test]
    fn backoff_below_initial_is_rejected(initial in 2u64..1000, deficit in 1u64..1000) {
        let mut settings = base_settings();
        let deficit = deficit.min(initial - 1);
        settings.reconnect = ReconnectSettings {
            initial_ms: initial,
            max_ms: initial - deficit,
            multiplier: 1.5,
            jitter_ms: 50,
        };

        prop_assert!(settings.validate().is_err());
    }
}

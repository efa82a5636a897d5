//! Integration test: load a config file from disk and resolve settings from it.

use lib::config::{load_config, OutputStyle, Settings, DEFAULT_AGENT_ID};
use lib::event::UserId;
use std::io::Write;

#[test]
fn settings_resolve_from_config_file() {
    let dir = std::env::temp_dir().join(format!("clyde-config-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("config.json");
    std::fs::File::create(&path)
        .and_then(|mut f| {
            f.write_all(
                br#"{
                    "discord": { "token": "abc", "channelId": "42", "apiBase": "http://localhost:9/api/" },
                    "display": { "theme": "light" },
                    "query": { "instructions": "", "output": "plain" }
                }"#,
            )
        })
        .expect("write config.json");

    let (config, used) = load_config(Some(path.clone())).expect("load");
    assert_eq!(used, path);

    let settings = Settings::resolve_with(&config, |_| None).expect("resolve");
    assert_eq!(settings.token, "abc");
    assert_eq!(settings.channel_id, "42");
    assert_eq!(settings.agent_id, UserId(DEFAULT_AGENT_ID));
    assert_eq!(settings.api_base, "http://localhost:9/api");
    assert_eq!(settings.theme.as_deref(), Some("light"));
    assert_eq!(settings.instructions, None);
    assert_eq!(settings.output, OutputStyle::Plain);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_config_file_means_defaults() {
    let path = std::env::temp_dir().join(format!("clyde-absent-{}.json", uuid::Uuid::new_v4()));
    let (config, _) = load_config(Some(path)).expect("load");
    assert!(config.discord.token.is_none());
}

#[test]
fn malformed_config_file_is_an_error() {
    let path = std::env::temp_dir().join(format!("clyde-bad-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, "{ not json").expect("write");
    let err = load_config(Some(path.clone())).unwrap_err();
    let _ = std::fs::remove_file(&path);
    assert!(format!("{:#}", err).contains("parsing config"));
}

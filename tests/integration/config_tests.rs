use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use hashkeeper::config::Config;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.checkpoint_interval(), Duration::from_secs(300));
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
database = "/var/lib/hashkeeper/ledger.sqlite"
checkpoint_interval_secs = 60
"#,
    )
    .unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config.database, PathBuf::from("/var/lib/hashkeeper/ledger.sqlite"));
    assert_eq!(config.checkpoint_interval_secs, 60);
    assert_eq!(config.chunk_size, Config::default().chunk_size);
}

#[test]
fn test_config_load_from_env() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("HASHKEEPER_CHUNK_SIZE", "4096");
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("HASHKEEPER_").split("__"))
            .extract()?;
        assert_eq!(config.effective_chunk_size(), 4096);
        Ok(())
    });
}

#[test]
fn test_config_layering_env_over_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", "checkpoint_interval_secs = 10")?;
        jail.set_env("HASHKEEPER_CHECKPOINT_INTERVAL_SECS", "20");
        let config: Config = Config::figment_from(Some(PathBuf::from("config.toml"))).extract()?;
        assert_eq!(config.checkpoint_interval_secs, 20);
        Ok(())
    });
}

#[test]
fn test_invalid_toml_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "checkpoint_interval_secs = \"soon\"").unwrap();

    let result: Result<Config, _> =
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .extract();
    assert!(result.is_err());
}

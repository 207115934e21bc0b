// tests/config_load.rs
//
// Engine config resolution: file + env override precedence and the
// hot-swap handle. Env-mutating tests are serialized.

use std::{env, fs};

use storefront_decision_engine::config::{
    ConfigHandle, EngineConfig, ENV_API_BASE, ENV_CONFIG_PATH,
};

const SAMPLE: &str = r#"
api_base = "http://tienda.example.com/api"
notice_ttl_secs = 2
active_states = ["activo"]

[[criteria]]
nombre = "precio"
tipo = "costo"
peso = 50

[[criteria]]
nombre = "reviews"
tipo = "beneficio"
peso = 50
"#;

#[serial_test::serial]
#[test]
fn file_from_env_path_is_loaded() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("engine.toml");
    fs::write(&path, SAMPLE).unwrap();

    env::set_var(ENV_CONFIG_PATH, path.display().to_string());
    env::remove_var(ENV_API_BASE);
    let cfg = EngineConfig::from_toml().unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    assert_eq!(cfg.api_base, "http://tienda.example.com/api");
    assert_eq!(cfg.notice_ttl_secs, 2);
    let set = cfg.criteria_set();
    assert_eq!(set.criteria().len(), 2);
    assert_eq!(set.total_active_weight(), 100);
}

#[serial_test::serial]
#[test]
fn env_api_base_overrides_the_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("engine.toml");
    fs::write(&path, SAMPLE).unwrap();

    env::set_var(ENV_CONFIG_PATH, path.display().to_string());
    env::set_var(ENV_API_BASE, "http://staging.example.com/api/");
    let cfg = EngineConfig::from_toml().unwrap();
    env::remove_var(ENV_API_BASE);
    env::remove_var(ENV_CONFIG_PATH);

    assert_eq!(cfg.api_base, "http://staging.example.com/api");
}

#[serial_test::serial]
#[test]
fn missing_file_falls_back_to_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    env::set_var(
        ENV_CONFIG_PATH,
        tmp.path().join("missing.toml").display().to_string(),
    );
    env::remove_var(ENV_API_BASE);
    let cfg = EngineConfig::from_toml().unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    // Defaults: seed criteria, standard active-state synonyms.
    assert_eq!(cfg.criteria_set().criteria().len(), 5);
    assert!(cfg.active_states.contains(&"activo".to_string()));
}

#[test]
fn handle_serves_the_new_config_after_a_swap() {
    let handle = ConfigHandle::new(EngineConfig::default());
    let before = handle.api_base();

    let fresh = EngineConfig::from_toml_str(SAMPLE).unwrap();
    handle.replace(fresh);

    assert_ne!(handle.api_base(), before);
    assert_eq!(handle.api_base(), "http://tienda.example.com/api");
    assert_eq!(handle.active_states(), vec!["activo".to_string()]);
}

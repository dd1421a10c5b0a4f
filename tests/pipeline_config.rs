// tests/pipeline_config.rs
use std::path::PathBuf;
use std::{env, fs};

use tariff_post_classifier::config::pipeline::{load_default, load_from, PipelineConfig};

#[test]
fn toml_and_json_paths_parse() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("pipeline.toml");
    fs::write(&p_toml, "author = \"someone\"\nconcurrency = 3\n").unwrap();
    let t = load_from(&p_toml).unwrap();
    assert_eq!(t.author, "someone");
    assert_eq!(t.concurrency, 3);
    assert_eq!(t.per_item_delay_ms, 1000);

    let p_json = dir.path().join("pipeline.json");
    fs::write(&p_json, r#"{"window_days": 7, "output_dir": "out"}"#).unwrap();
    let j = load_from(&p_json).unwrap();
    assert_eq!(j.window_days, 7);
    assert_eq!(j.output_dir, PathBuf::from("out"));
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var("PIPELINE_CONFIG_PATH");

    // 1) Nothing on disk -> defaults
    assert_eq!(load_default().unwrap(), PipelineConfig::default());

    // 2) Fallback TOML in ./config/
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/pipeline.toml"), "window_days = 30\n").unwrap();
    assert_eq!(load_default().unwrap().window_days, 30);

    // 3) Env var wins
    let p_env = tmp.path().join("elsewhere.json");
    fs::write(&p_env, r#"{"window_days": 1}"#).unwrap();
    env::set_var("PIPELINE_CONFIG_PATH", p_env.display().to_string());
    assert_eq!(load_default().unwrap().window_days, 1);

    // 4) Env var pointing nowhere is an error
    env::set_var("PIPELINE_CONFIG_PATH", tmp.path().join("missing.toml"));
    assert!(load_default().is_err());
    env::remove_var("PIPELINE_CONFIG_PATH");

    env::set_current_dir(&old).unwrap();
}

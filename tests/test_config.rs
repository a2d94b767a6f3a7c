use std::io::Write;
use std::sync::Mutex;

use wirehttp::config::Config;

// Tests in this file mutate process-wide environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    unsafe {
        std::env::remove_var("HTTPSERVER_CONFIG");
        std::env::remove_var("PORT");
        std::env::remove_var("UPSTREAM");
    }
}

#[test]
fn test_config_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let cfg = Config::load();
    assert_eq!(cfg.port, 42069);
    assert_eq!(cfg.upstream, "http://httpbin.org");
}

#[test]
fn test_config_port_from_env() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    unsafe {
        std::env::set_var("PORT", "8000");
        std::env::set_var("UPSTREAM", "http://127.0.0.1:3000");
    }

    let cfg = Config::load();
    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.upstream, "http://127.0.0.1:3000");
    clear_env();
}

#[test]
fn test_config_invalid_port_is_ignored() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    unsafe {
        std::env::set_var("PORT", "not-a-port");
    }

    assert_eq!(Config::load().port, 42069);
    clear_env();
}

#[test]
fn test_config_from_yaml_file_with_env_override() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let path = std::env::temp_dir().join(format!("wirehttp-config-{}.yaml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "port: 9000\nupstream: http://localhost:5000").unwrap();
    drop(file);

    unsafe {
        std::env::set_var("HTTPSERVER_CONFIG", &path);
    }
    let cfg = Config::load();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.upstream, "http://localhost:5000");

    unsafe {
        std::env::set_var("PORT", "9001");
    }
    assert_eq!(Config::load().port, 9001);

    clear_env();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_config_missing_file_falls_back_to_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    unsafe {
        std::env::set_var("HTTPSERVER_CONFIG", "/nonexistent/wirehttp.yaml");
    }

    assert_eq!(Config::load(), Config::default());
    clear_env();
}

#[test]
fn test_config_from_yaml_partial() {
    let cfg = Config::from_yaml("port: 1234").unwrap();
    assert_eq!(cfg.port, 1234);
    assert_eq!(cfg.upstream, "http://httpbin.org");

    assert!(Config::from_yaml("port: [1, 2]").is_err());
}

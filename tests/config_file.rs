use std::fs;

use appfocus::config::{Config, DEFAULT_CONF};
use appfocus::state::SelectionStore;



#[test]
fn missing_config_is_created_from_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join (Config::CONF_FILE_NAME);

    let conf = Config::load (&path) .unwrap();
    assert_eq!(conf.path(), Some(path.as_path()));
    assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONF);
    assert_eq!(conf.get_log_loc(), Some(dir.path().join(Config::LOG_FILE_NAME)));
    assert_eq!(conf.get_focus_timing().max_retries, 3);
}

#[test]
fn built_in_defaults_have_no_file_behind_them() {
    let conf = Config::from_toml_str (DEFAULT_CONF) .unwrap();
    assert_eq!(conf.path(), None);
}

#[test]
fn partial_config_is_completed_and_user_keys_survive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join (Config::CONF_FILE_NAME);
    fs::write (&path, "# my settings\nmy_own_key = \"keep me\"\n\n[focus]\nmax_retries = 5\n").unwrap();

    let conf = Config::load (&path) .unwrap();
    assert_eq!(conf.get_focus_timing().max_retries, 5);

    let written = fs::read_to_string (&path) .unwrap();
    assert!(written.contains("# my settings"));
    assert!(written.contains("my_own_key = \"keep me\""));
    assert!(written.contains("max_retries = 5"));
    assert!(written.contains("retry_delay_ms"));
    assert!(written.contains("[tabs]"));
    assert!(written.contains("TViewForm"));
}

#[test]
fn broken_config_is_moved_aside() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join (Config::CONF_FILE_NAME);
    fs::write (&path, "this is = = not toml [").unwrap();

    let conf = Config::load (&path) .unwrap();
    assert_eq!(conf.get_tab_params().unwrap().max_tabs, 20);
    assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONF);
    let bak = dir.path().join (format!("{}.bak", Config::CONF_FILE_NAME));
    assert_eq!(fs::read_to_string(bak).unwrap(), "this is = = not toml [");
}

#[test]
fn state_persists_across_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join (Config::CONF_FILE_NAME);

    let mut conf = Config::load (&path) .unwrap();
    conf.set_last_focused ("bcompare", 132456);
    assert!(conf.ensure_domain_entries ("github.com"));
    conf.set_last_position ("github.com", 3);

    let reloaded = Config::load (&path) .unwrap();
    assert_eq!(reloaded.last_focused("bcompare"), Some(132456));
    assert_eq!(reloaded.get_domain_url("github.com"), "https://github.com");
    assert_eq!(reloaded.get_last_position("github.com"), Some(3));

    let mut reloaded = reloaded;
    reloaded.clear_last_focused ("bcompare");
    assert_eq!(Config::load(&path).unwrap().last_focused("bcompare"), None);
}

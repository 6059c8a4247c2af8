#![ allow (non_snake_case) ]

use std::fs;
use std::ops::Not;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use toml_edit::{DocumentMut, Item, Table, TableLike};

use tracing::{info, warn};
use tracing::metadata::LevelFilter;

use crate::desktop::Hwnd;
use crate::error::ConfigError;
use crate::focus::FocusTiming;
use crate::keys::KeyCombo;
use crate::launch::BrowserSpec;
use crate::rules::ApplicationRule;
use crate::state::SelectionStore;
use crate::tabs::{normalize_domain, TabCycleParams};



/// The compiled-in default config .. our appfocus.conf.toml is at root of project
pub const DEFAULT_CONF : &str = include_str!("../appfocus.conf.toml");



# [ derive (Debug, Clone) ]
/// The config/state toml doc, along with the defaults it falls back on and the file it persists to
pub struct Config {
    pub toml    : DocumentMut,
    pub default : DocumentMut,
    path        : Option <PathBuf>,
}



// first some module level helper functions ..
/// Returns the directory of the currently running executable
fn get_app_dir () -> Option<PathBuf> {
    std::env::current_exe().ok() .and_then (|p| p.parent() .map (|p| p.to_path_buf()))
}

/// Checks whether a path is writeable by the current user by attempting to open/create a file in write mode
fn is_writeable (path: &Path) -> bool {
    fs::OpenOptions::new().write(true).create(true).truncate(false).open(path).is_ok()
    // note that ^^ this is similar to 'touch' and will create an empty file if it doesnt exist
}

fn lookup<'a> (doc:&'a DocumentMut, keys:&[&str]) -> Option<&'a Item> {
    keys .iter() .try_fold (doc.as_item(), |item, k| item.get(*k))
}

/// Recursively copies over any keys (or whole tables) present in defaults but missing in target
fn merge_missing (target:&mut Table, defaults:&Table) -> bool {
    let mut changed = false;
    for (key, def_item) in defaults.iter() {
        if !target.contains_key(key) {
            target.insert (key, def_item.clone());
            changed = true;
            continue
        }
        if let (Some(tgt), Some(def)) = ( target.get_mut(key).and_then (|i| i.as_table_mut()), def_item.as_table() ) {
            changed |= merge_missing (tgt, def);
        }
    }
    changed
}

fn parse_duration_ms (ms:u32) -> Duration { Duration::from_millis (ms as u64) }



impl Config {

    pub const CONF_FILE_NAME : &'static str = "appfocus.conf.toml";
    pub const LOG_FILE_NAME  : &'static str = "appfocus.log";


    /// Where the config lives .. next to our exe if we can write there, else in the user's local data dir
    pub fn locate (override_path:Option<&Path>) -> Result <PathBuf, ConfigError> {
        if let Some(p) = override_path { return Ok (p.to_path_buf()) }

        let app_dir_loc = get_app_dir() .map (|p| p.join(Self::CONF_FILE_NAME));
        if let Some(loc) = app_dir_loc .filter (|p| is_writeable(p)) {
            return Ok(loc)
        }
        let data_dir = dirs::data_local_dir() .map (|p| p.join("appfocus"));
        if let Some(dir) = data_dir.as_ref() .filter (|p| !p.exists()) {
            let _ = fs::create_dir_all (dir);
        }
        data_dir .map (|p| p.join(Self::CONF_FILE_NAME)) .filter (|p| is_writeable(p)) .ok_or (ConfigError::NoLocation)
    }


    /// Loads (or creates) the config file at `path`, repopulating any missing keys from defaults.<br>
    /// An unparseable file is moved aside to `.bak` and replaced by the defaults.
    pub fn load (path:&Path) -> Result <Config, ConfigError> {
        let default = DocumentMut::from_str (DEFAULT_CONF)?;

        let cfg_str = match fs::read_to_string (path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err ( ConfigError::Io { path: path.to_path_buf(), source } ),
        };

        let toml = if cfg_str.trim().is_empty() {
            info! ("no config at {:?}, writing defaults", path);
            None
        } else {
            match DocumentMut::from_str (&cfg_str) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    let bak = path.with_extension ("toml.bak");
                    warn! ("failed to parse config {:?} ({}) .. moving it to {:?} and writing defaults", path, e, bak);
                    fs::rename (path, &bak) .map_err (|source| ConfigError::Io { path: bak.clone(), source })?;
                    None
                }
            }
        };

        let fresh = toml.is_none();
        let mut conf = Config { toml: toml.unwrap_or_else (|| default.clone()), default, path: Some(path.to_path_buf()) };

        let merged = merge_missing (conf.toml.as_table_mut(), conf.default.as_table());
        if fresh || merged {
            conf.write_back()?;
        }
        Ok(conf)
    }

    /// A config that is never persisted
    pub fn from_toml_str (s:&str) -> Result <Config, ConfigError> {
        let default = DocumentMut::from_str (DEFAULT_CONF)?;
        let mut toml = DocumentMut::from_str (s)?;
        merge_missing (toml.as_table_mut(), default.as_table());
        Ok ( Config { toml, default, path: None } )
    }

    pub fn path (&self) -> Option<&Path> { self.path.as_deref() }

    pub fn get_log_loc (&self) -> Option<PathBuf> {
        self.path.as_ref() .and_then (|p| p.parent()) .map (|p| p.join(Self::LOG_FILE_NAME))
    }


    pub fn write_back (&self) -> Result <(), ConfigError> {
        let Some(conf_path) = self.path.as_ref() else { return Ok(()) };
        fs::write (conf_path, self.toml.to_string()) .map_err (|source| ConfigError::Io { path: conf_path.clone(), source })
    }

    fn write_back_or_warn (&self) {
        if let Err(e) = self.write_back() { warn! ("failed to write back config: {}", e) }
    }



    fn check_flag (&self, keys:&[&str], fallback:bool) -> bool {
        lookup (&self.toml, keys) .and_then (|t| t.as_bool())
            .or_else (|| lookup (&self.default, keys) .and_then (|t| t.as_bool()))
            .unwrap_or (fallback)
    }

    fn get_number (&self, keys:&[&str], fallback:u32) -> u32 {
        lookup (&self.toml, keys) .and_then (|t| t.as_integer()) .filter (|n| *n >= 0)
            .or_else (|| lookup (&self.default, keys) .and_then (|t| t.as_integer()))
            .map (|n| n.clamp (0, u32::MAX as i64) as u32)
            .unwrap_or (fallback)
    }

    fn get_string (&self, keys:&[&str], fallback:&str) -> String {
        lookup (&self.toml, keys) .and_then (|t| t.as_str())
            .or_else (|| lookup (&self.default, keys) .and_then (|t| t.as_str()))
            .unwrap_or (fallback) .to_string()
    }

    fn get_string_array (&self, keys:&[&str]) -> Vec<String> {
        let read = |doc:&DocumentMut| lookup (doc, keys) .and_then (|t| t.as_array())
            .map (|t| t.iter() .filter_map (|v| v.as_str().map(|s| s.to_string())) .collect::<Vec<_>>());
        read (&self.toml) .or_else (|| read (&self.default)) .unwrap_or_default()
    }

    fn get_key_combo (&self, keys:&[&str], fallback:&str) -> Option<KeyCombo> {
        let combo_str = self.get_string (keys, fallback);
        combo_str.parse::<KeyCombo>() .or_else ( |e| {
            warn! ("bad key combo {:?} for {:?} ({}), using default", combo_str, keys.join("."), e);
            self.default_string(keys, fallback) .parse::<KeyCombo>()
        } ) .ok()
    }

    fn default_string (&self, keys:&[&str], fallback:&str) -> String {
        lookup (&self.default, keys) .and_then (|t| t.as_str()) .unwrap_or (fallback) .to_string()
    }

    /// The section table at top level, created if absent
    fn section_mut (&mut self, section:&str) -> Option<&mut dyn TableLike> {
        if self.toml.get(section) .and_then (|i| i.as_table_like()) .is_none() {
            self.toml.insert (section, Item::Table (Table::new()));
        }
        self.toml.get_mut(section) .and_then (|i| i.as_table_like_mut())
    }



    pub fn check_flag__logging_enabled          (&self) -> bool { self.check_flag ( &["logging_enabled"],               true ) }
    pub fn check_flag__new_tab_when_on_target   (&self) -> bool { self.check_flag ( &["tabs", "new_tab_when_on_target"], true ) }

    pub fn get_max_log_lines (&self) -> usize { self.get_number (&["max_log_lines"], 1000) as usize }

    pub fn get_log_level (&self) -> LevelFilter {
        if !self.check_flag__logging_enabled() {
            return LevelFilter::OFF;
        }
        match self.get_string(&["logging_level"], "INFO").to_uppercase().as_str() {
            "TRACE" => LevelFilter::TRACE,
            "DEBUG" => LevelFilter::DEBUG,
            "WARN"  => LevelFilter::WARN,
            "ERROR" => LevelFilter::ERROR,
            "OFF"   => LevelFilter::OFF,
            _       => LevelFilter::INFO,
        }
    }


    pub fn get_focus_timing (&self) -> FocusTiming {
        FocusTiming {
            max_retries : self.get_number (&["focus", "max_retries"], 3) .max(1),
            retry_delay : parse_duration_ms ( self.get_number (&["focus", "retry_delay_ms"], 100) ),
            settle      : parse_duration_ms ( self.get_number (&["focus", "settle_delay_ms"], 50) ),
        }
    }

    pub fn get_excluded_window_classes (&self) -> Vec<String> { self.get_string_array (&["focus", "excluded_window_classes"]) }


    pub fn get_tab_params (&self) -> Option<TabCycleParams> {
        Some ( TabCycleParams {
            max_tabs     : self.get_number (&["tabs", "max_tabs"], 20) .max(1) as usize,
            switch_delay : parse_duration_ms ( self.get_number (&["tabs", "tab_switch_delay_ms"], 100) ),
            first_tab    : self.get_key_combo (&["tabs", "first_tab_keys"], "ctrl+1")?,
            next_tab     : self.get_key_combo (&["tabs", "next_tab_keys"],  "ctrl+tab")?,
        } )
    }


    pub fn get_browser_spec (&self) -> BrowserSpec {
        BrowserSpec {
            process_name : self.get_string (&["browser", "process_name"], "chrome.exe"),
            exe_paths    : self.get_string_array (&["browser", "exe_paths"]),
            new_tab_args : self.get_string_array (&["browser", "new_tab_args"]),
        }
    }
    pub fn get_browser_window_class (&self) -> String { self.get_string (&["browser", "window_class"], "Chrome_WidgetWin_1") }


    /// The app's configured window rule, or the permissive rule for apps we know nothing about
    pub fn get_app_rule (&self, app:&str) -> ApplicationRule {
        lookup (&self.toml, &["app_rules", app]) .and_then (|t| t.as_table_like())
            .map (ApplicationRule::from_table)
            .unwrap_or_else (ApplicationRule::permissive)
    }


    /// Extra title fragments identifying the domain's tabs, from both the title and url pattern tables
    pub fn get_domain_patterns (&self, domain:&str) -> Vec<String> {
        let mut patterns = self.get_string_array (&["title_patterns", domain]);
        patterns .extend (self.get_string_array (&["url_patterns", domain]));
        patterns
    }

    pub fn get_domain_url (&self, domain:&str) -> String {
        lookup (&self.toml, &["urls", domain]) .and_then (|v| v.as_str()) .map (|s| s.to_string())
            .unwrap_or_else (|| format! ("https://{}", domain))
    }

    /// Adds the url and last-position entries for a domain we havent seen before, returns whether anything was added
    pub fn ensure_domain_entries (&mut self, domain:&str) -> bool {
        let domain = normalize_domain (domain);
        if domain.is_empty() { return false }
        let mut changed = false;
        if let Some(urls) = self.section_mut("urls") {
            if urls.contains_key(&domain).not() {
                urls.insert (&domain, toml_edit::value (format! ("https://{}", domain)));
                changed = true;
        } }
        if let Some(positions) = self.section_mut("last_positions") {
            if positions.contains_key(&domain).not() {
                positions.insert (&domain, toml_edit::value (0i64));
                changed = true;
        } }
        if changed {
            info! ("added config entries for new domain {:?}", domain);
            self.write_back_or_warn();
        }
        changed
    }

    pub fn get_last_position (&self, domain:&str) -> Option<usize> {
        lookup (&self.toml, &["last_positions", domain]) .and_then (|v| v.as_integer()) .and_then (|n| usize::try_from(n).ok())
    }

    pub fn set_last_position (&mut self, domain:&str, position:usize) {
        let stored = self.section_mut("last_positions") .map (|tbl| tbl.insert (domain, toml_edit::value (position as i64))) .is_some();
        if stored { self.write_back_or_warn() }
    }

}



impl SelectionStore for Config {

    fn last_focused (&self, app:&str) -> Option<Hwnd> {
        lookup (&self.toml, &["last_focused", app]) .and_then (|v| v.as_integer()) .map (|n| n as Hwnd)
    }

    fn set_last_focused (&mut self, app:&str, hwnd:Hwnd) {
        let stored = self.section_mut("last_focused") .map (|tbl| tbl.insert (app, toml_edit::value (hwnd as i64))) .is_some();
        if stored { self.write_back_or_warn() }
    }

    fn clear_last_focused (&mut self, app:&str) {
        let removed = self.section_mut("last_focused") .and_then (|tbl| tbl.remove(app)) .is_some();
        if removed { self.write_back_or_warn() }
    }
}

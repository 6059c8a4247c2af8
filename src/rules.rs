use serde::{Deserialize, Serialize};
use toml_edit::TableLike;



# [ derive (Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize) ]
/// How the windows of one application are recognized among all top-level windows
pub struct ApplicationRule {
    /// windows of these classes qualify .. empty means no class rule
    pub window_classes   : Vec <String>,
    pub title_required   : bool,
    /// any of these in the title qualifies a window
    pub title_includes   : Vec <String>,
    /// any of these in the title disqualifies a window, regardless of everything else
    pub title_excludes   : Vec <String>,
    pub process_name     : Option <String>,
    /// for apps living inside a shared host-frame process, only `title_includes` can qualify a window
    pub title_match_only : bool,
}


fn str_array (tbl:&dyn TableLike, key:&str) -> Vec<String> {
    tbl.get(key) .and_then (|v| v.as_array())
        .map (|arr| arr.iter() .filter_map (|v| v.as_str().map(|s| s.to_string())) .collect())
        .unwrap_or_default()
}


impl ApplicationRule {

    /// The rule for apps nobody configured .. matching then leans on pid and app-name-in-title alone
    pub fn permissive () -> ApplicationRule { ApplicationRule::default() }

    /// Reads a rule from an `[app_rules.<app>]` table, missing keys take their permissive values
    pub fn from_table (tbl:&dyn TableLike) -> ApplicationRule {
        ApplicationRule {
            window_classes   : str_array (tbl, "window_classes"),
            title_required   : tbl.get("title_required") .and_then (|v| v.as_bool()) .unwrap_or(false),
            title_includes   : str_array (tbl, "title_includes"),
            title_excludes   : str_array (tbl, "title_excludes"),
            process_name     : tbl.get("process_name") .and_then (|v| v.as_str()) .map (|s| s.to_string()) .filter (|s| !s.is_empty()),
            title_match_only : tbl.get("title_match_only") .and_then (|v| v.as_bool()) .unwrap_or(false),
        }
    }

    /// The process name this app's windows are expected to come from (e.g. `bcompare.exe`)
    pub fn process_name_for (&self, app:&str) -> String {
        self.process_name .clone() .unwrap_or_else (|| format!("{}{}", app, std::env::consts::EXE_SUFFIX))
    }
}


/// Logical app name from a target path .. lower-case file stem, so `C:\Tools\BCompare.exe` gives `bcompare`
pub fn app_name_from_target (target:&str) -> String {
    let file_name = target .rsplit (['\\', '/']) .next() .unwrap_or(target);
    let stem = match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    };
    stem.trim().to_lowercase()
}

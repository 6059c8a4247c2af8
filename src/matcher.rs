//! Mapping OS windows and processes onto a logical application .. process matching first, then
//! the window filter that applies the app's [`ApplicationRule`] over a window snapshot.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::desktop::{Desktop, WindowRecord};
use crate::rules::ApplicationRule;



/// Pids (among those owning a window in the snapshot) whose process name is the rule's expected
/// process name, or contains the app name .. both compared case-insensitively
pub fn match_processes (desktop:&dyn Desktop, windows:&[WindowRecord], app:&str, rule:&ApplicationRule) -> HashSet<u32> {
    let app = app.to_lowercase();
    let expected = rule.process_name_for(&app).to_lowercase();

    let mut names : HashMap <u32, Option<String>> = HashMap::new();
    windows .iter() .for_each (|w| { names .entry (w.pid) .or_insert_with (|| desktop.process_name(w.pid)); });

    names .into_iter() .filter_map ( |(pid, name)| {
        let Some(name) = name else {
            trace! ("no process name for pid {:?}, skipping", pid);
            return None
        };
        let name = name.to_lowercase();
        (name == expected || (!app.is_empty() && name.contains(&app))) .then_some(pid)
    } ) .collect()
}



/// Whether a (visible, non-system) window belongs to the app under its rule
pub fn window_matches (w:&WindowRecord, pids:&HashSet<u32>, app:&str, rule:&ApplicationRule) -> bool {
    let includes_hit = rule.title_includes .iter() .any (|inc| w.title.contains(inc.as_str()));

    let qualifies = if rule.title_match_only {
        includes_hit
    } else {
        pids.contains(&w.pid)
            || rule.window_classes .iter() .any (|c| *c == w.class_name)
            || includes_hit
            || (!app.is_empty() && w.title.to_lowercase().contains(&app.to_lowercase()))
    };
    if !qualifies { return false }

    if rule.title_required && w.title.is_empty() { return false }
    !rule.title_excludes .iter() .any (|exc| w.title.contains(exc.as_str()))
}


/// Reduces a window snapshot to the app's windows, sorted by handle
pub fn filter_windows (
    windows: &[WindowRecord], pids: &HashSet<u32>, app: &str, rule: &ApplicationRule, excluded_classes: &[String]
) -> Vec<WindowRecord> {
    let mut matched = windows .iter()
        .filter (|w| w.visible && !excluded_classes.contains(&w.class_name))
        .filter (|w| {
            let is_match = window_matches (w, pids, app, rule);
            trace! ("window {:?} class:{:?} title:{:?} pid:{:?} .. match:{:?}", w.hwnd, w.class_name, w.title, w.pid, is_match);
            is_match
        })
        .cloned()
        .collect::<Vec<_>>();
    matched .sort_by_key (|w| w.hwnd);
    debug! ("matched {} windows for {:?}: {:?}", matched.len(), app, matched.iter().map(|w| w.hwnd).collect::<Vec<_>>());
    matched
}




#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::fake::FakeDesktop;

    fn bcompare_rule () -> ApplicationRule {
        ApplicationRule {
            window_classes : vec!["TViewForm".into()],
            title_required : true,
            title_includes : vec!["Compare".into()],
            title_excludes : vec!["Home".into()],
            .. ApplicationRule::default()
        }
    }

    fn sys_classes () -> Vec<String> {
        vec!["tooltips_class32".into(), "Static".into(), "SysListView32".into()]
    }

    #[test]
    fn process_matching_by_name_or_substring() {
        let windows = vec![
            WindowRecord::new (10, "A", "", 100),
            WindowRecord::new (11, "B", "", 200),
            WindowRecord::new (12, "C", "", 300),
            WindowRecord::new (13, "D", "", 400),
        ];
        let desk = FakeDesktop::new (windows.clone())
            .with_proc (100, &format!("BCompare{}", std::env::consts::EXE_SUFFIX))
            .with_proc (200, "bcompare_helper")
            .with_proc (300, "explorer");
        // 400 has no resolvable name
        let pids = match_processes (&desk, &windows, "bcompare", &ApplicationRule::permissive());
        assert_eq!(pids, HashSet::from([100, 200]));
    }

    #[test]
    fn process_override_name_is_used() {
        let windows = vec![ WindowRecord::new (10, "A", "Calculator", 100) ];
        let desk = FakeDesktop::new (windows.clone()) .with_proc (100, "ApplicationFrameHost.exe");
        let rule = ApplicationRule { process_name: Some("applicationframehost.exe".into()), .. ApplicationRule::default() };
        assert_eq!(match_processes (&desk, &windows, "calculatorapp", &rule), HashSet::from([100]));
        assert!(match_processes (&desk, &windows, "calculatorapp", &ApplicationRule::permissive()).is_empty());
    }

    #[test]
    fn compare_scenario_keeps_only_the_session_window() {
        let windows = vec![
            WindowRecord::new (3, "TViewForm", "Home", 7),
            WindowRecord::new (1, "TViewForm", "Compare - a vs b", 7),
            WindowRecord::new (2, "tooltips_class32", "", 7),
        ];
        let pids = HashSet::from([7]);
        let hwnds = filter_windows (&windows, &pids, "bcompare", &bcompare_rule(), &sys_classes())
            .iter() .map (|w| w.hwnd) .collect::<Vec<_>>();
        assert_eq!(hwnds, vec![1]);
    }

    #[test]
    fn excluded_titles_never_match() {
        let rule = bcompare_rule();
        let pids = HashSet::from([7]);
        let titles = ["Home", "Compare Home", "Home - Compare", "x Home x"];
        for (i, t) in titles.iter().enumerate() {
            let w = WindowRecord::new (i as isize + 1, "TViewForm", t, 7);
            assert!(!window_matches (&w, &pids, "bcompare", &rule), "title {:?} should be excluded", t);
        }
    }

    #[test]
    fn or_semantics_qualify_foreign_windows() {
        let rule = bcompare_rule();
        let none = HashSet::new();
        // class alone, title-include alone, and app name in title alone all qualify
        assert!(window_matches (&WindowRecord::new (1, "TViewForm", "x", 9), &none, "bcompare", &rule));
        assert!(window_matches (&WindowRecord::new (2, "Other", "Compare", 9), &none, "bcompare", &rule));
        assert!(window_matches (&WindowRecord::new (3, "Other", "about BCompare", 9), &none, "bcompare", &ApplicationRule::permissive()));
        assert!(!window_matches (&WindowRecord::new (4, "Other", "unrelated", 9), &none, "bcompare", &rule));
    }

    #[test]
    fn title_required_rejects_empty_titles() {
        let rule = bcompare_rule();
        let pids = HashSet::from([7]);
        assert!(!window_matches (&WindowRecord::new (1, "TViewForm", "", 7), &pids, "bcompare", &rule));
    }

    #[test]
    fn host_frame_rules_ignore_pid_and_class() {
        let rule = ApplicationRule {
            title_includes   : vec!["Calculator".into()],
            title_required   : true,
            title_match_only : true,
            window_classes   : vec!["ApplicationFrameWindow".into()],
            .. ApplicationRule::default()
        };
        let pids = HashSet::from([5]);
        let windows = vec![
            WindowRecord::new (1, "ApplicationFrameWindow", "Settings", 5),
            WindowRecord::new (2, "ApplicationFrameWindow", "Calculator", 5),
        ];
        let hwnds = filter_windows (&windows, &pids, "calculatorapp", &rule, &[])
            .iter() .map (|w| w.hwnd) .collect::<Vec<_>>();
        assert_eq!(hwnds, vec![2]);
    }

    #[test]
    fn invisible_and_system_windows_are_dropped_and_result_is_sorted() {
        let mut hidden = WindowRecord::new (5, "Main", "app", 1);
        hidden.visible = false;
        let windows = vec![
            WindowRecord::new (9, "Main", "app", 1),
            hidden,
            WindowRecord::new (4, "SysListView32", "app", 1),
            WindowRecord::new (2, "Main", "app", 1),
        ];
        let hwnds = filter_windows (&windows, &HashSet::from([1]), "app", &ApplicationRule::permissive(), &sys_classes())
            .iter() .map (|w| w.hwnd) .collect::<Vec<_>>();
        assert_eq!(hwnds, vec![2, 9]);
    }
}

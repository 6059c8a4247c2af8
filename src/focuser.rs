//! The top-level flows of one invocation .. focus/cycle/launch an app, find/open a browser tab for a
//! domain, or just bring up the browser. Everything runs off a per-invocation [`FocusCtx`].

use std::fmt;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::desktop::{Desktop, Hwnd, WindowRecord};
use crate::focus::{bring_to_fgnd, focus_window};
use crate::launch::{app_command, browser_command, LaunchCommand, Launcher};
use crate::matcher::{filter_windows, match_processes, window_matches};
use crate::rules::app_name_from_target;
use crate::selector::select_window;
use crate::tabs::{cycle_tabs, normalize_domain, DomainMatcher, TabCycleOutcome};



# [ derive (Debug, Clone, PartialEq, Eq) ]
pub enum Target {
    /// executable or shortcut path
    App (String),
    /// website domain, looked up among browser tabs
    Tab (String),
}

impl Target {
    // no `com` here .. a bare `name.com` is a domain, a `.com` program needs to be given with its path
    const APP_EXTENSIONS : [&'static str; 5] = ["exe", "lnk", "url", "bat", "cmd"];

    /// Paths (or anything with a launchable extension) are apps, everything else is taken as a domain
    pub fn detect (s:&str) -> Target {
        let s = s.trim();
        let has_sep = s.contains(['\\', '/']) && !s.contains("://");
        let ext = s.rsplit_once('.') .map (|(_, e)| e.to_lowercase());
        if has_sep || ext .is_some_and (|e| Self::APP_EXTENSIONS.contains(&e.as_str())) {
            Target::App (s.to_string())
        } else {
            Target::Tab (s.to_string())
        }
    }

    pub fn name (&self) -> String {
        match self {
            Target::App(path) => app_name_from_target(path),
            Target::Tab(domain) => normalize_domain(domain),
        }
    }
}


# [ derive (Debug, Clone, Copy, PartialEq, Eq) ]
pub enum FocusOutcome {
    Focused (Hwnd),
    TabFound (usize),
    Launched,
    Failed,
}

impl FocusOutcome {
    pub fn is_success (&self) -> bool { !matches!(self, FocusOutcome::Failed) }
}



# [ derive (Debug, Clone, PartialEq, Eq, Serialize) ]
/// One line of the diagnostic window dump
pub struct InventoryEntry {
    #[serde(flatten)]
    pub window  : WindowRecord,
    pub process : Option <String>,
    /// whether the window is one of the target's windows (only when a target was given)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches : Option <bool>,
}

impl fmt::Display for InventoryEntry {
    fn fmt (&self, f:&mut fmt::Formatter<'_>) -> fmt::Result {
        let w = &self.window;
        let matches = match self.matches { Some(true) => "*", Some(false) => " ", None => "" };
        write! (f, "{}{:#010x} {:>6} {} {:<28} {:<24} {:?}",
            matches, w.hwnd, w.pid, if w.visible {"V"} else {"-"}, w.class_name,
            self.process.as_deref().unwrap_or("?"), w.title
        )
    }
}



pub struct FocusCtx<'a> {
    pub desktop  : &'a dyn Desktop,
    pub launcher : &'a dyn Launcher,
    pub conf     : Config,
}

impl<'a> FocusCtx<'a> {

    pub fn new (desktop:&'a dyn Desktop, launcher:&'a dyn Launcher, conf:Config) -> FocusCtx<'a> {
        FocusCtx { desktop, launcher, conf }
    }

    pub fn run (&mut self, target:Option<&Target>) -> FocusOutcome {
        match target {
            Some(Target::App(path))   => self.focus_app (path),
            Some(Target::Tab(domain)) => self.focus_tab (domain),
            None                      => self.focus_browser(),
        }
    }

    fn launch (&self, cmd:&LaunchCommand) -> FocusOutcome {
        match self.launcher.launch (cmd) {
            Ok(()) => FocusOutcome::Launched,
            Err(e) => { error! ("{}", e); FocusOutcome::Failed }
        }
    }


    /// The target app's windows in the current snapshot, sorted by handle
    pub fn app_windows (&self, app:&str) -> Vec<WindowRecord> {
        let rule = self.conf.get_app_rule (app);
        let windows = self.desktop.enum_windows();
        let pids = match_processes (self.desktop, &windows, app, &rule);
        debug! ("app {:?} pids: {:?}", app, pids);
        filter_windows (&windows, &pids, app, &rule, &self.conf.get_excluded_window_classes())
    }

    /// Focuses the next window of the app at `target` (cycling on repeat calls), launching it if it has none
    pub fn focus_app (&mut self, target:&str) -> FocusOutcome {
        let start = Instant::now();
        let app = app_name_from_target (target);
        let hwnds = self.app_windows(&app) .iter() .map (|w| w.hwnd) .collect::<Vec<_>>();

        if hwnds.is_empty() {
            info! ("no windows found for {:?}, launching {:?}", app, target);
            return match app_command (Path::new(target)) {
                Ok(cmd) => self.launch (&cmd),
                Err(e)  => { error! ("{}", e); FocusOutcome::Failed }
            }
        }

        let timing = self.conf.get_focus_timing();
        let fgnd = self.desktop.fgnd_window();
        let mut excluded : Vec<Hwnd> = Vec::new();

        // a failed window gets one retry of the selection without it, when there's anything else to pick
        for _ in 0 .. 2 {
            let Some(hwnd) = select_window (&hwnds, fgnd, &mut self.conf, &app, &excluded) else { break };
            if focus_window (self.desktop, hwnd, &timing, &mut self.conf, &app) {
                info! ("focused {:?} window {:?} in {:.2}s", app, hwnd, start.elapsed().as_secs_f32());
                return FocusOutcome::Focused(hwnd)
            }
            if hwnds.len() < 2 { break }
            excluded.push(hwnd);
        }

        warn! ("could not focus any window of {:?}, launching {:?}", app, target);
        match app_command (Path::new(target)) {
            Ok(cmd) => self.launch (&cmd),
            Err(e)  => { error! ("{}", e); FocusOutcome::Failed }
        }
    }



    /// A browser window to work with .. the foreground window if it is one, else the lowest handle
    pub fn find_browser_window (&self) -> Option<Hwnd> {
        let class = self.conf.get_browser_window_class();
        let proc_name = self.conf.get_browser_spec().process_name.to_lowercase();
        let candidates = self.desktop.enum_windows() .into_iter()
            .filter (|w| w.visible && w.class_name == class && !w.title.is_empty())
            .filter (|w| self.desktop.process_name(w.pid) .is_some_and (|n| n.to_lowercase() == proc_name))
            .map (|w| w.hwnd)
            .collect::<Vec<_>>();
        let fgnd = self.desktop.fgnd_window();
        let found = if candidates.contains(&fgnd) { Some(fgnd) } else { candidates.iter().min().copied() };
        debug! ("browser windows: {:?} .. using {:?}", candidates, found);
        found
    }

    /// Brings up a browser window, or starts the browser when there is none
    pub fn focus_browser (&mut self) -> FocusOutcome {
        let spec = self.conf.get_browser_spec();
        match self.find_browser_window() {
            None => {
                info! ("no browser window found, launching browser");
                self.launch (&browser_command (&spec, None, false))
            }
            Some(hwnd) => match bring_to_fgnd (self.desktop, hwnd, &self.conf.get_focus_timing()) {
                Some(_) => FocusOutcome::Focused(hwnd),
                None => FocusOutcome::Failed,
            }
        }
    }

    /// Switches the browser to a tab showing `domain`, opening one if none exists
    pub fn focus_tab (&mut self, domain:&str) -> FocusOutcome {
        let start = Instant::now();
        if !self.desktop.set_self_priority_high() {
            debug! ("could not raise process priority");
        }

        let domain = normalize_domain (domain);
        if domain.is_empty() { return self.focus_browser() }

        self.conf.ensure_domain_entries (&domain);
        let url = self.conf.get_domain_url (&domain);
        let spec = self.conf.get_browser_spec();

        let Some(hwnd) = self.find_browser_window() else {
            info! ("no browser window found, launching browser at {:?}", url);
            return self.launch (&browser_command (&spec, Some(&url), false))
        };
        if bring_to_fgnd (self.desktop, hwnd, &self.conf.get_focus_timing()).is_none() {
            warn! ("could not focus browser window {:?}, launching browser at {:?}", hwnd, url);
            return self.launch (&browser_command (&spec, Some(&url), false))
        }

        let matcher = DomainMatcher::new (&domain, &self.conf.get_domain_patterns(&domain));
        let cur_title = self.desktop.window_text (self.desktop.fgnd_window());
        if matcher.matches (&cur_title) {
            if self.conf.check_flag__new_tab_when_on_target() {
                info! ("already on {:?}, opening another tab", domain);
                return self.launch (&browser_command (&spec, Some(&url), true))
            }
            info! ("already on {:?}", domain);
            return FocusOutcome::Focused(hwnd)
        }

        let Some(params) = self.conf.get_tab_params() else {
            error! ("no usable tab switching keys configured, opening new tab");
            return self.launch (&browser_command (&spec, Some(&url), true))
        };
        match cycle_tabs (self.desktop, &matcher, &params) {
            TabCycleOutcome::Found(pos) => {
                self.conf.set_last_position (&domain, pos);
                info! ("switched to {:?} tab at position {} in {:.2}s", domain, pos, start.elapsed().as_secs_f32());
                FocusOutcome::TabFound(pos)
            }
            outcome => {
                info! ("no tab for {:?} ({:?}), opening new tab", domain, outcome);
                self.launch (&browser_command (&spec, Some(&url), true))
            }
        }
    }



    /// Every top-level window, annotated with its process and (given a target) whether it is the target's
    pub fn window_inventory (&self, target:Option<&Target>) -> Vec<InventoryEntry> {
        let windows = self.desktop.enum_windows();
        let excluded_classes = self.conf.get_excluded_window_classes();

        let app_match = match target {
            Some(Target::App(path)) => {
                let app = app_name_from_target (path);
                let rule = self.conf.get_app_rule (&app);
                let pids = match_processes (self.desktop, &windows, &app, &rule);
                Some ( (app, rule, pids) )
            }
            _ => None,
        };
        let tab_match = match target {
            Some(Target::Tab(domain)) => {
                let domain = normalize_domain (domain);
                Some ( DomainMatcher::new (&domain, &self.conf.get_domain_patterns(&domain)) )
            }
            _ => None,
        };
        let browser_class = self.conf.get_browser_window_class();

        windows .into_iter() .map ( |w| {
            let matches = if let Some((app, rule, pids)) = app_match.as_ref() {
                Some ( w.visible && !excluded_classes.contains(&w.class_name) && window_matches (&w, pids, app, rule) )
            } else {
                tab_match .as_ref() .map (|m| w.class_name == browser_class && m.matches(&w.title))
            };
            InventoryEntry { process: self.desktop.process_name(w.pid), window: w, matches }
        } ) .collect()
    }
}




#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::desktop::fake::{FakeDesktop, FgndPolicy};
    use crate::launch::fake::RecordingLauncher;
    use crate::state::SelectionStore;

    const BROWSER : Hwnd = 500;

    fn quick_conf () -> Config {
        Config::from_toml_str ("[focus]\nsettle_delay_ms = 0\nretry_delay_ms = 0\n[tabs]\ntab_switch_delay_ms = 0\n") .unwrap()
    }

    fn app_desk () -> FakeDesktop {
        FakeDesktop::new (vec![
            WindowRecord::new (1, "Main", "doc one", 10),
            WindowRecord::new (2, "Main", "doc two", 10),
            WindowRecord::new (3, "Main", "doc three", 10),
            WindowRecord::new (4, "Main", "other app", 20),
        ])
        .with_proc (10, &format!("tool{}", std::env::consts::EXE_SUFFIX))
        .with_proc (20, "other")
    }

    fn browser_desk (titles:&[&str]) -> FakeDesktop {
        FakeDesktop::new (vec![
            WindowRecord::new (BROWSER, "Chrome_WidgetWin_1", "Chrome", 30),
            WindowRecord::new (7, "Notepad", "notes", 40),
        ])
        .with_proc (30, "chrome.exe")
        .with_proc (40, "notepad.exe")
        .with_fgnd (7)
        .with_tabs (BROWSER, titles)
    }

    #[test]
    fn targets_are_detected_by_shape() {
        assert_eq!(Target::detect(r"C:\Tools\tool.exe"), Target::App(r"C:\Tools\tool.exe".into()));
        assert_eq!(Target::detect("tool.LNK"), Target::App("tool.LNK".into()));
        assert_eq!(Target::detect("perplexity.ai"), Target::Tab("perplexity.ai".into()));
        assert_eq!(Target::detect("github.com"), Target::Tab("github.com".into()));
        assert_eq!(Target::detect("Google.COM"), Target::Tab("Google.COM".into()));
        assert_eq!(Target::detect(r"C:\DOS\edit.com"), Target::App(r"C:\DOS\edit.com".into()));
        assert_eq!(Target::detect("https://claude.ai/"), Target::Tab("https://claude.ai/".into()));
        assert_eq!(Target::detect("https://claude.ai/").name(), "claude.ai");
    }

    #[test]
    fn foreground_window_cycles_to_the_next_one() {
        let desk = app_desk() .with_fgnd (2);
        let launcher = RecordingLauncher::default();
        let mut ctx = FocusCtx::new (&desk, &launcher, quick_conf());
        assert_eq!(ctx.focus_app ("/opt/tool.exe"), FocusOutcome::Focused(3));
        assert_eq!(ctx.conf.last_focused("tool"), Some(3));
        assert_eq!(ctx.focus_app ("/opt/tool.exe"), FocusOutcome::Focused(1));
        assert!(launcher.launched.borrow().is_empty());
    }

    #[test]
    fn failed_window_falls_back_to_another_candidate() {
        let desk = app_desk() .with_fgnd (4) .with_unfocusable (1);
        let launcher = RecordingLauncher::default();
        let mut ctx = FocusCtx::new (&desk, &launcher, quick_conf());
        assert_eq!(ctx.focus_app ("/opt/tool.exe"), FocusOutcome::Focused(2));
        assert_eq!(ctx.conf.last_focused("tool"), Some(2));
    }

    #[test]
    fn app_without_windows_is_launched() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join ("newapp.exe");
        fs::write (&exe, b"").unwrap();
        let desk = app_desk();
        let launcher = RecordingLauncher::default();
        let mut ctx = FocusCtx::new (&desk, &launcher, quick_conf());
        assert_eq!(ctx.focus_app (&exe.display().to_string()), FocusOutcome::Launched);
        assert_eq!(launcher.launched.borrow()[0].program, exe);
    }

    #[test]
    fn unfocusable_app_with_missing_exe_fails() {
        let desk = app_desk() .with_policy (FgndPolicy::Never);
        let launcher = RecordingLauncher::default();
        let mut ctx = FocusCtx::new (&desk, &launcher, quick_conf());
        assert_eq!(ctx.focus_app ("/no/such/tool.exe"), FocusOutcome::Failed);
        assert!(!ctx.focus_app ("/no/such/tool.exe").is_success());
    }

    #[test]
    fn tab_is_found_by_cycling_and_position_is_kept() {
        let desk = browser_desk (&["Inbox", "News", "I'm looking for - Perplexity", "Docs"]);
        let launcher = RecordingLauncher::default();
        let mut ctx = FocusCtx::new (&desk, &launcher, quick_conf());
        assert_eq!(ctx.focus_tab ("www.perplexity.ai"), FocusOutcome::TabFound(2));
        assert_eq!(desk.fgnd_window(), BROWSER);
        assert_eq!(ctx.conf.get_last_position("perplexity.ai"), Some(2));
        assert!(launcher.launched.borrow().is_empty());
    }

    #[test]
    fn missing_tab_is_opened_in_a_new_tab() {
        let desk = browser_desk (&["Inbox", "News"]);
        let launcher = RecordingLauncher::default();
        let mut ctx = FocusCtx::new (&desk, &launcher, quick_conf());
        assert_eq!(ctx.focus_tab ("github.com"), FocusOutcome::Launched);
        let launched = launcher.launched.borrow();
        assert_eq!(launched[0].args, vec!["--new-tab", "https://github.com"]);
        assert_eq!(ctx.conf.get_last_position("github.com"), Some(0));
    }

    #[test]
    fn dotcom_domain_from_the_command_line_reaches_the_tab_cycle() {
        let desk = browser_desk (&["Inbox", "GitHub - repos", "News"]);
        let launcher = RecordingLauncher::default();
        let mut ctx = FocusCtx::new (&desk, &launcher, quick_conf());
        let target = Target::detect ("github.com");
        assert_eq!(ctx.run (Some(&target)), FocusOutcome::TabFound(1));
        assert_eq!(ctx.conf.get_last_position("github.com"), Some(1));
        assert!(launcher.launched.borrow().is_empty());
    }

    #[test]
    fn already_on_target_opens_another_tab_unless_disabled() {
        let desk = browser_desk (&["Inbox", "Claude"]);
        desk.tab_idx.set(1);
        let launcher = RecordingLauncher::default();
        let mut ctx = FocusCtx::new (&desk, &launcher, quick_conf());
        assert_eq!(ctx.focus_tab ("claude.ai"), FocusOutcome::Launched);
        assert_eq!(launcher.launched.borrow()[0].args, vec!["--new-tab", "https://claude.ai"]);

        let conf = Config::from_toml_str ("[focus]\nsettle_delay_ms = 0\n[tabs]\nnew_tab_when_on_target = false\n") .unwrap();
        let mut ctx = FocusCtx::new (&desk, &launcher, conf);
        assert_eq!(ctx.focus_tab ("claude.ai"), FocusOutcome::Focused(BROWSER));
        assert_eq!(launcher.launched.borrow().len(), 1);
    }

    #[test]
    fn no_browser_means_launching_one() {
        let desk = app_desk();
        let launcher = RecordingLauncher::default();
        let mut ctx = FocusCtx::new (&desk, &launcher, quick_conf());
        assert_eq!(ctx.focus_tab ("claude.ai"), FocusOutcome::Launched);
        assert_eq!(launcher.launched.borrow()[0].args, vec!["https://claude.ai"]);
        assert_eq!(ctx.run (None), FocusOutcome::Launched);
        assert!(launcher.launched.borrow()[1].args.is_empty());
    }

    #[test]
    fn browser_only_mode_focuses_the_browser() {
        let desk = browser_desk (&["Inbox"]);
        let launcher = RecordingLauncher::default();
        let mut ctx = FocusCtx::new (&desk, &launcher, quick_conf());
        assert_eq!(ctx.run (None), FocusOutcome::Focused(BROWSER));
        assert!(launcher.launched.borrow().is_empty());
    }

    #[test]
    fn launch_failures_are_reported_as_failed() {
        let desk = app_desk();
        let launcher = RecordingLauncher { fail: true, .. RecordingLauncher::default() };
        let mut ctx = FocusCtx::new (&desk, &launcher, quick_conf());
        assert_eq!(ctx.focus_tab ("claude.ai"), FocusOutcome::Failed);
    }

    #[test]
    fn inventory_marks_the_target_windows() {
        let desk = app_desk();
        let launcher = RecordingLauncher::default();
        let ctx = FocusCtx::new (&desk, &launcher, quick_conf());

        let inv = ctx.window_inventory (Some(&Target::App("/opt/tool.exe".into())));
        let marked = inv.iter() .filter (|e| e.matches == Some(true)) .map (|e| e.window.hwnd) .collect::<Vec<_>>();
        assert_eq!(marked, vec![1, 2, 3]);
        assert_eq!(inv[3].process.as_deref(), Some("other"));

        let plain = ctx.window_inventory (None);
        assert!(plain.iter().all (|e| e.matches.is_none()));
        let json = serde_json::to_value (&plain[0]) .unwrap();
        assert_eq!(json["hwnd"], 1);
        assert_eq!(json["class_name"], "Main");
        assert!(json.get("matches").is_none());
    }
}

//! Finding a browser tab by domain, by walking the tabs with keyboard shortcuts and checking the
//! foreground window title (the browser shows the active tab's title there).

use std::collections::HashMap;
use std::thread::sleep;
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::desktop::Desktop;
use crate::keys::KeyCombo;



/// Canonical form of a domain argument .. lower-case, without scheme, `www.` or trailing slash
pub fn normalize_domain (domain:&str) -> String {
    let d = domain.trim().to_lowercase();
    let d = d .strip_prefix("https://") .or_else (|| d.strip_prefix("http://")) .unwrap_or(&d);
    let d = d .strip_prefix("www.") .unwrap_or(d);
    d .trim_end_matches('/') .to_string()
}


# [ derive (Debug, Clone, PartialEq, Eq) ]
/// Case-insensitive title predicate for the tabs of one domain
pub struct DomainMatcher {
    domain   : String,
    patterns : Vec <String>,
}

impl DomainMatcher {

    /// Builds the pattern set for a (normalized) domain plus any configured extra title fragments
    pub fn new (domain:&str, extra_patterns:&[String]) -> DomainMatcher {
        let domain = normalize_domain (domain);
        let mut patterns = vec![
            domain.clone(),
            format! ("www.{}", domain),
            format! ("{}/", domain),
            format! ("www.{}/", domain),
            format! ("https://{}", domain),
            format! ("https://www.{}", domain),
        ];
        if let Some(label) = domain.split('.').next() { patterns.push (label.to_string()) }
        patterns .extend (extra_patterns .iter() .map (|p| p.to_lowercase()));
        patterns .retain (|p| !p.is_empty());
        patterns .dedup();
        DomainMatcher { domain, patterns }
    }

    pub fn domain (&self) -> &str { &self.domain }
    pub fn patterns (&self) -> &[String] { &self.patterns }

    pub fn matches (&self, title:&str) -> bool {
        if title.is_empty() { return false }
        let title = title.to_lowercase();
        let hit = self.patterns .iter() .find (|p| title.contains(p.as_str()));
        trace! ("title {:?} vs {:?} .. matched: {:?}", title, self.domain, hit);
        hit.is_some()
    }
}



# [ derive (Debug, Clone, PartialEq, Eq) ]
pub struct TabCycleParams {
    pub max_tabs     : usize,
    pub switch_delay : Duration,
    pub first_tab    : KeyCombo,
    pub next_tab     : KeyCombo,
}

# [ derive (Debug, Clone, Copy, PartialEq, Eq) ]
pub enum TabCycleOutcome {
    /// matching tab is now active, at this position counting from the first tab
    Found (usize),
    /// came back around to an already seen title without a match
    CycleCompleted { visited: usize },
    /// gave up after visiting the configured max number of tabs
    LimitReached { visited: usize },
}


fn fgnd_title (desktop:&dyn Desktop) -> String {
    desktop.window_text (desktop.fgnd_window())
}

/// Walks the tabs of the foreground browser window from the first tab until one matches the domain.<br>
/// Titles are remembered by position, so seeing a title a second time means we've gone all the way around.
pub fn cycle_tabs (desktop:&dyn Desktop, matcher:&DomainMatcher, params:&TabCycleParams) -> TabCycleOutcome {

    desktop.send_keys (&params.first_tab);
    sleep (params.switch_delay * 2);

    let title = fgnd_title (desktop);
    debug! ("tab 0: {:?}", title);
    if matcher.matches (&title) {
        info! ("found {:?} at first tab", matcher.domain());
        return TabCycleOutcome::Found(0)
    }

    let mut seen : HashMap <String, usize> = HashMap::new();
    seen.insert (title, 0);
    let mut position = 1;

    while position < params.max_tabs {
        desktop.send_keys (&params.next_tab);
        sleep (params.switch_delay.mul_f32(1.5));

        let title = fgnd_title (desktop);
        debug! ("tab {}: {:?}", position, title);
        if let Some(first_seen) = seen.get(&title) {
            info! ("tab cycle complete after {} tabs (title first seen at {}), no match for {:?}", position, first_seen, matcher.domain());
            return TabCycleOutcome::CycleCompleted { visited: position }
        }
        if matcher.matches (&title) {
            info! ("found {:?} at tab position {}", matcher.domain(), position);
            return TabCycleOutcome::Found(position)
        }
        seen.insert (title, position);
        position += 1;
    }
    info! ("checked max of {} tabs, no match for {:?}", params.max_tabs, matcher.domain());
    TabCycleOutcome::LimitReached { visited: position }
}

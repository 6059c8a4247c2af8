//! Making a window foreground despite the OS rules on which processes may steal focus.
//!
//! Techniques are tried in order of invasiveness, each verified against the actual foreground window
//! after a short settle delay. The first one that works ends the attempt, and the whole ladder is
//! retried for a few rounds before giving up.

use std::thread::sleep;
use std::time::Duration;

use strum_macros::AsRefStr;
use tracing::{debug, info, warn};

use crate::desktop::{Desktop, Hwnd, InputLink};
use crate::keys::VK_MENU;
use crate::state::SelectionStore;



# [ derive (Debug, Clone, Copy, PartialEq, Eq) ]
pub struct FocusTiming {
    pub max_retries : u32,
    pub retry_delay : Duration,
    pub settle      : Duration,
}

impl Default for FocusTiming {
    fn default () -> Self {
        FocusTiming { max_retries: 3, retry_delay: Duration::from_millis(100), settle: Duration::from_millis(50) }
    }
}


# [ derive (Debug, Clone, Copy, PartialEq, Eq, AsRefStr) ]
pub enum FocusTechnique {
    DirectRequest,
    AltKeyBracket,
    InputAttach,
    AllowSetFgnd,
}

/// Common shape of a focus technique .. returns whether the window ended up foreground
pub type TechniqueFn = fn (&dyn Desktop, Hwnd, &FocusTiming) -> bool;

pub const FOCUS_TECHNIQUES : [(FocusTechnique, TechniqueFn); 4] = [
    ( FocusTechnique::DirectRequest, direct_request   ),
    ( FocusTechnique::AltKeyBracket, alt_key_bracket  ),
    ( FocusTechnique::InputAttach,   input_attach     ),
    ( FocusTechnique::AllowSetFgnd,  allow_set_fgnd   ),
];



fn settled_fgnd (desktop:&dyn Desktop, hwnd:Hwnd, timing:&FocusTiming) -> bool {
    if !timing.settle.is_zero() { sleep (timing.settle) }
    desktop.fgnd_window() == hwnd
}

fn direct_request (desktop:&dyn Desktop, hwnd:Hwnd, timing:&FocusTiming) -> bool {
    desktop.restore_if_minimized (hwnd);
    desktop.raise (hwnd);
    let _ = desktop.request_fgnd (hwnd);
    settled_fgnd (desktop, hwnd, timing)
}

fn alt_key_bracket (desktop:&dyn Desktop, hwnd:Hwnd, timing:&FocusTiming) -> bool {
    // the OS lets whoever sent the last input event set the foreground window, a lone alt press makes that us
    desktop.key_down (VK_MENU);
    desktop.restore_if_minimized (hwnd);
    desktop.raise (hwnd);
    let _ = desktop.request_fgnd (hwnd);
    desktop.key_up (VK_MENU);
    settled_fgnd (desktop, hwnd, timing)
}


/// Keeps an input-queue attachment alive for its own lifetime, detaching on drop
struct InputAttachGuard<'a> {
    desktop : &'a dyn Desktop,
    link    : Option <InputLink>,
}
impl<'a> InputAttachGuard<'a> {
    fn attach (desktop:&'a dyn Desktop, hwnd:Hwnd) -> InputAttachGuard<'a> {
        InputAttachGuard { desktop, link: desktop.attach_input(hwnd) }
    }
}
impl Drop for InputAttachGuard<'_> {
    fn drop (&mut self) {
        if let Some(link) = self.link.take() { self.desktop.detach_input(link) }
    }
}

fn input_attach (desktop:&dyn Desktop, hwnd:Hwnd, timing:&FocusTiming) -> bool {
    let guard = InputAttachGuard::attach (desktop, hwnd);
    if guard.link.is_none() { debug! ("input attach unavailable for {:?}, trying anyway", hwnd) }
    desktop.restore_if_minimized (hwnd);
    desktop.raise (hwnd);
    let _ = desktop.request_fgnd (hwnd);
    desktop.activate (hwnd);
    drop (guard);
    settled_fgnd (desktop, hwnd, timing)
}

fn allow_set_fgnd (desktop:&dyn Desktop, hwnd:Hwnd, timing:&FocusTiming) -> bool {
    let pid = desktop.window_pid (hwnd);
    if pid != 0 && !desktop.allow_set_fgnd (pid) { debug! ("foreground permission grant refused for pid {:?}", pid) }
    desktop.raise (hwnd);
    let _ = desktop.request_fgnd (hwnd);
    settled_fgnd (desktop, hwnd, timing)
}



/// Runs the technique ladder on one window, returning the technique that got it foreground (if any)
pub fn bring_to_fgnd (desktop:&dyn Desktop, hwnd:Hwnd, timing:&FocusTiming) -> Option<FocusTechnique> {
    if !desktop.window_exists (hwnd) {
        warn! ("window {:?} no longer exists, not focusing", hwnd);
        return None
    }
    let rounds = timing.max_retries.max(1);
    for round in 0 .. rounds {
        if round > 0 && !timing.retry_delay.is_zero() { sleep (timing.retry_delay) }
        for (technique, technique_fn) in FOCUS_TECHNIQUES.iter() {
            if technique_fn (desktop, hwnd, timing) {
                info! ("focused {:?} via {} (round {})", hwnd, technique.as_ref(), round + 1);
                return Some(*technique)
            }
            debug! ("{} did not focus {:?}", technique.as_ref(), hwnd);
        }
    }
    warn! ("failed to focus {:?} after {} rounds", hwnd, rounds);
    None
}

/// Focuses a window of `app`, remembering it as the app's last focused window on success
pub fn focus_window (
    desktop: &dyn Desktop, hwnd: Hwnd, timing: &FocusTiming, store: &mut dyn SelectionStore, app: &str
) -> bool {
    let focused = bring_to_fgnd (desktop, hwnd, timing) .is_some();
    if focused { store.set_last_focused (app, hwnd) }
    focused
}

use tracing::{debug, info};

use crate::desktop::Hwnd;
use crate::state::SelectionStore;



/// Picks the one window of the app to focus next, given the app's matched windows (sorted by handle).<br>
/// In order of priority: a lone window, the remembered window if it isnt already foreground, the window
/// after the foreground one (wrapping), else the first window. Handles in `excluded` are never picked,
/// and a remembered handle that is no longer among the matched windows is cleared as stale.
pub fn select_window (
    matched: &[Hwnd], fgnd: Hwnd, store: &mut dyn SelectionStore, app: &str, excluded: &[Hwnd]
) -> Option<Hwnd> {

    let mut last = store.last_focused(app);
    if let Some(hwnd) = last {
        if !matched.contains(&hwnd) {
            info! ("clearing stale last-focused handle {:?} for {:?}", hwnd, app);
            store.clear_last_focused(app);
            last = None;
        }
    }

    let candidates = matched .iter() .copied() .filter (|h| !excluded.contains(h)) .collect::<Vec<_>>();

    let selected = match candidates.as_slice() {
        [] => None,
        [only] => Some(*only),
        _ => {
            if let Some(hwnd) = last .filter (|h| *h != fgnd && candidates.contains(h)) {
                debug! ("selecting last focused window {:?}", hwnd);
                Some(hwnd)
            } else if let Some(idx) = candidates .iter() .position (|h| *h == fgnd) {
                Some ( candidates [(idx + 1) % candidates.len()] )
            } else {
                candidates.first().copied()
            }
        }
    };
    debug! ("selected {:?} among {:?} (fgnd:{:?}, last:{:?}, excluded:{:?})", selected, candidates, fgnd, last, excluded);
    selected
}




#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use super::*;

    fn store () -> HashMap<String, Hwnd> { HashMap::new() }

    #[test]
    fn lone_window_is_always_selected() {
        let mut s = store();
        s.set_last_focused ("app", 1);
        assert_eq!(select_window (&[1], 1, &mut s, "app", &[]), Some(1));
        assert_eq!(select_window (&[7], 3, &mut store(), "app", &[]), Some(7));
    }

    #[test]
    fn remembered_window_wins_when_not_foreground() {
        let mut s = store();
        s.set_last_focused ("app", 3);
        assert_eq!(select_window (&[1, 2, 3], 1, &mut s, "app", &[]), Some(3));
    }

    #[test]
    fn foreground_advances_to_next_handle() {
        assert_eq!(select_window (&[1, 2, 3], 2, &mut store(), "app", &[]), Some(3));
        assert_eq!(select_window (&[1, 2, 3], 3, &mut store(), "app", &[]), Some(1));
        assert_eq!(select_window (&[1, 2, 3], 99, &mut store(), "app", &[]), Some(1));
    }

    #[test]
    fn stale_handle_is_cleared() {
        let mut s = store();
        s.set_last_focused ("app", 42);
        assert_eq!(select_window (&[1, 2], 1, &mut s, "app", &[]), Some(2));
        assert_eq!(s.last_focused("app"), None);
        assert_eq!(select_window (&[], 1, &mut s, "other", &[]), None);
    }

    #[test]
    fn excluded_handles_are_skipped() {
        let mut s = store();
        s.set_last_focused ("app", 2);
        assert_eq!(select_window (&[1, 2, 3], 1, &mut s, "app", &[2]), Some(3));
        assert_eq!(select_window (&[1, 2], 5, &mut s, "app", &[1]), Some(2));
        assert_eq!(select_window (&[1], 5, &mut s, "app", &[1]), None);
    }

    #[test]
    fn repeated_invocations_visit_every_window_once() {
        let matched = [11, 22, 33, 44, 55];
        let mut s = store();
        let mut fgnd = 999;
        let mut seen = HashSet::new();
        for _ in 0 .. matched.len() {
            let next = select_window (&matched, fgnd, &mut s, "app", &[]) .unwrap();
            assert!(seen.insert(next), "{} visited twice", next);
            s.set_last_focused ("app", next);
            fgnd = next;
        }
        assert_eq!(seen.len(), matched.len());
        assert_eq!(select_window (&matched, fgnd, &mut s, "app", &[]), Some(11));
    }
}

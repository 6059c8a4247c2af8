//! The desktop as seen by the focus engine .. a window snapshot plus the handful of OS calls the
//! focus techniques and tab cycling need. The Win32 impl lives at the bottom, tests use a scripted fake.

use serde::Serialize;

use crate::keys::{KeyCombo, VKey};



pub type Hwnd = isize;



# [ derive (Debug, Default, Eq, PartialEq, Hash, Clone, Serialize) ]
pub struct WindowRecord {
    pub hwnd       : Hwnd,
    pub class_name : String,
    pub title      : String,
    pub pid        : u32,
    pub visible    : bool,
}

impl WindowRecord {
    pub fn new (hwnd:Hwnd, class_name:&str, title:&str, pid:u32) -> WindowRecord {
        WindowRecord { hwnd, class_name: class_name.to_string(), title: title.to_string(), pid, visible: true }
    }
}


# [ derive (Debug, Eq, PartialEq, Copy, Clone) ]
/// A live attachment of one thread's input processing to another's (must be handed back to detach)
pub struct InputLink {
    pub from_thread : u32,
    pub to_thread   : u32,
}



pub trait Desktop {

    /// One-pass snapshot of all top-level windows, windows that vanish mid-query are skipped
    fn enum_windows (&self) -> Vec<WindowRecord>;

    /// Executable file name (e.g. `bcompare.exe`) of a process, if it can still be queried
    fn process_name (&self, pid:u32) -> Option<String>;

    fn fgnd_window (&self) -> Hwnd;
    fn window_exists (&self, hwnd:Hwnd) -> bool;
    fn window_text (&self, hwnd:Hwnd) -> String;
    fn window_pid (&self, hwnd:Hwnd) -> u32;

    fn restore_if_minimized (&self, hwnd:Hwnd);
    fn raise (&self, hwnd:Hwnd);
    fn request_fgnd (&self, hwnd:Hwnd) -> bool;
    fn activate (&self, hwnd:Hwnd);

    fn key_down (&self, vk:VKey);
    fn key_up   (&self, vk:VKey);

    /// Attaches the target window's input thread to the current foreground thread's input queue
    fn attach_input (&self, hwnd:Hwnd) -> Option<InputLink>;
    fn detach_input (&self, link:InputLink);

    fn allow_set_fgnd (&self, pid:u32) -> bool;

    fn send_keys (&self, combo:&KeyCombo) {
        combo.keys() .iter() .for_each (|&k| self.key_down(k));
        combo.keys() .iter() .rev() .for_each (|&k| self.key_up(k));
    }

    /// Best-effort bump of our own process priority so simulated input is not starved
    fn set_self_priority_high (&self) -> bool { false }
}



/// The desktop of the running OS session, if we know how to drive it
#[cfg(windows)]
pub fn platform_desktop () -> Option <Box <dyn Desktop>> {
    Some ( Box::new (win32::Win32Desktop) )
}
#[cfg(not(windows))]
pub fn platform_desktop () -> Option <Box <dyn Desktop>> {
    None
}




#[cfg(windows)]
pub mod win32 {

    use tracing::debug;

    use super::{Desktop, Hwnd, InputLink, WindowRecord};
    use crate::keys::VKey;
    use crate::win_apis;


    # [ derive (Debug, Default, Copy, Clone) ]
    pub struct Win32Desktop;

    impl Desktop for Win32Desktop {

        fn enum_windows (&self) -> Vec<WindowRecord> {
            win_apis::get_top_level_windows() .into_iter() .filter_map ( |hwnd| {
                let pid = win_apis::get_window_pid (hwnd);
                if pid == 0 {
                    // the window went away between enumeration and query
                    debug! ("skipping window {:?} .. no owning process", hwnd);
                    return None
                }
                Some ( WindowRecord {
                    hwnd,
                    class_name : win_apis::get_window_class (hwnd),
                    title      : win_apis::get_window_text (hwnd),
                    pid,
                    visible    : win_apis::check_window_visible (hwnd) && !win_apis::check_window_cloaked (hwnd),
                } )
            } ) .collect()
        }

        fn process_name (&self, pid:u32) -> Option<String> {
            win_apis::get_pid_exe_path (pid) .and_then (|p| p.rsplit('\\').next().map(|s| s.to_string())) .filter (|s| !s.is_empty())
        }

        fn fgnd_window   (&self) -> Hwnd              { win_apis::get_fgnd_window() }
        fn window_exists (&self, hwnd:Hwnd) -> bool   { win_apis::check_window_exists (hwnd) }
        fn window_text   (&self, hwnd:Hwnd) -> String { win_apis::get_window_text (hwnd) }
        fn window_pid    (&self, hwnd:Hwnd) -> u32    { win_apis::get_window_pid (hwnd) }

        fn restore_if_minimized (&self, hwnd:Hwnd) {
            if win_apis::check_window_minimized (hwnd) { win_apis::window_restore (hwnd) }
        }
        fn raise        (&self, hwnd:Hwnd)         { win_apis::window_bring_to_top (hwnd) }
        fn request_fgnd (&self, hwnd:Hwnd) -> bool { win_apis::window_set_fgnd (hwnd) }
        fn activate     (&self, hwnd:Hwnd)         { win_apis::window_set_active (hwnd) }

        fn key_down (&self, vk:VKey) { win_apis::send_key_event (vk, false) }
        fn key_up   (&self, vk:VKey) { win_apis::send_key_event (vk, true) }

        fn attach_input (&self, hwnd:Hwnd) -> Option<InputLink> {
            let from_thread = win_apis::get_window_thread (hwnd);
            let to_thread   = win_apis::get_window_thread (win_apis::get_fgnd_window());
            if from_thread == 0 || to_thread == 0 || from_thread == to_thread { return None }
            win_apis::attach_thread_input (from_thread, to_thread, true) .then_some ( InputLink { from_thread, to_thread } )
        }
        fn detach_input (&self, link:InputLink) {
            let _ = win_apis::attach_thread_input (link.from_thread, link.to_thread, false);
        }

        fn allow_set_fgnd (&self, pid:u32) -> bool { win_apis::allow_set_fgnd_window (pid) }

        fn set_self_priority_high (&self) -> bool { win_apis::win_set_cur_process_priority_high() }
    }
}

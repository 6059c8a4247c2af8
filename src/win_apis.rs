#![ allow (non_upper_case_globals, non_snake_case) ]

use std::ffi::c_void;
use std::mem::size_of;

use windows::core::PWSTR;
use windows::Win32::Foundation::{BOOL, CloseHandle, HWND, LPARAM};
use windows::Win32::Graphics::Dwm::{DwmGetWindowAttribute, DWMWA_CLOAKED};
use windows::Win32::System::Threading::{
    AttachThreadInput, GetCurrentProcess, HIGH_PRIORITY_CLASS, OpenProcess, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION, QueryFullProcessImageNameW, SetPriorityClass
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP, SendInput, VIRTUAL_KEY
};
use windows::Win32::UI::WindowsAndMessaging::{
    AllowSetForegroundWindow, BringWindowToTop, EnumWindows, GetClassNameW, GetForegroundWindow, GetWindowTextW,
    GetWindowThreadProcessId, IsIconic, IsWindow, IsWindowVisible, SetActiveWindow, SetForegroundWindow, ShowWindow,
    SW_RESTORE
};

use crate::desktop::Hwnd;
use crate::keys::VKey;



// extra-info stamp on the key events we inject, so anything watching the input stream can tell they're ours
const APPFOCUS_INJECTED_IDENTIFIER_EXTRA_INFO: usize = 0xAF0C05ED;


fn hw (hwnd:Hwnd) -> HWND { HWND (hwnd as *mut c_void) }



pub fn check_window_visible (hwnd:Hwnd) -> bool { unsafe {
    IsWindowVisible (hw(hwnd)) .as_bool()
} }

pub fn check_window_cloaked (hwnd:Hwnd) -> bool { unsafe {
    // uwp windows of suspended apps, and windows on other virtual desktops, are 'visible' but cloaked
    let mut cloaked_state: u32 = 0;
    let out_ptr = &mut cloaked_state as *mut u32 as *mut c_void;
    let _ = DwmGetWindowAttribute (hw(hwnd), DWMWA_CLOAKED, out_ptr, size_of::<u32>() as u32);
    cloaked_state != 0
} }

pub fn check_window_exists (hwnd:Hwnd) -> bool { unsafe {
    hwnd != 0 && IsWindow (hw(hwnd)) .as_bool()
} }

pub fn check_window_minimized (hwnd:Hwnd) -> bool { unsafe {
    IsIconic (hw(hwnd)) .as_bool()
} }

pub fn get_fgnd_window () -> Hwnd { unsafe {
    GetForegroundWindow().0 as Hwnd
} }



pub fn get_window_text (hwnd:Hwnd) -> String { unsafe {
    const MAX_LEN : usize = 512;
    let mut lpstr = [0u16; MAX_LEN];
    let copied_len = GetWindowTextW (hw(hwnd), &mut lpstr);
    String::from_utf16_lossy (&lpstr[..(copied_len.max(0) as usize)])
} }

pub fn get_window_class (hwnd:Hwnd) -> String { unsafe {
    // class names are capped at 256 chars by the OS
    const MAX_LEN : usize = 257;
    let mut lpstr = [0u16; MAX_LEN];
    let copied_len = GetClassNameW (hw(hwnd), &mut lpstr);
    String::from_utf16_lossy (&lpstr[..(copied_len.max(0) as usize)])
} }

pub fn get_window_pid (hwnd:Hwnd) -> u32 { unsafe {
    let mut pid : u32 = 0;
    let _ = GetWindowThreadProcessId (hw(hwnd), Some(&mut pid as *mut u32));
    pid
} }

pub fn get_window_thread (hwnd:Hwnd) -> u32 { unsafe {
    GetWindowThreadProcessId (hw(hwnd), None)
} }



/// Synchronously collects all top-level windows (in z-order)
pub fn get_top_level_windows () -> Vec<Hwnd> { unsafe {
    let mut hwnds : Vec<Hwnd> = Vec::new();
    let _ = EnumWindows ( Some(enum_windows_cb), LPARAM (&mut hwnds as *mut Vec<Hwnd> as isize) );
    // ^^ this only errs if a callback returns false, which ours never does, so whatever we got is the full set
    hwnds
} }

#[ allow (clippy::missing_safety_doc) ]
pub unsafe extern "system" fn enum_windows_cb (hwnd:HWND, acc:LPARAM) -> BOOL {
    // the lparam is the accumulator vec from get_top_level_windows, alive for the whole (blocking) EnumWindows call
    let hwnds = &mut *(acc.0 as *mut Vec<Hwnd>);
    hwnds.push (hwnd.0 as Hwnd);
    BOOL (true as i32)
}



pub fn window_restore (hwnd:Hwnd) { unsafe {
    let _ = ShowWindow (hw(hwnd), SW_RESTORE);
} }

pub fn window_bring_to_top (hwnd:Hwnd) { unsafe {
    let _ = BringWindowToTop (hw(hwnd));
} }

pub fn window_set_fgnd (hwnd:Hwnd) -> bool { unsafe {
    SetForegroundWindow (hw(hwnd)) .as_bool()
} }

pub fn window_set_active (hwnd:Hwnd) { unsafe {
    // only takes effect when our thread is attached to the target's input queue
    let _ = SetActiveWindow (hw(hwnd));
} }

pub fn attach_thread_input (from_thread:u32, to_thread:u32, attach:bool) -> bool { unsafe {
    AttachThreadInput (from_thread, to_thread, BOOL::from(attach)) .as_bool()
} }

pub fn allow_set_fgnd_window (pid:u32) -> bool { unsafe {
    AllowSetForegroundWindow (pid) .is_ok()
} }



pub fn send_key_event (virt_key:VKey, is_key_up:bool) {
    let no_flag = KEYBD_EVENT_FLAGS::default();
    let keyup_flag = if is_key_up { KEYEVENTF_KEYUP } else { no_flag };

    let inputs = [ INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY (virt_key),
                wScan: 0,
                dwFlags: keyup_flag,
                time: 0,
                dwExtraInfo: APPFOCUS_INJECTED_IDENTIFIER_EXTRA_INFO,
        } }
    } ];
    unsafe { SendInput (&inputs, size_of::<INPUT>() as i32) };
}



pub fn get_pid_exe_path (pid:u32) -> Option<String> { unsafe {
    const MAX_LEN : usize = 1024;
    let handle = OpenProcess (PROCESS_QUERY_LIMITED_INFORMATION, BOOL::from(false), pid) .ok()?;
    let mut buf = [0u16; MAX_LEN];
    let mut len = MAX_LEN as u32;
    let res = QueryFullProcessImageNameW (handle, PROCESS_NAME_WIN32, PWSTR::from_raw(buf.as_mut_ptr()), &mut len);
    let _ = CloseHandle (handle);
    res.ok()?;
    Some ( String::from_utf16_lossy (&buf[..(len as usize).min(MAX_LEN)]) )
} }



pub fn win_set_cur_process_priority_high() -> bool { unsafe {
    SetPriorityClass (GetCurrentProcess(), HIGH_PRIORITY_CLASS) .is_ok()
} }

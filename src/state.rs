use std::collections::HashMap;

use crate::desktop::Hwnd;



/// Durable per-application memory of the last window we successfully focused
pub trait SelectionStore {
    fn last_focused (&self, app:&str) -> Option<Hwnd>;
    fn set_last_focused (&mut self, app:&str, hwnd:Hwnd);
    fn clear_last_focused (&mut self, app:&str);
}


/// In-memory store, for callers that dont want anything persisted
impl SelectionStore for HashMap <String, Hwnd> {
    fn last_focused (&self, app:&str) -> Option<Hwnd> { self.get(app).copied() }
    fn set_last_focused (&mut self, app:&str, hwnd:Hwnd) { self.insert (app.to_string(), hwnd); }
    fn clear_last_focused (&mut self, app:&str) { self.remove(app); }
}

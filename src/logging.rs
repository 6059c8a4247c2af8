use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::metadata::LevelFilter;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::prelude::*;

use crate::config::Config;



/// Log file sink that never holds more than `max_lines` lines, dropping the oldest first.<br>
/// The whole (small) file is rewritten on every write, so the cap holds even if we're killed mid-run.
pub struct CappedLogFile {
    path      : PathBuf,
    max_lines : usize,
    lines     : VecDeque <String>,
    pending   : String,
}

impl CappedLogFile {

    pub fn open (path:&Path, max_lines:usize) -> io::Result<CappedLogFile> {
        let max_lines = max_lines.max(1);
        let existing = match fs::read_to_string (path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };
        let mut lines : VecDeque<String> = existing.lines() .map (|l| l.to_string()) .collect();
        while lines.len() > max_lines { lines.pop_front(); }
        let log = CappedLogFile { path: path.to_path_buf(), max_lines, lines, pending: String::new() };
        log.persist()?;
        Ok(log)
    }

    fn persist (&self) -> io::Result<()> {
        let mut out = String::with_capacity (self.lines.iter().map(|l| l.len() + 1).sum());
        self.lines .iter() .for_each (|l| { out.push_str(l); out.push('\n'); });
        fs::write (&self.path, out)
    }
}

impl Write for CappedLogFile {

    fn write (&mut self, buf:&[u8]) -> io::Result<usize> {
        self.pending.push_str (&String::from_utf8_lossy(buf));
        if let Some(last_nl) = self.pending.rfind('\n') {
            let complete = self.pending.drain (..= last_nl) .collect::<String>();
            self.lines.extend (complete.lines() .map (|l| l.to_string()));
            while self.lines.len() > self.max_lines { self.lines.pop_front(); }
            self.persist()?;
        }
        Ok (buf.len())
    }

    fn flush (&mut self) -> io::Result<()> { Ok(()) }
}

impl Drop for CappedLogFile {
    fn drop (&mut self) {
        if !self.pending.is_empty() {
            let rest = std::mem::take (&mut self.pending);
            self.lines.push_back (rest);
            while self.lines.len() > self.max_lines { self.lines.pop_front(); }
            let _ = self.persist();
        }
    }
}



/// Sets up the global tracing subscriber .. the capped log file (if logging is enabled), plus stderr when verbose.<br>
/// The returned guard must be held until exit so pending log lines get flushed.
pub fn setup_log_subscriber (conf:&Config, verbose:bool) -> Option<WorkerGuard> {

    let timer = LocalTime::new ( ::time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ) );

    let level = conf.get_log_level();
    let log_file = ( level != LevelFilter::OFF ) .then (|| conf.get_log_loc()) .flatten()
        .and_then (|loc| match CappedLogFile::open (&loc, conf.get_max_log_lines()) {
            Ok(f) => Some(f),
            Err(e) => { eprintln! ("appfocus: cant open log file {:?}: {}", loc, e); None }
        });

    let (file_layer, guard) = match log_file {
        Some(f) => {
            let (nb_writer, guard) = non_blocking (f);
            let layer = tracing_subscriber::fmt::Layer::new()
                .with_writer (nb_writer)
                .with_timer (timer.clone())
                .with_ansi (false)
                .with_filter (level);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = verbose .then ( || tracing_subscriber::fmt::Layer::new()
        .with_writer (io::stderr)
        .with_timer (timer)
        .with_filter (LevelFilter::DEBUG)
    );

    let _ = tracing_subscriber::registry() .with (file_layer) .with (stderr_layer) .try_init();
    guard
}

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::LaunchError;



# [ derive (Debug, Clone, PartialEq, Eq) ]
/// A fully resolved process start .. program, args and (optional) working dir
pub struct LaunchCommand {
    pub program : PathBuf,
    pub args    : Vec <String>,
    pub cwd     : Option <PathBuf>,
}

impl fmt::Display for LaunchCommand {
    fn fmt (&self, f:&mut fmt::Formatter<'_>) -> fmt::Result {
        write! (f, "{}", self.program.display())?;
        self.args .iter() .try_for_each (|a| write! (f, " {:?}", a))
    }
}


# [ derive (Debug, Clone, Default, PartialEq, Eq) ]
pub struct BrowserSpec {
    pub process_name : String,
    pub exe_paths    : Vec <String>,
    pub new_tab_args : Vec <String>,
}



/// Something that can start processes .. the real one spawns, tests record
pub trait Launcher {
    fn launch (&self, cmd:&LaunchCommand) -> Result <(), LaunchError>;
}


# [ derive (Debug, Default, Copy, Clone) ]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch (&self, cmd:&LaunchCommand) -> Result <(), LaunchError> {
        let mut command = Command::new (&cmd.program);
        command.args (&cmd.args);
        if let Some(cwd) = cmd.cwd.as_ref() { command.current_dir(cwd); }
        // we dont wait on the child, it outlives us
        let child = command.spawn() .map_err (|source| LaunchError::Spawn { cmd: cmd.to_string(), source })?;
        info! ("launched {} (pid {})", cmd, child.id());
        Ok(())
    }
}



fn is_direct_executable (path:&Path) -> bool {
    path.extension() .and_then (|e| e.to_str()) .is_some_and (|e| ["exe", "com"].contains (&e.to_lowercase().as_str()))
}

/// How to start an app target .. executables directly from their own directory, anything else
/// (shortcuts, url files, scripts, documents) through the shell's `start`
pub fn app_command (target:&Path) -> Result <LaunchCommand, LaunchError> {
    if !target.exists() {
        return Err ( LaunchError::NotFound (target.display().to_string()) )
    }
    if is_direct_executable (target) {
        let cwd = target.parent() .filter (|p| p.is_dir()) .map (|p| p.to_path_buf());
        return Ok ( LaunchCommand { program: target.to_path_buf(), args: vec![], cwd } )
    }
    Ok ( LaunchCommand {
        program : PathBuf::from ("cmd"),
        args    : vec! [ "/c".into(), "start".into(), "".into(), target.display().to_string() ],
        cwd     : None,
    } )
}


/// Replaces `%VAR%` references with their environment values, unknown vars are left as is
pub fn expand_env_vars (s:&str) -> String {
    let mut out = String::with_capacity (s.len());
    let mut rest = s;
    while let Some(start) = rest.find('%') {
        out.push_str (&rest[..start]);
        let after = &rest[start+1 ..];
        match after.find('%') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(val) => out.push_str (&val),
                    Err(_)  => { out.push('%'); out.push_str(name); out.push('%'); }
                }
                rest = &after[end+1 ..];
            }
            _ => { out.push('%'); rest = after; }
        }
    }
    out.push_str (rest);
    out
}

/// First of the configured browser paths that exists, else the bare exe name for a PATH lookup
pub fn resolve_browser_exe (spec:&BrowserSpec) -> PathBuf {
    spec.exe_paths .iter()
        .map (|p| PathBuf::from (expand_env_vars(p)))
        .find (|p| { let found = p.is_file(); debug! ("browser candidate {:?} .. exists: {:?}", p, found); found })
        .unwrap_or_else (|| PathBuf::from (&spec.process_name))
}

pub fn browser_command (spec:&BrowserSpec, url:Option<&str>, new_tab:bool) -> LaunchCommand {
    let mut args = Vec::new();
    if let Some(url) = url {
        if new_tab { args.extend (spec.new_tab_args.iter().cloned()) }
        args.push (url.to_string());
    }
    LaunchCommand { program: resolve_browser_exe(spec), args, cwd: None }
}

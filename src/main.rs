use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, info_span, warn};

use appfocus::config::Config;
use appfocus::desktop::platform_desktop;
use appfocus::focuser::{FocusCtx, Target};
use appfocus::launch::ProcessLauncher;
use appfocus::logging::setup_log_subscriber;



# [ derive (Parser, Debug) ]
#[command (name = "appfocus", version, about = "Focus, cycle or launch an application's windows, or find a browser tab by domain")]
struct Cli {

    /// Executable or shortcut path (app mode), or website domain (tab mode) .. omit to just bring up the browser
    target : Option <String>,

    /// Treat TARGET as an application path
    #[arg (long, conflicts_with = "tab")]
    app : bool,

    /// Treat TARGET as a website domain
    #[arg (long)]
    tab : bool,

    /// Print all top-level windows (marking TARGET's windows) instead of focusing anything
    #[arg (long)]
    dump : bool,

    /// Print the dump as json
    #[arg (long, requires = "dump")]
    json : bool,

    /// Config file to use instead of the default location
    #[arg (long, value_name = "PATH")]
    config : Option <PathBuf>,

    /// Also log to stderr, at debug level
    #[arg (short, long)]
    verbose : bool,
}

impl Cli {
    fn target (&self) -> Option<Target> {
        self.target .as_deref() .map (str::trim) .filter (|t| !t.is_empty()) .map ( |t|
            if self.app { Target::App (t.to_string()) }
            else if self.tab { Target::Tab (t.to_string()) }
            else { Target::detect(t) }
        )
    }
}


fn load_config (override_path:Option<&std::path::Path>) -> Config {
    let loaded = Config::locate (override_path) .and_then (|p| Config::load(&p));
    match loaded {
        Ok(conf) => conf,
        Err(e) => {
            // we can still run on defaults, just without persisted state
            eprintln! ("appfocus: {} .. continuing with default config", e);
            match Config::from_toml_str ("") {
                Ok(conf) => conf,
                Err(e) => { eprintln! ("appfocus: bad built-in config: {}", e); std::process::exit(1) }
            }
        }
    }
}


fn main() -> ExitCode {

    let cli = Cli::parse();
    let target = cli.target();

    let conf = load_config (cli.config.as_deref());

    // we want the non-blocking log-appender guard to be here in main, so pending logs get flushed on exit
    let _guard = setup_log_subscriber (&conf, cli.verbose);

    let target_name = target.as_ref() .map (|t| t.name()) .unwrap_or_else (|| "browser".to_string());
    let _span = info_span! ("appfocus", name = %target_name) .entered();
    info! ("starting appfocus {} .. target: {:?}", env!("CARGO_PKG_VERSION"), target);
    match conf.path() {
        Some(path) => info! ("config loaded from {:?}", path),
        None => warn! ("running on built-in default config"),
    }

    let Some(desktop) = platform_desktop() else {
        error! ("no desktop support on this platform");
        eprintln! ("appfocus: unsupported platform");
        return ExitCode::FAILURE
    };
    let launcher = ProcessLauncher;
    let mut ctx = FocusCtx::new (desktop.as_ref(), &launcher, conf);

    if cli.dump {
        let inventory = ctx.window_inventory (target.as_ref());
        if cli.json {
            match serde_json::to_string_pretty (&inventory) {
                Ok(s) => println! ("{}", s),
                Err(e) => { error! ("failed to serialize window dump: {}", e); return ExitCode::FAILURE }
            }
        } else {
            inventory .iter() .for_each (|e| println! ("{}", e));
        }
        return ExitCode::SUCCESS
    }

    let outcome = ctx.run (target.as_ref());
    if outcome.is_success() {
        info! ("done: {:?}", outcome);
        ExitCode::SUCCESS
    } else {
        warn! ("failed: {:?}", outcome);
        ExitCode::FAILURE
    }
}

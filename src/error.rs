use std::path::PathBuf;

use thiserror::Error;



# [ derive (Error, Debug) ]
pub enum ConfigError {

    #[error("no writeable location found for the config file")]
    NoLocation,

    #[error("config io error at {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("config parse error: {0}")]
    Parse (#[from] toml_edit::TomlError),
}



# [ derive (Error, Debug) ]
pub enum LaunchError {

    #[error("nothing to launch for {0:?}")]
    NotFound (String),

    #[error("failed to start {cmd:?}: {source}")]
    Spawn { cmd: String, source: std::io::Error },
}



# [ derive (Error, Debug, PartialEq, Eq) ]
pub enum KeyComboError {

    #[error("empty key combination")]
    Empty,

    #[error("unknown key {0:?} in key combination")]
    UnknownKey (String),
}

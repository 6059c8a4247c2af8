pub mod config;
pub mod desktop;
pub mod error;
pub mod focus;
pub mod focuser;
pub mod keys;
pub mod launch;
pub mod logging;
pub mod matcher;
pub mod rules;
pub mod selector;
pub mod state;
pub mod tabs;

#[cfg(windows)]
pub mod win_apis;

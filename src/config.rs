use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Circlekeeper";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Circlekeeper")
}

/// Path of the program database
pub fn database_path() -> PathBuf {
    app_data_dir().join("circlekeeper.db")
}

/// Default log filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

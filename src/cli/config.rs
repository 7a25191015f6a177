//! Config command handler
//!
//! View and modify configuration settings.

use crate::config::Config;
use crate::error::Result;
use clap::Args;

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key (e.g., "picker.search_limit")
    pub key: Option<String>,

    /// Value to set (if not provided, shows current value)
    pub value: Option<String>,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Reset config to defaults
    #[arg(long)]
    pub reset: bool,
}

/// Run the config command
pub fn run(args: ConfigArgs) -> Result<()> {
    // Show path
    if args.path {
        let path = Config::config_path()?;
        println!("{}", path.display());
        return Ok(());
    }

    // Reset config
    if args.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    let mut config = Config::load()?;

    match (&args.key, &args.value) {
        // No arguments: show all config
        (None, None) => {
            show_all_config(&config);
        }

        // Key only: show that value
        (Some(key), None) => {
            if let Some(value) = config.get(key) {
                println!("{}", value);
            } else {
                eprintln!("Unknown config key: {}", key);
                eprintln!("\nAvailable keys:");
                for k in Config::available_keys() {
                    eprintln!("  {}", k);
                }
                std::process::exit(1);
            }
        }

        // Key and value: set the value
        (Some(key), Some(value)) => {
            config.set(key, value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }

        // Value without key: not valid
        (None, Some(_)) => {
            eprintln!("Error: Must specify a key to set a value");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Display all configuration values
fn show_all_config(config: &Config) {
    println!("[geocoder]");
    println!("base_url = \"{}\"", config.geocoder.base_url);
    println!("user_agent = \"{}\"", config.geocoder.user_agent);
    println!("timeout_secs = {}", config.geocoder.timeout_secs);
    println!();

    println!("[picker]");
    println!("reverse_debounce_ms = {}", config.picker.reverse_debounce_ms);
    println!("search_debounce_ms = {}", config.picker.search_debounce_ms);
    println!("search_limit = {}", config.picker.search_limit);
    println!("pin_throttle_ms = {}", config.picker.pin_throttle_ms);
    println!("notice_ms = {}", config.picker.notice_ms);
    println!("recenter_threshold_m = {}", config.picker.recenter_threshold_m);
    println!("pan_threshold_m = {}", config.picker.pan_threshold_m);
    println!();

    println!("[picker.default_location]");
    println!("lat = {}", config.picker.default_location.lat);
    println!("lng = {}", config.picker.default_location.lng);
    println!("label = \"{}\"", config.picker.default_location.label);
    println!();

    println!("[map]");
    println!("tile_url = \"{}\"", config.map.tile_url);
    println!("zoom = {}", config.map.zoom);
    println!("min_zoom = {}", config.map.min_zoom);
    println!("max_zoom = {}", config.map.max_zoom);
    println!();

    println!("[server]");
    println!("host = \"{}\"", config.server.host);
    println!("port = {}", config.server.port);
}

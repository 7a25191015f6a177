//! Pick command handler
//!
//! Mounts a picker over a headless map and drives it from stdin, one
//! command per line. Callbacks and state changes are printed as they
//! happen.

use super::init_logging;
use crate::config::Config;
use crate::coord::Coordinates;
use crate::error::Result;
use crate::geo::get_geocoder;
use crate::geo::ip_location::IpLocator;
use crate::map::HeadlessMap;
use crate::picker::pin::PinMode;
use crate::picker::{AddressPicker, Key, PickerHandle, PickerProps, PickerSettings, PickerState};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

/// Pick command arguments
#[derive(Args)]
pub struct PickArgs {
    /// Initial latitude (skips geolocation together with --lng)
    #[arg(long, allow_hyphen_values = true, requires = "lng")]
    pub lat: Option<f64>,

    /// Initial longitude
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lng: Option<f64>,

    /// Initial address text
    #[arg(long)]
    pub address: Option<String>,
}

/// One line of session input
#[derive(Debug, Clone, PartialEq)]
enum Input {
    Type(String),
    Key(Key),
    Select(usize),
    Pin,
    Click(f64, f64),
    Lat(String),
    Lng(String),
    Dismiss,
    Show,
    Help,
    Quit,
}

fn parse_line(line: &str) -> std::result::Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word {
        "type" => Input::Type(rest.to_string()),
        "clear" => Input::Type(String::new()),
        "down" => Input::Key(Key::ArrowDown),
        "up" => Input::Key(Key::ArrowUp),
        "enter" => Input::Key(Key::Enter),
        "esc" => Input::Key(Key::Escape),
        "select" => {
            let n: usize = rest
                .parse()
                .map_err(|_| format!("select expects a number, got '{}'", rest))?;
            if n == 0 {
                return Err("suggestions are numbered from 1".to_string());
            }
            Input::Select(n - 1)
        }
        "pin" => Input::Pin,
        "click" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            match parts.as_slice() {
                [lat, lng] => {
                    let lat = lat.parse().map_err(|_| format!("invalid latitude: {}", lat))?;
                    let lng = lng.parse().map_err(|_| format!("invalid longitude: {}", lng))?;
                    Input::Click(lat, lng)
                }
                _ => return Err("click expects <lat> <lng>".to_string()),
            }
        }
        "lat" => Input::Lat(rest.to_string()),
        "lng" => Input::Lng(rest.to_string()),
        "dismiss" => Input::Dismiss,
        "show" => Input::Show,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(format!("unknown command: {} (try 'help')", other)),
    };

    Ok(Some(input))
}

fn apply(picker: &PickerHandle, input: Input) -> Result<()> {
    match input {
        Input::Type(text) => picker.set_address(text),
        Input::Key(key) => picker.press(key),
        Input::Select(index) => picker.select_suggestion(index),
        Input::Pin => picker.toggle_pin_mode(),
        Input::Click(lat, lng) => picker.click_map(lat, lng),
        Input::Lat(text) => picker.set_latitude(text),
        Input::Lng(text) => picker.set_longitude(text),
        Input::Dismiss => picker.dismiss_alert(),
        Input::Show => {
            print_state(&picker.state());
            Ok(())
        }
        Input::Help => {
            print_help();
            Ok(())
        }
        Input::Quit => Ok(()),
    }
}

/// Run the pick command
pub async fn run(args: PickArgs) -> Result<()> {
    init_logging("warn");

    let config = Config::load()?;
    let geocoder = get_geocoder(&config.geocoder)?;

    let props = PickerProps {
        initial_coordinates: args.lat.zip(args.lng).map(|(lat, lng)| Coordinates::new(lat, lng)),
        initial_address: args.address,
        ..PickerProps::default()
    };

    let picker = AddressPicker::new(geocoder, IpLocator::new(), HeadlessMap::new())
        .with_props(props)
        .with_settings(PickerSettings::from_config(&config))
        .on_coordinates_change(|lat, lng| println!("> coordinates: {:.4}, {:.4}", lat, lng))
        .on_address_change(|address| println!("> address: {}", address))
        .mount();

    let watcher = tokio::spawn(report_changes(picker.subscribe()));

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Some(Input::Quit)) => break,
            Ok(Some(input)) => apply(&picker, input)?,
            Ok(None) => {}
            Err(message) => eprintln!("{}", message),
        }
    }

    watcher.abort();
    let state = picker.unmount().await;
    print_state(&state);

    Ok(())
}

/// Print the parts of the state a user reacts to, as they change
async fn report_changes(mut rx: watch::Receiver<PickerState>) {
    let mut last = rx.borrow_and_update().clone();

    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();

        if last.loading && !state.loading {
            println!("* located");
        }
        if state.notice != last.notice {
            if let Some(notice) = &state.notice {
                println!("* notice: {}", notice.message);
            }
        }
        if state.alert != last.alert {
            if let Some(alert) = &state.alert {
                println!("* alert: {} (type 'dismiss')", alert);
            }
        }
        if state.pin_mode != last.pin_mode {
            println!("* pin mode: {}", pin_label(state.pin_mode));
        }
        if state.suggestions_visible
            && (state.suggestions != last.suggestions || state.highlighted != last.highlighted)
        {
            print_suggestions(&state);
        } else if last.suggestions_visible && !state.suggestions_visible {
            println!("* suggestions hidden");
        }

        last = state;
    }
}

fn pin_label(mode: PinMode) -> &'static str {
    match mode {
        PinMode::On => "on",
        PinMode::Off => "off",
    }
}

fn print_suggestions(state: &PickerState) {
    for (i, result) in state.suggestions.iter().enumerate() {
        let marker = if state.highlighted == Some(i) { ">" } else { " " };
        println!("{} {}. {}", marker, i + 1, result.display_name);
    }
}

fn print_state(state: &PickerState) {
    match state.coordinates {
        Some(coords) => println!("coordinates: {}", coords),
        None => println!("coordinates: (none)"),
    }
    println!("address: {}", state.address);
    println!("pin mode: {}", pin_label(state.pin_mode));
    if state.loading {
        println!("status: locating");
    }
    if state.searching {
        println!("status: searching");
    }
    if state.geocoding {
        println!("status: resolving address");
    }
    if state.suggestions_visible {
        print_suggestions(state);
    }
}

fn print_help() {
    println!("Commands:");
    println!("  type <text>        edit the address field");
    println!("  clear              empty the address field");
    println!("  down | up          move through suggestions");
    println!("  enter | esc        confirm or dismiss suggestions");
    println!("  select <n>         choose suggestion n");
    println!("  pin                toggle pin mode");
    println!("  click <lat> <lng>  click the map");
    println!("  lat <v> | lng <v>  edit a coordinate field");
    println!("  dismiss            dismiss an alert");
    println!("  show               print the current state");
    println!("  quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_keeps_spaces() {
        assert_eq!(
            parse_line("type 100 Sukhumvit Rd").unwrap(),
            Some(Input::Type("100 Sukhumvit Rd".to_string()))
        );
        assert_eq!(parse_line("type").unwrap(), Some(Input::Type(String::new())));
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!(parse_line("down").unwrap(), Some(Input::Key(Key::ArrowDown)));
        assert_eq!(parse_line("  esc ").unwrap(), Some(Input::Key(Key::Escape)));
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn test_parse_select_is_one_based() {
        assert_eq!(parse_line("select 2").unwrap(), Some(Input::Select(1)));
        assert!(parse_line("select 0").is_err());
        assert!(parse_line("select two").is_err());
    }

    #[test]
    fn test_parse_click() {
        assert_eq!(
            parse_line("click 13.7563 -100.5").unwrap(),
            Some(Input::Click(13.7563, -100.5))
        );
        assert!(parse_line("click 13.7563").is_err());
    }

    #[test]
    fn test_parse_coordinate_fields_pass_text_through() {
        // Validation happens in the picker
        assert_eq!(parse_line("lat 95").unwrap(), Some(Input::Lat("95".to_string())));
        assert_eq!(parse_line("lng abc").unwrap(), Some(Input::Lng("abc".to_string())));
    }

    #[test]
    fn test_parse_unknown() {
        assert!(parse_line("teleport").is_err());
        assert_eq!(parse_line("quit").unwrap(), Some(Input::Quit));
    }
}

//! Address picker
//!
//! The picker keeps a location (coordinates plus a human-readable address)
//! in sync across five inputs: the device position at mount, search as you
//! type, keyboard selection, numeric coordinate entry and pin drops on the
//! map.
//!
//! Each mounted picker is one tokio task that owns all of its state and its
//! map surface. User actions arrive through a [`PickerHandle`]; timers and
//! network lookups run as spawned tasks that post events back to the
//! picker, so state is only ever touched from that one task. Every change
//! is published as a [`PickerState`] snapshot.
//!
//! ```no_run
//! use geopick::geo::ip_location::IpLocator;
//! use geopick::geo::nominatim::NominatimBackend;
//! use geopick::map::HeadlessMap;
//! use geopick::picker::AddressPicker;
//!
//! # async fn demo() -> geopick::Result<()> {
//! let picker = AddressPicker::new(NominatimBackend::new()?, IpLocator::new(), HeadlessMap::new())
//!     .on_coordinates_change(|lat, lng| println!("{lat}, {lng}"))
//!     .on_address_change(|address| println!("{address}"))
//!     .mount();
//!
//! picker.set_address("100 Bangkok")?;
//! let state = picker.wait_for(|s| s.suggestions_visible).await?;
//! println!("{} suggestions", state.suggestions.len());
//! picker.unmount().await;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod pin;
pub mod renderer;
pub mod reverse;
pub mod search;
pub(crate) mod timer;


use crate::config::{Config, MessagesConfig};
use crate::constants::picker::{FLY_DURATION_MS, MAP_INIT_DELAY_MS, POPUP_MS};
use crate::coord::{parse_component, Axis, Coordinates};
use crate::error::{Error, Result};
use crate::geo::locate::{GeolocationError, PositionOptions, PositionSource};
use crate::geo::{GeoBackend, SearchResult};
use crate::map::{MapSurface, MarkerId, TileLayer, ViewMove};
use bootstrap::Located;
use pin::{PinMode, PinThrottle};
use renderer::MapRenderer;
use reverse::ReverseGeocoder;
use search::{DirectOutcome, SearchController};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use timer::Debouncer;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Inbound props from the embedding form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickerProps {
    pub initial_coordinates: Option<Coordinates>,
    pub initial_address: Option<String>,
    /// Map container size in pixels
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Timing, geometry and text used by a picker
#[derive(Debug, Clone)]
pub struct PickerSettings {
    pub reverse_debounce: Duration,
    pub search_debounce: Duration,
    pub search_limit: usize,
    pub pin_throttle: Duration,
    pub notice_duration: Duration,
    pub popup_duration: Duration,
    pub map_init_delay: Duration,
    pub fly_duration: Duration,
    pub recenter_threshold_m: f64,
    pub pan_threshold_m: f64,
    pub zoom: u8,
    pub tile_layer: TileLayer,
    pub default_location: Coordinates,
    pub default_label: String,
    pub position_options: PositionOptions,
    pub messages: MessagesConfig,
}

impl PickerSettings {
    pub fn from_config(config: &Config) -> Self {
        let picker = &config.picker;
        Self {
            reverse_debounce: Duration::from_millis(picker.reverse_debounce_ms),
            search_debounce: Duration::from_millis(picker.search_debounce_ms),
            search_limit: picker.search_limit,
            pin_throttle: Duration::from_millis(picker.pin_throttle_ms),
            notice_duration: Duration::from_millis(picker.notice_ms),
            popup_duration: Duration::from_millis(POPUP_MS),
            map_init_delay: Duration::from_millis(MAP_INIT_DELAY_MS),
            fly_duration: Duration::from_millis(FLY_DURATION_MS),
            recenter_threshold_m: picker.recenter_threshold_m,
            pan_threshold_m: picker.pan_threshold_m,
            zoom: config.map.zoom,
            tile_layer: TileLayer::from_config(&config.map),
            default_location: Coordinates::new(
                picker.default_location.lat,
                picker.default_location.lng,
            )
            .rounded(),
            default_label: picker.default_location.label.clone(),
            position_options: PositionOptions::default(),
            messages: config.messages.clone(),
        }
    }
}

impl Default for PickerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub type CoordinatesCallback = Arc<dyn Fn(f64, f64) + Send + Sync>;
pub type AddressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Outbound notifications to the embedding form
#[derive(Clone, Default)]
pub struct PickerCallbacks {
    pub on_coordinates_change: Option<CoordinatesCallback>,
    pub on_address_change: Option<AddressCallback>,
}

impl PickerCallbacks {
    fn emit_coordinates(&self, coords: Coordinates) {
        if let Some(f) = &self.on_coordinates_change {
            f(coords.lat, coords.lng);
        }
    }

    fn emit_address(&self, address: &str) {
        if let Some(f) = &self.on_address_change {
            f(address);
        }
    }
}

/// A transient, auto-dismissing notice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub kind: GeolocationError,
    pub message: String,
}

/// Keys the address input reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    ArrowDown,
    ArrowUp,
    Escape,
}

/// Published picker state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickerState {
    pub coordinates: Option<Coordinates>,
    pub address: String,
    pub location_name: Option<String>,
    /// True until the first location is resolved
    pub loading: bool,
    pub notice: Option<Notice>,
    /// Blocking message, cleared only by dismissal
    pub alert: Option<String>,
    pub suggestions: Vec<SearchResult>,
    pub suggestions_visible: bool,
    pub highlighted: Option<usize>,
    pub pin_mode: PinMode,
    pub searching: bool,
    pub geocoding: bool,
    pub map_ready: bool,
    pub mounted: bool,
}

impl Default for PickerState {
    fn default() -> Self {
        Self {
            coordinates: None,
            address: String::new(),
            location_name: None,
            loading: true,
            notice: None,
            alert: None,
            suggestions: Vec::new(),
            suggestions_visible: false,
            highlighted: None,
            pin_mode: PinMode::Off,
            searching: false,
            geocoding: false,
            map_ready: false,
            mounted: true,
        }
    }
}

/// User actions
#[derive(Debug)]
pub(crate) enum Command {
    AddressInput(String),
    CoordinateInput(Axis, String),
    Key(Key),
    SelectSuggestion(usize),
    TogglePinMode,
    MapClick(Coordinates),
    DismissAlert,
    Unmount,
}

/// Completions posted back by timers and lookups
#[derive(Debug)]
pub(crate) enum Event {
    Located(std::result::Result<Located, GeolocationError>),
    MapInitDue(u64),
    PopupExpired { generation: u64, marker: MarkerId },
    NoticeExpired(u64),
    ReverseDue { generation: u64, coords: Coordinates },
    ReverseResolved { key: String, name: Option<String> },
    SearchDue { generation: u64, query: String },
    SearchResolved { seq: u64, results: Vec<SearchResult> },
    GeocodeResolved { seq: u64, outcome: DirectOutcome },
}

/// Builder for a picker instance
pub struct AddressPicker<G, P, S> {
    geocoder: Arc<G>,
    locator: Arc<P>,
    surface: S,
    props: PickerProps,
    settings: PickerSettings,
    callbacks: PickerCallbacks,
}

impl<G, P, S> AddressPicker<G, P, S>
where
    G: GeoBackend + 'static,
    P: PositionSource + 'static,
    S: MapSurface + 'static,
{
    pub fn new(geocoder: G, locator: P, surface: S) -> Self {
        Self::with_shared(Arc::new(geocoder), Arc::new(locator), surface)
    }

    /// Build from backends shared with other pickers
    pub fn with_shared(geocoder: Arc<G>, locator: Arc<P>, surface: S) -> Self {
        Self {
            geocoder,
            locator,
            surface,
            props: PickerProps::default(),
            settings: PickerSettings::default(),
            callbacks: PickerCallbacks::default(),
        }
    }

    pub fn with_props(mut self, props: PickerProps) -> Self {
        self.props = props;
        self
    }

    pub fn with_settings(mut self, settings: PickerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_callbacks(mut self, callbacks: PickerCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn on_coordinates_change(mut self, f: impl Fn(f64, f64) + Send + Sync + 'static) -> Self {
        self.callbacks.on_coordinates_change = Some(Arc::new(f));
        self
    }

    pub fn on_address_change(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.callbacks.on_address_change = Some(Arc::new(f));
        self
    }

    /// Spawn the picker task; must be called inside a tokio runtime
    pub fn mount(self) -> PickerHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PickerState::default());

        let map = MapRenderer::new(self.surface, self.settings.tile_layer.clone(), self.settings.zoom)
            .with_size(self.props.width, self.props.height);

        let picker = Picker {
            geocoder: self.geocoder,
            locator: self.locator,
            pin_throttle: PinThrottle::new(self.settings.pin_throttle),
            settings: self.settings,
            props: self.props,
            callbacks: self.callbacks,
            events: event_tx,
            state_tx,
            state: PickerState::default(),
            map,
            reverse: ReverseGeocoder::default(),
            search: SearchController::default(),
            notice_timer: Debouncer::default(),
            popup_timer: Debouncer::default(),
            map_init_timer: Debouncer::default(),
            next_notice_id: 0,
            locate_task: None,
        };

        let task = tokio::spawn(picker.run(command_rx, event_rx));

        PickerHandle {
            commands: command_tx,
            state: state_rx,
            task,
        }
    }
}

/// Handle to a mounted picker
///
/// Dropping the handle unmounts the picker.
#[derive(Debug)]
pub struct PickerHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<PickerState>,
    task: JoinHandle<()>,
}

impl PickerHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::Unmounted)
    }

    /// Type into the address field
    pub fn set_address(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::AddressInput(text.into()))
    }

    /// Edit the latitude field
    pub fn set_latitude(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::CoordinateInput(Axis::Latitude, text.into()))
    }

    /// Edit the longitude field
    pub fn set_longitude(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::CoordinateInput(Axis::Longitude, text.into()))
    }

    pub fn press(&self, key: Key) -> Result<()> {
        self.send(Command::Key(key))
    }

    pub fn select_suggestion(&self, index: usize) -> Result<()> {
        self.send(Command::SelectSuggestion(index))
    }

    pub fn toggle_pin_mode(&self) -> Result<()> {
        self.send(Command::TogglePinMode)
    }

    /// Click on the map surface at a geographic position
    pub fn click_map(&self, lat: f64, lng: f64) -> Result<()> {
        self.send(Command::MapClick(Coordinates::new(lat, lng)))
    }

    pub fn dismiss_alert(&self) -> Result<()> {
        self.send(Command::DismissAlert)
    }

    /// Latest published state
    pub fn state(&self) -> PickerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PickerState> {
        self.state.clone()
    }

    /// Wait until the published state satisfies `pred`
    pub async fn wait_for(&self, pred: impl FnMut(&PickerState) -> bool) -> Result<PickerState> {
        let mut rx = self.state.clone();
        let state = rx.wait_for(pred).await.map_err(|_| Error::Unmounted)?;
        Ok(state.clone())
    }

    /// Unmount and wait for teardown; returns the final state
    pub async fn unmount(self) -> PickerState {
        let _ = self.commands.send(Command::Unmount);
        if let Err(e) = self.task.await {
            warn!("picker task ended abnormally: {}", e);
        }
        let state = self.state.borrow().clone();
        state
    }
}

pub(crate) struct Picker<G, P, S> {
    geocoder: Arc<G>,
    locator: Arc<P>,
    settings: PickerSettings,
    props: PickerProps,
    callbacks: PickerCallbacks,
    events: mpsc::UnboundedSender<Event>,
    state_tx: watch::Sender<PickerState>,
    state: PickerState,
    map: MapRenderer<S>,
    reverse: ReverseGeocoder,
    search: SearchController,
    pin_throttle: PinThrottle,
    notice_timer: Debouncer,
    popup_timer: Debouncer,
    map_init_timer: Debouncer,
    next_notice_id: u64,
    locate_task: Option<JoinHandle<()>>,
}

impl<G, P, S> Picker<G, P, S>
where
    G: GeoBackend + 'static,
    P: PositionSource + 'static,
    S: MapSurface + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        info!("picker mounted");
        self.map.set_pin_mode(PinMode::Off);
        self.bootstrap();
        self.publish();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Unmount) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
            self.publish();
        }

        self.teardown();
        self.publish();
        info!("picker unmounted");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::AddressInput(text) => self.on_address_input(text),
            Command::CoordinateInput(axis, text) => self.on_coordinate_input(axis, &text),
            Command::Key(key) => self.on_key(key),
            Command::SelectSuggestion(index) => self.on_select_suggestion(index),
            Command::TogglePinMode => self.on_toggle_pin_mode(),
            Command::MapClick(at) => self.on_map_click(at),
            Command::DismissAlert => self.state.alert = None,
            Command::Unmount => {}
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Located(outcome) => self.on_located(outcome),
            Event::MapInitDue(generation) => self.on_map_init_due(generation),
            Event::PopupExpired { generation, marker } => {
                if self.popup_timer.fire(generation) {
                    self.map.close_popup(marker);
                }
            }
            Event::NoticeExpired(generation) => self.on_notice_expired(generation),
            Event::ReverseDue { generation, coords } => self.on_reverse_due(generation, coords),
            Event::ReverseResolved { key, name } => self.on_reverse_resolved(key, name),
            Event::SearchDue { generation, query } => self.on_search_due(generation, query),
            Event::SearchResolved { seq, results } => self.on_search_resolved(seq, results),
            Event::GeocodeResolved { seq, outcome } => self.on_geocode_resolved(seq, outcome),
        }
    }

    fn publish(&self) {
        self.state_tx.send_if_modified(|published| {
            if *published == self.state {
                false
            } else {
                *published = self.state.clone();
                true
            }
        });
    }

    /// Make `coords` the authoritative location
    ///
    /// Rounds, notifies the embedder, updates the map and, unless
    /// `skip_geocode`, schedules a reverse lookup.
    fn adopt(&mut self, coords: Coordinates, view: ViewMove, skip_geocode: bool) {
        let coords = coords.rounded();
        self.state.coordinates = Some(coords);
        self.callbacks.emit_coordinates(coords);
        self.sync_map(view);

        if !skip_geocode {
            self.schedule_reverse(coords);
        }
    }

    /// Apply a resolved place name to the address, popup and embedder
    fn set_resolved_name(&mut self, name: String) {
        self.map.set_popup_text(&name);
        self.state.location_name = Some(name.clone());
        self.state.address = name;
        self.callbacks.emit_address(&self.state.address);
    }

    fn popup_text(&self) -> String {
        match (&self.state.location_name, self.state.coordinates) {
            (Some(name), _) => name.clone(),
            (None, Some(coords)) => coords.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Reflect the current coordinates on the map, creating it on first use
    fn sync_map(&mut self, view: ViewMove) {
        let Some(coords) = self.state.coordinates.filter(|c| c.is_usable()) else {
            return;
        };

        if !self.map.is_initialized() {
            if !self.map_init_timer.is_pending() {
                self.map_init_timer
                    .schedule(self.settings.map_init_delay, &self.events, Event::MapInitDue);
            }
            return;
        }

        self.map.move_view(coords, view);
        self.place_marker(coords);
    }

    fn place_marker(&mut self, coords: Coordinates) {
        let popup = self.popup_text();
        if let Some(marker) = self.map.replace_marker(coords, &popup) {
            self.popup_timer
                .schedule(self.settings.popup_duration, &self.events, |generation| {
                    Event::PopupExpired { generation, marker }
                });
        }
    }

    fn on_map_init_due(&mut self, generation: u64) {
        if !self.map_init_timer.fire(generation) {
            return;
        }
        let Some(coords) = self.state.coordinates else {
            return;
        };
        if self.map.initialize(coords) {
            self.map.set_pin_mode(self.state.pin_mode);
            self.state.map_ready = true;
            self.place_marker(coords);
        }
    }

    fn on_coordinate_input(&mut self, axis: Axis, text: &str) {
        let Some(value) = parse_component(axis, text) else {
            debug!(?axis, text, "invalid coordinate entry ignored");
            return;
        };

        let current = self
            .state
            .coordinates
            .unwrap_or(self.settings.default_location);
        let next = match axis {
            Axis::Latitude => Coordinates::new(value, current.lng),
            Axis::Longitude => Coordinates::new(current.lat, value),
        };
        if self.state.coordinates == Some(next) {
            return;
        }

        self.end_bootstrap();
        let view = ViewMove::Recenter {
            threshold_meters: self.settings.pan_threshold_m,
        };
        self.adopt(next, view, false);
    }

    fn teardown(&mut self) {
        if let Some(task) = self.locate_task.take() {
            task.abort();
        }
        self.reverse.shutdown();
        self.search.cancel_all();
        self.notice_timer.cancel();
        self.popup_timer.cancel();
        self.map_init_timer.cancel();
        self.map.teardown();

        self.state.geocoding = false;
        self.state.searching = false;
        self.state.map_ready = false;
        self.state.mounted = false;
    }
}

//! Shared test doubles: a scripted transport, a recording presenter and
//! hand-driven countdowns.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dragon_client::{
    Countdown, CountdownFactory, CountdownHooks, ControllerDeps, ControllerSettings, GameConfig,
    GameController, GameListEntry, GameMode, GameView, NotificationSink, Page, Popup, RawResponse,
    Request, RequestKind, RulesCatalog, SessionRegistry, Timeline, TimerEvent, Transport,
    TransportError,
};
use serde_json::json;
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────
//  Transport
// ─────────────────────────────────────────────────────────────

struct Scripted {
    delay: Duration,
    reply: Result<RawResponse, TransportError>,
}

/// Replies from per-kind queues. Unscripted requests get a bare SUCCESS.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<HashMap<RequestKind, VecDeque<Scripted>>>,
    sent: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, kind: RequestKind, response: RawResponse) {
        self.reply_after(kind, Duration::ZERO, response);
    }

    pub fn reply_after(&self, kind: RequestKind, delay: Duration, response: RawResponse) {
        self.push(kind, delay, Ok(response));
    }

    pub fn fail(&self, kind: RequestKind, message: &str) {
        self.push(kind, Duration::ZERO, Err(TransportError::new(message)));
    }

    fn push(&self, kind: RequestKind, delay: Duration, reply: Result<RawResponse, TransportError>) {
        self.script
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(Scripted { delay, reply });
    }

    pub fn sent(&self) -> Vec<Request> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_kinds(&self) -> Vec<RequestKind> {
        self.sent().iter().map(Request::kind).collect()
    }

    pub fn count(&self, kind: RequestKind) -> usize {
        self.sent().iter().filter(|r| r.kind() == kind).count()
    }

    pub fn paths_of(&self, kind: RequestKind) -> Vec<String> {
        self.sent()
            .iter()
            .filter(|r| r.kind() == kind)
            .map(|r| r.path().to_string())
            .collect()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        let scripted = self
            .script
            .lock()
            .unwrap()
            .get_mut(&request.kind())
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(Scripted { delay, reply }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                reply
            }
            None => Ok(ack()),
        }
    }
}

/// `{"status":"SUCCESS"}`
pub fn ack() -> RawResponse {
    RawResponse::ok(json!({ "status": "SUCCESS" }))
}

/// A START reply carrying `id`.
pub fn started(id: u64) -> RawResponse {
    RawResponse::ok(json!({ "status": "SUCCESS", "id": id }))
}

/// A FAILURE reply.
pub fn refused(info: &str) -> RawResponse {
    RawResponse::ok(json!({ "status": "FAILURE", "complementaryInfo": info }))
}

/// A formula state reply.
pub fn state(math: &str, texts: &[&str], current: usize, status: &str) -> RawResponse {
    let elements: Vec<_> = texts.iter().map(|t| json!({ "text": t })).collect();
    RawResponse::ok(json!({
        "status": "SUCCESS",
        "math": math,
        "timeline": { "elements": elements, "current": current },
        "gameStatus": status,
    }))
}

/// A plain PLAYING state with a one-entry timeline.
pub fn playing(math: &str) -> RawResponse {
    state(math, &[math], 0, "PLAYING")
}

// ─────────────────────────────────────────────────────────────
//  Presenter
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Error(String),
    Success(String),
    Popup(Popup),
    Navigate(Page),
    Formula(String),
    Timeline { current: usize, len: usize },
    Timer(bool),
    TimerUpdate(Duration),
    Rules(usize),
    GameList(Vec<GameListEntry>),
    NoGame,
}

/// Records every notification and render call.
#[derive(Default)]
pub struct RecordingPresenter {
    shown: Mutex<Vec<Shown>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, shown: Shown) {
        self.shown.lock().unwrap().push(shown);
    }

    pub fn shown(&self) -> Vec<Shown> {
        self.shown.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn popups(&self) -> Vec<Popup> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Popup(popup) => Some(popup),
                _ => None,
            })
            .collect()
    }

    pub fn formulas(&self) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Formula(math) => Some(math),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.shown.lock().unwrap().clear();
    }
}

impl NotificationSink for RecordingPresenter {
    fn error(&self, message: &str) {
        self.record(Shown::Error(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.record(Shown::Success(message.to_string()));
    }

    fn popup(&self, popup: Popup) {
        self.record(Shown::Popup(popup));
    }

    fn navigate(&self, page: Page) {
        self.record(Shown::Navigate(page));
    }
}

impl GameView for RecordingPresenter {
    fn show_formula(&self, math: &str) {
        self.record(Shown::Formula(math.to_string()));
    }

    fn show_timeline(&self, timeline: &Timeline) {
        self.record(Shown::Timeline {
            current: timeline.current(),
            len: timeline.len(),
        });
    }

    fn show_timer(&self, visible: bool) {
        self.record(Shown::Timer(visible));
    }

    fn update_timer(&self, remaining: Duration) {
        self.record(Shown::TimerUpdate(remaining));
    }

    fn show_rules(&self, rules: &RulesCatalog) {
        self.record(Shown::Rules(rules.len()));
    }

    fn show_game_list(&self, entries: &[GameListEntry]) {
        self.record(Shown::GameList(entries.to_vec()));
    }

    fn show_no_game(&self) {
        self.record(Shown::NoGame);
    }
}

// ─────────────────────────────────────────────────────────────
//  Countdowns
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    Created(Duration),
    Started,
    Stopped,
    ElapsedRead,
}

#[derive(Debug, Default)]
struct ClockState {
    duration: Duration,
    elapsed: Duration,
    running: bool,
    over: bool,
}

/// Handle on one manual countdown.
#[derive(Debug, Clone)]
pub struct Clock {
    state: Arc<Mutex<ClockState>>,
    hooks: CountdownHooks,
}

impl Clock {
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().unwrap();
        state.elapsed = (state.elapsed + by).min(state.duration);
    }

    /// Fires the tick hook.
    pub fn tick(&self, remaining: Duration) {
        self.hooks.tick(remaining);
    }

    /// Runs the clock out and fires the expiry hook.
    pub fn run_out(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.elapsed = state.duration;
            state.over = true;
            state.running = false;
        }
        self.hooks.expire();
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    pub fn duration(&self) -> Duration {
        self.state.lock().unwrap().duration
    }
}

#[derive(Debug)]
struct ManualCountdown {
    state: Arc<Mutex<ClockState>>,
    log: Arc<Mutex<Vec<ClockEvent>>>,
}

impl Countdown for ManualCountdown {
    fn start(&mut self) {
        self.state.lock().unwrap().running = true;
        self.log.lock().unwrap().push(ClockEvent::Started);
    }

    fn stop(&mut self) {
        self.state.lock().unwrap().running = false;
        self.log.lock().unwrap().push(ClockEvent::Stopped);
    }

    fn elapsed(&self) -> Duration {
        self.log.lock().unwrap().push(ClockEvent::ElapsedRead);
        self.state.lock().unwrap().elapsed
    }

    fn remaining(&self) -> Duration {
        let state = self.state.lock().unwrap();
        state.duration - state.elapsed
    }

    fn is_over(&self) -> bool {
        self.state.lock().unwrap().over
    }
}

/// Builds manual countdowns and keeps a handle and an event log for each.
#[derive(Default)]
pub struct ManualCountdowns {
    clocks: Mutex<Vec<Clock>>,
    log: Arc<Mutex<Vec<ClockEvent>>>,
}

impl ManualCountdowns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Vec<ClockEvent> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn created(&self) -> usize {
        self.clocks.lock().unwrap().len()
    }

    pub fn last(&self) -> Clock {
        self.clocks
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no countdown created")
    }
}

impl CountdownFactory for ManualCountdowns {
    fn create(&self, duration: Duration, hooks: CountdownHooks) -> Box<dyn Countdown> {
        let state = Arc::new(Mutex::new(ClockState {
            duration,
            ..ClockState::default()
        }));
        self.clocks.lock().unwrap().push(Clock {
            state: state.clone(),
            hooks,
        });
        self.log.lock().unwrap().push(ClockEvent::Created(duration));
        Box::new(ManualCountdown {
            state,
            log: self.log.clone(),
        })
    }
}

// ─────────────────────────────────────────────────────────────
//  Harness
// ─────────────────────────────────────────────────────────────

pub struct Harness {
    pub controller: GameController,
    pub timer_events: mpsc::UnboundedReceiver<TimerEvent>,
    pub transport: Arc<ScriptedTransport>,
    pub presenter: Arc<RecordingPresenter>,
    pub clocks: Arc<ManualCountdowns>,
}

impl Harness {
    pub fn new(registry: SessionRegistry) -> Self {
        let transport = Arc::new(ScriptedTransport::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let clocks = Arc::new(ManualCountdowns::new());
        let (controller, timer_events) = GameController::new(ControllerDeps::new(
            registry,
            transport.clone(),
            presenter.clone(),
            presenter.clone(),
            clocks.clone(),
            ControllerSettings::default(),
        ));
        Self {
            controller,
            timer_events,
            transport,
            presenter,
            clocks,
        }
    }

    /// One NORMAL game, current, not yet started.
    pub fn with_normal_game() -> Self {
        let mut registry = SessionRegistry::new();
        registry.create(normal_game());
        Self::new(registry)
    }

    /// Scripts a successful START as `id` followed by a PLAYING state, then
    /// enters the game page.
    pub async fn started(id: u64, math: &str) -> Self {
        let harness = Self::with_normal_game();
        harness.transport.reply(RequestKind::Start, started(id));
        harness.transport.reply(RequestKind::GameState, playing(math));
        harness.controller.enter().await.expect("enter failed");
        harness
    }

    /// Delivers every pending timer event.
    pub async fn drain_timer_events(&mut self) {
        while let Ok(event) = self.timer_events.try_recv() {
            let _ = self.controller.handle_timer_event(event).await;
        }
    }
}

pub fn normal_game() -> GameConfig {
    GameConfig::new(GameMode::Normal, "base", "f1", false)
}

pub fn theorem_game() -> GameConfig {
    GameConfig::new(GameMode::Theorem, "base", "f2", true)
}

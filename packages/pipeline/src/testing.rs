//! Testing utilities including mock implementations.
//!
//! These let applications exercise the pipeline without a browser fleet, a
//! queue broker, or real AI calls. Every mock records the calls it receives
//! for assertions.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::traits::ai::{TextGenerator, Translator};
use crate::traits::browser::{Browser, BrowserFleet, Page};
use crate::traits::queue::{Delivery, StageQueue};
use crate::types::{ChatMessage, LaunchOptions, Session, WorkItem};

// =============================================================================
// Browser fleet
// =============================================================================

/// Record of a call made to the mock fleet or one of its browsers/pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetCall {
    ListSessions,
    Connect(String),
    Launch(LaunchOptions),
    NewPage(String),
    Goto(String),
    ExtractText(String),
    ExtractLinks(String),
    ClosePage,
    Disconnect(String),
    Terminate(String),
}

#[derive(Default)]
struct FleetState {
    pages: RwLock<HashMap<String, String>>,
    links: RwLock<HashMap<String, Vec<String>>>,
    goto_fails: AtomicBool,
    goto_delay: RwLock<Option<Duration>>,
    calls: Mutex<Vec<FleetCall>>,
}

impl FleetState {
    fn record(&self, call: FleetCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

/// A mock browser fleet serving canned page text and links.
///
/// Pages without configured text extract as an empty string.
#[derive(Default)]
pub struct MockFleet {
    sessions: Vec<Session>,
    connect_fails: bool,
    list_fails: bool,
    launch_fails: bool,
    launched: AtomicUsize,
    state: Arc<FleetState>,
}

impl MockFleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions returned by `list_sessions`.
    pub fn with_sessions(mut self, sessions: Vec<Session>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Visible text returned after navigating to `url`.
    pub fn with_page_text(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.state
            .pages
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.into(), text.into());
        self
    }

    /// Link hrefs returned after navigating to `url`.
    pub fn with_links(self, url: impl Into<String>, links: Vec<&str>) -> Self {
        self.state
            .links
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.into(), links.into_iter().map(String::from).collect());
        self
    }

    /// Every `connect` fails, as if the session was claimed first.
    pub fn failing_connect(mut self) -> Self {
        self.connect_fails = true;
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.list_fails = true;
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.launch_fails = true;
        self
    }

    /// Navigation takes `delay` before it completes.
    pub fn with_goto_delay(self, delay: Duration) -> Self {
        *self
            .state
            .goto_delay
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(delay);
        self
    }

    pub fn failing_goto(self) -> Self {
        self.state.goto_fails.store(true, Ordering::SeqCst);
        self
    }

    /// All calls in the order they were made.
    pub fn calls(&self) -> Vec<FleetCall> {
        self.state
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl BrowserFleet for MockFleet {
    async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.state.record(FleetCall::ListSessions);
        if self.list_fails {
            bail!("fleet listing unavailable");
        }
        Ok(self.sessions.clone())
    }

    async fn connect(&self, session_id: &str) -> Result<Box<dyn Browser>> {
        self.state.record(FleetCall::Connect(session_id.to_string()));
        if self.connect_fails {
            bail!("session {} already has a connected client", session_id);
        }
        Ok(Box::new(MockBrowser {
            session_id: session_id.to_string(),
            state: self.state.clone(),
        }))
    }

    async fn launch(&self, options: LaunchOptions) -> Result<Box<dyn Browser>> {
        self.state.record(FleetCall::Launch(options));
        if self.launch_fails {
            bail!("browser quota exceeded");
        }
        let n = self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockBrowser {
            session_id: format!("launched-{}", n),
            state: self.state.clone(),
        }))
    }
}

struct MockBrowser {
    session_id: String,
    state: Arc<FleetState>,
}

#[async_trait]
impl Browser for MockBrowser {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn new_page(&self) -> Result<Box<dyn Page>> {
        self.state.record(FleetCall::NewPage(self.session_id.clone()));
        Ok(Box::new(MockPage {
            state: self.state.clone(),
            current: Mutex::new(None),
        }))
    }

    async fn disconnect(self: Box<Self>) -> Result<()> {
        self.state.record(FleetCall::Disconnect(self.session_id.clone()));
        Ok(())
    }

    async fn terminate(self: Box<Self>) -> Result<()> {
        self.state.record(FleetCall::Terminate(self.session_id.clone()));
        Ok(())
    }
}

struct MockPage {
    state: Arc<FleetState>,
    current: Mutex<Option<String>>,
}

impl MockPage {
    fn current_url(&self) -> Result<String> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| anyhow!("page has not navigated anywhere"))
    }
}

#[async_trait]
impl Page for MockPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.state.record(FleetCall::Goto(url.to_string()));
        let delay = *self.state.goto_delay.read().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.goto_fails.load(Ordering::SeqCst) {
            bail!("net::ERR_NAME_NOT_RESOLVED at {}", url);
        }
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(url.to_string());
        Ok(())
    }

    async fn extract_text(&self) -> Result<String> {
        let url = self.current_url()?;
        self.state.record(FleetCall::ExtractText(url.clone()));
        Ok(self
            .state
            .pages
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&url)
            .cloned()
            .unwrap_or_default())
    }

    async fn extract_links(&self, selector: &str) -> Result<Vec<String>> {
        let url = self.current_url()?;
        self.state.record(FleetCall::ExtractLinks(selector.to_string()));
        Ok(self
            .state
            .links
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&url)
            .cloned()
            .unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.record(FleetCall::ClosePage);
        Ok(())
    }
}

// =============================================================================
// AI
// =============================================================================

/// Record of a call made to the mock AI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAICall {
    Generate {
        messages: Vec<ChatMessage>,
    },
    Translate {
        text: String,
        source_lang: String,
        target_lang: String,
    },
}

/// A mock AI implementing both summarization and translation.
///
/// Translation appends `_tr` to the sentence unless configured otherwise.
pub struct MockAI {
    summary: Option<String>,
    missing_translations: HashSet<String>,
    fail_translation: bool,
    reverse_latency: bool,
    translations_started: AtomicUsize,
    calls: Mutex<Vec<MockAICall>>,
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            summary: Some("mock summary".to_string()),
            missing_translations: HashSet::new(),
            fail_translation: false,
            reverse_latency: false,
            translations_started: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Response text for summarization requests.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Summarization returns no response at all.
    pub fn without_summary(mut self) -> Self {
        self.summary = None;
        self
    }

    /// Translation of `sentence` returns no text.
    pub fn without_translation(mut self, sentence: impl Into<String>) -> Self {
        self.missing_translations.insert(sentence.into());
        self
    }

    pub fn failing_translation(mut self) -> Self {
        self.fail_translation = true;
        self
    }

    /// Earlier translation calls take longer than later ones, so completion
    /// order is the reverse of submission order.
    pub fn with_reverse_latency(mut self) -> Self {
        self.reverse_latency = true;
        self
    }

    pub fn calls(&self) -> Vec<MockAICall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn translate_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockAICall::Translate { .. }))
            .count()
    }

    fn record(&self, call: MockAICall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }
}

#[async_trait]
impl TextGenerator for MockAI {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
        self.record(MockAICall::Generate {
            messages: messages.to_vec(),
        });
        Ok(self.summary.clone())
    }
}

#[async_trait]
impl Translator for MockAI {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Option<String>> {
        self.record(MockAICall::Translate {
            text: text.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        });

        let started = self.translations_started.fetch_add(1, Ordering::SeqCst) as u64;
        if self.reverse_latency {
            let delay = 40u64.saturating_sub(10 * started);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.fail_translation {
            bail!("translation model unavailable");
        }
        if self.missing_translations.contains(text) {
            return Ok(None);
        }
        Ok(Some(format!("{}_tr", text)))
    }
}

// =============================================================================
// Queue
// =============================================================================

/// A stage queue that records every item sent to it.
#[derive(Default)]
pub struct RecordingQueue {
    sent: Mutex<Vec<WorkItem>>,
    fails: bool,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fails: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<WorkItem> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl StageQueue for RecordingQueue {
    async fn send(&self, item: &WorkItem) -> Result<()> {
        if self.fails {
            bail!("queue unavailable");
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(item.clone());
        Ok(())
    }
}

/// A delivered message whose ack/retry decisions can be inspected.
#[derive(Debug, Default)]
pub struct TestDelivery {
    body: Vec<u8>,
    acked: AtomicBool,
    retry: Mutex<Option<Duration>>,
}

impl TestDelivery {
    pub fn new(item: &WorkItem) -> Self {
        Self::raw(serde_json::to_vec(item).unwrap_or_default())
    }

    /// A delivery with an arbitrary (possibly undecodable) body.
    pub fn raw(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn is_acked(&self) -> bool {
        self.acked.load(Ordering::SeqCst)
    }

    /// Delay requested through `retry`, if any.
    pub fn retry_delay(&self) -> Option<Duration> {
        *self.retry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Delivery for TestDelivery {
    fn body(&self) -> &[u8] {
        &self.body
    }

    async fn ack(&self) -> Result<()> {
        self.acked.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn retry(&self, delay: Duration) -> Result<()> {
        *self.retry.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
        Ok(())
    }
}

//! Mock peer launcher and completion recorder.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::client::{Handoff, PeerLauncher};
use crate::errors::StatusCode;

/// Peer launcher whose capabilities can be flipped at runtime.
#[derive(Debug)]
pub struct MockPeer {
    installed: AtomicBool,
    supported: AtomicBool,
    accepting: AtomicBool,
    launches: Mutex<Vec<Handoff>>,
}

impl Default for MockPeer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPeer {
    /// Installed, supported and accepting every launch.
    pub fn new() -> Self {
        Self {
            installed: AtomicBool::new(true),
            supported: AtomicBool::new(true),
            accepting: AtomicBool::new(true),
            launches: Mutex::new(Vec::new()),
        }
    }

    pub fn not_installed() -> Self {
        let peer = Self::new();
        peer.set_installed(false);
        peer
    }

    pub fn set_installed(&self, installed: bool) {
        self.installed.store(installed, Ordering::SeqCst);
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    /// When false, `launch` reports that the platform refused.
    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::SeqCst);
    }

    pub fn launches(&self) -> Vec<Handoff> {
        self.launches.lock().unwrap().clone()
    }

    pub fn launch_count(&self) -> usize {
        self.launches.lock().unwrap().len()
    }

    pub fn last_launch(&self) -> Option<Handoff> {
        self.launches.lock().unwrap().last().cloned()
    }
}

impl PeerLauncher for MockPeer {
    fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    fn supports_api(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    fn launch(&self, handoff: &Handoff) -> bool {
        self.launches.lock().unwrap().push(handoff.clone());
        self.accepting.load(Ordering::SeqCst)
    }
}

/// One recorded completion invocation.
///
/// `first` and `second` hold the shape's optional fields in declaration
/// order: `(open_id, access_token)`, `(nickname, head_img_url)` or
/// `(message, None)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCall {
    pub status: StatusCode,
    pub first: Option<String>,
    pub second: Option<String>,
}

/// Hands out completions that record into a shared log.
#[derive(Debug, Clone, Default)]
pub struct CompletionProbe {
    calls: Arc<Mutex<Vec<ProbeCall>>>,
}

impl CompletionProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, status: StatusCode, first: Option<String>, second: Option<String>) {
        self.calls.lock().unwrap().push(ProbeCall {
            status,
            first,
            second,
        });
    }

    pub fn status_fn(&self) -> impl FnOnce(StatusCode) + Send + 'static {
        let probe = self.clone();
        move |status| probe.record(status, None, None)
    }

    pub fn auth_fn(
        &self,
    ) -> impl FnOnce(StatusCode, Option<String>, Option<String>) + Send + 'static {
        let probe = self.clone();
        move |status, open_id, token| probe.record(status, open_id, token)
    }

    pub fn user_info_fn(
        &self,
    ) -> impl FnOnce(StatusCode, Option<String>, Option<String>) + Send + 'static {
        let probe = self.clone();
        move |status, nickname, avatar| probe.record(status, nickname, avatar)
    }

    pub fn program_fn(&self) -> impl FnOnce(StatusCode, Option<String>) + Send + 'static {
        let probe = self.clone();
        move |status, message| probe.record(status, message, None)
    }

    pub fn calls(&self) -> Vec<ProbeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<ProbeCall> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn last_status(&self) -> Option<StatusCode> {
        self.last().map(|call| call.status)
    }
}

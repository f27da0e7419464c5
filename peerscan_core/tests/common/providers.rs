use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use peerscan::{
    CapabilityProvider, DiscoveryEvent, EnableOutcome, EventSink, Grant, GrantOutcome,
    PeerIdentity, RadioError, RadioProvider, RadioStatus, Responder,
};

#[derive(Debug)]
struct Capabilities {
    held: HashSet<Grant>,
    radio: RadioStatus,
    pending_grants: Option<Responder<GrantOutcome>>,
    pending_enable: Option<Responder<EnableOutcome>>,
    grant_prompts: usize,
    enable_prompts: usize,
    crash_on_prompt: bool,
}

/// Capability provider whose dialogs stay open until the test answers them.
#[derive(Debug)]
pub struct ScriptedCapabilities {
    inner: Mutex<Capabilities>,
}
#[allow(dead_code)]
impl ScriptedCapabilities {
    pub fn new(held: &[Grant], radio: RadioStatus) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Capabilities {
                held: held.iter().copied().collect(),
                radio,
                pending_grants: None,
                pending_enable: None,
                grant_prompts: 0,
                enable_prompts: 0,
                crash_on_prompt: false,
            }),
        })
    }
    pub fn ready() -> Arc<Self> {
        Self::new(&[Grant::Scan, Grant::Connect], RadioStatus::Enabled)
    }
    pub fn hold(&self, grants: &[Grant]) {
        self.inner.lock().unwrap().held.extend(grants);
    }
    /// The next grant prompt panics instead of opening.
    pub fn crash_on_prompt(&self) {
        self.inner.lock().unwrap().crash_on_prompt = true;
    }
    pub fn set_radio(&self, radio: RadioStatus) {
        self.inner.lock().unwrap().radio = radio;
    }
    pub fn grant(&self, grants: &[Grant]) {
        self.hold(grants);
        let responder = self.inner.lock().unwrap().pending_grants.take();
        responder.expect("no grant prompt open").respond(GrantOutcome::Granted);
    }
    pub fn deny(&self) {
        let responder = self.inner.lock().unwrap().pending_grants.take();
        responder.expect("no grant prompt open").respond(GrantOutcome::Denied);
    }
    pub fn accept_enable(&self) {
        self.set_radio(RadioStatus::Enabled);
        let responder = self.inner.lock().unwrap().pending_enable.take();
        responder.expect("no enable prompt open").respond(EnableOutcome::Enabled);
    }
    /// Answers the enable prompt with success without powering the radio.
    pub fn report_enabled(&self) {
        let responder = self.inner.lock().unwrap().pending_enable.take();
        responder.expect("no enable prompt open").respond(EnableOutcome::Enabled);
    }
    pub fn decline_enable(&self) {
        let responder = self.inner.lock().unwrap().pending_enable.take();
        responder.expect("no enable prompt open").respond(EnableOutcome::Declined);
    }
    pub fn abandon_prompts(&self) {
        let (grants, enable) = {
            let mut inner = self.inner.lock().unwrap();
            (inner.pending_grants.take(), inner.pending_enable.take())
        };
        drop(grants);
        drop(enable);
    }
    pub fn grant_prompts(&self) -> usize {
        self.inner.lock().unwrap().grant_prompts
    }
    pub fn enable_prompts(&self) -> usize {
        self.inner.lock().unwrap().enable_prompts
    }
}
impl CapabilityProvider for ScriptedCapabilities {
    fn grants_held(&self) -> HashSet<Grant> {
        self.inner.lock().unwrap().held.clone()
    }
    fn radio_status(&self) -> RadioStatus {
        self.inner.lock().unwrap().radio
    }
    fn request_grants(&self, _grants: Vec<Grant>, responder: Responder<GrantOutcome>) {
        let mut inner = self.inner.lock().unwrap();
        inner.grant_prompts += 1;
        if std::mem::take(&mut inner.crash_on_prompt) {
            drop(inner);
            panic!("permission dialog crashed");
        }
        inner.pending_grants = Some(responder);
    }
    fn request_radio_enable(&self, responder: Responder<EnableOutcome>) {
        let mut inner = self.inner.lock().unwrap();
        inner.enable_prompts += 1;
        inner.pending_enable = Some(responder);
    }
}

#[derive(Debug, Default)]
struct Radio {
    sink: Option<EventSink>,
    failure: Option<RadioError>,
    crash_on_start: bool,
    starts: usize,
    stops: usize,
}

/// Radio whose sightings are injected by the test.
#[derive(Debug, Default)]
pub struct ScriptedRadio {
    inner: Mutex<Radio>,
}
#[allow(dead_code)]
impl ScriptedRadio {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }
    pub fn failing(failure: RadioError) -> Arc<Self> {
        let radio = Self::default();
        radio.inner.lock().unwrap().failure = Some(failure);
        Arc::new(radio)
    }
    /// The first start panics; later starts succeed.
    pub fn crashing_once() -> Arc<Self> {
        let radio = Self::default();
        radio.inner.lock().unwrap().crash_on_start = true;
        Arc::new(radio)
    }
    /// Returns false when no scan is running.
    pub fn emit(&self, address: &str, name: Option<&str>) -> bool {
        let inner = self.inner.lock().unwrap();
        let event = DiscoveryEvent::new(PeerIdentity::new(address, name.map(str::to_owned)));
        match &inner.sink {
            Some(sink) => sink.send(event).is_ok(),
            None => false,
        }
    }
    pub fn is_scanning(&self) -> bool {
        self.inner.lock().unwrap().sink.is_some()
    }
    pub fn starts(&self) -> usize {
        self.inner.lock().unwrap().starts
    }
    pub fn stops(&self) -> usize {
        self.inner.lock().unwrap().stops
    }
}
impl RadioProvider for ScriptedRadio {
    type Handle = usize;
    fn start_scan(&self, events: EventSink) -> Result<usize, RadioError> {
        let mut inner = self.inner.lock().unwrap();
        if std::mem::take(&mut inner.crash_on_start) {
            drop(inner);
            panic!("radio driver crashed");
        }
        if let Some(failure) = inner.failure.clone() {
            return Err(failure);
        }
        inner.starts += 1;
        inner.sink = Some(events);
        Ok(inner.starts)
    }
    fn stop_scan(&self, handle: usize) {
        let mut inner = self.inner.lock().unwrap();
        assert_eq!(handle, inner.starts, "stopped a scan that is not the latest");
        inner.stops += 1;
        inner.sink = None;
    }
}

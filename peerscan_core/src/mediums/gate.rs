use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::{info, warn};

use super::{CapabilityProvider, EnableOutcome, GrantOutcome, Responder};
use crate::core::{
    missing_grants, CapabilityState, Grant, PeerscanError, RadioStatus, SessionError,
};

/// What has to happen before a scan may start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// Grants are absent and the user has not been asked yet.
    NeedsGrants(Vec<Grant>),
    /// Grants are held but the radio is powered off.
    NeedsRadio,
    Refused(SessionError),
}

pub struct CapabilityGate<C: CapabilityProvider> {
    provider: Arc<C>,
    required: Vec<Grant>,
    grants_requested: AtomicBool,
}
impl<C: CapabilityProvider> CapabilityGate<C> {
    pub fn new(provider: Arc<C>, required: Vec<Grant>) -> Self {
        Self {
            provider,
            required,
            grants_requested: AtomicBool::new(false),
        }
    }
    pub fn evaluate(&self) -> CapabilityState {
        CapabilityState {
            grants_held: self.provider.grants_held(),
            radio: self.provider.radio_status(),
        }
    }
    pub fn assess(&self, state: &CapabilityState) -> Readiness {
        let missing = state.missing(&self.required);
        if !missing.is_empty() {
            if self.grants_requested.load(Ordering::Acquire) {
                return Readiness::Refused(SessionError::MissingGrants(missing));
            }
            return Readiness::NeedsGrants(missing);
        }
        // Held now; a later revocation deserves a fresh prompt.
        self.grants_requested.store(false, Ordering::Release);
        match state.radio {
            RadioStatus::Enabled => Readiness::Ready,
            RadioStatus::Disabled => Readiness::NeedsRadio,
            RadioStatus::Unsupported => Readiness::Refused(SessionError::RadioUnsupported),
        }
    }
    /// Prompts for `missing` at most once until the grants are seen held.
    /// `on_result` runs exactly once, possibly inline.
    pub fn request_grants<F>(&self, missing: Vec<Grant>, on_result: F)
    where
        F: FnOnce(Result<(), SessionError>) + Send + 'static,
    {
        if self.grants_requested.swap(true, Ordering::AcqRel) {
            on_result(Err(SessionError::MissingGrants(missing)));
            return;
        }
        let provider = self.provider.clone();
        let required = self.required.clone();
        let responder = Responder::new(move |outcome: Option<GrantOutcome>| {
            let result = match outcome {
                None => Err(PeerscanError::Abandoned("Grant request").into()),
                Some(outcome) => {
                    let still_missing = missing_grants(&provider.grants_held(), &required);
                    if still_missing.is_empty() {
                        Ok(())
                    } else {
                        if outcome == GrantOutcome::Granted {
                            warn!("Grants reported granted but {:?} still missing", still_missing);
                        }
                        Err(SessionError::MissingGrants(still_missing))
                    }
                }
            };
            on_result(result);
        });
        info!("Requesting grants {:?}", missing);
        self.provider.request_grants(missing, responder);
    }
    pub fn request_radio_enable<F>(&self, on_result: F)
    where
        F: FnOnce(Result<(), SessionError>) + Send + 'static,
    {
        let responder = Responder::new(move |outcome: Option<EnableOutcome>| {
            on_result(match outcome {
                Some(EnableOutcome::Enabled) => Ok(()),
                Some(EnableOutcome::Declined) => Err(SessionError::RadioEnableDeclined),
                None => Err(PeerscanError::Abandoned("Radio enable request").into()),
            })
        });
        info!("Requesting radio enable");
        self.provider.request_radio_enable(responder);
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Mutex};

    use tracing_test::traced_test;

    use super::*;

    #[derive(Default)]
    struct FakeProvider {
        held: Mutex<HashSet<Grant>>,
        radio: Mutex<Option<RadioStatus>>,
        prompts: Mutex<usize>,
        grant_on_prompt: bool,
        drop_responders: bool,
    }
    impl CapabilityProvider for FakeProvider {
        fn grants_held(&self) -> HashSet<Grant> {
            self.held.lock().unwrap().clone()
        }
        fn radio_status(&self) -> RadioStatus {
            self.radio.lock().unwrap().unwrap_or(RadioStatus::Enabled)
        }
        fn request_grants(&self, grants: Vec<Grant>, responder: Responder<GrantOutcome>) {
            *self.prompts.lock().unwrap() += 1;
            if self.drop_responders {
                return;
            }
            if self.grant_on_prompt {
                self.held.lock().unwrap().extend(grants);
                responder.respond(GrantOutcome::Granted);
            } else {
                responder.respond(GrantOutcome::Denied);
            }
        }
        fn request_radio_enable(&self, responder: Responder<EnableOutcome>) {
            if !self.drop_responders {
                responder.respond(EnableOutcome::Declined);
            }
        }
    }
    fn gate(provider: FakeProvider) -> (Arc<FakeProvider>, CapabilityGate<FakeProvider>) {
        let provider = Arc::new(provider);
        let gate = CapabilityGate::new(provider.clone(), vec![Grant::Scan, Grant::Connect]);
        (provider, gate)
    }
    fn capture() -> (
        Arc<Mutex<Option<Result<(), SessionError>>>>,
        impl FnOnce(Result<(), SessionError>) + Send + 'static,
    ) {
        let slot = Arc::new(Mutex::new(None));
        let sink = slot.clone();
        (slot, move |result| *sink.lock().unwrap() = Some(result))
    }

    #[test]
    fn test_radio_states_are_distinguished() {
        let (provider, gate) = gate(FakeProvider::default());
        provider.held.lock().unwrap().extend([Grant::Scan, Grant::Connect]);
        assert_eq!(gate.assess(&gate.evaluate()), Readiness::Ready);
        *provider.radio.lock().unwrap() = Some(RadioStatus::Disabled);
        assert_eq!(gate.assess(&gate.evaluate()), Readiness::NeedsRadio);
        *provider.radio.lock().unwrap() = Some(RadioStatus::Unsupported);
        assert_eq!(
            gate.assess(&gate.evaluate()),
            Readiness::Refused(SessionError::RadioUnsupported)
        );
    }
    #[traced_test]
    #[test]
    fn test_denied_grants_are_named_and_not_reprompted() {
        let (provider, gate) = gate(FakeProvider::default());
        let Readiness::NeedsGrants(missing) = gate.assess(&gate.evaluate()) else {
            panic!("expected a grant prompt");
        };
        let (slot, on_result) = capture();
        gate.request_grants(missing, on_result);
        assert_eq!(
            slot.lock().unwrap().take(),
            Some(Err(SessionError::MissingGrants(vec![Grant::Scan, Grant::Connect])))
        );
        assert_eq!(
            gate.assess(&gate.evaluate()),
            Readiness::Refused(SessionError::MissingGrants(vec![Grant::Scan, Grant::Connect]))
        );
        let (slot, on_result) = capture();
        gate.request_grants(vec![Grant::Scan, Grant::Connect], on_result);
        assert!(matches!(
            slot.lock().unwrap().take(),
            Some(Err(SessionError::MissingGrants(_)))
        ));
        assert_eq!(*provider.prompts.lock().unwrap(), 1);
    }
    #[test]
    fn test_granted_prompt_resolves_ok() {
        let (provider, gate) = gate(FakeProvider {
            grant_on_prompt: true,
            ..Default::default()
        });
        provider.held.lock().unwrap().insert(Grant::Scan);
        let (slot, on_result) = capture();
        gate.request_grants(vec![Grant::Connect], on_result);
        assert_eq!(slot.lock().unwrap().take(), Some(Ok(())));
        assert_eq!(gate.assess(&gate.evaluate()), Readiness::Ready);
    }
    #[test]
    fn test_dropped_responder_is_internal() {
        let (_provider, gate) = gate(FakeProvider {
            drop_responders: true,
            ..Default::default()
        });
        let (slot, on_result) = capture();
        gate.request_grants(vec![Grant::Scan], on_result);
        assert!(matches!(
            slot.lock().unwrap().take(),
            Some(Err(SessionError::Internal(_)))
        ));
        let (slot, on_result) = capture();
        gate.request_radio_enable(on_result);
        assert!(matches!(
            slot.lock().unwrap().take(),
            Some(Err(SessionError::Internal(_)))
        ));
    }
    #[test]
    fn test_declined_enable() {
        let (_provider, gate) = gate(FakeProvider::default());
        let (slot, on_result) = capture();
        gate.request_radio_enable(on_result);
        assert_eq!(
            slot.lock().unwrap().take(),
            Some(Err(SessionError::RadioEnableDeclined))
        );
    }
}

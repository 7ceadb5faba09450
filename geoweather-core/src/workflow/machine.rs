//! Pure transition function of the weather workflow.
//!
//! `step` takes the current state and one event and returns the next state
//! plus the effects the driver must execute. It performs no I/O, so every
//! path through the workflow can be tested without collaborators.

use crate::{
    error::{ErrorKind, FetchError, LocationError},
    host::PermissionOutcome,
    model::{Coordinate, WeatherSnapshot},
};

pub const LOCATION_OFF_MESSAGE: &str = "Your location provider is turned off. Please turn it on.";
pub const PERMISSION_DENIED_MESSAGE: &str =
    "You have denied location permission. Please allow it, it is mandatory.";

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    CheckingLocationEnabled,
    AwaitingPermission,
    AwaitingFix,
    CheckingNetwork(Coordinate),
    Fetching(Coordinate),
    LocationDisabled,
    PermissionDenied,
    PermissionRationale,
    LocationUnavailable,
    Offline,
    Success,
    Failed(ErrorKind),
}

impl WorkflowState {
    /// No automatic transition leaves a terminal state; only a new
    /// `Start` or `Refresh` does.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::LocationDisabled
                | WorkflowState::PermissionDenied
                | WorkflowState::PermissionRationale
                | WorkflowState::LocationUnavailable
                | WorkflowState::Offline
                | WorkflowState::Success
                | WorkflowState::Failed(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::CheckingLocationEnabled => "checking_location_enabled",
            WorkflowState::AwaitingPermission => "awaiting_permission",
            WorkflowState::AwaitingFix => "awaiting_fix",
            WorkflowState::CheckingNetwork(_) => "checking_network",
            WorkflowState::Fetching(_) => "fetching",
            WorkflowState::LocationDisabled => "location_disabled",
            WorkflowState::PermissionDenied => "permission_denied",
            WorkflowState::PermissionRationale => "permission_rationale",
            WorkflowState::LocationUnavailable => "location_unavailable",
            WorkflowState::Offline => "offline",
            WorkflowState::Success => "success",
            WorkflowState::Failed(_) => "failed",
        }
    }

    fn can_begin_run(&self) -> bool {
        matches!(self, WorkflowState::Idle) || self.is_terminal()
    }
}

#[derive(Debug)]
pub enum WorkflowEvent {
    Start,
    Refresh,
    LocationChecked { enabled: bool },
    PermissionResolved(PermissionOutcome),
    FixObtained(Coordinate),
    FixFailed(LocationError),
    NetworkChecked { available: bool },
    FetchSucceeded(Box<WeatherSnapshot>),
    FetchFailed(FetchError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RenderCached,
    CheckLocationEnabled,
    OpenLocationSettings,
    Notify(String),
    RequestPermission,
    ShowPermissionRationale,
    RequestFix,
    CheckNetwork,
    SetBusy(bool),
    Fetch(Coordinate),
    StoreAndRender(Box<WeatherSnapshot>),
    LogFailure { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: WorkflowState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: WorkflowState, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }

    fn stay(state: &WorkflowState) -> Self {
        Self {
            next: state.clone(),
            effects: Vec::new(),
        }
    }
}

pub fn step(state: &WorkflowState, event: WorkflowEvent) -> Transition {
    use WorkflowEvent as E;
    use WorkflowState as S;

    match (state, event) {
        (s, E::Start) if s.can_begin_run() => Transition::to(
            S::CheckingLocationEnabled,
            vec![Effect::RenderCached, Effect::CheckLocationEnabled],
        ),

        // Refresh assumes location and permission were already granted.
        (s, E::Refresh) if s.can_begin_run() => {
            Transition::to(S::AwaitingFix, vec![Effect::RequestFix])
        }

        (S::CheckingLocationEnabled, E::LocationChecked { enabled: false }) => location_disabled(),

        (S::CheckingLocationEnabled, E::LocationChecked { enabled: true }) => {
            Transition::to(S::AwaitingPermission, vec![Effect::RequestPermission])
        }

        (S::AwaitingPermission, E::PermissionResolved(outcome)) => match outcome {
            PermissionOutcome::Granted => Transition::to(S::AwaitingFix, vec![Effect::RequestFix]),
            PermissionOutcome::PermanentlyDenied => permission_denied(),
            PermissionOutcome::RationaleNeeded => {
                Transition::to(S::PermissionRationale, vec![Effect::ShowPermissionRationale])
            }
        },

        (S::AwaitingFix, E::FixObtained(coordinate)) => {
            Transition::to(S::CheckingNetwork(coordinate), vec![Effect::CheckNetwork])
        }

        (S::AwaitingFix, E::FixFailed(err)) => match err {
            LocationError::Disabled => location_disabled(),
            other => Transition::to(
                S::LocationUnavailable,
                vec![Effect::LogFailure {
                    kind: other.kind(),
                    message: other.to_string(),
                }],
            ),
        },

        (S::CheckingNetwork(_), E::NetworkChecked { available: false }) => {
            Transition::to(S::Offline, Vec::new())
        }

        (S::CheckingNetwork(coordinate), E::NetworkChecked { available: true }) => Transition::to(
            S::Fetching(*coordinate),
            vec![Effect::SetBusy(true), Effect::Fetch(*coordinate)],
        ),

        (S::Fetching(_), E::FetchSucceeded(snapshot)) => Transition::to(
            S::Success,
            vec![Effect::SetBusy(false), Effect::StoreAndRender(snapshot)],
        ),

        (S::Fetching(_), E::FetchFailed(err)) => Transition::to(
            S::Failed(err.kind()),
            vec![
                Effect::SetBusy(false),
                Effect::LogFailure {
                    kind: err.kind(),
                    message: err.to_string(),
                },
            ],
        ),

        (s, _) => Transition::stay(s),
    }
}

fn location_disabled() -> Transition {
    Transition::to(
        WorkflowState::LocationDisabled,
        vec![Effect::Notify(LOCATION_OFF_MESSAGE.to_string()), Effect::OpenLocationSettings],
    )
}

fn permission_denied() -> Transition {
    Transition::to(
        WorkflowState::PermissionDenied,
        vec![Effect::Notify(PERMISSION_DENIED_MESSAGE.to_string())],
    )
}

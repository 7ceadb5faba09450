//! The location-gated fetch-and-cache workflow.
//!
//! [`machine`] holds the transition table. [`WeatherWorkflow`] owns the run
//! state and the collaborators and executes effects until a terminal state
//! is reached. [`WeatherWorkflow::spawn`] moves it onto a task that serves
//! start/refresh requests one run at a time.

pub mod machine;

use std::{collections::VecDeque, sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    cache::WeatherCache,
    display::{DisplayContext, Presenter},
    host::Host,
    location::LocationProvider,
    model::{Coordinate, UnitSystem, WeatherQuery, WeatherSnapshot},
    network::NetworkAvailability,
    provider::WeatherClient,
};

pub use machine::{Effect, Transition, WorkflowEvent, WorkflowState};

pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(30);

const COMMAND_BUFFER: usize = 16;

/// Per-run request parameters.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub api_key: String,
    pub unit_system: UnitSystem,
    pub fix_timeout: Duration,
}

impl WorkflowSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            unit_system: UnitSystem::default(),
            fix_timeout: DEFAULT_FIX_TIMEOUT,
        }
    }
}

/// External services the workflow drives.
#[derive(Clone)]
pub struct Collaborators {
    pub location: Arc<dyn LocationProvider>,
    pub network: Arc<dyn NetworkAvailability>,
    pub client: Arc<dyn WeatherClient>,
    pub host: Arc<dyn Host>,
    pub presenter: Arc<dyn Presenter>,
}

pub struct WeatherWorkflow {
    collaborators: Collaborators,
    cache: WeatherCache,
    display: DisplayContext,
    settings: WorkflowSettings,
    state: WorkflowState,
}

impl WeatherWorkflow {
    pub fn new(
        collaborators: Collaborators,
        cache: WeatherCache,
        display: DisplayContext,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            collaborators,
            cache,
            display,
            settings,
            state: WorkflowState::Idle,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Full run: show the cache, check location and permission, then fetch.
    pub async fn start(&mut self) -> WorkflowState {
        self.drive(WorkflowEvent::Start).await
    }

    /// Manual refresh: straight to the location fix.
    pub async fn refresh(&mut self) -> WorkflowState {
        self.drive(WorkflowEvent::Refresh).await
    }

    /// Paint whatever the cache holds without starting a run.
    pub fn render_cached(&self) -> Option<WeatherSnapshot> {
        let cached = self.cache.load();
        self.render(cached.as_ref());
        cached
    }

    async fn drive(&mut self, trigger: WorkflowEvent) -> WorkflowState {
        let mut pending = VecDeque::from([trigger]);

        while let Some(event) = pending.pop_front() {
            let Transition { next, effects } = machine::step(&self.state, event);

            if next == self.state && effects.is_empty() {
                debug!(state = self.state.name(), "Ignoring event that does not apply");
                continue;
            }

            debug!(from = self.state.name(), to = next.name(), "Workflow transition");
            self.state = next;

            for effect in effects {
                if let Some(follow_up) = self.execute(effect).await {
                    pending.push_back(follow_up);
                }
            }
        }

        info!(state = self.state.name(), "Workflow run finished");
        self.state.clone()
    }

    async fn execute(&self, effect: Effect) -> Option<WorkflowEvent> {
        let c = &self.collaborators;

        match effect {
            Effect::RenderCached => {
                self.render_cached();
                None
            }
            Effect::CheckLocationEnabled => {
                Some(WorkflowEvent::LocationChecked {
                    enabled: c.location.is_enabled().await,
                })
            }
            Effect::OpenLocationSettings => {
                c.host.open_location_settings();
                None
            }
            Effect::Notify(message) => {
                c.host.notify(&message);
                None
            }
            Effect::RequestPermission => {
                Some(WorkflowEvent::PermissionResolved(c.host.request_location_permission().await))
            }
            Effect::ShowPermissionRationale => {
                c.host.show_permission_rationale();
                None
            }
            Effect::RequestFix => {
                match c.location.current_location(self.settings.fix_timeout).await {
                    Ok(coordinate) => {
                        info!(%coordinate, "Got location fix");
                        Some(WorkflowEvent::FixObtained(coordinate))
                    }
                    Err(e) => Some(WorkflowEvent::FixFailed(e)),
                }
            }
            Effect::CheckNetwork => {
                Some(WorkflowEvent::NetworkChecked {
                    available: c.network.is_available().await,
                })
            }
            Effect::SetBusy(busy) => {
                c.presenter.set_busy(busy);
                None
            }
            Effect::Fetch(coordinate) => Some(self.fetch(coordinate).await),
            Effect::StoreAndRender(snapshot) => {
                if let Err(e) = self.cache.save(&snapshot) {
                    warn!("Failed to cache weather snapshot: {e}");
                }
                self.render(Some(&snapshot));
                None
            }
            Effect::LogFailure { kind, message } => {
                error!(%kind, "{message}");
                None
            }
        }
    }

    async fn fetch(&self, coordinate: Coordinate) -> WorkflowEvent {
        let query = WeatherQuery {
            coordinate,
            unit_system: self.settings.unit_system,
            api_key: self.settings.api_key.clone(),
        };

        match self.collaborators.client.fetch(&query).await {
            Ok(snapshot) => {
                info!(
                    location = %snapshot.location_name,
                    condition = snapshot.primary_condition().map(|c| c.main.as_str()).unwrap_or(""),
                    "Fetched current weather"
                );
                WorkflowEvent::FetchSucceeded(Box::new(snapshot))
            }
            Err(e) => WorkflowEvent::FetchFailed(e),
        }
    }

    fn render(&self, snapshot: Option<&WeatherSnapshot>) {
        let country = self.collaborators.host.country_code();
        let display = snapshot.map(|s| self.display.build(s, country.as_deref()));
        self.collaborators.presenter.present(display.as_ref());
    }

    /// Move the workflow onto its own task.
    pub fn spawn(self) -> WorkflowHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(self.state.clone());
        let task = tokio::spawn(serve(self, rx, state_tx));

        WorkflowHandle { tx, state_rx, task }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkflowCommand {
    Start,
    Refresh,
    Stop,
}

/// Handle to a spawned workflow.
///
/// Runs never overlap: requests that arrive while a run is in flight are
/// collapsed into at most one follow-up run. A pending `Start` wins over
/// pending refreshes.
pub struct WorkflowHandle {
    tx: mpsc::Sender<WorkflowCommand>,
    state_rx: watch::Receiver<WorkflowState>,
    task: JoinHandle<WeatherWorkflow>,
}

impl WorkflowHandle {
    /// Request a full run. Returns `false` if the workflow has stopped.
    pub async fn start(&self) -> bool {
        self.tx.send(WorkflowCommand::Start).await.is_ok()
    }

    /// Request a manual refresh. Returns `false` if the workflow has stopped.
    pub async fn refresh(&self) -> bool {
        self.tx.send(WorkflowCommand::Refresh).await.is_ok()
    }

    /// State at the end of the most recent run.
    pub fn state(&self) -> WorkflowState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state_rx.clone()
    }

    /// Finish queued work, stop the task and hand the workflow back.
    pub async fn stop(self) -> Option<WeatherWorkflow> {
        let _ = self.tx.send(WorkflowCommand::Stop).await;
        drop(self.tx);

        match self.task.await {
            Ok(workflow) => Some(workflow),
            Err(e) => {
                error!("Workflow task failed: {e}");
                None
            }
        }
    }
}

async fn serve(
    mut workflow: WeatherWorkflow,
    mut rx: mpsc::Receiver<WorkflowCommand>,
    state_tx: watch::Sender<WorkflowState>,
) -> WeatherWorkflow {
    info!("Workflow service started");

    let mut queued = None;
    let mut stop_requested = false;

    loop {
        let command = match queued.take() {
            Some(command) => command,
            None if stop_requested => break,
            None => match rx.recv().await {
                Some(command) => command,
                None => break,
            },
        };

        let state = match command {
            WorkflowCommand::Start => workflow.start().await,
            WorkflowCommand::Refresh => workflow.refresh().await,
            WorkflowCommand::Stop => break,
        };
        state_tx.send_replace(state);

        let (next, stop) = drain_pending(&mut rx);
        queued = next;
        stop_requested |= stop;
    }

    info!("Workflow service stopped");
    workflow
}

/// Collapse everything queued during a run into at most one command.
fn drain_pending(rx: &mut mpsc::Receiver<WorkflowCommand>) -> (Option<WorkflowCommand>, bool) {
    let mut next = None;
    let mut stop = false;
    let mut coalesced = 0usize;

    while let Ok(command) = rx.try_recv() {
        match command {
            WorkflowCommand::Stop => stop = true,
            WorkflowCommand::Start => next = Some(WorkflowCommand::Start),
            WorkflowCommand::Refresh => {
                next.get_or_insert(WorkflowCommand::Refresh);
            }
        }
        coalesced += 1;
    }

    if coalesced > 1 {
        debug!(coalesced, "Coalesced requests queued during a run");
    }

    (next, stop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_prefers_start_and_reports_stop() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(WorkflowCommand::Refresh).await.unwrap();
        tx.send(WorkflowCommand::Start).await.unwrap();
        tx.send(WorkflowCommand::Refresh).await.unwrap();
        tx.send(WorkflowCommand::Stop).await.unwrap();

        assert_eq!(drain_pending(&mut rx), (Some(WorkflowCommand::Start), true));
        assert_eq!(drain_pending(&mut rx), (None, false));
    }

    #[tokio::test]
    async fn drain_collapses_refreshes() {
        let (tx, mut rx) = mpsc::channel(8);
        for _ in 0..3 {
            tx.send(WorkflowCommand::Refresh).await.unwrap();
        }

        assert_eq!(drain_pending(&mut rx), (Some(WorkflowCommand::Refresh), false));
    }
}

//! Resident dashboard: polled list of communication requests for one house.

use std::sync::Arc;
use std::time::Duration;

use settle_core::{
    AsyncController, AsyncState, Catcher, Controller, Interval, OnMount, PendingHandle,
};
use tokio::sync::watch;
use tracing::warn;

use crate::api::{ApiError, Backend};
use crate::models::{CommunicationRequest, RequestStatus};

type Requests = Vec<CommunicationRequest>;
type RequestController = AsyncController<(), Requests, ApiError>;

/// What a resident can do with a request in its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    /// Accept or reject a pending request.
    Validate,
    /// Join the chat of an accepted request.
    EnterChat,
}

impl RequestAction {
    #[must_use]
    pub fn for_request(request: &CommunicationRequest) -> Option<Self> {
        match request.status {
            RequestStatus::Pending => Some(Self::Validate),
            RequestStatus::Accepted => Some(Self::EnterChat),
            RequestStatus::Rejected | RequestStatus::Unknown => None,
        }
    }
}

/// Communication requests of one house, loaded on start and re-polled on a
/// fixed period. Every failed load is logged once.
pub struct RequestBoard {
    house_id: String,
    controller: OnMount<Catcher<Interval<RequestController>>>,
}

impl RequestBoard {
    /// Creates the board and arms polling. Loading starts with [`RequestBoard::start`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime with a non-zero period.
    pub fn new(backend: Arc<dyn Backend>, house_id: impl Into<String>, poll: Duration) -> Self {
        let house_id = house_id.into();

        let house = house_id.clone();
        let controller = AsyncController::new(move |()| {
            let backend = Arc::clone(&backend);
            let house = house.clone();
            async move { backend.communication_requests(&house).await }
        });

        let house = house_id.clone();
        let caught = Catcher::new(Interval::new(controller, poll), move |error: &ApiError| {
            warn!(house_id = %house, %error, "failed to load communication requests");
        });

        Self {
            house_id,
            controller: OnMount::new(caught),
        }
    }

    /// Performs the initial load. Only the first call has an effect.
    pub fn start(&self) -> Option<PendingHandle<Requests, ApiError>> {
        self.controller.activate()
    }

    /// Loads now and restarts the polling clock.
    pub fn refresh(&self) -> PendingHandle<Requests, ApiError> {
        self.controller.invoke(())
    }

    /// Changes the polling period. Zero stops polling.
    pub fn set_poll_interval(&self, period: Duration) {
        self.interval().set_period(period);
    }

    /// Stops polling for good.
    pub fn stop(&self) {
        self.interval().teardown();
    }

    #[must_use]
    pub fn state(&self) -> AsyncState<Requests, ApiError> {
        self.controller.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AsyncState<Requests, ApiError>> {
        self.controller.subscribe()
    }

    #[must_use]
    pub fn house_id(&self) -> &str {
        &self.house_id
    }

    fn interval(&self) -> &Interval<RequestController> {
        self.controller.inner().inner()
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::sleep;

    use super::*;
    use crate::session::tests::FakeBackend;

    fn request(id: &str, status: RequestStatus) -> CommunicationRequest {
        CommunicationRequest {
            id: id.to_string(),
            visitor_name: "Ana".to_string(),
            status,
        }
    }

    fn fake(requests: Result<Requests, ApiError>) -> Arc<FakeBackend> {
        let backend = FakeBackend::default();
        *backend.requests.lock() = requests;
        Arc::new(backend)
    }

    fn request_calls(backend: &FakeBackend) -> usize {
        backend
            .calls
            .lock()
            .iter()
            .filter(|call| call.starts_with("requests"))
            .count()
    }

    #[test]
    fn actions_follow_status() {
        assert_eq!(
            RequestAction::for_request(&request("a", RequestStatus::Pending)),
            Some(RequestAction::Validate)
        );
        assert_eq!(
            RequestAction::for_request(&request("b", RequestStatus::Accepted)),
            Some(RequestAction::EnterChat)
        );
        assert_eq!(
            RequestAction::for_request(&request("c", RequestStatus::Rejected)),
            None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn start_loads_once_then_polls() {
        let backend = fake(Ok(vec![request("r1", RequestStatus::Pending)]));
        let board = RequestBoard::new(
            Arc::clone(&backend) as Arc<dyn Backend>,
            "h1",
            Duration::from_millis(100),
        );
        assert_eq!(board.house_id(), "h1");

        board.start().unwrap().await.unwrap();
        assert!(board.start().is_none());
        assert_eq!(board.state().data.map(|r| r.len()), Some(1));

        sleep(Duration::from_millis(250)).await;
        assert_eq!(request_calls(&backend), 3);
        assert!(backend.calls.lock().iter().all(|call| call == "requests h1"));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_surface_in_state_and_clear_on_success() {
        let backend = fake(Err(ApiError::Status {
            status: 503,
            body: "down".to_string(),
        }));
        let board = RequestBoard::new(
            Arc::clone(&backend) as Arc<dyn Backend>,
            "h1",
            Duration::ZERO,
        );

        assert!(board.start().unwrap().await.is_err());
        assert!(matches!(
            board.state().error,
            Some(ApiError::Status { status: 503, .. })
        ));

        *backend.requests.lock() = Ok(Vec::new());
        board.refresh().await.unwrap();
        let state = board.state();
        assert!(state.error.is_none());
        assert_eq!(state.data, Some(Vec::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_polling() {
        let backend = fake(Ok(Vec::new()));
        let board = RequestBoard::new(
            Arc::clone(&backend) as Arc<dyn Backend>,
            "h1",
            Duration::from_millis(100),
        );

        sleep(Duration::from_millis(150)).await;
        board.stop();
        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(request_calls(&backend), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_interval_can_be_changed() {
        let backend = fake(Ok(Vec::new()));
        let board = RequestBoard::new(
            Arc::clone(&backend) as Arc<dyn Backend>,
            "h1",
            Duration::ZERO,
        );

        sleep(Duration::from_millis(500)).await;
        assert_eq!(request_calls(&backend), 0);

        board.set_poll_interval(Duration::from_millis(100));
        sleep(Duration::from_millis(350)).await;
        assert_eq!(request_calls(&backend), 3);
    }
}

//! Visitor-side flow: identify as a provider, pick a house, create a request.
//!
//! The selection lives in an explicit [`CommunicationFlow`] value owned by
//! the caller. The house list is loaded through an [`OnChange`] controller
//! keyed on the selected provider, so re-selecting the same provider does
//! not refetch.

use std::sync::Arc;

use settle_core::{AsyncController, AsyncState, Controller, InvokeError, OnChange, PendingHandle};
use tracing::debug;

use crate::api::{ApiError, Backend};
use crate::models::{House, NewCommunicationRequest, Provider};

/// Errors from the visitor flow.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("select a {0} first")]
    Incomplete(&'static str),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("house list load ended before settling")]
    Interrupted,
}

impl From<InvokeError<ApiError>> for FlowError {
    fn from(error: InvokeError<ApiError>) -> Self {
        match error {
            InvokeError::Failed(error) => Self::Api(error),
            InvokeError::Dropped { .. } => Self::Interrupted,
        }
    }
}

type HouseController = AsyncController<String, Vec<House>, ApiError>;

/// Provider and house selected by a visitor, plus the provider's house list.
pub struct CommunicationFlow {
    backend: Arc<dyn Backend>,
    provider: Option<Provider>,
    house: Option<House>,
    houses: OnChange<HouseController>,
}

impl CommunicationFlow {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let loader = Arc::clone(&backend);
        let houses = OnChange::new(AsyncController::new(move |provider_id: String| {
            let backend = Arc::clone(&loader);
            async move { backend.houses_for_provider(&provider_id).await }
        }));
        Self {
            backend,
            provider: None,
            house: None,
            houses,
        }
    }

    /// Resolves a provider from its access code, selects it and returns its
    /// houses. The house list is requested at most once per provider change.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is rejected or the house list cannot be loaded.
    pub async fn choose_provider(&mut self, code: &str) -> Result<Vec<House>, FlowError> {
        let provider = self.backend.validate_provider(code).await?;
        let load = match self.select_provider(provider) {
            Some(load) => load,
            None => match self.houses().data {
                Some(houses) => return Ok(houses),
                None => self.refresh_houses(),
            },
        };
        Ok(load.await?)
    }

    /// Selects a provider. Returns the house-list invocation when the
    /// provider differs from the one the list was last loaded for.
    pub fn select_provider(
        &mut self,
        provider: Provider,
    ) -> Option<PendingHandle<Vec<House>, ApiError>> {
        debug!(provider_id = %provider.id, "provider selected");
        let provider_id = provider.id.clone();
        self.provider = Some(provider);
        self.houses.evaluate(Some(provider_id))
    }

    /// Reloads the house list for the current provider.
    pub fn refresh_houses(&self) -> PendingHandle<Vec<House>, ApiError> {
        self.houses.refetch()
    }

    /// State of the house list.
    #[must_use]
    pub fn houses(&self) -> AsyncState<Vec<House>, ApiError> {
        self.houses.state()
    }

    pub fn select_house(&mut self, house: House) {
        debug!(house_id = %house.id, "house selected");
        self.house = Some(house);
    }

    #[must_use]
    pub fn provider(&self) -> Option<&Provider> {
        self.provider.as_ref()
    }

    #[must_use]
    pub fn house(&self) -> Option<&House> {
        self.house.as_ref()
    }

    /// Builds the creation payload from the current selection.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Incomplete`] until both a provider and a house are selected.
    pub fn draft(
        &self,
        visitor_name: &str,
        visitor_contact: &str,
        initial_message: &str,
    ) -> Result<NewCommunicationRequest, FlowError> {
        let provider = self.provider.as_ref().ok_or(FlowError::Incomplete("provider"))?;
        let house = self.house.as_ref().ok_or(FlowError::Incomplete("house"))?;
        Ok(NewCommunicationRequest {
            provider_id: provider.id.clone(),
            house_id: house.id.clone(),
            visitor_name: visitor_name.to_string(),
            visitor_contact: visitor_contact.to_string(),
            initial_message: initial_message.to_string(),
        })
    }

    /// Creates the communication request.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is incomplete or the backend rejects the request.
    pub async fn create_request(
        &self,
        visitor_name: &str,
        visitor_contact: &str,
        initial_message: &str,
    ) -> Result<NewCommunicationRequest, FlowError> {
        let request = self.draft(visitor_name, visitor_contact, initial_message)?;
        self.backend.create_communication_request(&request).await?;
        Ok(request)
    }
}

//! Resolution of error coordinates to documentation locations.
//!
//! # Outcomes
//!
//! | Outcome           | Future resolves to      | Terminal event               |
//! |-------------------|-------------------------|------------------------------|
//! | Found             | `Ok(Some(location))`    | `DescriptionLocationFor`     |
//! | Not found         | `Ok(None)`              | `WithoutDescriptionLocation` |
//! | Upstream failure  | `Err(LookupError)`      | none                         |
//! | Future dropped    | (never resolves)        | none                         |
//!
//! The terminal event is published before the future resolves, so a
//! subscriber never sees a result without its event.

use crate::config::EventsConfig;
use crate::errors::LookupError;
use crate::events::Event;
use crate::lookup::{DescriptionLookup, DescriptionStream};
use crate::publisher::{DEFAULT_BUFFER, EventBus, EventPublisher, Subscription};
use crate::types::{
    ErrorCode, ErrorCoordinates, ErrorDescriptionLocation, InvocationContext, PlatformEdition,
    ReleaseVersion,
};
use futures::FutureExt;
use futures::StreamExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Deferred result of a single resolution.
pub type Resolution = BoxFuture<'static, Result<Option<ErrorDescriptionLocation>, LookupError>>;

/// Resolves error coordinates to at most one description location and
/// reports each completed resolution to its subscribers.
pub trait ErrorDescriptionService: EventPublisher<Event> + Send + Sync {
    /// Resolve the location documenting an error.
    ///
    /// Returns immediately. The lookup runs when the returned future is
    /// first polled; dropping the future cancels it.
    fn description_location_for(
        &self,
        error_code: ErrorCode,
        release_version: ReleaseVersion,
        platform_edition: PlatformEdition,
        invocation_context: InvocationContext,
    ) -> Resolution;

    /// Release subscribers and stop publishing. Idempotent.
    ///
    /// Resolutions already in flight still complete, without an event.
    fn close(&self);
}

/// [`ErrorDescriptionService`] backed by a [`DescriptionLookup`].
///
/// Each subscriber buffers up to [`EventsConfig::buffer`] events. One that
/// reads slower than resolutions complete lags and skips the missed events;
/// resolutions are never held back by it.
pub struct DescriptionResolver {
    lookup: Arc<dyn DescriptionLookup>,
    events: EventBus<Event>,
}

impl DescriptionResolver {
    pub fn new(lookup: impl DescriptionLookup + 'static) -> Self {
        Self::with_buffer(lookup, DEFAULT_BUFFER)
    }

    pub fn with_config(lookup: impl DescriptionLookup + 'static, config: &EventsConfig) -> Self {
        Self::with_buffer(lookup, config.buffer)
    }

    fn with_buffer(lookup: impl DescriptionLookup + 'static, buffer: usize) -> Self {
        Self {
            lookup: Arc::new(lookup),
            events: EventBus::new(buffer),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }
}

impl EventPublisher<Event> for DescriptionResolver {
    fn subscribe(&self) -> Subscription<Event> {
        self.events.subscribe()
    }
}

impl ErrorDescriptionService for DescriptionResolver {
    fn description_location_for(
        &self,
        error_code: ErrorCode,
        release_version: ReleaseVersion,
        platform_edition: PlatformEdition,
        invocation_context: InvocationContext,
    ) -> Resolution {
        let lookup = Arc::clone(&self.lookup);
        let events = self.events.clone();

        async move {
            let coordinates = ErrorCoordinates::new(error_code, release_version, platform_edition);
            let invocation_id = invocation_context.invocation_id();
            debug!(%coordinates, %invocation_id, "resolving error description location");

            let candidates =
                lookup.descriptions_for(coordinates.code().clone(), invocation_context.clone());
            let location = match first_match(candidates, &coordinates).await {
                Ok(location) => location,
                Err(err) => {
                    warn!(%coordinates, %invocation_id, error = %err, "description lookup failed");
                    return Err(err);
                }
            };

            let found = location.is_some();
            let delivered = events.publish(Event::completed(
                coordinates.clone(),
                location.clone(),
                invocation_context,
            ));
            debug!(%coordinates, %invocation_id, found, delivered, "resolution completed");

            Ok(location)
        }
        .boxed()
    }

    fn close(&self) {
        if self.events.close() {
            debug!("error description service closed");
        }
    }
}

impl Drop for DescriptionResolver {
    fn drop(&mut self) {
        ErrorDescriptionService::close(self);
    }
}

/// First candidate describing exactly `coordinates`.
///
/// Stops pulling from the stream as soon as a match is found. An upstream
/// error seen before that ends the search.
async fn first_match(
    mut candidates: DescriptionStream,
    coordinates: &ErrorCoordinates,
) -> Result<Option<ErrorDescriptionLocation>, LookupError> {
    while let Some(candidate) = candidates.next().await {
        let candidate = candidate?;
        if candidate.coordinates() == coordinates {
            return Ok(Some(candidate.into_location()));
        }
        trace!(
            requested = %coordinates,
            candidate = %candidate.coordinates(),
            "skipping description for other coordinates"
        );
    }
    Ok(None)
}

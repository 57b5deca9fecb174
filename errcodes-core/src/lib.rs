//! Error description resolution.
//!
//! Resolves an error's coordinates (code, release version, platform edition)
//! to the location of its documentation, and publishes a lifecycle event for
//! every completed resolution.
//!
//! # Example
//!
//! ```ignore
//! use errcodes_core::{DescriptionResolver, ErrorDescriptionService, EventPublisher};
//!
//! let service = DescriptionResolver::new(lookup);
//! let mut events = service.subscribe();
//! let location = service
//!     .description_location_for(code, version, edition, InvocationContext::new("cli"))
//!     .await?;
//! ```

pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod lookup;
pub mod publisher;
pub mod service;
pub mod testing;
pub mod types;

pub use config::{EventsConfig, LoggingConfig, ServiceConfig};
pub use errors::{DomainError, LookupError};
pub use events::{Event, EventId, EventKind};
pub use logging::init_logging;
pub use lookup::{DescriptionLookup, DescriptionStream};
pub use publisher::{EventBus, EventPublisher, Subscription};
pub use service::{DescriptionResolver, ErrorDescriptionService, Resolution};
pub use types::{
    ErrorCode, ErrorCoordinates, ErrorDescription, ErrorDescriptionLocation, InvocationContext,
    InvocationId, PlatformEdition, ReleaseVersion,
};

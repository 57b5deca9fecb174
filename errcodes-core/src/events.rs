//! Lifecycle events published by the error description resolver.
//!
//! Events form a closed hierarchy:
//!
//! ```text
//! Invocation
//! └── Completed
//!     └── DescriptionLocationFor          (location present)
//!         └── WithoutDescriptionLocation  (location absent)
//! ```
//!
//! Only the two leaves are ever constructed. [`EventKind`] lets subscribers
//! match on an intermediate level (`event.is(EventKind::Completed)`) without
//! naming every leaf.
//!
//! The `Display` rendering is for diagnostics. Nothing parses it back.

use crate::types::{ErrorCoordinates, ErrorDescriptionLocation, InvocationContext};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Marker rendered in place of an absent location.
const ABSENT: &str = "<none>";

/// Unique, time-ordered event identifier.
///
/// Backed by a UUID v7, so ids sort roughly by creation time and never collide.
/// They are not sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EventId {
    value: Uuid,
    created_at: DateTime<Utc>,
}

impl EventId {
    pub fn new() -> Self {
        Self {
            value: Uuid::now_v7(),
            created_at: Utc::now(),
        }
    }

    pub fn value(&self) -> &Uuid {
        &self.value
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Level in the event hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Invocation,
    Completed,
    DescriptionLocationFor,
    WithoutDescriptionLocation,
}

impl EventKind {
    /// The enclosing level, or `None` for the root.
    pub fn parent(self) -> Option<EventKind> {
        match self {
            Self::Invocation => None,
            Self::Completed => Some(Self::Invocation),
            Self::DescriptionLocationFor => Some(Self::Completed),
            Self::WithoutDescriptionLocation => Some(Self::DescriptionLocationFor),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Invocation => "Invocation",
            Self::Completed => "Completed",
            Self::DescriptionLocationFor => "DescriptionLocationFor",
            Self::WithoutDescriptionLocation => "WithoutDescriptionLocation",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something the resolver did. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A resolution completed and found a location.
    DescriptionLocationFor {
        id: EventId,
        invocation_context: InvocationContext,
        error_coordinates: ErrorCoordinates,
        location: ErrorDescriptionLocation,
    },
    /// A resolution completed without finding a location.
    WithoutDescriptionLocation {
        id: EventId,
        invocation_context: InvocationContext,
        error_coordinates: ErrorCoordinates,
    },
}

impl Event {
    pub fn description_location_for(
        error_coordinates: ErrorCoordinates,
        location: ErrorDescriptionLocation,
        invocation_context: InvocationContext,
    ) -> Self {
        Self::DescriptionLocationFor {
            id: EventId::new(),
            invocation_context,
            error_coordinates,
            location,
        }
    }

    pub fn without_description_location(
        error_coordinates: ErrorCoordinates,
        invocation_context: InvocationContext,
    ) -> Self {
        Self::WithoutDescriptionLocation {
            id: EventId::new(),
            invocation_context,
            error_coordinates,
        }
    }

    /// Terminal event for a resolution outcome.
    pub fn completed(
        error_coordinates: ErrorCoordinates,
        location: Option<ErrorDescriptionLocation>,
        invocation_context: InvocationContext,
    ) -> Self {
        match location {
            Some(location) => {
                Self::description_location_for(error_coordinates, location, invocation_context)
            }
            None => Self::without_description_location(error_coordinates, invocation_context),
        }
    }

    /// Most specific level of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::DescriptionLocationFor { .. } => EventKind::DescriptionLocationFor,
            Self::WithoutDescriptionLocation { .. } => EventKind::WithoutDescriptionLocation,
        }
    }

    /// Whether this event belongs to `kind` or one of its descendants.
    pub fn is(&self, kind: EventKind) -> bool {
        let mut current = Some(self.kind());
        while let Some(level) = current {
            if level == kind {
                return true;
            }
            current = level.parent();
        }
        false
    }

    pub fn id(&self) -> &EventId {
        match self {
            Self::DescriptionLocationFor { id, .. } | Self::WithoutDescriptionLocation { id, .. } => {
                id
            }
        }
    }

    pub fn invocation_context(&self) -> &InvocationContext {
        match self {
            Self::DescriptionLocationFor {
                invocation_context, ..
            }
            | Self::WithoutDescriptionLocation {
                invocation_context, ..
            } => invocation_context,
        }
    }

    pub fn error_coordinates(&self) -> &ErrorCoordinates {
        match self {
            Self::DescriptionLocationFor {
                error_coordinates, ..
            }
            | Self::WithoutDescriptionLocation {
                error_coordinates, ..
            } => error_coordinates,
        }
    }

    pub fn location(&self) -> Option<&ErrorDescriptionLocation> {
        match self {
            Self::DescriptionLocationFor { location, .. } => Some(location),
            Self::WithoutDescriptionLocation { .. } => None,
        }
    }

    /// Single-line JSON form for log sinks.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Key-value pairs for diagnostics, root level first.
    fn elements(&self) -> Vec<(&'static str, String)> {
        // Every event is an invocation event.
        let mut elements = vec![
            ("id", self.id().to_string()),
            ("created_at", self.id().created_at().to_rfc3339()),
            (
                "invocation_context",
                self.invocation_context().description().to_string(),
            ),
        ];

        // Every concrete event completes with coordinates.
        let coordinates = self.error_coordinates();
        elements.push(("error_code", coordinates.code().to_string()));
        elements.push(("release_version", coordinates.release_version().description()));
        elements.push((
            "platform_edition",
            coordinates.platform_edition().description().to_string(),
        ));
        elements.push((
            "location",
            self.location()
                .map(|location| location.to_string())
                .unwrap_or_else(|| ABSENT.to_string()),
        ));

        elements
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.kind())?;
        for (idx, (key, value)) in self.elements().iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("]")
    }
}

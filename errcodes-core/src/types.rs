//! Domain value objects shared by the resolver, its lookup and its events.

use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

/// Identifier for a class of error raised by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ErrorCode(String);

impl ErrorCode {
    /// Build an error code, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::BlankErrorCode);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Semantic version of the platform release that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReleaseVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ReleaseVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// `major.minor.patch`, the form used in documentation paths.
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ReleaseVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| DomainError::InvalidReleaseVersion {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(invalid("expected major.minor.patch"));
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("components must be unsigned integers"));
            }
            *slot = part
                .parse()
                .map_err(|_| invalid("component out of range"))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

/// Product edition of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformEdition {
    #[serde(rename = "OS")]
    OpenSource,
    #[serde(rename = "ENT")]
    Enterprise,
}

impl PlatformEdition {
    /// Short form used in documentation paths.
    pub fn description(&self) -> &'static str {
        match self {
            Self::OpenSource => "OS",
            Self::Enterprise => "ENT",
        }
    }
}

impl fmt::Display for PlatformEdition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl FromStr for PlatformEdition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "os" | "opensource" | "open_source" => Ok(Self::OpenSource),
            "ent" | "enterprise" => Ok(Self::Enterprise),
            _ => Err(DomainError::UnknownPlatformEdition {
                value: s.to_string(),
            }),
        }
    }
}

/// Lookup key for an error description. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCoordinates {
    code: ErrorCode,
    release_version: ReleaseVersion,
    platform_edition: PlatformEdition,
}

impl ErrorCoordinates {
    pub fn new(
        code: ErrorCode,
        release_version: ReleaseVersion,
        platform_edition: PlatformEdition,
    ) -> Self {
        Self {
            code,
            release_version,
            platform_edition,
        }
    }

    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    pub fn release_version(&self) -> ReleaseVersion {
        self.release_version
    }

    pub fn platform_edition(&self) -> PlatformEdition {
        self.platform_edition
    }
}

impl fmt::Display for ErrorCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}/{}",
            self.code, self.platform_edition, self.release_version
        )
    }
}

/// Unique identifier for a single resolver invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who asked for a resolution and why. Used for audit and diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    invocation_id: InvocationId,
    description: String,
}

impl InvocationContext {
    /// Context with a freshly generated invocation id.
    pub fn new(description: impl Into<String>) -> Self {
        Self::with_id(InvocationId::new(), description)
    }

    pub fn with_id(invocation_id: InvocationId, description: impl Into<String>) -> Self {
        Self {
            invocation_id,
            description: description.into(),
        }
    }

    pub fn invocation_id(&self) -> InvocationId {
        self.invocation_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Where documentation for an error lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorDescriptionLocation {
    /// Externally hosted documentation.
    External { uri: Url },
}

impl ErrorDescriptionLocation {
    /// Parse an absolute URI into an external location.
    pub fn external(uri: &str) -> Result<Self, DomainError> {
        let uri = Url::parse(uri).map_err(|e| DomainError::InvalidLocation {
            value: uri.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::External { uri })
    }

    pub fn uri(&self) -> &Url {
        match self {
            Self::External { uri } => uri,
        }
    }
}

impl fmt::Display for ErrorDescriptionLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri().as_str())
    }
}

/// A location paired with the coordinates it documents, as returned by lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescription {
    location: ErrorDescriptionLocation,
    coordinates: ErrorCoordinates,
}

impl ErrorDescription {
    pub fn new(location: ErrorDescriptionLocation, coordinates: ErrorCoordinates) -> Self {
        Self {
            location,
            coordinates,
        }
    }

    pub fn location(&self) -> &ErrorDescriptionLocation {
        &self.location
    }

    pub fn coordinates(&self) -> &ErrorCoordinates {
        &self.coordinates
    }

    pub fn into_location(self) -> ErrorDescriptionLocation {
        self.location
    }
}

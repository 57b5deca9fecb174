//! Shared fixtures for resolver integration tests.

#![allow(dead_code)]

use errcodes_core::{
    ErrorCode, ErrorCoordinates, ErrorDescription, ErrorDescriptionLocation, PlatformEdition,
    ReleaseVersion,
};

pub use errcodes_core::testing::init_test_logging;

pub const ERROR_CODE: &str = "123jdazz";
pub const LOCATION: &str = "https://thisisatest/boom";

pub fn error_code() -> ErrorCode {
    ErrorCode::new(ERROR_CODE).expect("fixture error code is not blank")
}

pub fn release() -> ReleaseVersion {
    ReleaseVersion::new(4, 3, 1)
}

pub fn coordinates(edition: PlatformEdition) -> ErrorCoordinates {
    ErrorCoordinates::new(error_code(), release(), edition)
}

pub fn location(uri: &str) -> ErrorDescriptionLocation {
    ErrorDescriptionLocation::external(uri).expect("fixture uri is absolute")
}

pub fn description(coordinates: ErrorCoordinates, uri: &str) -> ErrorDescription {
    ErrorDescription::new(location(uri), coordinates)
}

//! Test support: structured test logging and a scriptable description lookup.

pub mod log;
pub mod lookup;

pub use log::init_test_logging;
pub use lookup::StubLookup;

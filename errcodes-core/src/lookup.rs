//! Contract for the backing store the resolver queries.

use crate::errors::LookupError;
use crate::types::{ErrorCode, ErrorDescription, InvocationContext};
use futures::stream::BoxStream;

/// Lazy sequence of candidate descriptions produced by a lookup.
///
/// The resolver pulls only as many elements as it needs and drops the stream
/// afterwards, so implementations should do their work on demand.
pub type DescriptionStream = BoxStream<'static, Result<ErrorDescription, LookupError>>;

/// Backing lookup from an error code to candidate descriptions.
///
/// Candidates may describe other coordinates than the ones being resolved
/// (a lookup is free to answer a broader query); the resolver filters them.
/// Any `Fn(ErrorCode, InvocationContext) -> DescriptionStream` closure is a
/// lookup.
pub trait DescriptionLookup: Send + Sync {
    fn descriptions_for(
        &self,
        error_code: ErrorCode,
        invocation_context: InvocationContext,
    ) -> DescriptionStream;
}

impl<F> DescriptionLookup for F
where
    F: Fn(ErrorCode, InvocationContext) -> DescriptionStream + Send + Sync,
{
    fn descriptions_for(
        &self,
        error_code: ErrorCode,
        invocation_context: InvocationContext,
    ) -> DescriptionStream {
        self(error_code, invocation_context)
    }
}

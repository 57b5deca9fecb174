//! Scriptable [`DescriptionLookup`] for tests.

use crate::errors::LookupError;
use crate::lookup::{DescriptionLookup, DescriptionStream};
use crate::types::{ErrorCode, ErrorDescription, InvocationContext};
use futures::StreamExt;
use futures::stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
enum Script {
    Items(Vec<Result<ErrorDescription, LookupError>>),
    /// Yields the items, then never completes.
    ThenPending(Vec<Result<ErrorDescription, LookupError>>),
}

/// Lookup that replays a fixed sequence and records how it was used.
///
/// Clones share their counters, so keep one clone to inspect after handing
/// the other to a resolver.
#[derive(Clone)]
pub struct StubLookup {
    script: Script,
    calls: Arc<AtomicUsize>,
    pulled: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(ErrorCode, InvocationContext)>>>,
}

impl StubLookup {
    fn scripted(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            pulled: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Yields `descriptions` in order.
    pub fn returning(descriptions: impl IntoIterator<Item = ErrorDescription>) -> Self {
        Self::scripted(Script::Items(descriptions.into_iter().map(Ok).collect()))
    }

    pub fn empty() -> Self {
        Self::sequence(Vec::new())
    }

    /// Yields each item in order, failures included.
    pub fn sequence(items: Vec<Result<ErrorDescription, LookupError>>) -> Self {
        Self::scripted(Script::Items(items))
    }

    pub fn failing(error: LookupError) -> Self {
        Self::sequence(vec![Err(error)])
    }

    /// Never yields anything.
    pub fn pending() -> Self {
        Self::scripted(Script::ThenPending(Vec::new()))
    }

    /// Yields `descriptions`, then stalls forever instead of ending.
    pub fn returning_then_pending(descriptions: impl IntoIterator<Item = ErrorDescription>) -> Self {
        Self::scripted(Script::ThenPending(
            descriptions.into_iter().map(Ok).collect(),
        ))
    }

    /// How many times the lookup was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// How many stream elements were pulled across all invocations.
    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }

    /// Arguments of every invocation, oldest first.
    pub fn requests(&self) -> Vec<(ErrorCode, InvocationContext)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DescriptionLookup for StubLookup {
    fn descriptions_for(
        &self,
        error_code: ErrorCode,
        invocation_context: InvocationContext,
    ) -> DescriptionStream {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((error_code, invocation_context));

        let pulled = Arc::clone(&self.pulled);
        let count = move |_: &Result<ErrorDescription, LookupError>| {
            pulled.fetch_add(1, Ordering::SeqCst);
        };

        match self.script.clone() {
            Script::Items(items) => stream::iter(items).inspect(count).boxed(),
            Script::ThenPending(items) => stream::iter(items)
                .chain(stream::pending())
                .inspect(count)
                .boxed(),
        }
    }
}

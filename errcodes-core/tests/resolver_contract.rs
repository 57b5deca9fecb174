//! Resolution contract: outcomes, terminal events, laziness and cancellation.

mod common;

use common::*;
use errcodes_core::testing::StubLookup;
use errcodes_core::{
    DescriptionResolver, ErrorDescriptionService, EventKind, EventPublisher, InvocationContext,
    LookupError, PlatformEdition,
};
use futures::StreamExt;
use futures::stream;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

#[tokio::test]
async fn found_location_is_resolved_with_one_found_event() {
    init_test_logging();
    let coords = coordinates(PlatformEdition::OpenSource);
    let lookup = StubLookup::returning([description(coords.clone(), LOCATION)]);
    let service = DescriptionResolver::new(lookup.clone());
    let mut events = service.subscribe();
    let context = InvocationContext::new("GET /editions/OS/releases/4.3.1/errors/123jdazz");

    let resolved = service
        .description_location_for(
            error_code(),
            release(),
            PlatformEdition::OpenSource,
            context.clone(),
        )
        .await
        .expect("lookup should not fail")
        .expect("location should be found");

    assert_eq!(resolved.uri().as_str(), LOCATION);

    let event = events.try_recv().expect("found event published");
    assert_eq!(event.kind(), EventKind::DescriptionLocationFor);
    assert_eq!(event.error_coordinates(), &coords);
    assert_eq!(event.location(), Some(&resolved));
    assert_eq!(event.invocation_context(), &context);
    assert!(events.try_recv().is_none(), "exactly one terminal event");

    let requests = lookup.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, error_code());
    assert_eq!(requests[0].1, context);
}

#[tokio::test]
async fn empty_lookup_resolves_to_none_with_one_absent_event() {
    init_test_logging();
    let service = DescriptionResolver::new(StubLookup::empty());
    let mut events = service.subscribe();

    let resolved = service
        .description_location_for(
            error_code(),
            release(),
            PlatformEdition::Enterprise,
            InvocationContext::new("test"),
        )
        .await
        .expect("lookup should not fail");

    assert!(resolved.is_none());

    let event = events.try_recv().expect("absent event published");
    assert_eq!(event.kind(), EventKind::WithoutDescriptionLocation);
    assert!(event.is(EventKind::Completed));
    assert_eq!(
        event.error_coordinates(),
        &coordinates(PlatformEdition::Enterprise)
    );
    assert!(event.location().is_none());
    assert!(events.try_recv().is_none());
}

#[tokio::test]
async fn non_matching_descriptions_resolve_to_none() {
    init_test_logging();
    let lookup = StubLookup::returning([
        description(coordinates(PlatformEdition::OpenSource), LOCATION),
        description(
            errcodes_core::ErrorCoordinates::new(
                error_code(),
                errcodes_core::ReleaseVersion::new(4, 3, 0),
                PlatformEdition::Enterprise,
            ),
            "https://docs.example/older",
        ),
    ]);
    let service = DescriptionResolver::new(lookup.clone());
    let mut events = service.subscribe();

    let resolved = service
        .description_location_for(
            error_code(),
            release(),
            PlatformEdition::Enterprise,
            InvocationContext::new("test"),
        )
        .await
        .unwrap();

    assert!(resolved.is_none());
    assert_eq!(lookup.pulled(), 2, "every candidate inspected before giving up");
    let event = events.try_recv().unwrap();
    assert_eq!(event.kind(), EventKind::WithoutDescriptionLocation);
    assert!(events.try_recv().is_none());
}

#[tokio::test]
async fn first_of_several_matches_wins_without_pulling_the_rest() {
    init_test_logging();
    let coords = coordinates(PlatformEdition::OpenSource);
    let lookup = StubLookup::returning([
        description(coords.clone(), "https://docs.example/first"),
        description(coords.clone(), "https://docs.example/second"),
        description(coords.clone(), "https://docs.example/third"),
    ]);
    let service = DescriptionResolver::new(lookup.clone());
    let mut events = service.subscribe();

    let resolved = service
        .description_location_for(
            error_code(),
            release(),
            PlatformEdition::OpenSource,
            InvocationContext::new("test"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(resolved.uri().as_str(), "https://docs.example/first");
    assert_eq!(lookup.pulled(), 1);
    assert!(events.try_recv().is_some());
    assert!(events.try_recv().is_none(), "only one terminal event");
}

#[tokio::test]
async fn match_ends_resolution_even_if_upstream_never_finishes() {
    init_test_logging();
    let coords = coordinates(PlatformEdition::OpenSource);
    let lookup = StubLookup::returning_then_pending([description(coords, LOCATION)]);
    let service = DescriptionResolver::new(lookup);

    let resolved = tokio::time::timeout(
        Duration::from_secs(1),
        service.description_location_for(
            error_code(),
            release(),
            PlatformEdition::OpenSource,
            InvocationContext::new("test"),
        ),
    )
    .await
    .expect("resolution must not wait for the rest of the stream")
    .unwrap();

    assert!(resolved.is_some());
}

#[tokio::test]
async fn upstream_failure_propagates_unchanged_without_events() {
    init_test_logging();
    let failure = LookupError::unavailable("connection refused");
    let service = DescriptionResolver::new(StubLookup::failing(failure.clone()));
    let mut events = service.subscribe();

    let result = service
        .description_location_for(
            error_code(),
            release(),
            PlatformEdition::OpenSource,
            InvocationContext::new("test"),
        )
        .await;

    assert_eq!(result, Err(failure));
    assert!(events.try_recv().is_none());
}

#[tokio::test]
async fn resolution_is_cold_until_polled() {
    init_test_logging();
    let lookup = StubLookup::empty();
    let service = DescriptionResolver::new(lookup.clone());

    let pending = service.description_location_for(
        error_code(),
        release(),
        PlatformEdition::OpenSource,
        InvocationContext::new("test"),
    );
    assert_eq!(lookup.calls(), 0);

    pending.await.unwrap();
    assert_eq!(lookup.calls(), 1);
}

#[tokio::test]
async fn cancelled_resolution_publishes_nothing() {
    init_test_logging();
    let lookup = StubLookup::pending();
    let service = DescriptionResolver::new(lookup.clone());
    let mut events = service.subscribe();

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        service.description_location_for(
            error_code(),
            release(),
            PlatformEdition::OpenSource,
            InvocationContext::new("test"),
        ),
    )
    .await;

    // The timeout dropped the resolution mid-lookup.
    assert!(outcome.is_err());
    assert_eq!(lookup.calls(), 1);

    service.close();
    assert_eq!(events.recv().await, None, "no event for a cancelled resolution");
}

#[tokio::test]
async fn event_is_visible_before_the_result() {
    init_test_logging();
    let coords = coordinates(PlatformEdition::OpenSource);
    let service = Arc::new(DescriptionResolver::new(StubLookup::returning([
        description(coords, LOCATION),
    ])));
    let mut events = service.subscribe();

    let task = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .description_location_for(
                    error_code(),
                    release(),
                    PlatformEdition::OpenSource,
                    InvocationContext::new("test"),
                )
                .await
        })
    };

    let resolved = task.await.unwrap().unwrap();
    assert!(resolved.is_some());
    // Without waiting: the event must already be buffered.
    assert!(events.try_recv().is_some());
}

#[tokio::test]
async fn in_flight_resolution_completes_after_close_without_event() {
    init_test_logging();
    let gate = Arc::new(Notify::new());
    let coords = coordinates(PlatformEdition::OpenSource);
    let lookup = {
        let gate = Arc::clone(&gate);
        move |_: errcodes_core::ErrorCode, _: InvocationContext| {
            let gate = Arc::clone(&gate);
            let found = description(coords.clone(), LOCATION);
            stream::once(async move {
                gate.notified().await;
                Ok(found)
            })
            .boxed()
        }
    };
    let service = Arc::new(DescriptionResolver::new(lookup));
    let mut events = service.subscribe();

    let task = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .description_location_for(
                    error_code(),
                    release(),
                    PlatformEdition::OpenSource,
                    InvocationContext::new("test"),
                )
                .await
        })
    };

    tokio::task::yield_now().await;
    service.close();
    gate.notify_one();

    let resolved = task.await.unwrap().unwrap();
    assert!(resolved.is_some(), "in-flight resolution still completes");
    assert_eq!(events.recv().await, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolutions_each_publish_one_event() {
    init_test_logging();
    const INVOCATIONS: usize = 64;

    let coords = coordinates(PlatformEdition::OpenSource);
    let service: Arc<dyn ErrorDescriptionService> = Arc::new(DescriptionResolver::new(
        StubLookup::returning([description(coords, LOCATION)]),
    ));
    let mut events = service.subscribe();

    let mut expected = HashSet::new();
    let mut tasks = Vec::new();
    for idx in 0..INVOCATIONS {
        let context = InvocationContext::new(format!("request-{idx}"));
        expected.insert(context.invocation_id());
        let edition = if idx % 2 == 0 {
            PlatformEdition::OpenSource
        } else {
            PlatformEdition::Enterprise
        };
        let service = Arc::clone(&service);
        tasks.push(tokio::spawn(async move {
            service
                .description_location_for(error_code(), release(), edition, context)
                .await
        }));
    }

    let mut found = 0;
    for task in tasks {
        if task.await.unwrap().unwrap().is_some() {
            found += 1;
        }
    }
    assert_eq!(found, INVOCATIONS / 2);

    let mut seen = HashSet::new();
    let mut without = 0;
    while let Some(event) = events.try_recv() {
        assert!(seen.insert(event.invocation_context().invocation_id()));
        if event.kind() == EventKind::WithoutDescriptionLocation {
            without += 1;
        }
    }
    assert_eq!(seen, expected);
    assert_eq!(without, INVOCATIONS / 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn subscribers_come_and_go_while_resolutions_run() {
    init_test_logging();
    const INVOCATIONS: usize = 128;
    const CHURNERS: usize = 4;

    let coords = coordinates(PlatformEdition::OpenSource);
    let service = Arc::new(DescriptionResolver::new(StubLookup::returning([
        description(coords, LOCATION),
    ])));
    let mut events = service.subscribe();

    let stop = Arc::new(AtomicBool::new(false));
    let churned = Arc::new(AtomicUsize::new(0));
    let churners: Vec<_> = (0..CHURNERS)
        .map(|_| {
            let service = Arc::clone(&service);
            let stop = Arc::clone(&stop);
            let churned = Arc::clone(&churned);
            tokio::spawn(async move {
                loop {
                    let mut transient = service.subscribe();
                    let _ = transient.try_recv();
                    drop(transient);
                    churned.fetch_add(1, Ordering::Relaxed);
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    let mut expected = HashSet::new();
    let mut tasks = Vec::new();
    for idx in 0..INVOCATIONS {
        let context = InvocationContext::new(format!("request-{idx}"));
        expected.insert(context.invocation_id());
        let service = Arc::clone(&service);
        tasks.push(tokio::spawn(async move {
            service
                .description_location_for(
                    error_code(),
                    release(),
                    PlatformEdition::OpenSource,
                    context,
                )
                .await
        }));
    }

    for task in tasks {
        let resolved = task.await.unwrap().unwrap();
        assert_eq!(resolved, Some(location(LOCATION)));
    }
    stop.store(true, Ordering::Relaxed);
    for churner in churners {
        churner.await.unwrap();
    }
    assert!(churned.load(Ordering::Relaxed) >= CHURNERS);
    assert_eq!(service.subscriber_count(), 1);

    let mut seen = HashSet::new();
    while let Some(event) = events.try_recv() {
        assert_eq!(event.kind(), EventKind::DescriptionLocationFor);
        assert!(seen.insert(event.invocation_context().invocation_id()));
    }
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn failing_subscriber_does_not_affect_resolution() {
    init_test_logging();
    let coords = coordinates(PlatformEdition::OpenSource);
    let service = DescriptionResolver::new(StubLookup::returning([description(
        coords, LOCATION,
    )]));

    let panicking = service
        .subscribe()
        .spawn(|_event| -> Result<(), String> { panic!("subscriber bug") });
    let erroring = service
        .subscribe()
        .spawn(|_event| Err::<(), _>("subscriber refused event"));
    let mut healthy = service.subscribe();

    let resolved = service
        .description_location_for(
            error_code(),
            release(),
            PlatformEdition::OpenSource,
            InvocationContext::new("test"),
        )
        .await
        .unwrap();

    assert!(resolved.is_some());
    assert!(healthy.recv().await.is_some());

    service.close();
    tokio::time::timeout(Duration::from_secs(1), panicking)
        .await
        .expect("handler task ends after close")
        .expect("panic contained inside handler task");
    tokio::time::timeout(Duration::from_secs(1), erroring)
        .await
        .expect("handler task ends after close")
        .unwrap();
}

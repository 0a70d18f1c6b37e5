//! # Unit runners.
//!
//! A unit is one concurrently scheduled piece of work: the dispatcher, or one
//! background task from the settings' `tasks` list.
//!
//! ## Event flow
//!
//! ```text
//! start              → publish UnitStarting
//! Ok / Canceled      → publish UnitStopped
//! Err(Fail/Transport) → publish UnitFailed → RuntimeError::Handler
//! ```
//!
//! ## Rules
//! - Always publishes exactly one terminal event: `UnitStopped` or `UnitFailed`
//! - `Canceled` is a graceful exit, never a failure
//! - The handler future is raced against the unit token and dropped on cancel

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::dispatch::{DISPATCHER_UNIT, Dispatcher};
use crate::error::{HandlerError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::plugins::{HandlerContext, TaskUnit};
use crate::transport::Connection;

/// Runs one background task until it returns or `token` is cancelled.
///
/// Tasks receive a `null` payload.
pub(crate) async fn run_task(
    unit: TaskUnit,
    connection: Connection,
    bus: Bus,
    token: CancellationToken,
) -> Result<(), RuntimeError> {
    let TaskUnit { reference, handler } = unit;
    bus.publish(
        Event::new(EventKind::UnitStarting)
            .with_unit(reference.as_str())
            .with_handler(handler.name()),
    );

    let ctx = HandlerContext::new(connection, token.clone());
    let res = tokio::select! {
        biased;
        _ = token.cancelled() => Err(HandlerError::Canceled),
        res = handler.invoke(ctx, Value::Null) => res,
    };

    match res {
        Ok(()) | Err(HandlerError::Canceled) => {
            publish_stopped(&bus, &reference);
            Ok(())
        }
        Err(source) => {
            publish_failed(&bus, &reference, &source);
            Err(RuntimeError::Handler {
                unit: reference,
                source,
            })
        }
    }
}

/// Runs the dispatcher with the same lifecycle events as a task.
///
/// Dispatch failures are reported by the dispatcher itself, which knows the
/// offending route; transport failures are reported here.
pub(crate) async fn run_dispatcher(
    dispatcher: Dispatcher,
    bus: Bus,
    token: CancellationToken,
) -> Result<(), RuntimeError> {
    bus.publish(Event::new(EventKind::UnitStarting).with_unit(DISPATCHER_UNIT));
    match dispatcher.run(token).await {
        Ok(()) => {
            publish_stopped(&bus, DISPATCHER_UNIT);
            Ok(())
        }
        Err(err @ RuntimeError::Handler { .. }) => Err(err),
        Err(err) => {
            bus.publish(
                Event::new(EventKind::UnitFailed)
                    .with_unit(DISPATCHER_UNIT)
                    .with_reason(err.to_string()),
            );
            Err(err)
        }
    }
}

fn publish_stopped(bus: &Bus, unit: &str) {
    bus.publish(Event::new(EventKind::UnitStopped).with_unit(unit));
}

fn publish_failed(bus: &Bus, unit: &str, err: &HandlerError) {
    bus.publish(
        Event::new(EventKind::UnitFailed)
            .with_unit(unit)
            .with_reason(err.to_string()),
    );
}

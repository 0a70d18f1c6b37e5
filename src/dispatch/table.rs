//! # Subscription table.
//!
//! Built once from the settings' `subscriptions` and the resolved handlers:
//!
//! ```text
//! settings                                 table
//! window:    { focus: "h:f", close: null } window: { focus: Some(f), close: None }
//! workspace: { init: null }                (dropped: no handler at all)
//! ```
//!
//! The key set is exactly what the dispatcher subscribes to.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::plugins::SharedHandler;
use crate::settings::present;

/// `event → change → handler` routing map.
#[derive(Clone, Default)]
pub struct SubscriptionTable {
    routes: BTreeMap<String, BTreeMap<String, Option<SharedHandler>>>,
}

impl SubscriptionTable {
    /// Builds the table, dropping events without any present handler.
    ///
    /// Empty references and references missing from `handlers` count as absent.
    pub fn build(
        subscriptions: &BTreeMap<String, BTreeMap<String, Option<String>>>,
        handlers: &BTreeMap<String, SharedHandler>,
    ) -> Self {
        let routes = subscriptions
            .iter()
            .filter_map(|(event, changes)| {
                let changes: BTreeMap<String, Option<SharedHandler>> = changes
                    .iter()
                    .map(|(change, reference)| {
                        let handler = present(reference.as_deref())
                            .and_then(|r| handlers.get(r))
                            .map(Arc::clone);
                        (change.clone(), handler)
                    })
                    .collect();
                changes
                    .values()
                    .any(Option::is_some)
                    .then(|| (event.clone(), changes))
            })
            .collect();
        Self { routes }
    }

    /// Event names to subscribe to, sorted.
    pub fn events(&self) -> Vec<String> {
        self.routes.keys().cloned().collect()
    }

    /// Handler for `(event, change)`, if any.
    pub fn route(&self, event: &str, change: &str) -> Option<&SharedHandler> {
        self.routes.get(event)?.get(change)?.as_ref()
    }

    /// Number of subscribed events.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when nothing needs subscribing.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::plugins::{HandlerContext, HandlerFn};
    use serde_json::Value;

    fn noop(name: &'static str) -> SharedHandler {
        HandlerFn::arc(name, |_ctx: HandlerContext, _payload: Value| async {
            Ok::<_, HandlerError>(())
        })
    }

    type Subscriptions = BTreeMap<String, BTreeMap<String, Option<String>>>;

    fn subs(entries: &[(&str, &[(&str, Option<&str>)])]) -> Subscriptions {
        entries
            .iter()
            .map(|(event, changes)| {
                let changes = changes
                    .iter()
                    .map(|(c, r)| (c.to_string(), r.map(str::to_string)))
                    .collect();
                (event.to_string(), changes)
            })
            .collect()
    }

    #[test]
    fn drops_events_without_handlers() {
        let on_focus = noop("on_focus");
        let handlers = BTreeMap::from([("h:on_focus".to_string(), Arc::clone(&on_focus))]);
        let subscriptions = subs(&[
            ("window", &[("focus", Some("h:on_focus")), ("close", None)]),
            ("workspace", &[("init", None), ("empty", None)]),
            ("mode", &[]),
        ]);

        let table = SubscriptionTable::build(&subscriptions, &handlers);

        assert_eq!(table.events(), vec!["window".to_string()]);
        assert_eq!(table.len(), 1);
        let routed = table.route("window", "focus").unwrap();
        assert!(Arc::ptr_eq(routed, &on_focus));
        assert!(table.route("window", "close").is_none());
        assert!(table.route("window", "move").is_none());
        assert!(table.route("workspace", "init").is_none());
    }

    #[test]
    fn unresolved_reference_counts_as_absent() {
        let subscriptions = subs(&[("window", &[("focus", Some("h:gone"))])]);
        let table = SubscriptionTable::build(&subscriptions, &BTreeMap::new());
        assert!(table.is_empty());
    }

    #[test]
    fn empty_reference_counts_as_absent() {
        let handlers = BTreeMap::from([(String::new(), noop("unreachable"))]);
        let subscriptions = subs(&[("window", &[("focus", Some("")), ("close", None)])]);
        let table = SubscriptionTable::build(&subscriptions, &handlers);
        assert!(table.is_empty());
        assert!(table.route("window", "focus").is_none());
    }
}

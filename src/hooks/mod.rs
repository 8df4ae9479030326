//! Extension hook points.
//!
//! Two shapes, mirroring the host platform's plugin bus:
//! - **filters**: an ordered chain of transforms over a JSON payload; each
//!   registered handler receives the previous handler's output.
//! - **actions**: broadcast notifications; every handler sees the same
//!   payload, return values are ignored.
//!
//! Both are awaited synchronously in registration order, and every core
//! code path must behave identically with zero registered handlers.

use std::collections::HashMap;

use anyhow::Result;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::RwLock;

type FilterFn = Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync>;
type ActionFn = Box<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Registry of filter chains and action listeners, keyed by hook name
/// (e.g. `filter:user.update_profile`).
#[derive(Default)]
pub struct HookRegistry {
    filters: RwLock<HashMap<String, Vec<FilterFn>>>,
    actions: RwLock<HashMap<String, Vec<ActionFn>>>,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter to the named chain.
    pub async fn register_filter<F>(&self, name: &str, handler: F)
    where
        F: Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync + 'static,
    {
        self.filters
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    /// Append an action listener to the named hook.
    pub async fn register_action<F>(&self, name: &str, handler: F)
    where
        F: Fn(Value) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.actions
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    /// Run `payload` through the named filter chain. With no handlers the
    /// payload passes through untouched.
    pub async fn fire_filter(&self, name: &str, mut payload: Value) -> Result<Value> {
        let filters = self.filters.read().await;
        if let Some(chain) = filters.get(name) {
            for handler in chain {
                payload = handler(payload).await?;
            }
        }
        Ok(payload)
    }

    /// Broadcast `payload` to every listener on the named action hook.
    pub async fn fire_action(&self, name: &str, payload: Value) {
        let actions = self.actions.read().await;
        if let Some(listeners) = actions.get(name) {
            for handler in listeners {
                handler(payload.clone()).await;
            }
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry").finish_non_exhaustive()
    }
}

//! Recording doubles for the two surface capabilities.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use masquerade::{Error, HeaderRule, HeaderRuleEngine, Injector, Result, Surface};

/// Injector double: records every registered script, can be told to fail
/// the next N calls.
#[derive(Default)]
pub struct MockInjector {
    pub scripts: Mutex<Vec<String>>,
    pub unregisters: AtomicUsize,
    fail_remaining: AtomicUsize,
}

impl MockInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` register calls fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    pub fn last_script(&self) -> Option<String> {
        self.scripts.lock().unwrap().last().cloned()
    }

    pub fn register_count(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }
}

#[async_trait]
impl Injector for MockInjector {
    async fn register(&self, script: &str) -> Result<()> {
        if take_failure(&self.fail_remaining) {
            return Err(Error::surface_apply(Surface::Script, "injected failure"));
        }
        self.scripts.lock().unwrap().push(script.to_string());
        Ok(())
    }

    async fn unregister_all(&self) -> Result<()> {
        self.unregisters.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Header engine double: records every replaced rule set, can be told to
/// fail the next N calls.
#[derive(Default)]
pub struct MockHeaderEngine {
    pub rule_sets: Mutex<Vec<Vec<HeaderRule>>>,
    fail_remaining: AtomicUsize,
    delay_remaining: AtomicUsize,
}

impl MockHeaderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` replace calls hold the apply in flight for a while.
    pub fn delay_next(&self, n: usize) {
        self.delay_remaining.store(n, Ordering::SeqCst);
    }

    pub fn last_rules(&self) -> Option<Vec<HeaderRule>> {
        self.rule_sets.lock().unwrap().last().cloned()
    }

    pub fn replace_count(&self) -> usize {
        self.rule_sets.lock().unwrap().len()
    }
}

#[async_trait]
impl HeaderRuleEngine for MockHeaderEngine {
    async fn replace_rules(&self, rules: &[HeaderRule]) -> Result<()> {
        if take_failure(&self.delay_remaining) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        if take_failure(&self.fail_remaining) {
            return Err(Error::surface_apply(Surface::Headers, "injected failure"));
        }
        self.rule_sets.lock().unwrap().push(rules.to_vec());
        Ok(())
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Initialize tracing once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("masquerade=debug")
        .try_init();
}

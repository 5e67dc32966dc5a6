//! Canned kernel for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::geometry::Value;
use crate::kernel::{Evaluation, Kernel, KernelFailure};

/// Kernel returning the same outcome for every script, recording sources.
pub(crate) struct MockKernel {
    outcome: Result<Evaluation, KernelFailure>,
    sources: Mutex<Vec<String>>,
}

impl MockKernel {
    pub(crate) fn new(outcome: Result<Evaluation, KernelFailure>) -> Self {
        Self {
            outcome,
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Scripts that call `show_object(value)`.
    pub(crate) fn showing(value: Value) -> Self {
        Self::new(Ok(Evaluation {
            first_result: Some(value),
            env: BTreeMap::new(),
        }))
    }

    /// Scripts that only bind names.
    pub(crate) fn binding(bindings: Vec<(&str, Value)>) -> Self {
        Self::new(Ok(Evaluation {
            first_result: None,
            env: bindings
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
        }))
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self::new(Err(KernelFailure::new(message)))
    }

    pub(crate) fn sources(&self) -> Vec<String> {
        self.sources.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub(crate) fn calls(&self) -> usize {
        self.sources().len()
    }
}

impl Kernel for MockKernel {
    fn build(&self, source: &str) -> Result<Evaluation, KernelFailure> {
        if let Ok(mut sources) = self.sources.lock() {
            sources.push(source.to_owned());
        }
        self.outcome.clone()
    }
}

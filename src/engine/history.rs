use super::result::FlowExecutionResult;
use ahash::AHashMap;
use parking_lot::Mutex;

/// Append-only record of completed runs, keyed by flow name
/// (case-insensitive).
///
/// This store is the only place test code observes the side effects of
/// automatically triggered runs, so the assertion helpers live here.
#[derive(Default)]
pub struct ExecutionHistory {
    runs: Mutex<AHashMap<String, Vec<FlowExecutionResult>>>,
}

impl ExecutionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, result: FlowExecutionResult) {
        let key = result.flow_name.to_lowercase();
        self.runs.lock().entry(key).or_default().push(result);
    }

    /// How many times the named flow has run.
    pub fn count(&self, flow_name: &str) -> usize {
        self.runs
            .lock()
            .get(&flow_name.to_lowercase())
            .map_or(0, Vec::len)
    }

    /// All recorded runs of the named flow, oldest first.
    pub fn results(&self, flow_name: &str) -> Vec<FlowExecutionResult> {
        self.runs
            .lock()
            .get(&flow_name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn last_result(&self, flow_name: &str) -> Option<FlowExecutionResult> {
        self.runs
            .lock()
            .get(&flow_name.to_lowercase())
            .and_then(|runs| runs.last().cloned())
    }

    /// # Panics
    ///
    /// Panics if the named flow never ran.
    #[track_caller]
    pub fn assert_triggered(&self, flow_name: &str) {
        if self.count(flow_name) == 0 {
            panic!("expected flow '{flow_name}' to have been triggered, but it never ran");
        }
    }

    /// # Panics
    ///
    /// Panics if the named flow ran at least once.
    #[track_caller]
    pub fn assert_not_triggered(&self, flow_name: &str) {
        let count = self.count(flow_name);
        if count > 0 {
            panic!(
                "expected flow '{flow_name}' not to have been triggered, but it ran {count} time(s)"
            );
        }
    }

    pub fn clear(&self) {
        self.runs.lock().clear();
    }
}

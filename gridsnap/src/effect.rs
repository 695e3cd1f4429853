use crate::core::{Rect, WindowId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WindowOperation {
    Resize {
        slot: usize,
        window_id: WindowId,
        bounds: Rect,
    },
    Create {
        slot: usize,
        bounds: Rect,
    },
    Minimize {
        window_id: WindowId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationOutcome {
    pub operation: WindowOperation,
    /// Window produced by a successful create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<WindowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationOutcome {
    pub fn ok(operation: WindowOperation) -> Self {
        Self {
            operation,
            created: None,
            error: None,
        }
    }

    pub fn created(operation: WindowOperation, window_id: WindowId) -> Self {
        Self {
            operation,
            created: Some(window_id),
            error: None,
        }
    }

    pub fn failed(operation: WindowOperation, error: impl ToString) -> Self {
        Self {
            operation,
            created: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// What happened to every operation of one reconciliation, in issue order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<OperationOutcome>,
}

impl BatchReport {
    pub fn push(&mut self, outcome: OperationOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }
}

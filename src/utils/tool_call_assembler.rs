use std::collections::BTreeMap;

use crate::types::tool::{ToolCall, ToolCallDelta};

/// Collects streamed tool-call fragments into complete [`ToolCall`]s.
///
/// Fragments are correlated by the server-assigned `index`, not by `id`:
/// only the first fragment of a call carries its id. Names are overwritten
/// (they arrive whole), argument fragments are appended.
#[derive(Debug, Default, Clone)]
pub struct ToolCallAssembler {
    calls: BTreeMap<u32, ToolCall>,
}

impl ToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, delta: &ToolCallDelta) {
        let index = delta.index;
        let call = self.calls.entry(index).or_insert_with(|| {
            let id = delta
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| synthesized_id(index));
            ToolCall::new(id, String::new(), String::new())
        });

        // A real id may follow a first fragment that lacked one.
        if let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty()) {
            if call.id != id && call.id == synthesized_id(index) {
                call.id = id.to_string();
            }
        }
        if let Some(name) = delta.name.as_deref().filter(|n| !n.is_empty()) {
            call.function.name = name.to_string();
        }
        if let Some(fragment) = delta.arguments.as_deref() {
            call.function.arguments.push_str(fragment);
        }
    }

    pub fn apply_all<'a>(&mut self, deltas: impl IntoIterator<Item = &'a ToolCallDelta>) {
        for delta in deltas {
            self.apply(delta);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Current calls ordered by index.
    pub fn snapshot(&self) -> Vec<ToolCall> {
        self.calls.values().cloned().collect()
    }

    pub fn finalize(self) -> Vec<ToolCall> {
        self.calls.into_values().collect()
    }
}

fn synthesized_id(index: u32) -> String {
    format!("call_{}", index)
}

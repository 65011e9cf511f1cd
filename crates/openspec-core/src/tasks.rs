use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static CHECKBOX_RE: OnceLock<Regex> = OnceLock::new();

fn checkbox_re() -> &'static Regex {
    CHECKBOX_RE.get_or_init(|| Regex::new(r"^\s*[-*]\s+\[([ xX])\]").unwrap())
}

/// Checkbox progress of a change's `tasks.md`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub total: usize,
    pub completed: usize,
}

impl TaskProgress {
    pub fn incomplete(&self) -> usize {
        self.total - self.completed
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

impl std::fmt::Display for TaskProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.total == 0 {
            write!(f, "no tasks")
        } else {
            write!(f, "{}/{} tasks", self.completed, self.total)
        }
    }
}

pub fn count_tasks(content: &str) -> TaskProgress {
    let mut progress = TaskProgress::default();
    for caps in content.lines().filter_map(|l| checkbox_re().captures(l)) {
        progress.total += 1;
        if !caps[1].trim().is_empty() {
            progress.completed += 1;
        }
    }
    progress
}

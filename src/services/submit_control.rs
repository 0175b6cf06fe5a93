use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Per-owner state of the analyze button.
///
/// Engaging is advisory: it renders the control disabled but does not stop a
/// second submission from running.
#[derive(Clone, Default)]
pub struct SubmitControls {
    engaged: Arc<Mutex<HashMap<String, usize>>>,
}

/// Restores the control when dropped, whichever way the submission ends.
pub struct SubmitGuard {
    controls: SubmitControls,
    owner: String,
}

impl SubmitControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables `owner`'s control until the returned guard is dropped.
    pub fn engage(&self, owner: &str) -> SubmitGuard {
        let mut engaged = self.engaged.lock().unwrap_or_else(|e| e.into_inner());
        let count = engaged.entry(owner.to_string()).or_insert(0);
        if *count > 0 {
            tracing::warn!("⚠️ Overlapping submission for {} ({} in flight)", owner, count);
        }
        *count += 1;

        SubmitGuard {
            controls: self.clone(),
            owner: owner.to_string(),
        }
    }

    pub fn is_engaged(&self, owner: &str) -> bool {
        let engaged = self.engaged.lock().unwrap_or_else(|e| e.into_inner());
        engaged.get(owner).is_some_and(|count| *count > 0)
    }

    fn release(&self, owner: &str) {
        let mut engaged = self.engaged.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = engaged.get_mut(owner) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                engaged.remove(owner);
            }
        }
    }
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.controls.release(&self.owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_control_on_drop() {
        let controls = SubmitControls::new();
        {
            let _guard = controls.engage("a");
            assert!(controls.is_engaged("a"));
            assert!(!controls.is_engaged("b"));
        }
        assert!(!controls.is_engaged("a"));
    }

    #[test]
    fn overlapping_submissions_are_not_blocked() {
        let controls = SubmitControls::new();
        let first = controls.engage("a");
        let second = controls.engage("a");
        drop(first);
        assert!(controls.is_engaged("a"));
        drop(second);
        assert!(!controls.is_engaged("a"));
    }

    #[test]
    fn guard_restores_control_on_error_path() {
        fn failing(controls: &SubmitControls) -> Result<(), &'static str> {
            let _guard = controls.engage("a");
            Err("inference down")
        }

        let controls = SubmitControls::new();
        assert!(failing(&controls).is_err());
        assert!(!controls.is_engaged("a"));
    }
}

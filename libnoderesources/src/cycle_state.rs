use std::collections::HashSet;

/// Per-round state shared by the plugins of one scheduling cycle.
///
/// Score plugins only get a shared reference, since nodes may be scored
/// concurrently.
#[derive(Default)]
pub struct CycleState {
    pub skip_score_plugins: HashSet<String>,
}

impl CycleState {
    pub fn skip_score(&mut self, plugin: &str) {
        self.skip_score_plugins.insert(plugin.to_string());
    }
}

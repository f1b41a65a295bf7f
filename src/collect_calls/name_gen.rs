//! A per-module fresh-name generator (§4.4, §9 "carry this counter in an
//! explicit context"). Scoped to one parent module's rewrite rather than
//! kept as process-wide ambient state, unlike the front-end's call-site
//! counter (§9).

use std::collections::HashSet;

pub struct InstanceNameGenerator {
    used: HashSet<String>,
}

impl InstanceNameGenerator {
    pub fn new(used_names: impl IntoIterator<Item = String>) -> Self {
        Self {
            used: used_names.into_iter().collect(),
        }
    }

    /// Produces an unused name derived from `hint`, reserving it for future
    /// calls. The first candidate is `{hint}_2` (the hint itself is assumed
    /// already reserved as the first instance's name), then `{hint}_3`, and
    /// so on.
    pub fn fresh(&mut self, hint: &str) -> String {
        let mut n = 2u32;
        loop {
            let candidate = format!("{hint}_{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

use std::collections::BTreeMap;
use tracing::debug;

use super::spec::ChartSpec;

/// A drawing surface that can materialize charts.
///
/// Handles are owned by the [`ChartRegistry`]; a backend never sees two live
/// handles for the same target.
pub trait ChartBackend {
    type Handle;

    /// Draw `spec` into `target` and return the handle that owns it.
    fn build(&mut self, target: &str, spec: &ChartSpec) -> Self::Handle;

    /// Tear down a handle previously returned by [`build`](Self::build).
    fn release(&mut self, target: &str, handle: Self::Handle);
}

/// One chart slot per target: the previous handle is always released before
/// a replacement is built.
pub struct ChartRegistry<B: ChartBackend> {
    backend: B,
    slots: BTreeMap<String, B::Handle>,
    builds: u64,
}

impl<B: ChartBackend> ChartRegistry<B> {
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            slots: BTreeMap::new(),
            builds: 0,
        }
    }

    /// Replace whatever `target` shows with `spec`. With `None` the slot is
    /// only emptied. Returns true when a chart was built.
    pub fn render(&mut self, target: &str, spec: Option<&ChartSpec>) -> bool {
        self.release(target);
        let Some(spec) = spec else {
            debug!(target_id = target, "nothing to draw; slot left empty");
            return false;
        };
        let handle = self.backend.build(target, spec);
        self.slots.insert(target.to_string(), handle);
        self.builds += 1;
        debug!(target_id = target, kind = spec.kind(), "chart built");
        true
    }

    /// Release the chart held for `target`, if any.
    pub fn release(&mut self, target: &str) -> bool {
        match self.slots.remove(target) {
            Some(handle) => {
                self.backend.release(target, handle);
                true
            }
            None => false,
        }
    }

    pub fn release_all(&mut self) {
        let slots = std::mem::take(&mut self.slots);
        for (target, handle) in slots {
            self.backend.release(&target, handle);
        }
    }

    #[must_use]
    pub fn contains(&self, target: &str) -> bool {
        self.slots.contains_key(target)
    }

    #[must_use]
    pub fn handle(&self, target: &str) -> Option<&B::Handle> {
        self.slots.get(target)
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total builds since creation.
    #[must_use]
    pub const fn builds(&self) -> u64 {
        self.builds
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: ChartBackend> Drop for ChartRegistry<B> {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Keeps the latest spec per target in memory. Used by views that draw
/// from data on every frame rather than from a persistent widget.
#[derive(Debug, Default)]
pub struct RetainedBackend {
    live: BTreeMap<String, ChartSpec>,
    released: u64,
}

impl RetainedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, target: &str) -> Option<&ChartSpec> {
        self.live.get(target)
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub const fn released(&self) -> u64 {
        self.released
    }
}

impl ChartBackend for RetainedBackend {
    type Handle = ();

    fn build(&mut self, target: &str, spec: &ChartSpec) {
        self.live.insert(target.to_string(), spec.clone());
    }

    fn release(&mut self, target: &str, (): ()) {
        self.live.remove(target);
        self.released += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Distribution;

    /// Records the order of build/release calls.
    #[derive(Default)]
    struct Journal {
        events: Vec<String>,
        next: u32,
    }

    impl ChartBackend for Journal {
        type Handle = u32;

        fn build(&mut self, target: &str, _spec: &ChartSpec) -> u32 {
            self.next += 1;
            self.events.push(format!("build {target} #{}", self.next));
            self.next
        }

        fn release(&mut self, target: &str, handle: u32) {
            self.events.push(format!("release {target} #{handle}"));
        }
    }

    fn spec() -> ChartSpec {
        let dist = Distribution::from_counts(vec![("A".into(), 2)]);
        ChartSpec::doughnut(&dist, &["#000"]).expect("non-empty")
    }

    #[test]
    fn previous_handle_released_before_rebuild() {
        let mut registry = ChartRegistry::new(Journal::default());
        let s = spec();
        assert!(registry.render("statusChart-x", Some(&s)));
        assert!(registry.render("statusChart-x", Some(&s)));
        assert_eq!(
            registry.backend().events,
            vec![
                "build statusChart-x #1",
                "release statusChart-x #1",
                "build statusChart-x #2",
            ]
        );
        assert_eq!(registry.handle("statusChart-x"), Some(&2));
        assert_eq!(registry.builds(), 2);
    }

    #[test]
    fn rendering_nothing_empties_the_slot() {
        let mut registry = ChartRegistry::new(Journal::default());
        registry.render("a", Some(&spec()));
        assert!(!registry.render("a", None));
        assert!(!registry.contains("a"));
        assert!(registry.is_empty());
        assert!(!registry.release("a"));
    }

    #[test]
    fn retained_backend_tracks_live_specs() {
        let mut registry = ChartRegistry::new(RetainedBackend::new());
        registry.render("a", Some(&spec()));
        registry.render("b", Some(&spec()));
        registry.render("a", None);
        assert_eq!(registry.backend().live_count(), 1);
        assert!(registry.backend().get("b").is_some());
        assert_eq!(registry.backend().released(), 1);
        registry.release_all();
        assert_eq!(registry.backend().live_count(), 0);
    }
}

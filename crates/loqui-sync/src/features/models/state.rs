//! Pure model-slice reducers, testable outside wasm.
//!
//! # Design
//! - Entries are created on first sight and never removed, so every known variant
//!   keeps exactly one record.
//! - Patches merge field by field; absent fields are left alone.
//! - Every non-poll write stamps the variant. A poll snapshot skips variants
//!   stamped at or after the poll's issue time, so a slow poll cannot undo a push.

use crate::catalog;
use loqui_api_models::{ModelState, ModelStatus, ModelVariant};
use std::collections::BTreeMap;

/// Model slice of the app store.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelsState {
    /// One record per known variant.
    pub by_variant: BTreeMap<ModelVariant, ModelState>,
    /// Display order: catalog first, then variants in order of first sight.
    pub order: Vec<ModelVariant>,
    /// Variant the user is working with.
    pub selected: ModelVariant,
    /// Last non-poll write per variant, in epoch milliseconds.
    pub stamps: BTreeMap<ModelVariant, u64>,
    /// Optimistic load awaiting corroboration.
    pub pending_load: Option<PendingLoad>,
}

impl Default for ModelsState {
    fn default() -> Self {
        let mut state = Self {
            by_variant: BTreeMap::new(),
            order: Vec::new(),
            selected: ModelVariant::from(catalog::DEFAULT_VARIANT),
            stamps: BTreeMap::new(),
            pending_load: None,
        };
        for variant in catalog::known_variants() {
            ensure_variant(&mut state, &variant);
        }
        state
    }
}

/// Record kept to roll back an optimistic load.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingLoad {
    /// Variant being loaded.
    pub variant: ModelVariant,
    /// Entry as it was before the optimistic write.
    pub previous: ModelState,
    /// Selection before the optimistic write.
    pub previous_selected: ModelVariant,
    /// Epoch milliseconds after which the load is rolled back.
    pub deadline_ms: u64,
}

/// Partial update for one model record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelPatch {
    /// New status.
    pub status: Option<ModelStatus>,
    /// New error slot; `Some(None)` clears it.
    pub error: Option<Option<String>>,
    /// New download progress.
    pub download_progress: Option<f64>,
}

impl ModelPatch {
    /// Patch that only sets the status.
    #[must_use]
    pub fn status(status: ModelStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Also set the error slot.
    #[must_use]
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }

    /// Also set download progress.
    #[must_use]
    pub const fn with_progress(mut self, progress: f64) -> Self {
        self.download_progress = Some(progress);
        self
    }

    fn apply(self, entry: &mut ModelState) {
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(error) = self.error {
            entry.error = error;
        }
        if let Some(progress) = self.download_progress {
            entry.download_progress = progress.clamp(0.0, 1.0);
        }
    }
}

/// What a poll snapshot changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotOutcome {
    /// Records replaced.
    pub applied: usize,
    /// Variants left alone because a newer push had already landed.
    pub skipped: Vec<ModelVariant>,
    /// Variant auto-selected because it was the only one loaded.
    pub auto_selected: Option<ModelVariant>,
}

/// Record for `variant`, inserting a default one if the variant is new.
pub fn ensure_variant<'a>(state: &'a mut ModelsState, variant: &ModelVariant) -> &'a mut ModelState {
    if !state.by_variant.contains_key(variant) {
        state.order.push(variant.clone());
    }
    state
        .by_variant
        .entry(variant.clone())
        .or_insert_with(|| ModelState::new(variant.clone()))
}

/// Merge `patch` into the record for `variant`.
pub fn update_model_state(state: &mut ModelsState, variant: &ModelVariant, patch: ModelPatch) {
    patch.apply(ensure_variant(state, variant));
}

/// Change the selected variant, registering it if unseen.
pub fn set_selected(state: &mut ModelsState, variant: &ModelVariant) {
    ensure_variant(state, variant);
    state.selected = variant.clone();
}

/// Apply a full model list fetched by a request issued at `issued_at_ms`.
///
/// Records stamped at or after the request's issue time are skipped. If exactly one of the
/// applied records is loaded, it becomes the selection. An applied record for the
/// pending optimistic variant corroborates it.
pub fn apply_snapshot(
    state: &mut ModelsState,
    models: Vec<ModelState>,
    issued_at_ms: u64,
) -> SnapshotOutcome {
    let mut outcome = SnapshotOutcome::default();
    let mut loaded = Vec::new();
    for model in models {
        let variant = model.variant.clone();
        if state
            .stamps
            .get(&variant)
            .is_some_and(|stamp| *stamp >= issued_at_ms)
        {
            outcome.skipped.push(variant);
            continue;
        }
        if model.status == ModelStatus::Loaded {
            loaded.push(variant.clone());
        }
        if state
            .pending_load
            .as_ref()
            .is_some_and(|pending| pending.variant == variant)
        {
            state.pending_load = None;
        }
        *ensure_variant(state, &variant) = model;
        outcome.applied += 1;
    }
    if let [only] = loaded.as_slice() {
        if state.selected != *only {
            outcome.auto_selected = Some(only.clone());
        }
        state.selected = only.clone();
    }
    outcome
}

/// Apply a pushed status change received at `now_ms`. Returns whether the
/// selection moved.
pub fn apply_status_push(
    state: &mut ModelsState,
    variant: &ModelVariant,
    status: ModelStatus,
    error: Option<String>,
    now_ms: u64,
) -> bool {
    let follow = status == ModelStatus::Loaded;
    update_model_state(state, variant, ModelPatch::status(status).with_error(error));
    state.stamps.insert(variant.clone(), now_ms);
    if state
        .pending_load
        .as_ref()
        .is_some_and(|pending| pending.variant == *variant)
    {
        state.pending_load = None;
    }
    if follow && state.selected != *variant {
        state.selected = variant.clone();
        return true;
    }
    false
}

/// Select `variant` and mark it downloading before the backend confirms anything.
pub fn begin_optimistic_load(
    state: &mut ModelsState,
    variant: &ModelVariant,
    now_ms: u64,
    timeout_ms: u64,
) {
    let previous = ensure_variant(state, variant).clone();
    let previous_selected = state.selected.clone();
    state.selected = variant.clone();
    update_model_state(
        state,
        variant,
        ModelPatch::status(ModelStatus::Downloading).with_error(None),
    );
    state.stamps.insert(variant.clone(), now_ms);
    state.pending_load = Some(PendingLoad {
        variant: variant.clone(),
        previous,
        previous_selected,
        deadline_ms: now_ms.saturating_add(timeout_ms),
    });
}

/// Roll back an optimistic load whose deadline passed without corroboration.
/// Returns the variant that was restored.
pub fn expire_pending_load(state: &mut ModelsState, now_ms: u64) -> Option<ModelVariant> {
    if state
        .pending_load
        .as_ref()
        .is_none_or(|pending| now_ms < pending.deadline_ms)
    {
        return None;
    }
    let pending = state.pending_load.take()?;
    let variant = pending.variant.clone();
    state.by_variant.insert(variant.clone(), pending.previous);
    state.stamps.remove(&variant);
    if state.selected == variant {
        state.selected = pending.previous_selected;
    }
    Some(variant)
}

/// Records in display order.
#[must_use]
pub fn ordered(state: &ModelsState) -> Vec<&ModelState> {
    state
        .order
        .iter()
        .filter_map(|variant| state.by_variant.get(variant))
        .collect()
}

/// Record for the selected variant.
#[must_use]
pub fn selected_state(state: &ModelsState) -> Option<&ModelState> {
    state.by_variant.get(&state.selected)
}

/// The variant currently loaded, if any.
#[must_use]
pub fn loaded_variant(state: &ModelsState) -> Option<&ModelVariant> {
    state
        .order
        .iter()
        .find(|variant| {
            state
                .by_variant
                .get(*variant)
                .is_some_and(|entry| entry.status == ModelStatus::Loaded)
        })
}

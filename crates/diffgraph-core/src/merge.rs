//! Field-by-field merge rules for components reported more than once
//!
//! | field            | policy          |
//! |------------------|-----------------|
//! | `component_type` | overwrite       |
//! | `parent`         | overwrite       |
//! | `summary`        | keep if present |
//! | `dependencies`   | keep if present |
//! | `dependents`     | keep if present |
//! | `change_kind`    | first write     |
//!
//! "Keep if present" means an empty, blank or missing incoming value never
//! replaces what is stored; any other incoming value does.

use std::collections::BTreeSet;

use crate::model::{ComponentNode, NewComponent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Latest report wins, even when it is empty.
    Overwrite,
    /// Latest report wins unless it is empty or blank.
    KeepIfPresent,
    /// Set at creation, never merged.
    FirstWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentField {
    ComponentType,
    Parent,
    Summary,
    Dependencies,
    Dependents,
    ChangeKind,
}

impl ComponentField {
    pub const ALL: [ComponentField; 6] = [
        ComponentField::ComponentType,
        ComponentField::Parent,
        ComponentField::Summary,
        ComponentField::Dependencies,
        ComponentField::Dependents,
        ComponentField::ChangeKind,
    ];

    pub const fn policy(self) -> MergePolicy {
        match self {
            ComponentField::ComponentType | ComponentField::Parent => MergePolicy::Overwrite,
            ComponentField::Summary | ComponentField::Dependencies | ComponentField::Dependents => {
                MergePolicy::KeepIfPresent
            }
            ComponentField::ChangeKind => MergePolicy::FirstWrite,
        }
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Trim references and drop the blank ones.
pub fn clean_references<I, S>(references: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    references
        .into_iter()
        .filter(|r| !is_blank(r.as_ref()))
        .map(|r| r.as_ref().trim().to_string())
        .collect()
}

/// Merge an optional text field.
pub fn merge_text(policy: MergePolicy, slot: &mut Option<String>, incoming: Option<String>) {
    match policy {
        MergePolicy::Overwrite => *slot = incoming,
        MergePolicy::KeepIfPresent => {
            if let Some(value) = incoming.filter(|v| !is_blank(v)) {
                *slot = Some(value);
            }
        }
        MergePolicy::FirstWrite => {}
    }
}

/// Merge a reference set.
pub fn merge_set(policy: MergePolicy, slot: &mut BTreeSet<String>, incoming: BTreeSet<String>) {
    match policy {
        MergePolicy::Overwrite => *slot = incoming,
        MergePolicy::KeepIfPresent => {
            if !incoming.is_empty() {
                *slot = incoming;
            }
        }
        MergePolicy::FirstWrite => {}
    }
}

fn merge_value<T>(policy: MergePolicy, slot: &mut T, incoming: T) {
    match policy {
        MergePolicy::Overwrite | MergePolicy::KeepIfPresent => *slot = incoming,
        MergePolicy::FirstWrite => {}
    }
}

/// Apply a repeated report to an existing component.
pub fn merge_component(existing: &mut ComponentNode, incoming: NewComponent) {
    merge_value(
        ComponentField::ComponentType.policy(),
        &mut existing.component_type,
        incoming.component_type,
    );
    merge_value(
        ComponentField::ChangeKind.policy(),
        &mut existing.change_kind,
        incoming.change_kind,
    );
    merge_text(
        ComponentField::Parent.policy(),
        &mut existing.parent,
        incoming.parent.filter(|p| !is_blank(p)),
    );
    merge_text(
        ComponentField::Summary.policy(),
        &mut existing.summary,
        incoming.summary,
    );
    merge_set(
        ComponentField::Dependencies.policy(),
        &mut existing.dependencies,
        clean_references(incoming.dependencies),
    );
    merge_set(
        ComponentField::Dependents.policy(),
        &mut existing.dependents,
        clean_references(incoming.dependents),
    );
}

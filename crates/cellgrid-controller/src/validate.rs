//! Name-chain validation and resource normalization.

use std::collections::HashMap;

use cell_core::{Cell, Container, ContainerSpec, Kind, NameChain, Realm, Space, Stack, check_name};

use crate::error::{ControllerError, ControllerResult};

/// Trim the levels of `raw` down to `kind` and require each to be present
/// and well-formed.
///
/// The resource's own name is checked first, then its ancestors from the
/// realm down, so a cell with every name blank reports the cell. Character
/// checks run only once every level is present.
pub(crate) fn resolve(kind: Kind, raw: &NameChain) -> ControllerResult<NameChain> {
    let trimmed = raw.trimmed();
    let level = |k: Kind| match k {
        Kind::Realm => &trimmed.realm,
        Kind::Space => &trimmed.space,
        Kind::Stack => &trimmed.stack,
        Kind::Cell => &trimmed.cell,
        Kind::Container => &trimmed.container,
    };

    if level(kind).is_empty() {
        return Err(ControllerError::NameRequired(kind));
    }
    for ancestor in Kind::ALL.into_iter().take_while(|k| *k != kind) {
        if level(ancestor).is_empty() {
            return Err(ControllerError::NameRequired(ancestor));
        }
    }

    let mut chain = NameChain::default();
    for k in Kind::ALL.into_iter().take(kind.depth() as usize + 1) {
        let name = level(k).clone();
        checked(k, &name)?;
        match k {
            Kind::Realm => chain.realm = name,
            Kind::Space => chain.space = name,
            Kind::Stack => chain.stack = name,
            Kind::Cell => chain.cell = name,
            Kind::Container => chain.container = name,
        }
    }
    Ok(chain)
}

fn checked(kind: Kind, name: &str) -> ControllerResult<()> {
    check_name(name).map_err(|source| ControllerError::InvalidName {
        kind,
        name: name.to_string(),
        source,
    })
}

/// Add the lineage labels of `chain` that are not already set.
pub(crate) fn stamp_lineage(labels: &mut HashMap<String, String>, chain: &NameChain) {
    for (key, value) in chain.lineage_labels() {
        labels
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }
}

pub(crate) fn realm(raw: &Realm) -> ControllerResult<(Realm, NameChain)> {
    let chain = resolve(Kind::Realm, &raw.chain())?;
    let mut realm = raw.clone();
    realm.metadata.name = chain.realm.clone();
    realm.spec.namespace = realm.spec.namespace.trim().to_string();
    if realm.spec.namespace.is_empty() {
        realm.spec.namespace = chain.realm.clone();
    }
    stamp_lineage(&mut realm.metadata.labels, &chain);
    Ok((realm, chain))
}

pub(crate) fn space(raw: &Space) -> ControllerResult<(Space, NameChain)> {
    let chain = resolve(Kind::Space, &raw.chain())?;
    let mut space = raw.clone();
    space.metadata.name = chain.space.clone();
    space.spec.realm_name = chain.realm.clone();
    stamp_lineage(&mut space.metadata.labels, &chain);
    Ok((space, chain))
}

pub(crate) fn stack(raw: &Stack) -> ControllerResult<(Stack, NameChain)> {
    let chain = resolve(Kind::Stack, &raw.chain())?;
    let mut stack = raw.clone();
    stack.metadata.name = chain.stack.clone();
    stack.spec.realm_name = chain.realm.clone();
    stack.spec.space_name = chain.space.clone();
    if stack.spec.id.trim().is_empty() {
        stack.spec.id = chain.stack.clone();
    }
    stamp_lineage(&mut stack.metadata.labels, &chain);
    Ok((stack, chain))
}

pub(crate) fn cell(raw: &Cell) -> ControllerResult<(Cell, NameChain)> {
    let chain = resolve(Kind::Cell, &raw.chain())?;
    let mut cell = raw.clone();
    cell.metadata.name = chain.cell.clone();
    cell.spec.realm_name = chain.realm.clone();
    cell.spec.space_name = chain.space.clone();
    cell.spec.stack_name = chain.stack.clone();
    if cell.spec.id.trim().is_empty() {
        cell.spec.id = chain.cell.clone();
    }
    cell.spec.root_container_id = cell.spec.root_container_id.trim().to_string();
    if !cell.spec.root_container_id.is_empty() {
        checked(Kind::Container, &cell.spec.root_container_id)?;
    }
    for spec in &mut cell.spec.containers {
        stamp_owner(spec, &chain);
        // Blank ids are skipped at reconcile time.
        if !spec.id.is_empty() {
            checked(Kind::Container, &spec.id)?;
        }
    }
    stamp_lineage(&mut cell.metadata.labels, &chain);
    Ok((cell, chain))
}

pub(crate) fn container(raw: &Container) -> ControllerResult<(Container, NameChain)> {
    let chain = resolve(Kind::Container, &raw.chain())?;
    let mut container = raw.clone();
    container.metadata.name = chain.container.clone();
    if container.spec.id.trim().is_empty() {
        container.spec.id = chain.container.clone();
    }
    stamp_owner(&mut container.spec, &chain);
    checked(Kind::Container, &container.spec.id)?;
    stamp_lineage(&mut container.metadata.labels, &chain);
    Ok((container, chain))
}

/// Copy the cell's ownership names onto a container spec.
fn stamp_owner(spec: &mut ContainerSpec, chain: &NameChain) {
    spec.id = spec.id.trim().to_string();
    spec.realm_name = chain.realm.clone();
    spec.space_name = chain.space.clone();
    spec.stack_name = chain.stack.clone();
    spec.cell_name = chain.cell.clone();
}

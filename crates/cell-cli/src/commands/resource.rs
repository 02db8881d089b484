//! Single-resource commands: get, list, create, delete, purge, start, kill.

use anyhow::bail;

use cell_core::{Cell, Container, ContainerSpec, Realm, Space, Stack};
use cellgrid_controller::Controller;
use cellgrid_runner::Runner;

use super::{ListTarget, Target, Workload, print_json};

/// A resource built from command-line arguments.
enum Resource {
    Realm(Realm),
    Space(Space),
    Stack(Stack),
    Cell(Cell),
    Container(Container),
}

fn parse_container(arg: &str) -> anyhow::Result<ContainerSpec> {
    let Some((id, image)) = arg.split_once('=') else {
        bail!("invalid --container \"{arg}\": expected ID=IMAGE");
    };
    Ok(ContainerSpec {
        id: id.trim().to_string(),
        image: image.trim().to_string(),
        ..Default::default()
    })
}

fn build(target: Target) -> anyhow::Result<Resource> {
    Ok(match target {
        Target::Realm { name, namespace } => {
            let mut realm = Realm::new(name);
            realm.spec.namespace = namespace.unwrap_or_default();
            Resource::Realm(realm)
        }
        Target::Space {
            realm,
            name,
            cni_config,
        } => {
            let mut space = Space::new(realm, name);
            space.spec.cni_config_path = cni_config.unwrap_or_default();
            Resource::Space(space)
        }
        Target::Stack { realm, space, name } => Resource::Stack(Stack::new(realm, space, name)),
        Target::Cell {
            realm,
            space,
            stack,
            name,
            containers,
            root,
        } => {
            let mut cell = Cell::new(realm, space, stack, name);
            cell.spec.containers = containers
                .iter()
                .map(|c| parse_container(c))
                .collect::<anyhow::Result<_>>()?;
            cell.spec.root_container_id = root.unwrap_or_default();
            Resource::Cell(cell)
        }
        Target::Container {
            realm,
            space,
            stack,
            cell,
            name,
            image,
        } => {
            let mut container = Container::new(realm, space, stack, cell, name);
            container.spec.image = image.unwrap_or_default();
            Resource::Container(container)
        }
    })
}

pub fn get<R: Runner>(ctl: &Controller<R>, target: Target) -> anyhow::Result<()> {
    match build(target)? {
        Resource::Realm(r) => print_json(&ctl.get_realm(&r)?),
        Resource::Space(s) => print_json(&ctl.get_space(&s)?),
        Resource::Stack(s) => print_json(&ctl.get_stack(&s)?),
        Resource::Cell(c) => print_json(&ctl.get_cell(&c)?),
        Resource::Container(c) => print_json(&ctl.get_container(&c)?),
    }
}

pub fn list<R: Runner>(ctl: &Controller<R>, target: ListTarget) -> anyhow::Result<()> {
    match target {
        ListTarget::Realms => print_json(&ctl.list_realms()?),
        ListTarget::Spaces { realm } => print_json(&ctl.list_spaces(&realm)?),
        ListTarget::Stacks { realm, space } => print_json(&ctl.list_stacks(&realm, &space)?),
        ListTarget::Cells {
            realm,
            space,
            stack,
        } => print_json(&ctl.list_cells(&realm, &space, &stack)?),
        ListTarget::Containers {
            realm,
            space,
            stack,
            cell,
        } => print_json(&ctl.list_containers(&realm, &space, &stack, &cell)?),
    }
}

pub fn create<R: Runner>(ctl: &Controller<R>, target: Target) -> anyhow::Result<()> {
    match build(target)? {
        Resource::Realm(r) => print_json(&ctl.create_realm(&r)?),
        Resource::Space(s) => print_json(&ctl.create_space(&s)?),
        Resource::Stack(s) => print_json(&ctl.create_stack(&s)?),
        Resource::Cell(c) => print_json(&ctl.create_cell(&c)?),
        Resource::Container(c) => print_json(&ctl.create_container(&c)?),
    }
}

/// Cells always take their containers with them, so `force` and
/// `cascade` only matter for realms, spaces and stacks.
pub fn delete<R: Runner>(
    ctl: &Controller<R>,
    target: Target,
    force: bool,
    cascade: bool,
) -> anyhow::Result<()> {
    match build(target)? {
        Resource::Realm(r) => print_json(&ctl.delete_realm(&r, force, cascade)?),
        Resource::Space(s) => print_json(&ctl.delete_space(&s, force, cascade)?),
        Resource::Stack(s) => print_json(&ctl.delete_stack(&s, force, cascade)?),
        Resource::Cell(c) => print_json(&ctl.delete_cell(&c)?),
        Resource::Container(c) => print_json(&ctl.delete_container(&c)?),
    }
}

pub fn purge<R: Runner>(
    ctl: &Controller<R>,
    target: Target,
    force: bool,
    cascade: bool,
) -> anyhow::Result<()> {
    match build(target)? {
        Resource::Realm(r) => print_json(&ctl.purge_realm(&r, force, cascade)?),
        Resource::Space(s) => print_json(&ctl.purge_space(&s, force, cascade)?),
        Resource::Stack(s) => print_json(&ctl.purge_stack(&s, force, cascade)?),
        Resource::Cell(c) => print_json(&ctl.purge_cell(&c, cascade)?),
        Resource::Container(c) => print_json(&ctl.purge_container(&c)?),
    }
}

pub fn start<R: Runner>(ctl: &Controller<R>, target: Workload) -> anyhow::Result<()> {
    match target {
        Workload::Cell {
            realm,
            space,
            stack,
            name,
        } => print_json(&ctl.start_cell(&Cell::new(realm, space, stack, name))?),
        Workload::Container {
            realm,
            space,
            stack,
            cell,
            name,
        } => print_json(&ctl.start_container(&Container::new(realm, space, stack, cell, name))?),
    }
}

pub fn kill<R: Runner>(ctl: &Controller<R>, target: Workload) -> anyhow::Result<()> {
    match target {
        Workload::Cell {
            realm,
            space,
            stack,
            name,
        } => print_json(&ctl.kill_cell(&Cell::new(realm, space, stack, name))?),
        Workload::Container {
            realm,
            space,
            stack,
            cell,
            name,
        } => print_json(&ctl.kill_container(&Container::new(realm, space, stack, cell, name))?),
    }
}

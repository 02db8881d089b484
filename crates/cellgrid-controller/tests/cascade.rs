//! Cascade delete and purge integration tests.

mod common;

use cell_core::*;
use cellgrid_controller::purge::{CONTAINER_PURGE_TAGS, SCOPE_PURGE_TAGS};
use cellgrid_controller::{ControllerError, ErrorKind, Operation};
use cellgrid_runner::Runner;
use cellgrid_state::{InfraKind, InfraRecord};

use common::*;

fn seed_space_with_stacks(ctl: &cellgrid_controller::Controller<ScriptedRunner>) {
    seed_stack(ctl, "r1", "s1", "st1");
    ctl.create_stack(&Stack::new("r1", "s1", "st2")).unwrap();
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ── Delete ─────────────────────────────────────────────────────────

#[test]
fn dependency_gate_blocks_delete() {
    let ctl = controller();
    seed_space_with_stacks(&ctl);
    ctl.runner().clear_calls();

    let err = ctl
        .delete_space(&Space::new("r1", "s1"), false, false)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Dependency);
    assert!(
        err.to_string().contains("space \"s1\" has 2 stack(s)"),
        "{err}"
    );
    assert!(matches!(
        err,
        ControllerError::HasDependencies { count: 2, child: Kind::Stack, .. }
    ));
    assert!(ctl.runner().calls().iter().all(|c| !c.starts_with("delete_")));
    assert!(ctl.get_space(&Space::new("r1", "s1")).unwrap().metadata_exists);
}

#[test]
fn cascade_deletes_children_first() {
    let ctl = controller();
    ctl.create_realm(&Realm::new("r1")).unwrap();
    ctl.create_space(&Space::new("r1", "s1")).unwrap();

    let result = ctl.delete_realm(&Realm::new("r1"), false, true).unwrap();

    assert_eq!(
        result.deleted,
        strings(&["space:s1", "metadata", "cgroup", "namespace"])
    );
    let calls = ctl.runner().calls();
    let position = |m: &str| calls.iter().position(|c| c.starts_with(m)).unwrap();
    assert!(position("delete_space") < position("delete_realm"));
    assert!(!ctl.get_realm(&Realm::new("r1")).unwrap().metadata_exists);
}

#[test]
fn deep_cascade_is_depth_first() {
    let ctl = controller();
    seed_cell(&ctl, ("r1", "s1", "st1", "c1"), &["web"]);

    let result = ctl.delete_realm(&Realm::new("r1"), false, true).unwrap();
    assert_eq!(result.deleted[0], "space:s1");

    let deletes: Vec<String> = ctl
        .runner()
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("delete_"))
        .collect();
    assert_eq!(
        deletes,
        strings(&[
            "delete_container r1/s1/st1/c1/web",
            "delete_cell r1/s1/st1/c1",
            "delete_stack r1/s1/st1",
            "delete_space r1/s1",
            "delete_realm r1",
        ])
    );
    assert!(ctl.runner().store().list_infra_owned_by("r1").unwrap().is_empty());
}

#[test]
fn force_skips_validation_and_leaves_children() {
    let ctl = controller();
    seed_space_with_stacks(&ctl);

    let result = ctl.delete_space(&Space::new("r1", "s1"), true, false).unwrap();

    assert_eq!(result.deleted, strings(&["metadata", "cgroup", "network"]));
    assert!(ctl.runner().calls_to("list_stacks").is_empty());
    assert_eq!(ctl.runner().store().list_stacks("r1", "s1").unwrap().len(), 2);
}

#[test]
fn force_with_cascade_still_cascades() {
    let ctl = controller();
    seed_space_with_stacks(&ctl);

    let result = ctl.delete_space(&Space::new("r1", "s1"), true, true).unwrap();

    assert_eq!(
        result.deleted,
        strings(&["stack:st1", "stack:st2", "metadata", "cgroup", "network"])
    );
    assert!(ctl.runner().store().list_stacks("r1", "s1").unwrap().is_empty());
}

#[test]
fn delete_of_missing_resource_is_not_found() {
    let ctl = controller();
    ctl.create_realm(&Realm::new("r1")).unwrap();

    let err = ctl
        .delete_space(&Space::new(" r1 ", "ghost"), false, false)
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("realm=r1 space=ghost"), "{err}");
}

#[test]
fn cell_delete_takes_non_root_containers() {
    let ctl = controller();
    seed_cell(&ctl, ("r", "s", "st", "c"), &["web", "api"]);

    let result = ctl.delete_cell(&Cell::new("r", "s", "st", "c")).unwrap();

    assert_eq!(
        result.deleted,
        strings(&[
            "container:web",
            "container:api",
            "metadata",
            "cgroup",
            "root-container",
        ])
    );
    assert!(ctl.runner().store().list_infra_owned_by("r/s/st/c").unwrap().is_empty());
}

#[test]
fn container_delete_reports_task() {
    let ctl = controller();
    seed_cell(&ctl, ("r", "s", "st", "c"), &["web"]);

    let result = ctl
        .delete_container(&Container::new("r", "s", "st", "c", "web"))
        .unwrap();
    assert!(result.pre.container_exists);
    assert_eq!(result.deleted, strings(&["metadata", "task"]));
    assert!(ctl.list_containers("r", "s", "st", "c").unwrap().is_empty());
}

#[test]
fn delete_failure_releases_session() {
    let ctl = controller();
    ctl.create_realm(&Realm::new("r1")).unwrap();
    ctl.create_space(&Space::new("r1", "s1")).unwrap();
    ctl.runner().fail("delete_space", "device busy");

    let err = ctl.delete_realm(&Realm::new("r1"), false, true).unwrap_err();
    assert_eq!(err.runner_call(), Some((Operation::Delete, Kind::Space)));
    assert!(ctl.runner().calls_to("delete_realm").is_empty());
    assert_eq!(ctl.runner().opened(), ctl.runner().closed());
}

// ── Purge ──────────────────────────────────────────────────────────

#[test]
fn purge_of_unlisted_container_still_cleans() {
    let ctl = controller();
    seed_cell(&ctl, ("r", "s", "st", "c"), &["web"]);

    let result = ctl
        .purge_container(&Container::new("r", "s", "st", "c", "ghost"))
        .unwrap();

    assert!(!result.pre.container_exists);
    assert!(result.pre.cell_metadata_exists);
    assert!(result.purge_succeeded);
    assert_eq!(result.purged, strings(&CONTAINER_PURGE_TAGS));
    assert_eq!(ctl.runner().calls_to("purge_container"), vec!["r/s/st/c/ghost"]);
    assert!(ctl.runner().calls_to("delete_container").is_empty());
}

#[test]
fn purge_of_listed_container_deletes_then_cleans() {
    let ctl = controller();
    seed_cell(&ctl, ("r", "s", "st", "c"), &["web"]);

    let result = ctl
        .purge_container(&Container::new("r", "s", "st", "c", "web"))
        .unwrap();
    assert_eq!(
        result.purged,
        strings(&["metadata", "task", "cni-resources", "ipam-allocation", "cache-entries"])
    );
}

#[test]
fn purge_sweeps_orphaned_infra_without_metadata() {
    let ctl = controller();
    ctl.create_realm(&Realm::new("r1")).unwrap();
    ctl.create_space(&Space::new("r1", "s1")).unwrap();
    // A prior delete removed the metadata but not the host state.
    ctl.runner().store().delete_space("r1", "s1").unwrap();
    ctl.runner()
        .store()
        .put_infra(&InfraRecord::new(InfraKind::Task, "r1_s1_st_c_zombie", "r1/s1/st/c/zombie", 1))
        .unwrap();

    let result = ctl
        .purge_space(&Space::new("r1", "s1"), false, false)
        .unwrap();

    assert!(!result.pre.metadata_exists);
    assert!(result.purge_succeeded);
    assert_eq!(result.purged, strings(&SCOPE_PURGE_TAGS));
    assert!(ctl.runner().store().list_infra_owned_by("r1/s1").unwrap().is_empty());
    assert!(!ctl.runner().exists_cgroup(&NameChain::space("r1", "s1")).unwrap());
}

#[test]
fn purge_downgrades_delete_failure() {
    let ctl = controller();
    seed_stack(&ctl, "r", "s", "st");
    ctl.runner().fail("delete_stack", "disk on fire");

    let result = ctl
        .purge_stack(&Stack::new("r", "s", "st"), true, false)
        .unwrap();

    assert!(result.purge_succeeded);
    assert!(result.purged[0].starts_with("delete-warning:"), "{:?}", result.purged);
    assert!(result.purged[0].contains("disk on fire"));
    assert_eq!(&result.purged[1..], strings(&SCOPE_PURGE_TAGS).as_slice());
    assert!(ctl.runner().calls_to("purge_stack") == vec!["r/s/st"]);
    // The deep clean removed what the failed delete left behind.
    assert!(!ctl.get_stack(&Stack::new("r", "s", "st")).unwrap().metadata_exists);
}

#[test]
fn purge_records_deep_clean_failure() {
    let ctl = controller();
    ctl.create_realm(&Realm::new("r1")).unwrap();
    ctl.runner().fail("purge_realm", "cni plugin crashed");

    let result = ctl.purge_realm(&Realm::new("r1"), false, false).unwrap();

    assert!(!result.purge_succeeded);
    assert_eq!(&result.purged[..3], strings(&["metadata", "cgroup", "namespace"]).as_slice());
    let last = result.purged.last().unwrap();
    assert!(last.starts_with("purge-error:"), "{last}");
    assert!(last.contains("cni plugin crashed"));
}

#[test]
fn purge_applies_dependency_gate() {
    let ctl = controller();
    seed_space_with_stacks(&ctl);

    let err = ctl
        .purge_space(&Space::new("r1", "s1"), false, false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dependency);
    assert!(ctl.runner().calls_to("purge_space").is_empty());
}

#[test]
fn cascade_purge_clears_the_tree() {
    let ctl = controller();
    seed_cell(&ctl, ("r1", "s1", "st1", "c1"), &["web"]);

    let result = ctl.purge_realm(&Realm::new("r1"), false, true).unwrap();

    assert!(result.purge_succeeded);
    assert_eq!(result.purged[0], "space:s1");
    assert_eq!(
        ctl.runner().calls_to("purge_container"),
        vec!["r1/s1/st1/c1/web"]
    );
    assert!(ctl.list_realms().unwrap().is_empty());
    assert!(ctl.runner().store().list_infra_owned_by("r1").unwrap().is_empty());
}

#[test]
fn purge_is_repeatable() {
    let ctl = controller();
    seed_stack(&ctl, "r1", "s1", "st1");

    ctl.purge_realm(&Realm::new("r1"), true, true).unwrap();
    let again = ctl.purge_realm(&Realm::new("r1"), true, true).unwrap();

    assert!(!again.pre.metadata_exists);
    assert!(again.purge_succeeded);
    assert_eq!(again.purged, strings(&SCOPE_PURGE_TAGS));
    assert_eq!(ctl.runner().opened(), ctl.runner().closed());
}

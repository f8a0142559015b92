//! End-to-end lifecycle tests
//!
//! Exercise discovery, install, boot and hook execution together against a
//! real project directory and ledger file.

use ext_manager::{
    BundleRegistry, ConfigResolver, Error, ExtensionManager, HookRegistry, ManagerConfig,
    StartOrder,
};
use ext_test_utils::{CallLog, Descriptor, ExtensionTree, counting_hook};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use tempfile::TempDir;

fn prepared(mgr: ExtensionManager) -> ExtensionManager {
    mgr.prepare().unwrap();
    mgr
}

#[test]
fn discover_install_and_reboot() {
    let tree = ExtensionTree::new();
    tree.add("users", &Descriptor::new("Users").version("1.0"));
    tree.add_grouped(
        "shop",
        "orders",
        &Descriptor::new("Orders")
            .dependencies(&["users"])
            .bundles("handles = \"admin/orders\""),
    );

    let first = prepared(ExtensionManager::from_config(ManagerConfig::for_root(
        tree.root(),
    )));
    assert_eq!(first.uninstalled(None).unwrap(), vec!["users", "orders"]);
    assert!(first.started().is_empty());

    first.install("users", true).unwrap();
    first.install("orders", true).unwrap();
    assert!(first.uninstalled(None).unwrap().is_empty());
    assert_eq!(first.started(), vec!["users", "orders"]);

    // A fresh process boots from the ledger alone.
    let code = Arc::new(BundleRegistry::new());
    let second = ExtensionManager::from_config(ManagerConfig::for_root(tree.root()))
        .with_code_loader(code.clone());
    second.prepare().unwrap();

    assert_eq!(second.started(), vec!["users", "orders"]);
    assert_eq!(code.activation_order(), vec!["users", "orders"]);
    let payload = code.payload("orders").unwrap();
    assert_eq!(
        payload.get("handles").and_then(|v| v.as_str()),
        Some("admin/orders")
    );
    assert!(code.payload("users").is_none());
}

#[test]
fn disabled_extensions_are_not_started_at_boot() {
    let tree = ExtensionTree::new();
    tree.add("users", &Descriptor::new("Users"));
    tree.add("menus", &Descriptor::new("Menus"));

    let mgr = prepared(ExtensionManager::from_config(ManagerConfig::for_root(
        tree.root(),
    )));
    let users = mgr.install("users", true).unwrap();
    mgr.install("menus", false).unwrap();
    mgr.disable(users.id).unwrap();

    let rebooted = prepared(ExtensionManager::from_config(ManagerConfig::for_root(
        tree.root(),
    )));
    assert!(rebooted.started().is_empty());
    assert_eq!(rebooted.disabled(None).unwrap().len(), 2);
}

#[test]
fn hooks_run_once_across_threads() {
    let tree = ExtensionTree::new();
    tree.add(
        "menus",
        &Descriptor::new("Menus")
            .global_routes("menus.routes")
            .listeners("menus.listeners"),
    );

    let (routes, routes_hook) = counting_hook();
    let (listeners, listeners_hook) = counting_hook();
    let hooks = HookRegistry::new()
        .with("menus.routes", routes_hook)
        .with("menus.listeners", listeners_hook);

    let noop = HookRegistry::new()
        .with("menus.routes", || {})
        .with("menus.listeners", || {});
    let setup = prepared(
        ExtensionManager::from_config(ManagerConfig::for_root(tree.root())).with_hooks(noop),
    );
    setup.install("menus", true).unwrap();

    let mgr = Arc::new(
        ExtensionManager::from_config(ManagerConfig::for_root(tree.root())).with_hooks(hooks),
    );
    let workers: Vec<_> = (0..8)
        .map(|_| {
            let mgr = Arc::clone(&mgr);
            thread::spawn(move || {
                mgr.start("menus").unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(routes.load(Ordering::SeqCst), 1);
    assert_eq!(listeners.load(Ordering::SeqCst), 1);
    assert_eq!(mgr.started(), vec!["menus"]);
}

#[test]
fn invalid_global_routes_stops_the_start_sequence() {
    let tree = ExtensionTree::new();
    tree.add(
        "menus",
        &Descriptor::new("Menus")
            .global_routes_raw("42")
            .listeners("menus.listeners"),
    );
    let log = CallLog::new();
    let hooks = HookRegistry::new().with("menus.listeners", log.hook("listeners"));

    let mgr = prepared(
        ExtensionManager::from_config(ManagerConfig::for_root(tree.root())).with_hooks(hooks),
    );
    let err = mgr.install("menus", false).unwrap_err();

    match err {
        Error::InvalidHookType { slug, hook, found } => {
            assert_eq!(slug, "menus");
            assert_eq!(hook, "global_routes");
            assert_eq!(found, "integer");
        }
        other => panic!("expected InvalidHookType, got {other:?}"),
    }
    assert!(log.entries().is_empty());
    assert!(!mgr.is_started("menus"));
    // The record was persisted before the start sequence failed.
    assert_eq!(mgr.installed(None).unwrap().len(), 1);
}

#[test]
fn top_level_descriptor_shadows_grouped_one() {
    let tree = ExtensionTree::new();
    tree.add("users", &Descriptor::new("Top Users").version("2.0"));
    tree.add_grouped("legacy", "users", &Descriptor::new("Old Users").version("1.0"));

    let mgr = prepared(ExtensionManager::from_config(ManagerConfig::for_root(
        tree.root(),
    )));
    assert_eq!(mgr.uninstalled(None).unwrap(), vec!["users"]);

    let users = mgr.install("users", false).unwrap();
    assert_eq!(users.name, "Top Users");
    assert_eq!(users.version, "2.0");
}

#[test]
fn layered_config_drives_discovery_and_boot_order() {
    let tree = ExtensionTree::new();
    let global = TempDir::new().unwrap();
    std::fs::write(
        global.path().join("config.toml"),
        "roots = [\"extensions\"]\nstart_order = \"store\"\n",
    )
    .unwrap();
    tree.write(
        "extmgr.toml",
        "roots = [\"extensions\", \"vendor\"]\nstart_order = \"dependencies\"\n",
    );
    tree.write(
        "vendor/menus/extension.toml",
        "dependencies = [\"users\"]\n\n[info]\nname = \"Menus\"\n",
    );
    tree.add("users", &Descriptor::new("Users"));

    let resolve = || {
        ConfigResolver::new(tree.root())
            .with_global_config_dir(global.path())
            .resolve()
            .unwrap()
    };
    let config = resolve();
    assert_eq!(config.start_order, StartOrder::Dependencies);
    assert_eq!(config.roots.len(), 2);

    let mgr = prepared(ExtensionManager::from_config(config));
    // Installed in reverse dependency order.
    mgr.install("menus", true).unwrap();
    mgr.install("users", true).unwrap();

    let code = Arc::new(BundleRegistry::new());
    let rebooted = ExtensionManager::from_config(resolve()).with_code_loader(code.clone());
    rebooted.prepare().unwrap();
    assert_eq!(code.activation_order(), vec!["users", "menus"]);
}

#[test]
fn cyclic_descriptors_fail_to_sort() {
    let tree = ExtensionTree::new();
    tree.add("a", &Descriptor::new("A").dependencies(&["b"]));
    tree.add("b", &Descriptor::new("B").dependencies(&["c"]));
    tree.add("c", &Descriptor::new("C").dependencies(&["a"]));

    let mgr = ExtensionManager::from_config(ManagerConfig::for_root(tree.root()));
    let err = mgr
        .sort_dependencies(&["a".into(), "b".into(), "c".into()])
        .unwrap_err();
    match err {
        Error::CyclicDependency { participants } => {
            assert_eq!(participants, vec!["a", "b", "c"]);
        }
        other => panic!("expected CyclicDependency, got {other:?}"),
    }
}

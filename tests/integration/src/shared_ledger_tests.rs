//! Several managers sharing one ledger file, as separate processes would.

use ext_manager::{Error, ExtensionManager, ManagerConfig};
use ext_store::Error as StoreError;
use ext_test_utils::{Descriptor, ExtensionTree};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::thread;

fn manager(tree: &ExtensionTree) -> ExtensionManager {
    ExtensionManager::from_config(ManagerConfig::for_root(tree.root()))
}

fn tree_with(slugs: &[&str]) -> ExtensionTree {
    let tree = ExtensionTree::new();
    for slug in slugs {
        tree.add(slug, &Descriptor::new(slug));
    }
    manager(&tree).prepare().unwrap();
    tree
}

#[test]
fn installs_are_visible_to_other_managers() {
    let tree = tree_with(&["users", "menus"]);
    let writer = manager(&tree);
    let reader = manager(&tree);

    writer.install("users", false).unwrap();

    assert_eq!(reader.uninstalled(None).unwrap(), vec!["menus"]);
    let users = reader.installed(None).unwrap().remove(0);
    reader.enable(users.id).unwrap();
    assert_eq!(writer.enabled(None).unwrap()[0].slug, "users");
}

#[test]
fn concurrent_installs_get_distinct_ids() {
    let slugs = ["a", "b", "c", "d", "e", "f"];
    let tree = tree_with(&slugs);
    let root = tree.root().to_path_buf();

    let workers: Vec<_> = slugs
        .iter()
        .map(|slug| {
            let root = root.clone();
            let slug = slug.to_string();
            thread::spawn(move || {
                ExtensionManager::from_config(ManagerConfig::for_root(root))
                    .install(&slug, true)
                    .unwrap()
                    .id
            })
        })
        .collect();
    let ids: HashSet<i64> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    assert_eq!(ids.len(), slugs.len());
    assert_eq!(manager(&tree).installed(None).unwrap().len(), slugs.len());
}

#[test]
fn concurrent_installs_of_one_slug_have_one_winner() {
    let tree = tree_with(&["users"]);
    let root = tree.root().to_path_buf();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let root = root.clone();
            thread::spawn(move || {
                ExtensionManager::from_config(ManagerConfig::for_root(root)).install("users", false)
            })
        })
        .collect();
    let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.into_iter().filter_map(Result::err) {
        assert!(matches!(
            result,
            Error::Persistence(StoreError::DuplicateSlug { ref slug }) if slug == "users"
        ));
    }
    assert_eq!(manager(&tree).installed(None).unwrap().len(), 1);
}

#[test]
fn ledger_is_plain_toml_on_disk() {
    let tree = tree_with(&["users"]);
    manager(&tree).install("users", true).unwrap();

    let ledger = ext_fs::io::read_text(&tree.root().join(".extensions/registry.toml")).unwrap();
    assert!(ledger.contains("version = \"1.0\""));
    assert!(ledger.contains("slug = \"users\""));
    assert!(ledger.contains("enabled = true"));
}

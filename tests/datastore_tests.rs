//! Tests for the ConfigDatastore contract
//!
//! Every check runs against both backends:
//! - FileStore (temp directory)
//! - MemoryStore
//!
//! These tests verify:
//! - Set/get and overwrite semantics
//! - Three-tier resolution (machine → application → global)
//! - Listing and filtering
//! - Remove and init behavior
//! - Concurrent access

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use centralconfig::{ConfigDatastore, ConfigItem, FileStore, MemoryStore};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_file_store() -> (TempDir, Arc<dyn ConfigDatastore>) {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::open_path(&temp_dir.path().join("testing.db")).unwrap();
    (temp_dir, Arc::new(store))
}

/// Run `check` against a fresh store of every backend
fn for_each_backend<F>(check: F)
where
    F: Fn(Arc<dyn ConfigDatastore>),
{
    let (_temp, file_store) = setup_file_store();
    check(file_store);

    check(Arc::new(MemoryStore::new()));
}

fn with_machine(application: &str, machine: &str, name: &str, value: &str) -> ConfigItem {
    ConfigItem::new(application, name, value).with_machine(machine)
}

fn machine_query(application: &str, machine: &str, name: &str) -> ConfigItem {
    ConfigItem::query(application, name).with_machine(machine)
}

// =============================================================================
// Set / Get Tests
// =============================================================================

#[test]
fn test_get_item_doesnt_exist() {
    for_each_backend(|store| {
        let response = store
            .get(&ConfigItem::query("MyTestAppName", "TestItem2"))
            .unwrap();

        assert_eq!(response, ConfigItem::default());
        assert!(response.is_empty());
    });
}

#[test]
fn test_set_assigns_id() {
    for_each_backend(|store| {
        let item = ConfigItem::new("MyTestAppName", "TestItem1", "Value1");

        let stored = store.set(item.clone()).unwrap();

        assert_ne!(stored.id, item.id);
        assert_ne!(stored.id, 0);
        assert_eq!(stored.value, "Value1");
    });
}

#[test]
fn test_set_ignores_caller_supplied_id() {
    for_each_backend(|store| {
        let first = store.set(ConfigItem::new("App", "A", "1")).unwrap();

        let mut sneaky = ConfigItem::new("App", "B", "2");
        sneaky.id = first.id;
        let second = store.set(sneaky).unwrap();

        assert_ne!(second.id, first.id);
        assert_eq!(store.get_all().unwrap().len(), 2);
    });
}

#[test]
fn test_set_then_get() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("MyTestAppName", "TestItem1", "Value1")).unwrap();
        store.set(ConfigItem::new("MyTestAppName", "TestItem2", "Value2")).unwrap();

        let response = store
            .get(&ConfigItem::query("MyTestAppName", "TestItem2"))
            .unwrap();

        assert_eq!(response.value, "Value2");
        assert_eq!(response.name, "TestItem2");
    });
}

#[test]
fn test_set_same_tuple_overwrites() {
    for_each_backend(|store| {
        let first = store.set(ConfigItem::new("App", "Key", "old")).unwrap();
        let second = store.set(ConfigItem::new("App", "Key", "new")).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.get_all().unwrap().len(), 1);
        assert_eq!(store.get(&ConfigItem::query("App", "Key")).unwrap().value, "new");
    });
}

#[test]
fn test_same_name_in_different_apps_has_different_ids() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("MyTestAppName", "TestItem1", "Value1")).unwrap();
        store.set(ConfigItem::new("MyOtherTestAppName", "TestItem1", "Value1")).unwrap();

        let response1 = store.get(&ConfigItem::query("MyTestAppName", "TestItem1")).unwrap();
        let response2 = store
            .get(&ConfigItem::query("MyOtherTestAppName", "TestItem1"))
            .unwrap();

        assert_ne!(response1.id, response2.id);
        assert_eq!(response1.application, "MyTestAppName");
        assert_eq!(response2.application, "MyOtherTestAppName");
    });
}

// =============================================================================
// Resolution Tests
// =============================================================================

#[test]
fn test_get_machine_precedence() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("P", "N", "no-machine")).unwrap();
        store.set(with_machine("P", "M1", "N", "with-machine")).unwrap();

        let without_machine = store.get(&ConfigItem::query("P", "N")).unwrap();
        assert_eq!(without_machine.value, "no-machine");
        assert_eq!(without_machine.machine, "");

        let with_m1 = store.get(&machine_query("P", "M1", "N")).unwrap();
        assert_eq!(with_m1.value, "with-machine");
        assert_eq!(with_m1.machine, "M1");

        // No record for M2: falls back to the application-wide one
        let with_m2 = store.get(&machine_query("P", "M2", "N")).unwrap();
        assert_eq!(with_m2.value, "no-machine");
        assert_eq!(with_m2.machine, "");
    });
}

#[test]
fn test_get_machine_query_prefers_app_over_global() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("*", "N", "global")).unwrap();
        store.set(ConfigItem::new("P", "N", "app")).unwrap();

        let response = store.get(&machine_query("P", "M1", "N")).unwrap();

        assert_eq!(response.value, "app");
    });
}

#[test]
fn test_get_machine_record_not_used_without_machine() {
    for_each_backend(|store| {
        store.set(with_machine("P", "M1", "N", "with-machine")).unwrap();

        let response = store.get(&ConfigItem::query("P", "N")).unwrap();

        assert!(response.is_empty());
    });
}

#[test]
fn test_get_global_fallback() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("MyTestAppName", "TestItem1", "Value1")).unwrap();
        store.set(ConfigItem::new("MyTestAppName", "TestItem2", "Value2")).unwrap();
        store.set(ConfigItem::new("*", "TestItem3", "Global3")).unwrap();

        // Not set for MyTestAppName: the global default is used
        let global = store
            .get(&ConfigItem::query("MyTestAppName", "TestItem3"))
            .unwrap();
        assert_eq!(global.value, "Global3");
        assert!(global.is_global());

        let specific = store
            .get(&ConfigItem::query("MyTestAppName", "TestItem2"))
            .unwrap();
        assert_eq!(specific.value, "Value2");
        assert!(!specific.is_global());
    });
}

#[test]
fn test_get_app_overrides_global() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("*", "N", "g")).unwrap();
        store.set(ConfigItem::new("P", "N", "p")).unwrap();

        assert_eq!(store.get(&ConfigItem::query("P", "N")).unwrap().value, "p");
        assert_eq!(store.get(&ConfigItem::query("Q", "N")).unwrap().value, "g");
    });
}

#[test]
fn test_get_machine_specific_global_is_not_a_fallback() {
    for_each_backend(|store| {
        store.set(with_machine("*", "M1", "N", "global-m1")).unwrap();

        let response = store.get(&machine_query("P", "M1", "N")).unwrap();

        assert!(response.is_empty());
    });
}

// =============================================================================
// Listing Tests
// =============================================================================

#[test]
fn test_get_all_no_initial_data() {
    for_each_backend(|store| {
        assert!(store.get_all().unwrap().is_empty());
        assert!(store.get_all_applications().unwrap().is_empty());
    });
}

#[test]
fn test_get_all_and_applications() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("MyApp", "TestItem1", "Value1")).unwrap();
        store.set(ConfigItem::new("MyApp", "TestItem2", "Value2")).unwrap();
        store.set(ConfigItem::new("Other", "TestItem3", "Value3")).unwrap();
        store.set(ConfigItem::new("*", "TestItem4", "Value4")).unwrap();

        assert_eq!(store.get_all().unwrap().len(), 4);

        let applications: HashSet<String> =
            store.get_all_applications().unwrap().into_iter().collect();
        let expected: HashSet<String> = ["MyApp", "Other", "*"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(applications, expected);
    });
}

#[test]
fn test_get_all_applications_has_no_duplicates() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("A", "x", "1")).unwrap();
        store.set(ConfigItem::new("A", "y", "2")).unwrap();
        store.set(with_machine("A", "M1", "x", "3")).unwrap();
        store.set(ConfigItem::new("B", "x", "4")).unwrap();
        store.set(ConfigItem::new("*", "x", "5")).unwrap();

        let applications = store.get_all_applications().unwrap();

        assert_eq!(applications.len(), 3);
    });
}

#[test]
fn test_get_all_for_application_no_machine() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("MyTestAppName", "TestItem1", "Value1")).unwrap();
        store.set(ConfigItem::new("MyTestAppName", "TestItem2", "Value2")).unwrap();

        let response = store.get_all_for_application("MyTestAppName").unwrap();

        assert_eq!(response.len(), 2);
    });
}

#[test]
fn test_get_all_for_application_with_machine() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("MyTestAppName", "TestItem1", "Value1")).unwrap();
        store.set(ConfigItem::new("MyTestAppName", "TestItem2", "Value2")).unwrap();
        store.set(with_machine("MyTestAppName", "APPBOX1", "TestItem2", "Value2")).unwrap();

        let response = store.get_all_for_application("MyTestAppName").unwrap();

        assert_eq!(response.len(), 3);
    });
}

#[test]
fn test_get_all_for_application_excludes_other_apps_and_global() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("P", "a", "1")).unwrap();
        store.set(with_machine("P", "M1", "a", "2")).unwrap();
        store.set(ConfigItem::new("Q", "a", "3")).unwrap();
        store.set(ConfigItem::new("*", "a", "4")).unwrap();

        let for_p = store.get_all_for_application("P").unwrap();
        assert_eq!(for_p.len(), 2);
        assert!(for_p.iter().all(|item| item.application == "P"));

        let globals = store.get_all_for_application("*").unwrap();
        assert_eq!(globals.len(), 1);
        assert_eq!(globals[0].value, "4");

        assert!(store.get_all_for_application("missing").unwrap().is_empty());
    });
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_remove_item_doesnt_exist() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("Keep", "k", "v")).unwrap();
        let before = store.get_all().unwrap();

        store
            .remove(&ConfigItem::new("MyTestAppName", "TestItem1", "Value1"))
            .unwrap();

        assert_eq!(store.get_all().unwrap(), before);
    });
}

#[test]
fn test_remove_no_machine() {
    for_each_backend(|store| {
        let item = ConfigItem::new("MyTestAppName", "TestItem1", "Value1");
        store.set(item.clone()).unwrap();

        store.remove(&item).unwrap();

        assert!(store.get(&ConfigItem::query("MyTestAppName", "TestItem1")).unwrap().is_empty());
        assert!(store.get_all().unwrap().is_empty());
    });
}

#[test]
fn test_remove_with_machine_only_removes_exact_tuple() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("P", "N", "no-machine")).unwrap();
        let machine_item = with_machine("P", "APPBOX1", "N", "with-machine");
        store.set(machine_item.clone()).unwrap();

        store.remove(&machine_item).unwrap();

        assert_eq!(store.get_all_for_application("P").unwrap().len(), 1);
        let response = store.get(&machine_query("P", "APPBOX1", "N")).unwrap();
        assert_eq!(response.value, "no-machine");
    });
}

#[test]
fn test_remove_ignores_value_and_id() {
    for_each_backend(|store| {
        store.set(ConfigItem::new("P", "N", "stored")).unwrap();

        let mut request = ConfigItem::new("P", "N", "something else");
        request.id = 9999;
        store.remove(&request).unwrap();

        assert!(store.get_all().unwrap().is_empty());
    });
}

#[test]
fn test_set_after_remove_gets_fresh_id() {
    for_each_backend(|store| {
        let first = store.set(ConfigItem::new("P", "N", "1")).unwrap();
        store.remove(&first).unwrap();

        let second = store.set(ConfigItem::new("P", "N", "2")).unwrap();

        assert_ne!(first.id, second.id);
    });
}

// =============================================================================
// Init Tests
// =============================================================================

#[test]
fn test_init_store_is_idempotent() {
    for_each_backend(|store| {
        store.init_store(false).unwrap();
        store.set(ConfigItem::new("P", "N", "v")).unwrap();

        store.init_store(false).unwrap();
        store.init_store(false).unwrap();

        assert_eq!(store.get_all().unwrap().len(), 1);
    });
}

#[test]
fn test_init_store_overwrite_resets() {
    for_each_backend(|store| {
        let old = store.set(ConfigItem::new("P", "N", "v")).unwrap();

        store.init_store(true).unwrap();

        assert!(store.get_all().unwrap().is_empty());
        assert!(store.get_all_applications().unwrap().is_empty());

        // Works as usual afterwards
        let new = store.set(ConfigItem::new("P", "N", "w")).unwrap();
        assert_ne!(new.id, 0);
        assert_ne!(new.id, old.id);
        assert_eq!(store.get(&ConfigItem::query("P", "N")).unwrap().value, "w");
    });
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_sets_get_unique_ids() {
    for_each_backend(|store| {
        let mut handles = Vec::new();

        for t in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..25 {
                    store
                        .set(ConfigItem::new(format!("app{}", t), format!("key{}", i), "v"))
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let items = store.get_all().unwrap();
        assert_eq!(items.len(), 200);

        let ids: HashSet<u64> = items.iter().map(|item| item.id).collect();
        assert_eq!(ids.len(), 200);
        assert_eq!(store.get_all_applications().unwrap().len(), 8);
    });
}

#[test]
fn test_concurrent_overwrites_keep_single_record() {
    for_each_backend(|store| {
        let mut handles = Vec::new();

        for t in 0..4 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..25 {
                    store
                        .set(ConfigItem::new("shared", "key", format!("{}-{}", t, i)))
                        .unwrap();
                    let current = store.get(&ConfigItem::query("shared", "key")).unwrap();
                    assert!(!current.is_empty());
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_all().unwrap().len(), 1);
    });
}

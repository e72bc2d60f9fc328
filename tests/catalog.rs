use memfamily::{CatalogConfig, CatalogError, FamilyCatalog, register_struct};

fn register_n_different_structures(catalog: &mut FamilyCatalog, n: usize) {
    for i in 1..=n {
        catalog
            .register_family(&format!("test_t{i}"), 4096)
            .unwrap();
    }
}

fn with_page_size(page_size: usize) -> FamilyCatalog {
    FamilyCatalog::with_config(CatalogConfig::with_page_size(page_size).unwrap())
}

#[test]
fn lookup_for_existent_family() {
    let mut catalog = with_page_size(4096);
    assert_eq!(catalog.capacity_per_page(), 60);

    register_n_different_structures(&mut catalog, 180);

    assert_eq!(catalog.page_count(), 3);
    assert_eq!(catalog.len(), 180);

    let family = catalog.lookup("test_t70").unwrap();
    assert_eq!(family.name(), "test_t70");
    assert_eq!(family.size(), 4096);

    assert!(catalog.lookup("test_t181").is_none());
}

#[test]
fn lookup_for_non_existent_family() {
    let catalog = FamilyCatalog::new();

    assert!(catalog.lookup("test_t70").is_none());
}

#[test]
fn register_same_family_twice() {
    let mut catalog = FamilyCatalog::new();

    catalog.register_family("struct_t", 8).unwrap();
    let err = catalog.register_family("struct_t", 8).unwrap_err();

    assert!(matches!(err, CatalogError::AlreadyRegistered { .. }));
    assert_eq!(
        catalog.families().filter(|f| f.name() == "struct_t").count(),
        1
    );
}

#[test]
fn one_more_than_a_page_needs_two_pages() {
    let mut catalog = with_page_size(1024);
    let capacity = catalog.capacity_per_page();

    for i in 0..=capacity {
        catalog.register_family(&format!("family_{i}"), 64).unwrap();
    }

    assert_eq!(catalog.page_count(), 2);
    for i in 0..=capacity {
        assert_eq!(catalog.lookup(&format!("family_{i}")).unwrap().size(), 64);
    }
}

#[test]
fn every_registered_family_is_found_with_its_size() {
    let mut catalog = with_page_size(512);
    let families: Vec<(String, usize)> = (1..=40).map(|i| (format!("type_{i}"), i * 8)).collect();

    for (name, size) in &families {
        catalog.register_family(name, *size).unwrap();
    }

    for (name, size) in &families {
        assert_eq!(catalog.lookup(name).map(|f| f.size() as usize), Some(*size));
    }

    let mut names: Vec<&str> = catalog.families().map(|f| f.name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), families.len());
}

#[test]
fn oversized_family_is_skipped_and_others_continue() {
    let mut catalog = FamilyCatalog::new();
    let page_size = catalog.page_size();

    catalog.register_family("small_t", 8).unwrap();
    let err = catalog.register_family("big_t", page_size + 1).unwrap_err();
    catalog.register_family("other_t", 16).unwrap();

    assert!(matches!(err, CatalogError::OversizedFamily { .. }));
    assert!(catalog.lookup("big_t").is_none());
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.page_count(), 1);
}

#[test]
fn traversals_are_deterministic() {
    let mut catalog = with_page_size(256);
    for i in 0..10 {
        catalog.register_family(&format!("f{i}"), 8).unwrap();
    }

    let first: Vec<_> = catalog.families().copied().collect();
    let second: Vec<_> = catalog.families().copied().collect();
    assert_eq!(first, second);

    let mut report_a = Vec::new();
    let mut report_b = Vec::new();
    catalog.write_report(&mut report_a).unwrap();
    catalog.write_report(&mut report_b).unwrap();
    assert_eq!(report_a, report_b);
}

#[test]
fn register_struct_on_an_explicit_catalog() {
    #[allow(dead_code)]
    struct HashNode {
        key: u64,
        value: u64,
        next: Option<Box<HashNode>>,
    }

    let mut catalog = FamilyCatalog::new();
    register_struct!(catalog, HashNode).unwrap();

    assert_eq!(
        catalog.lookup("HashNode").unwrap().size() as usize,
        std::mem::size_of::<HashNode>()
    );
    assert!(matches!(
        register_struct!(catalog, HashNode),
        Err(CatalogError::AlreadyRegistered { .. })
    ));
}

#[test]
fn page_provider_round_trip() {
    let page_size = memfamily::system_page_size();
    let addr = memfamily::acquire(1, page_size).unwrap();

    unsafe {
        assert_eq!(*addr.as_ptr(), 0);
        *addr.as_ptr() = 42;
        assert_eq!(*addr.as_ptr(), 42);

        memfamily::release(addr, 1, page_size).unwrap();
    }
}

#[cfg(target_pointer_width = "64")]
#[test]
fn register_struct_rejects_types_wider_than_a_slot_size() {
    let mut catalog = FamilyCatalog::new();

    let err = register_struct!(catalog, [u8; (1usize << 32) + 8]).unwrap_err();

    assert!(matches!(
        err,
        CatalogError::OversizedFamily { size, .. } if size == (1usize << 32) + 8
    ));
    assert!(catalog.is_empty());
    assert_eq!(catalog.page_count(), 0);
}

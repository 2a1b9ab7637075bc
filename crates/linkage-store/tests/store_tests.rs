use approx::assert_relative_eq;
use linkage_solver::{solve_pose, ConfigurationError, Joint, Linkage, Rod, SolverConfig};
use linkage_store::{LinkageRepository, MemoryRepository, StoreError};

// ── Helper Functions ─────────────────────────────────────────────────────

fn four_bar() -> Linkage {
    let joints = vec![
        Joint::fixed(0.0, 0.0),
        Joint::driven(10.0, 0.0),
        Joint::new(20.0, 10.0).tracked(),
        Joint::new(10.0, 20.0),
    ];
    let rods = vec![Rod::new(0, 1), Rod::new(1, 2), Rod::new(2, 3), Rod::new(3, 0)];
    Linkage::new(joints, rods, 5.0).unwrap()
}

fn rocker() -> Linkage {
    let joints = vec![
        Joint::fixed(0.0, 0.0),
        Joint::driven(10.0, 0.0),
        Joint::new(5.0, 8.0),
        Joint::new(-5.0, 6.0),
    ];
    let rods = vec![Rod::new(0, 2), Rod::new(1, 2), Rod::new(2, 3), Rod::new(0, 3)];
    Linkage::new(joints, rods, 2.0).unwrap()
}

// ── Save / Load ──────────────────────────────────────────────────────────

#[test]
fn test_save_then_load_preserves_linkage() {
    let mut repo = MemoryRepository::new();
    let original = four_bar();
    repo.save("four-bar", &original).unwrap();

    let loaded = repo.load("four-bar").unwrap();
    assert_eq!(loaded.rods(), original.rods());
    assert_eq!(loaded.fixed_joint(), 0);
    assert_eq!(loaded.driven_joint(), 1);
    assert_eq!(loaded.tracked_joints().collect::<Vec<_>>(), vec![2]);
    assert_eq!(loaded.radius(), 5.0);
    for (a, b) in loaded.rest_lengths().iter().zip(original.rest_lengths().iter()) {
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn test_loaded_linkage_solves_like_original() {
    let mut repo = MemoryRepository::new();
    repo.save("rocker", &rocker()).unwrap();
    let loaded = repo.load("rocker").unwrap();

    let config = SolverConfig::default();
    let a = solve_pose(&rocker(), 1.0, &rocker().rest_pose(), &config).unwrap();
    let b = solve_pose(&loaded, 1.0, &loaded.rest_pose(), &config).unwrap();
    for (p, q) in a.pose.positions().iter().zip(b.pose.positions()) {
        assert_relative_eq!((p - q).norm(), 0.0, epsilon = 1e-6);
    }
}

#[test]
fn test_metadata_records_name() {
    let mut repo = MemoryRepository::new();
    repo.save("rocker", &rocker()).unwrap();
    let (_, metadata) = repo.load_with_metadata("rocker").unwrap();
    assert_eq!(metadata.name, "rocker");
}

#[test]
fn test_duplicate_name_rejected() {
    let mut repo = MemoryRepository::new();
    repo.save("linkage", &four_bar()).unwrap();
    let before = repo.document("linkage").unwrap().to_string();

    assert_eq!(
        repo.save("linkage", &rocker()).unwrap_err(),
        StoreError::AlreadyExists("linkage".into())
    );
    // The first document is untouched.
    assert_eq!(repo.document("linkage").unwrap(), before);
    assert_eq!(repo.len(), 1);
}

#[test]
fn test_empty_name_rejected() {
    let mut repo = MemoryRepository::new();
    assert_eq!(repo.save("", &rocker()).unwrap_err(), StoreError::EmptyName);
    assert!(repo.is_empty());
}

#[test]
fn test_load_missing() {
    let repo = MemoryRepository::new();
    assert_eq!(
        repo.load("nothing").unwrap_err(),
        StoreError::NotFound("nothing".into())
    );
}

// ── Delete / List ────────────────────────────────────────────────────────

#[test]
fn test_delete_and_names() {
    let mut repo = MemoryRepository::new();
    repo.save("b", &rocker()).unwrap();
    repo.save("a", &four_bar()).unwrap();
    assert_eq!(repo.names(), vec!["a".to_string(), "b".to_string()]);
    assert!(repo.contains("a"));

    repo.delete("a").unwrap();
    assert!(!repo.contains("a"));
    assert_eq!(repo.names(), vec!["b".to_string()]);

    assert_eq!(repo.delete("a").unwrap_err(), StoreError::NotFound("a".into()));
}

#[test]
fn test_name_reusable_after_delete() {
    let mut repo = MemoryRepository::new();
    repo.save("x", &rocker()).unwrap();
    repo.delete("x").unwrap();
    repo.save("x", &four_bar()).unwrap();
    assert_eq!(repo.load("x").unwrap().rod_count(), 4);
}

// ── Imported Documents ───────────────────────────────────────────────────

#[test]
fn test_import_with_default_role_flags() {
    let json = r#"{
        "format": "linkage",
        "version": 1,
        "metadata": { "name": "imported", "saved": "2024-01-01T00:00:00Z" },
        "linkage": {
            "joints": [
                { "x": 0.0, "y": 0.0, "fixed": true },
                { "x": 10.0, "y": 0.0, "driven": true },
                { "x": 5.0, "y": 8.0 },
                { "x": -5.0, "y": 6.0, "tracked": true }
            ],
            "rods": [[0, 2], [1, 2], [2, 3], [0, 3]],
            "radius": 2.0
        }
    }"#;
    let mut repo = MemoryRepository::new();
    repo.import_document("imported", json).unwrap();

    let linkage = repo.load("imported").unwrap();
    assert_eq!(linkage.free_joints(), &[2, 3]);
    assert_eq!(linkage.primary_tracked_joint(), 3);
    assert!(linkage.mobility().is_exact());
}

#[test]
fn test_malformed_document_yields_nothing() {
    let mut repo = MemoryRepository::new();
    repo.import_document("broken", r#"{"format": "linkage", "version": 1"#)
        .unwrap();
    assert!(matches!(repo.load("broken"), Err(StoreError::ParseError(_))));
}

#[test]
fn test_unknown_joint_field_rejected() {
    let json = r#"{
        "format": "linkage",
        "version": 1,
        "metadata": { "name": "odd", "saved": "2024-01-01T00:00:00Z" },
        "linkage": {
            "joints": [
                { "x": 0.0, "y": 0.0, "fixed": true, "colour": "red" },
                { "x": 1.0, "y": 0.0, "driven": true }
            ],
            "rods": [[0, 1]],
            "radius": 1.0
        }
    }"#;
    let mut repo = MemoryRepository::new();
    repo.import_document("odd", json).unwrap();
    assert!(matches!(repo.load("odd"), Err(StoreError::ParseError(_))));
}

#[test]
fn test_invalid_roles_surface_configuration_error() {
    let json = r#"{
        "format": "linkage",
        "version": 1,
        "metadata": { "name": "two-fixed", "saved": "2024-01-01T00:00:00Z" },
        "linkage": {
            "joints": [
                { "x": 0.0, "y": 0.0, "fixed": true },
                { "x": 1.0, "y": 0.0, "fixed": true },
                { "x": 2.0, "y": 0.0, "driven": true }
            ],
            "rods": [[0, 1], [1, 2]],
            "radius": 1.0
        }
    }"#;
    let mut repo = MemoryRepository::new();
    repo.import_document("two-fixed", json).unwrap();
    assert_eq!(
        repo.load("two-fixed").unwrap_err(),
        StoreError::Invalid(ConfigurationError::DuplicateFixedJoint { first: 0, second: 1 })
    );
}

use contentops_core::confirm::Scripted;
use contentops_core::repository::{ContentService, LocationService};
use contentops_core::{
    run, run_confirmed, ContentId, DeleteContent, ExecutionContext, FailureKind, Identity,
    InMemoryRepository, LocationId, MoveRow, NullReporter, RelocateSubtree, Snapshot,
    SnapshotBuilder, StripLinks, UserId,
};
use std::fs;
use tempfile::TempDir;

const ADMIN: u64 = 14;

fn admin() -> Identity {
    Identity {
        user_id: UserId(ADMIN),
        login: "admin".to_string(),
    }
}

fn site() -> SnapshotBuilder {
    // 1
    // ├── 2
    // │   └── 123
    // │       └── 124
    // ├── 456
    // └── 789
    SnapshotBuilder::new()
        .with_admin(ADMIN)
        .folder(1, 1, None)
        .folder(2, 2, Some(1))
        .folder(123, 123, Some(2))
        .folder(124, 124, Some(123))
        .folder(456, 456, Some(1))
        .folder(789, 789, Some(1))
}

#[test]
fn test_relocation_rows_see_earlier_moves() {
    let repo = InMemoryRepository::new(site().build());
    let identity = admin();
    let ctx = ExecutionContext::new(&identity, &repo);

    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("moves.csv");
    fs::write(&input, "locationId,newParentLocationId\n123,456\n789,123\n").unwrap();
    let rows = contentops_core::load_move_rows(&input).unwrap();

    let result = run(&rows, &RelocateSubtree, &ctx, &mut NullReporter);

    assert!(result.all_succeeded(), "{result:?}");
    assert_eq!(
        repo.load_location(LocationId(123)).unwrap().path_string,
        "/1/456/123/"
    );
    assert_eq!(
        repo.load_location(LocationId(124)).unwrap().path_string,
        "/1/456/123/124/"
    );
    let moved = repo.load_location(LocationId(789)).unwrap();
    assert_eq!(moved.parent_id, Some(LocationId(123)));
    assert_eq!(moved.path_string, "/1/456/123/789/");
}

#[test]
fn test_relocation_into_own_subtree_leaves_position_unchanged() {
    let repo = InMemoryRepository::new(site().build());
    let identity = admin();
    let ctx = ExecutionContext::new(&identity, &repo);

    let rows = [
        MoveRow {
            location_id: LocationId(2),
            new_parent_location_id: LocationId(124),
        },
        MoveRow {
            location_id: LocationId(2),
            new_parent_location_id: LocationId(2),
        },
        MoveRow {
            location_id: LocationId(999),
            new_parent_location_id: LocationId(1),
        },
    ];
    let result = run(&rows, &RelocateSubtree, &ctx, &mut NullReporter);

    let kinds: Vec<_> = result
        .outcomes
        .iter()
        .map(|o| o.outcome.failure_kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(FailureKind::InvalidArgument),
            Some(FailureKind::InvalidArgument),
            Some(FailureKind::NotFound),
        ]
    );
    assert_eq!(repo.load_location(LocationId(2)).unwrap().path_string, "/1/2/");
}

#[test]
fn test_declined_confirmation_touches_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("repository.json");
    site().build().save(&path).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    let repo = InMemoryRepository::open(&path).unwrap();
    let identity = admin();
    let ctx = ExecutionContext::new(&identity, &repo);
    let mut gate = Scripted::new(&[false]);

    let err = run_confirmed(
        &[ContentId(2), ContentId(456)],
        &DeleteContent,
        &ctx,
        &mut gate,
        &mut NullReporter,
    )
    .unwrap_err();

    assert!(err.is_aborted());
    assert_eq!(gate.shown.len(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_interrupted_batches_keep_earlier_mutations() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("repository.json");
    site().build().save(&path).unwrap();

    {
        let repo = InMemoryRepository::open(&path).unwrap();
        let identity = admin();
        let ctx = ExecutionContext::new(&identity, &repo);
        let result = run(
            &[ContentId(456), ContentId(31337), ContentId(789)],
            &DeleteContent,
            &ctx,
            &mut NullReporter,
        );
        assert_eq!(result.len(), 3);
        assert_eq!(result.failed_count(), 1);
    }

    let reloaded = Snapshot::load(&path).unwrap();
    assert!(reloaded.contents.iter().all(|c| c.id != ContentId(456)));
    assert!(reloaded.contents.iter().all(|c| c.id != ContentId(789)));
    assert!(reloaded.contents.iter().any(|c| c.id == ContentId(2)));
}

#[test]
fn test_strip_links_persists_cleaned_body() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("repository.json");
    SnapshotBuilder::new()
        .with_admin(ADMIN)
        .folder(1, 1, None)
        .article(
            10,
            10,
            Some(1),
            r#"<p>See <LINK url_id="42">here</LINK> <b>now</b></p>"#,
        )
        .build()
        .save(&path)
        .unwrap();

    let repo = InMemoryRepository::open(&path).unwrap();
    let identity = admin();
    let ctx = ExecutionContext::new(&identity, &repo);
    let result = run(&[ContentId(10)], &StripLinks::new("body"), &ctx, &mut NullReporter);
    assert_eq!(result.changed_count(), 1);
    drop(repo);

    let reopened = InMemoryRepository::open(&path).unwrap();
    let content = reopened.load_content(ContentId(10)).unwrap();
    let body = content.field("body").unwrap().as_rich_text().unwrap();
    assert_eq!(body.to_xml(), "<p>See here <b>now</b></p>");
}

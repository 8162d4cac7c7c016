use contentops_core::{
    load_inline, run, ContentId, DeleteContent, ExecutionContext, Identity, InMemoryRepository,
    NullReporter, Republish, SnapshotBuilder, UserId,
};
use proptest::prelude::*;

fn repository(existing: &[u64]) -> InMemoryRepository {
    let mut builder = SnapshotBuilder::new().with_admin(14).folder(1, 1, None);
    for id in existing {
        builder = builder.folder(*id, *id, Some(1));
    }
    InMemoryRepository::new(builder.build())
}

fn admin() -> Identity {
    Identity {
        user_id: UserId(14),
        login: "admin".to_string(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_one_outcome_per_record(ids in proptest::collection::vec(2u64..40, 0..25)) {
        let repo = repository(&[2, 3, 5, 7, 11, 13]);
        let identity = admin();
        let ctx = ExecutionContext::new(&identity, &repo);
        let records: Vec<ContentId> = ids.iter().copied().map(ContentId).collect();

        let result = run(&records, &DeleteContent, &ctx, &mut NullReporter);

        prop_assert_eq!(result.len(), records.len());
        for (index, (outcome, record)) in result.outcomes.iter().zip(&records).enumerate() {
            prop_assert_eq!(outcome.index, index);
            prop_assert_eq!(&outcome.key, &record.to_string());
        }
    }

    #[test]
    fn prop_republish_never_aborts(list in "[0-9 ,]{0,40}") {
        let records: Vec<ContentId> = match load_inline(&list) {
            Ok(records) => records,
            Err(_) => return Ok(()),
        };
        let repo = repository(&[2, 3]);
        let identity = admin();
        let ctx = ExecutionContext::new(&identity, &repo);

        let result = run(&records, &Republish, &ctx, &mut NullReporter);
        prop_assert_eq!(result.len(), records.len());
        prop_assert_eq!(result.succeeded_count() + result.failed_count(), records.len());
    }
}

//! Store properties observed through the cache facade.

use lectern_tests::prelude::*;
use std::rc::Rc;

const SECTIONS: &str = "query Sections { sections { id lead { id } stages { id title } } }";

fn sections_payload(count: usize) -> serde_json::Value {
    let sections: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "id": format!("s{i}"),
                "lead": {"id": "x1"},
                "stages": [{"id": "x1", "title": "Intro"}, {"id": format!("y{i}"), "title": "Own"}]
            })
        })
        .collect();
    json!({ "sections": sections })
}

async fn seeded(count: usize) -> Cache {
    let transport = ScriptedTransport::new().respond("Sections", sections_payload(count));
    let cache = cache_over(Rc::new(transport));
    cache
        .query(&op(SECTIONS), &Variables::new(), FetchPolicy::NetworkOnly)
        .await
        .unwrap();
    cache
}

mod deletion {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_delete_clears_every_referrer() {
        // GIVEN five sections that each reference x1 twice
        let cache = seeded(5).await;
        assert_eq!(cache.store().references_to(&EntityId::new("x1")).count(), 10);

        // WHEN x1 is deleted
        cache.write(|handle| handle.delete(&EntityId::new("x1")));

        // THEN no field anywhere still points at it
        let store = cache.store();
        assert_eq!(store.references_to(&EntityId::new("x1")).count(), 0);
        for i in 0..5 {
            let section = store.get(&EntityId::new(format!("s{i}"))).unwrap();
            assert_eq!(section.get("lead").and_then(|v| v.as_scalar()), Some(&Value::Null));
            assert_eq!(
                section.get("stages").and_then(|v| v.as_link_list()),
                Some(&[EntityId::new(format!("y{i}"))][..])
            );
        }
        assert!(store.index_is_consistent());
    }

    #[tokio::test]
    async fn test_deleted_lead_resolves_as_null() {
        let cache = seeded(1).await;
        cache.write(|handle| handle.delete(&EntityId::new("x1")));

        let resolution = cache
            .query(&op(SECTIONS), &Variables::new(), FetchPolicy::CacheOnly)
            .await
            .unwrap();

        assert_eq!(
            resolution.data.to_json(),
            json!({"sections": [{"id": "s0", "lead": null, "stages": [{"id": "y0", "title": "Own"}]}]})
        );
    }
}

mod consistency {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_index_survives_mixed_edits() {
        let cache = seeded(3).await;

        cache.write(|handle| {
            let s0 = EntityId::new("s0");
            handle.set_link(&s0, "lead", EntityId::new("y1")).unwrap();
            handle.set_links(&s0, "stages", vec![EntityId::new("y2"), EntityId::new("x1")]).unwrap();
            handle.delete_link(&EntityId::new("s1"), "stages", &EntityId::new("x1")).unwrap();
            handle.set_scalar(&EntityId::new("s2"), "lead", "nobody").unwrap();
            handle.delete(&EntityId::new("y0"));
        });

        let store = cache.store();
        assert!(store.index_is_consistent());
        let referrers: Vec<_> = store
            .references_to(&EntityId::new("x1"))
            .map(|reference| format!("{}.{}", reference.referrer, reference.field))
            .collect();
        assert_eq!(referrers, vec!["s0.stages", "s1.lead", "s2.stages"]);
    }

    #[tokio::test]
    async fn test_edit_on_absent_record_is_an_error() {
        let cache = seeded(1).await;
        let before = cache.snapshot();

        let result = cache.write(|handle| handle.set_scalar(&EntityId::new("ghost"), "title", "Boo"));

        assert!(result.is_err());
        assert_eq!(cache.snapshot(), before);
    }
}

mod collection {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_gc_removes_records_unreachable_from_roots() {
        // GIVEN the root list replaced by a scalar
        let cache = seeded(2).await;
        cache.write(|handle| handle.set_scalar(&EntityId::root_query(), "sections", Value::Null).unwrap());

        // WHEN collecting
        let removed = cache.gc();

        // THEN every section and stage went, the root stayed
        assert_eq!(removed.len(), 5);
        let store = cache.store();
        assert_eq!(store.len(), 1);
        assert!(store.contains(&EntityId::root_query()));
    }

    #[tokio::test]
    async fn test_gc_keeps_reachable_records() {
        let cache = seeded(2).await;

        let removed = cache.gc();

        assert!(removed.is_empty());
        assert!(cache.store().contains(&EntityId::new("x1")));
    }
}

mod identity {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_unkeyable_entity_skips_only_its_field() {
        let transport = ScriptedTransport::new().respond(
            "Course",
            json!({"course": {
                "id": "c1",
                "title": "Cloud",
                "instructor": {"__typename": "Instructor", "name": "Ann"}
            }}),
        );
        let cache = cache_over(Rc::new(transport));

        let result = cache
            .query(
                &op("query Course { course { id title instructor { __typename name } } }"),
                &Variables::new(),
                FetchPolicy::NetworkOnly,
            )
            .await
            .unwrap();

        assert!(!result.is_complete());
        assert_eq!(
            result.warnings,
            vec![StoreError::missing_identifier("Instructor", "course.instructor")]
        );
        let store = cache.store();
        let course = store.get(&EntityId::new("c1")).unwrap();
        assert!(course.has("title"));
        assert!(!course.has("instructor"));
    }
}

mod warnings {
    use super::*;
    use pretty_assertions::assert_eq;

    const COURSE: &str = "query Course { course { id instructor { __typename name } } }";

    #[tokio::test]
    async fn test_refetch_reports_what_could_not_be_stored() {
        // GIVEN a view whose response carries an instructor without a key
        let transport = ScriptedTransport::new().respond(
            "Course",
            json!({"course": {"id": "c1", "instructor": {"__typename": "Instructor", "name": "Ann"}}}),
        );
        let cache = cache_over(Rc::new(transport));
        let view = cache.watch(&op(COURSE), Variables::new(), |_| {}).unwrap();

        // WHEN the view refetches
        let resolution = view.refetch().await.unwrap();

        // THEN the caller learns why the view is still incomplete
        assert!(!resolution.is_clean());
        assert!(matches!(
            resolution.warnings.as_slice(),
            [StoreError::MissingIdentifier { typename, .. }] if typename == "Instructor"
        ));
        assert_eq!(resolution.missing_fields.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_reads_carry_no_warnings() {
        let transport = ScriptedTransport::new().respond(
            "Course",
            json!({"course": {"id": "c1", "instructor": {"__typename": "Instructor", "name": "Ann"}}}),
        );
        let cache = cache_over(Rc::new(transport));
        cache
            .query(&op(COURSE), &Variables::new(), FetchPolicy::NetworkOnly)
            .await
            .unwrap();

        let cached = cache
            .query(&op(COURSE), &Variables::new(), FetchPolicy::CacheOnly)
            .await
            .unwrap();

        assert_eq!(cached.warnings, vec![]);
    }
}

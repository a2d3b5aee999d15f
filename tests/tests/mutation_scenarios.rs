//! Mutation scenarios: normalize, updater, notify.

use lectern_tests::prelude::*;
use std::rc::Rc;
use tokio::task::{spawn_local, LocalSet};

const SECTION: &str = "query Section($id: ID!) { section(id: $id) { id title stages { id title } } }";
const DELETE_STAGE: &str = "mutation DeleteStage($id: ID!) { deleteStage(id: $id) { id } }";

fn section_data() -> serde_json::Value {
    json!({"section": {
        "id": "s1",
        "title": "Basics",
        "stages": [{"id": "x1", "title": "Intro"}, {"id": "x2", "title": "Setup"}]
    }})
}

mod delete_stage {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_delete_removes_link_and_notifies_once() {
        // GIVEN a section with stages [x1, x2] watched by two views
        let transport = ScriptedTransport::new()
            .respond("Section", section_data())
            .respond("DeleteStage", json!({"deleteStage": {"id": "x1"}}));
        let cache = cache_over(Rc::new(transport));
        let section = op(SECTION);
        let variables = vars(json!({"id": "s1"}));
        cache.query(&section, &variables, FetchPolicy::NetworkOnly).await.unwrap();

        let stages = Recorder::new();
        let _stages_view = cache.watch(&section, variables.clone(), stages.callback()).unwrap();
        let other = Recorder::new();
        let _other_view = cache
            .watch(&op("{ section(id: \"s2\") { id } }"), Variables::new(), other.callback())
            .unwrap();

        // WHEN the delete mutation commits with an updater removing x1
        let outcome = cache
            .mutation(&op(DELETE_STAGE))
            .variables(vars(json!({"id": "x1"})))
            .updater(|handle, data| {
                if let Some(id) = data.pointer(&["deleteStage", "id"]).and_then(Data::as_str) {
                    handle.delete(&EntityId::new(id));
                }
                Ok(())
            })
            .send()
            .await
            .unwrap();

        // THEN s1.stages no longer holds x1 and only the dependent view fired, once
        assert!(outcome.changed.contains(&EntityId::new("s1")));
        assert_eq!(stages.count(), 1);
        assert_eq!(
            stages.last_json(),
            json!({"section": {"id": "s1", "title": "Basics", "stages": [{"id": "x2", "title": "Setup"}]}})
        );
        assert_eq!(other.count(), 0);

        let store = cache.store();
        assert!(!store.contains(&EntityId::new("x1")));
        assert_eq!(store.references_to(&EntityId::new("x1")).count(), 0);
        assert!(store.index_is_consistent());
    }

    #[tokio::test]
    async fn test_invalidate_in_updater_marks_view_incomplete() {
        let transport = ScriptedTransport::new()
            .respond("Section", section_data())
            .respond("Touch", json!({"touchStage": {"id": "x2"}}));
        let cache = cache_over(Rc::new(transport));
        let section = op(SECTION);
        let variables = vars(json!({"id": "s1"}));
        cache.query(&section, &variables, FetchPolicy::NetworkOnly).await.unwrap();
        let recorder = Recorder::new();
        let view = cache.watch(&section, variables, recorder.callback()).unwrap();

        cache
            .mutation(&op("mutation Touch { touchStage(id: \"x2\") { id } }"))
            .updater(|handle, _| handle.invalidate(&EntityId::new("x2")))
            .send()
            .await
            .unwrap();

        // The view is told it is stale; refetching is its own decision
        assert_eq!(recorder.count(), 1);
        assert!(!recorder.last().unwrap().is_complete());
        assert!(!view.data().unwrap().is_complete());
    }
}

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_transport_failure_changes_nothing() {
        let transport = ScriptedTransport::new()
            .respond("Section", section_data())
            .fail("DeleteStage", TransportError::status(503, "unavailable"));
        let cache = cache_over(Rc::new(transport));
        cache
            .query(&op(SECTION), &vars(json!({"id": "s1"})), FetchPolicy::NetworkOnly)
            .await
            .unwrap();
        let before = cache.snapshot();

        let result = cache
            .mutation(&op(DELETE_STAGE))
            .variables(vars(json!({"id": "x1"})))
            .updater(|_, _| panic!("updater must not run"))
            .send()
            .await;

        assert!(matches!(result, Err(MutationError::Transport(TransportError::Status { status: 503, .. }))));
        assert_eq!(cache.snapshot(), before);
    }

    #[tokio::test]
    async fn test_failing_updater_leaves_store_and_views_untouched() {
        // GIVEN a watched section
        let transport = ScriptedTransport::new()
            .respond("Section", section_data())
            .respond("Rename", json!({"renameSection": {"id": "s1", "title": "Renamed"}}));
        let cache = cache_over(Rc::new(transport));
        let section = op(SECTION);
        let variables = vars(json!({"id": "s1"}));
        cache.query(&section, &variables, FetchPolicy::NetworkOnly).await.unwrap();
        let recorder = Recorder::new();
        let _view = cache.watch(&section, variables, recorder.callback()).unwrap();
        let before = cache.snapshot();

        // WHEN the updater edits a stage and then fails on a record that is not there
        let result = cache
            .mutation(&op("mutation Rename { renameSection(id: \"s1\") { id title } }"))
            .updater(|handle, _| {
                handle.set_scalar(&EntityId::new("x1"), "title", "HALF")?;
                handle.set_scalar(&EntityId::new("ghost"), "title", "Boo")?;
                Ok(())
            })
            .send()
            .await;

        // THEN neither the response nor the half-done edit is visible
        assert!(matches!(result, Err(MutationError::Updater { .. })));
        assert_eq!(cache.snapshot(), before);
        assert_eq!(recorder.count(), 0);
        assert!(cache.store().index_is_consistent());
    }

    #[tokio::test]
    async fn test_graph_errors_merge_partial_data_and_skip_updater() {
        // GIVEN a view on the section
        let transport = ScriptedTransport::new()
            .respond("Section", section_data())
            .respond_errors(
                "Rename",
                Some(json!({"renameSection": {"id": "s1", "title": "Renamed"}})),
                &["audit log unavailable"],
            );
        let cache = cache_over(Rc::new(transport));
        let section = op(SECTION);
        let variables = vars(json!({"id": "s1"}));
        cache.query(&section, &variables, FetchPolicy::NetworkOnly).await.unwrap();
        let recorder = Recorder::new();
        let _view = cache.watch(&section, variables, recorder.callback()).unwrap();

        // WHEN the server answers with partial data and an error
        let result = cache
            .mutation(&op("mutation Rename { renameSection(id: \"s1\", title: \"Renamed\") { id title } }"))
            .updater(|_, _| panic!("updater must not run"))
            .send()
            .await;

        // THEN the error is surfaced verbatim and the confirmed data still landed
        match result {
            Err(MutationError::Graph { errors, changed }) => {
                assert_eq!(errors[0].message, "audit log unavailable");
                assert!(changed.contains(&EntityId::new("s1")));
            }
            other => panic!("expected graph errors, got {:?}", other),
        }
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.last_json()["section"]["title"], json!("Renamed"));
    }

    #[tokio::test]
    async fn test_missing_variable_is_rejected_before_sending() {
        let transport = Rc::new(ScriptedTransport::new());
        let cache = cache_over(transport.clone());

        let result = cache.mutation(&op(DELETE_STAGE)).send().await;

        assert!(matches!(result, Err(MutationError::Query(_))));
        assert_eq!(transport.request_count(), 0);
    }
}

mod arrival_order {
    use super::*;
    use pretty_assertions::assert_eq;

    const RENAME: &str =
        "mutation Rename($title: String!) { renameCourse(id: \"c1\", title: $title) { id title } }";
    const ADD: &str = "mutation Add($id: ID!) { addStage(id: $id) { id } }";

    /// Index of the gated request whose variable `name` equals `value`.
    fn request_with(transport: &GatedTransport, name: &str, value: &str) -> usize {
        (0..transport.received())
            .find(|i| transport.request(*i).map(|r| r.variables.get(name) == Some(&json!(value))) == Some(true))
            .unwrap()
    }

    #[tokio::test]
    async fn test_responses_commit_in_arrival_order() {
        let local = LocalSet::new();
        local
            .run_until(async {
                // GIVEN mutations A then B in flight
                let transport = Rc::new(GatedTransport::new());
                let cache = cache_over(transport.clone());

                let a = spawn_local(cache.mutation(&op(RENAME)).variables(vars(json!({"title": "A"}))).send());
                let b = spawn_local(cache.mutation(&op(RENAME)).variables(vars(json!({"title": "B"}))).send());
                transport.wait_for(2).await;

                // WHEN B's response arrives before A's
                assert!(transport.release(
                    request_with(&transport, "title", "B"),
                    json!({"renameCourse": {"id": "c1", "title": "B"}})
                ));
                b.await.unwrap().unwrap();
                assert!(transport.release(
                    request_with(&transport, "title", "A"),
                    json!({"renameCourse": {"id": "c1", "title": "A"}})
                ));
                a.await.unwrap().unwrap();

                // THEN the last arrival wins
                let store = cache.store();
                let title = store
                    .get(&EntityId::new("c1"))
                    .and_then(|record| record.get("title"))
                    .and_then(|value| value.as_scalar())
                    .cloned();
                assert_eq!(title, Some(Value::from("A")));
            })
            .await;
    }

    #[tokio::test]
    async fn test_updaters_see_state_left_by_earlier_arrival() {
        let local = LocalSet::new();
        local
            .run_until(async {
                // GIVEN a section with no stages
                let transport = Rc::new(GatedTransport::new());
                let cache = cache_over(transport.clone());
                let seed = {
                    let cache = cache.clone();
                    spawn_local(async move {
                        cache
                            .query(&op(SECTION), &vars(json!({"id": "s1"})), FetchPolicy::NetworkOnly)
                            .await
                    })
                };
                transport.wait_for(1).await;
                transport.release(0, json!({"section": {"id": "s1", "title": "Basics", "stages": []}}));
                seed.await.unwrap().unwrap();

                // AND two mutations that each append their stage in an updater
                let append = |id: &'static str| {
                    cache
                        .mutation(&op(ADD))
                        .variables(vars(json!({"id": id})))
                        .updater(move |handle, _| {
                            handle.append_link(&EntityId::new("s1"), "stages", EntityId::new(id))
                        })
                        .send()
                };
                let first = spawn_local(append("x1"));
                let second = spawn_local(append("x2"));
                transport.wait_for(3).await;

                // WHEN the second response arrives first
                transport.release(request_with(&transport, "id", "x2"), json!({"addStage": {"id": "x2"}}));
                second.await.unwrap().unwrap();
                transport.release(request_with(&transport, "id", "x1"), json!({"addStage": {"id": "x1"}}));
                first.await.unwrap().unwrap();

                // THEN neither append was lost and the list follows arrival order
                let store = cache.store();
                assert_eq!(
                    store.get(&EntityId::new("s1")).and_then(|r| r.get("stages")).and_then(|v| v.as_link_list()),
                    Some(&[EntityId::new("x2"), EntityId::new("x1")][..])
                );
                assert!(store.index_is_consistent());
            })
            .await;
    }
}

//! View scenarios: dependency tracking, batching and cancellation.

use lectern_tests::prelude::*;
use std::cell::Cell;
use std::rc::Rc;
use tokio::task::{spawn_local, LocalSet};

const COURSE: &str = "query Course($id: ID!) { course(id: $id) { id title description } }";
const TITLE: &str = "query Title($id: ID!) { course(id: $id) { id title } }";
const DETAILS: &str = "query Details($id: ID!) { course(id: $id) { id title duration } }";

fn c1() -> Variables {
    vars(json!({"id": "c1"}))
}

mod merging {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_partial_payloads_merge_field_by_field() {
        // GIVEN one shape fetched with the title only
        let transport = ScriptedTransport::new()
            .respond("Title", json!({"course": {"id": "c1", "title": "Cloud Computing"}}))
            .respond("Course", json!({"course": {"id": "c1", "title": "Cloud Computing", "description": "Intro to the cloud"}}));
        let cache = cache_over(Rc::new(transport));
        cache.query(&op(TITLE), &c1(), FetchPolicy::NetworkOnly).await.unwrap();

        // WHEN a wider shape adds the description
        cache.query(&op(COURSE), &c1(), FetchPolicy::NetworkOnly).await.unwrap();

        // THEN the one record carries both
        let store = cache.store();
        let record = store.get(&EntityId::new("c1")).unwrap();
        assert!(record.has("title"));
        assert!(record.has("description"));
    }

    #[tokio::test]
    async fn test_cache_first_answers_narrower_shape_from_store() {
        let transport = Rc::new(
            ScriptedTransport::new()
                .respond("Course", json!({"course": {"id": "c1", "title": "Cloud", "description": "D"}})),
        );
        let cache = cache_over(transport.clone());
        cache.query(&op(COURSE), &c1(), FetchPolicy::CacheFirst).await.unwrap();

        let title = cache.query(&op(TITLE), &c1(), FetchPolicy::CacheFirst).await.unwrap();

        assert_eq!(title.data.to_json(), json!({"course": {"id": "c1", "title": "Cloud"}}));
        assert_eq!(transport.request_count(), 1);
    }
}

mod rerendering {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_equal_data_is_not_rerendered() {
        // GIVEN a view on c1 { title description }
        let transport = ScriptedTransport::new()
            .respond("Course", json!({"course": {"id": "c1", "title": "Cloud", "description": "D"}}))
            .respond("Details", json!({"course": {"id": "c1", "title": "Cloud", "duration": 90}}));
        let cache = cache_over(Rc::new(transport));
        cache.query(&op(COURSE), &c1(), FetchPolicy::NetworkOnly).await.unwrap();
        let recorder = Recorder::new();
        let _view = cache.watch(&op(COURSE), c1(), recorder.callback()).unwrap();

        // WHEN another shape changes c1 without touching what the view reads
        cache.query(&op(DETAILS), &c1(), FetchPolicy::NetworkOnly).await.unwrap();

        // THEN the view was re-resolved but not re-rendered
        assert_eq!(recorder.count(), 0);
    }

    #[tokio::test]
    async fn test_selected_field_change_rerenders() {
        let transport = ScriptedTransport::new()
            .respond("Course", json!({"course": {"id": "c1", "title": "Cloud", "description": "D"}}))
            .respond("Details", json!({"course": {"id": "c1", "title": "Cloud Native", "duration": 90}}));
        let cache = cache_over(Rc::new(transport));
        cache.query(&op(COURSE), &c1(), FetchPolicy::NetworkOnly).await.unwrap();
        let recorder = Recorder::new();
        let _view = cache.watch(&op(COURSE), c1(), recorder.callback()).unwrap();

        cache.query(&op(DETAILS), &c1(), FetchPolicy::NetworkOnly).await.unwrap();

        assert_eq!(recorder.count(), 1);
        assert_eq!(
            recorder.last_json(),
            json!({"course": {"id": "c1", "title": "Cloud Native", "description": "D"}})
        );
    }

    #[tokio::test]
    async fn test_watch_refetch_completes_view() {
        let transport = ScriptedTransport::new()
            .respond("Course", json!({"course": {"id": "c1", "title": "Cloud", "description": "D"}}));
        let cache = cache_over(Rc::new(transport));
        let recorder = Recorder::new();

        let view = cache.watch(&op(COURSE), c1(), recorder.callback()).unwrap();
        assert!(!view.data().unwrap().is_complete());

        let resolution = view.refetch().await.unwrap();

        assert!(resolution.is_complete());
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.last(), Some(resolution));
    }

    #[tokio::test]
    async fn test_callback_may_unsubscribe_a_later_view() {
        // GIVEN two views on c1, the first detaching the second when called
        let transport = ScriptedTransport::new().respond("Title", json!({"course": {"id": "c1", "title": "Cloud"}}));
        let cache = cache_over(Rc::new(transport));
        cache.query(&op(TITLE), &c1(), FetchPolicy::NetworkOnly).await.unwrap();

        let target: Rc<Cell<Option<ViewToken>>> = Rc::default();
        let detacher = cache.clone();
        let victim = target.clone();
        let _first_view = cache
            .watch(&op(TITLE), c1(), move |_| {
                if let Some(token) = victim.get() {
                    detacher.unsubscribe(token);
                }
            })
            .unwrap();
        let second = Recorder::new();
        let second_view = cache.watch(&op(TITLE), c1(), second.callback()).unwrap();
        target.set(Some(second_view.token()));

        // WHEN one batch changes what both views read
        cache.write(|handle| handle.set_scalar(&EntityId::new("c1"), "title", "Edge").unwrap());

        // THEN the detached view is skipped for the rest of the batch
        assert_eq!(second.count(), 0);
        assert!(cache.view_data(second_view.token()).is_none());
    }
}

mod cancellation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_unsubscribe_while_fetch_in_flight() {
        let local = LocalSet::new();
        local
            .run_until(async {
                // GIVEN a view whose refetch is in flight
                let transport = Rc::new(GatedTransport::new());
                let cache = cache_over(transport.clone());
                let recorder = Recorder::new();
                let view = cache.watch(&op(COURSE), c1(), recorder.callback()).unwrap();
                let token = view.token();

                let pending = {
                    let cache = cache.clone();
                    spawn_local(async move { cache.refetch_view(token).await })
                };
                transport.wait_for(1).await;

                // WHEN the view goes away before the response arrives
                drop(view);
                transport.release(0, json!({"course": {"id": "c1", "title": "Cloud", "description": "D"}}));
                let resolution = pending.await.unwrap().unwrap();

                // THEN the result is cached but nobody is called
                assert!(resolution.is_complete());
                assert_eq!(recorder.count(), 0);
                assert!(cache.store().contains(&EntityId::new("c1")));
                assert!(cache.view_data(token).is_none());
            })
            .await;
    }
}

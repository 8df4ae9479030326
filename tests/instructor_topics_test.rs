//! Instructor-only topic integration tests.
//!
//! Covers restriction tags on whole topics: the restricted topic index,
//! category listing visibility per role, and the instructor list filter.
//!
//! Run with: `cargo test --test instructor_topics_test`

mod helpers;

use uuid::Uuid;

use helpers::*;
use lectern_core::categories::{self, TopicQuery};
use lectern_core::store::Store;
use lectern_core::topics::{self, NewTopic};
use lectern_core::users::Role;
use lectern_core::Forum;

struct Fixture {
    forum: Forum,
    student: Uuid,
    ta: Uuid,
    professor: Uuid,
    admin: Uuid,
    cid: Uuid,
    instructor_tid: Uuid,
    normal_tid: Uuid,
}

async fn fixture() -> Fixture {
    let forum = test_forum();
    let student = create_user_with_role(&forum, "itStudent", Role::Student).await;
    let ta = create_user_with_role(&forum, "itTA", Role::Ta).await;
    let professor = create_user_with_role(&forum, "itProfessor", Role::Professor).await;
    let admin = create_admin(&forum, "itAdmin").await;

    let category = create_category(&forum, "Instructor Topics Test", "").await;

    let normal = topics::post(
        &forum,
        NewTopic::new(category.cid, Some(professor), "Normal Topic", "Visible to all"),
    )
    .await
    .unwrap();
    let instructor = topics::post(
        &forum,
        NewTopic::new(
            category.cid,
            Some(professor),
            "Instructor Only Topic",
            "Visible to TAs and Professors only",
        )
        .target_role(Role::Ta),
    )
    .await
    .unwrap();

    Fixture {
        forum,
        student,
        ta,
        professor,
        admin,
        cid: category.cid,
        instructor_tid: instructor.tid,
        normal_tid: normal.tid,
    }
}

async fn listed_tids(fx: &Fixture, uid: Option<Uuid>) -> Vec<Uuid> {
    categories::get_category_topics(&fx.forum, TopicQuery::new(fx.cid, uid))
        .await
        .unwrap()
        .iter()
        .map(|t| t.tid)
        .collect()
}

#[tokio::test]
async fn test_tag_stored_on_topic() {
    let fx = fixture().await;
    let topic = topics::get_topic_data(&fx.forum, fx.instructor_tid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(topic.target_role, Some(Role::Ta));
}

#[tokio::test]
async fn test_tagged_topic_lands_in_instructor_index() {
    let fx = fixture().await;
    let key = categories::tids_instructor_key(fx.cid);

    assert!(fx
        .forum
        .store
        .is_sorted_set_member(&key, &fx.instructor_tid.to_string())
        .await
        .unwrap());
    assert!(!fx
        .forum
        .store
        .is_sorted_set_member(&key, &fx.normal_tid.to_string())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_listing_hides_instructor_topics_from_students() {
    let fx = fixture().await;
    let tids = listed_tids(&fx, Some(fx.student)).await;
    assert!(!tids.contains(&fx.instructor_tid));
    assert!(tids.contains(&fx.normal_tid));
}

#[tokio::test]
async fn test_listing_shows_instructor_topics_to_staff() {
    let fx = fixture().await;
    for viewer in [fx.ta, fx.professor, fx.admin] {
        let tids = listed_tids(&fx, Some(viewer)).await;
        assert!(tids.contains(&fx.instructor_tid));
    }
}

#[tokio::test]
async fn test_listing_keeps_tag_field_for_instructors() {
    let fx = fixture().await;
    let listing = categories::get_category_topics(&fx.forum, TopicQuery::new(fx.cid, Some(fx.ta)))
        .await
        .unwrap();
    let topic = listing
        .iter()
        .find(|t| t.tid == fx.instructor_tid)
        .expect("instructor topic present");
    assert_eq!(topic.target_role, Some(Role::Ta));
}

#[tokio::test]
async fn test_instructor_filter_selects_only_tagged_topics() {
    let fx = fixture().await;

    let mut query = TopicQuery::new(fx.cid, Some(fx.ta));
    query.instructor = true;
    let filtered = categories::get_topic_ids(&fx.forum, query).await.unwrap();
    assert!(filtered.contains(&fx.instructor_tid));
    assert!(!filtered.contains(&fx.normal_tid));

    let unfiltered = categories::get_topic_ids(&fx.forum, TopicQuery::new(fx.cid, Some(fx.ta)))
        .await
        .unwrap();
    assert!(unfiltered.contains(&fx.instructor_tid));
    assert!(unfiltered.contains(&fx.normal_tid));
}

#[tokio::test]
async fn test_student_cannot_create_instructor_topic() {
    let fx = fixture().await;
    let topic = topics::post(
        &fx.forum,
        NewTopic::new(
            fx.cid,
            Some(fx.student),
            "Student topic with tag attempt",
            "Student content",
        )
        .target_role(Role::Ta),
    )
    .await
    .unwrap();

    let stored = topics::get_topic_data(&fx.forum, topic.tid).await.unwrap().unwrap();
    assert_eq!(stored.target_role, None);
    assert!(!fx
        .forum
        .store
        .is_sorted_set_member(
            &categories::tids_instructor_key(fx.cid),
            &topic.tid.to_string()
        )
        .await
        .unwrap());
}

//! Directory integration tests against an in-memory backend

mod common;

use std::sync::Arc;

use common::{publication, server_error, FakeApi, MEMBER_ID};
use rgdir_api::{ApiError, MemberListQuery, PhotoUpload, ProviderType, PublicationSort};
use rgdir_core::{
    CacheConfig, ConferenceForm, Directory, DirectoryError, ListingState, ProfileForm,
    PublicationEditor, PublicationView, QueryData, QueryKey, UNKNOWN_YEAR,
};

fn setup() -> (Arc<FakeApi>, Directory<FakeApi>) {
    let api = Arc::new(FakeApi::new().with_publications(vec![
        publication(11, Some(2021), "article", &["ai"]),
        publication(12, None, "book", &[]),
        publication(13, Some(2023), "article", &["ml", "vision"]),
    ]));
    let directory = Directory::with_api(Arc::clone(&api), CacheConfig::default());
    (api, directory)
}

// === Reads ===

#[tokio::test]
async fn concurrent_reads_share_one_request() {
    let (api, directory) = setup();
    let query = ListingState::new().query(MEMBER_ID);

    let (a, b) = tokio::join!(directory.publications(&query), directory.publications(&query));

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(api.count("list_publications"), 1);
}

#[tokio::test]
async fn year_sort_requests_everything() {
    let (api, directory) = setup();
    let query = ListingState::new().query(MEMBER_ID);

    directory.publications(&query).await.unwrap();

    assert_eq!(
        api.calls(),
        vec!["list_publications page=0 size=9999 sort=publicationYear".to_string()]
    );
}

#[tokio::test]
async fn distinct_filters_are_distinct_queries() {
    let (api, directory) = setup();
    let mut listing = ListingState::new();
    directory.publications(&listing.query(MEMBER_ID)).await.unwrap();

    listing.toggle_tag("ai");
    directory.publications(&listing.query(MEMBER_ID)).await.unwrap();
    directory.publications(&listing.query(MEMBER_ID)).await.unwrap();

    assert_eq!(api.count("list_publications"), 2);
}

#[tokio::test]
async fn failed_read_is_retried() {
    let (api, directory) = setup();
    api.fail("get_member", server_error("database down"));

    let err = directory.member(MEMBER_ID).await.unwrap_err();
    assert_eq!(err.to_string(), "API error 500: database down");

    api.recover("get_member");
    let member = directory.member(MEMBER_ID).await.unwrap();
    assert_eq!(member.name, "Ada Lovelace");
    assert_eq!(api.count("get_member"), 2);
}

#[tokio::test]
async fn counts_by_year_sorted_ascending() {
    let (_api, directory) = setup();

    let counts = directory.counts_by_year(MEMBER_ID).await.unwrap();

    let years: Vec<&str> = counts.iter().map(|c| c.year.as_str()).collect();
    assert_eq!(years, vec!["2019", "2021", "2022"]);
}

// === Detail screen ===

#[tokio::test]
async fn load_detail_fills_every_region() {
    let (api, directory) = setup();

    let detail = directory.load_detail(MEMBER_ID, &ListingState::new(), None).await;

    assert_eq!(detail.member.unwrap().id, MEMBER_ID);
    assert_eq!(detail.publications.unwrap().content.len(), 3);
    assert_eq!(detail.metadata.unwrap().tags, vec!["ai", "ml", "vision"]);
    assert_eq!(detail.work_types.unwrap().len(), 3);
    assert!(detail.conferences.unwrap().is_empty());
    assert_eq!(detail.counts_by_year.unwrap().unwrap().len(), 3);

    let groups = detail.view.as_ref().and_then(PublicationView::groups).unwrap();
    assert_eq!(groups.keys(), ["2023", "2021", UNKNOWN_YEAR]);
    assert_eq!(groups.open(), Some("2023"));
    assert_eq!(api.count("counts_by_year"), 1);
}

#[tokio::test]
async fn load_detail_skips_chart_when_member_fails() {
    let (api, directory) = setup();
    api.fail(
        "get_member",
        ApiError::Status {
            status: 404,
            message: "Member not found".to_string(),
        },
    );

    let detail = directory.load_detail(MEMBER_ID, &ListingState::new(), None).await;

    match detail.member {
        Err(DirectoryError::Api(err)) => assert!(err.is_not_found()),
        other => panic!("expected not found, got {:?}", other),
    }
    assert!(detail.counts_by_year.is_none());
    assert_eq!(api.count("counts_by_year"), 0);
    assert!(detail.publications.is_ok());
    assert!(detail.conferences.is_ok());
}

#[tokio::test]
async fn load_detail_keeps_open_year_and_reuses_cache() {
    let (api, directory) = setup();
    let listing = ListingState::new();

    directory.load_detail(MEMBER_ID, &listing, None).await;
    let detail = directory.load_detail(MEMBER_ID, &listing, Some("2021")).await;

    assert_eq!(detail.view.unwrap().open_year(), Some("2021"));
    assert_eq!(api.count("list_publications"), 1);
    assert_eq!(api.count("work_types"), 1);
    assert_eq!(api.count("get_member"), 1);
}

#[tokio::test]
async fn load_detail_flat_for_citation_sort() {
    let (_api, directory) = setup();
    let mut listing = ListingState::new();
    listing.set_sort(PublicationSort::CitationsDesc);

    let detail = directory.load_detail(MEMBER_ID, &listing, None).await;

    match detail.view.unwrap() {
        PublicationView::Flat { items, page, .. } => {
            assert_eq!(items.len(), 3);
            assert_eq!(page, 1);
        }
        other => panic!("expected flat view, got {:?}", other),
    }
}

// === Publication editor ===

#[tokio::test]
async fn tag_edit_sends_final_set_once() {
    let (api, directory) = setup();
    let query = ListingState::new().query(MEMBER_ID);
    let page = directory.publications(&query).await.unwrap();

    let mut editor = PublicationEditor::new();
    editor.open(&page.content[0]).unwrap();
    editor.add_tag("nlp").unwrap();
    editor.remove_tag("ai").unwrap();
    let plan = directory
        .save_publication_edits(&mut editor, &query)
        .await
        .unwrap();

    assert_eq!(plan.call_count(), 1);
    assert_eq!(api.count("update_publication_tags"), 1);
    assert_eq!(api.count("update_publication_type"), 0);
    assert!(api
        .calls()
        .contains(&r#"update_publication_tags 11 ["nlp"]"#.to_string()));
    assert!(!editor.is_open());

    // Patched in place, no refetch
    let page = directory.publications(&query).await.unwrap();
    assert_eq!(page.content[0].tags, vec!["nlp"]);
    assert_eq!(api.count("list_publications"), 1);
}

#[tokio::test]
async fn reordered_tags_send_nothing() {
    let (api, directory) = setup();
    let query = ListingState::new().query(MEMBER_ID);
    let page = directory.publications(&query).await.unwrap();

    let mut editor = PublicationEditor::new();
    editor.open(&page.content[2]).unwrap();
    editor.remove_tag("ml").unwrap();
    editor.add_tag("ml").unwrap();
    let plan = directory
        .save_publication_edits(&mut editor, &query)
        .await
        .unwrap();

    assert!(plan.is_empty());
    assert_eq!(api.count("update_publication_tags"), 0);
    assert_eq!(api.count("update_publication_type"), 0);
    assert!(!editor.is_open());
}

#[tokio::test]
async fn type_edit_patches_page_and_refreshes_metadata() {
    let (api, directory) = setup();
    let query = ListingState::new().query(MEMBER_ID);
    let page = directory.publications(&query).await.unwrap();
    let before = directory.publication_metadata(MEMBER_ID).await.unwrap();
    assert!(!before.types.contains(&"dataset".to_string()));

    let mut editor = PublicationEditor::new();
    editor.open(&page.content[0]).unwrap();
    editor.set_type("dataset").unwrap();
    directory
        .save_publication_edits(&mut editor, &query)
        .await
        .unwrap();

    match directory.cache().peek(&QueryKey::publications(&query)) {
        Some(QueryData::Publications(page)) => {
            assert_eq!(page.content[0].publication_type.as_deref(), Some("dataset"));
        }
        other => panic!("expected cached page, got {:?}", other),
    }
    assert_eq!(
        directory
            .cache()
            .is_stale(&QueryKey::publication_metadata(MEMBER_ID)),
        Some(true)
    );

    let after = directory.publication_metadata(MEMBER_ID).await.unwrap();
    assert!(after.types.contains(&"dataset".to_string()));
    assert_eq!(api.count("publication_metadata"), 2);
    assert_eq!(api.count("list_publications"), 1);
}

#[tokio::test]
async fn failed_save_keeps_working_copy() {
    let (api, directory) = setup();
    let query = ListingState::new().query(MEMBER_ID);
    let page = directory.publications(&query).await.unwrap();
    api.fail("update_publication_tags", server_error("boom"));

    let mut editor = PublicationEditor::new();
    editor.open(&page.content[0]).unwrap();
    editor.add_tag("nlp").unwrap();
    let err = directory
        .save_publication_edits(&mut editor, &query)
        .await
        .unwrap_err();

    assert!(matches!(err, DirectoryError::Api(ApiError::Status { status: 500, .. })));
    assert!(editor.is_open());
    assert!(!editor.is_saving());
    let session = editor.session().unwrap();
    assert!(session.error().unwrap().starts_with("Tag update error"));
    assert_eq!(session.working_tags(), ["ai", "nlp"]);

    api.recover("update_publication_tags");
    directory
        .save_publication_edits(&mut editor, &query)
        .await
        .unwrap();
    assert!(!editor.is_open());
    assert_eq!(api.count("update_publication_tags"), 2);
}

#[tokio::test]
async fn retry_after_partial_failure_resends_only_the_failed_part() {
    let (api, directory) = setup();
    let query = ListingState::new().query(MEMBER_ID);
    let page = directory.publications(&query).await.unwrap();
    api.fail("update_publication_tags", server_error("boom"));

    let mut editor = PublicationEditor::new();
    editor.open(&page.content[0]).unwrap();
    editor.add_tag("nlp").unwrap();
    editor.set_type("book").unwrap();
    assert!(directory
        .save_publication_edits(&mut editor, &query)
        .await
        .is_err());
    assert_eq!(api.count("update_publication_type"), 1);

    api.recover("update_publication_tags");
    let plan = directory
        .save_publication_edits(&mut editor, &query)
        .await
        .unwrap();

    assert_eq!(plan.call_count(), 1);
    assert!(plan.publication_type.is_none());
    assert_eq!(api.count("update_publication_type"), 1);
    assert_eq!(api.count("update_publication_tags"), 2);
}

// === Conferences ===

fn conference_form() -> ConferenceForm {
    ConferenceForm {
        name: "NeurIPS".to_string(),
        year: "2023".to_string(),
        location: "New Orleans".to_string(),
        description: String::new(),
    }
}

#[tokio::test]
async fn added_conference_is_refetched() {
    let (api, directory) = setup();
    assert!(directory.conferences(MEMBER_ID).await.unwrap().is_empty());

    let mut form = conference_form();
    let created = directory.add_conference(MEMBER_ID, &mut form).await.unwrap();
    assert_eq!(created.year, Some(2023));
    assert_eq!(form, ConferenceForm::default());

    let conferences = directory.conferences(MEMBER_ID).await.unwrap();
    assert_eq!(conferences.len(), 1);
    assert_eq!(conferences[0].name, "NeurIPS");
    assert_eq!(api.count("list_conferences"), 2);
}

#[tokio::test]
async fn invalid_conference_sends_nothing() {
    let (api, directory) = setup();
    let mut form = ConferenceForm {
        name: String::new(),
        ..conference_form()
    };

    let err = directory.add_conference(MEMBER_ID, &mut form).await.unwrap_err();

    assert_eq!(err.to_string(), "Name and year are required fields.");
    assert!(err.is_client_side());
    assert_eq!(api.count("add_conference"), 0);
    assert_eq!(form.year, "2023");
}

#[tokio::test]
async fn failed_conference_keeps_form() {
    let (api, directory) = setup();
    api.fail("add_conference", server_error("duplicate"));
    let mut form = conference_form();

    assert!(directory.add_conference(MEMBER_ID, &mut form).await.is_err());
    assert_eq!(form, conference_form());
}

// === Profile ===

#[tokio::test]
async fn profile_save_updates_text_and_photo() {
    let (api, directory) = setup();
    let mut member = directory.member(MEMBER_ID).await.unwrap();

    let mut form = ProfileForm {
        description: "<p>Analyst</p><p><br></p>".to_string(),
        photo: Some(PhotoUpload::new("ada.png", vec![0; 4])),
    };
    let plan = directory.save_profile(&mut member, &mut form).await.unwrap();

    assert_eq!(plan.description.as_deref(), Some("<p>Analyst</p>"));
    assert_eq!(api.count("update_member"), 1);
    assert_eq!(api.count("upload_member_photo"), 1);
    assert_eq!(form, ProfileForm::default());

    let member = directory.member(MEMBER_ID).await.unwrap();
    assert_eq!(member.description.as_deref(), Some("<p>Analyst</p>"));
    assert_eq!(member.photo_path.as_deref(), Some("ada.png"));
    assert_eq!(api.count("get_member"), 2);
}

#[tokio::test]
async fn unchanged_description_uploads_photo_only() {
    let (api, directory) = setup();
    let mut member = directory.member(MEMBER_ID).await.unwrap();

    let mut form = ProfileForm::for_member(&member);
    form.photo = Some(PhotoUpload::new("ada.jpg", vec![1, 2, 3]));
    directory.save_profile(&mut member, &mut form).await.unwrap();

    assert_eq!(api.count("update_member"), 0);
    assert_eq!(api.count("upload_member_photo"), 1);
}

#[tokio::test]
async fn retry_after_failed_upload_skips_saved_description() {
    let (api, directory) = setup();
    let mut member = directory.member(MEMBER_ID).await.unwrap();
    let mut form = ProfileForm {
        description: "<p>Analyst</p>".to_string(),
        photo: Some(PhotoUpload::new("ada.png", vec![0; 4])),
    };

    api.fail("upload_member_photo", server_error("disk full"));
    assert!(directory.save_profile(&mut member, &mut form).await.is_err());
    assert_eq!(member.description.as_deref(), Some("<p>Analyst</p>"));
    assert!(form.photo.is_some());

    api.recover("upload_member_photo");
    let plan = directory.save_profile(&mut member, &mut form).await.unwrap();

    assert_eq!(plan.description, None);
    assert_eq!(api.count("update_member"), 1);
    assert_eq!(api.count("upload_member_photo"), 2);
    assert_eq!(member.photo_path.as_deref(), Some("ada.png"));
    assert_eq!(form, ProfileForm::default());
}

#[tokio::test]
async fn retry_after_failed_description_skips_uploaded_photo() {
    let (api, directory) = setup();
    let mut member = directory.member(MEMBER_ID).await.unwrap();
    let mut form = ProfileForm {
        description: "<p>Analyst</p>".to_string(),
        photo: Some(PhotoUpload::new("ada.png", vec![0; 4])),
    };

    api.fail("update_member", server_error("locked"));
    assert!(directory.save_profile(&mut member, &mut form).await.is_err());
    assert_eq!(member.photo_path.as_deref(), Some("ada.png"));
    assert_eq!(form.photo, None);
    assert_eq!(form.description, "<p>Analyst</p>");

    api.recover("update_member");
    let plan = directory.save_profile(&mut member, &mut form).await.unwrap();

    assert_eq!(plan.photo, None);
    assert_eq!(api.count("update_member"), 2);
    assert_eq!(api.count("upload_member_photo"), 1);
    assert_eq!(member.description.as_deref(), Some("<p>Analyst</p>"));
}

#[tokio::test]
async fn blank_profile_is_rejected_locally() {
    let (api, directory) = setup();
    let mut member = directory.member(MEMBER_ID).await.unwrap();
    let mut form = ProfileForm {
        description: "<p><br></p>".to_string(),
        photo: None,
    };

    let err = directory.save_profile(&mut member, &mut form).await.unwrap_err();

    assert_eq!(
        err,
        DirectoryError::Validation("Please write a description or select a photo.".to_string())
    );
    assert_eq!(api.count("update_member"), 0);
    assert_eq!(api.count("upload_member_photo"), 0);
}

// === Members ===

#[tokio::test]
async fn imported_member_appears_in_list() {
    let (api, directory) = setup();
    let query = MemberListQuery::default();
    assert_eq!(directory.members(&query).await.unwrap().content.len(), 1);

    let imported = directory
        .fetch_new_member(" A5023888391 ", ProviderType::OpenAlex)
        .await
        .unwrap();
    assert_eq!(imported.name, "A5023888391");
    assert!(api
        .calls()
        .contains(&"fetch_new_member A5023888391 openalex".to_string()));

    assert_eq!(directory.members(&query).await.unwrap().content.len(), 2);
    assert_eq!(api.count("list_members"), 2);
}

#[tokio::test]
async fn blank_source_id_is_rejected_locally() {
    let (api, directory) = setup();

    let err = directory
        .fetch_new_member("  ", ProviderType::SerpApi)
        .await
        .unwrap_err();

    assert!(err.is_client_side());
    assert_eq!(api.count("fetch_new_member"), 0);
}

#[tokio::test]
async fn shutdown_drops_cached_data() {
    let (api, directory) = setup();
    directory.member(MEMBER_ID).await.unwrap();
    assert!(!directory.cache().is_empty());

    directory.shutdown();
    assert!(directory.cache().is_empty());

    directory.member(MEMBER_ID).await.unwrap();
    assert_eq!(api.count("get_member"), 2);
}

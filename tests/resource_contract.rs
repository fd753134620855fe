//! Contract every listable content table honours on the in-memory
//! backend: created rows list back, drafts built from a row validate, and
//! a submitted form lists exactly what was typed before resetting.

#![allow(clippy::panic)]

use std::sync::Arc;

use energies_site::backend::memory::MemoryBackend;
use energies_site::backend::{DataBackend, Row};
use energies_site::domain::fuel_price::FuelPriceDraft;
use energies_site::domain::job_listing::JobListingDraft;
use energies_site::domain::news_item::NewsDraft;
use energies_site::domain::service::ServiceDraft;
use energies_site::domain::team_member::TeamMemberDraft;
use energies_site::domain::{
    EventBus, FuelPrice, JobListing, NewsItem, Resource, ResourceDraft, Service, TeamMember,
};
use energies_site::service::{ContentStore, NoticeLevel, ResourceManager};
use rstest::rstest;
use serde_json::{Value, json};

fn store() -> ContentStore {
    let backend = Arc::new(MemoryBackend::with_site_schema());
    ContentStore::new(backend as Arc<dyn DataBackend>, EventBus::new(16))
}

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap_or_default()
}

async fn created_row_lists_and_redrafts<R: Resource>(values: Row) {
    let store = store();
    let table = store.table::<R>();
    let Ok(created) = table.create(None, values).await else {
        panic!("{} create failed", R::TABLE);
    };
    let Ok(rows) = table.list(None).await else {
        panic!("{} list failed", R::TABLE);
    };
    assert!(rows.iter().any(|r| r.id() == created.id()), "{}", R::TABLE);

    let draft = <R::Draft as ResourceDraft<R>>::from_record(&created);
    assert!(draft.to_row().is_ok(), "{} draft must validate", R::TABLE);

    let Ok(()) = table.delete(None, created.id()).await else {
        panic!("{} delete failed", R::TABLE);
    };
    assert_eq!(table.list(None).await.map(|r| r.len()).ok(), Some(0));
}

#[rstest]
#[case::fuel_prices(json!({
    "fuel_type": "Diesel",
    "price_per_liter": 3231.0,
    "region": "Dar es Salaam",
    "effective_date": "2025-11-24",
}))]
#[tokio::test]
async fn fuel_prices_contract(#[case] values: Value) {
    created_row_lists_and_redrafts::<FuelPrice>(row(values)).await;
}

#[rstest]
#[case::published(json!({ "title": "Depot", "content": "Open", "is_published": true }))]
#[case::draft(json!({ "title": "Depot", "content": "Soon" }))]
#[tokio::test]
async fn news_contract(#[case] values: Value) {
    created_row_lists_and_redrafts::<NewsItem>(row(values)).await;
}

#[rstest]
#[case::minimal(json!({ "title": "Fuel Logistics", "description": "GPS-tracked tankers" }))]
#[case::detailed(json!({
    "title": "Contract Supply",
    "description": "Fixed pricing",
    "icon": "file-text",
    "details": "Priority delivery\nDedicated account manager",
    "order_index": 5,
}))]
#[tokio::test]
async fn services_contract(#[case] values: Value) {
    created_row_lists_and_redrafts::<Service>(row(values)).await;
}

#[rstest]
#[case::with_bio(json!({ "name": "Amina Juma", "role": "CEO", "bio": "Founder" }))]
#[case::without_bio(json!({ "name": "Baraka Mushi", "role": "Head of Logistics" }))]
#[tokio::test]
async fn team_contract(#[case] values: Value) {
    created_row_lists_and_redrafts::<TeamMember>(row(values)).await;
}

#[rstest]
#[case::driver(json!({
    "title": "Tanker Driver",
    "department": "Logistics",
    "location": "Dar es Salaam",
    "description": "Deliver fuel safely",
    "requirements": "Class E licence\n3 years experience",
}))]
#[tokio::test]
async fn jobs_contract(#[case] values: Value) {
    created_row_lists_and_redrafts::<JobListing>(row(values)).await;
}

async fn submitted_draft_lists_and_resets<R: Resource>(draft: R::Draft)
where
    R::Draft: PartialEq,
{
    let store = store();
    let mut manager = ResourceManager::new(store.table::<R>());
    manager.submit(None, draft.clone()).await;

    assert_eq!(
        manager.notice().map(|n| n.level),
        Some(NoticeLevel::Success),
        "{}",
        R::TABLE
    );
    assert_eq!(*manager.draft(), R::Draft::default(), "{}", R::TABLE);
    assert!(!manager.form_open(), "{}", R::TABLE);
    assert_eq!(manager.editing(), None, "{}", R::TABLE);

    let [listed] = manager.rows() else {
        panic!("{} should list exactly the submitted row", R::TABLE);
    };
    assert_eq!(
        <R::Draft as ResourceDraft<R>>::from_record(listed),
        draft,
        "{}",
        R::TABLE
    );
}

#[rstest]
#[case::diesel(FuelPriceDraft {
    fuel_type: "Diesel".to_string(),
    price_per_liter: "3231.5".to_string(),
    region: "Dar es Salaam".to_string(),
    effective_date: "2025-11-24".to_string(),
})]
#[case::arusha(FuelPriceDraft {
    fuel_type: "Petrol".to_string(),
    price_per_liter: "3400".to_string(),
    region: "Arusha".to_string(),
    effective_date: "2025-12-01".to_string(),
})]
#[tokio::test]
async fn fuel_price_form_contract(#[case] draft: FuelPriceDraft) {
    submitted_draft_lists_and_resets::<FuelPrice>(draft).await;
}

#[rstest]
#[case::published(NewsDraft {
    title: "Mwanza depot opens".to_string(),
    content: "Serving the Lake Zone.".to_string(),
    is_published: true,
})]
#[case::unpublished(NewsDraft {
    title: "Dodoma depot".to_string(),
    content: "Coming soon.".to_string(),
    is_published: false,
})]
#[tokio::test]
async fn news_form_contract(#[case] draft: NewsDraft) {
    submitted_draft_lists_and_resets::<NewsItem>(draft).await;
}

#[rstest]
#[case::detailed(ServiceDraft {
    title: "Contract Supply".to_string(),
    description: "Fixed pricing".to_string(),
    icon: "file-text".to_string(),
    details: "Priority delivery\nDedicated account manager".to_string(),
    order_index: "5".to_string(),
    is_active: true,
})]
#[case::inactive(ServiceDraft {
    title: "Lubricants".to_string(),
    description: "Engine oils".to_string(),
    icon: String::new(),
    details: String::new(),
    order_index: "0".to_string(),
    is_active: false,
})]
#[tokio::test]
async fn service_form_contract(#[case] draft: ServiceDraft) {
    submitted_draft_lists_and_resets::<Service>(draft).await;
}

#[rstest]
#[case::with_avatar(TeamMemberDraft {
    name: "Amina Juma".to_string(),
    role: "CEO".to_string(),
    bio: "Founder".to_string(),
    avatar_url: "http://localhost:54321/storage/v1/object/public/avatars/team/a.png".to_string(),
    order_index: "1".to_string(),
    is_active: true,
})]
#[case::bare(TeamMemberDraft {
    name: "Baraka Mushi".to_string(),
    role: "Head of Logistics".to_string(),
    bio: String::new(),
    avatar_url: String::new(),
    order_index: "2".to_string(),
    is_active: false,
})]
#[tokio::test]
async fn team_member_form_contract(#[case] draft: TeamMemberDraft) {
    submitted_draft_lists_and_resets::<TeamMember>(draft).await;
}

#[rstest]
#[case::driver(JobListingDraft {
    title: "Tanker Driver".to_string(),
    department: "Logistics".to_string(),
    location: "Dar es Salaam".to_string(),
    description: "Deliver fuel safely".to_string(),
    requirements: "Class E licence\n3 years experience".to_string(),
    is_active: true,
})]
#[case::closed(JobListingDraft {
    title: "Station Attendant".to_string(),
    department: "Retail".to_string(),
    location: "Mbeya".to_string(),
    description: "Serve customers".to_string(),
    requirements: String::new(),
    is_active: false,
})]
#[tokio::test]
async fn job_listing_form_contract(#[case] draft: JobListingDraft) {
    submitted_draft_lists_and_resets::<JobListing>(draft).await;
}

#[tokio::test]
async fn visible_listing_hides_unpublished_news() {
    let store = store();
    let table = store.table::<NewsItem>();
    for (title, published) in [("Public", true), ("Hidden", false)] {
        let values = row(json!({ "title": title, "content": "x", "is_published": published }));
        let Ok(_) = table.create(None, values).await else {
            panic!("create failed");
        };
    }
    let Ok(visible) = table.list_visible(None).await else {
        panic!("list failed");
    };
    assert_eq!(visible.len(), 1);
    assert!(visible.iter().all(|n| n.title == "Public"));
}

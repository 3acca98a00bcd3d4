mod common;

use products_hr::{
    HrError,
    departments::{self, NewDepartment},
    roles::{self, NewRole},
};

#[tokio::test]
async fn roles_list_highest_rank_first() {
    let fx = common::Fixture::new().await;
    let names: Vec<String> = roles::list(&fx.db)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, ["admin", "director", "manager", "staff"]);
}

#[tokio::test]
async fn role_names_are_lowercased_and_unique() {
    let db = common::setup_db().await;
    let created = roles::create(
        &db,
        NewRole {
            name: Some("  Auditor ".into()),
            rank: Some(30),
            description: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(created.name, "auditor");

    let err = roles::create(
        &db,
        NewRole {
            name: Some("AUDITOR".into()),
            rank: Some(31),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HrError::Conflict(ref msg) if msg == "Role auditor already exists"));
}

#[tokio::test]
async fn role_requires_name_and_rank_in_range() {
    let db = common::setup_db().await;
    let missing = roles::create(
        &db,
        NewRole {
            name: Some("intern".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(missing, HrError::Validation(ref msg) if msg == "Name and rank are required."));

    let out_of_range = roles::create(
        &db,
        NewRole {
            name: Some("intern".into()),
            rank: Some(0),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(out_of_range, HrError::Validation(_)));
}

#[tokio::test]
async fn unknown_role_is_not_found() {
    let db = common::setup_db().await;
    let err = roles::get(&db, uuid::Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.to_string(), "Role not found");
}

#[tokio::test]
async fn departments_are_sorted_and_deduplicated() {
    let fx = common::Fixture::new().await;
    let names: Vec<String> = departments::list(&fx.db)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, ["Finance", "Sales"]);

    let by_name = departments::create(
        &fx.db,
        NewDepartment {
            name: Some("Sales".into()),
            code: Some("SL2".into()),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(by_name, HrError::Conflict(ref msg) if msg == "Department name already in use"));

    let by_code = departments::create(
        &fx.db,
        NewDepartment {
            name: Some("Sales East".into()),
            code: Some("SLS".into()),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(by_code, HrError::Conflict(ref msg) if msg == "Department code already in use"));
}

#[tokio::test]
async fn department_requires_name_and_code() {
    let db = common::setup_db().await;
    let err = departments::create(
        &db,
        NewDepartment {
            name: Some("Legal".into()),
            code: Some("   ".into()),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HrError::Validation(ref msg) if msg == "Name and code are required."));
}

#[tokio::test]
async fn department_names_and_codes_ignore_case() {
    let db = common::setup_db().await;
    let hr = departments::create(
        &db,
        NewDepartment {
            name: Some("HR".into()),
            code: Some("HR".into()),
            description: None,
        },
    )
    .await
    .unwrap();

    let by_name = departments::create(
        &db,
        NewDepartment {
            name: Some("hr".into()),
            code: Some("HR2".into()),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(by_name, HrError::Conflict(ref msg) if msg == "Department name already in use"));

    let by_code = departments::create(
        &db,
        NewDepartment {
            name: Some("People".into()),
            code: Some("hr".into()),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(by_code, HrError::Conflict(ref msg) if msg == "Department code already in use"));

    let found = departments::find_by_name(&db, " Hr ").await.unwrap().unwrap();
    assert_eq!(found.id, hr.id);
    assert_eq!(departments::list(&db).await.unwrap().len(), 1);
}

mod common;

use entity::user::Status;
use products_hr::{
    HrError, Visibility,
    users::{self, NewUser, UserPatch},
};

#[tokio::test]
async fn create_normalizes_and_embeds_relations() {
    let fx = common::Fixture::new().await;
    let created = users::create(
        &fx.db,
        NewUser {
            name: Some("  Grace Hopper ".into()),
            username: Some("grace".into()),
            email: Some("Grace@Example.COM".into()),
            password: Some(common::PASSWORD.into()),
            role_id: Some(fx.role("manager").id),
            department_id: Some(fx.sales.id),
            avatar_url: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(created.name, "Grace Hopper");
    assert_eq!(created.email, "grace@example.com");
    assert_eq!(created.status, Status::Active);
    assert_eq!(created.role.as_ref().map(|r| r.rank), Some(50));
    assert_eq!(created.department.as_ref().map(|d| d.code.as_str()), Some("SLS"));

    let json = serde_json::to_value(&created).unwrap();
    assert!(json.get("passwordHash").is_none());
    assert!(json.get("password_hash").is_none());
    assert_eq!(json["departmentId"], serde_json::json!(fx.sales.id));
}

#[tokio::test]
async fn duplicate_email_and_username_conflict() {
    let fx = common::Fixture::new().await;
    let first = NewUser {
        name: Some("Ada".into()),
        username: Some("ada".into()),
        email: Some("ada@example.com".into()),
        password: Some(common::PASSWORD.into()),
        ..Default::default()
    };
    users::create(&fx.db, first.clone()).await.unwrap();

    let same_email = NewUser {
        username: Some("ada2".into()),
        email: Some("ADA@example.com".into()),
        ..first.clone()
    };
    let err = users::create(&fx.db, same_email).await.unwrap_err();
    assert!(matches!(err, HrError::Conflict(ref msg) if msg == "Email already in use"));

    let same_username = NewUser {
        email: Some("other@example.com".into()),
        ..first
    };
    let err = users::create(&fx.db, same_username).await.unwrap_err();
    assert!(matches!(err, HrError::Conflict(ref msg) if msg == "Username already in use"));
}

#[tokio::test]
async fn create_rejects_unknown_role_and_short_password() {
    let fx = common::Fixture::new().await;
    let err = users::create(
        &fx.db,
        NewUser {
            name: Some("Ghost".into()),
            email: Some("ghost@example.com".into()),
            password: Some(common::PASSWORD.into()),
            role_id: Some(uuid::Uuid::new_v4()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));

    let err = users::create(
        &fx.db,
        NewUser {
            name: Some("Short".into()),
            email: Some("short@example.com".into()),
            password: Some("abc".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));
}

#[tokio::test]
async fn list_respects_visibility() {
    let fx = common::Fixture::new().await;
    let alice = fx.user("Alice", "staff", &fx.sales).await;
    let bob = fx.user("Bob", "manager", &fx.sales).await;
    let carol = fx.user("Carol", "staff", &fx.finance).await;

    let everyone = users::list(&fx.db, Visibility::Everyone).await.unwrap();
    let names: Vec<&str> = everyone.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["Alice", "Bob", "Carol"]);

    let sales = users::list(&fx.db, Visibility::Department(fx.sales.id))
        .await
        .unwrap();
    let ids: Vec<_> = sales.iter().map(|u| u.id).collect();
    assert_eq!(ids, [alice.id, bob.id]);
    assert!(sales.iter().all(|u| u.department.is_some()));

    let own = users::list(&fx.db, Visibility::Own(carol.id)).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].id, carol.id);
}

#[tokio::test]
async fn rows_outside_visibility_are_not_found() {
    let fx = common::Fixture::new().await;
    let alice = fx.user("Alice", "staff", &fx.sales).await;
    let carol = fx.user("Carol", "staff", &fx.finance).await;

    let err = users::get(&fx.db, carol.id, Visibility::Department(fx.sales.id))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::NotFound("User")));

    let err = users::delete(&fx.db, carol.id, Visibility::Own(alice.id))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::NotFound("User")));
    assert!(users::get(&fx.db, carol.id, Visibility::Everyone).await.is_ok());
}

#[tokio::test]
async fn update_applies_patch_fields() {
    let fx = common::Fixture::new().await;
    let alice = fx.user("Alice", "staff", &fx.sales).await;

    let updated = users::update(
        &fx.db,
        alice.id,
        Visibility::Everyone,
        UserPatch {
            name: Some("Alice Liddell".into()),
            department_id: Some(Some(fx.finance.id)),
            status: Some(Status::Suspended),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Alice Liddell");
    assert_eq!(updated.department_id, Some(fx.finance.id));
    assert_eq!(updated.status, Status::Suspended);
    assert_eq!(updated.email, alice.email);
}

#[tokio::test]
async fn explicit_null_clears_role_and_department() {
    let fx = common::Fixture::new().await;
    let alice = fx.user("Alice", "staff", &fx.sales).await;

    let cleared = users::update(
        &fx.db,
        alice.id,
        Visibility::Everyone,
        serde_json::from_value::<UserPatch>(serde_json::json!({
            "roleId": null,
            "departmentId": null
        }))
        .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(cleared.role_id, None);
    assert!(cleared.role.is_none());
    assert_eq!(cleared.department_id, None);
    assert!(cleared.department.is_none());

    let untouched = users::update(
        &fx.db,
        alice.id,
        Visibility::Everyone,
        UserPatch {
            role_id: Some(Some(fx.role("manager").id)),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(untouched.role.as_ref().map(|r| r.rank), Some(50));
    assert_eq!(untouched.department_id, None);
}

#[tokio::test]
async fn username_cannot_shadow_another_email() {
    let fx = common::Fixture::new().await;
    let alice = fx.user("Alice", "staff", &fx.sales).await;

    let err = users::create(
        &fx.db,
        NewUser {
            name: Some("Bob".into()),
            username: Some(alice.email.clone()),
            email: Some("bob@example.com".into()),
            password: Some(common::PASSWORD.into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));

    let bob = fx.user("Bob", "staff", &fx.sales).await;
    let err = users::update(
        &fx.db,
        bob.id,
        Visibility::Everyone,
        UserPatch {
            username: Some(Some(alice.email.clone())),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));

    let login = products_hr::identity::verify_login(&fx.db, &alice.email, common::PASSWORD)
        .await
        .unwrap();
    assert!(matches!(
        login,
        products_hr::identity::LoginOutcome::Authenticated(ref account) if account.id == alice.id
    ));
}

#[tokio::test]
async fn update_keeping_own_email_is_not_a_conflict() {
    let fx = common::Fixture::new().await;
    let alice = fx.user("Alice", "staff", &fx.sales).await;
    let bob = fx.user("Bob", "staff", &fx.sales).await;

    let same = users::update(
        &fx.db,
        alice.id,
        Visibility::Everyone,
        UserPatch {
            email: Some(alice.email.to_uppercase()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(same.email, alice.email);

    let err = users::update(
        &fx.db,
        alice.id,
        Visibility::Everyone,
        UserPatch {
            email: Some(bob.email.clone()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HrError::Conflict(ref msg) if msg == "Email already in use"));
}

#[tokio::test]
async fn delete_removes_the_row() {
    let fx = common::Fixture::new().await;
    let alice = fx.user("Alice", "staff", &fx.sales).await;
    users::delete(&fx.db, alice.id, Visibility::Department(fx.sales.id))
        .await
        .unwrap();
    let err = users::get(&fx.db, alice.id, Visibility::Everyone)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "User not found");
}

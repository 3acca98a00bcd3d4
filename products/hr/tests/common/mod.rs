#![allow(dead_code)]

use entity::{department, role};
use migration::{Migrator, MigratorTrait};
use products_hr::{
    departments::{self, NewDepartment},
    seed,
    users::{self, NewUser, UserView},
};
use sea_orm::{Database, DatabaseConnection};

pub const PASSWORD: &str = "s3cret-pass";

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub struct Fixture {
    pub db: DatabaseConnection,
    pub roles: Vec<role::Model>,
    pub sales: department::Model,
    pub finance: department::Model,
}

impl Fixture {
    pub async fn new() -> Self {
        let db = setup_db().await;
        let roles = seed::ensure_default_roles(&db).await.unwrap();
        let sales = departments::create(
            &db,
            NewDepartment {
                name: Some("Sales".into()),
                code: Some("SLS".into()),
                description: None,
            },
        )
        .await
        .unwrap();
        let finance = departments::create(
            &db,
            NewDepartment {
                name: Some("Finance".into()),
                code: Some("FIN".into()),
                description: Some("Books and payroll".into()),
            },
        )
        .await
        .unwrap();
        Self {
            db,
            roles,
            sales,
            finance,
        }
    }

    pub fn role(&self, name: &str) -> &role::Model {
        self.roles.iter().find(|r| r.name == name).unwrap()
    }

    pub async fn user(&self, name: &str, role: &str, department: &department::Model) -> UserView {
        users::create(
            &self.db,
            NewUser {
                name: Some(name.into()),
                email: Some(format!("{}@example.com", name.to_lowercase())),
                password: Some(PASSWORD.into()),
                role_id: Some(self.role(role).id),
                department_id: Some(department.id),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }
}

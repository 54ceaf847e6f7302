use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_groups::Entity")]
    UserGroups,
}

impl Related<super::user_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserGroups.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_groups::Relation::Groups.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_groups::Relation::Users.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Account as exposed by the API. The password hash never leaves the server.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    /// Ids of the groups the user belongs to
    pub groups: Vec<i32>,
}

impl User {
    pub fn build(model: Model, groups: Vec<i32>) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            is_active: model.is_active,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            date_joined: model.date_joined,
            last_login: model.last_login,
            groups,
        }
    }
}

#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub groups: Vec<i32>,
}

/// Staff edit of an account. Omitted fields are left as they are.
#[derive(ToSchema, Deserialize, Clone, Debug, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub is_staff: Option<bool>,
    pub is_active: Option<bool>,
    /// New password, hashed before storage
    pub password: Option<String>,
    pub groups: Option<Vec<i32>>,
}

/// Fields a user may change on their own account.
#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct AccessToken {
    pub access: String,
}

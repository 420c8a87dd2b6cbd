//! User repository functions, generic over `ConnectionTrait` so they run
//! against a pooled connection or an open transaction alike.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use time::OffsetDateTime;

use crate::auth::jwt::Role;
use crate::entities::users;
use crate::error::AppError;

/// User domain model. `role` is typed; an unknown value in storage is a
/// data error, not a request error.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<users::Model> for User {
    type Error = AppError;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            role: model.role.parse()?,
            id: model.id,
            name: model.name,
            email: model.email,
            password: model.password,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

pub async fn find_user_by_id<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
) -> Result<Option<User>, AppError> {
    let user = users::Entity::find_by_id(user_id).one(conn).await?;
    user.map(User::try_from).transpose()
}

pub async fn find_user_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<User>, AppError> {
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(conn)
        .await?;
    user.map(User::try_from).transpose()
}

pub async fn insert_user<C: ConnectionTrait>(conn: &C, user: User) -> Result<User, AppError> {
    let active = users::ActiveModel {
        id: Set(user.id),
        name: Set(user.name),
        email: Set(user.email),
        password: Set(user.password),
        role: Set(user.role.as_str().to_string()),
        created_at: Set(user.created_at),
        updated_at: Set(user.updated_at),
    };
    let model = active.insert(conn).await?;
    User::try_from(model)
}

pub async fn update_user<C: ConnectionTrait>(conn: &C, user: User) -> Result<User, AppError> {
    let active = users::ActiveModel {
        id: Set(user.id),
        name: Set(user.name),
        email: Set(user.email),
        password: Set(user.password),
        role: Set(user.role.as_str().to_string()),
        created_at: Set(user.created_at),
        updated_at: Set(user.updated_at),
    };
    let model = active.update(conn).await?;
    User::try_from(model)
}

pub async fn delete_user_by_id<C: ConnectionTrait>(conn: &C, user_id: &str) -> Result<u64, AppError> {
    let result = users::Entity::delete_by_id(user_id).exec(conn).await?;
    Ok(result.rows_affected)
}

/// Fetch one page of users ordered by creation time, newest last, plus the
/// total row count. `page` is 1-based.
pub async fn list_users<C: ConnectionTrait>(
    conn: &C,
    page: u64,
    items_per_page: u64,
) -> Result<(u64, Vec<User>), AppError> {
    let paginator = users::Entity::find()
        .order_by_asc(users::Column::CreatedAt)
        .paginate(conn, items_per_page);

    let total_count = paginator.num_items().await?;
    let models = paginator.fetch_page(page.saturating_sub(1)).await?;

    let users = models
        .into_iter()
        .map(User::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((total_count, users))
}

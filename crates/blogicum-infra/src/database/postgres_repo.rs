//! PostgreSQL repository implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DbConn, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select,
};
use uuid::Uuid;

use blogicum_core::domain::{Category, CommentEntry, Location, PostEntry, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::Slice;
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostFilter, PostRepository,
    Repositories, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Every repository port backed by the same connection pool.
pub fn postgres_repositories(db: &Arc<DbConn>) -> Repositories {
    Repositories {
        users: Arc::new(PostgresUserRepository::new(Arc::clone(db))),
        categories: Arc::new(PostgresCategoryRepository::new(Arc::clone(db))),
        locations: Arc::new(PostgresLocationRepository::new(Arc::clone(db))),
        posts: Arc::new(PostgresPostRepository::new(Arc::clone(db))),
        comments: Arc::new(PostgresCommentRepository::new(Arc::clone(db))),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }
}

impl LocationRepository for PostgresLocationRepository {}

/// Posts matching `filter`; the visibility rule joins the category.
fn filtered_posts(filter: &PostFilter) -> Select<PostEntity> {
    let mut query = PostEntity::find();

    if let Some(now) = filter.visible_at {
        query = query
            .join(JoinType::LeftJoin, post::Relation::Category.def())
            .filter(post::Column::IsPublished.eq(true))
            .filter(post::Column::PubDate.lte(DateTimeWithTimeZone::from(now)))
            .filter(
                Condition::any()
                    .add(post::Column::CategoryId.is_null())
                    .add(category::Column::IsPublished.eq(true)),
            );
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(post::Column::CategoryId.eq(category_id));
    }
    if let Some(author_id) = filter.author_id {
        query = query.filter(post::Column::AuthorId.eq(author_id));
    }

    query
}

impl PostgresPostRepository {
    /// Attach authors, categories, locations and comment counts to posts.
    async fn hydrate(&self, posts: Vec<post::Model>) -> Result<Vec<PostEntry>, RepoError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let author_ids: Vec<Uuid> = posts.iter().map(|p| p.author_id).collect();
        let category_ids: Vec<Uuid> = posts.iter().filter_map(|p| p.category_id).collect();
        let location_ids: Vec<Uuid> = posts.iter().filter_map(|p| p.location_id).collect();

        let usernames: HashMap<Uuid, String> = UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let categories: HashMap<Uuid, Category> = CategoryEntity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?
            .into_iter()
            .map(|c| (c.id, c.into()))
            .collect();

        let locations: HashMap<Uuid, Location> = LocationEntity::find()
            .filter(location::Column::Id.is_in(location_ids))
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?
            .into_iter()
            .map(|l| (l.id, l.into()))
            .collect();

        let counts: HashMap<Uuid, i64> = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
            .filter(comment::Column::PostId.is_in(post_ids))
            .group_by(comment::Column::PostId)
            .into_tuple::<(Uuid, i64)>()
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?
            .into_iter()
            .collect();

        Ok(posts
            .into_iter()
            .map(|model| PostEntry {
                author_username: usernames.get(&model.author_id).cloned().unwrap_or_default(),
                category: model.category_id.and_then(|id| categories.get(&id).cloned()),
                location: model.location_id.and_then(|id| locations.get(&id).cloned()),
                comment_count: counts.get(&model.id).copied().unwrap_or(0).max(0) as u64,
                post: model.into(),
            })
            .collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_entry(&self, id: Uuid) -> Result<Option<PostEntry>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?
        else {
            return Ok(None);
        };

        Ok(self.hydrate(vec![model]).await?.pop())
    }

    async fn count_entries(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        filtered_posts(filter)
            .count(self.db.as_ref())
            .await
            .map_err(query_error)
    }

    async fn list_entries(
        &self,
        filter: &PostFilter,
        slice: Slice,
    ) -> Result<Vec<PostEntry>, RepoError> {
        let models = filtered_posts(filter)
            .order_by_desc(post::Column::PubDate)
            .order_by_asc(post::Column::CreatedAt)
            .order_by_asc(post::Column::Id)
            .offset(slice.offset)
            .limit(slice.limit)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        self.hydrate(models).await
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(rows
            .into_iter()
            .map(|(comment, author)| CommentEntry {
                author_username: author.map(|u| u.username).unwrap_or_default(),
                comment: comment.into(),
            })
            .collect())
    }
}

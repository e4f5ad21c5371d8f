use std::collections::VecDeque;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::edit_error;
use crate::auth::Identity;
use crate::collection;
use crate::error::CoreError;
use crate::guard::{authorize_mutation, Mutation};
use crate::models::{Comment, CommentInput, Like, Post, PostInput, User, Validate};
use crate::store::{Filter, Repository, ResourceStore};

/// Posts and their likes and comments.
#[derive(Clone)]
pub struct PostService {
    posts: Repository<Post>,
    users: Repository<User>,
}

impl PostService {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            posts: Repository::new(Arc::clone(&store)),
            users: Repository::new(store),
        }
    }

    /// Publish a post as the caller; name and avatar are copied from the user.
    pub async fn create(&self, identity: &Identity, input: PostInput) -> Result<Post, CoreError> {
        input.validate().map_err(CoreError::Validation)?;
        let author = self.users.get(identity.user_id).await?;

        let post = Post::new(author.id, input.text(), author.name, author.avatar);
        self.posts.save(&post).await?;

        info!("User {} created post {}", identity.user_id, post.id);
        Ok(post)
    }

    /// All posts, newest first.
    pub async fn list(&self) -> Result<Vec<Post>, CoreError> {
        let mut posts = self.posts.find_many(&Filter::All).await?;
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    pub async fn get(&self, post_id: Uuid) -> Result<Post, CoreError> {
        Ok(self.posts.get(post_id).await?)
    }

    pub async fn delete(&self, identity: &Identity, post_id: Uuid) -> Result<(), CoreError> {
        let post = self.posts.get(post_id).await?;
        authorize_mutation(identity, Mutation::DeletePost(&post)).into_result()?;

        self.posts.delete(post.id).await?;
        info!("User {} deleted post {}", identity.user_id, post.id);
        Ok(())
    }

    pub async fn like(&self, identity: &Identity, post_id: Uuid) -> Result<VecDeque<Like>, CoreError> {
        let mut post = self.posts.get(post_id).await?;
        authorize_mutation(identity, Mutation::LikePost(&post)).into_result()?;

        collection::add_unique(&mut post.likes, Like::user_key, &identity.user_id, Like::by(identity.user_id))
            .map_err(|e| edit_error(e, "Post already liked"))?;

        self.posts.save(&post).await?;
        Ok(post.likes)
    }

    pub async fn unlike(&self, identity: &Identity, post_id: Uuid) -> Result<VecDeque<Like>, CoreError> {
        let mut post = self.posts.get(post_id).await?;
        authorize_mutation(identity, Mutation::LikePost(&post)).into_result()?;

        collection::remove_by_key(&mut post.likes, Like::user_key, &identity.user_id)
            .map_err(|e| edit_error(e, "Post has not yet been liked"))?;

        self.posts.save(&post).await?;
        Ok(post.likes)
    }

    pub async fn comment(
        &self,
        identity: &Identity,
        post_id: Uuid,
        input: CommentInput,
    ) -> Result<VecDeque<Comment>, CoreError> {
        input.validate().map_err(CoreError::Validation)?;
        let author = self.users.get(identity.user_id).await?;
        let mut post = self.posts.get(post_id).await?;

        let comment_id = collection::insert_head(&mut post.comments, input.into_comment(&author));

        self.posts.save(&post).await?;
        info!("User {} commented {} on post {}", identity.user_id, comment_id, post.id);
        Ok(post.comments)
    }

    /// Remove exactly the comment `comment_id`, which the caller must have written.
    pub async fn uncomment(
        &self,
        identity: &Identity,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<VecDeque<Comment>, CoreError> {
        let mut post = self.posts.get(post_id).await?;

        let comment = collection::find_by_id(&post.comments, comment_id)
            .ok_or_else(|| CoreError::EntryNotFound("Comment does not exist".to_string()))?;
        authorize_mutation(identity, Mutation::DeleteComment(comment)).into_result()?;

        collection::remove_by_id(&mut post.comments, comment_id)
            .map_err(|e| edit_error(e, "Comment does not exist"))?;

        self.posts.save(&post).await?;
        Ok(post.comments)
    }
}

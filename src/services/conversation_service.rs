use crate::domain::conversation::{Conversation, Participant};
use crate::error::{AppError, Result};
use crate::storage::DbPool;
use crate::storage::conversation_repo::ConversationRepository;
use crate::storage::user_repo::UserRepository;
use sqlx::{Connection, PgConnection};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct ConversationService {
    pool: DbPool,
    repo: ConversationRepository,
    user_repo: UserRepository,
}

impl ConversationService {
    #[must_use]
    pub fn new(pool: DbPool, repo: ConversationRepository, user_repo: UserRepository) -> Self {
        Self { pool, repo, user_repo }
    }

    /// Creates a conversation with the creator as its first participant.
    #[tracing::instrument(skip(self, title), fields(creator_id = %creator_id), err)]
    pub async fn create(&self, creator_id: Uuid, title: String) -> Result<Conversation> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let conversation = self.repo.create(&mut tx, &title).await?;
        self.repo.add_participant(&mut tx, conversation.id, creator_id).await?;

        tx.commit().await?;

        tracing::info!(conversation_id = %conversation.id, "Conversation created");
        Ok(conversation)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Conversation>> {
        let mut conn = self.pool.acquire().await?;
        self.repo.list_for_user(&mut conn, user_id, cursor, limit).await
    }

    /// Fetches a conversation and its participants; only participants may look.
    pub async fn get(&self, conversation_id: Uuid, viewer_id: Uuid) -> Result<(Conversation, Vec<Participant>)> {
        let mut conn = self.pool.acquire().await?;
        let conversation = self.require_participant(&mut conn, conversation_id, viewer_id).await?;
        let participants = self.repo.participants(&mut conn, conversation_id).await?;
        Ok((conversation, participants))
    }

    /// Adds a user to a conversation. Any participant may invite.
    #[tracing::instrument(skip(self), fields(conversation_id = %conversation_id), err(level = "warn"))]
    pub async fn add_participant(&self, conversation_id: Uuid, actor_id: Uuid, new_user_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        self.require_participant(&mut conn, conversation_id, actor_id).await?;

        if self.user_repo.find_by_id(&mut conn, new_user_id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let added = self.repo.add_participant(&mut conn, conversation_id, new_user_id).await?;
        if added == 0 {
            return Err(AppError::Conflict("User is already a participant".to_string()));
        }

        tracing::info!(user_id = %new_user_id, "Participant added");
        Ok(())
    }

    /// Removes a participant. Users may remove themselves; staff may remove anyone.
    #[tracing::instrument(skip(self), fields(conversation_id = %conversation_id), err(level = "warn"))]
    pub async fn remove_participant(
        &self,
        conversation_id: Uuid,
        actor_id: Uuid,
        actor_is_staff: bool,
        user_id: Uuid,
    ) -> Result<()> {
        if actor_id != user_id && !actor_is_staff {
            return Err(AppError::Forbidden("Only staff may remove other participants".to_string()));
        }

        let mut conn = self.pool.acquire().await?;
        if actor_is_staff {
            self.repo.find_by_id(&mut conn, conversation_id).await?.ok_or(AppError::NotFound)?;
        } else {
            self.require_participant(&mut conn, conversation_id, actor_id).await?;
        }

        let removed = self.repo.remove_participant(&mut conn, conversation_id, user_id).await?;
        if removed == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Deletes a conversation and, via cascade, its messages. Staff only;
    /// the handler enforces the role.
    #[tracing::instrument(skip(self), fields(conversation_id = %conversation_id), err)]
    pub async fn delete(&self, conversation_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let deleted = self.repo.delete(&mut conn, conversation_id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!("Conversation deleted");
        Ok(())
    }

    /// Loads the conversation and rejects callers who are not in it.
    pub(crate) async fn require_participant(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Conversation> {
        let conversation = self.repo.find_by_id(conn, conversation_id).await?.ok_or(AppError::NotFound)?;
        if !self.repo.is_participant(conn, conversation_id, user_id).await? {
            return Err(AppError::Forbidden("Not a participant of this conversation".to_string()));
        }
        Ok(conversation)
    }
}

//! Role-based authorization.
//!
//! | Action | admin | editor | author |
//! |---|---|---|---|
//! | create article, upload media | yes | yes | yes |
//! | edit/delete article | yes | yes | own only |
//! | edit/delete media | yes | own only | own only |
//! | category writes | yes | no | no |
//! | user management | yes | no | no |

use common::UserRole;
use uuid::Uuid;

use crate::error::AppError;

/// The authenticated principal a service call acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateArticle,
    /// Update or delete an article written by `author_id`.
    ModifyArticle { author_id: Option<Uuid> },
    UploadMedia,
    /// Update or delete a media item uploaded by `uploaded_by`.
    ModifyMedia { uploaded_by: Option<Uuid> },
    ManageCategories,
    ManageUsers,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn allows(&self, action: Action) -> bool {
        if self.is_admin() {
            return true;
        }
        match action {
            Action::CreateArticle | Action::UploadMedia => true,
            Action::ModifyArticle { author_id } => {
                self.role == UserRole::Editor || author_id == Some(self.id)
            }
            Action::ModifyMedia { uploaded_by } => uploaded_by == Some(self.id),
            Action::ManageCategories | Action::ManageUsers => false,
        }
    }

    pub fn require(&self, action: Action) -> Result<(), AppError> {
        if self.allows(action) {
            Ok(())
        } else {
            tracing::debug!(actor = %self.id, role = %self.role, ?action, "permission denied");
            Err(AppError::PermissionDenied)
        }
    }
}

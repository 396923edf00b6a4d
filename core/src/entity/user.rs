//! The user represented by the access token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::error::ApiError;
use crate::schema::{FieldKind, FieldSpec, Schema};
use crate::session::AdsApi;
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitmoji {
    pub avatar_id: String,
    pub selfie_id: String,
    pub background_id: String,
    pub scene_id: String,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub email: Option<String>,
    pub organization_id: Option<String>,
    pub display_name: Option<String>,
    pub member_status: Option<String>,
    pub snapchat_username: Option<String>,
    pub bitmoji: Option<Bitmoji>,
}

impl Entity for User {
    const SCHEMA: Schema = Schema {
        entity: "User",
        fields: &[
            FieldSpec::read_only("id", FieldKind::String),
            FieldSpec::read_only("updated_at", FieldKind::Timestamp),
            FieldSpec::read_only("created_at", FieldKind::Timestamp),
            FieldSpec::read_only("email", FieldKind::String),
            FieldSpec::read_only("organization_id", FieldKind::String),
            FieldSpec::read_only("display_name", FieldKind::String),
            FieldSpec::read_only("member_status", FieldKind::String),
            FieldSpec::read_only("snapchat_username", FieldKind::String),
            FieldSpec::read_only("bitmoji", FieldKind::Json),
        ],
    };

    fn id(&self) -> &str {
        &self.id
    }
}

impl<T: Transport> AdsApi<T> {
    pub fn get_authenticated_user(&self) -> Result<User, ApiError> {
        let request = self.client().build_get_me();
        User::from_json(self.client().parse_get_me(self.execute(request)?)?)
    }
}

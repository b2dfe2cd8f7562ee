//! Update the caller's profile.

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::ServerError;
use crate::router::Valid;
use crate::user::{User, UserService};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(min = 2, max = 50, message = "Name must be 2 to 50 characters long."))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be formatted."))]
    pub email: Option<String>,
    #[validate(length(
        min = 7,
        max = 20,
        message = "Phone number must be 7 to 20 characters long."
    ))]
    pub phone_number: Option<String>,
    #[validate(custom(
        function = "crate::router::validate_url",
        message = "Avatar must be a URL."
    ))]
    pub avatar: Option<String>,
}

pub async fn handler(
    Extension(mut user): Extension<UserService>,
    Valid(body): Valid<Body>,
) -> Result<Json<User>, ServerError> {
    if let Some(name) = body.name {
        user.data.name = name;
    }
    if let Some(email) = body.email {
        user.data.email = email.to_lowercase();
    }
    if let Some(phone_number) = body.phone_number {
        user.data.phone_number = Some(phone_number);
    }
    if let Some(avatar) = body.avatar {
        user.data.avatar = avatar;
    }

    user.update().await?;

    Ok(Json(user.data))
}

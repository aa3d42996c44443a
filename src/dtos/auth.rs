//! Auth DTOs - registrazione e token

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct RegisterUserDTO {
    #[validate(length(min = 1, max = 20, message = "nickname must be between 1 and 20 characters"))]
    pub nickname: String,

    #[validate(email(message = "email is not valid"))]
    pub email: String,

    #[validate(length(min = 3, max = 8, message = "password must be between 3 and 8 characters"))]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TokensDTO {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenDTO {
    pub access_token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenDTO {
    pub refresh_token: String,
}

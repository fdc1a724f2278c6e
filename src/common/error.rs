use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

pub type ServiceResult<T> = Result<T, AppError>;
pub type ServiceResponse<T> = ServiceResult<Json<T>>;

#[track_caller]
pub fn unexpected<T, E: Into<anyhow::Error>>(e: E) -> ServiceResult<T> {
    let caller = std::panic::Location::caller();
    error!("An unexpected error has occurred at {caller}: {}", e.into());
    Err(AppError::Unexpected)
}

#[derive(Debug, PartialEq, Eq)]
pub enum AppError {
    Unexpected,
    Unauthorized,
    DecodingRequestFailed,
    InternalServerError(&'static str),

    PostsNotFound,
    PostsForbidden,
    PostsInvalidText,
    PostsAlreadyLiked,
    PostsAlreadyDisliked,
    PostsCommentNotFound,

    ProfilesNotFound,
    ProfilesInvalidFields,
    ProfilesCodeforcesNotFound,
    ProfilesInvalidEducation,
    ProfilesEducationExists,
    ProfilesEducationNotFound,

    RelationshipsNotFound,
    RelationshipsSelfRequest,
    RelationshipsAlreadyExists,
    RelationshipsForbidden,
    RelationshipsAlreadyResolved,

    UsersNotFound,
    UsersInvalidName,
    UsersInvalidEmail,
    UsersInvalidPassword,
    UsersEmailTaken,

    SessionsInvalidCredentials,
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    #[track_caller]
    fn from(e: E) -> Self {
        unexpected::<(), E>(e).unwrap_err()
    }
}

impl AppError {
    pub const fn as_str(&self) -> &str {
        self.code()
    }

    pub const fn code(&self) -> &'static str {
        match self {
            AppError::Unexpected => "unexpected",
            AppError::Unauthorized => "unauthorized",
            AppError::DecodingRequestFailed => "decoding_request_failed",
            AppError::InternalServerError(_) => "internal_server_error",

            AppError::PostsNotFound => "posts.not_found",
            AppError::PostsForbidden => "posts.forbidden",
            AppError::PostsInvalidText => "posts.invalid_text",
            AppError::PostsAlreadyLiked => "posts.already_liked",
            AppError::PostsAlreadyDisliked => "posts.already_disliked",
            AppError::PostsCommentNotFound => "posts.comment_not_found",

            AppError::ProfilesNotFound => "profiles.not_found",
            AppError::ProfilesInvalidFields => "profiles.invalid_fields",
            AppError::ProfilesCodeforcesNotFound => "profiles.codeforces_not_found",
            AppError::ProfilesInvalidEducation => "profiles.invalid_education",
            AppError::ProfilesEducationExists => "profiles.education_exists",
            AppError::ProfilesEducationNotFound => "profiles.education_not_found",

            AppError::RelationshipsNotFound => "relationships.not_found",
            AppError::RelationshipsSelfRequest => "relationships.self_request",
            AppError::RelationshipsAlreadyExists => "relationships.already_exists",
            AppError::RelationshipsForbidden => "relationships.forbidden",
            AppError::RelationshipsAlreadyResolved => "relationships.already_resolved",

            AppError::UsersNotFound => "users.not_found",
            AppError::UsersInvalidName => "users.invalid_name",
            AppError::UsersInvalidEmail => "users.invalid_email",
            AppError::UsersInvalidPassword => "users.invalid_password",
            AppError::UsersEmailTaken => "users.email_taken",

            AppError::SessionsInvalidCredentials => "sessions.invalid_credentials",
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            AppError::Unexpected => "An unexpected error has occurred.",
            AppError::Unauthorized => "You are not authorized to perform this action.",
            AppError::DecodingRequestFailed => "Failed to decode request",
            AppError::InternalServerError(_) => "An internal server error has occurred.",

            AppError::PostsNotFound => "Post not found",
            AppError::PostsForbidden => "You cannot modify a post or comment of another user.",
            AppError::PostsInvalidText => "Text is required",
            AppError::PostsAlreadyLiked => "You have already liked this post",
            AppError::PostsAlreadyDisliked => "You have already disliked this post",
            AppError::PostsCommentNotFound => "Comment not found",

            AppError::ProfilesNotFound => "Profile not found. Create a profile first",
            AppError::ProfilesInvalidFields => {
                "Country, date of birth and at least one skill are required"
            }
            AppError::ProfilesCodeforcesNotFound => "No codeforces profile found",
            AppError::ProfilesInvalidEducation => "School and field of study are required",
            AppError::ProfilesEducationExists => "This education entry already exists",
            AppError::ProfilesEducationNotFound => "Education entry not found",

            AppError::RelationshipsNotFound => "Relationship not found",
            AppError::RelationshipsSelfRequest => "You cannot send a friend request to yourself",
            AppError::RelationshipsAlreadyExists => "Cannot request for second friendship",
            AppError::RelationshipsForbidden => "You cannot respond to this request",
            AppError::RelationshipsAlreadyResolved => {
                "This request has already been accepted or declined"
            }

            AppError::UsersNotFound => "This user does not exist.",
            AppError::UsersInvalidName => "Name is required",
            AppError::UsersInvalidEmail => "Please include a valid email",
            AppError::UsersInvalidPassword => "Please enter a password with 6 or more characters",
            AppError::UsersEmailTaken => "User already exists",

            AppError::SessionsInvalidCredentials => "Invalid credentials",
        }
    }

    pub const fn http_status_code(&self) -> StatusCode {
        match self {
            AppError::DecodingRequestFailed
            | AppError::PostsInvalidText
            | AppError::PostsAlreadyLiked
            | AppError::PostsAlreadyDisliked
            | AppError::ProfilesInvalidFields
            | AppError::ProfilesInvalidEducation
            | AppError::ProfilesEducationExists
            | AppError::RelationshipsSelfRequest
            | AppError::UsersInvalidName
            | AppError::UsersInvalidEmail
            | AppError::UsersInvalidPassword => StatusCode::BAD_REQUEST,

            AppError::Unauthorized | AppError::SessionsInvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }

            AppError::PostsForbidden | AppError::RelationshipsForbidden => StatusCode::FORBIDDEN,

            AppError::PostsNotFound
            | AppError::PostsCommentNotFound
            | AppError::ProfilesNotFound
            | AppError::ProfilesCodeforcesNotFound
            | AppError::ProfilesEducationNotFound
            | AppError::RelationshipsNotFound
            | AppError::UsersNotFound => StatusCode::NOT_FOUND,

            AppError::RelationshipsAlreadyExists
            | AppError::RelationshipsAlreadyResolved
            | AppError::UsersEmailTaken => StatusCode::CONFLICT,

            AppError::Unexpected | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub const fn response_parts(&self) -> (StatusCode, Json<ErrorResponse>) {
        let status = self.http_status_code();
        let response = ErrorResponse {
            code: self.code(),
            message: self.message(),
        };
        (status, Json(response))
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.response_parts().into_response()
    }
}

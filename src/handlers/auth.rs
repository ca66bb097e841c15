use axum::{extract::State, Json};
use tower_cookies::{Cookie, Cookies};

use crate::{
    database::Database,
    error::{AppError, AppJson, AppResult},
    middleware::{permission::AUTH_COOKIE, CurrentUser},
    models::{AuthResponse, LoginRequest, RegisterRequest, User, UserResponse, UserRole},
    state::AppState,
    utils::{
        create_token, hash_password, verify_password,
        validation::{Validator, MAX_PERSON_NAME_LEN, MAX_PHONE_LEN, MAX_TEXT_LEN, MIN_PASSWORD_LEN},
    },
};

pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    AppJson(form): AppJson<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    validate_registration(&form)?;

    let email = form.email.trim().to_lowercase();
    if find_user_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let password_hash = hash_password(&form.password, state.config.bcrypt_cost)?;
    let user = create_user_in_db(&state.db, &email, &password_hash, &form).await?;

    log::info!("Registered {} account {}", user.role, user.id);
    issue_session(&state, cookies, user)
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    AppJson(form): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    Validator::new()
        .email(form.email.trim(), "email")
        .check(
            form.password.len() >= MIN_PASSWORD_LEN,
            "password",
            "Password must be at least 6 characters",
        )
        .finish()?;

    let user = authenticate_user(&state.db, &form.email.trim().to_lowercase(), &form.password).await?;
    issue_session(&state, cookies, user)
}

pub async fn logout(cookies: Cookies) -> Json<serde_json::Value> {
    cookies.remove(Cookie::build((AUTH_COOKIE, "")).path("/").build());
    Json(serde_json::json!({ "message": "Logged out" }))
}

pub async fn me(
    State(db): State<Database>,
    current_user: CurrentUser,
) -> AppResult<Json<UserResponse>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(current_user.id)
        .fetch_optional(&db)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    Ok(Json(user.into()))
}

fn validate_registration(form: &RegisterRequest) -> AppResult<()> {
    Validator::new()
        .email(form.email.trim(), "email")
        .check(
            form.password.len() >= MIN_PASSWORD_LEN,
            "password",
            "Password must be at least 6 characters",
        )
        .check(
            form.password == form.confirm_password,
            "confirm_password",
            "Passwords don't match",
        )
        .required_text(&form.first_name, "first_name", MAX_PERSON_NAME_LEN)
        .required_text(&form.last_name, "last_name", MAX_PERSON_NAME_LEN)
        .optional_text(form.phone.as_deref(), "phone", MAX_PHONE_LEN)
        .optional_text(form.address.as_deref(), "address", MAX_TEXT_LEN)
        .check(
            form.role != UserRole::Admin,
            "role",
            "Admin accounts cannot be self-registered",
        )
        .finish()
}

/// Signs a token for `user`, mirrors it into the auth cookie and builds the
/// response body.
fn issue_session(state: &AppState, cookies: Cookies, user: User) -> AppResult<Json<AuthResponse>> {
    let token = create_token(
        user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {}", e)))?;

    let cookie = Cookie::build((AUTH_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::hours(state.config.jwt_expiry_hours))
        .build();
    cookies.add(cookie);

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

async fn find_user_by_email(db: &Database, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await
}

async fn authenticate_user(db: &Database, email: &str, password: &str) -> AppResult<User> {
    let user = find_user_by_email(db, email)
        .await?
        .filter(|user| user.is_active)
        .ok_or(AppError::InvalidCredentials)?;

    if verify_password(password, &user.password_hash).unwrap_or(false) {
        Ok(user)
    } else {
        Err(AppError::InvalidCredentials)
    }
}

async fn create_user_in_db(
    db: &Database,
    email: &str,
    password_hash: &str,
    form: &RegisterRequest,
) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, role, phone, address)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(form.first_name.trim())
    .bind(form.last_name.trim())
    .bind(form.role)
    .bind(&form.phone)
    .bind(&form.address)
    .fetch_one(db)
    .await?;

    Ok(user)
}

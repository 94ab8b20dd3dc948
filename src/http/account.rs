//! Signed-in endpoints: saved items, supplier contact and profile

use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use axum_extra::extract::Query;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::catalog::Page;
use crate::http::error::AppError;
use crate::http::middleware::AuthenticatedUser;
use crate::http::routes::{page_of, ListingParams};
use crate::store::catalog::Product;
use crate::store::contacts::{ContactMessage, NewContact};
use crate::store::profiles::{missing_fields, Member, ProfileUpdate, UserProfile};
use crate::store::saved::SavedItem;

fn require_fields(fields: &[(&str, &str)]) -> Result<(), AppError> {
    let missing = missing_fields(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

// ============================================================================
// Saved items
// ============================================================================

#[derive(Serialize)]
pub struct SavedResponse {
    saved: Vec<SavedItem>,
    products: Vec<Product>,
}

pub async fn list_saved_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SavedResponse>, AppError> {
    let saved = state
        .saved
        .list_saved(auth.user_id)
        .await
        .map_err(|e| state.upstream_failure("list_saved", e, Some(auth.user_id)))?;

    let ids: Vec<&str> = saved.iter().map(|s| s.product_id.as_str()).collect();
    let products = state
        .catalog
        .products_by_ids(&ids)
        .await
        .map_err(|e| state.upstream_failure("list_saved_products", e, Some(auth.user_id)))?;

    Ok(Json(SavedResponse { saved, products }))
}

#[derive(Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    product_id: String,
}

#[derive(Serialize)]
pub struct SavedStatus {
    product_id: String,
    saved: bool,
}

pub async fn save_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SavedStatus>, AppError> {
    require_fields(&[("product_id", req.product_id.as_str())])?;
    let product_id = req.product_id.trim().to_string();

    state
        .saved
        .save(auth.user_id, &product_id)
        .await
        .map_err(|e| state.upstream_failure("save_item", e, Some(auth.user_id)))?;

    Ok(Json(SavedStatus {
        product_id,
        saved: true,
    }))
}

pub async fn is_saved_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(product_id): Path<String>,
) -> Result<Json<SavedStatus>, AppError> {
    let saved = state
        .saved
        .is_saved(auth.user_id, &product_id)
        .await
        .map_err(|e| state.upstream_failure("is_saved", e, Some(auth.user_id)))?;

    Ok(Json(SavedStatus { product_id, saved }))
}

pub async fn unsave_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(product_id): Path<String>,
) -> Result<Json<SavedStatus>, AppError> {
    state
        .saved
        .unsave(auth.user_id, &product_id)
        .await
        .map_err(|e| state.upstream_failure("unsave_item", e, Some(auth.user_id)))?;

    Ok(Json(SavedStatus {
        product_id,
        saved: false,
    }))
}

// ============================================================================
// Supplier contact
// ============================================================================

pub async fn send_contact_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(contact): Json<NewContact>,
) -> Result<Json<ContactMessage>, AppError> {
    require_fields(&[
        ("supplier_id", contact.supplier_id.as_str()),
        ("subject", contact.subject.as_str()),
        ("message", contact.message.as_str()),
    ])?;

    state
        .contacts
        .send_message(auth.user_id, &contact)
        .await
        .map(Json)
        .map_err(|e| state.upstream_failure("send_contact", e, Some(auth.user_id)))
}

pub async fn contact_history_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Page<ContactMessage>>, AppError> {
    let history = state
        .contacts
        .history(auth.user_id)
        .await
        .map_err(|e| state.upstream_failure("contact_history", e, Some(auth.user_id)))?;

    Ok(Json(page_of(&history, &params, state.config.page_size)))
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Serialize)]
pub struct ProfileResponse {
    profile: Option<UserProfile>,
    member: Option<Member>,
    email: Option<String>,
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ProfileResponse>, AppError> {
    let (profile, member) = futures::try_join!(
        state.profiles.get_profile(auth.user_id),
        state.profiles.get_member(auth.user_id),
    )
    .map_err(|e| state.upstream_failure("get_profile", e, Some(auth.user_id)))?;

    Ok(Json(ProfileResponse {
        profile,
        member,
        email: auth.claims.email,
    }))
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, AppError> {
    require_fields(&[("full_name", update.full_name.as_str())])?;

    state
        .profiles
        .upsert_profile(auth.user_id, &update)
        .await
        .map_err(|e| state.upstream_failure("update_profile", e, Some(auth.user_id)))?;

    get_profile_handler(State(state), Extension(auth)).await
}

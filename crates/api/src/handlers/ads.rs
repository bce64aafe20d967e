//! Handlers for the `/ads` resource.
//!
//! Reads are open to everyone. Creating requires a session; editing and
//! deleting additionally require [`ensure_can_act`] against the ad's owner.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use classifieds_core::error::CoreError;
use classifieds_core::fields::{
    seller_display_name, AD_CATEGORY_MAX_LEN, AD_DESCRIPTION_MAX_LEN, AD_LOCATION_MAX_LEN,
    AD_TITLE_MAX_LEN,
};
use classifieds_core::pagination::{clamp_page, page_offset, PageInfo, ADS_PER_PAGE};
use classifieds_core::permissions::can_act;
use classifieds_core::types::{parse_db_id, DbId};
use classifieds_db::models::ad::{Ad, AdFilter, CreateAd, UpdateAd};
use classifieds_db::models::user::User;
use classifieds_db::repositories::{AdRepo, UserRepo};
use classifieds_events::{DomainEvent, EventKind, Subject};
use serde::Serialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, CurrentIdentity};
use crate::middleware::rbac::ensure_can_act;
use crate::query::AdListParams;
use crate::response::PagedResponse;
use crate::state::AppState;
use crate::upload::{discard_image, read_form, settle_image_write, store_image, MultipartForm};

/// Multipart field carrying the ad picture.
const AD_IMAGE_FIELD: &str = "image";

// `validator` length bounds are `u64`; mirror the shared `usize` limits.
const AD_TITLE_MAX_LEN_U64: u64 = AD_TITLE_MAX_LEN as u64;
const AD_DESCRIPTION_MAX_LEN_U64: u64 = AD_DESCRIPTION_MAX_LEN as u64;
const AD_CATEGORY_MAX_LEN_U64: u64 = AD_CATEGORY_MAX_LEN as u64;
const AD_LOCATION_MAX_LEN_U64: u64 = AD_LOCATION_MAX_LEN as u64;

// ---------------------------------------------------------------------------
// Form and response types
// ---------------------------------------------------------------------------

/// Validated ad fields from the multipart form.
#[derive(Debug, Validate)]
pub struct AdForm {
    #[validate(length(min = 1, max = AD_TITLE_MAX_LEN_U64))]
    pub title: String,
    #[validate(length(min = 1, max = AD_DESCRIPTION_MAX_LEN_U64))]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(length(min = 1, max = AD_CATEGORY_MAX_LEN_U64))]
    pub category: String,
    #[validate(length(max = AD_LOCATION_MAX_LEN_U64))]
    pub location: String,
}

impl AdForm {
    /// Pull the ad fields out of a multipart form and validate them.
    pub fn from_form(form: &MultipartForm) -> AppResult<Self> {
        let raw_price = form.require("price")?;
        let price: f64 = raw_price
            .replace(',', ".")
            .parse()
            .map_err(|_| AppError::Core(CoreError::Validation("price must be a number".into())))?;
        if !price.is_finite() {
            return Err(AppError::Core(CoreError::Validation(
                "price must be a finite number".into(),
            )));
        }

        let ad = AdForm {
            title: form.require("title")?,
            description: form.require("description")?,
            price,
            category: form.require("category")?,
            location: form.text_or_empty("location"),
        };
        ad.validate()?;
        Ok(ad)
    }
}

/// Ad detail with the caller's edit permission.
#[derive(Debug, Serialize)]
pub struct AdDetail {
    #[serde(flatten)]
    pub ad: Ad,
    pub can_edit: bool,
}

// ---------------------------------------------------------------------------
// Listing and detail
// ---------------------------------------------------------------------------

/// GET /api/v1/ads
///
/// Newest first, 12 per page, optional `category` and `search` filters.
pub async fn list_ads(
    State(state): State<AppState>,
    Query(params): Query<AdListParams>,
) -> AppResult<Json<PagedResponse<Ad>>> {
    let filter = AdFilter {
        category: params.category(),
        search: params.search(),
        owner_id: None,
    };
    paged_listing(&state, &filter, params.page).await.map(Json)
}

/// GET /api/v1/ads/mine
///
/// The caller's own ads, same ordering and filters as [`list_ads`].
pub async fn my_ads(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<AdListParams>,
) -> AppResult<Json<PagedResponse<Ad>>> {
    let filter = AdFilter {
        category: params.category(),
        search: params.search(),
        owner_id: Some(auth.user_id),
    };
    paged_listing(&state, &filter, params.page).await.map(Json)
}

/// GET /api/v1/ads/{id}
pub async fn get_ad(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(raw_id): Path<String>,
) -> AppResult<Json<AdDetail>> {
    let ad = load_ad(&state, &raw_id).await?;
    let can_edit = can_act(&identity, ad.user_id);
    Ok(Json(AdDetail { ad, can_edit }))
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// POST /api/v1/ads
///
/// Multipart form: `title`, `description`, `price`, `category`, optional
/// `location` and `image`. Seller name and phone come from the caller's
/// profile.
pub async fn create_ad(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Ad>)> {
    let form = read_form(&mut multipart, AD_IMAGE_FIELD).await?;
    let input = AdForm::from_form(&form)?;

    let owner = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Authentication required".into())))?;

    let image_id = match form.image {
        Some(image) => Some(store_image(&state.pool, image).await?),
        None => None,
    };

    let (seller, cell_no) = seller_contact(&owner);
    let created = AdRepo::create(
        &state.pool,
        &CreateAd {
            user_id: owner.id,
            title: input.title,
            description: input.description,
            seller,
            cell_no,
            price: input.price,
            category: input.category,
            location: input.location,
            image_id,
        },
    )
    .await;
    let ad = match created {
        Ok(ad) => ad,
        Err(e) => {
            // The blob was written first; drop it so it is not orphaned.
            discard_image(&state.pool, image_id).await;
            return Err(e.into());
        }
    };

    state.event_bus.publish(
        DomainEvent::new(EventKind::AdCreated, Subject::Ad(ad.id))
            .by(auth.user_id),
    );
    tracing::info!(ad_id = ad.id, user_id = auth.user_id, "Ad created");

    Ok((StatusCode::CREATED, Json(ad)))
}

/// PUT /api/v1/ads/{id}
///
/// Full edit by the owner or an admin. `created_at` and ownership never
/// change; the image is replaced only when a new one is uploaded, and the
/// seller contact is re-derived from the ad's owner.
pub async fn update_ad(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<Ad>> {
    let existing = load_ad(&state, &raw_id).await?;
    ensure_can_act(&auth.identity(), existing.user_id)?;

    let form = read_form(&mut multipart, AD_IMAGE_FIELD).await?;
    let input = AdForm::from_form(&form)?;

    let owner = match existing.user_id {
        Some(owner_id) => UserRepo::find_by_id(&state.pool, owner_id).await?,
        None => None,
    };
    let (seller, cell_no) = match &owner {
        Some(owner) => seller_contact(owner),
        None => (existing.seller.clone(), existing.cell_no.clone()),
    };

    let new_image_id = match form.image {
        Some(image) => Some(store_image(&state.pool, image).await?),
        None => None,
    };

    let written = AdRepo::update(
        &state.pool,
        existing.id,
        &UpdateAd {
            title: input.title,
            description: input.description,
            seller,
            cell_no,
            price: input.price,
            category: input.category,
            location: input.location,
            image_id: new_image_id.or(existing.image_id),
        },
    )
    .await;
    let updated = settle_image_write(
        &state.pool,
        new_image_id,
        written,
        CoreError::NotFound {
            entity: "Ad",
            id: existing.id,
        },
    )
    .await?;

    if new_image_id.is_some() {
        discard_image(&state.pool, existing.image_id).await;
    }

    state.event_bus.publish(
        DomainEvent::new(EventKind::AdUpdated, Subject::Ad(updated.id))
            .by(auth.user_id),
    );
    tracing::info!(ad_id = updated.id, user_id = auth.user_id, "Ad updated");

    Ok(Json(updated))
}

/// DELETE /api/v1/ads/{id}
///
/// Removes the image best-effort, then the ad. Returns 204 No Content.
pub async fn delete_ad(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
) -> AppResult<StatusCode> {
    let ad = load_ad(&state, &raw_id).await?;
    ensure_can_act(&auth.identity(), ad.user_id)?;

    discard_image(&state.pool, ad.image_id).await;
    AdRepo::delete(&state.pool, ad.id).await?;

    state.event_bus.publish(
        DomainEvent::new(EventKind::AdDeleted, Subject::Ad(ad.id))
            .by(auth.user_id),
    );
    tracing::info!(ad_id = ad.id, user_id = auth.user_id, "Ad deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn paged_listing(
    state: &AppState,
    filter: &AdFilter,
    page: Option<i64>,
) -> AppResult<PagedResponse<Ad>> {
    let page = clamp_page(page);
    let total = AdRepo::count(&state.pool, filter).await?;
    let data = AdRepo::list(
        &state.pool,
        filter,
        ADS_PER_PAGE,
        page_offset(page, ADS_PER_PAGE),
    )
    .await?;
    Ok(PagedResponse {
        data,
        pagination: PageInfo::new(page, ADS_PER_PAGE, total),
    })
}

/// Load an ad by its path segment. Malformed and unknown ids are both 404.
async fn load_ad(state: &AppState, raw_id: &str) -> AppResult<Ad> {
    let id: DbId =
        parse_db_id(raw_id).ok_or_else(|| AppError::NotFound(format!("Ad '{raw_id}' not found")))?;
    AdRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Ad", id }))
}

/// Seller display name and contact phone shown on an ad.
fn seller_contact(owner: &User) -> (String, String) {
    (
        seller_display_name(&owner.first_name, &owner.last_name, &owner.username),
        owner.phone.clone(),
    )
}

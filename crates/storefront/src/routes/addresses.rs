//! Address book route handlers.
//!
//! Every successful response carries the user's address list as
//! `{"addresses": [...]}`.

use axum::{
    extract::{Path, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stride_core::{Address, AddressFields, AddressId};

use super::{ApiJson, ApiResponse, parse_id};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::state::AppState;

const INVALID_ADDRESS_ID: &str = "Invalid address ID format";

/// Address form; absent fields count as blank.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressForm {
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl From<AddressForm> for AddressFields {
    fn from(form: AddressForm) -> Self {
        Self {
            street_address: form.street_address,
            city: form.city,
            state: form.state,
            zip_code: form.zip_code,
        }
    }
}

#[derive(Debug, Serialize)]
struct AddressList {
    addresses: Vec<Address>,
}

fn list_response(message: &str, addresses: Vec<Address>) -> Response {
    ApiResponse::ok(message, AddressList { addresses })
}

/// POST /api/addresses
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    ApiJson(form): ApiJson<AddressForm>,
) -> Result<Response> {
    let addresses = state.addresses().add(user_id, form.into()).await?;
    Ok(list_response("Address added successfully", addresses))
}

/// GET /api/addresses
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Response> {
    let addresses = state.addresses().list(user_id).await?;
    Ok(list_response("Addresses fetched successfully", addresses))
}

/// The selected address as a zero- or one-element list.
///
/// GET /api/addresses/selected
#[instrument(skip(state))]
pub async fn selected(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Response> {
    let selected = state.addresses().selected(user_id).await?;
    Ok(list_response(
        "Selected address fetched successfully",
        selected.into_iter().collect(),
    ))
}

/// PUT /api/addresses/{id}
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<AddressForm>,
) -> Result<Response> {
    let id: AddressId = parse_id(&id, INVALID_ADDRESS_ID)?;
    let addresses = state.addresses().edit(user_id, id, form.into()).await?;
    Ok(list_response("Address updated successfully", addresses))
}

/// DELETE /api/addresses/{id}
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let id: AddressId = parse_id(&id, INVALID_ADDRESS_ID)?;
    let addresses = state.addresses().delete(user_id, id).await?;
    Ok(list_response("Address deleted successfully", addresses))
}

/// PUT /api/addresses/{id}/select
#[instrument(skip(state))]
pub async fn select(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let id: AddressId = parse_id(&id, INVALID_ADDRESS_ID)?;
    let addresses = state.addresses().select(user_id, id).await?;
    Ok(list_response("Address selected successfully", addresses))
}

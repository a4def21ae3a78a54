// web-server/src/api/messages.rs
use actix_web::{post, web, HttpResponse};
use serde_json::json;
use crate::error::ApiError;
use crate::message_store::NewMessage;
use crate::AppState;

// Contact, property-interest and home-loan inquiries from the public site
#[post("/messages")]
pub async fn submit_message(
    state: web::Data<AppState>,
    body: web::Json<NewMessage>,
) -> Result<HttpResponse, ApiError> {
    let new = body.into_inner();
    new.validate()
        .map_err(|reason| ApiError::BadRequest(reason.to_string()))?;

    let message = state.messages.submit(new);
    tracing::info!("Received {:?} inquiry {}", message.inquiry, message.id);

    Ok(HttpResponse::Created().json(json!({
        "id": message.id,
        "message": "Thank you, we will be in touch shortly"
    })))
}

//! # Camera Stream
//!
//! `GET /api/camera-stream` serves a `multipart/x-mixed-replace` body, one
//! JPEG per part, fed from the shared [`FrameMultiplexer`](zvonek_hub::FrameMultiplexer).
//! Dropping the response body leaves the session; the last one to leave
//! stops acquisition.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::StreamExt;

use zvonek_hub::MULTIPART_CONTENT_TYPE;

use crate::error::AppError;
use crate::state::AppState;

/// Build the camera router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/camera-stream", get(camera_stream))
}

/// GET /api/camera-stream — Live MJPEG stream.
#[utoipa::path(
    get,
    path = "/api/camera-stream",
    responses(
        (status = 200, description = "multipart/x-mixed-replace stream of JPEG frames, boundary `frame`"),
        (status = 500, description = "Camera not initialized", body = crate::error::ErrorBody),
    ),
    tag = "camera"
)]
pub(crate) async fn camera_stream(State(state): State<AppState>) -> Result<Response, AppError> {
    let frames = state.frames.as_ref().ok_or(AppError::CameraNotInitialized)?;
    let parts = frames
        .subscribe_frames()
        .map(|frame| Ok::<_, Infallible>(frame.to_multipart_part()));

    Ok((
        [
            (CONTENT_TYPE, MULTIPART_CONTENT_TYPE),
            (CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(parts),
    )
        .into_response())
}

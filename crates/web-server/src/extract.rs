//! Extractors that reject with [`AppError`], so a malformed body or a
//! non-integer id yields our JSON `400` instead of axum's plain-text default.

use crate::error::AppError;
use axum::extract::{FromRequest, FromRequestParts};

/// `axum::Json`, rejecting with `400 {"error": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path`, rejecting with `400 {"error": ...}`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

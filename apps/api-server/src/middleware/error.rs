//! Error rendering - every failure leaves the server as `{code, message, reqId}`.

use std::fmt;
use std::future::{Future, Ready, ready};
use std::pin::Pin;

use actix_web::{
    Error, HttpMessage, HttpRequest, HttpResponse, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    error::InternalError,
    http::StatusCode,
};

use restgate_core::error::{ApiError, StoreError};
use restgate_core::ports::AuthError;
use restgate_shared::ErrorResponse;

use crate::observability::RequestId;

/// Application-level error type carried through actix.
#[derive(Debug, Clone)]
pub struct AppError(pub ApiError);

impl AppError {
    /// Log and build the response sent for this error on request `req_id`.
    pub fn send(&self, req_id: &str) -> HttpResponse {
        let error = &self.0;
        if error.status_code() >= 500 {
            tracing::error!(code = %error.code(), req_id = %req_id, "{}", error.message());
        } else {
            tracing::debug!(code = %error.code(), req_id = %req_id, "{}", error.message());
        }

        self.render(req_id)
    }

    fn render(&self, req_id: &str) -> HttpResponse {
        let error = &self.0;
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(
            error.code(),
            error.message(),
            req_id,
        ))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        // The request id is filled in by `ApiErrorHandler`.
        self.render("")
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self(err.into())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Convert any actix error into the error model, keeping `AppError`s as they are.
pub fn to_api_error(err: &Error) -> ApiError {
    match err.as_error::<AppError>() {
        Some(app) => app.0.clone(),
        None => ApiError::internal(err.to_string()),
    }
}

fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_string())
        .unwrap_or_default()
}

/// Default service: any request no route matched.
pub async fn no_route_mapped() -> AppResult<HttpResponse> {
    Err(AppError(ApiError::not_found()))
}

/// Terminal error handler.
///
/// Re-renders every error response, whichever layer produced it, with the
/// request id attached. Must be registered inside `RequestIdMiddleware`.
pub struct ApiErrorHandler;

impl<S, B> Transform<S, ServiceRequest> for ApiErrorHandler
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ApiErrorHandlerService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiErrorHandlerService { service }))
    }
}

pub struct ApiErrorHandlerService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for ApiErrorHandlerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Only the id is read up front: routing needs sole ownership of the request.
        let req_id = request_id(req.request());
        let fut = self.service.call(req);

        Box::pin(async move {
            match fut.await {
                Ok(res) => {
                    let Some(error) = res.response().error().map(to_api_error) else {
                        return Ok(res.map_into_left_body());
                    };

                    let (request, _) = res.into_parts();
                    let response = AppError(error).send(&req_id);
                    Ok(ServiceResponse::new(request, response).map_into_right_body())
                }
                Err(err) => {
                    let response = AppError(to_api_error(&err)).send(&req_id);
                    Err(InternalError::from_response(err.to_string(), response).into())
                }
            }
        })
    }
}

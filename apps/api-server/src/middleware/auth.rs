//! Authentication and authorization middleware, plus the identity extractor.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{self, HeaderMap},
};

use restgate_core::domain::Principal;
use restgate_core::error::ApiError;
use restgate_core::services::AuthService;

use super::error::AppError;

/// Bearer token of the `authorization` header. The scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Requires a valid access token and attaches the [`Principal`] to the request.
pub struct RequiresLogin {
    auth: Arc<AuthService>,
}

impl RequiresLogin {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequiresLogin
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequiresLoginService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequiresLoginService {
            service: Rc::new(service),
            auth: self.auth.clone(),
        }))
    }
}

pub struct RequiresLoginService<S> {
    service: Rc<S>,
    auth: Arc<AuthService>,
}

impl<S, B> Service<ServiceRequest> for RequiresLoginService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let auth = self.auth.clone();

        Box::pin(async move {
            let token = bearer_token(req.headers()).map(str::to_owned);

            match auth.authenticate(token.as_deref()).await {
                Ok(principal) => {
                    tracing::debug!(login = %principal.login, "Request authenticated");
                    req.extensions_mut().insert(principal);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => Ok(req.error_response(AppError(err)).map_into_right_body()),
            }
        })
    }
}

/// Requires the authenticated principal to hold one of `roles`.
///
/// Must run after [`RequiresLogin`]. An empty role list lets every request through.
pub struct RequiresRole {
    roles: Rc<Vec<String>>,
}

impl RequiresRole {
    pub fn new(roles: Vec<String>) -> Self {
        Self {
            roles: Rc::new(roles),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequiresRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequiresRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequiresRoleService {
            service,
            roles: self.roles.clone(),
        }))
    }
}

pub struct RequiresRoleService<S> {
    service: S,
    roles: Rc<Vec<String>>,
}

impl<S> RequiresRoleService<S> {
    fn allows(&self, req: &ServiceRequest) -> bool {
        if self.roles.is_empty() {
            return true;
        }

        req.extensions()
            .get::<Principal>()
            .is_some_and(|principal| principal.has_any_role(&self.roles))
    }
}

impl<S, B> Service<ServiceRequest> for RequiresRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !self.allows(&req) {
            tracing::debug!(required = ?self.roles, "Forbidden operation");
            let res = req.error_response(AppError(ApiError::forbidden()));
            return Box::pin(async move { Ok(res.map_into_right_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Authenticated principal extractor, used by `logout` and `refresh`.
///
/// Only succeeds behind [`RequiresLogin`].
#[derive(Debug, Clone)]
pub struct Identity(pub Principal);

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().cloned();
        ready(principal.map(Identity).ok_or_else(|| AppError(ApiError::unauthorized())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header::HeaderValue};
    use actix_web::{App, HttpResponse, test, web};

    fn principal(roles: &[&str]) -> Principal {
        Principal {
            id: "1".to_string(),
            login: "test".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// App with one route requiring `$required`, called as a principal
    /// holding `$held` (or anonymously when `None`).
    macro_rules! role_app {
        ($required:expr, $held:expr) => {
            test::init_service(
                App::new()
                    .wrap_fn(|req, srv| {
                        let held: Option<&[&str]> = $held;
                        if let Some(roles) = held {
                            req.extensions_mut().insert(principal(roles));
                        }
                        srv.call(req)
                    })
                    .route(
                        "/",
                        web::get()
                            .to(HttpResponse::Ok)
                            .wrap(RequiresRole::new($required)),
                    ),
            )
            .await
        };
    }

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|r| r.to_string()).collect()
    }

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(authorization).unwrap(),
        );
        headers
    }

    #[::core::prelude::v1::test]
    fn test_bearer_token_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("BEARER  abc ")), Some("abc"));
    }

    #[::core::prelude::v1::test]
    fn test_bearer_token_rejects_other_shapes() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("bearer")), None);
        assert_eq!(bearer_token(&headers("bearer ")), None);
        assert_eq!(bearer_token(&headers("abc")), None);
    }

    #[actix_web::test]
    async fn test_empty_role_list_lets_everyone_through() {
        let app = role_app!(Vec::new(), None);

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_missing_principal_is_forbidden() {
        let app = role_app!(roles(&["ADMIN"]), None);

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_any_matching_role_is_enough() {
        let app = role_app!(roles(&["ADMIN"]), Some(&["USER", "ADMIN"]));
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);

        let app = role_app!(roles(&["ADMIN"]), Some(&["USER"]));
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}

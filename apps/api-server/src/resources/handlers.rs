//! The five generated CRUD handlers.

use actix_web::{HttpRequest, HttpResponse, web};

use restgate_core::error::ApiError;
use restgate_core::ports::Document;
use restgate_shared::ListResponse;

use super::Resource;
use super::query::parse_query_parameters;
use crate::middleware::error::AppResult;

/// GET /{name}
pub async fn list(resource: web::Data<Resource>, req: HttpRequest) -> AppResult<HttpResponse> {
    let options = parse_query_parameters(req.query_string());

    let documents = resource.documents().find(&options).await?;
    let list = documents
        .into_iter()
        .map(|document| resource.apply_filter(document))
        .collect();

    Ok(HttpResponse::Ok().json(ListResponse::<Document>::new(list)))
}

/// GET /{name}/{id}
pub async fn get(
    resource: web::Data<Resource>,
    id: web::Path<String>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let options = parse_query_parameters(req.query_string()).populate_only();

    let document = resource
        .documents()
        .find_by_id(&id, &options)
        .await?
        .ok_or_else(|| ApiError::not_found_resource(&id))?;

    Ok(HttpResponse::Ok().json(resource.apply_filter(document)))
}

/// POST /{name}
pub async fn create(
    resource: web::Data<Resource>,
    body: web::Json<Document>,
) -> AppResult<HttpResponse> {
    let created = resource.documents().create(body.into_inner()).await?;

    Ok(HttpResponse::Created().json(resource.apply_filter(created)))
}

/// PUT /{name}/{id}
pub async fn update(
    resource: web::Data<Resource>,
    id: web::Path<String>,
    body: web::Json<Document>,
) -> AppResult<HttpResponse> {
    resource
        .documents()
        .update_by_id(&id, body.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found_resource(&id))?;

    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /{name}/{id}
pub async fn delete(resource: web::Data<Resource>, id: web::Path<String>) -> AppResult<HttpResponse> {
    let deleted = resource.documents().delete_by_id(&id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found_resource(&id).into());
    }

    Ok(HttpResponse::NoContent().finish())
}

//! Thin request layer over `crux_http`: JSON and multipart bodies in,
//! `ApiResult` out. Every response is turned into the crate's own error
//! type before it reaches an event, so the app never handles transport
//! types directly.

use crux_http::Http;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::api::multipart::MultipartBody;
use crate::api::ApiResult;
use crate::event::Event;
use crate::{AppError, ErrorKind};

pub type HttpCapability = Http<Event>;

const JSON: &str = "application/json";

fn encode<B: Serialize>(body: &B) -> Result<Vec<u8>, AppError> {
    serde_json::to_vec(body).map_err(|e| {
        AppError::new(ErrorKind::Serialization, "request body could not be encoded")
            .with_internal(e.to_string())
    })
}

fn transport_error(e: &crux_http::HttpError) -> AppError {
    AppError::new(ErrorKind::Network, "request failed").with_internal(e.to_string())
}

fn json_result<T>(result: crux_http::Result<crux_http::Response<T>>) -> ApiResult<T> {
    let mut response = result.map_err(|e| transport_error(&e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::from_http_status(u16::from(status), None));
    }
    response.take_body().ok_or_else(|| {
        AppError::new(ErrorKind::Deserialization, "empty response body")
            .with_context("http_status", u16::from(status).to_string())
    })
}

fn unit_result(result: crux_http::Result<crux_http::Response<Vec<u8>>>) -> ApiResult<()> {
    let mut response = result.map_err(|e| transport_error(&e))?;
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.take_body();
        Err(AppError::from_http_status(u16::from(status), body.as_deref()))
    }
}

pub fn get_json<T, F>(http: &HttpCapability, url: &Url, make_event: F)
where
    T: DeserializeOwned + Send + 'static,
    F: FnOnce(ApiResult<T>) -> Event + Send + 'static,
{
    debug!(%url, "GET");
    http.get(url.as_str())
        .expect_json::<T>()
        .send(move |result| make_event(json_result(result)));
}

pub fn post_json<B, T, F>(
    http: &HttpCapability,
    url: &Url,
    body: &B,
    make_event: F,
) -> Result<(), AppError>
where
    B: Serialize,
    T: DeserializeOwned + Send + 'static,
    F: FnOnce(ApiResult<T>) -> Event + Send + 'static,
{
    let bytes = encode(body)?;
    debug!(%url, size = bytes.len(), "POST");
    http.post(url.as_str())
        .header("Content-Type", JSON)
        .body_bytes(bytes)
        .expect_json::<T>()
        .send(move |result| make_event(json_result(result)));
    Ok(())
}

pub fn put_json<B, F>(
    http: &HttpCapability,
    url: &Url,
    body: &B,
    make_event: F,
) -> Result<(), AppError>
where
    B: Serialize,
    F: FnOnce(ApiResult<()>) -> Event + Send + 'static,
{
    let bytes = encode(body)?;
    debug!(%url, size = bytes.len(), "PUT");
    http.put(url.as_str())
        .header("Content-Type", JSON)
        .body_bytes(bytes)
        .send(move |result| make_event(unit_result(result)));
    Ok(())
}

pub fn delete<F>(http: &HttpCapability, url: &Url, make_event: F)
where
    F: FnOnce(ApiResult<()>) -> Event + Send + 'static,
{
    debug!(%url, "DELETE");
    http.delete(url.as_str())
        .send(move |result| make_event(unit_result(result)));
}

pub fn post_multipart<F>(http: &HttpCapability, url: &Url, form: MultipartBody, make_event: F)
where
    F: FnOnce(ApiResult<()>) -> Event + Send + 'static,
{
    let content_type = form.content_type();
    let bytes = form.into_bytes();
    debug!(%url, size = bytes.len(), "POST multipart");
    http.post(url.as_str())
        .header("Content-Type", content_type.as_str())
        .body_bytes(bytes)
        .send(move |result| make_event(unit_result(result)));
}

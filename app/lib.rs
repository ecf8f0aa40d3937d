/*!
This crate is the datadee demo web app. It serves one html page with three tabs. The "ML Model" tab trains a linear regression on an uploaded csv and predicts with it. The "Derive Key" and "TDX Quote" tabs pass through to tappd, the attestation service of a dstack confidential VM.

Trained models are kept in memory as immutable versions, so a prediction always uses exactly the model it looked up, even while another request trains a new one.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod actions;
mod form;
mod ml;
mod page;
mod registry;
mod serve;

pub use self::{
	ml::{train_model, TrainedModel},
	registry::{ModelRegistry, ModelVersion},
	serve::serve,
};
use anyhow::Result;
use datadee_tappd::TappdClient;
use http::{header, Method, StatusCode};
use hyper::Body;
use std::{sync::Arc, time::Duration};

pub struct Options {
	pub host: std::net::IpAddr,
	pub port: u16,
	/// When `None`, the endpoint comes from `DSTACK_SIMULATOR_ENDPOINT`.
	pub tappd_endpoint: Option<String>,
	pub tappd_timeout: Duration,
}

pub struct Context {
	pub registry: ModelRegistry,
	pub tappd: TappdClient,
}

impl Context {
	pub fn new(tappd: TappdClient) -> Context {
		Context {
			registry: ModelRegistry::default(),
			tappd,
		}
	}
}

pub async fn handle(context: Arc<Context>, request: http::Request<Body>) -> http::Response<Body> {
	let method = request.method().clone();
	let path = request.uri().path().to_owned();
	let mut response = match (&method, path.as_str()) {
		(&Method::OPTIONS, _) => preflight(),
		(&Method::GET, "/") => html(page::render(&page::PageProps {
			model_versions: context.registry.versions(),
			..Default::default()
		})),
		(&Method::GET, "/health") => text(StatusCode::OK, "ok"),
		(&Method::POST, "/train") => match form::parse_form(request).await {
			Ok(form) => html(page::render(&actions::train(&context, form).await)),
			Err(error) => bad_request(error),
		},
		(&Method::POST, "/predict") => match form::parse_form(request).await {
			Ok(form) => html(page::render(&actions::predict(&context, form).await)),
			Err(error) => bad_request(error),
		},
		(&Method::POST, "/derive_key") => match form::parse_form(request).await {
			Ok(form) => html(page::render(&actions::derive_key(&context, form).await)),
			Err(error) => bad_request(error),
		},
		(&Method::POST, "/tdx_quote") => match form::parse_form(request).await {
			Ok(form) => html(page::render(&actions::tdx_quote(&context, form).await)),
			Err(error) => bad_request(error),
		},
		_ => text(StatusCode::NOT_FOUND, "not found"),
	};
	response.headers_mut().insert(
		header::ACCESS_CONTROL_ALLOW_ORIGIN,
		header::HeaderValue::from_static("*"),
	);
	tracing::info!(%method, %path, status = response.status().as_u16());
	response
}

fn html(body: String) -> http::Response<Body> {
	let mut response = http::Response::new(Body::from(body));
	response.headers_mut().insert(
		header::CONTENT_TYPE,
		header::HeaderValue::from_static("text/html; charset=utf-8"),
	);
	response
}

fn text(status: StatusCode, body: &'static str) -> http::Response<Body> {
	let mut response = http::Response::new(Body::from(body));
	*response.status_mut() = status;
	response
}

fn bad_request(error: anyhow::Error) -> http::Response<Body> {
	let mut response = http::Response::new(Body::from(format!("bad request: {}", error)));
	*response.status_mut() = StatusCode::BAD_REQUEST;
	response
}

fn preflight() -> http::Response<Body> {
	let mut response = http::Response::new(Body::empty());
	*response.status_mut() = StatusCode::NO_CONTENT;
	let headers = response.headers_mut();
	let any = header::HeaderValue::from_static("*");
	headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, any.clone());
	headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, any);
	response
}

pub fn run(options: Options) -> Result<()> {
	tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()?
		.block_on(run_impl(options))
}

async fn run_impl(options: Options) -> Result<()> {
	let tappd = TappdClient::new(options.tappd_endpoint.as_deref(), options.tappd_timeout)?;
	tracing::info!(endpoint = tappd.endpoint(), "using tappd");
	let context = Context::new(tappd);
	serve(options.host, options.port, context, handle).await?;
	Ok(())
}

#[cfg(test)]
fn test_context() -> Arc<Context> {
	// Nothing listens on this port, so every tappd call is refused.
	let port = std::net::TcpListener::bind("127.0.0.1:0")
		.unwrap()
		.local_addr()
		.unwrap()
		.port();
	let endpoint = format!("http://127.0.0.1:{}", port);
	let tappd = TappdClient::new(Some(&endpoint), Duration::from_secs(5)).unwrap();
	Arc::new(Context::new(tappd))
}

#[cfg(test)]
async fn body_string(response: http::Response<Body>) -> String {
	let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
	String::from_utf8(bytes.to_vec()).unwrap()
}

#[cfg(test)]
fn get(path: &str) -> http::Request<Body> {
	http::Request::builder()
		.method(Method::GET)
		.uri(path)
		.body(Body::empty())
		.unwrap()
}

#[cfg(test)]
#[tokio::test]
async fn test_index_and_health() {
	let context = test_context();
	let response = handle(context.clone(), get("/")).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
	let body = body_string(response).await;
	assert!(body.contains("ML Model and API Testing Interface"));
	assert!(body.contains("Derive Key"));
	assert!(body.contains("TDX Quote"));
	let response = handle(context.clone(), get("/health")).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_string(response).await, "ok");
	let response = handle(context, get("/missing")).await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[cfg(test)]
#[tokio::test]
async fn test_preflight() {
	let request = http::Request::builder()
		.method(Method::OPTIONS)
		.uri("/train")
		.body(Body::empty())
		.unwrap();
	let response = handle(test_context(), request).await;
	assert_eq!(response.status(), StatusCode::NO_CONTENT);
	assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
	assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "*");
}

#[cfg(test)]
#[tokio::test]
async fn test_train_then_predict() {
	let context = test_context();
	let request = form::multipart_request(
		"/train",
		&[
			("file", &b"x,y\n1,2\n2,4\n3,6\n"[..]),
			("target_column", &b"y"[..]),
		],
	);
	let body = body_string(handle(context.clone(), request).await).await;
	assert!(body.contains(
		"Model trained successfully! Features: [&#39;x&#39;] (model version 1)"
	));
	let request = form::multipart_request("/predict", &[("file", &b"x\n4\n5\n"[..])]);
	let body = body_string(handle(context.clone(), request).await).await;
	assert!(body.contains("Predictions: [8.0, 10.0]"));
	let request = form::multipart_request(
		"/predict",
		&[("file", &b"x\n4\n"[..]), ("model_id", &b"7"[..])],
	);
	let body = body_string(handle(context, request).await).await;
	assert!(body.contains("Error making predictions: model version 7 does not exist"));
}

#[cfg(test)]
#[tokio::test]
async fn test_train_with_malformed_csv_reports_the_error() {
	let context = test_context();
	let request = form::multipart_request(
		"/train",
		&[
			("file", &b"x,y\n1,2\n3\n"[..]),
			("target_column", &b"y"[..]),
		],
	);
	let response = handle(context.clone(), request).await;
	assert_eq!(response.status(), StatusCode::OK);
	let body = body_string(response).await;
	assert!(body.contains("Error training model:"));
	assert!(context.registry.versions().is_empty());
}

#[cfg(test)]
#[tokio::test]
async fn test_predict_without_a_model() {
	let request = form::multipart_request("/predict", &[("file", &b"x\n4\n"[..])]);
	let body = body_string(handle(test_context(), request).await).await;
	assert!(body.contains("Error making predictions: no model has been trained yet"));
}

#[cfg(test)]
#[tokio::test]
async fn test_unreachable_tappd_is_reported_in_the_page() {
	let context = test_context();
	let request = http::Request::builder()
		.method(Method::POST)
		.uri("/derive_key")
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(Body::from("path=%2F&test_param=test"))
		.unwrap();
	let response = handle(context.clone(), request).await;
	assert_eq!(response.status(), StatusCode::OK);
	let body = body_string(response).await;
	assert!(body.contains("Error contacting tappd: could not connect to tappd"));
	let request = http::Request::builder()
		.method(Method::POST)
		.uri("/tdx_quote")
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(Body::from("test_param=test"))
		.unwrap();
	let body = body_string(handle(context, request).await).await;
	assert!(body.contains("Error contacting tappd:"));
}

#[cfg(test)]
#[tokio::test]
async fn test_bad_form_is_a_bad_request() {
	let request = http::Request::builder()
		.method(Method::POST)
		.uri("/train")
		.header(header::CONTENT_TYPE, "text/plain")
		.body(Body::from("hello"))
		.unwrap();
	let response = handle(test_context(), request).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

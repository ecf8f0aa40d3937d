use anyhow::{bail, Result};
use std::collections::BTreeMap;

/// The fields of a submitted form, from either a multipart or a urlencoded body.
#[derive(Debug, Default)]
pub struct Form {
	fields: BTreeMap<String, Vec<u8>>,
}

impl Form {
	pub fn bytes(&self, name: &str) -> Option<&[u8]> {
		self.fields.get(name).map(|value| value.as_slice())
	}

	/// The field as text, or `None` when it is missing or empty.
	pub fn text(&self, name: &str) -> Option<String> {
		self.fields
			.get(name)
			.map(|value| String::from_utf8_lossy(value).into_owned())
			.filter(|value| !value.is_empty())
	}
}

pub async fn parse_form(request: http::Request<hyper::Body>) -> Result<Form> {
	let content_type = request
		.headers()
		.get(http::header::CONTENT_TYPE)
		.and_then(|content_type| content_type.to_str().ok())
		.unwrap_or("")
		.to_owned();
	let mut fields = BTreeMap::new();
	if content_type.starts_with("multipart/form-data") {
		let boundary = multer::parse_boundary(&content_type)?;
		let mut multipart = multer::Multipart::new(request.into_body(), boundary);
		while let Some(field) = multipart.next_field().await? {
			let name = match field.name() {
				Some(name) => name.to_owned(),
				None => bail!("a form field is missing its name"),
			};
			let data = field.bytes().await?;
			fields.insert(name, data.to_vec());
		}
	} else if content_type.starts_with("application/x-www-form-urlencoded") {
		let body = hyper::body::to_bytes(request.into_body()).await?;
		for (name, value) in url::form_urlencoded::parse(&body) {
			fields.insert(name.into_owned(), value.into_owned().into_bytes());
		}
	} else {
		bail!("unsupported content type \"{}\"", content_type);
	}
	Ok(Form { fields })
}

#[cfg(test)]
pub(crate) fn multipart_request(
	path: &str,
	fields: &[(&str, &[u8])],
) -> http::Request<hyper::Body> {
	let boundary = "datadeeboundary";
	let mut body = Vec::new();
	for (name, value) in fields {
		body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
		body.extend_from_slice(
			format!(
				"Content-Disposition: form-data; name=\"{}\"; filename=\"{}.csv\"\r\n\r\n",
				name, name
			)
			.as_bytes(),
		);
		body.extend_from_slice(value);
		body.extend_from_slice(b"\r\n");
	}
	body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
	http::Request::builder()
		.method(http::Method::POST)
		.uri(path)
		.header(
			http::header::CONTENT_TYPE,
			format!("multipart/form-data; boundary={}", boundary),
		)
		.body(hyper::Body::from(body))
		.unwrap()
}

#[cfg(test)]
#[tokio::test]
async fn test_parse_multipart_form() {
	let request = multipart_request("/train", &[("file", &b"x,y\n1,2\n"[..]), ("target_column", &b"y"[..])]);
	let form = parse_form(request).await.unwrap();
	assert_eq!(form.bytes("file"), Some(&b"x,y\n1,2\n"[..]));
	assert_eq!(form.text("target_column").as_deref(), Some("y"));
	assert_eq!(form.text("model_id"), None);
}

#[cfg(test)]
#[tokio::test]
async fn test_parse_urlencoded_form() {
	let request = http::Request::builder()
		.method(http::Method::POST)
		.uri("/derive_key")
		.header(
			http::header::CONTENT_TYPE,
			"application/x-www-form-urlencoded",
		)
		.body(hyper::Body::from("path=%2Fkeys&test_param="))
		.unwrap();
	let form = parse_form(request).await.unwrap();
	assert_eq!(form.text("path").as_deref(), Some("/keys"));
	assert_eq!(form.text("test_param"), None);
}

#[cfg(test)]
#[tokio::test]
async fn test_parse_form_rejects_other_bodies() {
	let request = http::Request::builder()
		.method(http::Method::POST)
		.uri("/train")
		.body(hyper::Body::from("{}"))
		.unwrap();
	assert!(parse_form(request).await.is_err());
}

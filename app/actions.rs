use crate::{
	form::Form,
	ml::{format_names, train_model},
	page::{PageProps, Tab},
	registry::ModelVersion,
	Context,
};
use anyhow::{format_err, Result};
use datadee_tappd::{QuoteHashAlgorithm, TappdError};

pub async fn train(context: &Context, form: Form) -> PageProps {
	let training_result = match train_and_register(context, form).await {
		Ok((version, feature_names)) => format!(
			"Model trained successfully! Features: {} (model version {})",
			format_names(&feature_names),
			version
		),
		Err(error) => format!("Error training model: {}", error),
	};
	PageProps {
		tab: Tab::Model,
		model_versions: context.registry.versions(),
		training_result: Some(training_result),
		..Default::default()
	}
}

async fn train_and_register(context: &Context, form: Form) -> Result<(ModelVersion, Vec<String>)> {
	let file = form
		.bytes("file")
		.ok_or_else(|| format_err!("a training data file is required"))?
		.to_owned();
	let target_column_name = form
		.text("target_column")
		.ok_or_else(|| format_err!("a target column name is required"))?;
	let model = tokio::task::spawn_blocking(move || train_model(&file, &target_column_name)).await??;
	let feature_names = model.feature_names.clone();
	let version = context.registry.insert(model);
	tracing::info!(%version, ?feature_names, "trained a model");
	Ok((version, feature_names))
}

pub async fn predict(context: &Context, form: Form) -> PageProps {
	let prediction_result = match predict_with_version(context, form).await {
		Ok(predictions) => format!("Predictions: {:?}", predictions),
		Err(error) => format!("Error making predictions: {}", error),
	};
	PageProps {
		tab: Tab::Model,
		model_versions: context.registry.versions(),
		prediction_result: Some(prediction_result),
		..Default::default()
	}
}

async fn predict_with_version(context: &Context, form: Form) -> Result<Vec<f32>> {
	let model = match form.text("model_id") {
		Some(model_id) => {
			let version: ModelVersion = model_id
				.parse()
				.map_err(|_| format_err!("\"{}\" is not a model version", model_id))?;
			context
				.registry
				.get(version)
				.ok_or_else(|| format_err!("model version {} does not exist", version))?
		}
		None => {
			context
				.registry
				.latest()
				.ok_or_else(|| format_err!("no model has been trained yet"))?
				.1
		}
	};
	let file = form
		.bytes("file")
		.ok_or_else(|| format_err!("a test data file is required"))?
		.to_owned();
	let predictions = tokio::task::spawn_blocking(move || model.predict(&file)).await??;
	Ok(predictions)
}

pub async fn derive_key(context: &Context, form: Form) -> PageProps {
	let path = form.text("path").unwrap_or_else(|| "/".to_owned());
	let subject = form.text("test_param").unwrap_or_else(|| "test".to_owned());
	let derive_key_result = match get_derive_key(context, &path, &subject).await {
		Ok(result) => result,
		Err(error) => {
			tracing::warn!(%error, "derive key failed");
			format!("Error contacting tappd: {}", error)
		}
	};
	PageProps {
		tab: Tab::DeriveKey,
		model_versions: context.registry.versions(),
		derive_key_result: Some(derive_key_result),
		..Default::default()
	}
}

async fn get_derive_key(context: &Context, path: &str, subject: &str) -> Result<String, TappdError> {
	let response = context.tappd.derive_key(path, subject).await?;
	let key = response.to_bytes(None)?;
	let key_32 = response.to_bytes(Some(32))?;
	Ok(format!(
		"DeriveKey: {}\nDerive 32bytes: {}",
		hex::encode(key),
		hex::encode(key_32)
	))
}

pub async fn tdx_quote(context: &Context, form: Form) -> PageProps {
	let report_data = form.text("test_param").unwrap_or_else(|| "test".to_owned());
	let tdx_quote_result = match context
		.tappd
		.tdx_quote(report_data.as_bytes(), QuoteHashAlgorithm::default())
		.await
	{
		Ok(quote) => format!("TDX Quote: {}", quote),
		Err(error) => {
			tracing::warn!(%error, "tdx quote failed");
			format!("Error contacting tappd: {}", error)
		}
	};
	PageProps {
		tab: Tab::TdxQuote,
		model_versions: context.registry.versions(),
		tdx_quote_result: Some(tdx_quote_result),
		..Default::default()
	}
}

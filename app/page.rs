use crate::registry::ModelVersion;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
	Model,
	DeriveKey,
	TdxQuote,
}

impl Default for Tab {
	fn default() -> Self {
		Tab::Model
	}
}

/// Everything the page shows. Each action fills in its own result box.
#[derive(Debug, Default)]
pub struct PageProps {
	pub tab: Tab,
	pub model_versions: Vec<ModelVersion>,
	pub training_result: Option<String>,
	pub prediction_result: Option<String>,
	pub derive_key_result: Option<String>,
	pub tdx_quote_result: Option<String>,
}

const TITLE: &str = "ML Model and API Testing Interface";

const STYLE: &str = "
body { font-family: sans-serif; margin: 2rem; max-width: 64rem; }
.tabs > input { display: none; }
.tabs > label { display: inline-block; padding: 0.5rem 1rem; border: 1px solid #ccc; border-bottom: none; cursor: pointer; }
.tabs > input:checked + label { background: #eee; font-weight: bold; }
.panel { display: none; border: 1px solid #ccc; padding: 1rem; }
#tab-model:checked ~ #panel-model, #tab-derive-key:checked ~ #panel-derive-key, #tab-tdx-quote:checked ~ #panel-tdx-quote { display: block; }
.row { display: flex; gap: 2rem; }
.column { flex: 1; }
form > * { display: block; margin-bottom: 0.5rem; }
pre { background: #f6f6f6; padding: 0.5rem; white-space: pre-wrap; word-break: break-all; min-height: 1.5rem; }
";

pub fn render(props: &PageProps) -> String {
	let checked = |tab: Tab| if props.tab == tab { " checked" } else { "" };
	let model_options: String = props
		.model_versions
		.iter()
		.rev()
		.map(|version| format!("<option value=\"{0}\">version {0}</option>", version))
		.collect();
	format!(
		r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<h1>{title}</h1>
<div class="tabs">
<input type="radio" name="tab" id="tab-model"{model_checked}><label for="tab-model">ML Model</label>
<input type="radio" name="tab" id="tab-derive-key"{derive_key_checked}><label for="tab-derive-key">Derive Key</label>
<input type="radio" name="tab" id="tab-tdx-quote"{tdx_quote_checked}><label for="tab-tdx-quote">TDX Quote</label>
<div class="panel" id="panel-model">
<div class="row">
<div class="column">
<form method="post" action="/train" enctype="multipart/form-data">
<label>Upload Training Data (CSV) <input type="file" name="file" accept=".csv"></label>
<label>Target Column Name <input type="text" name="target_column"></label>
<button type="submit">Train Model</button>
</form>
<h3>Training Result</h3>
<pre>{training_result}</pre>
</div>
<div class="column">
<form method="post" action="/predict" enctype="multipart/form-data">
<label>Upload Test Data (CSV) <input type="file" name="file" accept=".csv"></label>
<label>Model <select name="model_id"><option value="">latest</option>{model_options}</select></label>
<button type="submit">Make Predictions</button>
</form>
<h3>Predictions</h3>
<pre>{prediction_result}</pre>
</div>
</div>
</div>
<div class="panel" id="panel-derive-key">
<form method="post" action="/derive_key">
<label>Path <input type="text" name="path" value="/"></label>
<label>Test Parameter <input type="text" name="test_param" value="test"></label>
<button type="submit">Get Derive Key</button>
</form>
<h3>Derive Key Result</h3>
<pre>{derive_key_result}</pre>
</div>
<div class="panel" id="panel-tdx-quote">
<form method="post" action="/tdx_quote">
<label>Test Parameter <input type="text" name="test_param" value="test"></label>
<button type="submit">Get TDX Quote</button>
</form>
<h3>TDX Quote Result</h3>
<pre>{tdx_quote_result}</pre>
</div>
</div>
</body>
</html>
"#,
		title = TITLE,
		style = STYLE,
		model_checked = checked(Tab::Model),
		derive_key_checked = checked(Tab::DeriveKey),
		tdx_quote_checked = checked(Tab::TdxQuote),
		model_options = model_options,
		training_result = escape(props.training_result.as_deref().unwrap_or("")),
		prediction_result = escape(props.prediction_result.as_deref().unwrap_or("")),
		derive_key_result = escape(props.derive_key_result.as_deref().unwrap_or("")),
		tdx_quote_result = escape(props.tdx_quote_result.as_deref().unwrap_or("")),
	)
}

pub fn escape(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());
	for c in value.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c),
		}
	}
	escaped
}

#[test]
fn test_escape() {
	assert_eq!(
		escape("<b>\"x\" & 'y'</b>"),
		"&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
	);
}

#[test]
fn test_render_selects_the_tab_and_escapes_results() {
	let html = render(&PageProps {
		tab: Tab::DeriveKey,
		model_versions: vec![ModelVersion(1), ModelVersion(2)],
		derive_key_result: Some("Error contacting tappd: <refused>".to_owned()),
		..Default::default()
	});
	assert!(html.contains(r#"id="tab-derive-key" checked"#));
	assert!(!html.contains(r#"id="tab-model" checked"#));
	assert!(html.contains("Error contacting tappd: &lt;refused&gt;"));
	assert!(html.contains(r#"<option value="2">version 2</option><option value="1">version 1</option>"#));
}

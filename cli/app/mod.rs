use crate::AppOptions;
use anyhow::Result;
use std::time::Duration;

pub fn app(options: AppOptions) -> Result<()> {
	datadee_app::run(datadee_app::Options {
		host: options.host,
		port: options.port,
		tappd_endpoint: options.tappd_endpoint,
		tappd_timeout: Duration::from_secs(options.tappd_timeout_secs),
	})
}

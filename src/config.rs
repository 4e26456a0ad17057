//! Config layering: a file (JSON or YAML), overridden by
//! `NAVKIT_*` environment variables, deserialized into `PipelineConfig`.

use std::path::Path;

use anyhow::Context;
use navkit_pipeline::PipelineConfig;

pub fn load(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let mut builder = ::config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(::config::File::from(path));
    }
    builder = builder.add_source(::config::Environment::with_prefix("NAVKIT").separator("__"));

    let built = builder.build().context("loading pipeline configuration")?;
    match built.try_deserialize::<PipelineConfig>() {
        Ok(config) => Ok(config),
        // No file and no matching env vars: fall back to the built-in defaults
        // rather than failing a run that never asked for overrides.
        Err(_) if path.is_none() => Ok(PipelineConfig::default()),
        Err(err) => Err(err).context("deserializing pipeline configuration"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config.w_s, PipelineConfig::default().w_s);
    }
}

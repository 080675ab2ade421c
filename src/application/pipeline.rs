//! Ordered configuration of a [`ClientContext`]
//!
//! Stages run in sequence. When one fails, nothing after it runs and the
//! stages that already succeeded are released in reverse order, so the
//! context is left as it was before the run.

use super::stages::{
    ApiStage, CacheStage, ConfigStage, ConfigStoreStage, KeyringStage, MerkleStage,
    SecretSyncerStage, UiStage,
};
use crate::config::FixtureOptions;
use crate::domain::{ClientContext, DomainError, DomainResult};
use tracing::{debug, warn};

pub struct ConfigurationPipeline {
    stages: Vec<Box<dyn ConfigStage>>,
}

impl ConfigurationPipeline {
    /// Pipeline with no stages
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// API, config store, secret syncer, caches, merkle, UI, keyrings
    pub fn standard(options: &FixtureOptions) -> Self {
        Self::new()
            .with_stage(ApiStage)
            .with_stage(ConfigStoreStage)
            .with_stage(SecretSyncerStage)
            .with_stage(CacheStage::new(options.cache_capacity))
            .with_stage(MerkleStage)
            .with_stage(UiStage::default())
            .with_stage(KeyringStage::default())
    }

    pub fn with_stage(mut self, stage: impl ConfigStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Insert a stage at `index`, clamped to the end of the pipeline
    pub fn insert_stage(mut self, index: usize, stage: impl ConfigStage + 'static) -> Self {
        let index = index.min(self.stages.len());
        self.stages.insert(index, Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Configure `ctx` with every stage in order.
    ///
    /// A context can only be configured once; a second run returns
    /// [`DomainError::PipelineReused`] without touching it.
    pub fn run(&self, ctx: &mut ClientContext) -> DomainResult<()> {
        if ctx.is_configured() {
            return Err(DomainError::PipelineReused);
        }

        for (index, stage) in self.stages.iter().enumerate() {
            debug!(stage = stage.name(), "configuring");

            if let Err(source) = stage.configure(ctx) {
                warn!(stage = stage.name(), error = %format!("{:#}", source), "stage failed; rolling back");

                for done in self.stages[..index].iter().rev() {
                    debug!(stage = done.name(), "releasing");
                    done.release(ctx);
                }

                return Err(DomainError::PipelineStage {
                    stage: stage.name().to_string(),
                    source,
                });
            }
        }

        ctx.configured = true;
        Ok(())
    }
}

impl Default for ConfigurationPipeline {
    fn default() -> Self {
        Self::standard(&FixtureOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::stages::{
        API_STAGE, CACHES_STAGE, CONFIG_STAGE, KEYRING_STAGE, MERKLE_STAGE, SECRET_SYNCER_STAGE,
        UI_STAGE,
    };
    use crate::domain::{FixtureParameters, DEFAULT_SERVER_URI};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Stage that records every call and optionally fails
    struct RecordingStage {
        name: &'static str,
        fail: bool,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingStage {
        fn new(name: &'static str, fail: bool, calls: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                fail,
                calls: Arc::clone(calls),
            }
        }
    }

    impl ConfigStage for RecordingStage {
        fn name(&self) -> &str {
            self.name
        }

        fn configure(&self, _ctx: &mut ClientContext) -> anyhow::Result<()> {
            self.calls.lock().push(format!("configure:{}", self.name));
            if self.fail {
                anyhow::bail!("{} is broken", self.name);
            }
            Ok(())
        }

        fn release(&self, _ctx: &mut ClientContext) {
            self.calls.lock().push(format!("release:{}", self.name));
        }
    }

    fn context(home: &std::path::Path) -> ClientContext {
        ClientContext::new(FixtureParameters::new(home, DEFAULT_SERVER_URI))
    }

    #[test]
    fn test_standard_stage_order() {
        let pipeline = ConfigurationPipeline::standard(&FixtureOptions::default());
        assert_eq!(
            pipeline.stage_names(),
            vec![
                API_STAGE,
                CONFIG_STAGE,
                SECRET_SYNCER_STAGE,
                CACHES_STAGE,
                MERKLE_STAGE,
                UI_STAGE,
                KEYRING_STAGE
            ]
        );
    }

    #[test]
    fn test_standard_pipeline_configures_everything() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(temp_dir.path());

        ConfigurationPipeline::default().run(&mut ctx).unwrap();

        assert!(ctx.is_configured());
        assert!(ctx.api().is_some());
        assert!(ctx.config().is_some());
        assert!(ctx.secret_syncer().is_some());
        assert_eq!(ctx.caches().unwrap().capacity(), 64);
        assert!(ctx.merkle().is_some());
        assert!(ctx.ui().unwrap().is_headless());
        assert!(ctx.keyrings().is_some());
    }

    #[test]
    fn test_failure_stops_and_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(temp_dir.path());
        let calls = Arc::new(Mutex::new(Vec::new()));

        let pipeline = ConfigurationPipeline::new()
            .with_stage(RecordingStage::new("first", false, &calls))
            .with_stage(RecordingStage::new("second", false, &calls))
            .with_stage(RecordingStage::new("third", true, &calls))
            .with_stage(RecordingStage::new("fourth", false, &calls));

        let err = pipeline.run(&mut ctx).unwrap_err();

        assert_eq!(err.failed_stage(), Some("third"));
        assert!(err.to_string().contains("third is broken"));
        assert_eq!(
            *calls.lock(),
            vec![
                "configure:first",
                "configure:second",
                "configure:third",
                "release:second",
                "release:first",
            ]
        );
        assert!(!ctx.is_configured());
    }

    #[test]
    fn test_injected_failure_releases_standard_stages() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(temp_dir.path());
        let calls = Arc::new(Mutex::new(Vec::new()));

        let pipeline = ConfigurationPipeline::default()
            .insert_stage(4, RecordingStage::new("broken", true, &calls));

        let err = pipeline.run(&mut ctx).unwrap_err();

        assert_eq!(err.failed_stage(), Some("broken"));
        assert!(ctx.api().is_none());
        assert!(ctx.config().is_none());
        assert!(ctx.secret_syncer().is_none());
        assert!(ctx.caches().is_none());
        assert!(ctx.merkle().is_none());
        assert!(ctx.ui().is_none());
        assert!(!temp_dir.path().join("secret_syncer").exists());
    }

    #[test]
    fn test_second_run_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(temp_dir.path());
        let pipeline = ConfigurationPipeline::default();

        pipeline.run(&mut ctx).unwrap();
        assert!(matches!(
            pipeline.run(&mut ctx),
            Err(DomainError::PipelineReused)
        ));
    }

    #[test]
    fn test_empty_pipeline() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(temp_dir.path());
        let pipeline = ConfigurationPipeline::new();

        assert!(pipeline.is_empty());
        pipeline.run(&mut ctx).unwrap();
        assert!(ctx.is_configured());
        assert!(ctx.api().is_none());
    }
}

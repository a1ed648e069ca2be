//! Prebuild state machine
//!
//! `Prebuilder` is the single entry point for the prebuild lifecycle of one
//! project. Every call derives the project's `PrebuildState` once, then
//! branches on it:
//!
//! ```text
//!  NONE ──prebuild──▶ ACTIVE ──restore──▶ CACHED
//!    ▲                  ▲ │                  │
//!    │                  │ └──prebuild (noop)  │
//!    │                  └──────prebuild───────┘
//!    └──────────────restore --purge───────────
//! ```
//!
//! The build file is only ever written after everything else succeeded, so
//! a failed build leaves it byte-identical.

use crate::cache::snapshot::CONTEXT_BUILD_FILE;
use crate::cache::{
    extract_namespace, reconcile, save_snapshot, snapshot_changed, BuildContext, CacheDir,
    PrebuildMetadata, LOCKFILE_NAME,
};
use crate::config::PrebuildConfig;
use crate::devcontainer::config::{CUSTOMIZATION_KEY, PREBUILD_FEATURES_KEY};
use crate::devcontainer::{find_overlap, reduced_config, FeatureDeclaration, ProjectConfig};
use crate::dockerfile::{is_cache_tag, parse, reduced_build_file, rewrite_parsed, BuildFileImage};
use crate::error::{PrebakeError, PrebakeResult};
use crate::orchestration::ImageBuilder;
use crate::prebuild::lock::ProjectLock;
use crate::prebuild::state::{Outcome, PrebuildState};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

const CONFIG_CHANGED: &str = "config changed since last prebuild";

fn discard_output(_line: String) {}

/// Runs prebuild, restore and status for one project
pub struct Prebuilder<'a> {
    config_path: PathBuf,
    settings: &'a PrebuildConfig,
    builder: &'a dyn ImageBuilder,
    state_dir: PathBuf,
    on_output: &'a (dyn Fn(String) + Send + Sync),
}

impl<'a> Prebuilder<'a> {
    /// Create a prebuilder for the project whose `devcontainer.json` is at
    /// `config_path`, keeping cache state under `state_dir`
    pub fn new(
        config_path: impl Into<PathBuf>,
        settings: &'a PrebuildConfig,
        builder: &'a dyn ImageBuilder,
        state_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            settings,
            builder,
            state_dir: state_dir.into(),
            on_output: &discard_output,
        }
    }

    /// Receive builder output line by line
    pub fn with_output(mut self, on_output: &'a (dyn Fn(String) + Send + Sync)) -> Self {
        self.on_output = on_output;
        self
    }

    /// Cache directory for this project
    pub fn cache_dir(&self) -> CacheDir {
        CacheDir::for_project(&self.state_dir, &self.config_path)
    }

    /// Build (or reuse) the cache image and point the build file at it
    pub async fn prebuild(&self, force: bool, dry_run: bool) -> PrebakeResult<Outcome> {
        let (project, build_file) = self.load_project().await?;

        let features = match project.prebuild_features()? {
            FeatureDeclaration::Features(features) => features,
            FeatureDeclaration::Absent => {
                return Ok(Outcome::ok(format!(
                    "No prebuild features declared (customizations.{}.{}), nothing to do",
                    CUSTOMIZATION_KEY, PREBUILD_FEATURES_KEY
                )));
            }
            FeatureDeclaration::Empty => {
                return Ok(Outcome::ok(
                    "Prebuild feature set is empty, nothing to prebuild",
                ));
            }
            FeatureDeclaration::Null => {
                debug!("Prebuilds disabled for {}", self.config_path.display());
                return Ok(Outcome::silent());
            }
        };

        let overlap = find_overlap(&features, &project.features());
        if !overlap.is_empty() {
            return Err(PrebakeError::FeatureOverlap { ids: overlap });
        }

        let cache = self.cache_dir();
        let _lock = if dry_run {
            None
        } else {
            ProjectLock::try_acquire(&cache.lock_path())?
        };

        let content = read_build_file(&build_file).await?;
        let current = parse(&content)?;
        let state = PrebuildState::resolve(
            PrebuildMetadata::load(&cache).await,
            self.is_cache_tag(&current),
        );
        debug!("Prebuild state: {}", state);

        let (original, parsed) = self.original_declaration(&content, current, &state)?;
        let tag = parsed.cache_tag(&self.settings.namespace);
        let context = build_context(&parsed, &features);

        if dry_run {
            let names: Vec<&str> = features.keys().map(String::as_str).collect();
            return Ok(Outcome::ok(format!(
                "Dry run: would prebuild {} from {}\n  Features: {}",
                tag,
                parsed.reference,
                names.join(", ")
            )));
        }

        if !force && !self.is_changed(&cache, &state, &tag, &context).await {
            let present = self.image_present(&tag).await;
            let rewritten = rewrite_parsed(&original, &parsed, &tag);
            write_build_file(&build_file, &content, &rewritten).await?;

            let message = match (&state, present) {
                (PrebuildState::Active(_), true) => format!("Prebuild up to date: {}", tag),
                (_, true) => format!("Prebuild reactivated from cache: {}", tag),
                (_, false) => {
                    warn!(
                        "Cache image {} not found locally, reactivating without a build",
                        tag
                    );
                    format!(
                        "Prebuild reactivated: {} (image not present locally, the next container build recreates it)",
                        tag
                    )
                }
            };
            return Ok(Outcome::ok(message));
        }

        info!(
            "Building {} with {} prebuild feature(s)",
            tag,
            features.len()
        );
        let project_lock = project.dir().join(LOCKFILE_NAME);
        self.build(&cache, &context, &parsed, &tag, &project_lock).await?;

        let rewritten = rewrite_parsed(&original, &parsed, &tag);
        write_build_file(&build_file, &content, &rewritten).await?;

        Ok(Outcome::ok(format!("Prebuild complete: {}", tag)))
    }

    /// Put the original base image back into the build file.
    ///
    /// The cache is kept so the next prebuild reactivates without a build,
    /// unless `purge` is set.
    pub async fn restore(&self, purge: bool) -> PrebakeResult<Outcome> {
        let (_, build_file) = self.load_project().await?;
        let cache = self.cache_dir();
        let _lock = ProjectLock::try_acquire(&cache.lock_path())?;

        let Some(metadata) = PrebuildMetadata::load(&cache).await else {
            if purge {
                cache.remove().await?;
            }
            return Ok(Outcome::ok("No active prebuild, nothing to restore"));
        };

        let content = read_build_file(&build_file).await?;
        let current = parse(&content)?;
        let state = PrebuildState::resolve(Some(metadata), self.is_cache_tag(&current));
        debug!("Prebuild state: {}", state);

        let message = match &state {
            PrebuildState::Active(metadata) => {
                let restored = rewrite_parsed(&content, &current, &metadata.original_from);
                write_build_file(&build_file, &content, &restored).await?;
                format!("Restored base image {}", metadata.original_from)
            }
            _ => "Build file does not reference a prebuild image, nothing to restore".to_string(),
        };

        if purge {
            cache.remove().await?;
            return Ok(Outcome::ok(format!("{}; prebuild cache removed", message)));
        }

        Ok(Outcome::ok(message))
    }

    /// Describe the current prebuild state
    pub async fn status(&self) -> PrebakeResult<Outcome> {
        let (project, build_file) = self.load_project().await?;
        let cache = self.cache_dir();

        let Some(metadata) = PrebuildMetadata::load(&cache).await else {
            return Ok(Outcome::ok("No active prebuild"));
        };

        let content = read_build_file(&build_file).await?;
        let current = parse(&content)?;
        let active = self.is_cache_tag(&current);
        let state = PrebuildState::resolve(Some(metadata.clone()), active);

        let mut lines = Vec::new();
        lines.push(if active {
            "Prebuild active".to_string()
        } else {
            "Prebuild cached (base image restored to original)".to_string()
        });
        lines.push(format!("  Original:  {}", metadata.original_from));
        lines.push(format!("  Cache tag: {}", metadata.cache_tag));
        lines.push(format!(
            "  Built:     {}",
            metadata.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        if active {
            let freshness = self
                .freshness(&project, &cache, &content, current, &state)
                .await?;
            lines.push(format!("  Status:    {}", freshness));
        } else {
            lines.push("  Run `prebake prebuild` to reactivate it".to_string());
        }

        let project_lock = project.dir().join(LOCKFILE_NAME);
        match extract_namespace(&project_lock, &self.settings.lock_namespace).await {
            Ok(pins) if !pins.is_empty() => {
                lines.push(format!("  Pinned:    {} prebuilt feature(s)", pins.len()));
            }
            Ok(_) => {}
            Err(e) => warn!("Cannot read {}: {}", project_lock.display(), e),
        }

        Ok(Outcome::ok(lines.join("\n")))
    }

    async fn load_project(&self) -> PrebakeResult<(ProjectConfig, PathBuf)> {
        let project = ProjectConfig::load(&self.config_path).await?;
        let build_file = project.resolve_build_file()?;
        Ok((project, build_file))
    }

    fn is_cache_tag(&self, declaration: &BuildFileImage) -> bool {
        is_cache_tag(&declaration.reference, &self.settings.namespace)
    }

    /// The build file as it reads with the original base image in place.
    ///
    /// An applied prebuild is undone in memory first so the cache tag is
    /// never computed from a cache tag.
    fn original_declaration(
        &self,
        content: &str,
        current: BuildFileImage,
        state: &PrebuildState,
    ) -> PrebakeResult<(String, BuildFileImage)> {
        if !self.is_cache_tag(&current) {
            return Ok((content.to_string(), current));
        }

        let metadata = state
            .metadata()
            .ok_or_else(|| PrebakeError::MetadataMissing {
                tag: current.reference.clone(),
            })?;

        debug!(
            "Undoing applied prebuild {} -> {}",
            current.reference, metadata.original_from
        );
        let original = rewrite_parsed(content, &current, &metadata.original_from);
        let parsed = parse(&original)?;
        Ok((original, parsed))
    }

    /// Whether the stored snapshot no longer matches `context`
    async fn is_changed(
        &self,
        cache: &CacheDir,
        state: &PrebuildState,
        tag: &str,
        context: &BuildContext,
    ) -> bool {
        let stale_tag = state.metadata().map_or(true, |m| m.cache_tag != tag);
        stale_tag || snapshot_changed(cache, context).await
    }

    async fn image_present(&self, tag: &str) -> bool {
        match self.builder.image_exists(tag).await {
            Ok(output) => output.success(),
            Err(e) => {
                warn!("Cannot check for image {}: {}", tag, e);
                false
            }
        }
    }

    async fn freshness(
        &self,
        project: &ProjectConfig,
        cache: &CacheDir,
        content: &str,
        current: BuildFileImage,
        state: &PrebuildState,
    ) -> PrebakeResult<&'static str> {
        let FeatureDeclaration::Features(features) = project.prebuild_features()? else {
            return Ok(CONFIG_CHANGED);
        };

        let (_, parsed) = self.original_declaration(content, current, state)?;
        let tag = parsed.cache_tag(&self.settings.namespace);
        let context = build_context(&parsed, &features);

        if self.is_changed(cache, state, &tag, &context).await {
            return Ok(CONFIG_CHANGED);
        }
        if !self.image_present(&tag).await {
            return Ok("image missing locally, run prebuild to reactivate");
        }
        Ok("up to date")
    }

    /// Run the external build in a scratch context and commit its results
    async fn build(
        &self,
        cache: &CacheDir,
        context: &BuildContext,
        parsed: &BuildFileImage,
        tag: &str,
        project_lock: &Path,
    ) -> PrebakeResult<()> {
        let workspace = self
            .state_dir
            .join("builds")
            .join(Uuid::new_v4().to_string());

        let result = self
            .build_in(&workspace, cache, context, parsed, tag, project_lock)
            .await;

        if let Err(e) = tokio::fs::remove_dir_all(&workspace).await {
            debug!(
                "Failed to remove build context {}: {}",
                workspace.display(),
                e
            );
        }

        result
    }

    async fn build_in(
        &self,
        workspace: &Path,
        cache: &CacheDir,
        context: &BuildContext,
        parsed: &BuildFileImage,
        tag: &str,
        project_lock: &Path,
    ) -> PrebakeResult<()> {
        let output_dir = context.write_to(workspace).await?;

        let output = self
            .builder
            .build_image(workspace, tag, self.on_output)
            .await?;

        if !output.success() {
            let diagnostic = output.diagnostic().trim_end();
            let output = if diagnostic.is_empty() {
                format!(
                    "{} exited with code {}",
                    self.builder.builder_name(),
                    output.exit_code
                )
            } else {
                diagnostic.to_string()
            };
            return Err(PrebakeError::Build {
                tag: tag.to_string(),
                output,
            });
        }

        // Metadata goes last: without it the next prebuild rebuilds.
        reconcile(project_lock, &output_dir, &self.settings.lock_namespace).await?;
        save_snapshot(cache, context).await?;
        PrebuildMetadata::new(&parsed.reference, tag)
            .save(cache)
            .await?;

        info!("Prebuilt {} from {}", tag, parsed.reference);
        Ok(())
    }
}

fn build_context(parsed: &BuildFileImage, features: &Map<String, Value>) -> BuildContext {
    BuildContext {
        build_file: reduced_build_file(parsed),
        config: reduced_config(features, CONTEXT_BUILD_FILE),
    }
}

async fn read_build_file(path: &Path) -> PrebakeResult<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PrebakeError::BuildFileMissing {
            path: path.to_path_buf(),
            reason: "the referenced Dockerfile does not exist".to_string(),
        }),
        Err(e) => Err(PrebakeError::io(format!("reading {}", path.display()), e)),
    }
}

/// Write the build file, skipping the write when nothing changed
async fn write_build_file(path: &Path, current: &str, updated: &str) -> PrebakeResult<()> {
    if current == updated {
        return Ok(());
    }
    tokio::fs::write(path, updated)
        .await
        .map_err(|e| PrebakeError::io(format!("writing {}", path.display()), e))?;
    info!("Updated base image in {}", path.display());
    Ok(())
}

//! # Views Module
//!
//! Template rendering for route handlers and the error handler.
//!
//! Templates live in a views directory (default `views/`) and are addressed by a
//! logical name without extension: `"index"` resolves to `views/index.html`,
//! `"errors/404"` to `views/errors/404.html`. Rendering is delegated to
//! `minijinja`; HTML templates are auto-escaped, so handlers that pass
//! pre-built markup mark it with the `safe` filter in the template.
//!
//! Parsed templates are cached by the environment. In development the dev
//! notifier calls [`Views::reload`] after a file change, which swaps in a fresh
//! environment so the next render re-reads the files.

use arc_swap::ArcSwap;
use minijinja::{path_loader, Environment};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::HttpError;

/// Data handed to the renderer for a single response.
///
/// Keys are kept ordered so that the same input always serializes, and
/// therefore renders, identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViewContext(BTreeMap<String, Value>);

impl ViewContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Overlay `other` on top of `self`; keys in `other` win.
    pub fn merge(&mut self, other: ViewContext) {
        self.0.extend(other.0);
    }
}

/// Template renderer bound to a views directory.
pub struct Views {
    dir: PathBuf,
    env: ArcSwap<Environment<'static>>,
}

impl Views {
    pub fn from_dir<P: Into<PathBuf>>(dir: P) -> Self {
        let dir = dir.into();
        let env = Self::environment(&dir);
        Self {
            dir,
            env: ArcSwap::from_pointee(env),
        }
    }

    fn environment(dir: &Path) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_loader(path_loader(dir));
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render the template called `name` (without extension) with `ctx`.
    pub fn render(&self, name: &str, ctx: &ViewContext) -> Result<String, HttpError> {
        let env = self.env.load();
        let template = env.get_template(&format!("{name}.html"))?;
        Ok(template.render(ctx)?)
    }

    /// Drop every cached template; the next render reads from disk again.
    pub fn reload(&self) {
        debug!(dir = %self.dir.display(), "reloading view templates");
        self.env.store(Arc::new(Self::environment(&self.dir)));
    }
}

//! Parallel rendering of independent jobs.

use super::Renderer;
use crate::error::Result;
use crate::model::Picture;
use crate::target::SaveTarget;
use rayon::prelude::*;
use std::path::PathBuf;

/// A picture paired with where to save it.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Save target
    pub target: SaveTarget,
    /// Picture to render
    pub picture: Picture,
}

impl RenderJob {
    /// Create a job.
    pub fn new(target: SaveTarget, picture: Picture) -> Self {
        Self { target, picture }
    }
}

impl Renderer {
    /// Save many pictures in parallel.
    ///
    /// Each job gets its own scratch directory; results come back in job
    /// order. A failing job does not stop the others.
    pub fn save_all(&self, jobs: &[RenderJob]) -> Vec<Result<PathBuf>> {
        log::debug!("rendering {} jobs", jobs.len());
        jobs.par_iter()
            .map(|job| self.save(&job.target, &job.picture))
            .collect()
    }
}

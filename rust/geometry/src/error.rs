// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;
use urbanstl_scene::DefinitionId;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Invalid extrusion parameters: {0}")]
    InvalidExtrusion(String),

    #[error("Invalid surface patch: {0}")]
    InvalidSurface(String),

    #[error("Instance definition {0:?} references itself")]
    CyclicInstance(DefinitionId),

    #[error("Scene model error: {0}")]
    SceneError(#[from] urbanstl_scene::Error),
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::instance::DefinitionId;
use crate::layer::LayerId;
use thiserror::Error;

/// Result type for scene model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or querying a scene document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Layer {0:?} already exists")]
    DuplicateLayer(LayerId),

    #[error("Layer {0:?} does not exist")]
    UnknownLayer(LayerId),

    #[error("Instance definition {0:?} already exists")]
    DuplicateDefinition(DefinitionId),

    #[error("Instance definition {0:?} does not exist")]
    UnknownDefinition(DefinitionId),
}

//! Client for the yield-sensitive DLMM program.

use dlmm_lib::{idl::Idl, prelude::*, ClientConfig};

pub mod args;
pub mod ops;
pub mod pda;
pub mod state;

#[cfg(test)]
pub(crate) mod simulator;

pub use pda::PROGRAM_ID;

pub mod prelude {
    pub use crate::{args::*, ops::Context, pda, state::*};
    pub use dlmm_lib::prelude::*;
    pub use serde::{Deserialize, Serialize};
}

pub const IDL_JSON: &str = dlmm_lib::idl_definition!("yield_sensitive_dlmm.json");

/// The bundled interface description.
pub fn bundled_idl() -> Result<Idl> {
    Ok(Idl::from_json(IDL_JSON)?)
}

/// Program handle, honoring the IDL path and program id overrides in `config`.
pub fn remote_program(config: &ClientConfig) -> Result<RemoteProgram> {
    let idl = match &config.idl_path {
        Some(path) => {
            tracing::info!("loading interface description from {}", path.display());
            Idl::from_file(path)?
        }
        None => bundled_idl()?,
    };
    let program_id = config.program_id.or(idl.address).unwrap_or(PROGRAM_ID);
    Ok(RemoteProgram::new(program_id, idl))
}

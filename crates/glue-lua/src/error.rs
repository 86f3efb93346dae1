//! Error conversion between Lua and host values.
//!
//! Host errors raised inside callbacks travel through Lua as external errors.
//! When they surface again they are unwrapped so their kind survives the
//! round trip; everything else becomes a runtime error with the engine text.

use glue_core::GlueError;

/// Convert a Lua error into a host error
pub fn glue_error(err: mlua::Error) -> GlueError {
    match find_glue_error(&err) {
        Some(inner) => inner.clone(),
        None => GlueError::Runtime(err.to_string()),
    }
}

/// Convert a host error into a Lua error
pub fn lua_error(err: GlueError) -> mlua::Error {
    mlua::Error::external(err)
}

fn find_glue_error(err: &mlua::Error) -> Option<&GlueError> {
    match err {
        mlua::Error::ExternalError(inner) => inner.downcast_ref::<GlueError>(),
        mlua::Error::CallbackError { cause, .. } => find_glue_error(cause),
        mlua::Error::WithContext { cause, .. } => find_glue_error(cause),
        _ => None,
    }
}

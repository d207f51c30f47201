use std::sync::Arc;

use tokio::task::{self, JoinError};
use tracing::debug;

use crate::error::{Error, Side};
use crate::render::validate::Validator;
use crate::render::{RenderInput, Renderer};

/// Render both sides concurrently and collect both outcomes before deciding
/// success.
///
/// Both tasks are always awaited to completion, even when one fails: the
/// target render holds paths inside the snapshot whose cleanup runs right
/// after this returns. A local failure is always fatal. A target failure is
/// downgraded to `None` ("no prior output") exactly when the source does not
/// exist at the target ref, because a path that is new in the working tree
/// legitimately has no counterpart there.
pub async fn render_both(
    renderer: Arc<dyn Renderer>,
    validator: Option<Arc<dyn Validator>>,
    local: RenderInput,
    target: RenderInput,
) -> Result<(String, Option<String>), Error> {
    let local_task = task::spawn_blocking({
        let renderer = Arc::clone(&renderer);
        move || renderer.render(&local)
    });
    let target_task = task::spawn_blocking(move || renderer.render(&target));

    let (local_res, target_res) = tokio::join!(local_task, target_task);

    let local_text = local_res
        .map_err(|err| join_failure(Side::Local, err))?
        .map_err(|source| Error::Render {
            side: Side::Local,
            source,
        })?;

    let target_text = match target_res.map_err(|err| join_failure(Side::Target, err))? {
        Ok(text) => Some(text),
        Err(source) if source.is_not_found() => {
            debug!("target side has no renderable source, treating the path as new");
            None
        }
        Err(source) => {
            return Err(Error::Render {
                side: Side::Target,
                source,
            })
        }
    };

    // Validation applies to the user's own changes only; the target side is
    // history and not theirs to fix.
    if let Some(validator) = validator {
        let manifest = local_text.clone();
        task::spawn_blocking(move || validator.validate(&manifest))
            .await
            .map_err(|err| Error::Validation {
                report: format!("validation task failed: {err}"),
            })??;
    }

    Ok((local_text, target_text))
}

fn join_failure(side: Side, err: JoinError) -> Error {
    Error::Render {
        side,
        source: crate::error::RenderError::Io(std::io::Error::other(err)),
    }
}

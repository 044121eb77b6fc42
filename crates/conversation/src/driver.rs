use std::sync::atomic::Ordering;
use std::sync::Arc;

use sous::{CancelSignal, ChatBackend};

use crate::error::SubmitError;
use crate::store::Conversation;

/// Drives one submission end to end as a single owning task.
///
/// The sequence is strictly ordered: begin the submission, fold every event
/// the backend delivers, then take exactly one terminal path. Each terminal
/// path releases the in-flight request, so input controls recover no matter
/// how the stream ends. A set cancellation flag routes to the abandon path:
/// the disposed message keeps whatever partial progress it had, without a
/// synthetic error.
pub async fn run_submission(
    conversation: &mut Conversation,
    backend: &dyn ChatBackend,
    cancel: CancelSignal,
) -> Result<(), SubmitError> {
    let pending = conversation.begin_submission()?;

    let result = backend
        .run(pending.submission, Arc::clone(&cancel), &mut |event| {
            conversation.apply_stream_event(&event);
        })
        .await;

    match result {
        Ok(()) => conversation.finish_stream(),
        Err(error) => {
            if cancel.load(Ordering::Acquire) {
                tracing::debug!(%error, "chat stream abandoned after cancellation");
                conversation.abandon_stream();
            } else {
                tracing::error!(%error, "chat stream failed");
                conversation.fail_stream();
            }
        }
    }

    Ok(())
}

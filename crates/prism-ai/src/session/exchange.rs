use futures_util::StreamExt;

use crate::completion::FragmentStream;

use super::types::{Generation, StreamEvent, StreamUpdate};

/// The reply stream of one submitted message.
///
/// Owned apart from the session so a driver can wait on the next update
/// and on user input at the same time. Dropping it cancels the request.
pub struct Exchange {
    generation: Generation,
    fragments: FragmentStream,
    finished: bool,
}

impl Exchange {
    pub(crate) fn new(generation: Generation, fragments: FragmentStream) -> Self {
        Self {
            generation,
            fragments,
            finished: false,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Next tagged update, or `None` once `Completed` or `Failed` was returned.
    ///
    /// Cancel-safe: dropping the future loses no fragment.
    pub async fn next_update(&mut self) -> Option<StreamUpdate> {
        if self.finished {
            return None;
        }

        let event = match self.fragments.next().await {
            Some(Ok(fragment)) => StreamEvent::Fragment(fragment),
            Some(Err(error)) => {
                self.finished = true;
                StreamEvent::Failed(error)
            }
            None => {
                self.finished = true;
                StreamEvent::Completed
            }
        };

        Some(StreamUpdate {
            generation: self.generation,
            event,
        })
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("generation", &self.generation)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

//! User dialogs requested by the workflows.
//!
//! Workflows only see the [`Prompter`] trait. [`ChannelPrompter`] turns each
//! call into a [`DialogRequest`] for whichever front end owns the screen and
//! waits for its reply; a front end that drops the reply counts as a cancel.

use std::{future::Future, path::PathBuf};

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// Answer to the "invalid project folder" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryChoice {
    /// Show the directory picker again.
    SelectAgain,
    /// Stop the workflow.
    Cancel,
}

/// Dialogs the workflows may show. Pickers return `None` when cancelled.
pub trait Prompter: Send + Sync + 'static {
    /// Ask for an existing directory.
    fn pick_directory(&self, title: &str) -> impl Future<Output = Option<PathBuf>> + Send;

    /// Ask for a file path to save to, pre-filled with `default_name`.
    fn pick_save_path(
        &self,
        title: &str,
        default_name: &str,
    ) -> impl Future<Output = Option<PathBuf>> + Send;

    /// Offer "Select Again" / "Cancel".
    fn ask_retry(&self, title: &str, message: &str) -> impl Future<Output = RetryChoice> + Send;

    /// Show an error and wait until it is dismissed.
    fn show_error(&self, title: &str, message: &str) -> impl Future<Output = ()> + Send;

    /// Show an informational message and wait until it is dismissed.
    fn show_info(
        &self,
        title: &str,
        message: &str,
        detail: &str,
    ) -> impl Future<Output = ()> + Send;
}

/// A dialog waiting to be shown by the front end.
#[derive(Debug)]
pub enum DialogRequest {
    /// Directory picker.
    PickDirectory {
        /// Picker title.
        title: String,
        /// Chosen directory, or `None` on cancel.
        reply: oneshot::Sender<Option<PathBuf>>,
    },
    /// Save-file picker.
    PickSavePath {
        /// Picker title.
        title: String,
        /// Suggested file name.
        default_name: String,
        /// Chosen path, or `None` on cancel.
        reply: oneshot::Sender<Option<PathBuf>>,
    },
    /// Two-button retry prompt.
    AskRetry {
        /// Prompt title.
        title: String,
        /// Explanation shown to the user.
        message: String,
        /// User's choice.
        reply: oneshot::Sender<RetryChoice>,
    },
    /// Error box.
    ShowError {
        /// Box title.
        title: String,
        /// Error text.
        message: String,
        /// Sent when dismissed.
        reply: oneshot::Sender<()>,
    },
    /// Information box.
    ShowInfo {
        /// Box title.
        title: String,
        /// Headline.
        message: String,
        /// Secondary text.
        detail: String,
        /// Sent when dismissed.
        reply: oneshot::Sender<()>,
    },
}

/// [`Prompter`] that forwards every dialog over an `mpsc` channel.
#[derive(Debug, Clone)]
pub struct ChannelPrompter {
    requests: mpsc::Sender<DialogRequest>,
}

impl ChannelPrompter {
    /// Wrap an existing request sender.
    pub fn new(requests: mpsc::Sender<DialogRequest>) -> Self {
        Self { requests }
    }

    /// Create a prompter together with the receiver the front end should drain.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DialogRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    async fn ask<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> DialogRequest) -> Option<T> {
        let (reply, answer) = oneshot::channel();
        if self.requests.send(build(reply)).await.is_err() {
            warn!("dialog front end is gone; treating request as cancelled");
            return None;
        }
        answer.await.ok()
    }
}

impl Prompter for ChannelPrompter {
    async fn pick_directory(&self, title: &str) -> Option<PathBuf> {
        let title = title.to_string();
        self.ask(|reply| DialogRequest::PickDirectory { title, reply })
            .await
            .flatten()
    }

    async fn pick_save_path(&self, title: &str, default_name: &str) -> Option<PathBuf> {
        let title = title.to_string();
        let default_name = default_name.to_string();
        self.ask(|reply| DialogRequest::PickSavePath {
            title,
            default_name,
            reply,
        })
        .await
        .flatten()
    }

    async fn ask_retry(&self, title: &str, message: &str) -> RetryChoice {
        let title = title.to_string();
        let message = message.to_string();
        self.ask(|reply| DialogRequest::AskRetry {
            title,
            message,
            reply,
        })
        .await
        .unwrap_or(RetryChoice::Cancel)
    }

    async fn show_error(&self, title: &str, message: &str) {
        let title = title.to_string();
        let message = message.to_string();
        self.ask(|reply| DialogRequest::ShowError {
            title,
            message,
            reply,
        })
        .await;
    }

    async fn show_info(&self, title: &str, message: &str, detail: &str) {
        let title = title.to_string();
        let message = message.to_string();
        let detail = detail.to_string();
        self.ask(|reply| DialogRequest::ShowInfo {
            title,
            message,
            detail,
            reply,
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn directory_reply_reaches_caller() {
        let (prompter, mut requests) = ChannelPrompter::channel(4);
        let front_end = tokio::spawn(async move {
            match requests.recv().await {
                Some(DialogRequest::PickDirectory { title, reply }) => {
                    assert_eq!(title, "Pick");
                    let _ = reply.send(Some(PathBuf::from("/games/demo")));
                }
                other => panic!("unexpected request {other:?}"),
            }
        });

        let picked = prompter.pick_directory("Pick").await;
        assert_eq!(picked, Some(PathBuf::from("/games/demo")));
        front_end.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_reply_counts_as_cancel() {
        let (prompter, mut requests) = ChannelPrompter::channel(4);
        let front_end = tokio::spawn(async move {
            while let Some(request) = requests.recv().await {
                drop(request);
            }
        });

        assert_eq!(prompter.pick_save_path("Save", "a.exe").await, None);
        assert_eq!(
            prompter.ask_retry("Invalid", "try again?").await,
            RetryChoice::Cancel
        );
        drop(prompter);
        front_end.await.unwrap();
    }

    #[tokio::test]
    async fn closed_front_end_counts_as_cancel() {
        let (prompter, requests) = ChannelPrompter::channel(1);
        drop(requests);
        assert_eq!(prompter.pick_directory("Pick").await, None);
    }
}

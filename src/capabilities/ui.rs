//! Shell-side UI services the core cannot perform itself: confirmation
//! dialogs, timers, scroll reset and releasing object URLs.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    pub confirm_text: String,
    pub cancel_text: String,
}

impl ConfirmPrompt {
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_text: "OK".to_string(),
            cancel_text: "Ακύρωση".to_string(),
        }
    }

    #[must_use]
    pub fn with_confirm_text(mut self, text: impl Into<String>) -> Self {
        self.confirm_text = text.into();
        self
    }
}

impl Default for ConfirmPrompt {
    fn default() -> Self {
        Self::new("Επιβεβαίωση", "")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiOperation {
    /// Modal yes/no dialog; answered with `UiOutput::Confirmed`.
    Confirm(ConfirmPrompt),
    /// Resolves with `UiOutput::Elapsed` after `millis`.
    Delay { millis: u64 },
    RevokePreview { url: String },
    ResetScroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiOutput {
    Confirmed(bool),
    Elapsed,
    Done,
}

impl Operation for UiOperation {
    type Output = UiOutput;
}

pub struct Ui<Ev> {
    context: CapabilityContext<UiOperation, Ev>,
}

impl<Ev> Ui<Ev> {
    #[must_use]
    pub fn new(context: CapabilityContext<UiOperation, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> Ui<Ev>
where
    Ev: Send + 'static,
{
    /// Asks the user; anything but an explicit yes counts as no.
    pub fn confirm<F>(&self, prompt: ConfirmPrompt, make_event: F)
    where
        F: FnOnce(bool) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx.request_from_shell(UiOperation::Confirm(prompt)).await;
            ctx.update_app(make_event(matches!(output, UiOutput::Confirmed(true))));
        });
    }

    pub fn delay(&self, millis: u64, event: Ev) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.request_from_shell(UiOperation::Delay { millis }).await;
            ctx.update_app(event);
        });
    }

    pub fn revoke_preview(&self, url: String) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(UiOperation::RevokePreview { url }).await;
        });
    }

    pub fn revoke_previews(&self, urls: impl IntoIterator<Item = String>) {
        for url in urls {
            self.revoke_preview(url);
        }
    }

    pub fn reset_scroll(&self) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(UiOperation::ResetScroll).await;
        });
    }
}

impl<Ev> Clone for Ui<Ev> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<Ev> Capability<Ev> for Ui<Ev> {
    type Operation = UiOperation;
    type MappedSelf<MappedEv> = Ui<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Ui::new(self.context.map_event(f))
    }
}

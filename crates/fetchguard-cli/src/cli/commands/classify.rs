//! `fetchguard classify` – show how a failure would be presented.

use anyhow::{bail, Result};
use fetchguard_core::classify::{self, ActionTarget, ErrorDescription};
use fetchguard_core::retry::{Failure, HandlerSettings};

use crate::cli::FailureArg;

fn print_description(d: &ErrorDescription) {
    println!("{:<10} {}", "Title", d.title());
    println!("{:<10} {}", "Status", d.status_code);
    println!("{:<10} {}", "Severity", d.severity);
    println!("{:<10} {}", "Retryable", if d.can_retry { "yes" } else { "no" });
    println!("{:<10} {}", "Message", d.user_message);
    if let Some(hint) = &d.hint {
        println!("{:<10} {}", "Hint", hint);
    }
    if let Some(action) = &d.action {
        let target = match &action.target {
            ActionTarget::Navigate(path) => format!("go to {path}"),
            ActionTarget::Reissue => "reissue the request".to_string(),
            ActionTarget::Refresh => "refresh".to_string(),
            ActionTarget::GoBack => "go back".to_string(),
        };
        println!("{:<10} {} ({})", "Action", action.label, target);
    }
}

pub fn run_classify(
    settings: &HandlerSettings,
    status: Option<u16>,
    failure: Option<FailureArg>,
) -> Result<()> {
    let description = match (status, failure) {
        (Some(code), _) => classify::classify(code, &settings.custom_messages),
        (None, Some(kind)) => {
            let failure = match kind {
                FailureArg::Timeout => Failure::TimedOut,
                FailureArg::Transport => Failure::transport("connection failed"),
                FailureArg::Other => Failure::other("unexpected failure"),
            };
            classify::classify_exception(&failure)
        }
        (None, None) => bail!("give a status code or --failure"),
    };
    print_description(&description);
    Ok(())
}

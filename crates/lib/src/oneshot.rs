//! One-shot query: wait for readiness, send once, take the first matching reply.

use crate::format::{FormattedReply, ReplyFormatter};
use crate::gateway::SendError;
use crate::routing::ReplyReceiver;
use crate::session::{Ready, Session, SessionClosed};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    NotReady(#[from] SessionClosed),
    #[error("unable to send message: {0}")]
    Send(#[from] SendError),
    #[error("discord connection ended before a reply arrived")]
    NoReply,
}

/// Append the instruction suffix the way the prompt is sent: `prompt.\ninstructions`.
pub fn compose_prompt(prompt: &str, instructions: Option<&str>) -> String {
    match instructions {
        Some(i) if !i.is_empty() => format!("{}.\n{}", prompt, i),
        _ => prompt.to_string(),
    }
}

/// Run one request/response cycle. There is no timeout: while the connection
/// is up and the agent stays silent, this waits.
pub async fn run_query(
    session: &Arc<Session>,
    ready: Ready,
    mut reply: ReplyReceiver,
    prompt: String,
    theme: Option<String>,
) -> Result<FormattedReply, QueryError> {
    ready.wait().await?;

    let send = session.dispatch(prompt);
    let early = tokio::select! {
        event = &mut reply => Some(event),
        sent = send => {
            if let Ok(Err(e)) = sent {
                return Err(QueryError::Send(e));
            }
            None
        }
    };
    let event = match early {
        Some(event) => event,
        None => reply.await,
    }
    .map_err(|_| QueryError::NoReply)?;

    Ok(ReplyFormatter::new(session.user_id(), theme).format(&event.text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_are_appended() {
        assert_eq!(compose_prompt("What is 2+2?", Some("Be short")), "What is 2+2?.\nBe short");
        assert_eq!(compose_prompt("What is 2+2?", None), "What is 2+2?");
        assert_eq!(compose_prompt("hi", Some("")), "hi");
    }
}

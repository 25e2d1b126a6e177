//! `join`: bind a session to a user identity.

use super::Context;
use crate::error::RelayResult;
use crate::state::BindOutcome;
use chirp_proto::JoinRequest;
use tracing::{Span, info};

/// Resolve the join claim and bind the session.
///
/// A session may join again; it then moves to the new identity. A rejected
/// join leaves the session exactly as it was.
pub async fn handle_join(ctx: &mut Context<'_>, request: JoinRequest) -> RelayResult<BindOutcome> {
    ctx.session.can_bind()?;

    let user_id = ctx.hub.authenticator().resolve_join(&request).await?;
    let outcome = ctx.hub.bind_session(&user_id, ctx.session.id())?;
    ctx.session.bind(user_id.clone())?;

    Span::current().record("user_id", user_id.as_str());
    match &outcome {
        BindOutcome::Bound => info!(user_id = %user_id, "session joined"),
        BindOutcome::AlreadyBound => {}
        BindOutcome::Moved { previous } => {
            info!(user_id = %user_id, previous = %previous, "session re-joined as another user");
        }
    }
    Ok(outcome)
}

//! Feeding renderer frames into a context.

use async_channel::{Receiver, Sender};
use scenery_core::Context;

use crate::{
    codec::{InboundFrame, decode_frame, encode_frame},
    error::{BridgeError, Result},
};

/// Delivers every frame arriving on `frames` to `context`, one at a time and
/// in arrival order, until the channel closes.
///
/// Returns the number of frames delivered.
///
/// # Errors
///
/// Stops at the first frame that fails to decode or that the context
/// rejects. Frames still queued in the channel are left there.
pub async fn pump(context: &mut Context, frames: Receiver<String>) -> Result<usize> {
    let mut delivered = 0;
    while let Ok(text) = frames.recv().await {
        let frame = decode_frame(&text)?;
        tracing::trace!(event = frame.event.name(), target = ?frame.target, "frame received");
        context.dispatch(frame.event, frame.target)?;
        delivered += 1;
    }
    tracing::debug!(delivered, "frame channel closed");
    Ok(delivered)
}

/// Encodes `frame` and sends it to a context's pump.
///
/// # Errors
///
/// [`BridgeError::ChannelClosed`] if the pump side is gone.
pub async fn send_frame(sender: &Sender<String>, frame: &InboundFrame) -> Result<()> {
    let text = encode_frame(frame)?;
    sender
        .send(text)
        .await
        .map_err(|_| BridgeError::ChannelClosed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelRenderer, codec::decode_command};
    use futures::executor::block_on;
    use scenery_core::{Command, ContextPhase, Event, NodePath, SceneError};

    fn outbound(receiver: &Receiver<String>) -> Vec<Command> {
        core::iter::from_fn(|| receiver.try_recv().ok())
            .map(|frame| decode_command(&frame).unwrap())
            .collect()
    }

    #[test]
    fn test_pump_delivers_until_closed() {
        let (renderer, commands) = ChannelRenderer::unbounded();
        let mut context = Context::new("#app", renderer);
        assert_eq!(
            outbound(&commands)
                .iter()
                .map(Command::name)
                .collect::<Vec<_>>(),
            ["MOUNT", "NEED_SIZE_FOR", "SHOW"]
        );

        let (sender, frames) = async_channel::unbounded();
        block_on(async {
            send_frame(
                &sender,
                &InboundFrame::broadcast(Event::context_resize(800.0, 600.0, 0.0)),
            )
            .await
            .unwrap();
            send_frame(&sender, &InboundFrame::broadcast(Event::from("FOCUS")))
                .await
                .unwrap();
        });
        drop(sender);

        let delivered = block_on(pump(&mut context, frames)).unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(context.phase(), ContextPhase::Ready);
        assert_eq!(
            outbound(&commands),
            [Command::SizeAbsolute {
                path: NodePath::new("#app"),
                size: [800.0, 600.0, 0.0],
            }]
        );
    }

    #[test]
    fn test_pump_stops_on_rejected_frame() {
        let (renderer, _commands) = ChannelRenderer::unbounded();
        let mut context = Context::new("#app", renderer);
        let (sender, frames) = async_channel::unbounded();
        sender
            .try_send(r#"{"event":"CONTEXT_RESIZE","payload":[800,600]}"#.to_owned())
            .unwrap();
        sender.try_send(r#"{"event":"FOCUS"}"#.to_owned()).unwrap();

        let result = block_on(pump(&mut context, frames.clone()));
        assert!(matches!(
            result,
            Err(BridgeError::Scene(SceneError::InvalidOperation(_)))
        ));
        assert_eq!(context.phase(), ContextPhase::AwaitingInitialSize);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_pump_stops_on_malformed_frame() {
        let (renderer, _commands) = ChannelRenderer::unbounded();
        let mut context = Context::new("#app", renderer);
        let (sender, frames) = async_channel::unbounded();
        sender.try_send("{".to_owned()).unwrap();

        let result = block_on(pump(&mut context, frames));
        assert!(matches!(result, Err(BridgeError::Json(_))));
    }

    #[test]
    fn test_send_frame_reports_closed_channel() {
        let (sender, frames) = async_channel::unbounded::<String>();
        drop(frames);
        let result = block_on(send_frame(
            &sender,
            &InboundFrame::broadcast(Event::from("FOCUS")),
        ));
        assert!(matches!(result, Err(BridgeError::ChannelClosed)));
    }
}

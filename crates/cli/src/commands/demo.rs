//! `liveproof demo` — a scripted postcard editing session.
//!
//! Wires a host controller to two in-memory frames (front and back),
//! replays the interactions a user would make, and prints the durable
//! artifacts — the stencil edits and field values a persistence
//! collaborator would save.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use liveproof_channels::{FrameEndpoint, memory_channel};
use liveproof_config::EditorConfig;
use liveproof_core::edit::Page;
use liveproof_core::ids::PageId;
use liveproof_core::message::FrameMessage;
use liveproof_frame::{
    Document, FrameAgent, GestureDelta, GestureEvent, GesturePhase, Node, Point, PointerEvent,
    PointerKind,
};
use liveproof_host::HostController;
use liveproof_store::{EditorKind, LayerCommand};

struct Frame {
    agent: FrameAgent,
    endpoint: FrameEndpoint,
}

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    let mut controller = HostController::new(EditorKind::Postcard, config.clone());
    controller.set_pages(vec![Page::default(), Page::default()]);

    let mut frames = Vec::new();
    for page in ["front", "back"] {
        let (channel, endpoint) = memory_channel(PageId::new(page), config.channel.capacity);
        controller.attach_frame(Arc::new(channel));
        let agent = FrameAgent::new(template(page), config.clone(), endpoint.sender());
        frames.push(Frame { agent, endpoint });
    }
    let mut inbound = controller.start().await?;

    info!("Frames loading");
    for frame in &frames {
        frame.agent.announce_loaded();
    }
    settle(&mut controller, &mut frames, &mut inbound).await?;

    info!("Editing the headline");
    click(&mut frames[0], "headline", 1_000);
    settle(&mut controller, &mut frames, &mut inbound).await?;
    frames[0].agent.edit_text(&"headline".into(), "Open house this Saturday");
    settle(&mut controller, &mut frames, &mut inbound).await?;

    info!("Dragging the masked photo");
    click(&mut frames[0], "photo", 2_000);
    settle(&mut controller, &mut frames, &mut inbound).await?;
    frames[0].agent.on_gesture(GestureEvent {
        target: "photo".into(),
        phase: GesturePhase::End,
        delta: GestureDelta::Drag {
            transform: "translate(32px, -12px)".to_string(),
        },
    });
    settle(&mut controller, &mut frames, &mut inbound).await?;

    info!("Bringing the photo to the front");
    controller.change_layer(LayerCommand::BringToFront).await?;
    settle(&mut controller, &mut frames, &mut inbound).await?;

    info!("Zooming out");
    controller.set_zoom(0.5).await;
    settle(&mut controller, &mut frames, &mut inbound).await?;

    println!("Durable edits:");
    println!(
        "{}",
        serde_json::to_string_pretty(controller.store().stencil_edits())?
    );
    println!("Fields:");
    println!(
        "{}",
        serde_json::to_string_pretty(controller.store().fields())?
    );

    controller.registry().stop_all().await;
    Ok(())
}

fn template(page: &str) -> Document {
    let mut document = Document::new(page.into(), 600.0, 400.0);
    document.insert(Node::text("headline", "Your headline here").with_base(styles(&[
        ("font-size", "24px"),
        ("width", "320px"),
        ("height", "48px"),
    ])));
    document.insert(Node::mask_container("photoMask"));
    document.insert(
        Node::image("photo", "https://example.com/house.jpg").with_parent("photoMask"),
    );
    document.insert(Node::fixture("safe-zone"));
    document
}

fn styles(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(p, v)| (p.to_string(), v.to_string()))
        .collect()
}

fn click(frame: &mut Frame, target: &str, at_ms: u64) {
    frame.agent.on_pointer(PointerEvent::new(
        target,
        PointerKind::Down,
        Point::new(100.0, 100.0),
        at_ms,
    ));
    frame.agent.on_pointer(PointerEvent::new(
        target,
        PointerKind::Click,
        Point::new(100.0, 100.0),
        at_ms + 80,
    ));
}

/// Shuttle messages both ways until nothing moves. The channel plumbing
/// hops through spawned tasks, so each round yields first.
async fn settle(
    controller: &mut HostController,
    frames: &mut [Frame],
    inbound: &mut mpsc::Receiver<(PageId, FrameMessage)>,
) -> Result<(), Box<dyn std::error::Error>> {
    for _ in 0..32 {
        tokio::task::yield_now().await;
        while let Ok((page, message)) = inbound.try_recv() {
            controller.handle_frame_message(page, message).await?;
        }
        for frame in frames.iter_mut() {
            frame.agent.pump(&mut frame.endpoint);
        }
    }
    Ok(())
}

//! Replay a scripted drag session against a small page and print the
//! resulting tree and event log.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p pb-editor --example replay_gesture
//! ```

use pb_core::{Node, NodeId, NodeKind, Tree};
use pb_editor::{Canvas, CanvasConfig, DragEvent, DropOutcome, HoverSurface, Point, Rect};
use std::error::Error;
use std::time::{Duration, Instant};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => CanvasConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => CanvasConfig::default(),
    };

    let hero = NodeId::intern("hero");
    let headline = NodeId::intern("headline");
    let tree = Tree::from_nodes(vec![
        Node::container(
            hero,
            vec![Node::new(headline, NodeKind::Text).with_property("content", "Welcome".into())],
        ),
        Node::new(NodeId::intern("signup"), NodeKind::Button),
    ]);

    let t0 = Instant::now();
    let mut canvas = Canvas::new(config.clone(), t0).with_tree(tree);
    let log = canvas.attach_event_log();
    let row = Rect::new(0.0, 0.0, 320.0, 48.0);
    let mut now = t0;

    // 1. Drop an image from the palette into the hero, above the headline.
    step(&mut canvas, &mut now, DragEvent::StartFromPalette { template: "image".into() });
    let pointer = Point::new(40.0, 10.0);
    for surface in [
        HoverSurface::Node { id: headline, bounds: row },
        HoverSurface::ContainerBody(hero),
        HoverSurface::Canvas,
    ] {
        step(&mut canvas, &mut now, DragEvent::Over { surface, pointer });
    }
    if let Some(outcome) = step(&mut canvas, &mut now, DragEvent::Drop { pointer }) {
        println!("palette drop: {:?}", outcome.result);
    }
    step(&mut canvas, &mut now, DragEvent::End);

    // 2. After the cooldown, move the signup button into the hero.
    now += config.cooldown();
    canvas.tick(now);
    step(&mut canvas, &mut now, DragEvent::StartFromNode { id: NodeId::intern("signup") });
    step(
        &mut canvas,
        &mut now,
        DragEvent::Over {
            surface: HoverSurface::ContainerBody(hero),
            pointer,
        },
    );
    if let Some(outcome) = step(&mut canvas, &mut now, DragEvent::Drop { pointer }) {
        println!("move: {:?}", outcome.result);
    }
    step(&mut canvas, &mut now, DragEvent::End);

    println!();
    canvas.tree().walk(|path, node| {
        let indent = "  ".repeat(path.len().saturating_sub(1));
        println!("{indent}{} ({}) at [{path}]", node.id(), node.kind());
    });

    let log = log.borrow();
    let events: Vec<_> = log.events().collect();
    println!("\n{}", serde_json::to_string_pretty(&events)?);
    println!("reorders: {}", log.reorder_count());
    Ok(())
}

/// Deliver one event one frame after the previous one.
fn step(canvas: &mut Canvas, now: &mut Instant, event: DragEvent) -> Option<DropOutcome> {
    *now += Duration::from_millis(16);
    canvas.handle(event, *now)
}

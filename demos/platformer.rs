//! A player slides along a floor, picks up a coin and a ball bounces off a wall.
//! Run with `RUST_LOG=bumpbox=debug` to see the world log membership changes.

use bumpbox::*;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Entity {
    Player,
    Ball,
    Coin(u32),
    Block(u32),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut world = World::with_cell_size(32.0)?;
    for i in 0..20 {
        world.add(Entity::Block(i), f64::from(i) * 16.0, 200.0, 16.0, 16.0)?;
    }
    world.add(Entity::Block(100), 300.0, 100.0, 16.0, 100.0)?;
    world.add(Entity::Coin(0), 120.0, 180.0, 8.0, 8.0)?;
    world.add(Entity::Player, 10.0, 170.0, 16.0, 24.0)?;
    world.add(Entity::Ball, 200.0, 150.0, 8.0, 8.0)?;

    let filter = |_: Option<&Entity>, other: &Entity| match other {
        Entity::Coin(_) => Some(ResponseKind::Cross),
        Entity::Ball => None,
        _ => Some(ResponseKind::Slide),
    };
    let ball_filter = |_: Option<&Entity>, other: &Entity| match other {
        Entity::Block(_) => Some(ResponseKind::Bounce),
        _ => None,
    };

    let mut ball_v = (9.0, 3.0);
    for tick in 0..20 {
        // player walks right and falls
        let p = world.get_rect(&Entity::Player)?;
        let m = world.move_item(&Entity::Player, p.x + 8.0, p.y + 4.0, Some(&filter))?;
        for col in &m.collisions {
            if let (Entity::Coin(_), ResponseKind::Cross) = (&col.other, col.kind) {
                println!("tick {tick}: player picked up {:?}", col.other);
                world.remove(&col.other)?;
            }
        }

        let b = world.get_rect(&Entity::Ball)?;
        let m = world.move_item(&Entity::Ball, b.x + ball_v.0, b.y + ball_v.1, Some(&ball_filter))?;
        for col in &m.collisions {
            if col.normal.x != 0.0 {
                ball_v.0 = -ball_v.0;
            }
            if col.normal.y != 0.0 {
                ball_v.1 = -ball_v.1;
            }
            println!("tick {tick}: ball bounced off {:?} at ({:.1}, {:.1})", col.other, col.touch.x, col.touch.y);
        }
    }

    let p = world.get_rect(&Entity::Player)?;
    println!("player at ({:.1}, {:.1})", p.x, p.y);
    let ahead = world.query_segment(p.x, p.y + 12.0, p.x + 400.0, p.y + 12.0, None);
    println!("looking right: {ahead:?}");
    println!("{:?}", world.debug_stats());
    Ok(())
}

use bumpbox::*;
use std::time::Instant;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn unit(seed: &mut u32) -> f64 {
    f64::from(lcg(seed)) / f64::from(u32::MAX)
}

fn main() -> Result<()> {
    let mut world: World<u32> = World::new(WorldConfig { cell_size: 32.0 })?;

    let n = 10_000u32; // number of boxes
    let ticks = 60;
    let mut seed = 1u32;
    let t0 = Instant::now();
    for id in 0..n {
        let x = unit(&mut seed) * 4000.0 - 2000.0;
        let y = unit(&mut seed) * 4000.0 - 2000.0;
        let w = 4.0 + unit(&mut seed) * 12.0;
        let h = 4.0 + unit(&mut seed) * 12.0;
        world.add(id, x, y, w, h)?;
    }
    let t_add = t0.elapsed();

    // Every fourth box moves each tick; the rest are obstacles.
    let movers: Vec<u32> = (0..n).step_by(4).collect();
    let mut collisions = 0usize;
    let t1 = Instant::now();
    for _ in 0..ticks {
        for id in &movers {
            let r = world.get_rect(id)?;
            let vx = unit(&mut seed) * 8.0 - 4.0;
            let vy = unit(&mut seed) * 8.0 - 4.0;
            collisions += world.move_item(id, r.x + vx, r.y + vy, None)?.collisions.len();
        }
    }
    let t_move = t1.elapsed();

    let t2 = Instant::now();
    let mut seen = 0usize;
    for _ in 0..1000 {
        let x = unit(&mut seed) * 4000.0 - 2000.0;
        let y = unit(&mut seed) * 4000.0 - 2000.0;
        seen += world.query_segment(x, y, x + 200.0, y + 50.0, None).len();
    }
    let t_seg = t2.elapsed();

    let stats = world.debug_stats();
    println!(
        "N={} cell_size={} add={:?} moves={}x{} in {:?} ({} collisions) segments=1000 in {:?} ({} hits)",
        n,
        world.cell_size(),
        t_add,
        ticks,
        movers.len(),
        t_move,
        collisions,
        t_seg,
        seen
    );
    println!("items={} cells={} memberships={}", stats.items, stats.cells, stats.memberships);
    Ok(())
}

//! Headless demo: build a small world, steer an avatar, report what happened
//!
//! Usage: `shatterbox [config.json]`. Set `RUST_LOG=debug` to watch entities
//! spawn, break and die.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::time::Instant;

    use shatterbox::driver::Driver;
    use shatterbox::geom::{Aabb, Pos};
    use shatterbox::screen::{HeadlessWindow, InputEvent, Key, WorldScreen};
    use shatterbox::sim::{Avatar, Block, Bulwark, Color, Material, World};
    use shatterbox::WorldConfig;

    const DEMO_TICKS: u64 = 300;

    env_logger::init();
    log::info!("Shatterbox (headless) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => match WorldConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{err}");
                std::process::exit(1);
            }
        },
        None => WorldConfig::default(),
    };

    let mut world = match World::<2>::try_new(config.clone()) {
        Ok(world) => world,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };
    world.spawn(Bulwark::new(
        Aabb::new(Pos([0, 950]), Pos([1000, 1000])),
        Material::fixed(Color::STONE, 500),
    ));
    let sky = Aabb::new(Pos([0, 0]), Pos([1000, 600]));
    for _ in 0..12 {
        let bbox = world.random_box(&sky, Pos([120, 60]));
        let color = world.random_color();
        world.spawn(Block::new(bbox, Material::solid(color, 3)));
    }
    let avatar = world.spawn(Avatar::new(
        Aabb::new(Pos([480, 860]), Pos([500, 900])),
        Material::seamless(Color::WHITE, 20),
    ));

    let mut screen = WorldScreen::new(world);
    screen.focus(avatar);

    let mut window = HeadlessWindow::new(800, 600);
    window.queue(InputEvent::KeyDown(Key::Right));
    window.queue(InputEvent::KeyDown(Key::Char('g')));
    let mut driver = Driver::new(window, &config);
    driver.open(screen);

    // Simulated clock: run as fast as the host allows
    let mut now = Instant::now();
    while driver.ticks() < DEMO_TICKS && !driver.screens().is_empty() {
        now = driver.step(now);
    }

    log::info!(
        "ran {} ticks and {} frames, {} draw calls in total",
        driver.ticks(),
        driver.frames(),
        driver.window().calls().len()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser front end; the library is the product on wasm
}

mod config;

use std::time::Duration;

use config::ServerConfig;
use gardn_game::content::{Content, Rarity};
use gardn_game::{GameEvent, GameWorld};
use tracing::{debug, info, warn};

/// Spawn bots until the live population matches the configured count.
fn top_up_bots(world: &mut GameWorld, config: &ServerConfig, next_index: &mut u32) {
    let want = config.bots.count as usize;
    while world.bot_count() < want {
        let position = match world.spawn_point(config.bots.spawn_difficulty) {
            Ok(p) => p,
            Err(e) => {
                warn!("Cannot place bots: {e}");
                return;
            }
        };
        *next_index += 1;
        let name = format!("{}{}", config.bots.name_prefix, next_index);
        world.spawn_bot(&name, position);
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::EntityDied { runtime_id } => debug!(runtime_id, "entity died"),
        GameEvent::ItemCollected {
            runtime_id,
            item,
            slot,
        } => debug!(runtime_id, ?item, slot, "item collected"),
        GameEvent::BotThought { runtime_id, text } => debug!(runtime_id, text, "thought"),
        other => debug!(?other, "event"),
    }
}

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load("server.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load server.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "Gardn bot host v{} starting at {} tps (seed: {})",
        env!("CARGO_PKG_VERSION"),
        config.server.tps,
        config.server.seed
    );
    info!(
        "Bots: {} (prefix: {}, scoring: {:?})",
        config.bots.count, config.bots.name_prefix, config.bots.engine.scoring
    );

    let tps = config.server.tps.max(1);
    let mut world = GameWorld::new(
        Content::builtin(),
        config.bot_config(),
        config.world.clone(),
        config.server.seed,
    );
    let mut bot_index = 0u32;
    top_up_bots(&mut world, &config, &mut bot_index);

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let summary_every = config.server.summary_interval_secs * tps as u64;
    let mut tick_interval = tokio::time::interval(Duration::from_secs_f64(1.0 / tps as f64));
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                world.tick();
                for event in world.drain_events() {
                    log_event(&event);
                }
                top_up_bots(&mut world, &config, &mut bot_index);

                let tick = world.current_tick();
                if summary_every > 0 && tick.is_multiple_of(summary_every) {
                    let bots = world.bot_count();
                    let tracker = world.tracker();
                    info!(
                        tick,
                        bots,
                        items = tracker.total(),
                        unique = tracker.count_by_rarity(&world.content.items, Rarity::Unique),
                        "status"
                    );
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("Server shut down after {} ticks.", world.current_tick());
}

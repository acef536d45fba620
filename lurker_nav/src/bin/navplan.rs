// Command-line path planner.
//
// Loads a scene, rebuilds its graph, plans one path and prints the waypoints
// with their floors and the total cost. Exits with status 2 when the plan is
// rejected and 1 on bad input.
//
// Usage:
//   navplan --scene <FILE> --from <X,Y,Z> (--to-node <N> | --to <X,Y,Z>) [OPTIONS]
//     --config <FILE>    NavConfig JSON (default: built-in defaults)
//     --seed <N>         Override the config's rng_seed
//
// Set RUST_LOG (e.g. `RUST_LOG=lurker_nav=debug`) for rebuild and rejection
// details.

use lurker_nav::config::NavConfig;
use lurker_nav::manager::NavManager;
use lurker_nav::scene::NavScene;
use lurker_nav::search::path_cost;
use lurker_nav::types::{NodeId, Vec3};
use std::path::PathBuf;
use tracing::error;

enum Destination {
    Node(NodeId),
    Point(Vec3),
}

struct Args {
    scene: PathBuf,
    config: Option<PathBuf>,
    from: Vec3,
    to: Destination,
    seed: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lurker_nav=info")),
        )
        .init();

    let args = parse_args();

    let mut config = match &args.config {
        Some(path) => NavConfig::load(path).unwrap_or_else(|e| fail(&format!("{}: {e}", path.display()))),
        None => NavConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    let scene =
        NavScene::load(&args.scene).unwrap_or_else(|e| fail(&format!("{}: {e}", args.scene.display())));
    let manager = NavManager::from_scene(&scene, config).unwrap_or_else(|e| fail(&e.to_string()));

    let destination = match args.to {
        Destination::Node(id) => id,
        Destination::Point(p) => manager
            .closest_enabled_node(p, Vec3::ONE)
            .unwrap_or_else(|| fail("scene has no enabled nodes")),
    };

    let path = match manager.plan(args.from, destination) {
        Ok(path) => path,
        Err(e) if e.is_rejection() => {
            error!("plan rejected: {e}");
            std::process::exit(2);
        }
        Err(e) => fail(&e.to_string()),
    };

    let graph = manager.graph();
    for (step, &id) in path.iter().enumerate() {
        let node = graph.node(id);
        println!(
            "{step:>3}  {:<9} floor {:<2} {:?}  ({:.2}, {:.2}, {:.2})",
            id.to_string(),
            node.floor,
            node.node_type,
            node.position.x,
            node.position.y,
            node.position.z
        );
    }
    println!(
        "{} waypoints, {} floor change(s), cost {:.2}",
        path.len(),
        manager.path_complexity(&path),
        path_cost(graph, &path).unwrap_or(f32::NAN)
    );
}

fn fail(message: &str) -> ! {
    eprintln!("navplan: {message}");
    std::process::exit(1);
}

/// Parse `std::env::args()` by hand; the option set is small.
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut scene = None;
    let mut config = None;
    let mut from = None;
    let mut to = None;
    let mut seed = None;
    let mut i = 1;

    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        let value = args
            .get(i)
            .cloned()
            .unwrap_or_else(|| fail(&format!("{flag} requires a value")));
        match flag {
            "--scene" => scene = Some(PathBuf::from(value)),
            "--config" => config = Some(PathBuf::from(value)),
            "--from" => from = Some(parse_point(flag, &value)),
            "--to" => to = Some(Destination::Point(parse_point(flag, &value))),
            "--to-node" => {
                let id = value
                    .parse()
                    .unwrap_or_else(|_| fail("--to-node requires a node index"));
                to = Some(Destination::Node(NodeId(id)));
            }
            "--seed" => {
                seed = Some(value.parse().unwrap_or_else(|_| fail("--seed requires an integer")));
            }
            other => fail(&format!("unknown argument: {other}")),
        }
        i += 1;
    }

    Args {
        scene: scene.unwrap_or_else(|| fail("--scene is required")),
        config,
        from: from.unwrap_or_else(|| fail("--from is required")),
        to: to.unwrap_or_else(|| fail("one of --to or --to-node is required")),
        seed,
    }
}

fn parse_point(flag: &str, text: &str) -> Vec3 {
    let coords: Vec<f32> = text
        .split(',')
        .map(|c| c.trim().parse())
        .collect::<Result<_, _>>()
        .unwrap_or_else(|_| fail(&format!("{flag} expects x,y,z")));
    match coords.as_slice() {
        &[x, y, z] => Vec3::new(x, y, z),
        _ => fail(&format!("{flag} expects x,y,z")),
    }
}

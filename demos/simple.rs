//! basic example to showcase the main functions of NodeLocator

use ketama_locator::{AddressFormatter, KeyFormat, LocatorConfig, NodeLocator, ServerAddr};

fn server(addr: &str) -> ServerAddr {
    addr.parse().unwrap()
}

fn main() {
    let formatter = AddressFormatter::new(KeyFormat::Spymemcached);
    let mut locator = NodeLocator::with_formatter(LocatorConfig::default(), formatter);

    let nodes = vec![
        server("127.0.0.1:11211"),
        server("127.0.0.2:11211"),
        server("127.0.0.3:11211"),
    ];
    locator.add_nodes(nodes).unwrap();

    // node responsible for the key 'foo'
    println!("node for key foo: {:?}", locator.get("foo"));

    // primary and backup node for 'foo'
    println!("two nodes for key foo: {:?}", locator.get_two("foo"));

    println!(
        "{} nodes on {} positions, highest position {:?}",
        locator.len(),
        locator.vlen(),
        locator.get_max_hash_key()
    );

    // only keys in the ranges the new node takes over move to it
    let mut grown = locator.clone();
    let new_node = server("127.0.0.4:11211");
    grown.add_nodes([new_node.clone()]).unwrap();

    let moved = (0..10_000)
        .map(|i| format!("key-{i}"))
        .filter(|key| locator.get(key) != grown.get(key))
        .count();
    println!("{moved} of 10000 keys moved to {new_node:?}");

    // weighted nodes get a share of positions proportional to their weight
    let mut weighted = NodeLocator::with_formatter(LocatorConfig::default(), formatter);
    weighted
        .add_weighted_nodes([
            (server("127.0.0.1:11211"), 1),
            (server("127.0.0.2:11211"), 3),
        ])
        .unwrap();
    for node in &weighted {
        println!("{node:?} owns {} positions", weighted.positions_of(node));
    }
}

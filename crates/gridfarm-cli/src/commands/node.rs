//! `gridfarm node` - node listings.

use anyhow::Result;
use gridfarm_client::{Client, ClientConfig, NodeFilter};

use crate::args::NodeSub;

pub fn run(cmd: NodeSub, config: &ClientConfig) -> Result<()> {
    let client = Client::new(config, None)?;
    match cmd {
        NodeSub::List { farm, page_size } => {
            let filter = NodeFilter::default().in_farm(farm);
            let mut count = 0usize;
            for node in client.directory().nodes(filter, page_size) {
                let node = node?;
                println!(
                    "{}\t{}\tuptime={}s\t{}",
                    node.node_id, node.host_name, node.uptime, node.location.country
                );
                count += 1;
            }
            println!("{count} node(s) in farm {farm}");
        }
        NodeSub::Get { node_id, proofs } => {
            let node = client.directory().node_get(&node_id, proofs)?;
            println!("{}", serde_json::to_string_pretty(&node)?);
        }
    }
    Ok(())
}

//! Directory: farm and node records.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::http::HttpBackend;
use crate::error::{ClientError, ClientResult};
use crate::pager::{FarmFilter, NodeFilter, Pager, Query};
use crate::pages::Pages;
use crate::types::{Farm, Iface, Node, PublicIface, ResourceAmount, WorkloadAmount};

/// Page size used by the farm name lookup.
const LOOKUP_PAGE_SIZE: u32 = 5;

/// Directory API.
pub trait Directory: Send + Sync {
    /// Register a farm; returns the id assigned by the server.
    fn farm_register(&self, farm: &Farm) -> ClientResult<i64>;

    /// Replace the farm record identified by `farm.id`.
    fn farm_update(&self, farm: &Farm) -> ClientResult<()>;

    /// One page of farms matching the filter. An empty page is not an error.
    fn farm_list(&self, filter: &FarmFilter, pager: Pager) -> ClientResult<Vec<Farm>>;

    fn farm_get(&self, id: i64) -> ClientResult<Farm>;

    fn node_register(&self, node: &Node) -> ClientResult<()>;

    fn node_get(&self, node_id: &str, proofs: bool) -> ClientResult<Node>;

    /// One page of nodes matching the filter. An empty page is not an error.
    fn node_list(&self, filter: &NodeFilter, pager: Pager) -> ClientResult<Vec<Node>>;

    fn node_set_interfaces(&self, node_id: &str, ifaces: &[Iface]) -> ClientResult<()>;

    fn node_set_ports(&self, node_id: &str, ports: &[u32]) -> ClientResult<()>;

    fn node_set_public(&self, node_id: &str, iface: &PublicIface) -> ClientResult<()>;

    fn node_update_uptime(&self, node_id: &str, uptime: u64) -> ClientResult<()>;

    fn node_update_used_resources(
        &self,
        node_id: &str,
        resources: &ResourceAmount,
        workloads: &WorkloadAmount,
    ) -> ClientResult<()>;

    /// First farm registered under exactly this name.
    fn farm_by_name(&self, name: &str) -> ClientResult<Farm> {
        let filter = FarmFilter::default().named(name);
        self.farm_list(&filter, Pager::new(1, LOOKUP_PAGE_SIZE))?
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::not_found(format!("farm {name}")))
    }

    /// All farms matching the filter, fetched `page_size` at a time.
    fn farms(&self, filter: FarmFilter, page_size: u32) -> Pages<'_, Farm> {
        Pages::new(page_size, move |pager| self.farm_list(&filter, pager))
    }

    /// All nodes matching the filter, fetched `page_size` at a time.
    fn nodes(&self, filter: NodeFilter, page_size: u32) -> Pages<'_, Node> {
        Pages::new(page_size, move |pager| self.node_list(&filter, pager))
    }
}

#[derive(Debug, Deserialize)]
struct Registered {
    id: i64,
}

#[derive(Debug, Serialize)]
struct PortsRequest<'a> {
    ports: &'a [u32],
}

#[derive(Debug, Serialize)]
struct UptimeRequest {
    uptime: u64,
}

#[derive(Debug, Serialize)]
struct UsedResourcesRequest<'a> {
    #[serde(flatten)]
    resources: &'a ResourceAmount,
    #[serde(flatten)]
    workloads: &'a WorkloadAmount,
}

/// Directory over HTTP.
#[derive(Clone)]
pub struct HttpDirectory {
    http: HttpBackend,
}

impl HttpDirectory {
    pub(crate) fn new(http: HttpBackend) -> Self {
        Self { http }
    }
}

impl Directory for HttpDirectory {
    fn farm_register(&self, farm: &Farm) -> ClientResult<i64> {
        let url = self.http.url(&["farms"]);
        debug!(url = %url, name = %farm.name, "registering farm");

        let output: Registered = self.http.post(url, farm, &[StatusCode::CREATED])?;
        Ok(output.id)
    }

    fn farm_update(&self, farm: &Farm) -> ClientResult<()> {
        let id = farm.id.to_string();
        self.http
            .put_discard(self.http.url(&["farms", &id]), farm, &[StatusCode::OK])
    }

    fn farm_list(&self, filter: &FarmFilter, pager: Pager) -> ClientResult<Vec<Farm>> {
        let mut query = Query::new();
        pager.apply(&mut query);
        filter.apply(&mut query);

        self.http
            .get(self.http.url(&["farms"]), &query, &[StatusCode::OK])
    }

    fn farm_get(&self, id: i64) -> ClientResult<Farm> {
        let id = id.to_string();
        self.http
            .get(self.http.url(&["farms", &id]), &Query::new(), &[StatusCode::OK])
    }

    fn node_register(&self, node: &Node) -> ClientResult<()> {
        self.http
            .post_discard(self.http.url(&["nodes"]), node, &[StatusCode::CREATED])
    }

    fn node_get(&self, node_id: &str, proofs: bool) -> ClientResult<Node> {
        let query: Query = vec![("proofs", proofs.to_string())];
        self.http
            .get(self.http.url(&["nodes", node_id]), &query, &[StatusCode::OK])
    }

    fn node_list(&self, filter: &NodeFilter, pager: Pager) -> ClientResult<Vec<Node>> {
        let mut query = Query::new();
        pager.apply(&mut query);
        filter.apply(&mut query);

        self.http
            .get(self.http.url(&["nodes"]), &query, &[StatusCode::OK])
    }

    fn node_set_interfaces(&self, node_id: &str, ifaces: &[Iface]) -> ClientResult<()> {
        self.http.post_discard(
            self.http.url(&["nodes", node_id, "interfaces"]),
            ifaces,
            &[StatusCode::CREATED],
        )
    }

    fn node_set_ports(&self, node_id: &str, ports: &[u32]) -> ClientResult<()> {
        self.http.post_discard(
            self.http.url(&["nodes", node_id, "ports"]),
            &PortsRequest { ports },
            &[StatusCode::OK],
        )
    }

    fn node_set_public(&self, node_id: &str, iface: &PublicIface) -> ClientResult<()> {
        self.http.post_discard(
            self.http.url(&["nodes", node_id, "configure_public"]),
            iface,
            &[StatusCode::CREATED],
        )
    }

    fn node_update_uptime(&self, node_id: &str, uptime: u64) -> ClientResult<()> {
        self.http.post_discard(
            self.http.url(&["nodes", node_id, "uptime"]),
            &UptimeRequest { uptime },
            &[StatusCode::OK],
        )
    }

    fn node_update_used_resources(
        &self,
        node_id: &str,
        resources: &ResourceAmount,
        workloads: &WorkloadAmount,
    ) -> ClientResult<()> {
        self.http.post_discard(
            self.http.url(&["nodes", node_id, "used_resources"]),
            &UsedResourcesRequest {
                resources,
                workloads,
            },
            &[StatusCode::OK],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn used_resources_body_is_flattened() {
        let resources = ResourceAmount {
            cru: 4,
            mru: 8.0,
            ..Default::default()
        };
        let workloads = WorkloadAmount {
            container: 2,
            ..Default::default()
        };
        let body = serde_json::to_value(UsedResourcesRequest {
            resources: &resources,
            workloads: &workloads,
        })
        .unwrap();

        assert_eq!(body["cru"], json!(4));
        assert_eq!(body["mru"], json!(8.0));
        assert_eq!(body["container"], json!(2));
        assert!(body.get("resources").is_none());
    }

    #[test]
    fn ports_body_shape() {
        let body = serde_json::to_value(PortsRequest { ports: &[6000, 6001] }).unwrap();
        assert_eq!(body, json!({"ports": [6000, 6001]}));
    }
}

//! VPC (Virtual Private Cloud) regional API client
//!
//! Covers the subset of the VPC API the provisioning scenarios need:
//! network, public gateways, subnets, security groups and rules, image and
//! SSH key lookup, and instance creation.

use crate::error::{IbmError, Result};
use crate::{check_response, ClientConfig};
use serde::{Deserialize, Serialize};

/// Dated API version query parameter required on every VPC call.
const VPC_API_VERSION: &str = "2025-04-29";

pub struct VpcClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    region: String,
}

// Manual impl so the bearer token never reaches debug output.
impl std::fmt::Debug for VpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VpcClient")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

// ============ Response types ============

#[derive(Debug, Clone, Deserialize)]
pub struct Vpc {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ZoneList {
    zones: Vec<Zone>,
}

#[derive(Debug, Deserialize)]
struct Zone {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicGateway {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub created_at: String,
    #[serde(default)]
    pub operating_system: Option<OperatingSystem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatingSystem {
    pub name: String,
    pub architecture: String,
}

/// Page link carried by the VPC list endpoints; `href` is a complete URL
/// including the version and generation parameters.
#[derive(Debug, Deserialize)]
struct PageLink {
    href: String,
}

#[derive(Debug, Deserialize)]
struct ImageList {
    images: Vec<Image>,
    #[serde(default)]
    next: Option<PageLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SshKey {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct SshKeyList {
    keys: Vec<SshKey>,
    #[serde(default)]
    next: Option<PageLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
}

// ============ Request types ============

#[derive(Debug, Serialize)]
struct IdRef<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct NameRef<'a> {
    name: &'a str,
}

/// A security group rule prototype.
///
/// Use the constructors rather than building the struct by hand; they
/// encode the shapes the API accepts for tcp, icmp and all-protocol rules.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SecurityGroupRule {
    pub direction: String,
    pub ip_version: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_min: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_max: Option<u16>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RuleRemote>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RuleRemote {
    pub cidr_block: String,
}

impl SecurityGroupRule {
    fn base(direction: &str, protocol: &str) -> Self {
        Self {
            direction: direction.to_string(),
            ip_version: "ipv4".to_string(),
            protocol: protocol.to_string(),
            port_min: None,
            port_max: None,
            icmp_type: None,
            code: None,
            remote: None,
        }
    }

    /// Inbound ICMP echo request (ping).
    pub fn inbound_icmp_echo() -> Self {
        let mut rule = Self::base("inbound", "icmp");
        rule.icmp_type = Some(8);
        rule.code = Some(0);
        rule
    }

    /// Inbound TCP on a single port, open to any remote.
    pub fn inbound_tcp(port: u16) -> Self {
        let mut rule = Self::base("inbound", "tcp");
        rule.port_min = Some(port);
        rule.port_max = Some(port);
        rule
    }

    /// Inbound TCP on a single port, restricted to a CIDR block.
    pub fn inbound_tcp_from(port: u16, cidr: &str) -> Self {
        let mut rule = Self::inbound_tcp(port);
        rule.remote = Some(RuleRemote {
            cidr_block: cidr.to_string(),
        });
        rule
    }

    /// Outbound, all protocols, any remote.
    pub fn outbound_all() -> Self {
        Self::base("outbound", "all")
    }
}

/// Prototype for `create_instance`.
#[derive(Debug, Clone)]
pub struct InstancePrototype {
    pub name: String,
    pub profile: String,
    pub image_id: String,
    pub zone: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub security_group_id: String,
    pub ssh_key_id: String,
    pub resource_group_id: String,
    pub user_data: String,
}

/// Folds one page of images into the running best candidate: stock amd64
/// Ubuntu only, newest `created_at` wins (RFC 3339 sorts lexicographically).
fn fold_newest_ubuntu(newest: Option<Image>, images: Vec<Image>) -> Option<Image> {
    let mut newest = newest;
    for image in images {
        let stock_ubuntu = image
            .operating_system
            .as_ref()
            .is_some_and(|os| os.name.starts_with("ubuntu") && os.architecture == "amd64");
        if !stock_ubuntu {
            continue;
        }
        match &newest {
            Some(best) if best.created_at >= image.created_at => {}
            _ => newest = Some(image),
        }
    }
    newest
}

impl VpcClient {
    pub fn new(
        token: impl Into<String>,
        region: impl Into<String>,
        config: &ClientConfig,
    ) -> Result<Self> {
        let region = region.into();
        Ok(Self {
            client: config.http_client()?,
            token: token.into(),
            base_url: format!("https://{region}.iaas.cloud.ibm.com/v1"),
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn url(&self, path: &str) -> String {
        let sep = if path.contains('?') { '&' } else { '?' };
        format!(
            "{}/{}{}version={}&generation=2",
            self.base_url, path, sep, VPC_API_VERSION
        )
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Ok(check_response(response).await?.json().await?)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        self.get_json_url(&self.url(path)).await
    }

    async fn get_json_url<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(check_response(response).await?.json().await?)
    }

    /// Create a VPC with automatic address prefixes and no classic access.
    pub async fn create_vpc(&self, name: &str, resource_group_id: &str) -> Result<Vpc> {
        let body = serde_json::json!({
            "name": name,
            "address_prefix_management": "auto",
            "classic_access": false,
            "resource_group": IdRef { id: resource_group_id },
        });
        self.post_json("vpcs", &body).await
    }

    /// Names of the availability zones in this client's region.
    pub async fn list_region_zones(&self) -> Result<Vec<String>> {
        let list: ZoneList = self
            .get_json(&format!("regions/{}/zones", self.region))
            .await?;
        Ok(list.zones.into_iter().map(|z| z.name).collect())
    }

    pub async fn create_public_gateway(
        &self,
        vpc_id: &str,
        zone: &str,
        name: &str,
        resource_group_id: &str,
    ) -> Result<PublicGateway> {
        let body = serde_json::json!({
            "name": name,
            "vpc": IdRef { id: vpc_id },
            "zone": NameRef { name: zone },
            "resource_group": IdRef { id: resource_group_id },
        });
        self.post_json("public_gateways", &body).await
    }

    /// Create an ipv4 subnet with 128 addresses, optionally attached to a
    /// public gateway.
    pub async fn create_subnet(
        &self,
        name: &str,
        vpc_id: &str,
        zone: &str,
        resource_group_id: &str,
        public_gateway_id: Option<&str>,
    ) -> Result<Subnet> {
        let mut body = serde_json::json!({
            "name": name,
            "ip_version": "ipv4",
            "total_ipv4_address_count": 128,
            "vpc": IdRef { id: vpc_id },
            "zone": NameRef { name: zone },
            "resource_group": IdRef { id: resource_group_id },
        });
        if let Some(gateway_id) = public_gateway_id {
            body["public_gateway"] = serde_json::json!(IdRef { id: gateway_id });
        }
        self.post_json("subnets", &body).await
    }

    pub async fn create_security_group(
        &self,
        name: &str,
        vpc_id: &str,
        resource_group_id: &str,
    ) -> Result<SecurityGroup> {
        let body = serde_json::json!({
            "name": name,
            "vpc": IdRef { id: vpc_id },
            "resource_group": IdRef { id: resource_group_id },
        });
        self.post_json("security_groups", &body).await
    }

    pub async fn create_security_group_rule(
        &self,
        security_group_id: &str,
        rule: &SecurityGroupRule,
    ) -> Result<()> {
        let body = serde_json::to_value(rule)?;
        let _: serde_json::Value = self
            .post_json(
                &format!("security_groups/{security_group_id}/rules"),
                &body,
            )
            .await?;
        Ok(())
    }

    /// Newest available amd64 Ubuntu stock image, across every page of
    /// the image list.
    pub async fn latest_ubuntu_image(&self) -> Result<Image> {
        let mut url = self.url("images?status=available&limit=100");
        let mut newest: Option<Image> = None;
        loop {
            let page: ImageList = self.get_json_url(&url).await?;
            newest = fold_newest_ubuntu(newest, page.images);
            match page.next {
                Some(link) => url = link.href,
                None => break,
            }
        }
        newest.ok_or_else(|| IbmError::NotFound("available amd64 ubuntu image".to_string()))
    }

    /// Resolve an SSH key name to its id, across every page of the key
    /// list.
    pub async fn ssh_key_id_by_name(&self, name: &str) -> Result<String> {
        let mut url = self.url("keys?limit=100");
        loop {
            let page: SshKeyList = self.get_json_url(&url).await?;
            if let Some(key) = page.keys.into_iter().find(|k| k.name == name) {
                return Ok(key.id);
            }
            match page.next {
                Some(link) => url = link.href,
                None => return Err(IbmError::NotFound(format!("ssh key '{name}'"))),
            }
        }
    }

    pub async fn create_instance(&self, prototype: &InstancePrototype) -> Result<Instance> {
        let body = serde_json::json!({
            "name": prototype.name,
            "profile": NameRef { name: &prototype.profile },
            "image": IdRef { id: &prototype.image_id },
            "zone": NameRef { name: &prototype.zone },
            "vpc": IdRef { id: &prototype.vpc_id },
            "keys": [IdRef { id: &prototype.ssh_key_id }],
            "resource_group": IdRef { id: &prototype.resource_group_id },
            "user_data": prototype.user_data,
            "primary_network_interface": {
                "name": "eth0",
                "allow_ip_spoofing": false,
                "subnet": IdRef { id: &prototype.subnet_id },
                "security_groups": [IdRef { id: &prototype.security_group_id }],
            },
        });
        self.post_json("instances", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_rule_serializes_without_icmp_fields() {
        let rule = SecurityGroupRule::inbound_tcp(443);
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "direction": "inbound",
                "ip_version": "ipv4",
                "protocol": "tcp",
                "port_min": 443,
                "port_max": 443,
            })
        );
    }

    #[test]
    fn restricted_tcp_rule_carries_cidr_remote() {
        let rule = SecurityGroupRule::inbound_tcp_from(22, "100.64.0.0/10");
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["remote"]["cidr_block"], "100.64.0.0/10");
        assert_eq!(value["port_min"], 22);
    }

    #[test]
    fn icmp_echo_rule_uses_type_and_code() {
        let rule = SecurityGroupRule::inbound_icmp_echo();
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["protocol"], "icmp");
        assert_eq!(value["type"], 8);
        assert_eq!(value["code"], 0);
        assert!(value.get("port_min").is_none());
    }

    #[test]
    fn outbound_all_has_no_ports_or_remote() {
        let value = serde_json::to_value(SecurityGroupRule::outbound_all()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "direction": "outbound",
                "ip_version": "ipv4",
                "protocol": "all",
            })
        );
    }

    fn ubuntu_image(id: &str, created_at: &str) -> Image {
        Image {
            id: id.to_string(),
            name: format!("ibm-{id}"),
            created_at: created_at.to_string(),
            operating_system: Some(OperatingSystem {
                name: "ubuntu-24-04-amd64".to_string(),
                architecture: "amd64".to_string(),
            }),
        }
    }

    #[test]
    fn newest_ubuntu_selection_spans_pages() {
        // The newest candidate sits on a later page; folding page by page
        // must still surface it.
        let page_one = vec![
            ubuntu_image("r006-img-old", "2024-06-01T00:00:00Z"),
            Image {
                operating_system: Some(OperatingSystem {
                    name: "debian-12-amd64".to_string(),
                    architecture: "amd64".to_string(),
                }),
                ..ubuntu_image("r006-img-debian", "2025-12-01T00:00:00Z")
            },
        ];
        let page_two = vec![ubuntu_image("r006-img-new", "2025-03-01T00:00:00Z")];

        let newest = fold_newest_ubuntu(None, page_one);
        assert_eq!(newest.as_ref().unwrap().id, "r006-img-old");

        let newest = fold_newest_ubuntu(newest, page_two);
        assert_eq!(newest.unwrap().id, "r006-img-new");
    }

    #[test]
    fn fold_with_no_ubuntu_candidates_is_none() {
        assert!(fold_newest_ubuntu(None, vec![]).is_none());
    }

    #[test]
    fn image_list_page_link_deserializes() {
        let json = serde_json::json!({
            "images": [],
            "next": { "href": "https://us-south.iaas.cloud.ibm.com/v1/images?start=abc&limit=100&version=2025-04-29&generation=2" }
        });
        let list: ImageList = serde_json::from_value(json).unwrap();
        assert!(list.next.unwrap().href.contains("start=abc"));
    }

    #[test]
    fn ssh_key_list_page_link_deserializes() {
        let json = serde_json::json!({
            "keys": [{ "id": "k-1", "name": "laptop" }],
            "next": { "href": "https://us-south.iaas.cloud.ibm.com/v1/keys?start=def" }
        });
        let list: SshKeyList = serde_json::from_value(json).unwrap();
        assert_eq!(list.keys[0].name, "laptop");
        assert_eq!(
            list.next.unwrap().href,
            "https://us-south.iaas.cloud.ibm.com/v1/keys?start=def"
        );
    }

    #[test]
    fn last_page_has_no_link() {
        let json = serde_json::json!({ "keys": [] });
        let list: SshKeyList = serde_json::from_value(json).unwrap();
        assert!(list.next.is_none());
    }

    #[test]
    fn image_list_deserializes() {
        let json = serde_json::json!({
            "images": [{
                "id": "r006-img-1",
                "name": "ibm-ubuntu-24-04-minimal-amd64-1",
                "created_at": "2025-01-15T00:00:00Z",
                "operating_system": { "name": "ubuntu-24-04-amd64", "architecture": "amd64" }
            }]
        });
        let list: ImageList = serde_json::from_value(json).unwrap();
        assert_eq!(list.images[0].id, "r006-img-1");
        assert_eq!(
            list.images[0].operating_system.as_ref().unwrap().architecture,
            "amd64"
        );
    }
}

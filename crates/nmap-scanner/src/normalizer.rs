//! nmap XML 정규화
//!
//! [`normalize`]는 nmap이 `-oX -`로 출력한 XML 문서를 [`ScanResult`]로 변환합니다.
//!
//! # 소비하는 XML 구조
//!
//! ```xml
//! <nmaprun args="nmap -sV -oX - scanme.nmap.org" startstr="Sat Jul 27 12:34:56 2024">
//!   <host>
//!     <status state="up"/>
//!     <address addr="45.33.32.156" addrtype="ipv4"/>
//!     <hostnames>
//!       <hostname name="scanme.nmap.org" type="user"/>
//!     </hostnames>
//!     <ports>
//!       <port protocol="tcp" portid="22">
//!         <state state="open"/>
//!         <service name="ssh" product="OpenSSH" version="8.2p1"/>
//!       </port>
//!     </ports>
//!   </host>
//! </nmaprun>
//! ```
//!
//! # 누락 정책
//!
//! - `host/status`, `port/state` 요소는 필수입니다. 누락되면 문서 전체를
//!   `MissingField`로 거부합니다 (부분 결과를 만들지 않음).
//! - 속성은 모두 선택입니다. 없으면 `None`이며 선언되었지만 비어 있는 속성은
//!   `Some("")`로 보존합니다.
//! - `addrtype` 또는 `addr`가 없는 `address` 요소는 주소 맵에 넣을 수 없으므로 건너뜁니다.
//! - `hostnames`, `ports`, `service` 요소는 선택입니다. 없으면 빈 목록 또는 `None`.

use std::collections::BTreeMap;

use roxmltree::{Document, Node, ParsingOptions};
use tracing::debug;

use crate::error::NmapScannerError;
use crate::types::{HostResult, Hostname, PortResult, ScanResult};

/// nmap XML 출력을 정규화된 결과로 변환합니다.
///
/// # Errors
///
/// - `Parse`: UTF-8이 아니거나 올바른 XML이 아님
/// - `MissingField`: 필수 요소(`status`, `state`) 누락
pub fn normalize(raw: &[u8]) -> Result<ScanResult, NmapScannerError> {
    let text = std::str::from_utf8(raw).map_err(|e| NmapScannerError::Parse {
        reason: format!("invalid utf-8: {e}"),
    })?;

    // nmap은 `<!DOCTYPE nmaprun>` 선언을 함께 출력합니다.
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, options).map_err(|e| {
        NmapScannerError::Parse {
            reason: e.to_string(),
        }
    })?;

    let root = doc.root_element();

    let hosts = children_named(root, "host")
        .enumerate()
        .map(|(idx, node)| normalize_host(node, &format!("host[{idx}]")))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        root = root.tag_name().name(),
        hosts = hosts.len(),
        "normalized nmap report"
    );

    Ok(ScanResult {
        scan_args: root.attribute("args").unwrap_or_default().to_owned(),
        start_time: root.attribute("startstr").unwrap_or_default().to_owned(),
        hosts,
    })
}

fn normalize_host(node: Node<'_, '_>, path: &str) -> Result<HostResult, NmapScannerError> {
    let status_node = required_child(node, "status", &format!("{path}/status"))?;
    let status = optional_attribute(status_node, "state");

    let mut addresses = BTreeMap::new();
    for (idx, addr_node) in children_named(node, "address").enumerate() {
        match (
            optional_attribute(addr_node, "addrtype"),
            optional_attribute(addr_node, "addr"),
        ) {
            // 같은 유형이 반복되면 마지막 값이 남습니다.
            (Some(kind), Some(addr)) => {
                addresses.insert(kind, addr);
            }
            _ => debug!(path = %format!("{path}/address[{idx}]"), "skipping incomplete address"),
        }
    }

    let hostnames = match first_child(node, "hostnames") {
        Some(container) => children_named(container, "hostname")
            .map(|h| Hostname {
                name: optional_attribute(h, "name"),
                kind: optional_attribute(h, "type"),
            })
            .collect(),
        None => Vec::new(),
    };

    let ports = match first_child(node, "ports") {
        Some(container) => children_named(container, "port")
            .enumerate()
            .map(|(idx, p)| normalize_port(p, &format!("{path}/ports/port[{idx}]")))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(HostResult {
        status,
        addresses,
        hostnames,
        ports,
    })
}

fn normalize_port(node: Node<'_, '_>, path: &str) -> Result<PortResult, NmapScannerError> {
    let state_node = required_child(node, "state", &format!("{path}/state"))?;

    // 요소 존재 여부만 본다. 자식이 없는 `<service .../>`도 서비스로 취급.
    let (service_name, product, version) = match first_child(node, "service") {
        Some(service) => (
            optional_attribute(service, "name"),
            optional_attribute(service, "product"),
            optional_attribute(service, "version"),
        ),
        None => (None, None, None),
    };

    Ok(PortResult {
        protocol: optional_attribute(node, "protocol"),
        portid: optional_attribute(node, "portid"),
        state: optional_attribute(state_node, "state"),
        service_name,
        product,
        version,
    })
}

/// 주어진 태그 이름을 가진 직계 자식 요소를 순서대로 반환합니다.
fn children_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |c| c.has_tag_name(name))
}

fn first_child<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    children_named(node, name).next()
}

fn required_child<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
    path: &str,
) -> Result<Node<'a, 'input>, NmapScannerError> {
    first_child(node, name).ok_or_else(|| NmapScannerError::MissingField {
        path: path.to_owned(),
    })
}

fn optional_attribute(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(hosts: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<nmaprun scanner="nmap" args="nmap -F -oX - 10.0.0.1" startstr="Mon Oct 19 10:00:00 2026">
{hosts}
</nmaprun>"#
        )
    }

    const MINIMAL_HOST: &str = r#"
<host>
  <status state="up" reason="syn-ack"/>
  <address addr="10.0.0.1" addrtype="ipv4"/>
  <ports>
    <port protocol="tcp" portid="22"><state state="open" reason="syn-ack"/></port>
  </ports>
</host>"#;

    #[test]
    fn minimal_host_round_trip() {
        let result = normalize(wrap(MINIMAL_HOST).as_bytes()).unwrap();

        assert_eq!(result.scan_args, "nmap -F -oX - 10.0.0.1");
        assert_eq!(result.start_time, "Mon Oct 19 10:00:00 2026");
        assert_eq!(result.hosts.len(), 1);

        let host = &result.hosts[0];
        assert_eq!(host.status.as_deref(), Some("up"));
        assert_eq!(host.addresses.len(), 1);
        assert_eq!(host.addresses["ipv4"], "10.0.0.1");
        assert!(host.hostnames.is_empty());
        assert_eq!(
            host.ports,
            vec![PortResult {
                protocol: Some("tcp".to_owned()),
                portid: Some("22".to_owned()),
                state: Some("open".to_owned()),
                service_name: None,
                product: None,
                version: None,
            }]
        );
    }

    #[test]
    fn hosts_keep_document_order() {
        let hosts: String = ["10.0.0.3", "10.0.0.1", "10.0.0.2"]
            .iter()
            .map(|ip| {
                format!(
                    r#"<host><status state="up"/><address addr="{ip}" addrtype="ipv4"/></host>"#
                )
            })
            .collect();
        let result = normalize(wrap(&hosts).as_bytes()).unwrap();

        let order: Vec<&str> = result
            .hosts
            .iter()
            .map(|h| h.addresses["ipv4"].as_str())
            .collect();
        assert_eq!(order, vec!["10.0.0.3", "10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn host_without_ports_yields_empty_list() {
        let xml = wrap(r#"<host><status state="down"/><address addr="10.0.0.9" addrtype="ipv4"/></host>"#);
        let result = normalize(xml.as_bytes()).unwrap();
        assert_eq!(result.hosts[0].status.as_deref(), Some("down"));
        assert!(result.hosts[0].ports.is_empty());
    }

    #[test]
    fn service_with_only_name_leaves_others_absent() {
        let xml = wrap(
            r#"<host><status state="up"/>
<ports><port protocol="tcp" portid="80"><state state="open"/><service name="http" method="table" conf="3"/></port></ports>
</host>"#,
        );
        let port = &normalize(xml.as_bytes()).unwrap().hosts[0].ports[0];
        assert_eq!(port.service_name.as_deref(), Some("http"));
        assert_eq!(port.product, None);
        assert_eq!(port.version, None);
    }

    #[test]
    fn full_service_is_captured() {
        let xml = wrap(
            r#"<host><status state="up"/>
<ports><port protocol="tcp" portid="22"><state state="open"/>
<service name="ssh" product="OpenSSH" version="8.2p1 Ubuntu 4ubuntu0.5" ostype="Linux"><cpe>cpe:/a:openbsd:openssh:8.2p1</cpe></service>
</port></ports></host>"#,
        );
        let port = &normalize(xml.as_bytes()).unwrap().hosts[0].ports[0];
        assert_eq!(port.service_name.as_deref(), Some("ssh"));
        assert_eq!(port.product.as_deref(), Some("OpenSSH"));
        assert_eq!(port.version.as_deref(), Some("8.2p1 Ubuntu 4ubuntu0.5"));
    }

    #[test]
    fn childless_service_element_is_not_skipped() {
        let xml = wrap(
            r#"<host><status state="up"/>
<ports><port protocol="udp" portid="53"><state state="open"/><service name="domain"/></port></ports></host>"#,
        );
        let port = &normalize(xml.as_bytes()).unwrap().hosts[0].ports[0];
        assert_eq!(port.service_name.as_deref(), Some("domain"));
    }

    #[test]
    fn attribute_less_service_yields_all_absent() {
        let xml = wrap(
            r#"<host><status state="up"/>
<ports><port protocol="tcp" portid="1"><state state="open"/><service/></port></ports></host>"#,
        );
        let port = &normalize(xml.as_bytes()).unwrap().hosts[0].ports[0];
        assert!(!port.has_service());
    }

    #[test]
    fn empty_attributes_are_preserved_as_empty_strings() {
        let xml = r#"<nmaprun args="" ><host><status state="up"/>
<ports><port protocol="tcp" portid="8080"><state state="open"/><service name="http-proxy" product="" version=""/></port></ports>
</host></nmaprun>"#;
        let result = normalize(xml.as_bytes()).unwrap();
        assert_eq!(result.scan_args, "");
        let port = &result.hosts[0].ports[0];
        assert_eq!(port.product.as_deref(), Some(""));
        assert_eq!(port.version.as_deref(), Some(""));
    }

    #[test]
    fn missing_root_attributes_default_to_empty() {
        let result = normalize(b"<nmaprun/>").unwrap();
        assert_eq!(result.scan_args, "");
        assert_eq!(result.start_time, "");
        assert!(result.hosts.is_empty());
    }

    #[test]
    fn hostnames_are_collected_in_order() {
        let xml = wrap(
            r#"<host><status state="up"/>
<hostnames>
  <hostname name="scanme.nmap.org" type="user"/>
  <hostname name="scanme.nmap.org" type="PTR"/>
</hostnames></host>"#,
        );
        let host = &normalize(xml.as_bytes()).unwrap().hosts[0];
        assert_eq!(host.hostnames.len(), 2);
        assert_eq!(host.hostnames[0].kind.as_deref(), Some("user"));
        assert_eq!(host.hostnames[1].kind.as_deref(), Some("PTR"));
    }

    #[test]
    fn multiple_address_types_and_last_write_wins() {
        let xml = wrap(
            r#"<host><status state="up"/>
<address addr="192.168.1.10" addrtype="ipv4"/>
<address addr="00:11:22:33:44:55" addrtype="mac" vendor="Acme"/>
<address addr="192.168.1.11" addrtype="ipv4"/>
</host>"#,
        );
        let host = &normalize(xml.as_bytes()).unwrap().hosts[0];
        assert_eq!(host.addresses.len(), 2);
        assert_eq!(host.addresses["ipv4"], "192.168.1.11");
        assert_eq!(host.addresses["mac"], "00:11:22:33:44:55");
    }

    #[test]
    fn malformed_xml_is_parse_failure() {
        let err = normalize(b"<nmaprun><host>").unwrap_err();
        assert!(matches!(err, NmapScannerError::Parse { .. }));
        assert_eq!(err.to_string(), "parse failure");
    }

    #[test]
    fn plain_text_output_is_parse_failure() {
        let err = normalize(b"Starting Nmap 7.94 ( https://nmap.org )").unwrap_err();
        assert_eq!(err.to_string(), "parse failure");
    }

    #[test]
    fn non_utf8_input_is_parse_failure() {
        let err = normalize(&[0xff, 0xfe, b'<', b'a', b'/', b'>']).unwrap_err();
        assert!(matches!(err, NmapScannerError::Parse { .. }));
    }

    #[test]
    fn missing_host_status_aborts_parse() {
        let xml = wrap(
            r#"<host><status state="up"/></host>
<host><address addr="10.0.0.2" addrtype="ipv4"/></host>"#,
        );
        let err = normalize(xml.as_bytes()).unwrap_err();
        match err {
            NmapScannerError::MissingField { path } => assert_eq!(path, "host[1]/status"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn missing_port_state_aborts_parse() {
        let xml = wrap(
            r#"<host><status state="up"/>
<ports>
  <port protocol="tcp" portid="22"><state state="open"/></port>
  <port protocol="tcp" portid="23"/>
</ports></host>"#,
        );
        let err = normalize(xml.as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required field: host[0]/ports/port[1]/state"
        );
    }

    #[test]
    fn status_without_state_attribute_is_absent() {
        let xml = wrap(r#"<host><status reason="user-set"/></host>"#);
        let host = &normalize(xml.as_bytes()).unwrap().hosts[0];
        assert_eq!(host.status, None);
        assert!(!host.is_up());
    }

    #[test]
    fn address_without_addrtype_is_skipped() {
        let xml = wrap(
            r#"<host><status state="up"/>
<address addr="10.0.0.1"/>
<address addrtype="mac"/>
<address addr="10.0.0.2" addrtype="ipv4"/>
</host>"#,
        );
        let host = &normalize(xml.as_bytes()).unwrap().hosts[0];
        assert_eq!(host.addresses.len(), 1);
        assert_eq!(host.addresses["ipv4"], "10.0.0.2");
    }

    #[test]
    fn hostname_without_type_keeps_name() {
        let xml = wrap(
            r#"<host><status state="up"/>
<hostnames><hostname name="a"/><hostname type="PTR"/></hostnames></host>"#,
        );
        let host = &normalize(xml.as_bytes()).unwrap().hosts[0];
        assert_eq!(host.hostnames.len(), 2);
        assert_eq!(host.hostnames[0].name.as_deref(), Some("a"));
        assert_eq!(host.hostnames[0].kind, None);
        assert_eq!(host.hostnames[1].name, None);
        assert_eq!(host.hostnames[1].kind.as_deref(), Some("PTR"));
    }

    #[test]
    fn port_attributes_may_be_absent() {
        let xml = wrap(
            r#"<host><status state="up"/>
<ports><port><state reason="no-response"/></port></ports></host>"#,
        );
        let port = &normalize(xml.as_bytes()).unwrap().hosts[0].ports[0];
        assert_eq!(port.protocol, None);
        assert_eq!(port.portid, None);
        assert_eq!(port.state, None);
    }

    #[test]
    fn non_host_children_are_ignored() {
        let xml = wrap(
            r#"<scaninfo type="syn" protocol="tcp" numservices="100"/>
<verbose level="0"/>
<host><status state="up"/></host>
<runstats><finished time="1"/><hosts up="1" down="0" total="1"/></runstats>"#,
        );
        let result = normalize(xml.as_bytes()).unwrap();
        assert_eq!(result.hosts.len(), 1);
    }
}
